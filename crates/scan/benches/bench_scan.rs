use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

use blockcensus_common::{ChunkCuboid, ChunkPart, ScanObject, ScanOptions, ScannerId};
use blockcensus_kernel::World;
use blockcensus_scan::{
    AggregateStorage, Classifier, FloodFill, InlineExecutor, LiveWorld, ScanConfig, ScanScheduler,
    ScannerRegistry, SnapshotGrid, scan_snapshot,
};
use glam::IVec3;
use parking_lot::RwLock;

fn make_world(radius: i32) -> World {
    let mut world = World::with_seed(7).with_height(-64, 127);
    for x in -radius..=radius {
        for z in -radius..=radius {
            let _ = world.load_region(x, z);
        }
    }
    world
}

fn bench_region_scan(iterations: usize) {
    let world = make_world(0);
    let classifier = Classifier::new(world.registry().clone());
    let snapshot = world.snapshot_region(0, 0).expect("region 0,0 is resident");
    let cuboid = ChunkCuboid::full(world.min_y(), world.max_y());
    let options = ScanOptions::all();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(scan_snapshot(
            black_box(&snapshot),
            black_box(&cuboid),
            &options,
            &classifier,
        ));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  region scan ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_merge(objects: usize, iterations: usize) {
    let make = |offset: u64| -> AggregateStorage {
        (0..objects)
            .map(|i| (ScanObject::block(format!("block_{i}")), i as u64 + offset))
            .collect()
    };

    let start = Instant::now();
    for _ in 0..iterations {
        let mut left = make(0);
        left.merge_right(black_box(make(1)));
        black_box(left);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  merge ({objects} objects, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_bulk_scan(radius: i32, chunks_per_iteration: usize) {
    let world = make_world(radius);
    let classifier = Classifier::new(world.registry().clone());
    let parts = ChunkPart::split_area(
        world.id(),
        IVec3::new(-radius * 16, world.min_y(), -radius * 16),
        IVec3::new(radius * 16 + 15, world.max_y(), radius * 16 + 15),
    );
    let chunks = parts.len();
    let world = Arc::new(LiveWorld::new(Arc::new(RwLock::new(world))));
    let executor = Arc::new(InlineExecutor::new(world, classifier));
    let config = ScanConfig {
        chunks_per_iteration,
        ..ScanConfig::default()
    };
    let mut scheduler = ScanScheduler::new(executor, ScannerRegistry::new(), config).expect("valid config");

    let start = Instant::now();
    scheduler
        .submit_scan(ScannerId::new(), parts, ScanOptions::materials(), |_| {}, |outcome| {
            black_box(outcome);
        })
        .expect("fresh scanner id");
    let mut ticks = 0;
    while scheduler.active_scans() > 0 {
        scheduler.tick();
        ticks += 1;
    }
    let elapsed = start.elapsed();
    println!(
        "  bulk scan ({chunks} regions, {chunks_per_iteration}/iteration): {ticks} ticks, total {elapsed:?}"
    );
}

fn bench_flood_fill(radius: i32, iterations: usize) {
    let world = make_world(radius);
    let classifier = Classifier::new(world.registry().clone());
    let grid = SnapshotGrid::capture(&world, (0, 0), radius);
    let seed = IVec3::new(radius * 16 + 8, world.min_y() + 1, radius * 16 + 8);
    let fill = FloodFill::new(&grid, &classifier, ScanObject::block("stone")).expect("block target");

    let start = Instant::now();
    let mut last = 0;
    for _ in 0..iterations {
        last = black_box(fill.run(black_box(seed), |_| {})).count;
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  flood fill (r={radius}, {last} stone, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Scan Benchmarks ===\n");

    println!("Single region scan:");
    bench_region_scan(100);
    bench_region_scan(1000);

    println!("\nStorage merge:");
    bench_merge(16, 10000);
    bench_merge(256, 1000);

    println!("\nBulk scan (inline executor):");
    bench_bulk_scan(2, 16);
    bench_bulk_scan(4, 64);
    bench_bulk_scan(4, 1000);

    println!("\nFlood fill:");
    bench_flood_fill(0, 100);
    bench_flood_fill(1, 10);
    bench_flood_fill(2, 3);

    println!("\n=== Done ===");
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use blockcensus_common::{CHUNK_SIZE, ChunkPart, ScanObject, ScanOptions, ScannerId};
use blockcensus_kernel::{BlockId, SharedWorld, World};
use blockcensus_scan::{
    ChunkExecutor, Classifier, FloodFillRequest, InlineExecutor, LiveWorld, RegionExecutor,
    ScanConfig, ScanOutcome, ScanScheduler, ScannerRegistry, SnapshotGrid, submit_flood_fill,
};
use blockcensus_tools::{ScanReport, WorldInspector, pretty_count, pretty_duration};
use clap::{Parser, Subcommand};
use glam::IVec3;
use parking_lot::{Mutex, RwLock};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockcensus-cli", about = "Count blocks and entities in a live voxel world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate regions and print what they contain
    Inspect {
        /// Terrain seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Regions loaded around (0, 0)
        #[arg(short, long, default_value = "1")]
        radius: i32,
    },
    /// Count blocks and entities in a square of regions while the world keeps ticking
    Scan {
        /// Terrain seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Regions scanned around (0, 0)
        #[arg(short, long, default_value = "4")]
        radius: i32,
        /// YAML scan configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override chunks_per_iteration
        #[arg(long)]
        chunks_per_iteration: Option<usize>,
        /// Only count these objects (block names, or entity:<type>)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// List allow-listed objects even when none were found
        #[arg(long)]
        retain_zero: bool,
        /// Scan on the calling thread instead of the worker pool
        #[arg(long)]
        inline: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count one block type connected to a seed position
    Flood {
        /// Terrain seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Regions captured around (0, 0)
        #[arg(short, long, default_value = "1")]
        radius: i32,
        /// Block to count
        #[arg(short, long, default_value = "stone")]
        target: String,
        /// YAML scan configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seed position in world coordinates
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values = ["8", "1", "8"])]
        at: Vec<i32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("blockcensus-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: tick={}", World::new().tick());
            println!("scan: {}", blockcensus_scan::crate_info());
            println!("tools: {}", blockcensus_tools::crate_info());
            let config = ScanConfig::default();
            println!(
                "defaults: chunks_per_iteration={} tick={}ms progress={}ms",
                config.chunks_per_iteration, config.tick_interval_ms, config.progress_interval_ms
            );
        }
        Commands::Inspect { seed, radius } => {
            let world = generate_world(seed, radius)?;
            println!("{}", WorldInspector::summary(&world));
            for (x, z) in WorldInspector::list_regions(&world) {
                if let Some(info) = WorldInspector::inspect_region(&world, x, z) {
                    println!("  {info}");
                }
            }
        }
        Commands::Scan {
            seed,
            radius,
            config,
            chunks_per_iteration,
            only,
            retain_zero,
            inline,
            json,
        } => {
            let mut config = load_config(config)?;
            if let Some(n) = chunks_per_iteration {
                config.chunks_per_iteration = n;
            }

            let mut options = if only.is_empty() {
                ScanOptions::all()
            } else {
                ScanOptions::only(only.iter().map(|s| parse_object(s)))
            };
            if retain_zero {
                options = options.with_retain_zero();
            }

            let outcome = run_scan(seed, radius, config, options.clone(), inline)?;
            let report = ScanReport::from_outcome(&outcome, &options);
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{report}");
            }
        }
        Commands::Flood {
            seed,
            radius,
            target,
            config,
            at,
        } => {
            let [x, y, z] = at[..] else {
                bail!("--at takes exactly three coordinates");
            };
            let config = load_config(config)?;
            let world = generate_world(seed, radius)?;
            if world.registry().id(&target).is_none() {
                bail!("unknown block type: {target}");
            }
            let classifier = Classifier::new(world.registry().clone());
            let grid = SnapshotGrid::capture(&world, (0, 0), radius);
            let origin = grid_origin(radius);
            let request = FloodFillRequest {
                grid,
                classifier,
                seed: IVec3::new(x, y, z) - origin,
                target: ScanObject::block(target.clone()),
                floor: None,
                progress_interval: config.flood_progress_interval(),
            };

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let start = Instant::now();
            let handle = submit_flood_fill(
                runtime.handle(),
                request,
                |count| tracing::info!(count, "flood fill progress"),
                |count| tracing::debug!(count, "flood fill complete"),
            )?;
            let count = runtime.block_on(handle)?;
            println!(
                "{} connected {target} from ({x}, {y}, {z}) in {}",
                pretty_count(count),
                pretty_duration(start.elapsed())
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}

/// `entity:zombie` names an entity type, anything else a block.
fn parse_object(s: &str) -> ScanObject {
    match s.strip_prefix("entity:") {
        Some(name) => ScanObject::entity(name),
        None => ScanObject::block(s),
    }
}

/// World position of grid voxel (0, 0, 0) for a grid captured around (0, 0).
fn grid_origin(radius: i32) -> IVec3 {
    IVec3::new(-radius * CHUNK_SIZE, 0, -radius * CHUNK_SIZE)
}

/// Full-height parts for every region within `radius` of (0, 0).
fn scan_parts(world: &World, radius: i32) -> Vec<ChunkPart> {
    let far = (radius + 1) * CHUNK_SIZE - 1;
    ChunkPart::split_area(
        world.id(),
        IVec3::new(-radius * CHUNK_SIZE, world.min_y(), -radius * CHUNK_SIZE),
        IVec3::new(far, world.max_y(), far),
    )
}

/// A world with the centre region resident and everything within `radius` generated.
fn generate_world(seed: u64, radius: i32) -> anyhow::Result<World> {
    let mut world = World::with_seed(seed).with_height(-64, 127);
    for x in -radius..=radius {
        for z in -radius..=radius {
            world.load_region(x, z)?;
        }
    }
    Ok(world)
}

/// Drive one bulk scan from a fixed-cadence host loop that keeps mutating the world.
fn run_scan(
    seed: u64,
    radius: i32,
    config: ScanConfig,
    options: ScanOptions,
    inline: bool,
) -> anyhow::Result<ScanOutcome> {
    // Only the centre is resident; the rest loads on demand during the scan.
    let world = generate_world(seed, 0)?;
    let classifier = Classifier::new(world.registry().clone());
    let parts = scan_parts(&world, radius);
    let shared: SharedWorld = Arc::new(RwLock::new(world));
    let access = Arc::new(LiveWorld::new(shared.clone()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let executor: Arc<dyn RegionExecutor> = if inline {
        Arc::new(InlineExecutor::new(access, classifier))
    } else {
        Arc::new(ChunkExecutor::new(runtime.handle().clone(), access, classifier))
    };

    let tick_interval = config.tick_interval();
    let mut scheduler = ScanScheduler::new(executor, ScannerRegistry::new(), config)?;
    let finished: Arc<Mutex<Option<ScanOutcome>>> = Arc::default();
    let sink = finished.clone();
    scheduler.submit_scan(
        ScannerId::new(),
        parts,
        options,
        |p| {
            tracing::info!(
                done = p.chunks_done,
                total = p.chunks_total,
                "scan {:.0}%",
                p.fraction() * 100.0
            )
        },
        move |outcome| *sink.lock() = Some(outcome),
    )?;

    let span = (radius * 2 + 1) * CHUNK_SIZE;
    loop {
        if let Some(outcome) = finished.lock().take() {
            return Ok(outcome);
        }
        let started = Instant::now();
        {
            let mut world = shared.write();
            world.step();
            // Dig one block somewhere per tick so scans race real mutations.
            let s = world.seed();
            let pos = IVec3::new(
                (s % span as u64) as i32 - radius * CHUNK_SIZE,
                world.min_y() + ((s >> 16) % world.height() as u64) as i32,
                ((s >> 32) % span as u64) as i32 - radius * CHUNK_SIZE,
            );
            if world.is_resident(pos.x.div_euclid(CHUNK_SIZE), pos.z.div_euclid(CHUNK_SIZE)) {
                if let Err(e) = world.set_block(pos, BlockId::AIR) {
                    tracing::debug!(error = %e, "host mutation skipped");
                }
            }
            world.drain_events();
        }
        scheduler.tick();
        if let Some(rest) = tick_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcensus_common::ChunkCuboid;

    #[test]
    fn scan_parts_cover_whole_regions() {
        let world = World::new();
        let parts = scan_parts(&world, 1);
        assert_eq!(parts.len(), 9);
        let full = ChunkCuboid::full(world.min_y(), world.max_y());
        assert!(parts.iter().all(|p| p.cuboid == full));
        assert!(parts.iter().any(|p| (p.location.x, p.location.z) == (-1, -1)));
        assert!(parts.iter().any(|p| (p.location.x, p.location.z) == (1, 1)));
    }

    #[test]
    fn grid_origin_is_the_far_corner() {
        assert_eq!(grid_origin(0), IVec3::ZERO);
        assert_eq!(grid_origin(2), IVec3::new(-2 * CHUNK_SIZE, 0, -2 * CHUNK_SIZE));
    }

    #[test]
    fn missing_config_path_means_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, ScanConfig::default());
        assert!(load_config(Some(PathBuf::from("/nonexistent/scan.yaml"))).is_err());
    }

    #[test]
    fn entity_prefix_selects_entities() {
        assert_eq!(parse_object("entity:cow"), ScanObject::entity("cow"));
        assert_eq!(parse_object("stone"), ScanObject::block("stone"));
    }
}

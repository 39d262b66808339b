use blockcensus_kernel::World;

/// World inspector for developer tooling.
///
/// Read-only queries against the world state for debugging and for the CLI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        WorldSummary {
            tick: world.tick(),
            seed: world.seed(),
            min_y: world.min_y(),
            max_y: world.max_y(),
            resident_regions: world.resident_count(),
            pending_events: world.events().len(),
        }
    }

    /// Counts for one resident region.
    pub fn inspect_region(world: &World, x: i32, z: i32) -> Option<RegionInfo> {
        let region = world.region(x, z)?;
        let registry = world.registry();
        let mut solid_blocks = 0;
        for y in region.min_y()..region.min_y() + region.height() {
            for lz in 0..16 {
                for lx in 0..16 {
                    if region
                        .block(lx, y, lz)
                        .is_some_and(|id| !registry.is_empty(id))
                    {
                        solid_blocks += 1;
                    }
                }
            }
        }
        Some(RegionInfo {
            x,
            z,
            solid_blocks,
            entities: region.entities().len(),
        })
    }

    /// Coordinates of every resident region.
    pub fn list_regions(world: &World) -> Vec<(i32, i32)> {
        world.resident_coords()
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub tick: u64,
    pub seed: u64,
    pub min_y: i32,
    pub max_y: i32,
    pub resident_regions: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: tick={} seed={} y={}..={} regions={} pending_events={}",
            self.tick, self.seed, self.min_y, self.max_y, self.resident_regions, self.pending_events
        )
    }
}

/// Non-empty block and entity counts of a single region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub x: i32,
    pub z: i32,
    pub solid_blocks: u64,
    pub entities: usize,
}

impl std::fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Region ({}, {}) solid_blocks={} entities={}",
            self.x, self.z, self.solid_blocks, self.entities
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcensus_kernel::{BlockId, Region};
    use glam::IVec3;

    #[test]
    fn summary_empty_world() {
        let world = World::new();
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.resident_regions, 0);
    }

    #[test]
    fn summary_with_regions() {
        let mut world = World::new();
        world.load_region(0, 0).unwrap();
        world.load_region(1, 0).unwrap();
        world.step();

        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.resident_regions, 2);
        assert_eq!(summary.pending_events, 3); // 2 loads + 1 step
    }

    #[test]
    fn inspect_region_counts_solid_blocks() {
        let mut world = World::new().with_height(0, 3);
        let stone = world.block_id("stone").unwrap();
        world.insert_region(Region::filled(0, 0, 0, 4, stone));
        world.set_block(IVec3::new(1, 1, 1), BlockId::AIR).unwrap();

        let info = WorldInspector::inspect_region(&world, 0, 0).unwrap();
        assert_eq!(info.solid_blocks, 16 * 16 * 4 - 1);
        assert_eq!(info.entities, 0);
    }

    #[test]
    fn inspect_region_not_resident() {
        let world = World::new();
        assert!(WorldInspector::inspect_region(&world, 3, 3).is_none());
    }

    #[test]
    fn list_regions() {
        let mut world = World::new();
        world.load_region(-1, 2).unwrap();
        world.load_region(0, 0).unwrap();
        assert_eq!(WorldInspector::list_regions(&world), vec![(-1, 2), (0, 0)]);
    }

    #[test]
    fn summary_display() {
        let world = World::new();
        let s = format!("{}", WorldInspector::summary(&world));
        assert!(s.contains("tick=0"));
        assert!(s.contains("y=0..=63"));
    }
}

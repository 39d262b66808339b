use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::types::WorldId;

/// Horizontal edge length of a region, in voxels.
pub const CHUNK_SIZE: i32 = 16;

/// A region reference: which world, and the region's (x, z) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkLocation {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}

impl ChunkLocation {
    pub fn new(world: WorldId, x: i32, z: i32) -> Self {
        Self { world, x, z }
    }

    /// Region containing the given world-space block column.
    pub fn containing(world: WorldId, block_x: i32, block_z: i32) -> Self {
        Self::new(
            world,
            block_x.div_euclid(CHUNK_SIZE),
            block_z.div_euclid(CHUNK_SIZE),
        )
    }

    /// World-space block coordinates of this region's (0, 0) column.
    pub fn block_origin(&self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }
}

impl std::fmt::Display for ChunkLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Inclusive voxel bounds inside one region.
///
/// `x` and `z` are region-local (`0..CHUNK_SIZE`), `y` is the world height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCuboid {
    pub min: IVec3,
    pub max: IVec3,
}

impl ChunkCuboid {
    /// Build a cuboid from two corners in any order.
    pub fn new(a: IVec3, b: IVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The whole column of a region between two heights.
    pub fn full(min_y: i32, max_y: i32) -> Self {
        Self::new(
            IVec3::new(0, min_y, 0),
            IVec3::new(CHUNK_SIZE - 1, max_y, CHUNK_SIZE - 1),
        )
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }

    /// Number of voxels covered.
    pub fn volume(&self) -> u64 {
        let size = (self.max - self.min + IVec3::ONE).as_i64vec3();
        (size.x * size.y * size.z) as u64
    }

    /// Intersection with another cuboid, or `None` when they do not overlap.
    pub fn intersect(&self, other: &ChunkCuboid) -> Option<ChunkCuboid> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        min.cmple(max).all().then_some(ChunkCuboid { min, max })
    }
}

/// One region plus the part of it a scan should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPart {
    pub location: ChunkLocation,
    pub cuboid: ChunkCuboid,
}

impl ChunkPart {
    pub fn new(location: ChunkLocation, cuboid: ChunkCuboid) -> Self {
        Self { location, cuboid }
    }

    /// A part covering the full height range of its region.
    pub fn full(location: ChunkLocation, min_y: i32, max_y: i32) -> Self {
        Self::new(location, ChunkCuboid::full(min_y, max_y))
    }

    /// Split a world-space block box into per-region parts.
    ///
    /// Corners may be given in any order; both are inclusive.
    pub fn split_area(world: WorldId, a: IVec3, b: IVec3) -> Vec<ChunkPart> {
        let min = a.min(b);
        let max = a.max(b);
        let first = ChunkLocation::containing(world, min.x, min.z);
        let last = ChunkLocation::containing(world, max.x, max.z);

        let mut parts = Vec::new();
        for cx in first.x..=last.x {
            for cz in first.z..=last.z {
                let location = ChunkLocation::new(world, cx, cz);
                let (ox, oz) = location.block_origin();
                let local_min = IVec3::new((min.x - ox).max(0), min.y, (min.z - oz).max(0));
                let local_max = IVec3::new(
                    (max.x - ox).min(CHUNK_SIZE - 1),
                    max.y,
                    (max.z - oz).min(CHUNK_SIZE - 1),
                );
                parts.push(ChunkPart::new(location, ChunkCuboid::new(local_min, local_max)));
            }
        }
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_handles_negative_coordinates() {
        let world = WorldId::new();
        let loc = ChunkLocation::containing(world, -1, 17);
        assert_eq!((loc.x, loc.z), (-1, 1));
        assert_eq!(loc.block_origin(), (-16, 16));
    }

    #[test]
    fn cuboid_normalizes_corners() {
        let c = ChunkCuboid::new(IVec3::new(5, 10, 5), IVec3::new(0, 0, 0));
        assert_eq!(c.min, IVec3::ZERO);
        assert_eq!(c.max, IVec3::new(5, 10, 5));
        assert_eq!(c.volume(), 6 * 11 * 6);
    }

    #[test]
    fn full_cuboid_covers_the_column() {
        let c = ChunkCuboid::full(-64, 319);
        assert!(c.contains(IVec3::new(0, -64, 0)));
        assert!(c.contains(IVec3::new(15, 319, 15)));
        assert!(!c.contains(IVec3::new(16, 0, 0)));
        assert_eq!(c.volume(), 16 * 384 * 16);
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = ChunkCuboid::new(IVec3::ZERO, IVec3::splat(3));
        let b = ChunkCuboid::new(IVec3::splat(4), IVec3::splat(8));
        assert!(a.intersect(&b).is_none());
        let c = ChunkCuboid::new(IVec3::splat(2), IVec3::splat(8));
        assert_eq!(
            a.intersect(&c),
            Some(ChunkCuboid::new(IVec3::splat(2), IVec3::splat(3)))
        );
    }

    #[test]
    fn split_area_covers_every_block_once() {
        let world = WorldId::new();
        let a = IVec3::new(-5, 0, 3);
        let b = IVec3::new(20, 4, 40);
        let parts = ChunkPart::split_area(world, a, b);

        // x spans regions -1..=1, z spans 0..=2
        assert_eq!(parts.len(), 9);
        let total: u64 = parts.iter().map(|p| p.cuboid.volume()).sum();
        assert_eq!(total, 26 * 5 * 38);
    }
}

use blockcensus_common::CHUNK_SIZE;
use blockcensus_kernel::{BlockId, RegionSnapshot, World};
use glam::IVec3;

/// Bounds-checked block read from one region snapshot.
///
/// `x` and `z` are region-local, `y` is the world height. Anything outside the
/// snapshot, vertical limits included, yields `None`.
pub fn sample_at(snapshot: &RegionSnapshot, x: i32, y: i32, z: i32) -> Option<BlockId> {
    snapshot.block(x, y, z)
}

/// A rectangular array of region snapshots, the search space of a flood fill.
///
/// Grid coordinates put voxel (0, y, 0) at the minimum corner of region
/// `[0][0]`; `y` stays in world height. Cells with no snapshot read as absent.
#[derive(Debug, Clone)]
pub struct SnapshotGrid {
    size_x: i32,
    size_z: i32,
    min_y: i32,
    height: i32,
    cells: Vec<Option<RegionSnapshot>>,
}

impl SnapshotGrid {
    /// An empty grid of `size_x` by `size_z` regions.
    pub fn new(size_x: i32, size_z: i32, min_y: i32, height: i32) -> Self {
        let size_x = size_x.max(0);
        let size_z = size_z.max(0);
        Self {
            size_x,
            size_z,
            min_y,
            height: height.max(0),
            cells: vec![None; (size_x * size_z) as usize],
        }
    }

    /// Snapshot the resident regions in a square of `radius` around `center`.
    ///
    /// Regions that are not resident stay absent; they are not loaded.
    pub fn capture(world: &World, center: (i32, i32), radius: i32) -> Self {
        let radius = radius.max(0);
        let side = radius * 2 + 1;
        let mut grid = Self::new(side, side, world.min_y(), world.height());
        for ix in 0..side {
            for iz in 0..side {
                let x = center.0 - radius + ix;
                let z = center.1 - radius + iz;
                if let Some(snapshot) = world.snapshot_region(x, z) {
                    grid.set(ix, iz, snapshot);
                }
            }
        }
        grid
    }

    /// Place a snapshot at grid cell (`ix`, `iz`). Out-of-range cells are ignored.
    pub fn set(&mut self, ix: i32, iz: i32, snapshot: RegionSnapshot) {
        if let Some(i) = self.cell_index(ix, iz) {
            self.cells[i] = Some(snapshot);
        }
    }

    fn cell_index(&self, ix: i32, iz: i32) -> Option<usize> {
        ((0..self.size_x).contains(&ix) && (0..self.size_z).contains(&iz))
            .then(|| (ix * self.size_z + iz) as usize)
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Voxel extent: width in x, height in y, depth in z.
    pub fn extent(&self) -> IVec3 {
        IVec3::new(self.size_x * CHUNK_SIZE, self.height, self.size_z * CHUNK_SIZE)
    }

    /// Block at a grid position, `None` when outside the grid or in an absent cell.
    pub fn sample_at(&self, pos: IVec3) -> Option<BlockId> {
        if pos.x < 0 || pos.z < 0 {
            return None;
        }
        let cell = self.cell_index(pos.x / CHUNK_SIZE, pos.z / CHUNK_SIZE)?;
        let snapshot = self.cells[cell].as_ref()?;
        sample_at(snapshot, pos.x % CHUNK_SIZE, pos.y, pos.z % CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcensus_kernel::Region;

    fn snapshot(block: BlockId) -> RegionSnapshot {
        RegionSnapshot::capture(&Region::filled(0, 0, 0, 16, block), 0)
    }

    #[test]
    fn sample_at_rejects_out_of_range() {
        let snap = snapshot(BlockId(2));
        assert_eq!(sample_at(&snap, 0, 0, 0), Some(BlockId(2)));
        assert_eq!(sample_at(&snap, 15, 15, 15), Some(BlockId(2)));
        assert_eq!(sample_at(&snap, 0, -1, 0), None);
        assert_eq!(sample_at(&snap, 0, 16, 0), None);
        assert_eq!(sample_at(&snap, 16, 0, 0), None);
        assert_eq!(sample_at(&snap, 0, 0, -1), None);
    }

    #[test]
    fn grid_routes_to_the_right_cell() {
        let mut grid = SnapshotGrid::new(2, 2, 0, 16);
        grid.set(1, 0, snapshot(BlockId(5)));
        grid.set(0, 1, snapshot(BlockId(6)));

        assert_eq!(grid.extent(), IVec3::new(32, 16, 32));
        assert_eq!(grid.sample_at(IVec3::new(17, 3, 4)), Some(BlockId(5)));
        assert_eq!(grid.sample_at(IVec3::new(4, 3, 17)), Some(BlockId(6)));
        // absent cell
        assert_eq!(grid.sample_at(IVec3::new(1, 1, 1)), None);
        // outside the grid
        assert_eq!(grid.sample_at(IVec3::new(32, 1, 1)), None);
        assert_eq!(grid.sample_at(IVec3::new(-1, 1, 1)), None);
    }

    #[test]
    fn capture_leaves_unloaded_regions_absent() {
        let mut world = World::with_seed(5);
        world.load_region(0, 0).unwrap();
        let grid = SnapshotGrid::capture(&world, (0, 0), 1);

        assert_eq!(grid.extent(), IVec3::new(48, 64, 48));
        // centre cell is (1, 1) in grid space
        assert!(grid.sample_at(IVec3::new(16, 0, 16)).is_some());
        assert!(grid.sample_at(IVec3::new(0, 0, 0)).is_none());
    }
}

use blockcensus_common::{CHUNK_SIZE, EntityId};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blocks::BlockId;

/// Broad entity grouping used to decide whether an entity is countable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    Living,
    Item,
    Vehicle,
    Projectile,
    Player,
    Marker,
}

/// An entity standing in a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub type_name: String,
    pub category: EntityCategory,
    pub position: Vec3,
}

impl EntityRecord {
    /// The voxel the entity occupies, in world coordinates.
    pub fn block_position(&self) -> IVec3 {
        self.position.floor().as_ivec3()
    }
}

/// One 16 x H x 16 column of the world.
///
/// Blocks are stored y-major: `((y - min_y) * 16 + z) * 16 + x`.
#[derive(Debug, Clone)]
pub struct Region {
    x: i32,
    z: i32,
    min_y: i32,
    height: i32,
    blocks: Vec<BlockId>,
    entities: Vec<EntityRecord>,
}

impl Region {
    /// A region where every voxel holds `block`.
    pub fn filled(x: i32, z: i32, min_y: i32, height: i32, block: BlockId) -> Self {
        let len = (CHUNK_SIZE * CHUNK_SIZE * height.max(0)) as usize;
        Self {
            x,
            z,
            min_y,
            height: height.max(0),
            blocks: vec![block; len],
            entities: Vec::new(),
        }
    }

    pub fn coord(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        region_index(self.min_y, self.height, x, y, z)
    }

    /// Block at region-local `x`/`z` and world `y`.
    pub fn block(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        self.index(x, y, z).map(|i| self.blocks[i])
    }

    /// Replace a block, returning the old one. `None` when out of range.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> Option<BlockId> {
        let i = self.index(x, y, z)?;
        Some(std::mem::replace(&mut self.blocks[i], block))
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn push_entity(&mut self, entity: EntityRecord) {
        self.entities.push(entity);
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<EntityRecord> {
        let pos = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.swap_remove(pos))
    }
}

fn region_index(min_y: i32, height: i32, x: i32, y: i32, z: i32) -> Option<usize> {
    let ly = y - min_y;
    if !(0..CHUNK_SIZE).contains(&x) || !(0..CHUNK_SIZE).contains(&z) || !(0..height).contains(&ly)
    {
        return None;
    }
    Some(((ly * CHUNK_SIZE + z) * CHUNK_SIZE + x) as usize)
}

/// An immutable point-in-time copy of one region.
///
/// Cloning shares the underlying buffers, so snapshots can be handed to
/// worker threads freely.
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    x: i32,
    z: i32,
    min_y: i32,
    height: i32,
    tick: u64,
    blocks: Arc<[BlockId]>,
    entities: Arc<[EntityRecord]>,
}

impl RegionSnapshot {
    /// Copy a region's current blocks and entities.
    pub fn capture(region: &Region, tick: u64) -> Self {
        Self {
            x: region.x,
            z: region.z,
            min_y: region.min_y,
            height: region.height,
            tick,
            blocks: Arc::from(region.blocks.as_slice()),
            entities: Arc::from(region.entities.as_slice()),
        }
    }

    pub fn coord(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// World tick at which the snapshot was taken.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Block at region-local `x`/`z` and world `y`, `None` outside the region.
    pub fn block(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        region_index(self.min_y, self.height, x, y, z).map(|i| self.blocks[i])
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_access_is_bounds_checked() {
        let region = Region::filled(0, 0, -8, 16, BlockId(3));
        assert_eq!(region.block(0, -8, 0), Some(BlockId(3)));
        assert_eq!(region.block(15, 7, 15), Some(BlockId(3)));
        assert_eq!(region.block(16, 0, 0), None);
        assert_eq!(region.block(0, 8, 0), None);
        assert_eq!(region.block(0, -9, 0), None);
        assert_eq!(region.block(-1, 0, 0), None);
    }

    #[test]
    fn set_block_returns_previous() {
        let mut region = Region::filled(0, 0, 0, 4, BlockId(1));
        assert_eq!(region.set_block(2, 3, 4, BlockId(7)), Some(BlockId(1)));
        assert_eq!(region.block(2, 3, 4), Some(BlockId(7)));
        assert_eq!(region.set_block(2, 4, 4, BlockId(7)), None);
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut region = Region::filled(1, 2, 0, 4, BlockId(1));
        let snap = RegionSnapshot::capture(&region, 9);
        region.set_block(0, 0, 0, BlockId(5));
        region.push_entity(EntityRecord {
            id: EntityId::new(),
            type_name: "cow".into(),
            category: EntityCategory::Living,
            position: Vec3::new(1.5, 1.0, 1.5),
        });

        assert_eq!(snap.block(0, 0, 0), Some(BlockId(1)));
        assert!(snap.entities().is_empty());
        assert_eq!(snap.coord(), (1, 2));
        assert_eq!(snap.tick(), 9);
    }

    #[test]
    fn entity_block_position_floors() {
        let entity = EntityRecord {
            id: EntityId::new(),
            type_name: "zombie".into(),
            category: EntityCategory::Living,
            position: Vec3::new(-0.5, 64.9, 3.2),
        };
        assert_eq!(entity.block_position(), IVec3::new(-1, 64, 3));
    }
}

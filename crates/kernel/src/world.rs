use blockcensus_common::{CHUNK_SIZE, EntityId, WorldId};
use glam::{IVec3, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::blocks::{BlockId, BlockRegistry};
use crate::region::{EntityCategory, EntityRecord, Region, RegionSnapshot};

/// The live world shared between the simulation thread and scan collaborators.
pub type SharedWorld = Arc<RwLock<World>>;

/// Errors from world operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("region ({x}, {z}) lies outside the world border")]
    RegionOutsideBorder { x: i32, z: i32 },
    #[error("region ({x}, {z}) is not resident")]
    RegionNotResident { x: i32, z: i32 },
    #[error("position ({x}, {y}, {z}) is outside the world height")]
    PositionOutOfBounds { x: i32, y: i32, z: i32 },
    #[error("unknown block type: {0}")]
    UnknownBlock(String),
    #[error("unknown world {0}")]
    UnknownWorld(uuid::Uuid),
}

/// An event record produced by every mutation to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    BlockChanged { pos: IVec3, old: BlockId, new: BlockId },
    EntitySpawned { id: EntityId, region: (i32, i32) },
    EntityDespawned { id: EntityId, region: (i32, i32) },
    RegionLoaded { x: i32, z: i32 },
    RegionUnloaded { x: i32, z: i32 },
    /// Simulation advanced one tick with the given seed.
    Stepped { tick: u64, seed: u64 },
}

/// The authoritative voxel world.
///
/// Regions are either resident (readable and mutable) or stored (kept aside
/// until loaded again). Regions never seen before are generated from the seed
/// on first load, so the same seed always yields the same terrain.
#[derive(Debug)]
pub struct World {
    id: WorldId,
    /// Seed the terrain is generated from; fixed for the world's lifetime.
    terrain_seed: u64,
    seed: u64,
    tick: u64,
    min_y: i32,
    max_y: i32,
    /// Square border radius in regions around (0, 0); `None` is unbounded.
    border: Option<i32>,
    registry: Arc<BlockRegistry>,
    resident: BTreeMap<(i32, i32), Region>,
    stored: BTreeMap<(i32, i32), Region>,
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world at tick 0 with seed 0 spanning y 0..=63.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a world with a specific terrain seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            id: WorldId::new(),
            terrain_seed: seed,
            seed,
            tick: 0,
            min_y: 0,
            max_y: 63,
            border: None,
            registry: Arc::new(BlockRegistry::standard()),
            resident: BTreeMap::new(),
            stored: BTreeMap::new(),
            event_log: Vec::new(),
        }
    }

    /// Set the vertical range (inclusive). Only meaningful before regions exist.
    pub fn with_height(mut self, min_y: i32, max_y: i32) -> Self {
        self.min_y = min_y.min(max_y);
        self.max_y = min_y.max(max_y);
        self
    }

    /// Restrict loadable regions to `-radius..=radius` on both axes.
    pub fn with_border(mut self, radius: i32) -> Self {
        self.border = Some(radius.abs());
        self
    }

    /// Replace the block palette. Only meaningful before regions exist.
    pub fn with_registry(mut self, registry: BlockRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Look up a block id by name.
    pub fn block_id(&self, name: &str) -> Result<BlockId, WorldError> {
        self.registry
            .id(name)
            .ok_or_else(|| WorldError::UnknownBlock(name.to_owned()))
    }

    pub fn in_border(&self, x: i32, z: i32) -> bool {
        self.border.is_none_or(|r| x.abs() <= r && z.abs() <= r)
    }

    pub fn is_resident(&self, x: i32, z: i32) -> bool {
        self.resident.contains_key(&(x, z))
    }

    pub fn region(&self, x: i32, z: i32) -> Option<&Region> {
        self.resident.get(&(x, z))
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Coordinates of all resident regions, in (x, z) order.
    pub fn resident_coords(&self) -> Vec<(i32, i32)> {
        self.resident.keys().copied().collect()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Make a region resident, replacing any previous content at its coordinate.
    pub fn insert_region(&mut self, region: Region) {
        let (x, z) = region.coord();
        self.stored.remove(&(x, z));
        self.resident.insert((x, z), region);
        self.event_log.push(WorldEvent::RegionLoaded { x, z });
    }

    /// Make a region resident, restoring it from storage or generating it.
    pub fn load_region(&mut self, x: i32, z: i32) -> Result<&Region, WorldError> {
        if !self.in_border(x, z) {
            return Err(WorldError::RegionOutsideBorder { x, z });
        }
        if !self.resident.contains_key(&(x, z)) {
            let region = match self.stored.remove(&(x, z)) {
                Some(region) => region,
                None => self.generate_region(x, z),
            };
            tracing::debug!(x, z, "region loaded");
            self.resident.insert((x, z), region);
            self.event_log.push(WorldEvent::RegionLoaded { x, z });
        }
        self.resident
            .get(&(x, z))
            .ok_or(WorldError::RegionNotResident { x, z })
    }

    /// Move a resident region back to storage. Returns false if it was not resident.
    pub fn unload_region(&mut self, x: i32, z: i32) -> bool {
        match self.resident.remove(&(x, z)) {
            Some(region) => {
                self.stored.insert((x, z), region);
                self.event_log.push(WorldEvent::RegionUnloaded { x, z });
                true
            }
            None => false,
        }
    }

    /// Capture an immutable copy of a resident region.
    pub fn snapshot_region(&self, x: i32, z: i32) -> Option<RegionSnapshot> {
        self.resident
            .get(&(x, z))
            .map(|region| RegionSnapshot::capture(region, self.tick))
    }

    fn locate(&self, pos: IVec3) -> Result<((i32, i32), IVec3), WorldError> {
        if pos.y < self.min_y || pos.y > self.max_y {
            return Err(WorldError::PositionOutOfBounds {
                x: pos.x,
                y: pos.y,
                z: pos.z,
            });
        }
        let coord = (pos.x.div_euclid(CHUNK_SIZE), pos.z.div_euclid(CHUNK_SIZE));
        let local = IVec3::new(
            pos.x.rem_euclid(CHUNK_SIZE),
            pos.y,
            pos.z.rem_euclid(CHUNK_SIZE),
        );
        Ok((coord, local))
    }

    /// Block at a world position, if its region is resident.
    pub fn block_at(&self, pos: IVec3) -> Option<BlockId> {
        let (coord, local) = self.locate(pos).ok()?;
        self.resident.get(&coord)?.block(local.x, local.y, local.z)
    }

    /// Replace a block at a world position and log the change.
    pub fn set_block(&mut self, pos: IVec3, block: BlockId) -> Result<BlockId, WorldError> {
        let ((x, z), local) = self.locate(pos)?;
        let region = self
            .resident
            .get_mut(&(x, z))
            .ok_or(WorldError::RegionNotResident { x, z })?;
        let old = region
            .set_block(local.x, local.y, local.z, block)
            .ok_or(WorldError::PositionOutOfBounds {
                x: pos.x,
                y: pos.y,
                z: pos.z,
            })?;
        if old != block {
            self.event_log.push(WorldEvent::BlockChanged {
                pos,
                old,
                new: block,
            });
        }
        Ok(old)
    }

    /// Spawn an entity in the resident region containing `position`.
    pub fn spawn_entity(
        &mut self,
        type_name: &str,
        category: EntityCategory,
        position: Vec3,
    ) -> Result<EntityId, WorldError> {
        let ((x, z), _) = self.locate(position.floor().as_ivec3())?;
        let region = self
            .resident
            .get_mut(&(x, z))
            .ok_or(WorldError::RegionNotResident { x, z })?;
        let id = EntityId::new();
        region.push_entity(EntityRecord {
            id,
            type_name: type_name.to_owned(),
            category,
            position,
        });
        self.event_log
            .push(WorldEvent::EntitySpawned { id, region: (x, z) });
        Ok(id)
    }

    /// Remove an entity from whichever resident region holds it.
    pub fn despawn_entity(&mut self, id: EntityId) -> Option<EntityRecord> {
        for (coord, region) in self.resident.iter_mut() {
            if let Some(entity) = region.remove_entity(id) {
                self.event_log.push(WorldEvent::EntityDespawned {
                    id,
                    region: *coord,
                });
                return Some(entity);
            }
        }
        None
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            seed: self.seed,
        });
    }

    /// Deterministic terrain for a region: bedrock floor, ore-bearing stone,
    /// a dirt layer and a grass surface with a few entities on top.
    ///
    /// Depends only on the terrain seed and the coordinate, never on the tick.
    pub fn generate_region(&self, x: i32, z: i32) -> Region {
        let id = |name: &str| self.registry.id(name).unwrap_or(BlockId::AIR);
        let bedrock = id("bedrock");
        let stone = id("stone");
        let dirt = id("dirt");
        let grass = id("grass_block");
        let ores = [
            (10, id("coal_ore")),
            (16, id("iron_ore")),
            (19, id("gold_ore")),
            (20, id("diamond_ore")),
        ];

        let mut region = Region::filled(x, z, self.min_y, self.height(), BlockId::AIR);
        let (ox, oz) = (x * CHUNK_SIZE, z * CHUNK_SIZE);
        let base = self.min_y + self.height() * 5 / 8;

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let column = hash3(self.terrain_seed, ox + lx, 0, oz + lz);
                let surface = (base + (column % 5) as i32).min(self.max_y);
                for y in self.min_y..=surface {
                    let block = if y == self.min_y {
                        bedrock
                    } else if y < surface - 3 {
                        let roll = hash3(self.terrain_seed, ox + lx, y, oz + lz) % 1000;
                        ores.iter()
                            .find(|(limit, _)| roll < *limit)
                            .map_or(stone, |(_, ore)| *ore)
                    } else if y < surface {
                        dirt
                    } else {
                        grass
                    };
                    region.set_block(lx, y, lz, block);
                }
            }
        }

        let mobs = hash3(self.terrain_seed, x, -1, z);
        for i in 0..(mobs % 3) {
            let h = hash3(self.terrain_seed, x, i as i32, z);
            let lx = (h % CHUNK_SIZE as u64) as f32 + 0.5;
            let lz = ((h >> 8) % CHUNK_SIZE as u64) as f32 + 0.5;
            let type_name = if h % 2 == 0 { "cow" } else { "zombie" };
            region.push_entity(EntityRecord {
                id: EntityId::new(),
                type_name: type_name.to_owned(),
                category: EntityCategory::Living,
                position: Vec3::new(ox as f32 + lx, (base + 5) as f32, oz as f32 + lz),
            });
        }
        region
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Splitmix64 ... a fast, high-quality deterministic PRNG step function.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn hash3(seed: u64, x: i32, y: i32, z: i32) -> u64 {
    let mut h = splitmix64(seed ^ x as u32 as u64);
    h = splitmix64(h ^ ((y as u32 as u64) << 21));
    splitmix64(h ^ ((z as u32 as u64) << 42))
}

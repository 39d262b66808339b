use blockcensus_common::{ChunkLocation, WorldId};
use blockcensus_kernel::{RegionSnapshot, SharedWorld, WorldError};
use futures::FutureExt;
use futures::future::BoxFuture;

/// Reference to a resident region, valid for as long as it stays resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle {
    pub location: ChunkLocation,
}

/// How scans reach the live world.
///
/// Implementations decide how loading happens; scans only ever read.
pub trait WorldAccess: Send + Sync {
    fn is_region_resident(&self, location: &ChunkLocation) -> bool;

    fn get_resident_region(&self, location: &ChunkLocation) -> Option<RegionHandle>;

    /// Make a region resident. The returned future may complete on any thread.
    fn load_region(&self, location: &ChunkLocation)
    -> BoxFuture<'static, Result<RegionHandle, WorldError>>;

    /// Capture the region's current content. `None` if it stopped being resident.
    fn snapshot(&self, handle: &RegionHandle) -> Option<RegionSnapshot>;
}

/// [`WorldAccess`] over a single shared in-process [`World`](blockcensus_kernel::World).
#[derive(Debug, Clone)]
pub struct LiveWorld {
    id: WorldId,
    world: SharedWorld,
}

impl LiveWorld {
    pub fn new(world: SharedWorld) -> Self {
        let id = world.read().id();
        Self { id, world }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn shared(&self) -> &SharedWorld {
        &self.world
    }
}

impl WorldAccess for LiveWorld {
    fn is_region_resident(&self, location: &ChunkLocation) -> bool {
        location.world == self.id && self.world.read().is_resident(location.x, location.z)
    }

    fn get_resident_region(&self, location: &ChunkLocation) -> Option<RegionHandle> {
        self.is_region_resident(location).then_some(RegionHandle {
            location: *location,
        })
    }

    fn load_region(
        &self,
        location: &ChunkLocation,
    ) -> BoxFuture<'static, Result<RegionHandle, WorldError>> {
        let world = self.world.clone();
        let id = self.id;
        let location = *location;
        async move {
            if location.world != id {
                return Err(WorldError::UnknownWorld(location.world.0));
            }
            world.write().load_region(location.x, location.z)?;
            Ok(RegionHandle { location })
        }
        .boxed()
    }

    fn snapshot(&self, handle: &RegionHandle) -> Option<RegionSnapshot> {
        if handle.location.world != self.id {
            return None;
        }
        self.world
            .read()
            .snapshot_region(handle.location.x, handle.location.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcensus_kernel::World;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn live(world: World) -> LiveWorld {
        LiveWorld::new(Arc::new(RwLock::new(world)))
    }

    #[test]
    fn residency_follows_the_world() {
        let access = live(World::with_seed(1));
        let loc = ChunkLocation::new(access.id(), 0, 0);
        assert!(!access.is_region_resident(&loc));
        assert!(access.get_resident_region(&loc).is_none());

        let handle = futures::executor::block_on(access.load_region(&loc)).unwrap();
        assert!(access.is_region_resident(&loc));
        assert!(access.snapshot(&handle).is_some());
    }

    #[test]
    fn foreign_world_is_rejected() {
        let access = live(World::new());
        let loc = ChunkLocation::new(WorldId::new(), 0, 0);
        assert!(!access.is_region_resident(&loc));
        let err = futures::executor::block_on(access.load_region(&loc)).unwrap_err();
        assert!(matches!(err, WorldError::UnknownWorld(_)));
    }

    #[test]
    fn load_outside_border_fails() {
        let access = live(World::new().with_border(0));
        let loc = ChunkLocation::new(access.id(), 1, 0);
        let err = futures::executor::block_on(access.load_region(&loc)).unwrap_err();
        assert_eq!(err, WorldError::RegionOutsideBorder { x: 1, z: 0 });
    }

    #[test]
    fn snapshot_of_unloaded_handle_is_none() {
        let access = live(World::new());
        let loc = ChunkLocation::new(access.id(), 0, 0);
        let handle = futures::executor::block_on(access.load_region(&loc)).unwrap();
        access.shared().write().unload_region(0, 0);
        assert!(access.snapshot(&handle).is_none());
    }
}

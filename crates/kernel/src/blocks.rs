use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index into a [`BlockRegistry`]. Raw voxel sample stored in regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
}

#[derive(Debug, Clone)]
struct BlockDef {
    name: String,
    empty: bool,
}

/// Palette of block types known to a world.
///
/// Id 0 is always `air`. Empty blocks (air variants) carry no countable identity.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    defs: Vec<BlockDef>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// A registry holding only `air`.
    pub fn new() -> Self {
        let mut registry = Self {
            defs: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.insert("air", true);
        registry
    }

    /// The default palette used by generated worlds.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.insert("cave_air", true);
        registry.insert("void_air", true);
        for name in [
            "bedrock",
            "stone",
            "dirt",
            "grass_block",
            "gravel",
            "sand",
            "water",
            "coal_ore",
            "iron_ore",
            "gold_ore",
            "diamond_ore",
            "oak_log",
            "chest",
            "spawner",
            "tnt",
        ] {
            registry.insert(name, false);
        }
        registry
    }

    /// Register a solid block type, returning the existing id if already known.
    pub fn register(&mut self, name: &str) -> BlockId {
        self.insert(name, false)
    }

    fn insert(&mut self, name: &str, empty: bool) -> BlockId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = BlockId(self.defs.len() as u16);
        self.defs.push(BlockDef {
            name: name.to_owned(),
            empty,
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: BlockId) -> Option<&str> {
        self.defs.get(id.0 as usize).map(|d| d.name.as_str())
    }

    /// Unknown ids count as empty.
    pub fn is_empty(&self, id: BlockId) -> bool {
        self.defs.get(id.0 as usize).is_none_or(|d| d.empty)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_id_zero() {
        let registry = BlockRegistry::standard();
        assert_eq!(registry.id("air"), Some(BlockId::AIR));
        assert!(registry.is_empty(BlockId::AIR));
        assert!(registry.is_empty(registry.id("cave_air").unwrap()));
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = BlockRegistry::new();
        let a = registry.register("marble");
        let b = registry.register("marble");
        assert_eq!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(a), Some("marble"));
    }

    #[test]
    fn unknown_ids_are_empty() {
        let registry = BlockRegistry::new();
        assert!(registry.name(BlockId(999)).is_none());
        assert!(registry.is_empty(BlockId(999)));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one world; chunk locations are only meaningful within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub Uuid);

impl WorldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

/// Key of whoever started a bulk scan (a player, a console session, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScannerId(pub Uuid);

impl ScannerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScannerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScannerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What sort of content a [`ScanObject`] counts.
///
/// Declaration order is the sort order: blocks before entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanObjectKind {
    Block,
    Entity,
}

/// A classified, countable content identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanObject {
    kind: ScanObjectKind,
    name: String,
}

impl ScanObject {
    pub fn new(kind: ScanObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn block(name: impl Into<String>) -> Self {
        Self::new(ScanObjectKind::Block, name)
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(ScanObjectKind::Entity, name)
    }

    pub fn kind(&self) -> ScanObjectKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_block(&self) -> bool {
        self.kind == ScanObjectKind::Block
    }

    pub fn is_entity(&self) -> bool {
        self.kind == ScanObjectKind::Entity
    }
}

impl fmt::Display for ScanObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

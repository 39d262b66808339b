use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{ScanObject, ScanObjectKind};

/// Which content a scan counts, and how zero counts are reported.
///
/// Passed by value to every scan call; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Count block types.
    pub materials: bool,
    /// Count entity types.
    pub entities: bool,
    /// When set, only these objects are counted.
    pub allow: Option<BTreeSet<ScanObject>>,
    /// Keep allow-listed objects with a zero count in reports.
    pub retain_zero: bool,
}

impl ScanOptions {
    /// Count every block and entity type.
    pub fn all() -> Self {
        Self {
            materials: true,
            entities: true,
            allow: None,
            retain_zero: false,
        }
    }

    pub fn materials() -> Self {
        Self {
            entities: false,
            ..Self::all()
        }
    }

    pub fn entities() -> Self {
        Self {
            materials: false,
            ..Self::all()
        }
    }

    /// Count only the given objects. Kinds not present in the list are skipped
    /// entirely, so an entity-free list never walks entities.
    pub fn only(items: impl IntoIterator<Item = ScanObject>) -> Self {
        let allow: BTreeSet<ScanObject> = items.into_iter().collect();
        Self {
            materials: allow.iter().any(ScanObject::is_block),
            entities: allow.iter().any(ScanObject::is_entity),
            allow: Some(allow),
            retain_zero: false,
        }
    }

    pub fn with_retain_zero(mut self) -> Self {
        self.retain_zero = true;
        self
    }

    /// Whether a classified object should be counted.
    pub fn includes(&self, object: &ScanObject) -> bool {
        let kind_enabled = match object.kind() {
            ScanObjectKind::Block => self.materials,
            ScanObjectKind::Entity => self.entities,
        };
        kind_enabled && self.allow.as_ref().is_none_or(|allow| allow.contains(object))
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::all()
    }
}

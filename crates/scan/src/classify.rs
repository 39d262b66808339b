use blockcensus_common::ScanObject;
use blockcensus_kernel::{BlockId, BlockRegistry, EntityCategory, EntityRecord};
use std::sync::Arc;

/// A raw sample read from a snapshot, before classification.
#[derive(Debug, Clone, Copy)]
pub enum RawSample<'a> {
    Block(BlockId),
    Entity(&'a EntityRecord),
}

/// Maps raw samples to countable [`ScanObject`]s.
///
/// Stateless apart from the block palette it reads names from. Samples with
/// no countable identity (air, unknown ids, players, markers) yield `None`.
#[derive(Debug, Clone)]
pub struct Classifier {
    registry: Arc<BlockRegistry>,
}

impl Classifier {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self { registry }
    }

    pub fn classify(&self, sample: RawSample<'_>) -> Option<ScanObject> {
        match sample {
            RawSample::Block(id) => self.classify_block(id),
            RawSample::Entity(entity) => self.classify_entity(entity),
        }
    }

    pub fn classify_block(&self, id: BlockId) -> Option<ScanObject> {
        if self.registry.is_empty(id) {
            return None;
        }
        self.registry.name(id).map(ScanObject::block)
    }

    pub fn classify_entity(&self, entity: &EntityRecord) -> Option<ScanObject> {
        match entity.category {
            EntityCategory::Player | EntityCategory::Marker => None,
            _ if entity.type_name.is_empty() => None,
            _ => Some(ScanObject::entity(entity.type_name.as_str())),
        }
    }
}

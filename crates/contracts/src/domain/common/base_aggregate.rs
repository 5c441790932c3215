use super::EntityMetadata;
use serde::{Deserialize, Serialize};

/// Base fields shared by all aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAggregate<Id> {
    /// Record identifier
    pub id: Id,
    /// Business code of the record (e.g. "STU-2025-0001")
    pub code: String,
    /// Lifecycle metadata
    pub metadata: EntityMetadata,
}

impl<Id> BaseAggregate<Id> {
    pub fn new(id: Id, code: String) -> Self {
        Self {
            id,
            code,
            metadata: EntityMetadata::new(),
        }
    }

    /// Rebuild an aggregate base from stored metadata (loading from DB)
    pub fn with_metadata(id: Id, code: String, metadata: EntityMetadata) -> Self {
        Self { id, code, metadata }
    }

    pub fn touch(&mut self) {
        self.metadata.touch();
    }
}

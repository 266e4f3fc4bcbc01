//! Batch and entity identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a batch in the input sequence, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchIndex(pub u64);

impl BatchIndex {
    /// The batch processed right after this one.
    pub fn next(self) -> Self {
        BatchIndex(self.0.saturating_add(1))
    }

    /// Oldest batch index still inside a window of `span` batches ending here.
    pub fn window_floor(self, span: u64) -> Self {
        BatchIndex(self.0.saturating_sub(span.saturating_sub(1)))
    }
}

impl fmt::Display for BatchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BatchIndex {
    fn from(index: u64) -> Self {
        BatchIndex(index)
    }
}

/// Identifier of a scored entity, as it appears in the batch source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_floor_saturates_at_zero() {
        assert_eq!(BatchIndex(0).window_floor(3), BatchIndex(0));
        assert_eq!(BatchIndex(1).window_floor(3), BatchIndex(0));
        assert_eq!(BatchIndex(5).window_floor(3), BatchIndex(3));
    }

    #[test]
    fn entity_id_serializes_transparently() {
        let id = EntityId::from("A-17");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"A-17\"");
        assert_eq!(id.to_string(), "A-17");
    }
}

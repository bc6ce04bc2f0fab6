//! Core identifier types for PromptForge
//!
//! Strongly-typed UUID newtypes so a user id can never be passed where a
//! prompt id is expected. All ids serialize as their plain string form.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a UserId from a string representation
    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid user ID '{s}': {e}"))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PromptId(Uuid);

impl PromptId {
    /// Create a new random prompt ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a PromptId from a string representation
    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid prompt ID '{s}': {e}"))
    }
}

impl Default for PromptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a saved prompt version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionId(Uuid);

impl VersionId {
    /// Create a new random version ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a VersionId from a string representation
    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid version ID '{s}': {e}"))
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a share grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShareId(Uuid);

impl ShareId {
    /// Create a new random share ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a ShareId from a string representation
    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid share ID '{s}': {e}"))
    }
}

impl Default for ShareId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(PromptId::new(), PromptId::new());
        assert_ne!(VersionId::new(), VersionId::new());
        assert_ne!(ShareId::new(), ShareId::new());
    }

    #[test]
    fn test_parse_round_trip() {
        let id = PromptId::new();
        let parsed = PromptId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = UserId::parse("not-a-uuid").unwrap_err();
        assert!(err.contains("Invalid user ID"));
    }

    #[test]
    fn test_serde_round_trip() {
        let id = ShareId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ShareId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

//! Semantic version values and bump arithmetic
//!
//! Prompt versions use a strict `MAJOR.MINOR.PATCH` grammar: three
//! dot-separated non-negative integers, nothing else. Parsing is the only
//! validation boundary; once a [`SemanticVersion`] exists, bumping is pure
//! arithmetic and cannot fail.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Strict version grammar: no prefix, suffix, pre-release, or build metadata
pub const SEMVER_PATTERN: &str = r"^\d+\.\d+\.\d+$";

static SEMVER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(SEMVER_PATTERN).unwrap());

/// Errors for version parsing and version-set operations
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum VersionError {
    /// Input does not match the `MAJOR.MINOR.PATCH` grammar
    #[error("Malformed version '{input}': expected MAJOR.MINOR.PATCH")]
    Malformed {
        /// The rejected input
        input: String,
    },

    /// The version string already exists for this prompt
    #[error("Version {version} already exists for this prompt")]
    Duplicate {
        /// The colliding version
        version: SemanticVersion,
    },

    /// The current version may never be deleted
    #[error("Version {version} is the current version and cannot be deleted")]
    CannotDeleteCurrent {
        /// The protected version
        version: SemanticVersion,
    },

    /// Unrecognized bump kind name
    #[error("Unknown bump kind '{input}': expected major, minor, or patch")]
    UnknownBumpKind {
        /// The rejected input
        input: String,
    },
}

impl From<VersionError> for promptforge_common::PromptForgeError {
    fn from(err: VersionError) -> Self {
        promptforge_common::PromptForgeError::validation("version", err.to_string())
    }
}

/// A `MAJOR.MINOR.PATCH` version
///
/// Ordering is numeric, most significant component first, so `2.0.0` sorts
/// after `1.10.3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    /// Incompatible revision counter
    pub major: u64,
    /// Feature revision counter
    pub minor: u64,
    /// Fix revision counter
    pub patch: u64,
}

impl SemanticVersion {
    /// The version every new prompt starts at
    pub const INITIAL: SemanticVersion = SemanticVersion {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// Build a version from its components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict `MAJOR.MINOR.PATCH` string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if !SEMVER_RE.is_match(input) {
            return Err(VersionError::Malformed {
                input: input.to_string(),
            });
        }

        let mut parts = input.split('.').map(|part| {
            // The regex guarantees digits; overflow is the only remaining failure
            part.parse::<u64>().map_err(|_| VersionError::Malformed {
                input: input.to_string(),
            })
        });

        // Exactly three parts by construction of the pattern
        match (parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), Some(patch)) => Ok(Self {
                major: major?,
                minor: minor?,
                patch: patch?,
            }),
            _ => Err(VersionError::Malformed {
                input: input.to_string(),
            }),
        }
    }

    /// Compute the next version for a bump kind
    ///
    /// Pure arithmetic on an already-valid version; parsing upstream is the
    /// place malformed input gets rejected.
    pub fn bump(self, kind: BumpKind) -> Self {
        match kind {
            BumpKind::Major => Self::new(self.major + 1, 0, 0),
            BumpKind::Minor => Self::new(self.major, self.minor + 1, 0),
            BumpKind::Patch => Self::new(self.major, self.minor, self.patch + 1),
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SemanticVersion::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Which component a version bump increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    /// Increment MAJOR, reset MINOR and PATCH
    Major,
    /// Keep MAJOR, increment MINOR, reset PATCH
    Minor,
    /// Keep MAJOR and MINOR, increment PATCH
    Patch,
}

impl BumpKind {
    /// Lowercase name as used in payloads and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            _ => Err(VersionError::UnknownBumpKind {
                input: s.to_string(),
            }),
        }
    }
}

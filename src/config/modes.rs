//! Sync policy definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the planner decides that a course-work-material group is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// Trust a directory holding at least as many entries as the group has
    /// materials, without asking the remote for per-file metadata (default).
    ///
    /// This cannot notice renamed, replaced or stray files.
    #[default]
    Optimistic,
    /// Always resolve every file name and check each path individually.
    Strict,
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPolicy::Optimistic => write!(f, "optimistic"),
            SyncPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimistic" => Ok(SyncPolicy::Optimistic),
            "strict" => Ok(SyncPolicy::Strict),
            _ => Err(format!("Unknown sync policy: {}", s)),
        }
    }
}

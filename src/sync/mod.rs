//! Sync planning module.
//!
//! Decides which materials already exist locally, under an explicit
//! [`SyncPolicy`](crate::config::SyncPolicy).

pub mod planner;

pub use planner::{plan_sync, SyncPlan};

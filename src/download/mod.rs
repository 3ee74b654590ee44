//! Download module for file content.
//!
//! This module provides:
//! - Direct, export and folder downloads
//! - Per-item outcomes and the run report
//! - Retry with exponential backoff

pub mod materializer;
pub mod report;
pub mod retry;

pub use materializer::{download_file, download_missing};
pub use report::{ItemOutcome, ItemRecord, RunReport};
pub use retry::{with_retry, IsRetryable};

//! classroom-sync - mirror Google Classroom course materials to disk.
//!
//! This library lists the courses of the signed-in user, their course work
//! materials and the Drive files attached to them, and downloads every file
//! that is not present locally yet.
//!
//! # Features
//!
//! - Safe, unique, extension-correct names derived from remote titles
//! - Incremental sync (optimistic or strict existence checks)
//! - Direct downloads with checksum verification
//! - Export of native Google documents to Office formats
//! - One level of Drive folder expansion
//! - Retry with exponential backoff for transient failures
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use classroom_sync::{
//!     catalog::{fetch_catalog, CatalogFilter},
//!     download::download_missing,
//!     output::QuietProgress,
//!     sync::plan_sync,
//!     ClassroomApi, Config,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let api = ClassroomApi::new(&config)?;
//!     let base = config.output_directory();
//!
//!     let filter = CatalogFilter::default();
//!     let mut catalog = fetch_catalog(&api, &filter).await?;
//!     catalog.prepare(&filter);
//!
//!     let policy = config.options.sync_policy;
//!     let plan = plan_sync(&mut catalog, &base, &api, policy, &QuietProgress).await?;
//!     let report = download_missing(&mut catalog, &base, &api, &plan, &QuietProgress).await?;
//!     println!("{} files downloaded", report.downloaded());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod output;
pub mod sync;

// Re-exports for convenience
pub use api::ClassroomApi;
pub use catalog::{Catalog, Material, MaterialKind};
pub use config::{Config, SyncPolicy};
pub use download::{ItemOutcome, RunReport};
pub use error::{Error, Result};
pub use sync::SyncPlan;

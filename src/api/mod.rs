//! Google Classroom and Drive API module.
//!
//! This module provides:
//! - HTTP client with page merging and retry
//! - OAuth2 authentication and token renewal
//! - API response types
//! - The [`CatalogSource`] and [`FileSource`] seams used by the sync core

pub mod auth;
pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{ClassroomApi, PAGE_SIZE};
pub use types::*;

/// Listing side of the remote: courses and their course-work-material items.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<CourseResource>>;

    async fn list_course_work_materials(
        &self,
        course_id: &str,
    ) -> Result<Vec<CourseWorkMaterialResource>>;
}

/// File side of the remote: metadata, content and folder listings.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Size, creation time, MIME type, export links and checksum of a file.
    async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata>;

    /// Content of a binary file.
    async fn download_media(&self, file_id: &str) -> Result<Download>;

    /// Authenticated GET of one of a document's export links.
    async fn fetch_export_link(&self, url: &str) -> Result<Download>;

    /// Server-side conversion of a native document (subject to a size limit).
    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<Download>;

    /// Immediate children of a folder.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<FileMetadata>>;
}

//! Remote catalog module.
//!
//! Provides:
//! - The course / course-work-material / material hierarchy
//! - Listing through a [`CatalogSource`](crate::api::CatalogSource)
//! - Directory and file name resolution over that hierarchy

pub mod fetcher;
pub mod model;

pub use fetcher::fetch_catalog;
pub use model::{
    folder_children, resolve_file_names, Catalog, CatalogFilter, Course, CourseWorkMaterial,
    Material, MaterialKind, UnsupportedAttachment,
};

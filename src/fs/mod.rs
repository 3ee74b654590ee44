//! Filesystem module.
//!
//! Provides:
//! - Filename sanitization and uniqueness
//! - MIME type selection and extensions
//! - Atomic, non-clobbering streamed writes

pub mod mime;
pub mod naming;
pub mod writer;

pub use mime::{add_extension, choose_mime_type};
pub use naming::{assign_directory_names, make_unique_names, title_to_filename, Titled};
pub use writer::NewFile;

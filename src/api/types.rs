//! API response type definitions.

use std::collections::BTreeMap;

use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;

/// A Classroom course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creation_time: String,
}

/// A course-work-material item (a post grouping attachments).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWorkMaterialResource {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub materials: Vec<MaterialAttachment>,
}

/// One attachment of a course-work-material item.
///
/// Only Drive files are mirrored; links, videos and forms are reported.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialAttachment {
    pub drive_file: Option<SharedDriveFile>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl MaterialAttachment {
    /// Space-separated attachment kinds, for warnings about unsupported items.
    pub fn kind_names(&self) -> String {
        let mut names: Vec<&str> = self.other.keys().map(String::as_str).collect();
        if self.drive_file.is_some() {
            names.insert(0, "driveFile");
        }
        names.join(" ")
    }
}

/// Drive file reference wrapper used by Classroom attachments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDriveFile {
    pub drive_file: DriveFileRef,
}

/// Minimal Drive file reference embedded in Classroom payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveFileRef {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Drive file metadata as returned by `files.get` and `files.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Byte size; absent for native Google documents and folders.
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
    pub created_time: Option<String>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub export_links: BTreeMap<String, String>,
    pub md5_checksum: Option<String>,
}

/// Drive encodes int64 values as JSON strings.
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size: {}", n))),
        Some(Value::String(s)) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid size '{}': {}", s, e))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid size: {}",
            other
        ))),
    }
}

/// Chunked response body.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A response whose body has not been read yet.
pub struct Download {
    /// Declared `Content-Type` header, verbatim.
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl Download {
    pub fn new(content_type: Option<String>, body: ByteStream) -> Self {
        Self { content_type, body }
    }
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

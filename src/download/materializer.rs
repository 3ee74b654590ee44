//! Fetching file content and writing it under the output directory.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use md5::{Digest, Md5};

use crate::api::{Download, FileSource};
use crate::catalog::{folder_children, Catalog, Material, MaterialKind};
use crate::download::report::{ItemOutcome, RunReport};
use crate::error::{Error, Result};
use crate::fs::NewFile;
use crate::output::ProgressReporter;
use crate::sync::SyncPlan;

/// Content opened for a material, or why there is none.
enum Content<'a> {
    Stream {
        download: Download,
        md5_checksum: Option<&'a str>,
    },
    Unavailable(String),
}

/// Download every material not marked downloaded.
///
/// Individual failures are recorded in the report and the run continues;
/// only authentication errors abort.
pub async fn download_missing(
    catalog: &mut Catalog,
    base: &Path,
    files: &dyn FileSource,
    plan: &SyncPlan,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let mut report = RunReport {
        unsupported: catalog.unsupported.len(),
        ..Default::default()
    };
    let mut done = 0u64;

    tracing::info!("Downloading {} files...", plan.files_to_download);
    progress.start(plan.files_to_download as u64);

    for course in &mut catalog.courses {
        for group in &mut course.course_work_materials {
            let group_dir = Path::new(&course.dirname).join(&group.dirname);

            for material in &mut group.materials {
                if material.is_downloaded() {
                    report.record(group_dir.join(material.local_name()), ItemOutcome::AlreadyPresent);
                    continue;
                }

                let rel = group_dir.join(&material.filename);
                progress.step(done, &rel.display().to_string());
                done += 1;

                let path = base.join(&rel);
                let complete = if material.is_folder() {
                    expand_folder(files, material, &path, &rel, &mut report).await?
                } else {
                    let outcome = download_file(files, material, &path).await?;
                    record(&mut report, rel, outcome)
                };

                if complete {
                    material.mark_downloaded();
                }
            }
        }
    }

    progress.finish();
    Ok(report)
}

/// Fetch one file and write it to `path`.
///
/// Returns `Err` only for authentication failures.
pub async fn download_file(
    files: &dyn FileSource,
    material: &Material,
    path: &Path,
) -> Result<ItemOutcome> {
    let outcome = match open_content(files, material).await {
        Ok(Content::Stream {
            download,
            md5_checksum,
        }) => match save_stream(download, path, md5_checksum).await {
            Ok(bytes) => ItemOutcome::Downloaded { bytes },
            Err(e) if e.is_authentication() => return Err(e),
            Err(error) => ItemOutcome::Failed { error },
        },
        Ok(Content::Unavailable(reason)) => ItemOutcome::Skipped { reason },
        Err(e) if e.is_authentication() => return Err(e),
        Err(error) => ItemOutcome::Failed { error },
    };

    Ok(outcome)
}

async fn open_content<'a>(files: &dyn FileSource, material: &'a Material) -> Result<Content<'a>> {
    let Some(kind) = material.kind() else {
        return Ok(Content::Unavailable("metadata unavailable".into()));
    };

    match kind {
        MaterialKind::Direct { size } => {
            tracing::debug!("Downloading {} ({} bytes)", material.id, size);
            Ok(Content::Stream {
                download: files.download_media(&material.id).await?,
                md5_checksum: material.md5_checksum.as_deref(),
            })
        }
        MaterialKind::Export {
            mime_type,
            link: Some(link),
        } => {
            let download = files.fetch_export_link(link).await?;
            match download.content_type.as_deref() {
                Some(content_type) if content_type == mime_type => Ok(Content::Stream {
                    download,
                    md5_checksum: None,
                }),
                other => Ok(Content::Unavailable(format!(
                    "export link returned {} instead of {}",
                    other.unwrap_or("no content type"),
                    mime_type
                ))),
            }
        }
        MaterialKind::Export {
            mime_type,
            link: None,
        } => match files.export_file(&material.id, mime_type).await {
            Ok(download) => Ok(Content::Stream {
                download,
                md5_checksum: None,
            }),
            Err(e) if e.is_authentication() => Err(e),
            Err(e) => Ok(Content::Unavailable(format!("export failed: {}", e))),
        },
        MaterialKind::Folder => Ok(Content::Unavailable("nested folder".into())),
    }
}

/// Write a body to `path` chunk by chunk, hashing as it goes.
///
/// Nothing appears at `path` unless the whole body arrived and matched
/// `md5_checksum`.
async fn save_stream(
    mut download: Download,
    path: &Path,
    md5_checksum: Option<&str>,
) -> Result<u64> {
    let mut file = NewFile::create(path).await?;
    let mut hasher = Md5::new();

    while let Some(chunk) = download.body.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write(&chunk).await?;
    }

    verify_checksum(md5_checksum, hasher)?;
    file.persist().await
}

/// Compare against the checksum Drive reported, when there is one.
fn verify_checksum(expected: Option<&str>, hasher: Md5) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = format!("{:x}", hasher.finalize());
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Download the immediate children of a folder into `dir`.
///
/// Children already on disk are kept. Nested folders are skipped and do not
/// count against completeness. Returns whether every file child is present.
async fn expand_folder(
    files: &dyn FileSource,
    folder: &Material,
    dir: &Path,
    rel: &Path,
    report: &mut RunReport,
) -> Result<bool> {
    let listing = match files.list_folder(&folder.id).await {
        Ok(listing) => listing,
        Err(e) if e.is_authentication() => return Err(e),
        Err(error) => {
            record(report, rel.to_path_buf(), ItemOutcome::Failed { error });
            return Ok(false);
        }
    };

    tracing::debug!("Folder {} has {} children", folder.id, listing.len());

    let mut complete = true;
    for child in folder_children(listing) {
        let path = dir.join(&child.filename);
        let child_rel = rel.join(&child.filename);

        if child.is_folder() {
            record(
                report,
                child_rel,
                ItemOutcome::Skipped {
                    reason: "nested folder".into(),
                },
            );
            continue;
        }

        let outcome = if path.is_file() {
            ItemOutcome::AlreadyPresent
        } else {
            download_file(files, &child, &path).await?
        };
        complete &= record(report, child_rel, outcome);
    }

    if complete {
        tokio::fs::create_dir_all(dir).await?;
    }

    Ok(complete)
}

/// Log and record an outcome; returns whether the file is now on disk.
fn record(report: &mut RunReport, rel: PathBuf, outcome: ItemOutcome) -> bool {
    match &outcome {
        ItemOutcome::Downloaded { bytes } => {
            tracing::debug!("Wrote {} ({} bytes)", rel.display(), bytes)
        }
        ItemOutcome::Skipped { reason } => {
            tracing::warn!("Skipped {}: {}", rel.display(), reason)
        }
        ItemOutcome::Failed { error } => {
            tracing::warn!("Failed to download {}: {}", rel.display(), error)
        }
        ItemOutcome::AlreadyPresent => {}
    }

    let present = matches!(
        outcome,
        ItemOutcome::Downloaded { .. } | ItemOutcome::AlreadyPresent
    );
    report.record(rel, outcome);
    present
}

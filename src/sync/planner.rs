//! Sync planning: which materials are already on disk.

use std::path::Path;

use crate::api::FileSource;
use crate::catalog::{folder_children, resolve_file_names, Catalog, CourseWorkMaterial, Material};
use crate::config::SyncPolicy;
use crate::error::Result;
use crate::fs::writer::TEMP_PREFIX;
use crate::output::ProgressReporter;

/// Summary of a planning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Groups with at least one material.
    pub groups_total: usize,
    /// Groups whose metadata had to be fetched.
    pub groups_refreshed: usize,
    /// Materials not found locally.
    pub files_to_download: usize,
}

/// Mark every material already present under `base`.
///
/// Under [`SyncPolicy::Optimistic`] a group directory holding at least as
/// many entries as the group has materials is taken as complete without any
/// remote call. Every other group gets its metadata fetched and its file
/// names resolved, then each path is checked individually. A folder is
/// present when every file it currently lists exists inside its directory.
pub async fn plan_sync(
    catalog: &mut Catalog,
    base: &Path,
    files: &dyn FileSource,
    policy: SyncPolicy,
    progress: &dyn ProgressReporter,
) -> Result<SyncPlan> {
    let mut plan = SyncPlan::default();
    let mut stale = Vec::new();

    for (ci, course) in catalog.courses.iter_mut().enumerate() {
        for (gi, group) in course.course_work_materials.iter_mut().enumerate() {
            if group.materials.is_empty() {
                continue;
            }
            plan.groups_total += 1;

            let dir = base.join(&course.dirname).join(&group.dirname);
            if policy == SyncPolicy::Optimistic && looks_complete(&dir, group.materials.len())? {
                tracing::debug!("{} looks complete", dir.display());
                group.materials.iter_mut().for_each(|m| m.mark_downloaded());
            } else {
                stale.push((ci, gi));
            }
        }
    }

    plan.groups_refreshed = stale.len();
    progress.start(stale.len() as u64);

    for (done, (ci, gi)) in stale.into_iter().enumerate() {
        let course = &mut catalog.courses[ci];
        let dir = base.join(&course.dirname);
        let group = &mut course.course_work_materials[gi];
        let dir = dir.join(&group.dirname);

        progress.step(done as u64, &format!("{}/{}", course.dirname, group.dirname));
        refresh_group(group, files).await?;

        for material in &mut group.materials {
            let path = dir.join(&material.filename);
            let present = if material.is_folder() {
                folder_present(files, material, &path).await?
            } else {
                path.is_file()
            };

            if present {
                material.mark_downloaded();
            } else {
                plan.files_to_download += 1;
            }
        }
    }

    progress.finish();
    tracing::info!(
        "{} of {} groups refreshed, {} files to download",
        plan.groups_refreshed,
        plan.groups_total,
        plan.files_to_download
    );

    Ok(plan)
}

/// Fetch metadata for every material of a group and resolve its file names.
///
/// A material whose metadata cannot be fetched keeps no content strategy and
/// is later skipped; authentication failures abort.
async fn refresh_group(group: &mut CourseWorkMaterial, files: &dyn FileSource) -> Result<()> {
    for material in &mut group.materials {
        match files.file_metadata(&material.id).await {
            Ok(metadata) => material.apply_metadata(metadata),
            Err(e) if e.is_authentication() => return Err(e),
            Err(e) => tracing::warn!("Unable to read metadata of \"{}\": {}", material.title, e),
        }
    }

    resolve_file_names(&mut group.materials);
    Ok(())
}

/// Whether `dir` holds every file child the folder lists now.
///
/// Nested folders are ignored. A listing failure other than authentication
/// counts as not present so the folder is expanded again.
async fn folder_present(files: &dyn FileSource, folder: &Material, dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }

    let listing = match files.list_folder(&folder.id).await {
        Ok(listing) => listing,
        Err(e) if e.is_authentication() => return Err(e),
        Err(e) => {
            tracing::warn!("Unable to list folder \"{}\": {}", folder.title, e);
            return Ok(false);
        }
    };

    Ok(folder_children(listing)
        .iter()
        .filter(|child| !child.is_folder())
        .all(|child| dir.join(&child.filename).is_file()))
}

/// Whether `dir` exists and holds at least `expected` entries.
fn looks_complete(dir: &Path, expected: usize) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if !name.to_string_lossy().starts_with(TEMP_PREFIX) {
            count += 1;
        }
    }

    Ok(count >= expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Download, FileMetadata};
    use crate::catalog::Course;
    use crate::error::Error;
    use crate::fs::mime::{FOLDER_MIME, GOOGLE_DOCUMENT, PDF};
    use crate::output::QuietProgress;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFiles {
        metadata_calls: AtomicUsize,
        deny: bool,
        /// Children returned for any folder.
        listing: Vec<FileMetadata>,
    }

    #[async_trait]
    impl FileSource for CountingFiles {
        async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                return Err(Error::Authentication("token revoked".into()));
            }
            let (mime, size) = if file_id.starts_with("doc") {
                (GOOGLE_DOCUMENT, None)
            } else if file_id.starts_with("dir") {
                (FOLDER_MIME, None)
            } else {
                (PDF, Some(4))
            };
            Ok(FileMetadata {
                id: file_id.to_string(),
                size,
                created_time: Some(format!("2024-01-01T00:00:0{}Z", file_id.len() % 10)),
                mime_type: Some(mime.to_string()),
                ..Default::default()
            })
        }

        async fn download_media(&self, _: &str) -> Result<Download> {
            unreachable!()
        }

        async fn fetch_export_link(&self, _: &str) -> Result<Download> {
            unreachable!()
        }

        async fn export_file(&self, _: &str, _: &str) -> Result<Download> {
            unreachable!()
        }

        async fn list_folder(&self, _: &str) -> Result<Vec<FileMetadata>> {
            Ok(self.listing.clone())
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            courses: vec![Course {
                id: "c".into(),
                title: "Biology".into(),
                creation_time: "2024-01-01".into(),
                dirname: "Biology".into(),
                course_work_materials: vec![CourseWorkMaterial {
                    id: "g".into(),
                    title: "Week 1".into(),
                    creation_time: "2024-01-02".into(),
                    dirname: "Week 1".into(),
                    materials: vec![Material::new("pdf1", "Cells"), Material::new("doc22", "Essay")],
                }],
            }],
            unsupported: Vec::new(),
        }
    }

    fn materials(catalog: &Catalog) -> &[Material] {
        &catalog.courses[0].course_work_materials[0].materials
    }

    #[tokio::test]
    async fn test_fast_path_makes_no_remote_calls() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("Biology").join("Week 1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a"), b"").unwrap();
        std::fs::write(dir.join("b"), b"").unwrap();

        let files = CountingFiles::default();
        let mut catalog = catalog();
        let plan = plan_sync(
            &mut catalog,
            base.path(),
            &files,
            SyncPolicy::Optimistic,
            &QuietProgress,
        )
        .await
        .unwrap();

        assert_eq!(files.metadata_calls.load(Ordering::SeqCst), 0);
        assert!(materials(&catalog).iter().all(Material::is_downloaded));
        assert_eq!(
            plan,
            SyncPlan {
                groups_total: 1,
                groups_refreshed: 0,
                files_to_download: 0
            }
        );
    }

    #[tokio::test]
    async fn test_fast_path_accepts_extra_entries() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("Biology").join("Week 1");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["Cells.pdf", "Essay.docx", "my notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let files = CountingFiles::default();
        let mut catalog = catalog();
        let plan = plan_sync(
            &mut catalog,
            base.path(),
            &files,
            SyncPolicy::Optimistic,
            &QuietProgress,
        )
        .await
        .unwrap();

        assert_eq!(files.metadata_calls.load(Ordering::SeqCst), 0);
        assert!(materials(&catalog).iter().all(Material::is_downloaded));
        assert_eq!(plan.groups_refreshed, 0);
    }

    #[tokio::test]
    async fn test_folder_is_checked_against_its_listing() {
        let child = |id: &str, name: &str, mime: &str| FileMetadata {
            id: id.into(),
            name: name.into(),
            size: Some(1),
            created_time: Some(format!("2024-03-0{}T00:00:00Z", id.len())),
            mime_type: Some(mime.into()),
            ..Default::default()
        };
        let files = CountingFiles {
            listing: vec![
                child("a", "Intro", PDF),
                child("bb", "Lab", PDF),
                child("ccc", "Old", FOLDER_MIME),
            ],
            ..Default::default()
        };
        let folder_catalog = || {
            let mut catalog = catalog();
            catalog.courses[0].course_work_materials[0].materials =
                vec![Material::new("dir1", "Handouts")];
            catalog
        };

        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("Biology").join("Week 1").join("Handouts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Intro.pdf"), b"1").unwrap();

        let mut catalog = folder_catalog();
        let plan = plan_sync(&mut catalog, base.path(), &files, SyncPolicy::Strict, &QuietProgress)
            .await
            .unwrap();
        assert_eq!(plan.files_to_download, 1);
        assert!(!materials(&catalog)[0].is_downloaded());

        std::fs::write(dir.join("Lab.pdf"), b"2").unwrap();

        let mut catalog = folder_catalog();
        let plan = plan_sync(&mut catalog, base.path(), &files, SyncPolicy::Strict, &QuietProgress)
            .await
            .unwrap();
        assert_eq!(plan.files_to_download, 0);
        assert!(materials(&catalog)[0].is_downloaded());
    }

    #[tokio::test]
    async fn test_temp_files_do_not_count() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("Biology").join("Week 1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Cells.pdf"), b"").unwrap();
        std::fs::write(dir.join(format!("{}abc", TEMP_PREFIX)), b"").unwrap();

        let files = CountingFiles::default();
        let mut catalog = catalog();
        let plan = plan_sync(
            &mut catalog,
            base.path(),
            &files,
            SyncPolicy::Optimistic,
            &QuietProgress,
        )
        .await
        .unwrap();

        assert_eq!(plan.groups_refreshed, 1);
        assert_eq!(files.metadata_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_path_checks_each_file() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("Biology").join("Week 1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Cells.pdf"), b"data").unwrap();

        let files = CountingFiles::default();
        let mut catalog = catalog();
        let plan = plan_sync(
            &mut catalog,
            base.path(),
            &files,
            SyncPolicy::Optimistic,
            &QuietProgress,
        )
        .await
        .unwrap();

        let materials = materials(&catalog);
        assert_eq!(materials[0].filename, "Cells.pdf");
        assert!(materials[0].is_downloaded());
        assert_eq!(materials[1].filename, "Essay.docx");
        assert!(!materials[1].is_downloaded());
        assert_eq!(plan.files_to_download, 1);
        assert_eq!(plan.groups_refreshed, 1);
    }

    #[tokio::test]
    async fn test_strict_policy_always_checks() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("Biology").join("Week 1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stray-1"), b"").unwrap();
        std::fs::write(dir.join("stray-2"), b"").unwrap();

        let files = CountingFiles::default();
        let mut catalog = catalog();
        let plan = plan_sync(
            &mut catalog,
            base.path(),
            &files,
            SyncPolicy::Strict,
            &QuietProgress,
        )
        .await
        .unwrap();

        assert_eq!(files.metadata_calls.load(Ordering::SeqCst), 2);
        assert_eq!(plan.files_to_download, 2);
        assert!(materials(&catalog).iter().all(|m| !m.is_downloaded()));
    }

    #[tokio::test]
    async fn test_authentication_failure_aborts() {
        let base = tempfile::tempdir().unwrap();
        let files = CountingFiles {
            deny: true,
            ..Default::default()
        };
        let mut catalog = catalog();
        let result = plan_sync(
            &mut catalog,
            base.path(),
            &files,
            SyncPolicy::Optimistic,
            &QuietProgress,
        )
        .await;

        assert!(matches!(result, Err(Error::Authentication(_))));
    }
}

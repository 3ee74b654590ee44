//! In-memory catalog of courses, course-work-material groups and files.

use std::collections::BTreeMap;

use crate::api::types::{CourseResource, CourseWorkMaterialResource, FileMetadata};
use crate::fs::mime::{add_extension, choose_mime_type, FOLDER_MIME};
use crate::fs::naming::{assign_directory_names, make_unique_names, title_to_filename, Titled};

/// Everything listed from the remote before any download starts.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub courses: Vec<Course>,
    /// Attachments that are not Drive files (links, videos, forms).
    pub unsupported: Vec<UnsupportedAttachment>,
}

/// An attachment that cannot be mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedAttachment {
    pub course_id: String,
    pub course_work_material_id: String,
    pub kinds: String,
}

/// Restricts a run to some courses and/or course-work-material items.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub course_ids: Vec<String>,
    pub material_ids: Vec<String>,
}

impl CatalogFilter {
    pub fn includes_course(&self, id: &str) -> bool {
        self.course_ids.is_empty() || self.course_ids.iter().any(|c| c == id)
    }

    pub fn includes_material(&self, id: &str) -> bool {
        self.material_ids.is_empty() || self.material_ids.iter().any(|m| m == id)
    }
}

#[derive(Debug, Clone)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub creation_time: String,
    pub dirname: String,
    pub course_work_materials: Vec<CourseWorkMaterial>,
}

#[derive(Debug, Clone)]
pub struct CourseWorkMaterial {
    pub id: String,
    pub title: String,
    pub creation_time: String,
    pub dirname: String,
    pub materials: Vec<Material>,
}

/// How a file's content is obtained, decided once from its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialKind {
    /// Binary file downloaded as is.
    Direct { size: u64 },
    /// Native document converted by the server, through one of its export
    /// links when available, otherwise through the export endpoint.
    Export {
        mime_type: String,
        link: Option<String>,
    },
    /// Drive folder, expanded one level.
    Folder,
}

impl MaterialKind {
    /// Classify a file: anything with a size is binary; otherwise pick the
    /// export format and prefer a matching export link.
    pub fn classify(
        size: Option<u64>,
        mime_type: Option<&str>,
        export_links: &BTreeMap<String, String>,
    ) -> Self {
        if let Some(size) = size {
            return MaterialKind::Direct { size };
        }

        let native = mime_type.unwrap_or_default();
        let choices: Vec<&str> = export_links.keys().map(String::as_str).collect();
        let export_mime = choose_mime_type(&choices, native);

        if let Some(link) = export_links.get(&export_mime) {
            return MaterialKind::Export {
                mime_type: export_mime,
                link: Some(link.clone()),
            };
        }

        if native == FOLDER_MIME {
            return MaterialKind::Folder;
        }

        MaterialKind::Export {
            mime_type: export_mime,
            link: None,
        }
    }
}

/// One Drive file or folder attached to a course-work-material item.
#[derive(Debug, Clone)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub size: Option<u64>,
    pub creation_time: Option<String>,
    pub mime_type: Option<String>,
    pub export_links: BTreeMap<String, String>,
    pub md5_checksum: Option<String>,
    kind: Option<MaterialKind>,
    downloaded: bool,
}

impl Material {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            filename: String::new(),
            size: None,
            creation_time: None,
            mime_type: None,
            export_links: BTreeMap::new(),
            md5_checksum: None,
            kind: None,
            downloaded: false,
        }
    }

    /// Build a material from a folder listing entry.
    pub fn from_metadata(metadata: FileMetadata) -> Self {
        let mut material = Self::new(metadata.id.clone(), metadata.name.clone());
        material.apply_metadata(metadata);
        material
    }

    /// Record remote metadata and decide how the content will be fetched.
    pub fn apply_metadata(&mut self, metadata: FileMetadata) {
        self.size = metadata.size;
        self.creation_time = metadata.created_time;
        self.mime_type = metadata.mime_type;
        self.export_links = metadata.export_links;
        self.md5_checksum = metadata.md5_checksum;
        self.kind = Some(MaterialKind::classify(
            self.size,
            self.mime_type.as_deref(),
            &self.export_links,
        ));
    }

    /// Content strategy, once metadata has been applied.
    pub fn kind(&self) -> Option<&MaterialKind> {
        self.kind.as_ref()
    }

    /// MIME type the file will have on disk.
    pub fn effective_mime_type(&self) -> Option<&str> {
        match &self.kind {
            Some(MaterialKind::Export { mime_type, .. }) => Some(mime_type),
            _ => self.mime_type.as_deref(),
        }
    }

    /// Resolved file name, or the sanitized title when names were never
    /// resolved (groups taken as complete without metadata).
    pub fn local_name(&self) -> String {
        if self.filename.is_empty() {
            title_to_filename(&self.title)
        } else {
            self.filename.clone()
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, Some(MaterialKind::Folder))
    }

    pub fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    /// Record that the file is present locally. Never reset within a run.
    pub fn mark_downloaded(&mut self) {
        self.downloaded = true;
    }
}

impl Titled for Course {
    fn title(&self) -> &str {
        &self.title
    }
    fn creation_time(&self) -> &str {
        &self.creation_time
    }
    fn set_resolved_name(&mut self, name: String) {
        self.dirname = name;
    }
}

impl Titled for CourseWorkMaterial {
    fn title(&self) -> &str {
        &self.title
    }
    fn creation_time(&self) -> &str {
        &self.creation_time
    }
    fn set_resolved_name(&mut self, name: String) {
        self.dirname = name;
    }
}

impl Titled for Material {
    fn title(&self) -> &str {
        &self.title
    }
    fn creation_time(&self) -> &str {
        self.creation_time.as_deref().unwrap_or_default()
    }
    fn set_resolved_name(&mut self, name: String) {
        self.filename = name;
    }
}

/// Sort files by creation time and assign unique, extension-correct names.
///
/// Expects metadata to be applied already; files without it keep their
/// sanitized title.
pub fn resolve_file_names(materials: &mut [Material]) {
    materials.sort_by(|a, b| a.creation_time().cmp(b.creation_time()));

    let names: Vec<String> = materials
        .iter()
        .map(|m| {
            let name = title_to_filename(&m.title);
            match m.effective_mime_type() {
                Some(mime) => add_extension(&name, mime),
                None => name,
            }
        })
        .collect();

    for (material, name) in materials.iter_mut().zip(make_unique_names(&names, true)) {
        material.set_resolved_name(name);
    }
}

/// Materials for the entries of a folder listing, with resolved names.
pub fn folder_children(listing: Vec<FileMetadata>) -> Vec<Material> {
    let mut children: Vec<Material> = listing.into_iter().map(Material::from_metadata).collect();
    resolve_file_names(&mut children);
    children
}

impl From<CourseResource> for Course {
    fn from(course: CourseResource) -> Self {
        Self {
            id: course.id,
            title: course.name,
            creation_time: course.creation_time,
            dirname: String::new(),
            course_work_materials: Vec::new(),
        }
    }
}

impl CourseWorkMaterial {
    /// Build a group from its resource, keeping only Drive file attachments.
    ///
    /// Returns the group and the kinds of every skipped attachment.
    pub fn from_resource(resource: CourseWorkMaterialResource) -> (Self, Vec<String>) {
        let mut materials = Vec::new();
        let mut skipped = Vec::new();

        for attachment in resource.materials {
            match attachment.drive_file {
                Some(shared) => {
                    materials.push(Material::new(shared.drive_file.id, shared.drive_file.title))
                }
                None => skipped.push(attachment.kind_names()),
            }
        }

        let group = Self {
            id: resource.id,
            title: resource.title,
            creation_time: resource.creation_time,
            dirname: String::new(),
            materials,
        };
        (group, skipped)
    }
}

impl Catalog {
    /// Resolve directory names top-down, then drop unselected entries.
    ///
    /// Names are computed over complete sibling lists so that a filtered run
    /// uses the same directories as a full one.
    pub fn prepare(&mut self, filter: &CatalogFilter) {
        assign_directory_names(&mut self.courses);
        for course in &mut self.courses {
            assign_directory_names(&mut course.course_work_materials);
        }

        self.courses.retain(|c| filter.includes_course(&c.id));
        for course in &mut self.courses {
            course
                .course_work_materials
                .retain(|m| filter.includes_material(&m.id));
        }
        if !filter.material_ids.is_empty() {
            self.courses.retain(|c| !c.course_work_materials.is_empty());
        }
    }

    pub fn group_count(&self) -> usize {
        self.courses
            .iter()
            .map(|c| c.course_work_materials.len())
            .sum()
    }

    pub fn material_count(&self) -> usize {
        self.courses
            .iter()
            .flat_map(|c| &c.course_work_materials)
            .map(|m| m.materials.len())
            .sum()
    }
}

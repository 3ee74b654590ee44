//! Catalog listing.

use crate::api::CatalogSource;
use crate::catalog::model::{Catalog, CatalogFilter, Course, CourseWorkMaterial, UnsupportedAttachment};
use crate::error::Result;

/// List every course and its course-work-material items.
///
/// Courses excluded by `filter` are still listed (their names take part in
/// directory naming) but their items are not fetched. Attachments that are
/// not Drive files are skipped with a warning and kept in
/// [`Catalog::unsupported`].
pub async fn fetch_catalog(source: &dyn CatalogSource, filter: &CatalogFilter) -> Result<Catalog> {
    tracing::info!("Listing courses...");
    let resources = source.list_courses().await?;
    tracing::debug!("Found {} courses", resources.len());

    let mut catalog = Catalog::default();

    for resource in resources {
        let mut course = Course::from(resource);

        if !filter.includes_course(&course.id) {
            tracing::debug!("Skipping listing of filtered course {}", course.id);
            catalog.courses.push(course);
            continue;
        }

        let items = source.list_course_work_materials(&course.id).await?;
        tracing::debug!(
            "Course {} has {} course work materials",
            course.id,
            items.len()
        );

        for item in items {
            let (group, skipped) = CourseWorkMaterial::from_resource(item);

            for kinds in skipped {
                tracing::warn!(
                    "Skipping unsupported material ({}) in \"{}\"",
                    kinds,
                    group.title
                );
                catalog.unsupported.push(UnsupportedAttachment {
                    course_id: course.id.clone(),
                    course_work_material_id: group.id.clone(),
                    kinds,
                });
            }

            course.course_work_materials.push(group);
        }

        catalog.courses.push(course);
    }

    Ok(catalog)
}

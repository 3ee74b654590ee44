//! Console output utilities.

use console::style;

use crate::catalog::Catalog;
use crate::config::Config;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     classroom-sync                                    ║
║     Mirror Google Classroom materials to disk         ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(config: &Config) {
    let options = &config.options;

    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Directory: {}", config.output_directory().display());
    println!("  Policy: {}", options.sync_policy);
    if !options.course_ids.is_empty() {
        println!("  Courses: {}", options.course_ids.join(", "));
    }
    if !options.material_ids.is_empty() {
        println!("  Materials: {}", options.material_ids.join(", "));
    }
    if options.list_only {
        println!("  Mode: list only");
    }
    println!();
}

/// Print the catalog as a tree of local directory names and remote titles.
pub fn print_catalog(catalog: &Catalog) {
    for course in &catalog.courses {
        println!(
            "{} {}",
            style(&course.dirname).bold(),
            style(format!("({})", course.id)).dim()
        );
        for group in &course.course_work_materials {
            println!(
                "  {} {}",
                style(&group.dirname).cyan(),
                style(format!("({})", group.id)).dim()
            );
            for material in &group.materials {
                println!("    {}", material.title);
            }
        }
    }

    println!();
    println!(
        "{} courses, {} course work materials, {} files",
        catalog.courses.len(),
        catalog.group_count(),
        catalog.material_count()
    );
    if !catalog.unsupported.is_empty() {
        println!(
            "{} unsupported attachments",
            style(catalog.unsupported.len()).yellow()
        );
    }
}

//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, SyncPolicy};

/// Google Classroom materials mirror CLI.
#[derive(Parser, Debug)]
#[command(
    name = "classroom-sync",
    version,
    about = "Mirror Google Classroom course materials into a local directory",
    long_about = "Downloads the Drive files attached to course work materials of every \
                  Google Classroom course you belong to.\n\n\
                  Files already present locally are skipped, so running it again only \
                  fetches what is new."
)]
pub struct Args {
    /// Root directory of the mirror.
    #[arg(short, long = "output", env = "CLASSROOM_SYNC_OUTPUT")]
    pub output_directory: Option<PathBuf>,

    /// Print courses and materials without downloading.
    #[arg(short, long)]
    pub list_only: bool,

    /// Only sync this course ID (repeatable).
    #[arg(long = "course", value_name = "ID")]
    pub courses: Vec<String>,

    /// Only sync this course work material ID (repeatable).
    #[arg(long = "material", value_name = "ID")]
    pub materials: Vec<String>,

    /// Check every file individually instead of trusting directory entry counts.
    #[arg(long)]
    pub strict: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml", env = "CLASSROOM_SYNC_CONFIG")]
    pub config: PathBuf,

    /// OAuth client secrets file (credentials.json).
    #[arg(long, env = "CLASSROOM_SYNC_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Token cache file (token.json).
    #[arg(long, env = "CLASSROOM_SYNC_TOKEN")]
    pub token: Option<PathBuf>,

    /// Number of retries for transient failures (0 disables retrying).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Hide progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if let Some(dir) = self.output_directory {
            config.options.output_directory = Some(dir);
        }

        if let Some(path) = self.credentials {
            config.auth.client_secrets = Some(path);
        }

        if let Some(path) = self.token {
            config.auth.token_cache = Some(path);
        }

        // Filters replace the configured ones rather than extending them
        if !self.courses.is_empty() {
            config.options.course_ids = self.courses;
        }

        if !self.materials.is_empty() {
            config.options.material_ids = self.materials;
        }

        if let Some(retries) = self.retries {
            config.retry.max_attempts = retries;
        }

        // Boolean flags (only override if set)
        if self.list_only {
            config.options.list_only = true;
        }

        if self.strict {
            config.options.sync_policy = SyncPolicy::Strict;
        }

        if self.quiet {
            config.options.show_progress = false;
        }
    }
}

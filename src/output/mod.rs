//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars
//! - Run report printing

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_catalog, print_config_summary, print_error, print_info, print_success,
    print_warning,
};
pub use progress::{create_reporter, BarProgress, ProgressReporter, QuietProgress};
pub use stats::{print_plan, print_report};

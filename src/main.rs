//! classroom-sync - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use classroom_sync::{
    api::ClassroomApi,
    catalog::{fetch_catalog, CatalogFilter},
    cli::Args,
    config::{validate_config, Config},
    download::download_missing,
    error::{exit_codes, Error, Result},
    output::{
        create_reporter, print_banner, print_catalog, print_config_summary, print_error,
        print_info, print_plan, print_report, print_success, print_warning,
    },
    sync::plan_sync,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Authentication(_)
                | Error::Api(_)
                | Error::RateLimited
                | Error::HttpStatus { .. }
                | Error::Http(_) => ExitCode::from(exit_codes::API_ERROR as u8),
                Error::Download(_) | Error::ChecksumMismatch { .. } | Error::FileExists(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        let config = Config::default();
        match config.save(&config_path) {
            Ok(()) => print_info(&format!(
                "Wrote default configuration to {}",
                config_path.display()
            )),
            Err(e) => print_warning(&format!(
                "Could not write default configuration to {}: {}",
                config_path.display(),
                e
            )),
        }
        config
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    validate_config(&config)?;
    print_config_summary(&config);

    // Authenticate before any listing so an interactive login happens up front
    print_info("Authenticating...");
    let api = ClassroomApi::new(&config)?;
    api.authenticate().await?;

    print_info("Reading courses...");
    let filter = CatalogFilter {
        course_ids: config.options.course_ids.clone(),
        material_ids: config.options.material_ids.clone(),
    };
    let mut catalog = fetch_catalog(&api, &filter).await?;
    catalog.prepare(&filter);

    if config.options.list_only {
        print_catalog(&catalog);
        return Ok(exit_codes::SUCCESS);
    }

    let base = config.output_directory();
    let show_progress = config.options.show_progress;

    print_info("Retrieving file list...");
    let progress = create_reporter(show_progress, "Checking");
    let plan = plan_sync(
        &mut catalog,
        &base,
        &api,
        config.options.sync_policy,
        progress.as_ref(),
    )
    .await?;
    print_plan(&plan);

    let progress = create_reporter(show_progress, "Downloading");
    let report = download_missing(&mut catalog, &base, &api, &plan, progress.as_ref()).await?;
    print_report(&report);

    if report.failed() > 0 {
        print_warning(&format!("{} file(s) failed", report.failed()));
        return Ok(exit_codes::SOME_FILES_FAILED);
    }

    print_success(&format!("Mirror up to date in {}", base.display()));
    Ok(exit_codes::SUCCESS)
}

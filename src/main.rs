//! poetry-check-existing - Checks whether a project version is already published.
//!
//! CLI entry point.

use clap::Parser;
use poetry_check_existing::notify::ConsoleOutput;
use poetry_check_existing::registry::HttpSessionFactory;
use poetry_check_existing::{
    CheckConfig, CheckRequest, Commands, Config, ExistenceChecker, PoetryConfig, Project,
};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("poetry_check_existing=debug,info")
    } else {
        EnvFilter::new("poetry_check_existing=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match config.command {
        Commands::CheckExisting(check_config) => {
            if let Err(code) = run_check(check_config).await {
                return code;
            }
        }
    }

    ExitCode::SUCCESS
}

async fn run_check(check_config: CheckConfig) -> Result<(), ExitCode> {
    let console = ConsoleOutput::new();
    console.print_start();

    let project_dir = match check_config.project_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to resolve project directory: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let project = match Project::from_dir(&project_dir) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to read project: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };
    console.print_project(project.identity());

    let poetry_config = match PoetryConfig::load(project.root()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load Poetry configuration: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let checker = ExistenceChecker::new(
        project.identity(),
        &poetry_config,
        &poetry_config,
        HttpSessionFactory,
    );

    match checker.check_existing(&CheckRequest::from(&check_config)).await {
        Ok(_) => {
            console.print_not_found(project.identity());
            Ok(())
        }
        // Already logged by the checker.
        Err(_) => Err(ExitCode::FAILURE),
    }
}

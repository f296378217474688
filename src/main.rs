//! Site Rollback CLI
//!
//! A command-line tool for unattended rollback of web sites on a remote host
//! over SSH.

use clap::Parser;
use site_rollback::cli::{
    args::{Cli, Commands},
    commands::{inspect, rollback, status},
};
use site_rollback::models::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = load_config();

    // Run the appropriate command
    match cli.command {
        Commands::Rollback {
            site,
            path,
            backup,
            temp_root,
            backup_root,
            report,
        } => {
            let result = rollback::rollback(
                &config,
                rollback::RollbackArgs {
                    site,
                    path,
                    backup,
                    temp_root,
                    backup_root,
                    report,
                    skip_preflight: cli.skip_preflight,
                },
            )
            .await?;

            std::process::exit(result.outcome.exit_code());
        }

        Commands::Inspect { backup_path } => {
            inspect::inspect(&config, &backup_path).await?;
        }

        Commands::Status { site } => {
            status::status(&config, &site).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("site_rollback=debug")
    } else {
        EnvFilter::new("site_rollback=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

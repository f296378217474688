//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Site Rollback - Unattended web site rollback over SSH
#[derive(Parser, Debug)]
#[command(name = "site-rollback")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Roll a site back to the content of a backup location
    Rollback {
        /// Name of the site (systemd unit) on the remote host
        #[arg(value_name = "SITE")]
        site: String,

        /// Remote path of the live site content
        #[arg(short = 'p', long, value_name = "SITE_PATH")]
        path: String,

        /// Remote path of the backup source (archive or directory)
        #[arg(short = 'b', long, value_name = "BACKUP_PATH")]
        backup: String,

        /// Remote root for temporary staging directories
        #[arg(long, value_name = "TEMP_ROOT")]
        temp_root: Option<String>,

        /// Remote root for preventive backups
        #[arg(long, value_name = "BACKUP_ROOT")]
        backup_root: Option<String>,

        /// Write the run report JSON to this local path
        #[arg(short, long, value_name = "REPORT")]
        report: Option<PathBuf>,
    },

    /// Classify a backup location without touching anything
    Inspect {
        /// Remote path of the backup source
        #[arg(value_name = "BACKUP_PATH")]
        backup_path: String,
    },

    /// Show the observed state of a site
    Status {
        /// Name of the site (systemd unit) on the remote host
        #[arg(value_name = "SITE")]
        site: String,
    },
}

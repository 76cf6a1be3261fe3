// logward CLI - access log summary, log archiving and system snapshot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logward_core::archive::{run_archive, ArchiveFormat};
use logward_core::config::ArchiveOverrides;
use logward_core::{aggregate_file, collect_snapshot, init_logging, ConfigManager, LogwardConfig, OutputFormat, OutputWriter};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "logward")]
#[command(about = "Small operations toolkit for web server logs and host health", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $LOGWARD_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Report format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an access log: top client IPs, paths and status codes
    Aggregate {
        /// Access log to read (defaults to the configured access log)
        log_file: Option<PathBuf>,

        /// Number of entries per ranking
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Compress log files older than N days
    Archive {
        /// Directory holding the logs
        log_dir: PathBuf,

        /// Where archives are written (defaults to <LOG_DIR>/archive)
        #[arg(short, long)]
        archive_dir: Option<PathBuf>,

        /// Only files older than this many days are archived
        #[arg(short, long)]
        days: Option<u64>,

        /// Archive format: tar.gz, zip or individual
        #[arg(short, long)]
        format: Option<String>,

        /// Delete originals once they are safely archived
        #[arg(long)]
        delete: bool,

        /// Show what would be done without touching any file
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Print CPU, memory, disk usage and the busiest processes
    Snapshot {
        /// Mount point whose disk usage is reported
        #[arg(short, long)]
        mount: Option<PathBuf>,

        /// Number of processes per table
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a configuration file with the default values
    Init,
    /// Print the effective configuration (file plus environment)
    Show,
    /// Print the configuration file location
    Path,
}

fn main() {
    // Usage errors exit 1 like every other failure; help and version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let manager = locate_config(cli.config, ConfigManager::new);
    let mut out = OutputWriter::stdout(cli.output);

    match cli.command {
        Commands::Aggregate { log_file, top } => {
            let config = load_config(manager.as_ref())?;
            let settings = config.aggregate_settings(log_file, top);
            let summary = aggregate_file(&settings)?;
            out.write_access_summary(&summary)?;
        }

        Commands::Archive {
            log_dir,
            archive_dir,
            days,
            format,
            delete,
            dry_run,
        } => {
            let format = format.map(|f| f.parse::<ArchiveFormat>()).transpose()?;
            let config = load_config(manager.as_ref())?;
            let settings = config.archive_settings(
                log_dir,
                ArchiveOverrides {
                    archive_dir,
                    max_age_days: days,
                    format,
                    delete_originals: delete,
                    dry_run,
                },
            );

            let report = run_archive(&settings)?;
            out.write_archive_report(&report)?;

            if !report.failures.is_empty() {
                warn!("{} file(s) could not be archived", report.failures.len());
            }
        }

        Commands::Snapshot { mount, top } => {
            let config = load_config(manager.as_ref())?;
            let settings = config.snapshot_settings(mount, top);
            let snapshot = collect_snapshot(&settings).context("Failed to collect system snapshot")?;
            out.write_snapshot(&snapshot)?;
        }

        Commands::Config { action } => {
            let manager = manager.context("Could not determine a configuration file location; pass --config")?;
            handle_config_command(&manager, action)?
        }
    }

    Ok(())
}

/// An explicit `--config` path wins. Otherwise the default location is
/// looked up; without one the tools still run on defaults plus environment.
fn locate_config(explicit: Option<PathBuf>, locate: impl FnOnce() -> Result<ConfigManager>) -> Option<ConfigManager> {
    if let Some(path) = explicit {
        return Some(ConfigManager::with_path(path));
    }
    match locate() {
        Ok(manager) => {
            debug!("Using configuration at {}", manager.config_path().display());
            Some(manager)
        }
        Err(e) => {
            debug!("No configuration file location ({:#}), using defaults", e);
            None
        }
    }
}

fn load_config(manager: Option<&ConfigManager>) -> Result<LogwardConfig> {
    match manager {
        Some(manager) => manager.load(),
        None => {
            let mut config = LogwardConfig::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }
}

fn handle_config_command(manager: &ConfigManager, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Init => {
            manager.create_default_config()?;
            println!("✓ Wrote default configuration to {}", manager.config_path().display());
        }
        ConfigCommands::Show => {
            let config: LogwardConfig = manager.load()?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigCommands::Path => {
            println!("{}", manager.config_path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_location_falls_back_to_defaults() {
        let manager = locate_config(None, || Err(anyhow::anyhow!("Could not determine config directory")));
        assert!(manager.is_none());
        assert_eq!(load_config(manager.as_ref()).unwrap().archive.max_age_days, 7);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let manager = locate_config(Some(PathBuf::from("/etc/logward.toml")), || {
            panic!("default location must not be consulted")
        })
        .unwrap();
        assert_eq!(manager.config_path(), std::path::Path::new("/etc/logward.toml"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

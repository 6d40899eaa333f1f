//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `inspect`: classification, probing, strategy and verification
//! - `import`: scanning and importing into the library
//! - `setup`: writing a starter config file

mod import;
mod inspect;
mod setup;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::quality::MediaFamily;
use crate::transfer::FileStrategy;

pub use import::{ImportArgs, cmd_import, cmd_scan};
pub use inspect::{cmd_classify, cmd_probe, cmd_strategy, cmd_verify};
pub use setup::cmd_init;

/// media-intake CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: the user config directory)
    #[arg(long, global = true, env = "MEDIA_INTAKE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file (to --config, else the user config directory)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Classify the quality of file or release names
    Classify {
        /// Names to classify
        #[arg(required = true)]
        names: Vec<String>,
        /// Media family ladder to classify against
        #[arg(short, long, value_enum, default_value_t = MediaFamily::Music)]
        family: MediaFamily,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Probe a file's technical media info with ffprobe
    Probe {
        /// Path to the media file
        path: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show which transfer strategy would be used between two paths
    Strategy {
        source: PathBuf,
        destination: PathBuf,
        /// Preferred strategy (always wins)
        #[arg(long, value_enum)]
        prefer: Option<FileStrategy>,
    },
    /// Verify that a destination file matches its source
    Verify {
        source: PathBuf,
        destination: PathBuf,
        /// Compare sizes only
        #[arg(long)]
        no_checksum: bool,
    },
    /// Scan a directory and show what each candidate was classified as
    Scan {
        /// Directory (or single file) to scan
        path: PathBuf,
        #[arg(short, long, value_enum, default_value_t = MediaFamily::Music)]
        family: MediaFamily,
    },
    /// Import a directory of candidates into the library
    Import {
        /// Directory (or single file) to import from
        path: PathBuf,
        #[arg(short, long, value_enum, default_value_t = MediaFamily::Music)]
        family: MediaFamily,
        /// Library root (overrides config)
        #[arg(short, long)]
        library: Option<PathBuf>,
        /// Catalog database path (overrides config)
        #[arg(long)]
        database: Option<PathBuf>,
        /// Transfer strategy (overrides config and mount detection)
        #[arg(short, long, value_enum)]
        strategy: Option<FileStrategy>,
        /// Dry run - show decisions and destinations without transferring
        #[arg(long)]
        dry_run: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = load_config(cli);

    match &cli.command {
        Commands::Init { force } => cmd_init(cli.config.as_deref(), *force),
        Commands::Classify {
            names,
            family,
            json,
        } => cmd_classify(names, *family, *json),
        Commands::Probe { path, json } => cmd_probe(&rt, &config, path, *json),
        Commands::Strategy {
            source,
            destination,
            prefer,
        } => cmd_strategy(source, destination, *prefer),
        Commands::Verify {
            source,
            destination,
            no_checksum,
        } => cmd_verify(&rt, source, destination, !*no_checksum),
        Commands::Scan { path, family } => cmd_scan(&rt, &config, path, *family),
        Commands::Import {
            path,
            family,
            library,
            database,
            strategy,
            dry_run,
        } => cmd_import(
            &rt,
            &config,
            ImportArgs {
                path: path.clone(),
                family: *family,
                library: library.clone(),
                database: database.clone(),
                strategy: *strategy,
                dry_run: *dry_run,
            },
        ),
    }
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from([
            "intake",
            "import",
            "/downloads",
            "--family",
            "movie",
            "--strategy",
            "copy",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Import {
                family,
                strategy,
                dry_run,
                library,
                ..
            } => {
                assert_eq!(family, MediaFamily::Movie);
                assert_eq!(strategy, Some(FileStrategy::Copy));
                assert!(dry_run);
                assert!(library.is_none());
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_parse_init_with_config_path() {
        let cli =
            Cli::try_parse_from(["intake", "init", "--force", "--config", "/tmp/intake.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/intake.toml")));
    }

    #[test]
    fn test_classify_requires_names() {
        assert!(Cli::try_parse_from(["intake", "classify"]).is_err());
    }
}

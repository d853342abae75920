//! Silica CLI: turns a decompiled syntax tree into VHDL.
//!
//! `silica generate` runs the whole pipeline and writes the hardware source
//! with its manifest; `silica devices` lists the built-in device catalog.

#![warn(missing_docs)]

mod devices;
mod generate;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Silica: managed code in, VHDL out.
#[derive(Parser, Debug)]
#[command(name = "silica", version, about = "Silica hardware generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate hardware from a syntax tree.
    Generate(GenerateArgs),
    /// List supported devices.
    Devices,
}

/// Arguments for the `silica generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Syntax tree in JSON form.
    #[arg(long)]
    pub tree: PathBuf,

    /// Configuration file (defaults to `silica.toml` in the current directory).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory.
    #[arg(long, default_value = "hardware")]
    pub out: PathBuf,

    /// Directory for cached hardware descriptions.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs { quiet: cli.quiet };
    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Devices => devices::run(),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_generate() {
        let cli = Cli::parse_from([
            "silica",
            "generate",
            "--tree",
            "tree.json",
            "--config",
            "silica.toml",
            "--out",
            "build",
        ]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.tree, PathBuf::from("tree.json"));
                assert_eq!(args.config, Some(PathBuf::from("silica.toml")));
                assert_eq!(args.out, PathBuf::from("build"));
                assert!(args.cache_dir.is_none());
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn generate_defaults() {
        let cli = Cli::parse_from(["silica", "generate", "--tree", "t.json"]);
        match cli.command {
            Command::Generate(args) => {
                assert!(args.config.is_none());
                assert_eq!(args.out, PathBuf::from("hardware"));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_devices_with_global_flags() {
        let cli = Cli::parse_from(["silica", "-q", "devices"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Command::Devices));
    }

    #[test]
    fn tree_is_required() {
        assert!(Cli::try_parse_from(["silica", "generate"]).is_err());
    }
}

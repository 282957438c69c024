use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "scaffold", version, about = "Generate a project skeleton from a catalog")]
pub struct Cli {
    /// Catalog TOML to use instead of the discovered or built-in one.
    #[arg(short = 'c', long = "catalog", global = true)]
    pub catalog: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wipe the root and rebuild the whole tree (the default).
    Build(BuildArgs),
    /// Inspect, validate, or export catalogs.
    Catalog {
        #[command(subcommand)]
        command: Option<CatalogCommand>,
    },
}

#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Directory to generate into. Defaults to the catalog's project name.
    #[arg(short = 'r', long = "root")]
    pub root: Option<PathBuf>,
    /// Reject duplicate or dangling catalog entries instead of letting the last write win.
    #[arg(long = "strict", default_value_t = false)]
    pub strict: bool,
    /// Print what would be created without touching the filesystem.
    #[arg(short = 'n', long = "dry-run", default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    Show,
    Path,
    Check,
    /// Write the built-in catalog as TOML so it can be edited.
    Export {
        #[arg()]
        path: Option<PathBuf>,
        #[arg(long = "force", default_value_t = false)]
        force: bool,
    },
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}

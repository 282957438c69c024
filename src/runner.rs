use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};

use crate::build;
use crate::catalog::{self, Catalog, CatalogSource};
use crate::cli::{BuildArgs, CatalogCommand, Cli, Command};
use crate::tree::{self, TreeBuilder};

const DEFAULT_EXPORT_PATH: &str = "scaffold.toml";

pub fn run(cli: Cli) -> Result<()> {
    let explicit = cli.catalog.map(utf8).transpose()?;
    match cli.command {
        None => handle_build(explicit.as_deref(), BuildArgs::default()),
        Some(Command::Build(args)) => handle_build(explicit.as_deref(), args),
        Some(Command::Catalog { command }) => handle_catalog(explicit.as_deref(), command),
    }
}

fn handle_build(explicit: Option<&Utf8Path>, args: BuildArgs) -> Result<()> {
    let (source, catalog) = load_catalog(explicit)?;
    tracing::info!(catalog = %source, project = %catalog.name, "loaded catalog");

    if args.strict {
        catalog.validate()?;
    } else {
        for problem in catalog.problems() {
            tracing::warn!("{problem}; last write wins");
        }
    }

    let root = match args.root {
        Some(root) => utf8(root)?,
        None => default_root(&catalog)?,
    };
    let builder = TreeBuilder::new(root).dry_run(args.dry_run);
    build::build(&catalog, &builder)?;
    Ok(())
}

/// The catalog name becomes the root only when it is one plain directory
/// name; anything else could point the reset at the cwd or above it.
fn default_root(catalog: &Catalog) -> Result<Utf8PathBuf> {
    if catalog.name.trim().is_empty() || !tree::is_plain_name(&catalog.name) {
        bail!(
            "catalog name `{}` cannot be used as the root directory; pass --root",
            catalog.name
        );
    }
    Ok(Utf8PathBuf::from(&catalog.name))
}

fn handle_catalog(explicit: Option<&Utf8Path>, command: Option<CatalogCommand>) -> Result<()> {
    match command {
        None | Some(CatalogCommand::Show) => {
            let (source, catalog) = load_catalog(explicit)?;
            println!("Catalog: {}", source);
            println!("{}", catalog::format_summary(&catalog));
            Ok(())
        }
        Some(CatalogCommand::Path) => {
            let source = resolve_source(explicit)?;
            println!("Catalog: {}", source);
            Ok(())
        }
        Some(CatalogCommand::Check) => {
            let (source, catalog) = load_catalog(explicit)?;
            catalog
                .validate()
                .with_context(|| format!("checking catalog {}", source))?;
            println!("Catalog OK: {}", source);
            println!("{}", catalog::format_summary(&catalog));
            Ok(())
        }
        Some(CatalogCommand::Export { path, force }) => {
            let target = match path {
                Some(path) => utf8(path)?,
                None => Utf8PathBuf::from(DEFAULT_EXPORT_PATH),
            };
            catalog::write_builtin(&target, force)?;
            if force {
                println!("Overwrote catalog at {}", target);
            } else {
                println!("Wrote built-in catalog to {}", target);
            }
            Ok(())
        }
    }
}

fn resolve_source(explicit: Option<&Utf8Path>) -> Result<CatalogSource> {
    let cwd = utf8(std::env::current_dir().context("determining current directory")?)?;
    let home = dirs::home_dir().and_then(|home| Utf8PathBuf::from_path_buf(home).ok());
    let source = catalog::resolve(explicit, &cwd, home.as_deref())?;
    tracing::debug!(source = source.as_str(), "resolved catalog");
    Ok(source)
}

fn load_catalog(explicit: Option<&Utf8Path>) -> Result<(CatalogSource, Catalog)> {
    let source = resolve_source(explicit)?;
    let catalog = source.load()?;
    Ok((source, catalog))
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| anyhow!("path {} is not valid UTF-8", path.display()))
}

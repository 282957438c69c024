use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as _};
use std::fs;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::content::SOURCE_EXTENSION;
use crate::tree::{is_contained, is_plain_name};

#[derive(RustEmbed)]
#[folder = "catalogs"]
struct Builtin;

pub const BUILTIN_CATALOG: &str = "conversation_flow.toml";
const CATALOG_DIR: &str = ".scaffold";
const CATALOG_FILE: &str = "catalog.toml";

/// Declarative description of a generated tree.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Project name; also the default root directory.
    pub name: String,
    /// Stems of the main files written directly under the root.
    #[serde(default)]
    pub name_patterns: Vec<String>,
    /// Slash-separated directories, each receiving a marker file.
    #[serde(default)]
    pub subdirs: Vec<String>,
    #[serde(default)]
    pub dir_files: Vec<DirFiles>,
    /// README.md lines, written verbatim.
    #[serde(default)]
    pub readme: Vec<String>,
}

/// Files populated inside one catalog directory.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DirFiles {
    pub dir: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl Catalog {
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Filename derived from a main-file stem.
    pub fn main_file_name(stem: &str) -> String {
        format!("{stem}{SOURCE_EXTENSION}")
    }

    pub fn file_count(&self) -> usize {
        self.dir_files.iter().map(|entry| entry.files.len()).sum()
    }

    /// Every inconsistency that would otherwise resolve as "last write wins"
    /// or fail halfway through a build.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() || !is_plain_name(&self.name) {
            problems.push(format!(
                "catalog name `{}` must be a single directory name",
                self.name
            ));
        }

        for stem in duplicates(self.name_patterns.iter().map(String::as_str)) {
            problems.push(format!("duplicate name pattern `{stem}`"));
        }
        for stem in self.name_patterns.iter().filter(|stem| !is_plain_name(stem)) {
            problems.push(format!("name pattern `{stem}` is not a plain file name"));
        }

        for dir in self.subdirs.iter().filter(|dir| !is_contained(dir)) {
            problems.push(format!("directory `{dir}` is empty or escapes the root"));
        }
        for dir in duplicates(self.subdirs.iter().map(|dir| normalize_dir(dir))) {
            problems.push(format!("duplicate directory `{dir}`"));
        }

        let declared: BTreeSet<&str> =
            self.subdirs.iter().map(|dir| normalize_dir(dir)).collect();
        let mut per_dir: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in &self.dir_files {
            let dir = normalize_dir(&entry.dir);
            if !is_contained(&entry.dir) {
                problems.push(format!(
                    "files listed for `{}`, which is empty or escapes the root",
                    entry.dir
                ));
            } else if !declared.contains(dir) {
                problems.push(format!(
                    "files listed for `{}`, which is not in subdirs",
                    entry.dir
                ));
            }
            per_dir
                .entry(dir)
                .or_default()
                .extend(entry.files.iter().map(String::as_str));
        }
        for (dir, files) in per_dir {
            for file in duplicates(files.into_iter()) {
                problems.push(format!("`{file}` listed more than once under `{dir}`"));
            }
        }

        for file in self.dir_files.iter().flat_map(|entry| &entry.files) {
            if !is_plain_name(file) {
                problems.push(format!("`{file}` is not a plain file name"));
            }
        }

        problems
    }

    /// Fail with every problem at once, before anything touches disk.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        let mut message = format!("catalog `{}` has {} problem(s):", self.name, problems.len());
        for problem in &problems {
            let _ = write!(message, "\n  - {problem}");
        }
        bail!(message)
    }
}

/// `docs/` and `docs` name the same directory.
fn normalize_dir(dir: &str) -> &str {
    dir.trim_end_matches('/')
}

fn duplicates<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    let mut repeated = Vec::new();
    for item in items {
        if !seen.insert(item) && !repeated.contains(&item) {
            repeated.push(item);
        }
    }
    repeated
}

/// Raw TOML of the catalog shipped inside the binary.
pub fn builtin_source() -> Result<String> {
    let file = Builtin::get(BUILTIN_CATALOG)
        .ok_or_else(|| anyhow!("embedded catalog `{}` missing", BUILTIN_CATALOG))?;
    std::str::from_utf8(file.data.as_ref())
        .with_context(|| format!("decoding embedded catalog `{}`", BUILTIN_CATALOG))
        .map(str::to_owned)
}

pub fn builtin() -> Result<Catalog> {
    let raw = builtin_source()?;
    Catalog::from_toml(&raw)
        .with_context(|| format!("parsing embedded catalog `{}`", BUILTIN_CATALOG))
}

/// Load a catalog file from disk and deserialize it.
pub fn load_from_path(path: &Utf8Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading catalog {}", path))?;
    Catalog::from_toml(&raw).with_context(|| format!("parsing catalog {}", path))
}

pub fn write_builtin(path: &Utf8Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists; rerun with --force to overwrite", path);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent))?;
    }
    fs::write(path, builtin_source()?).with_context(|| format!("writing {}", path))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CatalogSource {
    Explicit(Utf8PathBuf),
    Discovered(Utf8PathBuf),
    HomeDefault(Utf8PathBuf),
    Builtin,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::Explicit(_) => "explicit",
            CatalogSource::Discovered(_) => "discovered",
            CatalogSource::HomeDefault(_) => "home-default",
            CatalogSource::Builtin => "built-in",
        }
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            CatalogSource::Explicit(path)
            | CatalogSource::Discovered(path)
            | CatalogSource::HomeDefault(path) => Some(path.as_path()),
            CatalogSource::Builtin => None,
        }
    }

    pub fn load(&self) -> Result<Catalog> {
        match self.path() {
            Some(path) => load_from_path(path),
            None => builtin(),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path() {
            Some(path) => write!(f, "{} ({})", path, self.as_str()),
            None => write!(f, "{} ({})", BUILTIN_CATALOG, self.as_str()),
        }
    }
}

/// Pick the catalog: explicit file, nearest `.scaffold/catalog.toml` above
/// `start`, the one under `home`, then the built-in.
pub fn resolve(
    explicit: Option<&Utf8Path>,
    start: &Utf8Path,
    home: Option<&Utf8Path>,
) -> Result<CatalogSource> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("catalog file not found at {}", path);
        }
        return Ok(CatalogSource::Explicit(path.to_owned()));
    }

    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(CATALOG_DIR).join(CATALOG_FILE);
        if candidate.is_file() {
            return Ok(CatalogSource::Discovered(candidate));
        }
        dir = current.parent();
    }

    if let Some(home) = home {
        let candidate = home.join(CATALOG_DIR).join(CATALOG_FILE);
        if candidate.is_file() {
            return Ok(CatalogSource::HomeDefault(candidate));
        }
    }

    Ok(CatalogSource::Builtin)
}

pub fn format_summary(catalog: &Catalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project: {}", catalog.name);
    let _ = writeln!(out, "Main files: {}", catalog.name_patterns.len());
    let _ = writeln!(out, "Directories: {}", catalog.subdirs.len());
    let _ = writeln!(
        out,
        "Mapped files: {} across {} directories",
        catalog.file_count(),
        catalog.dir_files.len()
    );
    let _ = writeln!(out, "README lines: {}", catalog.readme.len());
    for entry in &catalog.dir_files {
        let _ = writeln!(out, "  - {} ({})", entry.dir, entry.files.join(", "));
    }
    out
}

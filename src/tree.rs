use std::fs;

use anyhow::{Context, Result, bail};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Sentinel written into every catalog directory.
pub const MARKER_FILE: &str = ".gitkeep";

/// Owns one root directory and performs every write beneath it.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root: Utf8PathBuf,
    dry_run: bool,
}

impl TreeBuilder {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Remove the root and everything under it, then recreate it empty.
    pub fn reset_root(&self) -> Result<()> {
        if self.dry_run {
            tracing::info!(root = %self.root, "dry run: skipping reset");
            return Ok(());
        }

        // symlink_metadata so a dangling symlink at the root still counts as present.
        match fs::symlink_metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(root = %self.root, "removing existing tree");
                fs::remove_dir_all(&self.root)
                    .with_context(|| format!("removing {}", self.root))?;
            }
            Ok(_) => {
                tracing::debug!(root = %self.root, "removing non-directory at root");
                fs::remove_file(&self.root)
                    .with_context(|| format!("removing {}", self.root))?;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("inspecting {}", self.root));
            }
        }

        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating directory {}", self.root))
    }

    /// Create `relative` and any missing parents under the root.
    pub fn ensure_dir(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.resolve(relative)?;
        if !self.dry_run && !path.is_dir() {
            fs::create_dir_all(&path)
                .with_context(|| format!("creating directory {}", path))?;
        }
        Ok(path)
    }

    /// Write `lines` joined by newlines plus a trailing newline, replacing
    /// any existing file. The parent directory must already exist.
    pub fn write_file(&self, relative: &str, lines: &[String]) -> Result<Utf8PathBuf> {
        let path = self.resolve(relative)?;
        if self.dry_run {
            return Ok(path);
        }
        fs::write(&path, render(lines)).with_context(|| format!("writing {}", path))?;
        tracing::trace!(path = %path, lines = lines.len(), "wrote file");
        Ok(path)
    }

    /// Join a catalog path onto the root, refusing anything that could
    /// land outside it.
    fn resolve(&self, relative: &str) -> Result<Utf8PathBuf> {
        if relative.is_empty() {
            bail!("empty path under {}", self.root);
        }
        if !is_contained(relative) {
            bail!("path `{}` escapes root {}", relative, self.root);
        }
        Ok(self.root.join(relative))
    }
}

/// True when `relative` is non-empty and made only of normal (or leading
/// `.`) components, so joining it onto a directory stays inside it.
pub fn is_contained(relative: &str) -> bool {
    !relative.is_empty()
        && Utf8Path::new(relative)
            .components()
            .all(|component| {
                matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir)
            })
}

/// True when `name` is exactly one normal path component: no separators,
/// not `.` or `..`, not absolute.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Utf8Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Utf8Component::Normal(part)), None) if part == name
    )
}

/// File body for `lines`.
pub fn render(lines: &[String]) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    body
}

/// Marker file content for a catalog directory.
pub fn marker_lines(dir: &str) -> Vec<String> {
    vec![format!("# {MARKER_FILE} to keep {dir} directory in version control.")]
}

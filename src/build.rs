use anyhow::Result;

use crate::catalog::Catalog;
use crate::content;
use crate::tree::{self, MARKER_FILE, TreeBuilder};

pub const README_FILE: &str = "README.md";

/// What a build wrote (or would write, for a dry run).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub directories: usize,
    pub files: usize,
}

/// Rebuild the whole tree for `catalog` under the builder's root.
///
/// Steps run in a fixed order and the first filesystem error aborts the
/// run, leaving whatever was already written in place.
pub fn build(catalog: &Catalog, builder: &TreeBuilder) -> Result<BuildReport> {
    let mut report = BuildReport::default();
    let prefix = if builder.is_dry_run() { "(dry-run) " } else { "" };

    builder.reset_root()?;
    println!("{prefix}Created directory: {}", builder.root());

    for dir in &catalog.subdirs {
        let path = builder.ensure_dir(dir)?;
        builder.write_file(&join(dir, MARKER_FILE), &tree::marker_lines(dir))?;
        report.directories += 1;
        report.files += 1;
        println!("{prefix}Created directory: {} and {}", path, MARKER_FILE);
    }

    for stem in &catalog.name_patterns {
        let filename = Catalog::main_file_name(stem);
        let path = builder.write_file(&filename, &content::generate(&filename))?;
        report.files += 1;
        println!("{prefix}Created file: {}", path);
    }

    for entry in &catalog.dir_files {
        // Directories missing from `subdirs` are created without a marker.
        builder.ensure_dir(&entry.dir)?;
        for filename in &entry.files {
            let lines = content::generate(filename);
            let path = builder.write_file(&join(&entry.dir, filename), &lines)?;
            report.files += 1;
            println!("{prefix}Created file: {}", path);
        }
    }

    let path = builder.write_file(README_FILE, &catalog.readme)?;
    report.files += 1;
    println!("{prefix}Created file: {}", path);

    println!(
        "{prefix}File tree creation for {} completed with {} directories and {} files!",
        catalog.name, report.directories, report.files
    );
    tracing::info!(
        root = %builder.root(),
        directories = report.directories,
        files = report.files,
        "build finished"
    );
    Ok(report)
}

fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;
    use crate::catalog::{self, DirFiles};

    fn root_in(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap()
    }

    fn docs_catalog() -> Catalog {
        Catalog {
            name: "demo".to_owned(),
            name_patterns: vec!["flow_x".to_owned()],
            subdirs: vec!["docs".to_owned()],
            dir_files: vec![DirFiles {
                dir: "docs".to_owned(),
                files: vec!["notes.txt".to_owned()],
            }],
            readme: vec!["# demo".to_owned(), String::new(), "About.".to_owned()],
        }
    }

    /// Relative path → contents for every file under `root`.
    fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
        fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(base, &path, out);
                } else {
                    let rel = path
                        .strip_prefix(base)
                        .unwrap()
                        .to_string_lossy()
                        .into_owned();
                    out.insert(rel, fs::read(&path).unwrap());
                }
            }
        }
        let mut out = BTreeMap::new();
        walk(root, root, &mut out);
        out
    }

    fn directories(root: &Path) -> Vec<String> {
        let mut dirs = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    let rel = path.strip_prefix(root).unwrap();
                    dirs.push(rel.to_string_lossy().into_owned());
                    stack.push(path);
                }
            }
        }
        dirs.sort();
        dirs
    }

    #[test]
    fn docs_scenario_produces_four_files() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let report = build(&docs_catalog(), &TreeBuilder::new(root.clone())).unwrap();
        assert_eq!(report, BuildReport { directories: 1, files: 4 });

        let files = snapshot(root.as_std_path());
        let names: Vec<_> = files.keys().cloned().collect();
        assert_eq!(names, vec!["README.md", "docs/.gitkeep", "docs/notes.txt", "flow_x.py"]);
        assert_eq!(directories(root.as_std_path()), vec!["docs"]);

        assert_eq!(
            files["docs/notes.txt"],
            b"# notes.txt\n# Text notes or documentation.\n"
        );
        assert_eq!(
            files["flow_x.py"],
            b"# flow_x.py\n# Python code for conversation flow logic or testing.\n"
        );
        assert_eq!(
            files["docs/.gitkeep"],
            b"# .gitkeep to keep docs directory in version control.\n"
        );
        assert_eq!(files["README.md"], b"# demo\n\nAbout.\n");
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let catalog = catalog::builtin().unwrap();
        let builder = TreeBuilder::new(root.clone());

        build(&catalog, &builder).unwrap();
        let first = snapshot(root.as_std_path());
        build(&catalog, &builder).unwrap();
        assert_eq!(first, snapshot(root.as_std_path()));
    }

    #[test]
    fn builtin_catalog_is_complete() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let catalog = catalog::builtin().unwrap();
        let report = build(&catalog, &TreeBuilder::new(root.clone())).unwrap();

        assert_eq!(report.directories, catalog.subdirs.len());
        assert_eq!(
            report.files,
            catalog.subdirs.len() + catalog.name_patterns.len() + catalog.file_count() + 1
        );
        for dir in &catalog.subdirs {
            assert!(root.join(dir).join(MARKER_FILE).is_file(), "{dir}");
        }
        for stem in &catalog.name_patterns {
            assert!(root.join(Catalog::main_file_name(stem)).is_file(), "{stem}");
        }
        for entry in &catalog.dir_files {
            for file in &entry.files {
                assert!(root.join(&entry.dir).join(file).is_file(), "{file}");
            }
        }
        assert!(root.join(README_FILE).is_file());
        assert_eq!(snapshot(root.as_std_path()).len(), report.files);

        let json = fs::read_to_string(root.join("configs/default_settings.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["description"], "Placeholder for default_settings.json");
    }

    #[test]
    fn reset_removes_unrelated_content_but_not_siblings() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        fs::create_dir_all(root.join("leftover/dir")).unwrap();
        fs::write(root.join("leftover/dir/file.txt"), "stale").unwrap();
        fs::write(root.join("old.md"), "stale").unwrap();
        let sibling = temp.path().join("sibling.txt");
        fs::write(&sibling, "keep me").unwrap();

        build(&docs_catalog(), &TreeBuilder::new(root.clone())).unwrap();

        assert!(!root.join("leftover").exists());
        assert!(!root.join("old.md").exists());
        assert_eq!(snapshot(root.as_std_path()).len(), 4);
        assert_eq!(fs::read_to_string(sibling).unwrap(), "keep me");
    }

    #[test]
    fn nested_dirs_do_not_depend_on_catalog_order() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let catalog = Catalog {
            name: "nested".to_owned(),
            name_patterns: Vec::new(),
            subdirs: vec!["a/b/c".to_owned(), "a".to_owned()],
            dir_files: Vec::new(),
            readme: vec!["# nested".to_owned()],
        };
        build(&catalog, &TreeBuilder::new(root.clone())).unwrap();
        assert!(root.join("a/b/c/.gitkeep").is_file());
        assert!(root.join("a/.gitkeep").is_file());
        assert!(!root.join("a/b/.gitkeep").exists());
    }

    #[test]
    fn duplicate_entries_resolve_to_last_write() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let mut catalog = docs_catalog();
        catalog.name_patterns.push("flow_x".to_owned());
        catalog.dir_files.push(DirFiles {
            dir: "docs".to_owned(),
            files: vec!["notes.txt".to_owned()],
        });

        let report = build(&catalog, &TreeBuilder::new(root.clone())).unwrap();
        assert_eq!(report.files, 6);
        assert_eq!(snapshot(root.as_std_path()).len(), 4);
    }

    #[test]
    fn undeclared_directory_is_created_on_demand() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let mut catalog = docs_catalog();
        catalog.dir_files.push(DirFiles {
            dir: "extra/deep".to_owned(),
            files: vec!["run.sh".to_owned()],
        });

        build(&catalog, &TreeBuilder::new(root.clone())).unwrap();
        let script = fs::read_to_string(root.join("extra/deep/run.sh")).unwrap();
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(!root.join("extra/deep/.gitkeep").exists());
    }

    #[test]
    fn escaping_entry_aborts_the_run() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let mut catalog = docs_catalog();
        catalog.dir_files.push(DirFiles {
            dir: "..".to_owned(),
            files: vec!["outside.txt".to_owned()],
        });

        let err = build(&catalog, &TreeBuilder::new(root.clone())).unwrap_err();
        assert!(err.to_string().contains("escapes root"));
        assert!(!temp.path().join("outside.txt").exists());
        // Steps before the failure stay on disk.
        assert!(root.join("docs/notes.txt").is_file());
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let temp = TempDir::new().unwrap();
        let root = root_in(&temp);
        let builder = TreeBuilder::new(root.clone()).dry_run(true);
        let report = build(&docs_catalog(), &builder).unwrap();
        assert_eq!(report, BuildReport { directories: 1, files: 4 });
        assert!(!root.exists());
    }

    #[test]
    fn join_handles_trailing_slash() {
        assert_eq!(join("docs/", "a.md"), "docs/a.md");
        assert_eq!(join("docs", "a.md"), "docs/a.md");
    }
}

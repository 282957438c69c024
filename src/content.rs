//! Placeholder content for scaffold files, chosen by file extension.

use serde_json::json;

/// Extension appended to every name stem to form a main file.
pub const SOURCE_EXTENSION: &str = ".py";

type Renderer = fn(&str) -> Vec<String>;

/// Extension (with its leading dot) to renderer. Lookup is case-sensitive.
const RENDERERS: &[(&str, Renderer)] = &[
    (".py", python),
    (".yaml", yaml),
    (".yml", yaml),
    (".json", json_object),
    (".txt", text),
    (".sh", shell),
    (".ipynb", notebook),
    (".md", markdown),
    (".mmd", mermaid),
];

/// Lines of placeholder content for `filename`. Never empty, never fails.
pub fn generate(filename: &str) -> Vec<String> {
    let renderer = extension(filename)
        .and_then(|ext| {
            RENDERERS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, render)| *render)
        })
        .unwrap_or(generic);
    renderer(filename)
}

/// Extension of `filename` including the dot, ignoring leading dots so
/// that dotfiles such as `.gitkeep` have none.
pub fn extension(filename: &str) -> Option<&str> {
    let stem_start = filename.len() - filename.trim_start_matches('.').len();
    let rest = &filename[stem_start..];
    rest.rfind('.').map(|idx| &rest[idx..])
}

fn commented(filename: &str, purpose: &str) -> Vec<String> {
    vec![format!("# {filename}"), format!("# {purpose}")]
}

fn python(filename: &str) -> Vec<String> {
    commented(filename, "Python code for conversation flow logic or testing.")
}

fn yaml(filename: &str) -> Vec<String> {
    commented(filename, "YAML configuration or scenario definition.")
}

fn text(filename: &str) -> Vec<String> {
    commented(filename, "Text notes or documentation.")
}

fn markdown(filename: &str) -> Vec<String> {
    commented(filename, "Markdown documentation or guides.")
}

fn generic(filename: &str) -> Vec<String> {
    commented(filename, "Placeholder content. Update as needed.")
}

fn json_object(filename: &str) -> Vec<String> {
    // serde_json escapes quotes and control characters in odd filenames.
    let description = json!(format!("Placeholder for {filename}"));
    vec![
        "{".to_owned(),
        format!("  \"description\": {description}"),
        "}".to_owned(),
    ]
}

fn shell(filename: &str) -> Vec<String> {
    vec![
        "#!/usr/bin/env bash".to_owned(),
        format!("# {filename}"),
        "# Shell script placeholder.".to_owned(),
        "echo 'Running script...'".to_owned(),
    ]
}

fn notebook(_filename: &str) -> Vec<String> {
    let document = json!({
        "cells": [],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5,
    });
    vec![document.to_string()]
}

fn mermaid(filename: &str) -> Vec<String> {
    vec![
        format!("%% Mermaid diagram for {filename}"),
        "graph LR;".to_owned(),
        "A-->B;".to_owned(),
    ]
}

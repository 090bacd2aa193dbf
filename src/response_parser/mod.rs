//! Extracts generated files from a raw LLM reply.
//!
//! Replies come in two shapes. The preferred one is a series of fenced code
//! blocks labeled with filenames. Some models instead return a JSON manifest
//! (`{"files": [{"filename": ..., "content": ...}]}`), so that is tried
//! first. Parsing is best effort and never fails: a reply with nothing
//! recoverable yields an empty list.

use crate::language;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[cfg(test)]
mod edge_test;
#[cfg(test)]
mod happy_test;
#[cfg(test)]
mod heuristics_test;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn language(&self) -> Option<&'static language::LanguageSpec> {
        language::spec_for_path(&self.path)
    }
}

#[derive(Deserialize)]
struct Manifest {
    files: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    filename: String,
    content: String,
}

/// Ordered collection with last-write-wins deduplication. Order is the order
/// of first appearance; a repeated filename replaces the earlier content in
/// place.
#[derive(Default)]
struct FileSet {
    files: Vec<GeneratedFile>,
    index: HashMap<PathBuf, usize>,
}

impl FileSet {
    fn push(&mut self, path: PathBuf, content: String) {
        if let Some(&i) = self.index.get(&path) {
            self.files[i].content = content;
        } else {
            self.index.insert(path.clone(), self.files.len());
            self.files.push(GeneratedFile { path, content });
        }
    }
}

/// Parse a raw reply into an ordered list of generated files.
pub fn parse_reply(text: &str) -> Vec<GeneratedFile> {
    if let Some(files) = parse_json_manifest(text) {
        return files;
    }
    parse_fenced_blocks(text)
}

// A manifest reply is a JSON object, possibly wrapped in a single markdown
// fence. Anything that does not parse cleanly falls through to the fenced
// block scanner.
fn parse_json_manifest(text: &str) -> Option<Vec<GeneratedFile>> {
    let trimmed = text.trim();
    let unwrapped;
    let candidate = if trimmed.starts_with("```") {
        let mut inner: Vec<&str> = trimmed.lines().skip(1).collect();
        if matches!(inner.last(), Some(last) if fence_close(last)) {
            inner.pop();
        }
        unwrapped = inner.join("\n");
        unwrapped.trim()
    } else {
        trimmed
    };
    if !candidate.starts_with('{') {
        return None;
    }

    let manifest: Manifest = serde_json::from_str(candidate).ok()?;
    if manifest.files.is_empty() {
        return None;
    }

    let mut set = FileSet::default();
    for entry in manifest.files {
        if entry.filename.trim().is_empty() {
            continue;
        }
        set.push(PathBuf::from(entry.filename.trim()), entry.content);
    }
    Some(set.files)
}

fn parse_fenced_blocks(text: &str) -> Vec<GeneratedFile> {
    let mut set = FileSet::default();
    let mut lines = text.lines().peekable();
    let mut preceding: Option<&str> = None;
    let mut block_index = 0usize;

    while let Some(line) = lines.next() {
        let Some(info) = fence_open(line) else {
            if !line.trim().is_empty() {
                preceding = Some(line);
            }
            continue;
        };

        block_index += 1;
        let mut content_lines: Vec<&str> = Vec::new();
        for content_line in lines.by_ref() {
            if fence_close(content_line) {
                break;
            }
            // An unterminated fence runs to end of input.
            content_lines.push(content_line);
        }

        let path = recover_filename(info, preceding)
            .unwrap_or_else(|| synthesize_filename(info, block_index));
        set.push(PathBuf::from(path), content_lines.join("\n"));
        preceding = None;
    }

    set.files
}

// Returns the fence info string when the line opens a fence.
fn fence_open(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix("```")?;
    Some(rest.trim_start_matches('`').trim())
}

fn fence_close(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '`') && trimmed.len() >= 3
}

/// Filename recovery policy: a path-like token in the fence info string wins;
/// otherwise the nearest preceding non-empty line is consulted in case it
/// names the file ("**main.py**", "`app.js`:", "# File: run.sh" and similar).
fn recover_filename(info: &str, preceding: Option<&str>) -> Option<String> {
    for token in info.split_whitespace() {
        if let Some(name) = filename_token(token) {
            return Some(name);
        }
    }

    let line = preceding?;
    let cleaned = line
        .trim()
        .trim_start_matches(['#', '>', '-', '/', '*'])
        .trim();
    let last = cleaned.split_whitespace().last()?;
    filename_token(last)
}

// A token counts as a filename when, after shedding markdown decoration, it
// has a short alphanumeric extension. "code." and ".py" alone do not count.
fn filename_token(token: &str) -> Option<String> {
    let t = token
        .trim_matches(|c| matches!(c, '*' | '`' | '"' | '\'' | ':' | ',' | ';' | '(' | ')' | '<' | '>'));
    if t.is_empty() || t.starts_with('.') || t.ends_with('.') || t.ends_with('/') {
        return None;
    }
    let (stem, ext) = t.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 6 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(t.to_string())
}

// Blocks with no recoverable name get a positional default. The extension is
// inferred from the fence language tag when one is declared.
fn synthesize_filename(info: &str, block_index: usize) -> String {
    let tag = info.split_whitespace().next().unwrap_or("");
    match language::extension_for_language_tag(tag) {
        Some(ext) => format!("output_{block_index}.{ext}"),
        None => format!("output_{block_index}"),
    }
}

//! Full index rebuild from a directory of memory documents.
//!
//! The rebuild is the only bulk-mutation path: it clears the store, scans
//! every markdown file under the configured memory directory, parses the
//! front matter, derives a summary, and indexes each document. Per-document
//! failures are logged and skipped — a rebuild always runs to completion
//! and reports the count of documents actually indexed.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::frontmatter::parse_front_matter;
use crate::models::Document;
use crate::store::IndexStore;

/// Rebuild the index from scratch. Returns the number of documents
/// successfully indexed (not the number attempted).
pub async fn rebuild(config: &Config, store: &IndexStore) -> Result<usize> {
    store.init().await?;

    if !store.clear_all().await {
        warn!("could not clear existing index; stale entries may remain");
    }

    let dir = &config.memory.dir;
    if !dir.exists() {
        println!("Memory directory does not exist: {}", dir.display());
        return Ok(0);
    }

    let files = scan_memory_dir(dir)?;
    println!("rebuild {}", dir.display());
    println!("  files found: {}", files.len());

    let mut indexed = 0;
    for path in &files {
        match load_document(path, config.memory.summary_max_chars) {
            Ok(doc) => {
                if store.index_document(&doc).await {
                    indexed += 1;
                    println!("  indexed: {}", doc.title);
                } else {
                    warn!("failed to index '{}'", doc.id);
                }
            }
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
            }
        }
    }

    println!("  indexed documents: {}", indexed);
    println!("ok");

    Ok(indexed)
}

/// All markdown files under the memory directory, sorted for deterministic
/// ordering.
fn scan_memory_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&["**/*.md".to_string()])?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if !include_set.is_match(relative) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Read one file and derive a [`Document`] from it. The file stem is the
/// fallback for both id and title when the header does not provide them.
fn load_document(path: &Path, summary_max_chars: usize) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    let (fm, body) = parse_front_matter(&content);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string());

    Ok(Document {
        id: fm.id.unwrap_or_else(|| stem.clone()),
        title: fm.title.unwrap_or(stem),
        keywords: fm.keywords,
        content: body.to_string(),
        summary: extract_summary(body, summary_max_chars),
    })
}

/// Concatenate body lines into a short excerpt, skipping blank lines,
/// heading lines, and fenced-code delimiters, up to `max_chars` characters
/// (Unicode scalars, not bytes), truncating with an ellipsis marker.
pub fn extract_summary(content: &str, max_chars: usize) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut total = 0;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }
        lines.push(line);
        total += line.chars().count();
        if total >= max_chars {
            break;
        }
    }

    let summary = lines.join(" ");
    if summary.chars().count() > max_chars {
        let truncated: String = summary.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        summary
    }
}

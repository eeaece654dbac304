//! Structured-header (front matter) parser for memory documents.
//!
//! A document may open with a header block delimited by `---` marker lines:
//!
//! ```text
//! ---
//! id: cache-notes
//! title: Cache eviction
//! keywords: [lru, cache, "eviction"]
//! ---
//! body text...
//! ```
//!
//! Values are scalars (quotes stripped) or bracketed comma-separated lists.
//! A malformed or absent header yields an empty [`FrontMatter`] and the
//! whole input as body — the caller falls back to filename-derived
//! identity, so a bad header never drops a document.

/// Typed header record. Every field is optional; `keywords` written as a
/// scalar is coerced into a one-element list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub keywords: Vec<String>,
}

/// Split a document into its parsed header and body. Returns the header
/// record (empty on malformed/absent header) and the body slice.
pub fn parse_front_matter(content: &str) -> (FrontMatter, &str) {
    let Some(rest) = strip_marker_line(content) else {
        return (FrontMatter::default(), content);
    };

    // Find the closing marker line within the remainder.
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (parse_header(header), body);
        }
        offset += line.len();
    }

    // No closing marker: malformed, use defaults.
    (FrontMatter::default(), content)
}

/// Consume the opening `---` line, if present.
fn strip_marker_line(content: &str) -> Option<&str> {
    let (first, rest) = content.split_once('\n')?;
    if first.trim() == "---" {
        Some(rest)
    } else {
        None
    }
}

fn parse_header(header: &str) -> FrontMatter {
    let mut fm = FrontMatter::default();

    for line in header.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "id" => fm.id = non_empty(strip_quotes(value)),
            "title" => fm.title = non_empty(strip_quotes(value)),
            "keywords" => fm.keywords = parse_list_or_scalar(value),
            _ => {}
        }
    }

    fm
}

/// `[a, b, "c"]` becomes a list; anything else becomes a one-element list
/// (empty scalars produce an empty list).
fn parse_list_or_scalar(value: &str) -> Vec<String> {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        inner
            .split(',')
            .map(|item| strip_quotes(item.trim()))
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        non_empty(strip_quotes(value))
            .map(|v| vec![v])
            .unwrap_or_default()
    }
}

fn strip_quotes(value: &str) -> &str {
    value
        .trim_matches(|c| c == '"' || c == '\'')
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

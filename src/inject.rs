//! Retrieval assembler: prompt text in, injection payload out.
//!
//! Runs the tokenizer, query builder, and index store in sequence and
//! renders the ranked results into a delimited text block under a total
//! character budget. Every absence condition — injection disabled, store
//! missing, no tokens, empty query, no results — produces `None`, never an
//! error: a failed or degraded retrieval is indistinguishable from "no
//! relevant memory".
//!
//! The payload shape is a compatibility surface consumed verbatim by the
//! upstream prompt pipeline; do not change it:
//!
//! ```text
//! <related-memories>
//! 以下是可能相关的历史知识，请自行判断是否有用：
//!
//! [1] {title}
//!     {summary}
//!
//! </related-memories>
//! ```

use crate::config::Config;
use crate::models::SearchResult;
use crate::query::build_fts_query;
use crate::store::IndexStore;
use crate::tokenizer::Tokenizer;

const PAYLOAD_START: &str = "<related-memories>";
const PAYLOAD_END: &str = "</related-memories>";
const PAYLOAD_HINT: &str = "以下是可能相关的历史知识，请自行判断是否有用：";

/// Search the store for memories relevant to `prompt` and render them as
/// an injection payload. `None` means "nothing relevant" — by design this
/// covers disabled injection, a missing store, unsearchable prompts, and
/// empty result sets alike.
pub async fn retrieve_and_format(
    config: &Config,
    store: &IndexStore,
    prompt: &str,
) -> Option<String> {
    if !config.inject.auto_inject {
        return None;
    }

    if !store.exists() {
        return None;
    }

    let tokenizer = Tokenizer::from_config(config);
    let tokens = tokenizer.tokenize(prompt);
    if tokens.is_empty() {
        return None;
    }

    let query = build_fts_query(&tokens, config.tokenizer.query_operator());
    if query.is_empty() {
        return None;
    }

    let results = store.search(&query, config.inject.max_results).await;
    if results.is_empty() {
        return None;
    }

    Some(format_injection(&results, config.inject.max_chars))
}

/// Render results in ranked order under a total summary-character budget.
/// Each summary is truncated to the remaining budget (ellipsis marker when
/// cut, counted in characters, not bytes); once the budget is exhausted no
/// further entries are emitted, even if more results exist.
pub fn format_injection(results: &[SearchResult], max_chars: usize) -> String {
    let mut out = String::new();
    out.push_str(PAYLOAD_START);
    out.push('\n');
    out.push_str(PAYLOAD_HINT);
    out.push('\n');
    out.push('\n');

    let mut total_chars = 0usize;
    for (i, result) in results.iter().enumerate() {
        let remaining = max_chars.saturating_sub(total_chars);
        if remaining == 0 {
            break;
        }

        let summary = truncate_chars(&result.summary, remaining);

        out.push_str(&format!("[{}] {}\n", i + 1, result.title));
        out.push_str(&format!("    {}\n", summary));
        out.push('\n');

        total_chars += summary.chars().count();
    }

    out.push_str(PAYLOAD_END);
    out.push('\n');
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, summary: &str) -> SearchResult {
        SearchResult {
            id: title.to_lowercase(),
            title: title.to_string(),
            summary: summary.to_string(),
            score: -1.0,
        }
    }

    #[test]
    fn test_payload_shape() {
        let results = vec![
            result("Cache eviction", "LRU reclaims entries."),
            result("Heap layout", "Notes on allocation."),
        ];
        let payload = format_injection(&results, 1000);
        assert_eq!(
            payload,
            "<related-memories>\n\
             以下是可能相关的历史知识，请自行判断是否有用：\n\
             \n\
             [1] Cache eviction\n    LRU reclaims entries.\n\n\
             [2] Heap layout\n    Notes on allocation.\n\n\
             </related-memories>\n"
        );
    }

    #[test]
    fn test_zero_budget_envelope_only() {
        let results = vec![result("Cache eviction", "LRU reclaims entries.")];
        let payload = format_injection(&results, 0);
        assert_eq!(
            payload,
            "<related-memories>\n以下是可能相关的历史知识，请自行判断是否有用：\n\n</related-memories>\n"
        );
    }

    #[test]
    fn test_budget_truncates_summary() {
        let results = vec![result("Long", "abcdefghij")];
        let payload = format_injection(&results, 4);
        assert!(payload.contains("    abcd...\n"));
        assert!(!payload.contains("abcde"));
    }

    #[test]
    fn test_budget_stops_mid_list() {
        // First summary consumes the whole budget; second entry is dropped
        // even though more results exist.
        let results = vec![
            result("First", "0123456789"),
            result("Second", "should not appear"),
        ];
        let payload = format_injection(&results, 10);
        assert!(payload.contains("[1] First"));
        assert!(!payload.contains("[2]"));
        assert!(!payload.contains("Second"));
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        // Multibyte summaries count by scalar values: six characters fit
        // untruncated in a six-character budget.
        let results = vec![result("中文", "缓存淘汰策略")];
        let payload = format_injection(&results, 6);
        assert!(payload.contains("    缓存淘汰策略\n"));
        assert!(!payload.contains("..."));
    }

    #[test]
    fn test_ranked_order_preserved() {
        let results = vec![result("B-second", "s"), result("A-first", "s")];
        let payload = format_injection(&results, 1000);
        let b = payload.find("B-second").unwrap();
        let a = payload.find("A-first").unwrap();
        assert!(b < a, "assembler must not re-rank results");
    }

    #[tokio::test]
    async fn test_disabled_injection_short_circuits() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("recall.sqlite"));
        store.init().await.unwrap();

        let mut config = Config::default();
        config.inject.auto_inject = false;
        assert!(retrieve_and_format(&config, &store, "anything").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_store_short_circuits() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("recall.sqlite"));
        let config = Config::default();
        assert!(retrieve_and_format(&config, &store, "cache").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_prompt_short_circuits() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("recall.sqlite"));
        store.init().await.unwrap();
        let config = Config::default();
        assert!(retrieve_and_format(&config, &store, "").await.is_none());
        assert!(retrieve_and_format(&config, &store, "   ").await.is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_retrieval() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("recall.sqlite"));
        store.init().await.unwrap();
        store
            .index_document(&crate::models::Document {
                id: "d1".to_string(),
                title: "Cache eviction".to_string(),
                keywords: vec!["lru".to_string(), "cache".to_string()],
                content: "LRU eviction reclaims the least recently used entry.".to_string(),
                summary: "LRU eviction reclaims least recently used entries.".to_string(),
            })
            .await;

        let config = Config::default();
        let payload = retrieve_and_format(&config, &store, "how does LRU cache eviction work")
            .await
            .expect("expected a payload");
        assert!(payload.contains("[1] Cache eviction"));
        assert!(payload.starts_with("<related-memories>\n"));
        assert!(payload.ends_with("</related-memories>\n"));

        // A prompt with no overlap produces nothing.
        assert!(retrieve_and_format(&config, &store, "совершенно unrelated русский")
            .await
            .is_none());
    }
}

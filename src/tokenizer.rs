//! Bilingual tokenizer for mixed English/Chinese prompt and document text.
//!
//! Latin-script words are extracted as lowercase tokens (letter start, then
//! letters, digits, `_`, `-`, length >= 2). CJK text is windowed: every
//! contiguous run of CJK characters emits all substrings of length 2, 3,
//! and 4 as candidate tokens. The union is deduplicated and filtered
//! against fixed bilingual stopword lists.
//!
//! The n-gram windows approximate word boundaries well enough for
//! recall-oriented matching without a segmentation dictionary. Windowing is
//! bounded to contiguous CJK runs, never the whole document.
//!
//! An enhanced strategy backed by dictionary segmentation is available
//! behind the `jieba` cargo feature; selecting it without the feature
//! compiled in silently degrades to the n-gram strategy.

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashSet};

use crate::config::Config;

const STOP_WORDS_EN: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "need",
    "it", "its", "this", "that", "these", "those", "i", "you", "he", "she", "we", "they", "what",
    "which", "who", "whom", "how", "when", "where", "why", "if", "then", "else", "so", "as",
    "not", "no", "yes",
];

const STOP_WORDS_ZH: &[&str] = &[
    "的", "了", "是", "在", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
    "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "那",
    "什么", "怎么", "吗", "呢", "啊", "吧", "呀", "嗯", "哦", "哈", "请", "请问", "可以", "能",
    "想",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    STOP_WORDS_EN
        .iter()
        .chain(STOP_WORDS_ZH.iter())
        .copied()
        .collect()
});

/// Tokenization strategy. `Simple` is the dependency-free default;
/// `Jieba` exists only when the `jieba` feature is compiled in.
pub enum Tokenizer {
    Simple,
    #[cfg(feature = "jieba")]
    Jieba(jieba_rs::Jieba),
}

impl Tokenizer {
    /// Select a strategy from configuration. The enhanced strategy is a
    /// constructor-time capability probe: when the segmentation backend is
    /// not compiled in, this hands back `Simple` without error.
    pub fn from_config(config: &Config) -> Self {
        if config.tokenizer.enhanced {
            Self::enhanced()
        } else {
            Self::Simple
        }
    }

    fn enhanced() -> Self {
        #[cfg(feature = "jieba")]
        {
            Self::Jieba(jieba_rs::Jieba::new())
        }
        #[cfg(not(feature = "jieba"))]
        {
            tracing::debug!("jieba feature not compiled in, using simple tokenizer");
            Self::Simple
        }
    }

    /// Tokenize into a deduplicated, stopword-filtered set. Empty or
    /// whitespace-only input yields an empty set, never an error.
    pub fn tokenize(&self, text: &str) -> BTreeSet<String> {
        match self {
            Self::Simple => tokenize_simple(text),
            #[cfg(feature = "jieba")]
            Self::Jieba(jieba) => tokenize_jieba(jieba, text),
        }
    }
}

/// Latin words plus CJK n-grams, deduplicated, stopwords removed.
pub fn tokenize_simple(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    extract_latin_words(text, &mut tokens);
    extract_cjk_ngrams(text, &mut tokens);
    tokens.retain(|t| !STOP_WORDS.contains(t.as_str()));
    tokens
}

#[cfg(feature = "jieba")]
fn tokenize_jieba(jieba: &jieba_rs::Jieba, text: &str) -> BTreeSet<String> {
    jieba
        .cut(text, false)
        .into_iter()
        .filter(|w| !w.trim().is_empty())
        .filter(|w| w.chars().count() >= 2 && !STOP_WORDS.contains(*w))
        .map(|w| w.to_lowercase())
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .collect()
}

/// Words start with an ASCII letter and continue with letters, digits,
/// underscore, or hyphen. Single characters are discarded.
fn extract_latin_words(text: &str, tokens: &mut BTreeSet<String>) {
    let mut word = String::new();
    for c in text.chars() {
        if word.is_empty() {
            if c.is_ascii_alphabetic() {
                word.push(c);
            }
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            word.push(c);
        } else {
            flush_word(&mut word, tokens);
            if c.is_ascii_alphabetic() {
                word.push(c);
            }
        }
    }
    flush_word(&mut word, tokens);
}

fn flush_word(word: &mut String, tokens: &mut BTreeSet<String>) {
    if word.len() >= 2 {
        tokens.insert(word.to_lowercase());
    }
    word.clear();
}

/// Emit every contiguous substring of length 2, 3, and 4 within each
/// maximal CJK run. A run of length L yields L-k+1 windows per size k.
fn extract_cjk_ngrams(text: &str, tokens: &mut BTreeSet<String>) {
    let mut run: Vec<char> = Vec::new();
    for c in text.chars() {
        if is_cjk(c) {
            run.push(c);
        } else {
            window_run(&run, tokens);
            run.clear();
        }
    }
    window_run(&run, tokens);
}

fn window_run(run: &[char], tokens: &mut BTreeSet<String>) {
    for k in 2..=4usize {
        if run.len() < k {
            break;
        }
        for window in run.windows(k) {
            tokens.insert(window.iter().collect());
        }
    }
}

/// CJK Unified Ideographs block.
fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

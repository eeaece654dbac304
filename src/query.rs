//! FTS5 query expression builder.
//!
//! Turns a token set into a flat MATCH expression: each token is escaped
//! and all tokens are joined with a single combination operator. No
//! grouping or mixed operators are ever produced.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Characters with meaning in FTS5 query syntax. A token containing any of
/// them is wrapped in double quotes.
const RESERVED: &[char] = &['"', '*', '-', '+', '(', ')', ':'];

/// Combination operator for joining query tokens. `Or` trades precision
/// for recall and is the default for prompt-derived queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Or,
    And,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "or" => Ok(Self::Or),
            "and" => Ok(Self::And),
            _ => Err(()),
        }
    }
}

/// Build a MATCH expression from a token set. An empty set produces an
/// empty string; the caller must treat that as "no searchable content" and
/// skip retrieval.
pub fn build_fts_query(tokens: &BTreeSet<String>, operator: QueryOperator) -> String {
    let escaped: Vec<String> = tokens.iter().map(|t| escape_token(t)).collect();
    escaped.join(&format!(" {} ", operator))
}

fn escape_token(token: &str) -> String {
    if token.chars().any(|c| RESERVED.contains(&c)) {
        format!("\"{}\"", token)
    } else {
        token.to_string()
    }
}

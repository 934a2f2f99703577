//! Query records and the extractor seam.
//!
//! The pipeline never looks inside a document's query blocks itself; it asks a
//! [`QueryExtractor`] for `{ id, compiled query text, inline }` records and
//! trusts the answer. [`FenceExtractor`] is the stock implementation for
//! Markdown pages that declare queries as fenced code blocks:
//!
//! ````markdown
//! ```sql orders_by_month
//! select month, count(*) from orders group by month
//! ```
//! ````

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validate::PreprocessError;

/// Identifier → compiled query text, in extraction order.
pub type QueryMap = IndexMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    pub id: String,
    pub compiled_query_string: String,
    pub inline: bool,
}

impl QueryRecord {
    pub fn new(id: &str, compiled_query_string: &str, inline: bool) -> Self {
        QueryRecord {
            id: id.to_string(),
            compiled_query_string: compiled_query_string.to_string(),
            inline,
        }
    }
}

/// Collapse records into a [`QueryMap`]. A repeated id keeps its first
/// position and takes the last text.
pub fn to_query_map(records: &[QueryRecord]) -> QueryMap {
    let mut map = QueryMap::new();
    for record in records {
        map.insert(record.id.clone(), record.compiled_query_string.clone());
    }
    map
}

pub trait QueryExtractor {
    /// Must be deterministic for identical input.
    fn extract(&self, content: &str) -> Result<Vec<QueryRecord>, PreprocessError>;
}

impl<F> QueryExtractor for F
where
    F: Fn(&str) -> Result<Vec<QueryRecord>, PreprocessError>,
{
    fn extract(&self, content: &str) -> Result<Vec<QueryRecord>, PreprocessError> {
        self(content)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FENCED BLOCK EXTRACTOR
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    /// Opening fence: three or more backticks followed by an info string.
    static ref FENCE_OPEN_RE: Regex = Regex::new(r"^[ ]{0,3}(`{3,})([^`]*)$").unwrap();
}

#[derive(Debug, Clone)]
pub struct FenceExtractor {
    language: String,
}

impl Default for FenceExtractor {
    fn default() -> Self {
        FenceExtractor {
            language: "sql".to_string(),
        }
    }
}

impl FenceExtractor {
    pub fn new(language: &str) -> Self {
        FenceExtractor {
            language: language.to_string(),
        }
    }

    /// Query id from an info string such as `sql orders`, if it names one.
    fn query_id<'a>(&self, info: &'a str) -> Option<&'a str> {
        let mut tokens = info.split_whitespace();
        let lang = tokens.next()?;
        if !lang.eq_ignore_ascii_case(&self.language) {
            return None;
        }
        tokens.next()
    }
}

fn is_closing_fence(line: &str, open_len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= open_len && trimmed.chars().all(|c| c == '`')
}

impl QueryExtractor for FenceExtractor {
    fn extract(&self, content: &str) -> Result<Vec<QueryRecord>, PreprocessError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let caps = match FENCE_OPEN_RE.captures(lines[i]) {
                Some(caps) => caps,
                None => {
                    i += 1;
                    continue;
                }
            };

            let open_len = caps[1].len();
            let id = self.query_id(&caps[2]);
            let open_line = i + 1;

            let mut end = i + 1;
            while end < lines.len() && !is_closing_fence(lines[end], open_len) {
                end += 1;
            }

            if end >= lines.len() {
                // A plain code block may run to the end of the document; a query may not.
                if id.is_some() {
                    return Err(PreprocessError::UnterminatedFence { line: open_line });
                }
                break;
            }

            if let Some(id) = id {
                let body = lines[i + 1..end].join("\n");
                records.push(QueryRecord::new(id, &body, false));
            }

            i = end + 1;
        }

        Ok(records)
    }
}

//! Query dependency classification.
//!
//! Classification is a lexical scan of the compiled query text, not a parse of
//! the query language. Only two facts matter:
//!
//! 1. **Interpolation**: does the text contain a `${ ... }` marker? The marker
//!    runs from `${` to the first `}` and may span lines.
//! 2. **Inputs**: does a marker open with an `inputs.<member>` access
//!    (whitespace around the dot is tolerated)?
//!
//! From those, every identifier that passes the validity gate lands in exactly
//! one of *prerendered* (no marker) or *reactive* (marker). Reactive queries
//! that read inputs are additionally *input-reactive*.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::extract::QueryMap;

lazy_static! {
    static ref VALID_ID_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    static ref REACTIVE_RE: Regex = Regex::new(r"(?s)\$\{.*?\}").unwrap();
    static ref INPUT_RE: Regex = Regex::new(r"(?s)\$\{\s*inputs\s*\..*?\}").unwrap();

    /// Names the page preamble declares or imports. A query bound under one of
    /// these would redeclare or shadow the preamble's binding.
    static ref RESERVED_NAMES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        // preamble imports
        s.insert("page");
        s.insert("pageHasQueries");
        s.insert("routeHash");
        s.insert("setContext");
        s.insert("getContext");
        s.insert("beforeUpdate");
        s.insert("onDestroy");
        s.insert("writable");
        s.insert("fmt");
        s.insert("CUSTOM_FORMATTING_SETTINGS_CONTEXT_KEY");
        s.insert("INPUTS_CONTEXT_KEY");
        // preamble bindings
        s.insert("props");
        s.insert("data");
        s.insert("customFormattingSettings");
        s.insert("__db");
        s.insert("inputs_store");
        s.insert("inputs");
        // query runtime
        s.insert("debounce");
        s.insert("browser");
        s.insert("dev");
        s.insert("profile");
        s.insert("data_update");
        s.insert("debounce_on_browser");
        s
    };

    /// ES reserved words, including strict-mode and module-only ones, which
    /// cannot name a `let` binding in a component script.
    static ref ES_RESERVED_WORDS: HashSet<&'static str> = [
        "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "enum", "export", "extends", "false",
        "finally", "for", "function", "if", "implements", "import", "in",
        "instanceof", "interface", "let", "new", "null", "package", "private",
        "protected", "public", "return", "static", "super", "switch", "this",
        "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
        "arguments", "eval",
    ]
    .into_iter()
    .collect();
}

/// Prefix of the per-query helpers (`_query_<id>`, `_query_string_<id>`).
const GENERATED_PREFIX: &str = "_query_";

pub fn is_valid_identifier(id: &str) -> bool {
    VALID_ID_RE.is_match(id)
}

/// True for names the generated script already uses or cannot bind.
pub fn is_reserved_identifier(id: &str) -> bool {
    RESERVED_NAMES.contains(id)
        || ES_RESERVED_WORDS.contains(id)
        || id.starts_with(GENERATED_PREFIX)
}

pub fn is_reactive_query(text: &str) -> bool {
    REACTIVE_RE.is_match(text)
}

pub fn is_input_query(text: &str) -> bool {
    INPUT_RE.is_match(text)
}

/// Identifier sets for one document, each in the query map's order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryClassification {
    pub valid_ids: Vec<String>,
    pub reactive_ids: Vec<String>,
    pub prerendered_ids: Vec<String>,
    pub input_ids: Vec<String>,
    /// Failed the identifier pattern.
    pub invalid_ids: Vec<String>,
    /// Matched the pattern but collide with a preamble name, a generated
    /// helper name or a reserved word.
    pub rejected_ids: Vec<String>,
}

impl QueryClassification {
    pub fn is_empty(&self) -> bool {
        self.valid_ids.is_empty()
    }
}

pub fn classify_queries(queries: &QueryMap) -> QueryClassification {
    let mut result = QueryClassification::default();

    for (id, text) in queries {
        if !is_valid_identifier(id) {
            result.invalid_ids.push(id.clone());
            continue;
        }
        if is_reserved_identifier(id) {
            result.rejected_ids.push(id.clone());
            continue;
        }

        result.valid_ids.push(id.clone());

        if is_reactive_query(text) {
            result.reactive_ids.push(id.clone());
            if is_input_query(text) {
                result.input_ids.push(id.clone());
            }
        } else {
            result.prerendered_ids.push(id.clone());
        }
    }

    result
}

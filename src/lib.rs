//! # Query Preprocessor (native)
//!
//! Turns Markdown pages with embedded queries into component scripts that bind
//! each query's result to a reactive variable.
//!
//! ## Phases
//!
//! 1. **Markup**: queries are extracted from the raw page, stored under the
//!    page's identity key, and non-inline queries are rendered into the page
//!    body (after the frontmatter, if any).
//! 2. **Script**: the stored queries are classified and a preamble of runtime
//!    imports, context setup and per-query bindings is prepended to the page's
//!    instance script.
//!
//! ## Classification Invariants
//!
//! 1. **Validity Gate**: only ids matching `^[A-Za-z_$][A-Za-z0-9_$]*$` and not
//!    naming a preamble binding are ever declared in generated code.
//! 2. **Partition**: every valid id is either prerendered (no `${...}`) or
//!    reactive (at least one `${...}`), never both.
//! 3. **Inputs**: input-reactive ids are the reactive ids whose text
//!    interpolates `inputs.<member>`; they are also reactive.
//! 4. **Missing Entry**: a script phase without a prior markup phase behaves
//!    exactly like a page with no queries.

mod classify;
mod codegen;
mod extract;
mod frontmatter;
mod highlight;
mod identity;
mod options;
mod pipeline;
mod store;
mod validate;

#[cfg(test)]
mod pipeline_tests;

pub use classify::{
    classify_queries, is_input_query, is_reactive_query, is_valid_identifier,
    QueryClassification,
};
pub use codegen::{
    data_update_block, debounce_helper, escape_template_text, generate_preamble,
    generate_query_declarations, generate_scaffolding, input_subscription_block,
    prerendered_block, query_binding_block, reactive_block, ScriptFragment,
};
pub use extract::{to_query_map, FenceExtractor, QueryExtractor, QueryMap, QueryRecord};
pub use frontmatter::{DelimitedFrontmatter, Frontmatter, FrontmatterDetector};
pub use highlight::{Highlighter, PlainHighlighter};
pub use identity::document_key;
pub use options::PreprocessOptions;
pub use pipeline::{Processed, QueryPreprocessor};
pub use store::QueryStore;
pub use validate::{declared_bindings, verify_generated_script, Diagnostic, PreprocessError};

#[cfg(feature = "napi")]
pub use identity::document_key_native;
#[cfg(feature = "napi")]
pub use pipeline::NativeQueryPreprocessor;

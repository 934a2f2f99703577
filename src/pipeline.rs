//! Two-phase document pipeline.
//!
//! The host build tool calls [`QueryPreprocessor::markup`] on a page's raw
//! text and later [`QueryPreprocessor::script`] on the same page's instance
//! script block. The phases share nothing but the page path, so the markup
//! phase parks the page's queries in the preprocessor's [`QueryStore`] under
//! the page's identity key and the script phase picks them up from there.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::classify::{classify_queries, QueryClassification};
use crate::codegen::generate_preamble;
use crate::extract::{to_query_map, FenceExtractor, QueryExtractor, QueryMap};
use crate::frontmatter::{DelimitedFrontmatter, FrontmatterDetector};
use crate::highlight::{Highlighter, PlainHighlighter};
use crate::identity::document_key;
use crate::options::PreprocessOptions;
use crate::store::QueryStore;
use crate::validate::{verify_generated_script, Diagnostic, PreprocessError};

/// Replacement text for one preprocessed block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Processed {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Processed {
    fn new(code: String) -> Self {
        Processed {
            code,
            diagnostics: Vec::new(),
        }
    }
}

pub struct QueryPreprocessor<X = FenceExtractor, H = PlainHighlighter, F = DelimitedFrontmatter> {
    options: PreprocessOptions,
    extractor: X,
    highlighter: H,
    frontmatter: F,
    store: QueryStore,
}

impl QueryPreprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self::with_collaborators(
            options,
            FenceExtractor::default(),
            PlainHighlighter,
            DelimitedFrontmatter,
        )
    }
}

impl<X, H, F> QueryPreprocessor<X, H, F>
where
    X: QueryExtractor,
    H: Highlighter,
    F: FrontmatterDetector,
{
    pub fn with_collaborators(
        options: PreprocessOptions,
        extractor: X,
        highlighter: H,
        frontmatter: F,
    ) -> Self {
        QueryPreprocessor {
            options,
            extractor,
            highlighter,
            frontmatter,
            store: QueryStore::new(),
        }
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut QueryStore {
        &mut self.store
    }

    /// Forget a page's queries, e.g. after the page was deleted.
    pub fn evict(&mut self, filename: &str) -> Option<QueryMap> {
        self.store.evict(&document_key(filename))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MARKUP PHASE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn markup(
        &mut self,
        content: &str,
        filename: &str,
    ) -> Result<Option<Processed>, PreprocessError> {
        if !self.options.manages(filename) {
            return Ok(None);
        }

        let records = self.extractor.extract(content)?;
        let key = document_key(filename);
        tracing::debug!(
            file = filename,
            key = key.as_str(),
            queries = records.len(),
            "storing page queries"
        );
        self.store.insert(key, to_query_map(&records));

        let views: Vec<String> = records
            .iter()
            .filter(|q| !q.inline)
            .map(|q| {
                self.highlighter
                    .highlight(&q.compiled_query_string, &q.id.to_lowercase())
            })
            .collect();
        let external_views = format!("\n\n\n{}", views.join("\n"));

        let code = match self.frontmatter.detect(content) {
            Some(fm) => format!("{}{}{}", fm.block, external_views, fm.rest),
            None => format!("{}{}", external_views, content),
        };

        Ok(Some(Processed::new(code)))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCRIPT PHASE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn script(
        &self,
        content: &str,
        filename: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<Option<Processed>, PreprocessError> {
        if !self.options.manages(filename) {
            return Ok(None);
        }
        if attributes.get("context").map(String::as_str) == Some("module") {
            return Ok(None);
        }

        let key = document_key(filename);
        let empty = QueryMap::new();
        let queries = match self.store.get(&key) {
            Some(queries) => queries,
            None => {
                tracing::debug!(
                    file = filename,
                    "no stored queries for page, generating empty preamble"
                );
                &empty
            }
        };

        let classification = classify_queries(queries);
        let preamble = generate_preamble(&key, &classification, queries, &self.options);

        if self.options.verify_output {
            verify_generated_script(filename, &preamble)?;
        }

        Ok(Some(Processed {
            code: preamble + content,
            diagnostics: classification_diagnostics(filename, &classification),
        }))
    }
}

fn classification_diagnostics(
    filename: &str,
    classification: &QueryClassification,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for id in &classification.invalid_ids {
        diagnostics.push(Diagnostic::invalid_identifier(filename, id));
    }
    for id in &classification.rejected_ids {
        tracing::warn!(
            file = filename,
            query = id.as_str(),
            "query name is reserved by the generated script; skipping"
        );
        diagnostics.push(Diagnostic::reserved_identifier(filename, id));
    }
    diagnostics
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi(js_name = "QueryPreprocessor")]
pub struct NativeQueryPreprocessor {
    inner: QueryPreprocessor,
}

#[cfg(feature = "napi")]
#[napi]
impl NativeQueryPreprocessor {
    #[napi(constructor)]
    pub fn new(component_development_mode: bool) -> Self {
        NativeQueryPreprocessor {
            inner: QueryPreprocessor::new(PreprocessOptions::new(component_development_mode)),
        }
    }

    #[napi(factory)]
    pub fn with_options(options_json: String) -> napi::Result<Self> {
        let options = PreprocessOptions::from_json(&options_json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?;
        Ok(NativeQueryPreprocessor {
            inner: QueryPreprocessor::new(options),
        })
    }

    #[napi]
    pub fn markup(&mut self, content: String, filename: String) -> napi::Result<Option<String>> {
        self.inner
            .markup(&content, &filename)
            .map(|out| out.map(|p| p.code))
            .map_err(|e| napi::Error::from_reason(e.to_string()))
    }

    #[napi]
    pub fn script(
        &self,
        content: String,
        filename: String,
        attributes: HashMap<String, String>,
    ) -> napi::Result<Option<String>> {
        self.inner
            .script(&content, &filename, &attributes)
            .map(|out| out.map(|p| p.code))
            .map_err(|e| napi::Error::from_reason(e.to_string()))
    }

    #[napi]
    pub fn evict(&mut self, filename: String) -> bool {
        self.inner.evict(&filename).is_some()
    }
}

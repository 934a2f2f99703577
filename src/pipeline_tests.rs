#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::extract::{QueryExtractor, QueryMap, QueryRecord};
    use crate::frontmatter::DelimitedFrontmatter;
    use crate::highlight::{Highlighter, PlainHighlighter};
    use crate::identity::document_key;
    use crate::options::PreprocessOptions;
    use crate::pipeline::QueryPreprocessor;
    use crate::validate::{PreprocessError, DIAG_INVALID_IDENTIFIER, DIAG_RESERVED_IDENTIFIER};

    fn fixed(
        records: Vec<QueryRecord>,
    ) -> impl Fn(&str) -> Result<Vec<QueryRecord>, PreprocessError> {
        move |_: &str| Ok(records.clone())
    }

    fn labelled(query: &str, label: &str) -> String {
        format!("[{}:{}]", label, query)
    }

    fn preprocessor_with(
        records: Vec<QueryRecord>,
    ) -> QueryPreprocessor<impl QueryExtractor, impl Highlighter, DelimitedFrontmatter> {
        QueryPreprocessor::with_collaborators(
            PreprocessOptions::default(),
            fixed(records),
            labelled,
            DelimitedFrontmatter,
        )
    }

    fn instance_attrs() -> HashMap<String, String> {
        HashMap::new()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // MARKUP PHASE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_markup_after_frontmatter() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("q1", "select 1", false)]);
        let out = pre
            .markup("---\nTITLE: x\n---\nBody", "/pages/index.md")
            .unwrap()
            .unwrap();
        assert_eq!(out.code, "---\nTITLE: x\n---\n\n\n[q1:select 1]\nBody");
    }

    #[test]
    fn test_markup_keeps_crlf_frontmatter_delimiters() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("q1", "select 1", false)]);
        let out = pre
            .markup("---\r\nTITLE: x\r\n---\r\nBody", "/pages/index.md")
            .unwrap()
            .unwrap();
        assert_eq!(out.code, "---\r\nTITLE: x\r\n---\n\n\n[q1:select 1]\r\nBody");
    }

    #[test]
    fn test_markup_without_frontmatter_prepends_views() {
        let mut pre = preprocessor_with(vec![
            QueryRecord::new("Orders", "select * from orders", false),
            QueryRecord::new("inline_q", "select 2", true),
            QueryRecord::new("Totals", "select sum(x) from t", false),
        ]);
        let out = pre.markup("# Title\n", "/pages/sales.md").unwrap().unwrap();
        assert_eq!(
            out.code,
            "\n\n\n[orders:select * from orders]\n[totals:select sum(x) from t]# Title\n"
        );
    }

    #[test]
    fn test_markup_with_no_external_queries() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("q", "select 1", true)]);
        let out = pre.markup("Body", "/pages/a.md").unwrap().unwrap();
        assert_eq!(out.code, "\n\n\nBody");
    }

    #[test]
    fn test_markup_stores_queries_under_identity_key() {
        let mut pre = preprocessor_with(vec![
            QueryRecord::new("a", "select 1", false),
            QueryRecord::new("bad-id", "select 2", false),
        ]);
        pre.markup("Body", "/pages/a.md").unwrap();

        let stored = pre.store().get(&document_key("/pages/a.md")).unwrap();
        let keys: Vec<&String> = stored.keys().collect();
        assert_eq!(keys, vec!["a", "bad-id"]);
    }

    #[test]
    fn test_markup_renders_invalid_ids_too() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("Bad-Id", "select 2", false)]);
        let out = pre.markup("Body", "/pages/a.md").unwrap().unwrap();
        assert!(out.code.contains("[bad-id:select 2]"));
    }

    #[test]
    fn test_markup_ignores_unmanaged_files() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("a", "select 1", false)]);
        assert!(pre.markup("<div/>", "/components/Chart.svelte").unwrap().is_none());
        assert!(pre.store().is_empty());
    }

    #[test]
    fn test_markup_propagates_extractor_errors() {
        let mut pre = QueryPreprocessor::new(PreprocessOptions::default());
        let err = pre.markup("```sql q\nselect 1", "/pages/a.md").unwrap_err();
        assert_eq!(err, PreprocessError::UnterminatedFence { line: 1 });
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SCRIPT PHASE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_script_preserves_original_content() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("a", "select 1", false)]);
        pre.markup("Body", "/pages/a.md").unwrap();

        let original = "\n\tlet local = 1;\n";
        let out = pre
            .script(original, "/pages/a.md", &instance_attrs())
            .unwrap()
            .unwrap();
        assert!(out.code.ends_with(original));
        assert!(out.code.contains("let a = data.a ?? [];"));
        assert!(out
            .code
            .contains(&format!("$routeHash = '{}';", document_key("/pages/a.md"))));
    }

    #[test]
    fn test_script_without_markup_equals_empty_mapping() {
        let pre = preprocessor_with(vec![]);
        let unknown = pre
            .script("let x;", "/pages/new.md", &instance_attrs())
            .unwrap()
            .unwrap();

        let mut explicit = preprocessor_with(vec![]);
        explicit
            .store_mut()
            .insert(document_key("/pages/new.md"), QueryMap::new());
        let empty = explicit
            .script("let x;", "/pages/new.md", &instance_attrs())
            .unwrap()
            .unwrap();

        assert_eq!(unknown.code, empty.code);
        assert!(unknown.code.ends_with("let x;"));
        assert!(!unknown.code.contains("data_update"));
    }

    #[test]
    fn test_script_skips_module_context() {
        let mut pre = preprocessor_with(vec![QueryRecord::new("a", "select 1", false)]);
        pre.markup("Body", "/pages/a.md").unwrap();

        let mut attrs = HashMap::new();
        attrs.insert("context".to_string(), "module".to_string());
        assert!(pre.script("export const x = 1;", "/pages/a.md", &attrs).unwrap().is_none());
    }

    #[test]
    fn test_script_ignores_unmanaged_files() {
        let pre = preprocessor_with(vec![]);
        assert!(pre
            .script("let x;", "/components/Chart.svelte", &instance_attrs())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_script_reads_own_document_only() {
        let mut pre = QueryPreprocessor::new(PreprocessOptions::default());
        pre.markup("```sql first_q\nselect 1\n```", "/pages/one.md").unwrap();
        pre.markup("```sql second_q\nselect 2\n```", "/pages/two.md").unwrap();

        let one = pre.script("", "/pages/one.md", &instance_attrs()).unwrap().unwrap();
        assert!(one.code.contains("let first_q"));
        assert!(!one.code.contains("second_q"));
    }

    #[test]
    fn test_script_reports_skipped_identifiers() {
        let mut pre = preprocessor_with(vec![
            QueryRecord::new("ok", "select 1", false),
            QueryRecord::new("bad-id", "select 2", false),
            QueryRecord::new("inputs", "select 3", false),
        ]);
        pre.markup("Body", "/pages/a.md").unwrap();
        let out = pre.script("", "/pages/a.md", &instance_attrs()).unwrap().unwrap();

        let codes: Vec<&str> = out.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec![DIAG_INVALID_IDENTIFIER, DIAG_RESERVED_IDENTIFIER]);
        assert_eq!(out.diagnostics[1].identifier, "inputs");
    }

    #[test]
    fn test_remarkup_overwrites_entry() {
        let mut pre = QueryPreprocessor::new(PreprocessOptions::default());
        pre.markup("```sql old_q\nselect 1\n```", "/pages/a.md").unwrap();
        pre.markup("```sql new_q\nselect 1\n```", "/pages/a.md").unwrap();

        let out = pre.script("", "/pages/a.md", &instance_attrs()).unwrap().unwrap();
        assert!(out.code.contains("let new_q"));
        assert!(!out.code.contains("old_q"));
        assert_eq!(pre.store().len(), 1);
    }

    #[test]
    fn test_evict_forgets_document() {
        let mut pre = QueryPreprocessor::new(PreprocessOptions::default());
        pre.markup("```sql q\nselect 1\n```", "/pages/a.md").unwrap();
        assert!(pre.evict("/pages/a.md").is_some());

        let out = pre.script("", "/pages/a.md", &instance_attrs()).unwrap().unwrap();
        assert!(!out.code.contains("let q"));
    }

    #[test]
    fn test_instances_do_not_share_store() {
        let mut first = QueryPreprocessor::new(PreprocessOptions::default());
        let second = QueryPreprocessor::new(PreprocessOptions::default());
        first.markup("```sql q\nselect 1\n```", "/pages/a.md").unwrap();

        let out = second.script("", "/pages/a.md", &instance_attrs()).unwrap().unwrap();
        assert!(!out.code.contains("let q"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // END TO END
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_end_to_end_with_verification() {
        let options = PreprocessOptions {
            verify_output: true,
            ..Default::default()
        };
        let mut pre = QueryPreprocessor::new(options);

        let page = "---\ntitle: Sales\n---\n\n```sql orders\nselect * from orders\n```\n\n```sql filtered\nselect * from orders where region = '${inputs.region.value}'\n```\n";
        let markup = pre.markup(page, "/pages/sales.md").unwrap().unwrap();
        assert!(markup.code.starts_with("---\ntitle: Sales\n---\n\n\n<pre class=\"language-sql\" data-query=\"orders\">"));
        assert!(markup.code.contains("data-query=\"filtered\""));

        let script = pre
            .script("\n\tconsole.log(orders);\n", "/pages/sales.md", &instance_attrs())
            .unwrap()
            .unwrap();
        assert!(script.diagnostics.is_empty());
        assert!(script.code.contains("$: if (!browser || dev) {"));
        assert!(script.code.contains("const _query_filtered = debounce_on_browser("));
        assert!(script
            .code
            .contains("filtered = _query_filtered(`select * from orders where region = '${inputs.region.value}'`);"));
        assert!(script.code.ends_with("\n\tconsole.log(orders);\n"));
    }

    #[test]
    fn test_custom_extension() {
        let options = PreprocessOptions {
            extension: ".evidence".to_string(),
            ..Default::default()
        };
        let mut pre = QueryPreprocessor::with_collaborators(
            options,
            fixed(vec![QueryRecord::new("q", "select 1", false)]),
            PlainHighlighter,
            DelimitedFrontmatter,
        );
        assert!(pre.markup("Body", "/pages/a.md").unwrap().is_none());
        assert!(pre.markup("Body", "/pages/a.evidence").unwrap().is_some());
    }
}

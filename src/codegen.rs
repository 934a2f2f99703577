//! Codegen module for the query preprocessor
//!
//! Emits the script preamble that binds a page's queries to reactive
//! variables. Each generation rule is a pure function returning statement
//! text, and [`ScriptFragment`] strings them together in order.
//!
//! ## Execution strategies
//!
//! | class       | emitted binding                                             |
//! |-------------|-------------------------------------------------------------|
//! | prerendered | runs on the server (or always in dev), result cached in data |
//! | reactive    | debounced executor re-run whenever its query string changes |
//! | input       | reactive, plus a server-side `inputs_store` subscription     |

use crate::classify::QueryClassification;
use crate::extract::QueryMap;
use crate::options::PreprocessOptions;

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME MODULES
// ═══════════════════════════════════════════════════════════════════════════════

const UTILITIES_STORES: &str = "@evidence-dev/component-utilities/stores";
const UTILITIES_FORMATTING: &str = "@evidence-dev/component-utilities/formatting";
const UTILITIES_CONTEXTS: &str = "@evidence-dev/component-utilities/globalContexts";
const UTILITIES_PROFILE: &str = "@evidence-dev/component-utilities/profile";

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT FRAGMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered list of generated statement blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptFragment {
    blocks: Vec<String>,
}

impl ScriptFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: impl Into<String>) {
        self.blocks.push(block.into());
    }

    pub fn append(&mut self, other: ScriptFragment) {
        self.blocks.extend(other.blocks);
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks separated by a blank line, with a trailing newline.
    pub fn render(&self) -> String {
        if self.blocks.is_empty() {
            return String::new();
        }
        let mut out = self.blocks.join("\n\n");
        out.push('\n');
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE ESCAPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Prepare query text for embedding between backticks.
///
/// Literal parts get `\` and `` ` `` escaped. Balanced `${...}` spans are
/// copied verbatim so they still evaluate as expressions; an unbalanced `${`
/// is escaped to a literal `$`.
pub fn escape_template_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '$' if chars.get(i + 1) == Some(&'{') => {
                let start = i + 2;
                let mut depth = 1;
                let mut end = start;
                while end < chars.len() && depth > 0 {
                    match chars[end] {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                    end += 1;
                }

                if depth == 0 {
                    out.extend(&chars[i..end]);
                    i = end;
                } else {
                    out.push_str("\\$");
                    i += 1;
                }
            }
            '`' => {
                out.push_str("\\`");
                i += 1;
            }
            '\\' => {
                out.push_str("\\\\");
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// Reassigns every bound variable from the incoming `data` prop.
pub fn data_update_block(valid_ids: &[String]) -> String {
    let mut out = String::from("function data_update(data) {\n");
    for id in valid_ids {
        out.push_str(&format!("\t{id} = data.{id} ?? [];\n"));
    }
    out.push_str("}\n\n$: data_update(data);");
    out
}

/// The reactive query string and the result variable for one query.
pub fn query_binding_block(id: &str, query: &str) -> String {
    format!(
        "$: _query_string_{id} = `{}`;\nlet {id} = data.{id} ?? [];",
        escape_template_text(query)
    )
}

/// Server-side execution for queries without interpolation. Dev mode reruns
/// on the client too, since the page may not have been server-rendered.
pub fn prerendered_block(id: &str) -> String {
    format!(
        "$: if (!browser || dev) {{\n\tprofile(__db.query, _query_string_{id}, \"{id}\", (value) => {id} = value);\n}}"
    )
}

/// Debouncing only makes sense in the browser; on the server it is identity.
pub fn debounce_helper() -> String {
    "const debounce_on_browser = browser ? debounce : (fn) => fn;".to_string()
}

/// Debounced executor for an interpolated query, re-run on each change of its
/// query string.
pub fn reactive_block(id: &str, debounce_ms: u32) -> String {
    format!(
        "const _query_{id} = debounce_on_browser(\n\
         \t(query) => profile(__db.query, query, \"{id}\", (value) => ({id} = value)),\n\
         \t{debounce_ms}\n\
         );\n\n\
         $: _query_{id}(_query_string_{id});"
    )
}

/// Reactive statements do not run during server rendering, so input-driven
/// queries are re-issued from an explicit `inputs_store` subscription there.
pub fn input_subscription_block(input_ids: &[String], queries: &QueryMap) -> String {
    let mut out = String::from("if (!browser) {\n\tonDestroy(inputs_store.subscribe((inputs) => {\n");
    for id in input_ids {
        let query = queries.get(id).map(String::as_str).unwrap_or_default();
        out.push_str(&format!(
            "\t\t{id} = _query_{id}(`{}`);\n",
            escape_template_text(query)
        ));
    }
    out.push_str("\t}));\n}");
    out
}

fn query_runtime_imports() -> String {
    format!(
        "import debounce from 'debounce';\n\
         import {{ browser, dev }} from '$app/environment';\n\
         import {{ profile }} from '{UTILITIES_PROFILE}';"
    )
}

/// All per-query declarations for a page. Empty when no identifier survived
/// classification.
pub fn generate_query_declarations(
    classification: &QueryClassification,
    queries: &QueryMap,
    options: &PreprocessOptions,
) -> ScriptFragment {
    let mut fragment = ScriptFragment::new();
    if classification.is_empty() {
        return fragment;
    }

    fragment.push(query_runtime_imports());
    fragment.push(data_update_block(&classification.valid_ids));

    for id in &classification.valid_ids {
        let query = queries.get(id).map(String::as_str).unwrap_or_default();
        fragment.push(query_binding_block(id, query));
    }

    for id in &classification.prerendered_ids {
        fragment.push(prerendered_block(id));
    }

    // Helper and subscription are emitted only when something references them.
    if !classification.reactive_ids.is_empty() {
        fragment.push(debounce_helper());
        for id in &classification.reactive_ids {
            fragment.push(reactive_block(id, options.debounce_ms));
        }
    }

    if !classification.input_ids.is_empty() {
        fragment.push(input_subscription_block(&classification.input_ids, queries));
    }

    fragment
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAFFOLDING
// ═══════════════════════════════════════════════════════════════════════════════

/// The fixed part of every page preamble.
pub fn generate_scaffolding(route_key: &str) -> ScriptFragment {
    let mut fragment = ScriptFragment::new();

    fragment.push(format!(
        "import {{ page }} from '$app/stores';\n\
         import {{ pageHasQueries, routeHash }} from '{UTILITIES_STORES}';\n\
         import {{ setContext, getContext, beforeUpdate, onDestroy }} from 'svelte';\n\
         import {{ writable }} from 'svelte/store';\n\
         import {{ fmt }} from '{UTILITIES_FORMATTING}';\n\
         import {{ CUSTOM_FORMATTING_SETTINGS_CONTEXT_KEY, INPUTS_CONTEXT_KEY }} from '{UTILITIES_CONTEXTS}';"
    ));

    // `data` is exported under another local name so query results can use it.
    fragment.push(
        "let props;\n\
         export { props as data };\n\
         let { data = {}, customFormattingSettings, __db } = props;\n\
         $: ({ data = {}, customFormattingSettings, __db } = props);",
    );

    fragment.push(format!("$routeHash = '{route_key}';"));

    // Not `$: inputs = $inputs_store`; reactive statements do not rerun during SSR.
    fragment.push(
        "let inputs_store = writable({});\n\
         setContext(INPUTS_CONTEXT_KEY, inputs_store);\n\n\
         let inputs = {};\n\
         onDestroy(inputs_store.subscribe((value) => inputs = value));",
    );

    fragment.push("$: pageHasQueries.set(Object.keys(data).length > 0);");

    fragment.push(
        "setContext(CUSTOM_FORMATTING_SETTINGS_CONTEXT_KEY, {\n\
         \tgetCustomFormats: () => {\n\
         \t\treturn customFormattingSettings.customFormats || [];\n\
         \t}\n\
         });",
    );

    fragment
}

/// Scaffolding followed by the query declarations, rendered.
pub fn generate_preamble(
    route_key: &str,
    classification: &QueryClassification,
    queries: &QueryMap,
    options: &PreprocessOptions,
) -> String {
    let mut fragment = generate_scaffolding(route_key);
    fragment.append(generate_query_declarations(classification, queries, options));
    fragment.render()
}

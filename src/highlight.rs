//! Rendering of non-inline query text into the page markup.

pub trait Highlighter {
    /// Render `query` as a markup fragment labelled `label`.
    fn highlight(&self, query: &str, label: &str) -> String;
}

impl<F> Highlighter for F
where
    F: Fn(&str, &str) -> String,
{
    fn highlight(&self, query: &str, label: &str) -> String {
        self(query, label)
    }
}

/// Renders the query as an escaped `<pre>` block.
///
/// Braces are entity-encoded as well, since the surrounding markup treats
/// `{...}` as an expression.
#[derive(Debug, Clone, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, query: &str, label: &str) -> String {
        format!(
            "<pre class=\"language-sql\" data-query=\"{}\"><code>{}</code></pre>",
            escape_markup(label),
            escape_markup(query)
        )
    }
}

pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

//! Leading metadata block detection.
//!
//! A page may open with a block delimited by `---` lines. Rendered query views
//! have to land after that block, so the markup phase splits it off first.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FRONTMATTER_RE: Regex = Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// The whole block, delimiters included, exactly as written.
    pub block: &'a str,
    /// Text between the delimiters, without the delimiter lines.
    pub inner: &'a str,
    /// Everything after the closing delimiter.
    pub rest: &'a str,
}

pub trait FrontmatterDetector {
    fn detect<'a>(&self, content: &'a str) -> Option<Frontmatter<'a>>;
}

#[derive(Debug, Clone, Default)]
pub struct DelimitedFrontmatter;

impl FrontmatterDetector for DelimitedFrontmatter {
    fn detect<'a>(&self, content: &'a str) -> Option<Frontmatter<'a>> {
        let caps = FRONTMATTER_RE.captures(content)?;
        let whole = caps.get(0)?;
        let inner = caps.get(1)?;
        Some(Frontmatter {
            block: whole.as_str(),
            inner: inner.as_str(),
            rest: &content[whole.end()..],
        })
    }
}

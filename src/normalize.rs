//! Content normalization.
//!
//! Stage 3 of the migration pipeline. Turns WordPress body markup into the
//! HTML fragment inserted into a page:
//!
//! ```text
//! raw ──► decode entities ──► \r\n, \r → \n ──► strip <!-- wp:… --> ──► collapse blank lines
//!           ▲                                                               │
//!           └──────────────────── until nothing changes ◄───────────────────┘
//!      ──► rewrite src=/href= under the legacy asset prefix to the asset host
//!      ──► wrap loose text in <p> (Layout::Paragraphs only)
//! ```
//!
//! Every step in the loop only shrinks the text (or swaps `\r` for `\n`), so
//! the loop terminates, and its output is a fixed point of each step. The
//! asset rewrite and paragraph wrapping never reintroduce what the loop
//! removes, which makes [`normalize`] idempotent.

use crate::config::SiteConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Editor block delimiters: `<!-- wp:name {…} -->`, `<!-- /wp:name -->`, `<!-- wp:name /-->`.
static BLOCK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*/?wp:[^>]*-->").unwrap());

/// Three or more newlines separated only by whitespace.
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

/// Start of a `src=` or `href=` attribute value, either quote style.
static URL_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:src|href)\s*=\s*["']"#).unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Block-level tags that are never wrapped in `<p>`.
const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "blockquote",
    "hr",
    "figure",
    "table",
    "pre",
];

/// Maximum excerpt length in characters.
pub const EXCERPT_LIMIT: usize = 200;

/// Whether loose text is wrapped into paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Chapters and blog posts: blank-line separated text becomes `<p>` blocks.
    Paragraphs,
    /// Standalone pages keep their structure as exported.
    Verbatim,
}

/// Asset rewriting parameters.
#[derive(Debug, Clone)]
pub struct NormalizeRules {
    asset_host: String,
    asset_prefix: String,
}

impl NormalizeRules {
    /// `asset_host` is an absolute origin without a trailing slash
    /// requirement; `asset_prefix` is the root-relative path to rewrite.
    pub fn new(asset_host: &str, asset_prefix: &str) -> Self {
        Self {
            asset_host: asset_host.trim_end_matches('/').to_string(),
            asset_prefix: asset_prefix.to_string(),
        }
    }

    pub fn from_config(site: &SiteConfig) -> Self {
        Self::new(&site.asset_host, &site.asset_prefix)
    }
}

/// Normalize raw WordPress markup into an HTML fragment.
pub fn normalize(raw: &str, rules: &NormalizeRules, layout: Layout) -> String {
    let mut text = raw.to_string();
    loop {
        let next = shrink(&text);
        if next == text {
            break;
        }
        text = next;
    }

    let text = rewrite_asset_urls(&text, rules);
    match layout {
        Layout::Paragraphs => wrap_paragraphs(&text),
        Layout::Verbatim => text,
    }
}

/// One round of the shrinking steps.
fn shrink(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let unix = decoded.replace("\r\n", "\n").replace('\r', "\n");
    let unmarked = BLOCK_MARKER.replace_all(&unix, "");
    BLANK_RUN.replace_all(&unmarked, "\n\n").into_owned()
}

fn rewrite_asset_urls(text: &str, rules: &NormalizeRules) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in URL_ATTRIBUTE.find_iter(text) {
        if text[m.end()..].starts_with(&rules.asset_prefix) {
            out.push_str(&text[last..m.end()]);
            out.push_str(&rules.asset_host);
            last = m.end();
        }
    }
    out.push_str(&text[last..]);
    out
}

fn wrap_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .map(|unit| {
            if starts_with_block_tag(unit) {
                unit.to_string()
            } else {
                format!("<p>{unit}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `<tag>`, `<tag attr…>` or `<tag/>` for a block-level tag, any case.
fn starts_with_block_tag(unit: &str) -> bool {
    let Some(rest) = unit.strip_prefix('<') else {
        return false;
    };
    BLOCK_TAGS.iter().any(|tag| {
        rest.get(..tag.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            && rest[tag.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
    })
}

/// Plain text of an HTML fragment: tags removed, whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let decoded = html_escape::decode_html_entities(html);
    let stripped = TAG.replace_all(&decoded, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Summary text for search entries and the category index.
///
/// Uses the hand-written excerpt when it has any text, otherwise the text of
/// the normalized body. Either way the result is at most
/// [`EXCERPT_LIMIT`] characters.
pub fn excerpt_for(record_excerpt: &str, normalized: &str) -> String {
    let excerpt = plain_text(record_excerpt);
    let text = if excerpt.is_empty() {
        plain_text(normalized)
    } else {
        excerpt
    };
    truncate_chars(&text, EXCERPT_LIMIT)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

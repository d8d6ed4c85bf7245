//! Centralized slug handling.
//!
//! Two conventions matter to the migration:
//!
//! - **Derived slugs**: items without a `wp:post_name` get a slug computed
//!   from their title, the same way WordPress would sanitize it.
//! - **Chapter slugs**: serialized fiction is published as `<series>-<n>`
//!   (`pokemon-12`, `guardian-3`). The number orders the chapter within its
//!   series.
//!
//! ## Chapter numbers
//!
//! Only plain ASCII digits directly after `<series>-` count, and the whole
//! remainder of the slug must be digits:
//! - `"pokemon-12"` with series `pokemon` → `Some(12)`
//! - `"pokemon-012"` → `Some(12)`
//! - `"pokemon-12-2"` → `None`
//! - `"pokemon-team-roster"` → `None`
//! - `"pokemonx-12"` → `None`

/// Parse a chapter slug `<series>-<digits>` for one series name.
///
/// Returns `None` when the slug belongs to another series, has a non-numeric
/// suffix, or the number does not fit in a `u32`.
pub fn parse_chapter_slug(slug: &str, series: &str) -> Option<u32> {
    if series.is_empty() {
        return None;
    }
    let digits = slug.strip_prefix(series)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok()
}

/// Compute a URL slug from a display title.
///
/// Strips markup, lowercases, drops anything that is not a word character,
/// whitespace or dash, then collapses whitespace/dash runs into single
/// dashes. `"Hello, <em>World</em>!"` → `"hello-world"`.
pub fn slugify(title: &str) -> String {
    let mut text = String::with_capacity(title.len());
    let mut in_tag = false;
    for c in title.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

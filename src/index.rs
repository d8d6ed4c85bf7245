//! Search manifest and blog index maintenance.
//!
//! Stage 5 of the migration pipeline. Three outputs are rebuilt every run:
//!
//! - **Search manifest** (`search.json`): a JSON array shared with content
//!   outside this tool. The run owns only the entries whose URL lies under
//!   the blog root *and* whose `type` is the blog entry type; those are
//!   replaced wholesale, everything else is kept byte-for-byte and in order.
//! - **Category index** (`<blog_root>/index.html`): blog posts grouped by
//!   their primary section.
//! - **Run manifest** (`blog-manifest.json`): metadata of every page emitted
//!   this run, used by the next run to count unchanged pages.
//!
//! Loading is best-effort: a missing or corrupt manifest reads as empty, with
//! a warning, so a damaged file heals on the next run.

use crate::config::{BlogConfig, SectionConfig};
use crate::emit::{EmitError, PageMeta, write_file};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Write(#[from] EmitError),
}

// =============================================================================
// Search manifest
// =============================================================================

/// One search manifest entry written by this tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub excerpt: String,
}

impl SearchEntry {
    pub fn for_page(page: &PageMeta, entry_type: &str) -> Self {
        Self {
            title: page.title.clone(),
            url: page.url.clone(),
            entry_type: entry_type.to_string(),
            excerpt: page.excerpt.clone(),
        }
    }
}

/// The search manifest as loaded from disk.
///
/// Entries are kept as raw JSON so entries written by other tools survive a
/// merge unchanged, including fields this tool does not know about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchIndex {
    entries: Vec<Value>,
}

impl SearchIndex {
    /// Load the manifest, treating a missing or unreadable file as empty.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no existing search manifest");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "search manifest unreadable, starting empty");
                return Self::default();
            }
        };
        match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(entries) => Self { entries },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "search manifest corrupt, starting empty");
                Self::default()
            }
        }
    }

    pub fn from_entries(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_file(path, &json)?;
        Ok(())
    }
}

/// Whether an entry belongs to the `(url_prefix, entry_type)` owner.
fn is_owned(entry: &Value, url_prefix: &str, entry_type: &str) -> bool {
    let url = entry.get("url").and_then(Value::as_str);
    let kind = entry.get("type").and_then(Value::as_str);
    matches!((url, kind), (Some(url), Some(kind)) if url.starts_with(url_prefix) && kind == entry_type)
}

/// Replace every entry owned by `(url_prefix, entry_type)` with `fresh`.
///
/// Entries not owned keep their order and content. Fresh entries are
/// appended after them, deduplicated by URL (a later entry replaces an
/// earlier one in place).
pub fn merge_owned(
    existing: SearchIndex,
    fresh: Vec<SearchEntry>,
    url_prefix: &str,
    entry_type: &str,
) -> SearchIndex {
    let mut entries: Vec<Value> = existing
        .entries
        .into_iter()
        .filter(|entry| !is_owned(entry, url_prefix, entry_type))
        .collect();
    let kept = entries.len();

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut added: Vec<SearchEntry> = Vec::new();
    for entry in fresh {
        match positions.get(&entry.url) {
            Some(&i) => added[i] = entry,
            None => {
                positions.insert(entry.url.clone(), added.len());
                added.push(entry);
            }
        }
    }

    entries.extend(added.iter().filter_map(|e| serde_json::to_value(e).ok()));
    debug!(kept, added = added.len(), "merged search manifest");
    SearchIndex { entries }
}

// =============================================================================
// Category index
// =============================================================================

/// One link on the category index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub slug: String,
    pub url: String,
}

/// A titled group of posts on the category index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSection {
    pub label: String,
    pub entries: Vec<IndexEntry>,
}

/// The section a post is listed under: the first group, in matching order,
/// sharing a category with the post; otherwise `default`.
pub fn primary_section<'a>(
    categories: &[String],
    groups: &'a [SectionConfig],
    default: &'a str,
) -> &'a str {
    groups
        .iter()
        .find(|group| {
            group
                .categories
                .iter()
                .any(|g| categories.iter().any(|c| c.eq_ignore_ascii_case(g)))
        })
        .map(|group| group.label.as_str())
        .unwrap_or(default)
}

/// Group blog pages into sections, in display order, each sorted by title
/// then slug. Empty sections are left out.
pub fn build_sections<'p>(
    pages: impl IntoIterator<Item = &'p PageMeta>,
    blog: &BlogConfig,
) -> Vec<IndexSection> {
    let mut grouped: BTreeMap<&str, Vec<IndexEntry>> = BTreeMap::new();
    for page in pages {
        let label = primary_section(&page.categories, &blog.sections, &blog.default_section);
        grouped.entry(label).or_default().push(IndexEntry {
            title: page.title.clone(),
            slug: page.slug.clone(),
            url: page.url.clone(),
        });
    }

    blog.section_order
        .iter()
        .filter_map(|label| {
            let mut entries = grouped.remove(label.as_str())?;
            entries.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
            Some(IndexSection {
                label: label.clone(),
                entries,
            })
        })
        .collect()
}

// =============================================================================
// Run manifest
// =============================================================================

/// Write the run manifest: metadata of every emitted page, in emission order.
pub fn save_run_manifest(path: &Path, pages: &[&PageMeta]) -> Result<(), IndexError> {
    let json = serde_json::to_string_pretty(pages)?;
    write_file(path, &json)?;
    Ok(())
}

/// Content hashes by URL from a previous run manifest. Best-effort: a missing
/// or corrupt manifest yields no hashes.
pub fn load_previous_hashes(path: &Path) -> HashMap<String, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    let entries: Vec<Value> = match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "run manifest corrupt, ignoring");
            return HashMap::new();
        }
    };
    entries
        .iter()
        .filter_map(|entry| {
            let url = entry.get("url")?.as_str()?;
            let hash = entry.get("content_hash")?.as_str()?;
            Some((url.to_string(), hash.to_string()))
        })
        .collect()
}

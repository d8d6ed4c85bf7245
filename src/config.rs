//! Migration configuration.
//!
//! Handles loading, validating, and merging `migrate.toml`. Stock defaults
//! describe the original site (series names, exclusion lists, blog sections);
//! a user file overrides only the keys it names.
//!
//! ## Config File Location
//!
//! ```text
//! wp-migrate --config path/to/migrate.toml build export.xml   # explicit
//! wp-migrate build exports/site.xml                           # exports/migrate.toml if present
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! name = "Daystar Eld"
//! asset_host = "https://daystareld.com"   # absolute host for legacy asset URLs
//! asset_prefix = "/wp-content/"           # root-relative prefix to rewrite
//! search_script = "/search.js"
//!
//! [[site.nav]]
//! label = "Blog"
//! href = "/blog/"
//!
//! [classify]
//! min_content_length = 20
//! excluded_slug_prefixes = ["guardian", "hpmor-remix"]
//! excluded_categories = ["podcast", "uncategorized"]
//!
//! [[series]]
//! name = "pokemon"                        # chapters are pokemon-<n>
//! title = "Pokemon: The Origin of Species"
//! pages = ["the-origin-of-species-faq"]   # standalone pages under /pokemon/
//!
//! [blog]
//! root = "blog"
//! search_type = "Blog Post"
//! default_section = "General"
//! section_order = ["Book Reviews", "General"]
//!
//! [[blog.sections]]
//! label = "Book Reviews"
//! categories = ["book-reviews", "book reviews"]
//!
//! [output]
//! search_index = "search.json"
//! run_manifest = "blog-manifest.json"
//!
//! [colors]
//! background = "#0a0a0a"
//! ```
//!
//! ## Partial Configuration
//!
//! Tables merge key by key. Arrays (including arrays of tables such as
//! `[[series]]` and `[[blog.sections]]`) replace the stock value wholesale.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up next to the export when no `--config` is given.
pub const CONFIG_FILENAME: &str = "migrate.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full migration configuration loaded from `migrate.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Site identity, asset host and page chrome.
    pub site: SiteConfig,
    /// Exclusion rules for the classifier.
    pub classify: ClassifyConfig,
    /// Chapter series, each with optional standalone pages.
    pub series: Vec<SeriesConfig>,
    /// Blog root, search entry type and category index sections.
    pub blog: BlogConfig,
    /// Index file names inside the output directory.
    pub output: OutputConfig,
    /// Palette injected as CSS custom properties.
    pub colors: ColorScheme,
}

impl MigrateConfig {
    /// Validate values the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = &self.site.asset_host;
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "site.asset_host must start with http:// or https://".into(),
            ));
        }
        if host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '&' | '<' | '>' | '"' | '\''))
        {
            return Err(ConfigError::Validation(
                "site.asset_host must not contain whitespace, quotes, '&', '<' or '>'".into(),
            ));
        }
        if !self.site.asset_prefix.starts_with('/') || self.site.asset_prefix.len() < 2 {
            return Err(ConfigError::Validation(
                "site.asset_prefix must be a root-relative path like \"/wp-content/\"".into(),
            ));
        }

        if !is_path_segment(&self.blog.root) {
            return Err(ConfigError::Validation(format!(
                "blog.root must be a single path segment, got {:?}",
                self.blog.root
            )));
        }

        let mut roots = HashSet::new();
        roots.insert(self.blog.root.as_str());
        for series in &self.series {
            if !is_path_segment(&series.name) {
                return Err(ConfigError::Validation(format!(
                    "series name must be a single path segment, got {:?}",
                    series.name
                )));
            }
            if !roots.insert(series.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "series {:?} collides with another series or the blog root",
                    series.name
                )));
            }
            if let Some(page) = series.pages.iter().find(|p| !is_path_segment(p)) {
                return Err(ConfigError::Validation(format!(
                    "series {:?} lists invalid page slug {:?}",
                    series.name, page
                )));
            }
        }

        let mut known: HashSet<&str> = self
            .blog
            .sections
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        known.insert(self.blog.default_section.as_str());
        let ordered: HashSet<&str> = self.blog.section_order.iter().map(String::as_str).collect();
        if let Some(missing) = known.iter().find(|label| !ordered.contains(*label)) {
            return Err(ConfigError::Validation(format!(
                "blog.section_order is missing section {missing:?}"
            )));
        }
        if let Some(unknown) = ordered.iter().find(|label| !known.contains(*label)) {
            return Err(ConfigError::Validation(format!(
                "blog.section_order names unknown section {unknown:?}"
            )));
        }

        if self.output.search_index.is_empty() || self.output.run_manifest.is_empty() {
            return Err(ConfigError::Validation(
                "output file names must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Look up a series by name.
    pub fn series(&self, name: &str) -> Option<&SeriesConfig> {
        self.series.iter().find(|s| s.name == name)
    }
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            classify: ClassifyConfig::default(),
            series: vec![SeriesConfig {
                name: "pokemon".to_string(),
                title: "Pokemon: The Origin of Species".to_string(),
                pages: [
                    "pokemon-team-roster",
                    "pokemon-team-roster-ii",
                    "pokemon-team-roster-iii",
                    "pokemon-team-roster-iv",
                    "the-origin-of-species-faq",
                    "toos-fan-art",
                    "pokemon-goal-factoring",
                ]
                .map(String::from)
                .to_vec(),
            }],
            blog: BlogConfig::default(),
            output: OutputConfig::default(),
            colors: ColorScheme::default(),
        }
    }
}

/// A path segment usable as an output directory name.
fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\'])
        && !value.chars().any(char::is_whitespace)
}

/// Site identity and page chrome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Brand shown in the header of every page.
    pub name: String,
    /// Absolute origin that legacy root-relative asset URLs are rewritten to.
    pub asset_host: String,
    /// Root-relative asset prefix to rewrite (`src="/wp-content/..."`).
    pub asset_prefix: String,
    /// Client-side search script referenced by every page.
    pub search_script: String,
    /// Primary navigation links.
    pub nav: Vec<NavLink>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Daystar Eld".to_string(),
            asset_host: "https://daystareld.com".to_string(),
            asset_prefix: "/wp-content/".to_string(),
            search_script: "/search.js".to_string(),
            nav: vec![
                NavLink::new("Pokemon: TOoS", "/pokemon/"),
                NavLink::new("Rationally Writing", "/rationally-writing/"),
                NavLink::new("Blog", "/blog/"),
                NavLink::new("Stories", "/stories/"),
                NavLink::new("Support", "https://www.patreon.com/c/daystareld"),
            ],
        }
    }
}

/// A header navigation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

impl NavLink {
    pub fn new(label: &str, href: &str) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
        }
    }

    /// External links open in a new tab.
    pub fn is_external(&self) -> bool {
        self.href.starts_with("http://") || self.href.starts_with("https://")
    }
}

/// Exclusion rules applied after chapter detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Posts whose trimmed body is shorter than this many characters are stubs.
    pub min_content_length: usize,
    /// Slugs starting with any of these are already migrated elsewhere.
    pub excluded_slug_prefixes: Vec<String>,
    /// Category names (case-insensitive) whose posts are not blog posts.
    pub excluded_categories: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            min_content_length: 20,
            excluded_slug_prefixes: [
                "hpmor-remix",
                "rationally-writing",
                "guardian",
                "because-prophecy",
                "hearts-and-minds",
            ]
            .map(String::from)
            .to_vec(),
            excluded_categories: [
                "pokemon: the origin of species",
                "rationally-writing",
                "rationally writing",
                "hpmor-remix",
                "podcast",
                "podcasts",
                "uncategorized",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// A numbered chapter series and its standalone pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesConfig {
    /// Slug prefix of chapters and the output root directory.
    pub name: String,
    /// Display title used in page titles and back links.
    pub title: String,
    /// Slugs of non-chapter pages published under the series root.
    #[serde(default)]
    pub pages: Vec<String>,
}

/// Blog listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    /// Output root directory and URL prefix of blog posts.
    pub root: String,
    /// Title of the category index page.
    pub title: String,
    /// `type` tag of the search manifest entries owned by the blog.
    pub search_type: String,
    /// Section for posts that match no configured group.
    pub default_section: String,
    /// Display order of sections on the index page.
    pub section_order: Vec<String>,
    /// Matching groups, tested top-down; first match is the primary section.
    pub sections: Vec<SectionConfig>,
}

impl Default for BlogConfig {
    fn default() -> Self {
        let sections = vec![
            SectionConfig::new(
                "Therapy and Psychology",
                &["therapy-and-psychology", "therapy and psychology"],
            ),
            SectionConfig::new(
                "Romantic Relationships",
                &["romantic-relationships", "romantic relationships"],
            ),
            SectionConfig::new(
                "Knowledge and Epistemology",
                &["knowledge-and-epistemology", "knowledge and epistemology"],
            ),
            SectionConfig::new(
                "Politics and Society",
                &["politics-and-society-articles", "politics and society"],
            ),
            SectionConfig::new("Storytelling", &["storytelling"]),
            SectionConfig::new("Game Reviews", &["game-reviews", "game reviews", "games"]),
            SectionConfig::new("Book Reviews", &["book-reviews", "book reviews"]),
            SectionConfig::new("Movie Reviews", &["movie-reviews", "movie reviews"]),
            SectionConfig::new("Personal", &["personal"]),
        ];
        Self {
            root: "blog".to_string(),
            title: "Blog".to_string(),
            search_type: "Blog Post".to_string(),
            default_section: "General".to_string(),
            section_order: [
                "Personal",
                "Therapy and Psychology",
                "Romantic Relationships",
                "Knowledge and Epistemology",
                "Politics and Society",
                "Storytelling",
                "Game Reviews",
                "Book Reviews",
                "Movie Reviews",
                "General",
            ]
            .map(String::from)
            .to_vec(),
            sections,
        }
    }
}

/// One category group of the blog index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    /// Section heading.
    pub label: String,
    /// Lowercase category names that place a post in this section.
    pub categories: Vec<String>,
}

impl SectionConfig {
    pub fn new(label: &str, categories: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Index file names, relative to the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub search_index: String,
    pub run_manifest: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            search_index: "search.json".to_string(),
            run_manifest: "blog-manifest.json".to_string(),
        }
    }
}

/// Page palette.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    /// Raised surfaces: search box, results, index panels.
    pub panel: String,
    pub text: String,
    /// Secondary text: dates, metadata, empty states.
    pub muted: String,
    pub accent: String,
    pub link: String,
    pub border: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            panel: "#0f0f0f".to_string(),
            text: "#e5e7eb".to_string(),
            muted: "#9ca3af".to_string(),
            accent: "#047857".to_string(),
            link: "#34d399".to_string(),
            border: "#1a1a1a".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(MigrateConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MigrateConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MigrateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Where the config for an export lives when none is given explicitly.
pub fn default_config_path(export_path: &Path) -> PathBuf {
    export_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CONFIG_FILENAME)
}

/// Load the config for a run.
///
/// An explicit path must exist. Without one, `migrate.toml` next to the
/// export is used when present; otherwise stock defaults apply.
pub fn load_config(
    explicit: Option<&Path>,
    export_path: &Path,
) -> Result<MigrateConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(&default_config_path(export_path))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `migrate.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# wp-migrate Configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Tables merge key by key over these defaults; arrays (including [[series]]
# and [[blog.sections]]) replace the default list entirely.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity and chrome
# ---------------------------------------------------------------------------
[site]
name = "Daystar Eld"
# Root-relative asset references (src="/wp-content/...") are rewritten to
# absolute URLs on this host.
asset_host = "https://daystareld.com"
asset_prefix = "/wp-content/"
# Client-side search script that reads the search manifest.
search_script = "/search.js"

[[site.nav]]
label = "Pokemon: TOoS"
href = "/pokemon/"

[[site.nav]]
label = "Rationally Writing"
href = "/rationally-writing/"

[[site.nav]]
label = "Blog"
href = "/blog/"

[[site.nav]]
label = "Stories"
href = "/stories/"

[[site.nav]]
label = "Support"
href = "https://www.patreon.com/c/daystareld"

# ---------------------------------------------------------------------------
# Classification
# ---------------------------------------------------------------------------
[classify]
# Posts with fewer trimmed body characters than this are skipped as stubs.
min_content_length = 20
# Slugs starting with these belong to content migrated elsewhere.
excluded_slug_prefixes = ["hpmor-remix", "rationally-writing", "guardian", "because-prophecy", "hearts-and-minds"]
# Posts in any of these categories (case-insensitive) are not blog posts.
excluded_categories = ["pokemon: the origin of species", "rationally-writing", "rationally writing", "hpmor-remix", "podcast", "podcasts", "uncategorized"]

# ---------------------------------------------------------------------------
# Chapter series: slugs <name>-<number> become /<name>/<number>/
# ---------------------------------------------------------------------------
[[series]]
name = "pokemon"
title = "Pokemon: The Origin of Species"
# Standalone pages published at /<name>/<slug>/
pages = ["pokemon-team-roster", "pokemon-team-roster-ii", "pokemon-team-roster-iii", "pokemon-team-roster-iv", "the-origin-of-species-faq", "toos-fan-art", "pokemon-goal-factoring"]

# ---------------------------------------------------------------------------
# Blog posts and the category index
# ---------------------------------------------------------------------------
[blog]
root = "blog"
title = "Blog"
# Search manifest entries of this type under /<root>/ are rebuilt every run.
search_type = "Blog Post"
# Posts matching no section below land here.
default_section = "General"
# Order of sections on the index page. Must list every section exactly.
section_order = ["Personal", "Therapy and Psychology", "Romantic Relationships", "Knowledge and Epistemology", "Politics and Society", "Storytelling", "Game Reviews", "Book Reviews", "Movie Reviews", "General"]

# Sections are matched top-down: a post's primary section is the first one
# sharing a category with it.
[[blog.sections]]
label = "Therapy and Psychology"
categories = ["therapy-and-psychology", "therapy and psychology"]

[[blog.sections]]
label = "Romantic Relationships"
categories = ["romantic-relationships", "romantic relationships"]

[[blog.sections]]
label = "Knowledge and Epistemology"
categories = ["knowledge-and-epistemology", "knowledge and epistemology"]

[[blog.sections]]
label = "Politics and Society"
categories = ["politics-and-society-articles", "politics and society"]

[[blog.sections]]
label = "Storytelling"
categories = ["storytelling"]

[[blog.sections]]
label = "Game Reviews"
categories = ["game-reviews", "game reviews", "games"]

[[blog.sections]]
label = "Book Reviews"
categories = ["book-reviews", "book reviews"]

[[blog.sections]]
label = "Movie Reviews"
categories = ["movie-reviews", "movie reviews"]

[[blog.sections]]
label = "Personal"
categories = ["personal"]

# ---------------------------------------------------------------------------
# Index files, relative to the output directory
# ---------------------------------------------------------------------------
[output]
search_index = "search.json"
run_manifest = "blog-manifest.json"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#0a0a0a"
panel = "#0f0f0f"
text = "#e5e7eb"
muted = "#9ca3af"    # Dates, metadata, empty states
accent = "#047857"
link = "#34d399"
border = "#1a1a1a"
"##
}

/// Generate CSS custom properties from the color scheme.
pub fn generate_color_css(colors: &ColorScheme) -> String {
    format!(
        r#":root {{
    --bg: {background};
    --panel: {panel};
    --text: {text};
    --muted: {muted};
    --accent: {accent};
    --link: {link};
    --border: {border};
}}"#,
        background = colors.background,
        panel = colors.panel,
        text = colors.text,
        muted = colors.muted,
        accent = colors.accent,
        link = colors.link,
        border = colors.border,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        assert!(MigrateConfig::default().validate().is_ok());
    }

    #[test]
    fn default_config_has_pokemon_series() {
        let config = MigrateConfig::default();
        let series = config.series("pokemon").unwrap();
        assert_eq!(series.title, "Pokemon: The Origin of Species");
        assert!(series.pages.contains(&"toos-fan-art".to_string()));
    }

    #[test]
    fn default_series_matches_generated_config() {
        let generated: MigrateConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(MigrateConfig::default().series, generated.series);
    }

    #[test]
    fn stock_defaults_value_carries_series() {
        let config: MigrateConfig = stock_defaults_value().unwrap().try_into().unwrap();
        assert_eq!(config.series.len(), 1);
        assert!(
            config.series[0]
                .pages
                .contains(&"the-origin-of-species-faq".to_string())
        );
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[site]
asset_host = "https://example.org"
"#;
        let config: MigrateConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.site.asset_host, "https://example.org");
        // Defaults preserved
        assert_eq!(config.site.asset_prefix, "/wp-content/");
        assert_eq!(config.blog.root, "blog");
        assert_eq!(config.classify.min_content_length, 20);
    }

    #[test]
    fn nav_link_external_detection() {
        assert!(NavLink::new("Support", "https://patreon.com").is_external());
        assert!(!NavLink::new("Blog", "/blog/").is_external());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let export = tmp.path().join("export.xml");
        let config = load_config(None, &export).unwrap();
        assert_eq!(config.site.asset_host, "https://daystareld.com");
        assert_eq!(config.series, MigrateConfig::default().series);
        assert_eq!(config.series[0].name, "pokemon");
    }

    #[test]
    fn load_config_reads_file_next_to_export() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[classify]
min_content_length = 50
"#,
        )
        .unwrap();
        let config = load_config(None, &tmp.path().join("export.xml")).unwrap();
        assert_eq!(config.classify.min_content_length, 50);
        assert_eq!(config.blog.search_type, "Blog Post");
    }

    #[test]
    fn load_config_explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        let result = load_config(Some(&missing), &tmp.path().join("export.xml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_config_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[blog]\ntitle = \"Ignored\"\n").unwrap();
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, "[blog]\ntitle = \"Essays\"\n").unwrap();
        let config = load_config(Some(&explicit), &tmp.path().join("export.xml")).unwrap();
        assert_eq!(config.blog.title, "Essays");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        let result = load_config(None, &tmp.path().join("export.xml"));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn series_array_replaces_defaults() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[[series]]
name = "guardian"
title = "Guardian"
"#,
        )
        .unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.series.len(), 1);
        assert_eq!(config.series[0].name, "guardian");
        assert!(config.series[0].pages.is_empty());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[classify]
min_content_length = 20
excluded_categories = ["podcast"]
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[classify]
min_content_length = 5
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let classify = merged.get("classify").unwrap();
        assert_eq!(classify.get("min_content_length").unwrap().as_integer(), Some(5));
        assert_eq!(
            classify.get("excluded_categories").unwrap().as_array().unwrap().len(),
            1
        );
    }

    #[test]
    fn merge_toml_array_replaces() {
        let base: toml::Value = toml::from_str(r#"list = ["a", "b"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"list = ["c"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("list").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<MigrateConfig, _> = toml::from_str("[blog]\nrooot = \"x\"\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<MigrateConfig, _> = toml::from_str("[blogg]\nroot = \"x\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_rejects_relative_asset_host() {
        let mut config = MigrateConfig::default();
        config.site.asset_host = "daystareld.com".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("asset_host"));
    }

    #[test]
    fn validate_rejects_asset_host_with_ampersand() {
        let mut config = MigrateConfig::default();
        config.site.asset_host = "https://a.com/?x=1&y=2".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_nested_blog_root() {
        let mut config = MigrateConfig::default();
        config.blog.root = "blog/posts".into();
        assert!(config.validate().is_err());
        config.blog.root = "..".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_series_named_like_blog_root() {
        let mut config = MigrateConfig::default();
        config.series.push(SeriesConfig {
            name: "blog".into(),
            title: "Blog".into(),
            pages: vec![],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_incomplete_section_order() {
        let mut config = MigrateConfig::default();
        config.blog.section_order.retain(|s| s != "General");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("General"));
    }

    #[test]
    fn validate_rejects_unknown_section_in_order() {
        let mut config = MigrateConfig::default();
        config.blog.section_order.push("Poetry".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[site]\nasset_host = \"ftp://old\"\n",
        )
        .unwrap();
        let result = load_config(None, &tmp.path().join("export.xml"));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let _: toml::Value =
            toml::from_str(stock_config_toml()).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: MigrateConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = MigrateConfig::default();
        assert_eq!(parsed.site.nav, defaults.site.nav);
        assert_eq!(parsed.blog.sections, defaults.blog.sections);
        assert_eq!(parsed.blog.section_order, defaults.blog.section_order);
        assert_eq!(
            parsed.classify.excluded_categories,
            defaults.classify.excluded_categories
        );
        assert_eq!(
            parsed.classify.excluded_slug_prefixes,
            defaults.classify.excluded_slug_prefixes
        );
        assert_eq!(parsed.series, defaults.series);
        assert_eq!(parsed.colors.link, defaults.colors.link);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        for key in ["site", "classify", "series", "blog", "output", "colors"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn generate_css_uses_config_colors() {
        let mut colors = ColorScheme::default();
        colors.link = "#ff00ff".to_string();
        let css = generate_color_css(&colors);
        assert!(css.contains("--link: #ff00ff"));
        assert!(css.contains("--bg: #0a0a0a"));
    }
}

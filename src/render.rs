//! HTML rendering.
//!
//! Every emitted page goes through [`render_page`]; the blog's category index
//! goes through [`render_category_index`]. Both wrap their content in the same
//! site chrome: brand link, primary navigation, search button and the search
//! overlay wired to the site's existing search script.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Titles and labels are escaped; normalized body HTML is inserted as is.
//!
//! ## CSS
//!
//! `static/style.css` is embedded at compile time. Colors are injected as CSS
//! custom properties generated from the `[colors]` config section.

use crate::config::{self, BlogConfig, MigrateConfig, SiteConfig};
use crate::index::IndexSection;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Site-wide pieces shared by every rendered document.
#[derive(Debug, Clone)]
pub struct Chrome {
    css: String,
    site: SiteConfig,
}

impl Chrome {
    pub fn from_config(config: &MigrateConfig) -> Self {
        let color_css = config::generate_color_css(&config.colors);
        Self {
            css: format!("{}\n\n{}", color_css, CSS_STATIC),
            site: config.site.clone(),
        }
    }
}

/// A link back to the page's parent listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BackLink {
    pub href: String,
    pub label: String,
}

/// Previous / contents / next links of a chapter, all as URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterNav {
    pub prev: Option<String>,
    pub contents: String,
    pub next: Option<String>,
}

/// Everything [`render_page`] needs to know about one page.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub title: &'a str,
    /// Series or blog title, shown after the page title in `<title>`
    pub context_title: &'a str,
    pub body_class: &'static str,
    /// Nav link href to mark as current
    pub section_href: &'a str,
    pub back: Option<BackLink>,
    pub chapter_nav: Option<ChapterNav>,
    /// Line under the title (publish date for blog posts)
    pub meta: Option<String>,
    /// Normalized body HTML
    pub body: &'a str,
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// Renders the sticky header: brand, primary navigation, search button
fn site_header(site: &SiteConfig, section_href: &str) -> Markup {
    html! {
        header.site-header {
            div.container {
                div.brand {
                    a href="/" { (site.name) }
                }
                nav.site-nav {
                    ul {
                        @for link in &site.nav {
                            @let external = link.is_external();
                            li class=[(link.href == section_href).then_some("current")] {
                                a href=(link.href)
                                    target=[external.then_some("_blank")]
                                    rel=[external.then_some("noopener")] {
                                    (link.label)
                                }
                            }
                        }
                    }
                }
                button.search-button type="button" onclick="toggleSearch()" aria-label="Search" {
                    "Search"
                }
            }
        }
    }
}

/// Renders the search overlay and loads the search script
fn search_overlay(site: &SiteConfig) -> Markup {
    html! {
        div #search-overlay onclick="if(event.target.id === 'search-overlay') toggleSearch()" {
            div.search-container {
                input #search-input
                    type="text"
                    placeholder="Search chapters, posts, and pages..."
                    oninput="performSearch(this.value)"
                    autocomplete="off";
                div #search-results {}
            }
        }
        script src=(site.search_script) {}
    }
}

fn chapter_nav(nav: &ChapterNav) -> Markup {
    html! {
        nav.chapter-nav {
            @if let Some(prev) = &nav.prev {
                a.prev href=(prev) { "← Previous Chapter" }
            }
            a.contents href=(nav.contents) { "Table of Contents" }
            @if let Some(next) = &nav.next {
                a.next href=(next) { "Next Chapter →" }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a chapter, standalone page or blog post.
pub fn render_page(chrome: &Chrome, view: &PageView<'_>) -> Markup {
    let content = html! {
        (site_header(&chrome.site, view.section_href))
        main.container {
            article {
                @if let Some(back) = &view.back {
                    a.back-link href=(back.href) { "← " (back.label) }
                }
                @if let Some(nav) = &view.chapter_nav {
                    (chapter_nav(nav))
                }
                h1.page-title { (view.title) }
                @if let Some(meta) = &view.meta {
                    div.page-meta { (meta) }
                }
                div.page-content {
                    (PreEscaped(view.body))
                }
                @if let Some(nav) = &view.chapter_nav {
                    (chapter_nav(nav))
                }
            }
        }
        (search_overlay(&chrome.site))
    };

    let title = format!("{} | {}", view.title, view.context_title);
    base_document(&title, &chrome.css, Some(view.body_class), content)
}

/// Renders the blog's category index from scratch.
pub fn render_category_index(
    chrome: &Chrome,
    blog: &BlogConfig,
    sections: &[IndexSection],
) -> Markup {
    let total: usize = sections.iter().map(|s| s.entries.len()).sum();
    let section_href = format!("/{}/", blog.root);

    let content = html! {
        (site_header(&chrome.site, &section_href))
        main.container {
            section.hero {
                h1 { (blog.title) }
                p { (total) " posts" }
            }
            @if sections.is_empty() {
                p.empty { "No posts yet." }
            }
            @for section in sections {
                div.panel {
                    h2 { (section.label) }
                    ul {
                        @for entry in &section.entries {
                            li {
                                a href=(entry.url) { (entry.title) }
                            }
                        }
                    }
                }
            }
        }
        (search_overlay(&chrome.site))
    };

    let title = format!("{} | {}", blog.title, chrome.site.name);
    base_document(&title, &chrome.css, Some("blog-index"), content)
}

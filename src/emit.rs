//! Page emission.
//!
//! Stage 4 of the migration pipeline. Turns a classified, normalized record
//! into a finished [`EmittedPage`] and writes it to disk.
//!
//! ## Output Structure
//!
//! ```text
//! site/
//! ├── pokemon/
//! │   ├── 1/index.html                       # chapters: /<series>/<n>/
//! │   ├── 12/index.html
//! │   └── the-origin-of-species-faq/index.html   # standalone pages: /<series>/<slug>/
//! └── blog/
//!     ├── index.html                         # category index (index stage)
//!     └── my-review/index.html               # blog posts: /<blog_root>/<slug>/
//! ```
//!
//! Every page is an `index.html` inside its own directory, so URLs end in `/`.
//! Pages are rendered completely in memory before anything is written, and
//! writing always overwrites.

use crate::classify::Bucket;
use crate::config::MigrateConfig;
use crate::normalize::excerpt_for;
use crate::render::{self, BackLink, ChapterNav, Chrome, PageView};
use crate::types::{ExportRecord, PublishedAt};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Relative output directory of a page, `/`-separated, without slashes at
/// either end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PagePath(String);

impl PagePath {
    /// Destination of a record in `bucket` with the given slug. `None` for
    /// excluded records and for slugs that cannot become a directory name.
    pub fn for_bucket(bucket: &Bucket, slug: &str, blog_root: &str) -> Option<Self> {
        match bucket {
            Bucket::ChapterSeries { series, chapter } => Some(Self(format!("{series}/{chapter}"))),
            Bucket::StandalonePage { series, slug } => {
                path_segment(slug).map(|slug| Self(format!("{series}/{slug}")))
            }
            Bucket::BlogPost => path_segment(slug).map(|slug| Self(format!("{blog_root}/{slug}"))),
            Bucket::Excluded(_) => None,
        }
    }

    /// Root-relative URL, e.g. `/pokemon/12/`.
    pub fn url(&self) -> String {
        format!("/{}/", self.0)
    }

    /// The `index.html` this page is written to.
    pub fn file(&self, output_root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(output_root.to_path_buf(), |path, part| path.join(part))
            .join("index.html")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A slug usable as a single directory name.
///
/// Exported slugs are normally safe already; anything with separators or
/// dot segments is re-slugified, and `None` is returned if nothing is left.
fn path_segment(slug: &str) -> Option<String> {
    let safe = !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if safe {
        return Some(slug.to_string());
    }
    let slug = crate::naming::slugify(slug);
    (!slug.is_empty()).then_some(slug)
}

/// Retained chapter numbers of one series, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesSequence {
    chapters: BTreeSet<u32>,
}

impl SeriesSequence {
    pub fn new(chapters: impl IntoIterator<Item = u32>) -> Self {
        Self {
            chapters: chapters.into_iter().collect(),
        }
    }

    /// Group the chapters of every series found in `buckets`.
    pub fn collect<'a>(
        buckets: impl IntoIterator<Item = &'a Bucket>,
    ) -> BTreeMap<String, SeriesSequence> {
        let mut sequences: BTreeMap<String, SeriesSequence> = BTreeMap::new();
        for bucket in buckets {
            if let Bucket::ChapterSeries { series, chapter } = bucket {
                sequences
                    .entry(series.clone())
                    .or_default()
                    .chapters
                    .insert(*chapter);
            }
        }
        sequences
    }

    /// Previous and next chapter numbers present in the set. Gaps are skipped.
    pub fn neighbors(&self, chapter: u32) -> (Option<u32>, Option<u32>) {
        let prev = self.chapters.range(..chapter).next_back().copied();
        let next = self
            .chapters
            .range(chapter.saturating_add(1)..)
            .next()
            .copied()
            .filter(|n| *n != chapter);
        (prev, next)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

/// What kind of page was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Chapter,
    StandalonePage,
    BlogPost,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::StandalonePage => "standalone page",
            Self::BlogPost => "blog post",
        }
    }
}

/// Everything about an emitted page except its rendered body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub kind: PageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    pub excerpt: String,
    pub published_at: PublishedAt,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub author: String,
    /// SHA-256 of the rendered document, hex encoded
    pub content_hash: String,
}

/// A fully rendered page, ready to write.
#[derive(Debug, Clone)]
pub struct EmittedPage {
    pub path: PagePath,
    pub document: String,
    pub meta: PageMeta,
}

/// Renders records into pages.
pub struct Emitter<'a> {
    config: &'a MigrateConfig,
    chrome: Chrome,
}

impl<'a> Emitter<'a> {
    pub fn new(config: &'a MigrateConfig) -> Self {
        Self {
            config,
            chrome: Chrome::from_config(config),
        }
    }

    /// Render one record. Returns `None` for excluded records and for slugs
    /// with no usable destination.
    ///
    /// `sequence` is the record's series sequence; chapters rendered without
    /// one get no previous/next links.
    pub fn emit(
        &self,
        record: &ExportRecord,
        bucket: &Bucket,
        normalized: &str,
        sequence: Option<&SeriesSequence>,
    ) -> Option<EmittedPage> {
        let blog = &self.config.blog;
        let kind = match bucket {
            Bucket::ChapterSeries { .. } => PageKind::Chapter,
            Bucket::StandalonePage { .. } => PageKind::StandalonePage,
            Bucket::BlogPost => PageKind::BlogPost,
            Bucket::Excluded(_) => return None,
        };
        let path = PagePath::for_bucket(bucket, &record.slug, &blog.root)?;

        let blog_href = format!("/{}/", blog.root);
        let (series, chapter) = match bucket {
            Bucket::ChapterSeries { series, chapter } => (Some(series.clone()), Some(*chapter)),
            Bucket::StandalonePage { series, .. } => (Some(series.clone()), None),
            _ => (None, None),
        };
        let series_title = series
            .as_deref()
            .map(|name| {
                self.config
                    .series(name)
                    .map(|s| s.title.clone())
                    .unwrap_or_else(|| name.to_string())
            })
            .unwrap_or_default();
        let series_href = series.as_deref().map(|name| format!("/{name}/"));

        let chapter_nav = match (bucket, sequence) {
            (Bucket::ChapterSeries { series, chapter }, Some(sequence)) => {
                let (prev, next) = sequence.neighbors(*chapter);
                Some(ChapterNav {
                    prev: prev.map(|n| format!("/{series}/{n}/")),
                    contents: format!("/{series}/"),
                    next: next.map(|n| format!("/{series}/{n}/")),
                })
            }
            _ => None,
        };

        let back = match &series_href {
            Some(href) => BackLink {
                href: href.clone(),
                label: format!("Back to {series_title}"),
            },
            None => BackLink {
                href: blog_href.clone(),
                label: format!("Back to {}", blog.title),
            },
        };

        let meta_line = match kind {
            PageKind::BlogPost => Some(record.published_at.display()),
            PageKind::Chapter | PageKind::StandalonePage => None,
        };

        let view = PageView {
            title: &record.title,
            context_title: if series.is_some() {
                &series_title
            } else {
                &blog.title
            },
            body_class: match kind {
                PageKind::Chapter => "chapter",
                PageKind::StandalonePage => "standalone-page",
                PageKind::BlogPost => "blog-post",
            },
            section_href: series_href.as_deref().unwrap_or(&blog_href),
            back: Some(back),
            chapter_nav,
            meta: meta_line,
            body: normalized,
        };
        let document = render::render_page(&self.chrome, &view).into_string();

        let meta = PageMeta {
            title: record.title.clone(),
            slug: record.slug.clone(),
            url: path.url(),
            kind,
            series,
            chapter,
            excerpt: excerpt_for(&record.excerpt, normalized),
            published_at: record.published_at,
            categories: record.categories.clone(),
            tags: record.tags.clone(),
            author: record.author.clone(),
            content_hash: content_hash(&document),
        };

        Some(EmittedPage {
            path,
            document,
            meta,
        })
    }
}

/// Hex SHA-256 of a rendered document.
pub fn content_hash(document: &str) -> String {
    format!("{:x}", Sha256::digest(document.as_bytes()))
}

/// Write a page below `output_root`, creating directories and overwriting
/// whatever is there. Returns the written file.
pub fn write_page(output_root: &Path, page: &EmittedPage) -> Result<PathBuf, EmitError> {
    let file = page.path.file(output_root);
    write_file(&file, &page.document)?;
    Ok(file)
}

/// Write a file, creating its parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<(), EmitError> {
    let wrap = |source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, contents).map_err(wrap)
}

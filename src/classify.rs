//! Record classification.
//!
//! Stage 2 of the migration pipeline. Every record lands in exactly one
//! [`Bucket`], decided by an ordered table of named rules. The first rule
//! that fires wins:
//!
//! | # | Rule | Outcome |
//! |---|------|---------|
//! | 1 | not a post or page | `Excluded(NotContent)` |
//! | 2 | status is not `publish` | `Excluded(Unpublished)` |
//! | 3 | slug is `<series>-<n>` for a configured series | `ChapterSeries` |
//! | 4 | excluded slug prefix or excluded category | `Excluded(ExcludedTaxonomy)` |
//! | 5 | slug listed as a series page | `StandalonePage` |
//! | 6 | post body shorter than the stub threshold | `Excluded(Stub)` |
//! | 7 | post / page | `BlogPost` / `Excluded(UnlistedPage)` |
//!
//! Rule 3 precedes rule 4, so a chapter tagged with an excluded category is
//! still a chapter. The last rule matches everything that reaches it, which
//! keeps classification total.

use crate::config::MigrateConfig;
use crate::naming::parse_chapter_slug;
use crate::types::{ExportRecord, RecordType};
use std::collections::HashSet;
use std::fmt;

/// Destination of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    /// Numbered chapter of a series, published at `/<series>/<chapter>/`.
    ChapterSeries { series: String, chapter: u32 },
    /// Non-chapter page of a series, published at `/<series>/<slug>/`.
    StandalonePage { series: String, slug: String },
    /// Blog post, published under the blog root and listed in the indexes.
    BlogPost,
    Excluded(ExclusionReason),
}

impl Bucket {
    pub fn is_excluded(&self) -> bool {
        matches!(self, Bucket::Excluded(_))
    }

    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::ChapterSeries { .. } => "chapter",
            Bucket::StandalonePage { .. } => "standalone page",
            Bucket::BlogPost => "blog post",
            Bucket::Excluded(_) => "excluded",
        }
    }
}

/// Why a record was not emitted. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionReason {
    NotContent,
    Unpublished,
    ExcludedTaxonomy,
    Stub,
    UnlistedPage,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotContent => "not content",
            Self::Unpublished => "unpublished",
            Self::ExcludedTaxonomy => "excluded taxonomy",
            Self::Stub => "stub",
            Self::UnlistedPage => "unlisted page",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named classification rule.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&Classifier, &ExportRecord) -> Option<Bucket>,
}

/// The decision table, in evaluation order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "not-content",
        apply: not_content,
    },
    Rule {
        name: "unpublished",
        apply: unpublished,
    },
    Rule {
        name: "chapter",
        apply: chapter,
    },
    Rule {
        name: "excluded-taxonomy",
        apply: excluded_taxonomy,
    },
    Rule {
        name: "standalone-page",
        apply: standalone_page,
    },
    Rule {
        name: "stub",
        apply: stub,
    },
    Rule {
        name: "fallthrough",
        apply: fallthrough,
    },
];

/// Classification parameters, prepared from the config once per run.
#[derive(Debug, Clone)]
pub struct Classifier {
    series: Vec<String>,
    series_pages: Vec<(String, String)>,
    excluded_slug_prefixes: Vec<String>,
    excluded_categories: HashSet<String>,
    min_content_length: usize,
}

impl Classifier {
    pub fn from_config(config: &MigrateConfig) -> Self {
        Self {
            series: config.series.iter().map(|s| s.name.clone()).collect(),
            series_pages: config
                .series
                .iter()
                .flat_map(|s| s.pages.iter().map(|p| (p.clone(), s.name.clone())))
                .collect(),
            excluded_slug_prefixes: config.classify.excluded_slug_prefixes.clone(),
            excluded_categories: config
                .classify
                .excluded_categories
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            min_content_length: config.classify.min_content_length,
        }
    }

    /// Assign a record to its bucket.
    pub fn classify(&self, record: &ExportRecord) -> Bucket {
        self.classify_with_rule(record).1
    }

    /// Assign a record to its bucket and name the rule that decided it.
    pub fn classify_with_rule(&self, record: &ExportRecord) -> (&'static str, Bucket) {
        for rule in RULES {
            if let Some(bucket) = (rule.apply)(self, record) {
                return (rule.name, bucket);
            }
        }
        // The fallthrough rule always matches; this only guards a table edit.
        ("fallthrough", Bucket::Excluded(ExclusionReason::NotContent))
    }
}

fn not_content(_: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    match record.record_type {
        RecordType::Post | RecordType::Page => None,
        RecordType::Attachment => Some(Bucket::Excluded(ExclusionReason::NotContent)),
    }
}

fn unpublished(_: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    (!record.is_published()).then_some(Bucket::Excluded(ExclusionReason::Unpublished))
}

fn chapter(classifier: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    classifier.series.iter().find_map(|series| {
        parse_chapter_slug(&record.slug, series).map(|chapter| Bucket::ChapterSeries {
            series: series.clone(),
            chapter,
        })
    })
}

fn excluded_taxonomy(classifier: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    let by_slug = classifier
        .excluded_slug_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && record.slug.starts_with(prefix.as_str()));
    let by_category = record
        .categories
        .iter()
        .any(|c| classifier.excluded_categories.contains(&c.to_lowercase()));
    (by_slug || by_category).then_some(Bucket::Excluded(ExclusionReason::ExcludedTaxonomy))
}

fn standalone_page(classifier: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    classifier
        .series_pages
        .iter()
        .find(|(slug, _)| *slug == record.slug)
        .map(|(slug, series)| Bucket::StandalonePage {
            series: series.clone(),
            slug: slug.clone(),
        })
}

fn stub(classifier: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    (record.record_type == RecordType::Post
        && record.trimmed_content_len() < classifier.min_content_length)
        .then_some(Bucket::Excluded(ExclusionReason::Stub))
}

fn fallthrough(_: &Classifier, record: &ExportRecord) -> Option<Bucket> {
    Some(match record.record_type {
        RecordType::Post => Bucket::BlogPost,
        RecordType::Page | RecordType::Attachment => {
            Bucket::Excluded(ExclusionReason::UnlistedPage)
        }
    })
}

//! Pipeline orchestration.
//!
//! Runs the stages in order over one export:
//!
//! ```text
//! read ──► classify ──► normalize ──► emit ──► index
//! ```
//!
//! Every run is a full rebuild: all retained records are rendered and every
//! page, the search manifest, the category index and the run manifest are
//! rewritten. Pages written before a later failure stay on disk.
//!
//! [`plan`] runs the read and classify stages only and writes nothing; it
//! backs the `check` command.

use crate::classify::{Bucket, Classifier, ExclusionReason};
use crate::config::MigrateConfig;
use crate::emit::{self, EmitError, EmittedPage, Emitter, PageKind, PagePath, SeriesSequence};
use crate::export::{self, ExportDocument, ExportError};
use crate::index::{self, IndexError, SearchEntry, SearchIndex};
use crate::normalize::{Layout, NormalizeRules, normalize};
use crate::render::{Chrome, render_category_index};
use crate::types::{ExportRecord, RecordType};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// Records per destination, plus exclusions by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub chapters: usize,
    pub standalone_pages: usize,
    pub blog_posts: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl BucketCounts {
    pub fn add(&mut self, bucket: &Bucket) {
        match bucket {
            Bucket::ChapterSeries { .. } => self.chapters += 1,
            Bucket::StandalonePage { .. } => self.standalone_pages += 1,
            Bucket::BlogPost => self.blog_posts += 1,
            Bucket::Excluded(reason) => *self.excluded.entry(*reason).or_default() += 1,
        }
    }

    pub fn retained(&self) -> usize {
        self.chapters + self.standalone_pages + self.blog_posts
    }

    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }
}

/// One classified record, as shown by `check`.
#[derive(Debug, Clone)]
pub struct PlannedRecord {
    pub title: String,
    pub slug: String,
    pub record_type: RecordType,
    /// Name of the decision rule that fired
    pub rule: &'static str,
    pub bucket: Bucket,
    /// Destination URL, for retained records with a usable slug
    pub url: Option<String>,
}

/// Classification of a whole export, without rendering anything.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub records: Vec<PlannedRecord>,
    pub counts: BucketCounts,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records read from the export (posts, pages, attachments)
    pub read: usize,
    pub counts: BucketCounts,
    /// Distinct pages written
    pub emitted: usize,
    /// Emitted pages whose content hash matches the previous run manifest
    pub unchanged: usize,
    /// Retained records that lost their destination to a later record
    pub duplicates: usize,
    /// Retained records whose slug could not become a path
    pub unroutable: usize,
    /// Entries in the search manifest after the merge
    pub search_entries: usize,
    /// Non-empty sections on the category index
    pub index_sections: usize,
    pub output_dir: PathBuf,
}

impl RunReport {
    pub fn retained(&self) -> usize {
        self.counts.retained()
    }
}

/// Classify every record of a document.
pub fn plan(document: &ExportDocument, config: &MigrateConfig) -> Plan {
    let classifier = Classifier::from_config(config);
    let mut plan = Plan::default();
    for record in document.records() {
        let (rule, bucket) = classifier.classify_with_rule(&record);
        debug!(slug = %record.slug, rule, bucket = ?bucket, "classified");
        plan.counts.add(&bucket);
        let url = PagePath::for_bucket(&bucket, &record.slug, &config.blog.root).map(|p| p.url());
        plan.records.push(PlannedRecord {
            title: record.title,
            slug: record.slug,
            record_type: record.record_type,
            rule,
            bucket,
            url,
        });
    }
    plan
}

/// Read an export file and migrate it into `output_dir`.
pub fn run(
    export_path: &Path,
    output_dir: &Path,
    config: &MigrateConfig,
) -> Result<RunReport, PipelineError> {
    info!(export = %export_path.display(), "reading export");
    let document = export::read_export(export_path)?;
    run_document(&document, output_dir, config)
}

/// Migrate an already parsed export into `output_dir`.
pub fn run_document(
    document: &ExportDocument,
    output_dir: &Path,
    config: &MigrateConfig,
) -> Result<RunReport, PipelineError> {
    let mut report = RunReport {
        output_dir: output_dir.to_path_buf(),
        ..RunReport::default()
    };

    // Classify
    let classifier = Classifier::from_config(config);
    let classified: Vec<(ExportRecord, Bucket)> = document
        .records()
        .map(|record| {
            let (rule, bucket) = classifier.classify_with_rule(&record);
            debug!(slug = %record.slug, rule, bucket = ?bucket, "classified");
            (record, bucket)
        })
        .collect();
    report.read = classified.len();
    for (_, bucket) in &classified {
        report.counts.add(bucket);
    }
    info!(
        read = report.read,
        retained = report.counts.retained(),
        "classified records"
    );

    // Normalize + emit
    let sequences = SeriesSequence::collect(classified.iter().map(|(_, bucket)| bucket));
    let rules = NormalizeRules::from_config(&config.site);
    let emitter = Emitter::new(config);

    let mut pages: Vec<EmittedPage> = Vec::new();
    let mut positions: HashMap<PagePath, usize> = HashMap::new();
    for (record, bucket) in &classified {
        let layout = match bucket {
            Bucket::Excluded(_) => continue,
            Bucket::StandalonePage { .. } => Layout::Verbatim,
            Bucket::ChapterSeries { .. } | Bucket::BlogPost => Layout::Paragraphs,
        };
        let sequence = match bucket {
            Bucket::ChapterSeries { series, .. } => sequences.get(series),
            _ => None,
        };
        let normalized = normalize(&record.raw_content, &rules, layout);
        let Some(page) = emitter.emit(record, bucket, &normalized, sequence) else {
            warn!(slug = %record.slug, "no usable destination for record, skipping");
            report.unroutable += 1;
            continue;
        };

        match positions.get(&page.path) {
            Some(&i) => {
                warn!(
                    url = %page.meta.url,
                    replaced = %pages[i].meta.slug,
                    by = %page.meta.slug,
                    "duplicate destination, later record wins"
                );
                report.duplicates += 1;
                pages[i] = page;
            }
            None => {
                positions.insert(page.path.clone(), pages.len());
                pages.push(page);
            }
        }
    }

    // Write pages
    let manifest_path = output_dir.join(&config.output.run_manifest);
    let previous = index::load_previous_hashes(&manifest_path);
    for page in &pages {
        if previous.get(&page.meta.url) == Some(&page.meta.content_hash) {
            report.unchanged += 1;
        }
        emit::write_page(output_dir, page)?;
    }
    report.emitted = pages.len();
    info!(
        emitted = report.emitted,
        unchanged = report.unchanged,
        "wrote pages"
    );

    // Indexes
    let blog_pages: Vec<_> = pages
        .iter()
        .map(|page| &page.meta)
        .filter(|meta| meta.kind == PageKind::BlogPost)
        .collect();

    let search_path = output_dir.join(&config.output.search_index);
    let fresh = blog_pages
        .iter()
        .map(|meta| SearchEntry::for_page(meta, &config.blog.search_type))
        .collect();
    let merged = index::merge_owned(
        SearchIndex::load(&search_path),
        fresh,
        &format!("/{}/", config.blog.root),
        &config.blog.search_type,
    );
    merged.save(&search_path)?;
    report.search_entries = merged.len();

    let sections = index::build_sections(blog_pages.iter().copied(), &config.blog);
    let chrome = Chrome::from_config(config);
    let index_html = render_category_index(&chrome, &config.blog, &sections).into_string();
    emit::write_file(
        &output_dir.join(&config.blog.root).join("index.html"),
        &index_html,
    )?;
    report.index_sections = sections.len();

    let metas: Vec<_> = pages.iter().map(|page| &page.meta).collect();
    index::save_run_manifest(&manifest_path, &metas)?;
    info!(
        search_entries = report.search_entries,
        sections = report.index_sections,
        "rebuilt indexes"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ExportXml, ItemXml, long_body};
    use std::fs;
    use tempfile::TempDir;

    fn document() -> ExportDocument {
        let xml = ExportXml::new()
            .category("1", "uncategorized", "Uncategorized")
            .category("2", "book-reviews", "Book Reviews")
            .category("3", "podcast", "Podcast")
            .item(ItemXml::post("pokemon-1", "Chapter one.").category("uncategorized"))
            .item(ItemXml::post("pokemon-3", "Chapter three."))
            .item(ItemXml::post("pokemon-5", "Chapter five."))
            .item(
                ItemXml::post("my-review", &long_body())
                    .title("My Review")
                    .category("book-reviews"),
            )
            .item(ItemXml::post("episode-1", &long_body()).category("podcast"))
            .item(ItemXml::post("draft", &long_body()).status("draft"))
            .item(ItemXml::post("stub", "tiny"))
            .item(ItemXml::page("about", &long_body()))
            .item(ItemXml::page("the-origin-of-species-faq", "FAQ\n\nAnswers"))
            .item(ItemXml::post("photo", "").post_type("attachment").status("inherit"))
            .build();
        ExportDocument::parse(&xml).unwrap()
    }

    #[test]
    fn plan_counts_every_record() {
        let plan = plan(&document(), &MigrateConfig::default());
        assert_eq!(plan.records.len(), 10);
        assert_eq!(plan.counts.chapters, 3);
        assert_eq!(plan.counts.standalone_pages, 1);
        assert_eq!(plan.counts.blog_posts, 1);
        assert_eq!(plan.counts.excluded_total(), 5);
        assert_eq!(plan.counts.excluded[&ExclusionReason::ExcludedTaxonomy], 1);
        assert_eq!(plan.counts.excluded[&ExclusionReason::Unpublished], 1);
        assert_eq!(plan.counts.excluded[&ExclusionReason::NotContent], 1);

        let review = plan.records.iter().find(|r| r.slug == "my-review").unwrap();
        assert_eq!(review.url.as_deref(), Some("/blog/my-review/"));
        assert_eq!(review.rule, "fallthrough");
    }

    #[test]
    fn run_writes_pages_and_indexes() {
        let tmp = TempDir::new().unwrap();
        let report = run_document(&document(), tmp.path(), &MigrateConfig::default()).unwrap();

        assert_eq!(report.read, 10);
        assert_eq!(report.retained(), 5);
        assert_eq!(report.emitted, 5);
        assert_eq!(report.unchanged, 0);
        assert_eq!(report.search_entries, 1);
        assert_eq!(report.index_sections, 1);

        for page in [
            "pokemon/1/index.html",
            "pokemon/3/index.html",
            "pokemon/5/index.html",
            "pokemon/the-origin-of-species-faq/index.html",
            "blog/my-review/index.html",
            "blog/index.html",
            "search.json",
            "blog-manifest.json",
        ] {
            assert!(tmp.path().join(page).exists(), "missing {page}");
        }
        assert!(!tmp.path().join("blog/episode-1").exists());
        assert!(!tmp.path().join("blog/about").exists());
    }

    #[test]
    fn chapters_link_across_gaps() {
        let tmp = TempDir::new().unwrap();
        run_document(&document(), tmp.path(), &MigrateConfig::default()).unwrap();
        let html = fs::read_to_string(tmp.path().join("pokemon/3/index.html")).unwrap();
        assert!(html.contains(r#"href="/pokemon/1/""#));
        assert!(html.contains(r#"href="/pokemon/5/""#));
    }

    #[test]
    fn standalone_pages_are_not_wrapped() {
        let tmp = TempDir::new().unwrap();
        run_document(&document(), tmp.path(), &MigrateConfig::default()).unwrap();
        let html = fs::read_to_string(
            tmp.path()
                .join("pokemon/the-origin-of-species-faq/index.html"),
        )
        .unwrap();
        assert!(html.contains("FAQ\n\nAnswers"));
    }

    #[test]
    fn second_run_counts_unchanged_pages() {
        let tmp = TempDir::new().unwrap();
        let config = MigrateConfig::default();
        run_document(&document(), tmp.path(), &config).unwrap();
        let report = run_document(&document(), tmp.path(), &config).unwrap();
        assert_eq!(report.unchanged, report.emitted);
        assert_eq!(report.search_entries, 1);
    }

    #[test]
    fn duplicate_destinations_keep_the_later_record() {
        let xml = ExportXml::new()
            .item(ItemXml::post("pokemon-12", "First version."))
            .item(ItemXml::post("pokemon-012", "Second version."))
            .build();
        let tmp = TempDir::new().unwrap();
        let report = run_document(
            &ExportDocument::parse(&xml).unwrap(),
            tmp.path(),
            &MigrateConfig::default(),
        )
        .unwrap();
        assert_eq!(report.emitted, 1);
        assert_eq!(report.duplicates, 1);
        let html = fs::read_to_string(tmp.path().join("pokemon/12/index.html")).unwrap();
        assert!(html.contains("Second version."));
    }

    #[test]
    fn run_missing_export_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = run(
            &tmp.path().join("missing.xml"),
            tmp.path(),
            &MigrateConfig::default(),
        );
        assert!(matches!(result, Err(PipelineError::Export(ExportError::Io(_)))));
    }
}

//! CLI output formatting for the read, check and build commands.
//!
//! # Information-First Display
//!
//! Records are shown by identity first (positional index and title) with
//! slugs, URLs and rule names as indented context lines, so a listing reads
//! as a content inventory rather than a log.
//!
//! # Output Format
//!
//! ## Read
//!
//! ```text
//! Export
//!     7 categories, 12 tags
//!     40 posts, 6 pages, 120 attachments, 3 other
//!
//! Records
//! 001 Chapter 1 (post, publish)
//!     Slug: pokemon-1
//!     Date: October 7, 2025
//!     Categories: uncategorized
//! ```
//!
//! ## Check
//!
//! ```text
//! Chapters
//! 001 Chapter 1 → /pokemon/1/
//!
//! Standalone pages
//! 001 FAQ → /pokemon/the-origin-of-species-faq/
//!
//! Blog posts
//! 001 My Review → /blog/my-review/
//!
//! Excluded
//! 001 Draft (unpublished)
//!     Slug: draft
//!
//! 3 retained, 1 excluded
//!     unpublished: 1
//! ```
//!
//! ## Build
//!
//! ```text
//! Read 10 records, retained 5
//!     3 chapters, 1 standalone page, 1 blog post
//!     excluded taxonomy: 1
//! Wrote 5 pages to site/ (5 unchanged)
//! Search manifest: 12 entries
//! Category index: 1 section
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::classify::Bucket;
use crate::export::Inventory;
use crate::pipeline::{BucketCounts, Plan, PlannedRecord, RunReport};
use crate::types::ExportRecord;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Per-bucket counts on one line, then one indented line per exclusion reason.
fn format_counts(counts: &BucketCounts, depth: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{}{}, {}, {}",
        indent(depth),
        plural(counts.chapters, "chapter", "chapters"),
        plural(counts.standalone_pages, "standalone page", "standalone pages"),
        plural(counts.blog_posts, "blog post", "blog posts"),
    )];
    for (reason, n) in &counts.excluded {
        lines.push(format!("{}{}: {}", indent(depth), reason, n));
    }
    lines
}

// ============================================================================
// Read
// ============================================================================

/// Format the export inventory and, when given, every record.
pub fn format_read_output(inventory: &Inventory, records: &[ExportRecord]) -> Vec<String> {
    let mut lines = vec![
        "Export".to_string(),
        format!(
            "{}{}, {}",
            indent(1),
            plural(inventory.categories, "category", "categories"),
            plural(inventory.tags, "tag", "tags"),
        ),
        format!(
            "{}{}, {}, {}, {} other",
            indent(1),
            plural(inventory.posts, "post", "posts"),
            plural(inventory.pages, "page", "pages"),
            plural(inventory.attachments, "attachment", "attachments"),
            inventory.other,
        ),
    ];

    if records.is_empty() {
        return lines;
    }

    lines.push(String::new());
    lines.push("Records".to_string());
    for (i, record) in records.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}, {})",
            format_index(i + 1),
            record.title,
            record.record_type,
            record.status,
        ));
        lines.push(format!("{}Slug: {}", indent(1), record.slug));
        lines.push(format!("{}Date: {}", indent(1), record.published_at.display()));
        if !record.categories.is_empty() {
            lines.push(format!(
                "{}Categories: {}",
                indent(1),
                record.categories.join(", ")
            ));
        }
        if !record.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), record.tags.join(", ")));
        }
    }
    lines
}

pub fn print_read_output(inventory: &Inventory, records: &[ExportRecord]) {
    for line in format_read_output(inventory, records) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

fn routed_line(index: usize, record: &PlannedRecord) -> String {
    match &record.url {
        Some(url) => format!("{} {} → {}", format_index(index), record.title, url),
        None => format!("{} {} (no usable path)", format_index(index), record.title),
    }
}

/// Format a classification plan grouped by destination.
///
/// With `verbose`, every record also shows its slug and the rule that fired.
pub fn format_plan(plan: &Plan, verbose: bool) -> Vec<String> {
    let groups: [(&str, fn(&Bucket) -> bool); 4] = [
        ("Chapters", |b: &Bucket| matches!(b, Bucket::ChapterSeries { .. })),
        ("Standalone pages", |b: &Bucket| {
            matches!(b, Bucket::StandalonePage { .. })
        }),
        ("Blog posts", |b: &Bucket| matches!(b, Bucket::BlogPost)),
        ("Excluded", Bucket::is_excluded),
    ];

    let mut lines = Vec::new();
    for (heading, belongs) in groups {
        let members: Vec<&PlannedRecord> =
            plan.records.iter().filter(|r| belongs(&r.bucket)).collect();
        if members.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for (i, record) in members.iter().enumerate() {
            match &record.bucket {
                Bucket::Excluded(reason) => {
                    lines.push(format!("{} {} ({})", format_index(i + 1), record.title, reason));
                    lines.push(format!("{}Slug: {}", indent(1), record.slug));
                }
                _ => {
                    lines.push(routed_line(i + 1, record));
                    if verbose {
                        lines.push(format!("{}Slug: {}", indent(1), record.slug));
                    }
                }
            }
            if verbose {
                lines.push(format!("{}Rule: {}", indent(1), record.rule));
            }
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "{} retained, {} excluded",
        plan.counts.retained(),
        plan.counts.excluded_total()
    ));
    for (reason, n) in &plan.counts.excluded {
        lines.push(format!("{}{}: {}", indent(1), reason, n));
    }
    lines
}

pub fn print_plan(plan: &Plan, verbose: bool) {
    for line in format_plan(plan, verbose) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the summary of a completed run.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Read {} records, retained {}",
        report.read,
        report.retained()
    )];
    lines.extend(format_counts(&report.counts, 1));

    lines.push(format!(
        "Wrote {} to {}/ ({} unchanged)",
        plural(report.emitted, "page", "pages"),
        report.output_dir.display(),
        report.unchanged,
    ));
    if report.duplicates > 0 {
        lines.push(format!(
            "{}{} replaced by a later record at the same URL",
            indent(1),
            plural(report.duplicates, "page", "pages"),
        ));
    }
    if report.unroutable > 0 {
        lines.push(format!(
            "{}{} skipped: slug has no usable path",
            indent(1),
            plural(report.unroutable, "record", "records"),
        ));
    }
    lines.push(format!(
        "Search manifest: {}",
        plural(report.search_entries, "entry", "entries")
    ));
    lines.push(format!(
        "Category index: {}",
        plural(report.index_sections, "section", "sections")
    ));
    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ExclusionReason;
    use crate::test_helpers::{post, with_categories};
    use crate::types::RecordType;
    use std::path::PathBuf;

    fn planned(title: &str, bucket: Bucket, url: Option<&str>) -> PlannedRecord {
        PlannedRecord {
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            record_type: RecordType::Post,
            rule: "fallthrough",
            bucket,
            url: url.map(String::from),
        }
    }

    fn plan(records: Vec<PlannedRecord>) -> Plan {
        let mut counts = BucketCounts::default();
        for record in &records {
            counts.add(&record.bucket);
        }
        Plan { records, counts }
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn plural_picks_form() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
        assert_eq!(plural(3, "entry", "entries"), "3 entries");
    }

    #[test]
    fn read_output_without_records_is_inventory_only() {
        let inventory = Inventory {
            categories: 7,
            tags: 1,
            posts: 40,
            pages: 6,
            attachments: 120,
            other: 3,
        };
        let lines = format_read_output(&inventory, &[]);
        assert_eq!(
            lines,
            vec![
                "Export",
                "    7 categories, 1 tag",
                "    40 posts, 6 pages, 120 attachments, 3 other",
            ]
        );
    }

    #[test]
    fn read_output_lists_records() {
        let record = with_categories(post("pokemon-1", "x"), &["Uncategorized"]);
        let lines = format_read_output(&Inventory::default(), &[record]);
        assert!(lines.contains(&"Records".to_string()));
        assert!(lines.contains(&"001 Title of pokemon-1 (post, publish)".to_string()));
        assert!(lines.contains(&"    Slug: pokemon-1".to_string()));
        assert!(lines.contains(&"    Date: October 7, 2025".to_string()));
        assert!(lines.contains(&"    Categories: uncategorized".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Tags:")));
    }

    #[test]
    fn plan_groups_by_destination() {
        let plan = plan(vec![
            planned("My Review", Bucket::BlogPost, Some("/blog/my-review/")),
            planned(
                "Chapter 1",
                Bucket::ChapterSeries {
                    series: "pokemon".into(),
                    chapter: 1,
                },
                Some("/pokemon/1/"),
            ),
            planned("Draft", Bucket::Excluded(ExclusionReason::Unpublished), None),
        ]);
        let lines = format_plan(&plan, false);
        let chapters = lines.iter().position(|l| l == "Chapters").unwrap();
        let posts = lines.iter().position(|l| l == "Blog posts").unwrap();
        let excluded = lines.iter().position(|l| l == "Excluded").unwrap();
        assert!(chapters < posts && posts < excluded);
        assert!(!lines.contains(&"Standalone pages".to_string()));

        assert_eq!(lines[chapters + 1], "001 Chapter 1 → /pokemon/1/");
        assert_eq!(lines[excluded + 1], "001 Draft (unpublished)");
        assert_eq!(lines[excluded + 2], "    Slug: draft");
        assert!(lines.contains(&"2 retained, 1 excluded".to_string()));
        assert!(lines.contains(&"    unpublished: 1".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Rule:")));
    }

    #[test]
    fn verbose_plan_shows_rules() {
        let plan = plan(vec![planned("My Review", Bucket::BlogPost, Some("/blog/my-review/"))]);
        let lines = format_plan(&plan, true);
        assert!(lines.contains(&"    Slug: my-review".to_string()));
        assert!(lines.contains(&"    Rule: fallthrough".to_string()));
    }

    #[test]
    fn plan_marks_unroutable_records() {
        let plan = plan(vec![planned("Dots", Bucket::BlogPost, None)]);
        let lines = format_plan(&plan, false);
        assert!(lines.contains(&"001 Dots (no usable path)".to_string()));
    }

    #[test]
    fn run_report_summary() {
        let mut counts = BucketCounts {
            chapters: 3,
            standalone_pages: 1,
            blog_posts: 1,
            ..BucketCounts::default()
        };
        counts.add(&Bucket::Excluded(ExclusionReason::ExcludedTaxonomy));
        let report = RunReport {
            read: 6,
            counts,
            emitted: 5,
            unchanged: 5,
            search_entries: 12,
            index_sections: 1,
            output_dir: PathBuf::from("site"),
            ..RunReport::default()
        };
        assert_eq!(
            format_run_report(&report),
            vec![
                "Read 6 records, retained 5",
                "    3 chapters, 1 standalone page, 1 blog post",
                "    excluded taxonomy: 1",
                "Wrote 5 pages to site/ (5 unchanged)",
                "Search manifest: 12 entries",
                "Category index: 1 section",
            ]
        );
    }

    #[test]
    fn run_report_mentions_duplicates_and_skips() {
        let report = RunReport {
            duplicates: 1,
            unroutable: 2,
            output_dir: PathBuf::from("out"),
            ..RunReport::default()
        };
        let lines = format_run_report(&report);
        assert!(lines.contains(&"    1 page replaced by a later record at the same URL".to_string()));
        assert!(lines.contains(&"    2 records skipped: slug has no usable path".to_string()));
    }
}

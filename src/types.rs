//! Shared types used across all pipeline stages.
//!
//! An [`ExportRecord`] is produced by the reader, routed by the classifier,
//! and rendered by the emitter. It also serializes to JSON for the `read
//! --json` inventory dump, so field names here are the public record shape.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// The kind of WordPress item a record was read from.
///
/// Only these three item types become records; taxonomy items, nav menu
/// items and custom post types are skipped by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Post,
    Page,
    Attachment,
}

impl RecordType {
    /// Map a `wp:post_type` value to a record type.
    pub fn from_post_type(value: &str) -> Option<Self> {
        match value.trim() {
            "post" => Some(Self::Post),
            "page" => Some(Self::Page),
            "attachment" => Some(Self::Attachment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
            Self::Attachment => "attachment",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a record was published.
///
/// Export dates are free text. Anything that does not parse becomes
/// [`PublishedAt::Unknown`] instead of failing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedAt {
    At(DateTime<FixedOffset>),
    Unknown,
}

/// Sentinel written wherever an unknown date is serialized or displayed.
pub const UNKNOWN_DATE: &str = "unknown";

impl PublishedAt {
    /// Parse the RSS `pubDate` form, e.g. `Tue, 07 Oct 2025 14:03:11 +0000`.
    pub fn parse_rfc2822(value: &str) -> Self {
        match DateTime::parse_from_rfc2822(value.trim()) {
            Ok(dt) => Self::At(dt),
            Err(_) => Self::Unknown,
        }
    }

    /// Parse the `wp:post_date_gmt` form, e.g. `2025-10-07 14:03:11`, as UTC.
    ///
    /// WordPress writes `0000-00-00 00:00:00` for drafts, which fails here
    /// and stays unknown.
    pub fn parse_wp_date(value: &str) -> Self {
        match NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S") {
            Ok(naive) => Self::At(naive.and_utc().fixed_offset()),
            Err(_) => Self::Unknown,
        }
    }

    /// First known date among the candidates, in order.
    pub fn first_known(candidates: impl IntoIterator<Item = Self>) -> Self {
        candidates
            .into_iter()
            .find(PublishedAt::is_known)
            .unwrap_or(Self::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::At(_))
    }

    /// Human-readable date for page metadata, e.g. `October 7, 2025`.
    pub fn display(&self) -> String {
        match self {
            Self::At(dt) => dt.format("%B %-d, %Y").to_string(),
            Self::Unknown => "Unknown date".to_string(),
        }
    }
}

impl Serialize for PublishedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Self::Unknown => serializer.serialize_str(UNKNOWN_DATE),
        }
    }
}

/// One WordPress item (post, page or attachment) with its taxonomy resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    /// `wp:post_id`; empty when the export omits it
    pub id: String,
    /// Display title, `"Untitled"` when the export has none
    pub title: String,
    /// URL slug, from `wp:post_name` or derived from the title
    pub slug: String,
    pub record_type: RecordType,
    /// `wp:status` verbatim (`publish`, `draft`, `private`, `inherit`, ...)
    pub status: String,
    /// Body markup exactly as stored in the export
    pub raw_content: String,
    /// Hand-written excerpt; empty when absent
    pub excerpt: String,
    pub published_at: PublishedAt,
    /// Resolved category names, lowercased for matching
    pub categories: Vec<String>,
    /// Resolved tag names
    pub tags: Vec<String>,
    pub author: String,
}

impl ExportRecord {
    pub fn is_published(&self) -> bool {
        self.status.trim() == "publish"
    }

    /// Length in characters of the body with surrounding whitespace removed.
    pub fn trimmed_content_len(&self) -> usize {
        self.raw_content.trim().chars().count()
    }
}

//! WordPress export reading.
//!
//! Stage 1 of the migration pipeline. Parses a WXR 1.2 document into a
//! [`Taxonomy`] and a list of raw items, then hands out typed
//! [`ExportRecord`]s on demand.
//!
//! ## Document Shape
//!
//! ```text
//! <rss>
//!   <channel>
//!     <wp:category>                  # category definition
//!       <wp:term_id>7</wp:term_id>
//!       <wp:category_nicename>book-reviews</wp:category_nicename>
//!       <wp:cat_name>Book Reviews</wp:cat_name>
//!     </wp:category>
//!     <wp:tag> ... </wp:tag>         # tag definition (wp:tag_slug, wp:tag_name)
//!     <wp:term> ... </wp:term>       # generic term (wp:term_taxonomy)
//!     <item>
//!       <title>My Review</title>
//!       <wp:post_name>my-review</wp:post_name>
//!       <wp:post_type>post</wp:post_type>
//!       <wp:status>publish</wp:status>
//!       <content:encoded><![CDATA[...]]></content:encoded>
//!       <category domain="category" nicename="book-reviews">Book Reviews</category>
//!     </item>
//!   </channel>
//! </rss>
//! ```
//!
//! ## Term Resolution
//!
//! The whole document is read before any record is produced, so term
//! definitions that appear after the items referencing them still resolve.
//! An item's `<category>` reference resolves by its `wp:term_id` attribute
//! when present, otherwise by its `nicename` against the definition slugs.
//! References that resolve to nothing are dropped.
//!
//! Items whose `wp:post_type` is `category` or `post_tag` are term
//! definitions too (some exporters emit them that way) and never become
//! records.

use crate::naming::slugify;
use crate::types::{ExportRecord, PublishedAt, RecordType};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Document ended inside <{0}>")]
    Unclosed(String),
    #[error("Export has no <channel> element under its root")]
    MissingChannel,
}

/// Category and tag lookup tables built from the export's term definitions.
#[derive(Debug, Default)]
pub struct Taxonomy {
    categories: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    category_slugs: HashMap<String, String>,
    tag_slugs: HashMap<String, String>,
}

impl Taxonomy {
    /// Register a category definition. Either the id or the slug may be empty.
    pub fn insert_category(&mut self, term_id: &str, slug: &str, name: &str) {
        register(
            &mut self.categories,
            &mut self.category_slugs,
            term_id,
            slug,
            name,
        );
    }

    /// Register a tag definition. Either the id or the slug may be empty.
    pub fn insert_tag(&mut self, term_id: &str, slug: &str, name: &str) {
        register(&mut self.tags, &mut self.tag_slugs, term_id, slug, name);
    }

    /// Number of distinct category definitions.
    pub fn category_count(&self) -> usize {
        self.categories.len().max(self.category_slugs.len())
    }

    /// Number of distinct tag definitions.
    pub fn tag_count(&self) -> usize {
        self.tags.len().max(self.tag_slugs.len())
    }

    fn resolve(&self, term: &TermRef) -> Option<&str> {
        let (by_id, by_slug) = match term.domain {
            TermDomain::Category => (&self.categories, &self.category_slugs),
            TermDomain::Tag => (&self.tags, &self.tag_slugs),
        };
        match (&term.term_id, &term.nicename) {
            (Some(id), _) => by_id.get(id),
            (None, Some(slug)) => by_slug.get(slug),
            (None, None) => None,
        }
        .map(String::as_str)
    }
}

fn register(
    by_id: &mut BTreeMap<String, String>,
    by_slug: &mut HashMap<String, String>,
    term_id: &str,
    slug: &str,
    name: &str,
) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let term_id = term_id.trim();
    if !term_id.is_empty() {
        by_id.insert(term_id.to_string(), name.to_string());
    }
    let slug = slug.trim();
    if !slug.is_empty() {
        by_slug.insert(slug.to_string(), name.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermDomain {
    Category,
    Tag,
}

/// A `<category>` reference on an item, unresolved.
#[derive(Debug, Clone)]
struct TermRef {
    domain: TermDomain,
    term_id: Option<String>,
    nicename: Option<String>,
}

/// An `<item>` with its direct children captured as text.
#[derive(Debug, Default)]
struct RawItem {
    fields: HashMap<String, String>,
    terms: Vec<TermRef>,
}

impl RawItem {
    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Item counts by `wp:post_type`, plus taxonomy sizes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub categories: usize,
    pub tags: usize,
    pub posts: usize,
    pub pages: usize,
    pub attachments: usize,
    /// Items of any other type (nav menu items, custom post types, ...)
    pub other: usize,
}

/// A parsed export: taxonomy tables plus raw items in document order.
#[derive(Debug)]
pub struct ExportDocument {
    taxonomy: Taxonomy,
    items: Vec<RawItem>,
}

impl ExportDocument {
    /// Parse an export from a string.
    pub fn parse(xml: &str) -> Result<Self, ExportError> {
        Parser::default().run(xml)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Lazily produce a record for every post, page and attachment item, in
    /// document order and regardless of status.
    pub fn records(&self) -> impl Iterator<Item = ExportRecord> + '_ {
        self.items.iter().filter_map(|item| self.to_record(item))
    }

    pub fn inventory(&self) -> Inventory {
        let mut inventory = Inventory {
            categories: self.taxonomy.category_count(),
            tags: self.taxonomy.tag_count(),
            ..Inventory::default()
        };
        for item in &self.items {
            match RecordType::from_post_type(item.field("wp:post_type")) {
                Some(RecordType::Post) => inventory.posts += 1,
                Some(RecordType::Page) => inventory.pages += 1,
                Some(RecordType::Attachment) => inventory.attachments += 1,
                None => inventory.other += 1,
            }
        }
        inventory
    }

    fn to_record(&self, item: &RawItem) -> Option<ExportRecord> {
        let record_type = RecordType::from_post_type(item.field("wp:post_type"))?;

        let title = match item.field("title").trim() {
            "" => "Untitled".to_string(),
            title => title.to_string(),
        };
        let slug = match item.field("wp:post_name").trim() {
            "" => slugify(&title),
            slug => slug.to_string(),
        };
        let published_at = PublishedAt::first_known([
            PublishedAt::parse_rfc2822(item.field("pubDate")),
            PublishedAt::parse_wp_date(item.field("wp:post_date_gmt")),
            PublishedAt::parse_wp_date(item.field("wp:post_date")),
        ]);

        let mut categories: Vec<String> = Vec::new();
        let mut tags: Vec<String> = Vec::new();
        for term in &item.terms {
            let Some(name) = self.taxonomy.resolve(term) else {
                continue;
            };
            match term.domain {
                TermDomain::Category => {
                    let name = name.to_lowercase();
                    if !categories.contains(&name) {
                        categories.push(name);
                    }
                }
                TermDomain::Tag => {
                    if !tags.iter().any(|t| t == name) {
                        tags.push(name.to_string());
                    }
                }
            }
        }

        Some(ExportRecord {
            id: item.field("wp:post_id").trim().to_string(),
            title,
            slug,
            record_type,
            status: item.field("wp:status").trim().to_string(),
            raw_content: item.field("content:encoded").to_string(),
            excerpt: item.field("excerpt:encoded").to_string(),
            published_at,
            categories,
            tags,
            author: item.field("dc:creator").trim().to_string(),
        })
    }
}

/// Read and parse an export file.
pub fn read_export(path: &Path) -> Result<ExportDocument, ExportError> {
    let xml = fs::read_to_string(path)?;
    ExportDocument::parse(&xml)
}

// =============================================================================
// Streaming parser
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Item,
    Category,
    Tag,
    Term,
}

/// An element whose direct children are being captured.
#[derive(Debug)]
struct Block {
    kind: BlockKind,
    depth: usize,
    item: RawItem,
}

#[derive(Default)]
struct Parser {
    stack: Vec<String>,
    channel_depth: Option<usize>,
    saw_channel: bool,
    block: Option<Block>,
    text: String,
    taxonomy: Taxonomy,
    items: Vec<RawItem>,
}

impl Parser {
    fn run(mut self, xml: &str) -> Result<ExportDocument, ExportError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        loop {
            match reader.read_event()? {
                Event::Start(e) => self.start(&e),
                Event::Empty(e) => {
                    self.start(&e);
                    self.end();
                }
                Event::End(_) => self.end(),
                Event::Text(e) => match e.unescape() {
                    Ok(text) => self.text.push_str(&text),
                    Err(_) => self.text.push_str(&String::from_utf8_lossy(&e)),
                },
                Event::CData(e) => self.text.push_str(&String::from_utf8_lossy(&e.into_inner())),
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(ExportError::Unclosed(open.clone()));
        }
        if !self.saw_channel {
            return Err(ExportError::MissingChannel);
        }
        Ok(ExportDocument {
            taxonomy: self.taxonomy,
            items: self.items,
        })
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        self.stack.push(name);
        self.text.clear();
        let depth = self.stack.len();
        let name = self.stack[depth - 1].as_str();

        if depth == 2 && name == "channel" {
            self.channel_depth = Some(depth);
            self.saw_channel = true;
            return;
        }

        match &mut self.block {
            Some(block) if depth == block.depth + 1 && name == "category" => {
                if block.kind == BlockKind::Item {
                    if let Some(term) = term_ref(e) {
                        block.item.terms.push(term);
                    }
                }
            }
            Some(_) => {}
            None => {
                let Some(channel_depth) = self.channel_depth else {
                    return;
                };
                if depth != channel_depth + 1 {
                    return;
                }
                let kind = match name {
                    "item" => BlockKind::Item,
                    "wp:category" => BlockKind::Category,
                    "wp:tag" => BlockKind::Tag,
                    "wp:term" => BlockKind::Term,
                    _ => return,
                };
                self.block = Some(Block {
                    kind,
                    depth,
                    item: RawItem::default(),
                });
            }
        }
    }

    fn end(&mut self) {
        let depth = self.stack.len();
        let Some(name) = self.stack.pop() else {
            return;
        };

        if Some(depth) == self.channel_depth {
            self.channel_depth = None;
        }

        let Some(block) = &mut self.block else {
            return;
        };
        if depth == block.depth + 1 && name != "category" {
            let text = std::mem::take(&mut self.text);
            block.item.fields.insert(name, text);
        } else if depth == block.depth {
            if let Some(block) = self.block.take() {
                self.finish(block);
            }
        }
    }

    fn finish(&mut self, block: Block) {
        let item = block.item;
        match block.kind {
            BlockKind::Category => self.taxonomy.insert_category(
                item.field("wp:term_id"),
                item.field("wp:category_nicename"),
                item.field("wp:cat_name"),
            ),
            BlockKind::Tag => self.taxonomy.insert_tag(
                item.field("wp:term_id"),
                item.field("wp:tag_slug"),
                item.field("wp:tag_name"),
            ),
            BlockKind::Term => match item.field("wp:term_taxonomy").trim() {
                "category" => self.taxonomy.insert_category(
                    item.field("wp:term_id"),
                    item.field("wp:term_slug"),
                    item.field("wp:term_name"),
                ),
                "post_tag" => self.taxonomy.insert_tag(
                    item.field("wp:term_id"),
                    item.field("wp:term_slug"),
                    item.field("wp:term_name"),
                ),
                _ => {}
            },
            BlockKind::Item => match item.field("wp:post_type").trim() {
                "category" => self.taxonomy.insert_category(
                    item.field("wp:term_id"),
                    item.field("wp:post_name"),
                    item.field("title"),
                ),
                "post_tag" => self.taxonomy.insert_tag(
                    item.field("wp:term_id"),
                    item.field("wp:post_name"),
                    item.field("title"),
                ),
                _ => self.items.push(item),
            },
        }
    }
}

/// Read the attributes of an item's `<category>` element.
fn term_ref(e: &BytesStart<'_>) -> Option<TermRef> {
    let mut domain = None;
    let mut term_id = None;
    let mut nicename = None;
    for attr in e.attributes().flatten() {
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        match attr.key.as_ref() {
            b"domain" => domain = Some(value),
            b"wp:term_id" | b"term_id" => term_id = Some(value),
            b"nicename" => nicename = Some(value),
            _ => {}
        }
    }
    let domain = match domain.as_deref().map(str::trim) {
        Some("category") => TermDomain::Category,
        Some("post_tag") => TermDomain::Tag,
        _ => return None,
    };
    Some(TermRef {
        domain,
        term_id: term_id.filter(|id| !id.trim().is_empty()),
        nicename: nicename.filter(|slug| !slug.trim().is_empty()),
    })
}

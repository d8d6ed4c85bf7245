//! Shared test utilities for the wp-migrate test suite.
//!
//! Provides a small WXR document builder and record constructors so unit
//! tests can describe exports in a line or two instead of raw XML.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let xml = ExportXml::new()
//!     .category("7", "book-reviews", "Book Reviews")
//!     .item(ItemXml::post("my-review", "<p>Body</p>").category("book-reviews"))
//!     .build();
//! let doc = ExportDocument::parse(&xml).unwrap();
//!
//! let record = post("pokemon-12", &"x".repeat(100));
//! assert_eq!(record.slug, "pokemon-12");
//! ```

use crate::types::{ExportRecord, PublishedAt, RecordType};

// =========================================================================
// Export document builder
// =========================================================================

/// Builder for a minimal WXR export document.
#[derive(Default)]
pub struct ExportXml {
    terms: Vec<String>,
    items: Vec<ItemXml>,
}

impl ExportXml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, term_id: &str, slug: &str, name: &str) -> Self {
        self.terms.push(format!(
            "<wp:category><wp:term_id>{term_id}</wp:term_id>\
             <wp:category_nicename>{slug}</wp:category_nicename>\
             <wp:cat_name><![CDATA[{name}]]></wp:cat_name></wp:category>"
        ));
        self
    }

    pub fn tag(mut self, term_id: &str, slug: &str, name: &str) -> Self {
        self.terms.push(format!(
            "<wp:tag><wp:term_id>{term_id}</wp:term_id>\
             <wp:tag_slug>{slug}</wp:tag_slug>\
             <wp:tag_name><![CDATA[{name}]]></wp:tag_name></wp:tag>"
        ));
        self
    }

    pub fn item(mut self, item: ItemXml) -> Self {
        self.items.push(item);
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
             <rss version=\"2.0\" \
             xmlns:excerpt=\"http://wordpress.org/export/1.2/excerpt/\" \
             xmlns:content=\"http://purl.org/rss/1.0/modules/content/\" \
             xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
             xmlns:wp=\"http://wordpress.org/export/1.2/\">\n<channel>\n\
             <title>Test Site</title>\n",
        );
        for term in &self.terms {
            xml.push_str(term);
            xml.push('\n');
        }
        for item in &self.items {
            xml.push_str(&item.to_xml());
            xml.push('\n');
        }
        xml.push_str("</channel>\n</rss>\n");
        xml
    }
}

/// Builder for one `<item>` element.
pub struct ItemXml {
    title: String,
    slug: String,
    post_type: String,
    status: String,
    content: String,
    excerpt: String,
    pub_date: Option<String>,
    post_date_gmt: Option<String>,
    terms: Vec<(&'static str, String)>,
}

impl ItemXml {
    /// A published post.
    pub fn post(slug: &str, content: &str) -> Self {
        Self {
            title: if slug.is_empty() {
                String::new()
            } else {
                format!("Title of {slug}")
            },
            slug: slug.to_string(),
            post_type: "post".to_string(),
            status: "publish".to_string(),
            content: content.to_string(),
            excerpt: String::new(),
            pub_date: None,
            post_date_gmt: None,
            terms: Vec::new(),
        }
    }

    /// A published page.
    pub fn page(slug: &str, content: &str) -> Self {
        Self::post(slug, content).post_type("page")
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn post_type(mut self, post_type: &str) -> Self {
        self.post_type = post_type.to_string();
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn excerpt(mut self, excerpt: &str) -> Self {
        self.excerpt = excerpt.to_string();
        self
    }

    pub fn pub_date(mut self, date: &str) -> Self {
        self.pub_date = Some(date.to_string());
        self
    }

    pub fn post_date_gmt(mut self, date: &str) -> Self {
        self.post_date_gmt = Some(date.to_string());
        self
    }

    /// Reference a category by nicename.
    pub fn category(mut self, nicename: &str) -> Self {
        self.terms.push(("category", nicename.to_string()));
        self
    }

    /// Reference a tag by nicename.
    pub fn tag(mut self, nicename: &str) -> Self {
        self.terms.push(("post_tag", nicename.to_string()));
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from("<item>\n");
        xml.push_str(&format!("<title><![CDATA[{}]]></title>\n", self.title));
        if let Some(date) = &self.pub_date {
            xml.push_str(&format!("<pubDate>{date}</pubDate>\n"));
        }
        xml.push_str("<dc:creator><![CDATA[daystar]]></dc:creator>\n");
        xml.push_str(&format!(
            "<content:encoded><![CDATA[{}]]></content:encoded>\n",
            self.content
        ));
        xml.push_str(&format!(
            "<excerpt:encoded><![CDATA[{}]]></excerpt:encoded>\n",
            self.excerpt
        ));
        if let Some(date) = &self.post_date_gmt {
            xml.push_str(&format!("<wp:post_date_gmt>{date}</wp:post_date_gmt>\n"));
        }
        xml.push_str(&format!("<wp:post_name>{}</wp:post_name>\n", self.slug));
        xml.push_str(&format!("<wp:status>{}</wp:status>\n", self.status));
        xml.push_str(&format!("<wp:post_type>{}</wp:post_type>\n", self.post_type));
        for (domain, nicename) in &self.terms {
            xml.push_str(&format!(
                "<category domain=\"{domain}\" nicename=\"{nicename}\"><![CDATA[{nicename}]]></category>\n"
            ));
        }
        xml.push_str("</item>");
        xml
    }
}

// =========================================================================
// Record constructors
// =========================================================================

/// A published post record with the given slug and body.
pub fn post(slug: &str, content: &str) -> ExportRecord {
    ExportRecord {
        id: String::new(),
        title: format!("Title of {slug}"),
        slug: slug.to_string(),
        record_type: RecordType::Post,
        status: "publish".to_string(),
        raw_content: content.to_string(),
        excerpt: String::new(),
        published_at: PublishedAt::parse_rfc2822("Tue, 07 Oct 2025 14:03:11 +0000"),
        categories: Vec::new(),
        tags: Vec::new(),
        author: "daystar".to_string(),
    }
}

/// A published page record with the given slug and body.
pub fn page(slug: &str, content: &str) -> ExportRecord {
    ExportRecord {
        record_type: RecordType::Page,
        ..post(slug, content)
    }
}

/// A body long enough to clear the stub threshold.
pub fn long_body() -> String {
    "A paragraph of real writing that is comfortably over the stub limit.".to_string()
}

/// Set categories on a record, lowercased the way the reader does.
pub fn with_categories(mut record: ExportRecord, categories: &[&str]) -> ExportRecord {
    record.categories = categories.iter().map(|c| c.to_lowercase()).collect();
    record
}

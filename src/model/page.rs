//! Page-level types.

use super::{AssetRef, Block};
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const HYPHENATED_UUID: &str =
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// A canonical page identifier: lowercase 8-4-4-4-12 hex.
///
/// Equality is on the normalized form, so every raw spelling of the same id
/// compares equal once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(String);

impl PageId {
    /// Extract and normalize a page id from a raw id, hyphenated UUID or URL.
    ///
    /// A hyphenated UUID anywhere in the input wins; otherwise the last run
    /// of 32 hex characters is used (Notion URLs put the id after the title).
    pub fn parse(raw: &str) -> Result<Self> {
        Self::find(raw).ok_or_else(|| Error::InvalidId(raw.to_string()))
    }

    /// Like [`PageId::parse`] but returns `None` instead of an error.
    pub fn find(raw: &str) -> Option<Self> {
        let hyphenated = Regex::new(HYPHENATED_UUID).unwrap();
        if let Some(m) = hyphenated.find(raw) {
            return Self::from_hex(m.as_str());
        }
        let simple = Regex::new(r"[0-9a-fA-F]{32}").unwrap();
        simple
            .find_iter(raw)
            .last()
            .and_then(|m| Self::from_hex(m.as_str()))
    }

    /// Search an HTML document for the id of the page it renders.
    ///
    /// Prefers the `"pageId": "<uuid>"` redirect metadata, then any UUID, then
    /// any 32-hex run.
    pub fn find_in_html(html: &str) -> Option<Self> {
        let meta = Regex::new(&format!(r#""pageId"\s*:\s*"({HYPHENATED_UUID})""#)).unwrap();
        if let Some(caps) = meta.captures(html) {
            return Self::from_hex(&caps[1]);
        }
        let hyphenated = Regex::new(HYPHENATED_UUID).unwrap();
        if let Some(m) = hyphenated.find(html) {
            return Self::from_hex(m.as_str());
        }
        let simple = Regex::new(r"[0-9a-fA-F]{32}").unwrap();
        simple.find(html).and_then(|m| Self::from_hex(m.as_str()))
    }

    fn from_hex(s: &str) -> Option<Self> {
        Uuid::parse_str(s)
            .ok()
            .map(|u| PageId(u.hyphenated().to_string()))
    }

    /// The hyphenated form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 32-character form without hyphens.
    pub fn simple(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PageId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PageId::parse(&value)
    }
}

impl From<PageId> for String {
    fn from(id: PageId) -> Self {
        id.0
    }
}

/// A reference from one page to another page or database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildRef {
    /// A sub-page; exported nested under the parent's directory
    Page { id: PageId },

    /// A database view; members are exported flat at the top level
    Collection {
        collection_id: String,
        view_id: String,
    },

    /// A "link to page"; only ever rendered as a link
    Link { id: PageId },
}

/// A page with its content and outgoing references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical identifier
    pub id: PageId,

    /// Page title (plain text)
    pub title: String,

    /// Workspace (space) the page belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,

    /// Cover image, already turned into a displayable URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<AssetRef>,

    /// Top-level content blocks
    pub blocks: Vec<Block>,

    /// Outgoing page and database references, in document order
    #[serde(default)]
    pub children: Vec<ChildRef>,
}

impl PageRecord {
    /// Create an empty page.
    pub fn new(id: PageId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            space_id: None,
            cover: None,
            blocks: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Directory name for this page.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    /// Total number of blocks, including nested ones.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(Block::count).sum()
    }
}

/// Turn a title into a path-safe directory name.
///
/// Lowercases, replaces runs of non-word characters with `-`, trims dashes,
/// and falls back to `page` when nothing is left.
pub fn slugify(text: &str) -> String {
    let re = Regex::new(r"[^\w\-]+").unwrap();
    let lower = text.to_lowercase();
    let slug = re.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "1a2b3c4d-5e6f-7890-1a2b-3c4d5e6f7890";

    #[test]
    fn test_normalize_raw_hex() {
        let id = PageId::parse("1a2b3c4d5e6f78901a2b3c4d5e6f7890").unwrap();
        assert_eq!(id.as_str(), CANONICAL);
    }

    #[test]
    fn test_normalize_all_spellings_equal() {
        let spellings = [
            "1a2b3c4d5e6f78901a2b3c4d5e6f7890",
            "1A2B3C4D-5E6F-7890-1A2B-3C4D5E6F7890",
            "https://www.notion.so/acme/My-Page-1a2b3c4d5e6f78901a2b3c4d5e6f7890?pvs=4",
            "https://acme.notion.site/1a2b3c4d-5e6f-7890-1a2b-3c4d5e6f7890",
        ];
        for raw in spellings {
            assert_eq!(PageId::parse(raw).unwrap().as_str(), CANONICAL, "{raw}");
        }
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(
            PageId::parse("https://example.com/about"),
            Err(Error::InvalidId(_))
        ));
        assert!(PageId::find("deadbeef").is_none());
    }

    #[test]
    fn test_find_in_html_prefers_redirect_metadata() {
        let html = r#"<a href="/ffffffffffffffffffffffffffffffff"></a>
            <script>{"requiredRedirectMetadata":{"pageId":"1a2b3c4d-5e6f-7890-1a2b-3c4d5e6f7890"}}</script>"#;
        assert_eq!(PageId::find_in_html(html).unwrap().as_str(), CANONICAL);

        let html = "<meta content=\"1a2b3c4d5e6f78901a2b3c4d5e6f7890\">";
        assert_eq!(PageId::find_in_html(html).unwrap().as_str(), CANONICAL);
    }

    #[test]
    fn test_simple_form() {
        let id = PageId::parse(CANONICAL).unwrap();
        assert_eq!(id.simple(), "1a2b3c4d5e6f78901a2b3c4d5e6f7890");
    }

    #[test]
    fn test_serde_normalizes() {
        let id: PageId = serde_json::from_str("\"1a2b3c4d5e6f78901a2b3c4d5e6f7890\"").unwrap();
        assert_eq!(id.as_str(), CANONICAL);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{CANONICAL}\""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Roadmap 2024 / Q1 "), "roadmap-2024-q1");
        assert_eq!(slugify("???"), "page");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }
}

//! Block-level types.

use super::{plain_text, AssetRef, RichSpan};
use serde::{Deserialize, Serialize};

/// A content block with its nested children.
///
/// Parents own their children outright; cross references between pages are
/// kept as identifiers, never as links into another tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Remote block identifier, when the block came from the workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// What the block is
    pub kind: BlockKind,

    /// Nested child blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl Block {
    /// Create a block with no id and no children.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: None,
            kind,
            children: Vec::new(),
        }
    }

    /// Create a heading (level is clamped to 1-3).
    pub fn heading(level: u8, text: Vec<RichSpan>) -> Self {
        Self::new(BlockKind::Heading {
            level: level.clamp(1, 3),
            text,
        })
    }

    /// Create a paragraph.
    pub fn paragraph(text: Vec<RichSpan>) -> Self {
        Self::new(BlockKind::Paragraph { text })
    }

    /// Create a column list from its columns' contents.
    pub fn column_list(columns: Vec<Vec<Block>>) -> Self {
        let children = columns
            .into_iter()
            .map(|content| Block::new(BlockKind::Column).with_children(content))
            .collect();
        Self::new(BlockKind::ColumnList).with_children(children)
    }

    /// Set the remote identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the children.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    /// Add a child block.
    pub fn add_child(&mut self, child: Block) {
        self.children.push(child);
    }

    /// The block's own rich text, for kinds that carry one.
    pub fn text(&self) -> Option<&[RichSpan]> {
        match &self.kind {
            BlockKind::Heading { text, .. }
            | BlockKind::Paragraph { text }
            | BlockKind::BulletedItem { text }
            | BlockKind::NumberedItem { text }
            | BlockKind::ToDo { text, .. }
            | BlockKind::Quote { text }
            | BlockKind::Callout { text, .. }
            | BlockKind::Bookmark { text, .. }
            | BlockKind::Unsupported { text, .. } => Some(text.as_slice()),
            BlockKind::Toggle { summary } => Some(summary.as_slice()),
            BlockKind::Image(m)
            | BlockKind::Video(m)
            | BlockKind::Audio(m)
            | BlockKind::File(m)
            | BlockKind::Embed(m) => Some(m.caption.as_slice()),
            _ => None,
        }
    }

    /// Mutable access to the block's own rich text.
    pub fn text_mut(&mut self) -> Option<&mut Vec<RichSpan>> {
        match &mut self.kind {
            BlockKind::Heading { text, .. }
            | BlockKind::Paragraph { text }
            | BlockKind::BulletedItem { text }
            | BlockKind::NumberedItem { text }
            | BlockKind::ToDo { text, .. }
            | BlockKind::Quote { text }
            | BlockKind::Callout { text, .. }
            | BlockKind::Bookmark { text, .. }
            | BlockKind::Unsupported { text, .. } => Some(text),
            BlockKind::Toggle { summary } => Some(summary),
            BlockKind::Image(m)
            | BlockKind::Video(m)
            | BlockKind::Audio(m)
            | BlockKind::File(m)
            | BlockKind::Embed(m) => Some(&mut m.caption),
            _ => None,
        }
    }

    /// Plain text of the block's own rich text (code blocks return their body).
    pub fn plain_text(&self) -> String {
        match &self.kind {
            BlockKind::Code { code, .. } => code.clone(),
            BlockKind::ChildPage { title, .. } | BlockKind::LinkToPage { title, .. } => {
                title.clone()
            }
            _ => self.text().map(plain_text).unwrap_or_default(),
        }
    }

    /// Check if this is a list item (bulleted, numbered or to-do).
    pub fn is_list_item(&self) -> bool {
        matches!(
            self.kind,
            BlockKind::BulletedItem { .. } | BlockKind::NumberedItem { .. } | BlockKind::ToDo { .. }
        )
    }

    /// Number of blocks in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Block::count).sum::<usize>()
    }

    /// Notion's name for the block type.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            BlockKind::Heading { level: 1, .. } => "heading_1",
            BlockKind::Heading { level: 2, .. } => "heading_2",
            BlockKind::Heading { .. } => "heading_3",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::BulletedItem { .. } => "bulleted_list_item",
            BlockKind::NumberedItem { .. } => "numbered_list_item",
            BlockKind::ToDo { .. } => "to_do",
            BlockKind::Quote { .. } => "quote",
            BlockKind::Callout { .. } => "callout",
            BlockKind::Code { .. } => "code",
            BlockKind::Divider => "divider",
            BlockKind::Image(_) => "image",
            BlockKind::Video(_) => "video",
            BlockKind::Audio(_) => "audio",
            BlockKind::File(_) => "file",
            BlockKind::Embed(_) => "embed",
            BlockKind::Bookmark { .. } => "bookmark",
            BlockKind::Toggle { .. } => "toggle",
            BlockKind::ColumnList => "column_list",
            BlockKind::Column => "column",
            BlockKind::LinkToPage { .. } => "link_to_page",
            BlockKind::ChildPage { .. } => "child_page",
            BlockKind::Unsupported { kind, .. } => kind.as_str(),
        }
    }
}

/// The fixed set of block kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// Heading, level 1-3
    Heading { level: u8, text: Vec<RichSpan> },

    Paragraph { text: Vec<RichSpan> },

    BulletedItem { text: Vec<RichSpan> },

    NumberedItem { text: Vec<RichSpan> },

    /// To-do item; `checked` is absent when the source did not say
    ToDo {
        text: Vec<RichSpan>,
        #[serde(default)]
        checked: Option<bool>,
    },

    Quote { text: Vec<RichSpan> },

    /// Callout with an optional emoji (or icon path) icon
    Callout {
        #[serde(default)]
        icon: Option<String>,
        text: Vec<RichSpan>,
    },

    /// Code block; `code` is verbatim, unformatted text
    Code { language: String, code: String },

    Divider,

    Image(Media),

    Video(Media),

    Audio(Media),

    File(Media),

    Embed(Media),

    Bookmark { url: String, text: Vec<RichSpan> },

    /// Collapsible block; children are the hidden content
    Toggle { summary: Vec<RichSpan> },

    /// Side-by-side layout; children are exactly `Column` blocks
    ColumnList,

    Column,

    /// Reference to a page elsewhere in the workspace (never recursed)
    LinkToPage {
        page_id: Option<String>,
        title: String,
    },

    /// A sub-page of the current page
    ChildPage {
        page_id: Option<String>,
        title: String,
    },

    /// Anything outside the fixed set, kept as its text
    Unsupported { kind: String, text: Vec<RichSpan> },
}

/// Payload shared by media-like blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Where the media lives
    pub source: AssetRef,

    /// Caption / title text
    #[serde(default)]
    pub caption: Vec<RichSpan>,

    /// Link title reported by the workspace for embeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_title: Option<String>,
}

impl Media {
    /// Create media with no caption.
    pub fn new(source: AssetRef) -> Self {
        Self {
            source,
            caption: Vec::new(),
            link_title: None,
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: Vec<RichSpan>) -> Self {
        self.caption = caption;
        self
    }
}

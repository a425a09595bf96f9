//! Record-map decoding: raw workspace blocks → [`Block`] trees.

use crate::asset::cover_url;
use crate::error::{Error, Result};
use crate::model::{
    AssetRef, Annotations, Block, BlockKind, ChildRef, Color, Media, PageId, PageRecord, RichSpan,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Title used when a page has none.
const UNTITLED: &str = "untitled";

/// A raw block as stored in a record map.
///
/// Every field is optional on the wire; missing or null values decode to
/// empty ones.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordBlock {
    #[serde(default)]
    pub id: String,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    #[serde(default)]
    pub format: Option<Map<String, Value>>,

    #[serde(default)]
    pub content: Option<Vec<String>>,

    #[serde(default)]
    pub alive: Option<bool>,

    #[serde(default)]
    pub space_id: Option<String>,

    #[serde(default)]
    pub view_ids: Option<Vec<String>>,
}

impl RecordBlock {
    /// Decode a record-map entry, unwrapping any `{"value": …}` envelopes.
    pub fn from_entry(raw: &Value) -> Option<Self> {
        let mut value = raw;
        while let Some(inner) = value.get("value").filter(|v| v.is_object()) {
            value = inner;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Blocks explicitly marked dead are skipped everywhere.
    pub fn is_alive(&self) -> bool {
        self.alive != Some(false)
    }

    /// A property value (rich-text array).
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(name)
    }

    /// A string-valued format entry, if non-empty.
    pub fn format_str(&self, key: &str) -> Option<&str> {
        self.format
            .as_ref()?
            .get(key)?
            .as_str()
            .filter(|s| !s.is_empty())
    }

    /// Ordered child ids.
    pub fn children(&self) -> &[String] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Plain text of the `title` property.
    pub fn title(&self) -> String {
        plain_rich_text(self.property("title"))
    }
}

/// Identifier-keyed set of record blocks merged from page chunks.
#[derive(Debug, Clone, Default)]
pub struct RecordMap {
    blocks: HashMap<String, RecordBlock>,
}

impl RecordMap {
    /// Create an empty record map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge raw chunk entries; identifiers already present are kept.
    ///
    /// Returns the number of blocks added.
    pub fn merge_chunk(&mut self, chunk: &HashMap<String, Value>) -> usize {
        let mut added = 0;
        for (id, raw) in chunk {
            if self.blocks.contains_key(id) {
                continue;
            }
            match RecordBlock::from_entry(raw) {
                Some(mut block) => {
                    if block.id.is_empty() {
                        block.id = id.clone();
                    }
                    self.blocks.insert(id.clone(), block);
                    added += 1;
                }
                None => log::debug!("Skipping undecodable record {}", id),
            }
        }
        added
    }

    /// Insert a block unless its id is already present.
    pub fn insert(&mut self, block: RecordBlock) -> bool {
        if self.blocks.contains_key(&block.id) {
            return false;
        }
        self.blocks.insert(block.id.clone(), block);
        true
    }

    /// Look up a block by id.
    pub fn get(&self, id: &str) -> Option<&RecordBlock> {
        self.blocks.get(id)
    }

    /// Check whether an id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over all block ids.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}

/// Looks up page titles for page mentions.
pub trait MentionResolver {
    /// Title of the page with this id, if it can be found.
    fn page_title(&mut self, page_id: &str) -> Option<String>;
}

/// Resolver that never finds anything; mentions keep their placeholder text.
pub struct NoMentions;

impl MentionResolver for NoMentions {
    fn page_title(&mut self, _page_id: &str) -> Option<String> {
        None
    }
}

/// Concatenated text of a rich-text array, ignoring annotations.
pub fn plain_rich_text(value: Option<&Value>) -> String {
    let Some(parts) = value.and_then(Value::as_array) else {
        return String::new();
    };
    parts
        .iter()
        .filter_map(|part| part.as_array()?.first().map(text_of))
        .collect()
}

/// Decode a rich-text array (`[[text, [[code, arg?]…]]…]`) into spans.
///
/// Page mentions (`p`) become a link to `/{hex id}` labelled with the target
/// page's title; link mentions (`lm`) become a link labelled with their
/// title.
pub fn decode_rich_text(value: Option<&Value>, mentions: &mut dyn MentionResolver) -> Vec<RichSpan> {
    let Some(parts) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    for part in parts {
        let Some(items) = part.as_array() else {
            continue;
        };
        let Some(first) = items.first() else {
            continue;
        };
        let mut text = text_of(first);
        let mut ann = Annotations::default();

        let codes = items.get(1).and_then(Value::as_array);
        for code in codes.into_iter().flatten() {
            let Some(code) = code.as_array() else {
                continue;
            };
            let arg = code.get(1);
            match code.first().and_then(Value::as_str) {
                Some("b") => ann.bold = true,
                Some("i") => ann.italic = true,
                Some("s") => ann.strikethrough = true,
                Some("c") => ann.code = true,
                Some("_") => ann.underline = true,
                Some("a") => {
                    if let Some(url) = arg.and_then(Value::as_str) {
                        ann.link = Some(url.to_string());
                    }
                }
                Some("h") => {
                    if let Some(name) = arg.and_then(Value::as_str) {
                        ann.color = Color::from_name(name);
                    }
                }
                Some("p") => {
                    if let Some(id) = arg.and_then(Value::as_str) {
                        ann.link = Some(format!("/{}", id.replace('-', "")));
                        if let Some(title) = mentions.page_title(id) {
                            text = title;
                        }
                    }
                }
                Some("lm") => {
                    if let Some(meta) = arg.and_then(Value::as_object) {
                        if let Some(href) = meta.get("href").and_then(Value::as_str) {
                            ann.link = Some(href.to_string());
                        }
                        if let Some(title) = meta
                            .get("title")
                            .and_then(Value::as_str)
                            .filter(|t| !t.is_empty())
                        {
                            text = title.to_string();
                        }
                    }
                }
                _ => {}
            }
        }

        spans.push(RichSpan::styled(text, ann));
    }
    spans
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build the page record for `page_id` from an assembled record map.
///
/// Fails when the map has no block for the page itself.
pub fn build_page(
    page_id: &PageId,
    map: &RecordMap,
    mentions: &mut dyn MentionResolver,
) -> Result<PageRecord> {
    let page = map
        .get(page_id.as_str())
        .ok_or_else(|| Error::Malformed(format!("No page block found for {}", page_id)))?;

    let title = page.title();
    let title = if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    };

    let mut record = PageRecord::new(page_id.clone(), title);
    record.space_id = page.space_id.clone();
    record.cover = page.format_str("page_cover").map(|cover| {
        AssetRef::url(cover_url(cover, page_id.as_str(), page.space_id.as_deref()))
    });

    let mut decoder = Decoder {
        map,
        mentions,
        children: Vec::new(),
    };
    record.blocks = decoder.decode_children(page.children());
    record.children = decoder.children;

    log::debug!(
        "Built page {} ({} blocks, {} references)",
        page_id,
        record.block_count(),
        record.children.len()
    );
    Ok(record)
}

struct Decoder<'m, 'r> {
    map: &'m RecordMap,
    mentions: &'r mut dyn MentionResolver,
    children: Vec<ChildRef>,
}

impl Decoder<'_, '_> {
    fn decode_children(&mut self, ids: &[String]) -> Vec<Block> {
        ids.iter().filter_map(|id| self.decode(id)).collect()
    }

    fn rich(&mut self, record: &RecordBlock, property: &str) -> Vec<RichSpan> {
        decode_rich_text(record.property(property), &mut *self.mentions)
    }

    fn decode(&mut self, id: &str) -> Option<Block> {
        let map = self.map;
        let record = map.get(id)?;
        if !record.is_alive() {
            return None;
        }

        let kind = match record.kind.as_str() {
            "header" => BlockKind::Heading {
                level: 1,
                text: self.rich(record, "title"),
            },
            "sub_header" => BlockKind::Heading {
                level: 2,
                text: self.rich(record, "title"),
            },
            "sub_sub_header" => BlockKind::Heading {
                level: 3,
                text: self.rich(record, "title"),
            },
            "text" => BlockKind::Paragraph {
                text: self.rich(record, "title"),
            },
            "bulleted_list" => BlockKind::BulletedItem {
                text: self.rich(record, "title"),
            },
            "numbered_list" => BlockKind::NumberedItem {
                text: self.rich(record, "title"),
            },
            "to_do" => {
                let checked = plain_rich_text(record.property("checked"));
                BlockKind::ToDo {
                    text: self.rich(record, "title"),
                    checked: Some(matches!(checked.as_str(), "Yes" | "true" | "True")),
                }
            }
            "quote" => BlockKind::Quote {
                text: self.rich(record, "title"),
            },
            "callout" => BlockKind::Callout {
                icon: record.format_str("page_icon").map(str::to_string),
                text: self.rich(record, "title"),
            },
            "code" => BlockKind::Code {
                language: plain_rich_text(record.property("language"))
                    .trim()
                    .to_lowercase(),
                code: record.title(),
            },
            "divider" => BlockKind::Divider,
            "image" => BlockKind::Image(self.media(record, true)?),
            "file" | "pdf" => BlockKind::File(self.media(record, true)?),
            "video" => BlockKind::Video(self.media(record, true)?),
            "audio" => BlockKind::Audio(self.media(record, true)?),
            "embed" => BlockKind::Embed(self.media(record, false)?),
            "bookmark" => {
                let url = plain_rich_text(record.property("link"));
                if url.is_empty() {
                    BlockKind::Unsupported {
                        kind: record.kind.clone(),
                        text: self.rich(record, "title"),
                    }
                } else {
                    BlockKind::Bookmark {
                        url,
                        text: self.rich(record, "title"),
                    }
                }
            }
            "toggle" => BlockKind::Toggle {
                summary: self.rich(record, "title"),
            },
            "column_list" => BlockKind::ColumnList,
            "column" => BlockKind::Column,
            "link_to_page" => {
                let target = record
                    .format_str("page_id")
                    .or_else(|| record.format_str("page_ref"))
                    .and_then(PageId::find);
                let mut title = record.title();
                if title.is_empty() {
                    if let Some(target) = &target {
                        title = self.mentions.page_title(target.as_str()).unwrap_or_default();
                    }
                }
                if let Some(target) = &target {
                    self.children.push(ChildRef::Link { id: target.clone() });
                }
                BlockKind::LinkToPage {
                    page_id: target.map(String::from),
                    title,
                }
            }
            "page" | "child_page" => {
                let id = PageId::find(&record.id);
                if let Some(id) = &id {
                    self.children.push(ChildRef::Page { id: id.clone() });
                }
                // A sub-page's content belongs to its own export.
                return Some(
                    Block::new(BlockKind::ChildPage {
                        page_id: id.map(String::from),
                        title: record.title(),
                    })
                    .with_id(record.id.clone()),
                );
            }
            "collection_view" | "collection_view_page" => {
                let collection = record
                    .format
                    .as_ref()
                    .and_then(|f| f.get("collection_pointer"))
                    .and_then(|p| p.get("id"))
                    .and_then(Value::as_str);
                let view = record.view_ids.as_ref().and_then(|v| v.first());
                match (collection, view) {
                    (Some(collection_id), Some(view_id)) => {
                        self.children.push(ChildRef::Collection {
                            collection_id: collection_id.to_string(),
                            view_id: view_id.clone(),
                        });
                    }
                    _ => log::warn!("Database block {} has no collection pointer or view", id),
                }
                BlockKind::Unsupported {
                    kind: record.kind.clone(),
                    text: self.rich(record, "title"),
                }
            }
            other => BlockKind::Unsupported {
                kind: other.to_string(),
                text: self.rich(record, "title"),
            },
        };

        let children = self.decode_children(record.children());
        Some(
            Block::new(kind)
                .with_id(record.id.clone())
                .with_children(children),
        )
    }

    /// Media payload; `None` (block dropped) when no source is recorded.
    fn media(&mut self, record: &RecordBlock, prefer_property: bool) -> Option<Media> {
        let from_property = || {
            let source = plain_rich_text(record.property("source"));
            (!source.is_empty()).then_some(source)
        };
        let from_format = || {
            record
                .format_str("display_source")
                .or_else(|| record.format_str("source"))
                .map(str::to_string)
        };
        let source = if prefer_property {
            from_property().or_else(from_format)
        } else {
            from_format().or_else(from_property)
        };

        let Some(source) = source else {
            log::debug!("Dropping {} block {} without a source", record.kind, record.id);
            return None;
        };

        let caption = if record.property("caption").is_some() {
            self.rich(record, "caption")
        } else {
            self.rich(record, "title")
        };
        let mut media = Media::new(AssetRef::remote(source)).with_caption(caption);
        media.link_title = record.format_str("link_title").map(str::to_string);
        Some(media)
    }
}

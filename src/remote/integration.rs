//! Blocking client for the official integration API, plus block payloads.

use super::{NewPage, PageSink};
use crate::error::{Error, Result};
use crate::model::{Block, BlockKind, Media, RichSpan};
use reqwest::blocking::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::thread;
use std::time::Duration;

/// Base URL of the official API.
pub const INTEGRATION_API_BASE: &str = "https://api.notion.com/v1";

/// API version sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Most children accepted by one create or append call.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Longest text content accepted in one rich-text item.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Default delay after every request.
pub const DEFAULT_IMPORT_DELAY: Duration = Duration::from_millis(350);

const DEFAULT_CALLOUT_EMOJI: &str = "\u{1F4A1}";

/// Connection settings for [`IntegrationClient`].
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// API base URL, without trailing slash
    pub api_base: String,

    /// Pause after every request
    pub delay: Duration,

    token: SecretString,
}

impl IntegrationConfig {
    /// Configuration for an integration token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: INTEGRATION_API_BASE.to_string(),
            delay: DEFAULT_IMPORT_DELAY,
            token: SecretString::new(token.into()),
        }
    }

    /// Set the pause after every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Point the client at another API base.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

/// [`PageSink`] over HTTP.
pub struct IntegrationClient {
    config: IntegrationConfig,
    http: Client,
}

impl IntegrationClient {
    /// Build a client.
    pub fn new(config: IntegrationConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self { config, http })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.config.token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
    }

    fn send(&self, endpoint: &str, request: RequestBuilder, body: &Value) -> Result<Value> {
        log::debug!("{}", endpoint);
        let response = self.authorized(request).json(body).send();
        if !self.config.delay.is_zero() {
            thread::sleep(self.config.delay);
        }
        let response = response?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(Error::api(endpoint, status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl PageSink for IntegrationClient {
    fn create_page(&self, page: &NewPage) -> Result<String> {
        let url = format!("{}/pages", self.config.api_base);
        let body = page_payload(page);
        let value = self.send("pages", self.http.post(&url), &body)?;
        value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Malformed("page creation response has no id".to_string()))
    }

    fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        let url = format!("{}/blocks/{}/children", self.config.api_base, block_id);
        let body = json!({ "children": children_payload(children) });
        self.send("blocks/children", self.http.patch(&url), &body)?;
        Ok(())
    }
}

/// Request body for page creation.
pub fn page_payload(page: &NewPage) -> Value {
    let mut body = json!({
        "parent": {"page_id": page.parent.as_str()},
        "properties": {
            "title": {"title": [{"type": "text", "text": {"content": page.title}}]}
        },
        "children": children_payload(&page.children),
    });
    if let Some(cover) = &page.cover_url {
        body["cover"] = json!({"type": "external", "external": {"url": cover}});
    }
    body
}

fn children_payload(blocks: &[Block]) -> Vec<Value> {
    blocks.iter().filter_map(block_payload).collect()
}

/// API payload for one block, or `None` if the block cannot be sent.
///
/// Media must already point at a public URL; local or unsupported assets
/// are dropped with a warning.
pub fn block_payload(block: &Block) -> Option<Value> {
    let kind = block.type_name().to_string();
    let mut body = Map::new();

    match &block.kind {
        BlockKind::Heading { text, .. }
        | BlockKind::Paragraph { text }
        | BlockKind::BulletedItem { text }
        | BlockKind::NumberedItem { text }
        | BlockKind::Quote { text } => {
            body.insert("rich_text".into(), json!(rich_text_payload(text)));
        }
        BlockKind::ToDo { text, checked } => {
            body.insert("rich_text".into(), json!(rich_text_payload(text)));
            body.insert("checked".into(), json!(checked.unwrap_or(false)));
        }
        BlockKind::Callout { icon, text } => {
            body.insert("rich_text".into(), json!(rich_text_payload(text)));
            body.insert("icon".into(), callout_icon(icon.as_deref()));
        }
        BlockKind::Code { language, code } => {
            body.insert(
                "rich_text".into(),
                json!(rich_text_payload(&[RichSpan::plain(code.clone())])),
            );
            body.insert("language".into(), json!(language));
        }
        BlockKind::Divider | BlockKind::ColumnList | BlockKind::Column => {}
        BlockKind::Image(media) | BlockKind::Audio(media) | BlockKind::File(media) => {
            let url = public_media_url(&kind, media)?;
            body.insert("type".into(), json!("external"));
            body.insert("external".into(), json!({ "url": url }));
            insert_caption(&mut body, media);
        }
        BlockKind::Video(media) => {
            let url = public_media_url(&kind, media)?;
            if !is_video_host(url) {
                let mut embed = Map::new();
                embed.insert("url".into(), json!(url));
                insert_caption(&mut embed, media);
                return Some(wrap("embed", embed, &block.children));
            }
            body.insert("type".into(), json!("external"));
            body.insert("external".into(), json!({ "url": url }));
            insert_caption(&mut body, media);
        }
        BlockKind::Embed(media) => {
            let url = public_media_url(&kind, media)?;
            body.insert("url".into(), json!(url));
            insert_caption(&mut body, media);
        }
        BlockKind::Bookmark { url, text } => {
            body.insert("url".into(), json!(url));
            if !text.is_empty() {
                body.insert("caption".into(), json!(rich_text_payload(text)));
            }
        }
        BlockKind::Toggle { summary } => {
            body.insert("rich_text".into(), json!(rich_text_payload(summary)));
        }
        BlockKind::LinkToPage { page_id, .. } => {
            let page_id = page_id.as_deref()?;
            body.insert("type".into(), json!("page_id"));
            body.insert("page_id".into(), json!(page_id));
            return Some(wrap(&kind, body, &[]));
        }
        BlockKind::ChildPage { title, .. } => {
            log::warn!("Child page '{}' cannot be sent as a block; skipped", title);
            return None;
        }
        BlockKind::Unsupported { kind, text } => {
            if text.is_empty() {
                log::debug!("Dropping empty unsupported block '{}'", kind);
                return None;
            }
            body.insert("rich_text".into(), json!(rich_text_payload(text)));
            return Some(wrap("paragraph", body, &block.children));
        }
    }

    Some(wrap(&kind, body, &block.children))
}

fn wrap(kind: &str, mut body: Map<String, Value>, children: &[Block]) -> Value {
    let children = children_payload(children);
    if !children.is_empty() {
        body.insert("children".into(), json!(children));
    }
    json!({ "object": "block", "type": kind, kind: body })
}

fn callout_icon(icon: Option<&str>) -> Value {
    match icon {
        Some(url) if crate::model::is_http(url) => {
            json!({"type": "external", "external": {"url": url}})
        }
        Some(emoji) if !emoji.is_empty() && !emoji.starts_with('/') => {
            json!({"type": "emoji", "emoji": emoji})
        }
        _ => json!({"type": "emoji", "emoji": DEFAULT_CALLOUT_EMOJI}),
    }
}

fn public_media_url<'a>(kind: &str, media: &'a Media) -> Option<&'a str> {
    let url = media.source.public_url();
    if url.is_none() {
        log::warn!(
            "Skipping {} block: '{}' has no public URL",
            kind,
            media.source.locator
        );
    }
    url
}

fn insert_caption(body: &mut Map<String, Value>, media: &Media) {
    if !media.caption.is_empty() {
        body.insert("caption".into(), json!(rich_text_payload(&media.caption)));
    }
}

fn is_video_host(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .map(|host| {
            crate::parser::VIDEO_EMBED_HOSTS
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
        })
        .unwrap_or(false)
}

/// Rich-text items for a span list.
///
/// Spans longer than [`MAX_TEXT_LENGTH`] characters are split into several
/// items with the same annotations. Empty spans are dropped.
pub fn rich_text_payload(spans: &[RichSpan]) -> Vec<Value> {
    let mut items = Vec::new();
    for span in spans {
        let chars: Vec<char> = span.text.chars().collect();
        for piece in chars.chunks(MAX_TEXT_LENGTH) {
            let content: String = piece.iter().collect();
            items.push(text_item(&content, span));
        }
    }
    items
}

fn text_item(content: &str, span: &RichSpan) -> Value {
    let ann = &span.annotations;
    let mut text = json!({ "content": content });
    if let Some(link) = ann.link.as_deref().filter(|l| crate::model::is_http(l)) {
        text["link"] = json!({ "url": link });
    }
    let mut item = json!({ "type": "text", "text": text });
    if ann.has_styling() {
        item["annotations"] = json!({
            "bold": ann.bold,
            "italic": ann.italic,
            "strikethrough": ann.strikethrough,
            "underline": ann.underline,
            "code": ann.code,
            "color": ann.color.name(),
        });
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotations, AssetRef, Color, PageId};
    use std::path::Path;

    #[test]
    fn test_rich_text_split_at_limit() {
        let long = "a".repeat(MAX_TEXT_LENGTH * 2 + 5);
        let items = rich_text_payload(&[RichSpan::bold(long)]);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0]["text"]["content"].as_str().unwrap().len(),
            MAX_TEXT_LENGTH
        );
        assert_eq!(items[2]["text"]["content"].as_str().unwrap().len(), 5);
        assert!(items.iter().all(|i| i["annotations"]["bold"] == true));
    }

    #[test]
    fn test_rich_text_annotations_and_links() {
        let spans = vec![
            RichSpan::plain("plain"),
            RichSpan::styled(
                "red",
                Annotations {
                    color: Color::Red,
                    link: Some("https://example.com".to_string()),
                    ..Default::default()
                },
            ),
            RichSpan::plain(""),
        ];
        let items = rich_text_payload(&spans);
        assert_eq!(items.len(), 2);
        assert!(items[0].get("annotations").is_none());
        assert_eq!(items[1]["annotations"]["color"], "red");
        assert_eq!(items[1]["text"]["link"]["url"], "https://example.com");
    }

    #[test]
    fn test_callout_payload() {
        let block = Block::new(BlockKind::Callout {
            icon: Some("\u{26A0}\u{FE0F}".to_string()),
            text: vec![RichSpan::plain("careful")],
        });
        let value = block_payload(&block).unwrap();
        assert_eq!(value["type"], "callout");
        assert_eq!(value["callout"]["icon"]["emoji"], "\u{26A0}\u{FE0F}");

        let block = Block::new(BlockKind::Callout {
            icon: Some("/icons/arrow.svg".to_string()),
            text: Vec::new(),
        });
        let value = block_payload(&block).unwrap();
        assert_eq!(value["callout"]["icon"]["emoji"], DEFAULT_CALLOUT_EMOJI);
    }

    #[test]
    fn test_media_needs_public_url() {
        let local = Block::new(BlockKind::Image(Media::new(AssetRef::local(
            "assets/a.png",
            Path::new("/tmp"),
        ))));
        assert!(block_payload(&local).is_none());

        let remote = Block::new(BlockKind::Image(Media::new(AssetRef::url(
            "https://cdn.example.com/a.png",
        ))));
        let value = block_payload(&remote).unwrap();
        assert_eq!(
            value["image"]["external"]["url"],
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_video_hosts_and_embeds() {
        let video = Block::new(BlockKind::Video(Media::new(AssetRef::url(
            "https://www.youtube.com/watch?v=abc",
        ))));
        let value = block_payload(&video).unwrap();
        assert_eq!(value["type"], "video");

        let other = Block::new(BlockKind::Video(Media::new(AssetRef::url(
            "https://example.com/clip.mp4",
        ))));
        let value = block_payload(&other).unwrap();
        assert_eq!(value["type"], "embed");
        assert_eq!(value["embed"]["url"], "https://example.com/clip.mp4");
    }

    #[test]
    fn test_nested_children() {
        let toggle = Block::new(BlockKind::Toggle {
            summary: vec![RichSpan::plain("More")],
        })
        .with_children(vec![Block::paragraph(vec![RichSpan::plain("hidden")])]);
        let value = block_payload(&toggle).unwrap();
        assert_eq!(value["toggle"]["children"][0]["type"], "paragraph");

        let columns = Block::column_list(vec![
            vec![Block::paragraph(vec![RichSpan::plain("l")])],
            vec![Block::paragraph(vec![RichSpan::plain("r")])],
        ]);
        let value = block_payload(&columns).unwrap();
        let cols = value["column_list"]["children"].as_array().unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1]["column"]["children"][0]["type"], "paragraph");
    }

    #[test]
    fn test_code_payload() {
        let code = Block::new(BlockKind::Code {
            language: "python".to_string(),
            code: "print(1)".to_string(),
        });
        let value = block_payload(&code).unwrap();
        assert_eq!(value["code"]["language"], "python");
        assert_eq!(value["code"]["rich_text"][0]["text"]["content"], "print(1)");
    }

    #[test]
    fn test_page_payload() {
        let page = NewPage {
            parent: PageId::parse("1a2b3c4d5e6f78901a2b3c4d5e6f7890").unwrap(),
            title: "Notes".to_string(),
            cover_url: Some("https://example.com/c.jpg".to_string()),
            children: vec![Block::new(BlockKind::Divider)],
        };
        let value = page_payload(&page);
        assert_eq!(
            value["parent"]["page_id"],
            "1a2b3c4d-5e6f-7890-1a2b-3c4d5e6f7890"
        );
        assert_eq!(
            value["properties"]["title"]["title"][0]["text"]["content"],
            "Notes"
        );
        assert_eq!(value["cover"]["external"]["url"], "https://example.com/c.jpg");
        assert_eq!(value["children"][0]["type"], "divider");
    }
}

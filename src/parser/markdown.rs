//! Markdown → block tree.

use super::html::{count_tag, HtmlExtractor};
use super::options::{normalize_language, ParseOptions, CALLOUT_ICONS};
use crate::model::{is_http, AssetRef, Block, BlockKind, Media};
use crate::richtext::RichTextCodec;
use regex::Regex;

/// Hosts whose `[▶ …](url)` links become video blocks instead of embeds.
pub const VIDEO_EMBED_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

/// Alt texts the renderer falls back to when a media block has no caption.
const FALLBACK_LABELS: &[&str] = &["image", "file", "pdf", "video", "audio"];

/// Classification of a single source line.
#[derive(Debug)]
enum Line<'a> {
    Blank,
    Heading(u8, &'a str),
    Divider,
    ToDo {
        depth: usize,
        checked: bool,
        text: &'a str,
    },
    Bullet {
        depth: usize,
        text: &'a str,
    },
    Numbered {
        depth: usize,
        text: String,
    },
    Quote(&'a str),
    Fence(&'a str),
    Table,
    Details,
    Image {
        alt: String,
        src: String,
    },
    MediaLink {
        url: String,
    },
    LinkLine {
        text: String,
        url: String,
    },
    Text(&'a str),
}

impl Line<'_> {
    /// Whether this line starts a new construct and so ends a paragraph.
    fn breaks_paragraph(&self) -> bool {
        !matches!(self, Line::Blank | Line::LinkLine { .. } | Line::Text(_))
    }
}

/// Line-oriented Markdown parser.
///
/// Recognizes exactly the constructs the exporter writes: headings, lists,
/// quotes and callouts, fenced code, dividers, images, media links, and the
/// HTML `<table>`/`<details>` forms used for columns and toggles.
pub struct BlockParser {
    options: ParseOptions,
    codec: RichTextCodec,
    html: HtmlExtractor,
    numbered: Regex,
    image: Regex,
    inline_link: Regex,
    link_line: Regex,
}

impl BlockParser {
    /// Create a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            codec: RichTextCodec::new(),
            html: HtmlExtractor::new(),
            numbered: Regex::new(r"^(\s*)\d+\.\s+(.*)$").unwrap(),
            image: Regex::new(r"^!\[([^\]]*)\]\(([^)]+)\)").unwrap(),
            inline_link: Regex::new(r"^\[([^\]]+)\]\(([^)]+)\)").unwrap(),
            link_line: Regex::new(r"^\[.+\]\(.+\)$").unwrap(),
        }
    }

    /// Parse options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a Markdown document into top-level blocks.
    pub fn parse(&self, markdown: &str) -> Vec<Block> {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut blocks = Vec::new();
        let mut pos = 0;

        while pos < lines.len() {
            let line = lines[pos];
            match self.classify(line) {
                Line::Blank => pos += 1,
                Line::Heading(level, text) => {
                    blocks.push(Block::heading(level, self.codec.encode(text.trim())));
                    pos += 1;
                }
                Line::Divider => {
                    blocks.push(Block::new(BlockKind::Divider));
                    pos += 1;
                }
                Line::ToDo {
                    depth,
                    checked,
                    text,
                } => {
                    let item = Block::new(BlockKind::ToDo {
                        text: self.codec.encode(text),
                        checked: Some(checked),
                    });
                    attach_list_item(&mut blocks, depth, item);
                    pos += 1;
                }
                Line::Bullet { depth, text } => {
                    let item = Block::new(BlockKind::BulletedItem {
                        text: self.codec.encode(text),
                    });
                    attach_list_item(&mut blocks, depth, item);
                    pos += 1;
                }
                Line::Numbered { depth, text } => {
                    let item = Block::new(BlockKind::NumberedItem {
                        text: self.codec.encode(&text),
                    });
                    attach_list_item(&mut blocks, depth, item);
                    pos += 1;
                }
                Line::Quote(text) => {
                    blocks.push(self.quote_or_callout(text));
                    pos += 1;
                }
                Line::Fence(language) => {
                    let (block, next) = self.code_block(&lines, pos, language);
                    blocks.push(block);
                    pos = next;
                }
                Line::Table => {
                    let (block, next) = self.column_table(&lines, pos);
                    blocks.extend(block);
                    pos = next;
                }
                Line::Details => {
                    let (block, next) = self.details(&lines, pos);
                    blocks.extend(block);
                    pos = next;
                }
                Line::Image { alt, src } => {
                    blocks.extend(self.image(&alt, &src));
                    pos += 1;
                }
                Line::MediaLink { url } => {
                    blocks.push(media_link(url));
                    pos += 1;
                }
                Line::LinkLine { text, url } => {
                    let block = if is_http(&url) {
                        let caption = if text == url {
                            Vec::new()
                        } else {
                            self.codec.encode(&text)
                        };
                        Block::new(BlockKind::Bookmark { url, text: caption })
                    } else {
                        Block::paragraph(self.codec.encode(&text))
                    };
                    blocks.push(block);
                    pos += 1;
                }
                Line::Text(first) => {
                    let mut parts = vec![first.trim()];
                    pos += 1;
                    while pos < lines.len() {
                        let next = self.classify(lines[pos]);
                        if matches!(next, Line::Blank) || next.breaks_paragraph() {
                            break;
                        }
                        parts.push(lines[pos].trim());
                        pos += 1;
                    }
                    blocks.push(Block::paragraph(self.codec.encode(&parts.join(" "))));
                }
            }
        }

        blocks
    }

    fn classify<'a>(&self, line: &'a str) -> Line<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Line::Blank;
        }

        if let Some(text) = line.strip_prefix("# ") {
            return Line::Heading(1, text);
        }
        if let Some(text) = line.strip_prefix("## ") {
            return Line::Heading(2, text);
        }
        if let Some(text) = line.strip_prefix("### ") {
            return Line::Heading(3, text);
        }
        if trimmed == "---" {
            return Line::Divider;
        }

        let body = line.trim_start();
        let depth = indent_width(line) / 2;
        if let Some((checked, text)) = todo_marker(body) {
            return Line::ToDo {
                depth,
                checked,
                text: text.trim(),
            };
        }
        if let Some(text) = body.strip_prefix("- ") {
            return Line::Bullet {
                depth,
                text: text.trim(),
            };
        }
        if let Some(caps) = self.numbered.captures(line) {
            return Line::Numbered {
                depth,
                text: caps[2].trim().to_string(),
            };
        }

        if let Some(text) = line.strip_prefix("> ") {
            return Line::Quote(text.trim());
        }
        if let Some(language) = line.strip_prefix("```") {
            return Line::Fence(language.trim());
        }
        if trimmed.starts_with("<table>") || trimmed.starts_with("<table ") {
            return Line::Table;
        }
        if trimmed.starts_with("<details>") {
            return Line::Details;
        }

        if trimmed.starts_with("![") {
            if let Some(caps) = self.image.captures(trimmed) {
                return Line::Image {
                    alt: caps[1].to_string(),
                    src: caps[2].trim().to_string(),
                };
            }
        }
        if trimmed.starts_with("[\u{25B6}") || trimmed.starts_with("[\u{1F50A}") {
            if let Some(caps) = self.inline_link.captures(trimmed) {
                return Line::MediaLink {
                    url: caps[2].trim().to_string(),
                };
            }
        }
        if self.link_line.is_match(trimmed) {
            if let Some(caps) = self.inline_link.captures(trimmed) {
                return Line::LinkLine {
                    text: caps[1].to_string(),
                    url: caps[2].trim().to_string(),
                };
            }
        }

        Line::Text(line)
    }

    fn quote_or_callout(&self, text: &str) -> Block {
        match self.split_callout_icon(text) {
            Some((icon, rest)) => Block::new(BlockKind::Callout {
                icon: Some(icon),
                text: self.codec.encode(rest),
            }),
            None => Block::new(BlockKind::Quote {
                text: self.codec.encode(text),
            }),
        }
    }

    /// Split a leading callout emoji off `text`.
    fn split_callout_icon<'t>(&self, text: &'t str) -> Option<(String, &'t str)> {
        let first = text.chars().next()?;
        if ('\u{1F300}'..='\u{1F9FF}').contains(&first) {
            let mut end = first.len_utf8();
            if text[end..].starts_with('\u{FE0F}') {
                end += '\u{FE0F}'.len_utf8();
            }
            return Some((text[..end].to_string(), text[end..].trim_start()));
        }

        let icon_len = CALLOUT_ICONS
            .iter()
            .find(|icon| text.starts_with(*icon))
            .map(|icon| icon.len())
            .or_else(|| {
                self.options
                    .extra_callout_icons
                    .iter()
                    .find(|icon| !icon.is_empty() && text.starts_with(icon.as_str()))
                    .map(String::len)
            })?;
        Some((text[..icon_len].to_string(), text[icon_len..].trim_start()))
    }

    /// Consume a fenced code block starting at `start`; returns the block and
    /// the index after the closing fence.
    fn code_block(&self, lines: &[&str], start: usize, language: &str) -> (Block, usize) {
        let mut body = Vec::new();
        let mut pos = start + 1;
        while pos < lines.len() && !lines[pos].starts_with("```") {
            body.push(lines[pos]);
            pos += 1;
        }
        if pos >= lines.len() {
            log::debug!("Unterminated code fence at line {}", start + 1);
        }
        let block = Block::new(BlockKind::Code {
            language: normalize_language(language),
            code: body.join("\n"),
        });
        (block, (pos + 1).min(lines.len()))
    }

    /// Consume an HTML column table; empty cells are dropped and a table with
    /// no content produces nothing.
    fn column_table(&self, lines: &[&str], start: usize) -> (Option<Block>, usize) {
        let mut pos = start;
        let mut html = Vec::new();
        while pos < lines.len() {
            let line = lines[pos];
            html.push(line);
            pos += 1;
            if line.contains("</table>") {
                break;
            }
        }

        let columns: Vec<Vec<Block>> = self
            .html
            .table_cells(&html.join("\n"))
            .iter()
            .map(|cell| self.parse(cell))
            .filter(|content| !content.is_empty())
            .collect();

        if columns.is_empty() {
            return (None, pos);
        }
        (Some(Block::column_list(columns)), pos)
    }

    /// Consume a `<details>` element, tracking nesting depth.
    fn details(&self, lines: &[&str], start: usize) -> (Option<Block>, usize) {
        let mut pos = start;
        let mut depth: isize = 0;
        let mut html = Vec::new();
        while pos < lines.len() {
            let line = lines[pos];
            depth += count_tag(line, "<details>") as isize;
            depth -= count_tag(line, "</details>") as isize;
            html.push(line);
            pos += 1;
            if depth <= 0 {
                break;
            }
        }

        match self.html.split_details(&html.join("\n")) {
            Some((summary, body)) => {
                let toggle = Block::new(BlockKind::Toggle {
                    summary: self.codec.encode(&summary),
                })
                .with_children(self.parse(&body));
                (Some(toggle), pos)
            }
            None => {
                log::warn!("Dropping <details> without <summary> at line {}", start + 1);
                (None, pos)
            }
        }
    }

    fn image(&self, alt: &str, src: &str) -> Option<Block> {
        if src.starts_with("data:") {
            log::warn!("Skipping inline data image ({} bytes)", src.len());
            return None;
        }
        let source = AssetRef::local(src, &self.options.base_dir);
        let caption = if alt.is_empty() || FALLBACK_LABELS.contains(&alt) {
            Vec::new()
        } else {
            self.codec.encode(alt)
        };
        Some(Block::new(BlockKind::Image(
            Media::new(source).with_caption(caption),
        )))
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

/// `[▶ …](url)` / `[🔊 …](url)` lines: video for the big hosts, embed otherwise.
fn media_link(url: String) -> Block {
    let media = Media::new(AssetRef::url(url.clone()));
    let host = url::Url::parse(&url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();
    let is_video = VIDEO_EMBED_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{}", known)));
    if is_video {
        Block::new(BlockKind::Video(media))
    } else {
        Block::new(BlockKind::Embed(media))
    }
}

/// Attach a list item `depth` levels deep under the most recent list items.
///
/// When the chain of list items is shorter than `depth`, the item is placed
/// at the deepest level that exists.
fn attach_list_item(blocks: &mut Vec<Block>, depth: usize, item: Block) {
    if depth > 0 {
        if let Some(last) = blocks.last_mut() {
            if last.is_list_item() {
                attach_list_item(&mut last.children, depth - 1, item);
                return;
            }
        }
    }
    blocks.push(item);
}

/// Leading indentation in columns; a tab counts as two spaces.
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 2 } else { 1 })
        .sum()
}

fn todo_marker(body: &str) -> Option<(bool, &str)> {
    for (marker, checked) in [("- [ ]", false), ("- [x]", true), ("- [X]", true)] {
        if let Some(rest) = body.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(' ') {
                return Some((checked, rest));
            }
        }
    }
    None
}

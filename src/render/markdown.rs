//! Markdown rendering for block trees.

use crate::model::{is_http, plain_text, slugify, AssetRef, Block, BlockKind, Media, RichSpan};
use crate::richtext::decode_spans;
use regex::Regex;

use super::{RenderOptions, RenderResult, RenderStats};

/// URLs rendered as `[▶ …](url)` links instead of downloaded media.
pub const VIDEO_LINK_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "wistia.com",
    "dailymotion.com",
    "twitch.tv",
    "facebook.com/watch",
];

/// URLs rendered as `[🔊 …](url)` links instead of downloaded media.
pub const AUDIO_LINK_HOSTS: &[&str] = &[
    "soundcloud.com",
    "spotify.com",
    "podcasts.apple.com",
    "anchor.fm",
];

/// Icon shown for callouts whose icon is a workspace icon path.
const ICON_PATH_FALLBACK: &str = "\u{27A1}\u{FE0F}";

/// Turns an asset reference into the path or URL written in the Markdown.
pub trait AssetLocalizer {
    /// Resolve (and usually download) `asset`, returning what to link to.
    ///
    /// `block_id` is the owning block, needed to sign workspace files.
    fn localize(&mut self, asset: &AssetRef, block_id: Option<&str>) -> String;
}

/// Convert blocks to Markdown, linking assets at their original locators.
pub fn to_markdown(blocks: &[Block], options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(blocks)
}

/// Markdown renderer.
pub struct MarkdownRenderer<'a> {
    options: RenderOptions,
    localizer: Option<&'a mut dyn AssetLocalizer>,
    stats: RenderStats,
    blank_runs: Regex,
    /// Code bodies held back from blank-line collapsing, by marker index.
    verbatim: Vec<String>,
}

impl<'a> MarkdownRenderer<'a> {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            localizer: None,
            stats: RenderStats::new(),
            blank_runs: Regex::new(r"\n{3,}").unwrap(),
            verbatim: Vec::new(),
        }
    }

    /// Route media through `localizer` (downloads into the page directory).
    pub fn with_localizer(mut self, localizer: &'a mut dyn AssetLocalizer) -> Self {
        self.localizer = Some(localizer);
        self
    }

    /// Render blocks to Markdown.
    pub fn render(mut self, blocks: &[Block]) -> String {
        self.render_document(blocks)
    }

    /// Render blocks to Markdown with statistics.
    pub fn render_with_stats(mut self, blocks: &[Block]) -> RenderResult {
        let content = self.render_document(blocks);
        self.stats.count_text(&content);
        RenderResult::new(content, self.stats)
    }

    fn render_document(&mut self, blocks: &[Block]) -> String {
        let mut output = String::new();
        self.render_blocks(&mut output, blocks, 0);
        self.finish(&output)
    }

    /// Collapse blank-line runs and end with exactly one newline.
    ///
    /// Code bodies are swapped back in afterwards so they stay verbatim.
    fn finish(&mut self, raw: &str) -> String {
        let collapsed = self.blank_runs.replace_all(raw, "\n\n");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        let mut output = format!("{}\n", trimmed);
        for (index, body) in self.verbatim.drain(..).enumerate() {
            output = output.replacen(&verbatim_marker(index), &body, 1);
        }
        output
    }

    /// Placeholder for a code body; restored by [`Self::finish`].
    fn hold_verbatim(&mut self, body: &str) -> String {
        let marker = verbatim_marker(self.verbatim.len());
        self.verbatim.push(body.to_string());
        marker
    }

    fn render_blocks(&mut self, output: &mut String, blocks: &[Block], indent: usize) {
        for block in blocks {
            self.render_block(output, block, indent);
        }
    }

    fn render_block(&mut self, output: &mut String, block: &Block, indent: usize) {
        self.stats.add_block(block.type_name());

        match &block.kind {
            BlockKind::Heading { level, text } => {
                output.push('\n');
                output.push_str(&"#".repeat(*level as usize));
                output.push(' ');
                output.push_str(&self.text(text));
                output.push_str("\n\n");
            }
            BlockKind::Paragraph { text } => {
                output.push('\n');
                output.push_str(&self.text(text));
                output.push('\n');
            }
            BlockKind::BulletedItem { text } => self.list_item(output, indent, "- ", text),
            BlockKind::NumberedItem { text } => self.list_item(output, indent, "1. ", text),
            BlockKind::ToDo { text, checked } => {
                let marker = if checked.unwrap_or(false) {
                    "- [x] "
                } else {
                    "- [ ] "
                };
                self.list_item(output, indent, marker, text);
            }
            BlockKind::Quote { text } => {
                output.push_str("> ");
                output.push_str(&self.text(text));
                output.push_str("\n\n");
            }
            BlockKind::Callout { icon, text } => {
                self.render_callout(output, block, icon.as_deref(), text, indent);
                return;
            }
            BlockKind::Code { language, code } => {
                let language = if language == "plain text" {
                    ""
                } else {
                    language.as_str()
                };
                output.push_str("\n```");
                output.push_str(language);
                output.push('\n');
                let marker = self.hold_verbatim(code);
                output.push_str(&marker);
                output.push_str("\n```\n\n");
            }
            BlockKind::Divider => output.push_str("\n---\n\n"),
            BlockKind::Image(media) => self.embedded_media(output, block, media, "image"),
            BlockKind::File(media) => self.embedded_media(output, block, media, "file"),
            BlockKind::Video(media) => {
                self.streamed_media(output, block, media, VIDEO_LINK_HOSTS, "\u{25B6}", "Video")
            }
            BlockKind::Audio(media) => {
                self.streamed_media(output, block, media, AUDIO_LINK_HOSTS, "\u{1F50A}", "Audio")
            }
            BlockKind::Embed(media) => {
                let label = media_label(media).unwrap_or_else(|| "Embedded content".to_string());
                push_link_line(output, &label, &media.source.locator);
            }
            BlockKind::Bookmark { url, text } => {
                let label = plain_text(text);
                let label = if label.trim().is_empty() { url.clone() } else { label };
                push_link_line(output, &label, url);
            }
            BlockKind::Toggle { summary } => {
                output.push_str("\n<details>\n<summary>");
                output.push_str(&self.text(summary));
                output.push_str("</summary>\n\n");
                self.render_blocks(output, &block.children, indent);
                output.push_str("\n</details>\n\n");
                return;
            }
            BlockKind::ColumnList => {
                self.render_columns(output, block, indent);
                return;
            }
            BlockKind::Column => {
                self.render_blocks(output, &block.children, indent);
                return;
            }
            BlockKind::ChildPage { title, .. } => {
                let label = if title.trim().is_empty() {
                    "Untitled"
                } else {
                    title.as_str()
                };
                push_link_line(output, label, &format!("{}/index.md", slugify(title)));
            }
            BlockKind::LinkToPage { title, .. } => {
                let label = if title.trim().is_empty() {
                    "linked page"
                } else {
                    title.as_str()
                };
                push_link_line(output, label, &format!("{}/index.md", slugify(label)));
            }
            BlockKind::Unsupported { text, .. } => {
                let text = self.text(text);
                if !text.is_empty() {
                    output.push_str(&text);
                    output.push('\n');
                }
            }
        }

        let child_indent = if block.is_list_item() { indent + 1 } else { indent };
        self.render_blocks(output, &block.children, child_indent);
    }

    fn text(&self, spans: &[RichSpan]) -> String {
        decode_spans(spans, self.options.html_colors)
    }

    fn list_item(
        &mut self,
        output: &mut String,
        indent: usize,
        marker: &str,
        text: &[RichSpan],
    ) {
        output.push_str(&self.options.list_indent.repeat(indent));
        output.push_str(marker);
        output.push_str(&self.text(text));
        output.push('\n');
    }

    fn render_callout(
        &mut self,
        output: &mut String,
        block: &Block,
        icon: Option<&str>,
        text: &[RichSpan],
        indent: usize,
    ) {
        let icon = match icon {
            Some(path) if path.starts_with("/icons/") => ICON_PATH_FALLBACK.to_string(),
            Some(value) if !value.trim().is_empty() && !is_http(value) => {
                value.to_string()
            }
            _ => self.options.callout_icon.clone(),
        };

        let mut line = self.text(text);
        let mut children = block.children.as_slice();
        if line.trim().is_empty() {
            if let Some((first, rest)) = children.split_first() {
                // Only text-bearing children can move onto the callout line.
                if let Some(text) = first.text() {
                    line = self.text(text);
                    children = rest;
                }
            }
        }

        output.push_str("> ");
        output.push_str(&icon);
        let line = line.trim();
        if !line.is_empty() {
            output.push(' ');
            output.push_str(line);
        }
        output.push_str("\n\n");
        self.render_blocks(output, children, indent);
    }

    fn render_columns(&mut self, output: &mut String, block: &Block, indent: usize) {
        let columns: Vec<&Block> = block
            .children
            .iter()
            .filter(|column| !column.children.is_empty())
            .collect();

        match columns.as_slice() {
            [] => {}
            [only] => self.render_blocks(output, &only.children, indent),
            many => {
                output.push_str("\n<table><tr>\n");
                for column in many {
                    self.stats.add_block(column.type_name());
                    let mut cell = String::new();
                    self.render_blocks(&mut cell, &column.children, 0);
                    let cell = self.blank_runs.replace_all(&cell, "\n\n");
                    output.push_str("<td valign=\"top\">\n\n");
                    output.push_str(cell.trim());
                    output.push_str("\n\n</td>\n");
                }
                output.push_str("</tr></table>\n\n");
            }
        }
    }

    /// Images and files: always localized.
    fn embedded_media(&mut self, output: &mut String, block: &Block, media: &Media, kind: &str) {
        let label = if media.caption.is_empty() {
            kind.to_string()
        } else {
            plain_text(&media.caption)
        };
        let target = self.localize(&media.source, block.id.as_deref());
        output.push_str(&format!("\n![{}]({})\n\n", label, target));
    }

    /// Video and audio: well-known hosts stay links, the rest is localized.
    fn streamed_media(
        &mut self,
        output: &mut String,
        block: &Block,
        media: &Media,
        hosts: &[&str],
        glyph: &str,
        fallback: &str,
    ) {
        let locator = &media.source.locator;
        let lower = locator.to_lowercase();
        if hosts.iter().any(|host| lower.contains(host)) {
            let label = media_label(media).unwrap_or_else(|| fallback.to_string());
            push_link_line(output, &format!("{} {}", glyph, label), locator);
            return;
        }

        let label = media_label(media).unwrap_or_else(|| fallback.to_lowercase());
        let target = self.localize(&media.source, block.id.as_deref());
        output.push_str(&format!("\n![{}]({})\n\n", label, target));
    }

    fn localize(&mut self, asset: &AssetRef, block_id: Option<&str>) -> String {
        self.stats.add_asset();
        match self.localizer.as_mut() {
            Some(localizer) => localizer.localize(asset, block_id),
            None => asset.locator.clone(),
        }
    }
}

/// Link title, then caption, for embeds and streamed media.
fn media_label(media: &Media) -> Option<String> {
    media
        .link_title
        .as_ref()
        .filter(|title| !title.trim().is_empty())
        .cloned()
        .or_else(|| {
            let caption = plain_text(&media.caption);
            (!caption.trim().is_empty()).then_some(caption)
        })
}

fn verbatim_marker(index: usize) -> String {
    format!("\u{E000}{}\u{E001}", index)
}

fn push_link_line(output: &mut String, label: &str, target: &str) {
    output.push_str(&format!("\n[{}]({})\n\n", label, target));
}

//! Markdown parsing module.

mod html;
mod markdown;
mod options;

pub use markdown::{BlockParser, VIDEO_EMBED_HOSTS};
pub use options::{normalize_language, ParseOptions, CALLOUT_ICONS};

use crate::model::Block;

/// Parse Markdown with default options.
pub fn parse_markdown(markdown: &str) -> Vec<Block> {
    BlockParser::default().parse(markdown)
}

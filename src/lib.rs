//! # notionmd
//!
//! Bidirectional conversion between Notion pages and directories of Markdown.
//!
//! A page tree exports to one directory per page, each holding an `index.md`
//! and an `assets/` folder; the same layout imports back as pages.
//!
//! ## Quick Start
//!
//! ```no_run
//! use notionmd::convert::{ExportOptions, Exporter};
//! use notionmd::remote::{ClientConfig, PublicApiClient};
//!
//! fn main() -> notionmd::Result<()> {
//!     let client = PublicApiClient::new(ClientConfig::new())?;
//!     let mut exporter = Exporter::new(&client, ExportOptions::new());
//!     exporter.export_tree("1a2b3c4d5e6f78901a2b3c4d5e6f7890")?;
//!     Ok(())
//! }
//! ```
//!
//! Offline, Markdown and block trees convert directly:
//!
//! ```
//! let blocks = notionmd::parse_markdown("# Title\n\n- one\n- two\n");
//! assert_eq!(blocks.len(), 3);
//! let markdown = notionmd::to_markdown(&blocks);
//! assert_eq!(markdown, "# Title\n\n- one\n- two\n");
//! ```
//!
//! ## Features
//!
//! - **Inline formatting**: bold, italic, strikethrough, code, links and colors
//! - **Block structure**: lists, to-dos, callouts, toggles, columns, code, media
//! - **Page trees**: sub-pages nest, database members export flat, no page twice
//! - **Assets**: workspace files are signed, downloaded and named by hash
//! - **Import**: parents before children, chunked creation, asset upload

pub mod asset;
pub mod convert;
pub mod error;
pub mod model;
pub mod parser;
pub mod remote;
pub mod render;
pub mod richtext;

// Re-export commonly used types
pub use convert::{ExportOptions, ExportSummary, Exporter, ImportOptions, ImportSummary, Importer};
pub use error::{Error, Result};
pub use model::{
    AssetRef, AssetSource, Block, BlockKind, ChildRef, Color, Media, PageId, PageRecord, RichSpan,
};
pub use parser::{BlockParser, ParseOptions};
pub use render::{JsonFormat, MarkdownRenderer, RenderOptions};
pub use richtext::RichTextCodec;

use std::path::Path;

/// Parse Markdown into blocks with default options.
pub fn parse_markdown(markdown: &str) -> Vec<Block> {
    parser::parse_markdown(markdown)
}

/// Parse a Markdown file; relative asset paths resolve against its directory.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Block>> {
    let path = path.as_ref();
    let markdown = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let parser = BlockParser::new(ParseOptions::new().with_base_dir(base_dir));
    Ok(parser.parse(&markdown))
}

/// Render blocks to Markdown with default options.
pub fn to_markdown(blocks: &[Block]) -> String {
    render::to_markdown(blocks, &RenderOptions::default())
}

/// Render blocks to Markdown with custom options.
pub fn to_markdown_with_options(blocks: &[Block], options: &RenderOptions) -> String {
    render::to_markdown(blocks, options)
}

/// Serialize blocks to JSON.
pub fn to_json(blocks: &[Block], format: JsonFormat) -> Result<String> {
    render::to_json(blocks, format)
}

/// Load blocks from JSON written by [`to_json`].
pub fn from_json(json: &str) -> Result<Vec<Block>> {
    render::from_json(json)
}

//! Document model types shared by both conversion directions.
//!
//! This module defines the intermediate representation that sits between
//! Markdown on disk and Notion's record maps / API payloads. Blocks form an
//! owned tree; pages reference each other only through [`PageId`]s.

mod asset;
mod block;
mod page;
mod rich_text;

pub use asset::{is_http, parse_attachment, AssetRef, AssetSource, ATTACHMENT_SCHEME};
pub use block::{Block, BlockKind, Media};
pub use page::{slugify, ChildRef, PageId, PageRecord};
pub use rich_text::{plain_text, Annotations, Color, RichSpan};

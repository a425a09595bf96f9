//! Remote workspace access.
//!
//! Two seams separate the conversion logic from HTTP:
//!
//! - [`PageSource`]: the read side (public page data, signed file URLs,
//!   downloads), implemented by [`PublicApiClient`].
//! - [`PageSink`]: the write side (page creation, block append), implemented
//!   by [`IntegrationClient`].
//!
//! Both are plain blocking traits; calls are made one at a time and each
//! client waits a fixed delay after every request.

mod assembler;
mod client;
mod integration;
mod record;

pub use assembler::{
    RecordMapAssembler, DEFAULT_CHUNK_LIMIT, DEFAULT_COLLECTION_LIMIT, MAX_CHUNKS,
};
pub use client::{ClientConfig, PublicApiClient, DEFAULT_EXPORT_DELAY, PUBLIC_API_BASE};
pub use integration::{
    block_payload, page_payload, rich_text_payload, IntegrationClient, IntegrationConfig,
    DEFAULT_IMPORT_DELAY, INTEGRATION_API_BASE, MAX_CHILDREN_PER_REQUEST, MAX_TEXT_LENGTH,
    NOTION_VERSION,
};
pub use record::{
    build_page, decode_rich_text, plain_rich_text, MentionResolver, NoMentions, RecordBlock,
    RecordMap,
};

use crate::error::Result;
use crate::model::{Block, PageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Read access to a workspace.
pub trait PageSource {
    /// Fetch one chunk of a page's record map.
    fn load_page_chunk(&self, request: &ChunkRequest) -> Result<ChunkResponse>;

    /// Ordered member page ids of a database view.
    fn query_collection(
        &self,
        collection_id: &str,
        view_id: &str,
        limit: usize,
    ) -> Result<Vec<String>>;

    /// Exchange file URLs for signed, fetchable URLs.
    ///
    /// The result has one entry per request; `None` where the service
    /// returned nothing usable.
    fn sign_urls(&self, requests: &[SignRequest]) -> Result<Vec<Option<String>>>;

    /// Download the bytes behind a URL.
    fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Fetch a web page as text (used to find ids behind custom domains).
    fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Write access to a workspace.
pub trait PageSink {
    /// Create a page, returning its id.
    ///
    /// Callers keep `children` within [`MAX_CHILDREN_PER_REQUEST`].
    fn create_page(&self, page: &NewPage) -> Result<String>;

    /// Append blocks under an existing block or page.
    fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()>;
}

/// Page creation request.
#[derive(Debug, Clone)]
pub struct NewPage {
    /// Parent page
    pub parent: PageId,

    /// Page title
    pub title: String,

    /// External cover image
    pub cover_url: Option<String>,

    /// Initial content
    pub children: Vec<Block>,
}

/// Pagination cursor returned by `loadPageChunk`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub stack: Vec<Value>,
}

/// Pointer to a page by id.
#[derive(Debug, Clone, Serialize)]
pub struct PagePointer {
    pub id: String,
}

/// Body of a `loadPageChunk` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRequest {
    pub page: PagePointer,
    pub limit: usize,
    pub cursor: Cursor,
    pub chunk_number: usize,
    pub vertical_columns: bool,
}

impl ChunkRequest {
    /// First-chunk request for a page.
    pub fn first(page_id: &PageId, limit: usize) -> Self {
        Self {
            page: PagePointer {
                id: page_id.as_str().to_string(),
            },
            limit,
            cursor: Cursor::default(),
            chunk_number: 0,
            vertical_columns: false,
        }
    }
}

/// Response of a `loadPageChunk` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkResponse {
    #[serde(default, rename = "recordMap")]
    pub record_map: ChunkRecords,

    #[serde(default)]
    pub cursor: Option<Cursor>,
}

/// The record tables of one chunk; only blocks are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkRecords {
    #[serde(default)]
    pub block: Option<HashMap<String, Value>>,
}

impl ChunkResponse {
    /// Chunk carrying the given raw block entries and cursor.
    pub fn new(blocks: HashMap<String, Value>, cursor: Option<Cursor>) -> Self {
        Self {
            record_map: ChunkRecords {
                block: Some(blocks),
            },
            cursor,
        }
    }

    /// Raw block entries of this chunk.
    pub fn blocks(&self) -> Option<&HashMap<String, Value>> {
        self.record_map.block.as_ref()
    }
}

/// One URL to sign, with the block that owns the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub url: String,
    pub block_id: String,
}

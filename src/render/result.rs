//! Rendering result with statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of rendering a block tree, including content and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered Markdown
    pub content: String,

    /// Rendering statistics
    pub stats: RenderStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, stats: RenderStats) -> Self {
        Self { content, stats }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Statistics collected while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Blocks rendered, keyed by Notion block type
    pub blocks: BTreeMap<String, u32>,

    /// Assets handed to the localizer
    pub asset_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one block of the given type.
    pub fn add_block(&mut self, type_name: &str) {
        *self.blocks.entry(type_name.to_string()).or_insert(0) += 1;
    }

    /// Count one localized asset.
    pub fn add_asset(&mut self) {
        self.asset_count += 1;
    }

    /// Total number of blocks rendered.
    pub fn block_count(&self) -> u32 {
        self.blocks.values().sum()
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        for (kind, count) in &other.blocks {
            *self.blocks.entry(kind.clone()).or_insert(0) += count;
        }
        self.asset_count += other.asset_count;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
    }
}

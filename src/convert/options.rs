//! Options for the export and import orchestrators.

use crate::asset::{ObjectStore, Uploader, DEFAULT_KEY_PREFIX};
use crate::error::Result;
use crate::model::PageId;
use crate::remote::{ClientConfig, IntegrationConfig, RecordMapAssembler};
use crate::render::RenderOptions;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Options for exporting a page tree to disk.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory the root page's directory is created in
    pub output_dir: PathBuf,

    /// Pause after every remote call
    pub delay: Duration,

    /// Titles of pages that are not exported
    pub skip_titles: HashSet<String>,

    /// Records requested per chunk
    pub chunk_limit: usize,

    /// Members requested per database view
    pub collection_limit: usize,

    /// Markdown rendering options
    pub render: RenderOptions,
}

impl ExportOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the per-call delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Skip pages with this title.
    pub fn skip_title(mut self, title: impl Into<String>) -> Self {
        self.skip_titles.insert(title.into());
        self
    }

    /// Set the per-chunk record limit.
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = limit;
        self
    }

    /// Set the database member limit.
    pub fn with_collection_limit(mut self, limit: usize) -> Self {
        self.collection_limit = limit;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Assembler configured from these options.
    pub fn assembler(&self) -> RecordMapAssembler {
        RecordMapAssembler::new()
            .with_chunk_limit(self.chunk_limit)
            .with_collection_limit(self.collection_limit)
    }

    /// Public API client settings carrying this export's delay.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new().with_delay(self.delay)
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("notion_export"),
            delay: crate::remote::DEFAULT_EXPORT_DELAY,
            skip_titles: HashSet::new(),
            chunk_limit: crate::remote::DEFAULT_CHUNK_LIMIT,
            collection_limit: crate::remote::DEFAULT_COLLECTION_LIMIT,
            render: RenderOptions::default(),
        }
    }
}

/// Options for importing a directory tree as pages.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Page the imported tree is created under
    pub root_parent: PageId,

    /// Pause after every remote call
    pub delay: Duration,

    /// Blocks per create or append call
    pub chunk_size: usize,

    /// Prefix of uploaded asset keys
    pub key_prefix: String,
}

impl ImportOptions {
    /// Options for importing under `root_parent`.
    pub fn new(root_parent: PageId) -> Self {
        Self {
            root_parent,
            delay: crate::remote::DEFAULT_IMPORT_DELAY,
            chunk_size: crate::remote::MAX_CHILDREN_PER_REQUEST,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Set the per-call delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the blocks per call, capped at the API maximum.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.clamp(1, crate::remote::MAX_CHILDREN_PER_REQUEST);
        self
    }

    /// Set the upload key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Integration client settings carrying this import's delay.
    pub fn integration_config(&self, token: impl Into<String>) -> IntegrationConfig {
        IntegrationConfig::new(token).with_delay(self.delay)
    }

    /// Uploader writing to `store` under this import's key prefix.
    pub fn uploader<'a>(
        &self,
        store: &'a dyn ObjectStore,
        public_url: Option<&str>,
    ) -> Result<Uploader<'a>> {
        Uploader::new(store, public_url, self.key_prefix.clone())
    }
}

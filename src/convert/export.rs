//! Export a page tree to a directory of Markdown files.

use super::page_file::{PageFile, INDEX_FILE};
use super::ExportOptions;
use crate::asset::AssetResolver;
use crate::error::{Error, Result};
use crate::model::{is_http, ChildRef, PageId};
use crate::remote::{
    build_page, ChunkRequest, MentionResolver, PageSource, RecordMap, RecordMapAssembler,
};
use crate::render::{MarkdownRenderer, RenderStats};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Directory of every page written, in export order
    pub pages: Vec<PathBuf>,

    /// Pages left out because of their title
    pub skipped: usize,

    /// Pages that could not be fetched or written
    pub failed: usize,

    /// Assets downloaded
    pub downloaded: usize,

    /// Assets found on disk and reused
    pub reused: usize,

    /// Content statistics over all pages
    pub stats: RenderStats,
}

/// Walks a page tree and writes one `index.md` per page.
///
/// Each page is processed at most once per exporter, whether it is reached as
/// a sub-page or as a database member.
pub struct Exporter<'a> {
    source: &'a dyn PageSource,
    options: ExportOptions,
    assembler: RecordMapAssembler,
    visited: HashSet<PageId>,
    titles: HashMap<String, String>,
    assets: AssetResolver,
    summary: ExportSummary,
}

impl<'a> Exporter<'a> {
    /// Create an exporter reading from `source`.
    pub fn new(source: &'a dyn PageSource, options: ExportOptions) -> Self {
        let assembler = options.assembler();
        Self {
            source,
            options,
            assembler,
            visited: HashSet::new(),
            titles: HashMap::new(),
            assets: AssetResolver::new(),
            summary: ExportSummary::default(),
        }
    }

    /// Find the page id in a raw id or URL.
    ///
    /// URLs without an embedded id (custom domains) are fetched and the id
    /// is searched for in the returned HTML.
    pub fn resolve_id(&self, input: &str) -> Result<PageId> {
        if let Some(id) = PageId::find(input) {
            return Ok(id);
        }
        if !is_http(input) {
            return Err(Error::InvalidId(input.to_string()));
        }
        log::debug!("No id in '{}', searching the page HTML", input);
        let html = self.source.fetch_html(input)?;
        PageId::find_in_html(&html).ok_or_else(|| Error::InvalidId(input.to_string()))
    }

    /// Export the tree rooted at `root` (an id or URL) into the output directory.
    ///
    /// Returns the root page's directory, or `None` if the root was skipped.
    pub fn export_tree(&mut self, root: &str) -> Result<Option<PathBuf>> {
        let root_id = self.resolve_id(root)?;
        let output_dir = self.options.output_dir.clone();
        fs::create_dir_all(&output_dir)?;
        log::info!("Exporting {} into {}", root_id, output_dir.display());
        let dir = self.export_page(&root_id, &output_dir)?;
        self.summary.downloaded = self.assets.downloaded();
        self.summary.reused = self.assets.reused();
        Ok(dir)
    }

    /// Export one page under `parent_dir`, then the pages it references.
    ///
    /// Returns `None` for pages already visited or skipped by title.
    pub fn export_page(&mut self, id: &PageId, parent_dir: &Path) -> Result<Option<PathBuf>> {
        if !self.visited.insert(id.clone()) {
            log::debug!("Already exported {}", id);
            return Ok(None);
        }

        let map = self.assembler.fetch(self.source, id)?;
        let mut lookup = TitleLookup {
            source: self.source,
            chunk_limit: self.options.chunk_limit,
            titles: &mut self.titles,
        };
        let record = build_page(id, &map, &mut lookup)?;
        self.titles
            .insert(id.as_str().to_string(), record.title.clone());

        if self.options.skip_titles.contains(&record.title) {
            log::info!("Skipping '{}'", record.title);
            self.summary.skipped += 1;
            return Ok(None);
        }

        let page_dir = parent_dir.join(record.slug());
        fs::create_dir_all(&page_dir)?;
        log::info!("Writing '{}' to {}", record.title, page_dir.display());

        let rendered = {
            let mut assets =
                self.assets
                    .for_page(self.source, &page_dir, record.space_id.as_deref());
            MarkdownRenderer::new(self.options.render.clone())
                .with_localizer(&mut assets)
                .render_with_stats(&record.blocks)
        };
        let cover = record.cover.as_ref().map(|c| c.locator.as_str());
        fs::write(
            page_dir.join(INDEX_FILE),
            PageFile::render(&record.title, cover, &rendered.content),
        )?;
        self.summary.stats.merge(&rendered.stats);
        self.summary.pages.push(page_dir.clone());

        self.export_children(&record.children, &page_dir);
        Ok(Some(page_dir))
    }

    fn export_children(&mut self, children: &[ChildRef], page_dir: &Path) {
        for child in children {
            match child {
                ChildRef::Page { id } => self.export_logged(id, page_dir),
                ChildRef::Collection {
                    collection_id,
                    view_id,
                } => {
                    let members =
                        self.assembler
                            .collection_members(self.source, collection_id, view_id);
                    log::debug!("Database {} has {} pages", collection_id, members.len());
                    let top = self.options.output_dir.clone();
                    for member in &members {
                        self.export_logged(member, &top);
                    }
                }
                ChildRef::Link { id } => log::debug!("Not following link to {}", id),
            }
        }
    }

    fn export_logged(&mut self, id: &PageId, parent_dir: &Path) {
        if let Err(e) = self.export_page(id, parent_dir) {
            log::warn!("Could not export {}: {}", id, e);
            self.summary.failed += 1;
        }
    }

    /// Whether a page has been visited.
    pub fn is_visited(&self, id: &PageId) -> bool {
        self.visited.contains(id)
    }

    /// Summary of the work done so far.
    pub fn summary(&self) -> &ExportSummary {
        &self.summary
    }

    /// Consume the exporter, returning its summary.
    pub fn into_summary(mut self) -> ExportSummary {
        self.summary.downloaded = self.assets.downloaded();
        self.summary.reused = self.assets.reused();
        self.summary
    }
}

/// Resolves mention titles from the title cache, fetching on a miss.
struct TitleLookup<'s> {
    source: &'s dyn PageSource,
    chunk_limit: usize,
    titles: &'s mut HashMap<String, String>,
}

impl MentionResolver for TitleLookup<'_> {
    fn page_title(&mut self, page_id: &str) -> Option<String> {
        let id = PageId::find(page_id)?;
        if let Some(title) = self.titles.get(id.as_str()) {
            return Some(title.clone());
        }

        let response = match self
            .source
            .load_page_chunk(&ChunkRequest::first(&id, self.chunk_limit))
        {
            Ok(response) => response,
            Err(e) => {
                log::debug!("Could not fetch title of {}: {}", id, e);
                return None;
            }
        };
        let mut map = RecordMap::new();
        if let Some(blocks) = response.blocks() {
            map.merge_chunk(blocks);
        }
        let title = map.get(id.as_str())?.title();
        if title.trim().is_empty() {
            return None;
        }
        self.titles.insert(id.as_str().to_string(), title.clone());
        Some(title)
    }
}

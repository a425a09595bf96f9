//! Import a directory of Markdown files as a page tree.

use super::page_file::{PageFile, INDEX_FILE};
use super::ImportOptions;
use crate::asset::Uploader;
use crate::error::{Error, Result};
use crate::model::{is_http, Block, PageId};
use crate::parser::{BlockParser, ParseOptions};
use crate::remote::{NewPage, PageSink};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Created pages: directory relative to the input, and new page id
    pub created: Vec<(PathBuf, String)>,

    /// Directories whose page could not be created
    pub failed: Vec<PathBuf>,

    /// Assets uploaded
    pub uploaded: usize,
}

/// A page read from disk, ready to send.
#[derive(Debug, Clone)]
pub struct LocalPage {
    /// Page title
    pub title: String,

    /// Cover URL, when the file had an http cover line
    pub cover: Option<String>,

    /// Parsed content
    pub blocks: Vec<Block>,
}

/// One `index.md` found under the input directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredPage {
    /// Number of directories between the input root and the page
    pub depth: usize,

    /// Page directory relative to the input root (empty for the root page)
    pub relative: PathBuf,

    /// Path of the `index.md`
    pub file: PathBuf,
}

/// Creates pages through a [`PageSink`], parents before children.
pub struct Importer<'a> {
    sink: &'a dyn PageSink,
    options: ImportOptions,
    parse: ParseOptions,
    uploader: Option<Uploader<'a>>,
    created: HashMap<PathBuf, String>,
}

impl<'a> Importer<'a> {
    /// Create an importer writing to `sink`.
    pub fn new(sink: &'a dyn PageSink, options: ImportOptions) -> Self {
        Self {
            sink,
            options,
            parse: ParseOptions::default(),
            uploader: None,
            created: HashMap::new(),
        }
    }

    /// Upload local assets through `uploader` before creating pages.
    pub fn with_uploader(mut self, uploader: Uploader<'a>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Set Markdown parsing options (the base directory is set per page).
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Import every `index.md` under `input_dir`.
    ///
    /// Shallower pages are created first so each page can find its parent's
    /// new id; a page whose parent was not created goes under the root
    /// parent. Failed pages are logged and skipped.
    pub fn import_directory(&mut self, input_dir: &Path) -> Result<ImportSummary> {
        let pages = discover_pages(input_dir)?;
        log::info!("Found {} pages under {}", pages.len(), input_dir.display());

        let mut summary = ImportSummary::default();
        for page in pages {
            let parent = self.parent_for(&page);
            match self.import_file(&page.file, &parent, &mut summary.uploaded) {
                Ok(id) => {
                    self.created.insert(page.relative.clone(), id.clone());
                    summary.created.push((page.relative, id));
                }
                Err(e) => {
                    log::warn!("Could not import {}: {}", page.file.display(), e);
                    summary.failed.push(page.relative);
                }
            }
        }
        Ok(summary)
    }

    /// Import one Markdown file directly under the root parent.
    pub fn import_single_page(&mut self, file: &Path) -> Result<String> {
        let parent = self.options.root_parent.clone();
        let mut uploaded = 0;
        self.import_file(file, &parent, &mut uploaded)
    }

    /// Read and parse a page file, uploading its local assets.
    pub fn load(&mut self, file: &Path) -> Result<(LocalPage, usize)> {
        let content = fs::read_to_string(file)?;
        let page_file = PageFile::parse(&content);
        let title = page_file.title_or_fallback(file);

        let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
        let parser = BlockParser::new(self.parse.clone().with_base_dir(base_dir));
        let mut blocks = parser.parse(&page_file.body);

        let uploaded = match self.uploader.as_mut() {
            Some(uploader) => uploader.upload_blocks(&mut blocks),
            None => 0,
        };

        let cover = page_file.cover.filter(|c| is_http(c));
        Ok((
            LocalPage {
                title,
                cover,
                blocks,
            },
            uploaded,
        ))
    }

    fn import_file(&mut self, file: &Path, parent: &PageId, uploaded: &mut usize) -> Result<String> {
        let (page, count) = self.load(file)?;
        *uploaded += count;
        log::info!("Creating '{}' ({} blocks)", page.title, page.blocks.len());
        self.create(parent, page)
    }

    /// Create a page, sending content in chunks of the configured size.
    ///
    /// Once the page exists, a failed append is logged and the remaining
    /// content is dropped; the page id is still returned.
    pub fn create(&self, parent: &PageId, page: LocalPage) -> Result<String> {
        let size = self.options.chunk_size.max(1);
        let mut chunks = page.blocks.chunks(size);
        let first = chunks.next().map(<[Block]>::to_vec).unwrap_or_default();

        let id = self.sink.create_page(&NewPage {
            parent: parent.clone(),
            title: page.title.clone(),
            cover_url: page.cover,
            children: first,
        })?;

        for (n, chunk) in chunks.enumerate() {
            log::debug!("Appending chunk {} ({} blocks) to {}", n + 1, chunk.len(), id);
            if let Err(e) = self.sink.append_children(&id, chunk) {
                log::warn!("Content of '{}' truncated: {}", page.title, e);
                break;
            }
        }
        Ok(id)
    }

    fn parent_for(&self, page: &DiscoveredPage) -> PageId {
        if page.depth == 0 {
            return self.options.root_parent.clone();
        }
        let parent_key = page.relative.parent().unwrap_or_else(|| Path::new(""));
        match self.created.get(parent_key).and_then(|id| PageId::find(id)) {
            Some(id) => id,
            None => {
                log::debug!(
                    "No created parent for {}; using the root parent",
                    page.relative.display()
                );
                self.options.root_parent.clone()
            }
        }
    }

    /// Ids created so far, keyed by relative directory.
    pub fn created(&self) -> &HashMap<PathBuf, String> {
        &self.created
    }
}

/// Every `index.md` under `input_dir`, shallowest first.
pub fn discover_pages(input_dir: &Path) -> Result<Vec<DiscoveredPage>> {
    let root = glob::Pattern::escape(&input_dir.to_string_lossy());
    let pattern = format!("{}/**/{}", root.trim_end_matches('/'), INDEX_FILE);
    let entries =
        glob::glob(&pattern).map_err(|e| Error::Other(format!("Bad input path: {}", e)))?;

    let mut pages = Vec::new();
    for entry in entries {
        let file = match entry {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        let dir = file.parent().unwrap_or(input_dir);
        let relative = dir.strip_prefix(input_dir).unwrap_or(dir).to_path_buf();
        pages.push(DiscoveredPage {
            depth: relative.components().count(),
            relative,
            file,
        });
    }
    pages.sort();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_orders_by_depth() {
        let dir = TempDir::new().unwrap();
        for sub in ["b/c", "a", ""] {
            let page_dir = dir.path().join(sub);
            fs::create_dir_all(&page_dir).unwrap();
            fs::write(page_dir.join(INDEX_FILE), "# x\n").unwrap();
        }
        fs::write(dir.path().join("a/notes.md"), "ignored").unwrap();

        let pages = discover_pages(dir.path()).unwrap();
        let relative: Vec<_> = pages.iter().map(|p| p.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::new(), PathBuf::from("a"), PathBuf::from("b/c")]
        );
        assert_eq!(pages[2].depth, 2);
    }
}

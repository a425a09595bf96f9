//! Whole-tree conversion in both directions.
//!
//! [`Exporter`] walks a workspace page tree through a [`PageSource`] and
//! writes one directory per page; [`Importer`] reads such a tree back and
//! creates pages through a [`PageSink`].
//!
//! # Example
//!
//! ```no_run
//! use notionmd::convert::{ExportOptions, Exporter};
//! use notionmd::remote::{ClientConfig, PublicApiClient};
//!
//! fn main() -> notionmd::Result<()> {
//!     let client = PublicApiClient::new(ClientConfig::new())?;
//!     let options = ExportOptions::new().with_output_dir("export");
//!     let mut exporter = Exporter::new(&client, options);
//!     exporter.export_tree("https://www.notion.so/My-Page-1a2b3c4d5e6f78901a2b3c4d5e6f7890")?;
//!     println!("{} pages", exporter.summary().pages.len());
//!     Ok(())
//! }
//! ```
//!
//! [`PageSource`]: crate::remote::PageSource
//! [`PageSink`]: crate::remote::PageSink

mod export;
mod import;
mod options;
mod page_file;

pub use export::{ExportSummary, Exporter};
pub use import::{discover_pages, DiscoveredPage, ImportSummary, Importer, LocalPage};
pub use options::{ExportOptions, ImportOptions};
pub use page_file::{title_from_path, PageFile, INDEX_FILE};

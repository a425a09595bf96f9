//! Integration tests for importing a Markdown tree as pages.

use notionmd::asset::{MemoryObjectStore, Uploader};
use notionmd::convert::{ImportOptions, Importer, INDEX_FILE};
use notionmd::error::{Error, Result};
use notionmd::remote::{NewPage, PageSink};
use notionmd::{AssetSource, Block, BlockKind, PageId};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ROOT_PARENT: &str = "99999999-9999-9999-9999-999999999999";

/// Records every call and hands out sequential page ids.
#[derive(Default)]
struct MockSink {
    created: RefCell<Vec<NewPage>>,
    appended: RefCell<Vec<(String, usize)>>,
    fail_titles: Vec<String>,
    fail_appends: bool,
}

impl MockSink {
    fn id_for(n: usize) -> String {
        format!("00000000-0000-0000-0000-{:012}", n + 1)
    }

    fn parent_of(&self, title: &str) -> String {
        self.created
            .borrow()
            .iter()
            .find(|p| p.title == title)
            .map(|p| p.parent.as_str().to_string())
            .unwrap()
    }
}

impl PageSink for MockSink {
    fn create_page(&self, page: &NewPage) -> Result<String> {
        if self.fail_titles.contains(&page.title) {
            return Err(Error::api("/pages", 400, "validation failed"));
        }
        let mut created = self.created.borrow_mut();
        let id = Self::id_for(created.len());
        created.push(page.clone());
        Ok(id)
    }

    fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        if self.fail_appends {
            return Err(Error::api("/blocks", 502, "bad gateway"));
        }
        self.appended
            .borrow_mut()
            .push((block_id.to_string(), children.len()));
        Ok(())
    }
}

fn root_parent() -> PageId {
    PageId::parse(ROOT_PARENT).unwrap()
}

fn write_page(root: &Path, dir: &str, content: &str) -> PathBuf {
    let page_dir = root.join(dir);
    fs::create_dir_all(&page_dir).unwrap();
    let file = page_dir.join(INDEX_FILE);
    fs::write(&file, content).unwrap();
    file
}

fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_page(dir.path(), "", "# Handbook\n\nWelcome.\n");
    write_page(dir.path(), "guides", "# Guides\n\n- one\n- two\n");
    write_page(dir.path(), "guides/setup", "# Setup\n\nInstall it.\n");
    write_page(dir.path(), "faq", "No heading here.\n");
    dir
}

#[test]
fn test_parents_created_before_children() {
    let dir = tree();
    let sink = MockSink::default();
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    let summary = importer.import_directory(dir.path()).unwrap();

    assert_eq!(summary.created.len(), 4);
    assert!(summary.failed.is_empty());

    let titles: Vec<_> = sink.created.borrow().iter().map(|p| p.title.clone()).collect();
    assert_eq!(titles[0], "Handbook");
    assert_eq!(titles[3], "Setup");

    let handbook = PageId::parse(&MockSink::id_for(0)).unwrap();
    assert_eq!(sink.parent_of("Handbook"), ROOT_PARENT);
    assert_eq!(sink.parent_of("Guides"), handbook.as_str());
    assert_eq!(sink.parent_of("Faq"), handbook.as_str());

    let guides_id = &importer.created()[Path::new("guides")];
    assert_eq!(
        sink.parent_of("Setup"),
        PageId::parse(guides_id).unwrap().as_str()
    );
}

#[test]
fn test_title_from_heading_or_directory() {
    let dir = tree();
    let sink = MockSink::default();
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    importer.import_directory(dir.path()).unwrap();

    let created = sink.created.borrow();
    let guides = created.iter().find(|p| p.title == "Guides").unwrap();
    // The title heading is not repeated in the content.
    assert_eq!(guides.children.len(), 2);
    assert!(guides
        .children
        .iter()
        .all(|b| matches!(b.kind, BlockKind::BulletedItem { .. })));

    let faq = created.iter().find(|p| p.title == "Faq").unwrap();
    assert_eq!(faq.children.len(), 1);
}

#[test]
fn test_failed_parent_falls_back_to_root() {
    let dir = tree();
    let sink = MockSink {
        fail_titles: vec!["Guides".to_string()],
        ..MockSink::default()
    };
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    let summary = importer.import_directory(dir.path()).unwrap();

    assert_eq!(summary.created.len(), 3);
    assert_eq!(summary.failed, vec![PathBuf::from("guides")]);
    assert_eq!(sink.parent_of("Setup"), ROOT_PARENT);
}

#[test]
fn test_long_pages_are_chunked() {
    let dir = TempDir::new().unwrap();
    let body: String = (1..=150).map(|n| format!("- item {}\n", n)).collect();
    let file = write_page(dir.path(), "long", &format!("# Long\n\n{}", body));

    let sink = MockSink::default();
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    let id = importer.import_single_page(&file).unwrap();

    assert_eq!(sink.created.borrow()[0].children.len(), 100);
    assert_eq!(*sink.appended.borrow(), vec![(id, 50)]);
}

#[test]
fn test_custom_chunk_size() {
    let dir = TempDir::new().unwrap();
    let body: String = (1..=5).map(|n| format!("- item {}\n", n)).collect();
    let file = write_page(dir.path(), "", &body);

    let sink = MockSink::default();
    let options = ImportOptions::new(root_parent()).with_chunk_size(2);
    let mut importer = Importer::new(&sink, options);
    importer.import_single_page(&file).unwrap();

    assert_eq!(sink.created.borrow()[0].children.len(), 2);
    let appended: Vec<_> = sink.appended.borrow().iter().map(|(_, n)| *n).collect();
    assert_eq!(appended, vec![2, 1]);
}

#[test]
fn test_failed_append_keeps_page() {
    let dir = TempDir::new().unwrap();
    let body: String = (1..=120).map(|n| format!("- item {}\n", n)).collect();
    let file = write_page(dir.path(), "", &body);

    let sink = MockSink {
        fail_appends: true,
        ..MockSink::default()
    };
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    let id = importer.import_single_page(&file).unwrap();

    assert_eq!(id, MockSink::id_for(0));
    assert_eq!(sink.created.borrow().len(), 1);
}

#[test]
fn test_single_page_goes_under_root_parent() {
    let dir = TempDir::new().unwrap();
    let file = write_page(
        dir.path(),
        "notes",
        "![cover](https://example.com/c.jpg)\n\n# Notes\n\nHello.\n",
    );

    let sink = MockSink::default();
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    importer.import_single_page(&file).unwrap();

    let created = sink.created.borrow();
    assert_eq!(created[0].parent.as_str(), ROOT_PARENT);
    assert_eq!(created[0].title, "Notes");
    assert_eq!(created[0].cover_url.as_deref(), Some("https://example.com/c.jpg"));
}

#[test]
fn test_local_cover_is_dropped() {
    let dir = TempDir::new().unwrap();
    let file = write_page(dir.path(), "", "![cover](assets/c.jpg)\n\n# Notes\n");

    let sink = MockSink::default();
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    importer.import_single_page(&file).unwrap();

    assert_eq!(sink.created.borrow()[0].cover_url, None);
}

#[test]
fn test_local_assets_are_uploaded() {
    let dir = TempDir::new().unwrap();
    let file = write_page(
        dir.path(),
        "",
        "# Pictures\n\n![diagram](assets/d.png)\n\n![missing](assets/none.png)\n",
    );
    fs::create_dir_all(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets/d.png"), b"png").unwrap();

    let store = MemoryObjectStore::new();
    let uploader = Uploader::new(&store, Some("https://cdn.example.com/"), "imports/").unwrap();
    let sink = MockSink::default();
    let mut importer =
        Importer::new(&sink, ImportOptions::new(root_parent())).with_uploader(uploader);
    let summary = importer.import_directory(dir.path()).unwrap();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(store.get("imports/d.png").unwrap(), b"png");
    assert_eq!(store.content_type("imports/d.png").as_deref(), Some("image/png"));

    let created = sink.created.borrow();
    let sources: Vec<_> = created[0]
        .children
        .iter()
        .filter_map(|b| match &b.kind {
            BlockKind::Image(media) => Some(media.source.source.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        sources[0],
        AssetSource::Remote {
            url: "https://cdn.example.com/imports/d.png".to_string()
        }
    );
    assert!(matches!(sources[1], AssetSource::Local { .. }));
}

#[test]
fn test_uploader_needs_public_url() {
    let store = MemoryObjectStore::new();
    assert!(matches!(
        Uploader::new(&store, None, "x/"),
        Err(Error::MissingPublicUrl)
    ));
    assert!(matches!(
        Uploader::new(&store, Some(""), "x/"),
        Err(Error::MissingPublicUrl)
    ));
}

#[test]
fn test_missing_file_is_an_error() {
    let sink = MockSink::default();
    let mut importer = Importer::new(&sink, ImportOptions::new(root_parent()));
    assert!(matches!(
        importer.import_single_page(Path::new("/no/such/index.md")),
        Err(Error::Io(_))
    ));
    assert!(sink.created.borrow().is_empty());
}

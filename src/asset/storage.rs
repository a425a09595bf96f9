//! Import-side asset hosting: put local files in object storage.

use crate::error::{Error, Result};
use crate::model::{AssetRef, AssetSource, Block, BlockKind};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key prefix for uploaded files.
pub const DEFAULT_KEY_PREFIX: &str = "notion-import/";

/// Key/value object storage.
pub trait ObjectStore {
    /// Store `bytes` under `key`.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;
}

/// In-process store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RefCell<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    /// Check if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    /// Content type of a stored object.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.borrow().get(key).map(|(_, ct)| ct.clone())
    }

    /// Bytes of a stored object.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.borrow().get(key).map(|(bytes, _)| bytes.clone())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.objects
            .borrow_mut()
            .insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(())
    }
}

/// Settings for [`HttpObjectStore`] and the public URL of uploads.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Store endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,

    /// Bucket name
    pub bucket: String,

    /// Base URL the bucket is publicly served from
    pub public_url: Option<String>,

    token: Option<SecretString>,
}

impl StorageConfig {
    /// Configuration for a bucket at an endpoint.
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            public_url: None,
            token: None,
        }
    }

    /// Set the public base URL.
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// Set the bearer token sent with uploads.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token.into()));
        self
    }
}

/// Store that `PUT`s objects to `{endpoint}/{bucket}/{key}`.
///
/// Authenticates with a bearer token, which suits token-protected upload
/// gateways and presigning proxies in front of S3-compatible buckets.
pub struct HttpObjectStore {
    config: StorageConfig,
    http: Client,
}

impl HttpObjectStore {
    /// Build a store client.
    pub fn new(config: StorageConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self { config, http })
    }

    /// The configuration in use.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl ObjectStore for HttpObjectStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let url = format!("{}/{}/{}", self.config.endpoint, self.config.bucket, key);
        let mut request = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().map_err(|e| Error::Upload {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upload {
                key: key.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }
        Ok(())
    }
}

/// Uploads local assets and rewrites blocks to reference them.
pub struct Uploader<'a> {
    store: &'a dyn ObjectStore,
    public_base: String,
    key_prefix: String,
    uploaded: HashMap<PathBuf, String>,
}

impl<'a> Uploader<'a> {
    /// Create an uploader.
    ///
    /// Fails with [`Error::MissingPublicUrl`] when there is no public base:
    /// uploads would succeed but every link to them would be dead.
    pub fn new(
        store: &'a dyn ObjectStore,
        public_url: Option<&str>,
        key_prefix: impl Into<String>,
    ) -> Result<Self> {
        let base = public_url
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or(Error::MissingPublicUrl)?;
        Ok(Self {
            store,
            public_base: base.to_string(),
            key_prefix: key_prefix.into(),
            uploaded: HashMap::new(),
        })
    }

    /// Public URL of a stored key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }

    /// Upload one file and return its public URL.
    pub fn upload(&mut self, path: &Path) -> Result<String> {
        if let Some(url) = self.uploaded.get(path) {
            return Ok(url.clone());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Other(format!("Not a file: {}", path.display())))?;
        let key = format!("{}{}", self.key_prefix, name);
        let bytes = fs::read(path)?;
        self.store.put(&key, &bytes, content_type(path))?;

        let url = self.public_url(&key);
        log::info!("Uploaded {} -> {}", path.display(), url);
        self.uploaded.insert(path.to_path_buf(), url.clone());
        Ok(url)
    }

    /// Replace every local media source in `blocks` with its public URL.
    ///
    /// Failed uploads are logged and left local; such blocks are dropped
    /// when the page is sent.
    pub fn upload_blocks(&mut self, blocks: &mut [Block]) -> usize {
        let mut count = 0;
        for block in blocks.iter_mut() {
            if let Some(asset) = media_source_mut(block) {
                if let AssetSource::Local { path } = &asset.source {
                    let path = path.clone();
                    match self.upload(&path) {
                        Ok(url) => {
                            *asset = AssetRef::url(url);
                            count += 1;
                        }
                        Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
                    }
                }
            }
            count += self.upload_blocks(&mut block.children);
        }
        count
    }
}

fn media_source_mut(block: &mut Block) -> Option<&mut AssetRef> {
    match &mut block.kind {
        BlockKind::Image(media)
        | BlockKind::Video(media)
        | BlockKind::Audio(media)
        | BlockKind::File(media)
        | BlockKind::Embed(media) => Some(&mut media.source),
        _ => None,
    }
}

/// Content type for a file, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Media;
    use tempfile::TempDir;

    #[test]
    fn test_missing_public_url_is_refused() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            Uploader::new(&store, None, DEFAULT_KEY_PREFIX),
            Err(Error::MissingPublicUrl)
        ));
        assert!(matches!(
            Uploader::new(&store, Some(""), DEFAULT_KEY_PREFIX),
            Err(Error::MissingPublicUrl)
        ));
    }

    #[test]
    fn test_upload_and_rewrite() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pic.png");
        fs::write(&file, b"png").unwrap();

        let store = MemoryObjectStore::new();
        let mut uploader =
            Uploader::new(&store, Some("https://cdn.example.com/"), DEFAULT_KEY_PREFIX).unwrap();

        let local = AssetRef::local("pic.png", dir.path());
        let image = Block::new(BlockKind::Image(Media::new(local.clone())));
        let nested = Block::new(BlockKind::Toggle { summary: vec![] })
            .with_children(vec![Block::new(BlockKind::File(Media::new(local)))]);
        let mut blocks = vec![image, nested];

        assert_eq!(uploader.upload_blocks(&mut blocks), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.content_type("notion-import/pic.png").as_deref(),
            Some("image/png")
        );
        match &blocks[1].children[0].kind {
            BlockKind::File(media) => assert_eq!(
                media.source.public_url(),
                Some("https://cdn.example.com/notion-import/pic.png")
            ),
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_left_local() {
        let dir = TempDir::new().unwrap();
        let store = MemoryObjectStore::new();
        let mut uploader = Uploader::new(&store, Some("https://cdn"), "x/").unwrap();
        let mut blocks = vec![Block::new(BlockKind::Image(Media::new(AssetRef::local(
            "missing.png",
            dir.path(),
        ))))];
        assert_eq!(uploader.upload_blocks(&mut blocks), 0);
        assert!(store.is_empty());
        assert!(matches!(&blocks[0].kind, BlockKind::Image(m) if m.source.is_local()));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }
}

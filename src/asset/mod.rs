//! Asset handling in both directions.
//!
//! Export side: [`AssetResolver`] turns workspace file locators into signed
//! URLs and downloads them into the page's `assets/` directory.
//! Import side: [`Uploader`] pushes local files to an [`ObjectStore`] and
//! rewrites them to public URLs.

mod resolver;
mod storage;

pub use resolver::{asset_file_name, AssetResolver, PageAssets, ASSETS_DIR};
pub use storage::{
    content_type, HttpObjectStore, MemoryObjectStore, ObjectStore, StorageConfig, Uploader,
    DEFAULT_KEY_PREFIX,
};

use crate::model::{is_http, ATTACHMENT_SCHEME};

/// Host fragment of the workspace's private file bucket.
pub const PRIVATE_FILE_HOST: &str = "prod-files-secure.s3";

/// Bucket URL that attachment locators are rewritten to before signing.
pub const PRIVATE_FILE_BASE: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com";

const APP_BASE: &str = "https://www.notion.so";

/// Bucket URL of an uploaded workspace file.
pub fn attachment_url(space_id: &str, file_id: &str, name: &str) -> String {
    format!("{}/{}/{}/{}", PRIVATE_FILE_BASE, space_id, file_id, name)
}

/// Whether a URL points into the private bucket and must be signed.
pub fn needs_signing(url: &str) -> bool {
    url.contains(PRIVATE_FILE_HOST)
}

/// Displayable URL for a page cover.
///
/// Uploaded covers go through the image proxy, http covers are kept and
/// built-in gallery paths are made absolute.
pub fn cover_url(raw: &str, block_id: &str, space_id: Option<&str>) -> String {
    if raw.starts_with(ATTACHMENT_SCHEME) {
        format!(
            "{}/image/{}?table=block&id={}&spaceId={}&width=2000&cache=v2",
            APP_BASE,
            urlencoding::encode(raw),
            block_id,
            space_id.unwrap_or_default()
        )
    } else if is_http(raw) {
        raw.to_string()
    } else if raw.starts_with('/') {
        format!("{}{}", APP_BASE, raw)
    } else {
        format!("{}/{}", APP_BASE, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_url_kinds() {
        assert_eq!(
            cover_url("/images/page-cover/a.jpg", "b", None),
            "https://www.notion.so/images/page-cover/a.jpg"
        );
        assert_eq!(
            cover_url("https://example.com/c.png", "b", Some("s")),
            "https://example.com/c.png"
        );
        assert_eq!(
            cover_url("attachment:f1:c d.png", "blk", Some("sp")),
            "https://www.notion.so/image/attachment%3Af1%3Ac%20d.png?table=block&id=blk&spaceId=sp&width=2000&cache=v2"
        );
    }

    #[test]
    fn test_attachment_url() {
        let url = attachment_url("space", "file", "a.png");
        assert_eq!(
            url,
            "https://prod-files-secure.s3.us-west-2.amazonaws.com/space/file/a.png"
        );
        assert!(needs_signing(&url));
        assert!(!needs_signing("https://example.com/a.png"));
    }
}

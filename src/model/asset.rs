//! Asset references (images, files, media).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of Notion's internal attachment locators.
pub const ATTACHMENT_SCHEME: &str = "attachment:";

/// Where an asset lives before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetSource {
    /// Absolute http(s) URL
    Remote { url: String },

    /// `attachment:<file id>:<file name>` stored in the workspace
    Attachment { file_id: String, name: String },

    /// File on the local disk
    Local { path: PathBuf },

    /// `data:` URIs and anything else that cannot be fetched
    Unsupported { locator: String },
}

/// A reference to an asset, as written in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// The locator exactly as it appeared in the source
    pub locator: String,

    /// Classified source
    pub source: AssetSource,
}

impl AssetRef {
    /// Classify a remote locator (as found in a record map).
    ///
    /// Relative paths are kept as [`AssetSource::Unsupported`]; remote
    /// documents never refer to local files.
    pub fn remote(locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let source = if is_http(&locator) {
            AssetSource::Remote {
                url: locator.clone(),
            }
        } else if let Some((file_id, name)) = parse_attachment(&locator) {
            AssetSource::Attachment { file_id, name }
        } else {
            AssetSource::Unsupported {
                locator: locator.clone(),
            }
        };
        Self { locator, source }
    }

    /// Classify a locator written in a local Markdown file.
    ///
    /// Non-URL, non-data locators are resolved against `base_dir`.
    pub fn local(locator: impl Into<String>, base_dir: &Path) -> Self {
        let locator = locator.into();
        let source = if is_http(&locator) {
            AssetSource::Remote {
                url: locator.clone(),
            }
        } else if locator.starts_with("data:") || locator.starts_with(ATTACHMENT_SCHEME) {
            AssetSource::Unsupported {
                locator: locator.clone(),
            }
        } else {
            AssetSource::Local {
                path: base_dir.join(&locator),
            }
        };
        Self { locator, source }
    }

    /// Reference to an already-public URL.
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            locator: url.clone(),
            source: AssetSource::Remote { url },
        }
    }

    /// The public URL, if this asset is directly reachable over http(s).
    pub fn public_url(&self) -> Option<&str> {
        match &self.source {
            AssetSource::Remote { url } => Some(url),
            _ => None,
        }
    }

    /// Check if the asset must be uploaded before it can be referenced remotely.
    pub fn is_local(&self) -> bool {
        matches!(self.source, AssetSource::Local { .. })
    }
}

/// Split `attachment:<id>:<name>` into its parts.
pub fn parse_attachment(locator: &str) -> Option<(String, String)> {
    let rest = locator.strip_prefix(ATTACHMENT_SCHEME)?;
    let (file_id, name) = rest.split_once(':')?;
    if file_id.is_empty() {
        return None;
    }
    Some((file_id.to_string(), name.to_string()))
}

/// Check whether a locator is an http(s) URL.
pub fn is_http(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        let a = AssetRef::remote("https://example.com/a.png");
        assert_eq!(a.public_url(), Some("https://example.com/a.png"));

        let a = AssetRef::remote("attachment:abc-123:photo.png");
        assert_eq!(
            a.source,
            AssetSource::Attachment {
                file_id: "abc-123".to_string(),
                name: "photo.png".to_string()
            }
        );

        let a = AssetRef::remote("/images/page-cover/gradients_1.png");
        assert!(matches!(a.source, AssetSource::Unsupported { .. }));
    }

    #[test]
    fn test_attachment_name_keeps_colons() {
        assert_eq!(
            parse_attachment("attachment:id:a:b.txt"),
            Some(("id".to_string(), "a:b.txt".to_string()))
        );
        assert_eq!(parse_attachment("attachment:nocolon"), None);
        assert_eq!(parse_attachment("https://x"), None);
    }

    #[test]
    fn test_local_classification() {
        let base = Path::new("/tmp/page");
        let a = AssetRef::local("assets/x.png", base);
        assert_eq!(
            a.source,
            AssetSource::Local {
                path: PathBuf::from("/tmp/page/assets/x.png")
            }
        );
        assert!(a.is_local());

        let a = AssetRef::local("data:image/png;base64,AAAA", base);
        assert!(matches!(a.source, AssetSource::Unsupported { .. }));

        let a = AssetRef::local("http://example.com/x.png", base);
        assert!(!a.is_local());
    }
}

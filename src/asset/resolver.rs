//! Export-side asset resolution: sign, download and name workspace files.

use super::{attachment_url, needs_signing};
use crate::error::Result;
use crate::model::{AssetRef, AssetSource};
use crate::remote::{PageSource, SignRequest};
use crate::render::AssetLocalizer;
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Directory, next to `index.md`, that holds downloaded assets.
pub const ASSETS_DIR: &str = "assets";

/// Resolves asset locators to fetchable URLs and local files.
///
/// Signed URLs are memoized per (locator, block) for the lifetime of the
/// resolver, so one export signs each file once.
#[derive(Debug, Default)]
pub struct AssetResolver {
    signed: HashMap<(String, String), String>,
    downloaded: usize,
    reused: usize,
}

impl AssetResolver {
    /// Create a resolver with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files downloaded so far.
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Files found already on disk and reused.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Localizer for one page directory.
    pub fn for_page<'a>(
        &'a mut self,
        source: &'a dyn PageSource,
        page_dir: &'a Path,
        space_id: Option<&'a str>,
    ) -> PageAssets<'a> {
        PageAssets {
            resolver: self,
            source,
            page_dir,
            space_id,
        }
    }

    /// The URL to fetch for `asset`, signed when the bucket is private.
    ///
    /// `None` when the locator cannot be turned into an http(s) URL.
    pub fn resolve_url(
        &mut self,
        source: &dyn PageSource,
        asset: &AssetRef,
        block_id: Option<&str>,
        space_id: Option<&str>,
    ) -> Option<String> {
        let url = unsigned_url(asset, space_id)?;
        Some(self.sign(source, &asset.locator, url, block_id))
    }

    /// Download `asset` into `page_dir/assets/`, returning the Markdown target.
    ///
    /// Unresolvable locators come back unchanged and failed downloads fall
    /// back to the resolved URL.
    pub fn localize(
        &mut self,
        source: &dyn PageSource,
        asset: &AssetRef,
        block_id: Option<&str>,
        space_id: Option<&str>,
        page_dir: &Path,
    ) -> String {
        let Some(url) = unsigned_url(asset, space_id) else {
            log::debug!("Keeping unresolvable asset '{}' as-is", asset.locator);
            return asset.locator.clone();
        };

        let name = asset_file_name(&url);
        let relative = format!("{}/{}", ASSETS_DIR, name);
        let target = page_dir.join(ASSETS_DIR).join(&name);
        if target.exists() {
            log::debug!("Reusing {}", target.display());
            self.reused += 1;
            return relative;
        }

        let fetch_url = self.sign(source, &asset.locator, url, block_id);
        match download_to(source, &fetch_url, &target) {
            Ok(()) => {
                self.downloaded += 1;
                relative
            }
            Err(e) => {
                log::warn!("Could not download {}: {}", asset.locator, e);
                fetch_url
            }
        }
    }

    fn sign(
        &mut self,
        source: &dyn PageSource,
        locator: &str,
        url: String,
        block_id: Option<&str>,
    ) -> String {
        let Some(block_id) = block_id.filter(|_| needs_signing(&url)) else {
            return url;
        };

        let key = (locator.to_string(), block_id.to_string());
        if let Some(signed) = self.signed.get(&key) {
            return signed.clone();
        }

        let request = SignRequest {
            url: url.clone(),
            block_id: block_id.to_string(),
        };
        match source.sign_urls(&[request]) {
            Ok(signed) => match signed.into_iter().next().flatten() {
                Some(signed) => {
                    self.signed.insert(key, signed.clone());
                    signed
                }
                None => {
                    log::warn!("No signed URL returned for {}", locator);
                    url
                }
            },
            Err(e) => {
                log::warn!("Could not sign {}: {}", locator, e);
                url
            }
        }
    }
}

/// [`AssetLocalizer`] bound to one page directory.
pub struct PageAssets<'a> {
    resolver: &'a mut AssetResolver,
    source: &'a dyn PageSource,
    page_dir: &'a Path,
    space_id: Option<&'a str>,
}

impl AssetLocalizer for PageAssets<'_> {
    fn localize(&mut self, asset: &AssetRef, block_id: Option<&str>) -> String {
        self.resolver
            .localize(self.source, asset, block_id, self.space_id, self.page_dir)
    }
}

fn unsigned_url(asset: &AssetRef, space_id: Option<&str>) -> Option<String> {
    match &asset.source {
        AssetSource::Remote { url } => Some(url.clone()),
        AssetSource::Attachment { file_id, name } => match space_id {
            Some(space) => Some(attachment_url(space, file_id, name)),
            None => {
                log::warn!("No workspace id to resolve {}", asset.locator);
                None
            }
        },
        AssetSource::Local { .. } | AssetSource::Unsupported { .. } => None,
    }
}

fn download_to(source: &dyn PageSource, url: &str, target: &Path) -> Result<()> {
    let bytes = source.download(url)?;
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(target, bytes)?;
    log::debug!("Saved {}", target.display());
    Ok(())
}

/// Local file name for an asset URL: `{stem}_{hash8}{ext}`.
///
/// The hash is the first 8 hex characters of the URL's MD5; the base name
/// is the last path segment (`file` when there is none).
pub fn asset_file_name(url: &str) -> String {
    let parsed = url::Url::parse(url).ok();
    let base = parsed
        .as_ref()
        .and_then(|u| u.path_segments())
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .map(|name| sanitize(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "file".to_string());

    let (stem, ext) = match base.rfind('.') {
        Some(i) if i > 0 => base.split_at(i),
        _ => (base.as_str(), ""),
    };
    let digest = format!("{:x}", Md5::digest(url.as_bytes()));
    format!("{}_{}{}", stem, &digest[..8], ext)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

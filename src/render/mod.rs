//! Rendering module for converting block trees to Markdown and JSON.

mod json;
mod markdown;
mod options;
mod result;

pub use json::{from_json, to_json, JsonFormat};
pub use markdown::{
    to_markdown, AssetLocalizer, MarkdownRenderer, AUDIO_LINK_HOSTS, VIDEO_LINK_HOSTS,
};
pub use options::RenderOptions;
pub use result::{RenderResult, RenderStats};

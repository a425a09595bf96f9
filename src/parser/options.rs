//! Markdown parsing options.

use std::path::PathBuf;

/// Emoji outside U+1F300–U+1F9FF that still mark a quote as a callout.
///
/// Variants with a trailing U+FE0F come before their bare form so the
/// longest spelling wins.
pub const CALLOUT_ICONS: &[&str] = &[
    "\u{27A1}\u{FE0F}", // ➡️
    "\u{27A1}",
    "\u{26A0}\u{FE0F}", // ⚠️
    "\u{26A0}",
    "\u{2139}\u{FE0F}", // ℹ️
    "\u{2139}",
    "\u{2757}", // ❗
    "\u{2705}", // ✅
    "\u{274C}", // ❌
    "\u{2B50}", // ⭐
    "\u{2728}", // ✨
    "\u{23F0}", // ⏰
];

/// Options for parsing Markdown into blocks.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Directory that relative asset paths are resolved against
    pub base_dir: PathBuf,

    /// Additional emoji accepted as callout icons
    pub extra_callout_icons: Vec<String>,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative asset paths against `dir` (usually the page directory).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Accept another emoji as a callout icon.
    pub fn with_callout_icon(mut self, icon: impl Into<String>) -> Self {
        self.extra_callout_icons.push(icon.into());
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            extra_callout_icons: Vec::new(),
        }
    }
}

/// Map a fence language token to Notion's language name.
pub fn normalize_language(token: &str) -> String {
    let lower = token.trim().to_lowercase();
    let mapped = match lower.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "sh" | "bash" => "shell",
        "" => "plain text",
        other => other,
    };
    mapped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_aliases() {
        assert_eq!(normalize_language("js"), "javascript");
        assert_eq!(normalize_language("TS"), "typescript");
        assert_eq!(normalize_language("py"), "python");
        assert_eq!(normalize_language("bash"), "shell");
        assert_eq!(normalize_language(""), "plain text");
        assert_eq!(normalize_language("rust"), "rust");
    }

    #[test]
    fn test_builder() {
        let options = ParseOptions::new()
            .with_base_dir("/tmp/page")
            .with_callout_icon("\u{2603}");
        assert_eq!(options.base_dir, PathBuf::from("/tmp/page"));
        assert_eq!(options.extra_callout_icons, vec!["\u{2603}".to_string()]);
    }
}

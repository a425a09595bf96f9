//! Rendering options and configuration.

/// Options for rendering blocks to Markdown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Icon used for callouts that carry none
    pub callout_icon: String,

    /// Indentation added per list nesting level
    pub list_indent: String,

    /// Write text colors as HTML `<span style=…>` tags
    pub html_colors: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback callout icon.
    pub fn with_callout_icon(mut self, icon: impl Into<String>) -> Self {
        self.callout_icon = icon.into();
        self
    }

    /// Set the per-level list indentation.
    pub fn with_list_indent(mut self, indent: impl Into<String>) -> Self {
        self.list_indent = indent.into();
        self
    }

    /// Enable or disable color spans.
    pub fn with_html_colors(mut self, enabled: bool) -> Self {
        self.html_colors = enabled;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            callout_icon: "\u{1F4A1}".to_string(),
            list_indent: "  ".to_string(),
            html_colors: true,
        }
    }
}

//! Inline text runs and their annotations.

use serde::{Deserialize, Serialize};

/// One of the fixed Notion text colors.
///
/// Foreground and background variants share the same palette; anything the
/// workspace reports outside this set decodes to [`Color::Default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
}

/// Name and CSS hex value of every non-default color.
const PALETTE: [(Color, &str, &str); 18] = [
    (Color::Gray, "gray", "#787774"),
    (Color::Brown, "brown", "#9F6B53"),
    (Color::Orange, "orange", "#D9730D"),
    (Color::Yellow, "yellow", "#CB912F"),
    (Color::Green, "green", "#448361"),
    (Color::Blue, "blue", "#337EA9"),
    (Color::Purple, "purple", "#9065B0"),
    (Color::Pink, "pink", "#C14C8A"),
    (Color::Red, "red", "#D44C47"),
    (Color::GrayBackground, "gray_background", "#F1F1EF"),
    (Color::BrownBackground, "brown_background", "#F4EEEE"),
    (Color::OrangeBackground, "orange_background", "#FBECDD"),
    (Color::YellowBackground, "yellow_background", "#FBF3DB"),
    (Color::GreenBackground, "green_background", "#EDF3EC"),
    (Color::BlueBackground, "blue_background", "#E7F3F8"),
    (Color::PurpleBackground, "purple_background", "#F6F3F9"),
    (Color::PinkBackground, "pink_background", "#FAF1F5"),
    (Color::RedBackground, "red_background", "#FDEBEC"),
];

impl Color {
    /// Look up a color by its Notion name. Unknown names map to `Default`.
    pub fn from_name(name: &str) -> Self {
        PALETTE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(c, _, _)| *c)
            .unwrap_or(Color::Default)
    }

    /// Look up a color by CSS hex value (case-insensitive). Unknown values map to `Default`.
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.trim();
        PALETTE
            .iter()
            .find(|(_, _, h)| h.eq_ignore_ascii_case(hex))
            .map(|(c, _, _)| *c)
            .unwrap_or(Color::Default)
    }

    /// Notion name of the color.
    pub fn name(self) -> &'static str {
        PALETTE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, n, _)| *n)
            .unwrap_or("default")
    }

    /// CSS hex value, or `None` for `Default`.
    pub fn hex(self) -> Option<&'static str> {
        PALETTE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, _, h)| *h)
    }

    /// Whether this is a highlight (background) color.
    pub fn is_background(self) -> bool {
        self.name().ends_with("_background")
    }

    /// Whether this is the default color.
    pub fn is_default(self) -> bool {
        self == Color::Default
    }
}

/// Formatting applied to a run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub color: Color,
    /// Link target, if the run is a hyperlink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Annotations {
    /// Check if any styling (other than a link) is applied.
    pub fn has_styling(&self) -> bool {
        self.bold
            || self.italic
            || self.strikethrough
            || self.underline
            || self.code
            || !self.color.is_default()
    }

    /// Check if nothing at all is applied.
    pub fn is_plain(&self) -> bool {
        !self.has_styling() && self.link.is_none()
    }
}

/// A run of text with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichSpan {
    /// The text content
    pub text: String,

    /// Formatting of the run
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichSpan {
    /// Create an unformatted span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Annotations::default(),
        }
    }

    /// Create a span with the given annotations.
    pub fn styled(text: impl Into<String>, annotations: Annotations) -> Self {
        Self {
            text: text.into(),
            annotations,
        }
    }

    /// Create a bold span.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            Annotations {
                bold: true,
                ..Default::default()
            },
        )
    }

    /// Create an italic span.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            Annotations {
                italic: true,
                ..Default::default()
            },
        )
    }

    /// Create a hyperlink span.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self::styled(
            text,
            Annotations {
                link: Some(url.into()),
                ..Default::default()
            },
        )
    }

    /// Check if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Concatenate the text of a span list, dropping all formatting.
pub fn plain_text(spans: &[RichSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

//! Inline formatting codec: rich-text spans ⇄ inline Markdown.
//!
//! Decoding wraps each span in Markdown/HTML markers using a fixed nesting
//! order (code innermost, color outermost). Encoding is a recursive matcher
//! that tries the same constructs in a fixed priority order against the
//! remaining input, so whatever `decode` writes, `encode` reads back.
//!
//! ```
//! use notionmd::richtext::RichTextCodec;
//!
//! let codec = RichTextCodec::new();
//! let spans = codec.encode("Hello **world**");
//! assert_eq!(spans.len(), 2);
//! assert!(spans[1].annotations.bold);
//! assert_eq!(codec.decode(&spans), "Hello **world**");
//! ```

mod decode;
mod encode;

pub use decode::{decode_span, decode_spans};

use crate::model::RichSpan;
use encode::Patterns;

/// Bidirectional converter between [`RichSpan`] lists and inline Markdown.
pub struct RichTextCodec {
    patterns: Patterns,
    html_colors: bool,
}

impl RichTextCodec {
    /// Create a codec that writes colors as HTML `<span>` tags.
    pub fn new() -> Self {
        Self {
            patterns: Patterns::new(),
            html_colors: true,
        }
    }

    /// Enable or disable color output when decoding.
    pub fn with_html_colors(mut self, enabled: bool) -> Self {
        self.html_colors = enabled;
        self
    }

    /// Spans → Markdown.
    pub fn decode(&self, spans: &[RichSpan]) -> String {
        decode_spans(spans, self.html_colors)
    }

    /// Markdown → spans.
    pub fn encode(&self, text: &str) -> Vec<RichSpan> {
        self.patterns.encode(text)
    }
}

impl Default for RichTextCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotations, Color};

    fn round_trip(spans: Vec<RichSpan>) {
        let codec = RichTextCodec::new();
        let markdown = codec.decode(&spans);
        assert_eq!(codec.encode(&markdown), spans, "markdown was {markdown:?}");
    }

    #[test]
    fn test_round_trip_single_annotations() {
        let each = [
            Annotations {
                bold: true,
                ..Default::default()
            },
            Annotations {
                italic: true,
                ..Default::default()
            },
            Annotations {
                strikethrough: true,
                ..Default::default()
            },
            Annotations {
                underline: true,
                ..Default::default()
            },
            Annotations {
                code: true,
                ..Default::default()
            },
            Annotations {
                color: Color::Red,
                ..Default::default()
            },
            Annotations {
                color: Color::YellowBackground,
                ..Default::default()
            },
            Annotations {
                link: Some("https://example.com/a".to_string()),
                ..Default::default()
            },
        ];
        for annotations in each {
            round_trip(vec![RichSpan::styled("text", annotations)]);
        }
    }

    #[test]
    fn test_round_trip_combined_annotations() {
        round_trip(vec![RichSpan::styled(
            "both",
            Annotations {
                bold: true,
                italic: true,
                ..Default::default()
            },
        )]);
        round_trip(vec![RichSpan::styled(
            "let x",
            Annotations {
                bold: true,
                code: true,
                ..Default::default()
            },
        )]);
        round_trip(vec![RichSpan::styled(
            "warning",
            Annotations {
                bold: true,
                color: Color::Blue,
                ..Default::default()
            },
        )]);
        round_trip(vec![RichSpan::styled(
            "everything",
            Annotations {
                bold: true,
                italic: true,
                strikethrough: true,
                underline: true,
                color: Color::Green,
                link: Some("https://example.com".to_string()),
                ..Default::default()
            },
        )]);
    }

    #[test]
    fn test_round_trip_sequence() {
        round_trip(vec![
            RichSpan::plain("Start "),
            RichSpan::bold("bold"),
            RichSpan::plain(" then "),
            RichSpan::italic("italic"),
            RichSpan::plain(" end"),
        ]);
    }
}

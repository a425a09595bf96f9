//! Inline Markdown → spans.

use crate::model::{is_http, Annotations, Color, RichSpan};
use regex::{Captures, Regex};

/// Characters that may start an inline construct.
const SPECIAL_CHARS: [char; 5] = ['<', '*', '~', '`', '['];

/// The inline constructs, in the order they are tried.
#[derive(Debug, Clone, Copy)]
enum Construct {
    Color,
    Background,
    Underline,
    BoldItalic,
    Bold,
    Italic,
    Strikethrough,
    Code,
    Link,
}

/// Compiled matchers, each anchored at the start of the remaining input.
pub(super) struct Patterns {
    rules: Vec<(Construct, Regex)>,
}

impl Patterns {
    pub(super) fn new() -> Self {
        let rules = vec![
            (
                Construct::Color,
                Regex::new(r#"(?s)^<span style="color:\s*([^"]+)">(.*?)</span>"#).unwrap(),
            ),
            (
                Construct::Background,
                Regex::new(r#"(?s)^<span style="background-color:\s*([^"]+)">(.*?)</span>"#)
                    .unwrap(),
            ),
            (
                Construct::Underline,
                Regex::new(r"(?s)^<u>(.*?)</u>").unwrap(),
            ),
            (
                Construct::BoldItalic,
                Regex::new(r"(?s)^\*\*\*(.+?)\*\*\*").unwrap(),
            ),
            (Construct::Bold, Regex::new(r"(?s)^\*\*(.+?)\*\*").unwrap()),
            (Construct::Italic, Regex::new(r"(?s)^\*(.+?)\*").unwrap()),
            (
                Construct::Strikethrough,
                Regex::new(r"(?s)^~~(.+?)~~").unwrap(),
            ),
            (Construct::Code, Regex::new(r"(?s)^`([^`]+)`").unwrap()),
            (
                Construct::Link,
                Regex::new(r"(?s)^\[([^\]]+)\]\(([^)]+)\)").unwrap(),
            ),
        ];
        Self { rules }
    }

    pub(super) fn encode(&self, text: &str) -> Vec<RichSpan> {
        let mut spans = Vec::new();
        self.encode_into(text, &Annotations::default(), &mut spans);
        spans
    }

    /// Encode `text` under `base` annotations, appending to `out`.
    ///
    /// A match recurses into the inner text with the new annotation merged
    /// in, then continues with the remainder under `base`. The remainder is
    /// handled by looping rather than recursing so long paragraphs do not
    /// grow the stack.
    fn encode_into(&self, text: &str, base: &Annotations, out: &mut Vec<RichSpan>) {
        let mut rest = text;
        while !rest.is_empty() {
            if let Some((consumed, construct, caps)) = self.match_construct(rest) {
                self.apply(construct, &caps, base, out);
                rest = &rest[consumed..];
                continue;
            }

            match rest.find(&SPECIAL_CHARS[..]) {
                Some(0) => {
                    // Unmatched special character: emit it alone and move on.
                    let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                    out.push(RichSpan::styled(&rest[..width], base.clone()));
                    rest = &rest[width..];
                }
                Some(pos) => {
                    out.push(RichSpan::styled(&rest[..pos], base.clone()));
                    rest = &rest[pos..];
                }
                None => {
                    out.push(RichSpan::styled(rest, base.clone()));
                    rest = "";
                }
            }
        }
    }

    fn match_construct<'t>(&self, text: &'t str) -> Option<(usize, Construct, Captures<'t>)> {
        self.rules.iter().find_map(|(construct, re)| {
            re.captures(text).map(|caps| {
                let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
                (end, *construct, caps)
            })
        })
    }

    fn apply(
        &self,
        construct: Construct,
        caps: &Captures<'_>,
        base: &Annotations,
        out: &mut Vec<RichSpan>,
    ) {
        let mut ann = base.clone();
        let inner = match construct {
            Construct::Color | Construct::Background => {
                ann.color = Color::from_hex(&caps[1]);
                &caps[2]
            }
            Construct::Underline => {
                ann.underline = true;
                &caps[1]
            }
            Construct::BoldItalic => {
                ann.bold = true;
                ann.italic = true;
                &caps[1]
            }
            Construct::Bold => {
                ann.bold = true;
                &caps[1]
            }
            Construct::Italic => {
                ann.italic = true;
                &caps[1]
            }
            Construct::Strikethrough => {
                ann.strikethrough = true;
                &caps[1]
            }
            Construct::Code => {
                ann.code = true;
                &caps[1]
            }
            Construct::Link => {
                let url = &caps[2];
                let mut link_spans = Vec::new();
                self.encode_into(&caps[1], base, &mut link_spans);
                if is_http(url) {
                    for span in &mut link_spans {
                        span.annotations.link = Some(url.to_string());
                    }
                }
                out.extend(link_spans);
                return;
            }
        };
        self.encode_into(inner, &ann, out);
    }
}

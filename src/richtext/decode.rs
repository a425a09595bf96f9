//! Spans → inline Markdown.

use crate::model::RichSpan;

/// Decode a list of spans into one Markdown string.
pub fn decode_spans(spans: &[RichSpan], html_colors: bool) -> String {
    spans
        .iter()
        .map(|span| decode_span(span, html_colors))
        .collect()
}

/// Decode a single span.
///
/// Markers are applied innermost first: code, strikethrough, underline,
/// bold+italic / bold / italic, link, then the color tag. Emphasis markers
/// cannot touch whitespace, so one leading and one trailing space are moved
/// outside the markers (but inside the color tag).
pub fn decode_span(span: &RichSpan, html_colors: bool) -> String {
    let ann = &span.annotations;
    let mut core = span.text.as_str();

    let leading = if core.starts_with(' ') {
        core = &core[1..];
        " "
    } else {
        ""
    };
    let trailing = if core.ends_with(' ') {
        core = &core[..core.len() - 1];
        " "
    } else {
        ""
    };

    let mut text = core.to_string();
    if !text.is_empty() {
        if ann.code {
            text = format!("`{}`", text);
        }
        if ann.strikethrough {
            text = format!("~~{}~~", text);
        }
        if ann.underline {
            text = format!("<u>{}</u>", text);
        }
        if ann.bold && ann.italic {
            text = format!("***{}***", text);
        } else if ann.bold {
            text = format!("**{}**", text);
        } else if ann.italic {
            text = format!("*{}*", text);
        }
        if let Some(ref url) = ann.link {
            text = format!("[{}]({})", text, url);
        }
    }

    let text = format!("{}{}{}", leading, text, trailing);

    match ann.color.hex() {
        Some(hex) if html_colors => {
            let property = if ann.color.is_background() {
                "background-color"
            } else {
                "color"
            };
            format!("<span style=\"{}: {}\">{}</span>", property, hex, text)
        }
        _ => text,
    }
}

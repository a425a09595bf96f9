//! Markdown → blocks → Markdown stability tests.

use notionmd::model::Annotations;
use notionmd::{parse_markdown, to_markdown, BlockKind, Color, RichSpan, RichTextCodec};

/// Render once, then check a second pass changes nothing.
fn stable(source: &str) -> String {
    let first = to_markdown(&parse_markdown(source));
    let second = to_markdown(&parse_markdown(&first));
    assert_eq!(first, second, "not stable for {source:?}");
    first
}

#[test]
fn test_page_round_trip() {
    let source = "# Release notes\n\n\
                  Some *careful* wording with `code` and a [link](https://example.com).\n\n\
                  - first\n  - nested\n- second\n\n\
                  - [x] shipped\n- [ ] pending\n\n\
                  > 💡 Note: hello\n\n\
                  ```python\nprint(\"hi\")\n```\n\n\
                  ---\n\n\
                  Closing words\n";
    let rendered = stable(source);
    assert!(rendered.contains("- first\n  - nested\n- second\n"));
    assert!(rendered.contains("> 💡 Note: hello\n"));
    assert!(rendered.contains("```python\nprint(\"hi\")\n```"));
    assert!(rendered.ends_with("Closing words\n"));
}

#[test]
fn test_stacked_annotations() {
    let blocks = parse_markdown("Mix ***both*** and **`code`**\n");
    let spans = blocks[0].text().unwrap();

    let both = spans.iter().find(|s| s.text == "both").unwrap();
    assert!(both.annotations.bold && both.annotations.italic);
    let code = spans.iter().find(|s| s.text == "code").unwrap();
    assert!(code.annotations.bold && code.annotations.code);

    assert_eq!(to_markdown(&blocks), "Mix ***both*** and **`code`**\n");
}

#[test]
fn test_colored_span_survives() {
    let codec = RichTextCodec::new();
    let spans = vec![
        RichSpan::plain("Status: "),
        RichSpan::styled(
            "late",
            Annotations {
                bold: true,
                color: Color::Red,
                ..Annotations::default()
            },
        ),
    ];
    let markdown = codec.decode(&spans);
    assert!(markdown.contains("<span style=\"color: "));
    assert_eq!(codec.encode(&markdown), spans);

    let plain = RichTextCodec::new().with_html_colors(false);
    assert_eq!(plain.decode(&spans), "Status: **late**");
}

#[test]
fn test_colored_trailing_space_survives() {
    let codec = RichTextCodec::new();
    let red = Annotations {
        color: Color::Red,
        ..Annotations::default()
    };
    let spans = vec![RichSpan::styled("late ", red.clone()), RichSpan::plain("now")];
    assert_eq!(codec.encode(&codec.decode(&spans)), spans);

    // Bold stops before the space, which stays inside the color.
    let bold_red = Annotations {
        bold: true,
        ..red.clone()
    };
    let spans = vec![RichSpan::styled("late ", bold_red.clone()), RichSpan::plain("now")];
    let markdown = codec.decode(&spans);
    assert_eq!(markdown, "<span style=\"color: #D44C47\">**late** </span>now");
    assert_eq!(
        codec.encode(&markdown),
        vec![
            RichSpan::styled("late", bold_red),
            RichSpan::styled(" ", red),
            RichSpan::plain("now"),
        ]
    );
}

#[test]
fn test_code_blank_lines_round_trip() {
    let source = "Intro\n\n```python\na = 1\n\n\n\nb = 2\n```\n";
    let blocks = parse_markdown(source);
    match &blocks[1].kind {
        BlockKind::Code { code, .. } => assert_eq!(code, "a = 1\n\n\n\nb = 2"),
        other => panic!("expected code, got {other:?}"),
    }
    assert_eq!(stable(source), source);
}

#[test]
fn test_columns_round_trip() {
    let source = "<table><tr>\n<td valign=\"top\">\n\nLeft side\n\n</td>\n\
                  <td valign=\"top\">\n\n- right item\n\n</td>\n</tr></table>\n";
    let blocks = parse_markdown(source);
    assert_eq!(blocks.len(), 1);
    assert!(matches!(blocks[0].kind, BlockKind::ColumnList));
    assert_eq!(blocks[0].children.len(), 2);

    let rendered = stable(source);
    assert_eq!(rendered.matches("<td valign=\"top\">").count(), 2);
}

#[test]
fn test_toggle_round_trip() {
    let source = "<details>\n<summary>More</summary>\n\nHidden text\n\n</details>\n";
    let blocks = parse_markdown(source);
    assert!(matches!(blocks[0].kind, BlockKind::Toggle { .. }));
    assert_eq!(blocks[0].children[0].plain_text(), "Hidden text");

    let rendered = stable(source);
    assert!(rendered.starts_with("<details>\n<summary>More</summary>"));
}

#[test]
fn test_unknown_callout_icon_is_a_quote() {
    let blocks = parse_markdown("> \u{267B} reuse\n");
    assert!(matches!(blocks[0].kind, BlockKind::Quote { .. }));
    assert_eq!(to_markdown(&blocks), "> \u{267B} reuse\n");
}

#[test]
fn test_literal_symbols_stay_plain() {
    let source = "2 * 3 < 4 and [brackets\n";
    let blocks = parse_markdown(source);
    assert!(blocks[0]
        .text()
        .unwrap()
        .iter()
        .all(|s| s.annotations.is_plain()));
    assert_eq!(to_markdown(&blocks), source);
}

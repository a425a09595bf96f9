//! The on-disk `index.md` layout: optional cover line, title heading, body.

use regex::Regex;
use std::path::Path;

/// File name of every exported page.
pub const INDEX_FILE: &str = "index.md";

/// An `index.md` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    /// Cover image URL from a leading `![cover](url)` line
    pub cover: Option<String>,

    /// Text of the leading `# ` heading
    pub title: Option<String>,

    /// Everything after the cover and title
    pub body: String,
}

impl PageFile {
    /// Split file contents into cover, title and body.
    pub fn parse(content: &str) -> Self {
        let cover_re = Regex::new(r"^!\[cover\]\(([^)]+)\)\s*").unwrap();
        let title_re = Regex::new(r"^#[ \t]+([^\n]+)\n*").unwrap();

        let content = content.trim_start_matches('\u{FEFF}');
        let (cover, rest) = match cover_re.captures(content) {
            Some(caps) => (Some(caps[1].trim().to_string()), &content[caps[0].len()..]),
            None => (None, content),
        };

        let (title, body) = match title_re.captures(rest) {
            Some(caps) => {
                let title = caps[1].trim().to_string();
                (Some(title).filter(|t| !t.is_empty()), &rest[caps[0].len()..])
            }
            None => (None, rest),
        };

        Self {
            cover,
            title,
            body: body.to_string(),
        }
    }

    /// Assemble file contents.
    pub fn render(title: &str, cover: Option<&str>, body: &str) -> String {
        let mut out = String::new();
        if let Some(cover) = cover {
            out.push_str(&format!("![cover]({})\n\n", cover));
        }
        out.push_str(&format!("# {}\n\n", title));
        out.push_str(body);
        out
    }

    /// The title, or one derived from the file's location.
    pub fn title_or_fallback(&self, fallback_from: &Path) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => title_from_path(fallback_from),
        }
    }
}

/// Title for a page with no heading: the directory (or file stem) name,
/// dashes to spaces, words capitalized.
pub fn title_from_path(path: &Path) -> String {
    let name = if path.file_name().map(|n| n == INDEX_FILE).unwrap_or(false) {
        path.parent().and_then(Path::file_name)
    } else {
        path.file_stem()
    };
    let name = name.map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let title = title_case(&name.replace('-', " "));
    if title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = !c.is_alphanumeric();
        }
    }
    out
}

//! JSON dump and load of block trees.

use crate::error::{Error, Result};
use crate::model::Block;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a block tree to JSON.
pub fn to_json(blocks: &[Block], format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(blocks),
        JsonFormat::Compact => serde_json::to_string(blocks),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Load a block tree previously written by [`to_json`].
pub fn from_json(json: &str) -> Result<Vec<Block>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RichSpan;

    #[test]
    fn test_to_json_pretty() {
        let blocks = vec![Block::heading(1, vec![RichSpan::plain("Test")])];

        let json = to_json(&blocks, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"heading\""));
        assert!(json.contains("Test"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let blocks = vec![Block::paragraph(vec![RichSpan::plain("x")])];

        let json = to_json(&blocks, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert_eq!(from_json(&json).unwrap(), blocks);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(from_json("{not json"), Err(Error::Json(_))));
    }
}

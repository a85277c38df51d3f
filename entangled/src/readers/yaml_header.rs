//! YAML front matter recognition.
//!
//! A Markdown document may open with a `---` … `---` delimited YAML block
//! (the same convention Pandoc/Jekyll/Quarto use). Entangled reads it for
//! two reasons: to recover a per-document `entangled:` config overlay, and
//! so line numbers reported against the remainder of the document can be
//! corrected back to their position in the original file.

use std::collections::HashMap;

use serde_yaml::Value;

use crate::errors::Result;
use crate::text_location::TextLocation;

/// A recognized YAML front matter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlHeader {
    /// The raw YAML body, between the delimiters (exclusive).
    pub content: String,
    /// Number of lines of the original input occupied by the header,
    /// including both `---` delimiter lines. A caller that reparses the
    /// remainder of the input (lines after the header) must add this many
    /// lines to any 1-based line number it computes, to recover the
    /// corresponding line number in the original file.
    pub lines_consumed: usize,
    /// Location of the opening delimiter.
    pub location: TextLocation,
}

/// Splits `input` into an optional YAML header and the remaining text.
///
/// Recognizes a header only when the very first line is exactly `---`;
/// the header ends at the next line that is exactly `---` or `...`. A
/// `---` with no matching close is not a header at all (returned as
/// ordinary content), since an unterminated header can't be round-tripped.
pub fn split_yaml_header(input: &str) -> (Option<YamlHeader>, String) {
    let lines: Vec<&str> = input.lines().collect();

    if lines.first().map(str::trim_end) != Some("---") {
        return (None, input.to_string());
    }

    let close_idx = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| matches!(line.trim_end(), "---" | "..."));

    let Some((close_idx, _)) = close_idx else {
        return (None, input.to_string());
    };

    let header_content = lines[1..close_idx].join("\n");
    let remaining = lines[close_idx + 1..].join("\n");

    let header = YamlHeader {
        content: header_content,
        lines_consumed: close_idx + 1,
        location: TextLocation::line_only(1),
    };

    (Some(header), remaining)
}

/// Extracts just the YAML header from `input`, discarding the remainder.
pub fn extract_yaml_header(input: &str) -> Option<YamlHeader> {
    split_yaml_header(input).0
}

/// Parses a YAML mapping body into a generic value tree.
///
/// Used for the per-document `entangled:` config overlay (§4.1) and for
/// hooks that accept free-form YAML configuration. "Simple" refers to the
/// accepted shape, not a restricted parser: any valid YAML mapping is
/// supported, via `serde_yaml`, the same as the rest of the config layer.
pub fn parse_simple_yaml(content: &str) -> Result<HashMap<String, Value>> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let value: Value = serde_yaml::from_str(content)?;
    match value {
        Value::Mapping(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| k.as_str().map(|s| (s.to_string(), v)))
            .collect()),
        Value::Null => Ok(HashMap::new()),
        other => {
            let mut map = HashMap::new();
            map.insert(String::new(), other);
            Ok(map)
        }
    }
}

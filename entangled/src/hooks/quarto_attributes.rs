//! Quarto-style `#|` attribute header hook.
//!
//! Lets a bare `BASIC`-style fence (language only, no `{.python #id}`
//! braces) still carry an id, classes and attributes by writing them as
//! leading comment lines inside the block instead of in the fence info
//! string:
//!
//!   python fence, then on its own leading lines:
//!     #| id: main
//!     #| classes: important
//!     #| creates: out.bin
//!   followed by the real body, e.g. `print("hi")`.

use crate::errors::Result;
use crate::model::{CodeBlock, Property};

use super::Hook;

/// Hook that lifts a block's leading `#|`/`//|`/`--|` comment lines into
/// `Id`/`Class`/`Attribute` properties, so BASIC-style fences (which have
/// no room for Pandoc attributes in the info string) can still express
/// them in the body.
#[derive(Debug, Clone, Default)]
pub struct QuartoAttributesHook;

impl QuartoAttributesHook {
    /// Creates a new quarto attributes hook.
    pub fn new() -> Self {
        Self
    }
}

/// Strips a recognized comment-prefixed header marker (`#|`, `//|`, `--|`)
/// from the start of a line, returning the remainder.
fn strip_header_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    for marker in ["#|", "//|", "--|"] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    None
}

/// Parses a single header line's content as `key: value` or `key=value`.
fn parse_header_line(rest: &str) -> Option<(String, String)> {
    let (key, value) = if let Some((k, v)) = rest.split_once(':') {
        (k, v)
    } else {
        rest.split_once('=')?
    };
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"').trim_matches('\'');
    Some((key.to_string(), value.to_string()))
}

/// Consumes consecutive leading `#|`/`//|`/`--|` lines from `content`,
/// returning the properties they contribute, the remaining content, and
/// the consumed lines joined by newlines (for appending to `open_line`).
///
/// Returns `None` for the header text when no such line was found, in
/// which case `content` is returned unchanged.
pub(crate) fn extract_header(content: &str) -> (Vec<Property>, String, Option<String>) {
    let mut consumed_lines = Vec::new();
    let mut properties = Vec::new();
    let mut rest_lines = content.lines();

    loop {
        let Some(line) = rest_lines.clone().next() else {
            break;
        };
        let Some(header) = strip_header_marker(line) else {
            break;
        };
        if let Some((key, value)) = parse_header_line(header) {
            match key.as_str() {
                "id" => properties.push(Property::Id(value)),
                "classes" => {
                    for class in value.split([',', ' ']).filter(|s| !s.is_empty()) {
                        properties.push(Property::Class(class.to_string()));
                    }
                }
                _ => properties.push(Property::Attribute(key, value)),
            }
        }
        consumed_lines.push(line.to_string());
        rest_lines.next();
    }

    if consumed_lines.is_empty() {
        return (Vec::new(), content.to_string(), None);
    }

    let remaining: Vec<&str> = rest_lines.collect();
    (properties, remaining.join("\n"), Some(consumed_lines.join("\n")))
}

impl Hook for QuartoAttributesHook {
    fn name(&self) -> &str {
        "quarto_attributes"
    }

    fn priority(&self) -> i32 {
        // Must run before name/target resolution contributes Id/Attribute
        // properties to the reference map.
        10
    }

    fn on_read(&self, block: &mut CodeBlock) -> Result<()> {
        if block.language.is_none() {
            return Ok(());
        }

        let (properties, remaining, header) = extract_header(&block.source);
        let Some(header) = header else {
            return Ok(());
        };

        block.source = remaining;
        block.properties.items.extend(properties);
        block.open_line = if block.open_line.is_empty() {
            header
        } else {
            format!("{}\n{}", block.open_line, header)
        };

        Ok(())
    }
}

//! Delimited token extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{EntangledError, Result};
use crate::text_location::TextLocation;

/// Pattern for matching code fence openings.
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<indent>\s*)(?P<fence>`{3,}|~{3,})(?P<info>.*)$").unwrap());

/// A delimited token extracted from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedToken {
    /// The info string from the opening delimiter.
    pub info: String,
    /// The content between delimiters.
    pub content: String,
    /// Location of the opening delimiter.
    pub location: TextLocation,
    /// Indentation of the code fence.
    pub indent: String,
}

/// Result of attempting to extract a delimited token.
#[derive(Debug)]
pub enum ExtractResult {
    /// Successfully extracted a token.
    Token(DelimitedToken),
    /// No opening delimiter found, returns the line.
    NotDelimited(String),
    /// Unclosed delimiter (reached end of input).
    Unclosed {
        info: String,
        content: String,
        location: TextLocation,
    },
}

/// Extracts delimited tokens (code blocks) from lines.
pub struct DelimitedTokenGetter {
    /// Current line number (1-indexed).
    line_number: usize,
}

impl DelimitedTokenGetter {
    /// Creates a new getter.
    pub fn new() -> Self {
        Self { line_number: 1 }
    }

    /// Creates a new getter starting at a specific line.
    pub fn at_line(line: usize) -> Self {
        Self { line_number: line }
    }

    /// Extracts the next token from the line iterator.
    ///
    /// A close line is only recognized as such when its own indent matches
    /// the opener's exactly. A close line indented less than the opener is
    /// malformed (raises `IndentationError`); one indented more but
    /// otherwise different is left as ordinary block content.
    pub fn extract<'a, I>(&mut self, lines: &mut I) -> Option<Result<ExtractResult>>
    where
        I: Iterator<Item = &'a str>,
    {
        let line = lines.next()?;
        let start_line = self.line_number;
        self.line_number += 1;

        // Check for fence opening
        let Some(caps) = FENCE_OPEN.captures(line) else {
            return Some(Ok(ExtractResult::NotDelimited(line.to_string())));
        };

        let indent = caps["indent"].to_string();
        let fence = &caps["fence"];
        let info = caps["info"].trim().to_string();
        let fence_char = fence.chars().next().unwrap();
        let fence_len = fence.len();

        // Build closing pattern: same or more fence chars, capturing the
        // close line's own indent so it can be compared to the opener's.
        let close_pattern = format!(r"^(?P<indent>\s*){}{{{},}}\s*$", fence_char, fence_len);
        let close_regex = Regex::new(&close_pattern).unwrap();

        let mut content_lines = Vec::new();

        // Collect content until closing fence
        loop {
            match lines.next() {
                Some(content_line) => {
                    let content_line_number = self.line_number;
                    self.line_number += 1;

                    if let Some(close_caps) = close_regex.captures(content_line) {
                        let close_indent = close_caps["indent"].to_string();

                        if close_indent == indent {
                            let content = content_lines.join("\n");
                            return Some(Ok(ExtractResult::Token(DelimitedToken {
                                info,
                                content,
                                location: TextLocation::line_only(start_line),
                                indent,
                            })));
                        } else if close_indent.len() < indent.len() {
                            return Some(Err(EntangledError::IndentationError(
                                TextLocation::line_only(content_line_number),
                            )));
                        }
                        // Indented more (or differently) than the opener: not a
                        // real close, fall through and treat it as content.
                    }

                    // Strip indent from content if present
                    let stripped = if content_line.starts_with(&indent) {
                        &content_line[indent.len()..]
                    } else {
                        content_line
                    };
                    content_lines.push(stripped.to_string());
                }
                None => {
                    // Reached end without closing fence
                    let content = content_lines.join("\n");
                    return Some(Ok(ExtractResult::Unclosed {
                        info,
                        content,
                        location: TextLocation::line_only(start_line),
                    }));
                }
            }
        }
    }
}

impl Default for DelimitedTokenGetter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to extract all tokens from a string.
pub fn extract_all_tokens(input: &str) -> Result<Vec<ExtractResult>> {
    let mut getter = DelimitedTokenGetter::new();
    let mut lines = input.lines().peekable();
    let mut results = Vec::new();

    while lines.peek().is_some() {
        if let Some(result) = getter.extract(&mut lines) {
            results.push(result?);
        }
    }

    Ok(results)
}

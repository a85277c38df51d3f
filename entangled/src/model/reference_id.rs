//! Reference IDs for uniquely identifying code blocks.

use std::fmt;
use std::path::{Path, PathBuf};

use super::ReferenceName;

/// A reference ID uniquely identifies a code block instance.
///
/// Multiple code blocks can share a name within the same file (they
/// concatenate in document order), so identity additionally needs the
/// originating file and an ordinal counting prior occurrences of the same
/// `(name, file)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceId {
    /// The reference name.
    pub name: ReferenceName,
    /// The Markdown file this occurrence was read from.
    pub file: PathBuf,
    /// The ordinal (0-indexed) among blocks sharing `(name, file)`.
    pub ord: usize,
}

impl ReferenceId {
    /// Creates a new ReferenceId.
    pub fn new(name: ReferenceName, file: impl Into<PathBuf>, ord: usize) -> Self {
        Self {
            name,
            file: file.into(),
            ord,
        }
    }

    /// Creates a ReferenceId with ordinal 0.
    pub fn first(name: ReferenceName, file: impl Into<PathBuf>) -> Self {
        Self::new(name, file, 0)
    }

    /// The textual form `file#name[ord]`, with `ord` literally `init` when
    /// it is the first occurrence — matching the annotation marker format
    /// emitted by the tangler.
    pub fn marker(&self, file_posix: &str) -> String {
        let ord_token = if self.ord == 0 {
            "init".to_string()
        } else {
            self.ord.to_string()
        };
        format!("{}#{}[{}]", file_posix, self.name.qualified(), ord_token)
    }

    /// Parses the `file#name[ord|init]` textual form. The `file#` prefix is
    /// optional — a marker with no file component (as emitted when the
    /// caller doesn't carry a Markdown path) parses with an empty file.
    pub fn parse(s: &str) -> Option<Self> {
        let (file_and_name, rest) = s.rsplit_once('[')?;
        let ord_str = rest.strip_suffix(']')?;
        let ord = if ord_str == "init" {
            0
        } else {
            ord_str.parse::<usize>().ok()?
        };
        let (file, name) = match file_and_name.split_once('#') {
            Some((file, name)) => (file, name),
            None => ("", file_and_name),
        };
        Some(Self::new(ReferenceName::new(name), Path::new(file), ord))
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}[{}]",
            self.file.display(),
            self.name,
            self.ord
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id = ReferenceId::new(ReferenceName::new("test"), "doc.md", 5);
        assert_eq!(id.name.as_str(), "test");
        assert_eq!(id.ord, 5);
        assert_eq!(id.file, PathBuf::from("doc.md"));
    }

    #[test]
    fn test_first() {
        let id = ReferenceId::first(ReferenceName::new("main"), "doc.md");
        assert_eq!(id.ord, 0);
    }

    #[test]
    fn test_marker_init() {
        let id = ReferenceId::first(ReferenceName::new("hello.py"), "input.md");
        assert_eq!(id.marker("input.md"), "input.md#hello.py[init]");
    }

    #[test]
    fn test_marker_non_init() {
        let id = ReferenceId::new(ReferenceName::new("f"), "input.md", 2);
        assert_eq!(id.marker("input.md"), "input.md#f[2]");
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = ReferenceId::parse("input.md#test::name[3]").unwrap();
        assert_eq!(id.name.qualified(), "test::name");
        assert_eq!(id.ord, 3);
        assert_eq!(id.file, PathBuf::from("input.md"));
    }

    #[test]
    fn test_parse_init() {
        let id = ReferenceId::parse("input.md#main[init]").unwrap();
        assert_eq!(id.ord, 0);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ReferenceId::parse("no_brackets").is_none());
        assert!(ReferenceId::parse("bad#name[count]").is_none());
        assert!(ReferenceId::parse("unclosed#name[3").is_none());
    }

    #[test]
    fn test_equality() {
        let id1 = ReferenceId::new(ReferenceName::new("test"), "doc.md", 1);
        let id2 = ReferenceId::new(ReferenceName::new("test"), "doc.md", 1);
        let id3 = ReferenceId::new(ReferenceName::new("test"), "doc.md", 2);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }
}

//! Code block representation.

use super::properties::Properties;
use super::reference_id::ReferenceId;
use super::reference_name::ReferenceName;
use crate::text_location::TextLocation;

/// A code block extracted from a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Unique identifier for this code block instance.
    pub id: ReferenceId,

    /// Parsed properties from the code fence (classes, id, attributes).
    pub properties: Properties,

    /// The language identifier (e.g., "python", "rust"), derived from the
    /// first class that resolves to a known `Language`.
    pub language: Option<String>,

    /// Shared whitespace prefix of the fenced block as it appeared in
    /// Markdown.
    pub indent: String,

    /// The raw opening fence line, preserved for exact round-trip.
    pub open_line: String,

    /// The raw closing fence line, preserved for exact round-trip.
    pub close_line: String,

    /// Target output file, if specified via `file=`.
    pub target: Option<std::path::PathBuf>,

    /// The dedented source code content.
    pub source: String,

    /// Location in the source document.
    pub origin: TextLocation,

    /// A leading line (shebang or SPDX identifier) a hook moved out of
    /// `source` so it is emitted before the annotation wrapper.
    pub header: Option<String>,

    /// Optional octal file permission parsed from a `mode=` attribute.
    pub mode: Option<u32>,

    /// Namespace this block belongs to, inherited from the enclosing file
    /// or an explicit `namespace=` attribute.
    pub namespace: Vec<String>,
}

impl CodeBlock {
    /// Creates a new CodeBlock with empty properties and no target/header.
    pub fn new(
        id: ReferenceId,
        language: Option<String>,
        source: String,
        origin: TextLocation,
    ) -> Self {
        Self {
            id,
            properties: Properties::default(),
            language,
            indent: String::new(),
            open_line: String::new(),
            close_line: String::new(),
            target: None,
            source,
            origin,
            header: None,
            mode: None,
            namespace: Vec::new(),
        }
    }

    /// Returns the reference name for this block.
    pub fn name(&self) -> &ReferenceName {
        &self.id.name
    }

    /// Returns true if this block has a target file.
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Returns the line count of the source.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    /// Returns true if the source is empty or whitespace only.
    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Sets the target file.
    pub fn with_target(mut self, target: std::path::PathBuf) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the parsed properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the fence indentation.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Sets the raw open/close fence lines.
    pub fn with_fence_lines(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open_line = open.into();
        self.close_line = close.into();
        self
    }

    /// Sets the inherited namespace.
    pub fn with_namespace(mut self, namespace: Vec<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Sets the octal file mode.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Appends an additional class property.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.properties.items.push(super::properties::Property::Class(class.into()));
        self
    }

    /// Appends a key/value attribute property.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .items
            .push(super::properties::Property::Attribute(key.into(), value.into()));
        self
    }

    /// Gets an attribute value by key, delegating to parsed properties.
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.properties.get_attribute(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_id(name: &str, ord: usize) -> ReferenceId {
        ReferenceId::new(ReferenceName::new(name), "doc.md", ord)
    }

    #[test]
    fn test_new_code_block() {
        let block = CodeBlock::new(
            make_id("main", 0),
            Some("python".to_string()),
            "print('hello')".to_string(),
            TextLocation::line_only(10),
        );

        assert_eq!(block.name().base_name(), "main");
        assert_eq!(block.language, Some("python".to_string()));
        assert_eq!(block.source, "print('hello')");
        assert_eq!(block.origin.line, 10);
    }

    #[test]
    fn test_with_target() {
        let block = CodeBlock::new(
            make_id("main", 0),
            Some("python".to_string()),
            "".to_string(),
            TextLocation::default(),
        )
        .with_target(std::path::PathBuf::from("output.py"));

        assert!(block.has_target());
        assert_eq!(block.target, Some(std::path::PathBuf::from("output.py")));
    }

    #[test]
    fn test_line_count() {
        let block = CodeBlock::new(
            make_id("test", 0),
            None,
            "line1\nline2\nline3".to_string(),
            TextLocation::default(),
        );

        assert_eq!(block.line_count(), 3);
    }

    #[test]
    fn test_is_empty() {
        let empty = CodeBlock::new(
            make_id("empty", 0),
            None,
            "   \n  ".to_string(),
            TextLocation::default(),
        );
        assert!(empty.is_empty());

        let non_empty = CodeBlock::new(
            make_id("non_empty", 0),
            None,
            "code".to_string(),
            TextLocation::default(),
        );
        assert!(!non_empty.is_empty());
    }

    #[test]
    fn test_header_and_mode() {
        let block = CodeBlock::new(
            make_id("test", 0),
            Some("python".to_string()),
            "print(1)".to_string(),
            TextLocation::default(),
        )
        .with_mode(0o755);

        assert_eq!(block.mode, Some(0o755));
        assert!(block.header.is_none());
    }

    #[test]
    fn test_with_class_and_attribute() {
        let block = CodeBlock::new(make_id("main", 0), None, "".to_string(), TextLocation::default())
            .with_class("build")
            .with_attribute("creates", "out.bin");

        assert_eq!(block.properties.classes(), vec!["build"]);
        assert_eq!(block.properties.get_attribute("creates"), Some("out.bin"));
    }
}

//! Content types for representing a Markdown document as an ordered
//! sequence of plain text and code-block references.

use super::reference_id::ReferenceId;

/// One item of a document's content list.
///
/// Reconstructing the original Markdown is a fold over this list: text is
/// emitted verbatim, each reference is replaced by the indented, fenced
/// text of its code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A run of plain (non-fenced) Markdown text, verbatim.
    Text(String),
    /// A code block, identified by its reference ID.
    Ref(ReferenceId),
}

impl Content {
    /// Creates a text content item.
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    /// Creates a reference content item.
    pub fn reference(id: ReferenceId) -> Self {
        Content::Ref(id)
    }

    /// Returns true if this is a code-block reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, Content::Ref(_))
    }

    /// Returns the referenced ID, if this is a reference item.
    pub fn as_reference(&self) -> Option<&ReferenceId> {
        match self {
            Content::Ref(id) => Some(id),
            Content::Text(_) => None,
        }
    }
}

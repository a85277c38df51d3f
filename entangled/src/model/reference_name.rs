//! Reference names for code blocks.

use std::fmt;
use std::path::Path;

/// A reference name identifies a named code block.
///
/// Names are namespace-qualified: `module::submodule::name` carries the
/// namespace `["module", "submodule"]` and base name `"name"`. Unqualified
/// names (no `::`) carry an empty namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceName {
    namespace: Vec<String>,
    name: String,
}

impl ReferenceName {
    /// Creates a new ReferenceName, splitting `::`-separated segments into
    /// namespace + base name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::parse(&name.into())
    }

    /// Parses a `::`-qualified textual form into namespace + name.
    pub fn parse(text: &str) -> Self {
        let mut parts: Vec<String> = text.split("::").map(str::to_string).collect();
        let name = parts.pop().unwrap_or_default();
        Self {
            namespace: parts,
            name,
        }
    }

    /// Builds a reference name from an explicit namespace and base name.
    pub fn with_namespace(namespace: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Builds the implicit reference name for a file-only code block — one
    /// with a `file=` target but no explicit `#id`. The name is the
    /// forward-slash-normalized path itself, unqualified, so a second block
    /// with the same `file=` target concatenates into the same name.
    pub fn from_file_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            namespace: Vec::new(),
            name: path,
        }
    }

    /// The namespace segments, outermost first.
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// The base name (last segment).
    pub fn base_name(&self) -> &str {
        &self.name
    }

    /// All segments including the base name, outermost first.
    pub fn namespace_parts(&self) -> Vec<&str> {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect()
    }

    /// The full `::`-joined textual form, e.g. `"a::b::c"`.
    pub fn qualified(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace.join("::"), self.name)
        }
    }

    /// Returns the qualified textual form.
    ///
    /// Kept as its own method (rather than relying only on `Display`) so
    /// call sites reading like `name.as_str() == "..."` keep working after
    /// the string-prefix encoding of file targets was dropped in favor of
    /// `CodeBlock::target` / `ReferenceMap::targets`.
    pub fn as_str(&self) -> String {
        self.qualified()
    }

    /// Returns true if this name has no namespace segments.
    pub fn is_unqualified(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Resolves an unqualified name against an enclosing namespace.
    ///
    /// If `self` already carries a namespace it is returned unchanged —
    /// only bare `<<name>>` references inherit the current block's
    /// namespace.
    pub fn resolve_in(&self, enclosing: &[String]) -> Self {
        if self.namespace.is_empty() && !enclosing.is_empty() {
            Self {
                namespace: enclosing.to_vec(),
                name: self.name.clone(),
            }
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

impl From<String> for ReferenceName {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for ReferenceName {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

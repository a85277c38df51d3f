//! Default namespace policy for unqualified `#id` blocks.

use serde::{Deserialize, Serialize};

/// Controls whether an unqualified `#id` is prefixed with a namespace
/// derived from its containing file.
///
/// Per §4.2, a block's namespace is resolved as: explicit `namespace`
/// config value, else per-document YAML setting, else (if this is
/// `File`) the file's POSIX path, else empty. `File` is the default so
/// two documents can reuse the same short id without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceDefault {
    /// Prefix unqualified ids with their containing file's name.
    #[default]
    File,

    /// No implicit namespace; ids are used exactly as written.
    None,
}

impl NamespaceDefault {
    /// Returns the namespace prefix to apply for a block read from `filename`,
    /// or `None` if no implicit prefix should be applied.
    pub fn prefix_for(&self, filename: &str) -> Option<String> {
        match self {
            NamespaceDefault::File => Some(filename.to_string()),
            NamespaceDefault::None => None,
        }
    }
}

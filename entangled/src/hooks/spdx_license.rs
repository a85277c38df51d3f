//! SPDX license header extraction hook.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::Result;
use crate::model::CodeBlock;

use super::Hook;

/// Pattern for an SPDX license identifier comment.
static SPDX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:#|//|--)\s*SPDX-License-Identifier:\s*(.+)$").unwrap());

/// Hook that moves a leading SPDX-License-Identifier comment out of
/// `block.source` and into `block.header`.
#[derive(Debug, Clone, Default)]
pub struct SpdxLicenseHook;

impl SpdxLicenseHook {
    /// Creates a new SPDX license hook.
    pub fn new() -> Self {
        Self
    }
}

impl Hook for SpdxLicenseHook {
    fn name(&self) -> &str {
        "spdx_license"
    }

    fn on_read(&self, block: &mut CodeBlock) -> Result<()> {
        if block.header.is_some() {
            return Ok(());
        }
        let Some(first_line) = block.source.lines().next() else {
            return Ok(());
        };
        if !SPDX_PATTERN.is_match(first_line) {
            return Ok(());
        }

        let header = first_line.to_string();
        let rest_start = first_line.len();
        let rest = block.source[rest_start..].trim_start_matches('\n').to_string();

        block.header = Some(header);
        block.source = rest;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_on_read_moves_spdx_to_header() {
        let hook = SpdxLicenseHook::new();
        let mut block = test_utils::make_block_lang(
            "test",
            "// SPDX-License-Identifier: MIT\nfn main() {}",
            "rust",
        );

        hook.on_read(&mut block).unwrap();

        assert_eq!(
            block.header.as_deref(),
            Some("// SPDX-License-Identifier: MIT")
        );
        assert_eq!(block.source, "fn main() {}");
    }

    #[test]
    fn test_on_read_hash_comment_spdx() {
        let hook = SpdxLicenseHook::new();
        let mut block =
            test_utils::make_block("test", "# SPDX-License-Identifier: Apache-2.0\nprint(1)");

        hook.on_read(&mut block).unwrap();

        assert_eq!(
            block.header.as_deref(),
            Some("# SPDX-License-Identifier: Apache-2.0")
        );
        assert_eq!(block.source, "print(1)");
    }

    #[test]
    fn test_on_read_no_spdx_is_noop() {
        let hook = SpdxLicenseHook::new();
        let mut block = test_utils::make_block("test", "fn main() {}");

        hook.on_read(&mut block).unwrap();

        assert!(block.header.is_none());
    }

    #[test]
    fn test_on_read_only_first_line_considered() {
        let hook = SpdxLicenseHook::new();
        let mut block = test_utils::make_block(
            "test",
            "fn main() {}\n// SPDX-License-Identifier: MIT",
        );

        hook.on_read(&mut block).unwrap();

        assert!(block.header.is_none());
    }
}

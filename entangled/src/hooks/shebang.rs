//! Shebang extraction hook.

use crate::errors::Result;
use crate::model::CodeBlock;

use super::Hook;

/// Hook that moves a leading shebang line (`#!...`) out of `block.source`
/// and into `block.header`, so the tangler emits it before the annotation
/// wrapper instead of inside it.
#[derive(Debug, Clone, Default)]
pub struct ShebangHook;

impl ShebangHook {
    /// Creates a new shebang hook.
    pub fn new() -> Self {
        Self
    }
}

impl Hook for ShebangHook {
    fn name(&self) -> &str {
        "shebang"
    }

    fn on_read(&self, block: &mut CodeBlock) -> Result<()> {
        if block.header.is_some() {
            return Ok(());
        }
        let Some(first_line) = block.source.lines().next() else {
            return Ok(());
        };
        if !first_line.starts_with("#!") {
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
    fn test_on_read_moves_shebang_to_header() {
        let hook = ShebangHook::new();
        let mut block = test_utils::make_block("test", "#!/bin/bash\necho hello");

        hook.on_read(&mut block).unwrap();

        assert_eq!(block.header.as_deref(), Some("#!/bin/bash"));
        assert_eq!(block.source, "echo hello");
    }

    #[test]
    fn test_on_read_no_shebang_is_noop() {
        let hook = ShebangHook::new();
        let mut block = test_utils::make_block("test", "echo hello");

        hook.on_read(&mut block).unwrap();

        assert!(block.header.is_none());
        assert_eq!(block.source, "echo hello");
    }

    #[test]
    fn test_on_read_single_line_shebang_only() {
        let hook = ShebangHook::new();
        let mut block = test_utils::make_block("test", "#!/usr/bin/env python");

        hook.on_read(&mut block).unwrap();

        assert_eq!(block.header.as_deref(), Some("#!/usr/bin/env python"));
        assert_eq!(block.source, "");
    }

    #[test]
    fn test_on_read_does_not_overwrite_existing_header() {
        let hook = ShebangHook::new();
        let mut block = test_utils::make_block("test", "#!/bin/sh\necho hi");
        block.header = Some("already set".to_string());

        hook.on_read(&mut block).unwrap();

        assert_eq!(block.header.as_deref(), Some("already set"));
        assert_eq!(block.source, "#!/bin/sh\necho hi");
    }
}

//! Makefile-emission hook.
//!
//! A convenience variant of [`super::TaskHook`] for projects that would
//! rather drive their build through `make` than through a separate task
//! runner reading `.entangled/tasks.json`: every `.build`-tagged block
//! becomes one Makefile rule.

use crate::errors::Result;
use crate::io::Transaction;
use crate::model::{CodeBlock, ReferenceMap};

use super::Hook;

/// Hook that emits a `Makefile` rule per `.build`-tagged block during
/// `on_tangle`.
#[derive(Debug, Clone, Default)]
pub struct BuildHook;

impl BuildHook {
    /// Creates a new build hook.
    pub fn new() -> Self {
        Self
    }

    fn target_name(block: &CodeBlock) -> String {
        block
            .get_attribute("creates")
            .map(str::to_string)
            .or_else(|| block.target.as_ref().map(|p| p.display().to_string()))
            .unwrap_or_else(|| block.name().base_name().to_string())
    }

    fn render_rule(block: &CodeBlock) -> String {
        let target = Self::target_name(block);
        let deps = block.get_attribute("requires").unwrap_or("");

        let mut rule = format!("{}: {}\n", target, deps);
        for line in block.source.lines() {
            rule.push('\t');
            rule.push_str(line);
            rule.push('\n');
        }
        rule
    }
}

impl Hook for BuildHook {
    fn name(&self) -> &str {
        "build"
    }

    fn on_tangle(&self, transaction: &mut Transaction, refs: &ReferenceMap) -> Result<()> {
        let rules: Vec<String> = refs
            .blocks()
            .filter(|block| block.properties.classes().contains(&"build"))
            .map(Self::render_rule)
            .collect();

        if rules.is_empty() {
            return Ok(());
        }

        let makefile = format!("{}\n", rules.join("\n"));
        transaction.write("Makefile", makefile);
        Ok(())
    }
}

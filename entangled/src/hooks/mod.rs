//! Hooks for extending Entangled functionality.
//!
//! A hook implements any subset of four callbacks (`on_read`, `pre_tangle`,
//! `on_tangle`, `post_tangle`) via default no-op bodies on the `Hook`
//! trait, plus a `priority()` that orders `on_read` invocations across the
//! registry. The five standard hooks are `shebang`, `spdx_license`,
//! `quarto_attributes`, `task` (the `brei` build-manifest hook) and
//! `build` (Makefile emission).

mod build;
mod quarto_attributes;
mod shebang;
mod spdx_license;
mod task;

pub use build::BuildHook;
pub use quarto_attributes::QuartoAttributesHook;
pub(crate) use quarto_attributes::extract_header as extract_quarto_attributes_header;
pub use shebang::ShebangHook;
pub use spdx_license::SpdxLicenseHook;
pub use task::TaskHook;

use crate::errors::Result;
use crate::io::Transaction;
use crate::model::{CodeBlock, ReferenceMap};

/// A hook that can extend Entangled's read and tangle phases.
///
/// All callbacks default to a no-op so a hook only needs to override the
/// phases it actually participates in.
pub trait Hook: Send + Sync {
    /// Returns the name of this hook, matched against `HooksConfig` names.
    fn name(&self) -> &str;

    /// Controls `on_read` ordering across the registry. Hooks that must
    /// run before name/target resolution (e.g. `quarto_attributes`, which
    /// contributes `Id`/`Class`/`Attribute` properties) use a lower number.
    fn priority(&self) -> i32 {
        100
    }

    /// Mutates a freshly-parsed block in place, before it is inserted into
    /// the `ReferenceMap` (so it can still influence name/target
    /// resolution).
    fn on_read(&self, _block: &mut CodeBlock) -> Result<()> {
        Ok(())
    }

    /// Inspects the fully-populated reference map before any target is
    /// tangled, e.g. to collect recipe-like blocks for a later manifest.
    fn pre_tangle(&self, _refs: &ReferenceMap) -> Result<()> {
        Ok(())
    }

    /// Contributes additional writes to the transaction once tangling of
    /// the named targets has been planned (e.g. a generated build
    /// manifest or Makefile).
    fn on_tangle(&self, _transaction: &mut Transaction, _refs: &ReferenceMap) -> Result<()> {
        Ok(())
    }

    /// Runs after all targets have been tangled, for hooks that need the
    /// final written set rather than just the reference map.
    fn post_tangle(&self, _refs: &ReferenceMap) -> Result<()> {
        Ok(())
    }
}

/// Registry of hooks, kept sorted by priority as hooks are added.
pub struct HookRegistry {
    hooks: Vec<Box<dyn Hook>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookRegistry")
            .field("hooks", &names)
            .finish()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Adds a hook to the registry and re-sorts by priority.
    pub fn add<H: Hook + 'static>(&mut self, hook: H) {
        self.hooks.push(Box::new(hook));
        self.hooks.sort_by_key(|h| h.priority());
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Returns true if a hook with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.hooks.iter().any(|h| h.name() == name)
    }

    /// Runs all `on_read` hooks against a block, in priority order.
    pub fn run_on_read(&self, block: &mut CodeBlock) -> Result<()> {
        for hook in &self.hooks {
            hook.on_read(block)?;
        }
        Ok(())
    }

    /// Runs all `pre_tangle` hooks.
    pub fn run_pre_tangle(&self, refs: &ReferenceMap) -> Result<()> {
        for hook in &self.hooks {
            hook.pre_tangle(refs)?;
        }
        Ok(())
    }

    /// Runs all `on_tangle` hooks, letting each contribute transaction
    /// actions of its own.
    pub fn run_on_tangle(&self, transaction: &mut Transaction, refs: &ReferenceMap) -> Result<()> {
        for hook in &self.hooks {
            hook.on_tangle(transaction, refs)?;
        }
        Ok(())
    }

    /// Runs all `post_tangle` hooks.
    pub fn run_post_tangle(&self, refs: &ReferenceMap) -> Result<()> {
        for hook in &self.hooks {
            hook.post_tangle(refs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_registry_empty() {
        let registry = HookRegistry::new();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_add_and_contains() {
        let mut registry = HookRegistry::new();
        registry.add(ShebangHook::new());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("shebang"));
        assert!(!registry.contains("spdx_license"));
    }

    #[test]
    fn test_run_on_read_applies_all_hooks() {
        let mut registry = HookRegistry::new();
        registry.add(ShebangHook::new());
        registry.add(SpdxLicenseHook::new());

        let mut block =
            test_utils::make_block("test", "#!/usr/bin/env python\nprint('hi')");
        registry.run_on_read(&mut block).unwrap();

        assert_eq!(block.header.as_deref(), Some("#!/usr/bin/env python"));
        assert_eq!(block.source, "print('hi')");
    }

    #[test]
    fn test_sorted_by_priority() {
        let mut registry = HookRegistry::new();
        registry.add(ShebangHook::new());
        registry.add(QuartoAttributesHook::new());
        // quarto_attributes has a lower priority than shebang, so it should
        // have been inserted first after sorting.
        assert_eq!(registry.hooks[0].name(), "quarto_attributes");
    }
}

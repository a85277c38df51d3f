//! Build-task manifest hook ("brei").
//!
//! Collects blocks tagged `.task` into recipe records and writes them as a
//! JSON manifest a separate build runner can execute. Entangled itself
//! never runs the recipes; it only emits the manifest the runner reads.

use std::sync::Mutex;

use serde::Serialize;

use crate::errors::Result;
use crate::io::Transaction;
use crate::model::ReferenceMap;

use super::Hook;

/// One `.task`-tagged block's recipe, as read from its attributes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskRecipe {
    /// The reference name of the block, fully qualified.
    pub name: String,
    /// Human-readable description (`description=` attribute).
    pub description: Option<String>,
    /// Path(s) this recipe produces (`creates=` attribute).
    pub creates: Option<String>,
    /// Path(s) this recipe depends on (`requires=` attribute).
    pub requires: Option<String>,
    /// Interpreter/command that runs the block body (`runner=` attribute).
    pub runner: Option<String>,
    /// Where to send the recipe's stdout (`stdout=` attribute).
    pub stdout: Option<String>,
    /// What to feed the recipe's stdin (`stdin=` attribute).
    pub stdin: Option<String>,
    /// Whether to collect output into the reference map (`collect=` attribute).
    pub collect: Option<String>,
    /// The recipe body.
    pub script: String,
}

/// Hook that scans the reference map for `.task`-tagged blocks during
/// `pre_tangle` and writes a `.entangled/tasks.json` manifest during
/// `on_tangle`.
#[derive(Debug, Default)]
pub struct TaskHook {
    recipes: Mutex<Vec<TaskRecipe>>,
}

impl TaskHook {
    /// Creates a new task hook.
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_recipes(refs: &ReferenceMap) -> Vec<TaskRecipe> {
        refs.blocks()
            .filter(|block| block.properties.classes().contains(&"task"))
            .map(|block| TaskRecipe {
                name: block.name().qualified(),
                description: block.get_attribute("description").map(str::to_string),
                creates: block.get_attribute("creates").map(str::to_string),
                requires: block.get_attribute("requires").map(str::to_string),
                runner: block.get_attribute("runner").map(str::to_string),
                stdout: block.get_attribute("stdout").map(str::to_string),
                stdin: block.get_attribute("stdin").map(str::to_string),
                collect: block.get_attribute("collect").map(str::to_string),
                script: block.source.clone(),
            })
            .collect()
    }
}

impl Hook for TaskHook {
    fn name(&self) -> &str {
        "task"
    }

    fn pre_tangle(&self, refs: &ReferenceMap) -> Result<()> {
        let recipes = Self::collect_recipes(refs);
        *self.recipes.lock().unwrap() = recipes;
        Ok(())
    }

    fn on_tangle(&self, transaction: &mut Transaction, refs: &ReferenceMap) -> Result<()> {
        let recipes = self.recipes.lock().unwrap();
        let recipes = if recipes.is_empty() {
            // `pre_tangle` may not have run against this map (e.g. a caller
            // invoking `on_tangle` directly); fall back to scanning here.
            Self::collect_recipes(refs)
        } else {
            recipes.clone()
        };

        if recipes.is_empty() {
            return Ok(());
        }

        let manifest = serde_json::to_string_pretty(&recipes)?;
        transaction.write(".entangled/tasks.json", manifest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn task_block(name: &str, script: &str) -> crate::model::CodeBlock {
        test_utils::make_block(name, script)
            .with_class("task")
            .with_attribute("creates", "out.bin")
            .with_attribute("runner", "sh")
    }

    #[test]
    fn test_pre_tangle_collects_task_blocks() {
        let hook = TaskHook::new();
        let mut refs = ReferenceMap::new();
        refs.insert(task_block("build", "gcc -o out.bin main.c"));
        refs.insert(test_utils::make_block("plain", "not a task"));

        hook.pre_tangle(&refs).unwrap();

        let recipes = hook.recipes.lock().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "build");
        assert_eq!(recipes[0].creates.as_deref(), Some("out.bin"));
        assert_eq!(recipes[0].runner.as_deref(), Some("sh"));
    }

    #[test]
    fn test_on_tangle_writes_manifest() {
        let hook = TaskHook::new();
        let mut refs = ReferenceMap::new();
        refs.insert(task_block("build", "gcc -o out.bin main.c"));

        hook.pre_tangle(&refs).unwrap();

        let mut tx = Transaction::new();
        hook.on_tangle(&mut tx, &refs).unwrap();

        assert_eq!(tx.len(), 1);
        assert_eq!(tx.describe(), vec!["write .entangled/tasks.json"]);
    }

    #[test]
    fn test_on_tangle_no_tasks_is_noop() {
        let hook = TaskHook::new();
        let refs = ReferenceMap::new();

        let mut tx = Transaction::new();
        hook.on_tangle(&mut tx, &refs).unwrap();

        assert!(tx.is_empty());
    }
}

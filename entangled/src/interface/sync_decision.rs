//! Sync decision: compares the persisted `FileDB` against the filesystem
//! to choose whether a `sync` invocation should tangle, stitch, do
//! nothing, or report a conflict — without performing any of those
//! actions itself. The CLI's `sync` command and the `watch` daemon drive
//! off this decision; this module only answers the query.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::errors::Result;
use crate::io::FileData;

use super::context::Context;

/// The action a `sync` invocation should take, decided by comparing the
/// file database against the current state of the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// A Markdown source is new or changed; extract code from it.
    Tangle,
    /// Only managed output files changed; pull those edits back into
    /// Markdown, then re-tangle so annotation markers stay consistent.
    StitchThenTangle,
    /// Nothing has changed since the last run.
    Nothing,
    /// Both a Markdown source and a managed output changed since the last
    /// run — this tool does not attempt a 3-way merge, so the caller must
    /// resolve this by hand. Lists every path that changed.
    Conflict(Vec<PathBuf>),
}

/// Decides the sync action for a project.
///
/// `expected_inputs` is the set of Markdown source paths the project is
/// currently configured to read (e.g. `ctx.source_files()`), used to
/// detect a brand new input file the database has never seen.
pub fn sync_action(ctx: &Context, expected_inputs: &[PathBuf]) -> Result<SyncAction> {
    for input in expected_inputs {
        let full = ctx.resolve_path(input);
        if !ctx.filedb.is_tracked(&full) {
            return Ok(SyncAction::Tangle);
        }
    }

    let mut changed: Vec<PathBuf> = Vec::new();
    for tracked in ctx.filedb.tracked_files() {
        let full = ctx.resolve_path(&tracked);
        let is_changed = if !full.exists() {
            true
        } else {
            let current = FileData::from_path(&full)?;
            ctx.filedb.is_modified(&tracked, &current)
        };
        if is_changed {
            changed.push(tracked);
        }
    }

    if changed.is_empty() {
        return Ok(SyncAction::Nothing);
    }

    let managed: HashSet<PathBuf> = ctx.filedb.managed_files().collect();
    let changed_set: HashSet<PathBuf> = changed.iter().cloned().collect();

    let touches_managed = changed_set.intersection(&managed).next().is_some();
    let only_managed = changed_set.is_subset(&managed);

    if !touches_managed {
        Ok(SyncAction::Tangle)
    } else if only_managed {
        Ok(SyncAction::StitchThenTangle)
    } else {
        changed.sort();
        Ok(SyncAction::Conflict(changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FileData;
    use std::fs;
    use tempfile::tempdir;

    /// Writes `rel` under the project dir and records it in the database
    /// the way a real transaction would -- keyed by its resolved, absolute
    /// path, matching what `Create`/`WriteAction::update_db` actually do.
    fn touch(ctx: &mut Context, rel: &str, content: &str) -> PathBuf {
        let full = ctx.resolve_path(std::path::Path::new(rel));
        fs::write(&full, content).unwrap();
        ctx.filedb
            .record(full.clone(), FileData::from_path(&full).unwrap());
        full
    }

    #[test]
    fn test_new_input_triggers_tangle() {
        let dir = tempdir().unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        let result = sync_action(&ctx, &[PathBuf::from("input.md")]).unwrap();
        assert_eq!(result, SyncAction::Tangle);
    }

    #[test]
    fn test_nothing_changed() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        touch(&mut ctx, "input.md", "# doc");

        let result = sync_action(&ctx, &[PathBuf::from("input.md")]).unwrap();
        assert_eq!(result, SyncAction::Nothing);
    }

    #[test]
    fn test_only_markdown_changed_triggers_tangle() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        touch(&mut ctx, "input.md", "# doc");
        fs::write(dir.path().join("input.md"), "# doc v2").unwrap();

        let result = sync_action(&ctx, &[PathBuf::from("input.md")]).unwrap();
        assert_eq!(result, SyncAction::Tangle);
    }

    #[test]
    fn test_only_managed_changed_triggers_stitch_then_tangle() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        touch(&mut ctx, "input.md", "# doc");
        let output = touch(&mut ctx, "output.py", "print(1)");
        ctx.filedb.mark_target(&output);
        fs::write(&output, "print(2)").unwrap();

        let result = sync_action(&ctx, &[PathBuf::from("input.md")]).unwrap();
        assert_eq!(result, SyncAction::StitchThenTangle);
    }

    #[test]
    fn test_both_changed_is_conflict() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        touch(&mut ctx, "input.md", "# doc");
        let output = touch(&mut ctx, "output.py", "print(1)");
        ctx.filedb.mark_target(&output);
        fs::write(dir.path().join("input.md"), "# doc v2").unwrap();
        fs::write(&output, "print(2)").unwrap();

        let result = sync_action(&ctx, &[PathBuf::from("input.md")]).unwrap();
        assert!(matches!(result, SyncAction::Conflict(_)));
    }

    #[test]
    fn test_deleted_managed_file_counts_as_changed() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        touch(&mut ctx, "input.md", "# doc");
        let output = touch(&mut ctx, "output.py", "print(1)");
        ctx.filedb.mark_target(&output);
        fs::remove_file(&output).unwrap();

        let result = sync_action(&ctx, &[PathBuf::from("input.md")]).unwrap();
        assert_eq!(result, SyncAction::StitchThenTangle);
    }
}

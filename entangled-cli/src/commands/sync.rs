//! Sync command implementation.

use entangled::errors::Result;
use entangled::interface::{
    stitch_documents, sync_action, sync_documents, tangle_documents, Context, SyncAction,
};

/// Options for the sync command.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Force overwrite even if files have been modified externally.
    pub force: bool,
    /// Dry run - show what would be done without doing it.
    pub dry_run: bool,
    /// Show unified diffs of what would change.
    pub diff: bool,
    /// Suppress normal output.
    pub quiet: bool,
}

/// Executes the sync command.
///
/// Performs stitch first (to capture any code changes), then tangle.
pub fn sync(ctx: &mut Context, options: SyncOptions) -> Result<()> {
    tracing::info!("Synchronizing documents...");

    // For diff/dry-run we mirror the real decision sync_documents() would
    // make, rather than unconditionally computing both directions.
    if options.diff || options.dry_run {
        let source_files = ctx.source_files()?;
        let decision = sync_action(ctx, &source_files)?;

        if let SyncAction::Conflict(paths) = &decision {
            if !options.force {
                return Err(entangled::errors::EntangledError::FileConflicts(
                    paths
                        .iter()
                        .map(|path| entangled::io::Conflict {
                            path: path.clone(),
                            reason: "both a Markdown source and a managed output changed"
                                .to_string(),
                        })
                        .collect(),
                ));
            }
        }

        let want_stitch = matches!(
            decision,
            SyncAction::StitchThenTangle | SyncAction::Conflict(_)
        );
        let want_tangle = !matches!(decision, SyncAction::Nothing);

        let stitch_tx = if want_stitch {
            Some(stitch_documents(ctx)?)
        } else {
            None
        };
        let tangle_tx = if want_tangle {
            Some(tangle_documents(ctx)?)
        } else {
            None
        };

        if options.diff {
            if let Some(tx) = &stitch_tx {
                for diff in tx.diffs() {
                    println!("{}", diff);
                }
            }
            if let Some(tx) = &tangle_tx {
                for diff in tx.diffs() {
                    println!("{}", diff);
                }
            }
            return Ok(());
        }

        // dry_run
        let stitch_count = stitch_tx.as_ref().map_or(0, |tx| tx.len());
        let tangle_count = tangle_tx.as_ref().map_or(0, |tx| tx.len());
        if stitch_count + tangle_count == 0 {
            if !options.quiet {
                println!("Nothing to do.");
            }
        } else {
            if let Some(tx) = &stitch_tx {
                if stitch_count > 0 {
                    println!("Would stitch {} files:", stitch_count);
                    for desc in tx.describe() {
                        println!("  {}", desc);
                    }
                }
            }
            if let Some(tx) = &tangle_tx {
                if tangle_count > 0 {
                    println!("Would tangle {} files:", tangle_count);
                    for desc in tx.describe() {
                        println!("  {}", desc);
                    }
                }
            }
        }
        return Ok(());
    }

    // Normal execution -- delegate to library
    sync_documents(ctx, options.force)?;

    if !options.quiet {
        println!("Synchronization complete.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sync_basic() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();

        fs::write(
            dir.path().join("test.md"),
            r#"
```python #main file=output.py
print('hello')
```
"#,
        )
        .unwrap();

        let options = SyncOptions::default();
        sync(&mut ctx, options).unwrap();

        // Output should be created
        assert!(dir.path().join("output.py").exists());
    }
}

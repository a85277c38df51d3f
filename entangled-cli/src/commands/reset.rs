//! Reset command implementation.

use std::fs;
use std::io::{self, Write};

use entangled::errors::Result;
use entangled::interface::Context;

/// Options for the reset command.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Also delete tangled files.
    pub delete_files: bool,
    /// Don't ask for confirmation.
    pub force: bool,
}

/// Executes the reset command.
pub fn reset(ctx: &mut Context, options: ResetOptions) -> Result<()> {
    if options.delete_files {
        // Get list of tracked files
        let tracked: Vec<_> = ctx.filedb.tracked_files().collect();

        if tracked.is_empty() {
            println!("No tracked files to delete.");
        } else {
            // Confirm unless --force is specified
            if !options.force {
                println!("This will delete {} tracked files:", tracked.len());
                for path in &tracked {
                    println!("  {}", path.display());
                }
                print!("Continue? [y/N] ");
                io::stdout().flush()?;

                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            // Delete all tracked files
            for path in &tracked {
                let full_path = ctx.resolve_path(path);
                if full_path.exists() {
                    tracing::info!("Deleting {}", full_path.display());
                    fs::remove_file(&full_path)?;
                }
            }

            println!("Deleted {} tracked files.", tracked.len());
        }
    }

    // Clear the file database
    ctx.filedb.clear();
    ctx.save_filedb()?;

    // Delete the database file itself
    if ctx.filedb_path.exists() {
        fs::remove_file(&ctx.filedb_path)?;
    }

    // Try to remove the .entangled directory if empty
    if let Some(parent) = ctx.filedb_path.parent() {
        let _ = fs::remove_dir(parent); // Ignore error if not empty
    }

    println!("Reset complete. File database cleared.");

    Ok(())
}

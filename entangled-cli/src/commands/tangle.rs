//! Tangle command implementation.

use std::path::PathBuf;

use entangled::errors::Result;
use entangled::interface::{tangle_documents, tangle_files, Context};

use super::helpers::{TransactionOptions, run_transaction};

/// Options for the tangle command.
#[derive(Debug, Clone, Default)]
pub struct TangleOptions {
    /// Force overwrite even if files have been modified externally.
    pub force: bool,
    /// Dry run - show what would be done without doing it.
    pub dry_run: bool,
    /// Show unified diffs of what would change.
    pub diff: bool,
    /// Suppress normal output.
    pub quiet: bool,
    /// Specific files to tangle (empty means all).
    pub files: Vec<PathBuf>,
}

/// Executes the tangle command.
pub fn tangle(ctx: &mut Context, options: TangleOptions) -> Result<()> {
    tracing::info!("Tangling documents...");

    let transaction = if options.files.is_empty() {
        tangle_documents(ctx)?
    } else {
        let filtered = ctx.source_files_filtered(&options.files)?;
        tangle_files(ctx, &filtered)?
    };

    run_transaction(ctx, transaction, &TransactionOptions {
        force: options.force,
        dry_run: options.dry_run,
        diff: options.diff,
        quiet: options.quiet,
    }, "tangle")
}

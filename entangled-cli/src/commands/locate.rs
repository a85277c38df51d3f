//! Locate command implementation.
//!
//! Maps a line in a tangled output file back to its markdown source.

use std::path::PathBuf;

use entangled::errors::Result;
use entangled::interface::{locate_source, Context};

/// Options for the locate command.
#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// Target file path.
    pub file: PathBuf,
    /// Line number in the target file (1-indexed).
    pub line: usize,
}

/// Executes the locate command.
///
/// Parses `file:line` and prints the corresponding markdown source location.
pub fn locate(ctx: &Context, options: LocateOptions) -> Result<()> {
    let full_path = ctx.resolve_path(&options.file);

    if !full_path.exists() {
        return Err(entangled::EntangledError::Other(format!(
            "File not found: {}",
            full_path.display()
        )));
    }

    match locate_source(ctx, &full_path, options.line)? {
        Some(loc) => {
            println!("{}", loc);
        }
        None => {
            eprintln!(
                "No source mapping for {}:{}",
                options.file.display(),
                options.line
            );
        }
    }

    Ok(())
}

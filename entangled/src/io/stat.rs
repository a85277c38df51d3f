//! File statistics and hashing.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// File statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Modification time.
    pub mtime: DateTime<Utc>,
    /// File size in bytes.
    pub size: u64,
}

impl Stat {
    /// Creates a new Stat.
    pub fn new(mtime: DateTime<Utc>, size: u64) -> Self {
        Self { mtime, size }
    }

    /// Gets the stat for a file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata.modified()?.into();
        let size = metadata.len();
        Ok(Self { mtime, size })
    }
}

/// File data with content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// File statistics.
    pub stat: Stat,
    /// SHA256 hash of the file content (hex encoded).
    pub hexdigest: String,
}

impl FileData {
    /// Creates a new FileData.
    pub fn new(stat: Stat, hexdigest: String) -> Self {
        Self { stat, hexdigest }
    }

    /// Creates FileData from file path.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let stat = Stat::from_path(path)?;
        let hexdigest = hexdigest_file(path)?;
        Ok(Self { stat, hexdigest })
    }

    /// Creates FileData from content string.
    pub fn from_content(content: &str, mtime: DateTime<Utc>) -> Self {
        let size = content.len() as u64;
        let hexdigest = hexdigest_str(content);
        Self {
            stat: Stat::new(mtime, size),
            hexdigest,
        }
    }
}

/// Normalizes file content before hashing: strips `\r` (so CRLF and LF
/// line endings hash identically) and right-strips trailing whitespace
/// and newlines (so a file's hash is stable across an editor's
/// trailing-newline conventions).
pub fn normalize_content(content: &str) -> String {
    content.replace('\r', "").trim_end().to_string()
}

/// Computes SHA256 hash of a string's normalized content, returning
/// hex-encoded digest.
pub fn hexdigest_str(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_content(content).as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes SHA256 hash of a file's normalized content, returning
/// hex-encoded digest.
pub fn hexdigest_file(path: &Path) -> io::Result<String> {
    let content = fs::read_to_string(path)?;
    Ok(hexdigest_str(&content))
}

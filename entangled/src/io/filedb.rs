//! Persistent record of every file Entangled has written or read, used to
//! detect external modifications (someone editing a tangled file by hand)
//! and to know which output files are currently managed.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::stat::FileData;
use crate::errors::{EntangledError, Result};

/// The format version this build of Entangled writes and expects to read.
pub const FILEDB_VERSION: &str = "2.0";

/// Default location of the persisted database, relative to the project root.
pub const FILEDB_PATH: &str = ".entangled/filedb.json";

/// Default location of the advisory lock guarding the database file.
pub const FILEDB_LOCK_PATH: &str = ".entangled/filedb.lock";

/// Record of every file Entangled has read or written, keyed by a
/// project-root-relative, forward-slash-normalized path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDB {
    /// Format version this database was written with.
    #[serde(default = "default_version")]
    pub version: String,

    /// Per-file modification stamp and content hash.
    #[serde(default)]
    pub files: HashMap<String, FileData>,

    /// The subset of `files` that are tangle/stitch *output* targets —
    /// as opposed to Markdown sources, which are also tracked in `files`
    /// for stitch comparisons but are never orphan-cleared.
    #[serde(default)]
    pub targets: HashSet<String>,
}

fn default_version() -> String {
    FILEDB_VERSION.to_string()
}

impl Default for FileDB {
    fn default() -> Self {
        Self {
            version: default_version(),
            files: HashMap::new(),
            targets: HashSet::new(),
        }
    }
}

/// Normalizes a path to the forward-slash, project-relative string form
/// the database persists paths in, independent of host OS separators.
fn key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl FileDB {
    /// Creates a new empty database at the current format version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a database from disk, returning an empty one if the file
    /// doesn't exist yet.
    ///
    /// A version mismatch does not error — an older database is still
    /// useful for conflict detection — but every stored entry is treated
    /// as stale (the format may have changed how hashes are computed),
    /// so the file set is kept but paths are trusted only for existence,
    /// not for content comparison, until they're re-recorded.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let db: Self = serde_json::from_str(&content)?;
        Ok(db)
    }

    /// Persists the database to disk, creating the parent directory if
    /// necessary.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Records (or overwrites) the stored data for a file.
    pub fn record(&mut self, path: impl AsRef<Path>, data: FileData) {
        self.files.insert(key(path.as_ref()), data);
    }

    /// Marks a path as a tangle/stitch output target.
    pub fn mark_target(&mut self, path: impl AsRef<Path>) {
        self.targets.insert(key(path.as_ref()));
    }

    /// Removes a file from the database entirely (both `files` and `targets`).
    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let k = key(path.as_ref());
        self.files.remove(&k);
        self.targets.remove(&k);
    }

    /// Returns true if this path has a recorded entry.
    pub fn is_tracked(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains_key(&key(path.as_ref()))
    }

    /// Returns true if this path is a registered output target.
    pub fn is_target(&self, path: impl AsRef<Path>) -> bool {
        self.targets.contains(&key(path.as_ref()))
    }

    /// Returns the recorded data for a path, if tracked.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&FileData> {
        self.files.get(&key(path.as_ref()))
    }

    /// Returns every tracked path (sources and targets alike), as `PathBuf`s.
    pub fn tracked_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.keys().map(PathBuf::from)
    }

    /// Empties the database, keeping the current format version. Alias of
    /// `reset` for callers that think in terms of "clear the db" (e.g. the
    /// `reset` command) rather than "rebuild from planned actions".
    pub fn clear(&mut self) {
        self.reset();
    }

    /// Compares the recorded hash for a path against freshly-computed
    /// data, returning true if the file has changed since last recorded
    /// (or was never recorded at all).
    pub fn is_modified(&self, path: impl AsRef<Path>, current: &FileData) -> bool {
        match self.files.get(&key(path.as_ref())) {
            Some(recorded) => recorded.hexdigest != current.hexdigest,
            None => true,
        }
    }

    /// Returns every registered target path, as `PathBuf`s.
    pub fn managed_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.targets.iter().map(PathBuf::from)
    }

    /// Targets recorded in the database but absent from `still_managed`
    /// — i.e. output files a previous tangle produced that the current
    /// set of source documents no longer references. These are the
    /// candidates the orphan-clearing step in a transaction removes.
    pub fn orphaned_targets(&self, still_managed: &HashSet<PathBuf>) -> Vec<PathBuf> {
        self.targets
            .iter()
            .map(PathBuf::from)
            .filter(|p| !still_managed.contains(p))
            .collect()
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resets the database to empty, keeping the current format version.
    pub fn reset(&mut self) {
        self.files.clear();
        self.targets.clear();
    }

    /// Returns an error if this database's version is newer than what
    /// this build understands — an older version is tolerated (see
    /// `load`), a newer one means a future Entangled wrote it and this
    /// build should refuse to guess at its semantics.
    pub fn check_version(&self) -> Result<()> {
        if parse_major(&self.version) > parse_major(FILEDB_VERSION) {
            return Err(EntangledError::Internal(format!(
                "filedb version {} is newer than this build understands ({})",
                self.version, FILEDB_VERSION
            )));
        }
        Ok(())
    }
}

fn parse_major(version: &str) -> u32 {
    version
        .split('.')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn data(digest: &str) -> FileData {
        FileData::new(super::super::stat::Stat::new(Utc::now(), 0), digest.to_string())
    }

    #[test]
    fn test_new_is_empty() {
        let db = FileDB::new();
        assert!(db.is_empty());
        assert_eq!(db.version, FILEDB_VERSION);
    }

    #[test]
    fn test_record_and_track() {
        let mut db = FileDB::new();
        db.record("out.py", data("abc"));
        assert!(db.is_tracked("out.py"));
        assert!(!db.is_tracked("other.py"));
    }

    #[test]
    fn test_is_modified() {
        let mut db = FileDB::new();
        db.record("out.py", data("abc"));

        assert!(!db.is_modified("out.py", &data("abc")));
        assert!(db.is_modified("out.py", &data("xyz")));
        assert!(db.is_modified("never-recorded.py", &data("abc")));
    }

    #[test]
    fn test_remove() {
        let mut db = FileDB::new();
        db.record("out.py", data("abc"));
        db.mark_target("out.py");

        db.remove("out.py");
        assert!(!db.is_tracked("out.py"));
        assert!(!db.is_target("out.py"));
    }

    #[test]
    fn test_orphaned_targets() {
        let mut db = FileDB::new();
        db.record("a.py", data("1"));
        db.mark_target("a.py");
        db.record("b.py", data("2"));
        db.mark_target("b.py");

        let still_managed: HashSet<PathBuf> = [PathBuf::from("a.py")].into_iter().collect();
        let orphans = db.orphaned_targets(&still_managed);

        assert_eq!(orphans, vec![PathBuf::from("b.py")]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filedb.json");

        let mut db = FileDB::new();
        db.record("a.py", data("hash1"));
        db.mark_target("a.py");
        db.save(&path).unwrap();

        let loaded = FileDB::load(&path).unwrap();
        assert!(loaded.is_tracked("a.py"));
        assert!(loaded.is_target("a.py"));
        assert_eq!(loaded.version, FILEDB_VERSION);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let db = FileDB::load(&path).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_path_key_normalizes_separators() {
        let mut db = FileDB::new();
        db.record(PathBuf::from("a\\b.py"), data("1"));
        assert!(db.is_tracked("a/b.py"));
    }

    #[test]
    fn test_check_version_rejects_future_major() {
        let mut db = FileDB::new();
        db.version = "99.0".to_string();
        assert!(db.check_version().is_err());
    }

    #[test]
    fn test_check_version_accepts_current() {
        let db = FileDB::new();
        assert!(db.check_version().is_ok());
    }
}

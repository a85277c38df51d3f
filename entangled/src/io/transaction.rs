//! Transaction system for atomic file operations.
//!
//! A `Transaction` batches a plan of `Create`/`Write`/`Delete` actions,
//! checks them against the persisted `FileDB` for out-of-band modifications,
//! then commits them: writes go through an atomic tempfile-rename so a
//! reader never observes a partial file, and the database is updated to
//! match. Conflicts are collected rather than aborting on the first one, so
//! a FAIL-mode caller can report everything wrong in one pass.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::filedb::FileDB;
use super::stat::{hexdigest_file, hexdigest_str, FileData};
use crate::errors::{EntangledError, Result};

/// An action that can be executed as part of a transaction.
pub trait Action: std::fmt::Debug + Send + Sync {
    /// Returns the target file path.
    fn target(&self) -> &Path;

    /// Checks if this action conflicts with the current file state.
    fn check_conflict(&self, db: &FileDB) -> Result<()>;

    /// Executes the action.
    fn execute(&self) -> Result<()>;

    /// Updates the file database after execution.
    fn update_db(&self, db: &mut FileDB) -> Result<()>;

    /// Returns a description of this action.
    fn describe(&self) -> String;

    /// True if this action should mark its target as a managed output in
    /// the database (as opposed to a plain write, e.g. stitching a
    /// Markdown source). Used by `Transaction::clear_orphans`.
    fn is_target(&self) -> bool {
        false
    }

    /// A human-readable diff of this action against the file's current
    /// on-disk content, or `None` if there's nothing meaningful to show
    /// (e.g. a delete, or content unchanged).
    fn diff(&self) -> Option<String> {
        None
    }
}

/// Computes a minimal-effort line diff: common leading/trailing lines are
/// elided, the differing span is shown as removed/added lines. Not a
/// shortest-edit-script diff, just enough for a human to see what moved.
fn line_diff(path: &Path, old: &str, new: &str) -> Option<String> {
    if old == new {
        return None;
    }

    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut start = 0;
    while start < old_lines.len()
        && start < new_lines.len()
        && old_lines[start] == new_lines[start]
    {
        start += 1;
    }

    let mut old_end = old_lines.len();
    let mut new_end = new_lines.len();
    while old_end > start && new_end > start && old_lines[old_end - 1] == new_lines[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    let mut out = format!("--- {}\n+++ {}\n", path.display(), path.display());
    for line in &old_lines[start..old_end] {
        out.push_str(&format!("-{}\n", line));
    }
    for line in &new_lines[start..new_end] {
        out.push_str(&format!("+{}\n", line));
    }
    Some(out)
}

/// Create a new file (fails if file exists).
#[derive(Debug)]
pub struct Create {
    /// Target file path.
    pub path: PathBuf,
    /// Content to write.
    pub content: String,
    /// Markdown files whose content contributed to this target, used for
    /// the write-side mtime conflict check.
    pub sources: Vec<PathBuf>,
    /// Octal file permission to apply after writing, if any.
    pub mode: Option<u32>,
    /// Whether this path should be recorded as a managed target.
    pub as_target: bool,
}

impl Create {
    /// Creates a new Create action (not a managed target).
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            sources: Vec::new(),
            mode: None,
            as_target: false,
        }
    }

    /// Creates a managed-target Create action, tracked with its contributing
    /// source files and optional file mode.
    pub fn new_target(
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        sources: Vec<PathBuf>,
        mode: Option<u32>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            sources,
            mode,
            as_target: true,
        }
    }
}

impl Action for Create {
    fn target(&self) -> &Path {
        &self.path
    }

    fn check_conflict(&self, _db: &FileDB) -> Result<()> {
        // The target isn't tracked in the DB yet, so existence alone isn't a
        // conflict: a file that already happens to hold the content we'd
        // write (or is empty) is not "unmanaged" in any meaningful sense.
        // Only a non-empty file with a different digest would be clobbered.
        if self.path.exists() {
            let size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
            if size > 0 {
                let existing_digest = hexdigest_file(&self.path)?;
                let new_digest = hexdigest_str(&self.content);
                if existing_digest != new_digest {
                    return Err(EntangledError::FileConflict {
                        path: self.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn execute(&self) -> Result<()> {
        atomic_write(&self.path, &self.content, self.mode)?;
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) -> Result<()> {
        let data = FileData::from_content(&self.content, Utc::now());
        db.record(self.path.clone(), data);
        if self.as_target {
            db.mark_target(self.path.clone());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("create {}", self.path.display())
    }

    fn is_target(&self) -> bool {
        self.as_target
    }

    fn diff(&self) -> Option<String> {
        line_diff(&self.path, "", &self.content)
    }
}

/// Write to an existing file (checks for external modifications).
#[derive(Debug)]
pub struct WriteAction {
    /// Target file path.
    pub path: PathBuf,
    /// Content to write.
    pub content: String,
    /// Markdown files whose content contributed to this target.
    pub sources: Vec<PathBuf>,
    /// Octal file permission to apply after writing, if any.
    pub mode: Option<u32>,
    /// Whether this path should be recorded as a managed target.
    pub as_target: bool,
}

impl WriteAction {
    /// Creates a new Write action (not a managed target).
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            sources: Vec::new(),
            mode: None,
            as_target: false,
        }
    }

    /// Creates a managed-target Write action, tracked with its contributing
    /// source files and optional file mode. The `sources` list drives the
    /// "target looks newer than every one of its sources" conflict check.
    pub fn new_target(
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        sources: Vec<PathBuf>,
        mode: Option<u32>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            sources,
            mode,
            as_target: true,
        }
    }
}

impl Action for WriteAction {
    fn target(&self) -> &Path {
        &self.path
    }

    fn check_conflict(&self, db: &FileDB) -> Result<()> {
        // If file exists and is tracked, check for external modifications.
        if self.path.exists() && db.is_tracked(&self.path) {
            let current = FileData::from_path(&self.path)?;
            if db.is_modified(&self.path, &current) {
                return Err(EntangledError::FileConflict {
                    path: self.path.clone(),
                });
            }
        }

        // If this write is rooted in specific source files and the target
        // already exists, a target strictly newer than every source means
        // someone edited the target directly without going through stitch.
        if !self.sources.is_empty() && self.path.exists() {
            if let Ok(target_meta) = fs::metadata(&self.path) {
                if let Ok(target_mtime) = target_meta.modified() {
                    let all_sources_older = self.sources.iter().all(|src| {
                        fs::metadata(src)
                            .and_then(|m| m.modified())
                            .map(|mtime| mtime < target_mtime)
                            .unwrap_or(true)
                    });
                    if all_sources_older {
                        return Err(EntangledError::FileConflict {
                            path: self.path.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn execute(&self) -> Result<()> {
        atomic_write(&self.path, &self.content, self.mode)?;
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) -> Result<()> {
        let data = FileData::from_content(&self.content, Utc::now());
        db.record(self.path.clone(), data);
        if self.as_target {
            db.mark_target(self.path.clone());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("write {}", self.path.display())
    }

    fn is_target(&self) -> bool {
        self.as_target
    }

    fn diff(&self) -> Option<String> {
        let old = fs::read_to_string(&self.path).unwrap_or_default();
        line_diff(&self.path, &old, &self.content)
    }
}

/// Delete a file.
#[derive(Debug)]
pub struct Delete {
    /// Target file path.
    pub path: PathBuf,
}

impl Delete {
    /// Creates a new Delete action.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Action for Delete {
    fn target(&self) -> &Path {
        &self.path
    }

    fn check_conflict(&self, db: &FileDB) -> Result<()> {
        // If file exists and is tracked, check for external modifications.
        if self.path.exists() && db.is_tracked(&self.path) {
            let current = FileData::from_path(&self.path)?;
            if db.is_modified(&self.path, &current) {
                return Err(EntangledError::FileConflict {
                    path: self.path.clone(),
                });
            }
        }
        Ok(())
    }

    fn execute(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        prune_empty_parents(&self.path);
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) -> Result<()> {
        db.remove(&self.path);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("delete {}", self.path.display())
    }
}

/// Removes now-empty parent directories upward from a just-deleted file,
/// stopping at the first non-empty one.
fn prune_empty_parents(path: &Path) {
    let mut dir = match path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };
    loop {
        match fs::read_dir(&dir) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    break;
                }
            }
            Err(_) => break,
        }
        if fs::remove_dir(&dir).is_err() {
            break;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }
}

/// A single conflict surfaced while planning a transaction.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// The path that would be clobbered or orphaned unsafely.
    pub path: PathBuf,
    /// Human-readable explanation.
    pub reason: String,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// A collection of actions to execute atomically.
///
/// Enforces at-most-one action per target path: calling `add` twice for the
/// same path is a programming error (broken invariant in the planning
/// phase), not a recoverable conflict, so it panics rather than returning
/// an error.
#[derive(Debug, Default)]
pub struct Transaction {
    /// Actions to execute, in insertion order.
    actions: Vec<Box<dyn Action>>,
    /// Paths already claimed by an action in this transaction.
    passed: HashSet<PathBuf>,
}

impl Transaction {
    /// Creates a new empty transaction.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            passed: HashSet::new(),
        }
    }

    /// Adds an action to the transaction.
    ///
    /// # Panics
    ///
    /// Panics if an action for this path has already been added — at most
    /// one write per path is allowed within a single transaction.
    pub fn add(&mut self, action: impl Action + 'static) {
        let path = action.target().to_path_buf();
        if !self.passed.insert(path.clone()) {
            panic!(
                "internal error: multiple actions planned for {} in one transaction",
                path.display()
            );
        }
        self.actions.push(Box::new(action));
    }

    /// Adds a plain create action (not tracked as a managed target).
    pub fn create(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.add(Create::new(path, content));
    }

    /// Adds a plain write action (not tracked as a managed target) — used
    /// for stitching edits back into Markdown sources.
    pub fn write(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.add(WriteAction::new(path, content));
    }

    /// Adds a write action for a tangle output: tracked as a managed target,
    /// with the Markdown sources that contributed to it (for the
    /// target-newer-than-sources conflict check) and an optional file mode.
    pub fn write_target(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        sources: Vec<PathBuf>,
        mode: Option<u32>,
    ) {
        let path = path.into();
        if path.exists() {
            self.add(WriteAction::new_target(path, content, sources, mode));
        } else {
            self.add(Create::new_target(path, content, sources, mode));
        }
    }

    /// Adds a delete action.
    pub fn delete(&mut self, path: impl Into<PathBuf>) {
        self.add(Delete::new(path));
    }

    /// Returns the number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if there are no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns descriptions of all actions.
    pub fn describe(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.describe()).collect()
    }

    /// Returns a unified-ish diff for every action that has one.
    pub fn diffs(&self) -> Vec<String> {
        self.actions.iter().filter_map(|a| a.diff()).collect()
    }

    /// Queues `Delete` actions for every managed target in `db` that is not
    /// among the targets already planned in this transaction. Call this
    /// after all tangle writes have been added, before executing.
    pub fn clear_orphans(&mut self, db: &FileDB) {
        let still_managed: HashSet<PathBuf> = self
            .actions
            .iter()
            .filter(|a| a.is_target())
            .map(|a| a.target().to_path_buf())
            .collect();

        for orphan in db.orphaned_targets(&still_managed) {
            if !self.passed.contains(&orphan) {
                self.add(Delete::new(orphan));
            }
        }
    }

    /// Collects every conflict across all planned actions, without
    /// aborting on the first one (FAIL mode wants to report them all).
    pub fn conflicts(&self, db: &FileDB) -> Vec<Conflict> {
        self.actions
            .iter()
            .filter_map(|a| {
                a.check_conflict(db).err().map(|e| Conflict {
                    path: a.target().to_path_buf(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Checks all actions for conflicts, failing on the first one found.
    pub fn check_conflicts(&self, db: &FileDB) -> Result<()> {
        for action in &self.actions {
            action.check_conflict(db)?;
        }
        Ok(())
    }

    /// Executes all actions and updates the database. Aborts before any
    /// action runs if any conflict is found (FAIL mode, the default).
    pub fn execute(&self, db: &mut FileDB) -> Result<()> {
        let conflicts = self.conflicts(db);
        if !conflicts.is_empty() {
            return Err(EntangledError::FileConflicts(conflicts));
        }

        for action in &self.actions {
            action.execute()?;
            action.update_db(db)?;
        }

        Ok(())
    }

    /// Executes all actions, ignoring conflicts, and updates the database
    /// (FORCE mode).
    pub fn execute_force(&self, db: &mut FileDB) -> Result<()> {
        for action in &self.actions {
            action.execute()?;
            action.update_db(db)?;
        }
        Ok(())
    }

    /// RESETDB mode: updates the database to reflect the planned actions as
    /// if they had run, without touching the filesystem at all.
    pub fn execute_resetdb(&self, db: &mut FileDB) -> Result<()> {
        for action in &self.actions {
            action.update_db(db)?;
        }
        Ok(())
    }
}

/// Writes content to a file atomically: write to a tempfile in the same
/// directory, fsync, optionally chmod, then rename onto the target so a
/// concurrent reader never observes a partial write.
fn atomic_write(path: &Path, content: &str, mode: Option<u32>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let parent = path.parent().unwrap_or(Path::new("."));
    let temp_path = parent.join(format!(".entangled-tmp-{}-{}", std::process::id(), file_name_hint(path)));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn file_name_hint(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_action() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let action = Create::new(&path, "content");
        let mut db = FileDB::new();

        action.check_conflict(&db).unwrap();
        action.execute().unwrap();
        action.update_db(&mut db).unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
        assert!(db.is_tracked(&path));
    }

    #[test]
    fn test_create_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        fs::write(&path, "existing").unwrap();

        let action = Create::new(&path, "new");
        let db = FileDB::new();

        assert!(action.check_conflict(&db).is_err());
    }

    #[test]
    fn test_create_no_conflict_when_existing_content_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        fs::write(&path, "same content").unwrap();

        let action = Create::new(&path, "same content");
        let db = FileDB::new();

        action.check_conflict(&db).unwrap();
    }

    #[test]
    fn test_create_no_conflict_when_existing_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        let action = Create::new(&path, "new content");
        let db = FileDB::new();

        action.check_conflict(&db).unwrap();
    }

    #[test]
    fn test_write_action() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "original").unwrap();

        let mut db = FileDB::new();
        let original_data = FileData::from_path(&path).unwrap();
        db.record(path.clone(), original_data);

        let action = WriteAction::new(&path, "updated");
        action.check_conflict(&db).unwrap();
        action.execute().unwrap();
        action.update_db(&mut db).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
    }

    #[test]
    fn test_write_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "original").unwrap();

        let mut db = FileDB::new();
        let original_data = FileData::from_content("recorded", Utc::now());
        db.record(path.clone(), original_data);

        // File has different content than recorded.
        let action = WriteAction::new(&path, "updated");
        assert!(action.check_conflict(&db).is_err());
    }

    #[test]
    fn test_write_target_conflict_when_newer_than_sources() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("doc.md");
        let target = dir.path().join("out.py");

        fs::write(&source, "# doc").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&target, "print(1)").unwrap();

        let mut db = FileDB::new();
        db.record(target.clone(), FileData::from_path(&target).unwrap());

        let action = WriteAction::new_target(&target, "print(2)", vec![source], None);
        assert!(action.check_conflict(&db).is_err());
    }

    #[test]
    fn test_delete_action() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "content").unwrap();

        let mut db = FileDB::new();
        let data = FileData::from_path(&path).unwrap();
        db.record(path.clone(), data);

        let action = Delete::new(&path);
        action.check_conflict(&db).unwrap();
        action.execute().unwrap();
        action.update_db(&mut db).unwrap();

        assert!(!path.exists());
        assert!(!db.is_tracked(&path));
    }

    #[test]
    fn test_transaction() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("a.txt");
        let path2 = dir.path().join("b.txt");

        let mut tx = Transaction::new();
        tx.create(&path1, "content a");
        tx.create(&path2, "content b");

        let mut db = FileDB::new();
        tx.execute(&mut db).unwrap();

        assert!(path1.exists());
        assert!(path2.exists());
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_transaction_rollback_on_conflict() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("new.txt");
        let path2 = dir.path().join("existing.txt");
        fs::write(&path2, "existing").unwrap();

        let mut tx = Transaction::new();
        tx.create(&path1, "new");
        tx.create(&path2, "conflict"); // This will conflict

        let mut db = FileDB::new();
        assert!(tx.execute(&mut db).is_err());

        // Neither file should be created (conflict check happens first).
        assert!(!path1.exists());
    }

    #[test]
    fn test_transaction_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "original").unwrap();

        let mut db = FileDB::new();
        // Record different content to create conflict.
        db.record(path.clone(), FileData::from_content("different", Utc::now()));

        let mut tx = Transaction::new();
        tx.write(&path, "forced");

        // Normal execute would fail.
        assert!(tx.check_conflicts(&db).is_err());

        // Force execute succeeds.
        tx.execute_force(&mut db).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "forced");
    }

    #[test]
    #[should_panic(expected = "multiple actions planned")]
    fn test_double_write_same_path_panics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");

        let mut tx = Transaction::new();
        tx.create(&path, "first");
        tx.create(&path, "second");
    }

    #[test]
    fn test_clear_orphans_deletes_untargeted_managed_files() {
        let dir = tempdir().unwrap();
        let kept = dir.path().join("kept.py");
        let orphan = dir.path().join("orphan.py");
        fs::write(&orphan, "old").unwrap();

        let mut db = FileDB::new();
        db.record(orphan.clone(), FileData::from_content("old", Utc::now()));
        db.mark_target(orphan.clone());

        let mut tx = Transaction::new();
        tx.write_target(&kept, "new content", vec![], None);
        tx.clear_orphans(&db);

        assert_eq!(tx.len(), 2);
        assert!(tx.describe().iter().any(|d| d.contains("delete")));
    }

    #[test]
    fn test_conflicts_collects_all() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("a.txt");
        let path2 = dir.path().join("b.txt");
        fs::write(&path1, "existing a").unwrap();
        fs::write(&path2, "existing b").unwrap();

        let mut tx = Transaction::new();
        tx.create(&path1, "new a");
        tx.create(&path2, "new b");

        let db = FileDB::new();
        let conflicts = tx.conflicts(&db);
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn test_diff_shows_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "line1\nline2\n").unwrap();

        let action = WriteAction::new(&path, "line1\nline2 changed\n");
        let diff = action.diff().unwrap();
        assert!(diff.contains("-line2"));
        assert!(diff.contains("+line2 changed"));
    }
}

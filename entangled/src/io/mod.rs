//! File system I/O: content hashing, the file cache abstraction, the
//! persisted file database, its advisory lock, and the transaction layer
//! that applies writes atomically.

mod file_cache;
mod filedb;
mod lock;
mod stat;
mod transaction;

pub use file_cache::{FileCache, RealFileCache, VirtualFS};
pub use filedb::{FileDB, FILEDB_LOCK_PATH, FILEDB_PATH};
pub use lock::FileDbLock;
pub use stat::{hexdigest_file, hexdigest_str, normalize_content, FileData, Stat};
pub use transaction::{Action, Conflict, Create, Delete, Transaction, WriteAction};

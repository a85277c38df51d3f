//! CLI command implementations.

pub mod config;
mod helpers;
pub mod init;
pub mod locate;
pub mod reset;
pub mod status;
pub mod stitch;
pub mod sync;
pub mod tangle;
pub mod watch;

pub use config::config;
pub use init::init;
pub use locate::{locate, LocateOptions};
pub use reset::{reset, ResetOptions};
pub use status::{status, StatusOptions};
pub use stitch::{stitch, StitchOptions};
pub use sync::{sync, SyncOptions};
pub use tangle::{tangle, TangleOptions};
pub use watch::{watch, WatchOptions};

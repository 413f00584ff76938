//! pushtrigger dispatch
//!
//! Turns push events into launched post-submit jobs:
//! - `store`: per-repository job configuration (TOML)
//! - `launcher`: the launch port, with `FsLauncher` writing an outbox
//! - `dispatcher`: the per-push dispatch loop and its failure policy
//! - `fakes`: in-memory launcher for tests

pub mod dispatcher;
pub mod error;
pub mod fakes;
pub mod fs_launcher;
pub mod launcher;
pub mod store;

// Re-export key types
pub use dispatcher::{dispatch_postsubmits, DispatchPolicy, DispatchReport, PushDispatcher};
pub use error::{ConfigError, DispatchError, LaunchError, Result};
pub use fs_launcher::FsLauncher;
pub use launcher::Launcher;
pub use store::{JobConfigStore, StaticJobConfig};

//! # sdkpin-sync
//!
//! Tag validation, destination replacement, mirror upkeep and patch
//! apply/capture, sequenced by the [`Orchestrator`] state machine.
//!
//! External processes (`git`, `patch`) are reached only through
//! [`ExternalTools`]; [`SystemTools`] is the real implementation.

pub mod dirsync;
pub mod error;
pub mod mirror;
pub mod orchestrator;
pub mod patch;
pub mod status;
pub mod tag;
pub mod tools;

pub use error::{SyncError, VcsQuery};
pub use mirror::MirrorReport;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use patch::PatchStatus;
pub use status::StatusReport;
pub use tools::{ExternalTools, SystemTools, ToolOutput};

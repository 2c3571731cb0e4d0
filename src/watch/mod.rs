// src/watch/mod.rs

//! Descriptor watching.
//!
//! This module is responsible for:
//! - Abstracting the OS watch subsystem behind a small registration contract
//!   (`subsystem.rs`), with a production backend built on `notify`.
//! - Tracking which watch token corresponds to which directory, across
//!   build-directory create/delete cycles (`registry.rs`).
//! - Deciding when a freshly written file has settled (`probe.rs`).
//! - Running the long-lived event loop that classifies events and drives the
//!   patch (`watcher.rs`).
//!
//! It does **not** know about config files or CLI concerns; it receives a
//! [`crate::project::ProjectView`] and timing values and works from those.

pub mod probe;
pub mod registry;
pub mod subsystem;
pub mod watcher;

pub use probe::{StabilityOutcome, StabilityProbe};
pub use registry::WatchRegistry;
pub use subsystem::{
    DirEvent, DirEventKind, EventBatch, EventInterest, NotifyWatchSubsystem, WatchSubsystem,
    WatchToken,
};
pub use watcher::{spawn_watcher, WatcherHandle, WatcherLoop};

// src/watch/registry.rs

//! Bookkeeping for live directory registrations.
//!
//! The registry owns the watch subsystem and the token-to-directory map and
//! is the only component allowed to create or cancel registrations. Its
//! invariants:
//!
//! - at most one live entry exists per directory;
//! - the project root's entry lives for the registry's whole lifetime;
//! - the build directory's entry exists iff the directory exists on disk
//!   (maintained by the loop calling `on_build_dir_created` /
//!   `on_build_dir_deleted` in response to lifecycle events).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::watch::subsystem::{EventInterest, WatchSubsystem, WatchToken};

pub struct WatchRegistry<S> {
    subsystem: S,
    entries: HashMap<WatchToken, PathBuf>,
}

impl<S: WatchSubsystem> WatchRegistry<S> {
    pub fn new(subsystem: S) -> Self {
        Self {
            subsystem,
            entries: HashMap::new(),
        }
    }

    /// Register the project root for create/delete events.
    ///
    /// The root entry is never removed; it is how the registry learns about
    /// build-directory lifecycle for as long as the watcher runs.
    pub fn register_project_root(&mut self, root: &Path) -> Result<WatchToken> {
        self.register_dir(root, EventInterest::CREATE_DELETE)
    }

    /// Register the build directory for create/modify events, but only if it
    /// already exists on disk (first build may have happened before startup).
    pub fn register_build_dir_if_present(&mut self, build_dir: &Path) -> Result<Option<WatchToken>> {
        if !build_dir.is_dir() {
            return Ok(None);
        }
        self.on_build_dir_created(build_dir).map(Some)
    }

    /// React to the build directory appearing under the root.
    pub fn on_build_dir_created(&mut self, build_dir: &Path) -> Result<WatchToken> {
        self.register_dir(build_dir, EventInterest::CREATE_MODIFY)
    }

    /// React to the build directory disappearing: cancel its registration and
    /// drop the entry. Harmless when no entry exists (e.g. duplicate delete
    /// events), and cancellation itself tolerates tokens the OS already
    /// invalidated alongside the deleted directory.
    pub fn on_build_dir_deleted(&mut self, build_dir: &Path) {
        let stale: Vec<WatchToken> = self
            .entries
            .iter()
            .filter(|(_, dir)| dir.as_path() == build_dir)
            .map(|(token, _)| *token)
            .collect();

        for token in stale {
            self.entries.remove(&token);
            self.subsystem.cancel(token);
            debug!(?token, dir = ?build_dir, "cancelled build-directory registration");
        }
    }

    /// Resolve a token back to the directory it watches.
    pub fn resolve(&self, token: WatchToken) -> Option<&Path> {
        self.entries.get(&token).map(PathBuf::as_path)
    }

    /// Re-arm a registration after its batch has been processed.
    pub fn rearm(&mut self, token: WatchToken) -> Result<()> {
        self.subsystem.rearm(token)
    }

    fn register_dir(&mut self, dir: &Path, interest: EventInterest) -> Result<WatchToken> {
        // One live entry per directory: duplicate create events (or a create
        // racing the startup registration) reuse the existing registration.
        if let Some(token) = self.token_for(dir) {
            debug!(?token, dir = ?dir, "directory already registered");
            return Ok(token);
        }

        let token = self.subsystem.register(dir, interest)?;
        self.entries.insert(token, dir.to_path_buf());
        debug!(?token, dir = ?dir, "registered directory watch");
        Ok(token)
    }

    fn token_for(&self, dir: &Path) -> Option<WatchToken> {
        self.entries
            .iter()
            .find(|(_, d)| d.as_path() == dir)
            .map(|(token, _)| *token)
    }
}

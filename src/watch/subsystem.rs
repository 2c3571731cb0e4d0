// src/watch/subsystem.rs

//! The watch-subsystem contract and its `notify` backend.
//!
//! The contract mirrors what the loop needs from any OS watch facility:
//! register a directory for a set of event interests and get back an opaque
//! token, cancel a registration (safe even if the OS already invalidated it),
//! and re-arm a registration after a batch has been processed. Event batches
//! arrive on a channel handed out at construction, each carrying the token of
//! the directory that produced it and the relative names of affected entries.
//!
//! Re-arming is a no-op for `notify`, whose registrations stay armed, but it
//! remains part of the contract: some subsystems stop delivering events for a
//! registration that is not re-armed, and the loop must not depend on the
//! backend being forgiving about it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Opaque token identifying one live directory registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchToken(u64);

impl WatchToken {
    /// Mint a token from a raw id. Subsystem implementations own the id
    /// space; tokens are opaque to everything else.
    pub fn from_raw(raw: u64) -> Self {
        WatchToken(raw)
    }
}

/// Event kinds a registration wants to be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInterest {
    pub create: bool,
    pub delete: bool,
    pub modify: bool,
}

impl EventInterest {
    /// Interest set for the project root: only the build directory appearing
    /// or disappearing matters there.
    pub const CREATE_DELETE: EventInterest = EventInterest {
        create: true,
        delete: true,
        modify: false,
    };

    /// Interest set for the build directory: the descriptor being created or
    /// rewritten.
    pub const CREATE_MODIFY: EventInterest = EventInterest {
        create: true,
        delete: false,
        modify: true,
    };

    fn wants(&self, kind: DirEventKind) -> bool {
        match kind {
            DirEventKind::Created => self.create,
            DirEventKind::Deleted => self.delete,
            DirEventKind::Modified => self.modify,
        }
    }
}

/// What happened to a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEventKind {
    Created,
    Deleted,
    Modified,
}

/// One change to an entry of a watched directory.
///
/// `name` is the entry's name relative to the watched directory, never a
/// nested path.
#[derive(Debug, Clone)]
pub struct DirEvent {
    pub kind: DirEventKind,
    pub name: String,
}

/// All events delivered for one registration in one iteration.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub token: WatchToken,
    pub events: Vec<DirEvent>,
}

/// Registration side of the watch subsystem.
///
/// Event delivery is channel-based and set up at construction time, so the
/// trait only covers the operations the registry drives.
pub trait WatchSubsystem {
    /// Watch `dir` (non-recursively) for the given interests.
    fn register(&mut self, dir: &Path, interest: EventInterest) -> Result<WatchToken>;

    /// Stop watching the directory behind `token`.
    ///
    /// Must be safe to call for a token the OS already invalidated (deleted
    /// directories auto-invalidate watches on some platforms) and for a token
    /// that was already cancelled.
    fn cancel(&mut self, token: WatchToken);

    /// Re-arm a registration after its batch has been processed.
    fn rearm(&mut self, token: WatchToken) -> Result<()>;
}

#[derive(Default)]
struct Registrations {
    next_token: u64,
    by_dir: HashMap<PathBuf, (WatchToken, EventInterest)>,
    by_token: HashMap<WatchToken, PathBuf>,
}

/// Production subsystem backed by `notify`.
///
/// Each registered directory gets its own non-recursive watch. The `notify`
/// callback runs on the backend's thread; it resolves every event path to the
/// token of its parent directory, filters by the registration's interests,
/// and forwards batches over an unbounded channel into the async world.
pub struct NotifyWatchSubsystem {
    watcher: RecommendedWatcher,
    registrations: Arc<Mutex<Registrations>>,
}

impl NotifyWatchSubsystem {
    /// Create the subsystem and the receiving end of its batch channel.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<EventBatch>)> {
        let registrations = Arc::new(Mutex::new(Registrations::default()));
        let (batch_tx, batch_rx) = mpsc::unbounded_channel::<EventBatch>();

        let watcher = RecommendedWatcher::new(
            {
                let registrations = Arc::clone(&registrations);
                move |res: notify::Result<Event>| match res {
                    Ok(event) => {
                        let batches = batches_for_event(&registrations, &event);
                        for batch in batches {
                            if batch_tx.send(batch).is_err() {
                                // Receiver gone: the loop has shut down and
                                // there is nobody left to deliver to.
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        // Can't use tracing reliably from the backend thread
                        // during shutdown; mirror it to stderr.
                        eprintln!("pomwatch: file watch error: {err}");
                    }
                }
            },
            Config::default(),
        )
        .context("creating filesystem watcher")?;

        let subsystem = Self {
            watcher,
            registrations,
        };
        Ok((subsystem, batch_rx))
    }
}

impl WatchSubsystem for NotifyWatchSubsystem {
    fn register(&mut self, dir: &Path, interest: EventInterest) -> Result<WatchToken> {
        // Watch the canonical path so event parents match the map keys.
        let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

        self.watcher
            .watch(&canonical, RecursiveMode::NonRecursive)
            .with_context(|| format!("registering watch on {:?}", canonical))?;

        let mut regs = self.registrations.lock().expect("registrations mutex");
        let token = WatchToken::from_raw(regs.next_token);
        regs.next_token += 1;
        regs.by_dir.insert(canonical.clone(), (token, interest));
        regs.by_token.insert(token, canonical);
        Ok(token)
    }

    fn cancel(&mut self, token: WatchToken) {
        let dir = {
            let mut regs = self.registrations.lock().expect("registrations mutex");
            let Some(dir) = regs.by_token.remove(&token) else {
                return;
            };
            regs.by_dir.remove(&dir);
            dir
        };

        // The watch may already be gone if the directory was deleted; that is
        // exactly the case cancel must tolerate.
        if let Err(err) = self.watcher.unwatch(&dir) {
            tracing::debug!(dir = ?dir, error = %err, "unwatch on already-invalid registration");
        }
    }

    fn rearm(&mut self, _token: WatchToken) -> Result<()> {
        // notify registrations stay armed; nothing to do.
        Ok(())
    }
}

/// Translate one `notify` event into per-registration batches.
fn batches_for_event(
    registrations: &Arc<Mutex<Registrations>>,
    event: &Event,
) -> Vec<EventBatch> {
    let mut batches: Vec<EventBatch> = Vec::new();
    let regs = registrations.lock().expect("registrations mutex");

    for (path, kind) in classify_paths(event) {
        let Some(parent) = path.parent() else {
            continue;
        };
        let Some(&(token, interest)) = regs.by_dir.get(parent) else {
            continue;
        };
        if !interest.wants(kind) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let dir_event = DirEvent {
            kind,
            name: name.to_string_lossy().into_owned(),
        };

        match batches.iter_mut().find(|b| b.token == token) {
            Some(batch) => batch.events.push(dir_event),
            None => batches.push(EventBatch {
                token,
                events: vec![dir_event],
            }),
        }
    }

    batches
}

/// Map a `notify` event onto (path, kind) pairs in our reduced vocabulary.
///
/// Renames are folded into create/delete, which is how the entries look from
/// the watched directory's point of view. Metadata-only changes are dropped.
fn classify_paths(event: &Event) -> Vec<(PathBuf, DirEventKind)> {
    match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .map(|p| (p.clone(), DirEventKind::Created))
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .map(|p| (p.clone(), DirEventKind::Deleted))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .map(|p| (p.clone(), DirEventKind::Deleted))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // paths[0] is the old name, paths[1] the new one.
            let mut out = Vec::new();
            if let Some(from) = event.paths.first() {
                out.push((from.clone(), DirEventKind::Deleted));
            }
            if let Some(to) = event.paths.get(1) {
                out.push((to.clone(), DirEventKind::Created));
            }
            out
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| (p.clone(), DirEventKind::Created))
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|p| (p.clone(), DirEventKind::Modified))
            .collect(),
        _ => Vec::new(),
    }
}

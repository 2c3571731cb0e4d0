// src/watch/watcher.rs

//! The long-running watcher loop.
//!
//! One async task owns the registry, the throttle timestamp, and the batch
//! receiver for the lifetime of the host process; nothing else touches them,
//! so there is no locking. Per batch the loop:
//!
//! 1. resolves the token to its directory (warn + skip if unknown);
//! 2. classifies each event as build-directory lifecycle (registry update)
//!    or descriptor change (throttle, stability wait, idempotent patch);
//! 3. re-arms the registration so the next batch keeps flowing.
//!
//! Nothing escapes the loop boundary: a failure is terminal to its batch
//! only, and the only exit paths are the shutdown signal and the batch
//! channel closing.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::TimingSection;
use crate::patch;
use crate::project::ProjectView;
use crate::watch::probe::{StabilityOutcome, StabilityProbe};
use crate::watch::registry::WatchRegistry;
use crate::watch::subsystem::{
    DirEvent, DirEventKind, EventBatch, NotifyWatchSubsystem, WatchSubsystem,
};

/// Handle for a spawned watcher loop.
///
/// Holds the shutdown sender; dropping the handle (and every cloned trigger)
/// also signals the loop to stop.
#[derive(Debug)]
pub struct WatcherHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WatcherHandle {
    /// A sender that can be moved into e.g. a Ctrl-C task to request
    /// shutdown.
    pub fn shutdown_trigger(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Request shutdown and wait for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }

    /// Wait for the loop to exit on its own.
    pub async fn join(self) {
        if let Err(err) = self.join.await {
            warn!(error = %err, "watcher task ended abnormally");
        }
    }
}

/// Spawn the production watcher (notify backend) for a project.
///
/// Fails if the project root cannot be registered; per the degraded-startup
/// policy the caller logs that and carries on without a watcher.
pub fn spawn_watcher(project: ProjectView, timing: &TimingSection) -> Result<WatcherHandle> {
    let (subsystem, batches) = NotifyWatchSubsystem::new()?;
    let probe = StabilityProbe::from_timing(timing);
    let watcher_loop = WatcherLoop::new(project, subsystem, batches, probe, timing.throttle())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let join = tokio::spawn(watcher_loop.run(shutdown_rx));

    Ok(WatcherHandle { shutdown_tx, join })
}

/// The loop itself, generic over the watch subsystem so tests can drive it
/// with scripted batches.
pub struct WatcherLoop<S> {
    project: ProjectView,
    registry: WatchRegistry<S>,
    batches: mpsc::UnboundedReceiver<EventBatch>,
    probe: StabilityProbe,
    throttle: Duration,
    last_patched_at: Option<Instant>,
}

impl<S: WatchSubsystem> WatcherLoop<S> {
    /// Register the project root (and the build directory, if it already
    /// exists) and return the loop ready to run.
    pub fn new(
        project: ProjectView,
        subsystem: S,
        batches: mpsc::UnboundedReceiver<EventBatch>,
        probe: StabilityProbe,
        throttle: Duration,
    ) -> Result<Self> {
        let mut registry = WatchRegistry::new(subsystem);

        registry
            .register_project_root(project.root())
            .with_context(|| format!("watching project root {:?}", project.root()))?;
        info!(root = ?project.root(), build_dir = %project.build_dir_name(), "watching project root");

        if registry
            .register_build_dir_if_present(&project.build_dir())?
            .is_some()
        {
            info!("build directory already present; watching descriptor");
        }

        Ok(Self {
            project,
            registry,
            batches,
            probe,
            throttle,
            last_patched_at: None,
        })
    }

    /// Run until the batch channel closes or `shutdown` fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(descriptor = %self.project.descriptor_name(), "descriptor watcher started");

        loop {
            let batch = tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown requested, stopping descriptor watcher");
                    break;
                }
                batch = self.batches.recv() => match batch {
                    Some(batch) => batch,
                    None => {
                        warn!("watch event channel closed, stopping descriptor watcher");
                        break;
                    }
                },
            };

            let token = batch.token;
            if let Err(err) = self.handle_batch(batch).await {
                warn!(error = %err, "error while processing watch batch");
            }

            // Re-arm regardless of how the batch went; an un-rearmed
            // registration stops receiving events.
            if let Err(err) = self.registry.rearm(token) {
                warn!(?token, error = %err, "failed to re-arm watch registration");
            }
        }
    }

    async fn handle_batch(&mut self, batch: EventBatch) -> Result<()> {
        let Some(dir) = self.registry.resolve(batch.token).map(Path::to_path_buf) else {
            warn!(token = ?batch.token, "event batch for unknown watch token");
            return Ok(());
        };

        for event in batch.events {
            self.handle_event(&dir, event).await?;
        }

        Ok(())
    }

    async fn handle_event(&mut self, dir: &Path, event: DirEvent) -> Result<()> {
        // Build-directory lifecycle under the project root.
        if dir == self.project.root() && event.name == self.project.build_dir_name() {
            match event.kind {
                DirEventKind::Created => {
                    self.registry.on_build_dir_created(&self.project.build_dir())?;
                    info!("build directory created; watching descriptor");
                }
                DirEventKind::Deleted => {
                    self.registry.on_build_dir_deleted(&self.project.build_dir());
                    info!("build directory deleted; descriptor no longer watched");
                }
                DirEventKind::Modified => {}
            }
            return Ok(());
        }

        // Descriptor written inside the build directory.
        if dir == self.project.build_dir()
            && matches!(event.kind, DirEventKind::Created | DirEventKind::Modified)
            && event.name == self.project.descriptor_name()
        {
            self.handle_descriptor_event().await?;
        }

        Ok(())
    }

    async fn handle_descriptor_event(&mut self) -> Result<()> {
        // A single external write fans out into several create/modify
        // notifications; drop repeats close on the heels of a patch.
        if let Some(last) = self.last_patched_at {
            if last.elapsed() < self.throttle {
                debug!("descriptor event inside throttle window; skipping");
                return Ok(());
            }
        }

        let descriptor = self.project.descriptor_path();
        debug!(path = ?descriptor, "descriptor changed; waiting for write to settle");

        if self.probe.wait_until_stable(&descriptor).await == StabilityOutcome::TimedOut {
            warn!(path = ?descriptor, "descriptor never settled; proceeding with current content");
        }

        let content = tokio::fs::read_to_string(&descriptor)
            .await
            .with_context(|| format!("reading descriptor {:?}", descriptor))?;

        if patch::is_already_patched(&content) {
            debug!("descriptor already patched; skipping");
            return Ok(());
        }

        let package = self.project.resolve_package_name();
        let patched = patch::apply_patch(&content, &package);
        if patched == content {
            debug!("descriptor has no insertion anchor yet; nothing to patch");
            return Ok(());
        }

        tokio::fs::write(&descriptor, patched)
            .await
            .with_context(|| format!("writing patched descriptor {:?}", descriptor))?;

        self.last_patched_at = Some(Instant::now());
        info!(package = %package, "relocation block injected into descriptor");
        Ok(())
    }
}

// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod patch;
pub mod project;
pub mod watch;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::patch::MetricsTemplate;
use crate::project::ProjectView;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the project view handed to the watcher
/// - the metrics template (held for the process lifetime)
/// - the watcher loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let base_dir = config_root_dir(&config_path);
    let project = ProjectView::from_config(&cfg, &base_dir);

    if args.dry_run {
        print_dry_run(&cfg, &project);
        return Ok(());
    }

    // The template is loaded once here and owned by this scope for the life
    // of the process; code generation borrows it. The watcher never needs it,
    // so a load failure only degrades codegen.
    let _metrics_template = load_metrics_template(&cfg, &base_dir);

    // A startup failure (unreadable root, watch subsystem unavailable) is
    // degraded-but-non-fatal: log it and carry on without a watcher.
    let handle = match watch::spawn_watcher(project, &cfg.timing) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(error = %err, "could not start descriptor watcher");
            return Ok(());
        }
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = handle.shutdown_trigger();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(true);
        });
    }

    handle.join().await;
    Ok(())
}

/// Directory against which relative config paths are resolved.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_metrics_template(cfg: &ConfigFile, base_dir: &Path) -> Option<MetricsTemplate> {
    let rel = cfg.template.metrics.as_deref()?;
    let path = base_dir.join(rel);

    match MetricsTemplate::load(&path) {
        Ok(template) => {
            info!(path = ?path, "metrics template loaded");
            Some(template)
        }
        Err(err) => {
            warn!(error = %err, "could not load metrics template; code generation unavailable");
            None
        }
    }
}

/// Simple dry-run output: print the resolved settings.
fn print_dry_run(cfg: &ConfigFile, project: &ProjectView) {
    println!("pomwatch dry-run");
    println!("  project.root = {:?}", project.root());
    println!("  project.build_dir = {}", project.build_dir_name());
    println!("  descriptor.file = {}", project.descriptor_name());
    println!("  package = {}", project.resolve_package_name());
    if let Some(ref metrics) = cfg.template.metrics {
        println!("  template.metrics = {metrics}");
    }
    println!("  timing.throttle_ms = {}", cfg.timing.throttle_ms);
    println!("  timing.poll_ms = {}", cfg.timing.poll_ms);
    println!("  timing.stable_ms = {}", cfg.timing.stable_ms);
    println!(
        "  timing.stability_timeout_ms = {}",
        cfg.timing.stability_timeout_ms
    );
}

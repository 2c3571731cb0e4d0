// src/config/validate.rs

use std::path::Path;

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `build_dir` is a single, non-empty path component
/// - `descriptor.file` is a single, non-empty filename
/// - `poll_ms` and `throttle_ms` are non-zero
/// - `stable_ms < stability_timeout_ms` (otherwise stability can never be
///   observed before the timeout fires)
///
/// It does **not** check that `project.root` exists; that is deferred to
/// watcher startup so a missing root degrades with a warning instead of
/// failing config parsing.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_names(cfg)?;
    validate_timing(cfg)?;
    Ok(())
}

fn validate_names(cfg: &ConfigFile) -> Result<()> {
    ensure_single_component("[project].build_dir", &cfg.project.build_dir)?;
    ensure_single_component("[descriptor].file", &cfg.descriptor.file)?;
    Ok(())
}

fn validate_timing(cfg: &ConfigFile) -> Result<()> {
    let t = &cfg.timing;

    if t.poll_ms == 0 {
        return Err(anyhow!("[timing].poll_ms must be >= 1 (got 0)"));
    }
    if t.throttle_ms == 0 {
        return Err(anyhow!("[timing].throttle_ms must be >= 1 (got 0)"));
    }
    if t.stable_ms >= t.stability_timeout_ms {
        return Err(anyhow!(
            "[timing].stable_ms ({}) must be < [timing].stability_timeout_ms ({})",
            t.stable_ms,
            t.stability_timeout_ms
        ));
    }

    Ok(())
}

/// Reject empty values and values containing path separators.
///
/// Both the build directory and the descriptor file are matched against the
/// relative entry names carried by watch events, so nested paths would never
/// match anything.
fn ensure_single_component(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field} must not be empty"));
    }

    let path = Path::new(value);
    if path.components().count() != 1 {
        return Err(anyhow!(
            "{field} must be a single path component (got {value:?})"
        ));
    }

    Ok(())
}

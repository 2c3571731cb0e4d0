// src/project.rs

//! Read-only view of the project handed to the watcher at construction.
//!
//! The watcher never reaches back into the host or the raw config; everything
//! it needs to know about the project is captured here once, up front.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::ConfigFile;

/// Package used when neither a configured package nor a project name is
/// available.
pub const DEFAULT_PACKAGE: &str = "plugin";

/// The project layout and identity as the watcher sees it.
#[derive(Debug, Clone)]
pub struct ProjectView {
    root: PathBuf,
    build_dir_name: String,
    descriptor_name: String,
    name: Option<String>,
    package: Option<String>,
}

impl ProjectView {
    /// Build a view from a loaded config.
    ///
    /// A relative `project.root` is resolved against `base_dir` (usually the
    /// directory containing the config file).
    pub fn from_config(cfg: &ConfigFile, base_dir: &Path) -> Self {
        let raw_root = PathBuf::from(&cfg.project.root);
        let root = if raw_root.is_absolute() {
            raw_root
        } else {
            base_dir.join(raw_root)
        };
        // best-effort
        let root = root.canonicalize().unwrap_or(root);

        Self {
            root,
            build_dir_name: cfg.project.build_dir.clone(),
            descriptor_name: cfg.descriptor.file.clone(),
            name: cfg.project.name.clone(),
            package: cfg.project.package.clone(),
        }
    }

    /// Direct constructor, mainly for tests and embedding.
    pub fn new(
        root: impl Into<PathBuf>,
        build_dir_name: impl Into<String>,
        descriptor_name: impl Into<String>,
        name: Option<String>,
        package: Option<String>,
    ) -> Self {
        Self {
            root: root.into(),
            build_dir_name: build_dir_name.into(),
            descriptor_name: descriptor_name.into(),
            name,
            package,
        }
    }

    /// Project root; watched for the whole lifetime of the watcher.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the transient build directory (e.g. `target`).
    pub fn build_dir_name(&self) -> &str {
        &self.build_dir_name
    }

    /// Absolute path of the build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.build_dir_name)
    }

    /// Filename of the generated descriptor (e.g. `pom.xml`).
    pub fn descriptor_name(&self) -> &str {
        &self.descriptor_name
    }

    /// Absolute path of the descriptor inside the build directory.
    pub fn descriptor_path(&self) -> PathBuf {
        self.build_dir().join(&self.descriptor_name)
    }

    /// Resolve the package to substitute into the relocation block.
    ///
    /// Fallback chain: configured package (if non-blank), then project name
    /// (if non-blank), then [`DEFAULT_PACKAGE`]. The last step is logged: it
    /// usually means the project config is incomplete.
    pub fn resolve_package_name(&self) -> String {
        if let Some(pkg) = non_blank(self.package.as_deref()) {
            return pkg;
        }
        if let Some(name) = non_blank(self.name.as_deref()) {
            return name;
        }

        warn!(
            fallback = DEFAULT_PACKAGE,
            "no package or project name configured; using fallback package"
        );
        DEFAULT_PACKAGE.to_string()
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    let trimmed = s?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// This is a direct mapping of the example config:
///
/// ```toml
/// [project]
/// root = "."
/// build_dir = "target"
/// name = "my-plugin"
/// package = "com.example.myplugin"
///
/// [descriptor]
/// file = "pom.xml"
///
/// [timing]
/// throttle_ms = 500
/// ```
///
/// All sections except `[project]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Project layout from `[project]`.
    pub project: ProjectSection,

    /// Descriptor file settings from `[descriptor]`.
    #[serde(default)]
    pub descriptor: DescriptorSection,

    /// Template resources from `[template]`.
    #[serde(default)]
    pub template: TemplateSection,

    /// Timing knobs from `[timing]`.
    #[serde(default)]
    pub timing: TimingSection,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Project root directory. Relative paths are resolved against the
    /// directory containing the config file.
    #[serde(default = "default_root")]
    pub root: String,

    /// Name of the transient build-output directory under the root.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Project name; second choice for the relocation package.
    #[serde(default)]
    pub name: Option<String>,

    /// Base package for the relocation; first choice when non-empty.
    #[serde(default)]
    pub package: Option<String>,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_build_dir() -> String {
    "target".to_string()
}

/// `[descriptor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorSection {
    /// Filename of the generated build descriptor inside the build directory.
    #[serde(default = "default_descriptor_file")]
    pub file: String,
}

fn default_descriptor_file() -> String {
    "pom.xml".to_string()
}

impl Default for DescriptorSection {
    fn default() -> Self {
        Self {
            file: default_descriptor_file(),
        }
    }
}

/// `[template]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TemplateSection {
    /// Optional path to the Metrics class template used for code generation.
    ///
    /// If `None`, code generation is unavailable but watching still works.
    #[serde(default)]
    pub metrics: Option<String>,
}

/// `[timing]` section.
///
/// These are empirical defaults matched to Maven's write pattern; they are
/// knobs rather than invariants because the correct values depend on how the
/// external build tool writes the descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingSection {
    /// Minimum time between two successful patches; repeat descriptor events
    /// inside this window are dropped.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Interval between size samples while waiting for the file to settle.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    /// Continuous unchanged-size duration after which the file counts as
    /// stable.
    #[serde(default = "default_stable_ms")]
    pub stable_ms: u64,

    /// Maximum total time to wait for stability before proceeding anyway.
    #[serde(default = "default_stability_timeout_ms")]
    pub stability_timeout_ms: u64,
}

fn default_throttle_ms() -> u64 {
    500
}

fn default_poll_ms() -> u64 {
    20
}

fn default_stable_ms() -> u64 {
    200
}

fn default_stability_timeout_ms() -> u64 {
    2000
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            poll_ms: default_poll_ms(),
            stable_ms: default_stable_ms(),
            stability_timeout_ms: default_stability_timeout_ms(),
        }
    }
}

impl TimingSection {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn stable_for(&self) -> Duration {
        Duration::from_millis(self.stable_ms)
    }

    pub fn stability_timeout(&self) -> Duration {
        Duration::from_millis(self.stability_timeout_ms)
    }
}

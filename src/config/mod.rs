// src/config/mod.rs

//! Configuration loading and validation for pomwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like sane timing windows (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, DescriptorSection, ProjectSection, TemplateSection, TimingSection};
pub use validate::validate_config;

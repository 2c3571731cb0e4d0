// src/patch/template.rs

//! The Metrics class template used for code generation.
//!
//! The template is plain Java source text shipped next to the config. It is
//! read once at startup and owned by whoever loaded it; nothing here is held
//! in global state. The watcher itself never touches the template, so a
//! missing or unreadable template only degrades code generation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Literal template text for the generated Metrics class.
#[derive(Debug, Clone)]
pub struct MetricsTemplate {
    source: String,
}

impl MetricsTemplate {
    /// Read the template from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading metrics template at {:?}", path))?;
        Ok(Self { source })
    }

    /// Build a template from already-loaded text.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the class source under the given package.
    ///
    /// Replaces the template's `package ...;` declaration, or prepends one if
    /// the template has none.
    pub fn class_source(&self, package: &str) -> String {
        let decl = format!("package {package};");

        for (idx, line) in self.source.lines().enumerate() {
            if line.trim_start().starts_with("package ") {
                let mut lines: Vec<&str> = self.source.lines().collect();
                lines[idx] = &decl;
                return lines.join("\n");
            }
        }

        format!("{decl}\n\n{}", self.source)
    }

    /// Render the statement that wires a plugin up to metrics collection.
    pub fn connect_statement(&self, plugin_id: &str) -> String {
        format!("new Metrics(this, {plugin_id});")
    }
}

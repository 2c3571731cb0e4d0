use std::error::Error;

use pomwatch::patch::MetricsTemplate;

type TestResult = Result<(), Box<dyn Error>>;

const TEMPLATE: &str = "\
package org.bstats.bukkit;

public class Metrics {
    public Metrics(Object plugin, int serviceId) {
    }
}
";

#[test]
fn class_source_rewrites_the_package_declaration() {
    let template = MetricsTemplate::from_source(TEMPLATE);
    let rendered = template.class_source("com.example.myplugin.bstats");

    assert!(rendered.starts_with("package com.example.myplugin.bstats;"));
    assert!(!rendered.contains("org.bstats.bukkit"));
    assert!(rendered.contains("public class Metrics"));
}

#[test]
fn class_source_prepends_a_package_when_the_template_has_none() {
    let template = MetricsTemplate::from_source("public class Metrics {}\n");
    let rendered = template.class_source("com.example.myplugin");

    assert!(rendered.starts_with("package com.example.myplugin;"));
    assert!(rendered.contains("public class Metrics {}"));
}

#[test]
fn connect_statement_embeds_the_plugin_id() {
    let template = MetricsTemplate::from_source(TEMPLATE);
    assert_eq!(template.connect_statement("12345"), "new Metrics(this, 12345);");
}

#[test]
fn load_reads_the_template_from_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Metrics.java");
    std::fs::write(&path, TEMPLATE)?;

    let template = MetricsTemplate::load(&path)?;
    assert_eq!(template.source(), TEMPLATE);
    Ok(())
}

#[test]
fn load_reports_a_missing_template() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Metrics.java");
    assert!(MetricsTemplate::load(&missing).is_err());
}

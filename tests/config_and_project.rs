use std::error::Error;

use pomwatch::config::{load_and_validate, validate_config, ConfigFile};
use pomwatch::project::{ProjectView, DEFAULT_PACKAGE};

type TestResult = Result<(), Box<dyn Error>>;

fn parse(toml_src: &str) -> ConfigFile {
    toml::from_str(toml_src).expect("valid TOML")
}

#[test]
fn minimal_config_gets_defaults() -> TestResult {
    let cfg = parse("[project]\n");

    assert_eq!(cfg.project.root, ".");
    assert_eq!(cfg.project.build_dir, "target");
    assert_eq!(cfg.descriptor.file, "pom.xml");
    assert_eq!(cfg.timing.throttle_ms, 500);
    assert_eq!(cfg.timing.poll_ms, 20);
    assert_eq!(cfg.timing.stable_ms, 200);
    assert_eq!(cfg.timing.stability_timeout_ms, 2000);

    validate_config(&cfg)?;
    Ok(())
}

#[test]
fn load_and_validate_reads_a_config_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Pomwatch.toml");
    std::fs::write(
        &path,
        "[project]\nbuild_dir = \"build\"\npackage = \"com.example.thing\"\n\n[timing]\nthrottle_ms = 250\n",
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.project.build_dir, "build");
    assert_eq!(cfg.timing.throttle_ms, 250);
    Ok(())
}

#[test]
fn nested_build_dir_is_rejected() {
    let cfg = parse("[project]\nbuild_dir = \"out/target\"\n");
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("build_dir"));
}

#[test]
fn empty_descriptor_file_is_rejected() {
    let cfg = parse("[project]\n\n[descriptor]\nfile = \"\"\n");
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn zero_poll_interval_is_rejected() {
    let cfg = parse("[project]\n\n[timing]\npoll_ms = 0\n");
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn stability_window_must_fit_inside_the_timeout() {
    let cfg = parse("[project]\n\n[timing]\nstable_ms = 2000\nstability_timeout_ms = 2000\n");
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("stable_ms"));
}

#[test]
fn package_resolution_prefers_the_configured_package() {
    let view = ProjectView::new(
        "/project",
        "target",
        "pom.xml",
        Some("my-plugin".to_string()),
        Some("com.example.myplugin".to_string()),
    );
    assert_eq!(view.resolve_package_name(), "com.example.myplugin");
}

#[test]
fn blank_package_falls_back_to_the_project_name() {
    let view = ProjectView::new(
        "/project",
        "target",
        "pom.xml",
        Some("my-plugin".to_string()),
        Some("   ".to_string()),
    );
    assert_eq!(view.resolve_package_name(), "my-plugin");
}

#[test]
fn missing_package_and_name_fall_back_to_the_default() {
    let view = ProjectView::new("/project", "target", "pom.xml", None, None);
    assert_eq!(view.resolve_package_name(), DEFAULT_PACKAGE);
}

#[test]
fn descriptor_path_sits_inside_the_build_dir() {
    let view = ProjectView::new("/project", "target", "pom.xml", None, None);
    assert_eq!(view.build_dir(), std::path::Path::new("/project/target"));
    assert_eq!(
        view.descriptor_path(),
        std::path::Path::new("/project/target/pom.xml")
    );
}

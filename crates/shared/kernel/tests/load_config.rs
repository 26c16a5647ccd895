use std::fs;
use tempfile::tempdir;
use toggle_kernel::config::{ConfigError, load_config};
use toggle_kernel::domain::config::ToggleConfig;
use toggle_kernel::domain::constants::DEFAULT_SOURCE;

#[test]
fn loads_toml_file_over_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("toggle.toml");
    fs::write(
        &path,
        r#"
[service]
source = "bundle"
definitions = "features.json"

[logging]
level = "debug"
"#,
    )?;

    let cfg: ToggleConfig = load_config(Some(&path))?;
    assert_eq!(cfg.service.source, "bundle");
    assert_eq!(cfg.service.definitions.as_deref(), Some(std::path::Path::new("features.json")));
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.console, "missing keys keep defaults");
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");

    let err = load_config::<ToggleConfig>(Some(&path)).expect_err("missing file must fail");
    assert!(matches!(err, ConfigError::Config { .. }));
    assert!(err.to_string().contains("Failed to build config"));
}

#[test]
fn default_file_is_optional() -> Result<(), ConfigError> {
    let cfg: ToggleConfig = load_config(None::<&str>)?;
    assert_eq!(cfg.service.source, DEFAULT_SOURCE);
    Ok(())
}

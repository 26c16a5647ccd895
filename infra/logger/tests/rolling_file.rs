use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use toggle_domain::config::LoggingConfig;
use toggle_logger::Logger;

#[test]
fn directory_section_writes_named_log_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let directory = tmp.path().join("logs");

    let config = LoggingConfig {
        directory: Some(directory.clone()),
        rotation: "Never".to_owned(),
        max_files: 2,
        filter: Some("info".to_owned()),
        console: false,
        ..LoggingConfig::default()
    };
    let logger = Logger::from_config("toggle-rolling", &config)?;
    assert!(logger.writes_files());

    tracing::info!(feature = "checkout", "resolved");
    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    // Without rotation the file carries no date.
    let contents = fs::read_to_string(directory.join("toggle-rolling.log"))?;
    assert!(contents.contains("resolved"));
    assert!(contents.contains("feature=\"checkout\""));
    Ok(())
}

#[test]
fn zero_kept_files_is_rejected() {
    let tmp = tempdir().unwrap();
    let config = LoggingConfig {
        directory: Some(tmp.path().join("logs")),
        max_files: 0,
        ..LoggingConfig::default()
    };

    let err = Logger::from_config("toggle-rolling", &config).unwrap_err();
    assert!(err.to_string().contains("logging.max_files"));
    assert!(!tmp.path().join("logs").exists());
}

mod fixtures;

use fixtures::{feature, system_strategy};
use std::process::Command;
use toggle_engine::{FeatureService, Resolution};

const TEST_NAME: &str = "system_property_strategy_reads_the_process_environment";
const EXPECTED: &str = "TOGGLE_TEST_EXPECTED_ENABLED";

/// Re-runs this test binary with a prepared environment. The environment of
/// the running process is never mutated.
fn run_child(flag: Option<&str>, expected: bool) {
    let exe = std::env::current_exe().unwrap();
    let mut command = Command::new(exe);
    command
        .args(["--exact", TEST_NAME, "--test-threads=1"])
        .env(EXPECTED, expected.to_string())
        .env_remove("feature.flag");
    if let Some(value) = flag {
        command.env("feature.flag", value);
    }

    let output = command.output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "child failed for {flag:?}:\n{stdout}\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("1 passed"), "child did not run the test:\n{stdout}");
}

#[test]
fn system_property_strategy_reads_the_process_environment() {
    if let Some(expected) = std::env::var_os(EXPECTED) {
        let expected = expected == "true";
        let service = FeatureService::new();
        service.register_strategy(&system_strategy("env")).unwrap();
        service.register_feature(feature("search", false, Some("env"), &[])).unwrap();

        assert_eq!(service.explain("search"), Resolution::Strategy { name: "env".into(), enabled: expected });
        return;
    }

    run_child(Some("true"), true);
    run_child(Some("TRUE"), false);
    run_child(None, false);
}

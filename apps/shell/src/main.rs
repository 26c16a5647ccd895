use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use toggle::Toggle;
use toggle::domain::config::ToggleConfig;
use toggle::engine::{Feature, FeatureGroup, FeatureService, Strategizable};
use toggle_kernel::config::load_config;
use toggle_logger::Logger;

/// Query a feature flag service bootstrapped from configuration.
#[derive(Debug, Parser)]
#[command(name = "toggle", version, about)]
struct Cli {
    /// Configuration file; an optional `toggle.*` file in the working directory otherwise.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Definitions document, overriding `service.definitions`.
    #[arg(short, long, global = true)]
    definitions: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List active features.
    List,
    /// List active groups.
    Groups,
    /// List active strategies.
    Strategies,
    /// Show one feature.
    Get { name: String },
    /// Resolve a feature; exits with 1 when it is disabled.
    Check { name: String },
    /// Features belonging to a group.
    ByGroup { name: String },
    /// Features and groups using a strategy.
    ByStrategy { name: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config: ToggleConfig = load_config(cli.config.as_ref())?;
    if let Some(definitions) = cli.definitions.clone() {
        config.service.definitions = Some(definitions);
    }
    let _logger = Logger::from_config(env!("CARGO_PKG_NAME"), &config.logging)?;

    let toggle = Toggle::builder().config(config).build().await?;
    let mut out = io::stdout().lock();
    Ok(if run(&toggle, &cli, &mut out)? { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs one command. `Ok(false)` reports a missing or disabled feature.
fn run(toggle: &Toggle, cli: &Cli, out: &mut impl Write) -> anyhow::Result<bool> {
    let service = toggle.service();

    match &cli.command {
        Command::List => features(out, cli.json, service, &service.list_features())?,
        Command::Groups => {
            let groups = service.list_groups();
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&groups)?)?;
            } else {
                for group in &groups {
                    writeln!(out, "{}", group_line(group, service.is_group_enabled(group.name())))?;
                }
            }
        },
        Command::Strategies => {
            let strategies: Vec<_> = service.list_strategies();
            if cli.json {
                let snapshots: Vec<_> = strategies.iter().map(|s| s.properties()).collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&snapshots)?)?;
            } else {
                for strategy in &strategies {
                    writeln!(out, "{:<24} {}", strategy.name(), strategy.description())?;
                }
            }
        },
        Command::Get { name } => {
            let Some(feature) = service.get_feature(name) else {
                writeln!(out, "No feature named '{name}'")?;
                return Ok(false);
            };
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&feature.to_properties())?)?;
            } else {
                writeln!(out, "{}", feature_line(&feature, service.is_enabled(name)))?;
                writeln!(out, "  description: {}", feature.description())?;
                for (key, value) in feature.properties() {
                    writeln!(out, "  {key}: {value}")?;
                }
            }
        },
        Command::Check { name } => {
            let resolution = service.explain(name);
            if cli.json {
                writeln!(out, "{}", json!({ "feature": name, "resolution": resolution }))?;
            } else {
                writeln!(out, "{name}: {resolution}")?;
            }
            return Ok(resolution.is_enabled());
        },
        Command::ByGroup { name } => {
            features(out, cli.json, service, &service.features_by_group(name))?;
        },
        Command::ByStrategy { name } => {
            let groups = service.groups_by_strategy(name);
            let features = service.features_by_strategy(name);
            if cli.json {
                writeln!(
                    out,
                    "{}",
                    serde_json::to_string_pretty(&json!({ "groups": groups, "features": features }))?
                )?;
            } else {
                for group in &groups {
                    writeln!(out, "{}", group_line(group, service.is_group_enabled(group.name())))?;
                }
                for feature in &features {
                    writeln!(out, "{}", feature_line(feature, service.is_enabled(feature.name())))?;
                }
            }
        },
    }

    Ok(true)
}

fn features(
    out: &mut impl Write,
    as_json: bool,
    service: &FeatureService,
    features: &[Arc<Feature>],
) -> anyhow::Result<()> {
    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(features)?)?;
        return Ok(());
    }
    for feature in features {
        writeln!(out, "{}", feature_line(feature, service.is_enabled(feature.name())))?;
    }
    Ok(())
}

fn feature_line(feature: &Feature, enabled: bool) -> String {
    let groups = feature.groups().join(",");
    format!(
        "{:<3} {:<24} strategy={:<16} groups={}",
        if enabled { "on" } else { "off" },
        feature.name(),
        feature.strategy().unwrap_or("-"),
        if groups.is_empty() { "-" } else { &groups },
    )
}

fn group_line(group: &FeatureGroup, enabled: bool) -> String {
    format!(
        "{:<3} {:<24} strategy={}",
        if enabled { "on" } else { "off" },
        group.name(),
        group.strategy().unwrap_or("-"),
    )
}

#[cfg(test)]
mod tests {
    use super::{Cli, run};
    use clap::Parser;
    use serde_json::json;
    use toggle::Toggle;

    async fn toggle() -> Toggle {
        let definitions = serde_json::from_value(json!({
            "groups": [{ "name": "beta", "enabled": true }],
            "features": [
                { "name": "checkout", "groups": ["beta"] },
                { "name": "legacy", "enabled": false }
            ]
        }))
        .unwrap();
        Toggle::builder().definitions(definitions).build().await.unwrap()
    }

    fn output(toggle: &Toggle, args: &[&str]) -> (String, bool) {
        let argv = std::iter::once("toggle").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        let success = run(toggle, &cli, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), success)
    }

    #[tokio::test]
    async fn check_prints_the_deciding_rule() {
        let toggle = toggle().await;

        let (text, success) = output(&toggle, &["check", "checkout"]);
        assert_eq!(text.trim(), "checkout: enabled by group 'beta'");
        assert!(success);

        let (text, success) = output(&toggle, &["check", "legacy"]);
        assert_eq!(text.trim(), "legacy: disabled by static flag");
        assert!(!success);
    }

    #[tokio::test]
    async fn list_resolves_each_feature() {
        let toggle = toggle().await;
        let (text, _) = output(&toggle, &["list"]);

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("on  checkout"));
        assert!(lines[1].starts_with("off legacy"));
    }

    #[tokio::test]
    async fn json_output_is_machine_readable() {
        let toggle = toggle().await;
        let (text, _) = output(&toggle, &["--json", "by-group", "BETA"]);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["name"], json!("checkout"));
    }
}

//! End-to-end tests for the `towerintel` binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FIXTURE: &str = r#"[
  {"id": 1, "radio": "LTE", "mcc": 655, "lat": -26.2050, "lon": 28.0480, "range": 1500, "samples": 120, "averageSignal": -65},
  {"id": 2, "radio": "GSM", "mcc": 655, "lat": -26.2000, "lon": 28.0400, "range": 2000, "samples": 80, "averageSignal": -78}
]"#;

fn towerintel_cmd() -> Command {
    let mut cmd = Command::cargo_bin("towerintel").unwrap();
    cmd.env_remove("TOWERINTEL_ENRICHMENT__API_KEY")
        .env_remove("TOWERINTEL_COMPLETION__API_KEY")
        .env_remove("TOWERINTEL_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Config pointing the tower store at a JSON fixture, with no API keys
fn fixture_config(dir: &TempDir) -> std::path::PathBuf {
    let towers = dir.path().join("towers.json");
    fs::write(&towers, FIXTURE).unwrap();

    let config = dir.path().join("towerintel.toml");
    fs::write(
        &config,
        format!(
            "[tower_store]\nfixture_path = {:?}\n\n[logging]\nlevel = \"error\"\n",
            towers.display().to_string()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_help_shows_all_commands() {
    towerintel_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("stdio"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn test_tools_prints_definitions() {
    towerintel_cmd()
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"analyze_location\""))
        .stdout(predicate::str::contains("\"inputSchema\""));
}

#[test]
fn test_stdio_answers_json_rpc() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(&dir);

    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_tower_by_id","arguments":{"id":2}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"nope"}"#,
        "\n",
    );

    towerintel_cmd()
        .arg("--config")
        .arg(&config)
        .arg("stdio")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id":1"#))
        .stdout(predicate::str::contains("GSM"))
        .stdout(predicate::str::contains(r#""code":"MethodNotFound""#));
}

#[test]
fn test_analyze_without_places_key_fails() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(&dir);

    towerintel_cmd()
        .arg("--config")
        .arg(&config)
        .args(["analyze", "--lat", "-26.2041", "--lng", "28.0473"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("places provider unavailable"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("towerintel.toml");
    fs::write(&config, "[cache]\nttl_seconds = 99999999\n").unwrap();

    towerintel_cmd()
        .arg("--config")
        .arg(&config)
        .arg("stdio")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

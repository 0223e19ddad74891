use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn read_fixture(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

#[test]
fn demo_matches_golden_plantuml() {
    let root = repo_root();
    let golden = read_fixture(&root.join("fixtures").join("demo.puml"));

    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    let output = Command::new(exe)
        .current_dir(&root)
        .arg("demo")
        .output()
        .expect("run lifeline-cli");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), golden);
}

#[test]
fn render_trace_file_matches_golden_plantuml() {
    let root = repo_root();
    let traces = root.join("fixtures").join("traces");
    let golden = read_fixture(&traces.join("checkout.puml"));

    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    let output = Command::new(exe)
        .current_dir(&root)
        .args([
            "render",
            traces.join("checkout.trace.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run lifeline-cli");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), golden);
}

#[test]
fn demo_trace_round_trips_through_render() {
    let root = repo_root();
    let tmp = tempfile::tempdir().expect("tempdir");
    let trace_path = tmp.path().join("demo.trace.json");
    let puml_path = tmp.path().join("demo.puml");

    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    Command::new(exe)
        .current_dir(&root)
        .args([
            "demo",
            "--trace",
            "--pretty",
            "--out",
            trace_path.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&read_fixture(&trace_path)).expect("trace is JSON");
    assert_eq!(json["actions"].as_array().map(Vec::len), Some(34));
    assert_eq!(json["actions"][0]["kind"], "fragmentBegin");

    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    Command::new(exe)
        .current_dir(&root)
        .args([
            "render",
            "--out",
            puml_path.to_string_lossy().as_ref(),
            trace_path.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    assert_eq!(
        read_fixture(&puml_path),
        read_fixture(&root.join("fixtures").join("demo.puml"))
    );
}

#[test]
fn config_file_and_title_shape_the_output() {
    let root = repo_root();
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");
    fs::write(&config, r#"{ "plantuml": { "activation": false, "hideFootbox": true } }"#)
        .expect("write config");

    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    let output = Command::new(exe)
        .current_dir(&root)
        .args([
            "demo",
            "--config",
            config.to_string_lossy().as_ref(),
            "--title",
            "Accounts",
        ])
        .output()
        .expect("run lifeline-cli");
    assert!(output.status.success(), "{output:?}");

    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.starts_with("@startuml\ntitle Accounts\nhide footbox\n"), "{text}");
    assert!(!text.contains("activate"), "{text}");
}

#[test]
fn malformed_trace_fails_with_exit_code_1() {
    let root = repo_root();
    let tmp = tempfile::tempdir().expect("tempdir");
    let trace = tmp.path().join("broken.trace.json");
    fs::write(
        &trace,
        r#"{"actors": [], "actions": [{"kind": "fragmentEnd", "op_name": "opt"}]}"#,
    )
    .expect("write trace");

    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    Command::new(exe)
        .current_dir(&root)
        .args(["render", trace.to_string_lossy().as_ref()])
        .assert()
        .code(1);
}

#[test]
fn unknown_flag_prints_usage_with_exit_code_2() {
    let exe = assert_cmd::cargo_bin!("lifeline-cli");
    let output = Command::new(exe)
        .args(["render", "--bogus"])
        .output()
        .expect("run lifeline-cli");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("USAGE:"));
}

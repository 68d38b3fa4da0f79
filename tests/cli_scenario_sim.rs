use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "netlab-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const SCENARIO: &str = r#"
{
  "schema_version": 1,
  "meta": { "name": "cli-switched-pair" },
  "devices": [
    { "name": "pc1", "kind": "pc",
      "interfaces": [ { "ip": "10.0.0.1", "mask": "255.255.255.0" } ] },
    { "name": "pc2", "kind": "pc",
      "interfaces": [ { "ip": "10.0.0.2", "mask": "255.255.255.0" } ] },
    { "name": "sw1", "kind": "switch", "ports": 4 }
  ],
  "cables": [
    { "a": "pc1:eth0", "b": "sw1:fa0/1" },
    { "a": "pc2:eth0", "b": "sw1:fa0/2" }
  ],
  "pings": [
    { "from": "pc1", "to": "10.0.0.2", "count": 3, "gap_ms": 500 }
  ]
}
"#;

#[test]
fn scenario_sim_prints_ping_lines_and_a_json_summary() {
    let dir = unique_temp_dir("scenario");
    let scenario = write_file(&dir, "scenario.json", SCENARIO);

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .arg("--scenario")
        .arg(&scenario)
        .arg("--until-ms")
        .arg("10000")
        .output()
        .expect("run scenario-sim");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.lines().any(|l| l.starts_with("ping pc1:")),
        "stdout: {stdout}"
    );

    let json_line = stdout
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("json summary line");
    let doc: Value = serde_json::from_str(json_line).expect("valid json");
    assert_eq!(doc["schema_version"], 1);

    let summary = doc["summary"].as_array().expect("summary array");
    let pc1 = summary
        .iter()
        .find(|s| s["host"] == "pc1")
        .expect("pc1 entry");
    assert_eq!(pc1["sent"], 3);
    assert_eq!(pc1["replied"], 3);
    assert_eq!(pc1["failed"], 0);
}

#[test]
fn scenario_sim_fails_cleanly_on_a_bad_scenario_file() {
    let dir = unique_temp_dir("scenario-bad");
    let scenario = write_file(&dir, "bad.json", "{ not json");

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .arg("--scenario")
        .arg(&scenario)
        .output()
        .expect("run scenario-sim");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("parse scenario"));
}

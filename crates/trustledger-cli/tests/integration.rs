//! Integration tests for CLI commands.

use serde_json::{json, Value};
use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::process::{Command, Output};
use tempfile::TempDir;

const ADMIN: &str = "0x0101010101010101010101010101010101010101";
const VENDOR: &str = "0x0202020202020202020202020202020202020202";
const ALICE: &str = "0x0303030303030303030303030303030303030303";
const BOB: &str = "0x0404040404040404040404040404040404040404";
const RECEIVER: &str = "0x0505050505050505050505050505050505050505";

fn trustledger(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--bin", "trustledger", "--"])
        .args(args)
        .env("TRUSTLEDGER_LOG", "off")
        .output()
        .expect("failed to run trustledger")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn script() -> Value {
    json!({
        "config": { "admin": ADMIN },
        "operations": [
            { "op": "add_product", "caller": ADMIN, "at": 100, "product": "kettle", "vendor": VENDOR },
            { "op": "broadcast", "caller": ADMIN, "at": 101, "product": "kettle",
              "destination_domain": 16015286601757825753u64, "destination_address": RECEIVER, "gas_budget": 200000 },
            { "op": "post_review", "caller": ALICE, "at": 110, "product": "kettle", "transaction": "order-1", "rating": 80 },
            { "op": "post_review", "caller": BOB, "at": 120, "product": "kettle", "transaction": "order-1", "rating": 50 },
            { "op": "post_review", "caller": BOB, "at": 130, "product": "kettle", "transaction": "order-2", "rating": 60 },
            { "op": "post_review", "caller": VENDOR, "at": 140, "product": "kettle", "transaction": "order-3", "rating": 90 },
            { "op": "broadcast", "caller": ADMIN, "at": 150, "product": "kettle",
              "destination_domain": 16015286601757825753u64, "destination_address": RECEIVER, "gas_budget": 200000 }
        ]
    })
}

/// Runs the standard script into a fresh journal.
fn run_script(dir: &TempDir) -> (String, Output) {
    let script_path = dir.path().join("script.json");
    fs::write(&script_path, serde_json::to_string_pretty(&script()).unwrap()).unwrap();
    let journal = dir.path().join("ledger.tlj").to_string_lossy().to_string();
    let output = trustledger(&[
        "run",
        script_path.to_str().unwrap(),
        "--journal",
        &journal,
        "--json",
    ]);
    (journal, output)
}

#[test]
fn run_reports_each_operation() {
    let dir = TempDir::new().unwrap();
    let (_, output) = run_script(&dir);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let results: Vec<Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let outcomes: Vec<(bool, Option<&str>)> = results
        .iter()
        .map(|r| (r["ok"].as_bool().unwrap(), r["code"].as_str()))
        .collect();
    assert_eq!(
        outcomes,
        [
            (true, None),
            (false, Some("INVALID_INPUT")),
            (true, None),
            (false, Some("ALREADY_USED")),
            (true, None),
            (false, Some("UNAUTHORIZED")),
            (true, None),
        ]
    );
    assert_eq!(results[4]["detail"], "review 1 average=7000 total=2");
    assert_eq!(results[3]["records"], 0);
}

#[test]
fn list_filters_by_kind() {
    let dir = TempDir::new().unwrap();
    let (journal, _) = run_script(&dir);

    let output = trustledger(&["list", &journal, "--json", "--kind", "trust_score_updated"]);
    assert!(output.status.success());
    let records: Vec<Value> = stdout(&output)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["average_rating"], 8000);
    assert_eq!(records[1]["average_rating"], 7000);

    let output = trustledger(&["list", &journal, "--json", "--max-events", "1"]);
    assert_eq!(stdout(&output).lines().count(), 1);

    let output = trustledger(&["list", &journal]);
    assert!(stdout(&output).contains("trust_score_broadcast"));
}

#[test]
fn verify_passes_then_catches_tampering() {
    let dir = TempDir::new().unwrap();
    let (journal, _) = run_script(&dir);

    let output = trustledger(&["verify", &journal, "--strict", "--json"]);
    assert!(output.status.success());
    let results: Vec<Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(results.len(), 7);
    assert!(results.iter().all(|r| r["verdict"] == "ok"));

    // Flip the rating in the first review payload without touching its id.
    let bytes = fs::read(&journal).unwrap();
    let needle = br#""rating":80"#;
    let offset = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap();
    let mut file = fs::OpenOptions::new().write(true).open(&journal).unwrap();
    file.seek(SeekFrom::Start((offset + needle.len() - 2) as u64))
        .unwrap();
    file.write_all(b"99").unwrap();
    drop(file);

    let output = trustledger(&["verify", &journal, "--strict", "--json"]);
    assert!(!output.status.success());
    let results: Vec<Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        results.iter().filter(|r| r["verdict"] == "mismatch").count(),
        1
    );

    // The replay audit sees the edited rating disagree with the score.
    let output = trustledger(&["audit", &journal, "--strict", "--json"]);
    assert!(!output.status.success());
}

#[test]
fn audit_reports_replayed_scores() {
    let dir = TempDir::new().unwrap();
    let (journal, _) = run_script(&dir);

    let output = trustledger(&["audit", &journal, "--json", "--strict"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["reviews"], 2);
    assert!(report["violations"].as_array().unwrap().is_empty());

    let product = report["products"].as_object().unwrap().values().next().unwrap();
    assert_eq!(product["average_rating"], 7000);
    assert_eq!(product["broadcasts"], 1);
}

#[test]
fn rerun_refuses_existing_journal_unless_truncated() {
    let dir = TempDir::new().unwrap();
    let (journal, first) = run_script(&dir);
    assert!(first.status.success());
    let script_path = dir.path().join("script.json");
    let original = fs::read(&journal).unwrap();

    let output = trustledger(&["run", script_path.to_str().unwrap(), "--journal", &journal]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--truncate"));
    assert_eq!(fs::read(&journal).unwrap(), original);

    let output = trustledger(&[
        "run",
        script_path.to_str().unwrap(),
        "--journal",
        &journal,
        "--truncate",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = trustledger(&["audit", &journal, "--json", "--strict"]);
    assert!(output.status.success(), "{}", stdout(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["reviews"], 2);

    let output = trustledger(&["verify", &journal, "--strict", "--json"]);
    let results: Vec<Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(results.len(), 7);
}

#[test]
fn run_without_config_fails() {
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("script.json");
    fs::write(&script_path, r#"{"operations": []}"#).unwrap();
    let journal = dir.path().join("ledger.tlj");

    let output = trustledger(&[
        "run",
        script_path.to_str().unwrap(),
        "--journal",
        journal.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no ledger config"));
}

#[test]
fn config_file_overrides_script() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        json!({ "admin": ADMIN, "start_paused": true }).to_string(),
    )
    .unwrap();
    let script_path = dir.path().join("script.json");
    fs::write(&script_path, serde_json::to_string(&script()).unwrap()).unwrap();
    let journal = dir.path().join("ledger.tlj");

    let output = trustledger(&[
        "run",
        script_path.to_str().unwrap(),
        "--journal",
        journal.to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
        "--json",
    ]);
    assert!(output.status.success());
    let results: Vec<Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(results.iter().all(|r| r["code"] == "PAUSED"));
}

#[test]
fn missing_journal_is_an_error() {
    let dir = TempDir::new().unwrap();
    let journal = dir.path().join("absent.tlj");
    let output = trustledger(&["list", journal.to_str().unwrap()]);
    assert!(!output.status.success());
}

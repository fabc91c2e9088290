//! Exit-code and wire-shape checks for the entry-point binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_gate(input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ggl-infer"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("gate binary spawns");
    child
        .stdin
        .as_mut()
        .expect("stdin is piped")
        .write_all(input)
        .expect("request bytes written");
    child.wait_with_output().expect("gate binary exits")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is one JSON document")
}

const SCENARIO: &str = r#"{"pack":{"model_id":"m1","weights_hash":"h:aaaa0001","tensor_hash":"h:bbbb0002","glyph_hash":"h:cccc0003"},"infer":{"prompt":"hi","max_tokens":8}}"#;

#[test]
fn valid_request_exits_zero_with_canonical_response() {
    let output = run_gate(SCENARIO.as_bytes());
    assert_eq!(output.status.code(), Some(0));

    let response = stdout_json(&output);
    assert_eq!(response["ok"], true);
    assert_eq!(response["pack"]["pack_hash"], "h:f36821f0");
    assert_eq!(response["infer"]["input_hash"], "h:0435ab90");
    assert_eq!(response["infer"]["output_hash"], "h:a298b033");
    assert_eq!(response["infer"]["proof_hash"], "h:4a94959b");

    let kinds: Vec<&str> = response["frames"]
        .as_array()
        .expect("frames array")
        .iter()
        .map(|frame| frame["kind"].as_str().expect("kind is a string"))
        .collect();
    assert_eq!(kinds, vec!["infer.pack", "infer.start", "infer.end"]);

    // Canonical output: key-sorted, no insignificant whitespace.
    let text = String::from_utf8(output.stdout).expect("utf-8");
    assert!(text.starts_with("{\"contract\":"));
    assert!(!text.trim_end().contains('\n'));
}

#[test]
fn seeded_request_emits_seed_frame() {
    let request = r#"{"pack":{"model_id":"m1","weights_hash":"h:aaaa0001","tensor_hash":"h:bbbb0002","glyph_hash":"h:cccc0003","seed":42},"infer":{"prompt":"hi","max_tokens":8}}"#;
    let output = run_gate(request.as_bytes());
    assert_eq!(output.status.code(), Some(0));

    let response = stdout_json(&output);
    assert_eq!(response["pack"]["pack_hash"], "h:b896389b");
    let kinds: Vec<&str> = response["frames"]
        .as_array()
        .expect("frames array")
        .iter()
        .map(|frame| frame["kind"].as_str().expect("kind is a string"))
        .collect();
    assert_eq!(
        kinds,
        vec!["infer.pack", "infer.seed", "infer.start", "infer.end"]
    );
}

#[test]
fn empty_input_is_a_contract_fault_with_exit_two() {
    let output = run_gate(b"");
    assert_eq!(output.status.code(), Some(2));
    let fault = stdout_json(&output);
    assert_eq!(fault["ok"], false);
    assert_eq!(fault["fault"], "E_CONTRACT");
}

#[test]
fn whitespace_only_input_is_a_contract_fault_with_exit_two() {
    let output = run_gate(b"  \n\t ");
    assert_eq!(output.status.code(), Some(2));
    let fault = stdout_json(&output);
    assert_eq!(fault["fault"], "E_CONTRACT");
}

#[test]
fn malformed_input_is_a_json_fault_with_exit_two() {
    let output = run_gate(b"{not json");
    assert_eq!(output.status.code(), Some(2));
    let fault = stdout_json(&output);
    assert_eq!(fault["ok"], false);
    assert_eq!(fault["fault"], "E_JSON");
}

#[test]
fn contract_violation_exits_one() {
    let output = run_gate(br#"{"pack":{},"infer":{}}"#);
    assert_eq!(output.status.code(), Some(1));
    let fault = stdout_json(&output);
    assert_eq!(fault["fault"], "E_CONTRACT");
    assert_eq!(fault["message"], "pack.model_id must be a non-empty string");
}

#[test]
fn missing_sections_exit_one() {
    let output = run_gate(br#"{"pack":{"model_id":"m1"}}"#);
    assert_eq!(output.status.code(), Some(1));
    let fault = stdout_json(&output);
    assert_eq!(fault["message"], "missing pack/infer");
}

#[test]
fn non_object_request_exits_one() {
    let output = run_gate(b"[1,2,3]");
    assert_eq!(output.status.code(), Some(1));
    let fault = stdout_json(&output);
    assert_eq!(fault["fault"], "E_CONTRACT");
}

#[test]
fn repeated_runs_differ_only_in_timestamps() {
    let first = stdout_json(&run_gate(SCENARIO.as_bytes()));
    let second = stdout_json(&run_gate(SCENARIO.as_bytes()));

    let strip = |mut response: serde_json::Value| -> serde_json::Value {
        for frame in response["frames"]
            .as_array_mut()
            .expect("frames array")
            .iter_mut()
        {
            frame["t_ms"] = serde_json::json!(0);
        }
        response
    };
    assert_eq!(strip(first), strip(second));
}

//! Offline replay verifier for recorded responses and frame streams.

use std::fs;

use ggl_gate::replay::{render_report_summary, verify_response, verify_response_with_request};

fn main() {
    let exit_code = match run(std::env::args().skip(1).collect()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(args: Vec<String>) -> Result<i32, String> {
    if args.iter().any(|arg| matches!(arg.as_str(), "help" | "--help" | "-h")) {
        println!("{}", usage());
        return Ok(0);
    }

    let mut input_path: Option<&str> = None;
    let mut request_path: Option<&str> = None;
    let mut summary = false;

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--input" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--input requires a path".to_string())?;
                input_path = Some(value);
            }
            "--request" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--request requires a path".to_string())?;
                request_path = Some(value);
            }
            "--summary" => summary = true,
            flag => return Err(format!("unknown flag '{flag}'\n\n{}", usage())),
        }
        index += 1;
    }

    let input_path =
        input_path.ok_or_else(|| format!("missing required --input <path>\n\n{}", usage()))?;
    let response = load_json(input_path, "response document")?;

    let report = match request_path {
        Some(path) => {
            let request = load_json(path, "original request")?;
            verify_response_with_request(&response, &request)
        }
        None => verify_response(&response),
    };

    if summary {
        println!("{}", render_report_summary(&report));
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|error| format!("failed to encode report: {error}"))?
        );
    }

    Ok(if report.ok { 0 } else { 25 })
}

fn usage() -> String {
    [
        "ggl-verify usage:",
        "  ggl-verify --input <path> [--request <path>] [--summary]",
        "",
        "  <path> holds a recorded response document or a bare JSON array",
        "  of frames. With --request, pack_hash is re-derived from the",
        "  original request and cross-checked against the response.",
        "",
        "exit codes:",
        "  0   verification passed",
        "  25  verification failed",
        "  2   CLI/input error",
    ]
    .join("\n")
}

fn load_json(path: &str, what: &str) -> Result<serde_json::Value, String> {
    let bytes =
        fs::read(path).map_err(|error| format!("failed to read {what} '{path}': {error}"))?;
    serde_json::from_slice(&bytes).map_err(|error| format!("{what} '{path}' is not JSON: {error}"))
}

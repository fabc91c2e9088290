//! Entry point: one request in on stdin, one canonical response out on
//! stdout, outcome mapped to the process exit status.
//!
//! Exit codes:
//!   0  success
//!   1  handled contract fault
//!   2  empty or unparseable input
//!   3  unexpected internal error

use std::io::Read;

use ggl_gate::canonical::canonical_json;
use ggl_gate::executor::StubExecutor;
use ggl_gate::frame::WallClock;
use ggl_gate::handler::{Fault, FaultKind, RequestHandler};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let mut input = String::new();
    if let Err(error) = std::io::stdin().read_to_string(&mut input) {
        return emit_fault(&Fault::runtime(format!("failed to read input: {error}")));
    }

    if input.trim().is_empty() {
        // An empty channel is a contract failure of the caller, but it is
        // indistinguishable from a transport problem, so it maps to the
        // input-shape exit code.
        emit_fault(&Fault::contract("empty request"));
        return 2;
    }

    let request: serde_json::Value = match serde_json::from_str(&input) {
        Ok(value) => value,
        Err(error) => {
            emit_fault(&Fault::json(format!("request is not valid JSON: {error}")));
            return 2;
        }
    };

    let clock = WallClock;
    let executor = StubExecutor;
    let handler = RequestHandler::new(&executor, &clock);

    match handler.handle(&request) {
        Ok(response) => match response.to_response_value() {
            Ok(value) => {
                // One complete message, written atomically.
                println!("{}", canonical_json(&value));
                0
            }
            Err(fault) => emit_fault(&fault),
        },
        Err(fault) => emit_fault(&fault),
    }
}

fn emit_fault(fault: &Fault) -> i32 {
    println!("{}", canonical_json(&fault.to_response_value()));
    match fault.kind {
        FaultKind::Contract => 1,
        FaultKind::Json => 2,
        FaultKind::Runtime => 3,
    }
}

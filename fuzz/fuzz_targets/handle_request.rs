#![no_main]

use ggl_gate::executor::StubExecutor;
use ggl_gate::frame::FixedClock;
use ggl_gate::handler::RequestHandler;
use ggl_gate::replay::verify_response;
use libfuzzer_sys::fuzz_target;

// The handler must never panic on arbitrary request values, and every
// successful response it does produce must survive replay verification.
fuzz_target!(|data: &[u8]| {
    let request: serde_json::Value = match serde_json::from_slice(data) {
        Ok(value) => value,
        Err(_) => return,
    };

    let clock = FixedClock(0);
    let handler = RequestHandler::new(&StubExecutor, &clock);
    match handler.handle(&request) {
        Ok(response) => {
            let value = response
                .to_response_value()
                .expect("successful responses serialize");
            let report = verify_response(&value);
            assert!(report.ok, "violations: {:?}", report.violations);
        }
        Err(_) => {}
    }
});

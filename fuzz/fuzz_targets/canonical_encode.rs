#![no_main]

use ggl_gate::canonical::{canonical_hash, canonical_json};
use libfuzzer_sys::fuzz_target;

// Any parseable JSON document must canonical-encode without panicking,
// the canonical form must re-parse, and re-encoding the re-parse must be
// a fixpoint with a stable hash.
fuzz_target!(|data: &[u8]| {
    let value: serde_json::Value = match serde_json::from_slice(data) {
        Ok(value) => value,
        Err(_) => return,
    };

    let encoded = canonical_json(&value);
    let reparsed: serde_json::Value =
        serde_json::from_str(&encoded).expect("canonical output must parse");

    assert_eq!(canonical_json(&reparsed), encoded);
    assert_eq!(canonical_hash(&value), canonical_hash(&reparsed));
});

//! Canonical JSON encoding: the single deterministic byte form that all
//! hashing rests on.
//!
//! Two structurally equal values always encode to identical bytes:
//! object keys are emitted in lexicographic byte order regardless of
//! insertion order, no insignificant whitespace is produced, and non-ASCII
//! characters are written literally as UTF-8 rather than `\uXXXX`-escaped.
//! Only the escapes JSON requires are emitted: `"`, `\`, and control
//! characters below U+0020 (with the conventional short forms for
//! backspace, form feed, newline, carriage return, and tab).
//!
//! Integers, booleans, and `null` use fixed spellings. The encoder is a
//! pure function of its input; any nondeterminism here would invalidate
//! every proof downstream.

use serde_json::Value;

use crate::checksum::hash_string;

/// Encode a JSON value into its canonical string form.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Checksum of the canonical UTF-8 encoding, rendered as a hash string.
pub fn canonical_hash(value: &Value) -> String {
    hash_string(canonical_json(value).as_bytes())
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => write_string(out, text),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sort explicitly rather than relying on the map's internal
            // ordering, so the encoding does not depend on how the value
            // was built or which map backing serde_json was compiled with.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_string(out, key.as_str());
                out.push(':');
                // Key came from the map, so the entry exists.
                if let Some(entry) = map.get(key) {
                    write_value(out, entry);
                }
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            control if control < '\u{20}' => {
                out.push_str(&format!("\\u{:04x}", control as u32));
            }
            other => out.push(other),
        }
    }
    out.push('"');
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- Scalars --

    #[test]
    fn scalar_spellings_are_fixed() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(true)), "true");
        assert_eq!(canonical_json(&json!(false)), "false");
        assert_eq!(canonical_json(&json!(0)), "0");
        assert_eq!(canonical_json(&json!(1024)), "1024");
        assert_eq!(canonical_json(&json!(-42)), "-42");
        assert_eq!(canonical_json(&json!("")), "\"\"");
    }

    #[test]
    fn integer_extremes_are_stable() {
        assert_eq!(canonical_json(&json!(i64::MIN)), "-9223372036854775808");
        assert_eq!(canonical_json(&json!(i64::MAX)), "9223372036854775807");
        assert_eq!(canonical_json(&json!(u64::MAX)), "18446744073709551615");
    }

    // -- Key ordering --

    #[test]
    fn object_keys_are_sorted() {
        let value = json!({"prompt": "hi", "max_tokens": 8, "mode": "chat"});
        assert_eq!(
            canonical_json(&value),
            r#"{"max_tokens":8,"mode":"chat","prompt":"hi"}"#
        );
    }

    #[test]
    fn insertion_order_is_irrelevant() {
        let forward = json!({"a": 1, "b": 2, "c": 3});
        let reverse = json!({"c": 3, "b": 2, "a": 1});
        assert_eq!(canonical_json(&forward), canonical_json(&reverse));
    }

    #[test]
    fn schema_tag_keys_sort_before_field_names() {
        // '@' (0x40) sorts before every lowercase letter.
        let value = json!({"model_id": "m", "@v": "1.0.0", "@type": "t"});
        assert_eq!(
            canonical_json(&value),
            r#"{"@type":"t","@v":"1.0.0","model_id":"m"}"#
        );
    }

    #[test]
    fn nested_objects_are_sorted_at_every_level() {
        let value = json!({"z": {"b": 1, "a": 2}, "a": [{"y": 1, "x": 2}]});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":[{"x":2,"y":1}],"z":{"a":2,"b":1}}"#
        );
    }

    // -- Separators and whitespace --

    #[test]
    fn no_insignificant_whitespace() {
        let value = json!({"k": [1, 2, {"n": null}]});
        let encoded = canonical_json(&value);
        assert!(!encoded.contains(' '));
        assert_eq!(encoded, r#"{"k":[1,2,{"n":null}]}"#);
    }

    #[test]
    fn empty_containers() {
        assert_eq!(canonical_json(&json!({})), "{}");
        assert_eq!(canonical_json(&json!([])), "[]");
    }

    // -- String escaping --

    #[test]
    fn non_ascii_is_emitted_literally() {
        let value = json!({"prompt": "héllo ☃"});
        assert_eq!(canonical_json(&value), "{\"prompt\":\"héllo ☃\"}");
    }

    #[test]
    fn mandatory_escapes_only() {
        let value = json!({"a": "line\nbreak\t\"q\"\\"});
        assert_eq!(canonical_json(&value), r#"{"a":"line\nbreak\t\"q\"\\"}"#);
    }

    #[test]
    fn control_characters_use_unicode_escapes() {
        let value = json!("\u{01}\u{1f}");
        assert_eq!(canonical_json(&value), r#""\u0001\u001f""#);
    }

    #[test]
    fn solidus_is_not_escaped() {
        assert_eq!(canonical_json(&json!("a/b")), "\"a/b\"");
    }

    // -- Hash integration --

    #[test]
    fn canonical_hash_matches_reference_vectors() {
        let input = json!({"prompt": "hi", "mode": "chat", "max_tokens": 8});
        assert_eq!(canonical_hash(&input), "h:0435ab90");

        let defaults = json!({"prompt": "", "mode": "chat", "max_tokens": 1024});
        assert_eq!(canonical_hash(&defaults), "h:2e107078");

        let unicode = json!({"prompt": "héllo ☃", "mode": "chat", "max_tokens": 1024});
        assert_eq!(canonical_hash(&unicode), "h:dcbc3382");

        let escapes = json!({"a": "line\nbreak\t\"q\"\\"});
        assert_eq!(canonical_hash(&escapes), "h:8e658634");
    }

    #[test]
    fn hash_is_invariant_under_key_permutation() {
        let forward = json!({"x": 1, "y": {"p": true, "q": null}});
        let reverse = json!({"y": {"q": null, "p": true}, "x": 1});
        assert_eq!(canonical_hash(&forward), canonical_hash(&reverse));
    }

    // -- Idempotence --

    #[test]
    fn reparsing_canonical_output_is_stable() {
        let value = json!({
            "pack": {"model_id": "m1", "seed": null},
            "infer": {"prompt": "héllo", "max_tokens": 8}
        });
        let first = canonical_json(&value);
        let reparsed: Value = serde_json::from_str(&first).expect("canonical output parses");
        assert_eq!(canonical_json(&reparsed), first);
    }
}

//! Request shape validation and typed configuration extraction.
//!
//! The incoming request is permissively shaped JSON; this module validates
//! it once at the boundary and produces typed configuration structs with
//! explicit defaults, so nothing downstream does ad-hoc lookups. Failures
//! here are contract violations: the caller sent a request the contract
//! does not admit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default ABI identity when the request does not name one.
pub const DEFAULT_ABI_ID: &str = "transformers.py:v1";
/// Default ABI content hash.
pub const DEFAULT_ABI_HASH: &str = "h:00000000";
/// Default runtime device.
pub const DEFAULT_RUNTIME_DEVICE: &str = "cpu";
/// Default runtime precision.
pub const DEFAULT_RUNTIME_PRECISION: &str = "fp32";
/// Default inference mode.
pub const DEFAULT_MODE: &str = "chat";
/// Default token budget; non-integer values silently fall back to this.
pub const DEFAULT_MAX_TOKENS: i64 = 1024;

// ---------------------------------------------------------------------------
// ContractViolation
// ---------------------------------------------------------------------------

/// Why a request failed shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ContractViolation {
    /// The request body is not a JSON object.
    #[error("request body must be a JSON object")]
    NotAnObject,
    /// `pack` or `infer` is missing or not an object.
    #[error("missing pack/infer")]
    MissingSections,
    /// A required pack field is absent, not a string, or empty.
    #[error("pack.{field} must be a non-empty string")]
    EmptyRequiredField { field: String },
    /// A supplied seed is not an integer.
    #[error("seed must be an integer")]
    NonIntegerSeed,
}

// ---------------------------------------------------------------------------
// PolicyConfig
// ---------------------------------------------------------------------------

/// Declared isolation posture of the sealed execution.
///
/// These flags are committed into the pack proof so a verifier can detect
/// a later execution environment contradicting the declared posture; the
/// gate itself does not enforce isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub sealed: bool,
    pub no_network: bool,
    pub no_fs: bool,
    pub no_eval: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sealed: true,
            no_network: true,
            no_fs: true,
            no_eval: true,
        }
    }
}

// ---------------------------------------------------------------------------
// PackConfig
// ---------------------------------------------------------------------------

/// Identity and policy of the sealed model configuration for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    pub model_id: String,
    pub weights_hash: String,
    pub tensor_hash: String,
    pub glyph_hash: String,
    pub abi_id: String,
    pub abi_hash: String,
    pub runtime_device: String,
    pub runtime_precision: String,
    pub seed: Option<i64>,
    pub policy: PolicyConfig,
}

// ---------------------------------------------------------------------------
// InferConfig
// ---------------------------------------------------------------------------

/// Per-request inference intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferConfig {
    pub prompt: String,
    pub mode: String,
    pub max_tokens: i64,
}

/// A fully validated request: pack identity plus inference intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub pack: PackConfig,
    pub infer: InferConfig,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Validate a raw request and extract typed configuration.
///
/// Validation order: shape, sections, field extraction with defaults, then
/// the required-field check. The seed may live in either section; an
/// `infer.seed` takes precedence over `pack.seed`. A seed that is present
/// but not an integer is a contract violation. `max_tokens` is the one
/// lenient field: any non-integer value silently falls back to the
/// default, which callers observably rely on.
pub fn extract_request(request: &Value) -> Result<RequestConfig, ContractViolation> {
    let body = request.as_object().ok_or(ContractViolation::NotAnObject)?;

    let pack = body
        .get("pack")
        .and_then(Value::as_object)
        .ok_or(ContractViolation::MissingSections)?;
    let infer = body
        .get("infer")
        .and_then(Value::as_object)
        .ok_or(ContractViolation::MissingSections)?;

    let seed = extract_seed(infer, pack)?;

    let pack_config = PackConfig {
        model_id: string_field(pack, "model_id"),
        weights_hash: string_field(pack, "weights_hash"),
        tensor_hash: string_field(pack, "tensor_hash"),
        glyph_hash: string_field(pack, "glyph_hash"),
        abi_id: string_field_or(pack, "abi_id", DEFAULT_ABI_ID),
        abi_hash: string_field_or(pack, "abi_hash", DEFAULT_ABI_HASH),
        runtime_device: string_field_or(pack, "runtime_device", DEFAULT_RUNTIME_DEVICE),
        runtime_precision: string_field_or(pack, "runtime_precision", DEFAULT_RUNTIME_PRECISION),
        seed,
        policy: extract_policy(pack.get("policy")),
    };

    for (field, value) in [
        ("model_id", &pack_config.model_id),
        ("weights_hash", &pack_config.weights_hash),
        ("tensor_hash", &pack_config.tensor_hash),
        ("glyph_hash", &pack_config.glyph_hash),
    ] {
        if value.is_empty() {
            return Err(ContractViolation::EmptyRequiredField {
                field: field.to_string(),
            });
        }
    }

    let infer_config = InferConfig {
        prompt: infer
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        mode: infer
            .get("mode")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MODE)
            .to_string(),
        max_tokens: infer
            .get("max_tokens")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_MAX_TOKENS),
    };

    Ok(RequestConfig {
        pack: pack_config,
        infer: infer_config,
    })
}

fn extract_seed(
    infer: &Map<String, Value>,
    pack: &Map<String, Value>,
) -> Result<Option<i64>, ContractViolation> {
    let candidate = match infer.get("seed") {
        Some(value) if !value.is_null() => Some(value),
        _ => match pack.get("seed") {
            Some(value) if !value.is_null() => Some(value),
            _ => None,
        },
    };
    match candidate {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or(ContractViolation::NonIntegerSeed),
    }
}

fn extract_policy(policy: Option<&Value>) -> PolicyConfig {
    let defaults = PolicyConfig::default();
    let fields = match policy.and_then(Value::as_object) {
        Some(fields) => fields,
        None => return defaults,
    };
    PolicyConfig {
        sealed: bool_field_or(fields, "sealed", defaults.sealed),
        no_network: bool_field_or(fields, "no_network", defaults.no_network),
        no_fs: bool_field_or(fields, "no_fs", defaults.no_fs),
        no_eval: bool_field_or(fields, "no_eval", defaults.no_eval),
    }
}

/// String field with an empty-string fallback; the required-field check
/// turns the fallback into a contract violation afterwards.
fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// String field where missing, null, non-string, or empty all fall back
/// to the documented default.
fn string_field_or(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    match fields.get(key).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

fn bool_field_or(fields: &Map<String, Value>, key: &str, default: bool) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Request handling: validation, proof computation, frame emission,
//! executor invocation, and response assembly.
//!
//! One `handle` call is self-contained: every entity is constructed fresh
//! for the request and discarded with the response, so concurrent
//! requests share no mutable state. Frames only appear in successful
//! responses — a request that fails validation emits none.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::canonical::canonical_hash;
use crate::executor::{ExecOutput, ExecRequest, SealedExecutor};
use crate::frame::{Clock, Frame, FrameKind, FrameRecorder};
use crate::proof::{InferProofPayload, PackProofPayload};
use crate::request::extract_request;

/// Contract identity echoed in every successful response.
pub const CONTRACT_ID: &str = "xjson://contract/ggl.infer/v1";

// ---------------------------------------------------------------------------
// Faults
// ---------------------------------------------------------------------------

/// Fault vocabulary of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// Request shape or required-field violation; the caller can recover
    /// by fixing the request.
    #[serde(rename = "E_CONTRACT")]
    Contract,
    /// Input could not be parsed as structured data.
    #[serde(rename = "E_JSON")]
    Json,
    /// Any other unexpected failure, including executor failure.
    #[serde(rename = "E_RUNTIME")]
    Runtime,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contract => "E_CONTRACT",
            Self::Json => "E_JSON",
            Self::Runtime => "E_RUNTIME",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured fault. Always reported as pure data, never as partial
/// output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

impl Fault {
    pub fn contract(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Contract,
            message: message.into(),
        }
    }

    pub fn json(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Json,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Runtime,
            message: message.into(),
        }
    }

    /// The wire object written to the output channel on failure.
    pub fn to_response_value(&self) -> Value {
        json!({
            "ok": false,
            "fault": self.kind.as_str(),
            "message": self.message,
        })
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Pack identity echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEcho {
    pub model_id: String,
    pub pack_hash: String,
    pub tensor_hash: String,
    pub glyph_hash: String,
    pub abi_id: String,
    pub abi_hash: String,
    pub runtime_device: String,
    pub runtime_precision: String,
    pub seed: Option<i64>,
}

/// Inference result block: hashes, output payload, and the proof binding
/// them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferReport {
    pub input_hash: String,
    pub output_hash: String,
    pub output: ExecOutput,
    pub proof_hash: String,
}

/// The final pure-data result of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferResponse {
    pub ok: bool,
    pub contract: String,
    pub pack: PackEcho,
    pub infer: InferReport,
    pub frames: Vec<Frame>,
}

impl InferResponse {
    /// Serialize to the wire value; a serialization failure is a runtime
    /// fault, not a panic.
    pub fn to_response_value(&self) -> Result<Value, Fault> {
        serde_json::to_value(self).map_err(|error| Fault::runtime(error.to_string()))
    }
}

// ---------------------------------------------------------------------------
// RequestHandler
// ---------------------------------------------------------------------------

/// Orchestrates one request lifecycle against an injected executor and
/// clock.
pub struct RequestHandler<'a> {
    executor: &'a dyn SealedExecutor,
    clock: &'a dyn Clock,
}

impl<'a> RequestHandler<'a> {
    pub fn new(executor: &'a dyn SealedExecutor, clock: &'a dyn Clock) -> Self {
        Self { executor, clock }
    }

    /// Validate, prove, frame, execute, and assemble.
    ///
    /// Frame protocol, in order: `infer.pack` always, `infer.seed` only
    /// when a seed was supplied, `infer.start` after the input hash is
    /// computed, `infer.end` after the executor returns.
    pub fn handle(&self, request: &Value) -> Result<InferResponse, Fault> {
        let config =
            extract_request(request).map_err(|violation| Fault::contract(violation.to_string()))?;

        let proof_payload = PackProofPayload::from_pack(&config.pack);
        let pack_hash = proof_payload.proof_hash();

        let mut recorder = FrameRecorder::new(self.clock);
        recorder.record(
            FrameKind::Pack,
            json!({
                "pack_hash": pack_hash,
                "model_id": config.pack.model_id,
                "tensor_hash": config.pack.tensor_hash,
                "glyph_hash": config.pack.glyph_hash,
                "abi_hash": config.pack.abi_hash,
            }),
        );

        if let Some(seed) = config.pack.seed {
            recorder.record(
                FrameKind::Seed,
                json!({"pack_hash": pack_hash, "seed": seed}),
            );
        }

        let input_hash = canonical_hash(&json!({
            "prompt": config.infer.prompt,
            "mode": config.infer.mode,
            "max_tokens": config.infer.max_tokens,
        }));
        recorder.record(
            FrameKind::Start,
            json!({"pack_hash": pack_hash, "input_hash": input_hash}),
        );

        let output = self
            .executor
            .run(&ExecRequest {
                prompt: &config.infer.prompt,
                mode: &config.infer.mode,
                max_tokens: config.infer.max_tokens,
                seed: config.pack.seed,
            })
            .map_err(|failure| Fault::runtime(failure.to_string()))?;

        let output_hash = canonical_hash(&json!({
            "text": output.text,
            "tokens_used": output.tokens_used,
        }));
        recorder.record(
            FrameKind::End,
            json!({"pack_hash": pack_hash, "output_hash": output_hash}),
        );

        let proof_hash = InferProofPayload {
            pack_hash: pack_hash.clone(),
            model_id: config.pack.model_id.clone(),
            input_hash: input_hash.clone(),
            output_hash: output_hash.clone(),
            seed: config.pack.seed,
            abi_hash: config.pack.abi_hash.clone(),
        }
        .proof_hash();

        Ok(InferResponse {
            ok: true,
            contract: CONTRACT_ID.to_string(),
            pack: PackEcho {
                model_id: config.pack.model_id,
                pack_hash,
                tensor_hash: config.pack.tensor_hash,
                glyph_hash: config.pack.glyph_hash,
                abi_id: config.pack.abi_id,
                abi_hash: config.pack.abi_hash,
                runtime_device: config.pack.runtime_device,
                runtime_precision: config.pack.runtime_precision,
                seed: config.pack.seed,
            },
            infer: InferReport {
                input_hash,
                output_hash,
                output,
                proof_hash,
            },
            frames: recorder.into_frames(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

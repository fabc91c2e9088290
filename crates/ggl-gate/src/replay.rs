//! Replay verification of recorded evidence.
//!
//! Given a frame sequence (and optionally the full response and original
//! request), checks everything a verifier can check without re-running the
//! executor: required frames, ordering, pack-hash linkage, presence and
//! consistency of input/output hashes, seed integrality, and recomputation
//! of `output_hash`, `proof_hash`, and `pack_hash` from their preimages.
//!
//! The violation vocabulary keeps the fault codes of the wider system's
//! verifier (`E_NO_PACK`, `E_LINK_FAIL`, `E_BAD_SEED`, ...) so reports stay
//! comparable across implementations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_hash;
use crate::frame::{chain_digest, Frame, FrameKind};
use crate::proof::{InferProofPayload, PackProofPayload};
use crate::request::extract_request;

// ---------------------------------------------------------------------------
// ReplayViolation
// ---------------------------------------------------------------------------

/// One verification failure. A report may carry several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ReplayViolation {
    #[serde(rename = "E_NO_PACK")]
    #[error("no infer.pack frame in the stream")]
    MissingPackFrame,

    #[serde(rename = "E_NO_START")]
    #[error("no infer.start frame in the stream")]
    MissingStartFrame,

    #[serde(rename = "E_NO_END")]
    #[error("no infer.end frame in the stream")]
    MissingEndFrame,

    #[serde(rename = "E_PACK_HASH_MISSING")]
    #[error("pack frame carries no pack_hash")]
    MissingPackHash,

    #[serde(rename = "E_LINK_FAIL")]
    #[error("no start/end frames link to pack hash {pack_hash}")]
    LinkageFailure { pack_hash: String },

    #[serde(rename = "E_INPUT_HASH_MISSING")]
    #[error("start frame carries no input_hash")]
    MissingInputHash,

    #[serde(rename = "E_OUTPUT_HASH_MISSING")]
    #[error("end frame carries no output_hash")]
    MissingOutputHash,

    #[serde(rename = "E_BAD_SEED")]
    #[error("seed frame value is not an integer")]
    NonIntegerSeed,

    #[serde(rename = "E_FRAME_ORDER")]
    #[error("frame {kind} at index {index} is out of lifecycle order")]
    OutOfOrder { kind: String, index: usize },

    #[serde(rename = "E_INPUT_MISMATCH")]
    #[error("input hash mismatch: frames record {recorded}, response reports {reported}")]
    InputHashMismatch { recorded: String, reported: String },

    #[serde(rename = "E_OUTPUT_MISMATCH")]
    #[error("output hash mismatch: recomputed {recomputed}, response reports {reported}")]
    OutputHashMismatch {
        recomputed: String,
        reported: String,
    },

    #[serde(rename = "E_PROOF_MISMATCH")]
    #[error("proof hash mismatch: recomputed {recomputed}, response reports {reported}")]
    ProofHashMismatch {
        recomputed: String,
        reported: String,
    },

    #[serde(rename = "E_PACK_MISMATCH")]
    #[error("pack hash mismatch: recomputed {recomputed}, response reports {reported}")]
    PackHashMismatch {
        recomputed: String,
        reported: String,
    },

    #[serde(rename = "E_MALFORMED")]
    #[error("document is not verifiable: {detail}")]
    Malformed { detail: String },

    #[serde(rename = "E_BAD_REQUEST")]
    #[error("original request fails contract validation: {detail}")]
    RequestRejected { detail: String },
}

// ---------------------------------------------------------------------------
// ReplayReport
// ---------------------------------------------------------------------------

/// Outcome of a replay verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub ok: bool,
    pub violations: Vec<ReplayViolation>,
    pub pack_hash: Option<String>,
    pub input_hash: Option<String>,
    pub output_hash: Option<String>,
    pub seed: Option<i64>,
    pub chain_digest: String,
}

impl ReplayReport {
    fn new(chain_digest: String) -> Self {
        Self {
            ok: false,
            violations: Vec::new(),
            pack_hash: None,
            input_hash: None,
            output_hash: None,
            seed: None,
            chain_digest,
        }
    }

    fn seal(mut self) -> Self {
        self.ok = self.violations.is_empty();
        self
    }
}

/// One-line human summary of a report.
pub fn render_report_summary(report: &ReplayReport) -> String {
    if report.ok {
        format!(
            "replay verification passed (pack {}, chain {})",
            report.pack_hash.as_deref().unwrap_or("-"),
            report.chain_digest
        )
    } else {
        let first = report
            .violations
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();
        format!(
            "replay verification failed with {} violation(s): {}",
            report.violations.len(),
            first
        )
    }
}

// ---------------------------------------------------------------------------
// Frame-level verification
// ---------------------------------------------------------------------------

/// Verify a bare frame sequence.
pub fn verify_frames(frames: &[Frame]) -> ReplayReport {
    let mut report = ReplayReport::new(chain_digest(frames));

    let packs = select(frames, FrameKind::Pack);
    let starts = select(frames, FrameKind::Start);
    let ends = select(frames, FrameKind::End);
    let seeds = select(frames, FrameKind::Seed);

    if packs.is_empty() {
        report.violations.push(ReplayViolation::MissingPackFrame);
    }
    if starts.is_empty() {
        report.violations.push(ReplayViolation::MissingStartFrame);
    }
    if ends.is_empty() {
        report.violations.push(ReplayViolation::MissingEndFrame);
    }
    if !report.violations.is_empty() {
        return report.seal();
    }

    // Linkage keys off the most recent pack frame, matching the stream
    // semantics of the wider system: later frames supersede earlier ones.
    let (pack_index, pack_payload) = packs[packs.len() - 1];
    let pack_hash = match non_empty_str(pack_payload, "pack_hash") {
        Some(hash) => hash.to_string(),
        None => {
            report.violations.push(ReplayViolation::MissingPackHash);
            return report.seal();
        }
    };
    report.pack_hash = Some(pack_hash.clone());

    let matches_pack =
        |payload: &Value| non_empty_str(payload, "pack_hash") == Some(pack_hash.as_str());
    let start = starts.iter().rev().find(|entry| matches_pack(entry.1));
    let end = ends.iter().rev().find(|entry| matches_pack(entry.1));
    let (start_index, start_payload, end_index, end_payload) = match (start, end) {
        (Some(start), Some(end)) => (start.0, start.1, end.0, end.1),
        _ => {
            report.violations.push(ReplayViolation::LinkageFailure {
                pack_hash: pack_hash.clone(),
            });
            return report.seal();
        }
    };

    if start_index < pack_index {
        report.violations.push(ReplayViolation::OutOfOrder {
            kind: FrameKind::Start.as_str().to_string(),
            index: start_index,
        });
    }
    if end_index < start_index {
        report.violations.push(ReplayViolation::OutOfOrder {
            kind: FrameKind::End.as_str().to_string(),
            index: end_index,
        });
    }

    match non_empty_str(start_payload, "input_hash") {
        Some(hash) => report.input_hash = Some(hash.to_string()),
        None => report.violations.push(ReplayViolation::MissingInputHash),
    }
    match non_empty_str(end_payload, "output_hash") {
        Some(hash) => report.output_hash = Some(hash.to_string()),
        None => report.violations.push(ReplayViolation::MissingOutputHash),
    }

    if let Some(&(seed_index, seed_payload)) = seeds.iter().rev().find(|entry| matches_pack(entry.1))
    {
        match seed_payload.get("seed").and_then(Value::as_i64) {
            Some(seed) => report.seed = Some(seed),
            None => report.violations.push(ReplayViolation::NonIntegerSeed),
        }
        if seed_index < pack_index || seed_index > start_index {
            report.violations.push(ReplayViolation::OutOfOrder {
                kind: FrameKind::Seed.as_str().to_string(),
                index: seed_index,
            });
        }
    }

    report.seal()
}

// ---------------------------------------------------------------------------
// Response-level verification
// ---------------------------------------------------------------------------

/// Verify a full response document: its frame stream plus recomputation of
/// the output and proof hashes from their preimages.
pub fn verify_response(response: &Value) -> ReplayReport {
    let frames = match decode_frames(response) {
        Ok(frames) => frames,
        Err(violation) => {
            let mut report = ReplayReport::new(chain_digest(&[]));
            report.violations.push(violation);
            return report.seal();
        }
    };

    let mut report = verify_frames(&frames);
    check_response_consistency(response, &mut report);
    report.seal()
}

/// Verify a response against the original request as well, re-deriving
/// `pack_hash` from the request and cross-checking it.
pub fn verify_response_with_request(response: &Value, request: &Value) -> ReplayReport {
    let mut report = verify_response(response);

    match extract_request(request) {
        Ok(config) => {
            let recomputed = PackProofPayload::from_pack(&config.pack).proof_hash();
            let reported = response["pack"]["pack_hash"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            if recomputed != reported {
                report.violations.push(ReplayViolation::PackHashMismatch {
                    recomputed,
                    reported,
                });
            }
        }
        Err(violation) => {
            report.violations.push(ReplayViolation::RequestRejected {
                detail: violation.to_string(),
            });
        }
    }

    report.seal()
}

fn decode_frames(response: &Value) -> Result<Vec<Frame>, ReplayViolation> {
    // A bare frame array is accepted as a degenerate response.
    let raw = if response.is_array() {
        response.clone()
    } else {
        response
            .get("frames")
            .cloned()
            .ok_or_else(|| ReplayViolation::Malformed {
                detail: "no frames array".to_string(),
            })?
    };
    serde_json::from_value(raw).map_err(|error| ReplayViolation::Malformed {
        detail: format!("frames do not decode: {error}"),
    })
}

fn check_response_consistency(response: &Value, report: &mut ReplayReport) {
    // A bare frame array has nothing further to cross-check.
    if response.is_array() {
        return;
    }
    let infer = match response.get("infer") {
        Some(infer) if infer.is_object() => infer,
        _ => {
            report.violations.push(ReplayViolation::Malformed {
                detail: "no infer block".to_string(),
            });
            return;
        }
    };

    let reported_input = infer["input_hash"].as_str().unwrap_or_default();
    if let Some(recorded) = report.input_hash.as_deref() {
        if recorded != reported_input {
            report.violations.push(ReplayViolation::InputHashMismatch {
                recorded: recorded.to_string(),
                reported: reported_input.to_string(),
            });
        }
    }

    let reported_output = infer["output_hash"].as_str().unwrap_or_default();
    if let Some(recorded) = report.output_hash.as_deref() {
        if recorded != reported_output {
            report.violations.push(ReplayViolation::OutputHashMismatch {
                recomputed: recorded.to_string(),
                reported: reported_output.to_string(),
            });
        }
    }

    // Recompute the output hash from the output payload itself.
    match infer.get("output") {
        Some(output) if output.is_object() => {
            let recomputed = canonical_hash(&serde_json::json!({
                "text": output["text"].as_str().unwrap_or_default(),
                "tokens_used": output["tokens_used"].as_i64().unwrap_or_default(),
            }));
            if recomputed != reported_output {
                report.violations.push(ReplayViolation::OutputHashMismatch {
                    recomputed,
                    reported: reported_output.to_string(),
                });
            }
        }
        _ => {
            report.violations.push(ReplayViolation::Malformed {
                detail: "no output payload".to_string(),
            });
        }
    }

    // Recompute the infer proof from the response's own components.
    let pack = match response.get("pack") {
        Some(pack) if pack.is_object() => pack,
        _ => {
            report.violations.push(ReplayViolation::Malformed {
                detail: "no pack block".to_string(),
            });
            return;
        }
    };
    let recomputed_proof = InferProofPayload {
        pack_hash: pack["pack_hash"].as_str().unwrap_or_default().to_string(),
        model_id: pack["model_id"].as_str().unwrap_or_default().to_string(),
        input_hash: reported_input.to_string(),
        output_hash: reported_output.to_string(),
        seed: pack["seed"].as_i64(),
        abi_hash: pack["abi_hash"].as_str().unwrap_or_default().to_string(),
    }
    .proof_hash();
    let reported_proof = infer["proof_hash"].as_str().unwrap_or_default();
    if recomputed_proof != reported_proof {
        report.violations.push(ReplayViolation::ProofHashMismatch {
            recomputed: recomputed_proof,
            reported: reported_proof.to_string(),
        });
    }
}

fn select(frames: &[Frame], kind: FrameKind) -> Vec<(usize, &Value)> {
    frames
        .iter()
        .enumerate()
        .filter(|(_, frame)| frame.kind == kind)
        .map(|(index, frame)| (index, &frame.payload))
        .collect()
}

fn non_empty_str<'v>(payload: &'v Value, key: &str) -> Option<&'v str> {
    match payload.get(key).and_then(Value::as_str) {
        Some("") | None => None,
        Some(text) => Some(text),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

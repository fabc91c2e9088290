//! Fixed-schema proof payloads and their hashes.
//!
//! A proof payload is an immutable snapshot of exactly the fields its
//! schema names, tagged with `@type` and `@v`. The hash is the checksum of
//! the canonical encoding of the tagged payload, so it is sensitive to the
//! schema itself: any field addition is a version bump, never silent
//! drift. Payloads are value types and never mutated after construction.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::canonical::canonical_hash;
use crate::request::PackConfig;

/// Schema tag of the pack proof payload.
pub const PACK_PROOF_TAG: &str = "ggltensors.pack.proof.payload";
/// Schema tag of the infer proof payload.
pub const INFER_PROOF_TAG: &str = "ggl.infer.proof.payload";
/// Schema version shared by both proof payloads.
pub const PROOF_SCHEMA_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// PackProofPayload
// ---------------------------------------------------------------------------

/// Snapshot of the pack identity, ABI, runtime, and declared policy
/// posture committed into `pack_hash`.
///
/// An absent seed is hashed as an explicit `null`, not omitted: the field
/// set of the payload is fixed by schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackProofPayload {
    pub model_id: String,
    pub weights_hash: String,
    pub tensor_hash: String,
    pub glyph_hash: String,
    pub abi_id: String,
    pub abi_hash: String,
    pub runtime_device: String,
    pub runtime_precision: String,
    pub seed: Option<i64>,
    pub policy_sealed: bool,
    pub policy_no_network: bool,
    pub policy_no_fs: bool,
    pub policy_no_eval: bool,
}

impl PackProofPayload {
    /// Snapshot a validated pack configuration.
    pub fn from_pack(pack: &PackConfig) -> Self {
        Self {
            model_id: pack.model_id.clone(),
            weights_hash: pack.weights_hash.clone(),
            tensor_hash: pack.tensor_hash.clone(),
            glyph_hash: pack.glyph_hash.clone(),
            abi_id: pack.abi_id.clone(),
            abi_hash: pack.abi_hash.clone(),
            runtime_device: pack.runtime_device.clone(),
            runtime_precision: pack.runtime_precision.clone(),
            seed: pack.seed,
            policy_sealed: pack.policy.sealed,
            policy_no_network: pack.policy.no_network,
            policy_no_fs: pack.policy.no_fs,
            policy_no_eval: pack.policy.no_eval,
        }
    }

    /// The tagged wire object that gets hashed.
    pub fn to_tagged_value(&self) -> Value {
        json!({
            "@type": PACK_PROOF_TAG,
            "@v": PROOF_SCHEMA_VERSION,
            "model_id": self.model_id,
            "weights_hash": self.weights_hash,
            "tensor_hash": self.tensor_hash,
            "glyph_hash": self.glyph_hash,
            "abi_id": self.abi_id,
            "abi_hash": self.abi_hash,
            "runtime_device": self.runtime_device,
            "runtime_precision": self.runtime_precision,
            "seed": self.seed,
            "policy_sealed": self.policy_sealed,
            "policy_no_network": self.policy_no_network,
            "policy_no_fs": self.policy_no_fs,
            "policy_no_eval": self.policy_no_eval,
        })
    }

    /// `pack_hash`: checksum of the canonical tagged payload.
    pub fn proof_hash(&self) -> String {
        canonical_hash(&self.to_tagged_value())
    }
}

// ---------------------------------------------------------------------------
// InferProofPayload
// ---------------------------------------------------------------------------

/// Snapshot binding pack identity, input, output, and seed of one request
/// into a single recomputable `proof_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferProofPayload {
    pub pack_hash: String,
    pub model_id: String,
    pub input_hash: String,
    pub output_hash: String,
    pub seed: Option<i64>,
    pub abi_hash: String,
}

impl InferProofPayload {
    /// The tagged wire object that gets hashed.
    pub fn to_tagged_value(&self) -> Value {
        json!({
            "@type": INFER_PROOF_TAG,
            "@v": PROOF_SCHEMA_VERSION,
            "pack_hash": self.pack_hash,
            "model_id": self.model_id,
            "input_hash": self.input_hash,
            "output_hash": self.output_hash,
            "seed": self.seed,
            "abi_hash": self.abi_hash,
        })
    }

    /// `proof_hash`: checksum of the canonical tagged payload.
    pub fn proof_hash(&self) -> String {
        canonical_hash(&self.to_tagged_value())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Contract, proof, and evidence-frame gate around sealed GGL inference.
//!
//! The gate does not perform inference. It validates the shape of one
//! incoming request, derives order-independent content hashes over the
//! sealed pack configuration and the request's inputs and outputs, emits
//! an ordered stream of tamper-evident evidence frames for the request
//! lifecycle, invokes an injected sealed executor exactly once, and
//! returns a pure-data response whose hashes a verifier can recompute
//! independently.
//!
//! Layering, leaves first: [`checksum`] and [`canonical`] define the byte
//! form and dispersion function everything hashes through; [`proof`]
//! builds the fixed-schema proof payloads; [`frame`] holds the frame
//! vocabulary, recorder, and proof chain; [`request`] validates raw
//! requests into typed configuration; [`executor`] is the sealed
//! black-box capability; [`handler`] sequences one request lifecycle; and
//! [`replay`] re-checks recorded evidence without re-running anything.

#![forbid(unsafe_code)]

pub mod canonical;
pub mod checksum;
pub mod executor;
pub mod frame;
pub mod handler;
pub mod proof;
pub mod replay;
pub mod request;

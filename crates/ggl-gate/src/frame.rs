//! Evidence frames: the append-only lifecycle log of one inference request.
//!
//! Each frame is a timestamped, typed record. Order is semantically
//! meaningful: a verifier reconstructing the timeline assumes `infer.pack`
//! precedes the optional `infer.seed`, which precedes `infer.start`, which
//! precedes `infer.end`. Absence is meaningful too — no frame is emitted
//! for a step that did not occur.
//!
//! The optional proof chain folds a frame sequence into one hash string:
//! `H_i = h32(canon(payload_i) + "|" + H_{i-1})` with genesis `h:00000000`.
//! This is not a graph edge; it pins an entire evidence stream for replay.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_json;
use crate::checksum::{hash_string, GENESIS_HASH};

/// Schema tag carried by every frame.
pub const FRAME_TAG: &str = "ggl.frame";

// ---------------------------------------------------------------------------
// FrameKind — the frame-stream vocabulary
// ---------------------------------------------------------------------------

/// Frame kinds of the stream contract.
///
/// The request handler emits only the four `infer.*` lifecycle kinds;
/// `hdr`, `infer.error`, and `end` appear in streams produced by the wider
/// system and are modeled so the replay verifier can consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    #[serde(rename = "hdr")]
    Header,
    #[serde(rename = "infer.pack")]
    Pack,
    #[serde(rename = "infer.seed")]
    Seed,
    #[serde(rename = "infer.start")]
    Start,
    #[serde(rename = "infer.end")]
    End,
    #[serde(rename = "infer.error")]
    Error,
    #[serde(rename = "end")]
    EndStream,
}

impl FrameKind {
    /// Wire spelling of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "hdr",
            Self::Pack => "infer.pack",
            Self::Seed => "infer.seed",
            Self::Start => "infer.start",
            Self::End => "infer.end",
            Self::Error => "infer.error",
            Self::EndStream => "end",
        }
    }

    /// Parse a wire spelling.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "hdr" => Some(Self::Header),
            "infer.pack" => Some(Self::Pack),
            "infer.seed" => Some(Self::Seed),
            "infer.start" => Some(Self::Start),
            "infer.end" => Some(Self::End),
            "infer.error" => Some(Self::Error),
            "end" => Some(Self::EndStream),
            _ => None,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One evidence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Always [`FRAME_TAG`].
    #[serde(rename = "@type")]
    pub tag: String,
    /// Frame kind.
    pub kind: FrameKind,
    /// Wall-clock milliseconds truncated (wrapping) to 32 bits.
    pub t_ms: u32,
    /// Kind-specific payload object.
    pub payload: Value,
}

impl Frame {
    /// Build a frame with the standard tag.
    pub fn new(kind: FrameKind, t_ms: u32, payload: Value) -> Self {
        Self {
            tag: FRAME_TAG.to_string(),
            kind,
            t_ms,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock — injected capability
// ---------------------------------------------------------------------------

/// Time source for frame timestamps.
///
/// Injected rather than read from a global so tests can supply a fixed
/// clock and obtain reproducible frame sequences.
pub trait Clock {
    /// Current wall-clock milliseconds, truncated (wrapping) to 32 bits.
    fn now_ms(&self) -> u32;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl Clock for WallClock {
    fn now_ms(&self) -> u32 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        // Truncating cast: wraps modulo 2^32 rather than saturating.
        millis as u32
    }
}

/// Clock pinned to one instant, for deterministic frame sequences.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now_ms(&self) -> u32 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// FrameRecorder
// ---------------------------------------------------------------------------

/// Append-only frame recorder for one request lifecycle.
pub struct FrameRecorder<'c> {
    clock: &'c dyn Clock,
    frames: Vec<Frame>,
}

impl<'c> FrameRecorder<'c> {
    /// Empty recorder stamping frames with `clock`.
    pub fn new(clock: &'c dyn Clock) -> Self {
        Self {
            clock,
            frames: Vec::new(),
        }
    }

    /// Stamp and append a frame.
    pub fn record(&mut self, kind: FrameKind, payload: Value) {
        let frame = Frame::new(kind, self.clock.now_ms(), payload);
        self.frames.push(frame);
    }

    /// Frames recorded so far, in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames recorded.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Consume the recorder, yielding the ordered frame sequence.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

// ---------------------------------------------------------------------------
// Proof chain
// ---------------------------------------------------------------------------

/// One chain step: hash of the canonical payload joined to the previous
/// link with `|`.
pub fn chain_update(prev: &str, payload: &Value) -> String {
    let mut preimage = canonical_json(payload);
    preimage.push('|');
    preimage.push_str(prev);
    hash_string(preimage.as_bytes())
}

/// Fold a frame sequence into one chain digest, starting from the genesis
/// link.
pub fn chain_digest(frames: &[Frame]) -> String {
    frames.iter().fold(GENESIS_HASH.to_string(), |prev, frame| {
        chain_update(&prev, &frame.payload)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! 32-bit streaming checksum behind every proof and frame hash.
//!
//! The recurrence is the addition-based FNV-1a dialect: after each xor the
//! state is dispersed by summing shifted copies of itself instead of the
//! textbook multiply-by-prime. Other implementations of the same wire
//! contract use this exact recurrence, so the arithmetic here is compared
//! byte-for-byte against theirs and must not be "corrected" to standard
//! FNV-1a.
//!
//! This is a dispersion function for reproducibility fingerprinting and
//! tamper detection, not a collision-resistant hash.

/// FNV-1a offset basis, shared with the standard algorithm.
const OFFSET_BASIS: u32 = 0x811c_9dc5;

/// Prefix of every rendered hash string in the system.
pub const HASH_PREFIX: &str = "h:";

/// Genesis value for frame proof chains.
pub const GENESIS_HASH: &str = "h:00000000";

// ---------------------------------------------------------------------------
// Checksum32 — streaming state
// ---------------------------------------------------------------------------

/// Streaming checksum state.
///
/// Feeding the same bytes in arbitrary splits yields the same result as a
/// single `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum32 {
    state: u32,
}

impl Checksum32 {
    /// Fresh state at the offset basis.
    pub fn new() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }

    /// Absorb a chunk of bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let x = self.state ^ u32::from(byte);
            self.state = x
                .wrapping_add(x << 1)
                .wrapping_add(x << 4)
                .wrapping_add(x << 7)
                .wrapping_add(x << 8)
                .wrapping_add(x << 24);
        }
    }

    /// Current 32-bit value.
    pub fn finish(&self) -> u32 {
        self.state
    }

    /// Render as the universal hash-string format: `h:` followed by eight
    /// lowercase, zero-padded hex digits.
    pub fn render(&self) -> String {
        format!("{HASH_PREFIX}{:08x}", self.state)
    }
}

impl Default for Checksum32 {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// One-shot checksum of a byte slice.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut state = Checksum32::new();
    state.update(bytes);
    state.finish()
}

/// One-shot checksum rendered as a hash string.
pub fn hash_string(bytes: &[u8]) -> String {
    let mut state = Checksum32::new();
    state.update(bytes);
    state.render()
}

/// Whether `candidate` has the rendered hash-string shape: the `h:` prefix
/// followed by exactly eight lowercase hex digits.
pub fn is_hash_string(candidate: &str) -> bool {
    match candidate.strip_prefix(HASH_PREFIX) {
        Some(digits) => {
            digits.len() == 8
                && digits
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The sealed executor capability.
//!
//! The gate never performs inference itself; it calls a black box that
//! must satisfy one contract: given (prompt, mode, max_tokens, seed) and
//! an implicit sealed model pack, return (text, tokens_used)
//! deterministically, with no network, filesystem, or side effects beyond
//! the return value. The executor is injected so the validation, proof,
//! and frame logic can be exercised with deterministic test doubles and
//! later swapped to a real engine untouched.

use serde::{Deserialize, Serialize};

/// Inputs handed to the sealed executor for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecRequest<'a> {
    pub prompt: &'a str,
    pub mode: &'a str,
    pub max_tokens: i64,
    pub seed: Option<i64>,
}

/// What the sealed executor returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub text: String,
    pub tokens_used: i64,
}

/// Failure reported by the executor. Surfaces at the boundary as a
/// runtime fault; the gate performs no retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("sealed executor failure: {detail}")]
pub struct ExecutorFailure {
    pub detail: String,
}

impl ExecutorFailure {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// The sealed computation behind the gate.
pub trait SealedExecutor {
    fn run(&self, request: &ExecRequest<'_>) -> Result<ExecOutput, ExecutorFailure>;
}

// ---------------------------------------------------------------------------
// StubExecutor — placeholder compute
// ---------------------------------------------------------------------------

/// Placeholder executor standing in for the real sealed engine.
///
/// Returns a fixed marker text and zero tokens for every request, which
/// is trivially deterministic and keeps the gate runnable end to end
/// before an engine adapter exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubExecutor;

impl SealedExecutor for StubExecutor {
    fn run(&self, _request: &ExecRequest<'_>) -> Result<ExecOutput, ExecutorFailure> {
        Ok(ExecOutput {
            text: "[GGL OUTPUT]".to_string(),
            tokens_used: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_is_deterministic() {
        let request = ExecRequest {
            prompt: "hi",
            mode: "chat",
            max_tokens: 8,
            seed: None,
        };
        let first = StubExecutor.run(&request).expect("stub never fails");
        let second = StubExecutor.run(&request).expect("stub never fails");
        assert_eq!(first, second);
        assert_eq!(first.text, "[GGL OUTPUT]");
        assert_eq!(first.tokens_used, 0);
    }

    #[test]
    fn stub_ignores_inputs() {
        let a = StubExecutor
            .run(&ExecRequest {
                prompt: "one",
                mode: "chat",
                max_tokens: 1,
                seed: Some(1),
            })
            .expect("stub never fails");
        let b = StubExecutor
            .run(&ExecRequest {
                prompt: "two",
                mode: "reasoning",
                max_tokens: 2,
                seed: None,
            })
            .expect("stub never fails");
        assert_eq!(a, b);
    }

    #[test]
    fn failure_display_carries_detail() {
        let failure = ExecutorFailure::new("engine melted");
        assert_eq!(
            failure.to_string(),
            "sealed executor failure: engine melted"
        );
    }

    #[test]
    fn output_serialization_round_trip() {
        let output = ExecOutput {
            text: "ok".to_string(),
            tokens_used: 1,
        };
        let json = serde_json::to_string(&output).expect("serialize");
        let restored: ExecOutput = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(output, restored);
    }
}

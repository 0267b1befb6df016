//! Core types for the agent loop.

use serde::{Deserialize, Serialize};

/// Reason why a run stopped without a final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Hit the step budget before the model finished
    StepBudgetExhausted,
    /// Model gateway returned no result
    GenerationFailed,
    /// Response had no `Action:` section
    NoActionParsed,
    /// Action was neither `Finish` nor a well-formed `Tool[input]`
    NoToolParsed,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::StepBudgetExhausted => write!(f, "step budget exhausted"),
            AbortReason::GenerationFailed => write!(f, "model returned no response"),
            AbortReason::NoActionParsed => write!(f, "no action found in model output"),
            AbortReason::NoToolParsed => write!(f, "action is not a valid tool call"),
        }
    }
}

/// Result of one agent run.
///
/// # Invariants
/// - `Finished` is produced only by a `Finish` action
/// - `steps` never exceeds the configured step budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Finished { answer: String, steps: usize },
    Aborted { reason: AbortReason, steps: usize },
}

impl RunOutcome {
    pub fn finished(answer: impl Into<String>, steps: usize) -> Self {
        Self::Finished {
            answer: answer.into(),
            steps,
        }
    }

    pub fn aborted(reason: AbortReason, steps: usize) -> Self {
        Self::Aborted { reason, steps }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Number of loop iterations that ran (model calls attempted).
    pub fn steps(&self) -> usize {
        match self {
            Self::Finished { steps, .. } | Self::Aborted { steps, .. } => *steps,
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Finished { answer, .. } => Some(answer),
            Self::Aborted { .. } => None,
        }
    }

    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            Self::Finished { .. } => None,
            Self::Aborted { reason, .. } => Some(*reason),
        }
    }

    pub fn into_answer(self) -> Option<String> {
        match self {
            Self::Finished { answer, .. } => Some(answer),
            Self::Aborted { .. } => None,
        }
    }
}

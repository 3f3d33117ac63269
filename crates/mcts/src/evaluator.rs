//! Evaluation abstraction for the learned-evaluator strategy.
//!
//! An `Evaluator` maps a fixed-width feature vector to a per-child
//! preference vector plus a scalar value. It is treated as fallible: the
//! search never propagates an `EvaluatorError`, it falls back to UCT
//! selection or a random reward and counts the fallback.

use thiserror::Error;

/// Errors an evaluator may report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("evaluator returned an empty preference vector")]
    EmptyPolicy,

    #[error("evaluator returned a non-finite {0}")]
    NonFinite(&'static str),

    #[error("evaluator failed: {0}")]
    Failed(String),
}

/// Evaluation result: child preferences + value estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Preference score per child, in expansion order.
    ///
    /// The length need not match the number of children; lookups past the
    /// end use the last entry.
    pub policy: Vec<f32>,

    /// Value estimate for the evaluated state.
    pub value: f32,
}

impl Evaluation {
    /// Preference for the child at `index`, clamped to the last entry.
    ///
    /// # Errors
    /// Returns `EvaluatorError::EmptyPolicy` if there are no entries at all,
    /// or `EvaluatorError::NonFinite` if the entry is NaN or infinite.
    pub fn preference(&self, index: usize) -> Result<f32, EvaluatorError> {
        let last = self.policy.len().checked_sub(1).ok_or(EvaluatorError::EmptyPolicy)?;
        let score = self.policy[index.min(last)];
        if score.is_finite() {
            Ok(score)
        } else {
            Err(EvaluatorError::NonFinite("policy"))
        }
    }

    /// The value as a reward.
    ///
    /// # Errors
    /// Returns `EvaluatorError::NonFinite` for NaN or infinite values.
    pub fn reward(&self) -> Result<f64, EvaluatorError> {
        if self.value.is_finite() {
            Ok(self.value as f64)
        } else {
            Err(EvaluatorError::NonFinite("value"))
        }
    }
}

/// Trait for black-box policy/value estimators.
pub trait Evaluator: Send {
    /// Evaluate a feature vector.
    fn evaluate(&self, features: &[f32]) -> Result<Evaluation, EvaluatorError>;
}

/// Closures can serve as evaluators, which keeps tests and ad-hoc
/// heuristics short.
impl<F> Evaluator for F
where
    F: Fn(&[f32]) -> Result<Evaluation, EvaluatorError> + Send,
{
    fn evaluate(&self, features: &[f32]) -> Result<Evaluation, EvaluatorError> {
        self(features)
    }
}

//! Action distributions with enforced invariants.

use crate::{Error, Result};

/// A probability distribution over actions.
///
/// Invariant: All values are finite, non-negative and sum to 1.0.
///
/// # Example
/// ```
/// use treesearch_core::Policy;
///
/// let policy = Policy::from_weights(&[1.0, 2.0, 1.0]).unwrap();
/// assert_eq!(policy.as_slice(), &[0.25, 0.5, 0.25]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f32>);

impl Policy {
    /// Create a policy from raw weights, normalizing them to sum to 1.0.
    ///
    /// # Errors
    /// Returns `Error::InvalidPolicy` if the weights cannot be normalized:
    /// empty, negative, non-finite, or all zero.
    pub fn from_weights(weights: &[f32]) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidPolicy("policy cannot be empty".to_string()));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidPolicy(
                "policy contains non-finite values".to_string(),
            ));
        }
        if weights.iter().any(|&w| w < 0.0) {
            return Err(Error::InvalidPolicy(
                "policy contains negative values".to_string(),
            ));
        }

        let sum: f32 = weights.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Err(Error::InvalidPolicy(format!(
                "cannot normalize weights with sum {}",
                sum
            )));
        }

        Ok(Self(weights.iter().map(|&w| w / sum).collect()))
    }

    /// Get a reference to the underlying slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

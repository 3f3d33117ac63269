//! Two hidden ReLU layers feeding a softmax policy head and a tanh value
//! head.

use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::debug;
use treesearch_core::Environment;
use treesearch_mcts::{Evaluation, Evaluator, EvaluatorError};

/// Width of both hidden layers.
pub const DEFAULT_HIDDEN_DIM: usize = 64;

/// Fully connected layer `y = W x + b`.
#[derive(Clone, Debug)]
struct Dense {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl Dense {
    /// He-initialised weights, zero bias.
    fn new<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let scale = (2.0 / inputs as f32).sqrt();
        let weights = Array2::from_shape_simple_fn((outputs, inputs), || {
            let z: f32 = rng.sample(StandardNormal);
            z * scale
        });
        Self {
            weights,
            bias: Array1::zeros(outputs),
        }
    }

    fn forward(&self, input: ArrayView1<f32>) -> Array1<f32> {
        self.weights.dot(&input) + &self.bias
    }
}

fn relu(x: Array1<f32>) -> Array1<f32> {
    x.mapv(|v| v.max(0.0))
}

fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Randomly initialised policy/value MLP.
///
/// Weights come from a seeded generator, so two networks built with the
/// same shape and seed evaluate identically.
#[derive(Clone, Debug)]
pub struct PolicyValueNetwork {
    hidden1: Dense,
    hidden2: Dense,
    policy_head: Dense,
    value_head: Dense,
}

impl PolicyValueNetwork {
    /// Create a network with the given layer sizes.
    ///
    /// # Panics
    /// Panics if any dimension is zero.
    pub fn new(input_dim: usize, hidden_dim: usize, policy_dim: usize, seed: u64) -> Self {
        assert!(
            input_dim > 0 && hidden_dim > 0 && policy_dim > 0,
            "network dimensions must be positive"
        );

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self {
            hidden1: Dense::new(input_dim, hidden_dim, &mut rng),
            hidden2: Dense::new(hidden_dim, hidden_dim, &mut rng),
            policy_head: Dense::new(hidden_dim, policy_dim, &mut rng),
            value_head: Dense::new(hidden_dim, 1, &mut rng),
        }
    }

    /// Network sized for `env`: `input_dim` features in, one policy entry
    /// per legal action of the initial state out.
    pub fn for_environment<E: Environment>(env: &E, input_dim: usize, seed: u64) -> Self {
        let actions = env.legal_actions(&env.reset()).len().max(1);
        debug!(
            input_dim,
            hidden_dim = DEFAULT_HIDDEN_DIM,
            policy_dim = actions,
            seed,
            "Initialised policy/value network"
        );
        Self::new(input_dim, DEFAULT_HIDDEN_DIM, actions, seed)
    }

    pub fn input_dim(&self) -> usize {
        self.hidden1.weights.ncols()
    }

    pub fn policy_dim(&self) -> usize {
        self.policy_head.weights.nrows()
    }

    /// Run the network on one input vector.
    ///
    /// Returns the policy (summing to 1) and a value in `[-1, 1]`.
    pub fn forward(&self, input: ArrayView1<f32>) -> (Array1<f32>, f32) {
        let x = relu(self.hidden1.forward(input));
        let x = relu(self.hidden2.forward(x.view()));

        let policy = softmax(&self.policy_head.forward(x.view()));
        let value = self.value_head.forward(x.view())[0].tanh();
        (policy, value)
    }
}

impl Evaluator for PolicyValueNetwork {
    fn evaluate(&self, features: &[f32]) -> Result<Evaluation, EvaluatorError> {
        if features.len() != self.input_dim() {
            return Err(EvaluatorError::Shape {
                expected: self.input_dim(),
                actual: features.len(),
            });
        }

        let (policy, value) = self.forward(ArrayView1::from(features));
        if !value.is_finite() {
            return Err(EvaluatorError::NonFinite("value"));
        }

        Ok(Evaluation {
            policy: policy.to_vec(),
            value,
        })
    }
}

use serde::{Deserialize, Serialize};

/// Activation family of the hidden layers of an [`Mlp`](super::Mlp).
///
/// This is the closed set of network variants the agent selects among at
/// setup time; the choice is resolved once when the model is built, not per
/// forward pass.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum Activation {
    /// Rectified linear units.
    Relu,

    /// Exponential linear units.
    Elu,

    /// Sinusoidal activations.
    Sine,

    /// Sine on the first hidden layer and every other one after it, ELU on
    /// the rest.
    SineElu,
}

/// Configuration of [`Mlp`](super::Mlp).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MlpConfig {
    pub(super) in_dim: i64,
    pub(super) units: Vec<i64>,
    pub(super) out_dim: i64,
    pub(super) activation: Activation,
}

impl MlpConfig {
    /// Constructs the configuration.
    pub fn new(in_dim: i64, units: Vec<i64>, out_dim: i64, activation: Activation) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation,
        }
    }

    /// Output dimension of the network.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }
}

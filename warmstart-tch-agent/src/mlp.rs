//! Multilayer perceptron submodels.
mod base;
mod config;
pub use base::Mlp;
pub use config::{Activation, MlpConfig};

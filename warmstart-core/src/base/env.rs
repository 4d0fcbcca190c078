//! Environment.
use anyhow::Result;
use ndarray::{Array1, ArrayView1};

/// Represents the dynamics and reward model of a control task.
///
/// States are vectors of dimension `nb_state`, where the last component is
/// the elapsed time of the episode; controls are vectors of dimension
/// `nb_action`. All methods are deterministic: stochasticity of initial
/// conditions is handled by the caller.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performs one transition and evaluates the running reward on it.
    fn step(&self, state: ArrayView1<f32>, control: ArrayView1<f32>) -> (Array1<f32>, f32);

    /// Evaluates the terminal reward on the last state alone, no control applied.
    fn terminal_reward(&self, state: ArrayView1<f32>) -> f32;

    /// End-effector position of the given state.
    fn ee(&self, state: ArrayView1<f32>) -> [f32; 3];

    /// Performs one transition without evaluating the reward.
    ///
    /// Used for policy rollouts that seed the trajectory optimizer.
    fn simulate(&self, state: ArrayView1<f32>, control: ArrayView1<f32>) -> Array1<f32>;
}

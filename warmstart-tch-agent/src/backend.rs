//! Gradient computation for the critic and the actor.
//!
//! The trainer never forms losses itself; it hands the networks and the batch
//! to a [`GradBackend`] and applies the optimizer steps. [`TdBackend`] is the
//! default implementation, coupling the actor to the critic through a
//! differentiable dynamics model.
use crate::{
    model::{Model, SubModel},
    util::CriticLoss,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tch::{no_grad, Kind, Reduction, Tensor};

/// Differentiable one-step dynamics in tensor space.
///
/// The actor objective backpropagates through this model and the critic, so
/// implementations must be expressed with differentiable tensor operations.
pub trait DiffDynamics {
    /// Batched transition: returns `(next_states, rewards)`.
    fn step(&self, states: &Tensor, controls: &Tensor) -> (Tensor, Tensor);
}

/// Output of one critic gradient computation.
pub struct CriticGrad {
    /// Loss, ready to backpropagate.
    pub loss: Tensor,

    /// TD targets (recomputed partial returns) per transition.
    pub targets: Tensor,

    /// Critic values on the sampled states.
    pub values: Tensor,

    /// Target-critic values on the bootstrap states.
    pub target_values: Tensor,
}

/// Computes the losses of the critic and the actor.
pub trait GradBackend<P, Q>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Forms the TD target `partial_return + (1 - done) * V_tgt(bootstrap)`
    /// and the importance-weighted critic loss.
    #[allow(clippy::too_many_arguments)]
    fn critic_grad(
        &self,
        critic: &Model<Q>,
        target_critic: &Model<Q>,
        states: &Tensor,
        bootstrap_states: &Tensor,
        partial_returns: &Tensor,
        dones: &Tensor,
        weights: &Tensor,
    ) -> CriticGrad;

    /// Policy-gradient-style actor loss using the critic as a differentiable
    /// value estimator.
    fn actor_grad(
        &self,
        actor: &Model<P>,
        critic: &Model<Q>,
        states: &Tensor,
        terminals: &Tensor,
    ) -> Tensor;
}

/// Default TD backend.
///
/// The critic is regressed onto bootstrapped targets; the actor maximizes the
/// one-step objective `reward + (1 - terminal) * V(f(s, pi(s)))`, which flows
/// gradients through the dynamics model and the critic.
pub struct TdBackend<D: DiffDynamics> {
    dynamics: D,
    critic_loss: CriticLoss,
}

impl<D: DiffDynamics> TdBackend<D> {
    /// Constructs the backend.
    pub fn new(dynamics: D, critic_loss: CriticLoss) -> Self {
        Self {
            dynamics,
            critic_loss,
        }
    }
}

impl<D, P, Q> GradBackend<P, Q> for TdBackend<D>
where
    D: DiffDynamics,
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    fn critic_grad(
        &self,
        critic: &Model<Q>,
        target_critic: &Model<Q>,
        states: &Tensor,
        bootstrap_states: &Tensor,
        partial_returns: &Tensor,
        dones: &Tensor,
        weights: &Tensor,
    ) -> CriticGrad {
        let values = critic.forward(states).squeeze_dim(-1);
        let (targets, target_values) = no_grad(|| {
            let target_values = target_critic.forward(bootstrap_states).squeeze_dim(-1);
            let targets = partial_returns + (1f32 - dones) * &target_values;
            (targets, target_values)
        });

        debug_assert_eq!(values.size(), targets.size());

        let loss = match self.critic_loss {
            CriticLoss::Mse => {
                (weights * (&values - &targets).pow_tensor_scalar(2)).mean(Kind::Float)
            }
            CriticLoss::SmoothL1 => {
                (weights * values.smooth_l1_loss(&targets, Reduction::None, 1.0)).mean(Kind::Float)
            }
        };

        CriticGrad {
            loss,
            targets,
            values,
            target_values,
        }
    }

    fn actor_grad(
        &self,
        actor: &Model<P>,
        critic: &Model<Q>,
        states: &Tensor,
        terminals: &Tensor,
    ) -> Tensor {
        let controls = actor.forward(states);
        let (next_states, rewards) = self.dynamics.step(states, &controls);
        let next_values = critic.forward(&next_states).squeeze_dim(-1);
        let objective = rewards + (1f32 - terminals) * next_values;
        -objective.mean(Kind::Float)
    }
}

//! Optimizers and learning-rate schedules.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Adam, Optimizer as Optimizer_, OptimizerConfig as OptimizerConfig_, VarStore},
    Tensor,
};

/// Configures an optimizer for training the actor or the critic.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,

        /// Term added to the denominator for numerical stability.
        eps: f64,
    },
}

impl OptimizerConfig {
    /// Returns the initial learning rate.
    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerConfig::Adam { lr, .. } => *lr,
        }
    }

    /// Constructs an optimizer.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr, eps } => {
                let opt = Adam {
                    eps: *eps,
                    ..Default::default()
                }
                .build(vs, *lr)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam {
            lr: 1e-3,
            eps: 1e-7,
        }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of [tch::nn::Optimizer].
///
/// [tch::nn::Optimizer]: https://docs.rs/tch/0.16.0/tch/nn/struct.Optimizer.html
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Optimizer_),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) {
        match self {
            Self::Adam(opt) => {
                opt.backward_step(loss);
            }
        }
    }

    /// Sets the learning rate.
    pub fn set_lr(&mut self, lr: f64) {
        match self {
            Self::Adam(opt) => opt.set_lr(lr),
        }
    }
}

/// Configures a piecewise-constant learning-rate decay.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LrScheduleConfig {
    /// Update counts at which the rate decays.
    pub(crate) boundaries: Vec<usize>,

    /// Multiplicative decay factor applied at each boundary.
    pub(crate) gamma: f64,
}

impl LrScheduleConfig {
    /// Constructs the configuration with the default decay factor 0.5.
    pub fn new(boundaries: Vec<usize>) -> Self {
        Self {
            boundaries,
            gamma: 0.5,
        }
    }

    /// Sets the decay factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Builds the schedule state starting from `base_lr`.
    pub fn build(&self, base_lr: f64) -> LrSchedule {
        LrSchedule {
            boundaries: self.boundaries.clone(),
            gamma: self.gamma,
            cur_lr: base_lr,
            n_ticks: 0,
        }
    }
}

/// Piecewise-constant learning-rate decay.
///
/// Explicit schedule state: a tick counter, the boundary list and the current
/// rate, advanced once per update cycle with [`LrSchedule::tick`].
#[derive(Debug, Clone)]
pub struct LrSchedule {
    boundaries: Vec<usize>,
    gamma: f64,
    cur_lr: f64,
    n_ticks: usize,
}

impl LrSchedule {
    /// Current learning rate.
    pub fn lr(&self) -> f64 {
        self.cur_lr
    }

    /// Advances the tick counter; returns the new rate when a boundary is
    /// crossed.
    fn advance(&mut self) -> Option<f64> {
        self.n_ticks += 1;
        if self.boundaries.contains(&self.n_ticks) {
            self.cur_lr *= self.gamma;
            Some(self.cur_lr)
        } else {
            None
        }
    }

    /// Advances the schedule by one update and pushes the decayed rate into
    /// the optimizer when a boundary is crossed.
    pub fn tick(&mut self, opt: &mut Optimizer) {
        if let Some(lr) = self.advance() {
            opt.set_lr(lr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LrScheduleConfig;

    #[test]
    fn test_piecewise_constant_decay() {
        let mut schedule = LrScheduleConfig::new(vec![2, 4]).build(1.0);

        assert_eq!(schedule.advance(), None); // tick 1
        assert_eq!(schedule.advance(), Some(0.5)); // tick 2, first boundary
        assert_eq!(schedule.lr(), 0.5);
        assert_eq!(schedule.advance(), None); // tick 3
        assert_eq!(schedule.advance(), Some(0.25)); // tick 4, second boundary
        assert_eq!(schedule.advance(), None); // past the last boundary
        assert_eq!(schedule.lr(), 0.25);
    }

    #[test]
    fn test_custom_gamma() {
        let mut schedule = LrScheduleConfig::new(vec![1]).gamma(0.1).build(2.0);
        assert_eq!(schedule.advance(), Some(0.2));
    }
}

//! Actor-critic trainer implemented with [tch](https://crates.io/crates/tch),
//! driving the learning core of `warmstart-core`.
mod actor_critic;
mod backend;
mod device;
mod mlp;
mod model;
mod opt;
mod util;

pub use actor_critic::{ActorCritic, ActorCriticConfig, UpdateStats};
pub use backend::{CriticGrad, DiffDynamics, GradBackend, TdBackend};
pub use device::Device;
pub use mlp::{Activation, Mlp, MlpConfig};
pub use model::{Model, ModelBase, ModelConfig, SubModel};
pub use opt::{LrSchedule, LrScheduleConfig, Optimizer, OptimizerConfig};
pub use util::{track, CriticLoss};

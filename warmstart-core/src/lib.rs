#![warn(missing_docs)]
//! Learning core of an actor-critic agent used to warm-start a trajectory optimizer.
//!
//! This crate is backend-free: it defines the collaborator interfaces
//! (environment, replay buffer), the episode rollout and return estimation
//! over reward traces, and the warm-start seeding of the optimizer. Gradient
//! computation lives in a backend crate such as `warmstart-tch-agent`.
pub mod error;
pub mod record;

mod base;
pub use base::{Env, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};

mod episode;
pub use episode::{rollout_episode, EpisodeTrace};

mod returns;
pub use returns::{compute_returns, ReturnMode, ReturnRecord};

mod seeder;
pub use seeder::{RolloutSeeder, SeedOutcome, SeederConfig};

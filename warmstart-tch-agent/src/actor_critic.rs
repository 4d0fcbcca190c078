//! Actor-critic trainer with a slowly-tracking target critic.
mod base;
mod config;
pub use base::{ActorCritic, UpdateStats};
pub use config::ActorCriticConfig;

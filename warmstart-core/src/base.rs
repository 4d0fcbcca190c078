//! Core interfaces.
mod batch;
mod env;
mod replay_buffer;
pub use batch::TransitionBatch;
pub use env::Env;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};

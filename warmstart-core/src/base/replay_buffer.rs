//! Replay buffer interfaces.
//!
//! The buffer's internal storage, priority tree and sampling distribution are
//! external concerns; this module only fixes the contract the learn loop
//! relies on.
use super::TransitionBatch;
use anyhow::Result;

/// Interface of buffers that accept experiences produced by episodes.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes a set of transitions into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of transitions currently stored.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer stores no transitions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface of replay buffers that generate batches for training.
///
/// The batch size is fixed by the buffer's own configuration, which is why
/// [`ReplayBufferBase::sample`] takes no size argument.
pub trait ReplayBufferBase {
    /// Configuration of the buffer.
    type Config: Clone;

    /// Builds a replay buffer.
    fn build(config: &Self::Config) -> Self;

    /// Samples one batch of transitions, together with per-sample importance
    /// weights and the indices needed to report priorities back.
    fn sample(&mut self) -> Result<TransitionBatch>;

    /// Updates the priorities of the transitions at `ixs` from their TD errors.
    ///
    /// Non-prioritized implementations may ignore the call.
    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_errs: &Option<Vec<f32>>);
}

//! Batch of transitions.
use ndarray::Array2;

/// A fixed-size set of transitions sampled from a replay buffer.
///
/// `bootstrap_states` rows are only meaningful where `dones` is 0; rows whose
/// `done` flag is set are zero-filled and must not be read when forming the
/// critic target.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// States `s_i`, one row per transition.
    pub states: Array2<f32>,

    /// States at the lookahead horizon plus one, used as bootstrapping targets.
    pub bootstrap_states: Array2<f32>,

    /// Partial cost-to-go, summed up to the lookahead horizon inclusive.
    pub partial_returns: Vec<f32>,

    /// 1 if no bootstrapping is needed for the transition.
    pub dones: Vec<i8>,

    /// 1 only on the true last step of an episode.
    pub terminals: Vec<i8>,

    /// Importance-sampling weights reweighting the critic loss.
    pub weights: Vec<f32>,

    /// Buffer indices of the sampled transitions, used to report updated
    /// priorities back to the buffer. `None` for freshly built batches.
    pub ixs: Option<Vec<usize>>,
}

impl TransitionBatch {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.partial_returns.len()
    }

    /// Returns `true` if the batch holds no transitions.
    pub fn is_empty(&self) -> bool {
        self.partial_returns.is_empty()
    }

    /// Unpacks the batch into
    /// `(states, bootstrap_states, partial_returns, dones, terminals, weights, ixs)`.
    #[allow(clippy::type_complexity)]
    pub fn unpack(
        self,
    ) -> (
        Array2<f32>,
        Array2<f32>,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
        Vec<f32>,
        Option<Vec<usize>>,
    ) {
        (
            self.states,
            self.bootstrap_states,
            self.partial_returns,
            self.dones,
            self.terminals,
            self.weights,
            self.ixs,
        )
    }
}

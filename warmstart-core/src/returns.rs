//! Return estimation over an episode trace.
use crate::TransitionBatch;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// How cost-to-go values are bootstrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ReturnMode {
    /// Real rewards summed to the episode end, no bootstrapping.
    MonteCarlo,

    /// n-step temporal difference: `n` real rewards plus a value estimate of
    /// the state at the lookahead horizon. `n` must be at least 1.
    TdN(usize),
}

impl ReturnMode {
    /// Returns `true` in Monte-Carlo mode, where no target critic is needed.
    pub fn is_monte_carlo(&self) -> bool {
        matches!(self, ReturnMode::MonteCarlo)
    }
}

/// Per-step cost-to-go values of one episode, as produced by
/// [`compute_returns`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRecord {
    /// `partial_returns[i]` sums rewards from `i` to the lookahead horizon,
    /// inclusive.
    pub partial_returns: Vec<f32>,

    /// `total_returns[i]` sums rewards from `i` to the episode end.
    pub total_returns: Vec<f32>,

    /// `bootstrap_states` row `i` is the state at the lookahead horizon plus
    /// one; zero-filled (and never read downstream) where `dones[i] == 1`.
    pub bootstrap_states: Array2<f32>,

    /// 1 where no bootstrapping is needed.
    pub dones: Vec<i8>,

    /// 1 only at the last index, independent of the bootstrap mode.
    pub terminals: Vec<i8>,
}

impl ReturnRecord {
    /// Returns the number of steps covered by the record.
    pub fn len(&self) -> usize {
        self.partial_returns.len()
    }

    /// Returns `true` for the empty record of a non-viable episode.
    pub fn is_empty(&self) -> bool {
        self.partial_returns.is_empty()
    }

    /// Packs the record and the visited states into a [`TransitionBatch`]
    /// ready for replay insertion, with unit importance weights.
    pub fn into_batch(self, states: ArrayView2<f32>) -> TransitionBatch {
        let weights = vec![1f32; self.partial_returns.len()];
        TransitionBatch {
            states: states.to_owned(),
            bootstrap_states: self.bootstrap_states,
            partial_returns: self.partial_returns,
            dones: self.dones,
            terminals: self.terminals,
            weights,
            ixs: None,
        }
    }
}

/// Converts the reward trace of an episode into partial and total cost-to-go
/// values with bootstrapping targets.
///
/// `rewards` has `T + 1` entries for an episode of `T` control steps, the
/// last entry being the terminal reward; `states` has one row per entry.
/// A trace with no viable horizon (`T == 0`) yields an empty record and the
/// caller is expected to skip the episode.
///
/// This is a pure function: calling it twice on the same trace yields
/// identical outputs.
pub fn compute_returns(rewards: &[f32], states: ArrayView2<f32>, mode: ReturnMode) -> ReturnRecord {
    let nb_state = states.ncols();
    debug_assert_eq!(states.nrows(), rewards.len());
    if let ReturnMode::TdN(n) = mode {
        debug_assert!(n >= 1, "TD lookahead must be positive");
    }

    if rewards.len() < 2 {
        return ReturnRecord {
            partial_returns: vec![],
            total_returns: vec![],
            bootstrap_states: Array2::zeros((0, nb_state)),
            dones: vec![],
            terminals: vec![],
        };
    }

    let horizon = rewards.len() - 1;
    let mut partial_returns = vec![0f32; horizon + 1];
    let mut total_returns = vec![0f32; horizon + 1];
    let mut bootstrap_states = Array2::zeros((horizon + 1, nb_state));
    let mut dones = vec![0i8; horizon + 1];
    let mut terminals = vec![0i8; horizon + 1];
    terminals[horizon] = 1;

    for i in 0..=horizon {
        let final_lookahead = match mode {
            ReturnMode::MonteCarlo => horizon,
            ReturnMode::TdN(n) => (i + n).min(horizon),
        };
        if mode.is_monte_carlo() || final_lookahead == horizon {
            dones[i] = 1;
        } else {
            bootstrap_states
                .row_mut(i)
                .assign(&states.row(final_lookahead + 1));
        }
        partial_returns[i] = rewards[i..=final_lookahead].iter().sum();
        total_returns[i] = rewards[i..=horizon].iter().sum();
    }

    ReturnRecord {
        partial_returns,
        total_returns,
        bootstrap_states,
        dones,
        terminals,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_returns, ReturnMode};
    use ndarray::{arr2, Array2};

    fn states() -> Array2<f32> {
        // One 2-d state per reward entry; values chosen to identify rows.
        arr2(&[[0., 10.], [1., 11.], [2., 12.], [3., 13.]])
    }

    #[test]
    fn test_monte_carlo_returns() {
        let rewards = [1f32, 2., 3., 10.];
        let rec = compute_returns(&rewards, states().view(), ReturnMode::MonteCarlo);

        assert_eq!(rec.partial_returns, vec![16., 15., 13., 10.]);
        assert_eq!(rec.total_returns, vec![16., 15., 13., 10.]);
        assert_eq!(rec.dones, vec![1, 1, 1, 1]);
        assert_eq!(rec.terminals, vec![0, 0, 0, 1]);
        assert!(rec.bootstrap_states.iter().all(|&v| v == 0.));
    }

    #[test]
    fn test_td1_returns() {
        let rewards = [1f32, 2., 3., 10.];
        let rec = compute_returns(&rewards, states().view(), ReturnMode::TdN(1));

        // Index 2's lookahead min(3, 3) reaches the end, so it sums through it.
        assert_eq!(rec.partial_returns, vec![3., 5., 13., 10.]);
        assert_eq!(rec.total_returns, vec![16., 15., 13., 10.]);
        assert_eq!(rec.dones, vec![0, 0, 1, 1]);
        assert_eq!(rec.terminals, vec![0, 0, 0, 1]);

        // Bootstrapping targets are the states at lookahead + 1.
        assert_eq!(rec.bootstrap_states.row(0).to_vec(), vec![2., 12.]);
        assert_eq!(rec.bootstrap_states.row(1).to_vec(), vec![3., 13.]);
        assert!(rec.bootstrap_states.row(2).iter().all(|&v| v == 0.));
        assert!(rec.bootstrap_states.row(3).iter().all(|&v| v == 0.));
    }

    #[test]
    fn test_large_lookahead_matches_monte_carlo() {
        let rewards = [1f32, 2., 3., 10.];
        let td = compute_returns(&rewards, states().view(), ReturnMode::TdN(10));
        let mc = compute_returns(&rewards, states().view(), ReturnMode::MonteCarlo);
        assert_eq!(td, mc);
    }

    #[test]
    fn test_idempotence() {
        let rewards = [0.5f32, -1., 2., 0.];
        let a = compute_returns(&rewards, states().view(), ReturnMode::TdN(2));
        let b = compute_returns(&rewards, states().view(), ReturnMode::TdN(2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_horizon() {
        let rewards = [5f32];
        let states = arr2(&[[1f32, 2.]]);
        let rec = compute_returns(&rewards, states.view(), ReturnMode::MonteCarlo);
        assert!(rec.is_empty());
        assert_eq!(rec.bootstrap_states.nrows(), 0);
    }

    #[test]
    fn test_into_batch() {
        let rewards = [1f32, 2., 3., 10.];
        let states = states();
        let rec = compute_returns(&rewards, states.view(), ReturnMode::TdN(1));
        let batch = rec.into_batch(states.view());
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.weights, vec![1., 1., 1., 1.]);
        assert_eq!(batch.states, states);
        assert!(batch.ixs.is_none());
    }
}

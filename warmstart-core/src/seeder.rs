//! Warm-start seeding of the trajectory optimizer.
use crate::Env;
use log::warn;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Configuration of [`RolloutSeeder`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeederConfig {
    /// State dimension (robot state plus the time component).
    pub nb_state: usize,

    /// Control dimension.
    pub nb_action: usize,

    /// Simulation timestep.
    pub dt: f32,

    /// Maximum episode length in steps.
    pub nsteps: usize,
}

/// Outcome of one warm-start attempt.
///
/// Failures are values, not errors: both failure variants are expected
/// conditions the caller handles by skipping or resampling the initial state.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// Usable initial trajectories for the optimizer.
    Seeded {
        /// State trajectory, `horizon + 1` rows.
        states: Array2<f32>,

        /// Control trajectory, `horizon` rows.
        controls: Array2<f32>,

        /// Remaining control steps of the episode.
        horizon: usize,
    },

    /// The initial time leaves no viable horizon; skip the episode.
    NonViable,

    /// The simulation produced a non-finite state; discard the episode and
    /// retry with a fresh initial condition.
    Diverged {
        /// Step at which the first non-finite value appeared.
        step: usize,
    },
}

/// Produces the initial state/control trajectory used to warm-start the
/// trajectory optimizer.
///
/// The first episode is seeded with zero controls; later episodes roll out
/// the current policy. The seeder only reads the policy, it never trains it.
pub struct RolloutSeeder {
    config: SeederConfig,
}

impl RolloutSeeder {
    /// Constructs [`RolloutSeeder`].
    pub fn new(config: SeederConfig) -> Self {
        Self { config }
    }

    /// Remaining control steps of an episode starting at the given state,
    /// derived from its time component (the last element).
    pub fn horizon(&self, init_state: ArrayView1<f32>) -> usize {
        let time = init_state[init_state.len() - 1];
        self.config
            .nsteps
            .saturating_sub((time / self.config.dt) as usize)
    }

    /// Rolls out a seed trajectory for episode `episode` from `init_state`.
    ///
    /// `policy` maps a state to a control; it is only consulted from the
    /// second episode on and is expected to run detached, single-sample
    /// inference. Divergence is reported through [`SeedOutcome`], never by
    /// panicking.
    pub fn seed<E, F>(
        &self,
        env: &E,
        episode: usize,
        init_state: ArrayView1<f32>,
        mut policy: F,
    ) -> SeedOutcome
    where
        E: Env,
        F: FnMut(ArrayView1<f32>) -> Array1<f32>,
    {
        let horizon = self.horizon(init_state);
        if horizon == 0 {
            return SeedOutcome::NonViable;
        }

        let mut states = Array2::zeros((horizon + 1, self.config.nb_state));
        let mut controls = Array2::zeros((horizon, self.config.nb_action));
        states.row_mut(0).assign(&init_state);

        for i in 0..horizon {
            if episode > 0 {
                let control = policy(states.row(i));
                controls.row_mut(i).assign(&control);
            }
            let next = env.simulate(states.row(i), controls.row(i));
            if !next.iter().all(|v| v.is_finite()) {
                warn!("non-finite state at rollout step {}/{}", i + 1, horizon);
                return SeedOutcome::Diverged { step: i + 1 };
            }
            states.row_mut(i + 1).assign(&next);
        }

        SeedOutcome::Seeded {
            states,
            controls,
            horizon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RolloutSeeder, SeedOutcome, SeederConfig};
    use crate::Env;
    use anyhow::Result;
    use ndarray::{arr1, Array1, ArrayView1};

    struct Integrator {
        /// x value beyond which the simulation blows up.
        blow_up_above: f32,
    }

    impl Env for Integrator {
        type Config = f32;

        fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self {
                blow_up_above: *config,
            })
        }

        fn step(&self, state: ArrayView1<f32>, control: ArrayView1<f32>) -> (Array1<f32>, f32) {
            (self.simulate(state, control), 0.)
        }

        fn terminal_reward(&self, _state: ArrayView1<f32>) -> f32 {
            0.
        }

        fn ee(&self, state: ArrayView1<f32>) -> [f32; 3] {
            [state[0], 0., 0.]
        }

        fn simulate(&self, state: ArrayView1<f32>, control: ArrayView1<f32>) -> Array1<f32> {
            let x = state[0] + control[0];
            if x > self.blow_up_above {
                arr1(&[f32::NAN, state[1] + 0.1])
            } else {
                arr1(&[x, state[1] + 0.1])
            }
        }
    }

    fn seeder() -> RolloutSeeder {
        RolloutSeeder::new(SeederConfig {
            nb_state: 2,
            nb_action: 1,
            dt: 0.1,
            nsteps: 10,
        })
    }

    #[test]
    fn test_no_viable_horizon() {
        let env = Integrator::build(&f32::MAX, 0).unwrap();
        // Initial time at the episode end leaves no control steps.
        let init = arr1(&[0f32, 1.0]);
        let outcome = seeder().seed(&env, 3, init.view(), |_| arr1(&[0f32]));
        assert_eq!(outcome, SeedOutcome::NonViable);
    }

    #[test]
    fn test_first_episode_uses_zero_controls() {
        let env = Integrator::build(&f32::MAX, 0).unwrap();
        let init = arr1(&[0f32, 0.5]);
        // The policy must not be consulted on episode 0.
        let outcome = seeder().seed(&env, 0, init.view(), |_| panic!("policy called"));
        match outcome {
            SeedOutcome::Seeded {
                states,
                controls,
                horizon,
            } => {
                assert_eq!(horizon, 5);
                assert_eq!(controls.nrows(), 5);
                assert!(controls.iter().all(|&u| u == 0.));
                assert_eq!(states.nrows(), 6);
                assert!(states.column(0).iter().all(|&x| x == 0.));
            }
            other => panic!("expected Seeded, got {:?}", other),
        }
    }

    #[test]
    fn test_policy_rollout_after_first_episode() {
        let env = Integrator::build(&f32::MAX, 0).unwrap();
        let init = arr1(&[0f32, 0.8]);
        let outcome = seeder().seed(&env, 4, init.view(), |_| arr1(&[0.5f32]));
        match outcome {
            SeedOutcome::Seeded {
                states, controls, ..
            } => {
                assert!(controls.iter().all(|&u| u == 0.5));
                assert_eq!(states[[2, 0]], 1.0);
            }
            other => panic!("expected Seeded, got {:?}", other),
        }
    }

    #[test]
    fn test_divergence_is_reported_not_raised() {
        let env = Integrator::build(&1.2, 0).unwrap();
        let init = arr1(&[0f32, 0.0]);
        let outcome = seeder().seed(&env, 1, init.view(), |_| arr1(&[0.5f32]));
        // x crosses 1.2 on the third step.
        assert_eq!(outcome, SeedOutcome::Diverged { step: 3 });
    }
}

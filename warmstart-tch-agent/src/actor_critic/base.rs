//! The actor-critic trainer.
use super::ActorCriticConfig;
use crate::{
    backend::GradBackend,
    model::{Model, ModelBase, SubModel},
    util::{self, track},
};
use anyhow::Result;
use chrono::Local;
use log::info;
use ndarray::{Array1, ArrayView1};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryFrom, fmt::Debug, fs, path::Path, time::SystemTime};
use tch::Tensor;
use warmstart_core::{
    record::{Record, RecordValue},
    ReplayBufferBase, ReturnMode, TransitionBatch,
};

/// Diagnostics of a single gradient update.
pub struct UpdateStats {
    /// TD targets of the sampled transitions.
    pub td_targets: Vec<f32>,

    /// Critic values on the sampled states.
    pub critic_values: Vec<f32>,

    /// Target-critic values on the bootstrap states.
    pub target_critic_values: Vec<f32>,
}

/// Actor-critic trainer.
///
/// Owns the actor, the critic and a target copy of the critic, and runs the
/// optimization loop over batches sampled from a replay buffer. The target
/// critic tracks the critic with a Polyak update of rate `tau`; under
/// Monte-Carlo returns no bootstrapping happens and the target copy is left
/// untouched.
pub struct ActorCritic<P, Q, B>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    B: GradBackend<P, Q>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    actor: Model<P>,
    critic: Model<Q>,
    target_critic: Model<Q>,
    backend: B,
    tau: f64,
    return_mode: ReturnMode,
    update_loops: Vec<usize>,
    n_opts: usize,
    device: tch::Device,
}

impl<P, Q, B> ActorCritic<P, Q, B>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    B: GradBackend<P, Q>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Constructs the trainer from its configuration and a gradient backend.
    pub fn build(config: ActorCriticConfig<P::Config, Q::Config>, backend: B) -> Result<Self> {
        let device = config
            .device
            .map(Into::into)
            .unwrap_or(tch::Device::Cpu);
        if let Some(seed) = config.seed {
            tch::manual_seed(seed);
        }

        let actor = Model::build(config.actor_config, device)?;
        let critic: Model<Q> = Model::build(config.critic_config, device)?;
        let target_critic = critic.clone();
        util::check_matching_names(&critic, &target_critic)?;

        Ok(Self {
            actor,
            critic,
            target_critic,
            backend,
            tau: config.tau,
            return_mode: config.return_mode,
            update_loops: config.update_loops,
            n_opts: 0,
            device,
        })
    }

    /// The number of gradient updates applied so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// The configured return mode.
    pub fn return_mode(&self) -> ReturnMode {
        self.return_mode
    }

    fn n_updates(&self, episode: usize) -> usize {
        *self
            .update_loops
            .get(episode)
            .or_else(|| self.update_loops.last())
            .unwrap_or(&0)
    }

    fn soft_update(&mut self) {
        track(&mut self.target_critic, &self.critic, self.tau);
    }

    /// Applies one critic step and one actor step on a batch.
    pub fn update(&mut self, batch: &TransitionBatch) -> UpdateStats {
        let states = util::array2_to_tensor(batch.states.view(), self.device);
        let bootstrap_states = util::array2_to_tensor(batch.bootstrap_states.view(), self.device);
        let partial_returns = Tensor::from_slice(&batch.partial_returns).to(self.device);
        let dones = util::flags_to_tensor(&batch.dones, self.device);
        let terminals = util::flags_to_tensor(&batch.terminals, self.device);
        let weights = Tensor::from_slice(&batch.weights).to(self.device);

        let out = self.backend.critic_grad(
            &self.critic,
            &self.target_critic,
            &states,
            &bootstrap_states,
            &partial_returns,
            &dones,
            &weights,
        );
        self.critic.backward_step(&out.loss);

        let actor_loss = self
            .backend
            .actor_grad(&self.actor, &self.critic, &states, &terminals);
        self.actor.backward_step(&actor_loss);

        self.actor.tick_lr_schedule();
        self.critic.tick_lr_schedule();

        UpdateStats {
            td_targets: util::tensor_to_vec(&out.targets),
            critic_values: util::tensor_to_vec(&out.values.detach()),
            target_critic_values: util::tensor_to_vec(&out.target_values),
        }
    }

    /// Runs the optimization loop for one episode.
    ///
    /// The number of updates is taken from `update_loops`, indexed by the
    /// episode and clamped to the last entry. Each update samples a batch,
    /// steps the critic and the actor, reports the absolute TD errors back to
    /// the buffer as new priorities, and tracks the target critic when
    /// bootstrapping is on.
    pub fn opt<R: ReplayBufferBase>(&mut self, buffer: &mut R, episode: usize) -> Result<Record> {
        let n = self.n_updates(episode);
        let mut sample_time = 0f32;
        let mut update_time = 0f32;
        let mut track_time = 0f32;

        for _ in 0..n {
            let ts = SystemTime::now();
            let batch = buffer.sample()?;
            sample_time += ts.elapsed()?.as_secs_f32();

            let ts = SystemTime::now();
            let stats = self.update(&batch);
            if let Some(ixs) = &batch.ixs {
                let td_errs: Vec<f32> = stats
                    .td_targets
                    .iter()
                    .zip(stats.critic_values.iter())
                    .map(|(t, v)| (t - v).abs())
                    .collect();
                buffer.update_priority(&Some(ixs.clone()), &Some(td_errs));
            }
            update_time += ts.elapsed()?.as_secs_f32();

            let ts = SystemTime::now();
            if !self.return_mode.is_monte_carlo() {
                self.soft_update();
            }
            track_time += ts.elapsed()?.as_secs_f32();

            self.n_opts += 1;
        }

        if n == 0 {
            return Ok(Record::empty());
        }

        Ok(Record::from_slice(&[
            ("datetime", RecordValue::DateTime(Local::now())),
            ("opt_steps", RecordValue::Scalar(n as f32)),
            ("sample_time_avg", RecordValue::Scalar(sample_time / n as f32)),
            ("update_time_avg", RecordValue::Scalar(update_time / n as f32)),
            ("track_time_avg", RecordValue::Scalar(track_time / n as f32)),
        ]))
    }

    /// Evaluates the deterministic policy on a single state.
    pub fn eval_policy(&self, state: ArrayView1<f32>) -> Array1<f32> {
        tch::no_grad(|| {
            let v = state.iter().copied().collect::<Vec<_>>();
            let x = Tensor::from_slice(&v).to(self.device).unsqueeze(0);
            let u = self.actor.forward(&x).squeeze_dim(0);
            util::tensor_to_array1(&u)
        })
    }

    /// Evaluates the critic on a single state.
    pub fn eval_value(&self, state: ArrayView1<f32>) -> f32 {
        tch::no_grad(|| {
            let v = state.iter().copied().collect::<Vec<_>>();
            let x = Tensor::from_slice(&v).to(self.device).unsqueeze(0);
            f32::try_from(self.critic.forward(&x).squeeze()).unwrap()
        })
    }

    /// Saves the parameters of all three networks under the given directory.
    pub fn save_params<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        let path = path.as_ref();
        self.actor.save(path.join("actor.pt.tch").as_path())?;
        self.critic.save(path.join("critic.pt.tch").as_path())?;
        self.target_critic
            .save(path.join("target_critic.pt.tch").as_path())?;
        info!("Save parameters in {:?}", path);
        Ok(())
    }

    /// Loads the parameters of all three networks from the given directory.
    pub fn load_params<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.actor.load(path.join("actor.pt.tch").as_path())?;
        self.critic.load(path.join("critic.pt.tch").as_path())?;
        self.target_critic
            .load(path.join("target_critic.pt.tch").as_path())?;
        info!("Load parameters from {:?}", path);
        Ok(())
    }
}

//! Configuration of the actor-critic trainer.
use crate::{model::ModelConfig, Device};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use warmstart_core::ReturnMode;

/// Constructs [`ActorCritic`](super::ActorCritic).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig<PC, QC> {
    pub(super) actor_config: ModelConfig<PC>,
    pub(super) critic_config: ModelConfig<QC>,
    pub(super) tau: f64,
    pub(super) return_mode: ReturnMode,
    pub(super) update_loops: Vec<usize>,
    pub(super) seed: Option<i64>,
    /// Device on which the networks are built.
    pub device: Option<Device>,
}

impl<PC, QC> Default for ActorCriticConfig<PC, QC> {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            tau: 0.005,
            return_mode: ReturnMode::MonteCarlo,
            update_loops: vec![1],
            seed: None,
            device: None,
        }
    }
}

impl<PC, QC> ActorCriticConfig<PC, QC>
where
    PC: serde::de::DeserializeOwned + Serialize,
    QC: serde::de::DeserializeOwned + Serialize,
{
    /// Configuration of the actor.
    pub fn actor_config(mut self, v: ModelConfig<PC>) -> Self {
        self.actor_config = v;
        self
    }

    /// Configuration of the critic and its target copy.
    pub fn critic_config(mut self, v: ModelConfig<QC>) -> Self {
        self.critic_config = v;
        self
    }

    /// Sets the homotopy rate of the target-critic soft update.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the return bootstrapping mode.
    pub fn return_mode(mut self, v: ReturnMode) -> Self {
        self.return_mode = v;
        self
    }

    /// Number of gradient updates per episode, indexed by episode and
    /// clamped to the last entry.
    pub fn update_loops(mut self, v: Vec<usize>) -> Self {
        self.update_loops = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Constructs [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of actor-critic agent from {}", path_.to_str().unwrap());
        Ok(b)
    }

    /// Saves [`ActorCriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of actor-critic agent into {}", path_.to_str().unwrap());
        Ok(())
    }
}

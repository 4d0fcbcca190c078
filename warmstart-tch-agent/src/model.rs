//! Definition of interfaces and wrappers of neural networks.
use crate::opt::{LrSchedule, LrScheduleConfig, Optimizer, OptimizerConfig};
use anyhow::{Context, Result};
use log::{info, trace};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt::Debug, path::Path};
use tch::{nn, Device, Tensor};

/// Base interface of trainable networks.
pub trait ModelBase {
    /// Trains the network given a loss.
    fn backward_step(&mut self, loss: &Tensor);

    /// Returns `var_store`.
    fn get_var_store(&self) -> &nn::VarStore;

    /// Save parameters of the neural network.
    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()>;

    /// Load parameters of the neural network.
    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()>;
}

/// Neural network module that can be initialized with [`VarStore`] and a
/// configuration.
///
/// Structs implementing this trait share a [`VarStore`] given at build time,
/// and can be cloned with a fresh one. The latter is how the target critic is
/// spawned from the critic.
///
/// [`VarStore`]: https://docs.rs/tch/0.16.0/tch/nn/struct.VarStore.html
pub trait SubModel {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Input of the [`SubModel`].
    type Input;

    /// Output of the [`SubModel`].
    type Output;

    /// Builds [`SubModel`] with [`VarStore`] and [`SubModel::Config`].
    ///
    /// [`VarStore`]: https://docs.rs/tch/0.16.0/tch/nn/struct.VarStore.html
    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self;

    /// Clones [`SubModel`] with a given [`VarStore`].
    ///
    /// [`VarStore`]: https://docs.rs/tch/0.16.0/tch/nn/struct.VarStore.html
    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Self::Output;
}

/// Configuration of [`Model`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ModelConfig<C> {
    pub(crate) net_config: Option<C>,
    pub(crate) opt_config: OptimizerConfig,
    pub(crate) lr_schedule: Option<LrScheduleConfig>,
}

impl<C> Default for ModelConfig<C> {
    fn default() -> Self {
        Self {
            net_config: None,
            opt_config: OptimizerConfig::default(),
            lr_schedule: None,
        }
    }
}

impl<C> ModelConfig<C> {
    /// Constructs the configuration from a network configuration.
    pub fn new(net_config: C) -> Self {
        Self {
            net_config: Some(net_config),
            ..Default::default()
        }
    }

    /// Sets the optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Enables piecewise-constant learning-rate decay.
    pub fn lr_schedule(mut self, v: LrScheduleConfig) -> Self {
        self.lr_schedule = Some(v);
        self
    }
}

/// A network wrapped together with its variable store, its optimizer and an
/// optional learning-rate schedule.
///
/// Both the actor and the critic are instances of this wrapper; they differ
/// only in their submodel configurations.
pub struct Model<P>
where
    P: SubModel<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    device: Device,
    var_store: nn::VarStore,

    // Network module.
    net: P,

    // Optimizer and schedule.
    opt_config: OptimizerConfig,
    lr_schedule_config: Option<LrScheduleConfig>,
    lr_schedule: Option<LrSchedule>,
    opt: Optimizer,
}

impl<P> Model<P>
where
    P: SubModel<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Constructs [`Model`].
    pub fn build(config: ModelConfig<P::Config>, device: Device) -> Result<Model<P>> {
        let net_config = config.net_config.context("net_config is not set.")?;
        let var_store = nn::VarStore::new(device);
        let net = P::build(&var_store, net_config);

        Ok(Self::_build(
            device,
            config.opt_config,
            config.lr_schedule,
            net,
            var_store,
            None,
        ))
    }

    fn _build(
        device: Device,
        opt_config: OptimizerConfig,
        lr_schedule_config: Option<LrScheduleConfig>,
        net: P,
        mut var_store: nn::VarStore,
        var_store_src: Option<&nn::VarStore>,
    ) -> Self {
        // Optimizer
        let opt = opt_config.build(&var_store).unwrap();
        let lr_schedule = lr_schedule_config
            .as_ref()
            .map(|c| c.build(opt_config.learning_rate()));

        // Copy var_store
        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src).unwrap();
        }

        Self {
            device,
            var_store,
            net,
            opt_config,
            lr_schedule_config,
            lr_schedule,
            opt,
        }
    }

    /// Performs a forward pass.
    pub fn forward(&self, x: &P::Input) -> Tensor {
        self.net.forward(x)
    }

    /// Advances the learning-rate schedule by one update, if one is
    /// configured.
    pub fn tick_lr_schedule(&mut self) {
        if let Some(schedule) = &mut self.lr_schedule {
            schedule.tick(&mut self.opt);
        }
    }
}

impl<P> Clone for Model<P>
where
    P: SubModel<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        let device = self.device;
        let opt_config = self.opt_config.clone();
        let lr_schedule_config = self.lr_schedule_config.clone();
        let var_store = nn::VarStore::new(device);
        let net = self.net.clone_with_var_store(&var_store);

        Self::_build(
            device,
            opt_config,
            lr_schedule_config,
            net,
            var_store,
            Some(&self.var_store),
        )
    }
}

impl<P> ModelBase for Model<P>
where
    P: SubModel<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    fn backward_step(&mut self, loss: &Tensor) {
        self.opt.backward_step(loss);
    }

    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.var_store.save(&path)?;
        info!("Save model to {:?}", path.as_ref());
        let vs = self.var_store.variables();
        for (name, _) in vs.iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load model from {:?}", path.as_ref());
        Ok(())
    }
}

use super::{Activation, MlpConfig};
use crate::model::SubModel;
use tch::{nn, nn::Module, Device, Tensor};

/// Multilayer perceptron with a configurable hidden activation family.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    seq: nn::Sequential,
}

impl Mlp {
    fn create_net(var_store: &nn::VarStore, config: &MlpConfig) -> nn::Sequential {
        let p = &(var_store.root() / "mlp");
        let mut seq = nn::seq();
        let mut in_dim = config.in_dim;

        for (i, &out_dim) in config.units.iter().enumerate() {
            seq = seq.add(nn::linear(
                p / format!("{}{}", "ln", i),
                in_dim,
                out_dim,
                Default::default(),
            ));
            seq = match config.activation {
                Activation::Relu => seq.add_fn(|x| x.relu()),
                Activation::Elu => seq.add_fn(|x| x.elu()),
                Activation::Sine => seq.add_fn(|x| x.sin()),
                Activation::SineElu => {
                    if i % 2 == 0 {
                        seq.add_fn(|x| x.sin())
                    } else {
                        seq.add_fn(|x| x.elu())
                    }
                }
            };
            in_dim = out_dim;
        }

        seq.add(nn::linear(
            p / format!("{}{}", "ln", config.units.len()),
            in_dim,
            config.out_dim,
            Default::default(),
        ))
    }
}

impl SubModel for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        self.seq.forward(&x.to(self.device))
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        let config = self.config.clone();
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }
}

use anyhow::Result;
use ndarray::{arr1, arr2, Array2};
use tch::{Kind, Tensor};
use tempdir::TempDir;
use warmstart_core::{
    compute_returns, record::RecordValue, ReplayBufferBase, ReturnMode, TransitionBatch,
};
use warmstart_tch_agent::{
    Activation, ActorCritic, ActorCriticConfig, CriticLoss, DiffDynamics, MlpConfig, ModelConfig,
    OptimizerConfig, TdBackend,
};

const NB_STATE: i64 = 2;
const NB_ACTION: i64 = 2;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Point-mass-like dynamics kept fully differentiable: the next state is the
/// current one shifted by the control, the reward penalizes the distance of
/// the next state from the origin.
struct ShiftDynamics;

impl DiffDynamics for ShiftDynamics {
    fn step(&self, states: &Tensor, controls: &Tensor) -> (Tensor, Tensor) {
        let next_states = states + controls;
        let rewards = -(&next_states * &next_states).sum_dim_intlist(
            Some([-1].as_slice()),
            false,
            Kind::Float,
        );
        (next_states, rewards)
    }
}

/// Replays a single stored batch and records priority updates.
struct SingleBatchBuffer {
    batch: Option<TransitionBatch>,
    priority_updates: Vec<(Vec<usize>, Vec<f32>)>,
}

impl SingleBatchBuffer {
    fn with_batch(batch: TransitionBatch) -> Self {
        Self {
            batch: Some(batch),
            priority_updates: vec![],
        }
    }
}

impl ReplayBufferBase for SingleBatchBuffer {
    type Config = ();

    fn build(_config: &Self::Config) -> Self {
        Self {
            batch: None,
            priority_updates: vec![],
        }
    }

    fn sample(&mut self) -> Result<TransitionBatch> {
        let mut batch = self
            .batch
            .clone()
            .ok_or_else(|| anyhow::anyhow!("empty buffer"))?;
        batch.ixs = Some((0..batch.len()).collect());
        Ok(batch)
    }

    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_errs: &Option<Vec<f32>>) {
        if let (Some(ixs), Some(td_errs)) = (ixs, td_errs) {
            self.priority_updates.push((ixs.clone(), td_errs.clone()));
        }
    }
}

fn trace_states() -> Array2<f32> {
    arr2(&[[1.0, 0.0], [0.5, 0.2], [0.2, 0.1], [0.0, 0.0]])
}

fn batch(mode: ReturnMode) -> TransitionBatch {
    let states = trace_states();
    let rewards = [-1.0f32, -0.5, -0.2, 0.0];
    compute_returns(&rewards, states.view(), mode).into_batch(states.view())
}

fn config(seed: i64, mode: ReturnMode) -> ActorCriticConfig<MlpConfig, MlpConfig> {
    let actor_config = ModelConfig::new(MlpConfig::new(
        NB_STATE,
        vec![8, 8],
        NB_ACTION,
        Activation::SineElu,
    ))
    .opt_config(OptimizerConfig::Adam { lr: 1e-3, eps: 1e-7 });
    let critic_config = ModelConfig::new(MlpConfig::new(
        NB_STATE,
        vec![8, 8],
        1,
        Activation::Elu,
    ))
    .opt_config(OptimizerConfig::Adam { lr: 1e-3, eps: 1e-7 });

    ActorCriticConfig::default()
        .actor_config(actor_config)
        .critic_config(critic_config)
        .tau(0.02)
        .return_mode(mode)
        .update_loops(vec![2, 3])
        .seed(seed)
}

fn agent(
    seed: i64,
    mode: ReturnMode,
) -> ActorCritic<warmstart_tch_agent::Mlp, warmstart_tch_agent::Mlp, TdBackend<ShiftDynamics>> {
    let backend = TdBackend::new(ShiftDynamics, CriticLoss::Mse);
    ActorCritic::build(config(seed, mode), backend).unwrap()
}

#[test]
fn test_opt_loop_counts_and_priorities() {
    init();
    let mode = ReturnMode::TdN(1);
    let mut agent = agent(42, mode);
    let mut buffer = SingleBatchBuffer::with_batch(batch(mode));

    let record = agent.opt(&mut buffer, 0).unwrap();
    assert!(matches!(
        record.get("datetime"),
        Some(RecordValue::DateTime(_))
    ));
    assert_eq!(record.get_scalar("opt_steps").unwrap(), 2.0);
    assert!(record.get_scalar("sample_time_avg").unwrap() >= 0.0);
    assert!(record.get_scalar("update_time_avg").unwrap() >= 0.0);
    assert!(record.get_scalar("track_time_avg").unwrap() >= 0.0);
    assert_eq!(agent.n_opts(), 2);

    // One priority report per update, one TD error per sampled transition.
    assert_eq!(buffer.priority_updates.len(), 2);
    for (ixs, td_errs) in &buffer.priority_updates {
        assert_eq!(ixs.len(), 4);
        assert_eq!(td_errs.len(), 4);
        assert!(td_errs.iter().all(|e| e.is_finite() && *e >= 0.0));
    }

    // Episodes past the end of update_loops clamp to the last entry.
    agent.opt(&mut buffer, 10).unwrap();
    assert_eq!(agent.n_opts(), 5);
}

#[test]
fn test_monte_carlo_updates() {
    init();
    let mode = ReturnMode::MonteCarlo;
    let mut agent = agent(7, mode);
    let b = batch(mode);
    assert!(b.dones.iter().all(|&d| d == 1));
    let mut buffer = SingleBatchBuffer::with_batch(b);

    agent.opt(&mut buffer, 0).unwrap();
    assert_eq!(agent.n_opts(), 2);

    let u = agent.eval_policy(arr1(&[0.5f32, -0.5]).view());
    assert_eq!(u.len(), NB_ACTION as usize);
    assert!(u.iter().all(|v| v.is_finite()));
    assert!(agent.eval_value(arr1(&[0.5f32, -0.5]).view()).is_finite());
}

#[test]
fn test_save_load_params() {
    init();
    let mode = ReturnMode::TdN(1);
    let state = arr1(&[0.3f32, -0.7]);

    let mut agent_a = agent(42, mode);
    let mut buffer = SingleBatchBuffer::with_batch(batch(mode));
    agent_a.opt(&mut buffer, 0).unwrap();

    let tmp_dir = TempDir::new("actor_critic").unwrap();
    let path = tmp_dir.path().join("params");
    agent_a.save_params(&path).unwrap();

    let mut agent_b = agent(1234, mode);
    let u_a = agent_a.eval_policy(state.view());
    let u_b = agent_b.eval_policy(state.view());
    assert!(u_a != u_b);

    agent_b.load_params(&path).unwrap();
    let u_b = agent_b.eval_policy(state.view());
    for (a, b) in u_a.iter().zip(u_b.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_config_roundtrip() {
    init();
    let config = config(42, ReturnMode::TdN(3));
    let tmp_dir = TempDir::new("actor_critic").unwrap();
    let path = tmp_dir.path().join("config.yaml");
    config.save(&path).unwrap();
    let loaded = ActorCriticConfig::<MlpConfig, MlpConfig>::load(&path).unwrap();
    assert_eq!(config, loaded);
}

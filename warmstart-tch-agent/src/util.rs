//! Utilities.
use crate::model::ModelBase;
use log::trace;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::TryFrom;
use tch::Tensor;
use warmstart_core::error::WarmstartError;

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track<M: ModelBase>(dest: &mut M, src: &M, tau: f64) {
    let src = &src.get_var_store().variables();
    let dest = &mut dest.get_var_store().variables();
    debug_assert_eq!(src.len(), dest.len());

    let names = src.keys();
    tch::no_grad(|| {
        for name in names {
            let src = src.get(name).unwrap();
            let dest = dest.get_mut(name).unwrap();
            dest.copy_(&(tau * src + (1.0 - tau) * &*dest));
        }
    });
    trace!("soft update");
}

/// Verifies that two networks expose identical variable-name sets.
///
/// Called once when the target critic is spawned; a mismatch is a fatal
/// configuration error, not a per-update condition.
pub fn check_matching_names<M: ModelBase>(a: &M, b: &M) -> Result<(), WarmstartError> {
    let names_a: BTreeSet<String> = a.get_var_store().variables().keys().cloned().collect();
    let names_b: BTreeSet<String> = b.get_var_store().variables().keys().cloned().collect();
    if names_a != names_b {
        let diff: Vec<String> = names_a.symmetric_difference(&names_b).cloned().collect();
        return Err(WarmstartError::ParamNameMismatch(diff.join(", ")));
    }
    Ok(())
}

/// Converts a 2-d array of states or controls to a float tensor.
pub fn array2_to_tensor(a: ArrayView2<f32>, device: tch::Device) -> Tensor {
    let v = a.iter().copied().collect::<Vec<_>>();
    Tensor::from_slice(&v)
        .reshape(&[a.nrows() as i64, a.ncols() as i64])
        .to(device)
}

/// Converts a slice of `i8` flags to a float tensor.
pub fn flags_to_tensor(flags: &[i8], device: tch::Device) -> Tensor {
    Tensor::from_slice(flags).to_kind(tch::Kind::Float).to(device)
}

/// Converts a tensor to a flat `f32` vector.
pub fn tensor_to_vec(t: &Tensor) -> Vec<f32> {
    Vec::<f32>::try_from(&t.flatten(0, -1).to(tch::Device::Cpu))
        .expect("Failed to convert from Tensor to Vec")
}

/// Converts a tensor to a 1-d array.
pub fn tensor_to_array1(t: &Tensor) -> Array1<f32> {
    Array1::from(tensor_to_vec(t))
}

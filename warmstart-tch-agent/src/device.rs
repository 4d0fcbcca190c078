//! Serde-friendly device descriptor.
use serde::{Deserialize, Serialize};

/// Device on which networks and tensors are placed, as stored in agent
/// configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Device {
    /// CPU.
    Cpu,

    /// CUDA device with the given ordinal.
    Cuda(usize),
}

impl From<Device> for tch::Device {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => tch::Device::Cpu,
            Device::Cuda(n) => tch::Device::Cuda(n),
        }
    }
}

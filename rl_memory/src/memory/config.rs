//! Variant selection for memory modules.
//!
//! A policy definition picks its recurrent core by configuration:
//!
//! ```json
//! { "type": "AmrlMax", "input_size": 64, "memory_size": 128, "num_post_layers": 2 }
//! ```
//!
//! Omitted fields take the same defaults as the config constructors.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::amrl::{AmrlMax, AmrlMaxConfig};
use super::lstm::{LstmMemory, LstmMemoryConfig};
use super::MemoryModule;
use crate::error::Result;

pub(crate) mod defaults {
    use crate::nn::init::Initialization;

    pub fn num_layers() -> usize {
        1
    }

    pub fn forget_bias() -> f64 {
        1.0
    }

    pub fn kernel_init() -> Initialization {
        Initialization::XavierGlorotUniform
    }

    pub fn batch_first() -> bool {
        true
    }

    pub fn num_post_layers() -> usize {
        1
    }
}

/// Configuration of any memory-module variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MemoryModuleConfig {
    Lstm(LstmMemoryConfig),
    AmrlMax(AmrlMaxConfig),
}

impl MemoryModuleConfig {
    /// Initialize the configured variant.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MemoryModuleKind<B>> {
        match self {
            MemoryModuleConfig::Lstm(config) => config.init(device).map(MemoryModuleKind::Lstm),
            MemoryModuleConfig::AmrlMax(config) => {
                config.init(device).map(MemoryModuleKind::AmrlMax)
            }
        }
    }
}

impl From<LstmMemoryConfig> for MemoryModuleConfig {
    fn from(config: LstmMemoryConfig) -> Self {
        MemoryModuleConfig::Lstm(config)
    }
}

impl From<AmrlMaxConfig> for MemoryModuleConfig {
    fn from(config: AmrlMaxConfig) -> Self {
        MemoryModuleConfig::AmrlMax(config)
    }
}

/// Any memory-module variant, selected at runtime.
#[derive(Debug, Clone)]
pub enum MemoryModuleKind<B: Backend> {
    Lstm(LstmMemory<B>),
    AmrlMax(AmrlMax<B>),
}

impl<B: Backend> MemoryModule<B> for MemoryModuleKind<B> {
    fn memory_size(&self) -> usize {
        match self {
            MemoryModuleKind::Lstm(module) => module.memory_size(),
            MemoryModuleKind::AmrlMax(module) => module.memory_size(),
        }
    }

    fn num_layers(&self) -> usize {
        match self {
            MemoryModuleKind::Lstm(module) => module.num_layers(),
            MemoryModuleKind::AmrlMax(module) => module.num_layers(),
        }
    }

    fn forward(
        &self,
        input: Tensor<B, 3>,
        memories: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 3>)> {
        match self {
            MemoryModuleKind::Lstm(module) => module.forward(input, memories),
            MemoryModuleKind::AmrlMax(module) => module.forward(input, memories),
        }
    }
}

//! Memory modules: recurrent cores with a flat, carried memory tensor.
//!
//! A policy holds one memory module and threads its memory tensor through
//! successive calls. Each variant owns the layout of that tensor's last
//! dimension:
//!
//! ```text
//! LstmMemory:  [ hidden (H) | cell (H) ]
//! AmrlMax:     [ acc (H/2) | hidden (H) | cell (H) ]
//! ```
//!
//! Whatever a module returns as its memory is valid input to its next call.
//!
//! # Usage
//!
//! ```ignore
//! use rl_memory::memory::{MemoryModule, MemoryModuleConfig, AmrlMaxConfig};
//!
//! let memory = MemoryModuleConfig::AmrlMax(AmrlMaxConfig::new(obs_size, 128))
//!     .init::<Backend>(&device)?;
//!
//! let mut memories = memory.zero_memory(n_envs, &device);
//! for step in rollout {
//!     let (features, next) = memory.forward(step.observations, memories)?;
//!     memories = next;
//! }
//! ```

pub mod aggregation;
pub mod amrl;
pub mod config;
pub mod lstm;

#[cfg(test)]
mod tests;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{LayerError, Result};

pub use aggregation::{passthrough_max, running_max, Aggregation};
pub use amrl::{AmrlMax, AmrlMaxConfig, AmrlMaxOutput};
pub use config::{MemoryModuleConfig, MemoryModuleKind};
pub use lstm::{LstmMemory, LstmMemoryConfig};

/// A recurrent core that consumes a sequence and a memory tensor and
/// produces an output sequence and the next memory tensor.
pub trait MemoryModule<B: Backend> {
    /// Size of the memory tensor's last dimension required at the start of
    /// a sequence.
    fn memory_size(&self) -> usize;

    /// Pass a sequence through the module.
    ///
    /// # Arguments
    /// * `input` - [batch, time, input_size]
    /// * `memories` - [num_layers, batch, memory_size]
    ///
    /// # Returns
    /// * `output` - [batch, time, output_size]
    /// * `memories` - Same shape as the input memories
    fn forward(
        &self,
        input: Tensor<B, 3>,
        memories: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 3>)>;

    /// Leading dimension of the memory tensor.
    fn num_layers(&self) -> usize {
        1
    }

    /// Zeroed memory for the start of a sequence.
    fn zero_memory(&self, batch: usize, device: &B::Device) -> Tensor<B, 3> {
        Tensor::zeros([self.num_layers(), batch, self.memory_size()], device)
    }
}

/// Check the last (feature) dimension of an input sequence.
pub(crate) fn check_input_size(dims: [usize; 3], input_size: usize) -> Result<()> {
    if dims[2] != input_size {
        return Err(LayerError::shape_mismatch(
            "input feature size",
            [input_size],
            [dims[2]],
        ));
    }
    Ok(())
}

/// Check a memory tensor against [num_layers, batch, memory_size].
pub(crate) fn check_memories(
    dims: [usize; 3],
    num_layers: usize,
    batch: usize,
    memory_size: usize,
) -> Result<()> {
    let expected = [num_layers, batch, memory_size];
    if dims != expected {
        return Err(LayerError::shape_mismatch("memories", expected, dims));
    }
    Ok(())
}

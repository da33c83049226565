//! LSTM memory module.
//!
//! The memory tensor is split evenly between the hidden state and the cell
//! state, so the LSTM's hidden size is half the requested memory size.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::config::defaults;
use super::{check_input_size, check_memories, MemoryModule};
use crate::error::{LayerError, Result};
use crate::nn::init::Initialization;
use crate::nn::lstm::{GatedLstm, LstmLayerConfig, RecurrentState};

/// Configuration for [`LstmMemory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmMemoryConfig {
    /// Input feature size.
    pub input_size: usize,
    /// Requested memory size; the hidden size is half of it.
    pub memory_size: usize,
    #[serde(default = "defaults::num_layers")]
    pub num_layers: usize,
    #[serde(default = "defaults::forget_bias")]
    pub forget_bias: f64,
    #[serde(default = "defaults::kernel_init")]
    pub kernel_init: Initialization,
    #[serde(default)]
    pub bias_init: Initialization,
}

impl LstmMemoryConfig {
    /// Create a new configuration.
    pub fn new(input_size: usize, memory_size: usize) -> Self {
        Self {
            input_size,
            memory_size,
            num_layers: defaults::num_layers(),
            forget_bias: defaults::forget_bias(),
            kernel_init: defaults::kernel_init(),
            bias_init: Initialization::Zero,
        }
    }

    /// Set the number of stacked layers.
    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Set the constant added to the forget-gate biases.
    pub fn with_forget_bias(mut self, forget_bias: f64) -> Self {
        self.forget_bias = forget_bias;
        self
    }

    /// Set the weight initialization.
    pub fn with_kernel_init(mut self, init: Initialization) -> Self {
        self.kernel_init = init;
        self
    }

    /// Set the bias initialization.
    pub fn with_bias_init(mut self, init: Initialization) -> Self {
        self.bias_init = init;
        self
    }

    /// Initialize the module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LstmMemory<B>> {
        let hidden_size = self.memory_size / 2;
        if hidden_size == 0 {
            return Err(LayerError::invalid_config(
                "memory_size",
                format!("must be at least 2, got {}", self.memory_size),
            ));
        }
        if self.num_layers == 0 {
            return Err(LayerError::invalid_config("num_layers", "must be at least 1"));
        }

        let lstm = LstmLayerConfig::new(self.input_size, hidden_size)
            .with_num_layers(self.num_layers)
            .with_batch_first(true)
            .with_forget_bias(self.forget_bias)
            .with_kernel_init(self.kernel_init)
            .with_bias_init(self.bias_init)
            .init(device);

        tracing::debug!(
            input_size = self.input_size,
            hidden_size,
            memory_size = 2 * hidden_size,
            num_layers = self.num_layers,
            "initialized LSTM memory module"
        );

        Ok(LstmMemory { lstm, hidden_size })
    }
}

/// Memory module wrapping a batch-first LSTM.
///
/// Memory layout (last dim): `[0, H)` hidden state, `[H, 2H)` cell state.
#[derive(Module, Debug)]
pub struct LstmMemory<B: Backend> {
    lstm: GatedLstm<B>,
    hidden_size: usize,
}

impl<B: Backend> LstmMemory<B> {
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn lstm(&self) -> &GatedLstm<B> {
        &self.lstm
    }
}

impl<B: Backend> MemoryModule<B> for LstmMemory<B> {
    fn memory_size(&self) -> usize {
        2 * self.hidden_size
    }

    fn num_layers(&self) -> usize {
        self.lstm.num_layers()
    }

    fn forward(
        &self,
        input: Tensor<B, 3>,
        memories: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 3>)> {
        let dims = input.dims();
        check_input_size(dims, self.lstm.input_size())?;

        let [layers, batch, _] = memories.dims();
        check_memories(memories.dims(), self.num_layers(), dims[0], self.memory_size())?;

        let hidden = self.hidden_size;
        let h0 = memories.clone().slice([0..layers, 0..batch, 0..hidden]);
        let c0 = memories.slice([0..layers, 0..batch, hidden..2 * hidden]);

        let (output, state) = self.lstm.forward(input, Some(RecurrentState::new(h0, c0)));
        let memories = Tensor::cat(vec![state.hidden, state.cell], 2);

        Ok((output, memories))
    }
}

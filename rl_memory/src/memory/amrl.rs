//! AMRL-Max: LSTM with an order-invariant running-max aggregate.
//!
//! Implements the max aggregator from "AMRL: Aggregated Memory For
//! Reinforcement Learning" (Beck et al., ICLR 2020). Half of the LSTM's
//! output channels feed a running maximum over the whole history, carried
//! between calls as an accumulator in the memory tensor. A maximum does not
//! care about the order of the steps that did not set it, which keeps the
//! aggregate stable over long, noisy histories.
//!
//! ```text
//! memories: [ acc (half) | h0 (H) | c0 (H) ]        half = H / 2
//!
//! input ──► LSTM ──► [ h_half | other_half ]
//!                         │
//!          acc ──► cat ◄──┘
//!                   │
//!             running max ──► drop acc step ──► concat_c
//!
//! output = [ concat_c | other_half ]
//! ```

use burn::module::{Ignored, Module};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::aggregation::{running_max, Aggregation};
use super::config::defaults;
use super::{check_input_size, check_memories, MemoryModule};
use crate::error::{LayerError, Result};
use crate::nn::activation::Swish;
use crate::nn::init::Initialization;
use crate::nn::linear::{InitLinear, LinearLayerConfig};
use crate::nn::lstm::{GatedLstm, LstmLayerConfig, RecurrentState};

/// Configuration for [`AmrlMax`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmrlMaxConfig {
    /// Input feature size.
    pub input_size: usize,
    /// Requested memory size; the LSTM hidden size is half of it.
    pub memory_size: usize,
    #[serde(default = "defaults::num_layers")]
    pub num_layers: usize,
    #[serde(default = "defaults::batch_first")]
    pub batch_first: bool,
    #[serde(default = "defaults::forget_bias")]
    pub forget_bias: f64,
    #[serde(default = "defaults::kernel_init")]
    pub kernel_init: Initialization,
    #[serde(default)]
    pub bias_init: Initialization,
    /// Number of (linear, Swish) pairs applied after aggregation.
    #[serde(default = "defaults::num_post_layers")]
    pub num_post_layers: usize,
    /// Combinator of the running maximum.
    #[serde(default)]
    pub aggregation: Aggregation,
}

impl AmrlMaxConfig {
    /// Create a new configuration.
    pub fn new(input_size: usize, memory_size: usize) -> Self {
        Self {
            input_size,
            memory_size,
            num_layers: defaults::num_layers(),
            batch_first: defaults::batch_first(),
            forget_bias: defaults::forget_bias(),
            kernel_init: defaults::kernel_init(),
            bias_init: Initialization::Zero,
            num_post_layers: defaults::num_post_layers(),
            aggregation: Aggregation::Max,
        }
    }

    /// Set the number of stacked layers.
    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Set whether inputs are [batch, time, features].
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
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

    /// Set the number of (linear, Swish) post layers.
    pub fn with_num_post_layers(mut self, num_post_layers: usize) -> Self {
        self.num_post_layers = num_post_layers;
        self
    }

    /// Set the combinator of the running maximum.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Initialize the module.
    ///
    /// The hidden size (`memory_size / 2`) must be even and non-zero so the
    /// LSTM output splits into two equal halves.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<AmrlMax<B>> {
        let hidden_size = self.memory_size / 2;
        if hidden_size == 0 || hidden_size % 2 != 0 {
            return Err(LayerError::invalid_config(
                "memory_size",
                format!(
                    "memory_size / 2 must be even and non-zero, got {} / 2 = {}",
                    self.memory_size, hidden_size
                ),
            ));
        }
        if self.num_layers == 0 {
            return Err(LayerError::invalid_config("num_layers", "must be at least 1"));
        }

        let lstm = LstmLayerConfig::new(self.input_size, hidden_size)
            .with_num_layers(self.num_layers)
            .with_batch_first(self.batch_first)
            .with_forget_bias(self.forget_bias)
            .with_kernel_init(self.kernel_init)
            .with_bias_init(self.bias_init)
            .init(device);

        let post_layers = (0..self.num_post_layers)
            .map(|_| {
                LinearLayerConfig::new(hidden_size, hidden_size)
                    .with_kernel_init(Initialization::KaimingHeNormal)
                    .with_kernel_gain(1.0)
                    .init(device)
            })
            .collect();

        let module = AmrlMax {
            lstm,
            post_layers,
            activation: Swish::new(),
            hidden_size,
            aggregation: Ignored(self.aggregation),
        };

        tracing::debug!(
            input_size = self.input_size,
            hidden_size,
            memory_size = module.memory_size(),
            num_layers = self.num_layers,
            num_post_layers = self.num_post_layers,
            aggregation = ?self.aggregation,
            "initialized AMRL-Max memory module"
        );

        Ok(module)
    }
}

/// Everything computed by one AMRL-Max pass.
#[derive(Debug, Clone)]
pub struct AmrlMaxOutput<B: Backend> {
    /// Aggregated sequence [batch, time, H]; this is the module output.
    pub aggregated: Tensor<B, 3>,
    /// Aggregated sequence after the post layers [batch, time, H].
    pub post_processed: Tensor<B, 3>,
    /// Next memory tensor [num_layers, batch, memory_size].
    pub memories: Tensor<B, 3>,
}

/// AMRL-Max memory module.
///
/// Memory layout (last dim): `[0, half)` running-max accumulator,
/// `[half, half + H)` hidden state, `[half + H, half + 2H)` cell state.
#[derive(Module, Debug)]
pub struct AmrlMax<B: Backend> {
    lstm: GatedLstm<B>,
    post_layers: Vec<InitLinear<B>>,
    activation: Swish,
    hidden_size: usize,
    aggregation: Ignored<Aggregation>,
}

impl<B: Backend> AmrlMax<B> {
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Width of the accumulator, `hidden_size / 2`.
    pub fn half_size(&self) -> usize {
        self.hidden_size / 2
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation.0
    }

    /// The same module with a different running-max combinator. Forward
    /// values are identical; only the gradient routing changes.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Ignored(aggregation);
        self
    }

    pub fn lstm(&self) -> &GatedLstm<B> {
        &self.lstm
    }

    /// Run the module and return the aggregated output, the post-processed
    /// output and the next memories.
    ///
    /// An empty sequence returns the memories unchanged.
    pub fn forward_full(
        &self,
        input: Tensor<B, 3>,
        memories: Tensor<B, 3>,
    ) -> Result<AmrlMaxOutput<B>> {
        let dims = input.dims();
        check_input_size(dims, self.lstm.input_size())?;

        let batch_first = self.lstm.batch_first();
        let batch = if batch_first { dims[0] } else { dims[1] };
        let time = if batch_first { dims[1] } else { dims[0] };
        let layers = self.num_layers();
        check_memories(memories.dims(), layers, batch, self.memory_size())?;

        let hidden = self.hidden_size;
        if time == 0 {
            let shape = if batch_first {
                [batch, 0, hidden]
            } else {
                [0, batch, hidden]
            };
            let empty = Tensor::zeros(shape, &input.device());
            return Ok(AmrlMaxOutput {
                aggregated: empty.clone(),
                post_processed: empty,
                memories,
            });
        }

        let half = self.half_size();

        let acc = memories.clone().slice([0..layers, 0..batch, 0..half]);
        let h0 = memories
            .clone()
            .slice([0..layers, 0..batch, half..half + hidden]);
        let c0 = memories.slice([0..layers, 0..batch, half + hidden..half + 2 * hidden]);

        // Accumulator as prepended time steps: [batch, layers, half]
        let m = acc.swap_dims(0, 1);

        let (lstm_out, state) = self.lstm.forward(input, Some(RecurrentState::new(h0, c0)));
        let lstm_out = if batch_first {
            lstm_out
        } else {
            lstm_out.swap_dims(0, 1)
        };

        let total = layers + time;
        let h_half = lstm_out.clone().slice([0..batch, 0..time, 0..half]);
        let other_half = lstm_out.slice([0..batch, 0..time, half..hidden]);

        let running = running_max(Tensor::cat(vec![m, h_half], 1), self.aggregation.0);
        let acc_out = running
            .clone()
            .slice([0..batch, total - 1..total, 0..half]);
        // Drop the prepended accumulator steps
        let concat_c = running.slice([0..batch, layers..total, 0..half]);
        let concat_out = Tensor::cat(vec![concat_c, other_half], 2);

        let post_processed = self.post_process(concat_out.clone());

        // Back to [layers, batch, half]; every layer carries the same aggregate
        let acc_out = acc_out.swap_dims(0, 1);
        let acc_out = if layers > 1 {
            acc_out.repeat_dim(0, layers)
        } else {
            acc_out
        };
        let memories = Tensor::cat(vec![acc_out, state.hidden, state.cell], 2);

        let (aggregated, post_processed) = if batch_first {
            (concat_out, post_processed)
        } else {
            (concat_out.swap_dims(0, 1), post_processed.swap_dims(0, 1))
        };

        Ok(AmrlMaxOutput {
            aggregated,
            post_processed,
            memories,
        })
    }

    /// Apply the post layers independently at every step.
    fn post_process(&self, sequence: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, time, hidden] = sequence.dims();
        if time == 0 {
            return sequence;
        }

        let flat = sequence.reshape([batch * time, hidden]);
        let flat = self
            .post_layers
            .iter()
            .fold(flat, |x, layer| self.activation.forward(layer.forward(x)));
        flat.reshape([batch, time, hidden])
    }
}

impl<B: Backend> MemoryModule<B> for AmrlMax<B> {
    fn memory_size(&self) -> usize {
        self.hidden_size / 2 + 2 * self.hidden_size
    }

    fn num_layers(&self) -> usize {
        self.lstm.num_layers()
    }

    /// Returns the aggregated sequence (before the post layers) and the next
    /// memories. Use [`AmrlMax::forward_full`] for the post-processed output.
    fn forward(
        &self,
        input: Tensor<B, 3>,
        memories: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 3>)> {
        let output = self.forward_full(input, memories)?;
        Ok((output.aggregated, output.memories))
    }
}

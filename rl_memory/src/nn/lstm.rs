//! Multi-layer LSTM with fused, gate-block initialized parameters.
//!
//! Burn's `Lstm` keeps one gate controller per gate and a single layer. The
//! memory modules need the torch parameter layout instead: per layer, the
//! four gates are stacked along dim 0 of one weight tensor, in the order
//! input, forget, cell, output.
//!
//! ```text
//! weight_ih: [4 * hidden, input]    bias_ih: [4 * hidden]
//! weight_hh: [4 * hidden, hidden]   bias_hh: [4 * hidden]
//! ```
//!
//! LSTM equations, per step:
//! - gates = x W_ihᵀ + b_ih + h W_hhᵀ + b_hh
//! - i = σ(gates[0]), f = σ(gates[1]), g = tanh(gates[2]), o = σ(gates[3])
//! - c' = f ⊙ c + i ⊙ g
//! - h' = o ⊙ tanh(c')

use burn::module::{Module, Param};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::init::Initialization;

/// Number of gate blocks in every LSTM weight and bias tensor.
pub const NUM_GATES: usize = 4;

/// Index of the forget gate block.
pub const FORGET_GATE: usize = 1;

/// Carried state of a [`GatedLstm`], one row per layer.
#[derive(Debug, Clone)]
pub struct RecurrentState<B: Backend> {
    /// Hidden state [num_layers, batch, hidden]
    pub hidden: Tensor<B, 3>,
    /// Cell state [num_layers, batch, hidden]
    pub cell: Tensor<B, 3>,
}

impl<B: Backend> RecurrentState<B> {
    pub fn new(hidden: Tensor<B, 3>, cell: Tensor<B, 3>) -> Self {
        Self { hidden, cell }
    }

    /// Zero state for the given dimensions.
    pub fn zeros(num_layers: usize, batch: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([num_layers, batch, hidden_size], device),
            cell: Tensor::zeros([num_layers, batch, hidden_size], device),
        }
    }
}

/// Configuration for [`GatedLstm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmLayerConfig {
    /// Input feature size.
    pub input_size: usize,
    /// Hidden state size.
    pub hidden_size: usize,
    /// Number of stacked layers.
    pub num_layers: usize,
    /// Whether sequences are [batch, time, feature] (true) or
    /// [time, batch, feature] (false).
    pub batch_first: bool,
    /// Offset added to the forget gate bias block.
    pub forget_bias: f64,
    /// Scheme for every weight gate block.
    pub kernel_init: Initialization,
    /// Scheme for every bias gate block.
    pub bias_init: Initialization,
}

impl LstmLayerConfig {
    /// Create a single-layer, batch-first config with forget bias 1.0,
    /// Glorot-uniform weights and zero biases.
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            num_layers: 1,
            batch_first: true,
            forget_bias: 1.0,
            kernel_init: Initialization::XavierGlorotUniform,
            bias_init: Initialization::Zero,
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

    /// Initialize the LSTM.
    pub fn init<B: Backend>(&self, device: &B::Device) -> GatedLstm<B> {
        let gates = NUM_GATES * self.hidden_size;

        let layers = (0..self.num_layers)
            .map(|layer| {
                let layer_input = if layer == 0 {
                    self.input_size
                } else {
                    self.hidden_size
                };

                LstmLayer {
                    weight_ih: Param::from_tensor(gate_weight(
                        self.kernel_init,
                        [gates, layer_input],
                        device,
                    )),
                    weight_hh: Param::from_tensor(gate_weight(
                        self.kernel_init,
                        [gates, self.hidden_size],
                        device,
                    )),
                    bias_ih: Param::from_tensor(gate_bias(
                        self.bias_init,
                        self.forget_bias,
                        gates,
                        device,
                    )),
                    bias_hh: Param::from_tensor(gate_bias(
                        self.bias_init,
                        self.forget_bias,
                        gates,
                        device,
                    )),
                }
            })
            .collect();

        GatedLstm {
            layers,
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            batch_first: self.batch_first,
        }
    }
}

/// Build an LSTM whose gate blocks are initialized independently, with
/// `forget_bias` added to the forget gate bias like TensorFlow does.
#[allow(clippy::too_many_arguments)]
pub fn lstm_layer<B: Backend>(
    input_size: usize,
    hidden_size: usize,
    num_layers: usize,
    batch_first: bool,
    forget_bias: f64,
    kernel_init: Initialization,
    bias_init: Initialization,
    device: &B::Device,
) -> GatedLstm<B> {
    LstmLayerConfig::new(input_size, hidden_size)
        .with_num_layers(num_layers)
        .with_batch_first(batch_first)
        .with_forget_bias(forget_bias)
        .with_kernel_init(kernel_init)
        .with_bias_init(bias_init)
        .init(device)
}

/// Weight tensor whose 4 gate blocks along dim 0 are drawn independently.
fn gate_weight<B: Backend>(
    init: Initialization,
    shape: [usize; 2],
    device: &B::Device,
) -> Tensor<B, 2> {
    let block = [shape[0] / NUM_GATES, shape[1]];
    let blocks: Vec<Tensor<B, 2>> = (0..NUM_GATES)
        .map(|_| init.init_tensor(block, device))
        .collect();
    Tensor::cat(blocks, 0)
}

/// Bias tensor whose 4 gate blocks are drawn independently, with
/// `forget_bias` added to the forget block.
pub(crate) fn gate_bias<B: Backend>(
    init: Initialization,
    forget_bias: f64,
    len: usize,
    device: &B::Device,
) -> Tensor<B, 1> {
    let block = [len / NUM_GATES];
    let blocks: Vec<Tensor<B, 1>> = (0..NUM_GATES)
        .map(|idx| {
            let values: Tensor<B, 1> = init.init_tensor(block, device);
            if idx == FORGET_GATE {
                values + forget_bias
            } else {
                values
            }
        })
        .collect();
    Tensor::cat(blocks, 0)
}

/// Parameters of one LSTM layer.
#[derive(Module, Debug)]
pub struct LstmLayer<B: Backend> {
    /// Input-to-hidden weights [4 * hidden, input]
    pub weight_ih: Param<Tensor<B, 2>>,
    /// Hidden-to-hidden weights [4 * hidden, hidden]
    pub weight_hh: Param<Tensor<B, 2>>,
    /// Input-to-hidden bias [4 * hidden]
    pub bias_ih: Param<Tensor<B, 1>>,
    /// Hidden-to-hidden bias [4 * hidden]
    pub bias_hh: Param<Tensor<B, 1>>,
}

impl<B: Backend> LstmLayer<B> {
    /// Run one layer over a batch-first sequence.
    ///
    /// Returns the hidden state at every step and the final (h, c).
    fn forward_sequence(
        &self,
        input: Tensor<B, 3>,
        hidden: Tensor<B, 2>,
        cell: Tensor<B, 2>,
    ) -> (Tensor<B, 3>, Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, seq_len, d_input] = input.dims();
        let [gates, d_hidden] = self.weight_hh.val().dims();

        // Input projections for every step at once: [batch, seq_len, 4 * hidden]
        let bias = (self.bias_ih.val() + self.bias_hh.val()).unsqueeze_dim(0);
        let projected = (input
            .reshape([batch * seq_len, d_input])
            .matmul(self.weight_ih.val().transpose())
            + bias)
            .reshape([batch, seq_len, gates]);
        let weight_hh = self.weight_hh.val().transpose();

        let mut h = hidden;
        let mut c = cell;
        let mut outputs: Vec<Tensor<B, 3>> = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let gates_t = projected
                .clone()
                .slice([0..batch, t..t + 1, 0..gates])
                .reshape([batch, gates])
                + h.clone().matmul(weight_hh.clone());

            let block = |idx: usize| {
                gates_t
                    .clone()
                    .slice([0..batch, idx * d_hidden..(idx + 1) * d_hidden])
            };
            let input_gate = sigmoid(block(0));
            let forget_gate = sigmoid(block(FORGET_GATE));
            let cell_gate = block(2).tanh();
            let output_gate = sigmoid(block(3));

            c = forget_gate * c + input_gate * cell_gate;
            h = output_gate * c.clone().tanh();

            outputs.push(h.clone().reshape([batch, 1, d_hidden]));
        }

        (Tensor::cat(outputs, 1), h, c)
    }
}

/// Stacked LSTM operating on whole sequences.
#[derive(Module, Debug)]
pub struct GatedLstm<B: Backend> {
    pub layers: Vec<LstmLayer<B>>,
    input_size: usize,
    hidden_size: usize,
    batch_first: bool,
}

impl<B: Backend> GatedLstm<B> {
    /// Run the LSTM over a sequence.
    ///
    /// # Arguments
    /// * `input` - [batch, time, input_size] when batch-first, otherwise
    ///   [time, batch, input_size]
    /// * `state` - Initial state [num_layers, batch, hidden]; zeros if `None`
    ///
    /// # Returns
    /// * `output` - Last layer's hidden state at every step, in the same
    ///   layout as `input`
    /// * `state` - Final state of every layer
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, RecurrentState<B>) {
        let input = if self.batch_first {
            input
        } else {
            input.swap_dims(0, 1)
        };
        let [batch, seq_len, _] = input.dims();
        let device = input.device();
        let num_layers = self.num_layers();

        let state = state.unwrap_or_else(|| {
            RecurrentState::zeros(num_layers, batch, self.hidden_size, &device)
        });

        if seq_len == 0 {
            let empty = Tensor::zeros([batch, 0, self.hidden_size], &device);
            return (self.to_caller_layout(empty), state);
        }

        let mut layer_input = input;
        let mut hidden_out = Vec::with_capacity(num_layers);
        let mut cell_out = Vec::with_capacity(num_layers);

        for (idx, layer) in self.layers.iter().enumerate() {
            let h0 = state
                .hidden
                .clone()
                .slice([idx..idx + 1, 0..batch, 0..self.hidden_size])
                .reshape([batch, self.hidden_size]);
            let c0 = state
                .cell
                .clone()
                .slice([idx..idx + 1, 0..batch, 0..self.hidden_size])
                .reshape([batch, self.hidden_size]);

            let (output, h, c) = layer.forward_sequence(layer_input, h0, c0);

            hidden_out.push(h.reshape([1, batch, self.hidden_size]));
            cell_out.push(c.reshape([1, batch, self.hidden_size]));
            layer_input = output;
        }

        let final_state = RecurrentState::new(Tensor::cat(hidden_out, 0), Tensor::cat(cell_out, 0));
        (self.to_caller_layout(layer_input), final_state)
    }

    /// The same LSTM, reading and writing sequences in the given layout.
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    fn to_caller_layout(&self, output: Tensor<B, 3>) -> Tensor<B, 3> {
        if self.batch_first {
            output
        } else {
            output.swap_dims(0, 1)
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn batch_first(&self) -> bool {
        self.batch_first
    }
}

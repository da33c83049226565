//! Fully-connected layer with a selectable initialization scheme.
//!
//! # Usage
//!
//! ```ignore
//! use rl_memory::nn::{Initialization, LinearLayerConfig};
//!
//! let linear: InitLinear<Backend> = LinearLayerConfig::new(64, 32)
//!     .with_kernel_init(Initialization::KaimingHeNormal)
//!     .with_kernel_gain(0.1)
//!     .init(&device);
//!
//! let output = linear.forward(input);
//! ```

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::init::Initialization;

/// Configuration for [`InitLinear`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearLayerConfig {
    /// Number of input features.
    pub input_size: usize,
    /// Number of output features.
    pub output_size: usize,
    /// Scheme used for the weight matrix.
    #[serde(default = "default_kernel_init")]
    pub kernel_init: Initialization,
    /// Multiplier applied to the weights after initialization.
    #[serde(default = "default_kernel_gain")]
    pub kernel_gain: f64,
    /// Scheme used for the bias vector.
    #[serde(default)]
    pub bias_init: Initialization,
}

fn default_kernel_init() -> Initialization {
    Initialization::XavierGlorotUniform
}

fn default_kernel_gain() -> f64 {
    1.0
}

impl LinearLayerConfig {
    /// Create a new configuration with Glorot-uniform weights, gain 1.0 and
    /// zero bias.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            output_size,
            kernel_init: default_kernel_init(),
            kernel_gain: default_kernel_gain(),
            bias_init: Initialization::Zero,
        }
    }

    /// Set the weight initialization.
    pub fn with_kernel_init(mut self, init: Initialization) -> Self {
        self.kernel_init = init;
        self
    }

    /// Set the weight multiplier. A gain of 0.1 with `KaimingHeNormal`
    /// matches TensorFlow's `variance_scaling(0.01)`.
    pub fn with_kernel_gain(mut self, gain: f64) -> Self {
        self.kernel_gain = gain;
        self
    }

    /// Set the bias initialization.
    pub fn with_bias_init(mut self, init: Initialization) -> Self {
        self.bias_init = init;
        self
    }

    /// Initialize the layer.
    pub fn init<B: Backend>(&self, device: &B::Device) -> InitLinear<B> {
        let weight: Tensor<B, 2> = self
            .kernel_init
            .init_tensor([self.output_size, self.input_size], device)
            * self.kernel_gain;
        let bias: Tensor<B, 1> = self.bias_init.init_tensor([self.output_size], device);

        InitLinear {
            weight: Param::from_tensor(weight),
            bias: Param::from_tensor(bias),
            input_size: self.input_size,
            output_size: self.output_size,
        }
    }
}

/// Build a fully-connected layer.
///
/// Weight shape is `[output_size, input_size]`, bias shape `[output_size]`.
pub fn linear_layer<B: Backend>(
    input_size: usize,
    output_size: usize,
    kernel_init: Initialization,
    kernel_gain: f64,
    bias_init: Initialization,
    device: &B::Device,
) -> InitLinear<B> {
    LinearLayerConfig::new(input_size, output_size)
        .with_kernel_init(kernel_init)
        .with_kernel_gain(kernel_gain)
        .with_bias_init(bias_init)
        .init(device)
}

/// Linear layer `y = xWᵀ + b` whose parameters were filled by an
/// [`Initialization`] scheme.
#[derive(Module, Debug)]
pub struct InitLinear<B: Backend> {
    /// Weight matrix of shape [output_size, input_size]
    pub weight: Param<Tensor<B, 2>>,
    /// Bias of shape [output_size]
    pub bias: Param<Tensor<B, 1>>,
    input_size: usize,
    output_size: usize,
}

impl<B: Backend> InitLinear<B> {
    /// Forward pass for input of shape [batch, input_size].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        input.matmul(self.weight.val().transpose()) + self.bias.val().unsqueeze_dim(0)
    }

    /// Forward pass for input of shape [batch, seq_len, input_size],
    /// applied independently at every step.
    pub fn forward_3d(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, _] = input.dims();
        let output = self.forward(input.reshape([batch * seq, self.input_size]));
        output.reshape([batch, seq, self.output_size])
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_default_linear_shapes() {
        let device = Default::default();
        let linear: InitLinear<TestBackend> = LinearLayerConfig::new(4, 8).init(&device);

        assert_eq!(linear.weight.val().dims(), [8, 4]);
        assert_eq!(linear.bias.val().dims(), [8]);

        let output = linear.forward(Tensor::zeros([1, 4], &device));
        assert_eq!(output.dims(), [1, 8]);
    }

    #[test]
    fn test_zero_input_yields_bias() {
        let device = Default::default();
        let linear: InitLinear<TestBackend> = LinearLayerConfig::new(3, 5).init(&device);
        let output = linear.forward(Tensor::zeros([2, 3], &device));
        let data = output.into_data().to_vec::<f32>().unwrap();
        assert!(data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_kernel_gain_scales_weights() {
        let device = Default::default();
        let linear: InitLinear<TestBackend> = linear_layer(
            16,
            16,
            Initialization::XavierGlorotUniform,
            0.0,
            Initialization::Zero,
            &device,
        );
        let data = linear.weight.val().into_data().to_vec::<f32>().unwrap();
        assert!(data.iter().all(|v| *v == 0.0));

        let bound = (6.0f32 / 32.0).sqrt() * 0.5;
        let linear: InitLinear<TestBackend> = linear_layer(
            16,
            16,
            Initialization::XavierGlorotUniform,
            0.5,
            Initialization::Zero,
            &device,
        );
        let data = linear.weight.val().into_data().to_vec::<f32>().unwrap();
        assert!(data.iter().all(|v| v.abs() <= bound + 1e-6));
    }

    #[test]
    fn test_forward_3d_matches_forward() {
        let device = Default::default();
        let linear: InitLinear<TestBackend> = LinearLayerConfig::new(4, 3)
            .with_bias_init(Initialization::KaimingHeUniform)
            .init(&device);

        let input =
            Tensor::<TestBackend, 3>::random([2, 5, 4], Distribution::Normal(0.0, 1.0), &device);
        let out_3d = linear.forward_3d(input.clone());
        assert_eq!(out_3d.dims(), [2, 5, 3]);

        let out_2d = linear.forward(input.reshape([10, 4])).reshape([2, 5, 3]);
        let diff: f32 = (out_3d - out_2d).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: LinearLayerConfig =
            serde_json::from_str(r#"{"input_size": 4, "output_size": 8}"#).unwrap();
        assert_eq!(config, LinearLayerConfig::new(4, 8));
    }
}

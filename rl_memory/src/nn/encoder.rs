//! Feed-forward encoder: a stack of Kaiming-initialized linear layers, each
//! followed by Swish.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::activation::Swish;
use super::init::Initialization;
use super::linear::{InitLinear, LinearLayerConfig};
use crate::error::{LayerError, Result};

/// Configuration for [`LinearEncoder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEncoderConfig {
    /// Input feature size.
    pub input_size: usize,
    /// Number of linear + Swish pairs.
    pub num_layers: usize,
    /// Width of every layer output.
    pub hidden_size: usize,
}

impl LinearEncoderConfig {
    /// Create a new configuration.
    pub fn new(input_size: usize, num_layers: usize, hidden_size: usize) -> Self {
        Self {
            input_size,
            num_layers,
            hidden_size,
        }
    }

    /// Initialize the encoder.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LinearEncoder<B>> {
        if self.num_layers == 0 {
            return Err(LayerError::invalid_config(
                "num_layers",
                "encoder needs at least one layer",
            ));
        }

        let layers = (0..self.num_layers)
            .map(|idx| {
                let input_size = if idx == 0 {
                    self.input_size
                } else {
                    self.hidden_size
                };
                LinearLayerConfig::new(input_size, self.hidden_size)
                    .with_kernel_init(Initialization::KaimingHeNormal)
                    .with_kernel_gain(1.0)
                    .init(device)
            })
            .collect();

        tracing::debug!(
            input_size = self.input_size,
            hidden_size = self.hidden_size,
            num_layers = self.num_layers,
            "initialized linear encoder"
        );

        Ok(LinearEncoder {
            layers,
            activation: Swish::new(),
        })
    }
}

/// Stateless feed-forward encoder.
#[derive(Module, Debug)]
pub struct LinearEncoder<B: Backend> {
    layers: Vec<InitLinear<B>>,
    activation: Swish,
}

impl<B: Backend> LinearEncoder<B> {
    /// Forward pass for input of shape [batch, input_size].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.layers
            .iter()
            .fold(input, |x, layer| self.activation.forward(layer.forward(x)))
    }

    /// Forward pass for input of shape [batch, seq_len, input_size].
    pub fn forward_3d(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        self.layers
            .iter()
            .fold(input, |x, layer| self.activation.forward(layer.forward_3d(x)))
    }

    pub fn layers(&self) -> &[InitLinear<B>] {
        &self.layers
    }
}

//! Swish (self-gated) activation: `x * sigmoid(x)`.

use burn::module::Module;
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Apply Swish element-wise.
pub fn swish<B: Backend, const D: usize>(input: Tensor<B, D>) -> Tensor<B, D> {
    input.clone() * sigmoid(input)
}

/// Parameterless Swish module, for use inside layer stacks.
#[derive(Module, Clone, Debug, Default)]
pub struct Swish;

impl Swish {
    pub fn new() -> Self {
        Self
    }

    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        swish(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_swish_values() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 1>::from_floats([-2.0, 0.0, 1.0, 3.0], &device);
        let output = Swish::new().forward(input).into_data().to_vec::<f32>().unwrap();

        let expected: Vec<f32> = [-2.0f32, 0.0, 1.0, 3.0]
            .iter()
            .map(|x| x / (1.0 + (-x).exp()))
            .collect();

        for (got, want) in output.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }
}

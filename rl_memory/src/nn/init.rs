//! Named weight initialization schemes.
//!
//! Each [`Initialization`] maps to one fill procedure. The mapping is a plain
//! `match`, so every scheme always has a procedure.
//!
//! # Variance scaling
//!
//! | Scheme                | Distribution                          |
//! |-----------------------|---------------------------------------|
//! | `Zero`                | all zeros                             |
//! | `XavierGlorotNormal`  | N(0, sqrt(2 / (fan_in + fan_out)))    |
//! | `XavierGlorotUniform` | U(-a, a), a = sqrt(6 / (fan_in + fan_out)) |
//! | `KaimingHeNormal`     | N(0, sqrt(2 / fan_in))                |
//! | `KaimingHeUniform`    | U(-b, b), b = sqrt(6 / fan_in)        |
//!
//! Note: TensorFlow's `variance_scaling` with scale 0.01 corresponds to
//! `KaimingHeNormal` with a kernel gain of 0.1.
//!
//! # References
//!
//! - Glorot & Bengio, "Understanding the difficulty of training deep
//!   feedforward neural networks" (2010)
//! - He et al., "Delving Deep into Rectifiers" (2015)

use std::fmt;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};
use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// Weight initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Initialization {
    /// All zeros.
    #[default]
    Zero,
    /// Glorot normal.
    XavierGlorotNormal,
    /// Glorot uniform.
    XavierGlorotUniform,
    /// He normal, also known as variance scaling.
    KaimingHeNormal,
    /// He uniform.
    KaimingHeUniform,
}

impl Initialization {
    /// Every supported scheme.
    pub const ALL: [Initialization; 5] = [
        Initialization::Zero,
        Initialization::XavierGlorotNormal,
        Initialization::XavierGlorotUniform,
        Initialization::KaimingHeNormal,
        Initialization::KaimingHeUniform,
    ];

    /// Canonical name of the scheme.
    pub fn name(&self) -> &'static str {
        match self {
            Initialization::Zero => "Zero",
            Initialization::XavierGlorotNormal => "XavierGlorotNormal",
            Initialization::XavierGlorotUniform => "XavierGlorotUniform",
            Initialization::KaimingHeNormal => "KaimingHeNormal",
            Initialization::KaimingHeUniform => "KaimingHeUniform",
        }
    }

    /// Create a tensor of the given shape filled according to this scheme.
    ///
    /// Fans are computed from the shape the way torch does for weights:
    /// dim 1 is the fan-in and dim 0 the fan-out, each scaled by the product
    /// of any trailing dims. Rank-1 tensors use their length for both.
    pub fn init_tensor<B: Backend, const D: usize>(
        &self,
        shape: [usize; D],
        device: &B::Device,
    ) -> Tensor<B, D> {
        let (fan_in, fan_out) = fans(&shape);

        match self {
            Initialization::Zero => Tensor::zeros(shape, device),
            Initialization::XavierGlorotNormal => {
                let std = (2.0 / (fan_in + fan_out) as f64).sqrt();
                Tensor::random(shape, Distribution::Normal(0.0, std), device)
            }
            Initialization::XavierGlorotUniform => {
                let a = (6.0 / (fan_in + fan_out) as f64).sqrt();
                Tensor::random(shape, Distribution::Uniform(-a, a), device)
            }
            Initialization::KaimingHeNormal => {
                let std = (2.0 / fan_in as f64).sqrt();
                Tensor::random(shape, Distribution::Normal(0.0, std), device)
            }
            Initialization::KaimingHeUniform => {
                let bound = (6.0 / fan_in as f64).sqrt();
                Tensor::random(shape, Distribution::Uniform(-bound, bound), device)
            }
        }
    }
}

/// Compute (fan_in, fan_out) for a weight shape. Never returns zero.
fn fans(shape: &[usize]) -> (usize, usize) {
    let (fan_in, fan_out) = match shape {
        [] => (1, 1),
        [n] => (*n, *n),
        [out, inp, rest @ ..] => {
            let receptive: usize = rest.iter().product();
            (inp * receptive, out * receptive)
        }
    };
    (fan_in.max(1), fan_out.max(1))
}

impl fmt::Display for Initialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Initialization {
    type Err = LayerError;

    /// Accepts the canonical name in any case, with or without underscores
    /// (`"KaimingHeNormal"`, `"kaiming_he_normal"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        Initialization::ALL
            .into_iter()
            .find(|init| init.name().to_lowercase() == normalized)
            .ok_or_else(|| LayerError::UnknownInitialization(s.to_string()))
    }
}

//! Neural network building blocks for recurrent policies.
//!
//! # Modules
//!
//! - [`init`]: Named weight initialization schemes
//! - [`linear`]: Fully-connected layer with selectable initialization
//! - [`lstm`]: Multi-layer LSTM with gate-block initialization and forget bias
//! - [`activation`]: Swish self-gated activation
//! - [`encoder`]: Feed-forward encoder stack

pub mod activation;
pub mod encoder;
pub mod init;
pub mod linear;
pub mod lstm;

pub use activation::{swish, Swish};
pub use encoder::{LinearEncoder, LinearEncoderConfig};
pub use init::Initialization;
pub use linear::{linear_layer, InitLinear, LinearLayerConfig};
pub use lstm::{lstm_layer, GatedLstm, LstmLayer, LstmLayerConfig, RecurrentState};

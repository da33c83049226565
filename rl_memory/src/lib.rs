//! # rl_memory: Recurrent Memory Modules for RL Policies
//!
//! Layers and memory modules for recurrent reinforcement-learning policies,
//! built on Burn and generic over the backend.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Policy network (caller)                  │
//! │                                                              │
//! │  observations ──► LinearEncoder ──► MemoryModule ──► heads   │
//! │                                        ▲    │                │
//! │                                        │    ▼                │
//! │                                   memory tensor              │
//! │                               (carried between calls)        │
//! └──────────────────────────────────────────────────────────────┘
//!
//!  MemoryModule variants
//!  ├── LstmMemory   [ h | c ]
//!  └── AmrlMax      [ acc | h | c ]   running max over history
//!
//!  Layer factory
//!  ├── InitLinear   (Initialization scheme + kernel gain)
//!  └── GatedLstm    (per-gate-block init + forget bias)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rl_memory::{AmrlMaxConfig, MemoryModule};
//!
//! let memory = AmrlMaxConfig::new(64, 128)
//!     .with_num_post_layers(1)
//!     .init::<MyBackend>(&device)?;
//!
//! let memories = memory.zero_memory(batch_size, &device);
//! let (features, memories) = memory.forward(sequence, memories)?;
//! ```

pub mod error;
pub mod memory;
pub mod nn;

pub use error::{LayerError, Result};

pub use nn::{
    linear_layer, lstm_layer, swish, GatedLstm, InitLinear, Initialization, LinearEncoder,
    LinearEncoderConfig, LinearLayerConfig, LstmLayerConfig, RecurrentState, Swish,
};

pub use memory::{
    passthrough_max, running_max, Aggregation, AmrlMax, AmrlMaxConfig, AmrlMaxOutput,
    LstmMemory, LstmMemoryConfig, MemoryModule, MemoryModuleConfig, MemoryModuleKind,
};

//! Behavioral tests for the memory-module contract.
//!
//! Covers the carried-memory invariants shared by every variant and the
//! running-max properties AMRL-Max relies on.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};

use crate::memory::{
    running_max, Aggregation, AmrlMaxConfig, LstmMemoryConfig, MemoryModule, MemoryModuleConfig,
};
use crate::nn::linear::LinearLayerConfig;

type TestBackend = NdArray<f32>;

fn max_abs_diff(a: Tensor<TestBackend, 3>, b: Tensor<TestBackend, 3>) -> f32 {
    (a - b).abs().max().into_scalar()
}

fn to_tensor(data: &[f32], time: usize, channels: usize) -> Tensor<TestBackend, 3> {
    Tensor::<TestBackend, 1>::from_floats(data, &Default::default()).reshape([1, time, channels])
}

// ============================================================================
// End-to-end examples
// ============================================================================

#[test]
fn test_linear_layer_default_example() {
    let device = Default::default();
    let linear = LinearLayerConfig::new(4, 8).init::<TestBackend>(&device);

    assert_eq!(linear.weight.val().dims(), [8, 4]);
    assert_eq!(linear.bias.val().dims(), [8]);
    assert_eq!(linear.forward(Tensor::zeros([1, 4], &device)).dims(), [1, 8]);
}

#[test]
fn test_lstm_memory_example() {
    let device = Default::default();
    let module = LstmMemoryConfig::new(3, 16).init::<TestBackend>(&device).unwrap();
    assert_eq!(module.memory_size(), 16);

    let input = Tensor::random([2, 5, 3], Distribution::Normal(0.0, 1.0), &device);
    let (output, memories) = module
        .forward(input, Tensor::zeros([1, 2, 16], &device))
        .unwrap();

    assert_eq!(output.dims(), [2, 5, 8]);
    assert_eq!(memories.dims(), [1, 2, 16]);
}

// ============================================================================
// Carried memory
// ============================================================================

/// Feeding returned memories back with an empty continuation leaves them
/// unchanged.
#[test]
fn test_empty_continuation_reproduces_memories() {
    let device = Default::default();
    let configs: [MemoryModuleConfig; 2] = [
        LstmMemoryConfig::new(3, 16).into(),
        AmrlMaxConfig::new(3, 16).into(),
    ];

    for config in configs {
        let module = config.init::<TestBackend>(&device).unwrap();
        let input = Tensor::random([2, 5, 3], Distribution::Normal(0.0, 1.0), &device);
        let (_, memories) = module.forward(input, module.zero_memory(2, &device)).unwrap();

        let (output, again) = module
            .forward(Tensor::zeros([2, 0, 3], &device), memories.clone())
            .unwrap();

        assert_eq!(output.dims()[1], 0);
        assert!(max_abs_diff(memories, again) < 1e-7, "{config:?}");
    }
}

/// Forward passes add no randomness.
#[test]
fn test_forward_is_deterministic() {
    let device = Default::default();
    let module = AmrlMaxConfig::new(3, 16).init::<TestBackend>(&device).unwrap();
    let input =
        Tensor::<TestBackend, 3>::random([2, 5, 3], Distribution::Normal(0.0, 1.0), &device);
    let memories =
        Tensor::<TestBackend, 3>::random([1, 2, 20], Distribution::Normal(0.0, 1.0), &device);

    let (out_a, mem_a) = module.forward(input.clone(), memories.clone()).unwrap();
    let (out_b, mem_b) = module.forward(input, memories).unwrap();

    assert_eq!(max_abs_diff(out_a, out_b), 0.0);
    assert_eq!(max_abs_diff(mem_a, mem_b), 0.0);
}

/// The returned memory is always an acceptable input memory.
#[test]
fn test_memories_thread_through_many_calls() {
    let device = Default::default();
    let configs: [MemoryModuleConfig; 2] = [
        LstmMemoryConfig::new(4, 12).with_num_layers(2).into(),
        AmrlMaxConfig::new(4, 12).with_num_layers(2).into(),
    ];

    for config in configs {
        let module = config.init::<TestBackend>(&device).unwrap();
        let mut memories = module.zero_memory(3, &device);
        let expected = memories.dims();

        for _ in 0..4 {
            let input = Tensor::random([3, 2, 4], Distribution::Normal(0.0, 1.0), &device);
            let (_, next) = module.forward(input, memories).unwrap();
            assert_eq!(next.dims(), expected);
            memories = next;
        }
    }
}

#[test]
fn test_amrl_memory_size_formula() {
    let device = Default::default();
    for hidden in [2usize, 4, 6, 10, 32] {
        let module = AmrlMaxConfig::new(5, 2 * hidden).init::<TestBackend>(&device).unwrap();
        assert_eq!(module.memory_size(), hidden / 2 + 2 * hidden);
    }
}

#[test]
fn test_passthrough_aggregation_keeps_forward_values() {
    let device = Default::default();
    let plain = AmrlMaxConfig::new(3, 8).init::<TestBackend>(&device).unwrap();
    let passthrough = plain.clone().with_aggregation(Aggregation::PassthroughMax);

    let input =
        Tensor::<TestBackend, 3>::random([2, 6, 3], Distribution::Normal(0.0, 1.0), &device);
    let memories = plain.zero_memory(2, &device);

    let (out_a, mem_a) = plain.forward(input.clone(), memories.clone()).unwrap();
    let (out_b, mem_b) = passthrough.forward(input, memories).unwrap();

    assert!(max_abs_diff(out_a, out_b) < 1e-6);
    assert!(max_abs_diff(mem_a, mem_b) < 1e-6);
}

// ============================================================================
// Running-max properties
// ============================================================================

mod proptest_running_max {
    use super::*;
    use proptest::prelude::*;

    const CHANNELS: usize = 3;

    fn sequence() -> impl Strategy<Value = (Vec<f32>, usize)> {
        (1usize..12).prop_flat_map(|time| {
            (
                prop::collection::vec(-50.0f32..50.0, time * CHANNELS),
                Just(time),
            )
        })
    }

    /// A sequence together with a permutation of its time steps.
    fn shuffled_sequence() -> impl Strategy<Value = (Vec<f32>, usize, Vec<usize>)> {
        (1usize..12).prop_flat_map(|time| {
            (
                prop::collection::vec(-50.0f32..50.0, time * CHANNELS),
                Just(time),
                Just((0..time).collect::<Vec<_>>()).prop_shuffle(),
            )
        })
    }

    fn final_step(sequence: Tensor<TestBackend, 3>, time: usize) -> Vec<f32> {
        running_max(sequence, Aggregation::Max)
            .slice([0..1, time - 1..time, 0..CHANNELS])
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    proptest! {
        /// Property: the running max never decreases along time.
        #[test]
        fn test_running_max_is_monotonic((data, time) in sequence()) {
            let result = running_max(to_tensor(&data, time, CHANNELS), Aggregation::Max)
                .into_data()
                .to_vec::<f32>()
                .unwrap();

            for t in 1..time {
                for c in 0..CHANNELS {
                    let prev = result[(t - 1) * CHANNELS + c];
                    let next = result[t * CHANNELS + c];
                    prop_assert!(
                        next >= prev,
                        "channel {} decreased at step {}: {} -> {}",
                        c,
                        t,
                        prev,
                        next
                    );
                }
            }
        }

        /// Property: each step holds the maximum of everything seen so far.
        #[test]
        fn test_running_max_matches_prefix_max((data, time) in sequence()) {
            let result = running_max(to_tensor(&data, time, CHANNELS), Aggregation::Max)
                .into_data()
                .to_vec::<f32>()
                .unwrap();

            for c in 0..CHANNELS {
                let mut best = f32::NEG_INFINITY;
                for t in 0..time {
                    best = best.max(data[t * CHANNELS + c]);
                    prop_assert_eq!(result[t * CHANNELS + c], best);
                }
            }
        }

        /// Property: reordering the steps after a prepended accumulator does
        /// not change the final aggregate.
        #[test]
        fn test_final_aggregate_is_order_invariant(
            (data, time, order) in shuffled_sequence(),
            acc in prop::collection::vec(-50.0f32..50.0, CHANNELS),
        ) {
            let permuted: Vec<f32> = order
                .iter()
                .flat_map(|&t| data[t * CHANNELS..(t + 1) * CHANNELS].to_vec())
                .collect();

            let with_acc = |steps: &[f32]| {
                let mut all = acc.clone();
                all.extend_from_slice(steps);
                to_tensor(&all, time + 1, CHANNELS)
            };

            let original = final_step(with_acc(&data), time + 1);
            let shuffled = final_step(with_acc(&permuted), time + 1);
            prop_assert_eq!(original, shuffled);
        }

        /// Property: the pass-through combinator has the same forward values.
        #[test]
        fn test_passthrough_running_max_matches_plain((data, time) in sequence()) {
            let plain = running_max(to_tensor(&data, time, CHANNELS), Aggregation::Max)
                .into_data()
                .to_vec::<f32>()
                .unwrap();
            let sequence = to_tensor(&data, time, CHANNELS);
            let passthrough = running_max(sequence, Aggregation::PassthroughMax)
                .into_data()
                .to_vec::<f32>()
                .unwrap();
            prop_assert_eq!(plain, passthrough);
        }
    }
}

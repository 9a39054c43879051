/// Validation tests across modules.
///
/// These tests verify:
/// 1. **Round-trip correctness** through every entry point (in-memory,
///    seekable streams, symbol-level encoder/decoder)
/// 2. **Encoder/decoder symmetry** - both sides hold identical trees after
///    every symbol
/// 3. **Tree invariants** - sibling property, monotonic weights and NYT
///    uniqueness at every observation point
/// 4. **Edge cases** - empty input, single bytes, full alphabet
#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::bitio::BitOrder;
    use crate::codec::{self, Decoder, Encoder};
    use crate::observer::TreeObserver;
    use crate::tree::{AdaptiveTree, NodeId, ALPHABET_SIZE};

    // ---------------------------------------------------------------
    // Helper: generate diverse test vectors
    // ---------------------------------------------------------------

    /// Highly compressible: single byte repeated.
    fn data_all_zeros(n: usize) -> Vec<u8> {
        vec![0u8; n]
    }

    /// Every byte value once.
    fn data_uniform() -> Vec<u8> {
        (0..=255u8).collect()
    }

    /// Skewed distribution: 90% one byte, 10% another.
    fn data_skewed(n: usize) -> Vec<u8> {
        (0..n).map(|i| if i % 10 == 0 { 1 } else { 0 }).collect()
    }

    /// Repetitive text with structure.
    fn data_repeating_text() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. ".repeat(100)
    }

    /// Sawtooth over the whole alphabet, repeated.
    fn data_sawtooth(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 256) as u8).collect()
    }

    /// Long runs of slowly changing symbols.
    fn data_runs() -> Vec<u8> {
        let mut v = Vec::new();
        for i in 0..50u8 {
            for _ in 0..(256 - i as usize * 4).max(1) {
                v.push(i);
            }
        }
        v
    }

    /// Full alphabet followed by a heavy repeat of one symbol.
    fn data_alphabet_then_zeros() -> Vec<u8> {
        let mut v = data_uniform();
        v.extend(std::iter::repeat(0u8).take(44));
        v
    }

    /// Pseudo-random bytes from a fixed LCG.
    fn data_lcg(n: usize) -> Vec<u8> {
        let mut state = 0x2545_f491u32;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // 1. Round-trip through every entry point
    // ---------------------------------------------------------------

    macro_rules! round_trip_test {
        ($name:ident, $data:expr) => {
            mod $name {
                use super::*;

                #[test]
                fn in_memory() {
                    let input = $data;
                    let packed = codec::compress_bytes(&input).unwrap();
                    assert_eq!(&packed[..4], &(input.len() as u32).to_le_bytes());
                    let unpacked = codec::decompress_bytes(&packed).unwrap();
                    assert_eq!(unpacked, input, "in-memory round-trip failed");
                }

                #[test]
                fn streams() {
                    let input = $data;
                    let mut packed = Vec::new();
                    let written = codec::compress(Cursor::new(&input), &mut packed).unwrap();
                    assert_eq!(written, packed.len() as u64);
                    let mut unpacked = Vec::new();
                    let n = codec::decompress(Cursor::new(&packed), &mut unpacked).unwrap();
                    assert_eq!(n, input.len() as u64);
                    assert_eq!(unpacked, input, "stream round-trip failed");
                }

                #[test]
                fn symmetric_trees() {
                    let input = $data;
                    assert_symmetric(&input);
                }

                #[test]
                fn deterministic() {
                    let input = $data;
                    let a = codec::compress_bytes(&input).unwrap();
                    let b = codec::compress_bytes(&input).unwrap();
                    assert_eq!(a, b, "compression is not deterministic");
                }
            }
        };
    }

    round_trip_test!(rt_empty, Vec::<u8>::new());
    round_trip_test!(rt_single_byte, vec![42u8]);
    round_trip_test!(rt_two_bytes, vec![0u8, 255]);
    round_trip_test!(rt_zeros_100, data_all_zeros(100));
    round_trip_test!(rt_zeros_5000, data_all_zeros(5000));
    round_trip_test!(rt_uniform, data_uniform());
    round_trip_test!(rt_skewed_1000, data_skewed(1000));
    round_trip_test!(rt_repeating_text, data_repeating_text());
    round_trip_test!(rt_sawtooth_1024, data_sawtooth(1024));
    round_trip_test!(rt_runs, data_runs());
    round_trip_test!(rt_alphabet_then_zeros, data_alphabet_then_zeros());
    round_trip_test!(rt_lcg_4096, data_lcg(4096));

    // ---------------------------------------------------------------
    // 2. Encoder/decoder symmetry
    // ---------------------------------------------------------------

    /// Encode `input` symbol by symbol, then decode it symbol by symbol,
    /// and compare both trees (and the invariants) after every step.
    fn assert_symmetric(input: &[u8]) {
        let mut encoder = Encoder::new(Vec::new());
        let mut snapshots = Vec::with_capacity(input.len());
        for &b in input {
            encoder.encode(b).unwrap();
            encoder.tree().verify().unwrap();
            snapshots.push(encoder.tree().to_string());
        }
        let (payload, _) = encoder.finish().unwrap();

        let mut decoder = Decoder::new(&payload[..], BitOrder::MsbFirst);
        for (i, &expected) in input.iter().enumerate() {
            assert_eq!(decoder.decode().unwrap(), Some(expected), "symbol {i}");
            decoder.tree().verify().unwrap();
            assert_eq!(decoder.tree().to_string(), snapshots[i], "tree diverged at {i}");
        }
    }

    // ---------------------------------------------------------------
    // 3. Tree invariants under observation
    // ---------------------------------------------------------------

    /// Records every node weight at each update step and checks that none
    /// ever decreases, and that the NYT designation stays unique.
    #[derive(Default)]
    struct InvariantObserver {
        weights: Vec<u32>,
        steps: usize,
    }

    impl InvariantObserver {
        fn check(&mut self, tree: &AdaptiveTree) {
            for (id, node) in tree.iter() {
                if let Some(&prev) = self.weights.get(id.index()) {
                    assert!(
                        node.weight() >= prev,
                        "node {} went from {} to {}",
                        id.index(),
                        prev,
                        node.weight()
                    );
                }
            }
            self.weights = tree.iter().map(|(_, n)| n.weight()).collect();

            let empty_leaves: Vec<NodeId> = tree
                .iter()
                .filter(|(_, n)| n.is_leaf() && n.symbol().is_none())
                .map(|(id, _)| id)
                .collect();
            assert_eq!(empty_leaves.len(), 1, "exactly one symbol-less leaf");
            if tree.symbol_count() < ALPHABET_SIZE {
                assert_eq!(tree.nyt(), Some(empty_leaves[0]));
            } else {
                assert_eq!(tree.nyt(), None);
            }
        }
    }

    impl TreeObserver for InvariantObserver {
        fn on_swap(&mut self, tree: &AdaptiveTree, _a: NodeId, _b: NodeId) {
            self.check(tree);
        }

        fn on_update_step(&mut self, tree: &AdaptiveTree, _node: NodeId) {
            self.steps += 1;
            self.check(tree);
        }

        fn on_finish(&mut self, tree: &AdaptiveTree) {
            self.check(tree);
            tree.verify().unwrap();
        }
    }

    #[test]
    fn test_weights_monotonic_and_nyt_unique() {
        for input in [data_repeating_text(), data_alphabet_then_zeros(), data_lcg(2000)] {
            let mut observer = InvariantObserver::default();
            let mut packed = Vec::new();
            codec::compress_observed(Cursor::new(&input), &mut packed, &mut observer).unwrap();
            assert!(observer.steps >= input.len());
        }
    }

    #[test]
    fn test_decoder_observer_sees_same_step_count() {
        let input = data_runs();
        let mut enc_obs = InvariantObserver::default();
        let mut packed = Vec::new();
        codec::compress_observed(Cursor::new(&input), &mut packed, &mut enc_obs).unwrap();

        let mut dec_obs = InvariantObserver::default();
        let mut out = Vec::new();
        codec::decompress_with_options(
            Cursor::new(&packed),
            &mut out,
            &codec::DecompressOptions::default(),
            &mut dec_obs,
        )
        .unwrap();
        assert_eq!(out, input);
        assert_eq!(enc_obs.steps, dec_obs.steps);
    }

    // ---------------------------------------------------------------
    // 4. Compression behaviour
    // ---------------------------------------------------------------

    #[test]
    fn test_uniform_input_costs_about_one_escape_per_byte() {
        let input = data_uniform();
        let packed = codec::compress_bytes(&input).unwrap();
        // Every byte is new: 8 raw bits plus an NYT code of at most 9 bits.
        assert!(packed.len() > input.len());
        assert!(packed.len() < 4 + input.len() * 17 / 8 + 1);
    }

    #[test]
    fn test_skewed_input_compresses() {
        let input = data_skewed(10_000);
        let packed = codec::compress_bytes(&input).unwrap();
        assert!(
            packed.len() < input.len() / 5,
            "packed {} bytes from {}",
            packed.len(),
            input.len()
        );
    }

    #[test]
    fn test_text_compresses_below_input() {
        let input = data_repeating_text();
        let packed = codec::compress_bytes(&input).unwrap();
        assert!(packed.len() < input.len() * 3 / 4);
    }

    #[test]
    fn test_independent_runs_on_threads() {
        let inputs = vec![data_repeating_text(), data_lcg(3000), data_runs()];
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                std::thread::spawn(move || {
                    let packed = codec::compress_bytes(&input).unwrap();
                    (codec::decompress_bytes(&packed).unwrap(), input)
                })
            })
            .collect();
        for handle in handles {
            let (out, input) = handle.join().unwrap();
            assert_eq!(out, input);
        }
    }
}

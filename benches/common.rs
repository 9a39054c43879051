#![allow(dead_code)]

use criterion::measurement::WallTime;
use criterion::BenchmarkGroup;
use std::path::Path;
use std::time::Duration;

pub const SIZES_SMALL: &[usize] = &[8192, 65536];
pub const SIZES_ALL: &[usize] = &[8192, 65536, 1_048_576];

pub fn cap(group: &mut BenchmarkGroup<'_, WallTime>) {
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(10);
}

/// Text from `samples/alice29.txt` when present, repeated or cut to
/// `size`; otherwise a repeated sentence.
pub fn get_test_data(size: usize) -> Vec<u8> {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest.join("samples").join("alice29.txt");
    if let Ok(sample) = std::fs::read(&path) {
        if !sample.is_empty() {
            return sample.iter().copied().cycle().take(size).collect();
        }
    }

    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let full = pattern.repeat((size / pattern.len()) + 1);
    full[..size].to_vec()
}

/// Pseudo-random bytes; every byte value shows up, so the tree grows to
/// the full alphabet and codes stay long.
pub fn get_random_data(size: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9u32;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

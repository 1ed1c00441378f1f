//! OS entropy seed material for the key generator.
//!
//! Reads `/dev/urandom` and mixes in CPU jitter timing samples through
//! domain-separated BLAKE2b-256 to produce a 32-byte seed. None of this is
//! a statistical guarantee; generated keys must still pass the test battery
//! before being trusted.

use std::fs::File;
use std::io::Read;

use blake2::{
    digest::{consts::U32, Digest},
    Blake2b,
};

use crate::error::Error;

type Blake2b256 = Blake2b<U32>;

/// Reads `count` bytes from /dev/urandom.
pub fn read_urandom(count: usize) -> Result<Vec<u8>, Error> {
    let mut f = File::open("/dev/urandom")
        .map_err(|e| Error::EntropyUnavailable(format!("/dev/urandom not available: {}", e)))?;
    let mut buf = vec![0u8; count];
    f.read_exact(&mut buf)
        .map_err(|e| Error::EntropyUnavailable(format!("short read from /dev/urandom: {}", e)))?;
    Ok(buf)
}

/// Collects CPU jitter timing samples via clock_gettime(CLOCK_MONOTONIC),
/// with a data-dependent busy-spin between samples to amplify
/// cache/scheduler/interrupt jitter.
pub fn collect_jitter_samples(count: usize) -> Vec<u8> {
    let mut samples = Vec::with_capacity(count * 8);
    let mut accumulator: u64 = 0;

    for i in 0..count {
        let spin_count = 1000 + (accumulator & 0x1FF) as usize;
        let mut x: u64 = (i as u64).wrapping_mul(0x6C62272E07BB0142);
        for _ in 0..spin_count {
            x = x.wrapping_mul(0x5DEECE66D).wrapping_add(0xB);
        }
        std::hint::black_box(x);

        let ts = clock_gettime_ns();
        accumulator = accumulator.wrapping_add(ts);
        samples.extend_from_slice(&ts.to_le_bytes());
    }

    samples
}

fn clock_gettime_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    (ts.tv_sec as u64)
        .wrapping_mul(1_000_000_000)
        .wrapping_add(ts.tv_nsec as u64)
}

/// Mixes labeled entropy inputs through BLAKE2b-256 with length-prefixed
/// feeding, producing a 32-byte seed.
pub fn mix_seed(inputs: &[(&str, &[u8])]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();

    hasher.update(b"keyrand-seed-v1");

    for (label, data) in inputs {
        let label_bytes = label.as_bytes();
        hasher.update(&(label_bytes.len() as u64).to_le_bytes());
        hasher.update(label_bytes);

        hasher.update(&(data.len() as u64).to_le_bytes());
        hasher.update(data);
    }

    let result = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&result);
    seed
}

/// Fresh 32-byte seed per call: urandom plus jitter, never shared between
/// callers.
pub fn session_seed() -> Result<[u8; 32], Error> {
    let urandom = read_urandom(32)?;
    let jitter = collect_jitter_samples(32);
    Ok(mix_seed(&[("urandom", &urandom), ("jitter", &jitter)]))
}

//! Pseudo-random key generation.
//!
//! A convenience utility, not a cryptographic primitive: the output carries
//! no randomness guarantee and must be validated with the [`crate::suite`]
//! tests before being trusted as "random enough".

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::entropy;
use crate::error::Error;

/// Draws `count` bytes from `rng`, each uniform over 1..=255 (never zero),
/// by rejection sampling. Taking the source as a parameter lets tests
/// substitute a seeded generator.
pub fn random_key_with<R: RngCore>(rng: &mut R, count: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(count);
    let mut buf = [0u8; 64];
    while key.len() < count {
        rng.fill_bytes(&mut buf);
        for &b in &buf {
            if b != 0 {
                key.push(b);
                if key.len() == count {
                    break;
                }
            }
        }
    }
    key
}

/// Generates a `count`-byte key from a ChaCha20 stream seeded with fresh OS
/// entropy. Fails with `EntropyUnavailable` if no seed material can be
/// obtained; there is no silent fallback to a weaker source.
pub fn random_key(count: usize) -> Result<Vec<u8>, Error> {
    let seed = entropy::session_seed()?;
    let mut rng = ChaCha20Rng::from_seed(seed);
    Ok(random_key_with(&mut rng, count))
}

//! FIPS 140 style statistical randomness tests for cryptographic keys.
//!
//! Given a candidate key (any byte sequence), the [`suite`] module judges
//! whether its bit distribution is consistent with a uniformly random
//! source: monobit proportion, longest run, poker-4 nibble frequencies, and
//! the full run-length distribution. [`keygen`] is a companion generator
//! whose output must itself pass the battery before being trusted.
//!
//! All operations are pure functions over their inputs and may be called
//! concurrently without synchronization.

pub mod bits;
pub mod config;
pub mod entropy;
pub mod error;
pub mod keygen;
pub mod suite;

pub use config::Thresholds;
pub use error::Error;
pub use keygen::{random_key, random_key_with};
pub use suite::{
    max_num_of_series_length_test, max_series_length_test, monobit_test, poker4_test,
    MAX_SERIES_LENGTH, MONOBIT_MAX, MONOBIT_MIN, POKER4_MAX, POKER4_MIN, RUN_LENGTH_BUCKETS,
};

//! FIPS 140 style key-randomness test battery.
//!
//! Four stateless tests over a byte-sequence key, all reading the bit stream
//! defined in [`crate::bits`]. Each test's boolean result is the sole
//! outcome: `false` means "this key did not meet the criterion", not an
//! error. Passing all four is necessary, not sufficient, evidence that the
//! key came from a uniformly random source.
//!
//! The default thresholds are calibrated for a 2500-byte (20000-bit) key;
//! callers testing other lengths must supply their own.

use crate::bits::{self, Run};
use crate::config::Thresholds;
use crate::error::Error;

/// Monobit acceptance window (strict) for a 20000-bit key.
pub const MONOBIT_MIN: u64 = 9654;
pub const MONOBIT_MAX: u64 = 10346;

/// Longest tolerated run of identical bits.
pub const MAX_SERIES_LENGTH: u32 = 36;

/// Poker-4 statistic acceptance window (strict) for a 20000-bit key.
pub const POKER4_MIN: f64 = 1.03;
pub const POKER4_MAX: f64 = 57.4;

/// Expected run counts per run length (1, 2, 3, 4, 5, >=6) for a 20000-bit
/// key, applied to the 0-run and 1-run histograms independently. Windows
/// are inclusive and each pair may be stored in either order.
pub const RUN_LENGTH_BUCKETS: [(u32, u32); 6] = [
    (2267, 2733),
    (1079, 1421),
    (502, 748),
    (223, 402),
    (90, 223),
    (90, 223),
];

/// Number of set bits across the whole key.
pub fn ones_count(key: &[u8]) -> u64 {
    key.iter().map(|&b| b.count_ones() as u64).sum()
}

/// Monobit test: passes iff the number of set bits lies strictly between
/// `min` and `max`.
pub fn monobit_test(key: &[u8], min: u64, max: u64) -> bool {
    let count = ones_count(key);
    count > min && count < max
}

/// Maximum series length test: passes iff no run closed during the scan is
/// longer than `max`. Fails on the first oversized run without scanning
/// further.
///
/// The final run of the stream is never closed by a differing bit and is
/// therefore never checked; [`max_series_length_test_full`] is the
/// corrected variant.
pub fn max_series_length_test(key: &[u8], max: u32) -> bool {
    bits::closed_runs(key).all(|run| run.len <= max)
}

/// Like [`max_series_length_test`], but the trailing run is checked too.
pub fn max_series_length_test_full(key: &[u8], max: u32) -> bool {
    bits::all_runs(key).all(|run| run.len <= max)
}

/// Poker-4 statistic: `16 * sum(counts^2) / N - N` over the 16 nibble
/// frequencies, where `N` is the total nibble count (twice the byte
/// length). NaN for an empty key.
pub fn poker4_statistic(key: &[u8]) -> f64 {
    let counts = nibble_counts(key);
    let sum_sq: u64 = counts.iter().map(|&c| c * c).sum();
    let n = (key.len() as f64) * 2.0;
    16.0 * sum_sq as f64 / n - n
}

/// Poker test on 4-bit blocks: passes iff the statistic lies strictly
/// between `min` and `max`. Non-finite bounds are rejected before any
/// counting. An empty key yields a NaN statistic and fails.
pub fn poker4_test(key: &[u8], min: f64, max: f64) -> Result<bool, Error> {
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::InvalidArgs(format!(
            "poker bounds must be finite, got ({}, {})",
            min, max
        )));
    }
    let statistic = poker4_statistic(key);
    Ok(statistic > min && statistic < max)
}

/// Nibble frequencies, high nibble of each byte counted before the low
/// nibble. The split is byte-relative (big-endian within the byte) even
/// though bit traversal elsewhere is little-endian.
fn nibble_counts(key: &[u8]) -> [u64; 16] {
    let mut counts = [0u64; 16];
    for &byte in key {
        counts[(byte >> 4) as usize] += 1;
        counts[(byte & 0x0F) as usize] += 1;
    }
    counts
}

/// Run-length distribution test: classifies every closed run by bit value
/// and length into `buckets.len()` buckets (length `1..k-1` to bucket
/// `length - 1`, length `>= k` to the last bucket) and requires each bucket
/// count, for 0-runs and 1-runs independently, to fall inside the inclusive
/// window of the matching table entry. Table pairs may be stored in either
/// order. Fails on the first out-of-range bucket, 0-run histogram first.
///
/// An empty table is an `InvalidArgs` error, checked before scanning. The
/// trailing run of the stream is never classified;
/// [`max_num_of_series_length_test_full`] is the corrected variant.
pub fn max_num_of_series_length_test(key: &[u8], buckets: &[(u32, u32)]) -> Result<bool, Error> {
    validate_buckets(buckets)?;
    let (zeros, ones) = histograms(bits::closed_runs(key), buckets.len());
    Ok(within_buckets(buckets, &zeros) && within_buckets(buckets, &ones))
}

/// Like [`max_num_of_series_length_test`], but the trailing run is
/// classified too.
pub fn max_num_of_series_length_test_full(
    key: &[u8],
    buckets: &[(u32, u32)],
) -> Result<bool, Error> {
    validate_buckets(buckets)?;
    let (zeros, ones) = histograms(bits::all_runs(key), buckets.len());
    Ok(within_buckets(buckets, &zeros) && within_buckets(buckets, &ones))
}

fn validate_buckets(buckets: &[(u32, u32)]) -> Result<(), Error> {
    if buckets.is_empty() {
        return Err(Error::InvalidArgs(
            "run-length bucket table must not be empty".into(),
        ));
    }
    Ok(())
}

/// Per-length run counts for 0-runs and 1-runs, `k` buckets each.
/// `k` must be at least 1; checked before scanning.
pub fn run_length_histograms(
    key: &[u8],
    k: usize,
    include_final: bool,
) -> Result<(Vec<u32>, Vec<u32>), Error> {
    if k == 0 {
        return Err(Error::InvalidArgs(
            "histogram bucket count must be at least 1".into(),
        ));
    }
    if include_final {
        Ok(histograms(bits::all_runs(key), k))
    } else {
        Ok(histograms(bits::closed_runs(key), k))
    }
}

fn histograms<I: Iterator<Item = Run>>(runs: I, k: usize) -> (Vec<u32>, Vec<u32>) {
    let mut zeros = vec![0u32; k];
    let mut ones = vec![0u32; k];
    for run in runs {
        let idx = (run.len as usize).min(k) - 1;
        if run.value {
            ones[idx] += 1;
        } else {
            zeros[idx] += 1;
        }
    }
    (zeros, ones)
}

fn within_buckets(buckets: &[(u32, u32)], counts: &[u32]) -> bool {
    buckets.iter().zip(counts).all(|(&(a, b), &count)| {
        let (lo, hi) = (a.min(b), a.max(b));
        count >= lo && count <= hi
    })
}

/// Result of one test within an aggregate run.
pub struct TestOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Results of all four tests over one key.
pub struct SuiteOutcome {
    pub monobit: TestOutcome,
    pub max_series: TestOutcome,
    pub poker4: TestOutcome,
    pub run_dist: TestOutcome,
}

impl SuiteOutcome {
    pub fn all_passed(&self) -> bool {
        self.monobit.passed && self.max_series.passed && self.poker4.passed && self.run_dist.passed
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestOutcome> {
        [&self.monobit, &self.max_series, &self.poker4, &self.run_dist].into_iter()
    }
}

/// Runs all four tests with the given thresholds, collecting per-test
/// detail for reporting. Honors `check_final_run` by switching to the
/// `_full` variants.
pub fn run_suite(key: &[u8], t: &Thresholds) -> Result<SuiteOutcome, Error> {
    t.validate()?;

    let count = ones_count(key);
    let monobit = TestOutcome {
        name: "Monobit",
        passed: monobit_test(key, t.monobit_min, t.monobit_max),
        detail: format!("ones count: {}", count),
    };

    let longest = if t.check_final_run {
        bits::all_runs(key).map(|r| r.len).max().unwrap_or(0)
    } else {
        bits::closed_runs(key).map(|r| r.len).max().unwrap_or(0)
    };
    let series_passed = if t.check_final_run {
        max_series_length_test_full(key, t.series_max)
    } else {
        max_series_length_test(key, t.series_max)
    };
    let max_series = TestOutcome {
        name: "Max series length",
        passed: series_passed,
        detail: format!("longest run: {} bits", longest),
    };

    let statistic = poker4_statistic(key);
    let poker4 = TestOutcome {
        name: "Poker-4",
        passed: poker4_test(key, t.poker_min, t.poker_max)?,
        detail: format!("statistic: {:.2}", statistic),
    };

    let run_dist = run_dist_outcome(key, &t.run_buckets, t.check_final_run)?;

    Ok(SuiteOutcome {
        monobit,
        max_series,
        poker4,
        run_dist,
    })
}

fn run_dist_outcome(
    key: &[u8],
    buckets: &[(u32, u32)],
    include_final: bool,
) -> Result<TestOutcome, Error> {
    validate_buckets(buckets)?;
    let k = buckets.len();
    let (zeros, ones) = run_length_histograms(key, k, include_final)?;

    let mut failures = Vec::new();
    for (label, counts) in [("0-runs", &zeros), ("1-runs", &ones)] {
        for (i, (&(a, b), &count)) in buckets.iter().zip(counts.iter()).enumerate() {
            let (lo, hi) = (a.min(b), a.max(b));
            if count < lo || count > hi {
                let len_label = if i + 1 < k {
                    format!("{}", i + 1)
                } else {
                    format!("{}+", k)
                };
                failures.push(format!(
                    "{} len {}: {} not in [{}, {}]",
                    label, len_label, count, lo, hi
                ));
            }
        }
    }

    let passed = failures.is_empty();
    let detail = if passed {
        format!("all {} buckets within range", 2 * k)
    } else {
        failures.join("; ")
    };

    Ok(TestOutcome {
        name: "Run-length distribution",
        passed,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2500 bytes of 'a' (0x61): three set bits per byte, the documented
    /// bad-key baseline.
    fn bad_key() -> Vec<u8> {
        vec![b'a'; 2500]
    }

    fn chacha_key(seed: u64, count: usize) -> Vec<u8> {
        use rand_chacha::ChaCha20Rng;
        use rand_core::{RngCore, SeedableRng};

        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut key = vec![0u8; count];
        rng.fill_bytes(&mut key);
        key
    }

    // --- Monobit ---

    #[test]
    fn test_monobit_strict_boundaries() {
        // One 0xFF byte: exactly 8 set bits
        let key = [0xFFu8];
        assert!(monobit_test(&key, 7, 9));
        assert!(!monobit_test(&key, 8, 9)); // count == min
        assert!(!monobit_test(&key, 7, 8)); // count == max
        assert!(monobit_test(&key, 6, 10));
        assert!(!monobit_test(&key, 9, 20)); // count < min
    }

    #[test]
    fn test_monobit_zeros_fails_defaults() {
        let key = vec![0u8; 2500];
        assert!(!monobit_test(&key, MONOBIT_MIN, MONOBIT_MAX));
    }

    #[test]
    fn test_monobit_bad_key_fails_defaults() {
        // popcount = 3 * 2500 = 7500 < 9654
        assert_eq!(ones_count(&bad_key()), 7500);
        assert!(!monobit_test(&bad_key(), MONOBIT_MIN, MONOBIT_MAX));
    }

    #[test]
    fn test_monobit_empty_key() {
        assert!(!monobit_test(&[], MONOBIT_MIN, MONOBIT_MAX));
    }

    // --- Max series length ---

    #[test]
    fn test_max_series_exactly_at_cap_passes() {
        // 0xFF, 0x00, 0x01: closed runs of 8 ones, 8 zeros, 1 one
        let key = [0xFF, 0x00, 0x01];
        assert!(max_series_length_test(&key, 8));
    }

    #[test]
    fn test_max_series_over_cap_fails() {
        let key = [0xFF, 0x00, 0x01];
        assert!(!max_series_length_test(&key, 7));
    }

    #[test]
    fn test_max_series_final_run_not_checked() {
        // A single run of 8 zeros is never closed, so never checked
        assert!(max_series_length_test(&[0x00], 3));
        assert!(!max_series_length_test_full(&[0x00], 3));
        assert!(max_series_length_test_full(&[0x00], 8));
    }

    #[test]
    fn test_max_series_bad_key_passes_defaults() {
        // 'a' = 0x61, longest run is 4 bits
        assert!(max_series_length_test(&bad_key(), MAX_SERIES_LENGTH));
    }

    #[test]
    fn test_max_series_empty_key_passes() {
        assert!(max_series_length_test(&[], 1));
    }

    // --- Poker-4 ---

    #[test]
    fn test_poker4_uniform_nibbles_statistic_zero() {
        // Every nibble value appears equally often
        let pattern: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        let key: Vec<u8> = pattern.iter().cycle().take(800).copied().collect();
        let statistic = poker4_statistic(&key);
        assert!(statistic.abs() < 1e-9, "expected ~0, got {}", statistic);
        // A perfectly uniform key is *too* uniform for the strict lower bound
        assert!(!poker4_test(&key, POKER4_MIN, POKER4_MAX).unwrap());
        assert!(poker4_test(&key, -0.5, POKER4_MAX).unwrap());
    }

    #[test]
    fn test_poker4_single_nibble_statistic_maximal() {
        // All nibbles are 0x6 or 0x1 (the 'a' key): statistic 35000
        let statistic = poker4_statistic(&bad_key());
        assert!((statistic - 35000.0).abs() < 1e-6, "got {}", statistic);
        assert!(!poker4_test(&bad_key(), POKER4_MIN, POKER4_MAX).unwrap());
    }

    #[test]
    fn test_poker4_nibble_split_is_byte_relative() {
        // 0x61 and 0x16 contain the same nibble multiset, same statistic
        let a = poker4_statistic(&[0x61, 0x61]);
        let b = poker4_statistic(&[0x16, 0x16]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_poker4_empty_key_fails() {
        assert!(!poker4_test(&[], POKER4_MIN, POKER4_MAX).unwrap());
    }

    #[test]
    fn test_poker4_non_finite_bounds_rejected() {
        assert!(poker4_test(&[0xAA], f64::NAN, POKER4_MAX).is_err());
        assert!(poker4_test(&[0xAA], POKER4_MIN, f64::INFINITY).is_err());
    }

    // --- Run-length distribution ---

    #[test]
    fn test_run_dist_empty_table_rejected() {
        let err = max_num_of_series_length_test(&[0xAA], &[]);
        assert!(err.is_err());
    }

    #[test]
    fn test_run_dist_bucket_assignment() {
        // 0xF7, 0xEF: bits 1110 1111 | 1111 0111 (LSB-first per byte)
        // -> closed runs: 1x3, 0x1, 1x8, 0x1; trailing 1x3 unclassified
        let key = [0xF7, 0xEF];
        let k = 3;
        let (zeros, ones) = run_length_histograms(&key, k, false).unwrap();
        // length k (3) and length k+5 (8) share the final bucket
        assert_eq!(ones, vec![0, 0, 2]);
        assert_eq!(zeros, vec![2, 0, 0]);

        // length k-1 lands in its own bucket, not the final one
        // 0x03: bits 1,1,0,... -> closed run 1x2, trailing 0x6
        let (zeros, ones) = run_length_histograms(&[0x03], k, false).unwrap();
        assert_eq!(ones, vec![0, 1, 0]);
        assert_eq!(zeros, vec![0, 0, 0]);
    }

    #[test]
    fn test_run_length_histograms_zero_buckets_rejected() {
        // Must error up front rather than underflow once a run is seen
        assert!(run_length_histograms(&[0xAA], 0, false).is_err());
        assert!(run_length_histograms(&[], 0, true).is_err());
    }

    #[test]
    fn test_run_dist_crafted_key_passes() {
        // 0x07, 0x08: closed runs 1x3, 0x8, 1x1; trailing 0x4 unclassified
        let key = [0x07, 0x08];
        let table = [(0, 1), (0, 0), (1, 1)];
        // zeros: [0, 0, 1], ones: [1, 0, 1]
        assert!(max_num_of_series_length_test(&key, &table).unwrap());
        let tighter = [(1, 1), (0, 0), (1, 1)];
        assert!(!max_num_of_series_length_test(&key, &tighter).unwrap());
    }

    #[test]
    fn test_run_dist_pairs_may_be_unordered() {
        let key = [0x07, 0x08];
        let reversed = [(1, 0), (0, 0), (1, 1)];
        assert!(max_num_of_series_length_test(&key, &reversed).unwrap());
    }

    #[test]
    fn test_run_dist_final_run_not_classified() {
        // A single 8-bit zero run is never closed
        assert!(max_num_of_series_length_test(&[0x00], &[(0, 0)]).unwrap());
        assert!(!max_num_of_series_length_test_full(&[0x00], &[(0, 0)]).unwrap());
        assert!(max_num_of_series_length_test_full(&[0x00], &[(0, 1)]).unwrap());
    }

    #[test]
    fn test_run_dist_bad_key_fails_defaults() {
        // 'a' bits repeat 1,0,0,0,0,1,1,0: ~2500 runs of 1x2 alone
        // blows the length-2 window [1079, 1421]
        assert!(!max_num_of_series_length_test(&bad_key(), &RUN_LENGTH_BUCKETS).unwrap());
    }

    // --- Aggregate suite ---

    #[test]
    fn test_suite_bad_key_baseline() {
        let t = Thresholds::default();
        let outcome = run_suite(&bad_key(), &t).unwrap();
        assert!(!outcome.monobit.passed);
        assert!(outcome.max_series.passed);
        assert!(!outcome.poker4.passed);
        assert!(!outcome.run_dist.passed);
        assert!(!outcome.all_passed());
    }

    #[test]
    fn test_suite_chacha_key_passes_all() {
        let key = chacha_key(42, 2500);
        let t = Thresholds::default();
        let outcome = run_suite(&key, &t).unwrap();
        assert!(outcome.monobit.passed, "monobit: {}", outcome.monobit.detail);
        assert!(
            outcome.max_series.passed,
            "max series: {}",
            outcome.max_series.detail
        );
        assert!(outcome.poker4.passed, "poker-4: {}", outcome.poker4.detail);
        assert!(
            outcome.run_dist.passed,
            "run dist: {}",
            outcome.run_dist.detail
        );
        assert!(outcome.all_passed());
    }

    #[test]
    fn test_suite_detail_strings() {
        let t = Thresholds::default();
        let outcome = run_suite(&bad_key(), &t).unwrap();
        assert!(outcome.monobit.detail.contains("7500"));
        assert!(outcome.poker4.detail.contains("35000"));
        assert!(outcome.run_dist.detail.contains("not in"));
    }
}

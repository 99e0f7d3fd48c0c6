//! Optimal sizing, following http://en.wikipedia.org/wiki/Bloom_filter
//!
//!   bpe    = -ln(error) / ln(2)^2
//!   bits   = entries * bpe
//!   hashes = ceil(ln(2) * bpe)

use crate::consts::{LN_2, LN_2_SQUARED, MIN_ENTRIES};
use crate::errors::{BloomError, Result};

/// Configuration and derived sizing of one filter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Params {
    pub entries: u32,
    pub error: f64,
    pub bpe: f64,
    pub bits: u64,
    pub bytes: u64,
    pub hashes: u8,
}

impl Params {
    pub fn compute(entries: u32, error: f64) -> Result<Self> {
        if entries < MIN_ENTRIES {
            return Err(BloomError::InvalidCapacity { entries });
        }
        // negated form also rejects NaN
        if !(error > 0.0 && error < 1.0) {
            return Err(BloomError::InvalidErrorRate { error });
        }

        let bpe = -error.ln() / LN_2_SQUARED;
        let bits = (f64::from(entries) * bpe) as u64;
        // error so close to 1 that not even one bit is needed
        if bits == 0 {
            return Err(BloomError::InvalidErrorRate { error });
        }
        let bytes = bits.div_ceil(8);
        let hashes = (LN_2 * bpe).ceil().clamp(1.0, f64::from(u8::MAX)) as u8;

        Ok(Self { entries, error, bpe, bits, bytes, hashes })
    }

    /// Theoretical false positive probability after `inserted` elements.
    pub fn estimated_fpp(&self, inserted: u64) -> f64 {
        if self.bits == 0 {
            return 1.0;
        }
        let k = f64::from(self.hashes);
        let exponent = -k * inserted as f64 / self.bits as f64;
        (1.0 - exponent.exp()).powf(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_small_capacity() {
        assert!(matches!(
            Params::compute(999, 0.1),
            Err(BloomError::InvalidCapacity { entries: 999 })
        ));
        assert!(matches!(Params::compute(0, 0.1), Err(BloomError::InvalidCapacity { .. })));
        assert!(Params::compute(1000, 0.1).is_ok());
    }

    #[test]
    fn rejects_out_of_range_error() {
        for error in [0.0, 1.0, 1.1, -1.0, f64::NAN, 1.0 - 1e-12] {
            assert!(
                matches!(Params::compute(1000, error), Err(BloomError::InvalidErrorRate { .. })),
                "error rate {error} accepted"
            );
        }
    }

    #[test]
    fn derived_sizes() {
        let p = Params::compute(1_000_000, 0.01).unwrap();
        // -ln(0.01) / ln(2)^2 ~= 9.585
        assert!((p.bpe - 9.585_058_377_367_439).abs() < 1e-9);
        assert_eq!(p.bits, 9_585_058);
        assert_eq!(p.bytes, 1_198_133);
        assert_eq!(p.hashes, 7);
    }

    #[test]
    fn bytes_round_up() {
        for entries in [1000u32, 1002, 1003, 4097, 123_457] {
            let p = Params::compute(entries, 0.1).unwrap();
            assert_eq!(p.bytes, (p.bits + 7) / 8);
            assert!(p.bytes * 8 >= p.bits);
            assert!(p.hashes >= 1);
        }
    }

    #[test]
    fn sizes_shrink_with_capacity() {
        let mut prev: Option<Params> = None;
        let mut entries = u32::MAX;
        while entries > MIN_ENTRIES {
            let p = Params::compute(entries, 0.01).unwrap();
            if let Some(prev) = prev {
                assert!(p.bytes < prev.bytes);
                assert!(p.bits < prev.bits);
            }
            prev = Some(p);
            entries /= 2;
        }
    }

    #[test]
    fn max_entries_does_not_truncate_to_32_bits() {
        let p = Params::compute(u32::MAX, 0.01).unwrap();
        assert!(p.bits > u64::from(u32::MAX));
        let expected = (f64::from(u32::MAX) * p.bpe).floor() as u64;
        assert_eq!(p.bits, expected);
    }

    #[test]
    fn estimated_fpp_near_target_at_capacity() {
        let p = Params::compute(100_000, 0.01).unwrap();
        let fpp = p.estimated_fpp(100_000);
        assert!(fpp > 0.005 && fpp < 0.02, "fpp {fpp}");
        assert_eq!(p.estimated_fpp(0), 0.0);
    }
}

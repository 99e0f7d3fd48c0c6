//! The filter: configuration, bit array and lifecycle.
//!
//! A `Bloom` is either uninitialized (no bit buffer) or ready. Only a ready
//! filter answers `check`/`add`/`reset`/`merge`; everything else reports
//! [`BloomError::Uninitialized`].

use crate::bits::BitArray;
use crate::config::BloomConfig;
use crate::consts::{FORMAT_MAJOR, FORMAT_MINOR};
use crate::errors::{BloomError, Result};
use crate::hash::probes;
use crate::info::BloomInfo;
use crate::params::Params;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct Bloom {
    params: Params,
    major: u8,
    minor: u8,
    bf: Option<BitArray>,
}

impl Bloom {
    /// An uninitialized filter; call [`Bloom::init`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready filter sized for `entries` elements at false positive rate `error`.
    pub fn with_params(entries: u32, error: f64) -> Result<Self> {
        let mut bloom = Self::new();
        bloom.init(entries, error)?;
        Ok(bloom)
    }

    pub fn from_config(cfg: &BloomConfig) -> Result<Self> {
        Self::with_params(cfg.entries, cfg.error)
    }

    /// (Re)initialize. Any previous bit buffer is released first, so on
    /// failure the filter is left uninitialized.
    pub fn init(&mut self, entries: u32, error: f64) -> Result<()> {
        self.teardown();
        let params = Params::compute(entries, error)?;
        let bf = allocate(params.bytes)?;
        *self = Self {
            params,
            major: FORMAT_MAJOR,
            minor: FORMAT_MINOR,
            bf: Some(bf),
        };
        debug!(
            entries,
            error,
            bits = params.bits,
            hashes = params.hashes,
            "bloom filter initialized"
        );
        Ok(())
    }

    /// Whether `buf` may have been added. Never false for an added element.
    pub fn check(&self, buf: &[u8]) -> Result<bool> {
        let bf = self.ready_bits()?;
        let m = bf.check(probes(buf, self.params.hashes, self.params.bits));
        Ok(m.is_present())
    }

    /// Record `buf`. Returns true if it (or a collision) was already present,
    /// false if it was newly inserted.
    pub fn add(&mut self, buf: &[u8]) -> Result<bool> {
        let Params { hashes, bits, .. } = self.params;
        let bf = self.ready_bits_mut()?;
        let m = bf.check_or_add(probes(buf, hashes, bits), true);
        Ok(m.is_present())
    }

    /// Erase all elements; configuration is kept.
    pub fn reset(&mut self) -> Result<()> {
        self.ready_bits_mut()?.clear();
        Ok(())
    }

    /// Release the bit buffer. Safe to call on an uninitialized filter.
    pub fn teardown(&mut self) {
        *self = Self::default();
    }

    /// OR the bits of `src` into `self`. Both filters must be ready and have
    /// identical entries, error, format version and size. `src` is never
    /// modified, and `self` is left untouched on error.
    pub fn merge(&mut self, src: &Bloom) -> Result<()> {
        if !self.is_ready() || !src.is_ready() {
            warn!("merge with an uninitialized bloom filter");
            return Err(BloomError::Uninitialized);
        }
        self.ensure_compatible(src)?;
        if let (Some(dst), Some(s)) = (self.bf.as_mut(), src.bf.as_ref()) {
            dst.union_with(s);
        }
        debug!(entries = self.params.entries, bytes = self.params.bytes, "bloom filters merged");
        Ok(())
    }

    fn ensure_compatible(&self, other: &Bloom) -> Result<()> {
        let (a, b) = (&self.params, &other.params);
        let mismatch = if a.entries != b.entries {
            Some(format!("entries {} != {}", a.entries, b.entries))
        } else if a.error != b.error {
            Some(format!("error {} != {}", a.error, b.error))
        } else if self.major != other.major || self.minor != other.minor {
            Some(format!(
                "version {}.{} != {}.{}",
                self.major, self.minor, other.major, other.minor
            ))
        } else if a.bytes != b.bytes {
            Some(format!("bytes {} != {}", a.bytes, b.bytes))
        } else {
            None
        };
        match mismatch {
            Some(why) => Err(BloomError::IncompatibleParameters(why)),
            None => Ok(()),
        }
    }

    fn ready_bits(&self) -> Result<&BitArray> {
        self.bf.as_ref().ok_or_else(|| {
            warn!("bloom filter not initialized");
            BloomError::Uninitialized
        })
    }

    fn ready_bits_mut(&mut self) -> Result<&mut BitArray> {
        self.bf.as_mut().ok_or_else(|| {
            warn!("bloom filter not initialized");
            BloomError::Uninitialized
        })
    }

    pub fn is_ready(&self) -> bool {
        self.bf.is_some()
    }

    pub fn entries(&self) -> u32 { self.params.entries }
    pub fn error(&self) -> f64 { self.params.error }
    pub fn bits(&self) -> u64 { self.params.bits }
    pub fn bytes(&self) -> u64 { self.params.bytes }
    pub fn hashes(&self) -> u8 { self.params.hashes }
    pub fn bpe(&self) -> f64 { self.params.bpe }
    pub fn params(&self) -> &Params { &self.params }

    /// Format (major, minor) stamped at construction.
    pub fn version(&self) -> (u8, u8) {
        (self.major, self.minor)
    }

    /// Raw bit buffer in storage order, `None` when not ready.
    pub fn bitmap(&self) -> Option<&[u8]> {
        self.bf.as_ref().map(BitArray::as_bytes)
    }

    pub fn info(&self) -> BloomInfo {
        BloomInfo {
            ready: self.is_ready(),
            entries: self.params.entries,
            error: self.params.error,
            bits: self.params.bits,
            bytes: self.params.bytes,
            hashes: self.params.hashes,
            bpe: self.params.bpe,
            major: self.major,
            minor: self.minor,
            ones: self.bf.as_ref().map_or(0, BitArray::count_ones),
        }
    }

    /// Assemble a ready filter from decoded parts. The caller guarantees
    /// `bf.len() == params.bytes`.
    pub(crate) fn from_parts(params: Params, major: u8, minor: u8, bf: BitArray) -> Self {
        debug_assert_eq!(bf.len() as u64, params.bytes);
        Self { params, major, minor, bf: Some(bf) }
    }

    #[cfg(test)]
    pub(crate) fn set_version(&mut self, major: u8, minor: u8) {
        self.major = major;
        self.minor = minor;
    }
}

/// Library version string.
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub(crate) fn allocate(bytes: u64) -> Result<BitArray> {
    usize::try_from(bytes)
        .ok()
        .and_then(|n| BitArray::zeroed(n).ok())
        .ok_or(BloomError::Allocation { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_filter_refuses_work() {
        let mut bloom = Bloom::new();
        assert!(!bloom.is_ready());
        assert!(matches!(bloom.add(b"hello world"), Err(BloomError::Uninitialized)));
        assert!(matches!(bloom.check(b"hello world"), Err(BloomError::Uninitialized)));
        assert!(matches!(bloom.reset(), Err(BloomError::Uninitialized)));
        assert!(bloom.bitmap().is_none());
        bloom.teardown();
        assert!(!bloom.is_ready());
    }

    #[test]
    fn failed_init_leaves_filter_uninitialized() {
        let mut bloom = Bloom::with_params(5000, 0.01).unwrap();
        assert!(bloom.is_ready());
        assert!(matches!(bloom.init(5000, 1.0), Err(BloomError::InvalidErrorRate { .. })));
        assert!(!bloom.is_ready());
        assert_eq!(bloom.bytes(), 0);
        assert!(matches!(bloom.init(999, 0.1), Err(BloomError::InvalidCapacity { entries: 999 })));
        assert!(!bloom.is_ready());
        bloom.init(1001, 0.5).unwrap();
        assert!(bloom.is_ready());
    }

    #[test]
    fn hello_world_scenario() {
        let mut bloom = Bloom::with_params(1002, 0.1).unwrap();
        assert_eq!(bloom.version(), (FORMAT_MAJOR, FORMAT_MINOR));
        assert!(!bloom.check(b"hello world").unwrap());
        assert!(!bloom.add(b"hello world").unwrap());
        assert!(bloom.check(b"hello world").unwrap());
        assert!(bloom.add(b"hello world").unwrap());
        assert!(!bloom.add(b"hello").unwrap());
        assert!(bloom.add(b"hello").unwrap());
        assert!(bloom.check(b"hello").unwrap());
    }

    #[test]
    fn buffer_matches_params() {
        let bloom = Bloom::with_params(1002, 0.1).unwrap();
        assert_eq!(bloom.bits(), 4802);
        assert_eq!(bloom.bytes(), 601);
        assert_eq!(bloom.hashes(), 4);
        assert_eq!(bloom.bitmap().unwrap().len(), 601);
        assert!(bloom.bitmap().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn add_sets_exactly_k_bits_at_most() {
        let mut bloom = Bloom::with_params(10_000, 0.01).unwrap();
        bloom.add(b"element").unwrap();
        let ones = bloom.info().ones;
        assert!(ones >= 1 && ones <= u64::from(bloom.hashes()));
    }

    #[test]
    fn reset_clears_but_keeps_configuration() {
        let mut bloom = Bloom::with_params(2000, 0.01).unwrap();
        bloom.add(b"a unique element").unwrap();
        bloom.reset().unwrap();
        assert!(bloom.is_ready());
        assert_eq!(bloom.entries(), 2000);
        assert!(!bloom.check(b"a unique element").unwrap());
        assert_eq!(bloom.info().ones, 0);
    }

    #[test]
    fn teardown_then_reinit() {
        let mut bloom = Bloom::with_params(2000, 0.01).unwrap();
        bloom.add(b"x").unwrap();
        bloom.teardown();
        assert!(matches!(bloom.check(b"x"), Err(BloomError::Uninitialized)));
        bloom.init(2000, 0.01).unwrap();
        assert!(!bloom.check(b"x").unwrap());
    }

    #[test]
    fn merge_rejects_uninitialized_sides() {
        let mut ready = Bloom::with_params(100_000, 0.001).unwrap();
        let mut empty = Bloom::new();
        assert!(matches!(ready.merge(&empty), Err(BloomError::Uninitialized)));
        assert!(matches!(empty.merge(&ready), Err(BloomError::Uninitialized)));
    }

    #[test]
    fn merge_rejects_mismatched_parameters() {
        let mut dest = Bloom::with_params(100_000, 0.001).unwrap();
        dest.add(b"dest").unwrap();
        let before = dest.bitmap().unwrap().to_vec();

        let mut other = Bloom::with_params(99_999, 0.001).unwrap();
        other.add(b"src").unwrap();
        let other_before = other.bitmap().unwrap().to_vec();
        assert!(matches!(dest.merge(&other), Err(BloomError::IncompatibleParameters(_))));
        assert_eq!(dest.bitmap().unwrap(), &before[..]);
        assert_eq!(other.bitmap().unwrap(), &other_before[..]);

        let other = Bloom::with_params(100_000, 0.0005).unwrap();
        assert!(matches!(dest.merge(&other), Err(BloomError::IncompatibleParameters(_))));

        let mut other = Bloom::with_params(100_000, 0.001).unwrap();
        dest.set_version(99, FORMAT_MINOR);
        assert!(matches!(dest.merge(&other), Err(BloomError::IncompatibleParameters(_))));
        other.set_version(99, 99);
        assert!(matches!(dest.merge(&other), Err(BloomError::IncompatibleParameters(_))));
        assert_eq!(dest.bitmap().unwrap(), &before[..]);
    }

    #[test]
    fn merge_is_a_superset() {
        let mut dest = Bloom::with_params(100_000, 0.001).unwrap();
        let mut src = Bloom::with_params(100_000, 0.001).unwrap();
        for n in 0u64..500 {
            src.add(&n.to_le_bytes()).unwrap();
        }
        for n in 500u64..1000 {
            dest.add(&n.to_le_bytes()).unwrap();
        }
        let src_before = src.bitmap().unwrap().to_vec();
        dest.merge(&src).unwrap();
        for n in 0u64..1000 {
            assert!(dest.check(&n.to_le_bytes()).unwrap(), "lost element {n}");
        }
        assert_eq!(src.bitmap().unwrap(), &src_before[..]);
    }

    #[test]
    fn info_reports_configuration() {
        let info = Bloom::with_params(1002, 0.1).unwrap().info();
        assert!(info.ready);
        assert_eq!((info.entries, info.bits, info.bytes, info.hashes), (1002, 4802, 601, 4));
        assert_eq!((info.major, info.minor), (FORMAT_MAJOR, FORMAT_MINOR));

        let info = Bloom::new().info();
        assert!(!info.ready);
        assert_eq!(info.bytes, 0);
    }

    #[test]
    fn version_string_is_crate_version() {
        assert_eq!(version_string(), env!("CARGO_PKG_VERSION"));
    }
}

//! Bit buffer and the check-or-add primitive.

use std::collections::TryReserveError;

/// Outcome of a probe traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Every probe bit was already set (element or a collision was recorded).
    Present,
    /// At least one probe bit was unset.
    Absent,
}

impl Membership {
    pub fn is_present(self) -> bool {
        matches!(self, Membership::Present)
    }
}

/// Exclusively owned, fixed-length bit buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct BitArray {
    buf: Vec<u8>,
}

impl BitArray {
    /// Zeroed buffer of `bytes` bytes; allocation failure is reported, not aborted on.
    pub fn zeroed(bytes: usize) -> Result<Self, TryReserveError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes)?;
        buf.resize(bytes, 0);
        Ok(Self { buf })
    }

    /// Takes ownership of an already filled buffer.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns whether bit `pos` was already set; sets it when `set` is true.
    #[inline]
    pub fn test_and_maybe_set(&mut self, pos: u64, set: bool) -> bool {
        let idx = (pos >> 3) as usize;
        let mask = 1u8 << (pos & 7);
        let byte = &mut self.buf[idx];
        if *byte & mask != 0 {
            return true;
        }
        if set {
            *byte |= mask;
        }
        false
    }

    #[inline]
    pub fn test(&self, pos: u64) -> bool {
        let idx = (pos >> 3) as usize;
        self.buf[idx] & (1u8 << (pos & 7)) != 0
    }

    /// Check stops at the first unset probe. Add visits and sets every probe,
    /// reporting `Present` only when all of them were set beforehand.
    pub fn check_or_add<I>(&mut self, probes: I, add: bool) -> Membership
    where
        I: IntoIterator<Item = u64>,
    {
        if !add {
            return self.check(probes);
        }
        let mut hits = 0usize;
        let mut total = 0usize;
        for pos in probes {
            total += 1;
            if self.test_and_maybe_set(pos, true) {
                hits += 1;
            }
        }
        if hits == total {
            Membership::Present
        } else {
            Membership::Absent
        }
    }

    /// Read-only traversal, usable through a shared borrow.
    pub fn check<I>(&self, probes: I) -> Membership
    where
        I: IntoIterator<Item = u64>,
    {
        for pos in probes {
            if !self.test(pos) {
                return Membership::Absent;
            }
        }
        Membership::Present
    }

    pub fn clear(&mut self) {
        self.buf.fill(0);
    }

    /// Byte-wise OR of `other` into `self`. Lengths must match.
    pub fn union_with(&mut self, other: &BitArray) {
        debug_assert_eq!(self.buf.len(), other.buf.len());
        for (dst, src) in self.buf.iter_mut().zip(&other.buf) {
            *dst |= *src;
        }
    }

    pub fn count_ones(&self) -> u64 {
        self.buf.iter().map(|b| u64::from(b.count_ones())).sum()
    }
}

impl std::fmt::Debug for BitArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitArray")
            .field("bytes", &self.buf.len())
            .field("ones", &self.count_ones())
            .finish()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only snapshot of a filter's configuration and derived fields.
///
/// Tooling prints it (`Display`) or emits it as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomInfo {
    pub ready: bool,
    pub entries: u32,
    pub error: f64,
    pub bits: u64,
    pub bytes: u64,
    pub hashes: u8,
    pub bpe: f64,
    pub major: u8,
    pub minor: u8,
    /// Set bits; zero when not ready.
    pub ones: u64,
}

impl BloomInfo {
    /// Fraction of set bits.
    pub fn fill_ratio(&self) -> f64 {
        if self.bits == 0 {
            0.0
        } else {
            self.ones as f64 / self.bits as f64
        }
    }

    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for BloomInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bloom (format {})", self.version())?;
        writeln!(f, " ->ready = {}", self.ready)?;
        writeln!(f, " ->entries = {}", self.entries)?;
        writeln!(f, " ->error = {:.6}", self.error)?;
        writeln!(f, " ->bits = {}", self.bits)?;
        writeln!(f, " ->bits per elem = {:.6}", self.bpe)?;
        writeln!(f, " ->bytes = {}", self.bytes)?;
        writeln!(f, " ->hash functions = {}", self.hashes)?;
        write!(f, " ->fill = {:.4}", self.fill_ratio())
    }
}

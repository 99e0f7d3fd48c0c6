use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("invalid capacity: {entries} entries (minimum is {min})", min = crate::consts::MIN_ENTRIES)]
    InvalidCapacity { entries: u32 },

    #[error("invalid error rate: {error} (must be in (0, 1))")]
    InvalidErrorRate { error: f64 },

    #[error("bloom filter not initialized")]
    Uninitialized,

    #[error("incompatible filters: {0}")]
    IncompatibleParameters(String),

    #[error("unable to allocate {bytes} bytes for the bit array")]
    Allocation { bytes: u64 },

    #[error("persist: {0}")]
    Persist(#[from] PersistError),

    #[error("IO: {0}")]
    Io(#[from] io::Error),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Save/load failures. Variants are listed in the order the loader checks them.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("empty path")]
    InvalidPath,

    #[error("create: {0}")]
    Create(#[source] io::Error),

    #[error("open: {0}")]
    Open(#[source] io::Error),

    #[error("truncated header")]
    TruncatedHeader,

    #[error("wrong format (bad magic)")]
    WrongMagic,

    #[error("truncated metadata length field")]
    TruncatedLength,

    #[error("format size mismatch: record is {found} bytes, this build expects {expected}")]
    RecordSizeMismatch { expected: usize, found: usize },

    #[error("truncated metadata record")]
    TruncatedRecord,

    #[error("incompatible version: file major {found}, this build {expected}")]
    IncompatibleVersion { expected: u8, found: u8 },

    #[error("unable to allocate {bytes} bytes for the bit array")]
    Allocation { bytes: u64 },

    #[error("truncated bit data: expected {expected} bytes, got {found}")]
    TruncatedData { expected: u64, found: u64 },

    #[error("read: {0}")]
    Read(#[source] io::Error),

    #[error("write: {0}")]
    Write(#[source] io::Error),

    #[error("corrupt metadata record: {0}")]
    CorruptRecord(String),
}

impl PersistError {
    /// Stable numeric code, one per failure stage.
    pub fn code(&self) -> i32 {
        match self {
            PersistError::InvalidPath => 1,
            PersistError::Create(_) => 2,
            PersistError::Open(_) => 3,
            PersistError::TruncatedHeader => 4,
            PersistError::WrongMagic => 5,
            PersistError::TruncatedLength => 6,
            PersistError::RecordSizeMismatch { .. } => 7,
            PersistError::TruncatedRecord => 8,
            PersistError::IncompatibleVersion { .. } => 9,
            PersistError::Allocation { .. } => 10,
            PersistError::TruncatedData { .. } => 11,
            PersistError::Read(_) => 12,
            PersistError::Write(_) => 13,
            PersistError::CorruptRecord(_) => 14,
        }
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;

//! Bloom filter with a stable, versioned on-disk format.
//!
//! ```
//! use bloom_core::Bloom;
//!
//! let mut bloom = Bloom::with_params(1002, 0.1)?;
//! assert!(!bloom.add(b"hello world")?);   // newly inserted
//! assert!(bloom.add(b"hello world")?);    // already present
//! assert!(bloom.check(b"hello world")?);
//! # Ok::<(), bloom_core::BloomError>(())
//! ```

pub mod consts;
pub mod errors;
pub mod utils;
pub mod params;
pub mod hash;
pub mod bits;
pub mod filter;
pub mod codec;
pub mod config;
pub mod info;

pub use bits::{BitArray, Membership};
pub use codec::{load, save};
pub use config::BloomConfig;
pub use errors::{BloomError, PersistError, Result};
pub use filter::{version_string, Bloom};
pub use info::BloomInfo;
pub use params::Params;

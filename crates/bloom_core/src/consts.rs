// crates/bloom_core/src/consts.rs

/// File magic. Written without a terminator.
pub const MAGIC: &[u8; 9] = b"libbloom2";

pub const FORMAT_MAJOR: u8 = 2;
pub const FORMAT_MINOR: u8 = 1;

/// Seed of the first hash; the second one is seeded with the first result.
pub const HASH_SEED: u32 = 0x9747_b28c;

pub const MIN_ENTRIES: u32 = 1000;

/// Metadata record (LE, 40 bytes), everything but the bit buffer:
///   entries u32 | bits u64 | bytes u64 | hashes u8 | error f64
///   ready u8 | major u8 | minor u8 | bpe f64
pub const META_SIZE: usize = 4 + 8 + 8 + 1 + 8 + 1 + 1 + 1 + 8;

/// Magic + u16 length field + metadata record.
pub const HEADER_SIZE: usize = MAGIC.len() + 2 + META_SIZE;

pub const LN_2: f64 = std::f64::consts::LN_2;
pub const LN_2_SQUARED: f64 = LN_2 * LN_2;

const _: () = { assert!(META_SIZE == 40); };
const _: () = { assert!(META_SIZE <= u16::MAX as usize); };

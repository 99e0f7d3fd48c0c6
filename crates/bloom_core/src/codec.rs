//! On-disk format (all fields LE, written field by field):
//!
//!   magic[9]   = "libbloom2"
//!   meta_len[2]= size of the metadata record (META_SIZE)
//!   entries[4] bits[8] bytes[8] hashes[1] error[8]
//!   ready[1] major[1] minor[1] bpe[8]
//!   bit buffer[bytes]
//!
//! The metadata length is the compatibility gate: a file whose record size
//! differs from this build's is rejected before anything else is decoded.

use crate::bits::BitArray;
use crate::consts::{FORMAT_MAJOR, MAGIC, META_SIZE};
use crate::errors::{BloomError, PersistError, Result};
use crate::filter::Bloom;
use crate::params::Params;
use crate::utils::{
    read_f64, read_full, read_u16, read_u32, read_u64, read_u8, write_f64, write_u16, write_u32,
    write_u64, write_u8,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Fixed metadata record; the bit buffer is never part of it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Meta {
    entries: u32,
    bits: u64,
    bytes: u64,
    hashes: u8,
    error: f64,
    ready: u8,
    major: u8,
    minor: u8,
    bpe: f64,
}

impl Meta {
    fn of(bloom: &Bloom) -> Self {
        let (major, minor) = bloom.version();
        Self {
            entries: bloom.entries(),
            bits: bloom.bits(),
            bytes: bloom.bytes(),
            hashes: bloom.hashes(),
            error: bloom.error(),
            ready: u8::from(bloom.is_ready()),
            major,
            minor,
            bpe: bloom.bpe(),
        }
    }

    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32(w, self.entries)?;
        write_u64(w, self.bits)?;
        write_u64(w, self.bytes)?;
        write_u8(w, self.hashes)?;
        write_f64(w, self.error)?;
        write_u8(w, self.ready)?;
        write_u8(w, self.major)?;
        write_u8(w, self.minor)?;
        write_f64(w, self.bpe)
    }

    fn decode(rec: &[u8; META_SIZE]) -> io::Result<Self> {
        let mut r = &rec[..];
        Ok(Self {
            entries: read_u32(&mut r)?,
            bits: read_u64(&mut r)?,
            bytes: read_u64(&mut r)?,
            hashes: read_u8(&mut r)?,
            error: read_f64(&mut r)?,
            ready: read_u8(&mut r)?,
            major: read_u8(&mut r)?,
            minor: read_u8(&mut r)?,
            bpe: read_f64(&mut r)?,
        })
    }

    fn params(&self) -> std::result::Result<Params, PersistError> {
        if self.bits == 0 || self.hashes == 0 {
            return Err(PersistError::CorruptRecord(format!(
                "bits={} hashes={}",
                self.bits, self.hashes
            )));
        }
        if self.bytes != self.bits.div_ceil(8) {
            return Err(PersistError::CorruptRecord(format!(
                "bytes={} does not hold bits={}",
                self.bytes, self.bits
            )));
        }
        Ok(Params {
            entries: self.entries,
            error: self.error,
            bpe: self.bpe,
            bits: self.bits,
            bytes: self.bytes,
            hashes: self.hashes,
        })
    }
}

/// Serialize a ready filter into `w`.
pub fn write_to<W: Write>(bloom: &Bloom, w: &mut W) -> Result<()> {
    let bitmap = bloom.bitmap().ok_or(BloomError::Uninitialized)?;
    let write = |w: &mut W| -> io::Result<()> {
        w.write_all(MAGIC)?;
        write_u16(w, META_SIZE as u16)?;
        Meta::of(bloom).encode(w)?;
        w.write_all(bitmap)
    };
    write(w).map_err(PersistError::Write)?;
    Ok(())
}

/// Create (or overwrite) `path` with the filter. A partially written file is
/// left behind on failure.
pub fn save(bloom: &Bloom, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(PersistError::InvalidPath.into());
    }
    if !bloom.is_ready() {
        return Err(BloomError::Uninitialized);
    }
    let f = File::create(path).map_err(PersistError::Create)?;
    let mut w = BufWriter::new(f);
    write_to(bloom, &mut w)?;
    w.flush().map_err(PersistError::Write)?;
    debug!(path = %path.display(), bytes = bloom.bytes(), "bloom filter saved");
    Ok(())
}

/// Decode a filter from `r`. The returned filter owns a fresh buffer.
pub fn read_from<R: Read>(r: &mut R) -> Result<Bloom> {
    let mut magic = [0u8; MAGIC.len()];
    if read_full(r, &mut magic).map_err(PersistError::Read)? < magic.len() {
        return Err(PersistError::TruncatedHeader.into());
    }
    if &magic != MAGIC {
        return Err(PersistError::WrongMagic.into());
    }

    let mut len = [0u8; 2];
    if read_full(r, &mut len).map_err(PersistError::Read)? < len.len() {
        return Err(PersistError::TruncatedLength.into());
    }
    let size = usize::from(read_u16(&mut &len[..]).map_err(PersistError::Read)?);
    if size != META_SIZE {
        return Err(PersistError::RecordSizeMismatch { expected: META_SIZE, found: size }.into());
    }

    let mut rec = [0u8; META_SIZE];
    if read_full(r, &mut rec).map_err(PersistError::Read)? < META_SIZE {
        return Err(PersistError::TruncatedRecord.into());
    }
    let meta = Meta::decode(&rec).map_err(PersistError::Read)?;
    if meta.major != FORMAT_MAJOR {
        return Err(PersistError::IncompatibleVersion { expected: FORMAT_MAJOR, found: meta.major }.into());
    }
    let params = meta.params()?;

    let n = usize::try_from(params.bytes)
        .map_err(|_| PersistError::Allocation { bytes: params.bytes })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(n)
        .map_err(|_| PersistError::Allocation { bytes: params.bytes })?;
    // only bytes actually present in the input are written into the buffer
    r.by_ref()
        .take(params.bytes)
        .read_to_end(&mut buf)
        .map_err(PersistError::Read)?;
    if buf.len() < n {
        return Err(PersistError::TruncatedData { expected: params.bytes, found: buf.len() as u64 }.into());
    }

    Ok(Bloom::from_parts(params, meta.major, meta.minor, BitArray::from_vec(buf)))
}

/// Load a filter previously written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<Bloom> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(PersistError::InvalidPath.into());
    }
    let f = File::open(path).map_err(PersistError::Open)?;
    let bloom = read_from(&mut BufReader::new(f))?;
    debug!(path = %path.display(), entries = bloom.entries(), "bloom filter loaded");
    Ok(bloom)
}

impl Bloom {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save(self, path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load(path)
    }

    /// Replace `self` with the filter stored at `path`. On failure `self` is
    /// left uninitialized.
    pub fn load_into(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.teardown();
        *self = load(path)?;
        Ok(())
    }

    /// Serialized form as one buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let hint = usize::try_from(self.bytes()).unwrap_or(0);
        let mut out = Vec::with_capacity(crate::consts::HEADER_SIZE.saturating_add(hint));
        write_to(self, &mut out)?;
        Ok(out)
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        read_from(&mut bytes)
    }
}

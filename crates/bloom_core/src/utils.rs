use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> io::Result<()> { w.write_u8(v) }
pub fn write_u16<W: Write>(w: &mut W, v: u16) -> io::Result<()> { w.write_u16::<LE>(v) }
pub fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> { w.write_u32::<LE>(v) }
pub fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> { w.write_u64::<LE>(v) }
pub fn write_f64<W: Write>(w: &mut W, v: f64) -> io::Result<()> { w.write_f64::<LE>(v) }

pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> { r.read_u8() }
pub fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> { r.read_u16::<LE>() }
pub fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> { r.read_u32::<LE>() }
pub fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> { r.read_u64::<LE>() }
pub fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> { r.read_f64::<LE>() }

/// Like `read_exact`, but returns how many bytes were read before EOF
/// instead of failing, so callers can tell a short read from an I/O error.
pub fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_full_reports_short_reads() {
        let mut src: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 5];
        assert_eq!(read_full(&mut src, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn little_endian_layout() {
        let mut out = Vec::new();
        write_u16(&mut out, 0x0102).unwrap();
        write_u32(&mut out, 0x0304_0506).unwrap();
        assert_eq!(out, vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);
        let mut cur = &out[..];
        assert_eq!(read_u16(&mut cur).unwrap(), 0x0102);
        assert_eq!(read_u32(&mut cur).unwrap(), 0x0304_0506);
    }
}

//! Little-endian primitives shared by the header and frame codecs.
//!
//! Every fixed-size read maps a short read to [`ConvertError::Truncated`]; nothing is
//! ever zero-padded.

use crate::errors::{ConvertError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub fn read_u32<R: Read>(r: &mut R, what: &'static str) -> Result<u32> {
    r.read_u32::<LittleEndian>()
        .map_err(|e| ConvertError::from_read(e, what))
}

pub fn read_i32<R: Read>(r: &mut R, what: &'static str) -> Result<i32> {
    r.read_i32::<LittleEndian>()
        .map_err(|e| ConvertError::from_read(e, what))
}

pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<()> {
    w.write_u32::<LittleEndian>(value)?;
    Ok(())
}

pub fn write_i32<W: Write>(w: &mut W, value: i32) -> Result<()> {
    w.write_i32::<LittleEndian>(value)?;
    Ok(())
}

/// Read exactly `n` bytes. The buffer grows with the data actually present, so a
/// corrupt length cannot force a huge up-front allocation.
pub fn read_bytes<R: Read>(r: &mut R, n: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(n.min(1 << 20));
    r.by_ref().take(n as u64).read_to_end(&mut buf)?;
    if buf.len() != n {
        return Err(ConvertError::Truncated { what });
    }
    Ok(buf)
}

pub fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    w.write_all(bytes)?;
    Ok(())
}

/// Read an i32 that may legitimately be absent: `Ok(None)` when the stream is already
/// at EOF, [`ConvertError::Truncated`] when it ends part-way through the integer.
pub fn read_i32_or_eof<R: Read>(r: &mut R, what: &'static str) -> Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ConvertError::Io(e)),
        }
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(i32::from_le_bytes(buf))),
        _ => Err(ConvertError::Truncated { what }),
    }
}

/// Reader adapter that copies every byte it yields into a second writer.
///
/// The header codec reads through this so the header output is the exact byte prefix
/// of the source rather than a re-encoding of the parsed values.
pub struct TeeReader<'a, R, W> {
    inner: &'a mut R,
    copy: &'a mut W,
    consumed: u64,
}

impl<'a, R: Read, W: Write> TeeReader<'a, R, W> {
    pub fn new(inner: &'a mut R, copy: &'a mut W) -> Self {
        Self {
            inner,
            copy,
            consumed: 0,
        }
    }

    /// Bytes read (and copied) so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl<R: Read, W: Write> Read for TeeReader<'_, R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.copy.write_all(&buf[..n])?;
        self.consumed += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn u32_i32_little_endian() {
        let mut out: Vec<u8> = Vec::new();
        write_u32(&mut out, 0x6767_6d6c).unwrap();
        write_i32(&mut out, -2).unwrap();
        assert_eq!(&out[..4], &[0x6c, 0x6d, 0x67, 0x67]);
        let mut r = Cursor::new(out);
        assert_eq!(read_u32(&mut r, "a").unwrap(), 0x6767_6d6c);
        assert_eq!(read_i32(&mut r, "b").unwrap(), -2);
    }

    #[test]
    fn short_int_is_truncated() {
        let mut r = Cursor::new(vec![1u8, 2, 3]);
        assert!(matches!(
            read_u32(&mut r, "n_vocab"),
            Err(ConvertError::Truncated { what: "n_vocab" })
        ));
    }

    #[test]
    fn short_bytes_are_truncated_not_padded() {
        let mut r = Cursor::new(vec![9u8; 5]);
        assert!(matches!(
            read_bytes(&mut r, 8, "data"),
            Err(ConvertError::Truncated { .. })
        ));
        let mut r = Cursor::new(vec![9u8; 5]);
        assert_eq!(read_bytes(&mut r, 5, "data").unwrap(), vec![9u8; 5]);
    }

    #[test]
    fn eof_probe_distinguishes_clean_end() {
        let mut empty = Cursor::new(Vec::<u8>::new());
        assert_eq!(read_i32_or_eof(&mut empty, "n_dims").unwrap(), None);

        let mut partial = Cursor::new(vec![1u8, 0]);
        assert!(matches!(
            read_i32_or_eof(&mut partial, "n_dims"),
            Err(ConvertError::Truncated { .. })
        ));

        let mut full = Cursor::new(2i32.to_le_bytes().to_vec());
        assert_eq!(read_i32_or_eof(&mut full, "n_dims").unwrap(), Some(2));
    }

    #[test]
    fn tee_copies_consumed_bytes_only() {
        let mut src = Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
        let mut copy: Vec<u8> = Vec::new();
        {
            let mut tee = TeeReader::new(&mut src, &mut copy);
            let got = read_bytes(&mut tee, 4, "x").unwrap();
            assert_eq!(got, vec![1, 2, 3, 4]);
            assert_eq!(tee.consumed(), 4);
        }
        assert_eq!(copy, vec![1, 2, 3, 4]);
        assert_eq!(read_bytes(&mut src, 2, "rest").unwrap(), vec![5, 6]);
    }
}

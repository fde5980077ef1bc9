//! Little-endian typed reader over a seekable byte source.

use std::io::{Read, Seek, SeekFrom};

use super::format::trim_fixed;
use crate::{Error, Result};

/// Sequential reader with absolute seeking.
///
/// Every read advances the position by its width. A read that cannot be
/// satisfied fails with [`Error::Read`] naming the requested field and the
/// offset the read started at.
pub struct BinaryReader<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> BinaryReader<R> {
    /// Wrap a byte source. The source is assumed to be positioned at 0.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Current byte offset.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Seek to an absolute byte offset.
    pub fn seek(&mut self, offset: u64, field: &'static str) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|source| Error::Read {
                field,
                offset,
                source,
            })?;
        self.pos = offset;
        Ok(())
    }

    /// Read exactly `N` bytes.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf, field)?;
        Ok(buf)
    }

    /// Read exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf, field)?;
        Ok(buf)
    }

    pub fn read_i32(&mut self, field: &'static str) -> Result<i32> {
        self.read_array(field).map(i32::from_le_bytes)
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        self.read_array(field).map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64> {
        self.read_array(field).map(u64::from_le_bytes)
    }

    pub fn read_f32(&mut self, field: &'static str) -> Result<f32> {
        self.read_array(field).map(f32::from_le_bytes)
    }

    /// Read a zero-padded text field of `width` bytes.
    ///
    /// Trailing zero bytes are stripped; the rest must be valid UTF-8.
    pub fn read_fixed_str(&mut self, width: usize, field: &'static str) -> Result<String> {
        let offset = self.pos;
        let raw = self.read_bytes(width, field)?;
        let text = trim_fixed(&raw);
        match std::str::from_utf8(text) {
            Ok(s) => Ok(s.to_owned()),
            Err(e) => Err(Error::Format {
                field,
                offset,
                reason: e.to_string(),
            }),
        }
    }

    fn fill(&mut self, buf: &mut [u8], field: &'static str) -> Result<()> {
        let offset = self.pos;
        self.inner
            .read_exact(buf)
            .map_err(|source| Error::Read {
                field,
                offset,
                source,
            })?;
        self.pos += buf.len() as u64;
        Ok(())
    }
}

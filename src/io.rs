//! Primitive field I/O
//!
//! Turns a sequential byte stream into typed fields and back, with no
//! knowledge of module semantics. Every read either fills its field completely
//! or fails with `ModError::ShortRead`; every write either hands over all of its
//! bytes or fails with `ModError::ShortWrite`. There is no seeking and no
//! partial-success return.

use std::io::{ErrorKind, Read, Write};

use byteorder::{BigEndian, ByteOrder};

use crate::errors::{ModError, ModResult};
use crate::utils::{latin1_to_bytes, latin1_to_string};

/// Reads fixed-layout fields from any `Read`, tracking the stream offset
#[derive(Debug)]
pub struct FieldReader<R> {
    inner: R,
    position: usize,
}

impl<R: Read> FieldReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely or fail with `ShortRead`
    pub fn read_into(&mut self, field: &str, buf: &mut [u8]) -> ModResult<()> {
        let offset = self.position;
        let mut filled = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(ModError::ShortRead {
                        field: field.to_string(),
                        offset,
                        needed: buf.len(),
                        available: filled,
                    });
                },
                Ok(n) => {
                    filled += n;
                    self.position += n;
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(ModError::ShortRead {
                        field: field.to_string(),
                        offset,
                        needed: buf.len(),
                        available: filled,
                    });
                },
                Err(e) => {
                    return Err(ModError::Io {
                        kind: e.kind(),
                        reason: format!("reading {} at offset {}: {}", field, offset, e),
                    });
                },
            }
        }

        Ok(())
    }

    /// Read exactly `len` raw bytes
    pub fn read_exact(&mut self, field: &str, len: usize) -> ModResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(field, &mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self, field: &str) -> ModResult<u8> {
        let mut buf = [0u8; 1];
        self.read_into(field, &mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16_be(&mut self, field: &str) -> ModResult<u16> {
        let mut buf = [0u8; 2];
        self.read_into(field, &mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    /// Read a signed 4-bit value from the low nibble of one byte.
    /// The high nibble is ignored.
    pub fn read_low_nibble(&mut self, field: &str) -> ModResult<i8> {
        let byte = self.read_u8(field)?;
        // Shift the nibble to the top and back to sign-extend it
        Ok(((byte << 4) as i8) >> 4)
    }

    /// Read an `n`-byte text field; text stops at the first zero byte and the
    /// padding after it is discarded
    pub fn read_fixed_text(&mut self, field: &str, len: usize) -> ModResult<String> {
        let raw = self.read_exact(field, len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(latin1_to_string(&raw[..end]))
    }
}

/// Writes fixed-layout fields to any `Write`, tracking the stream offset
#[derive(Debug)]
pub struct FieldWriter<W> {
    inner: W,
    position: usize,
}

impl<W: Write> FieldWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> ModResult<()> {
        self.inner.flush().map_err(|e| ModError::Io {
            kind: e.kind(),
            reason: format!("flushing at offset {}: {}", self.position, e),
        })
    }

    /// Hand over all of `data` or fail with `ShortWrite`
    pub fn write_exact(&mut self, field: &str, data: &[u8]) -> ModResult<()> {
        let offset = self.position;
        let mut written = 0;

        while written < data.len() {
            match self.inner.write(&data[written..]) {
                Ok(0) => {
                    return Err(ModError::ShortWrite {
                        field: field.to_string(),
                        offset,
                        expected: data.len(),
                        written,
                    });
                },
                Ok(n) => {
                    written += n;
                    self.position += n;
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WriteZero => {
                    return Err(ModError::ShortWrite {
                        field: field.to_string(),
                        offset,
                        expected: data.len(),
                        written,
                    });
                },
                Err(e) => {
                    return Err(ModError::Io {
                        kind: e.kind(),
                        reason: format!("writing {} at offset {}: {}", field, offset, e),
                    });
                },
            }
        }

        Ok(())
    }

    pub fn write_u8(&mut self, field: &str, value: u8) -> ModResult<()> {
        self.write_exact(field, &[value])
    }

    pub fn write_u16_be(&mut self, field: &str, value: u16) -> ModResult<()> {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.write_exact(field, &buf)
    }

    /// Store a signed 4-bit value in the low nibble; the high nibble is zero
    pub fn write_signed_nibble(&mut self, field: &str, value: i8) -> ModResult<()> {
        self.write_u8(field, (value as u8) & 0x0F)
    }

    /// Write `text` zero-padded to exactly `len` bytes
    pub fn write_fixed_text(&mut self, field: &str, text: &str, len: usize) -> ModResult<()> {
        let mut raw = latin1_to_bytes(field, text)?;
        if raw.len() > len {
            return Err(ModError::FieldTooLong {
                field: field.to_string(),
                len: raw.len(),
                max: len,
            });
        }
        raw.resize(len, 0);
        self.write_exact(field, &raw)
    }
}

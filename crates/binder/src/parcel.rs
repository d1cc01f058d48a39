//! Flat wire payloads exchanged with the vendor radio service.
//!
//! The encoding is deliberately small: fixed-width little-endian integers,
//! booleans as 32-bit 0/1, and length-prefixed UTF-8 strings and byte
//! vectors (a `u32` length followed by the raw bytes, no padding). Requests
//! carry the correlation serial as their first field; indications do not.
//!
//! Reads are checked. A malformed payload yields `Error::Truncated` or
//! `Error::BadLength` instead of reading past the declared end.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Write side of a wire payload.
#[derive(Debug, Default, Clone)]
pub struct Parcel {
    buf: BytesMut,
}

impl Parcel {
    /// Create an empty parcel
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32_le(v);
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32_le(v);
        self
    }

    /// Booleans travel as a 32-bit 0/1 word
    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_i32(if v { 1 } else { 0 })
    }

    /// Length-prefixed UTF-8 string
    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.buf.put_u32_le(s.len() as u32);
        self.buf.put_slice(s.as_bytes());
        self
    }

    /// Length-prefixed byte vector
    pub fn write_bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.put_u32_le(b.len() as u32);
        self.buf.put_slice(b);
        self
    }

    /// Freeze the payload for transmission.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Consume the parcel and hand back a checked reader over its bytes.
    pub fn into_reader(self) -> Reader {
        Reader::new(self.buf.freeze())
    }
}

impl From<Bytes> for Parcel {
    fn from(bytes: Bytes) -> Self {
        Self { buf: BytesMut::from(&bytes[..]) }
    }
}

/// Read side of a wire payload. Advances through the buffer; every read is
/// bounds-checked against the declared payload length.
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            Err(Error::Truncated { needed: n, remaining: self.buf.remaining() })
        } else {
            Ok(())
        }
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_i32()? != 0)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_len_prefixed()?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.read_len_prefixed()
    }

    fn read_len_prefixed(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32()? as usize;
        if self.buf.remaining() < len {
            return Err(Error::BadLength { len, remaining: self.buf.remaining() });
        }
        let mut out = vec![0u8; len];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }
}

use crate::{Error, Result};

/// Cursor provides bounds checked sequential reads over a borrowed byte buffer.
///
/// Reads are all-or-nothing: a read that cannot be satisfied returns
/// [Error::InsufficientData] and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    /// Return the next `n` bytes and advance past them.
    ///
    /// # Errors
    /// [Error::InsufficientData] if fewer than `n` bytes remain.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(Error::InsufficientData {
                needed: n,
                available,
            });
        }
        let (buf, start) = (self.buf, self.pos);
        self.pos += n;
        Ok(&buf[start..self.pos])
    }

    /// Read the next `N` bytes into an owned array.
    ///
    /// # Errors
    /// [Error::InsufficientData] if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.read_exact(N)?);
        Ok(arr)
    }

    /// # Errors
    /// [Error::InsufficientData] if no bytes remain.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a big-endian u16, converting to host order.
    ///
    /// # Errors
    /// [Error::InsufficientData] if fewer than 2 bytes remain.
    pub fn read_be_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian u32, converting to host order.
    ///
    /// # Errors
    /// [Error::InsufficientData] if fewer than 4 bytes remain.
    pub fn read_be_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.remaining() == 0
    }
}

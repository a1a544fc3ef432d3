//! Big-endian decoding helper for the wire formats.

use core::convert::TryInto;

use crate::{Error, Result};

/// Sequential reader over an encoded value. Every read fails with
/// `Error::Decode` on truncated input.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {

    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.off < len {
            return Err(Error::Decode("truncated input"));
        }
        let r = &self.buf[self.off..(self.off + len)];
        self.off += len;
        Ok(r)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        // bytes() returned exactly N bytes, the conversion cannot fail.
        self.bytes(N)?.try_into().map_err(|_| Error::Decode("truncated input"))
    }

    /// Succeeds only if the whole input was consumed.
    pub(crate) fn finish(self) -> Result<()> {
        if self.off != self.buf.len() {
            return Err(Error::Decode("trailing bytes"));
        }
        Ok(())
    }
}

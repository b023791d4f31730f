use crate::config::WireConfig;
use crate::config::Width;
use crate::error::Error;
use crate::error::Result;

/// A bounds-checked read cursor over a borrowed frame.
///
/// Every read either returns exactly the requested bytes or fails with
/// `Error::TruncatedFrame`; the position never moves past the end.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Takes the next `len` bytes.
    pub fn take(&mut self, len: u64) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        let n = usize::try_from(len)
            .ok()
            .filter(|n| *n <= remaining)
            .ok_or(Error::TruncatedFrame { needed: len, remaining: remaining as u64 })?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads one unsigned field of `width` in the configured byte order.
    pub fn uint(&mut self, config: &WireConfig, width: Width) -> Result<u64> {
        let bytes = self.take(width.bytes() as u64)?;
        Ok(config.get_uint(bytes))
    }
}

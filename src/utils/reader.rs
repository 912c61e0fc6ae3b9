use crate::error::{Result, VdkError};

/// A bounds-checked big-endian byte reader for binary side channels.
///
/// Every read validates the remaining length first and returns
/// `VdkError::NonCompliantBitstream` instead of panicking, so it can be
/// pointed at untrusted packet properties.
///
/// Example:
/// ```
/// use vdkdump::utils::ByteReader;
///
/// let data = [0x00, 0x00, 0x01, 0x00, 0x7f];
/// let mut reader = ByteReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 256);
/// assert_eq!(reader.read_u8().unwrap(), 0x7f);
/// assert!(reader.read_u8().is_err());
/// ```
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new reader positioned at the first byte
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, offset: 0 }
    }

    /// Returns the next `n` bytes and advances past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                VdkError::NonCompliantBitstream(format!(
                    "read of {} bytes at offset {} overruns {} byte buffer",
                    n,
                    self.offset,
                    self.data.len()
                ))
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_slice(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Skips n bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_slice(n).map(|_| ())
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn position(&self) -> usize {
        self.offset
    }
}

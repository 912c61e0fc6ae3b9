use crate::error::Result;
use bytes::Bytes;

/// Reusable write buffer for synthesized output units.
///
/// The backing allocation is created on first use and only ever grows, so
/// steady-state packets of similar size do not reallocate.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Clears the buffer, reserves `size_hint` bytes, lets `fill` write the
    /// unit and returns a frozen copy together with the new capacity.
    pub fn write<F>(&mut self, size_hint: usize, fill: F) -> Result<(Bytes, usize)>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        self.buf.clear();
        self.buf.try_reserve(size_hint)?;
        fill(&mut self.buf)?;
        Ok((Bytes::copy_from_slice(&self.buf), self.buf.capacity()))
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capacity_never_shrinks() {
        let mut scratch = ScratchBuffer::new();
        assert_eq!(scratch.capacity(), 0);

        let (big, cap_big) = scratch
            .write(4096, |buf| {
                buf.extend_from_slice(&[1u8; 4096]);
                Ok(())
            })
            .unwrap();
        assert_eq!(big.len(), 4096);

        let (small, cap_small) = scratch
            .write(8, |buf| {
                buf.extend_from_slice(b"FRAME\n");
                Ok(())
            })
            .unwrap();
        assert_eq!(&small[..], b"FRAME\n");
        assert!(cap_small >= cap_big);
        // The first unit is an independent copy
        assert_eq!(big[0], 1);
    }

    #[test]
    fn test_fill_error_is_propagated() {
        let mut scratch = ScratchBuffer::new();
        let res = scratch.write(16, |_| {
            Err(crate::VdkError::InvalidData("short frame".into()))
        });
        assert!(res.is_err());
    }
}

use crate::error::{Result, VdkError};
use crate::utils::ByteReader;

/// Size of one subsample record:
/// `[flags u32][size u32][reserved u32][priority u8][discardable u8]`
pub const SUBSAMPLE_RECORD_SIZE: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsample {
    pub flags: u32,
    pub size: u32,
    pub reserved: u32,
    pub priority: u8,
    pub discardable: u8,
}

/// Decoded subsample side channel of one packet.
///
/// The first entry covers the XML text; the following entries cover the
/// binary payloads appended after it, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsampleTable {
    entries: Vec<Subsample>,
}

impl SubsampleTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < SUBSAMPLE_RECORD_SIZE {
            return Err(VdkError::NonCompliantBitstream(format!(
                "subsample table of {} bytes holds no record",
                data.len()
            )));
        }
        let mut reader = ByteReader::new(data);
        let mut entries = Vec::with_capacity(data.len() / SUBSAMPLE_RECORD_SIZE);
        // A trailing partial record is ignored
        while reader.remaining() >= SUBSAMPLE_RECORD_SIZE {
            entries.push(Subsample {
                flags: reader.read_u32()?,
                size: reader.read_u32()?,
                reserved: reader.read_u32()?,
                priority: reader.read_u8()?,
                discardable: reader.read_u8()?,
            });
        }
        Ok(Self { entries })
    }

    /// Declared size of the XML text.
    pub fn text_size(&self) -> usize {
        self.entries[0].size as usize
    }

    /// Number of binary payload entries.
    pub fn payload_count(&self) -> usize {
        self.entries.len() - 1
    }

    /// Byte range of binary payload `index` (1-based) inside the data that
    /// follows the text, validated against `aux_len`.
    pub fn payload_range(&self, index: usize, aux_len: usize) -> Result<std::ops::Range<usize>> {
        if index == 0 || index > self.payload_count() {
            return Err(VdkError::NonCompliantBitstream(format!(
                "no subsample with index {} ({} present)",
                index,
                self.payload_count()
            )));
        }
        let payloads = &self.entries[1..];
        let offset: usize = payloads[..index - 1].iter().map(|s| s.size as usize).sum();
        let size = payloads[index - 1].size as usize;
        if size == 0 || offset + size > aux_len {
            return Err(VdkError::NonCompliantBitstream(format!(
                "subsample {} spans {}..{} but only {} bytes follow the text",
                index,
                offset,
                offset + size,
                aux_len
            )));
        }
        Ok(offset..offset + size)
    }

    pub fn entries(&self) -> &[Subsample] {
        &self.entries
    }
}

#[cfg(test)]
pub(crate) fn encode_table(sizes: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(sizes.len() * SUBSAMPLE_RECORD_SIZE);
    for size in sizes {
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.push(0);
        out.push(0);
    }
    out
}

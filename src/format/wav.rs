use bytes::{BufMut, Bytes, BytesMut};

pub const WAV_HEADER_SIZE: usize = 44;

const WAVE_FORMAT_PCM: u16 = 1;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

/// Parameters of a canonical RIFF/WAVE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub float: bool,
    /// Size of the `data` chunk payload
    pub data_size: u32,
}

impl WavHeader {
    fn wide_block_align(&self) -> u64 {
        self.channels as u64 * (self.bits_per_sample as u64 / 8)
    }

    fn wide_byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.wide_block_align()
    }

    /// Whether byte rate and block align fit their header fields.
    pub fn is_representable(&self) -> bool {
        u16::try_from(self.wide_block_align()).is_ok() && u32::try_from(self.wide_byte_rate()).is_ok()
    }

    /// Saturates when the layout is not representable.
    pub fn byte_rate(&self) -> u32 {
        u32::try_from(self.wide_byte_rate()).unwrap_or(u32::MAX)
    }

    pub fn block_align(&self) -> u16 {
        u16::try_from(self.wide_block_align()).unwrap_or(u16::MAX)
    }

    /// Serializes the 44-byte header, all fields little-endian.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(WAV_HEADER_SIZE);
        buf.put_slice(b"RIFF");
        buf.put_u32_le(self.data_size.wrapping_add(36));
        buf.put_slice(b"WAVE");

        buf.put_slice(b"fmt ");
        buf.put_u32_le(16);
        buf.put_u16_le(if self.float {
            WAVE_FORMAT_IEEE_FLOAT
        } else {
            WAVE_FORMAT_PCM
        });
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.sample_rate);
        buf.put_u32_le(self.byte_rate());
        buf.put_u16_le(self.block_align());
        buf.put_u16_le(self.bits_per_sample);

        buf.put_slice(b"data");
        buf.put_u32_le(self.data_size);
        buf.freeze()
    }

    /// All-zero header written while the data size is still unknown.
    pub fn placeholder() -> Bytes {
        Bytes::from_static(&[0u8; WAV_HEADER_SIZE])
    }
}

use crate::error::{Result, VdkError};
use bytes::BufMut;

pub const BMP_HEADER_SIZE: usize = 54;

/// `BM` magic, 19778 little-endian
const BMP_MAGIC: u16 = 0x4D42;

/// Bytes per BMP row of 24-bit pixels, padded to a multiple of 4.
pub fn row_size(width: u32) -> usize {
    ((width as usize * 3) + 3) & !3
}

/// Total file size of a 24 bpp bottom-up BMP.
pub fn file_size(width: u32, height: u32) -> usize {
    BMP_HEADER_SIZE + row_size(width) * height as usize
}

/// Writes a BITMAPFILEHEADER + BITMAPINFOHEADER followed by the pixel rows
/// of `src` in bottom-up order.
///
/// `src` holds `height` rows of packed BGR pixels, `stride` bytes apart.
pub fn write_bmp(
    out: &mut Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    src: &[u8],
) -> Result<()> {
    let line = width as usize * 3;
    let stride = if stride == 0 { line } else { stride };
    if stride < line {
        return Err(VdkError::InvalidData(format!(
            "stride {} shorter than a {} pixel row",
            stride, width
        )));
    }
    let needed = stride * (height as usize).saturating_sub(1) + line;
    if height > 0 && src.len() < needed {
        return Err(VdkError::InvalidData(format!(
            "frame is {} bytes, {}x{} BGR needs {}",
            src.len(),
            width,
            height,
            needed
        )));
    }

    let row = row_size(width);
    let image_size = row * height as usize;

    // BITMAPFILEHEADER
    out.put_u16_le(BMP_MAGIC);
    out.put_u32_le((BMP_HEADER_SIZE + image_size) as u32);
    out.put_u16_le(0);
    out.put_u16_le(0);
    out.put_u32_le(BMP_HEADER_SIZE as u32);

    // BITMAPINFOHEADER
    out.put_u32_le(40);
    out.put_i32_le(width as i32);
    out.put_i32_le(height as i32);
    out.put_u16_le(1);
    out.put_u16_le(24);
    out.put_u32_le(0);
    out.put_u32_le(image_size as u32);
    out.put_u32_le(0);
    out.put_u32_le(0);
    out.put_u32_le(0);
    out.put_u32_le(0);

    let padding = row - line;
    for y in (0..height as usize).rev() {
        let start = y * stride;
        out.put_slice(&src[start..start + line]);
        out.put_bytes(0, padding);
    }
    Ok(())
}

use crate::av::{Fraction, Interlacing, PixelFormat};
use crate::error::{Result, VdkError};

pub const Y4M_FRAME_MARKER: &[u8] = b"FRAME\n";

/// YUV4MPEG2 stream parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Y4mHeader {
    pub width: u32,
    pub height: u32,
    pub fps: Fraction,
    pub sar: Fraction,
    pub interlacing: Interlacing,
    pub pixel_format: PixelFormat,
    /// Appended verbatim after the standard fields
    pub metadata: Option<String>,
}

impl Y4mHeader {
    /// `YUV4MPEG2 W<w> H<h> F<n>:<d> A<n>:<d> I<i> C<chroma>[ meta]\n`
    pub fn to_line(&self) -> Result<String> {
        let chroma = self.pixel_format.y4m_chroma().ok_or_else(|| {
            VdkError::UnsupportedInput(format!(
                "pixel format {} cannot be stored in y4m",
                self.pixel_format
            ))
        })?;
        let mut line = format!(
            "YUV4MPEG2 W{} H{} F{}:{} A{}:{} I{} C{}",
            self.width,
            self.height,
            self.fps.num,
            self.fps.den,
            self.sar.num,
            self.sar.den,
            self.interlacing.y4m_tag(),
            chroma
        );
        if let Some(meta) = self.metadata.as_deref().filter(|m| !m.is_empty()) {
            line.push(' ');
            line.push_str(meta);
        }
        line.push('\n');
        Ok(line)
    }
}

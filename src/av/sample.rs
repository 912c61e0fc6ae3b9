use crate::error::VdkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Uncompressed pixel layouts the writer can request or dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PixelFormat {
    Yuv420,
    Yuv420P10,
    Yuv422,
    Yuv422P10,
    Yuv444,
    Yuv444P10,
    Nv12,
    Nv21,
    Grey,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

const PIXEL_FORMATS: &[PixelFormat] = &[
    PixelFormat::Yuv420,
    PixelFormat::Yuv420P10,
    PixelFormat::Yuv422,
    PixelFormat::Yuv422P10,
    PixelFormat::Yuv444,
    PixelFormat::Yuv444P10,
    PixelFormat::Nv12,
    PixelFormat::Nv21,
    PixelFormat::Grey,
    PixelFormat::Rgb,
    PixelFormat::Bgr,
    PixelFormat::Rgba,
    PixelFormat::Bgra,
];

impl PixelFormat {
    /// Short name, also used as the raw dump file extension.
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Yuv420 => "yuv",
            PixelFormat::Yuv420P10 => "yuvl",
            PixelFormat::Yuv422 => "yuv2",
            PixelFormat::Yuv422P10 => "yp2l",
            PixelFormat::Yuv444 => "yuv4",
            PixelFormat::Yuv444P10 => "yp4l",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Nv21 => "nv21",
            PixelFormat::Grey => "grey",
            PixelFormat::Rgb => "rgb",
            PixelFormat::Bgr => "bgr",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
        }
    }

    /// Pixel format implied by a raw dump extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        PIXEL_FORMATS.iter().copied().find(|f| f.name() == ext)
    }

    /// YUV4MPEG2 `C` tag, `None` for formats Y4M cannot carry.
    pub fn y4m_chroma(&self) -> Option<&'static str> {
        match self {
            PixelFormat::Yuv420 => Some("420jpeg"),
            PixelFormat::Yuv420P10 => Some("420p10"),
            PixelFormat::Yuv422 => Some("422"),
            PixelFormat::Yuv422P10 => Some("422p10"),
            PixelFormat::Yuv444 => Some("444"),
            PixelFormat::Yuv444P10 => Some("444p10"),
            PixelFormat::Grey => Some("mono"),
            _ => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = VdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelFormat::from_extension(s)
            .ok_or_else(|| VdkError::Config(format!("unknown pixel format '{}'", s)))
    }
}

impl TryFrom<String> for PixelFormat {
    type Error = VdkError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PixelFormat> for String {
    fn from(f: PixelFormat) -> Self {
        f.name().to_string()
    }
}

/// Uncompressed audio sample layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioFormat {
    U8,
    S16,
    S24,
    S32,
    Flt,
    Dbl,
    S16P,
    S32P,
    FltP,
}

const AUDIO_FORMATS: &[AudioFormat] = &[
    AudioFormat::U8,
    AudioFormat::S16,
    AudioFormat::S24,
    AudioFormat::S32,
    AudioFormat::Flt,
    AudioFormat::Dbl,
    AudioFormat::S16P,
    AudioFormat::S32P,
    AudioFormat::FltP,
];

impl AudioFormat {
    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::U8 => "u8",
            AudioFormat::S16 => "s16",
            AudioFormat::S24 => "s24",
            AudioFormat::S32 => "s32",
            AudioFormat::Flt => "flt",
            AudioFormat::Dbl => "dbl",
            AudioFormat::S16P => "s16p",
            AudioFormat::S32P => "s32p",
            AudioFormat::FltP => "fltp",
        }
    }

    pub fn bytes_per_sample(&self) -> u32 {
        match self {
            AudioFormat::U8 => 1,
            AudioFormat::S16 | AudioFormat::S16P => 2,
            AudioFormat::S24 => 3,
            AudioFormat::S32 | AudioFormat::S32P | AudioFormat::Flt | AudioFormat::FltP => 4,
            AudioFormat::Dbl => 8,
        }
    }

    pub fn is_planar(&self) -> bool {
        matches!(self, AudioFormat::S16P | AudioFormat::S32P | AudioFormat::FltP)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, AudioFormat::Flt | AudioFormat::Dbl | AudioFormat::FltP)
    }

    /// Sample format implied by a raw dump extension; `pcm` means s16.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "pcm" {
            return Some(AudioFormat::S16);
        }
        AUDIO_FORMATS.iter().copied().find(|f| f.name() == ext)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AudioFormat {
    type Err = VdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AudioFormat::from_extension(s)
            .ok_or_else(|| VdkError::Config(format!("unknown audio format '{}'", s)))
    }
}

impl TryFrom<String> for AudioFormat {
    type Error = VdkError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AudioFormat> for String {
    fn from(f: AudioFormat) -> Self {
        f.name().to_string()
    }
}

/// Field order of an interlaced source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlacing {
    #[default]
    Progressive,
    TopFirst,
    BottomFirst,
}

impl Interlacing {
    /// YUV4MPEG2 `I` tag
    pub fn y4m_tag(&self) -> char {
        match self {
            Interlacing::Progressive => 'p',
            Interlacing::TopFirst => 't',
            Interlacing::BottomFirst => 'b',
        }
    }
}

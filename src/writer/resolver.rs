use super::emission::Emission;
use crate::av::{AudioFormat, CodecId, Fraction, FormatChange, OutputProps, PixelFormat, PortProps, StreamType};
use crate::codec;
use crate::config::{DecInfoMode, WriterConfig};
use crate::error::{Result, VdkError};
use crate::format::text::{normalize_preamble, CueStyle, TTXT_HEADER, WEBVTT_PREAMBLE};
use crate::format::wav::WavHeader;
use crate::format::y4m::Y4mHeader;
use bytes::Bytes;

/// Free-form port property appended to the Y4M stream header.
pub const PROP_Y4M_META: &str = "y4m_meta";

/// Output descriptor fixed at connection time.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub codec_id: CodecId,
    pub output: OutputProps,
    pub emission: Emission,
    /// Never `Auto`
    pub decinfo: DecInfoMode,
    /// One output file per unit
    pub split: bool,
    /// Unit written inline according to `decinfo`
    pub inline_config: Option<Bytes>,
    pub dash: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Ready(Box<Resolution>),
    /// The input must deliver another raw format before resolving again
    Renegotiate(FormatChange),
}

fn normalize_ext(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    (!ext.is_empty()).then_some(ext)
}

fn unsupported(msg: String) -> VdkError {
    VdkError::UnsupportedInput(msg)
}

/// Interleaved counterpart of a planar sample format.
fn interleaved(format: AudioFormat) -> AudioFormat {
    match format {
        AudioFormat::S16P => AudioFormat::S16,
        AudioFormat::S32P => AudioFormat::S32,
        AudioFormat::FltP => AudioFormat::Flt,
        other => other,
    }
}

fn pixel_target(config: &WriterConfig, current: PixelFormat, ext: Option<&str>) -> Result<PixelFormat> {
    Ok(match ext {
        Some("bmp") => PixelFormat::Bgr,
        Some("y4m") => config
            .pfmt
            .or(Some(current))
            .filter(|f| f.y4m_chroma().is_some())
            .unwrap_or(PixelFormat::Yuv420),
        Some(ext) => match config.pfmt {
            Some(format) => format,
            None => PixelFormat::from_extension(ext).ok_or_else(|| {
                unsupported(format!("cannot derive a pixel format from extension '{}'", ext))
            })?,
        },
        None => config.pfmt.unwrap_or(current),
    })
}

fn audio_target(config: &WriterConfig, current: AudioFormat, ext: Option<&str>) -> Result<AudioFormat> {
    Ok(match ext {
        Some("wav") => interleaved(config.afmt.unwrap_or(current)),
        Some(ext) => match config.afmt {
            Some(format) => format,
            None => AudioFormat::from_extension(ext).ok_or_else(|| {
                unsupported(format!("cannot derive a sample format from extension '{}'", ext))
            })?,
        },
        None => config.afmt.unwrap_or(current),
    })
}

/// Derives the complete output descriptor of a connection.
///
/// `requested_ext` is the extension the downstream consumer already
/// committed to, if any. Raw video and audio may require a different
/// input format first, reported as [`Resolved::Renegotiate`].
pub fn resolve(config: &WriterConfig, props: &PortProps, requested_ext: Option<&str>) -> Result<Resolved> {
    let codec_id = props
        .codec_id
        .ok_or_else(|| unsupported("input port carries no codec id".into()))?;
    let requested = requested_ext.and_then(normalize_ext);
    let requested = requested.as_deref();

    let mut split = config.per_unit();
    let mut decinfo = match config.decinfo {
        DecInfoMode::Auto if codec::needs_inline_config(codec_id) => DecInfoMode::First,
        DecInfoMode::Auto => DecInfoMode::No,
        mode => mode,
    };
    let decoder_config = props.decoder_config.clone().filter(|c| !c.is_empty());
    let mut inline_config = decoder_config.clone();
    let table_ext = codec::codec_info(codec_id).map(|info| info.file_ext);

    let (emission, file_ext) = match codec_id {
        CodecId::RawVideo => {
            let current = props
                .pixel_format
                .ok_or_else(|| unsupported("raw video without pixel format".into()))?;
            let target = pixel_target(config, current, requested)?;
            if target != current {
                return Ok(Resolved::Renegotiate(FormatChange::Pixel(target)));
            }
            inline_config = None;
            decinfo = DecInfoMode::No;
            match requested {
                Some("bmp") => {
                    split = true;
                    let emission = Emission::Bmp {
                        width: props.width,
                        height: props.height,
                        stride: props.stride as usize,
                    };
                    (emission, "bmp".to_string())
                }
                Some("y4m") => {
                    let header = Y4mHeader {
                        width: props.width,
                        height: props.height,
                        fps: props.fps.unwrap_or(Fraction::new(25, 1)),
                        sar: props.sar.unwrap_or(Fraction::new(1, 1)),
                        interlacing: props.interlacing,
                        pixel_format: target,
                        metadata: props.extra.get_str(PROP_Y4M_META).map(str::to_string),
                    };
                    (Emission::Y4m { header: header.to_line()? }, "y4m".to_string())
                }
                Some(ext) => (Emission::Forward, ext.to_string()),
                None => (Emission::Forward, target.name().to_string()),
            }
        }
        CodecId::RawAudio => {
            let current = props
                .audio_format
                .ok_or_else(|| unsupported("raw audio without sample format".into()))?;
            let target = audio_target(config, current, requested)?;
            if target != current {
                return Ok(Resolved::Renegotiate(FormatChange::Audio(target)));
            }
            inline_config = None;
            let frame_size = target.bytes_per_sample() * props.channels;
            match requested {
                Some("wav") => {
                    decinfo = DecInfoMode::No;
                    split = false;
                    let channels = u16::try_from(props.channels)
                        .map_err(|_| unsupported(format!("{} channels cannot be stored in wav", props.channels)))?;
                    let header = WavHeader {
                        sample_rate: props.sample_rate,
                        channels,
                        bits_per_sample: (target.bytes_per_sample() * 8) as u16,
                        float: target.is_float(),
                        data_size: 0,
                    };
                    if !header.is_representable() {
                        return Err(unsupported(format!(
                            "{} channels at {} Hz overflow the wav header",
                            channels, props.sample_rate
                        )));
                    }
                    (Emission::Wav { header, frame_size }, "wav".to_string())
                }
                other => {
                    let emission = Emission::RawAudio {
                        sample_rate: props.sample_rate,
                        frame_size,
                        channels: props.channels,
                        planar: target.is_planar(),
                    };
                    (emission, other.unwrap_or(target.name()).to_string())
                }
            }
        }
        CodecId::J2k => match requested {
            Some(ext @ ("j2k" | "j2c")) => (Emission::Forward, ext.to_string()),
            _ => {
                decinfo = DecInfoMode::No;
                let jp2h = inline_config.take();
                (Emission::Jp2 { jp2h }, "jp2".to_string())
            }
        },
        CodecId::SubsXml => {
            // DASH delivery always aggregates into one document per segment
            split = split && !props.dash_mode;
            inline_config = None;
            let emission = if split {
                Emission::TtmlPerUnit
            } else {
                Emission::TtmlAggregate
            };
            (emission, table_ext.unwrap_or("ttml").to_string())
        }
        CodecId::WebVtt => {
            inline_config = None;
            (vtt_emission(config, decoder_config.as_ref()), "vtt".to_string())
        }
        CodecId::SimpleText => match requested {
            Some("srt") => {
                inline_config = None;
                let emission = Emission::Cues {
                    style: CueStyle::Srt,
                    preamble: None,
                };
                (emission, "srt".to_string())
            }
            Some("vtt") => {
                inline_config = None;
                (vtt_emission(config, decoder_config.as_ref()), "vtt".to_string())
            }
            Some("ttxt") => {
                // the trailer closes the only document
                split = false;
                decinfo = DecInfoMode::First;
                inline_config = decoder_config.or(Some(Bytes::from_static(TTXT_HEADER.as_bytes())));
                (Emission::Ttxt, "ttxt".to_string())
            }
            _ => (Emission::Forward, table_ext.unwrap_or("txt").to_string()),
        },
        _ => {
            if let Some(magic) = codec::transport_magic(codec_id) {
                inline_config = Some(Bytes::from_static(magic));
                decinfo = DecInfoMode::First;
            }
            (Emission::Forward, table_ext.unwrap_or("raw").to_string())
        }
    };

    let mime = match codec::codec_info(codec_id) {
        Some(info) if info.file_ext == file_ext => info.mime,
        _ => codec::mime_for_extension(&file_ext),
    };

    Ok(Resolved::Ready(Box::new(Resolution {
        codec_id,
        output: OutputProps {
            stream_type: StreamType::File,
            codec_id,
            file_ext,
            mime: mime.to_string(),
            numbered_files: split,
        },
        emission,
        decinfo,
        split,
        inline_config,
        dash: props.dash_mode,
    })))
}

fn vtt_emission(config: &WriterConfig, decoder_config: Option<&Bytes>) -> Emission {
    let preamble = decoder_config
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| WEBVTT_PREAMBLE.to_string());
    Emission::Cues {
        style: CueStyle::WebVtt {
            force_hours: config.vtt_hours,
        },
        preamble: Some(normalize_preamble(&preamble)),
    }
}

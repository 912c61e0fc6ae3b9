//! # Codec Table
//!
//! Static mapping from codec identity to the default file extension and MIME
//! type of its raw dump. Raw video, raw audio and simple text have no fixed
//! entry: their extension depends on the packaging chosen at resolution time.

use crate::av::CodecId;

/// Default output naming for a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    pub codec_id: CodecId,
    pub file_ext: &'static str,
    pub mime: &'static str,
}

const CODEC_TABLE: &[CodecInfo] = &[
    CodecInfo { codec_id: CodecId::Avc, file_ext: "264", mime: "video/h264" },
    CodecInfo { codec_id: CodecId::Hevc, file_ext: "265", mime: "video/hevc" },
    CodecInfo { codec_id: CodecId::Vvc, file_ext: "266", mime: "video/vvc" },
    CodecInfo { codec_id: CodecId::Av1, file_ext: "obu", mime: "video/av1" },
    CodecInfo { codec_id: CodecId::Mpeg4Part2, file_ext: "cmp", mime: "video/mp4v-es" },
    CodecInfo { codec_id: CodecId::Mpeg2Video, file_ext: "m2v", mime: "video/mpeg" },
    CodecInfo { codec_id: CodecId::Mpeg1Video, file_ext: "m1v", mime: "video/mpeg" },
    CodecInfo { codec_id: CodecId::Jpeg, file_ext: "jpg", mime: "image/jpeg" },
    CodecInfo { codec_id: CodecId::Png, file_ext: "png", mime: "image/png" },
    CodecInfo { codec_id: CodecId::J2k, file_ext: "jp2", mime: "image/jp2" },
    CodecInfo { codec_id: CodecId::Aac, file_ext: "aac", mime: "audio/aac" },
    CodecInfo { codec_id: CodecId::Mp3, file_ext: "mp3", mime: "audio/mpeg" },
    CodecInfo { codec_id: CodecId::Ac3, file_ext: "ac3", mime: "audio/ac3" },
    CodecInfo { codec_id: CodecId::Eac3, file_ext: "ec3", mime: "audio/eac3" },
    CodecInfo { codec_id: CodecId::Opus, file_ext: "opus", mime: "audio/opus" },
    CodecInfo { codec_id: CodecId::Flac, file_ext: "flac", mime: "audio/flac" },
    CodecInfo { codec_id: CodecId::Amr, file_ext: "amr", mime: "audio/amr" },
    CodecInfo { codec_id: CodecId::AmrWb, file_ext: "awb", mime: "audio/amr-wb" },
    CodecInfo { codec_id: CodecId::Smv, file_ext: "smv", mime: "audio/smv" },
    CodecInfo { codec_id: CodecId::Evrc, file_ext: "evc", mime: "audio/evrc" },
    CodecInfo { codec_id: CodecId::SimpleText, file_ext: "txt", mime: "text/plain" },
    CodecInfo { codec_id: CodecId::Tx3g, file_ext: "tx3g", mime: "text/3gpp-tt" },
    CodecInfo { codec_id: CodecId::WebVtt, file_ext: "vtt", mime: "text/vtt" },
    CodecInfo { codec_id: CodecId::SubsXml, file_ext: "ttml", mime: "application/ttml+xml" },
];

/// Looks up the static entry of a codec.
pub fn codec_info(codec_id: CodecId) -> Option<&'static CodecInfo> {
    CODEC_TABLE.iter().find(|info| info.codec_id == codec_id)
}

/// Transport preamble written before the first frame of storage formats
/// whose frames carry no magic of their own.
pub fn transport_magic(codec_id: CodecId) -> Option<&'static [u8]> {
    match codec_id {
        CodecId::Amr => Some(b"#!AMR\n"),
        CodecId::AmrWb => Some(b"#!AMR-WB\n"),
        CodecId::Smv => Some(b"#!SMV\n"),
        CodecId::Evrc => Some(b"#!EVRC\n"),
        _ => None,
    }
}

/// Codecs whose raw dump is unusable without the decoder config inline.
pub fn needs_inline_config(codec_id: CodecId) -> bool {
    codec_id.is_text()
        || transport_magic(codec_id).is_some()
        || matches!(codec_id, CodecId::Mpeg4Part2 | CodecId::Flac)
}

/// MIME of raw dump extensions resolved at runtime.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "bmp" => "image/bmp",
        "y4m" => "video/x-yuv4mpeg",
        "wav" => "audio/wav",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        "ttxt" => "x-subtitle/ttxt",
        "j2k" | "j2c" => "image/x-j2c",
        _ => "application/octet-stream",
    }
}

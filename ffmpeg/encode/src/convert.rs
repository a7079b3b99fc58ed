/*!
    Conversions between ecosystem types and FFmpeg types.
*/

use ffmpeg_next::{
    codec::Id as CodecIdFFmpeg,
    util::error::{EAGAIN, ENOMEM},
};

use ffmpeg_types::{CodecId, Error, Result, StreamType};

/**
    Convert our CodecId to FFmpeg's codec ID.
*/
pub fn codec_id_to_ffmpeg(codec: CodecId) -> Result<CodecIdFFmpeg> {
    Ok(match codec {
        CodecId::H264 => CodecIdFFmpeg::H264,
        CodecId::H265 => CodecIdFFmpeg::HEVC,
        CodecId::Vp9 => CodecIdFFmpeg::VP9,
        CodecId::Mpeg4 => CodecIdFFmpeg::MPEG4,
        CodecId::Mpeg2Video => CodecIdFFmpeg::MPEG2VIDEO,
        CodecId::Mpeg1Video => CodecIdFFmpeg::MPEG1VIDEO,
        CodecId::Av1 => CodecIdFFmpeg::AV1,
        CodecId::Vp8 => CodecIdFFmpeg::VP8,
        CodecId::Amv => CodecIdFFmpeg::AMV,
        CodecId::Cfhd => CodecIdFFmpeg::CFHD,
        CodecId::Cinepak => CodecIdFFmpeg::CINEPAK,
        CodecId::Dirac => CodecIdFFmpeg::DIRAC,
        CodecId::Flv1 => CodecIdFFmpeg::FLV1,
        CodecId::Gif => CodecIdFFmpeg::GIF,
        CodecId::H261 => CodecIdFFmpeg::H261,
        CodecId::H263 => CodecIdFFmpeg::H263,
        CodecId::H263p => CodecIdFFmpeg::H263P,
        CodecId::Theora => CodecIdFFmpeg::THEORA,
        CodecId::WebP => CodecIdFFmpeg::WEBP,
        CodecId::DnxHd => CodecIdFFmpeg::DNXHD,
        CodecId::Mjpeg => CodecIdFFmpeg::MJPEG,
        CodecId::ProRes => CodecIdFFmpeg::PRORES,
        CodecId::RawVideo => CodecIdFFmpeg::RAWVIDEO,
        CodecId::Yuv4 => CodecIdFFmpeg::YUV4,
        CodecId::Mp3 => CodecIdFFmpeg::MP3,
        CodecId::Aac => CodecIdFFmpeg::AAC,
        CodecId::Opus => CodecIdFFmpeg::OPUS,
        CodecId::Vorbis => CodecIdFFmpeg::VORBIS,
        CodecId::Flac => CodecIdFFmpeg::FLAC,
        CodecId::PcmS16Le => CodecIdFFmpeg::PCM_S16LE,
        CodecId::Ac3 => CodecIdFFmpeg::AC3,
        CodecId::Eac3 => CodecIdFFmpeg::EAC3,
        CodecId::WavPack => CodecIdFFmpeg::WAVPACK,
        CodecId::Mp2 => CodecIdFFmpeg::MP2,
        CodecId::Ass => CodecIdFFmpeg::ASS,
        CodecId::MovText => CodecIdFFmpeg::MOV_TEXT,
        CodecId::SubRip => CodecIdFFmpeg::SUBRIP,
        CodecId::Text => CodecIdFFmpeg::TEXT,
        CodecId::Ttml => CodecIdFFmpeg::TTML,
        CodecId::WebVtt => CodecIdFFmpeg::WEBVTT,
        CodecId::Xsub => CodecIdFFmpeg::XSUB,
        _ => {
            return Err(Error::unsupported_format(format!(
                "codec {codec} has no FFmpeg mapping"
            )));
        }
    })
}

/**
    True for FFmpeg's "output not available yet, send more input" result.
*/
pub(crate) fn is_again(e: &ffmpeg_next::Error) -> bool {
    matches!(e, ffmpeg_next::Error::Other { errno } if *errno == EAGAIN)
}

/**
    Map a failure to open an encoder.
*/
pub(crate) fn open_error(stream: StreamType, e: ffmpeg_next::Error) -> Error {
    match e {
        ffmpeg_next::Error::Other { errno } if errno == ENOMEM => {
            Error::allocation(format!("opening {stream} encoder: {e}"))
        }
        _ => Error::codec_open(stream, e.to_string()),
    }
}

/**
    Map a failure while submitting or draining frames.
*/
pub(crate) fn encode_error(stream: StreamType, e: ffmpeg_next::Error) -> Error {
    match e {
        ffmpeg_next::Error::Other { errno } if errno == ENOMEM => {
            Error::allocation(format!("{stream} encoder: {e}"))
        }
        _ => Error::encode(format!("{stream} encoder: {e}")),
    }
}

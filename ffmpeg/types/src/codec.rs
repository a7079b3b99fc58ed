/*!
    Codec identifiers.
*/

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/**
    Kind of media a codec produces.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
        })
    }
}

/**
    Codec identifiers a render can select.

    The identifier space is fixed. Whether a given id can actually be encoded
    depends on how the linked FFmpeg was built; see the capability query in
    `ffmpeg-encode`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "&'static str", try_from = "String")
)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    H265,
    Vp9,
    Mpeg4,
    Mpeg2Video,
    Mpeg1Video,
    Av1,
    Vp8,
    Amv,
    Cfhd,
    Cinepak,
    Dirac,
    Flv1,
    Gif,
    H261,
    H263,
    H263p,
    Theora,
    WebP,
    DnxHd,
    Mjpeg,
    ProRes,
    RawVideo,
    Yuv4,

    // Audio
    Mp3,
    Aac,
    Opus,
    Vorbis,
    Flac,
    PcmS16Le,
    Ac3,
    Eac3,
    WavPack,
    Mp2,

    // Subtitle
    Ass,
    MovText,
    SubRip,
    Text,
    Ttml,
    WebVtt,
    Xsub,
}

impl CodecId {
    pub const ALL: [Self; 41] = [
        Self::H264,
        Self::H265,
        Self::Vp9,
        Self::Mpeg4,
        Self::Mpeg2Video,
        Self::Mpeg1Video,
        Self::Av1,
        Self::Vp8,
        Self::Amv,
        Self::Cfhd,
        Self::Cinepak,
        Self::Dirac,
        Self::Flv1,
        Self::Gif,
        Self::H261,
        Self::H263,
        Self::H263p,
        Self::Theora,
        Self::WebP,
        Self::DnxHd,
        Self::Mjpeg,
        Self::ProRes,
        Self::RawVideo,
        Self::Yuv4,
        Self::Mp3,
        Self::Aac,
        Self::Opus,
        Self::Vorbis,
        Self::Flac,
        Self::PcmS16Le,
        Self::Ac3,
        Self::Eac3,
        Self::WavPack,
        Self::Mp2,
        Self::Ass,
        Self::MovText,
        Self::SubRip,
        Self::Text,
        Self::Ttml,
        Self::WebVtt,
        Self::Xsub,
    ];

    pub const fn kind(self) -> MediaKind {
        match self {
            Self::H264
            | Self::H265
            | Self::Vp9
            | Self::Mpeg4
            | Self::Mpeg2Video
            | Self::Mpeg1Video
            | Self::Av1
            | Self::Vp8
            | Self::Amv
            | Self::Cfhd
            | Self::Cinepak
            | Self::Dirac
            | Self::Flv1
            | Self::Gif
            | Self::H261
            | Self::H263
            | Self::H263p
            | Self::Theora
            | Self::WebP
            | Self::DnxHd
            | Self::Mjpeg
            | Self::ProRes
            | Self::RawVideo
            | Self::Yuv4 => MediaKind::Video,
            Self::Mp3
            | Self::Aac
            | Self::Opus
            | Self::Vorbis
            | Self::Flac
            | Self::PcmS16Le
            | Self::Ac3
            | Self::Eac3
            | Self::WavPack
            | Self::Mp2 => MediaKind::Audio,
            Self::Ass
            | Self::MovText
            | Self::SubRip
            | Self::Text
            | Self::Ttml
            | Self::WebVtt
            | Self::Xsub => MediaKind::Subtitle,
        }
    }

    /**
        Stable lowercase name. Matches FFmpeg's codec name where one exists.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp9 => "vp9",
            Self::Mpeg4 => "mpeg4",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg1Video => "mpeg1video",
            Self::Av1 => "av1",
            Self::Vp8 => "vp8",
            Self::Amv => "amv",
            Self::Cfhd => "cfhd",
            Self::Cinepak => "cinepak",
            Self::Dirac => "dirac",
            Self::Flv1 => "flv1",
            Self::Gif => "gif",
            Self::H261 => "h261",
            Self::H263 => "h263",
            Self::H263p => "h263p",
            Self::Theora => "theora",
            Self::WebP => "webp",
            Self::DnxHd => "dnxhd",
            Self::Mjpeg => "mjpeg",
            Self::ProRes => "prores",
            Self::RawVideo => "rawvideo",
            Self::Yuv4 => "yuv4",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::PcmS16Le => "pcm_s16le",
            Self::Ac3 => "ac3",
            Self::Eac3 => "eac3",
            Self::WavPack => "wavpack",
            Self::Mp2 => "mp2",
            Self::Ass => "ass",
            Self::MovText => "mov_text",
            Self::SubRip => "subrip",
            Self::Text => "text",
            Self::Ttml => "ttml",
            Self::WebVtt => "webvtt",
            Self::Xsub => "xsub",
        }
    }

    pub const fn is_video(self) -> bool {
        matches!(self.kind(), MediaKind::Video)
    }

    pub const fn is_audio(self) -> bool {
        matches!(self.kind(), MediaKind::Audio)
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let alias = match lower.as_str() {
            "h265" => "hevc",
            "srt" => "subrip",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|id| id.name() == alias)
            .ok_or_else(|| ParseError {
                kind: "codec",
                value: s.to_string(),
            })
    }
}

impl From<CodecId> for &'static str {
    fn from(id: CodecId) -> Self {
        id.name()
    }
}

impl TryFrom<String> for CodecId {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_partition_the_id_space() {
        let video = CodecId::ALL.iter().filter(|c| c.is_video()).count();
        let audio = CodecId::ALL.iter().filter(|c| c.is_audio()).count();
        let subtitle = CodecId::ALL
            .iter()
            .filter(|c| c.kind() == MediaKind::Subtitle)
            .count();
        assert_eq!((video, audio, subtitle), (24, 10, 7));
    }

    #[test]
    fn names_are_unique_and_parse_back() {
        for id in CodecId::ALL {
            assert_eq!(id.name().parse::<CodecId>(), Ok(id));
        }
        let mut names: Vec<_> = CodecId::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CodecId::ALL.len());
    }

    #[test]
    fn parse_accepts_aliases_and_case() {
        assert_eq!("H265".parse::<CodecId>(), Ok(CodecId::H265));
        assert_eq!("AAC".parse::<CodecId>(), Ok(CodecId::Aac));
        assert_eq!("srt".parse::<CodecId>(), Ok(CodecId::SubRip));
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "xvid".parse::<CodecId>().unwrap_err();
        assert_eq!(err.kind, "codec");
        assert_eq!(err.to_string(), "unknown codec 'xvid'");
    }
}

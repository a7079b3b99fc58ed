/*!
    Which codec identifiers the linked FFmpeg can encode.

    Every query here performs a fresh registry lookup; nothing is cached. The
    membership tests and the full listing go through the same lookup, so they
    can never disagree.
*/

use ffmpeg_next::encoder;

use ffmpeg_types::{CodecId, MediaKind};

use crate::convert::codec_id_to_ffmpeg;

/**
    Encodable codec identifiers, grouped by media kind.

    A family is empty if FFmpeg failed to initialize.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupportedCodecs {
    pub video: Vec<CodecId>,
    pub audio: Vec<CodecId>,
    pub subtitle: Vec<CodecId>,
}

impl SupportedCodecs {
    pub fn contains(&self, id: CodecId) -> bool {
        self.family(id.kind()).contains(&id)
    }

    pub fn family(&self, kind: MediaKind) -> &[CodecId] {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
            MediaKind::Subtitle => &self.subtitle,
        }
    }
}

/**
    Returns true if an encoder is registered for `id`.
*/
pub fn is_codec_supported(id: CodecId) -> bool {
    if ffmpeg_next::init().is_err() {
        return false;
    }
    codec_id_to_ffmpeg(id)
        .ok()
        .and_then(encoder::find)
        .is_some()
}

/**
    Returns true if `id` is a video codec and can be encoded.
*/
pub fn is_video_codec_supported(id: CodecId) -> bool {
    id.is_video() && is_codec_supported(id)
}

/**
    Returns true if `id` is an audio codec and can be encoded.
*/
pub fn is_audio_codec_supported(id: CodecId) -> bool {
    id.is_audio() && is_codec_supported(id)
}

/**
    List every encodable codec identifier.
*/
pub fn supported_codecs() -> SupportedCodecs {
    let mut supported = SupportedCodecs::default();
    for id in CodecId::ALL {
        if !is_codec_supported(id) {
            continue;
        }
        match id.kind() {
            MediaKind::Video => supported.video.push(id),
            MediaKind::Audio => supported.audio.push(id),
            MediaKind::Subtitle => supported.subtitle.push(id),
        }
    }
    supported
}

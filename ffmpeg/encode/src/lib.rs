/*!
    Media encoding for the ffmpeg crate ecosystem.

    This crate turns frames already in an encoder's negotiated format into
    compressed packets. Each encoder stamps frames from its own counter, so
    packets carry timestamps in the encoder's time base: one frame for video,
    one sample for audio.

    # Video Encoding

    ```ignore
    use ffmpeg_encode::{CodecId, Rational, VideoEncoder, VideoEncoderConfig};

    let config = VideoEncoderConfig::new(CodecId::Mpeg4, 640, 480, Rational::new(25, 1))
        .with_bitrate(400_000);
    let mut encoder = VideoEncoder::new(config)?;

    // `frame` must be in `encoder.format()`
    let packets = encoder.encode(&mut frame)?;
    let tail = encoder.flush()?;
    ```

    # Audio Encoding

    ```ignore
    use ffmpeg_encode::{AudioEncoder, AudioEncoderConfig, ChannelLayout, CodecId};

    let config = AudioEncoderConfig::new(CodecId::Aac, 44100, ChannelLayout::Stereo);
    let mut encoder = AudioEncoder::new(config)?;

    // Chunks must hold exactly `encoder.frame_size()` samples unless it is 0
    let packets = encoder.encode(&mut chunk)?;
    ```

    # Negotiation

    Pixel format, sample format and sample rate are requests. The encoder
    opens with the closest thing the codec accepts; use `ffmpeg-transform` to
    bring frames to the negotiated format.
*/

pub use ffmpeg_types::{
    ChannelLayout, CodecId, Error, MediaKind, Packet, PixelFormat, Rational, Result, StreamType,
};

mod audio;
mod capabilities;
mod config;
mod convert;
mod video;

pub use audio::{AudioEncoder, negotiate_sample_format, negotiate_sample_rate};
pub use capabilities::{
    SupportedCodecs, is_audio_codec_supported, is_codec_supported, is_video_codec_supported,
    supported_codecs,
};
pub use config::{AudioEncoderConfig, VideoEncoderConfig};
pub use convert::codec_id_to_ffmpeg;
pub use video::{VideoEncoder, negotiate_pixel_format};

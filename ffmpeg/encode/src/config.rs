/*!
    Encoder configuration types.
*/

use ffmpeg_types::{ChannelLayout, CodecId, PixelFormat, Rational};

/**
    Configuration for video encoding.

    The pixel format is a request: if the codec cannot take it, the encoder
    falls back to the first format the codec lists.
*/
#[derive(Clone, Debug)]
pub struct VideoEncoderConfig {
    /// Codec to use.
    pub codec: CodecId,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate. The encoder time base is its reciprocal.
    pub frame_rate: Rational,
    /// Requested pixel format.
    pub pixel_format: PixelFormat,
    /// Target bitrate in bits per second (0 = codec default).
    pub bit_rate: u64,
    /// Keyframe interval in frames (0 = codec default).
    pub gop_size: u32,
    /// Put codec extradata in the container header instead of in-band.
    pub global_header: bool,
}

impl VideoEncoderConfig {
    /**
        Create a new video encoder configuration.
    */
    pub fn new(codec: CodecId, width: u32, height: u32, frame_rate: Rational) -> Self {
        Self {
            codec,
            width,
            height,
            frame_rate,
            pixel_format: PixelFormat::Yuv420p,
            bit_rate: 0,
            gop_size: 0,
            global_header: false,
        }
    }

    /**
        Set the target bitrate in bits per second.
    */
    pub fn with_bitrate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /**
        Set the keyframe interval in frames.
    */
    pub fn with_gop_size(mut self, frames: u32) -> Self {
        self.gop_size = frames;
        self
    }

    /**
        Set the requested pixel format.
    */
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }
}

/**
    Configuration for audio encoding.

    Sample format is always negotiated with the codec. The sample rate is a
    preference: the nearest rate the codec supports is used.
*/
#[derive(Clone, Debug)]
pub struct AudioEncoderConfig {
    /// Codec to use.
    pub codec: CodecId,
    /// Preferred sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Target bitrate in bits per second (None = codec default).
    pub bit_rate: Option<u64>,
    /// Put codec extradata in the container header instead of in-band.
    pub global_header: bool,
}

impl AudioEncoderConfig {
    /**
        Create a new audio encoder configuration.
    */
    pub fn new(codec: CodecId, sample_rate: u32, channels: ChannelLayout) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            bit_rate: None,
            global_header: false,
        }
    }

    /**
        Set the target bitrate in bits per second.
    */
    pub fn with_bitrate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }
}

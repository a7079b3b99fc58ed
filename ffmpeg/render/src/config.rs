/*!
    Render job configuration.
*/

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ffmpeg_encode::{is_audio_codec_supported, is_video_codec_supported};
use ffmpeg_types::{CodecId, Error, PixelFormat, Result};

/**
    Everything a render session needs to know up front.

    The configuration is frozen while a session is open. Fields left out of
    a serialized job take their defaults: 1920x1080 H.264 at 30 fps and
    400 kbit/s, with audio disabled.
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output file; the container is inferred from its extension.
    pub path: PathBuf,
    pub video_codec: CodecId,
    pub audio_codec: CodecId,
    /// Frame width in pixels. Must be even.
    pub width: u32,
    /// Frame height in pixels. Must be even.
    pub height: u32,
    /// Frames per second.
    pub frame_rate: u32,
    /// Video bitrate in bits per second (0 = codec default).
    pub bit_rate: u64,
    /// Keyframe interval in frames (0 = codec default).
    pub gop_size: u32,
    pub audio_enabled: bool,
    /// Requested encoder pixel format, negotiated against the codec.
    pub pixel_format: PixelFormat,
    /// Preferred output sample rate, negotiated against the codec.
    pub audio_sample_rate: u32,
    /// Audio bitrate in bits per second (0 = codec default).
    pub audio_bit_rate: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            video_codec: CodecId::H264,
            audio_codec: CodecId::Aac,
            width: 1920,
            height: 1080,
            frame_rate: 30,
            bit_rate: 400_000,
            gop_size: 0,
            audio_enabled: false,
            pixel_format: PixelFormat::Yuv420p,
            audio_sample_rate: 44100,
            audio_bit_rate: 192_000,
        }
    }
}

impl RenderConfig {
    /**
        Create a configuration for `path` with default settings.
    */
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_video_codec(mut self, codec: CodecId) -> Self {
        self.video_codec = codec;
        self
    }

    /**
        Set the audio codec and enable audio.
    */
    pub fn with_audio_codec(mut self, codec: CodecId) -> Self {
        self.audio_codec = codec;
        self.audio_enabled = true;
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    pub fn with_gop_size(mut self, frames: u32) -> Self {
        self.gop_size = frames;
        self
    }

    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.audio_enabled = enabled;
        self
    }

    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn with_audio_sample_rate(mut self, rate: u32) -> Self {
        self.audio_sample_rate = rate;
        self
    }

    pub fn with_audio_bit_rate(mut self, bit_rate: u64) -> Self {
        self.audio_bit_rate = bit_rate;
        self
    }

    /**
        Validate the configuration before anything is allocated.

        Checks the path is set, both dimensions are non-zero and even, the
        frame rate is positive, and the chosen codecs are of the right kind
        and can be encoded by the linked FFmpeg.
    */
    pub fn ready_check(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::invalid_config("output path is empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_config(format!(
                "resolution {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::invalid_config(format!(
                "resolution {}x{} must have even width and height",
                self.width, self.height
            )));
        }
        if self.frame_rate == 0 || self.frame_rate > i32::MAX as u32 {
            return Err(Error::invalid_config(format!(
                "frame rate {} is out of range",
                self.frame_rate
            )));
        }
        if !is_video_codec_supported(self.video_codec) {
            return Err(Error::invalid_config(format!(
                "{} is not an available video encoder",
                self.video_codec
            )));
        }
        if self.audio_enabled {
            if !is_audio_codec_supported(self.audio_codec) {
                return Err(Error::invalid_config(format!(
                    "{} is not an available audio encoder",
                    self.audio_codec
                )));
            }
            if self.audio_sample_rate == 0 {
                return Err(Error::invalid_config("audio sample rate must be positive"));
            }
        }
        Ok(())
    }
}

/*!
    Video encoder implementation.
*/

use ffmpeg_next::{
    Codec, Dictionary, Rational as FFmpegRational,
    codec::{self, Parameters, capabilities::Capabilities, encoder::Video as VideoEncoderFFmpeg},
    format::Pixel,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_transform::pixel_format_to_ffmpeg;
use ffmpeg_types::{CodecId, Error, MediaDuration, Packet, Pts, Rational, Result, StreamType};

use crate::config::VideoEncoderConfig;
use crate::convert::{codec_id_to_ffmpeg, encode_error, is_again, open_error};

/**
    Video encoder.

    Encodes frames already in the negotiated pixel format into compressed
    packets. Presentation timestamps come from an internal frame counter, so
    packet timestamps are in units of one frame.
*/
pub struct VideoEncoder {
    encoder: VideoEncoderFFmpeg,
    codec: Codec,
    codec_id: CodecId,
    format: Pixel,
    time_base: Rational,
    frame_count: i64,
}

impl VideoEncoder {
    /**
        Create and open a video encoder.

        Fails with `CodecOpen` if the codec rejects the parameters and with
        `UnsupportedFormat` if no encoder is registered for the codec.
    */
    pub fn new(config: VideoEncoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        if !config.frame_rate.is_valid() {
            return Err(Error::invalid_config(format!(
                "frame rate {} must be positive",
                config.frame_rate
            )));
        }

        // Find the codec
        let codec_id = codec_id_to_ffmpeg(config.codec)?;
        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            Error::unsupported_format(format!("no encoder for codec {}", config.codec))
        })?;

        // Negotiate the pixel format
        let requested = pixel_format_to_ffmpeg(config.pixel_format)?;
        let supported: Vec<Pixel> = codec
            .video()
            .map_err(|e| Error::codec_open(StreamType::Video, e.to_string()))?
            .formats()
            .map(|formats| formats.collect())
            .unwrap_or_default();
        let format = negotiate_pixel_format(requested, &supported);
        if format != requested {
            tracing::debug!(
                codec = %config.codec,
                requested = ?requested,
                using = ?format,
                "requested pixel format not supported by codec"
            );
        }

        // Create encoder context
        let mut encoder_ctx = codec::context::Context::new_with_codec(codec);
        if config.global_header {
            encoder_ctx.set_flags(codec::flag::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx
            .encoder()
            .video()
            .map_err(|e| open_error(StreamType::Video, e))?;

        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(format);

        // Time base is inverse of frame rate for video
        let frame_rate = FFmpegRational::new(config.frame_rate.num, config.frame_rate.den);
        encoder.set_frame_rate(Some(frame_rate));
        encoder.set_time_base(frame_rate.invert());

        if config.gop_size > 0 {
            encoder.set_gop(config.gop_size);
        }
        if config.bit_rate > 0 {
            encoder.set_bit_rate(config.bit_rate as usize);
        }

        let mut opts = Dictionary::new();
        if codec.capabilities().contains(Capabilities::EXPERIMENTAL) {
            opts.set("strict", "experimental");
        }

        let encoder = encoder
            .open_with(opts)
            .map_err(|e| open_error(StreamType::Video, e))?;

        // The codec may adjust the time base on open
        let time_base = unsafe {
            let tb = (*encoder.as_ptr()).time_base;
            if tb.num > 0 && tb.den > 0 {
                Rational::new(tb.num, tb.den)
            } else {
                config.frame_rate.invert()
            }
        };

        tracing::debug!(
            codec = %config.codec,
            width = config.width,
            height = config.height,
            format = ?format,
            time_base = %time_base,
            "opened video encoder"
        );

        Ok(Self {
            encoder,
            codec,
            codec_id: config.codec,
            format,
            time_base,
            frame_count: 0,
        })
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    /**
        Get the negotiated pixel format frames must be in.
    */
    pub fn format(&self) -> Pixel {
        self.format
    }

    /**
        Get the time base for encoded packets.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Codec parameters for the container stream.
    */
    pub fn parameters(&self) -> Parameters {
        Parameters::from(&self.encoder)
    }

    /**
        Number of frames accepted so far.
    */
    pub fn frames_encoded(&self) -> i64 {
        self.frame_count
    }

    /**
        Encode a video frame, returning encoded packets.

        The frame is stamped with the current frame counter. May return zero,
        one, or multiple packets depending on encoder buffering. The counter
        advances only if the encoder accepted the frame.
    */
    pub fn encode(&mut self, frame: &mut VideoFrameFFmpeg) -> Result<Vec<Packet>> {
        if frame.format() != self.format {
            return Err(Error::invalid_data(format!(
                "frame format {:?} does not match encoder format {:?}",
                frame.format(),
                self.format
            )));
        }

        frame.set_pts(Some(self.frame_count));

        let mut packets = Vec::new();
        loop {
            match self.encoder.send_frame(frame) {
                Ok(()) => break,
                // Encoder output is full; drain before resubmitting
                Err(e) if is_again(&e) => {
                    let drained = self.receive_packets()?;
                    if drained.is_empty() {
                        return Err(Error::encode(
                            "video encoder refused input without producing output",
                        ));
                    }
                    packets.extend(drained);
                }
                Err(e) => return Err(encode_error(StreamType::Video, e)),
            }
        }
        self.frame_count += 1;

        packets.extend(self.receive_packets()?);
        Ok(packets)
    }

    /**
        Flush the encoder to get any remaining buffered packets.

        Call this at end of stream. Flushing twice yields no packets.
    */
    pub fn flush(&mut self) -> Result<Vec<Packet>> {
        match self.encoder.send_eof() {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => return Ok(Vec::new()),
            Err(e) => return Err(encode_error(StreamType::Video, e)),
        }

        self.receive_packets()
    }

    /**
        Receive all available packets from the encoder.
    */
    fn receive_packets(&mut self) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut encoded_pkt = ffmpeg_next::Packet::empty();

        loop {
            match self.encoder.receive_packet(&mut encoded_pkt) {
                Ok(()) => {
                    packets.push(self.convert_packet(&encoded_pkt));
                }
                Err(e) if is_again(&e) => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(encode_error(StreamType::Video, e)),
            }
        }

        Ok(packets)
    }

    /**
        Convert an FFmpeg packet to our Packet type.
    */
    fn convert_packet(&self, pkt: &ffmpeg_next::Packet) -> Packet {
        Packet {
            data: pkt.data().map(|d| d.to_vec()).unwrap_or_default(),
            pts: pkt.pts().map(Pts),
            dts: pkt.dts().map(Pts),
            duration: MediaDuration(pkt.duration()),
            time_base: self.time_base,
            is_keyframe: pkt.is_key(),
            stream_type: StreamType::Video,
        }
    }
}

/**
    Pick the pixel format to open an encoder with.

    Keeps the requested format when the codec supports it or lists nothing;
    otherwise falls back to the codec's first (preferred) format.
*/
pub fn negotiate_pixel_format(requested: Pixel, supported: &[Pixel]) -> Pixel {
    if supported.is_empty() || supported.contains(&requested) {
        requested
    } else {
        supported[0]
    }
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("codec", &self.codec_id)
            .field("format", &self.format)
            .field("time_base", &self.time_base)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_types::PixelFormat;

    use super::*;

    fn mpeg4_config() -> VideoEncoderConfig {
        VideoEncoderConfig::new(CodecId::Mpeg4, 64, 48, Rational::new(25, 1))
            .with_bitrate(400_000)
    }

    fn gray_frame(encoder: &VideoEncoder) -> VideoFrameFFmpeg {
        let mut frame = VideoFrameFFmpeg::new(encoder.format(), 64, 48);
        for plane in 0..frame.planes() {
            frame.data_mut(plane).fill(128);
        }
        frame
    }

    #[test]
    fn negotiation_keeps_supported_request() {
        let supported = [Pixel::YUV420P, Pixel::YUV444P];
        assert_eq!(negotiate_pixel_format(Pixel::YUV444P, &supported), Pixel::YUV444P);
    }

    #[test]
    fn negotiation_falls_back_to_first_supported() {
        let supported = [Pixel::YUV420P, Pixel::YUV444P];
        assert_eq!(negotiate_pixel_format(Pixel::RGBA, &supported), Pixel::YUV420P);
    }

    #[test]
    fn negotiation_trusts_codecs_without_a_list() {
        assert_eq!(negotiate_pixel_format(Pixel::RGBA, &[]), Pixel::RGBA);
    }

    #[test]
    fn opens_with_negotiated_format() {
        let encoder = VideoEncoder::new(mpeg4_config().with_pixel_format(PixelFormat::Rgba))
            .unwrap();
        // mpeg4 only takes yuv420p
        assert_eq!(encoder.format(), Pixel::YUV420P);
        assert_eq!(encoder.time_base(), Rational::new(1, 25));
    }

    #[test]
    fn counter_advances_once_per_frame() {
        let mut encoder = VideoEncoder::new(mpeg4_config()).unwrap();
        let mut frame = gray_frame(&encoder);

        let mut packets = Vec::new();
        for _ in 0..5 {
            packets.extend(encoder.encode(&mut frame).unwrap());
        }
        assert_eq!(encoder.frames_encoded(), 5);

        packets.extend(encoder.flush().unwrap());
        assert_eq!(packets.len(), 5);
        assert!(packets[0].is_keyframe);
        assert!(packets.iter().all(|p| p.stream_type == StreamType::Video));

        let mut pts: Vec<i64> = packets.iter().filter_map(|p| p.pts).map(|p| p.0).collect();
        pts.sort_unstable();
        assert_eq!(pts, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn flush_twice_is_empty() {
        let mut encoder = VideoEncoder::new(mpeg4_config()).unwrap();
        encoder.flush().unwrap();
        assert!(encoder.flush().unwrap().is_empty());
    }

    #[test]
    fn wrong_frame_format_is_rejected() {
        let mut encoder = VideoEncoder::new(mpeg4_config()).unwrap();
        let mut frame = VideoFrameFFmpeg::new(Pixel::RGBA, 64, 48);
        let err = encoder.encode(&mut frame).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(encoder.frames_encoded(), 0);
    }
}

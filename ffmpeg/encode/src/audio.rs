/*!
    Audio encoder implementation.
*/

use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout, Codec, Dictionary,
    codec::{self, Parameters, capabilities::Capabilities, encoder::Audio as AudioEncoderFFmpeg},
    format::{Sample, sample::Type as SampleType},
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use ffmpeg_transform::channel_layout_to_ffmpeg;
use ffmpeg_types::{CodecId, Error, MediaDuration, Packet, Pts, Rational, Result, StreamType};

use crate::config::AudioEncoderConfig;
use crate::convert::{codec_id_to_ffmpeg, encode_error, is_again, open_error};

/**
    Audio encoder.

    Sample format and rate are negotiated with the codec when it is opened.
    Presentation timestamps come from an internal sample counter, so packet
    timestamps are in units of one sample.
*/
pub struct AudioEncoder {
    encoder: AudioEncoderFFmpeg,
    codec: Codec,
    codec_id: CodecId,
    format: Sample,
    layout: FFmpegChannelLayout,
    rate: u32,
    time_base: Rational,
    sample_count: i64,
}

impl AudioEncoder {
    /**
        Create and open an audio encoder.
    */
    pub fn new(config: AudioEncoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        // Find the codec
        let codec_id = codec_id_to_ffmpeg(config.codec)?;
        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            Error::unsupported_format(format!("no encoder for codec {}", config.codec))
        })?;

        // Negotiate sample format and rate
        let caps = codec
            .audio()
            .map_err(|e| Error::codec_open(StreamType::Audio, e.to_string()))?;
        let formats: Vec<Sample> = caps.formats().map(|f| f.collect()).unwrap_or_default();
        let rates: Vec<i32> = caps.rates().map(|r| r.collect()).unwrap_or_default();
        let format = negotiate_sample_format(&formats);
        let rate = negotiate_sample_rate(config.sample_rate, &rates);

        let layout = channel_layout_to_ffmpeg(config.channels)?;

        // Create encoder context
        let mut encoder_ctx = codec::context::Context::new_with_codec(codec);
        if config.global_header {
            encoder_ctx.set_flags(codec::flag::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx
            .encoder()
            .audio()
            .map_err(|e| open_error(StreamType::Audio, e))?;

        encoder.set_format(format);
        encoder.set_rate(rate as i32);
        encoder.set_channel_layout(layout);

        // Time base (1/sample_rate is standard for audio)
        encoder.set_time_base(ffmpeg_next::Rational::new(1, rate as i32));

        if let Some(bit_rate) = config.bit_rate {
            encoder.set_bit_rate(bit_rate as usize);
        }

        let mut opts = Dictionary::new();
        if codec.capabilities().contains(Capabilities::EXPERIMENTAL) {
            opts.set("strict", "experimental");
        }

        let encoder = encoder
            .open_with(opts)
            .map_err(|e| open_error(StreamType::Audio, e))?;

        tracing::debug!(
            codec = %config.codec,
            format = ?format,
            rate,
            frame_size = encoder.frame_size(),
            "opened audio encoder"
        );

        Ok(Self {
            encoder,
            codec,
            codec_id: config.codec,
            format,
            layout,
            rate,
            time_base: Rational::new(1, rate as i32),
            sample_count: 0,
        })
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    /**
        Get the negotiated sample format frames must be in.
    */
    pub fn format(&self) -> Sample {
        self.format
    }

    pub fn channel_layout(&self) -> FFmpegChannelLayout {
        self.layout
    }

    /**
        Get the negotiated sample rate in Hz.
    */
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /**
        Get the time base for encoded packets.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get the frame size expected by the encoder.

        Returns 0 if the codec accepts variable frame sizes.
    */
    pub fn frame_size(&self) -> usize {
        self.encoder.frame_size() as usize
    }

    /**
        Codec parameters for the container stream.
    */
    pub fn parameters(&self) -> Parameters {
        Parameters::from(&self.encoder)
    }

    /**
        Number of samples accepted so far.
    */
    pub fn samples_encoded(&self) -> i64 {
        self.sample_count
    }

    /**
        Encode an audio frame, returning encoded packets.

        The frame is stamped with the current sample counter, which advances
        by the frame's sample count only if the encoder accepted it.
    */
    pub fn encode(&mut self, frame: &mut AudioFrameFFmpeg) -> Result<Vec<Packet>> {
        if frame.format() != self.format {
            return Err(Error::invalid_data(format!(
                "frame format {:?} does not match encoder format {:?}",
                frame.format(),
                self.format
            )));
        }

        frame.set_pts(Some(self.sample_count));

        let mut packets = Vec::new();
        loop {
            match self.encoder.send_frame(frame) {
                Ok(()) => break,
                // Encoder output is full; drain before resubmitting
                Err(e) if is_again(&e) => {
                    let drained = self.receive_packets()?;
                    if drained.is_empty() {
                        return Err(Error::encode(
                            "audio encoder refused input without producing output",
                        ));
                    }
                    packets.extend(drained);
                }
                Err(e) => return Err(encode_error(StreamType::Audio, e)),
            }
        }
        self.sample_count += frame.samples() as i64;

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
            Err(e) => return Err(encode_error(StreamType::Audio, e)),
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
                Err(e) => return Err(encode_error(StreamType::Audio, e)),
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
            stream_type: StreamType::Audio,
        }
    }
}

/**
    Pick the sample format to open an encoder with.

    Uses the codec's first (preferred) format, or packed 16-bit when the codec
    lists none.
*/
pub fn negotiate_sample_format(supported: &[Sample]) -> Sample {
    supported
        .first()
        .copied()
        .unwrap_or(Sample::I16(SampleType::Packed))
}

/**
    Pick the sample rate closest to `preferred` among those a codec supports.

    Codecs that list no rates accept any, so `preferred` is kept. Ties go to
    the higher rate.
*/
pub fn negotiate_sample_rate(preferred: u32, supported: &[i32]) -> u32 {
    supported
        .iter()
        .filter(|rate| **rate > 0)
        .map(|rate| *rate as u32)
        .min_by_key(|rate| (rate.abs_diff(preferred), u32::MAX - rate))
        .unwrap_or(preferred)
}

impl std::fmt::Debug for AudioEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEncoder")
            .field("codec", &self.codec_id)
            .field("format", &self.format)
            .field("rate", &self.rate)
            .field("sample_count", &self.sample_count)
            .finish_non_exhaustive()
    }
}

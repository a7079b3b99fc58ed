/*!
    The render session: open, submit frames and waveforms, close.
*/

use ffmpeg_encode::{AudioEncoder, AudioEncoderConfig, VideoEncoder, VideoEncoderConfig};
use ffmpeg_sink::Sink;
use ffmpeg_transform::{AudioTransform, VideoTransform};
use ffmpeg_types::{
    AudioFrame, ChannelLayout, Error, Packet, Rational, Result, StreamType, VideoFrame,
};

use crate::RenderConfig;

/**
    Renders still images and waveforms into one video file.

    A renderer is either closed, holding only its configuration, or open,
    holding a complete session: container, encoders, conversion contexts and
    the output file. Failed opens leave it closed. Failed submissions leave
    it open so the caller can retry with corrected input or close.

    Every fallible call records its error; [`status`](Self::status) and
    [`error_string`](Self::error_string) report the most recent one.
*/
pub struct Renderer {
    config: RenderConfig,
    session: Option<Session>,
    last_error: Option<(i32, String)>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            session: None,
            last_error: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /**
        Replace the configuration. Fails with `AlreadyOpen` while a session
        is open.
    */
    pub fn set_config(&mut self, config: RenderConfig) -> Result<()> {
        if self.session.is_some() {
            return self.record(Err(Error::AlreadyOpen));
        }
        self.config = config;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /**
        Validate the configuration without opening anything.
    */
    pub fn ready_check(&self) -> Result<()> {
        self.config.ready_check()
    }

    /**
        Open a session: validate, set up encoders and streams, create the
        output file and write the container header.
    */
    pub fn open(&mut self) -> Result<()> {
        let result = if self.session.is_some() {
            Err(Error::AlreadyOpen)
        } else {
            self.config
                .ready_check()
                .and_then(|()| Session::open(&self.config))
                .map(|session| self.session = Some(session))
        };
        self.record(result)
    }

    /**
        Convert, encode and write one image.

        The image must match the configured resolution exactly.
    */
    pub fn send_frame(&mut self, image: &VideoFrame) -> Result<()> {
        let result = match self.session.as_mut() {
            Some(session) => session.send_frame(image),
            None => Err(Error::NotOpen),
        };
        self.record(result)
    }

    /**
        Resample, encode and write a waveform.

        Output is cut into encoder-sized chunks; samples short of a full chunk
        wait for the next waveform and are dropped at close. On failure the
        part of this waveform that was not encoded is dropped, so resending
        it does not buffer it twice.
    */
    pub fn send_audio(&mut self, waveform: &AudioFrame) -> Result<()> {
        let result = match self.session.as_mut() {
            Some(session) => session.send_audio(waveform),
            None => Err(Error::NotOpen),
        };
        self.record(result)
    }

    /**
        Finish the file and release the session.

        Every teardown step runs even if an earlier one fails; the first
        failure is returned. Closing a closed renderer does nothing.
    */
    pub fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let result = session.close();
        self.record(result)
    }

    /**
        Status of the most recent failure, or 0 if nothing has failed.
    */
    pub fn status(&self) -> i32 {
        self.last_error.as_ref().map_or(0, |(status, _)| *status)
    }

    /**
        Diagnostic message for the most recent failure.
    */
    pub fn error_string(&self) -> Option<&str> {
        self.last_error.as_ref().map(|(_, message)| message.as_str())
    }

    /**
        Video frames accepted by the open session.
    */
    pub fn frames_written(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(0, |s| s.video.frames_encoded() as u64)
    }

    /**
        Audio samples encoded by the open session, at the negotiated rate.
    */
    pub fn samples_written(&self) -> u64 {
        self.session
            .as_ref()
            .and_then(|s| s.audio.as_ref())
            .map_or(0, |a| a.encoder.samples_encoded() as u64)
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error = Some((e.status(), e.to_string()));
        }
        result
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close() {
                tracing::warn!(error = %e, "closing render session on drop");
            }
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("last_error", &self.last_error)
            .finish()
    }
}

/**
    Everything an open render owns.

    Fields drop in declaration order, which releases conversion contexts
    first and the container last.
*/
struct Session {
    video_transform: VideoTransform,
    audio: Option<AudioPipeline>,
    video: VideoEncoder,
    sink: Sink,
}

struct AudioPipeline {
    transform: AudioTransform,
    encoder: AudioEncoder,
}

impl Session {
    fn open(config: &RenderConfig) -> Result<Self> {
        let mut sink = Sink::new(&config.path)?;
        let global_header = sink.needs_global_header();

        let video = VideoEncoder::new(
            VideoEncoderConfig::new(
                config.video_codec,
                config.width,
                config.height,
                Rational::new(config.frame_rate as i32, 1),
            )
            .with_bitrate(config.bit_rate)
            .with_gop_size(config.gop_size)
            .with_pixel_format(config.pixel_format)
            .with_global_header(global_header),
        )?;
        sink.add_stream(
            video.codec(),
            video.parameters(),
            video.time_base(),
            StreamType::Video,
        )?;

        let audio = if config.audio_enabled {
            let mut audio_config = AudioEncoderConfig::new(
                config.audio_codec,
                config.audio_sample_rate,
                ChannelLayout::Stereo,
            )
            .with_global_header(global_header);
            if config.audio_bit_rate > 0 {
                audio_config = audio_config.with_bitrate(config.audio_bit_rate);
            }
            let encoder = AudioEncoder::new(audio_config)?;
            sink.add_stream(
                encoder.codec(),
                encoder.parameters(),
                encoder.time_base(),
                StreamType::Audio,
            )?;
            Some(encoder)
        } else {
            None
        };

        sink.open_file()?;
        sink.write_header()?;

        let video_transform = VideoTransform::new(config.width, config.height, video.format());
        let audio = audio.map(|encoder| AudioPipeline {
            transform: AudioTransform::new(
                encoder.format(),
                encoder.channel_layout(),
                encoder.rate(),
                encoder.frame_size(),
            ),
            encoder,
        });

        tracing::info!(
            path = %config.path.display(),
            container = %sink.container_name(),
            video_codec = %config.video_codec,
            width = config.width,
            height = config.height,
            fps = config.frame_rate,
            pixel_format = ?video.format(),
            audio_codec = ?audio.as_ref().map(|a| a.encoder.codec_id()),
            sample_rate = ?audio.as_ref().map(|a| a.encoder.rate()),
            audio_frame_size = ?audio.as_ref().map(|a| a.transform.frame_size()),
            "opened render session"
        );

        Ok(Self {
            video_transform,
            audio,
            video,
            sink,
        })
    }

    fn send_frame(&mut self, image: &VideoFrame) -> Result<()> {
        let frame = self.video_transform.convert(image)?;
        let packets = self.video.encode(frame)?;
        write_all(&mut self.sink, &packets)
    }

    fn send_audio(&mut self, waveform: &AudioFrame) -> Result<()> {
        let Self { audio, sink, .. } = self;
        let AudioPipeline { transform, encoder } = audio
            .as_mut()
            .ok_or_else(|| Error::invalid_data("audio is disabled for this session"))?;

        transform.feed(waveform, |chunk| {
            let packets = encoder.encode(chunk)?;
            write_all(sink, &packets)
        })?;
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        let mut first: Option<Error> = None;
        let mut step = |name: &str, result: Result<()>| {
            if let Err(e) = result {
                tracing::warn!(step = name, error = %e, "teardown step failed");
                first.get_or_insert(e);
            }
        };

        step(
            "flush video",
            self.video
                .flush()
                .and_then(|packets| write_all(&mut self.sink, &packets)),
        );

        if let Some(audio) = self.audio.as_mut() {
            let dropped = audio.transform.discard();
            if dropped > 0 {
                tracing::warn!(samples = dropped, "discarding audio shorter than one frame");
            }
            step(
                "flush audio",
                audio
                    .encoder
                    .flush()
                    .and_then(|packets| write_all(&mut self.sink, &packets)),
            );
        }

        step("write trailer", self.sink.write_trailer());
        step("close file", self.sink.close_file());

        tracing::info!(
            frames = self.video.frames_encoded(),
            samples = self.audio.as_ref().map_or(0, |a| a.encoder.samples_encoded()),
            video_packets = self.sink.packets_written(StreamType::Video),
            audio_packets = self.sink.packets_written(StreamType::Audio),
            "closed render session"
        );

        first.map_or(Ok(()), Err)
    }
}

fn write_all(sink: &mut Sink, packets: &[Packet]) -> Result<()> {
    packets.iter().try_for_each(|packet| sink.write(packet))
}

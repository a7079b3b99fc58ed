/*!
    Soundtrack decoding.
*/

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout, codec, format,
    format::{Sample, sample::Type as SampleType},
    media,
    software::resampling::context::Context as ResamplerContext,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use ffmpeg_render::{AudioFrame, ChannelLayout};

/**
    Decode the first audio stream of a file into one interleaved stereo
    16-bit waveform at the file's own sample rate.
*/
pub fn decode(path: &Path) -> Result<AudioFrame> {
    ffmpeg_next::init()?;

    let mut input =
        format::input(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let (index, parameters) = {
        let stream = input
            .streams()
            .best(media::Type::Audio)
            .ok_or_else(|| anyhow!("{} has no audio stream", path.display()))?;
        (stream.index(), stream.parameters())
    };

    let mut decoder = codec::context::Context::from_parameters(parameters)?
        .decoder()
        .audio()
        .context("failed to open audio decoder")?;

    let mut pcm = Pcm::default();
    for (stream, packet) in input.packets() {
        if stream.index() != index {
            continue;
        }
        decoder.send_packet(&packet)?;
        pcm.drain(&mut decoder)?;
    }
    decoder.send_eof()?;
    pcm.drain(&mut decoder)?;
    pcm.finish()?;

    let rate = pcm.rate.ok_or_else(|| anyhow!("{} decoded no audio", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        rate,
        samples = pcm.samples.len() / 2,
        "decoded soundtrack"
    );

    Ok(AudioFrame::from_s16(&pcm.samples, rate, ChannelLayout::Stereo)?)
}

/// Interleaved stereo samples collected from the decoder.
#[derive(Default)]
struct Pcm {
    resampler: Option<ResamplerContext>,
    rate: Option<u32>,
    samples: Vec<i16>,
}

impl Pcm {
    fn drain(&mut self, decoder: &mut ffmpeg_next::decoder::Audio) -> Result<()> {
        let mut decoded = AudioFrameFFmpeg::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            self.append(&mut decoded)?;
        }
        Ok(())
    }

    fn append(&mut self, decoded: &mut AudioFrameFFmpeg) -> Result<()> {
        // Some containers leave the layout unspecified
        if decoded.channel_layout().is_empty() {
            decoded.set_channel_layout(FFmpegChannelLayout::default(decoded.channels() as i32));
        }

        if self.resampler.is_none() {
            self.resampler = Some(ResamplerContext::get(
                decoded.format(),
                decoded.channel_layout(),
                decoded.rate(),
                Sample::I16(SampleType::Packed),
                FFmpegChannelLayout::STEREO,
                decoded.rate(),
            )?);
            self.rate = Some(decoded.rate());
        }
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(());
        };

        let mut stereo = AudioFrameFFmpeg::empty();
        resampler.run(decoded, &mut stereo)?;
        self.extend(&stereo);
        Ok(())
    }

    /// Collect what the resampler still holds once the decoder is drained.
    fn finish(&mut self) -> Result<()> {
        let (Some(resampler), Some(rate)) = (self.resampler.as_mut(), self.rate) else {
            return Ok(());
        };
        let pending = resampler.delay().map_or(0, |d| d.output.max(0) as usize);
        if pending == 0 {
            return Ok(());
        }

        let mut stereo = AudioFrameFFmpeg::new(
            Sample::I16(SampleType::Packed),
            pending,
            FFmpegChannelLayout::STEREO,
        );
        stereo.set_rate(rate);
        resampler
            .flush(&mut stereo)
            .context("failed to flush the soundtrack resampler")?;
        tracing::debug!(samples = stereo.samples(), "flushed soundtrack resampler");
        self.extend(&stereo);
        Ok(())
    }

    fn extend(&mut self, stereo: &AudioFrameFFmpeg) {
        let values = stereo.samples() * 2;
        let bytes = &stereo.data(0)[..values * 2];
        self.samples.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| i16::from_ne_bytes([pair[0], pair[1]])),
        );
    }
}

/*!
    Waveform conversion into fixed-size encoder frames.
*/

use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout, format::Sample,
    software::resampling::context::Context as ResamplerContext,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use ffmpeg_types::{AudioFrame, ChannelLayout, Error, Result, SampleFormat};

use crate::SampleFifo;
use crate::convert::{
    audio_plane, audio_plane_mut, channel_layout_to_ffmpeg, make_writable, sample_format_to_ffmpeg,
};

/**
    Chunk size used when the encoder accepts any frame size.
*/
pub const DEFAULT_CHUNK_SAMPLES: usize = 1024;

/// Headroom added to the estimated resampler output.
const RESAMPLE_MARGIN: u64 = 256;

/**
    Audio frame transformer.

    Resamples host waveforms of any rate, layout and sample format into the
    encoder's negotiated format, buffers the result, and hands it out in
    chunks of exactly the encoder's frame size. Samples that do not fill a
    whole chunk stay buffered for the next waveform.

    The resampler context is lazily initialized from the first waveform. Every
    later waveform must share its rate, layout and sample format.
*/
pub struct AudioTransform {
    target_format: Sample,
    target_layout: FFmpegChannelLayout,
    target_rate: u32,
    frame_size: usize,
    /// Cached resampler context and the source parameters it was created for.
    resampler_state: Option<ResamplerState>,
    fifo: SampleFifo,
    chunk: AudioFrameFFmpeg,
}

struct ResamplerState {
    context: ResamplerContext,
    src_sample_rate: u32,
    src_channels: ChannelLayout,
    src_format: SampleFormat,
}

impl AudioTransform {
    /**
        Create a transformer for an encoder taking `frame_size` samples per frame.

        A `frame_size` of 0 means the encoder accepts any size, in which case
        chunks of [`DEFAULT_CHUNK_SAMPLES`] are produced.
    */
    pub fn new(
        target_format: Sample,
        target_layout: FFmpegChannelLayout,
        target_rate: u32,
        frame_size: usize,
    ) -> Self {
        let frame_size = if frame_size == 0 {
            DEFAULT_CHUNK_SAMPLES
        } else {
            frame_size
        };

        let channels = target_layout.channels().max(1) as usize;
        let fifo = if target_format.is_planar() {
            SampleFifo::new(channels, target_format.bytes())
        } else {
            SampleFifo::new(1, target_format.bytes() * channels)
        };

        let mut chunk = AudioFrameFFmpeg::new(target_format, frame_size, target_layout);
        chunk.set_rate(target_rate);

        Self {
            target_format,
            target_layout,
            target_rate,
            frame_size,
            resampler_state: None,
            fifo,
            chunk,
        }
    }

    /**
        Samples per chunk handed to the encoder.
    */
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /**
        Samples waiting for a full chunk.
    */
    pub fn buffered(&self) -> usize {
        self.fifo.len()
    }

    /**
        Resample a whole waveform into the residual buffer.

        Returns the number of output samples appended. The sample count can
        differ from the input's when the rates differ.
    */
    pub fn push(&mut self, frame: &AudioFrame) -> Result<usize> {
        if frame.is_empty() {
            return Ok(0);
        }

        let needed =
            frame.samples * frame.format.bytes_per_sample() * frame.channels.channels() as usize;
        if frame.data.len() < needed {
            return Err(Error::invalid_data(format!(
                "waveform holds {} bytes, {} samples need {needed}",
                frame.data.len(),
                frame.samples
            )));
        }

        if self.resampler_state.is_none() {
            self.resampler_state = Some(self.init_resampler(frame)?);
        }
        let state = self
            .resampler_state
            .as_mut()
            .ok_or_else(|| Error::codec("resampler not initialized"))?;

        if state.src_sample_rate != frame.sample_rate
            || state.src_channels != frame.channels
            || state.src_format != frame.format
        {
            return Err(Error::invalid_data(format!(
                "waveform changed from {} Hz {:?} {:?} to {} Hz {:?} {:?}",
                state.src_sample_rate,
                state.src_channels,
                state.src_format,
                frame.sample_rate,
                frame.channels,
                frame.format
            )));
        }

        let src_sample = sample_format_to_ffmpeg(frame.format)?;
        let src_layout = channel_layout_to_ffmpeg(frame.channels)?;
        let mut src_frame = AudioFrameFFmpeg::new(src_sample, frame.samples, src_layout);
        src_frame.set_rate(frame.sample_rate);

        let dst_plane = audio_plane_mut(&mut src_frame, 0)?;
        if dst_plane.len() < needed {
            return Err(Error::allocation(format!(
                "resampler input buffer holds {} bytes, need {needed}",
                dst_plane.len()
            )));
        }
        dst_plane[..needed].copy_from_slice(&frame.data[..needed]);

        let capacity = (frame.samples as u64 * u64::from(self.target_rate))
            .div_ceil(u64::from(frame.sample_rate))
            + RESAMPLE_MARGIN;
        let mut dst_frame =
            AudioFrameFFmpeg::new(self.target_format, capacity as usize, self.target_layout);
        dst_frame.set_rate(self.target_rate);

        state
            .context
            .run(&src_frame, &mut dst_frame)
            .map_err(|e| Error::codec(format!("resampling failed: {e}")))?;

        let produced = dst_frame.samples();
        let planes = (0..self.fifo.planes())
            .map(|p| audio_plane(&dst_frame, p))
            .collect::<Result<Vec<_>>>()?;
        self.fifo.push(produced, planes)?;

        Ok(produced)
    }

    /**
        Copy the next full chunk out of the residual buffer.

        Returns `None` once fewer than [`frame_size`](Self::frame_size)
        samples remain. The samples stay buffered until
        [`commit_chunk`](Self::commit_chunk), so calling this again without
        committing yields the same chunk. The returned frame is reused; its
        timestamp is left for the caller to stamp.
    */
    pub fn next_chunk(&mut self) -> Result<Option<&mut AudioFrameFFmpeg>> {
        if self.fifo.len() < self.frame_size {
            return Ok(None);
        }

        make_writable(&mut self.chunk)?;
        for plane in 0..self.fifo.planes() {
            let src = self
                .fifo
                .front(plane, self.frame_size)
                .ok_or_else(|| Error::invalid_data("residual buffer underrun"))?;
            let dst = audio_plane_mut(&mut self.chunk, plane)?;
            if dst.len() < src.len() {
                return Err(Error::allocation(format!(
                    "audio frame plane holds {} bytes, chunk needs {}",
                    dst.len(),
                    src.len()
                )));
            }
            dst[..src.len()].copy_from_slice(src);
        }

        Ok(Some(&mut self.chunk))
    }

    /**
        Remove the chunk last returned by [`next_chunk`](Self::next_chunk).
    */
    pub fn commit_chunk(&mut self) {
        self.fifo.consume(self.frame_size);
    }

    /**
        Resample a waveform and hand every full chunk to `encode`.

        A chunk leaves the buffer only once `encode` accepts it. If resampling
        or `encode` fails, the samples this waveform added that were not
        encoded are removed again, so the residual from earlier waveforms is
        kept and retrying with the same waveform does not buffer it twice.

        Returns the number of chunks encoded.
    */
    pub fn feed<F>(&mut self, frame: &AudioFrame, mut encode: F) -> Result<usize>
    where
        F: FnMut(&mut AudioFrameFFmpeg) -> Result<()>,
    {
        let appended = self.push(frame)?;

        let mut chunks = 0;
        let result = loop {
            let chunk = match self.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break Ok(chunks),
                Err(e) => break Err(e),
            };
            if let Err(e) = encode(chunk) {
                break Err(e);
            }
            self.commit_chunk();
            chunks += 1;
        };

        if result.is_err() {
            let unencoded = self.fifo.len().min(appended);
            self.fifo.truncate(self.fifo.len() - unencoded);
        }
        result
    }

    /**
        Drop buffered samples that never filled a chunk, returning how many.
    */
    pub fn discard(&mut self) -> usize {
        self.fifo.clear()
    }

    fn init_resampler(&self, frame: &AudioFrame) -> Result<ResamplerState> {
        let context = ResamplerContext::get(
            sample_format_to_ffmpeg(frame.format)?,
            channel_layout_to_ffmpeg(frame.channels)?,
            frame.sample_rate,
            self.target_format,
            self.target_layout,
            self.target_rate,
        )
        .map_err(|e| Error::codec(format!("failed to create resampler: {e}")))?;

        tracing::debug!(
            src_rate = frame.sample_rate,
            src_channels = ?frame.channels,
            src_format = ?frame.format,
            dst_rate = self.target_rate,
            dst_format = ?self.target_format,
            "created sample conversion context"
        );

        Ok(ResamplerState {
            context,
            src_sample_rate: frame.sample_rate,
            src_channels: frame.channels,
            src_format: frame.format,
        })
    }
}

impl std::fmt::Debug for AudioTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTransform")
            .field("target_format", &self.target_format)
            .field("target_rate", &self.target_rate)
            .field("frame_size", &self.frame_size)
            .field("initialized", &self.resampler_state.is_some())
            .field("buffered", &self.fifo.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::format::sample::Type as SampleType;

    use super::*;

    fn s16_stereo(samples: usize, rate: u32) -> AudioFrame {
        let pcm: Vec<i16> = (0..samples * 2).map(|i| (i % 2000) as i16).collect();
        AudioFrame::from_s16(&pcm, rate, ChannelLayout::Stereo).unwrap()
    }

    fn packed_s16_transform(frame_size: usize) -> AudioTransform {
        AudioTransform::new(
            Sample::I16(SampleType::Packed),
            FFmpegChannelLayout::STEREO,
            44100,
            frame_size,
        )
    }

    #[test]
    fn chunks_are_exact_and_residual_carries_over() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);

        assert_eq!(transform.push(&s16_stereo(2500, 44100)).unwrap(), 2500);

        let mut chunks = 0;
        while let Some(chunk) = transform.next_chunk().unwrap() {
            assert_eq!(chunk.samples(), 1024);
            transform.commit_chunk();
            chunks += 1;
        }
        assert_eq!(chunks, 2);
        assert_eq!(transform.buffered(), 452);

        // the residual is completed by the next waveform
        transform.push(&s16_stereo(600, 44100)).unwrap();
        assert!(transform.next_chunk().unwrap().is_some());
        transform.commit_chunk();
        assert_eq!(transform.buffered(), 28);
    }

    #[test]
    fn identity_conversion_preserves_samples() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(4);
        let input = s16_stereo(4, 44100);

        transform.push(&input).unwrap();
        let chunk = transform.next_chunk().unwrap().unwrap();
        assert_eq!(&chunk.data(0)[..16], &input.data[..]);
    }

    #[test]
    fn zero_frame_size_uses_default_chunk() {
        ffmpeg_next::init().unwrap();
        let transform = packed_s16_transform(0);
        assert_eq!(transform.frame_size(), DEFAULT_CHUNK_SAMPLES);
    }

    #[test]
    fn resamples_rate_layout_and_format() {
        ffmpeg_next::init().unwrap();
        let mut transform = AudioTransform::new(
            Sample::F32(SampleType::Planar),
            FFmpegChannelLayout::STEREO,
            44100,
            1024,
        );

        let mono = AudioFrame::from_f32(&vec![0.25; 48000], 48000, ChannelLayout::Mono).unwrap();
        let produced = transform.push(&mono).unwrap();
        // one second of input; the resampler may hold back a few samples
        assert!((43000..=44100).contains(&produced), "produced {produced}");

        let chunk = transform.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.format(), Sample::F32(SampleType::Planar));
        assert_eq!(chunk.rate(), 44100);
        assert_eq!(chunk.planes(), 2);

        // both channels carry the upmixed signal
        let left = audio_plane(chunk, 0).unwrap()[..1024 * 4].to_vec();
        let right = audio_plane(chunk, 1).unwrap()[..1024 * 4].to_vec();
        assert_eq!(left, right);
        let tail = f32::from_ne_bytes([left[4092], left[4093], left[4094], left[4095]]);
        assert!(tail > 0.1, "tail sample {tail}");
    }

    #[test]
    fn uncommitted_chunk_stays_buffered() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(4);
        transform.push(&s16_stereo(6, 44100)).unwrap();

        let first = transform.next_chunk().unwrap().unwrap().data(0)[..16].to_vec();
        let again = transform.next_chunk().unwrap().unwrap().data(0)[..16].to_vec();
        assert_eq!(first, again);
        assert_eq!(transform.buffered(), 6);

        transform.commit_chunk();
        assert_eq!(transform.buffered(), 2);
    }

    #[test]
    fn feed_hands_out_every_full_chunk() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);

        let mut sizes = Vec::new();
        let chunks = transform
            .feed(&s16_stereo(3000, 44100), |chunk| {
                sizes.push(chunk.samples());
                Ok(())
            })
            .unwrap();
        assert_eq!(chunks, 2);
        assert_eq!(sizes, vec![1024, 1024]);
        assert_eq!(transform.buffered(), 952);
    }

    #[test]
    fn failed_first_chunk_restores_residual() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);
        transform.push(&s16_stereo(100, 44100)).unwrap();

        let err = transform
            .feed(&s16_stereo(2000, 44100), |_| Err(Error::encode("encoder rejected frame")))
            .unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert_eq!(transform.buffered(), 100);

        // a retry with the same waveform sees it only once
        let chunks = transform.feed(&s16_stereo(2000, 44100), |_| Ok(())).unwrap();
        assert_eq!(chunks, 2);
        assert_eq!(transform.buffered(), 2100 - 2048);
    }

    #[test]
    fn failure_after_some_chunks_drops_only_the_unencoded_tail() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);

        let mut calls = 0;
        let err = transform
            .feed(&s16_stereo(4000, 44100), |_| {
                calls += 1;
                if calls == 2 {
                    Err(Error::encode("encoder rejected frame"))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert_eq!(calls, 2);
        assert_eq!(transform.buffered(), 0);
    }

    #[test]
    fn source_change_is_rejected() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);
        transform.push(&s16_stereo(100, 44100)).unwrap();

        let err = transform.push(&s16_stereo(100, 48000)).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(transform.buffered(), 100);
    }

    #[test]
    fn empty_waveform_is_a_no_op() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);
        let empty = AudioFrame::from_s16(&[], 44100, ChannelLayout::Stereo).unwrap();
        assert_eq!(transform.push(&empty).unwrap(), 0);
        assert!(transform.next_chunk().unwrap().is_none());
    }

    #[test]
    fn discard_drops_residual() {
        ffmpeg_next::init().unwrap();
        let mut transform = packed_s16_transform(1024);
        transform.push(&s16_stereo(300, 44100)).unwrap();
        assert_eq!(transform.discard(), 300);
        assert_eq!(transform.buffered(), 0);
    }
}

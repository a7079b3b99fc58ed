/*!
    Conversions between ecosystem types and FFmpeg types.
*/

use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout, ffi,
    format::{Pixel, Sample, sample::Type as SampleType},
    util::frame::{Frame, audio::Audio as AudioFrameFFmpeg},
};

use ffmpeg_types::{ChannelLayout, Error, PixelFormat, Result, SampleFormat};

/**
    Convert our PixelFormat to FFmpeg's Pixel format.
*/
pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> Result<Pixel> {
    match format {
        PixelFormat::Yuv420p => Ok(Pixel::YUV420P),
        PixelFormat::Nv12 => Ok(Pixel::NV12),
        PixelFormat::Bgra => Ok(Pixel::BGRA),
        PixelFormat::Rgba => Ok(Pixel::RGBA),
        PixelFormat::Rgb24 => Ok(Pixel::RGB24),
        PixelFormat::Bgr24 => Ok(Pixel::BGR24),
        PixelFormat::Yuv422p => Ok(Pixel::YUV422P),
        PixelFormat::Yuv444p => Ok(Pixel::YUV444P),
        PixelFormat::Yuv420p10 => Ok(Pixel::YUV420P10LE),
        PixelFormat::P010le => Ok(Pixel::P010LE),
        _ => Err(Error::unsupported_format(format!(
            "pixel format {format} not supported"
        ))),
    }
}

/**
    Convert our SampleFormat to FFmpeg's packed Sample format.

    Host waveforms are interleaved, so only packed variants are produced.
*/
pub fn sample_format_to_ffmpeg(format: SampleFormat) -> Result<Sample> {
    match format {
        SampleFormat::F32 => Ok(Sample::F32(SampleType::Packed)),
        SampleFormat::F64 => Ok(Sample::F64(SampleType::Packed)),
        SampleFormat::S16 => Ok(Sample::I16(SampleType::Packed)),
        SampleFormat::S32 => Ok(Sample::I32(SampleType::Packed)),
        SampleFormat::U8 => Ok(Sample::U8(SampleType::Packed)),
        _ => Err(Error::unsupported_format(format!(
            "sample format {format:?} not supported"
        ))),
    }
}

/**
    Convert our ChannelLayout to FFmpeg's ChannelLayout.
*/
pub fn channel_layout_to_ffmpeg(layout: ChannelLayout) -> Result<FFmpegChannelLayout> {
    match layout {
        ChannelLayout::Mono => Ok(FFmpegChannelLayout::MONO),
        ChannelLayout::Stereo => Ok(FFmpegChannelLayout::STEREO),
        ChannelLayout::Surround5_1 => Ok(FFmpegChannelLayout::_5POINT1),
        ChannelLayout::Surround7_1 => Ok(FFmpegChannelLayout::_7POINT1),
        _ => Err(Error::unsupported_format(format!(
            "channel layout {layout:?} not supported"
        ))),
    }
}

/**
    Ensure a reused frame owns its buffers before it is overwritten.

    Encoders may keep a reference to the last frame they were given; this
    copies the buffers in that case so the encoder's copy stays intact.
*/
pub(crate) fn make_writable(frame: &mut Frame) -> Result<()> {
    let ret = unsafe { ffi::av_frame_make_writable(frame.as_mut_ptr()) };
    if ret < 0 {
        return Err(Error::allocation(format!(
            "failed to make frame writable: {}",
            ffmpeg_next::Error::from(ret)
        )));
    }
    Ok(())
}

/**
    Bytes of one audio plane.

    `frame.data(p)` sizes every plane by `linesize[p]`, but FFmpeg only fills
    `linesize[0]` for audio, so planes past the first would come back empty.
    All planes of an audio frame share the size of plane 0.
*/
pub(crate) fn audio_plane(frame: &AudioFrameFFmpeg, plane: usize) -> Result<&[u8]> {
    let (ptr, len) = audio_plane_raw(frame, plane)?;
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/**
    Mutable bytes of one audio plane. See [`audio_plane`].
*/
pub(crate) fn audio_plane_mut(frame: &mut AudioFrameFFmpeg, plane: usize) -> Result<&mut [u8]> {
    let (ptr, len) = audio_plane_raw(frame, plane)?;
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

fn audio_plane_raw(frame: &AudioFrameFFmpeg, plane: usize) -> Result<(*mut u8, usize)> {
    if plane >= frame.planes() || plane >= ffi::AV_NUM_DATA_POINTERS as usize {
        return Err(Error::invalid_data(format!(
            "audio frame has {} planes, plane {plane} requested",
            frame.planes()
        )));
    }

    let (ptr, linesize) = unsafe {
        let raw = frame.as_ptr();
        ((*raw).data[plane], (*raw).linesize[0])
    };
    if ptr.is_null() || linesize <= 0 {
        return Err(Error::allocation(format!("audio plane {plane} is not allocated")));
    }
    Ok((ptr, linesize as usize))
}

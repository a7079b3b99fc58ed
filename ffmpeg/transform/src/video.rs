/*!
    Raster image conversion into encoder frames.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_types::{Error, PixelFormat, Result, VideoFrame};

use crate::convert::{make_writable, pixel_format_to_ffmpeg};

/**
    Video frame transformer.

    Converts host images of a fixed size into the encoder's negotiated pixel
    format. Source and destination dimensions are always equal: this is a
    pure reformat, never a resize.

    The scaler context is lazily initialized from the first image. Every later
    image must use the same source pixel format; a different one is rejected
    rather than silently rebuilding the context.

    The output frame is allocated once and reused for every image.
*/
pub struct VideoTransform {
    width: u32,
    height: u32,
    target: Pixel,
    /// Cached scaler context and the source format it was created for.
    scaler_state: Option<ScalerState>,
    output: VideoFrameFFmpeg,
}

struct ScalerState {
    context: ScalerContext,
    src_format: PixelFormat,
    /// Intermediate buffer the host image is copied into before scaling.
    src_frame: VideoFrameFFmpeg,
}

impl VideoTransform {
    /**
        Create a transformer producing `target` frames of `width`×`height`.
    */
    pub fn new(width: u32, height: u32, target: Pixel) -> Self {
        Self {
            width,
            height,
            target,
            scaler_state: None,
            output: VideoFrameFFmpeg::new(target, width, height),
        }
    }

    /**
        Source format the scaler was initialized with, if any image was seen.
    */
    pub fn source_format(&self) -> Option<PixelFormat> {
        self.scaler_state.as_ref().map(|s| s.src_format)
    }

    /**
        Convert an image into the reusable encoder frame.

        The returned frame is valid until the next call. Its timestamp is left
        for the caller to stamp.
    */
    pub fn convert(&mut self, frame: &VideoFrame) -> Result<&mut VideoFrameFFmpeg> {
        if frame.width != self.width || frame.height != self.height {
            return Err(Error::ResolutionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }

        let expected = frame.format.frame_size(frame.width, frame.height);
        if frame.data.len() < expected {
            return Err(Error::invalid_data(format!(
                "frame holds {} bytes, {} needs {expected}",
                frame.data.len(),
                frame.format
            )));
        }

        if self.scaler_state.is_none() {
            self.scaler_state = Some(Self::init_scaler(
                self.width,
                self.height,
                self.target,
                frame.format,
            )?);
        }
        let state = self
            .scaler_state
            .as_mut()
            .ok_or_else(|| Error::codec("scaler not initialized"))?;

        if state.src_format != frame.format {
            return Err(Error::invalid_data(format!(
                "source pixel format changed from {} to {}",
                state.src_format, frame.format
            )));
        }

        copy_planes_to_ffmpeg(&mut state.src_frame, frame)?;

        make_writable(&mut self.output)?;
        state
            .context
            .run(&state.src_frame, &mut self.output)
            .map_err(|e| Error::codec(format!("pixel conversion failed: {e}")))?;

        Ok(&mut self.output)
    }

    fn init_scaler(
        width: u32,
        height: u32,
        target: Pixel,
        src_format: PixelFormat,
    ) -> Result<ScalerState> {
        let src_pixel = pixel_format_to_ffmpeg(src_format)?;

        let context = ScalerContext::get(
            src_pixel,
            width,
            height,
            target,
            width,
            height,
            ScalerFlags::BILINEAR,
        )
        .map_err(|e| Error::codec(format!("failed to create scaler: {e}")))?;

        tracing::debug!(
            src = %src_format,
            dst = ?target,
            width,
            height,
            "created pixel conversion context"
        );

        Ok(ScalerState {
            context,
            src_format,
            src_frame: VideoFrameFFmpeg::new(src_pixel, width, height),
        })
    }
}

/**
    Copy tightly packed planes into an FFmpeg frame, honouring its strides.
*/
fn copy_planes_to_ffmpeg(dst: &mut VideoFrameFFmpeg, src: &VideoFrame) -> Result<()> {
    let plane_count = dst.planes();

    for (index, (row_bytes, plane)) in src.planes().enumerate() {
        if index >= plane_count {
            return Err(Error::invalid_data(format!(
                "{} has more planes than the conversion frame",
                src.format
            )));
        }

        let stride = dst.stride(index);
        if stride < row_bytes {
            return Err(Error::invalid_data(format!(
                "plane {index} stride {stride} is shorter than a {row_bytes}-byte row"
            )));
        }

        let dst_data = dst.data_mut(index);
        for (y, row) in plane.chunks_exact(row_bytes).enumerate() {
            let start = y * stride;
            dst_data[start..start + row_bytes].copy_from_slice(row);
        }
    }

    Ok(())
}

impl std::fmt::Debug for VideoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTransform")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("target", &self.target)
            .field("source", &self.source_format())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> VideoFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 16) as u8, (y * 16) as u8, 128, 255]);
            }
        }
        VideoFrame::from_rgba(data, width, height).unwrap()
    }

    #[test]
    fn rgba_to_yuv420p_keeps_dimensions() {
        ffmpeg_next::init().unwrap();
        let mut transform = VideoTransform::new(16, 8, Pixel::YUV420P);

        let out = transform.convert(&gradient(16, 8)).unwrap();
        assert_eq!(out.format(), Pixel::YUV420P);
        assert_eq!(out.width(), 16);
        assert_eq!(out.height(), 8);
        assert_eq!(transform.source_format(), Some(PixelFormat::Rgba));
    }

    #[test]
    fn same_format_conversion_is_lossless() {
        ffmpeg_next::init().unwrap();
        let mut transform = VideoTransform::new(4, 2, Pixel::RGBA);
        let input = gradient(4, 2);

        let out = transform.convert(&input).unwrap();
        let stride = out.stride(0);
        for y in 0..2 {
            let row = &out.data(0)[y * stride..y * stride + 16];
            assert_eq!(row, &input.data[y * 16..(y + 1) * 16]);
        }
    }

    #[test]
    fn wrong_size_is_resolution_mismatch() {
        ffmpeg_next::init().unwrap();
        let mut transform = VideoTransform::new(16, 8, Pixel::YUV420P);

        let err = transform.convert(&gradient(8, 8)).unwrap_err();
        assert!(matches!(
            err,
            Error::ResolutionMismatch {
                expected_width: 16,
                actual_width: 8,
                ..
            }
        ));
        assert_eq!(transform.source_format(), None);

        assert!(transform.convert(&gradient(16, 8)).is_ok());
    }

    #[test]
    fn source_format_change_is_rejected() {
        ffmpeg_next::init().unwrap();
        let mut transform = VideoTransform::new(4, 4, Pixel::YUV420P);
        transform.convert(&gradient(4, 4)).unwrap();

        let bgr = VideoFrame::new(vec![0; 48], 4, 4, PixelFormat::Bgr24).unwrap();
        let err = transform.convert(&bgr).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        // the original format still works afterwards
        assert!(transform.convert(&gradient(4, 4)).is_ok());
    }

    #[test]
    fn output_frame_is_reused() {
        ffmpeg_next::init().unwrap();
        let mut transform = VideoTransform::new(8, 8, Pixel::YUV420P);
        let first = transform.convert(&gradient(8, 8)).unwrap() as *const VideoFrameFFmpeg;
        let second = transform.convert(&gradient(8, 8)).unwrap() as *const VideoFrameFFmpeg;
        assert_eq!(first, second);
    }
}

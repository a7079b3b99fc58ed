/*!
    Media frame transformation for the ffmpeg crate ecosystem.

    This crate converts host frames into the exact layout an encoder expects.
    For video: pixel format conversion into a reusable encoder frame. For audio:
    resampling, channel layout and sample format conversion, then slicing into
    fixed-size encoder frames through a residual buffer.
*/

mod audio;
mod convert;
mod fifo;
mod video;

pub use audio::{AudioTransform, DEFAULT_CHUNK_SAMPLES};
pub use convert::{channel_layout_to_ffmpeg, pixel_format_to_ffmpeg, sample_format_to_ffmpeg};
pub use fifo::SampleFifo;
pub use video::VideoTransform;

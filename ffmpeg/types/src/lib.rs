/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary of the ecosystem: the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.

    - [`VideoFrame`] is a raster image handed to the renderer by the host.
    - [`AudioFrame`] is an interleaved waveform handed to the renderer by the host.
    - [`Packet`] is a unit of compressed data travelling from an encoder to a sink.
    - [`Error`] is the single error type shared by every crate in the pipeline.
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod time;

pub use codec::{CodecId, MediaKind};
pub use error::{Error, ParseError, Result};
pub use format::{ChannelLayout, PixelFormat, SampleFormat};
pub use frame::{AudioFrame, VideoFrame};
pub use packet::{Packet, StreamType};
pub use time::{MediaDuration, Pts, Rational};

/*!
    Media output and muxing for the ffmpeg crate ecosystem.

    This crate handles the output side of the media pipeline. It takes encoded
    packets from the encoders and writes them into a container file whose
    format is inferred from the path: MP4, MKV, MOV, AVI, NUT and so on.
    Interleaving by presentation time is left to the muxer.
*/

pub use ffmpeg_types::{Error, Packet, Rational, Result, StreamType};

mod sink;

pub use sink::Sink;

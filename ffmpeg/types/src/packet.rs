/*!
    Compressed packet type.
*/

use std::fmt;

use crate::{MediaDuration, Pts, Rational};

/**
    Which output stream a packet belongs to.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    Video,
    Audio,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Audio => "audio",
        })
    }
}

/**
    A unit of compressed data produced by an encoder.

    Timestamps are in `time_base`, which is the encoder's time base. The sink
    rescales them to the stream time base on write.
*/
#[derive(Clone)]
pub struct Packet {
    pub data: Vec<u8>,
    pub pts: Option<Pts>,
    pub dts: Option<Pts>,
    pub duration: MediaDuration,
    pub time_base: Rational,
    pub is_keyframe: bool,
    pub stream_type: StreamType,
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("stream_type", &self.stream_type)
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("duration", &self.duration)
            .field("time_base", &self.time_base)
            .field("is_keyframe", &self.is_keyframe)
            .field("size", &self.data.len())
            .finish()
    }
}

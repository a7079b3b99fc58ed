use thiserror::Error;

use crate::StreamType;

/**
    Result alias used across the ecosystem.
*/
pub type Result<T> = std::result::Result<T, Error>;

/**
    Errors produced anywhere in the render pipeline.

    Setup errors (`InvalidConfig`, `UnsupportedContainer`, `Allocation`,
    `CodecOpen`, `Io`) come out of session open and leave nothing allocated.
    Per-frame errors (`ResolutionMismatch`, `InvalidData`, `Encode`) leave the
    session open so the caller can retry or close.
*/
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ── Setup ─────────────────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no container format matches '{0}'")]
    UnsupportedContainer(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("allocation failed: {0}")]
    Allocation(String),
    #[error("failed to open {stream} encoder: {message}")]
    CodecOpen { stream: StreamType, message: String },

    // ── Output ────────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(String),

    // ── Per-frame ─────────────────────────────────────────────────────
    #[error(
        "frame is {actual_width}x{actual_height}, session expects {expected_width}x{expected_height}"
    )]
    ResolutionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("codec error: {0}")]
    Codec(String),

    // ── Session state ─────────────────────────────────────────────────
    #[error("render session is not open")]
    NotOpen,
    #[error("render session is already open")]
    AlreadyOpen,
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn codec_open(stream: StreamType, msg: impl Into<String>) -> Self {
        Self::CodecOpen {
            stream,
            message: msg.into(),
        }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /**
        Integer status for this error.

        Every kind maps to a distinct negative value; `0` is reserved for
        success. Video and audio encoder open failures are told apart so a
        caller can see which step of session open failed.
    */
    pub fn status(&self) -> i32 {
        match self {
            Self::InvalidConfig(_) => -1,
            Self::UnsupportedContainer(_) => -2,
            Self::Allocation(_) => -3,
            Self::CodecOpen {
                stream: StreamType::Video,
                ..
            } => -4,
            Self::CodecOpen {
                stream: StreamType::Audio,
                ..
            } => -5,
            Self::Io(_) => -6,
            Self::ResolutionMismatch { .. } => -7,
            Self::Encode(_) => -8,
            Self::UnsupportedFormat(_) => -9,
            Self::InvalidData(_) => -10,
            Self::Codec(_) => -11,
            Self::NotOpen => -12,
            Self::AlreadyOpen => -13,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_distinct_and_negative() {
        let errors = [
            Error::invalid_config("x"),
            Error::UnsupportedContainer("x".into()),
            Error::allocation("x"),
            Error::codec_open(StreamType::Video, "x"),
            Error::codec_open(StreamType::Audio, "x"),
            Error::io("x"),
            Error::ResolutionMismatch {
                expected_width: 2,
                expected_height: 2,
                actual_width: 4,
                actual_height: 4,
            },
            Error::encode("x"),
            Error::unsupported_format("x"),
            Error::invalid_data("x"),
            Error::codec("x"),
            Error::NotOpen,
            Error::AlreadyOpen,
        ];

        let mut statuses: Vec<i32> = errors.iter().map(Error::status).collect();
        assert!(statuses.iter().all(|s| *s < 0));
        statuses.sort_unstable();
        statuses.dedup();
        assert_eq!(statuses.len(), errors.len());
    }

    #[test]
    fn resolution_mismatch_message() {
        let err = Error::ResolutionMismatch {
            expected_width: 1920,
            expected_height: 1080,
            actual_width: 1280,
            actual_height: 720,
        };
        assert_eq!(
            err.to_string(),
            "frame is 1280x720, session expects 1920x1080"
        );
    }

    #[test]
    fn codec_open_names_stream() {
        let err = Error::codec_open(StreamType::Audio, "bit rate too high");
        assert_eq!(
            err.to_string(),
            "failed to open audio encoder: bit rate too high"
        );
    }
}

/*!
    Pixel and sample format types.
*/

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/**
    Video pixel formats.

    This is a subset of formats commonly encountered in render pipelines.
    Not all FFmpeg pixel formats are represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (the default encoder format)
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp
    Nv12,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGBA, 32bpp (the usual raster input)
    Rgba,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit little-endian
    Yuv420p10,
    /// Semi-planar YUV 4:2:0, 10-bit little-endian
    P010le,
}

impl PixelFormat {
    pub const ALL: [Self; 10] = [
        Self::Yuv420p,
        Self::Nv12,
        Self::Bgra,
        Self::Rgba,
        Self::Rgb24,
        Self::Bgr24,
        Self::Yuv422p,
        Self::Yuv444p,
        Self::Yuv420p10,
        Self::P010le,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Nv12 => "nv12",
            Self::Bgra => "bgra",
            Self::Rgba => "rgba",
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10 => "yuv420p10",
            Self::P010le => "p010le",
        }
    }

    /**
        Tightly packed layout of a `width`×`height` image in this format.

        Each entry is `(row_bytes, rows)` for one plane, in FFmpeg plane
        order. Chroma dimensions round up so odd sizes still cover every pixel.
    */
    pub fn plane_layout(self, width: u32, height: u32) -> Vec<(usize, usize)> {
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);

        match self {
            Self::Yuv420p => vec![(w, h), (cw, ch), (cw, ch)],
            Self::Nv12 => vec![(w, h), (cw * 2, ch)],
            Self::Bgra | Self::Rgba => vec![(w * 4, h)],
            Self::Rgb24 | Self::Bgr24 => vec![(w * 3, h)],
            Self::Yuv422p => vec![(w, h), (cw, h), (cw, h)],
            Self::Yuv444p => vec![(w, h), (w, h), (w, h)],
            Self::Yuv420p10 => vec![(w * 2, h), (cw * 2, ch), (cw * 2, ch)],
            Self::P010le => vec![(w * 2, h), (cw * 4, ch)],
        }
    }

    /**
        Total byte size of a tightly packed `width`×`height` image.
    */
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        self.plane_layout(width, height)
            .iter()
            .map(|(row, rows)| row * rows)
            .sum()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError {
                kind: "pixel format",
                value: s.to_string(),
            })
    }
}

/**
    Audio sample formats.

    Describes the encoding of one sample of a host waveform. Host waveforms
    are always interleaved.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[non_exhaustive]
pub enum SampleFormat {
    /// 32-bit floating point, range [-1.0, 1.0]
    F32,
    /// 64-bit floating point
    F64,
    /// Signed 16-bit integer
    S16,
    /// Signed 32-bit integer
    S32,
    /// Unsigned 8-bit integer
    U8,
}

impl SampleFormat {
    /**
        Returns the number of bytes per sample.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/**
    Audio channel layout.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[non_exhaustive]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Left and right channels (the only output layout)
    Stereo,
    /// 5.1 surround (FL, FR, FC, LFE, BL, BR)
    Surround5_1,
    /// 7.1 surround (FL, FR, FC, LFE, BL, BR, SL, SR)
    Surround7_1,
}

impl ChannelLayout {
    /**
        Returns the number of channels.
    */
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround5_1 => 6,
            Self::Surround7_1 => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_is_single_plane() {
        assert_eq!(PixelFormat::Rgba.plane_layout(4, 2), vec![(16, 2)]);
        assert_eq!(PixelFormat::Rgba.frame_size(4, 2), 32);
        assert_eq!(PixelFormat::Bgr24.frame_size(3, 3), 27);
    }

    #[test]
    fn yuv420p_layout_rounds_chroma_up() {
        assert_eq!(
            PixelFormat::Yuv420p.plane_layout(4, 4),
            vec![(4, 4), (2, 2), (2, 2)]
        );
        assert_eq!(
            PixelFormat::Yuv420p.plane_layout(5, 3),
            vec![(5, 3), (3, 2), (3, 2)]
        );
        assert_eq!(PixelFormat::Yuv420p.frame_size(1920, 1080), 1920 * 1080 * 3 / 2);
    }

    #[test]
    fn nv12_has_interleaved_chroma_plane() {
        assert_eq!(PixelFormat::Nv12.plane_layout(8, 4), vec![(8, 4), (8, 2)]);
    }

    #[test]
    fn pixel_format_parses_names() {
        for format in PixelFormat::ALL {
            assert_eq!(format.name().parse::<PixelFormat>(), Ok(format));
        }
        assert_eq!("RGBA".parse::<PixelFormat>(), Ok(PixelFormat::Rgba));
        let err = "argb".parse::<PixelFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown pixel format 'argb'");
    }

    #[test]
    fn sample_format_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
    }
}

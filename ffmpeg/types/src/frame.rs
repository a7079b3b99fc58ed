/*!
    Uncompressed frames handed to the render pipeline by the host.

    Both frame types own tightly packed data in a declared format. They carry
    no timestamps: the session stamps presentation time from its own counters.
*/

use bytemuck::cast_slice;

use crate::{ChannelLayout, Error, PixelFormat, Result, SampleFormat};

/**
    A raster image.

    Planes are stored back to back with no row padding, in the order given by
    [`PixelFormat::plane_layout`]. An RGBA image is therefore `width * height * 4`
    bytes in R, G, B, A order.
*/
#[derive(Clone)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl VideoFrame {
    /**
        Create a frame, checking that `data` covers the whole image.
    */
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_data(format!(
                "empty frame dimensions {width}x{height}"
            )));
        }

        let expected = format.frame_size(width, height);
        if data.len() != expected {
            return Err(Error::invalid_data(format!(
                "{format} frame {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /**
        Create an RGBA frame from packed 8-bit samples.
    */
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        Self::new(data, width, height, PixelFormat::Rgba)
    }

    /**
        Iterate over the planes as `(row_bytes, plane_data)`.
    */
    pub fn planes(&self) -> impl Iterator<Item = (usize, &[u8])> {
        let mut offset = 0;
        self.format
            .plane_layout(self.width, self.height)
            .into_iter()
            .map(move |(row, rows)| {
                let len = row * rows;
                let plane = &self.data[offset..offset + len];
                offset += len;
                (row, plane)
            })
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/**
    An interleaved audio waveform.
*/
#[derive(Clone)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    /// Samples per channel.
    pub samples: usize,
    pub sample_rate: u32,
    pub channels: ChannelLayout,
    pub format: SampleFormat,
}

impl AudioFrame {
    /**
        Create a waveform from raw interleaved bytes.

        The sample count is derived from the data length, which must hold a
        whole number of frames.
    */
    pub fn new(
        data: Vec<u8>,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::invalid_data("sample rate must be positive"));
        }

        let frame_bytes = format.bytes_per_sample() * channels.channels() as usize;
        if data.len() % frame_bytes != 0 {
            return Err(Error::invalid_data(format!(
                "{} bytes is not a whole number of {}-byte sample frames",
                data.len(),
                frame_bytes
            )));
        }

        Ok(Self {
            samples: data.len() / frame_bytes,
            data,
            sample_rate,
            channels,
            format,
        })
    }

    pub fn from_s16(samples: &[i16], sample_rate: u32, channels: ChannelLayout) -> Result<Self> {
        Self::new(
            cast_slice(samples).to_vec(),
            sample_rate,
            channels,
            SampleFormat::S16,
        )
    }

    pub fn from_f32(samples: &[f32], sample_rate: u32, channels: ChannelLayout) -> Result<Self> {
        Self::new(
            cast_slice(samples).to_vec(),
            sample_rate,
            channels,
            SampleFormat::F32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
}

impl std::fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFrame")
            .field("samples", &self.samples)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("format", &self.format)
            .finish()
    }
}

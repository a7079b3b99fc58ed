/*!
    Residual sample buffer between the resampler and the audio encoder.
*/

use ffmpeg_types::{Error, Result};

/**
    First-in first-out buffer of audio samples, stored per plane.

    Packed audio uses a single plane holding interleaved samples; planar audio
    uses one plane per channel. Every plane always holds the same number of
    samples.

    The resampler appends whatever it produced; the encoder side removes
    fixed-size chunks from the front. Anything shorter than a chunk stays
    buffered until more samples arrive.
*/
#[derive(Clone)]
pub struct SampleFifo {
    planes: Vec<Vec<u8>>,
    /// Bytes one sample occupies in one plane.
    sample_bytes: usize,
}

impl SampleFifo {
    /**
        Create an empty buffer with `planes` planes of `sample_bytes` bytes per sample.
    */
    pub fn new(planes: usize, sample_bytes: usize) -> Self {
        Self {
            planes: vec![Vec::new(); planes.max(1)],
            sample_bytes: sample_bytes.max(1),
        }
    }

    pub fn planes(&self) -> usize {
        self.planes.len()
    }

    /**
        Number of buffered samples per plane.
    */
    pub fn len(&self) -> usize {
        self.planes[0].len() / self.sample_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /**
        Append `samples` samples, taking them from the front of each input plane.
    */
    pub fn push<'a>(
        &mut self,
        samples: usize,
        input: impl IntoIterator<Item = &'a [u8]>,
    ) -> Result<()> {
        let bytes = samples * self.sample_bytes;
        let input: Vec<&[u8]> = input.into_iter().collect();

        if input.len() != self.planes.len() {
            return Err(Error::invalid_data(format!(
                "expected {} sample planes, got {}",
                self.planes.len(),
                input.len()
            )));
        }
        if let Some(short) = input.iter().find(|plane| plane.len() < bytes) {
            return Err(Error::invalid_data(format!(
                "sample plane holds {} bytes, {} samples need {}",
                short.len(),
                samples,
                bytes
            )));
        }

        for (plane, data) in self.planes.iter_mut().zip(input) {
            plane.extend_from_slice(&data[..bytes]);
        }
        Ok(())
    }

    /**
        The first `samples` samples of one plane, or `None` if fewer are buffered.
    */
    pub fn front(&self, plane: usize, samples: usize) -> Option<&[u8]> {
        let bytes = samples * self.sample_bytes;
        self.planes
            .get(plane)
            .filter(|data| data.len() >= bytes)
            .map(|data| &data[..bytes])
    }

    /**
        Drop up to `samples` samples from the front of every plane.
    */
    pub fn consume(&mut self, samples: usize) {
        let bytes = (samples * self.sample_bytes).min(self.planes[0].len());
        for plane in &mut self.planes {
            plane.drain(..bytes);
        }
    }

    /**
        Keep only the oldest `samples` samples, dropping newer ones.
    */
    pub fn truncate(&mut self, samples: usize) {
        let bytes = samples * self.sample_bytes;
        for plane in &mut self.planes {
            plane.truncate(bytes);
        }
    }

    /**
        Discard everything, returning the number of samples dropped.
    */
    pub fn clear(&mut self) -> usize {
        let dropped = self.len();
        for plane in &mut self.planes {
            plane.clear();
        }
        dropped
    }
}

impl std::fmt::Debug for SampleFifo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleFifo")
            .field("planes", &self.planes.len())
            .field("sample_bytes", &self.sample_bytes)
            .field("len", &self.len())
            .finish()
    }
}

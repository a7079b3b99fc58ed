/*!
    Media sink implementation.
*/

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_next::{
    Codec, Rational as FFmpegRational,
    codec::Parameters,
    ffi,
    format::{self, context::Output as OutputContext},
};

use ffmpeg_types::{Error, Packet, Rational, Result, StreamType};

/**
    Media sink for writing to container files.

    Setup is split into steps so the caller can open encoders between them:

    1. [`Sink::new`] infers the container from the path and allocates the
       output context. Nothing is written to disk yet.
    2. [`Sink::add_stream`] once per encoded stream.
    3. [`Sink::open_file`] creates (or truncates) the destination file.
    4. [`Sink::write_header`] writes the container header and reads back the
       stream time bases the muxer settled on.

    Packets are then written with [`Sink::write`], and the container is
    finished with [`Sink::write_trailer`] and [`Sink::close_file`]. Dropping
    the sink closes the file if it is still open.
*/
pub struct Sink {
    output: OutputContext,
    path: PathBuf,
    c_path: CString,
    video: Option<SinkStream>,
    audio: Option<SinkStream>,
    file_open: bool,
    header_written: bool,
}

/**
    Bookkeeping for one output stream.
*/
#[derive(Clone, Copy, Debug)]
struct SinkStream {
    index: usize,
    time_base: Rational,
    packets: u64,
}

impl Sink {
    /**
        Create a sink for `path`, inferring the container from its extension.

        Fails with `UnsupportedContainer` if no muxer claims the extension.
    */
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let path = path.as_ref();
        let c_path = path
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or_else(|| {
                Error::invalid_config(format!("output path {} is not valid UTF-8", path.display()))
            })?;

        let oformat = unsafe { ffi::av_guess_format(ptr::null(), c_path.as_ptr(), ptr::null()) };
        if oformat.is_null() {
            return Err(Error::UnsupportedContainer(path.display().to_string()));
        }

        let mut ctx: *mut ffi::AVFormatContext = ptr::null_mut();
        let ret = unsafe {
            ffi::avformat_alloc_output_context2(&mut ctx, oformat, ptr::null(), c_path.as_ptr())
        };
        if ret < 0 || ctx.is_null() {
            return Err(Error::allocation(format!(
                "output context for {}: {}",
                path.display(),
                ffmpeg_next::Error::from(ret)
            )));
        }
        let output = unsafe { OutputContext::wrap(ctx) };

        tracing::debug!(
            path = %path.display(),
            container = output.format().name(),
            "allocated output context"
        );

        Ok(Self {
            output,
            path: path.to_path_buf(),
            c_path,
            video: None,
            audio: None,
            file_open: false,
            header_written: false,
        })
    }

    /**
        Short name of the inferred container format, e.g. `mp4`.
    */
    pub fn container_name(&self) -> String {
        self.output.format().name().to_owned()
    }

    /**
        True if encoders must put codec extradata in the container header.
    */
    pub fn needs_global_header(&self) -> bool {
        self.output
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER)
    }

    /**
        Add a stream carrying packets from an opened encoder.

        `time_base` is the encoder's time base; it is requested for the
        stream, but the muxer may replace it when the header is written.
    */
    pub fn add_stream(
        &mut self,
        codec: Codec,
        parameters: Parameters,
        time_base: Rational,
        kind: StreamType,
    ) -> Result<usize> {
        if self.header_written {
            return Err(Error::invalid_data("cannot add a stream after the header"));
        }
        if self.slot(kind).is_some() {
            return Err(Error::invalid_data(format!("{kind} stream already added")));
        }

        let mut stream = self
            .output
            .add_stream(codec)
            .map_err(|e| Error::allocation(format!("{kind} stream: {e}")))?;
        stream.set_parameters(parameters);
        stream.set_time_base(FFmpegRational::new(time_base.num, time_base.den));
        let index = stream.index();

        *self.slot_mut(kind) = Some(SinkStream {
            index,
            time_base,
            packets: 0,
        });
        Ok(index)
    }

    /**
        Open the destination file for writing, truncating it if it exists.

        Containers that do their own I/O skip this step.
    */
    pub fn open_file(&mut self) -> Result<()> {
        if self.file_open || self.output.format().flags().contains(format::Flags::NO_FILE) {
            return Ok(());
        }

        let ret = unsafe {
            ffi::avio_open(
                &mut (*self.output.as_mut_ptr()).pb,
                self.c_path.as_ptr(),
                ffi::AVIO_FLAG_WRITE as i32,
            )
        };
        if ret < 0 {
            return Err(Error::io(format!(
                "cannot open {} for writing: {}",
                self.path.display(),
                ffmpeg_next::Error::from(ret)
            )));
        }

        self.file_open = true;
        Ok(())
    }

    /**
        Write the container header.

        Stream time bases are read back afterwards; packets are rescaled to
        whatever the muxer chose.
    */
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }

        self.output
            .write_header()
            .map_err(|e| Error::io(format!("failed to write header: {e}")))?;
        self.header_written = true;

        for kind in [StreamType::Video, StreamType::Audio] {
            let Some(index) = self.slot(kind).map(|s| s.index) else {
                continue;
            };
            let Some(tb) = self.output.stream(index).map(|s| s.time_base()) else {
                continue;
            };
            let time_base = Rational::new(tb.numerator(), tb.denominator());
            if let Some(stream) = self.slot_mut(kind) {
                if time_base.is_valid() {
                    stream.time_base = time_base;
                }
                tracing::debug!(stream = %kind, time_base = %stream.time_base, "stream time base");
            }
        }

        Ok(())
    }

    /**
        Get the time base packets of `kind` are written in.
    */
    pub fn time_base(&self, kind: StreamType) -> Option<Rational> {
        self.slot(kind).map(|s| s.time_base)
    }

    /**
        Get the number of packets written to the stream of `kind`.
    */
    pub fn packets_written(&self, kind: StreamType) -> u64 {
        self.slot(kind).map_or(0, |s| s.packets)
    }

    /**
        Write a packet to the sink.

        Packets are routed by their stream type and rescaled from their own
        time base to the stream's. The muxer buffers and reorders so that the
        file is interleaved by presentation time regardless of call order.
    */
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        if !self.header_written {
            return Err(Error::invalid_data("header not written"));
        }

        let stream = self.slot(packet.stream_type).ok_or_else(|| {
            Error::invalid_data(format!("no {} stream configured", packet.stream_type))
        })?;
        let (index, stream_tb) = (stream.index, stream.time_base);

        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        ffmpeg_pkt.set_stream(index);
        ffmpeg_pkt.set_pts(packet.pts.map(|p| p.rescale(packet.time_base, stream_tb).0));
        ffmpeg_pkt.set_dts(packet.dts.map(|d| d.rescale(packet.time_base, stream_tb).0));
        ffmpeg_pkt.set_duration(packet.duration.rescale(packet.time_base, stream_tb).0);
        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        ffmpeg_pkt
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::io(format!("failed to write {} packet: {e}", packet.stream_type)))?;

        if let Some(stream) = self.slot_mut(packet.stream_type) {
            stream.packets += 1;
        }
        Ok(())
    }

    /**
        Write the container trailer.

        Flushes packets still held for interleaving and finalizes indexes and
        durations. Does nothing if the header was never written.
    */
    pub fn write_trailer(&mut self) -> Result<()> {
        if !self.header_written {
            return Ok(());
        }

        self.output
            .write_trailer()
            .map_err(|e| Error::io(format!("failed to write trailer: {e}")))?;
        self.header_written = false;

        tracing::debug!(
            video_packets = self.packets_written(StreamType::Video),
            audio_packets = self.packets_written(StreamType::Audio),
            "wrote trailer"
        );
        Ok(())
    }

    /**
        Close the destination file. Safe to call more than once.
    */
    pub fn close_file(&mut self) -> Result<()> {
        if !self.file_open {
            return Ok(());
        }
        self.file_open = false;

        let ret = unsafe { ffi::avio_closep(&mut (*self.output.as_mut_ptr()).pb) };
        if ret < 0 {
            return Err(Error::io(format!(
                "failed to close {}: {}",
                self.path.display(),
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }

    fn slot(&self, kind: StreamType) -> Option<&SinkStream> {
        match kind {
            StreamType::Video => self.video.as_ref(),
            StreamType::Audio => self.audio.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: StreamType) -> &mut Option<SinkStream> {
        match kind {
            StreamType::Video => &mut self.video,
            StreamType::Audio => &mut self.audio,
        }
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if let Err(e) = self.close_file() {
            tracing::warn!(error = %e, "closing output file on drop");
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("path", &self.path)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .field("file_open", &self.file_open)
            .field("header_written", &self.header_written)
            .finish_non_exhaustive()
    }
}

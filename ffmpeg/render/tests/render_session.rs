//! End-to-end renders against the linked FFmpeg.
//!
//! Only FFmpeg-native encoders (MPEG-4 part 2, raw video, PCM) are used so
//! the tests do not depend on optional external libraries.

use std::path::Path;

use ffmpeg_next::{format, media, util::frame::video::Video as VideoFrameFFmpeg};

use ffmpeg_render::{
    AudioFrame, ChannelLayout, CodecId, Error, PixelFormat, RenderConfig, Renderer, VideoFrame,
    is_video_codec_supported, supported_codecs,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

fn mpeg4(path: &Path) -> RenderConfig {
    RenderConfig::new(path)
        .with_video_codec(CodecId::Mpeg4)
        .with_resolution(WIDTH, HEIGHT)
        .with_frame_rate(25)
}

/// A frame whose pixels depend on position and frame index.
fn pattern(index: u32, width: u32, height: u32) -> VideoFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[
                (x * 4 + index) as u8,
                (y * 5) as u8,
                ((x + y) * 3) as u8,
                255,
            ]);
        }
    }
    VideoFrame::from_rgba(data, width, height).unwrap()
}

fn tone(samples: usize, rate: u32) -> AudioFrame {
    let mut interleaved = Vec::with_capacity(samples * 2);
    for n in 0..samples {
        let t = n as f32 / rate as f32;
        let s = ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16;
        interleaved.extend_from_slice(&[s, s]);
    }
    AudioFrame::from_s16(&interleaved, rate, ChannelLayout::Stereo).unwrap()
}

struct Demuxed {
    medium: media::Type,
    pts: Option<i64>,
    seconds: f64,
}

/// Read every packet back in file order.
fn demux(path: &Path) -> Vec<Demuxed> {
    ffmpeg_next::init().unwrap();
    let mut input = format::input(&path).unwrap();
    let streams: Vec<_> = input
        .streams()
        .map(|s| (s.parameters().medium(), s.time_base()))
        .collect();

    input
        .packets()
        .map(|(stream, packet)| {
            let (medium, tb) = streams[stream.index()];
            let ts = packet.dts().or(packet.pts()).unwrap_or(0);
            Demuxed {
                medium,
                pts: packet.pts(),
                seconds: ts as f64 * f64::from(tb),
            }
        })
        .collect()
}

/// Decode every video frame in the file.
fn decode_video(path: &Path) -> Vec<VideoFrameFFmpeg> {
    ffmpeg_next::init().unwrap();
    let mut input = format::input(&path).unwrap();
    let (index, parameters) = {
        let stream = input.streams().best(media::Type::Video).unwrap();
        (stream.index(), stream.parameters())
    };
    let mut decoder = ffmpeg_next::codec::context::Context::from_parameters(parameters)
        .unwrap()
        .decoder()
        .video()
        .unwrap();

    fn drain(decoder: &mut ffmpeg_next::decoder::Video, frames: &mut Vec<VideoFrameFFmpeg>) {
        loop {
            let mut frame = VideoFrameFFmpeg::empty();
            if decoder.receive_frame(&mut frame).is_err() {
                break;
            }
            frames.push(frame);
        }
    }

    let mut frames = Vec::new();
    for (stream, packet) in input.packets() {
        if stream.index() == index {
            decoder.send_packet(&packet).unwrap();
            drain(&mut decoder, &mut frames);
        }
    }
    decoder.send_eof().unwrap();
    drain(&mut decoder, &mut frames);
    frames
}

#[test]
fn open_then_close_yields_a_valid_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.mp4");

    let mut renderer = Renderer::new(mpeg4(&path));
    renderer.open().unwrap();
    renderer.close().unwrap();

    ffmpeg_next::init().unwrap();
    let input = format::input(&path).unwrap();
    assert_eq!(input.streams().count(), 1);
    assert!(demux(&path).is_empty());
}

#[test]
fn empty_file_with_audio_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.mkv");

    let mut renderer = Renderer::new(mpeg4(&path).with_audio_codec(CodecId::PcmS16Le));
    renderer.open().unwrap();
    renderer.close().unwrap();

    ffmpeg_next::init().unwrap();
    let input = format::input(&path).unwrap();
    let kinds: Vec<_> = input.streams().map(|s| s.parameters().medium()).collect();
    assert_eq!(kinds, vec![media::Type::Video, media::Type::Audio]);
}

#[test]
fn every_frame_lands_evenly_spaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frames.mkv");
    const N: u32 = 12;

    let mut renderer = Renderer::new(mpeg4(&path));
    renderer.open().unwrap();
    for i in 0..N {
        renderer.send_frame(&pattern(i, WIDTH, HEIGHT)).unwrap();
    }
    assert_eq!(renderer.frames_written(), u64::from(N));
    renderer.close().unwrap();

    assert_eq!(decode_video(&path).len(), N as usize);

    let mut pts: Vec<i64> = demux(&path).iter().filter_map(|p| p.pts).collect();
    assert_eq!(pts.len(), N as usize);
    pts.sort_unstable();
    let step = pts[1] - pts[0];
    assert!(step > 0);
    assert!(pts.windows(2).all(|w| w[1] - w[0] == step), "{pts:?}");
}

#[test]
fn wrong_resolution_keeps_session_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mismatch.mkv");

    let mut renderer = Renderer::new(mpeg4(&path));
    renderer.open().unwrap();

    let err = renderer.send_frame(&pattern(0, 32, 32)).unwrap_err();
    assert!(matches!(err, Error::ResolutionMismatch { .. }));
    assert_eq!(renderer.status(), err.status());
    assert!(renderer.is_open());
    assert_eq!(renderer.frames_written(), 0);

    renderer.send_frame(&pattern(0, WIDTH, HEIGHT)).unwrap();
    assert_eq!(renderer.frames_written(), 1);
    renderer.close().unwrap();

    assert_eq!(decode_video(&path).len(), 1);
}

#[test]
fn odd_width_fails_before_touching_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("existing.mp4");
    std::fs::write(&existing, b"keep me").unwrap();

    let mut renderer = Renderer::new(mpeg4(&existing).with_resolution(1921, 1080));
    let err = renderer.open().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(!renderer.is_open());
    assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");

    let fresh = dir.path().join("fresh.mp4");
    let mut renderer = Renderer::new(mpeg4(&fresh).with_resolution(1921, 1080));
    assert!(renderer.open().is_err());
    assert!(!fresh.exists());
}

#[test]
fn unknown_extension_is_unsupported_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.definitely-not-a-container");

    let mut renderer = Renderer::new(mpeg4(&path));
    let err = renderer.open().unwrap_err();
    assert!(matches!(err, Error::UnsupportedContainer(_)));
    assert!(!renderer.is_open());
    assert!(!path.exists());
}

#[test]
fn unwritable_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.mkv");

    let mut renderer = Renderer::new(mpeg4(&path));
    let err = renderer.open().unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(renderer.status(), -6);
    assert!(renderer.error_string().is_some());
    assert!(!renderer.is_open());
}

#[test]
fn capability_query_agrees_with_predicate() {
    let supported = supported_codecs();
    for id in CodecId::ALL.into_iter().filter(|id| id.is_video()) {
        assert_eq!(supported.video.contains(&id), is_video_codec_supported(id), "{id}");
    }
}

#[test]
fn streams_are_interleaved_by_time_not_call_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("av.mkv");

    let mut renderer = Renderer::new(
        mpeg4(&path)
            .with_frame_rate(10)
            .with_audio_codec(CodecId::PcmS16Le)
            .with_audio_sample_rate(44100),
    );
    renderer.open().unwrap();
    for i in 0..5 {
        renderer.send_frame(&pattern(i, WIDTH, HEIGHT)).unwrap();
    }
    // one second of audio after half a second of video
    renderer.send_audio(&tone(44100, 44100)).unwrap();
    for i in 5..10 {
        renderer.send_frame(&pattern(i, WIDTH, HEIGHT)).unwrap();
    }
    // whole 1024-sample chunks only
    assert_eq!(renderer.samples_written(), 43 * 1024);
    renderer.close().unwrap();

    let packets = demux(&path);
    assert!(packets.iter().any(|p| p.medium == media::Type::Audio));
    assert_eq!(
        packets.iter().filter(|p| p.medium == media::Type::Video).count(),
        10
    );
    assert!(
        packets.windows(2).all(|w| w[0].seconds <= w[1].seconds + 1e-9),
        "packets are not in time order"
    );
}

#[test]
fn audio_at_another_rate_is_resampled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resampled.mkv");

    let mut renderer = Renderer::new(mpeg4(&path).with_audio_codec(CodecId::PcmS16Le));
    renderer.open().unwrap();
    // 48 kHz in, 44.1 kHz out
    renderer.send_audio(&tone(48000, 48000)).unwrap();
    let written = renderer.samples_written();
    assert!(written > 40 * 1024 && written <= 44100, "{written}");
    renderer.close().unwrap();
}

#[test]
fn planar_fixed_frame_encoder_gets_whole_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aac.mkv");

    // the native AAC encoder takes planar float in 1024-sample frames
    let mut renderer = Renderer::new(
        mpeg4(&path)
            .with_audio_codec(CodecId::Aac)
            .with_audio_sample_rate(44100),
    );
    renderer.open().unwrap();
    renderer.send_frame(&pattern(0, WIDTH, HEIGHT)).unwrap();
    renderer.send_audio(&tone(30000, 44100)).unwrap();
    renderer.send_audio(&tone(15000, 44100)).unwrap();

    let written = renderer.samples_written();
    assert_eq!(written % 1024, 0);
    // 45000 samples in, the last 968 never fill a frame
    assert_eq!(written, 43 * 1024);
    renderer.close().unwrap();

    let packets = demux(&path);
    let audio: Vec<f64> = packets
        .iter()
        .filter(|p| p.medium == media::Type::Audio)
        .map(|p| p.seconds)
        .collect();
    assert!(audio.len() >= 40, "{} audio packets", audio.len());
    assert!(
        audio.windows(2).all(|w| w[0] <= w[1]),
        "audio packets are not in time order"
    );
}

#[test]
fn rejected_waveform_keeps_earlier_residual() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("retry.mkv");

    let mut renderer = Renderer::new(mpeg4(&path).with_audio_codec(CodecId::Aac));
    renderer.open().unwrap();
    renderer.send_audio(&tone(100, 44100)).unwrap();
    assert_eq!(renderer.samples_written(), 0);

    // the session is pinned to its first source rate
    let err = renderer.send_audio(&tone(1000, 48000)).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
    assert!(renderer.is_open());
    assert_eq!(renderer.samples_written(), 0);

    renderer.send_audio(&tone(1000, 44100)).unwrap();
    assert_eq!(renderer.samples_written(), 1024);
    renderer.close().unwrap();
}

#[test]
fn closing_twice_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.mkv");

    let mut renderer = Renderer::new(mpeg4(&path));
    renderer.open().unwrap();
    renderer.send_frame(&pattern(0, WIDTH, HEIGHT)).unwrap();
    renderer.close().unwrap();
    renderer.close().unwrap();
    assert_eq!(renderer.status(), 0);

    // the same renderer can open again
    renderer.open().unwrap();
    assert_eq!(renderer.frames_written(), 0);
    renderer.close().unwrap();
}

#[test]
fn lossless_round_trip_reproduces_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lossless.nut");

    let mut renderer = Renderer::new(
        RenderConfig::new(&path)
            .with_video_codec(CodecId::RawVideo)
            .with_pixel_format(PixelFormat::Rgba)
            .with_resolution(WIDTH, HEIGHT)
            .with_frame_rate(25),
    );
    let source = pattern(7, WIDTH, HEIGHT);
    renderer.open().unwrap();
    renderer.send_frame(&source).unwrap();
    renderer.close().unwrap();

    let frames = decode_video(&path);
    assert_eq!(frames.len(), 1);
    let decoded = &frames[0];
    assert_eq!(decoded.format(), format::Pixel::RGBA);

    let row = (WIDTH * 4) as usize;
    let stride = decoded.stride(0);
    for y in 0..HEIGHT as usize {
        assert_eq!(
            &decoded.data(0)[y * stride..y * stride + row],
            &source.data[y * row..(y + 1) * row],
            "row {y}"
        );
    }
}

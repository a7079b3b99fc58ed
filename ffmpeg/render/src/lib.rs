/*!
    Offline rendering of still images and audio into a video file.

    A [`Renderer`] ties the other crates of the ecosystem together: it
    validates a [`RenderConfig`], opens encoders and a container sink, pushes
    each submitted image through `ffmpeg-transform` and the video encoder,
    chops submitted waveforms into encoder-sized chunks, and finishes the file
    on close.

    ```ignore
    use ffmpeg_render::{CodecId, RenderConfig, Renderer, VideoFrame};

    let config = RenderConfig::new("out.mp4")
        .with_video_codec(CodecId::Mpeg4)
        .with_resolution(1280, 720)
        .with_frame_rate(30);

    let mut renderer = Renderer::new(config);
    renderer.open()?;
    for image in images {
        renderer.send_frame(&VideoFrame::from_rgba(image, 1280, 720)?)?;
    }
    renderer.close()?;
    ```

    Codec availability can be queried without a session through
    [`supported_codecs`], [`is_video_codec_supported`] and
    [`is_audio_codec_supported`].
*/

mod config;
mod renderer;

pub use config::RenderConfig;
pub use renderer::Renderer;

pub use ffmpeg_encode::{
    SupportedCodecs, is_audio_codec_supported, is_codec_supported, is_video_codec_supported,
    supported_codecs,
};
pub use ffmpeg_types::{
    AudioFrame, ChannelLayout, CodecId, Error, MediaKind, PixelFormat, Result, SampleFormat,
    VideoFrame,
};

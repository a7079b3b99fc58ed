use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ffmpeg_render::{CodecId, MediaKind, PixelFormat, RenderConfig, Renderer, supported_codecs};

mod audio;
mod images;

/**
    Render still images and an optional soundtrack into a video file.
*/
#[derive(Parser, Debug)]
#[command(name = "vidrender", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv also shows FFmpeg's own log)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode images (and optionally audio) into a video.
    Render(RenderArgs),
    /// List the codecs the linked FFmpeg can encode.
    Codecs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Image files or directories of images, rendered in sorted order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file; the container is inferred from the extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load the render job from a JSON file; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audio file to encode alongside the images
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Video codec (e.g. h264, hevc, mpeg4, vp9)
    #[arg(long)]
    video_codec: Option<CodecId>,

    /// Audio codec (e.g. aac, mp3, opus, pcm_s16le)
    #[arg(long)]
    audio_codec: Option<CodecId>,

    /// Output width; defaults to the first image's width
    #[arg(long)]
    width: Option<u32>,

    /// Output height; defaults to the first image's height
    #[arg(long)]
    height: Option<u32>,

    /// Frames per second
    #[arg(short = 'r', long)]
    fps: Option<u32>,

    /// Video bitrate in bits per second
    #[arg(short, long)]
    bitrate: Option<u64>,

    /// Keyframe interval in frames
    #[arg(short, long)]
    gop: Option<u32>,

    /// Requested encoder pixel format
    #[arg(long)]
    pixel_format: Option<PixelFormat>,

    /// Preferred audio sample rate in Hz
    #[arg(long)]
    audio_rate: Option<u32>,

    /// Audio bitrate in bits per second
    #[arg(long)]
    audio_bitrate: Option<u64>,

    /// How many frames each image is held for
    #[arg(long, default_value = "1")]
    frames_per_image: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Render(args) => cmd_render(&args),
        Command::Codecs => {
            cmd_codecs();
            Ok(())
        }
    }
}

/// Initialize logging with tracing
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "vidrender=info,ffmpeg_render=info",
        _ => "vidrender=debug,ffmpeg_render=debug,ffmpeg_encode=debug,ffmpeg_sink=debug,ffmpeg_transform=debug",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }

    if verbose < 2 {
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    }
}

fn cmd_codecs() {
    let supported = supported_codecs();
    for kind in [MediaKind::Video, MediaKind::Audio, MediaKind::Subtitle] {
        let names: Vec<&str> = supported.family(kind).iter().map(|c| c.name()).collect();
        let listed = if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(" ")
        };
        println!("{:<10}{}", format!("{kind}:"), listed);
    }
}

fn cmd_render(args: &RenderArgs) -> Result<()> {
    let paths = images::collect(&args.inputs)?;
    if paths.is_empty() {
        bail!("no images found in the given inputs");
    }

    let first = images::load(&paths[0])?;
    let config = build_config(args, first.width(), first.height())?;
    config.ready_check().context("render configuration is not usable")?;

    let waveform = args
        .audio
        .as_deref()
        .map(audio::decode)
        .transpose()?;

    tracing::info!(
        images = paths.len(),
        output = %config.path.display(),
        "rendering"
    );

    let mut renderer = Renderer::new(config);
    renderer
        .open()
        .with_context(|| format!("failed to open {}", renderer.config().path.display()))?;

    if let Some(waveform) = &waveform {
        renderer.send_audio(waveform).context("failed to encode audio")?;
    }

    let (width, height) = (renderer.config().width, renderer.config().height);
    for (i, path) in paths.iter().enumerate() {
        let image = if i == 0 {
            images::fit(first.clone(), width, height)
        } else {
            images::fit(images::load(path)?, width, height)
        };
        let frame = images::to_frame(image)?;
        for _ in 0..args.frames_per_image {
            renderer
                .send_frame(&frame)
                .with_context(|| format!("failed to encode {}", path.display()))?;
        }
    }

    let frames = renderer.frames_written();
    let samples = renderer.samples_written();
    renderer.close().context("failed to finish the output file")?;

    println!(
        "wrote {} ({frames} frames, {samples} audio samples)",
        renderer.config().path.display()
    );
    Ok(())
}

/**
    Merge the JSON job (if any) with command-line overrides.

    Width and height fall back to the first image's size when neither the job
    nor the flags set them.
*/
fn build_config(args: &RenderArgs, image_width: u32, image_height: u32) -> Result<RenderConfig> {
    let (mut config, from_file) = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: RenderConfig = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            (config, true)
        }
        None => (RenderConfig::default(), false),
    };

    if !from_file {
        config.width = image_width;
        config.height = image_height;
    }
    if let Some(output) = &args.output {
        config.path = output.clone();
    }
    if let Some(codec) = args.video_codec {
        config.video_codec = codec;
    }
    if let Some(codec) = args.audio_codec {
        config.audio_codec = codec;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(fps) = args.fps {
        config.frame_rate = fps;
    }
    if let Some(bit_rate) = args.bitrate {
        config.bit_rate = bit_rate;
    }
    if let Some(gop) = args.gop {
        config.gop_size = gop;
    }
    if let Some(format) = args.pixel_format {
        config.pixel_format = format;
    }
    if let Some(rate) = args.audio_rate {
        config.audio_sample_rate = rate;
    }
    if let Some(bit_rate) = args.audio_bitrate {
        config.audio_bit_rate = bit_rate;
    }
    config.audio_enabled = args.audio.is_some();

    if config.path.as_os_str().is_empty() {
        bail!("no output path: pass --output or set \"path\" in the job file");
    }
    Ok(config)
}

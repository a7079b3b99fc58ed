/*!
    Image discovery and loading.
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, imageops::FilterType};
use walkdir::WalkDir;

use ffmpeg_render::VideoFrame;

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/**
    Expand inputs into an ordered list of image files.

    Files are kept in the order given. Directories are walked recursively and
    contribute their images sorted by path.
*/
pub fn collect(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input) {
                let entry =
                    entry.with_context(|| format!("failed to walk {}", input.display()))?;
                if entry.file_type().is_file() && is_image(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

pub fn load(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("failed to load {}", path.display()))
}

/**
    Resize an image to the output resolution if it differs.
*/
pub fn fit(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image;
    }
    tracing::debug!(
        from = %format!("{}x{}", image.width(), image.height()),
        to = %format!("{width}x{height}"),
        "resizing image"
    );
    image.resize_exact(width, height, FilterType::Triangle)
}

/**
    Convert to an RGBA raster frame.
*/
pub fn to_frame(image: DynamicImage) -> Result<VideoFrame> {
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(VideoFrame::from_rgba(rgba.into_raw(), width, height)?)
}

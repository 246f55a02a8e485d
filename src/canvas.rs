//! Letterboxes reference images onto a fixed-width canvas of the requested
//! aspect ratio before they are sent to an image-to-image model.
//!
//! The source is scaled to fit entirely inside the canvas (never cropped),
//! centred on both axes, and the remaining area is filled with opaque white.
//! Output is always JPEG.

use crate::{
    error::{Result, StudioError},
    models::ImageAsset,
};
use image::{
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
    DynamicImage, Rgba, RgbaImage,
};

pub const CANVAS_WIDTH: u32 = 1024;
pub const JPEG_QUALITY: u8 = 95;
pub const OUTPUT_MIME: &str = "image/jpeg";
pub const FALLBACK_RATIO: f64 = 1.0;
/// Tallest canvas produced, reached at a 1:4 ratio.
pub const MAX_CANVAS_HEIGHT: u32 = 4096;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Parses `"W:H"` into `W / H`.
///
/// Malformed input (missing colon, non-numeric, zero or negative parts) falls
/// back to a square canvas. The fallback is logged so a bad ratio never
/// silently changes the output shape.
pub fn parse_ratio(ratio: &str) -> f64 {
    let parsed = ratio.split_once(':').and_then(|(w, h)| {
        let w: f64 = w.trim().parse().ok()?;
        let h: f64 = h.trim().parse().ok()?;
        (w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0).then(|| w / h)
    });

    match parsed {
        Some(value) => value,
        None => {
            log::warn!(
                "⚠️  Could not parse aspect ratio '{}', falling back to {}",
                ratio,
                FALLBACK_RATIO
            );
            FALLBACK_RATIO
        }
    }
}

/// Placement of a source image on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Letterbox {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub fn letterbox(source_width: u32, source_height: u32, target_ratio: f64) -> Letterbox {
    let canvas_width = CANVAS_WIDTH;
    let canvas_height = (f64::from(CANVAS_WIDTH) / target_ratio)
        .round()
        .clamp(1.0, f64::from(MAX_CANVAS_HEIGHT)) as u32;
    let frame_ratio = f64::from(canvas_width) / f64::from(canvas_height);
    let source_ratio = f64::from(source_width.max(1)) / f64::from(source_height.max(1));

    if source_ratio > frame_ratio {
        // wider than the frame: fit width, centre vertically
        let height = ((f64::from(canvas_width) / source_ratio).round() as u32).clamp(1, canvas_height);
        Letterbox {
            canvas_width,
            canvas_height,
            x: 0,
            y: (canvas_height - height) / 2,
            width: canvas_width,
            height,
        }
    } else {
        let width = ((f64::from(canvas_height) * source_ratio).round() as u32).clamp(1, canvas_width);
        Letterbox {
            canvas_width,
            canvas_height,
            x: (canvas_width - width) / 2,
            y: 0,
            width,
            height: canvas_height,
        }
    }
}

pub fn normalize(asset: &ImageAsset, ratio: &str) -> Result<ImageAsset> {
    let source = image::load_from_memory(asset.bytes())
        .map_err(|e| StudioError::DecodeError(format!("Failed to load image: {}", e)))?;
    if source.width() == 0 || source.height() == 0 {
        return Err(StudioError::DecodeError("Image has no pixels".into()));
    }

    let frame = letterbox(source.width(), source.height(), parse_ratio(ratio));
    log::debug!(
        "Letterboxing {}x{} into {}x{} at ({}, {})",
        source.width(),
        source.height(),
        frame.canvas_width,
        frame.canvas_height,
        frame.x,
        frame.y
    );

    let scaled = source
        .resize_exact(frame.width, frame.height, FilterType::Triangle)
        .to_rgba8();
    let mut canvas = RgbaImage::from_pixel(frame.canvas_width, frame.canvas_height, BACKGROUND);
    imageops::overlay(&mut canvas, &scaled, i64::from(frame.x), i64::from(frame.y));

    let flattened = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&DynamicImage::ImageRgb8(flattened))
        .map_err(|e| StudioError::EncodeError(format!("Failed to encode canvas: {}", e)))?;

    ImageAsset::from_bytes(bytes, OUTPUT_MIME)
}

/// Normalizes every asset concurrently, keeping input order.
pub async fn normalize_all(assets: &[ImageAsset], ratio: &str) -> Result<Vec<ImageAsset>> {
    let tasks = assets.iter().cloned().map(|asset| {
        let ratio = ratio.to_string();
        tokio::task::spawn_blocking(move || normalize(&asset, &ratio))
    });

    futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(StudioError::EnvironmentError(format!(
                "Canvas worker failed: {}",
                e
            ))),
        })
        .collect()
}

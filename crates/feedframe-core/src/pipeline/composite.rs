//! Places a background-free product photo onto the template canvas.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::CompositeConfig;
use crate::error::FailureKind;
use crate::storage;

/// Scale and vertical anchor of the product on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Product height relative to canvas height.
    pub height_fraction: f64,
    /// Product vertical centre relative to canvas height.
    pub anchor_y: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self::from(&CompositeConfig::default())
    }
}

impl From<&CompositeConfig> for Layout {
    fn from(cfg: &CompositeConfig) -> Self {
        Self {
            height_fraction: cfg.height_fraction,
            anchor_y: cfg.anchor_y,
        }
    }
}

/// Where and how large the product lands on the canvas. `x`/`y` may be
/// negative when the product overhangs the top or left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteBox {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Computes the paste box for an `image` (w, h) on a `canvas` (w, h).
///
/// The product is scaled proportionally to `height_fraction` of the canvas
/// height, shrunk further if that would exceed the canvas width, centred
/// horizontally and centred vertically on `anchor_y`.
pub fn paste_box(canvas: (u32, u32), image: (u32, u32), layout: Layout) -> PasteBox {
    let (cw, ch) = (canvas.0 as f64, canvas.1 as f64);
    let (iw, ih) = (image.0.max(1) as f64, image.1.max(1) as f64);

    let mut height = (ch * layout.height_fraction).round().max(1.0);
    let mut width = (iw * height / ih).round().max(1.0);
    if width > cw {
        width = cw.max(1.0);
        height = (ih * width / iw).round().max(1.0);
    }

    let x = ((cw - width) / 2.0).floor() as i64;
    let y = (ch * layout.anchor_y - height / 2.0).round() as i64;
    PasteBox {
        x,
        y,
        width: width as u32,
        height: height as u32,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("cannot open template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot open image {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot encode composited image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompositeError {
    /// An unreadable source image is per-item; everything else aborts the pass.
    pub fn kind(&self) -> FailureKind {
        match self {
            CompositeError::Open { .. } => FailureKind::Validation,
            _ => FailureKind::Fatal,
        }
    }
}

/// Loads the template as RGBA.
pub fn load_template(path: &Path) -> Result<RgbaImage, CompositeError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| CompositeError::Template {
            path: path.to_path_buf(),
            source,
        })
}

/// White canvas the size of `template`, the template over it, then the
/// resized product at its [`paste_box`]. Alpha is honoured for both layers.
pub fn composite(template: &RgbaImage, product: &DynamicImage, layout: Layout) -> RgbImage {
    let (cw, ch) = template.dimensions();
    let mut canvas = RgbaImage::from_pixel(cw, ch, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, template, 0, 0);

    let product = product.to_rgba8();
    let bx = paste_box((cw, ch), product.dimensions(), layout);
    let resized = imageops::resize(&product, bx.width, bx.height, FilterType::Lanczos3);
    imageops::overlay(&mut canvas, &resized, bx.x, bx.y);

    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Composites `src` onto `template` and writes a PNG to `dst`.
pub fn composite_file(
    template: &RgbaImage,
    src: &Path,
    dst: &Path,
    layout: Layout,
) -> Result<(), CompositeError> {
    let product = image::open(src).map_err(|source| CompositeError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let framed = composite(template, &product, layout);

    let mut png = Cursor::new(Vec::new());
    framed
        .write_to(&mut png, ImageFormat::Png)
        .map_err(CompositeError::Encode)?;
    storage::write_atomic(dst, png.get_ref()).map_err(|source| CompositeError::Io {
        path: dst.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_product_is_centred_at_anchor() {
        let bx = paste_box((1000, 1000), (400, 300), Layout::default());
        assert_eq!(
            bx,
            PasteBox {
                x: 100,
                y: 260,
                width: 800,
                height: 600
            }
        );
        assert_eq!(bx.x + bx.width as i64 / 2, 500);
        assert_eq!(bx.y + bx.height as i64 / 2, 560);
    }

    #[test]
    fn tall_product_keeps_aspect_ratio() {
        let bx = paste_box((1000, 1000), (300, 600), Layout::default());
        assert_eq!(bx.height, 600);
        assert_eq!(bx.width, 300);
        assert_eq!(bx.x, 350);
        assert_eq!(bx.y, 260);
    }

    #[test]
    fn very_wide_product_is_clamped_to_canvas_width() {
        let bx = paste_box((1000, 1000), (2000, 500), Layout::default());
        assert_eq!(bx.width, 1000);
        assert_eq!(bx.height, 250);
        assert_eq!(bx.x, 0);
        assert_eq!(bx.y, 435);
    }

    #[test]
    fn composite_keeps_template_size_and_paints_product() {
        let template = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 0]));
        let product = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([255, 0, 0, 255])));
        let out = composite(&template, &product, Layout::default());
        assert_eq!(out.dimensions(), (100, 100));
        // box is 80x60 at (10, 26)
        assert_eq!(out.get_pixel(50, 56).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(5, 5).0, [255, 255, 255]);
    }

    #[test]
    fn composite_file_writes_png_and_reports_unreadable_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("42.png");
        RgbaImage::from_pixel(20, 20, Rgba([0, 255, 0, 255]))
            .save(&src)
            .unwrap();
        let template = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 255, 255]));
        let dst = dir.path().join("out").join("42.png");
        composite_file(&template, &src, &dst, Layout::default()).unwrap();
        let written = image::open(&dst).unwrap();
        assert_eq!((written.width(), written.height()), (50, 50));

        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();
        let err = composite_file(&template, &bad, &dir.path().join("x.png"), Layout::default())
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[test]
    fn missing_template_is_fatal() {
        let err = load_template(Path::new("/nonexistent/canvas.png")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Fatal);
    }
}

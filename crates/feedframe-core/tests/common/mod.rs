#![allow(dead_code)]

pub mod feed_server;

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// PNG bytes of a solid `width`x`height` image.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba(color))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Minimal catalog with one `<offer>` per `(id, picture_url)`.
pub fn catalog(offers: &[(&str, &str)]) -> String {
    let body: String = offers
        .iter()
        .map(|(id, url)| {
            format!(
                "<offer id=\"{}\"><picture>{}</picture><categoryId>1</categoryId></offer>",
                id, url
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><yml_catalog><shop><offers>{}</offers></shop></yml_catalog>",
        body
    )
}

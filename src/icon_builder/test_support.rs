//! 测试用图片构造工具。

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

use super::SourceImage;

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let r = (x % 255) as u8;
        let g = (y % 255) as u8;
        let b = ((x + y) % 255) as u8;
        Rgba([r, g, b, 255])
    });
    DynamicImage::ImageRgba8(img)
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

pub(crate) fn source_image(width: u32, height: u32) -> SourceImage {
    SourceImage::new(gradient(width, height), format!("gradient-{}x{}", width, height))
}

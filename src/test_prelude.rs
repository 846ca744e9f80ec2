//! Fixtures shared by the unit and router tests.

use axum::body::Body;
use axum::response::Response;
use http_body_util::BodyExt;
use image::codecs::gif::GifEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, Luma, Rgb, RgbImage};
use std::io::Cursor;

/// Colour gradient, so every channel differs from pixel to pixel.
pub fn rgb_sample(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) * 31 % 256) as u8,
        ])
    })
}

pub fn gray_sample(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(image::GrayImage::from_fn(width, height, |x, y| {
        Luma([((x * 17 + y * 29) % 256) as u8])
    }))
}

/// Encodes a fixture in `format` without going through the code under test.
pub fn encode_sample<I: Clone + Into<DynamicImage>>(image: &I, format: ImageFormat) -> Vec<u8> {
    let image: DynamicImage = image.clone().into();
    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::Gif => {
            let rgba = image.to_rgba8();
            GifEncoder::new(&mut buffer)
                .encode(
                    rgba.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::Rgba8,
                )
                .unwrap();
        }
        other => image.write_to(&mut buffer, other).unwrap(),
    }
    buffer.into_inner()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub const MULTIPART_BOUNDARY: &str = "grayscale-test-boundary";

/// Single-part `multipart/form-data` body.
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Body {
    let mut body = format!(
        "--{MULTIPART_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}

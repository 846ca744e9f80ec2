use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use std::io::Cursor;
use tracing::debug;

use super::ConversionError;

const JPEG_MAX_QUALITY: u8 = 100;

/// A decoded image together with the container format its bytes were in.
///
/// `format` is detected once from the bytes in [`decode`] and is the format
/// [`encode`] writes back, whatever the client named the file.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    pub pixels: DynamicImage,
    pub format: ImageFormat,
}

impl ImageDocument {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

pub fn decode(bytes: &[u8]) -> Result<ImageDocument, ConversionError> {
    let format = image::guess_format(bytes).map_err(|e| {
        ConversionError::DecodeFailed(format!("Failed to detect image format: {}", e))
    })?;

    let pixels = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        ConversionError::DecodeFailed(format!(
            "Failed to decode image (format: {:?}): {}",
            format, e
        ))
    })?;

    debug!(
        "Image decoded: {}x{} {:?}, format: {:?}",
        pixels.width(),
        pixels.height(),
        pixels.color(),
        format
    );

    Ok(ImageDocument { pixels, format })
}

/// Writes `document` in its own format at the best quality the format allows.
pub fn encode(document: &ImageDocument) -> Result<Vec<u8>, ConversionError> {
    let pixels = &document.pixels;
    let (width, height) = (pixels.width(), pixels.height());
    let mut buffer = Cursor::new(Vec::new());

    let encoded = match document.format {
        ImageFormat::Jpeg => {
            debug!("Encoding output as JPEG.");
            JpegEncoder::new_with_quality(&mut buffer, JPEG_MAX_QUALITY).encode(
                pixels.as_bytes(),
                width,
                height,
                pixels.color().into(),
            )
        }
        ImageFormat::Png => {
            debug!("Encoding output as PNG.");
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive)
                .write_image(pixels.as_bytes(), width, height, pixels.color().into())
        }
        ImageFormat::Gif => {
            debug!("Encoding output as GIF.");
            // The GIF encoder takes RGB(A) only; at most 256 gray levels keeps the palette exact.
            let rgb = pixels.to_rgb8();
            GifEncoder::new(&mut buffer).encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        other => {
            debug!("Encoding output as {:?}.", other);
            pixels.write_to(&mut buffer, other)
        }
    };

    encoded.map_err(|e| ConversionError::EncodeFailed {
        format: document.format,
        reason: e.to_string(),
    })?;

    Ok(buffer.into_inner())
}

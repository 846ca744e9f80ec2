use image::DynamicImage;

use super::ImageDocument;

/// Converts every pixel to a single 8-bit luminance channel.
///
/// Uses the codec's own RGB to luma weighting (Rec. 709 coefficients). Alpha
/// is dropped. Gray and palette input go through the same path, so applying
/// this twice gives the same pixels as applying it once.
pub fn apply(document: ImageDocument) -> ImageDocument {
    let ImageDocument { pixels, format } = document;
    ImageDocument {
        pixels: DynamicImage::ImageLuma8(pixels.to_luma8()),
        format,
    }
}

//! In-app crop step applied between decoding and upload.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView};
use tandem_model::{CropRegion, ImageFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("crop region {region} lies outside the {width}x{height} image")]
    OutOfBounds {
        region: CropRegion,
        width: u32,
        height: u32,
    },
}

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Webp => image::ImageFormat::WebP,
    }
}

/// Map a sniffed codec format back onto the formats the app uploads.
pub fn upload_format(format: image::ImageFormat) -> Option<ImageFormat> {
    match format {
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        image::ImageFormat::WebP => Some(ImageFormat::Webp),
        _ => None,
    }
}

/// Intersect `region` with a `width`x`height` image.
fn clamp(region: CropRegion, width: u32, height: u32) -> Option<CropRegion> {
    if region.x >= width || region.y >= height {
        return None;
    }
    let w = region.width.min(width - region.x);
    let h = region.height.min(height - region.y);
    CropRegion::new(region.x, region.y, w, h).ok()
}

/// Crop encoded image bytes and re-encode them in the same format.
pub fn crop(
    bytes: &[u8],
    format: ImageFormat,
    region: CropRegion,
) -> Result<Vec<u8>, CropError> {
    let codec = codec_format(format);
    let decoded = image::load_from_memory_with_format(bytes, codec)?;
    let (width, height) = decoded.dimensions();

    let area = clamp(region, width, height).ok_or(CropError::OutOfBounds {
        region,
        width,
        height,
    })?;
    let mut cropped = decoded.crop_imm(area.x, area.y, area.width, area.height);

    // JPEG has no alpha channel.
    if format == ImageFormat::Jpeg {
        cropped = DynamicImage::ImageRgb8(cropped.to_rgb8());
    }

    let mut out = Cursor::new(Vec::new());
    cropped.write_to(&mut out, codec)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 10) as u8, (y * 10) as u8, 0, 255])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode fixture");
        out.into_inner()
    }

    #[test]
    fn crops_inner_region() {
        let bytes = png(8, 6);
        let region = CropRegion::new(2, 1, 4, 3).unwrap();
        let cropped = crop(&bytes, ImageFormat::Png, region).expect("crop");

        let decoded = image::load_from_memory(&cropped).expect("decode");
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0), &Rgba([20, 10, 0, 255]));
    }

    #[test]
    fn clamps_region_to_image_bounds() {
        let bytes = png(8, 6);
        let region = CropRegion::new(6, 4, 100, 100).unwrap();
        let cropped = crop(&bytes, ImageFormat::Png, region).expect("crop");

        let decoded = image::load_from_memory(&cropped).expect("decode");
        assert_eq!(decoded.dimensions(), (2, 2));
    }

    #[test]
    fn region_outside_image_fails() {
        let bytes = png(4, 4);
        let region = CropRegion::new(4, 0, 1, 1).unwrap();
        assert!(matches!(
            crop(&bytes, ImageFormat::Png, region),
            Err(CropError::OutOfBounds { width: 4, height: 4, .. })
        ));
    }

    #[test]
    fn jpeg_output_drops_alpha() {
        let source = {
            let mut out = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(image::RgbImage::new(10, 10))
                .write_to(&mut out, image::ImageFormat::Jpeg)
                .expect("encode fixture");
            out.into_inner()
        };
        let region = CropRegion::new(0, 0, 5, 5).unwrap();
        let cropped = crop(&source, ImageFormat::Jpeg, region).expect("crop");
        assert_eq!(
            image::guess_format(&cropped).expect("sniff"),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn garbage_bytes_are_codec_errors() {
        let region = CropRegion::new(0, 0, 1, 1).unwrap();
        assert!(matches!(
            crop(b"not an image", ImageFormat::Png, region),
            Err(CropError::Codec(_))
        ));
    }
}

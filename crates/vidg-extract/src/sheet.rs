//! Contact sheet compositing and encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use vidg_core::ExtractConfig;

use crate::error::ExtractionError;

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Lay `frames` out row by row, `config.columns` per row.
///
/// Missing frames leave their cell as background.
pub fn compose(config: &ExtractConfig, frames: &[Option<RgbImage>]) -> RgbImage {
    let mut sheet = RgbImage::from_pixel(config.sheet_width(), config.sheet_height(), BACKGROUND);
    let cell_w = config.frame_width + config.padding;
    let cell_h = config.frame_height + config.padding;

    for (index, frame) in frames.iter().enumerate().take(config.frame_count as usize) {
        let Some(frame) = frame else {
            continue;
        };
        let index = index as u32;
        let x = (index % config.columns) * cell_w;
        let y = (index / config.columns) * cell_h;

        if frame.dimensions() == (config.frame_width, config.frame_height) {
            imageops::replace(&mut sheet, frame, i64::from(x), i64::from(y));
        } else {
            let scaled = imageops::resize(
                frame,
                config.frame_width,
                config.frame_height,
                FilterType::Triangle,
            );
            imageops::replace(&mut sheet, &scaled, i64::from(x), i64::from(y));
        }
    }

    sheet
}

/// Encode the sheet as JPEG.
pub fn encode_jpeg(sheet: &RgbImage, quality: u8) -> Result<Vec<u8>, ExtractionError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(sheet)?;
    Ok(buf)
}

/// Shrink the sheet to a single frame's size for color sampling.
pub fn color_sample(config: &ExtractConfig, sheet: &RgbImage) -> RgbImage {
    imageops::resize(
        sheet,
        config.frame_width,
        config.frame_height,
        FilterType::Triangle,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ExtractConfig {
        ExtractConfig::builder()
            .frame_count(5u32)
            .columns(2u32)
            .frame_width(4u32)
            .frame_height(2u32)
            .padding(1u32)
            .build()
            .unwrap()
    }

    #[test]
    fn test_sheet_dimensions() {
        let config = small_config();
        let sheet = compose(&config, &[]);
        // 3 rows of 2 cells, 1px gaps
        assert_eq!(sheet.dimensions(), (9, 8));
        assert!(sheet.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_frames_land_in_grid_order() {
        let config = small_config();
        let red = RgbImage::from_pixel(4, 2, Rgb([255, 0, 0]));
        let green = RgbImage::from_pixel(4, 2, Rgb([0, 255, 0]));
        let blue = RgbImage::from_pixel(4, 2, Rgb([0, 0, 255]));

        let sheet = compose(&config, &[Some(red), None, Some(green), None, Some(blue)]);

        assert_eq!(sheet.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(sheet.get_pixel(3, 1), &Rgb([255, 0, 0]));
        // gap column and the blank second cell
        assert_eq!(sheet.get_pixel(4, 0), &BACKGROUND);
        assert_eq!(sheet.get_pixel(5, 0), &BACKGROUND);
        // second row, first column
        assert_eq!(sheet.get_pixel(0, 3), &Rgb([0, 255, 0]));
        // third row, first column
        assert_eq!(sheet.get_pixel(2, 7), &Rgb([0, 0, 255]));
        // empty trailing cell
        assert_eq!(sheet.get_pixel(6, 7), &BACKGROUND);
    }

    #[test]
    fn test_oversized_frames_are_scaled() {
        let config = small_config();
        let big = RgbImage::from_pixel(40, 20, Rgb([9, 9, 9]));
        let sheet = compose(&config, &[Some(big)]);
        assert_eq!(sheet.get_pixel(3, 1), &Rgb([9, 9, 9]));
        assert_eq!(sheet.get_pixel(5, 0), &BACKGROUND);
    }

    #[test]
    fn test_encode_jpeg() {
        let sheet = compose(&ExtractConfig::default(), &[]);
        let jpeg = encode_jpeg(&sheet, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1000, 450));
    }
}

//! Dominant color summary.

use std::collections::HashMap;

use image::RgbImage;
use rayon::prelude::*;

use vidg_core::ColorSummary;

/// Letterbox bars quantize here and would otherwise dominate.
const BLACK: [u8; 3] = [0, 0, 0];

/// The `count` most frequent colors after quantizing each channel to
/// multiples of `bin`.
///
/// Ordered by descending frequency, ties by ascending value, so the same
/// image always yields the same summary.
pub fn dominant_colors(image: &RgbImage, bin: u16, count: usize) -> ColorSummary {
    let bin = bin.max(1);
    let quantize = |c: u8| ((u16::from(c) / bin) * bin).min(255) as u8;

    let tally = image
        .as_raw()
        .par_chunks_exact(3)
        .fold(HashMap::new, |mut tally: HashMap<[u8; 3], u64>, px| {
            *tally
                .entry([quantize(px[0]), quantize(px[1]), quantize(px[2])])
                .or_default() += 1;
            tally
        })
        .reduce(HashMap::new, |mut left, right| {
            for (color, n) in right {
                *left.entry(color).or_default() += n;
            }
            left
        });

    let mut ranked: Vec<([u8; 3], u64)> = tally
        .into_iter()
        .filter(|(color, _)| *color != BLACK)
        .collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ColorSummary::new(ranked.into_iter().take(count).map(|(c, _)| c).collect())
}

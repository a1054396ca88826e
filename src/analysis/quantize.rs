//! Color quantization and per-image frequency counting.

use image::DynamicImage;
use indexmap::IndexMap;

use crate::model::{Color, HexColor};

use super::top_k::top_k;

/// Scale a channel from `0..=max_native` down to 8 bits, truncating.
///
/// For 16-bit input this is exactly `value / 257`.
pub fn quantize_channel(value: u32, max_native: u32) -> u8 {
    debug_assert!(max_native > 0 && value <= max_native);
    (u64::from(value) * 255 / u64::from(max_native)) as u8
}

fn quantize_float(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Color counts for a single image, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct FrequencyTable {
    counts: IndexMap<Color, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, color: Color) {
        *self.counts.entry(color).or_insert(0) += 1;
    }

    pub fn count(&self, color: Color) -> u64 {
        self.counts.get(&color).copied().unwrap_or(0)
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `k` most frequent colors, most frequent first. Ties go to the
    /// color encountered first during pixel iteration.
    pub fn top(&self, k: usize) -> Vec<HexColor> {
        top_k(self.counts.iter().map(|(c, n)| (*c, *n)), k)
            .into_iter()
            .map(|(color, _)| color.to_hex())
            .collect()
    }
}

/// Walk every pixel in row-major order, quantize it to 8 bits per channel
/// and count it. Alpha is ignored.
pub fn count_colors(image: &DynamicImage) -> FrequencyTable {
    let mut table = FrequencyTable::new();

    match image {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => {
            let max = u32::from(u16::MAX);
            for px in image.to_rgb16().pixels() {
                let [r, g, b] = px.0.map(|c| quantize_channel(u32::from(c), max));
                table.record(Color::new(r, g, b));
            }
        }
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            for px in image.to_rgb32f().pixels() {
                let [r, g, b] = px.0.map(quantize_float);
                table.record(Color::new(r, g, b));
            }
        }
        _ => {
            for px in image.to_rgb8().pixels() {
                table.record(Color(px.0));
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_scales_by_257() {
        let max = u32::from(u16::MAX);
        assert_eq!(quantize_channel(0, max), 0);
        assert_eq!(quantize_channel(256, max), 0);
        assert_eq!(quantize_channel(257, max), 1);
        assert_eq!(quantize_channel(0x1234, max), (0x1234 / 257) as u8);
        assert_eq!(quantize_channel(max, max), 255);
    }

    #[test]
    fn eight_bit_is_identity() {
        for v in [0, 1, 127, 254, 255] {
            assert_eq!(quantize_channel(v, 255), v as u8);
        }
    }
}

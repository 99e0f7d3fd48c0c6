//! Render a filter's bitmap as a PNG: one pixel per byte, black when the
//! byte has any bit set. Square image, scaled down past `MAX_IMG` pixels.

use anyhow::{anyhow, Context, Result};
use bloom_core::Bloom;
use image::{GrayImage, Luma};
use std::path::Path;

pub const MAX_IMG: u32 = 1024;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

pub struct Rendered {
    pub image: GrayImage,
    pub nonzero: u64,
    pub side: u64,
}

pub fn render(bitmap: &[u8]) -> Rendered {
    let bytes = bitmap.len() as u64;
    let side = ((bytes as f64).sqrt().ceil() as u64).max(1);
    let (size, scaling) = if side > u64::from(MAX_IMG) {
        (MAX_IMG, Some(f64::from(MAX_IMG) / side as f64))
    } else {
        (side as u32, None)
    };

    let mut image = GrayImage::from_pixel(size, size, WHITE);
    let mut nonzero = 0u64;
    for (n, &b) in bitmap.iter().enumerate() {
        if b == 0 {
            continue;
        }
        nonzero += 1;
        let (mut x, mut y) = (n as u64 % side, n as u64 / side);
        if let Some(s) = scaling {
            x = (x as f64 * s) as u64;
            y = (y as f64 * s) as u64;
        }
        let (x, y) = ((x as u32).min(size - 1), (y as u32).min(size - 1));
        image.put_pixel(x, y, BLACK);
    }
    Rendered { image, nonzero, side }
}

pub fn bloom_to_png(bloom: &Bloom, out: &Path) -> Result<Rendered> {
    let bitmap = bloom
        .bitmap()
        .ok_or_else(|| anyhow!("bloom filter not initialized"))?;
    let rendered = render(bitmap);
    rendered
        .image
        .save(out)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(rendered)
}

//! Color-coded rendering of the label mask over the source image.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};

use crate::config::BlendWeights;
use crate::labels::LabelMap;

/// Paint every mask pixel with the color of its class.
pub fn colorize(mask: &GrayImage, labels: &LabelMap) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        Rgb(labels.color(mask.get_pixel(x, y).0[0]))
    })
}

/// BT.601 luma, the weighting most photo tools use for RGB to gray.
fn luma(px: &Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

fn blend_channel(src: u8, overlay: u8, weights: BlendWeights) -> u8 {
    let v = src as f32 * weights.source + overlay as f32 * weights.overlay;
    v.round().clamp(0.0, 255.0) as u8
}

/// Blend the colorized mask over `source`. With `grayscale` set the source is
/// reduced to luma first; the stored image is never modified.
///
/// `source` and `mask` must have the same dimensions.
pub fn compose(
    source: &RgbImage,
    mask: &GrayImage,
    labels: &LabelMap,
    grayscale: bool,
    weights: BlendWeights,
) -> RgbImage {
    debug_assert_eq!(source.dimensions(), mask.dimensions());
    let overlay = colorize(mask, labels);

    let mut out = source.clone();
    for (px, ov) in out.pixels_mut().zip(overlay.pixels()) {
        if grayscale {
            let y = luma(px);
            px.0 = [y, y, y];
        }
        for c in 0..3 {
            px.0[c] = blend_channel(px.0[c], ov.0[c], weights);
        }
    }
    out
}

/// Stretch a rendered frame to the canvas size for display.
pub fn fit_to_canvas(frame: &RgbImage, canvas: [u32; 2]) -> RgbImage {
    if frame.dimensions() == (canvas[0], canvas[1]) {
        return frame.clone();
    }
    imageops::resize(frame, canvas[0], canvas[1], FilterType::Triangle)
}

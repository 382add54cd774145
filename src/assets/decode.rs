use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{SlideError, SlideResult};

/// Upper bound on either side of a rasterized SVG.
const MAX_SVG_DIM: u32 = 4096;
/// SVGs are rasterized so their longer side is at least this many pixels.
const MIN_SVG_RASTER: u32 = 1024;

/// Decoded raster in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub(crate) struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba8_premul: Vec<u8>,
}

pub(crate) fn decode_image(bytes: &[u8]) -> SlideResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul,
    })
}

pub(crate) fn parse_svg(bytes: &[u8]) -> SlideResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Raster size for an SVG: intrinsic size scaled up to a legible resolution, capped.
pub(crate) fn svg_raster_size(tree: &usvg::Tree) -> SlideResult<(u32, u32)> {
    let size = tree.size();
    let (w, h) = (f64::from(size.width()), f64::from(size.height()));
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(SlideError::validation("svg has invalid width/height"));
    }
    let longest = w.max(h);
    let mut scale = (f64::from(MIN_SVG_RASTER) / longest).max(1.0);
    if longest * scale > f64::from(MAX_SVG_DIM) {
        scale = f64::from(MAX_SVG_DIM) / longest;
    }
    let to_px = |v: f64| ((v * scale).ceil() as u32).clamp(1, MAX_SVG_DIM);
    Ok((to_px(w), to_px(h)))
}

pub(crate) fn rasterize_svg(tree: &usvg::Tree) -> SlideResult<DecodedImage> {
    let (width, height) = svg_raster_size(tree)?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SlideError::surface("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: pixmap.data().to_vec(),
    })
}

/// Encode premultiplied pixels as a straight-alpha PNG.
pub(crate) fn encode_png(width: u32, height: u32, rgba8_premul: &[u8]) -> SlideResult<Vec<u8>> {
    let mut straight = rgba8_premul.to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    let img = image::RgbaImage::from_raw(width, height, straight)
        .ok_or_else(|| SlideError::validation("pixel buffer does not match image size"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

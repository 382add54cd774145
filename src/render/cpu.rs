use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    assets::store::{AssetStore, PreparedImage},
    foundation::core::{Affine, BezPath, CanvasSize, FrameRGBA, Point, Rect, Rgba8, Vec2},
    foundation::error::{SlideError, SlideResult},
    geometry::path::{rounded_rect, shape_path},
    geometry::transform::{GroupFrame, Viewport, clip_outline, element_affine, fit_viewport},
    model::element::{
        CornerRadius, Element, ElementKind, Geometry, ImageElement, ObjectFit, TextAlign,
        TextElement,
    },
    model::presentation::PresentationSettings,
    model::slide::{Background, Slide},
    render::text::{TextPainter, estimate_line_boxes},
};

const ACCENT: Rgba8 = Rgba8::rgb(0x3b, 0x82, 0xf6);
const CROP_DIM: Rgba8 = Rgba8 {
    r: 0,
    g: 0,
    b: 0,
    a: 110,
};

/// Editing chrome painted above slide content, in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    /// Outline around a selected element's bounds.
    Selection(Rect),
    /// Crop rectangle; everything outside it is dimmed.
    CropRect(Rect),
    /// Insertion marker shown while dragging a reorder handle.
    DropIndicator(Rect),
    /// Reorder handle dot.
    Handle(Point),
}

/// Pixel size of a frame plus the viewport mapping canvas to device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTarget {
    pub width: u32,
    pub height: u32,
    pub viewport: Viewport,
}

impl FrameTarget {
    /// Frame of `width x height` with the canvas fitted and letterboxed.
    pub fn fit(canvas: CanvasSize, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            viewport: fit_viewport(canvas, f64::from(width), f64::from(height)),
        }
    }

    /// Frame at the canvas's own resolution.
    pub fn native(canvas: CanvasSize) -> Self {
        Self::fit(canvas, canvas.width, canvas.height)
    }
}

/// CPU painter turning a slide into premultiplied RGBA8 pixels with `vello_cpu`.
pub(crate) struct SlidePainter {
    text: TextPainter,
    image_cache: HashMap<u64, vello_cpu::Image>,
    placeholder: Rgba8,
}

impl SlidePainter {
    pub(crate) fn new(text: TextPainter, placeholder: Rgba8) -> Self {
        Self {
            text,
            image_cache: HashMap::new(),
            placeholder,
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(path = %slide.path, width = target.width, height = target.height)
    )]
    pub(crate) fn paint(
        &mut self,
        slide: &Slide,
        settings: &PresentationSettings,
        assets: &AssetStore,
        target: &FrameTarget,
        overlays: &[Overlay],
    ) -> SlideResult<FrameRGBA> {
        let (w16, h16) = surface_dims(target.width, target.height)?;
        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let view = target.viewport.to_affine();
        let canvas = settings.canvas.rect();

        ctx.set_transform(affine_to_cpu(view));
        let bg = match &slide.background {
            Background::Color { color } => *color,
            _ => settings.theme.background,
        };
        set_color(&mut ctx, bg);
        ctx.fill_rect(&rect_to_cpu(canvas));

        ctx.push_clip_layer(&bezpath_to_cpu(&rounded_rect(
            0.0,
            0.0,
            canvas.width(),
            canvas.height(),
            CornerRadius::default(),
        )));
        if let Background::Image { src } = &slide.background {
            let g = Geometry::rect(0.0, 0.0, canvas.width(), canvas.height());
            let img = ImageElement {
                src: src.clone(),
                alt: String::new(),
                fit: ObjectFit::Cover,
            };
            self.draw_image(&mut ctx, &img, &g, view, assets)?;
        }
        for el in &slide.elements {
            self.draw_element(&mut ctx, el, view, Affine::IDENTITY, 1.0, assets)?;
        }
        ctx.pop_layer();

        for overlay in overlays {
            draw_overlay(&mut ctx, view, target.viewport.zoom, canvas, overlay);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: target.width,
            height: target.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_element(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        el: &Element,
        view: Affine,
        frame: Affine,
        parent_opacity: f64,
        assets: &AssetStore,
    ) -> SlideResult<()> {
        let opacity = (parent_opacity * el.opacity).clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let xf = view * frame * element_affine(&el.geometry);

        let mut layers = 0;
        if let Some(clip) = &el.clip {
            ctx.set_transform(affine_to_cpu(view));
            ctx.push_clip_layer(&bezpath_to_cpu(&clip_outline(clip, &el.geometry, frame)));
            layers += 1;
        }
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity as f32);
            layers += 1;
        }

        let g = &el.geometry;
        match &el.kind {
            ElementKind::Shape(s) => {
                let path = bezpath_to_cpu(&shape_path(&s.shape, g.width, g.height));
                ctx.set_transform(affine_to_cpu(xf));
                set_color(ctx, s.fill);
                ctx.fill_path(&path);
                if let Some((color, width)) = s.stroke
                    && width > 0.0
                {
                    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
                    set_color(ctx, color);
                    ctx.stroke_path(&path);
                }
            }
            ElementKind::Image(img) => self.draw_image(ctx, img, g, xf, assets)?,
            ElementKind::Text(t) => self.draw_text(ctx, t, g, xf)?,
            ElementKind::FlexboxTextGroup(group) => {
                let inner = frame * GroupFrame::of(g).to_affine();
                for child in &group.children {
                    self.draw_element(ctx, child, view, inner, 1.0, assets)?;
                }
            }
        }

        for _ in 0..layers {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        img: &ImageElement,
        g: &Geometry,
        xf: Affine,
        assets: &AssetStore,
    ) -> SlideResult<()> {
        let (w, h) = (g.width, g.height);
        let Some(prepared) = assets.get(&img.src) else {
            draw_missing_image(ctx, xf, w, h, self.placeholder);
            return Ok(());
        };
        let paint = self.image_paint_for(prepared)?;
        let (iw, ih) = (f64::from(prepared.width), f64::from(prepared.height));
        if iw <= 0.0 || ih <= 0.0 || w <= 0.0 || h <= 0.0 {
            return Ok(());
        }

        let fit = match img.fit {
            ObjectFit::Fill => Affine::scale_non_uniform(w / iw, h / ih),
            ObjectFit::Cover | ObjectFit::Contain => {
                let s = if img.fit == ObjectFit::Cover {
                    (w / iw).max(h / ih)
                } else {
                    (w / iw).min(h / ih)
                };
                Affine::translate(Vec2::new((w - iw * s) / 2.0, (h - ih * s) / 2.0))
                    * Affine::scale(s)
            }
        };

        let clip_box = img.fit == ObjectFit::Cover;
        if clip_box {
            ctx.set_transform(affine_to_cpu(xf));
            ctx.push_clip_layer(&bezpath_to_cpu(&rounded_rect(
                0.0,
                0.0,
                w,
                h,
                CornerRadius::default(),
            )));
        }
        ctx.set_transform(affine_to_cpu(xf * fit));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        if clip_box {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        t: &TextElement,
        g: &Geometry,
        xf: Affine,
    ) -> SlideResult<()> {
        ctx.set_transform(affine_to_cpu(xf));
        let Some(layout) = self.text.layout(&t.content, &t.style, Some(g.width as f32))? else {
            let bar = t.style.color.with_alpha((u16::from(t.style.color.a) * 3 / 5) as u8);
            set_color(ctx, bar);
            for (x, y, w, h) in estimate_line_boxes(&t.content, &t.style, g.width) {
                let path = rounded_rect(x, y, w, h, CornerRadius::uniform(h / 2.0));
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
            return Ok(());
        };
        let Some(font) = self.text.font().map(|f| f.data.clone()) else {
            return Ok(());
        };

        let width = g.width as f32;
        for line in layout.lines() {
            let advance = line.metrics().advance;
            let dx = match t.style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((width - advance) / 2.0).max(0.0),
                TextAlign::Right => (width - advance).max(0.0),
            };
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|glyph| vello_cpu::Glyph {
                    id: glyph.id,
                    x: glyph.x + dx,
                    y: glyph.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn image_paint_for(&mut self, img: &PreparedImage) -> SlideResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&img.content_hash) {
            return Ok(paint.clone());
        }

        let pixmap =
            image_premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.image_cache.insert(img.content_hash, paint.clone());
        Ok(paint)
    }
}

/// Solid frame used while no live surface exists.
pub(crate) fn placeholder_frame(width: u32, height: u32, color: Rgba8) -> FrameRGBA {
    let px = color.premultiplied();
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for _ in 0..(width as usize * height as usize) {
        data.extend_from_slice(&px);
    }
    FrameRGBA {
        width,
        height,
        data,
        premultiplied: true,
    }
}

fn surface_dims(width: u32, height: u32) -> SlideResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(SlideError::surface("frame must be non-empty"));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| SlideError::surface("frame width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SlideError::surface("frame height exceeds u16"))?;
    Ok((w, h))
}

fn set_color(ctx: &mut vello_cpu::RenderContext, c: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

fn draw_missing_image(
    ctx: &mut vello_cpu::RenderContext,
    xf: Affine,
    w: f64,
    h: f64,
    color: Rgba8,
) {
    ctx.set_transform(affine_to_cpu(xf));
    set_color(ctx, color);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

    let mut cross = BezPath::new();
    cross.move_to((0.0, 0.0));
    cross.line_to((w, h));
    cross.move_to((w, 0.0));
    cross.line_to((0.0, h));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0));
    set_color(ctx, Rgba8::rgb(0x94, 0xa3, 0xb8));
    ctx.stroke_path(&bezpath_to_cpu(&cross));
}

fn draw_overlay(
    ctx: &mut vello_cpu::RenderContext,
    view: Affine,
    zoom: f64,
    canvas: Rect,
    overlay: &Overlay,
) {
    let line = 2.0 / if zoom > 0.0 { zoom } else { 1.0 };
    ctx.set_transform(affine_to_cpu(view));
    match *overlay {
        Overlay::Selection(r) => {
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(line));
            set_color(ctx, ACCENT);
            ctx.stroke_rect(&rect_to_cpu(r));
        }
        Overlay::CropRect(r) => {
            set_color(ctx, CROP_DIM);
            let r = r.intersect(canvas);
            for dim in [
                Rect::new(canvas.x0, canvas.y0, canvas.x1, r.y0),
                Rect::new(canvas.x0, r.y1, canvas.x1, canvas.y1),
                Rect::new(canvas.x0, r.y0, r.x0, r.y1),
                Rect::new(r.x1, r.y0, canvas.x1, r.y1),
            ] {
                if dim.width() > 0.0 && dim.height() > 0.0 {
                    ctx.fill_rect(&rect_to_cpu(dim));
                }
            }
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(line));
            set_color(ctx, Rgba8::WHITE);
            ctx.stroke_rect(&rect_to_cpu(r));
        }
        Overlay::DropIndicator(r) => {
            set_color(ctx, ACCENT);
            ctx.fill_rect(&rect_to_cpu(r));
        }
        Overlay::Handle(p) => {
            let radius = 6.0 / if zoom > 0.0 { zoom } else { 1.0 };
            let dot = rounded_rect(
                p.x - radius,
                p.y - radius,
                radius * 2.0,
                radius * 2.0,
                CornerRadius::uniform(radius),
            );
            set_color(ctx, ACCENT);
            ctx.fill_path(&bezpath_to_cpu(&dot));
        }
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SlideResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SlideError::surface("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SlideError::surface("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SlideError::surface("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

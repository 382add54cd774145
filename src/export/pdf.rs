use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    assets::decode::unpremultiply_rgba8_in_place,
    assets::store::AssetStore,
    export::{ExportFormat, Exporter},
    foundation::core::{Affine, BezPath, CanvasSize, FrameRGBA, Point, Rgba8, Vec2},
    foundation::error::{SlideError, SlideResult},
    geometry::path::{rounded_rect, shape_path},
    geometry::transform::{GroupFrame, clip_outline, element_affine},
    model::element::{
        CornerRadius, Element, ElementKind, Geometry, ImageElement, ObjectFit, TextAlign,
        TextElement,
    },
    model::presentation::{Presentation, PresentationSettings},
    model::slide::{Background, Slide},
    render::cpu::{FrameTarget, SlidePainter},
    render::text::{TextPainter, estimated_advance, wrap_lines},
};

const MISSING_IMAGE: Rgba8 = Rgba8::rgb(0xe2, 0xe8, 0xf0);

/// How slides are turned into PDF pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfMode {
    /// Native PDF paths, images and Helvetica text.
    #[default]
    Vector,
    /// One full-page image per slide, painted with the CPU painter.
    Raster,
}

/// PDF exporter: one page per slide, MediaBox equal to the logical canvas.
#[derive(Clone, Debug)]
pub struct PdfExporter {
    pub mode: PdfMode,
    /// Font used by the raster painter; vector pages always use Helvetica.
    pub font: Option<Arc<Vec<u8>>>,
    /// Worker threads for raster mode (`None` = rayon default).
    pub threads: Option<usize>,
    pub placeholder: Rgba8,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new(PdfMode::Vector)
    }
}

impl PdfExporter {
    pub fn new(mode: PdfMode) -> Self {
        Self {
            mode,
            font: None,
            threads: None,
            placeholder: MISSING_IMAGE,
        }
    }

    pub fn with_font(mut self, font: Option<Arc<Vec<u8>>>) -> Self {
        self.font = font;
        self
    }

    /// One-page document of slide `index`.
    pub fn export_slide(
        &self,
        presentation: &Presentation,
        assets: &AssetStore,
        index: usize,
    ) -> SlideResult<Vec<u8>> {
        if presentation.slide(index).is_none() {
            return Err(SlideError::export(
                "pdf",
                format!("slide index {index} out of range"),
            ));
        }
        self.export_slides(presentation, assets, &[index])
    }

    /// Document with the given slides, in the given order.
    #[tracing::instrument(skip(self, presentation, assets), fields(mode = ?self.mode, pages = indices.len()))]
    pub fn export_slides(
        &self,
        presentation: &Presentation,
        assets: &AssetStore,
        indices: &[usize],
    ) -> SlideResult<Vec<u8>> {
        if indices.is_empty() {
            return Err(SlideError::export("pdf", "presentation has no slides"));
        }
        let settings = presentation.settings();
        let mut writer = PdfWriter::new(settings.canvas, assets);

        match self.mode {
            PdfMode::Vector => {
                for &i in indices {
                    let slide = presentation.slide(i).ok_or_else(|| {
                        SlideError::export("pdf", format!("slide index {i} out of range"))
                    })?;
                    writer.vector_page(slide, settings)?;
                }
            }
            PdfMode::Raster => {
                for frame in self.raster_frames(presentation, assets, indices)? {
                    writer.raster_page(&frame)?;
                }
            }
        }
        writer.finish(settings.title.as_deref())
    }

    fn text_painter(&self) -> TextPainter {
        match &self.font {
            Some(bytes) => TextPainter::with_font(bytes.clone()).unwrap_or_default(),
            None => TextPainter::new(),
        }
    }

    fn raster_frames(
        &self,
        presentation: &Presentation,
        assets: &AssetStore,
        indices: &[usize],
    ) -> SlideResult<Vec<FrameRGBA>> {
        if let Some(bytes) = &self.font {
            TextPainter::with_font(bytes.clone())?;
        }
        let pool = build_thread_pool(self.threads)?;
        let settings = presentation.settings();
        let target = FrameTarget::native(settings.canvas);

        let rendered = pool.install(|| {
            indices
                .par_iter()
                .map_init(
                    || SlidePainter::new(self.text_painter(), self.placeholder),
                    |painter, &i| -> SlideResult<FrameRGBA> {
                        let slide = presentation.slide(i).ok_or_else(|| {
                            SlideError::export("pdf", format!("slide index {i} out of range"))
                        })?;
                        painter.paint(slide, settings, assets, &target, &[])
                    },
                )
                .collect::<Vec<_>>()
        });
        rendered.into_iter().collect()
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn export(&self, presentation: &Presentation, assets: &AssetStore) -> SlideResult<Vec<u8>> {
        let indices: Vec<usize> = (0..presentation.slide_count()).collect();
        self.export_slides(presentation, assets, &indices)
    }
}

fn build_thread_pool(threads: Option<usize>) -> SlideResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(SlideError::validation(
            "pdf export 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| SlideError::export("pdf", format!("failed to build rayon thread pool: {e}")))
}

/// Operators and resources of one page under construction.
#[derive(Default)]
struct PageOps {
    ops: Vec<Operation>,
    xobjects: BTreeMap<String, ObjectId>,
    alphas: BTreeMap<String, f32>,
}

impl PageOps {
    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn cm(&mut self, a: Affine) {
        let operands = a.as_coeffs().iter().map(|&v| real(v)).collect();
        self.op("cm", operands);
    }

    fn fill_color(&mut self, c: Rgba8) {
        let [r, g, b] = c.unit_rgb();
        self.op("rg", vec![r.into(), g.into(), b.into()]);
    }

    fn stroke_color(&mut self, c: Rgba8) {
        let [r, g, b] = c.unit_rgb();
        self.op("RG", vec![r.into(), g.into(), b.into()]);
    }

    /// Select an ExtGState with fill and stroke alpha `a`.
    fn alpha(&mut self, a: f64) {
        let a = a.clamp(0.0, 1.0) as f32;
        let name = format!("GS{}", (a * 1000.0).round() as u32);
        self.alphas.insert(name.clone(), a);
        self.op("gs", vec![Object::Name(name.into_bytes())]);
    }

    fn path(&mut self, path: &BezPath) {
        use kurbo::PathEl;

        let mut last = Point::ZERO;
        for &el in path.elements() {
            match el {
                PathEl::MoveTo(p) => {
                    self.op("m", vec![real(p.x), real(p.y)]);
                    last = p;
                }
                PathEl::LineTo(p) => {
                    self.op("l", vec![real(p.x), real(p.y)]);
                    last = p;
                }
                PathEl::QuadTo(q, p) => {
                    let c1 = last + (q - last) * (2.0 / 3.0);
                    let c2 = p + (q - p) * (2.0 / 3.0);
                    self.op(
                        "c",
                        vec![
                            real(c1.x),
                            real(c1.y),
                            real(c2.x),
                            real(c2.y),
                            real(p.x),
                            real(p.y),
                        ],
                    );
                    last = p;
                }
                PathEl::CurveTo(c1, c2, p) => {
                    self.op(
                        "c",
                        vec![
                            real(c1.x),
                            real(c1.y),
                            real(c2.x),
                            real(c2.y),
                            real(p.x),
                            real(p.y),
                        ],
                    );
                    last = p;
                }
                PathEl::ClosePath => self.op("h", vec![]),
            }
        }
    }

    fn clip(&mut self, path: &BezPath) {
        self.path(path);
        self.op("W", vec![]);
        self.op("n", vec![]);
    }

    fn draw_xobject(&mut self, name: String, id: ObjectId) {
        self.op("Do", vec![Object::Name(name.clone().into_bytes())]);
        self.xobjects.insert(name, id);
    }
}

fn real(v: f64) -> Object {
    (v as f32).into()
}

fn name_dict<V: Into<Object> + Copy>(map: &BTreeMap<String, V>) -> Dictionary {
    let mut d = Dictionary::new();
    for (k, v) in map {
        d.set(k.as_bytes().to_vec(), (*v).into());
    }
    d
}

/// Incrementally built document shared by both modes.
struct PdfWriter<'a> {
    doc: Document,
    pages_id: ObjectId,
    fonts: Dictionary,
    kids: Vec<Object>,
    images: HashMap<u64, ObjectId>,
    assets: &'a AssetStore,
    canvas: CanvasSize,
}

impl<'a> PdfWriter<'a> {
    fn new(canvas: CanvasSize, assets: &'a AssetStore) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut fonts = Dictionary::new();
        for (name, base) in [
            ("F1", "Helvetica"),
            ("F2", "Helvetica-Bold"),
            ("F3", "Helvetica-Oblique"),
            ("F4", "Helvetica-BoldOblique"),
        ] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(name, id);
        }
        Self {
            doc,
            pages_id,
            fonts,
            kids: Vec::new(),
            images: HashMap::new(),
            assets,
            canvas,
        }
    }

    fn size(&self) -> (f64, f64) {
        (f64::from(self.canvas.width), f64::from(self.canvas.height))
    }

    fn vector_page(&mut self, slide: &Slide, settings: &PresentationSettings) -> SlideResult<()> {
        let (w, h) = self.size();
        let mut page = PageOps::default();
        // Flip to canvas coordinates: origin top-left, y down.
        page.cm(Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, h]));

        let bg = match &slide.background {
            Background::Color { color } => *color,
            _ => settings.theme.background,
        };
        page.fill_color(bg);
        page.op("re", vec![real(0.0), real(0.0), real(w), real(h)]);
        page.op("f", vec![]);

        if let Background::Image { src } = &slide.background {
            let img = ImageElement {
                src: src.clone(),
                alt: String::new(),
                fit: ObjectFit::Cover,
            };
            page.op("q", vec![]);
            self.image(&mut page, &img, &Geometry::rect(0.0, 0.0, w, h))?;
            page.op("Q", vec![]);
        }

        for el in &slide.elements {
            self.element(&mut page, el, Affine::IDENTITY, 1.0)?;
        }
        self.finish_page(page)
    }

    fn element(
        &mut self,
        page: &mut PageOps,
        el: &Element,
        frame: Affine,
        parent_opacity: f64,
    ) -> SlideResult<()> {
        let opacity = (parent_opacity * el.opacity).clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let xf = frame * element_affine(&el.geometry);

        page.op("q", vec![]);
        if opacity < 1.0 {
            page.alpha(opacity);
        }
        if let Some(clip) = &el.clip {
            page.clip(&clip_outline(clip, &el.geometry, frame));
        }

        let g = &el.geometry;
        match &el.kind {
            ElementKind::FlexboxTextGroup(group) => {
                let inner = frame * GroupFrame::of(g).to_affine();
                for child in &group.children {
                    self.element(page, child, inner, opacity)?;
                }
            }
            ElementKind::Shape(s) => {
                page.cm(xf);
                page.fill_color(s.fill);
                if s.fill.a < 255 {
                    page.alpha(opacity * f64::from(s.fill.a) / 255.0);
                }
                page.path(&shape_path(&s.shape, g.width, g.height));
                match s.stroke {
                    Some((color, width)) if width > 0.0 => {
                        page.stroke_color(color);
                        page.op("w", vec![real(width)]);
                        page.op("B", vec![]);
                    }
                    _ => page.op("f", vec![]),
                }
            }
            ElementKind::Image(img) => {
                page.cm(xf);
                self.image(page, img, g)?;
            }
            ElementKind::Text(t) => {
                page.cm(xf);
                text(page, t, g);
            }
        }
        page.op("Q", vec![]);
        Ok(())
    }

    fn image(&mut self, page: &mut PageOps, img: &ImageElement, g: &Geometry) -> SlideResult<()> {
        let (w, h) = (g.width, g.height);
        let Some(prepared) = self.assets.get(&img.src) else {
            page.fill_color(MISSING_IMAGE);
            page.path(&rounded_rect(0.0, 0.0, w, h, CornerRadius::default()));
            page.op("f", vec![]);
            return Ok(());
        };
        let (iw, ih) = (f64::from(prepared.width), f64::from(prepared.height));
        if iw <= 0.0 || ih <= 0.0 || w <= 0.0 || h <= 0.0 {
            return Ok(());
        }

        let id = match self.images.get(&prepared.content_hash) {
            Some(id) => *id,
            None => {
                let id = self.image_xobject(prepared.width, prepared.height, &prepared.rgba8_premul)?;
                self.images.insert(prepared.content_hash, id);
                id
            }
        };

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
        if img.fit == ObjectFit::Cover {
            page.clip(&rounded_rect(0.0, 0.0, w, h, CornerRadius::default()));
        }
        // Unit square to image pixels, top row first.
        page.cm(fit * Affine::new([iw, 0.0, 0.0, -ih, 0.0, ih]));
        page.draw_xobject(format!("Im{}", id.0), id);
        Ok(())
    }

    /// RGB image XObject, with an SMask when any pixel is translucent.
    fn image_xobject(&mut self, width: u32, height: u32, premul: &[u8]) -> SlideResult<ObjectId> {
        let mut rgba = premul.to_vec();
        unpremultiply_rgba8_in_place(&mut rgba);

        let n = width as usize * height as usize;
        if rgba.len() != n * 4 {
            return Err(SlideError::export("pdf", "image byte length mismatch"));
        }
        let mut rgb = Vec::with_capacity(n * 3);
        let mut alpha = Vec::with_capacity(n);
        for px in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        };
        if alpha.iter().any(|&a| a != 255) {
            let mask = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8_i64,
                },
                alpha,
            ));
            dict.set("SMask", mask);
        }
        Ok(self.doc.add_object(Stream::new(dict, rgb)))
    }

    fn raster_page(&mut self, frame: &FrameRGBA) -> SlideResult<()> {
        let (w, h) = self.size();
        let id = self.image_xobject(frame.width, frame.height, &frame.data)?;
        let mut page = PageOps::default();
        page.cm(Affine::new([w, 0.0, 0.0, h, 0.0, 0.0]));
        page.draw_xobject("Slide".to_owned(), id);
        self.finish_page(page)
    }

    fn finish_page(&mut self, page: PageOps) -> SlideResult<()> {
        let PageOps {
            ops,
            xobjects,
            alphas,
        } = page;
        let bytes = Content { operations: ops }
            .encode()
            .map_err(|e| SlideError::export("pdf", format!("encode page content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), bytes));

        let mut resources = dictionary! {
            "Font" => self.fonts.clone(),
        };
        if !xobjects.is_empty() {
            resources.set("XObject", name_dict(&xobjects));
        }
        if !alphas.is_empty() {
            let mut states = Dictionary::new();
            for (name, a) in &alphas {
                states.set(
                    name.as_bytes().to_vec(),
                    dictionary! {
                        "Type" => "ExtGState",
                        "ca" => *a,
                        "CA" => *a,
                    },
                );
            }
            resources.set("ExtGState", states);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    fn finish(mut self, title: Option<&str>) -> SlideResult<Vec<u8>> {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => std::mem::take(&mut self.kids),
            "Count" => count,
            "MediaBox" => vec![
                0_i64.into(),
                0_i64.into(),
                i64::from(self.canvas.width).into(),
                i64::from(self.canvas.height).into(),
            ],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal("slidecanvas"),
        };
        if let Some(title) = title {
            info.set("Title", Object::string_literal(latin1(title)));
        }
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);

        self.doc.compress();
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| SlideError::export("pdf", format!("write document: {e}")))?;
        Ok(out)
    }
}

/// Helvetica text, wrapped with the layout estimate. Glyphs are flipped upright.
fn text(page: &mut PageOps, t: &TextElement, g: &Geometry) {
    let style = &t.style;
    let lines = wrap_lines(&t.content, style, g.width);
    if lines.is_empty() {
        return;
    }
    let font = match (style.bold, style.italic) {
        (false, false) => "F1",
        (true, false) => "F2",
        (false, true) => "F3",
        (true, true) => "F4",
    };
    let em = estimated_advance(style);
    let line_h = style.font_size * style.line_height;

    if style.color.a < 255 {
        page.alpha(f64::from(style.color.a) / 255.0);
    }
    page.op("BT", vec![]);
    page.op(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), real(style.font_size)],
    );
    page.fill_color(style.color);
    for (i, line) in lines.iter().enumerate() {
        let w = (line.chars().count() as f64 * em).min(g.width);
        let x = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (g.width - w) / 2.0,
            TextAlign::Right => g.width - w,
        };
        let baseline = i as f64 * line_h + (line_h - style.font_size) / 2.0 + style.font_size * 0.8;
        page.op(
            "Tm",
            vec![
                real(1.0),
                real(0.0),
                real(0.0),
                real(-1.0),
                real(x),
                real(baseline),
            ],
        );
        page.op("Tj", vec![Object::string_literal(latin1(line))]);
    }
    page.op("ET", vec![]);
}

/// WinAnsi bytes for `s`; characters outside Latin-1 become `?`.
fn latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/export/pdf.rs"]
mod tests;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::{
    assets::store::{AssetStore, PreparedImage},
    export::pptx::parts::{NS_A, NS_P, NS_R, escape_xml},
    foundation::core::{Affine, Point, Rect, Rgba8, Vec2},
    foundation::error::SlideResult,
    geometry::transform::{GroupFrame, clip_local_rect, element_affine, sanitize_scale},
    model::element::{
        ClipRegion, Element, ElementKind, FlexboxTextGroup, Geometry, ImageElement, ObjectFit,
        ShapeElement, ShapeKind, TextAlign, TextElement,
    },
    model::presentation::PresentationSettings,
    model::slide::{Background, Slide},
};

/// EMU per logical pixel (96 dpi).
pub(crate) const EMU_PER_PX: f64 = 9525.0;

const MISSING_IMAGE: Rgba8 = Rgba8::rgb(0xe2, 0xe8, 0xf0);

pub(crate) fn emu(px: f64) -> i64 {
    (px * EMU_PER_PX).round() as i64
}

/// Package-wide media, de-duplicated by content hash.
#[derive(Debug, Default)]
pub(crate) struct MediaTable {
    by_hash: HashMap<u64, String>,
    pub(crate) files: Vec<(String, Arc<Vec<u8>>)>,
}

impl MediaTable {
    fn intern(&mut self, img: &PreparedImage) -> SlideResult<String> {
        if let Some(name) = self.by_hash.get(&img.content_hash) {
            return Ok(name.clone());
        }
        let (bytes, ext) = img.embeddable()?;
        let name = format!("image{}.{ext}", self.files.len() + 1);
        self.files.push((name.clone(), bytes));
        self.by_hash.insert(img.content_hash, name.clone());
        Ok(name)
    }

    /// Distinct file extensions, sorted.
    pub(crate) fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self
            .files
            .iter()
            .filter_map(|(name, _)| name.rsplit_once('.').map(|(_, ext)| ext))
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }
}

/// Placement of a shape in its parent's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Xfrm {
    off: Point,
    ext: Vec2,
    rotation_deg: f64,
    flip_h: bool,
    flip_v: bool,
}

impl Xfrm {
    /// Placement of the local sub-rectangle `local` of an element with geometry `g`.
    ///
    /// Rotation is about the box center, so the placed center is projected and the
    /// offset recovered from the scaled extent.
    fn of(g: &Geometry, local: Rect) -> Self {
        let sx = sanitize_scale(g.scale_x);
        let sy = sanitize_scale(g.scale_y);
        let center = element_affine(g) * local.center();
        let ext = Vec2::new(local.width() * sx.abs(), local.height() * sy.abs());
        Self {
            off: Point::new(center.x - ext.x / 2.0, center.y - ext.y / 2.0),
            ext,
            rotation_deg: g.rotation_deg,
            flip_h: sx < 0.0,
            flip_v: sy < 0.0,
        }
    }

    fn write(&self, xml: &mut String, child_space: Option<Rect>) {
        xml.push_str("<a:xfrm");
        let rot = (self.rotation_deg.rem_euclid(360.0) * 60000.0).round() as i64;
        if rot != 0 && rot != 21_600_000 {
            let _ = write!(xml, r#" rot="{rot}""#);
        }
        if self.flip_h {
            xml.push_str(r#" flipH="1""#);
        }
        if self.flip_v {
            xml.push_str(r#" flipV="1""#);
        }
        let _ = write!(
            xml,
            r#"><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/>"#,
            emu(self.off.x),
            emu(self.off.y),
            emu(self.ext.x).max(0),
            emu(self.ext.y).max(0)
        );
        if let Some(ch) = child_space {
            let _ = write!(
                xml,
                r#"<a:chOff x="{}" y="{}"/><a:chExt cx="{}" cy="{}"/>"#,
                emu(ch.x0),
                emu(ch.y0),
                emu(ch.width()).max(0),
                emu(ch.height()).max(0)
            );
        }
        xml.push_str("</a:xfrm>");
    }
}

fn solid_fill(xml: &mut String, c: Rgba8, opacity: f64) {
    let alpha = (f64::from(c.a) / 255.0 * opacity).clamp(0.0, 1.0);
    let _ = write!(xml, r#"<a:solidFill><a:srgbClr val="{}""#, c.hex_rgb());
    if alpha < 1.0 {
        let _ = write!(
            xml,
            r#"><a:alpha val="{}"/></a:srgbClr></a:solidFill>"#,
            (alpha * 100_000.0).round() as i64
        );
    } else {
        xml.push_str("/></a:solidFill>");
    }
}

/// `roundRect` adjust value: radius as a fraction of the shorter side, in 1/100000.
fn round_rect_adj(rx: f64, ry: f64, w: f64, h: f64) -> i64 {
    let short = w.min(h);
    if short <= 0.0 {
        return 0;
    }
    ((rx.max(ry) / short) * 100_000.0).round().clamp(0.0, 50_000.0) as i64
}

/// Writes one slide part and collects the media it references.
pub(crate) struct SlideWriter<'a> {
    xml: String,
    next_id: u32,
    media: &'a mut MediaTable,
    assets: &'a AssetStore,
    /// Media file names in relationship order (`rId2..`).
    pub(crate) rels: Vec<String>,
}

impl<'a> SlideWriter<'a> {
    pub(crate) fn new(media: &'a mut MediaTable, assets: &'a AssetStore) -> Self {
        Self {
            xml: String::with_capacity(4096),
            next_id: 2,
            media,
            assets,
            rels: Vec::new(),
        }
    }

    fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn rel_for(&mut self, img: &PreparedImage) -> SlideResult<String> {
        let name = self.media.intern(img)?;
        let pos = match self.rels.iter().position(|n| *n == name) {
            Some(pos) => pos,
            None => {
                self.rels.push(name);
                self.rels.len() - 1
            }
        };
        Ok(format!("rId{}", pos + 2))
    }

    pub(crate) fn slide(
        mut self,
        slide: &Slide,
        settings: &PresentationSettings,
    ) -> SlideResult<(String, Vec<String>)> {
        let _ = write!(
            self.xml,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld>"#
        );
        self.background(slide, settings)?;
        self.xml.push_str(
            r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
        );
        for el in &slide.elements {
            self.element(el, Affine::IDENTITY, 1.0)?;
        }
        self.xml.push_str(
            r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        );
        Ok((self.xml, self.rels))
    }

    fn background(&mut self, slide: &Slide, settings: &PresentationSettings) -> SlideResult<()> {
        let assets = self.assets;
        let image = match &slide.background {
            Background::Image { src } => assets.get(src),
            _ => None,
        };
        self.xml.push_str("<p:bg><p:bgPr>");
        match (&slide.background, image) {
            (Background::Image { .. }, Some(img)) => {
                let rid = self.rel_for(img)?;
                let _ = write!(
                    self.xml,
                    r#"<a:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></a:blipFill>"#
                );
            }
            (Background::Color { color }, _) => solid_fill(&mut self.xml, *color, 1.0),
            _ => solid_fill(&mut self.xml, settings.theme.background, 1.0),
        }
        self.xml.push_str("<a:effectLst/></p:bgPr></p:bg>");
        Ok(())
    }

    /// `world` maps the parent's space to slide space; it is only needed to resolve
    /// absolute clips.
    fn element(&mut self, el: &Element, world: Affine, parent_opacity: f64) -> SlideResult<()> {
        let opacity = (parent_opacity * el.opacity).clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let g = &el.geometry;
        match &el.kind {
            ElementKind::Shape(s) => self.shape(s, g, opacity),
            ElementKind::Text(t) => self.text(t, g, opacity),
            ElementKind::Image(img) => {
                let local = local_clip(el.clip.as_ref(), world * element_affine(g), g);
                self.picture(img, g, local, opacity)?;
            }
            ElementKind::FlexboxTextGroup(group) => {
                if el.clip.is_some() {
                    tracing::debug!(element = el.id.0, "group clip not exported to pptx");
                }
                self.group(group, g, world, opacity)?;
            }
        }
        Ok(())
    }

    fn shape(&mut self, s: &ShapeElement, g: &Geometry, opacity: f64) {
        let id = self.id();
        let (prst, adj) = match s.shape {
            ShapeKind::Rect { radius } if radius.rx > 0.0 || radius.ry > 0.0 => (
                "roundRect",
                Some(round_rect_adj(radius.rx, radius.ry, g.width, g.height)),
            ),
            ShapeKind::Rect { .. } => ("rect", None),
            ShapeKind::Ellipse => ("ellipse", None),
            ShapeKind::Triangle => ("triangle", None),
        };
        let _ = write!(
            self.xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Shape {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#
        );
        Xfrm::of(g, Rect::new(0.0, 0.0, g.width, g.height)).write(&mut self.xml, None);
        let _ = write!(self.xml, r#"<a:prstGeom prst="{prst}"><a:avLst>"#);
        if let Some(v) = adj {
            let _ = write!(self.xml, r#"<a:gd name="adj" fmla="val {v}"/>"#);
        }
        self.xml.push_str("</a:avLst></a:prstGeom>");
        solid_fill(&mut self.xml, s.fill, opacity);
        match s.stroke {
            Some((color, width)) if width > 0.0 => {
                let _ = write!(self.xml, r#"<a:ln w="{}">"#, emu(width));
                solid_fill(&mut self.xml, color, opacity);
                self.xml.push_str("</a:ln>");
            }
            _ => self.xml.push_str("<a:ln><a:noFill/></a:ln>"),
        }
        self.xml.push_str("</p:spPr></p:sp>");
    }

    fn text(&mut self, t: &TextElement, g: &Geometry, opacity: f64) {
        let id = self.id();
        let style = &t.style;
        let _ = write!(
            self.xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#
        );
        Xfrm::of(g, Rect::new(0.0, 0.0, g.width, g.height)).write(&mut self.xml, None);
        self.xml.push_str(
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" lIns="0" tIns="0" rIns="0" bIns="0" rtlCol="0"><a:noAutofit/></a:bodyPr><a:lstStyle/>"#,
        );

        let algn = match style.align {
            TextAlign::Left => "l",
            TextAlign::Center => "ctr",
            TextAlign::Right => "r",
        };
        // Pixels to hundredths of a point.
        let sz = (style.font_size * 75.0).round().clamp(100.0, 400_000.0) as i64;
        let spacing = (style.line_height * 100_000.0).round().max(0.0) as i64;
        for line in t.content.split('\n') {
            let _ = write!(
                self.xml,
                r#"<a:p><a:pPr algn="{algn}"><a:lnSpc><a:spcPct val="{spacing}"/></a:lnSpc></a:pPr>"#
            );
            if !line.is_empty() {
                let _ = write!(self.xml, r#"<a:r><a:rPr lang="en-US" sz="{sz}""#);
                if style.bold {
                    self.xml.push_str(r#" b="1""#);
                }
                if style.italic {
                    self.xml.push_str(r#" i="1""#);
                }
                self.xml.push_str(r#" dirty="0">"#);
                solid_fill(&mut self.xml, style.color, opacity);
                let _ = write!(
                    self.xml,
                    r#"</a:rPr><a:t>{}</a:t></a:r>"#,
                    escape_xml(line)
                );
            }
            let _ = write!(self.xml, r#"<a:endParaRPr lang="en-US" sz="{sz}"/></a:p>"#);
        }
        self.xml.push_str("</p:txBody></p:sp>");
    }

    /// Picture showing the `local` region of the element box, with the source
    /// rectangle derived from the fit mode.
    fn picture(
        &mut self,
        img: &ImageElement,
        g: &Geometry,
        local: Rect,
        opacity: f64,
    ) -> SlideResult<()> {
        let assets = self.assets;
        let Some(prepared) = assets.get(&img.src) else {
            let placeholder = ShapeElement {
                shape: ShapeKind::Rect {
                    radius: Default::default(),
                },
                fill: MISSING_IMAGE,
                stroke: None,
            };
            self.shape(&placeholder, g, opacity);
            return Ok(());
        };
        if local.width() <= 0.0 || local.height() <= 0.0 {
            return Ok(());
        }
        let rid = self.rel_for(prepared)?;
        let id = self.id();
        let src = source_rect(img.fit, g, local, prepared.width, prepared.height);

        let _ = write!(
            self.xml,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rid}""#,
            escape_xml(&img.alt)
        );
        if opacity < 1.0 {
            let _ = write!(
                self.xml,
                r#"><a:alphaModFix amt="{}"/></a:blip>"#,
                (opacity * 100_000.0).round() as i64
            );
        } else {
            self.xml.push_str("/>");
        }
        if src != [0; 4] {
            let _ = write!(
                self.xml,
                r#"<a:srcRect l="{}" t="{}" r="{}" b="{}"/>"#,
                src[0], src[1], src[2], src[3]
            );
        }
        self.xml
            .push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>");
        Xfrm::of(g, local).write(&mut self.xml, None);
        self.xml
            .push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        Ok(())
    }

    /// Group shape whose child space is the group-local frame (origin at the center).
    fn group(
        &mut self,
        group: &FlexboxTextGroup,
        g: &Geometry,
        world: Affine,
        opacity: f64,
    ) -> SlideResult<()> {
        let id = self.id();
        let _ = write!(
            self.xml,
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="{id}" name="Group {id}"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr>"#
        );
        let full = Rect::new(0.0, 0.0, g.width, g.height);
        let child_space = Rect::new(
            -g.width / 2.0,
            -g.height / 2.0,
            g.width / 2.0,
            g.height / 2.0,
        );
        Xfrm::of(g, full).write(&mut self.xml, Some(child_space));
        self.xml.push_str("</p:grpSpPr>");

        let inner = world * GroupFrame::of(g).to_affine();
        for child in &group.children {
            self.element(child, inner, opacity)?;
        }
        self.xml.push_str("</p:grpSp>");
        Ok(())
    }
}

/// Visible part of the element box in local coordinates.
pub(super) fn local_clip(clip: Option<&ClipRegion>, world: Affine, g: &Geometry) -> Rect {
    let full = Rect::new(0.0, 0.0, g.width, g.height);
    let Some(clip) = clip else {
        return full;
    };
    let local = if clip.absolute_positioned {
        let rect = Rect::new(
            clip.left,
            clip.top,
            clip.left + clip.width,
            clip.top + clip.height,
        );
        world.inverse().transform_rect_bbox(rect)
    } else {
        clip_local_rect(clip, g)
    };
    local.intersect(full)
}

/// `srcRect` insets (l, t, r, b) in 1/100000 of the image size.
pub(super) fn source_rect(fit: ObjectFit, g: &Geometry, local: Rect, iw: u32, ih: u32) -> [i64; 4] {
    let (iw, ih) = (f64::from(iw), f64::from(ih));
    let (w, h) = (g.width, g.height);
    if iw <= 0.0 || ih <= 0.0 || w <= 0.0 || h <= 0.0 {
        return [0; 4];
    }
    // Image pixels to local box coordinates.
    let fit = match fit {
        ObjectFit::Fill => Affine::scale_non_uniform(w / iw, h / ih),
        ObjectFit::Cover | ObjectFit::Contain => {
            let s = if fit == ObjectFit::Cover {
                (w / iw).max(h / ih)
            } else {
                (w / iw).min(h / ih)
            };
            Affine::translate(Vec2::new((w - iw * s) / 2.0, (h - ih * s) / 2.0))
                * Affine::scale(s)
        }
    };
    let src = fit.inverse().transform_rect_bbox(local);
    let pct = |v: f64| (v * 100_000.0).round() as i64;
    [
        pct(src.x0 / iw),
        pct(src.y0 / ih),
        pct(1.0 - src.x1 / iw),
        pct(1.0 - src.y1 / ih),
    ]
}

use taffy::prelude::NodeId;

use crate::foundation::core::{CanvasSize, Rgba8};
use crate::model::element::{
    ClipRegion, CornerRadius, Element, ElementKind, FlexDirection, FlexboxTextGroup, Geometry,
    ImageElement, ShapeElement, ShapeKind, TextElement, TextSource, TextStyle,
};
use crate::model::slide::{Background, LayoutHint, Slide};
use crate::parse::ast::{AttrValue, ElementNode, Node};
use crate::parse::error::ParseDiagnostic;
use crate::parse::layout::{BoxPx, LayoutBridge};
use crate::parse::style::{Rounded, StyleTokens};

const TEXT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "a", "strong", "em", "b", "i", "label",
    "blockquote", "li", "small", "code",
];
const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "ul", "ol", "main", "header", "footer", "article", "aside", "nav",
];

/// Intermediate box tree between the markup AST and slide elements.
#[derive(Debug, Clone)]
pub(crate) struct Item {
    pub(crate) style: StyleTokens,
    pub(crate) kind: ItemKind,
    pub(crate) node: Option<NodeId>,
    pub(crate) rect: BoxPx,
}

#[derive(Debug, Clone)]
pub(crate) enum ItemKind {
    Container(Vec<Item>),
    /// Container whose children are all text; becomes a [`FlexboxTextGroup`].
    Group(Vec<Item>),
    Text(TextItem),
    Image(ImageItem),
    Shape,
}

#[derive(Debug, Clone)]
pub(crate) struct TextItem {
    pub(crate) content: String,
    pub(crate) source: TextSource,
    pub(crate) style: TextStyle,
}

#[derive(Debug, Clone)]
pub(crate) struct ImageItem {
    pub(crate) src: String,
    pub(crate) alt: String,
}

impl Item {
    fn new(style: StyleTokens, kind: ItemKind) -> Self {
        Self {
            style,
            kind,
            node: None,
            rect: BoxPx::default(),
        }
    }

    fn is_text(&self) -> bool {
        matches!(self.kind, ItemKind::Text(_)) && !self.style.absolute
    }
}

/// Lower parsed markup into a slide laid out on `canvas`.
pub(crate) fn lower_markup(
    path: &str,
    nodes: &[Node],
    canvas: CanvasSize,
    base: TextStyle,
) -> (Slide, Vec<ParseDiagnostic>) {
    let mut lw = Lowerer {
        path,
        diagnostics: Vec::new(),
    };
    let mut slide = Slide::empty(path);

    let synthetic;
    let root_node = match nodes {
        [Node::Element(e)] if e.is_fragment() || CONTAINER_TAGS.contains(&e.tag.as_str()) => e,
        _ => {
            synthetic = ElementNode {
                tag: String::new(),
                attrs: Vec::new(),
                children: nodes.to_vec(),
            };
            &synthetic
        }
    };

    let tokens = StyleTokens::parse(root_node.class_list());
    lw.check_attrs(root_node);
    slide.background = match (&tokens.bg_image, tokens.bg) {
        (Some(src), _) => Background::Image { src: src.clone() },
        (None, Some(color)) => Background::Color { color },
        (None, None) => Background::None,
    };
    slide.layout = if tokens.grid_two {
        LayoutHint::TwoColumn
    } else if tokens.items_center && tokens.justify_center {
        LayoutHint::Centered
    } else {
        LayoutHint::Flow
    };

    let inherited = inherit(&base, &tokens, None);
    let children = lw.lower_children(root_node, &inherited);
    let mut root = Item::new(tokens, ItemKind::Container(children));

    if let Err(err) = LayoutBridge::new().compute(&mut root, canvas) {
        lw.diagnostics.push(ParseDiagnostic::Malformed {
            path: path.to_owned(),
            offset: 0,
            message: format!("layout failed: {err}"),
        });
        return (slide, lw.diagnostics);
    }

    if let ItemKind::Container(children) = &root.kind {
        for c in children {
            emit(c, 1.0, &mut slide.elements);
        }
    }
    (slide, lw.diagnostics)
}

struct Lowerer<'a> {
    path: &'a str,
    diagnostics: Vec<ParseDiagnostic>,
}

impl Lowerer<'_> {
    fn unsupported(&mut self, construct: impl Into<String>) {
        self.diagnostics.push(ParseDiagnostic::Unsupported {
            path: self.path.to_owned(),
            construct: construct.into(),
        });
    }

    fn check_attrs(&mut self, e: &ElementNode) {
        for a in &e.attrs {
            match (a.name.as_str(), &a.value) {
                ("style", _) => self.unsupported(format!("style attribute on <{}>", e.tag)),
                ("...", AttrValue::Opaque(raw)) => self.unsupported(format!("spread {raw}")),
                ("className" | "class", AttrValue::Opaque(raw)) => {
                    self.unsupported(format!("class expression {raw}"))
                }
                _ => {}
            }
        }
    }

    fn lower_children(&mut self, e: &ElementNode, inherited: &TextStyle) -> Vec<Item> {
        e.children
            .iter()
            .filter_map(|c| self.lower_node(c, inherited))
            .collect()
    }

    fn lower_node(&mut self, node: &Node, inherited: &TextStyle) -> Option<Item> {
        match node {
            Node::Text(_) => {
                let content = node.plain_text();
                (!content.is_empty()).then(|| text_item(content, TextSource::Literal, *inherited))
            }
            Node::Opaque(raw) => Some(text_item(raw.clone(), TextSource::Opaque, *inherited)),
            Node::Element(e) => self.lower_element(e, inherited),
        }
    }

    fn lower_element(&mut self, e: &ElementNode, inherited: &TextStyle) -> Option<Item> {
        let tag = e.tag.as_str();
        if tag == "br" {
            return None;
        }
        self.check_attrs(e);
        let tokens = StyleTokens::parse(e.class_list());

        if tag == "img" {
            let src = match e.attr("src") {
                Some(AttrValue::Static(s)) => s.clone(),
                Some(AttrValue::Opaque(raw)) => {
                    self.unsupported(format!("img src {raw}"));
                    String::new()
                }
                _ => String::new(),
            };
            let alt = e.static_attr("alt").unwrap_or_default().to_owned();
            return Some(Item::new(tokens, ItemKind::Image(ImageItem { src, alt })));
        }

        if TEXT_TAGS.contains(&tag) {
            return self.lower_text(e, tokens, inherited);
        }

        let known = e.is_fragment() || CONTAINER_TAGS.contains(&tag);
        if !known {
            if e.children.is_empty() {
                self.unsupported(format!("<{tag}>"));
                return Some(text_item(
                    format!("<{tag} />"),
                    TextSource::Opaque,
                    *inherited,
                ));
            }
            self.unsupported(format!("<{tag}>"));
        }

        let style = inherit(inherited, &tokens, None);
        let children = self.lower_children(e, &style);

        if children.is_empty() {
            if let Some(src) = &tokens.bg_image {
                let img = ImageItem {
                    src: src.clone(),
                    alt: String::new(),
                };
                return Some(Item::new(tokens, ItemKind::Image(img)));
            }
            if tokens.bg.is_some() || tokens.triangle {
                return Some(Item::new(tokens, ItemKind::Shape));
            }
            return Some(Item::new(tokens, ItemKind::Container(Vec::new())));
        }

        let groupable = known
            && !tokens.grid_two
            && (tokens.flex || matches!(tag, "ul" | "ol"))
            && children.len() >= 2
            && children.iter().all(Item::is_text);
        if groupable {
            return Some(Item::new(tokens, ItemKind::Group(children)));
        }
        Some(Item::new(tokens, ItemKind::Container(children)))
    }

    fn lower_text(
        &mut self,
        e: &ElementNode,
        tokens: StyleTokens,
        inherited: &TextStyle,
    ) -> Option<Item> {
        let style = inherit(inherited, &tokens, Some(e.tag.as_str()));
        let content = e.plain_text();
        let source = if e.has_opaque() {
            TextSource::Opaque
        } else {
            TextSource::Literal
        };
        let boxed = tokens.bg.is_some() || tokens.pad_x.is_some() || tokens.pad_y.is_some();

        if content.is_empty() {
            return boxed.then(|| Item::new(tokens, ItemKind::Shape));
        }
        if boxed {
            let inner = text_item(content, source, style);
            return Some(Item::new(tokens, ItemKind::Container(vec![inner])));
        }
        Some(Item::new(
            tokens,
            ItemKind::Text(TextItem {
                content,
                source,
                style,
            }),
        ))
    }
}

fn text_item(content: String, source: TextSource, style: TextStyle) -> Item {
    Item::new(
        StyleTokens::default(),
        ItemKind::Text(TextItem {
            content,
            source,
            style,
        }),
    )
}

/// Text style for descendants: tag defaults first, then class tokens.
fn inherit(base: &TextStyle, tokens: &StyleTokens, tag: Option<&str>) -> TextStyle {
    let mut s = *base;
    match tag {
        Some("h1") => heading(&mut s, 48.0),
        Some("h2") => heading(&mut s, 36.0),
        Some("h3") => heading(&mut s, 30.0),
        Some("h4") => heading(&mut s, 24.0),
        Some("h5") => heading(&mut s, 20.0),
        Some("h6") => heading(&mut s, 18.0),
        Some("strong" | "b") => s.bold = true,
        Some("em" | "i") => s.italic = true,
        Some("small") => s.font_size = 14.0,
        _ => {}
    }
    if let Some(size) = tokens.text_size {
        s.font_size = size;
    }
    if let Some(color) = tokens.text_color {
        s.color = color;
    }
    if let Some(bold) = tokens.bold {
        s.bold = bold;
    }
    if tokens.italic {
        s.italic = true;
    }
    if let Some(align) = tokens.align {
        s.align = align;
    }
    if let Some(lh) = tokens.leading {
        s.line_height = lh;
    }
    s
}

fn heading(s: &mut TextStyle, size: f64) {
    s.font_size = size;
    s.bold = true;
}

fn radius_px(rounded: Option<Rounded>, w: f64, h: f64) -> f64 {
    match rounded {
        Some(Rounded::Px(r)) => r.min(w.min(h) / 2.0).max(0.0),
        Some(Rounded::Full) => w.min(h) / 2.0,
        None => 0.0,
    }
}

/// Apply scale, rotation and opacity tokens; scaling keeps the visual center.
fn finish(mut el: Element, tokens: &StyleTokens, opacity: f64) -> Element {
    let g = &mut el.geometry;
    let sx = tokens.scale_x.unwrap_or(1.0);
    let sy = tokens.scale_y.unwrap_or(1.0);
    g.x += g.width * (1.0 - sx) / 2.0;
    g.y += g.height * (1.0 - sy) / 2.0;
    g.scale_x = sx;
    g.scale_y = sy;
    g.rotation_deg = tokens.rotate.unwrap_or(0.0);
    el.opacity = opacity;
    el
}

fn shape_kind(tokens: &StyleTokens, w: f64, h: f64) -> ShapeKind {
    if tokens.triangle {
        return ShapeKind::Triangle;
    }
    match tokens.rounded {
        Some(Rounded::Full) => ShapeKind::Ellipse,
        r => ShapeKind::Rect {
            radius: CornerRadius::uniform(radius_px(r, w, h)),
        },
    }
}

fn emit(item: &Item, parent_opacity: f64, out: &mut Vec<Element>) {
    let t = &item.style;
    let opacity = parent_opacity * t.opacity.unwrap_or(1.0);
    let r = item.rect;
    let geometry = Geometry::rect(r.x, r.y, r.w, r.h);

    match &item.kind {
        ItemKind::Container(children) => {
            if let Some(fill) = t.bg {
                let shape = ElementKind::Shape(ShapeElement {
                    shape: shape_kind(t, r.w, r.h),
                    fill,
                    stroke: None,
                });
                out.push(finish(Element::new(geometry, shape), t, opacity));
            }
            for c in children {
                emit(c, opacity, out);
            }
        }
        ItemKind::Shape => {
            let shape = ElementKind::Shape(ShapeElement {
                shape: shape_kind(t, r.w, r.h),
                fill: t.bg.unwrap_or(Rgba8::BLACK),
                stroke: None,
            });
            out.push(finish(Element::new(geometry, shape), t, opacity));
        }
        ItemKind::Text(text) => {
            let kind = ElementKind::Text(TextElement {
                content: text.content.clone(),
                source: text.source,
                style: text.style,
            });
            out.push(finish(Element::new(geometry, kind), t, opacity));
        }
        ItemKind::Image(img) => {
            let kind = ElementKind::Image(ImageElement {
                src: img.src.clone(),
                alt: img.alt.clone(),
                fit: t.fit.unwrap_or_default(),
            });
            let mut el = Element::new(geometry, kind);
            let radius = radius_px(t.rounded, r.w, r.h);
            if radius > 0.0 {
                let mut clip = ClipRegion::covering(r.w, r.h);
                clip.rx = radius;
                clip.ry = radius;
                el.clip = Some(clip);
            }
            out.push(finish(el, t, opacity));
        }
        ItemKind::Group(children) => out.push(finish(group_element(item, children), t, opacity)),
    }
}

fn group_element(item: &Item, children: &[Item]) -> Element {
    let t = &item.style;
    let r = item.rect;
    let (cx, cy) = (r.x + r.w / 2.0, r.y + r.h / 2.0);

    let background = Element::rect(
        Geometry::rect(-r.w / 2.0, -r.h / 2.0, r.w, r.h),
        t.bg.unwrap_or(Rgba8::TRANSPARENT),
        CornerRadius::uniform(radius_px(t.rounded, r.w, r.h)),
    );
    let mut members = vec![background];
    for c in children {
        if let ItemKind::Text(text) = &c.kind {
            let cr = c.rect;
            members.push(Element::new(
                Geometry::rect(cr.x - cx, cr.y - cy, cr.w, cr.h),
                ElementKind::Text(TextElement {
                    content: text.content.clone(),
                    source: text.source,
                    style: text.style,
                }),
            ));
        }
    }

    let (pad_x, pad_y) = t.padding();
    let direction = match t.direction {
        Some(d) => d,
        None if t.flex => FlexDirection::Row,
        None => FlexDirection::Column,
    };
    Element::new(
        Geometry::rect(r.x, r.y, r.w, r.h),
        ElementKind::FlexboxTextGroup(FlexboxTextGroup {
            children: members,
            direction,
            gap: t.gap.unwrap_or(0.0),
            padding: pad_x.max(pad_y),
        }),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/parse/lower.rs"]
mod tests;

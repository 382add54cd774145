use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;

/// Stable element identity, unique across a presentation (slides and group children).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ElementId(pub u64);

/// Position, size, scale and rotation of an element.
///
/// The local content box is `[0,width]x[0,height]`. The visual box is
/// `width*scale_x` by `height*scale_y` with its top-left at `(x, y)`, rotated about its
/// center. For children of a [`FlexboxTextGroup`], `(x, y)` is the offset of the child's
/// top-left corner from the group center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation_deg: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_deg: 0.0,
        }
    }
}

impl Geometry {
    /// Unscaled, unrotated box at `(x, y)`.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Visual (scaled) width.
    pub fn scaled_width(&self) -> f64 {
        self.width * crate::geometry::transform::sanitize_scale(self.scale_x)
    }

    /// Visual (scaled) height.
    pub fn scaled_height(&self) -> f64 {
        self.height * crate::geometry::transform::sanitize_scale(self.scale_y)
    }

    pub(crate) fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.scale_x,
            self.scale_y,
            self.rotation_deg,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Rectangle (optionally rounded) limiting an element's visible area.
///
/// When `absolute_positioned` is false the rectangle is offset from the element origin
/// in canvas pixels, rotating with the element but not scaling with it, and the radius is
/// in element-local units. Otherwise the rectangle is in canvas units. The flag survives
/// every edit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rx: f64,
    #[serde(default)]
    pub ry: f64,
    #[serde(default)]
    pub absolute_positioned: bool,
}

impl ClipRegion {
    /// Element-local clip covering `width x height` from the origin.
    pub fn covering(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
            rx: 0.0,
            ry: 0.0,
            absolute_positioned: false,
        }
    }
}

/// Canvas-space rectangle captured by the crop editor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropData {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Corner radius in element-local units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerRadius {
    pub rx: f64,
    pub ry: f64,
}

impl CornerRadius {
    /// Same radius on both axes.
    pub fn uniform(r: f64) -> Self {
        Self { rx: r, ry: r }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgba8,
    pub align: TextAlign,
    pub line_height: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            bold: false,
            italic: false,
            color: Rgba8::rgb(0x11, 0x18, 0x27),
            align: TextAlign::Left,
            line_height: 1.25,
        }
    }
}

/// Where a text element's content came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Static literal text.
    #[default]
    Literal,
    /// Source construct outside the accepted subset, carried verbatim.
    Opaque,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub content: String,
    #[serde(default)]
    pub source: TextSource,
    #[serde(default)]
    pub style: TextStyle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFit {
    #[default]
    Fill,
    Cover,
    Contain,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub fit: ObjectFit,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    Rect {
        #[serde(default)]
        radius: CornerRadius,
    },
    Ellipse,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeElement {
    pub shape: ShapeKind,
    pub fill: Rgba8,
    #[serde(default)]
    pub stroke: Option<(Rgba8, f64)>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
}

/// Background rectangle (index 0) followed by reorderable text children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlexboxTextGroup {
    pub children: Vec<Element>,
    #[serde(default)]
    pub direction: FlexDirection,
    #[serde(default)]
    pub gap: f64,
    #[serde(default)]
    pub padding: f64,
}

impl FlexboxTextGroup {
    /// The background rectangle, if the group is well formed.
    pub fn background(&self) -> Option<&Element> {
        self.children.first()
    }

    /// Text children in visual order (background excluded).
    pub fn text_children(&self) -> &[Element] {
        self.children.get(1..).unwrap_or(&[])
    }

    /// Number of reorderable children.
    pub fn text_len(&self) -> usize {
        self.children.len().saturating_sub(1)
    }

    /// Re-flow text children along the flex direction so visual order equals array order.
    ///
    /// The leading edge of the first slot and the spacing between slots are read from
    /// the current layout, so justified spacing survives. Each child keeps its own
    /// cross-axis offset, so a move followed by its inverse restores every position.
    pub fn reflow(&mut self) {
        if let Some(track) = self.track() {
            self.pack(track);
        }
    }

    /// Remove the child at `index` (background included in the numbering) and close the
    /// slot it leaves.
    pub fn remove_child(&mut self, index: usize) -> Element {
        let track = self.track();
        let removed = self.children.remove(index);
        if let Some(track) = track {
            self.pack(track);
        }
        removed
    }

    /// Main-axis offset and size of a child.
    fn span(&self, child: &Element) -> (f64, f64) {
        match self.direction {
            FlexDirection::Column => (child.geometry.y, child.geometry.scaled_height()),
            FlexDirection::Row => (child.geometry.x, child.geometry.scaled_width()),
        }
    }

    /// Leading edge and inter-child spacing of the current layout.
    fn track(&self) -> Option<(f64, f64)> {
        let spans: Vec<(f64, f64)> = self.text_children().iter().map(|c| self.span(c)).collect();
        let start = spans.iter().map(|s| s.0).reduce(f64::min)?;
        let end = spans.iter().map(|s| s.0 + s.1).fold(start, f64::max);
        let used: f64 = spans.iter().map(|s| s.1).sum();
        let spacing = match spans.len() {
            0 | 1 => self.gap,
            n => (end - start - used) / (n - 1) as f64,
        };
        if spacing.is_finite() && spacing >= 0.0 {
            Some((start, spacing))
        } else {
            Some((start, self.gap))
        }
    }

    fn pack(&mut self, (start, spacing): (f64, f64)) {
        let mut cursor = start;
        for child in self.children.iter_mut().skip(1) {
            match self.direction {
                FlexDirection::Column => {
                    child.geometry.y = cursor;
                    cursor += child.geometry.scaled_height() + spacing;
                }
                FlexDirection::Row => {
                    child.geometry.x = cursor;
                    cursor += child.geometry.scaled_width() + spacing;
                }
            }
        }
    }
}

/// Closed set of element variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text(TextElement),
    Image(ImageElement),
    Shape(ShapeElement),
    FlexboxTextGroup(FlexboxTextGroup),
}

impl ElementKind {
    /// Short lowercase variant name used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Shape(s) => match s.shape {
                ShapeKind::Rect { .. } => "rect",
                ShapeKind::Ellipse => "ellipse",
                ShapeKind::Triangle => "triangle",
            },
            Self::FlexboxTextGroup(_) => "flexbox_text_group",
        }
    }
}

/// A typed, positioned visual unit within a slide.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: ElementId,
    pub geometry: Geometry,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default)]
    pub clip: Option<ClipRegion>,
    pub kind: ElementKind,
}

impl Element {
    /// New element with an unassigned id; the presentation assigns one on insert.
    pub fn new(geometry: Geometry, kind: ElementKind) -> Self {
        Self {
            id: ElementId::default(),
            geometry,
            opacity: 1.0,
            clip: None,
            kind,
        }
    }

    /// Literal text element.
    pub fn text(geometry: Geometry, content: impl Into<String>, style: TextStyle) -> Self {
        Self::new(
            geometry,
            ElementKind::Text(TextElement {
                content: content.into(),
                source: TextSource::Literal,
                style,
            }),
        )
    }

    /// Image element.
    pub fn image(geometry: Geometry, src: impl Into<String>) -> Self {
        Self::new(
            geometry,
            ElementKind::Image(ImageElement {
                src: src.into(),
                alt: String::new(),
                fit: ObjectFit::Fill,
            }),
        )
    }

    /// Rectangle shape with an optional corner radius.
    pub fn rect(geometry: Geometry, fill: Rgba8, radius: CornerRadius) -> Self {
        Self::new(
            geometry,
            ElementKind::Shape(ShapeElement {
                shape: ShapeKind::Rect { radius },
                fill,
                stroke: None,
            }),
        )
    }

    /// Group children, if this is a [`FlexboxTextGroup`].
    pub fn group(&self) -> Option<&FlexboxTextGroup> {
        match &self.kind {
            ElementKind::FlexboxTextGroup(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn group_mut(&mut self) -> Option<&mut FlexboxTextGroup> {
        match &mut self.kind {
            ElementKind::FlexboxTextGroup(g) => Some(g),
            _ => None,
        }
    }
}

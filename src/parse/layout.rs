use taffy::prelude::{AvailableSpace, NodeId, Rect as TaffyRect, Size};
use taffy::style::{
    AlignItems, Dimension, Display, FlexDirection as TaffyDirection, JustifyContent,
    LengthPercentage, LengthPercentageAuto, Position, Style,
};

use crate::foundation::core::CanvasSize;
use crate::model::element::FlexDirection;
use crate::parse::lower::{Item, ItemKind};
use crate::parse::style::{Length, StyleTokens};

/// Average glyph advance as a fraction of the font size, used for text estimates.
const GLYPH_ADVANCE_EM: f32 = 0.52;
/// Box used for images with neither a width nor a height.
const DEFAULT_IMAGE_SIZE: (f32, f32) = (480.0, 320.0);

/// Resolved slide-space box of a layout item.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct BoxPx {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) w: f64,
    pub(crate) h: f64,
}

#[derive(Debug, Clone, Copy)]
enum Measure {
    Text {
        chars: f32,
        longest_word: f32,
        font_size: f32,
        line_height: f32,
    },
    Fixed {
        width: f32,
        height: f32,
    },
}

/// Flexbox pass placing un-positioned items against the logical canvas.
pub(crate) struct LayoutBridge {
    taffy: taffy::TaffyTree<Measure>,
}

impl LayoutBridge {
    pub(crate) fn new() -> Self {
        Self {
            taffy: taffy::TaffyTree::new(),
        }
    }

    /// Lay out `root` (which fills the canvas) and write slide-space boxes into every item.
    pub(crate) fn compute(
        mut self,
        root: &mut Item,
        canvas: CanvasSize,
    ) -> Result<(), taffy::TaffyError> {
        let cw = canvas.width as f32;
        let ch = canvas.height as f32;
        let root_id = self.build(root, true, false, (cw, ch))?;

        let available = Size {
            width: AvailableSpace::Definite(cw),
            height: AvailableSpace::Definite(ch),
        };
        self.taffy.compute_layout_with_measure(
            root_id,
            available,
            |known_dimensions, available_space, _node_id, node_context, _style| {
                match node_context.as_deref() {
                    Some(Measure::Text {
                        chars,
                        longest_word,
                        font_size,
                        line_height,
                    }) => measure_text(
                        *chars,
                        *longest_word,
                        *font_size,
                        *line_height,
                        known_dimensions,
                        available_space,
                    ),
                    Some(Measure::Fixed { width, height }) => {
                        measure_fixed(*width, *height, known_dimensions)
                    }
                    None => known_dimensions.unwrap_or(Size::ZERO),
                }
            },
        )?;

        self.collect(root, 0.0, 0.0)
    }

    fn build(
        &mut self,
        item: &mut Item,
        is_root: bool,
        in_two_col: bool,
        canvas: (f32, f32),
    ) -> Result<NodeId, taffy::TaffyError> {
        let style = style_for(item, is_root, in_two_col, canvas);
        let two_col = item.style.grid_two;

        let nid = match &mut item.kind {
            ItemKind::Container(children) | ItemKind::Group(children) => {
                let mut ids = Vec::with_capacity(children.len());
                for c in children.iter_mut() {
                    ids.push(self.build(c, false, two_col, canvas)?);
                }
                self.taffy.new_with_children(style, &ids)?
            }
            ItemKind::Text(t) => {
                let words = t.content.split_whitespace();
                let longest = words.map(|w| w.chars().count()).max().unwrap_or(0);
                let weight = if t.style.bold { 1.08 } else { 1.0 };
                self.taffy.new_leaf_with_context(
                    style,
                    Measure::Text {
                        chars: t.content.chars().count() as f32 * weight,
                        longest_word: longest as f32 * weight,
                        font_size: t.style.font_size as f32,
                        line_height: t.style.line_height as f32,
                    },
                )?
            }
            ItemKind::Image(_) => {
                let (w, h) = DEFAULT_IMAGE_SIZE;
                self.taffy
                    .new_leaf_with_context(style, Measure::Fixed { width: w, height: h })?
            }
            ItemKind::Shape => self.taffy.new_leaf(style)?,
        };
        item.node = Some(nid);
        Ok(nid)
    }

    fn collect(&self, item: &mut Item, ox: f64, oy: f64) -> Result<(), taffy::TaffyError> {
        let Some(nid) = item.node else {
            return Ok(());
        };
        let l = self.taffy.layout(nid)?;
        item.rect = BoxPx {
            x: ox + f64::from(l.location.x),
            y: oy + f64::from(l.location.y),
            w: f64::from(l.size.width),
            h: f64::from(l.size.height),
        };
        let (x, y) = (item.rect.x, item.rect.y);
        if let ItemKind::Container(children) | ItemKind::Group(children) = &mut item.kind {
            for c in children.iter_mut() {
                self.collect(c, x, y)?;
            }
        }
        Ok(())
    }
}

fn dimension(l: Option<Length>) -> Dimension {
    match l {
        Some(Length::Px(v)) => Dimension::length(v as f32),
        Some(Length::Fraction(f)) => Dimension::percent(f as f32),
        None => Dimension::auto(),
    }
}

fn inset(l: Option<Length>) -> LengthPercentageAuto {
    match l {
        Some(Length::Px(v)) => LengthPercentageAuto::length(v as f32),
        Some(Length::Fraction(f)) => LengthPercentageAuto::percent(f as f32),
        None => LengthPercentageAuto::auto(),
    }
}

fn style_for(item: &Item, is_root: bool, in_two_col: bool, canvas: (f32, f32)) -> Style {
    let t: &StyleTokens = &item.style;

    let flex_direction = if t.grid_two {
        TaffyDirection::Row
    } else {
        match t.direction {
            Some(FlexDirection::Row) => TaffyDirection::Row,
            Some(FlexDirection::Column) => TaffyDirection::Column,
            // `flex` alone lays out in a row; block flow stacks vertically.
            None if t.flex => TaffyDirection::Row,
            None => TaffyDirection::Column,
        }
    };

    let gap_px = t.gap.unwrap_or(0.0) as f32;
    let gap = Size {
        width: LengthPercentage::length(gap_px),
        height: LengthPercentage::length(gap_px),
    };

    let (pad_x, pad_y) = t.padding();
    let padding = TaffyRect {
        left: LengthPercentage::length(pad_x.max(0.0) as f32),
        right: LengthPercentage::length(pad_x.max(0.0) as f32),
        top: LengthPercentage::length(pad_y.max(0.0) as f32),
        bottom: LengthPercentage::length(pad_y.max(0.0) as f32),
    };

    let size = if is_root {
        Size {
            width: Dimension::length(canvas.0),
            height: Dimension::length(canvas.1),
        }
    } else {
        Size {
            width: dimension(t.width),
            height: dimension(t.height),
        }
    };

    let (position, inset) = if t.absolute && !is_root {
        let r = if t.inset_0 {
            TaffyRect {
                left: LengthPercentageAuto::length(0.0),
                right: LengthPercentageAuto::length(0.0),
                top: LengthPercentageAuto::length(0.0),
                bottom: LengthPercentageAuto::length(0.0),
            }
        } else {
            TaffyRect {
                left: inset(t.left),
                right: LengthPercentageAuto::auto(),
                top: inset(t.top),
                bottom: LengthPercentageAuto::auto(),
            }
        };
        (Position::Absolute, r)
    } else {
        (Position::Relative, TaffyRect::auto())
    };

    let justify_content = if t.justify_center {
        Some(JustifyContent::Center)
    } else if t.justify_between {
        Some(JustifyContent::SpaceBetween)
    } else {
        None
    };

    let (flex_grow, flex_basis) = if in_two_col {
        (1.0, Dimension::length(0.0))
    } else {
        (0.0, Dimension::auto())
    };

    Style {
        display: Display::Flex,
        position,
        inset,
        flex_direction,
        justify_content,
        align_items: t.items_center.then_some(AlignItems::Center),
        gap,
        padding,
        size,
        flex_grow,
        flex_basis,
        ..Style::default()
    }
}

fn measure_text(
    chars: f32,
    longest_word: f32,
    font_size: f32,
    line_height: f32,
    known: Size<Option<f32>>,
    available: Size<AvailableSpace>,
) -> Size<f32> {
    let em = font_size * GLYPH_ADVANCE_EM;
    let natural = chars * em;
    let limit = match available.width {
        AvailableSpace::Definite(w) => w,
        AvailableSpace::MinContent => longest_word * em,
        AvailableSpace::MaxContent => natural,
    };
    let width = known.width.unwrap_or(natural.min(limit).max(0.0));
    let lines = if width > em {
        (natural / width).ceil().max(1.0)
    } else {
        chars.max(1.0)
    };
    Size {
        width,
        height: known.height.unwrap_or(lines * font_size * line_height),
    }
}

fn measure_fixed(width: f32, height: f32, known: Size<Option<f32>>) -> Size<f32> {
    match (known.width, known.height) {
        (Some(w), Some(h)) => Size {
            width: w,
            height: h,
        },
        (Some(w), None) if width > 0.0 => Size {
            width: w,
            height: w * height / width,
        },
        (None, Some(h)) if height > 0.0 => Size {
            width: h * width / height,
            height: h,
        },
        _ => Size { width, height },
    }
}

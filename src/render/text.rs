use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{SlideError, SlideResult};
use crate::model::element::{TextAlign, TextStyle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub(crate) struct TextBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Font bytes registered with both Parley (layout) and vello_cpu (glyph painting).
#[derive(Clone)]
pub(crate) struct LoadedFont {
    pub(crate) bytes: Arc<Vec<u8>>,
    pub(crate) family: String,
    pub(crate) data: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("bytes_len", &self.bytes.len())
            .field("family", &self.family)
            .finish()
    }
}

/// Stateful helper for shaping slide text with one configured font.
///
/// Without a font the painter has no layout and callers fall back to line bars.
pub(crate) struct TextPainter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    font: Option<LoadedFont>,
}

impl Default for TextPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextPainter {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font: None,
        }
    }

    /// Painter with `font_bytes` registered.
    pub(crate) fn with_font(font_bytes: Arc<Vec<u8>>) -> SlideResult<Self> {
        let mut out = Self::new();
        out.register(font_bytes)?;
        Ok(out)
    }

    pub(crate) fn font(&self) -> Option<&LoadedFont> {
        self.font.as_ref()
    }

    fn register(&mut self, font_bytes: Arc<Vec<u8>>) -> SlideResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.as_ref().clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| SlideError::validation("no font families registered from font bytes"))?;

        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| SlideError::validation("registered font family has no name"))?
            .to_string();

        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );
        self.font = Some(LoadedFont {
            bytes: font_bytes,
            family,
            data,
        });
        Ok(())
    }

    /// Shape `text` and break it to `max_width_px`. `None` when no font is configured.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width_px: Option<f32>,
    ) -> SlideResult<Option<parley::Layout<TextBrush>>> {
        let Some(font) = &self.font else {
            return Ok(None);
        };
        let size_px = style.font_size as f32;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(SlideError::validation(
                "text font_size must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::from(
            style.color,
        )));
        if style.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }
        if style.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(Some(layout))
    }
}

/// Load a font file for the painter.
pub(crate) fn read_font(path: &std::path::Path) -> SlideResult<Arc<Vec<u8>>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read font file '{}'", path.display()))?;
    Ok(Arc::new(bytes))
}

/// Approximate advance of one character, matching the layout estimate.
pub(crate) fn estimated_advance(style: &TextStyle) -> f64 {
    style.font_size * 0.52
}

/// Greedy word wrap of `content` into lines of at most `box_width` estimated pixels.
pub(crate) fn wrap_lines(content: &str, style: &TextStyle, box_width: f64) -> Vec<String> {
    let em = estimated_advance(style);
    if em <= 0.0 || box_width <= 0.0 {
        return Vec::new();
    }
    let per_line = ((box_width / em).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;
    for word in content.split_whitespace() {
        let n = word.chars().count();
        if line_len > 0 && line_len + 1 + n > per_line {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += n;
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// Estimated line boxes `(x, y, width, height)` for text drawn without a font.
///
/// Uses the same advance estimate as layout so greeked text fills its box.
pub(crate) fn estimate_line_boxes(
    content: &str,
    style: &TextStyle,
    box_width: f64,
) -> Vec<(f64, f64, f64, f64)> {
    let em = estimated_advance(style);
    let line_h = style.font_size * style.line_height;
    let bar_h = style.font_size * 0.5;

    wrap_lines(content, style, box_width)
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let w = (line.chars().count() as f64 * em).min(box_width);
            let x = match style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (box_width - w) / 2.0,
                TextAlign::Right => box_width - w,
            };
            let y = i as f64 * line_h + (line_h - bar_h) / 2.0;
            (x, y, w, bar_h)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;

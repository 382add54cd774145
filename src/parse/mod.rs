//! Slide source parsing: returned-markup extraction, markup lexing and parsing, class
//! token interpretation, lowering and flexbox layout.

pub(crate) mod ast;
pub(crate) mod error;
pub(crate) mod layout;
pub(crate) mod lexer;
pub(crate) mod lower;
pub(crate) mod parser;
pub(crate) mod source;
pub(crate) mod style;

use crate::model::element::TextStyle;
use crate::model::presentation::{Presentation, PresentationSettings};
use crate::model::slide::Slide;
use crate::parse::error::ParseDiagnostic;
use crate::parse::source::{SourceUnit, extract_return_blocks, sort_units};

/// A parsed presentation plus everything recovered along the way.
#[derive(Debug)]
pub struct ParsedPresentation {
    pub presentation: Presentation,
    /// Per-slide diagnostics in slide order.
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parse one source unit into a slide. Never fails; problems become diagnostics.
pub fn parse_slide(
    unit: &SourceUnit,
    settings: &PresentationSettings,
) -> (Slide, Vec<ParseDiagnostic>) {
    let blocks = extract_return_blocks(&unit.text);
    let mut diagnostics = Vec::new();

    let Some(block) = blocks.first else {
        diagnostics.push(ParseDiagnostic::ParseIncomplete {
            path: unit.path.clone(),
        });
        return (Slide::empty(unit.path.clone()), diagnostics);
    };
    if blocks.count > 1 {
        diagnostics.push(ParseDiagnostic::MultipleReturnBlocks {
            path: unit.path.clone(),
            count: blocks.count,
        });
    }

    let nodes = match parser::parse_markup(block) {
        Ok(nodes) => nodes,
        Err(err) => {
            diagnostics.push(ParseDiagnostic::Malformed {
                path: unit.path.clone(),
                offset: blocks.offset + err.offset,
                message: err.message,
            });
            return (Slide::empty(unit.path.clone()), diagnostics);
        }
    };

    let base = TextStyle {
        color: settings.theme.text_color,
        ..TextStyle::default()
    };
    let (slide, lowered) = lower::lower_markup(&unit.path, &nodes, settings.canvas, base);
    diagnostics.extend(lowered);
    (slide, diagnostics)
}

/// Parse a set of source units into a presentation, ordered by path.
///
/// Units outside `slides/` are skipped. Every diagnostic is logged at `warn`.
#[tracing::instrument(skip(units, settings), fields(units = units.len()))]
pub fn parse_presentation(
    mut units: Vec<SourceUnit>,
    settings: PresentationSettings,
) -> ParsedPresentation {
    sort_units(&mut units);

    let mut slides = Vec::with_capacity(units.len());
    let mut diagnostics = Vec::new();
    for unit in &units {
        if !unit.is_slide() {
            diagnostics.push(ParseDiagnostic::NotASlide {
                path: unit.path.clone(),
            });
            continue;
        }
        let (slide, diags) = parse_slide(unit, &settings);
        tracing::debug!(
            path = %unit.path,
            elements = slide.element_count(),
            "parsed slide"
        );
        slides.push(slide);
        diagnostics.extend(diags);
    }

    for d in &diagnostics {
        tracing::warn!("{d}");
    }

    ParsedPresentation {
        presentation: Presentation::new(slides, settings),
        diagnostics,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/parse/mod.rs"]
mod tests;

use crate::{
    edit::gesture::GesturePhase,
    foundation::error::{SlideError, SlideResult},
    geometry::transform::{display_radius, stored_radius},
    model::element::{CornerRadius, ElementId},
    model::presentation::{EditOutcome, Presentation},
};

/// Radius of `id` in canvas pixels at its current scale.
pub fn read_radius(presentation: &Presentation, id: ElementId) -> Option<CornerRadius> {
    let stored = presentation.corner_radius(id)?;
    let el = presentation.element(id)?;
    Some(display_radius(stored, &el.geometry))
}

/// Set the radius of `id` from a value entered in canvas pixels.
pub fn write_radius(
    presentation: &mut Presentation,
    id: ElementId,
    entered: CornerRadius,
) -> SlideResult<EditOutcome> {
    let el = presentation
        .element(id)
        .ok_or_else(|| SlideError::validation(format!("unknown element {}", id.0)))?;
    let stored = stored_radius(entered, &el.geometry);
    let outcome = presentation.set_corner_radius(id, stored)?;
    if let EditOutcome::Unsupported(u) = &outcome {
        tracing::debug!(element = u.element.0, kind = u.kind, reason = u.reason, "radius edit ignored");
    }
    Ok(outcome)
}

/// Interactive corner-radius drag with live preview.
#[derive(Debug, Default)]
pub struct RadiusEditor {
    active: Option<(ElementId, CornerRadius)>,
}

impl RadiusEditor {
    pub fn phase(&self) -> GesturePhase {
        if self.active.is_some() {
            GesturePhase::Dragging
        } else {
            GesturePhase::Idle
        }
    }

    /// Start editing `id`. `None` when the element has no rounded-rect primitive.
    pub fn begin(
        &mut self,
        presentation: &mut Presentation,
        id: ElementId,
    ) -> SlideResult<Option<CornerRadius>> {
        if self.active.is_some() {
            self.cancel(presentation)?;
        }
        let Some(stored) = presentation.corner_radius(id) else {
            tracing::debug!(element = id.0, "radius editor unsupported for element");
            return Ok(None);
        };
        self.active = Some((id, stored));
        Ok(read_radius(presentation, id))
    }

    /// Apply an intermediate value; the model is updated so the canvas shows it.
    pub fn preview(
        &mut self,
        presentation: &mut Presentation,
        entered: CornerRadius,
    ) -> SlideResult<EditOutcome> {
        let Some((id, _)) = self.active else {
            return Ok(EditOutcome::NoOp);
        };
        write_radius(presentation, id, entered)
    }

    pub fn commit(
        &mut self,
        presentation: &mut Presentation,
        entered: CornerRadius,
    ) -> SlideResult<EditOutcome> {
        let Some((id, _)) = self.active.take() else {
            return Ok(EditOutcome::NoOp);
        };
        write_radius(presentation, id, entered)
    }

    /// Restore the radius the element had when editing began.
    pub fn cancel(&mut self, presentation: &mut Presentation) -> SlideResult<GesturePhase> {
        let Some((id, original)) = self.active.take() else {
            return Ok(GesturePhase::Idle);
        };
        if presentation.corner_radius(id).is_some_and(|r| r != original) {
            presentation.set_corner_radius(id, original)?;
        }
        Ok(GesturePhase::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/radius.rs"]
mod tests;

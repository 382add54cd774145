use crate::{
    edit::gesture::GesturePhase,
    foundation::core::{Point, Rect},
    foundation::error::{SlideError, SlideResult},
    geometry::transform::{Viewport, element_bounds, group_child_affine},
    model::element::ElementId,
    model::presentation::{EditOutcome, Presentation},
    render::cpu::Overlay,
};

/// Hit radius of a reorder handle, in device pixels.
pub const HANDLE_HIT_RADIUS: f64 = 8.0;

/// Drag handle for one text child of a group, in slide space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReorderHandle {
    pub group: ElementId,
    /// Index among the group's text children (background excluded).
    pub index: usize,
    /// Left-middle of the child's box, projected through the group frame.
    pub position: Point,
}

/// Handles for every text child of `group`. Empty when `group` is not a group.
pub fn handles(presentation: &Presentation, group: ElementId) -> Vec<ReorderHandle> {
    let Some(el) = presentation.element(group) else {
        return Vec::new();
    };
    let Some(g) = el.group() else {
        return Vec::new();
    };
    g.text_children()
        .iter()
        .enumerate()
        .map(|(index, child)| ReorderHandle {
            group,
            index,
            position: group_child_affine(&el.geometry, &child.geometry)
                * Point::new(0.0, child.geometry.height / 2.0),
        })
        .collect()
}

/// Index of the handle within [`HANDLE_HIT_RADIUS`] of a device-space point, nearest first.
pub fn handle_at(handles: &[ReorderHandle], viewport: &Viewport, device: Point) -> Option<usize> {
    handles
        .iter()
        .map(|h| (h.index, viewport.to_device(h.position).distance(device)))
        .filter(|(_, d)| *d <= HANDLE_HIT_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Drag-to-reorder gesture over the text children of one group.
#[derive(Debug, Default)]
pub struct ReorderGesture {
    phase: GesturePhase,
    group: Option<ElementId>,
    from: usize,
    target: Option<usize>,
}

impl ReorderGesture {
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn group(&self) -> Option<ElementId> {
        self.group
    }

    /// Current drop target while dragging.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Pointer moved over handle `hit` (or none). While dragging only the drop target moves.
    pub fn hover(&mut self, hit: Option<usize>) -> GesturePhase {
        match self.phase {
            GesturePhase::Dragging => {
                if hit.is_some() {
                    self.target = hit;
                }
            }
            _ => {
                self.phase = if hit.is_some() {
                    GesturePhase::Hover
                } else {
                    GesturePhase::Idle
                };
            }
        }
        self.phase
    }

    /// Start dragging text child `from` of `group`. An active drag is cancelled first.
    pub fn begin(
        &mut self,
        presentation: &Presentation,
        group: ElementId,
        from: usize,
    ) -> SlideResult<()> {
        let len = presentation
            .element(group)
            .and_then(|e| e.group())
            .map(|g| g.text_len())
            .ok_or_else(|| SlideError::validation(format!("element {} is not a group", group.0)))?;
        if from >= len {
            return Err(SlideError::validation(format!(
                "reorder handle {from} out of range (len {len})"
            )));
        }
        if self.phase.is_active() {
            tracing::debug!(group = ?self.group, "reorder drag replaced");
            self.cancel();
        }
        self.phase = GesturePhase::Dragging;
        self.group = Some(group);
        self.from = from;
        self.target = Some(from);
        Ok(())
    }

    /// Finish the drag on handle `to` (or the last hovered one) and commit the move.
    pub fn drop_on(
        &mut self,
        presentation: &mut Presentation,
        to: Option<usize>,
    ) -> SlideResult<EditOutcome> {
        let (Some(group), GesturePhase::Dragging) = (self.group, self.phase) else {
            return Ok(EditOutcome::NoOp);
        };
        let Some(to) = to.or(self.target) else {
            self.cancel();
            return Ok(EditOutcome::NoOp);
        };
        let from = self.from;
        self.reset();
        let outcome = presentation.reorder_group_child(group, from, to)?;
        tracing::debug!(group = group.0, from, to, ?outcome, "reorder dropped");
        Ok(outcome)
    }

    /// Abort the drag without touching the model.
    pub fn cancel(&mut self) -> GesturePhase {
        let was_active = self.phase.is_active();
        self.reset();
        if was_active {
            GesturePhase::Cancelled
        } else {
            GesturePhase::Idle
        }
    }

    fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.group = None;
        self.from = 0;
        self.target = None;
    }

    /// Insertion bar above the hovered drop target while dragging.
    pub fn drop_indicator(&self, presentation: &Presentation) -> Option<Overlay> {
        if !self.phase.is_active() {
            return None;
        }
        let el = presentation.element(self.group?)?;
        let child = el.group()?.text_children().get(self.target?)?;
        let b = element_bounds(group_child_affine(&el.geometry, &child.geometry), &child.geometry);
        let bar = 4.0;
        Some(Overlay::DropIndicator(Rect::new(
            b.x0,
            b.y0 - bar,
            b.x1,
            b.y0,
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/reorder.rs"]
mod tests;

use crate::{
    edit::gesture::GesturePhase,
    foundation::core::Rect,
    foundation::error::{SlideError, SlideResult},
    geometry::transform::{crop_to_clip, element_bounds, initial_crop_rect, world_affine},
    model::element::{ClipRegion, CropData, ElementId, ElementKind},
    model::presentation::{EditOutcome, Presentation},
    render::cpu::Overlay,
    render::scene::{Interactivity, SceneCache},
};

#[derive(Debug)]
struct CropSession {
    image: ElementId,
    rect: Rect,
    saved: Vec<(ElementId, Interactivity)>,
}

/// Modal crop editor for one image at a time.
///
/// While active every scene object is non-interactive; both exits restore the
/// saved flags exactly.
#[derive(Debug, Default)]
pub struct CropEditor {
    session: Option<CropSession>,
}

impl CropEditor {
    pub fn phase(&self) -> GesturePhase {
        if self.session.is_some() {
            GesturePhase::Dragging
        } else {
            GesturePhase::Idle
        }
    }

    pub fn image(&self) -> Option<ElementId> {
        self.session.as_ref().map(|s| s.image)
    }

    /// Current crop rectangle in canvas coordinates.
    pub fn rect(&self) -> Option<Rect> {
        self.session.as_ref().map(|s| s.rect)
    }

    /// Start cropping `image`. A crop already in progress is cancelled first.
    #[tracing::instrument(skip(self, presentation, scene))]
    pub fn enter(
        &mut self,
        presentation: &Presentation,
        scene: &mut SceneCache,
        image: ElementId,
    ) -> SlideResult<Rect> {
        let el = presentation
            .element(image)
            .ok_or_else(|| SlideError::validation(format!("unknown element {}", image.0)))?;
        if !matches!(el.kind, ElementKind::Image(_)) {
            return Err(SlideError::validation(format!(
                "element {} is a {}, not an image",
                image.0,
                el.kind.name()
            )));
        }
        if self.session.is_some() {
            tracing::debug!("crop session replaced");
            self.cancel(scene);
        }

        let bounds = match scene.get(image) {
            Some(obj) => obj.bounds,
            None => element_bounds(
                world_affine(el, presentation.parent_of(image)),
                &el.geometry,
            ),
        };
        let rect = initial_crop_rect(bounds);

        let saved = scene.interactivity_snapshot();
        for (id, _) in &saved {
            scene.set_interactivity(*id, Interactivity::LOCKED);
        }
        self.session = Some(CropSession { image, rect, saved });
        Ok(rect)
    }

    /// Move or resize the crop rectangle.
    pub fn set_rect(&mut self, rect: Rect) -> SlideResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| SlideError::validation("no crop session active"))?;
        let finite = [rect.x0, rect.y0, rect.x1, rect.y1]
            .iter()
            .all(|v| v.is_finite());
        if !finite || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(SlideError::validation(
                "crop rectangle must be finite with positive size",
            ));
        }
        session.rect = rect;
        Ok(())
    }

    /// Write the crop into the image's clip region and leave crop mode.
    ///
    /// An existing clip keeps its corner radius and positioning mode.
    #[tracing::instrument(skip(self, presentation, scene))]
    pub fn apply(
        &mut self,
        presentation: &mut Presentation,
        scene: &mut SceneCache,
    ) -> SlideResult<EditOutcome> {
        let Some(session) = self.session.take() else {
            return Ok(EditOutcome::NoOp);
        };
        scene.restore_interactivity(&session.saved);

        let el = presentation.element(session.image).ok_or_else(|| {
            SlideError::validation(format!("cropped image {} vanished", session.image.0))
        })?;
        let crop = CropData {
            left: session.rect.x0,
            top: session.rect.y0,
            width: session.rect.width(),
            height: session.rect.height(),
        };
        let region = match el.clip {
            Some(prev) if prev.absolute_positioned => ClipRegion {
                left: crop.left,
                top: crop.top,
                width: crop.width,
                height: crop.height,
                ..prev
            },
            Some(prev) => ClipRegion {
                rx: prev.rx,
                ry: prev.ry,
                ..crop_to_clip(&crop, &el.geometry)
            },
            None => crop_to_clip(&crop, &el.geometry),
        };
        presentation.set_clip_region(session.image, Some(region))?;
        tracing::debug!(
            image = session.image.0,
            left = region.left,
            top = region.top,
            "crop applied"
        );
        Ok(EditOutcome::Applied)
    }

    /// Leave crop mode without touching the model.
    pub fn cancel(&mut self, scene: &mut SceneCache) -> GesturePhase {
        match self.session.take() {
            Some(session) => {
                scene.restore_interactivity(&session.saved);
                GesturePhase::Cancelled
            }
            None => GesturePhase::Idle,
        }
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.rect().map(Overlay::CropRect)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/crop.rs"]
mod tests;

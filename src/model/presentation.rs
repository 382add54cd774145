use serde::{Deserialize, Serialize};

use crate::foundation::core::{CanvasSize, Rgba8};
use crate::foundation::error::{SlideError, SlideResult};
use crate::geometry::transform::covering_clip;
use crate::model::element::{
    ClipRegion, CornerRadius, Element, ElementId, ElementKind, Geometry, ShapeElement, ShapeKind,
};
use crate::model::slide::Slide;

/// Presentation-wide theme defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub background: Rgba8,
    pub text_color: Rgba8,
    pub font_family: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            text_color: Rgba8::rgb(0x11, 0x18, 0x27),
            font_family: "Helvetica".to_owned(),
        }
    }
}

/// Global export/theme settings owned by the presentation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationSettings {
    #[serde(default)]
    pub canvas: CanvasSize,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub theme: Theme,
}

/// Where an element lives inside the presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementLocation {
    /// Slide index.
    pub slide: usize,
    /// Top-level element index within the slide.
    pub index: usize,
    /// Child index within a [`crate::FlexboxTextGroup`] (0 is the background).
    pub child: Option<usize>,
}

/// Why an edit was refused without mutating anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedEdit {
    pub element: ElementId,
    pub kind: &'static str,
    pub reason: &'static str,
}

/// Result of a geometry edit that may legitimately do nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The model changed and the slide is dirty.
    Applied,
    /// The edit was valid but changed nothing.
    NoOp,
    /// The element has no primitive for this edit.
    Unsupported(UnsupportedEdit),
}

/// Canonical in-memory presentation. The single writer of record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Presentation {
    slides: Vec<Slide>,
    #[serde(default)]
    settings: PresentationSettings,
    #[serde(skip)]
    next_id: u64,
}

impl Presentation {
    /// Build a presentation, assigning fresh ids to every element.
    pub fn new(slides: Vec<Slide>, settings: PresentationSettings) -> Self {
        let mut p = Self {
            slides,
            settings,
            next_id: 1,
        };
        let mut slides = std::mem::take(&mut p.slides);
        for s in &mut slides {
            for e in &mut s.elements {
                p.assign_ids(e);
            }
        }
        p.slides = slides;
        p
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn settings(&self) -> &PresentationSettings {
        &self.settings
    }

    /// Whether slide `index` changed since the last [`Self::take_dirty`].
    pub fn is_dirty(&self, index: usize) -> bool {
        self.slides.get(index).is_some_and(Slide::is_dirty)
    }

    /// Clear the dirty flag of slide `index`, returning its previous value.
    pub fn take_dirty(&mut self, index: usize) -> bool {
        self.slides
            .get_mut(index)
            .map(|s| std::mem::replace(&mut s.dirty, false))
            .unwrap_or(false)
    }

    fn alloc_id(&mut self) -> ElementId {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    fn assign_ids(&mut self, e: &mut Element) {
        e.id = self.alloc_id();
        if let ElementKind::FlexboxTextGroup(g) = &mut e.kind {
            for c in &mut g.children {
                c.id = self.alloc_id();
            }
        }
    }

    /// Locate an element (top-level or group child) by id.
    pub fn locate(&self, id: ElementId) -> Option<ElementLocation> {
        for (si, s) in self.slides.iter().enumerate() {
            for (ei, e) in s.elements.iter().enumerate() {
                if e.id == id {
                    return Some(ElementLocation {
                        slide: si,
                        index: ei,
                        child: None,
                    });
                }
                if let Some(ci) = e
                    .group()
                    .and_then(|g| g.children.iter().position(|c| c.id == id))
                {
                    return Some(ElementLocation {
                        slide: si,
                        index: ei,
                        child: Some(ci),
                    });
                }
            }
        }
        None
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        let loc = self.locate(id)?;
        let top = &self.slides[loc.slide].elements[loc.index];
        match loc.child {
            None => Some(top),
            Some(ci) => top.group()?.children.get(ci),
        }
    }

    /// The group containing `id`, when `id` is a group child.
    pub fn parent_of(&self, id: ElementId) -> Option<&Element> {
        let loc = self.locate(id)?;
        loc.child?;
        self.slides[loc.slide].elements.get(loc.index)
    }

    fn require(&self, id: ElementId) -> SlideResult<ElementLocation> {
        self.locate(id)
            .ok_or_else(|| SlideError::validation(format!("unknown element {}", id.0)))
    }

    fn element_at_mut(&mut self, loc: ElementLocation) -> SlideResult<&mut Element> {
        let top = self
            .slides
            .get_mut(loc.slide)
            .and_then(|s| s.elements.get_mut(loc.index))
            .ok_or_else(|| SlideError::validation("element location out of range"))?;
        match loc.child {
            None => Ok(top),
            Some(ci) => top
                .group_mut()
                .and_then(|g| g.children.get_mut(ci))
                .ok_or_else(|| SlideError::validation("group child out of range")),
        }
    }

    fn touch(&mut self, slide: usize) {
        if let Some(s) = self.slides.get_mut(slide) {
            s.touch();
        }
    }

    /// Insert `element` at paint position `index` of slide `slide`, returning its new id.
    #[tracing::instrument(skip(self, element), fields(kind = element.kind.name()))]
    pub fn insert_element(
        &mut self,
        slide: usize,
        index: usize,
        mut element: Element,
    ) -> SlideResult<ElementId> {
        let len = self
            .slides
            .get(slide)
            .ok_or_else(|| SlideError::validation(format!("slide index {slide} out of range")))?
            .elements
            .len();
        if index > len {
            return Err(SlideError::validation(format!(
                "insert index {index} out of range (len {len})"
            )));
        }
        if !element.geometry.is_finite() {
            return Err(SlideError::validation("element geometry must be finite"));
        }
        if let Some(g) = element.group()
            && g.children.is_empty()
        {
            return Err(SlideError::validation(
                "flexbox text group requires a background child",
            ));
        }
        self.assign_ids(&mut element);
        let id = element.id;
        self.slides[slide].elements.insert(index, element);
        self.touch(slide);
        Ok(id)
    }

    /// Remove an element (top-level or group text child) and return it.
    ///
    /// A group's background child cannot be removed.
    #[tracing::instrument(skip(self))]
    pub fn remove_element(&mut self, id: ElementId) -> SlideResult<Element> {
        let loc = self.require(id)?;
        let removed = match loc.child {
            None => self.slides[loc.slide].elements.remove(loc.index),
            Some(0) => {
                return Err(SlideError::validation(
                    "cannot remove the background of a flexbox text group",
                ));
            }
            Some(ci) => {
                self.slides[loc.slide].elements[loc.index]
                    .group_mut()
                    .ok_or_else(|| SlideError::validation("parent is not a group"))?
                    .remove_child(ci)
            }
        };
        self.touch(loc.slide);
        Ok(removed)
    }

    /// Move a text child of a group from `from` to `to` (indices exclude the background).
    #[tracing::instrument(skip(self))]
    pub fn reorder_group_child(
        &mut self,
        group: ElementId,
        from: usize,
        to: usize,
    ) -> SlideResult<EditOutcome> {
        let loc = self.require(group)?;
        let el = self.element_at_mut(loc)?;
        let g = el
            .group_mut()
            .ok_or_else(|| SlideError::validation(format!("element {} is not a group", group.0)))?;
        let n = g.text_len();
        if from >= n || to >= n {
            return Err(SlideError::validation(format!(
                "reorder indices {from}->{to} out of range (len {n})"
            )));
        }
        if from == to {
            return Ok(EditOutcome::NoOp);
        }
        let child = g.children.remove(from + 1);
        g.children.insert(to + 1, child);
        g.reflow();
        self.touch(loc.slide);
        Ok(EditOutcome::Applied)
    }

    /// Replace (or clear) an element's clip region.
    #[tracing::instrument(skip(self))]
    pub fn set_clip_region(
        &mut self,
        id: ElementId,
        region: Option<ClipRegion>,
    ) -> SlideResult<()> {
        if let Some(r) = &region {
            let finite = [r.left, r.top, r.width, r.height, r.rx, r.ry]
                .iter()
                .all(|v| v.is_finite());
            if !finite || r.width <= 0.0 || r.height <= 0.0 || r.rx < 0.0 || r.ry < 0.0 {
                return Err(SlideError::validation(
                    "clip region must be finite with positive size",
                ));
            }
        }
        let loc = self.require(id)?;
        self.element_at_mut(loc)?.clip = region;
        self.touch(loc.slide);
        Ok(())
    }

    /// Store a corner radius in element-local units.
    ///
    /// Rect shapes store it on the shape, images on their clip region, groups on their
    /// background rectangle. An image without a clip gets one covering its scaled box,
    /// but only when the radius actually changes.
    #[tracing::instrument(skip(self))]
    pub fn set_corner_radius(
        &mut self,
        id: ElementId,
        radius: CornerRadius,
    ) -> SlideResult<EditOutcome> {
        if !(radius.rx.is_finite() && radius.ry.is_finite()) || radius.rx < 0.0 || radius.ry < 0.0
        {
            return Err(SlideError::validation(
                "corner radius must be finite and >= 0",
            ));
        }
        let loc = self.require(id)?;
        let el = self.element_at_mut(loc)?;
        let (element, kind) = (el.id, el.kind.name());
        let geometry = el.geometry;

        let changed = match &mut el.kind {
            ElementKind::Shape(ShapeElement {
                shape: ShapeKind::Rect { radius: slot },
                ..
            }) => Some(replace_radius(slot, radius)),
            ElementKind::FlexboxTextGroup(g) => match g.children.first_mut().map(|bg| &mut bg.kind)
            {
                Some(ElementKind::Shape(ShapeElement {
                    shape: ShapeKind::Rect { radius: slot },
                    ..
                })) => Some(replace_radius(slot, radius)),
                _ => None,
            },
            ElementKind::Image(_) => {
                let current = el
                    .clip
                    .map(|c| CornerRadius { rx: c.rx, ry: c.ry })
                    .unwrap_or_default();
                if current == radius {
                    Some(false)
                } else {
                    let clip = el.clip.get_or_insert_with(|| covering_clip(&geometry));
                    clip.rx = radius.rx;
                    clip.ry = radius.ry;
                    Some(true)
                }
            }
            _ => None,
        };

        match changed {
            None => Ok(EditOutcome::Unsupported(UnsupportedEdit {
                element,
                kind,
                reason: "element has no rounded-rect primitive",
            })),
            Some(false) => Ok(EditOutcome::NoOp),
            Some(true) => {
                self.touch(loc.slide);
                Ok(EditOutcome::Applied)
            }
        }
    }

    /// Stored corner radius (element-local units), if the element supports one.
    pub fn corner_radius(&self, id: ElementId) -> Option<CornerRadius> {
        let el = self.element(id)?;
        match &el.kind {
            ElementKind::Shape(s) => match s.shape {
                ShapeKind::Rect { radius } => Some(radius),
                _ => None,
            },
            ElementKind::FlexboxTextGroup(g) => match g.background().map(|b| &b.kind) {
                Some(ElementKind::Shape(s)) => match s.shape {
                    ShapeKind::Rect { radius } => Some(radius),
                    _ => None,
                },
                _ => None,
            },
            ElementKind::Image(_) => Some(
                el.clip
                    .map(|c| CornerRadius { rx: c.rx, ry: c.ry })
                    .unwrap_or_default(),
            ),
            ElementKind::Text(_) => None,
        }
    }

    /// Commit a move/resize/rotate.
    ///
    /// Resizing a group resizes its background; text children keep their offsets from
    /// the group center.
    #[tracing::instrument(skip(self))]
    pub fn set_geometry(&mut self, id: ElementId, geometry: Geometry) -> SlideResult<()> {
        if !geometry.is_finite() || geometry.width < 0.0 || geometry.height < 0.0 {
            return Err(SlideError::validation(
                "geometry must be finite with non-negative size",
            ));
        }
        let loc = self.require(id)?;
        let el = self.element_at_mut(loc)?;
        el.geometry = geometry;
        if let ElementKind::FlexboxTextGroup(g) = &mut el.kind {
            if let Some(bg) = g.children.first_mut() {
                bg.geometry = Geometry::rect(
                    -geometry.width / 2.0,
                    -geometry.height / 2.0,
                    geometry.width,
                    geometry.height,
                );
            }
        }
        self.touch(loc.slide);
        Ok(())
    }
}

fn replace_radius(slot: &mut CornerRadius, radius: CornerRadius) -> bool {
    if *slot == radius {
        return false;
    }
    *slot = radius;
    true
}

#[cfg(test)]
#[path = "../../tests/unit/model/presentation.rs"]
mod tests;

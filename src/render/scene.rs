use std::collections::HashMap;

use crate::{
    foundation::core::{Affine, Point, Rect},
    geometry::transform::{element_bounds, element_affine, group_child_affine},
    model::element::{Element, ElementId},
    model::slide::Slide,
};

/// Whether a surface object takes part in selection and pointer events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interactivity {
    pub selectable: bool,
    pub evented: bool,
}

impl Interactivity {
    pub const ENABLED: Self = Self {
        selectable: true,
        evented: true,
    };
    pub const LOCKED: Self = Self {
        selectable: false,
        evented: false,
    };
}

impl Default for Interactivity {
    fn default() -> Self {
        Self::ENABLED
    }
}

/// View-layer twin of one element.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceObject {
    pub element_id: ElementId,
    /// Enclosing group for group children.
    pub parent: Option<ElementId>,
    /// Local content space to slide space.
    pub transform: Affine,
    /// Local content box `[0,w]x[0,h]`.
    pub local: Rect,
    /// Axis-aligned slide-space bounds.
    pub bounds: Rect,
    pub interactivity: Interactivity,
}

impl SurfaceObject {
    fn from_element(el: &Element, parent: Option<&Element>) -> Self {
        let transform = match parent {
            Some(p) => group_child_affine(&p.geometry, &el.geometry),
            None => element_affine(&el.geometry),
        };
        Self {
            element_id: el.id,
            parent: parent.map(|p| p.id),
            transform,
            local: Rect::new(0.0, 0.0, el.geometry.width, el.geometry.height),
            bounds: element_bounds(transform, &el.geometry),
            interactivity: Interactivity::default(),
        }
    }

    /// Whether slide-space point `p` falls inside the (possibly rotated) box.
    pub fn contains(&self, p: Point) -> bool {
        let det = self.transform.determinant();
        if det == 0.0 || !det.is_finite() {
            return false;
        }
        self.local.contains(self.transform.inverse() * p)
    }
}

/// Disposable cache of surface objects keyed by element id, in paint order.
///
/// Group backgrounds are painted with their group and have no object of their own.
#[derive(Debug, Default)]
pub struct SceneCache {
    objects: Vec<SurfaceObject>,
    by_id: HashMap<ElementId, usize>,
}

impl SceneCache {
    /// Rebuild from `slide`, keeping interactivity flags of ids that survive.
    pub(crate) fn rebuild(&mut self, slide: &Slide) {
        let previous: HashMap<ElementId, Interactivity> = self
            .objects
            .iter()
            .map(|o| (o.element_id, o.interactivity))
            .collect();

        self.objects.clear();
        self.by_id.clear();
        for el in &slide.elements {
            self.push(SurfaceObject::from_element(el, None));
            if let Some(group) = el.group() {
                for child in group.text_children() {
                    self.push(SurfaceObject::from_element(child, Some(el)));
                }
            }
        }
        for obj in &mut self.objects {
            if let Some(flags) = previous.get(&obj.element_id) {
                obj.interactivity = *flags;
            }
        }
    }

    fn push(&mut self, obj: SurfaceObject) {
        self.by_id.insert(obj.element_id, self.objects.len());
        self.objects.push(obj);
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
        self.by_id.clear();
    }

    pub fn objects(&self) -> &[SurfaceObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&SurfaceObject> {
        self.by_id.get(&id).map(|&i| &self.objects[i])
    }

    pub fn interactivity(&self, id: ElementId) -> Option<Interactivity> {
        self.get(id).map(|o| o.interactivity)
    }

    /// Returns `false` when `id` has no surface object.
    pub fn set_interactivity(&mut self, id: ElementId, flags: Interactivity) -> bool {
        match self.by_id.get(&id) {
            Some(&i) => {
                self.objects[i].interactivity = flags;
                true
            }
            None => false,
        }
    }

    /// Current flags of every object, for a later [`Self::restore_interactivity`].
    pub fn interactivity_snapshot(&self) -> Vec<(ElementId, Interactivity)> {
        self.objects
            .iter()
            .map(|o| (o.element_id, o.interactivity))
            .collect()
    }

    pub fn restore_interactivity(&mut self, snapshot: &[(ElementId, Interactivity)]) {
        for (id, flags) in snapshot {
            self.set_interactivity(*id, *flags);
        }
    }

    /// Topmost evented object under slide-space point `p`.
    pub fn hit_test(&self, p: Point) -> Option<ElementId> {
        self.objects
            .iter()
            .rev()
            .filter(|o| o.interactivity.evented)
            .find(|o| o.contains(p))
            .map(|o| o.element_id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;

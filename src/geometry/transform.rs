use crate::foundation::core::{Affine, BezPath, CanvasSize, Point, Rect, Vec2};
use crate::geometry::path::{clip_path, rounded_rect};
use crate::model::element::{ClipRegion, CornerRadius, CropData, Element, Geometry};

/// Scale factors that are zero or non-finite behave as 1.
pub fn sanitize_scale(s: f64) -> f64 {
    if s.is_finite() && s != 0.0 { s } else { 1.0 }
}

/// Frame of a group as seen by its children: center, scale and rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupFrame {
    pub center: Point,
    pub scale: Vec2,
    pub rotation_deg: f64,
}

impl GroupFrame {
    /// Frame of a group element placed at the top level of a slide.
    pub fn of(group: &Geometry) -> Self {
        let sx = sanitize_scale(group.scale_x);
        let sy = sanitize_scale(group.scale_y);
        Self {
            center: Point::new(
                group.x + group.width * sx / 2.0,
                group.y + group.height * sy / 2.0,
            ),
            scale: Vec2::new(sx, sy),
            rotation_deg: group.rotation_deg,
        }
    }

    /// `T(center) * R(theta) * S(sx, sy)`.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.center.to_vec2())
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale_non_uniform(sanitize_scale(self.scale.x), sanitize_scale(self.scale.y))
    }
}

/// Project a group-local offset to canvas coordinates: scale, then rotate, then translate.
pub fn project_group_child(offset: Point, group: &GroupFrame) -> Point {
    let rel_x = offset.x * sanitize_scale(group.scale.x);
    let rel_y = offset.y * sanitize_scale(group.scale.y);
    let (sin, cos) = group.rotation_deg.to_radians().sin_cos();
    let rot_x = rel_x * cos - rel_y * sin;
    let rot_y = rel_x * sin + rel_y * cos;
    Point::new(group.center.x + rot_x, group.center.y + rot_y)
}

/// Inverse of [`project_group_child`].
pub fn unproject_group_child(canvas: Point, group: &GroupFrame) -> Point {
    let dx = canvas.x - group.center.x;
    let dy = canvas.y - group.center.y;
    let (sin, cos) = group.rotation_deg.to_radians().sin_cos();
    let rel_x = dx * cos + dy * sin;
    let rel_y = -dx * sin + dy * cos;
    Point::new(
        rel_x / sanitize_scale(group.scale.x),
        rel_y / sanitize_scale(group.scale.y),
    )
}

/// Zoom/pan mapping from logical canvas coordinates to device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn to_device(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    pub fn from_device(&self, p: Point) -> Point {
        let z = if self.zoom.is_finite() && self.zoom != 0.0 {
            self.zoom
        } else {
            1.0
        };
        Point::new((p.x - self.pan.x) / z, (p.y - self.pan.y) / z)
    }

    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }
}

/// Uniform scale that fits `canvas` into a `width x height` container, centered.
pub fn fit_viewport(canvas: CanvasSize, width: f64, height: f64) -> Viewport {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let zoom = (width / cw).min(height / ch);
    if !zoom.is_finite() || zoom <= 0.0 {
        return Viewport::default();
    }
    Viewport {
        zoom,
        pan: Vec2::new((width - cw * zoom) / 2.0, (height - ch * zoom) / 2.0),
    }
}

/// Local content space to slide space for a top-level element.
///
/// Canonical order: `T(x,y) * T(c) * R * T(-c) * S`, where `c` is the center of the
/// scaled box.
pub fn element_affine(g: &Geometry) -> Affine {
    clip_frame_affine(g) * element_scale(g)
}

/// The `S` factor of [`element_affine`].
pub fn element_scale(g: &Geometry) -> Affine {
    Affine::scale_non_uniform(sanitize_scale(g.scale_x), sanitize_scale(g.scale_y))
}

/// Frame of element-relative clip regions: [`element_affine`] without the scale.
///
/// Clip offsets and sizes are canvas pixels from the element origin.
pub fn clip_frame_affine(g: &Geometry) -> Affine {
    let sx = sanitize_scale(g.scale_x);
    let sy = sanitize_scale(g.scale_y);
    let c = Vec2::new(g.width * sx / 2.0, g.height * sy / 2.0);
    Affine::translate(Vec2::new(g.x, g.y))
        * Affine::translate(c)
        * Affine::rotate(g.rotation_deg.to_radians())
        * Affine::translate(-c)
}

/// Outline of `clip` on element `g`, in the space `frame` maps into.
///
/// Absolute clips are returned as stored. Relative clips are placed with
/// [`clip_frame_affine`] and their stored radius is shown at the element's scale.
pub fn clip_outline(clip: &ClipRegion, g: &Geometry, frame: Affine) -> BezPath {
    if clip.absolute_positioned {
        return clip_path(clip);
    }
    let radius = display_radius(
        CornerRadius {
            rx: clip.rx,
            ry: clip.ry,
        },
        g,
    );
    frame
        * clip_frame_affine(g)
        * rounded_rect(clip.left, clip.top, clip.width, clip.height, radius)
}

/// Clip rectangle of a relative clip in the element's local content box.
pub fn clip_local_rect(clip: &ClipRegion, g: &Geometry) -> Rect {
    let rect = Rect::new(
        clip.left,
        clip.top,
        clip.left + clip.width,
        clip.top + clip.height,
    );
    element_scale(g).inverse().transform_rect_bbox(rect)
}

/// Covering relative clip for `g`: its whole visual box, no radius.
pub fn covering_clip(g: &Geometry) -> ClipRegion {
    let w = g.width * sanitize_scale(g.scale_x);
    let h = g.height * sanitize_scale(g.scale_y);
    ClipRegion {
        left: w.min(0.0),
        top: h.min(0.0),
        ..ClipRegion::covering(w.abs(), h.abs())
    }
}

/// Local content space to slide space for a child of `group`.
pub fn group_child_affine(group: &Geometry, child: &Geometry) -> Affine {
    GroupFrame::of(group).to_affine() * element_affine(child)
}

/// Axis-aligned slide-space bounds of an element.
pub fn element_bounds(affine: Affine, g: &Geometry) -> Rect {
    affine.transform_rect_bbox(Rect::new(0.0, 0.0, g.width, g.height))
}

/// Slide-space transform of a top-level element or group child.
pub fn world_affine(element: &Element, parent: Option<&Element>) -> Affine {
    match parent {
        Some(p) => group_child_affine(&p.geometry, &element.geometry),
        None => element_affine(&element.geometry),
    }
}

/// Convert a canvas-space crop rectangle into a clip region relative to the image origin.
pub fn crop_to_clip(crop: &CropData, image: &Geometry) -> ClipRegion {
    ClipRegion {
        left: crop.left - image.x,
        top: crop.top - image.y,
        width: crop.width,
        height: crop.height,
        rx: 0.0,
        ry: 0.0,
        absolute_positioned: false,
    }
}

/// Initial crop rectangle: 80% of `bounds`, centered.
pub fn initial_crop_rect(bounds: Rect) -> Rect {
    let w = bounds.width() * 0.8;
    let h = bounds.height() * 0.8;
    let c = bounds.center();
    Rect::new(c.x - w / 2.0, c.y - h / 2.0, c.x + w / 2.0, c.y + h / 2.0)
}

/// Radius entered in canvas pixels, stored per axis divided by the element scale.
pub fn stored_radius(entered: CornerRadius, g: &Geometry) -> CornerRadius {
    CornerRadius {
        rx: entered.rx / sanitize_scale(g.scale_x).abs(),
        ry: entered.ry / sanitize_scale(g.scale_y).abs(),
    }
}

/// Radius as displayed in canvas pixels at the element's current scale.
pub fn display_radius(stored: CornerRadius, g: &Geometry) -> CornerRadius {
    CornerRadius {
        rx: stored.rx * sanitize_scale(g.scale_x).abs(),
        ry: stored.ry * sanitize_scale(g.scale_y).abs(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;

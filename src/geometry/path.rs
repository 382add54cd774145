use crate::foundation::core::{BezPath, Point};
use crate::model::element::{ClipRegion, CornerRadius, ShapeKind};

/// Cubic control-point factor for a quarter ellipse.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// Axis-aligned rectangle at `(x, y)` with elliptical corners `(rx, ry)`.
///
/// Radii are clamped to half the side lengths.
pub fn rounded_rect(x: f64, y: f64, w: f64, h: f64, radius: CornerRadius) -> BezPath {
    let rx = radius.rx.clamp(0.0, (w / 2.0).max(0.0));
    let ry = radius.ry.clamp(0.0, (h / 2.0).max(0.0));
    let mut p = BezPath::new();
    if rx <= 0.0 || ry <= 0.0 {
        p.move_to((x, y));
        p.line_to((x + w, y));
        p.line_to((x + w, y + h));
        p.line_to((x, y + h));
        p.close_path();
        return p;
    }

    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let (r, b) = (x + w, y + h);
    p.move_to((x + rx, y));
    p.line_to((r - rx, y));
    p.curve_to((r - rx + kx, y), (r, y + ry - ky), (r, y + ry));
    p.line_to((r, b - ry));
    p.curve_to((r, b - ry + ky), (r - rx + kx, b), (r - rx, b));
    p.line_to((x + rx, b));
    p.curve_to((x + rx - kx, b), (x, b - ry + ky), (x, b - ry));
    p.line_to((x, y + ry));
    p.curve_to((x, y + ry - ky), (x + rx - kx, y), (x + rx, y));
    p.close_path();
    p
}

/// Ellipse inscribed in the `w x h` box at the origin.
pub fn ellipse(w: f64, h: f64) -> BezPath {
    rounded_rect(0.0, 0.0, w, h, CornerRadius { rx: w / 2.0, ry: h / 2.0 })
}

/// Isosceles triangle with its apex at the top center of the `w x h` box.
pub fn triangle(w: f64, h: f64) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(Point::new(w / 2.0, 0.0));
    p.line_to(Point::new(w, h));
    p.line_to(Point::new(0.0, h));
    p.close_path();
    p
}

/// Outline of a shape in its local content box.
pub fn shape_path(shape: &ShapeKind, w: f64, h: f64) -> BezPath {
    match shape {
        ShapeKind::Rect { radius } => rounded_rect(0.0, 0.0, w, h, *radius),
        ShapeKind::Ellipse => ellipse(w, h),
        ShapeKind::Triangle => triangle(w, h),
    }
}

/// Outline of a clip region in whatever space the region is expressed in.
pub fn clip_path(clip: &ClipRegion) -> BezPath {
    rounded_rect(
        clip.left,
        clip.top,
        clip.width,
        clip.height,
        CornerRadius {
            rx: clip.rx,
            ry: clip.ry,
        },
    )
}

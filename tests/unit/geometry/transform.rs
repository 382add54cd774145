use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn approx_pt(a: Point, b: Point) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y)
}

#[test]
fn projection_without_transform_is_a_translation() {
    let g = GroupFrame {
        center: Point::new(100.0, 50.0),
        scale: Vec2::new(1.0, 1.0),
        rotation_deg: 0.0,
    };
    assert!(approx_pt(
        project_group_child(Point::new(-10.0, 5.0), &g),
        Point::new(90.0, 55.0)
    ));
}

#[test]
fn projection_applies_scale_before_rotation() {
    let g = GroupFrame {
        center: Point::new(0.0, 0.0),
        scale: Vec2::new(2.0, 1.0),
        rotation_deg: 90.0,
    };
    // (1, 0) scaled to (2, 0), rotated 90deg to (0, 2).
    assert!(approx_pt(
        project_group_child(Point::new(1.0, 0.0), &g),
        Point::new(0.0, 2.0)
    ));
}

#[test]
fn projection_is_invertible() {
    let frames = [
        GroupFrame {
            center: Point::new(960.0, 540.0),
            scale: Vec2::new(1.5, 0.75),
            rotation_deg: 33.0,
        },
        GroupFrame {
            center: Point::new(-20.0, 7.5),
            scale: Vec2::new(-1.0, 2.0),
            rotation_deg: -270.0,
        },
    ];
    let offsets = [
        Point::new(0.0, 0.0),
        Point::new(-200.0, 130.0),
        Point::new(12.25, -0.5),
    ];
    for g in &frames {
        for &o in &offsets {
            let back = unproject_group_child(project_group_child(o, g), g);
            assert!((back.x - o.x).abs() < 1e-9 && (back.y - o.y).abs() < 1e-9);
        }
    }
}

#[test]
fn projection_matches_group_affine() {
    let geom = Geometry {
        x: 100.0,
        y: 200.0,
        width: 400.0,
        height: 300.0,
        scale_x: 1.25,
        scale_y: 0.5,
        rotation_deg: 15.0,
    };
    let frame = GroupFrame::of(&geom);
    let o = Point::new(-180.0, 40.0);
    assert!(approx_pt(project_group_child(o, &frame), frame.to_affine() * o));
}

#[test]
fn zero_scale_is_treated_as_one() {
    let g = GroupFrame {
        center: Point::ZERO,
        scale: Vec2::new(0.0, f64::NAN),
        rotation_deg: 0.0,
    };
    assert!(approx_pt(
        project_group_child(Point::new(3.0, 4.0), &g),
        Point::new(3.0, 4.0)
    ));
}

#[test]
fn viewport_round_trips() {
    let v = Viewport {
        zoom: 0.5,
        pan: Vec2::new(10.0, 20.0),
    };
    let p = Point::new(1920.0, 1080.0);
    assert!(approx_pt(v.to_device(p), Point::new(970.0, 560.0)));
    assert!(approx_pt(v.from_device(v.to_device(p)), p));
    assert!(approx_pt(v.to_affine() * p, v.to_device(p)));
}

#[test]
fn fit_letterboxes_wide_and_tall_containers() {
    let c = CanvasSize::default();
    let v = fit_viewport(c, 960.0, 1000.0);
    assert!(approx(v.zoom, 0.5));
    assert!(approx(v.pan.x, 0.0));
    assert!(approx(v.pan.y, (1000.0 - 540.0) / 2.0));

    let v = fit_viewport(c, 4000.0, 1080.0);
    assert!(approx(v.zoom, 1.0));
    assert!(approx(v.pan.x, (4000.0 - 1920.0) / 2.0));

    assert_eq!(fit_viewport(c, 0.0, 0.0), Viewport::default());
}

#[test]
fn element_affine_rotates_about_visual_center() {
    let g = Geometry {
        rotation_deg: 180.0,
        ..Geometry::rect(10.0, 20.0, 100.0, 50.0)
    };
    let a = element_affine(&g);
    // Top-left of the content box lands on the bottom-right after a half turn.
    assert!(approx_pt(a * Point::ZERO, Point::new(110.0, 70.0)));
    let b = element_bounds(a, &g);
    assert!(approx(b.x0, 10.0) && approx(b.y0, 20.0));
    assert!(approx(b.x1, 110.0) && approx(b.y1, 70.0));
}

#[test]
fn element_affine_scales_from_top_left() {
    let g = Geometry {
        scale_x: 2.0,
        scale_y: 3.0,
        ..Geometry::rect(5.0, 5.0, 10.0, 10.0)
    };
    let b = element_bounds(element_affine(&g), &g);
    assert!(approx(b.x0, 5.0) && approx(b.x1, 25.0) && approx(b.y1, 35.0));
}

#[test]
fn crop_to_clip_is_exact() {
    let image = Geometry::rect(123.456, 78.9, 640.0, 480.0);
    let crop = CropData {
        left: 200.125,
        top: 100.3,
        width: 300.0,
        height: 200.0,
    };
    let clip = crop_to_clip(&crop, &image);
    assert_eq!(clip.left, crop.left - image.x);
    assert_eq!(clip.top, crop.top - image.y);
    assert_eq!((clip.width, clip.height), (300.0, 200.0));
    assert!(!clip.absolute_positioned);
}

#[test]
fn initial_crop_is_centered_eighty_percent() {
    let r = initial_crop_rect(Rect::new(100.0, 100.0, 300.0, 200.0));
    assert!(approx(r.width(), 160.0) && approx(r.height(), 80.0));
    assert!(approx(r.x0, 120.0) && approx(r.y0, 110.0));
}

#[test]
fn radius_reads_back_what_was_entered() {
    for (sx, sy) in [(1.0, 1.0), (2.0, 0.5), (0.3, 7.0), (-1.5, 1.0)] {
        let g = Geometry {
            scale_x: sx,
            scale_y: sy,
            ..Geometry::rect(0.0, 0.0, 100.0, 100.0)
        };
        let entered = CornerRadius { rx: 24.0, ry: 12.0 };
        let shown = display_radius(stored_radius(entered, &g), &g);
        assert!(approx(shown.rx, 24.0) && approx(shown.ry, 12.0));
    }
}

#[test]
fn relative_clip_does_not_scale_with_the_element() {
    use kurbo::Shape;

    let g = Geometry {
        scale_x: 2.0,
        scale_y: 2.0,
        ..Geometry::rect(100.0, 100.0, 100.0, 100.0)
    };
    let crop = CropData {
        left: 120.0,
        top: 120.0,
        width: 160.0,
        height: 160.0,
    };
    let clip = crop_to_clip(&crop, &g);
    let b = clip_outline(&clip, &g, Affine::IDENTITY).bounding_box();
    assert!(approx(b.x0, 120.0) && approx(b.y0, 120.0));
    assert!(approx(b.x1, 280.0) && approx(b.y1, 280.0));

    let local = clip_local_rect(&clip, &g);
    assert!(approx(local.x0, 10.0) && approx(local.x1, 90.0));
    assert!(approx(local.y0, 10.0) && approx(local.y1, 90.0));
}

#[test]
fn covering_clip_matches_the_scaled_box() {
    let g = Geometry {
        scale_x: 2.0,
        scale_y: 0.5,
        ..Geometry::rect(0.0, 0.0, 100.0, 100.0)
    };
    let clip = covering_clip(&g);
    assert_eq!((clip.left, clip.top), (0.0, 0.0));
    assert_eq!((clip.width, clip.height), (200.0, 50.0));
    assert_eq!(clip_local_rect(&clip, &g), Rect::new(0.0, 0.0, 100.0, 100.0));
}

use super::*;
use crate::foundation::core::Rgba8;
use crate::model::element::{CornerRadius, ElementKind, FlexboxTextGroup, Geometry, TextStyle};
use crate::model::presentation::Presentation;

fn group_with_three() -> Element {
    let bg = Element::rect(
        Geometry::rect(-200.0, -150.0, 400.0, 300.0),
        Rgba8::rgb(30, 41, 59),
        CornerRadius::default(),
    );
    let mut children = vec![bg];
    for (i, label) in ["alpha", "beta", "gamma"].into_iter().enumerate() {
        children.push(Element::text(
            Geometry::rect(-180.0, -130.0 + 50.0 * i as f64, 360.0, 40.0),
            label,
            TextStyle::default(),
        ));
    }
    let group = FlexboxTextGroup {
        children,
        direction: Default::default(),
        gap: 10.0,
        padding: 20.0,
    };
    Element::new(
        Geometry::rect(100.0, 100.0, 400.0, 300.0),
        ElementKind::FlexboxTextGroup(group),
    )
}

fn presentation() -> (Presentation, ElementId, ElementId) {
    let mut slide = Slide::empty("/slides/001.tsx");
    slide.elements.push(Element::rect(
        Geometry::rect(0.0, 0.0, 1920.0, 1080.0),
        Rgba8::WHITE,
        CornerRadius::default(),
    ));
    slide.elements.push(group_with_three());
    let p = Presentation::new(vec![slide], Default::default());
    let s = p.slide(0).unwrap();
    (p.clone(), s.elements[0].id, s.elements[1].id)
}

#[test]
fn rebuild_skips_group_backgrounds() {
    let (p, _, gid) = presentation();
    let mut scene = SceneCache::default();
    scene.rebuild(p.slide(0).unwrap());

    assert_eq!(scene.len(), 5);
    let bg = p.element(gid).unwrap().group().unwrap().children[0].id;
    assert!(scene.get(bg).is_none());
    let first = p.element(gid).unwrap().group().unwrap().children[1].id;
    assert_eq!(scene.get(first).unwrap().parent, Some(gid));
    let b = scene.get(first).unwrap().bounds;
    assert!((b.x0 - 120.0).abs() < 1e-9 && (b.y0 - 120.0).abs() < 1e-9);
}

#[test]
fn hit_test_returns_topmost_evented_object() {
    let (p, page, gid) = presentation();
    let mut scene = SceneCache::default();
    scene.rebuild(p.slide(0).unwrap());
    let first = p.element(gid).unwrap().group().unwrap().children[1].id;

    assert_eq!(scene.hit_test(Point::new(130.0, 130.0)), Some(first));
    assert_eq!(scene.hit_test(Point::new(130.0, 300.0)), Some(gid));
    assert_eq!(scene.hit_test(Point::new(50.0, 50.0)), Some(page));

    scene.set_interactivity(first, Interactivity::LOCKED);
    assert_eq!(scene.hit_test(Point::new(130.0, 130.0)), Some(gid));
}

#[test]
fn hit_test_respects_rotation() {
    let mut slide = Slide::empty("/slides/001.tsx");
    let mut bar = Element::rect(
        Geometry::rect(0.0, 450.0, 1000.0, 100.0),
        Rgba8::BLACK,
        CornerRadius::default(),
    );
    bar.geometry.rotation_deg = 90.0;
    slide.elements.push(bar);
    let p = Presentation::new(vec![slide], Default::default());
    let mut scene = SceneCache::default();
    scene.rebuild(p.slide(0).unwrap());

    // Rotated about (500, 500): now a vertical bar spanning y 0..1000 at x 450..550.
    assert!(scene.hit_test(Point::new(500.0, 100.0)).is_some());
    assert!(scene.hit_test(Point::new(100.0, 500.0)).is_none());
}

#[test]
fn rebuild_preserves_interactivity_flags() {
    let (p, page, gid) = presentation();
    let mut scene = SceneCache::default();
    scene.rebuild(p.slide(0).unwrap());
    assert!(scene.set_interactivity(page, Interactivity::LOCKED));

    scene.rebuild(p.slide(0).unwrap());
    assert_eq!(scene.interactivity(page), Some(Interactivity::LOCKED));
    assert_eq!(scene.interactivity(gid), Some(Interactivity::ENABLED));
}

#[test]
fn snapshot_restores_every_flag() {
    let (p, page, gid) = presentation();
    let mut scene = SceneCache::default();
    scene.rebuild(p.slide(0).unwrap());
    scene.set_interactivity(gid, Interactivity::LOCKED);
    let snap = scene.interactivity_snapshot();

    for (id, _) in &snap {
        scene.set_interactivity(*id, Interactivity::LOCKED);
    }
    scene.restore_interactivity(&snap);
    assert_eq!(scene.interactivity(page), Some(Interactivity::ENABLED));
    assert_eq!(scene.interactivity(gid), Some(Interactivity::LOCKED));
}

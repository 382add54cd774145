use super::*;
use crate::model::element::{CornerRadius, Element, Geometry};

fn renderer() -> CanvasRenderer {
    CanvasRenderer::new(
        CanvasSize::default(),
        TextPainter::new(),
        Rgba8::rgb(200, 200, 200),
        3,
    )
}

fn deck() -> Presentation {
    let mut a = Slide::empty("/slides/001.tsx");
    a.elements.push(Element::rect(
        Geometry::rect(0.0, 0.0, 1920.0, 1080.0),
        Rgba8::rgb(255, 0, 0),
        CornerRadius::default(),
    ));
    let b = Slide::empty("/slides/002.tsx");
    Presentation::new(vec![a, b], Default::default())
}

fn handle(width: u32, height: u32) -> SurfaceHandle {
    SurfaceHandle {
        id: 1,
        width,
        height,
    }
}

#[test]
fn detached_renderer_produces_nothing() {
    let mut r = renderer();
    let p = deck();
    assert_eq!(
        r.render(&p, &AssetStore::default(), &[]).unwrap(),
        RenderOutcome::Detached
    );
}

#[test]
fn sync_rebuilds_only_on_change() {
    let mut r = renderer();
    let mut p = deck();
    r.initialize(handle(192, 108));

    assert!(r.sync(&mut p, 0));
    assert!(!r.sync(&mut p, 0));
    assert_eq!(r.scene().len(), 1);

    let id = p.slide(0).unwrap().elements[0].id;
    p.set_geometry(id, Geometry::rect(0.0, 0.0, 10.0, 10.0)).unwrap();
    assert!(r.sync(&mut p, 0));
    assert!(r.sync(&mut p, 1));
    assert_eq!(r.scene().len(), 0);
    assert_eq!(r.shown(), Some(1));
}

#[test]
fn ready_renderer_paints_the_shown_slide() {
    let mut r = renderer();
    let mut p = deck();
    r.initialize(handle(192, 108));
    r.sync(&mut p, 0);

    let out = r.render(&p, &AssetStore::default(), &[]).unwrap();
    let RenderOutcome::Frame(frame) = out else {
        panic!("expected a frame, got {out:?}");
    };
    assert_eq!((frame.width, frame.height), (192, 108));
    let px = frame.pixel(96, 54).unwrap();
    assert!(px[0] > 250 && px[1] < 5);
}

#[test]
fn failed_surface_renders_placeholder() {
    let mut r = renderer();
    let mut p = deck();
    assert_eq!(
        r.initialize(handle(0, 0)),
        SurfaceState::Pending { attempts: 1 }
    );
    r.sync(&mut p, 0);
    let out = r.render(&p, &AssetStore::default(), &[]).unwrap();
    assert!(matches!(out, RenderOutcome::Placeholder(_)));

    r.resize(192, 108);
    let out = r.render(&p, &AssetStore::default(), &[]).unwrap();
    assert!(matches!(out, RenderOutcome::Frame(_)));
}

#[test]
fn hit_test_maps_device_points_through_the_viewport() {
    let mut r = renderer();
    let mut p = deck();
    r.initialize(handle(192, 108));
    r.sync(&mut p, 0);

    let id = p.slide(0).unwrap().elements[0].id;
    assert_eq!(r.hit_test(Point::new(10.0, 10.0)), Some(id));
}

#[test]
fn dispose_clears_scene_and_liveness() {
    let mut r = renderer();
    let mut p = deck();
    r.initialize(handle(192, 108));
    r.sync(&mut p, 0);
    let token = r.liveness();

    r.dispose();
    assert!(!r.is_live(token));
    assert!(r.scene().is_empty());
    assert_eq!(r.shown(), None);
    assert!(r.viewport().is_none());
}

use super::*;
use crate::foundation::core::Rgba8;
use crate::model::element::{Element, Geometry, TextStyle};
use crate::model::slide::Slide;

fn deck() -> (Presentation, ElementId, ElementId) {
    let mut rect = Element::rect(
        Geometry::rect(100.0, 100.0, 200.0, 200.0),
        Rgba8::BLACK,
        CornerRadius::default(),
    );
    rect.geometry.scale_x = 2.0;
    rect.geometry.scale_y = 0.5;
    let text = Element::text(
        Geometry::rect(0.0, 0.0, 300.0, 40.0),
        "caption",
        TextStyle::default(),
    );
    let mut slide = Slide::empty("/slides/001.tsx");
    slide.elements = vec![rect, text];
    let p = Presentation::new(vec![slide], Default::default());
    let s = p.slide(0).unwrap();
    let (r, t) = (s.elements[0].id, s.elements[1].id);
    (p, r, t)
}

#[test]
fn entered_radius_reads_back_under_scale() {
    let (mut p, rect, _) = deck();
    let entered = CornerRadius::uniform(20.0);

    assert_eq!(write_radius(&mut p, rect, entered).unwrap(), EditOutcome::Applied);
    assert_eq!(
        p.corner_radius(rect),
        Some(CornerRadius { rx: 10.0, ry: 40.0 })
    );
    assert_eq!(read_radius(&p, rect), Some(entered));
}

#[test]
fn text_elements_report_unsupported_without_mutating() {
    let (mut p, _, text) = deck();
    let out = write_radius(&mut p, text, CornerRadius::uniform(8.0)).unwrap();
    assert!(matches!(out, EditOutcome::Unsupported(u) if u.kind == "text"));
    assert!(!p.is_dirty(0));
    assert!(read_radius(&p, text).is_none());

    let mut editor = RadiusEditor::default();
    assert_eq!(editor.begin(&mut p, text).unwrap(), None);
    assert_eq!(editor.phase(), GesturePhase::Idle);
}

#[test]
fn cancel_restores_the_original_radius() {
    let (mut p, rect, _) = deck();
    let mut editor = RadiusEditor::default();
    assert_eq!(
        editor.begin(&mut p, rect).unwrap(),
        Some(CornerRadius::default())
    );

    editor.preview(&mut p, CornerRadius::uniform(30.0)).unwrap();
    assert_eq!(read_radius(&p, rect), Some(CornerRadius::uniform(30.0)));
    assert_eq!(editor.cancel(&mut p).unwrap(), GesturePhase::Cancelled);
    assert_eq!(p.corner_radius(rect), Some(CornerRadius::default()));
}

#[test]
fn commit_ends_the_gesture() {
    let (mut p, rect, _) = deck();
    let mut editor = RadiusEditor::default();
    editor.begin(&mut p, rect).unwrap();
    assert_eq!(editor.phase(), GesturePhase::Dragging);

    editor.commit(&mut p, CornerRadius::uniform(12.0)).unwrap();
    assert_eq!(editor.phase(), GesturePhase::Idle);
    assert_eq!(read_radius(&p, rect), Some(CornerRadius::uniform(12.0)));
    assert_eq!(editor.cancel(&mut p).unwrap(), GesturePhase::Idle);
}

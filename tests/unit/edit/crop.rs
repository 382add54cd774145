use super::*;
use crate::foundation::core::Rgba8;
use crate::model::element::{CornerRadius, Element, Geometry};
use crate::model::slide::Slide;

fn deck() -> (Presentation, SceneCache, ElementId, ElementId, ElementId) {
    let mut slide = Slide::empty("/slides/001.tsx");
    slide.elements.push(Element::rect(
        Geometry::rect(0.0, 0.0, 1920.0, 1080.0),
        Rgba8::WHITE,
        CornerRadius::default(),
    ));
    slide.elements.push(Element::image(
        Geometry::rect(200.0, 100.0, 800.0, 600.0),
        "photo.png",
    ));
    slide.elements.push(Element::rect(
        Geometry::rect(1200.0, 100.0, 300.0, 300.0),
        Rgba8::BLACK,
        CornerRadius::default(),
    ));
    let p = Presentation::new(vec![slide], Default::default());
    let mut scene = SceneCache::default();
    scene.rebuild(p.slide(0).unwrap());
    let ids: Vec<ElementId> = p.slide(0).unwrap().elements.iter().map(|e| e.id).collect();
    (p, scene, ids[0], ids[1], ids[2])
}

#[test]
fn enter_places_rect_at_eighty_percent_and_locks_everything() {
    let (p, mut scene, page, img, square) = deck();
    let mut crop = CropEditor::default();

    let rect = crop.enter(&p, &mut scene, img).unwrap();
    assert_eq!(rect, Rect::new(280.0, 160.0, 920.0, 640.0));
    assert_eq!(crop.phase(), GesturePhase::Dragging);
    for id in [page, img, square] {
        assert_eq!(scene.interactivity(id), Some(Interactivity::LOCKED));
    }
    assert_eq!(crop.overlay(), Some(Overlay::CropRect(rect)));
}

#[test]
fn apply_converts_canvas_crop_to_local_clip() {
    let (mut p, mut scene, page, img, _) = deck();
    let mut crop = CropEditor::default();
    crop.enter(&p, &mut scene, img).unwrap();
    crop.set_rect(Rect::new(250.0, 130.0, 650.0, 430.0)).unwrap();

    assert_eq!(crop.apply(&mut p, &mut scene).unwrap(), EditOutcome::Applied);
    let clip = p.element(img).unwrap().clip.unwrap();
    assert_eq!(clip.left, 250.0 - 200.0);
    assert_eq!(clip.top, 130.0 - 100.0);
    assert_eq!((clip.width, clip.height), (400.0, 300.0));
    assert!(!clip.absolute_positioned);
    assert!(p.is_dirty(0));
    assert_eq!(scene.interactivity(page), Some(Interactivity::ENABLED));
    assert_eq!(crop.phase(), GesturePhase::Idle);
}

#[test]
fn cancel_restores_sibling_interactivity_exactly() {
    let (p, mut scene, page, img, square) = deck();
    scene.set_interactivity(square, Interactivity::LOCKED);
    let before = scene.interactivity_snapshot();

    let mut crop = CropEditor::default();
    crop.enter(&p, &mut scene, img).unwrap();
    assert_eq!(crop.cancel(&mut scene), GesturePhase::Cancelled);

    assert_eq!(scene.interactivity_snapshot(), before);
    assert_eq!(scene.interactivity(page), Some(Interactivity::ENABLED));
    assert!(!p.is_dirty(0));
    assert!(p.element(img).unwrap().clip.is_none());
}

#[test]
fn reentering_cancels_the_previous_session_first() {
    let (p, mut scene, page, img, _) = deck();
    let before = scene.interactivity_snapshot();
    let mut crop = CropEditor::default();
    crop.enter(&p, &mut scene, img).unwrap();
    crop.enter(&p, &mut scene, img).unwrap();

    crop.cancel(&mut scene);
    assert_eq!(scene.interactivity_snapshot(), before);
    assert_eq!(scene.interactivity(page), Some(Interactivity::ENABLED));
}

#[test]
fn absolute_clips_stay_absolute_and_keep_their_radius() {
    let (mut p, mut scene, _, img, _) = deck();
    p.set_clip_region(
        img,
        Some(ClipRegion {
            left: 200.0,
            top: 100.0,
            width: 800.0,
            height: 600.0,
            rx: 12.0,
            ry: 12.0,
            absolute_positioned: true,
        }),
    )
    .unwrap();

    let mut crop = CropEditor::default();
    crop.enter(&p, &mut scene, img).unwrap();
    crop.set_rect(Rect::new(300.0, 200.0, 500.0, 400.0)).unwrap();
    crop.apply(&mut p, &mut scene).unwrap();

    let clip = p.element(img).unwrap().clip.unwrap();
    assert!(clip.absolute_positioned);
    assert_eq!((clip.left, clip.top), (300.0, 200.0));
    assert_eq!(clip.rx, 12.0);
}

#[test]
fn only_images_can_be_cropped() {
    let (p, mut scene, page, _, _) = deck();
    let mut crop = CropEditor::default();
    assert!(crop.enter(&p, &mut scene, page).is_err());
    assert_eq!(scene.interactivity(page), Some(Interactivity::ENABLED));
    assert!(crop.set_rect(Rect::new(0.0, 0.0, 1.0, 1.0)).is_err());
}

use super::*;

fn handle(width: u32, height: u32) -> SurfaceHandle {
    SurfaceHandle {
        id: 7,
        width,
        height,
    }
}

#[test]
fn attach_is_idempotent() {
    let mut s = Surface::new(3);
    assert_eq!(s.state(), SurfaceState::Detached);

    assert_eq!(s.attach(handle(960, 540), CanvasSize::default()), SurfaceState::Ready);
    let token = s.generation();
    assert_eq!(s.attach(handle(960, 540), CanvasSize::default()), SurfaceState::Ready);
    assert_eq!(s.generation(), token);
    assert!((s.target().unwrap().viewport.zoom - 0.5).abs() < 1e-12);
}

#[test]
fn zero_sized_container_retries_then_degrades() {
    let mut s = Surface::new(3);
    let canvas = CanvasSize::default();

    assert_eq!(
        s.attach(handle(0, 0), canvas),
        SurfaceState::Pending { attempts: 1 }
    );
    assert_eq!(s.resize(0, 400, canvas), SurfaceState::Pending { attempts: 2 });
    assert_eq!(s.resize(0, 400, canvas), SurfaceState::Placeholder);
    assert_eq!(s.resize(800, 450, canvas), SurfaceState::Placeholder);
}

#[test]
fn pending_surface_recovers_on_a_valid_resize() {
    let mut s = Surface::new(3);
    let canvas = CanvasSize::default();
    s.attach(handle(0, 0), canvas);

    assert_eq!(s.resize(1920, 1080, canvas), SurfaceState::Ready);
    assert!((s.target().unwrap().viewport.zoom - 1.0).abs() < 1e-12);
}

#[test]
fn resize_refits_without_reattaching() {
    let mut s = Surface::new(3);
    let canvas = CanvasSize::default();
    s.attach(handle(1920, 1080), canvas);
    let token = s.generation();

    s.resize(1000, 1000, canvas);
    let target = s.target().unwrap();
    assert_eq!((target.width, target.height), (1000, 1000));
    assert!((target.viewport.pan.y - (1000.0 - 1080.0 * 1000.0 / 1920.0) / 2.0).abs() < 1e-9);
    assert_eq!(s.generation(), token);
    assert_eq!(s.handle().unwrap().width, 1000);
}

#[test]
fn dispose_invalidates_liveness() {
    let mut s = Surface::new(3);
    s.attach(handle(800, 450), CanvasSize::default());
    let token = s.generation();
    assert!(s.is_live(token));

    s.dispose();
    assert!(!s.is_live(token));
    assert_eq!(s.state(), SurfaceState::Detached);
    assert!(s.target().is_none());

    s.attach(handle(800, 450), CanvasSize::default());
    assert!(!s.is_live(token));
    assert!(s.is_live(s.generation()));
}

#[test]
fn oversized_containers_are_rejected() {
    assert!(create_target(CanvasSize::default(), 70_000, 10).is_err());
    assert!(create_target(CanvasSize::default(), 10, 0).is_err());
    assert!(create_target(CanvasSize::default(), 10, 10).is_ok());
}

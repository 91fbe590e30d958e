use super::*;
use crate::assets::resolve::DEFAULT_ASSET_ROUTE;
use crate::foundation::core::PixelSize;
use crate::gesture::input::Modifiers;

struct Fixture {
    store: OverlayStore,
    canvas: CanvasGeometry,
    aspects: AspectRatioCache,
    ctl: GestureController,
}

const ORIGIN: Vec2 = Vec2::new(400.0, 300.0);

fn screen(p: Point) -> Point {
    p + ORIGIN
}

impl Fixture {
    fn new() -> Self {
        let canvas = CanvasGeometry::new(
            PixelSize::new(800, 600).unwrap(),
            Size::new(800.0, 600.0),
            Point::new(400.0, 300.0),
        )
        .unwrap();
        Self {
            store: OverlayStore::new(),
            canvas,
            aspects: AspectRatioCache::new(),
            ctl: GestureController::default(),
        }
    }

    /// Image overlay whose unscaled box is exactly 800x600.
    fn add_image(&mut self, scale: f64) -> OverlayId {
        let id = self.store.add(OverlayKind::Image, "a.png");
        let o = self.store.get(id).unwrap().clone();
        self.aspects
            .register(&o, DEFAULT_ASSET_ROUTE, Some(4.0 / 3.0));
        if scale != 1.0 {
            self.store.update(
                id,
                &OverlayPatch {
                    scale: Some(scale),
                    ..OverlayPatch::default()
                },
            );
        }
        id
    }

    fn down(&mut self, p: Point) -> bool {
        let view = SceneView {
            canvas: &self.canvas,
            aspects: &self.aspects,
        };
        self.ctl
            .pointer_down(&mut self.store, &view, &MouseInput::primary(screen(p)))
    }

    fn mv(&mut self, p: Point, modifiers: Modifiers) -> bool {
        self.ctl
            .pointer_move(&MouseInput::primary(screen(p)).with_modifiers(modifiers))
    }

    fn tick(&mut self) -> bool {
        let view = SceneView {
            canvas: &self.canvas,
            aspects: &self.aspects,
        };
        self.ctl.frame_tick(&mut self.store, &view)
    }

    fn up(&mut self) -> bool {
        let view = SceneView {
            canvas: &self.canvas,
            aspects: &self.aspects,
        };
        self.ctl.pointer_up(&mut self.store, &view)
    }

    fn touch_start(&mut self, pts: &[(i64, f64, f64)]) -> bool {
        let view = SceneView {
            canvas: &self.canvas,
            aspects: &self.aspects,
        };
        let t = TouchInput::from_points(&shift_points(pts));
        self.ctl.touch_start(&mut self.store, &view, &t)
    }

    fn touch_move(&mut self, pts: &[(i64, f64, f64)]) -> bool {
        self.ctl.touch_move(&TouchInput::from_points(&shift_points(pts)))
    }

    fn touch_end(&mut self, pts: &[(i64, f64, f64)]) -> bool {
        let view = SceneView {
            canvas: &self.canvas,
            aspects: &self.aspects,
        };
        let t = TouchInput::from_points(&shift_points(pts));
        self.ctl.touch_end(&mut self.store, &view, &t)
    }

    fn key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        self.ctl
            .key_down(&mut self.store, &KeyInput::new(key, modifiers))
    }

    fn overlay(&self, id: OverlayId) -> &Overlay {
        self.store.get(id).unwrap()
    }
}

fn shift_points(pts: &[(i64, f64, f64)]) -> Vec<(i64, f64, f64)> {
    pts.iter()
        .map(|&(id, x, y)| (id, x + ORIGIN.x, y + ORIGIN.y))
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn drag_coalesces_moves_and_snaps() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);

    assert!(f.down(Point::ZERO));
    assert!(matches!(f.ctl.interaction(), Interaction::Dragging { .. }));

    f.mv(Point::new(50.0, 40.0), Modifiers::NONE);
    f.mv(Point::new(95.0, 40.0), Modifiers::NONE);
    assert!(f.ctl.session().unwrap().has_pending_move());
    assert!(f.tick());
    assert_eq!(f.overlay(id).position(), Point::new(95.0, 40.0));
    assert!(f.ctl.active_guides().is_empty());
    assert!(!f.tick());

    f.mv(Point::new(5.0, 3.0), Modifiers::NONE);
    f.tick();
    assert_eq!(f.overlay(id).position(), Point::ZERO);
    let guides = f.ctl.active_guides();
    assert_eq!(guides.vertical, Some(0.0));
    assert_eq!(guides.horizontal, Some(0.0));

    assert!(f.up());
    assert!(f.ctl.interaction().is_idle());
    assert!(f.ctl.active_guides().is_empty());
    assert!(f.ctl.session().is_none());
}

#[test]
fn release_flushes_last_move() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);
    f.down(Point::ZERO);
    f.mv(Point::new(-60.0, 70.0), Modifiers::NONE);
    f.up();
    assert_eq!(f.overlay(id).position(), Point::new(-60.0, 70.0));
}

#[test]
fn press_on_empty_canvas_clears_selection() {
    let mut f = Fixture::new();
    f.add_image(0.1);
    assert!(f.store.selected().is_some());
    assert!(f.down(Point::new(300.0, 250.0)));
    assert_eq!(f.store.selected(), None);
    assert!(f.ctl.interaction().is_idle());
}

#[test]
fn click_without_motion_leaves_no_undo_step() {
    let mut f = Fixture::new();
    f.add_image(0.5);
    let before = f.store.history_len();
    f.down(Point::ZERO);
    f.up();
    assert_eq!(f.store.history_len(), before);
}

#[test]
fn gesture_is_one_undo_step() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);
    let before = f.store.history_len();
    f.down(Point::ZERO);
    for i in 1..=5 {
        f.mv(Point::new(f64::from(i) * 20.0, 50.0), Modifiers::NONE);
        f.tick();
    }
    f.up();
    assert_eq!(f.store.history_len(), before + 1);
    assert!(f.store.undo());
    assert_eq!(f.overlay(id).position(), Point::ZERO);
}

#[test]
fn corner_resize_keeps_opposite_corner_fixed() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);
    f.store.update(id, &OverlayPatch::rotation(30.0));
    let unscaled = Size::new(800.0, 600.0);

    let handle = corner_world(Point::ZERO, unscaled, 0.5, 30.0, Corner::BottomRight);
    let anchor = corner_world(Point::ZERO, unscaled, 0.5, 30.0, Corner::TopLeft);
    assert!(f.down(handle));
    assert!(matches!(
        f.ctl.interaction(),
        Interaction::Resizing {
            corner: Corner::BottomRight,
            ..
        }
    ));

    let target = anchor + (handle - anchor) * 1.5;
    f.mv(target, Modifiers::NONE);
    f.tick();
    let o = f.overlay(id).clone();
    assert!(approx(o.scale, 0.75));
    let after = corner_world(o.position(), unscaled, o.scale, o.rotation, Corner::TopLeft);
    assert!((after - anchor).hypot() < 1e-9);
    f.up();
}

#[test]
fn rotate_handle_follows_pointer_and_snaps_with_shift() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);
    assert!(f.down(Point::new(0.0, -180.0)));
    assert!(matches!(f.ctl.interaction(), Interaction::Rotating { .. }));

    f.mv(Point::new(100.0, 8.0), Modifiers::NONE);
    f.tick();
    let free = f.overlay(id).rotation;
    assert!(free > 94.0 && free < 95.0);

    f.mv(Point::new(100.0, 8.0), Modifiers::shift());
    f.tick();
    assert!(approx(f.overlay(id).rotation, 90.0));
    f.up();
}

#[test]
fn two_finger_pinch_scales_and_rotates() {
    let mut f = Fixture::new();
    let id = f.add_image(1.0);
    assert!(f.touch_start(&[(1, 0.0, 0.0), (2, 100.0, 0.0)]));
    assert!(matches!(f.ctl.interaction(), Interaction::Pinching { .. }));

    let (s, c) = 30f64.to_radians().sin_cos();
    f.touch_move(&[(1, 0.0, 0.0), (2, 200.0 * c, 200.0 * s)]);
    f.tick();
    let o = f.overlay(id);
    assert!((o.scale - 2.0).abs() < 1e-9);
    assert!((o.rotation - 30.0).abs() < 1e-9);

    assert!(f.touch_end(&[(1, 0.0, 0.0)]));
    assert!(f.ctl.interaction().is_idle());
}

#[test]
fn second_finger_turns_drag_into_pinch() {
    let mut f = Fixture::new();
    let id = f.add_image(1.0);
    assert!(f.touch_start(&[(1, 0.0, 0.0)]));
    assert!(matches!(f.ctl.interaction(), Interaction::Dragging { .. }));
    f.touch_move(&[(1, 40.0, 0.0)]);

    // The drag step still queued when the second finger lands is applied, not dropped.
    assert!(f.touch_start(&[(1, 40.0, 0.0), (2, 90.0, 0.0)]));
    assert!(matches!(f.ctl.interaction(), Interaction::Pinching { .. }));
    assert_eq!(f.ctl.session().unwrap().pointer_ids(), &[1, 2]);
    assert!(!f.ctl.session().unwrap().has_pending_move());
    assert_eq!(f.overlay(id).position(), Point::new(40.0, 0.0));

    f.touch_move(&[(1, 40.0, 0.0), (2, 140.0, 0.0)]);
    f.tick();
    assert!((f.overlay(id).scale - 2.0).abs() < 1e-9);
    assert_eq!(f.overlay(id).position(), Point::new(40.0, 0.0));

    assert!(!f.touch_end(&[(1, 40.0, 0.0), (2, 140.0, 0.0)]));
    assert!(f.touch_end(&[(2, 140.0, 0.0)]));
    assert!(f.ctl.interaction().is_idle());
}

#[test]
fn drag_step_survives_a_pinch_that_ends_immediately() {
    let mut f = Fixture::new();
    let id = f.add_image(1.0);
    assert!(f.touch_start(&[(1, 0.0, 0.0)]));
    f.touch_move(&[(1, 40.0, 0.0)]);
    assert!(f.touch_start(&[(1, 40.0, 0.0), (2, 90.0, 0.0)]));
    assert!(f.touch_end(&[]));

    assert!(f.ctl.interaction().is_idle());
    assert_eq!(f.overlay(id).position(), Point::new(40.0, 0.0));
}

#[test]
fn pinch_needs_both_fingers_on_one_overlay() {
    let mut f = Fixture::new();
    f.add_image(0.1);
    assert!(!f.touch_start(&[(1, 0.0, 0.0), (2, 300.0, 250.0)]));
    assert!(f.ctl.interaction().is_idle());
}

#[test]
fn escape_restores_pre_gesture_values() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);
    let before = f.store.history_len();
    f.down(Point::ZERO);
    f.mv(Point::new(120.0, -30.0), Modifiers::NONE);
    f.tick();
    assert_eq!(f.overlay(id).x, 120.0);

    assert!(f.key("Escape", Modifiers::NONE));
    assert!(f.ctl.interaction().is_idle());
    assert_eq!(f.overlay(id).position(), Point::ZERO);
    assert_eq!(f.store.history_len(), before);
    assert!(!f.key("Escape", Modifiers::NONE));
}

#[test]
fn wheel_scales_or_rotates_selected() {
    let mut f = Fixture::new();
    let id = f.add_image(1.0);
    let tick = |delta_y, modifiers| WheelInput { delta_y, modifiers };

    assert!(f.ctl.wheel(&mut f.store, &tick(-100.0, Modifiers::NONE)));
    assert!(approx(f.overlay(id).scale, 1.05));
    f.ctl.wheel(&mut f.store, &tick(100.0, Modifiers::NONE));
    assert!(approx(f.overlay(id).scale, 1.0));

    f.ctl.wheel(&mut f.store, &tick(-3.0, Modifiers::alt()));
    assert!(approx(f.overlay(id).rotation, 355.0));
    f.ctl.wheel(&mut f.store, &tick(3.0, Modifiers::alt()));
    assert!(approx(f.overlay(id).rotation, 0.0));

    assert!(!f.ctl.wheel(&mut f.store, &tick(0.0, Modifiers::NONE)));
}

#[test]
fn keyboard_nudges_deletes_and_undoes() {
    let mut f = Fixture::new();
    let id = f.add_image(0.5);

    f.key("ArrowRight", Modifiers::NONE);
    f.key("ArrowDown", Modifiers::shift());
    assert_eq!(f.overlay(id).position(), Point::new(1.0, 10.0));

    assert!(f.key("Delete", Modifiers::NONE));
    assert!(f.store.get(id).is_none());

    let undo = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    assert!(f.key("z", undo));
    assert_eq!(f.overlay(id).position(), Point::new(1.0, 10.0));
}

#[test]
fn peek_keys_hide_overlays_until_release() {
    let mut f = Fixture::new();
    f.add_image(0.5);
    assert!(f.key(" ", Modifiers::NONE));
    assert!(f.ctl.overlays_hidden());
    assert!(!f.key("\\", Modifiers::NONE));
    assert!(!f.down(Point::ZERO));

    assert!(f.ctl.key_up(&KeyInput::new("\\", Modifiers::NONE)));
    assert!(!f.ctl.overlays_hidden());
    assert!(f.down(Point::ZERO));
}

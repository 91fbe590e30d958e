use smallvec::SmallVec;

use crate::assets::store::AspectRatioCache;
use crate::foundation::core::{Point, Size, Vec2};
use crate::foundation::math::{SCALE_MAX, SCALE_MIN, clamp_scale_to, normalize_degrees};
use crate::geometry::canvas::CanvasGeometry;
use crate::geometry::kernel::{
    AnchoredScaleInput, Corner, compute_cover_box, corner_world, resolve_anchored_scale,
    resolve_rotation, rotate_point,
};
use crate::gesture::handles::{
    DEFAULT_HANDLE_RADIUS, DEFAULT_ROTATE_HANDLE_OFFSET, Handle, HandleLayout, hit_overlay,
};
use crate::gesture::input::{
    Key, KeyInput, MouseInput, PinchMetrics, PointerSample, TouchInput, WheelInput,
};
use crate::gesture::throttle::FrameThrottle;
use crate::scene::model::{Overlay, OverlayId, OverlayKind, OverlayPatch};
use crate::snap::{SnapGuides, SnapResolver};
use crate::store::overlay_store::OverlayStore;

/// Tunables for pointer, wheel and keyboard handling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    pub snap: SnapResolver,
    pub rotate_handle_offset: f64,
    pub handle_radius: f64,
    /// Arrow-key step in display pixels.
    pub nudge_step: f64,
    /// Arrow-key step with shift held.
    pub nudge_step_large: f64,
    /// Scale change per wheel tick.
    pub wheel_scale_step: f64,
    /// Rotation change per wheel tick with alt held, in degrees.
    pub wheel_rotation_step: f64,
    pub scale_min: f64,
    pub scale_max: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            snap: SnapResolver::default(),
            rotate_handle_offset: DEFAULT_ROTATE_HANDLE_OFFSET,
            handle_radius: DEFAULT_HANDLE_RADIUS,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            wheel_scale_step: 0.05,
            wheel_rotation_step: 5.0,
            scale_min: SCALE_MIN,
            scale_max: SCALE_MAX,
        }
    }
}

/// Layout the controller reads but does not own.
#[derive(Clone, Copy, Debug)]
pub struct SceneView<'a> {
    pub canvas: &'a CanvasGeometry,
    pub aspects: &'a AspectRatioCache,
}

impl SceneView<'_> {
    /// Unscaled cover box of `overlay` in display pixels.
    pub fn unscaled(&self, overlay: &Overlay) -> Size {
        let display = self.canvas.display_size();
        let aspect = match overlay.kind {
            OverlayKind::Image => self.aspects.get(overlay.id),
            OverlayKind::Flat => None,
        };
        compute_cover_box(aspect, display.width, display.height)
    }
}

/// The single active interaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging {
        id: OverlayId,
        start_pointer: Point,
        start_pos: Point,
    },
    Resizing {
        id: OverlayId,
        corner: Corner,
        anchor: Point,
        start_pointer: Point,
        start_scale: f64,
        unscaled: Size,
    },
    Rotating {
        id: OverlayId,
        center: Point,
    },
    Pinching {
        id: OverlayId,
        start_distance: f64,
        start_angle: f64,
        start_scale: f64,
        start_rotation: f64,
    },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// Overlay being manipulated.
    pub fn overlay_id(&self) -> Option<OverlayId> {
        match self {
            Interaction::Idle => None,
            Interaction::Dragging { id, .. }
            | Interaction::Resizing { id, .. }
            | Interaction::Rotating { id, .. }
            | Interaction::Pinching { id, .. } => Some(*id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Dragging { .. } => "dragging",
            Interaction::Resizing { .. } => "resizing",
            Interaction::Rotating { .. } => "rotating",
            Interaction::Pinching { .. } => "pinching",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PendingMove {
    /// Primary pointer in screen space.
    Pointer { position: Point, shift: bool },
    Pinch(PinchMetrics),
}

/// Resources held for the duration of one gesture.
#[derive(Clone, Debug)]
pub struct InputSession {
    pointer_ids: SmallVec<[i64; 2]>,
    snapshot: Overlay,
    throttle: FrameThrottle<PendingMove>,
}

impl InputSession {
    /// Pointer ids captured by the gesture.
    pub fn pointer_ids(&self) -> &[i64] {
        &self.pointer_ids
    }

    /// Overlay state before the gesture started.
    pub fn snapshot(&self) -> &Overlay {
        &self.snapshot
    }

    pub fn has_pending_move(&self) -> bool {
        self.throttle.has_pending()
    }
}

/// Drives overlay edits from normalized pointer, touch, wheel and key input.
#[derive(Clone, Debug, Default)]
pub struct GestureController {
    config: GestureConfig,
    interaction: Interaction,
    session: Option<InputSession>,
    guides: SnapGuides,
    overlays_hidden: bool,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn session(&self) -> Option<&InputSession> {
        self.session.as_ref()
    }

    /// Snap guides of the current drag; empty when no drag is snapped.
    pub fn active_guides(&self) -> SnapGuides {
        self.guides
    }

    /// `true` while a peek key (Space or `\`) is held.
    pub fn overlays_hidden(&self) -> bool {
        self.overlays_hidden
    }

    // --- Entry and exit ---

    fn start_session(
        &mut self,
        store: &mut OverlayStore,
        id: OverlayId,
        pointer_ids: SmallVec<[i64; 2]>,
    ) -> Option<Overlay> {
        let snapshot = store.get(id)?.clone();
        store.checkpoint();
        store.select(Some(id));
        self.session = Some(InputSession {
            pointer_ids,
            snapshot: snapshot.clone(),
            throttle: FrameThrottle::new(),
        });
        Some(snapshot)
    }

    fn begin_drag(
        &mut self,
        store: &mut OverlayStore,
        id: OverlayId,
        pointer: Point,
        pointer_ids: SmallVec<[i64; 2]>,
    ) -> bool {
        let Some(start_pos) = self
            .start_session(store, id, pointer_ids)
            .map(|o| o.position())
        else {
            return false;
        };
        self.interaction = Interaction::Dragging {
            id,
            start_pointer: pointer,
            start_pos,
        };
        tracing::debug!(overlay = %id, "drag started");
        true
    }

    fn begin_resize(
        &mut self,
        store: &mut OverlayStore,
        view: &SceneView<'_>,
        id: OverlayId,
        corner: Corner,
        pointer: Point,
        pointer_ids: SmallVec<[i64; 2]>,
    ) -> bool {
        let Some(o) = self.start_session(store, id, pointer_ids) else {
            return false;
        };
        let unscaled = view.unscaled(&o);
        let anchor = corner_world(
            o.position(),
            unscaled,
            o.scale,
            o.rotation,
            corner.opposite(),
        );
        self.interaction = Interaction::Resizing {
            id,
            corner,
            anchor,
            start_pointer: pointer,
            start_scale: o.scale,
            unscaled,
        };
        tracing::debug!(overlay = %id, ?corner, "resize started");
        true
    }

    fn begin_rotate(
        &mut self,
        store: &mut OverlayStore,
        id: OverlayId,
        pointer_ids: SmallVec<[i64; 2]>,
    ) -> bool {
        let Some(center) = self
            .start_session(store, id, pointer_ids)
            .map(|o| o.position())
        else {
            return false;
        };
        self.interaction = Interaction::Rotating { id, center };
        tracing::debug!(overlay = %id, "rotate started");
        true
    }

    fn begin_pinch(
        &mut self,
        store: &mut OverlayStore,
        id: OverlayId,
        metrics: PinchMetrics,
        pointer_ids: SmallVec<[i64; 2]>,
    ) -> bool {
        let Some(o) = self.start_session(store, id, pointer_ids) else {
            return false;
        };
        self.enter_pinch(&o, metrics);
        true
    }

    fn enter_pinch(&mut self, o: &Overlay, metrics: PinchMetrics) {
        self.guides = SnapGuides::default();
        self.interaction = Interaction::Pinching {
            id: o.id,
            start_distance: metrics.distance,
            start_angle: metrics.angle_deg,
            start_scale: o.scale,
            start_rotation: o.rotation,
        };
        tracing::debug!(overlay = %o.id, "pinch started");
    }

    /// Commit the active gesture and return to idle.
    ///
    /// A gesture that left its overlay untouched gives its undo step back.
    pub fn end_interaction(&mut self, store: &mut OverlayStore) -> bool {
        let prev = std::mem::take(&mut self.interaction);
        self.guides = SnapGuides::default();
        let session = self.session.take();
        let Some(id) = prev.overlay_id() else {
            return false;
        };
        if let Some(session) = session
            && store.get(id) == Some(&session.snapshot)
        {
            store.discard_checkpoint();
        }
        tracing::debug!(overlay = %id, gesture = prev.name(), "gesture ended");
        true
    }

    /// Abort the active gesture and put the overlay back as it was before it started.
    pub fn cancel_interaction(&mut self, store: &mut OverlayStore) -> bool {
        let prev = std::mem::take(&mut self.interaction);
        self.guides = SnapGuides::default();
        let Some(session) = self.session.take() else {
            return false;
        };
        if store.restore_overlay(session.snapshot) {
            store.discard_checkpoint();
        }
        tracing::debug!(gesture = prev.name(), "gesture cancelled");
        true
    }

    // --- Pointer ---

    /// Primary-button press. Hits handles of the selected overlay first, then the topmost
    /// overlay; a press on empty canvas clears the selection.
    pub fn pointer_down(
        &mut self,
        store: &mut OverlayStore,
        view: &SceneView<'_>,
        input: &MouseInput,
    ) -> bool {
        if input.button != 0 {
            return false;
        }
        self.press(store, view, &PointerSample::from(input))
    }

    fn press(
        &mut self,
        store: &mut OverlayStore,
        view: &SceneView<'_>,
        sample: &PointerSample,
    ) -> bool {
        if !self.interaction.is_idle() || self.overlays_hidden {
            return false;
        }
        let p = view.canvas.screen_to_canvas(sample.position);
        let ids = sample.pointer_ids.clone();

        if let Some(sel) = store.selected_overlay() {
            let layout =
                HandleLayout::for_overlay(sel, view.unscaled(sel), self.config.rotate_handle_offset);
            let id = sel.id;
            match layout.hit(p, self.config.handle_radius) {
                Some(Handle::Rotate) => return self.begin_rotate(store, id, ids),
                Some(Handle::Corner(c)) => return self.begin_resize(store, view, id, c, p, ids),
                None => {}
            }
        }

        match hit_overlay(store.overlays().iter(), p, |o| view.unscaled(o)) {
            Some(id) => self.begin_drag(store, id, p, ids),
            None => {
                let had = store.selected().is_some();
                store.select(None);
                had
            }
        }
    }

    /// Queue a pointer move for the next frame tick.
    pub fn pointer_move(&mut self, input: &MouseInput) -> bool {
        self.queue(PendingMove::Pointer {
            position: input.position,
            shift: input.modifiers.shift,
        })
    }

    fn queue(&mut self, m: PendingMove) -> bool {
        match self.session.as_mut() {
            Some(s) => {
                s.throttle.push(m);
                true
            }
            None => false,
        }
    }

    /// Apply the newest queued move, if any. Call once per display frame.
    pub fn frame_tick(&mut self, store: &mut OverlayStore, view: &SceneView<'_>) -> bool {
        let Some(m) = self.session.as_mut().and_then(|s| s.throttle.flush()) else {
            return false;
        };
        self.apply_move(store, view, m)
    }

    /// Flush the last move and commit.
    pub fn pointer_up(&mut self, store: &mut OverlayStore, view: &SceneView<'_>) -> bool {
        if self.interaction.is_idle() {
            return false;
        }
        self.frame_tick(store, view);
        self.end_interaction(store)
    }

    /// The host lost the pointer (e.g. `pointercancel`); ends the gesture like a release.
    pub fn pointer_cancel(&mut self, store: &mut OverlayStore, view: &SceneView<'_>) -> bool {
        self.pointer_up(store, view)
    }

    fn apply_move(
        &mut self,
        store: &mut OverlayStore,
        view: &SceneView<'_>,
        m: PendingMove,
    ) -> bool {
        let cfg = self.config;
        match (self.interaction.clone(), m) {
            (
                Interaction::Dragging {
                    id,
                    start_pointer,
                    start_pos,
                },
                PendingMove::Pointer { position, .. },
            ) => {
                let Some(o) = store.get(id) else {
                    return false;
                };
                let p = view.canvas.screen_to_canvas(position);
                let target = start_pos + (p - start_pointer);
                let u = view.unscaled(o);
                let rendered = Size::new(u.width * o.scale, u.height * o.scale);
                let canvas = view.canvas.display_size();
                let snap = cfg.snap.resolve(target, rendered, canvas);
                self.guides = snap.guides(canvas);
                store.apply_transient(id, &OverlayPatch::position(snap.position))
            }
            (
                Interaction::Resizing {
                    id,
                    corner,
                    anchor,
                    start_pointer,
                    start_scale,
                    unscaled,
                },
                PendingMove::Pointer { position, .. },
            ) => {
                let Some(rotation) = store.get(id).map(|o| o.rotation) else {
                    return false;
                };
                let offset = corner.opposite().local_offset(unscaled);
                let input = AnchoredScaleInput {
                    start_pointer,
                    current_pointer: view.canvas.screen_to_canvas(position),
                    anchor,
                    start_scale,
                    rotation_deg: rotation,
                    unscaled,
                    anchor_offset: offset,
                };
                let Some(r) = resolve_anchored_scale(&input) else {
                    return false;
                };
                let scale = clamp_scale_to(r.scale, cfg.scale_min, cfg.scale_max);
                let center = if scale == r.scale {
                    r.center
                } else {
                    anchor - rotate_point(offset.x * scale, offset.y * scale, rotation).to_vec2()
                };
                store.apply_transient(id, &OverlayPatch::scale_at(scale, center))
            }
            (Interaction::Rotating { id, center }, PendingMove::Pointer { position, shift }) => {
                let p = view.canvas.screen_to_canvas(position);
                let deg = resolve_rotation(p, center, shift);
                store.apply_transient(id, &OverlayPatch::rotation(deg))
            }
            (
                Interaction::Pinching {
                    id,
                    start_distance,
                    start_angle,
                    start_scale,
                    start_rotation,
                },
                PendingMove::Pinch(m),
            ) => {
                if !(start_distance > 0.0 && m.distance.is_finite()) {
                    return false;
                }
                let scale = clamp_scale_to(
                    start_scale * m.distance / start_distance,
                    cfg.scale_min,
                    cfg.scale_max,
                );
                let rotation = normalize_degrees(start_rotation + (m.angle_deg - start_angle));
                let patch = OverlayPatch {
                    scale: Some(scale),
                    rotation: Some(rotation),
                    ..OverlayPatch::default()
                };
                store.apply_transient(id, &patch)
            }
            _ => false,
        }
    }

    // --- Touch ---

    /// `touchstart` with every touch now on the surface.
    ///
    /// One finger behaves like a press. Two fingers on the same overlay start a pinch; a second
    /// finger during a drag turns the drag into a pinch.
    pub fn touch_start(
        &mut self,
        store: &mut OverlayStore,
        view: &SceneView<'_>,
        touches: &TouchInput,
    ) -> bool {
        let Some(sample) = PointerSample::from_touches(touches) else {
            return false;
        };
        let Some(m) = touches.pinch_metrics() else {
            return self.press(store, view, &sample);
        };
        match self.interaction {
            Interaction::Idle => {
                if self.overlays_hidden {
                    return false;
                }
                let hits: SmallVec<[Option<OverlayId>; 2]> = touches
                    .touches
                    .iter()
                    .take(2)
                    .map(|t| {
                        let p = view.canvas.screen_to_canvas(t.position);
                        hit_overlay(store.overlays().iter(), p, |o| view.unscaled(o))
                    })
                    .collect();
                match hits.as_slice() {
                    [Some(a), Some(b)] if a == b => {
                        let id = *a;
                        self.begin_pinch(store, id, m, sample.pointer_ids)
                    }
                    _ => false,
                }
            }
            Interaction::Dragging { id, .. } => {
                let pending = match self.session.as_mut() {
                    Some(s) => {
                        s.pointer_ids = sample.pointer_ids;
                        s.throttle.flush()
                    }
                    None => None,
                };
                // The queued drag step lands before the pinch takes over.
                if let Some(m @ PendingMove::Pointer { .. }) = pending {
                    self.apply_move(store, view, m);
                }
                let Some(o) = store.get(id).cloned() else {
                    return false;
                };
                self.enter_pinch(&o, m);
                true
            }
            _ => false,
        }
    }

    /// `touchmove`; only the active gesture's shape of input is queued.
    pub fn touch_move(&mut self, touches: &TouchInput) -> bool {
        match self.interaction {
            Interaction::Idle => false,
            Interaction::Pinching { .. } => match touches.pinch_metrics() {
                Some(m) => self.queue(PendingMove::Pinch(m)),
                None => false,
            },
            _ => {
                let captured = self
                    .session
                    .as_ref()
                    .and_then(|s| s.pointer_ids.first().copied());
                let touch = touches
                    .touches
                    .iter()
                    .find(|t| Some(t.id) == captured)
                    .or_else(|| touches.touches.first());
                match touch {
                    Some(t) => self.queue(PendingMove::Pointer {
                        position: t.position,
                        shift: false,
                    }),
                    None => false,
                }
            }
        }
    }

    /// `touchend` with the touches that remain. A pinch ends once fewer than two fingers are
    /// down; other gestures end when the last finger lifts.
    pub fn touch_end(
        &mut self,
        store: &mut OverlayStore,
        view: &SceneView<'_>,
        remaining: &TouchInput,
    ) -> bool {
        let done = match self.interaction {
            Interaction::Idle => false,
            Interaction::Pinching { .. } => remaining.len() < 2,
            _ => remaining.is_empty(),
        };
        if !done {
            return false;
        }
        self.frame_tick(store, view);
        self.end_interaction(store)
    }

    /// `touchcancel`; ends any active gesture.
    pub fn touch_cancel(&mut self, store: &mut OverlayStore, view: &SceneView<'_>) -> bool {
        self.pointer_up(store, view)
    }

    // --- Wheel and keyboard ---

    /// One wheel tick on the selected overlay: scale, or rotation with alt.
    pub fn wheel(&mut self, store: &mut OverlayStore, input: &WheelInput) -> bool {
        if !self.interaction.is_idle() || !input.delta_y.is_finite() || input.delta_y == 0.0 {
            return false;
        }
        let Some(o) = store.selected_overlay() else {
            return false;
        };
        let dir = input.delta_y.signum();
        let patch = if input.modifiers.alt {
            OverlayPatch::rotation(o.rotation + dir * self.config.wheel_rotation_step)
        } else {
            OverlayPatch {
                scale: Some(clamp_scale_to(
                    o.scale - dir * self.config.wheel_scale_step,
                    self.config.scale_min,
                    self.config.scale_max,
                )),
                ..OverlayPatch::default()
            }
        };
        let id = o.id;
        store.update(id, &patch)
    }

    pub fn key_down(&mut self, store: &mut OverlayStore, input: &KeyInput) -> bool {
        let key = input.key();
        let mods = input.modifiers;
        if key.is_peek() {
            let changed = !self.overlays_hidden;
            self.overlays_hidden = true;
            return changed;
        }
        if key == Key::Escape {
            return self.cancel_interaction(store);
        }
        if !self.interaction.is_idle() {
            return false;
        }
        match key {
            Key::Char('z') if mods.command() && !mods.shift => store.undo(),
            Key::Delete | Key::Backspace => match store.selected() {
                Some(id) => store.remove(id),
                None => false,
            },
            Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown => {
                let Some(o) = store.selected_overlay() else {
                    return false;
                };
                let step = if mods.shift {
                    self.config.nudge_step_large
                } else {
                    self.config.nudge_step
                };
                let delta = match key {
                    Key::ArrowLeft => Vec2::new(-step, 0.0),
                    Key::ArrowRight => Vec2::new(step, 0.0),
                    Key::ArrowUp => Vec2::new(0.0, -step),
                    _ => Vec2::new(0.0, step),
                };
                let id = o.id;
                let to = o.position() + delta;
                store.update(id, &OverlayPatch::position(to))
            }
            _ => false,
        }
    }

    pub fn key_up(&mut self, input: &KeyInput) -> bool {
        if input.key().is_peek() && self.overlays_hidden {
            self.overlays_hidden = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gesture/controller.rs"]
mod tests;

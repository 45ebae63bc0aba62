//! Touch input classification.
//!
//! The router tracks one gesture at a time:
//!
//! ```text
//! Idle --down--> Tracking --up / cancel--> Idle
//! ```
//!
//! A pointer-down is forwarded to the native instance right away. Motion only
//! counts as scrolling once the pointer moved further than the touch slop from
//! where it went down; from then on every motion sample scrolls the viewport by
//! the distance since the previous sample. Releasing without having scrolled is
//! a tap and sends the matching pointer-up.

use crate::bridge::config::BridgeConfig;
use crate::bridge::native_bridge::NativeBridge;
use crate::bridge::viewport::{ScrollDelta, ViewportController};
use std::time::Duration;

/// Raw pointer input in surface-local coordinates. `time` is the event
/// timestamp on any monotonic clock, as long as a gesture uses the same one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32, time: Duration },
    Move { x: f32, y: f32, time: Duration },
    Up { x: f32, y: f32, time: Duration },
    Cancel,
}

/// Gestures surfaced to the UI layer. Coordinates are in content space.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Tap { x: i32, y: i32 },
    Scroll { delta: ScrollDelta },
    LongPress { x: i32, y: i32 },
    /// Velocity in pixels per second, in the direction the finger moved
    Fling { velocity_x: f32, velocity_y: f32 },
    Cancelled,
}

/// Last known state of the pointer during a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingInput {
    pub down_x: f32,
    pub down_y: f32,
    pub down_time: Duration,
    pub last_x: f32,
    pub last_y: f32,
    pub last_time: Duration,
    velocity: (f32, f32),
    scrolling: bool,
    long_pressed: bool,
}

impl PendingInput {
    fn new(x: f32, y: f32, time: Duration) -> Self {
        Self {
            down_x: x,
            down_y: y,
            down_time: time,
            last_x: x,
            last_y: y,
            last_time: time,
            velocity: (0.0, 0.0),
            scrolling: false,
            long_pressed: false,
        }
    }

    fn displacement(&self, x: f32, y: f32) -> f32 {
        (x - self.down_x).hypot(y - self.down_y)
    }

    /// Record a new sample and return the scroll delta since the previous one.
    /// Deltas are taken between rounded positions so they never drift.
    fn advance(&mut self, x: f32, y: f32, time: Duration) -> (i32, i32) {
        let dt = time.saturating_sub(self.last_time).as_secs_f32();
        if dt > 0.0 {
            self.velocity = ((x - self.last_x) / dt, (y - self.last_y) / dt);
        }

        // Moving the finger up drags the page up, which scrolls further down.
        let dx = self.last_x.round() as i32 - x.round() as i32;
        let dy = self.last_y.round() as i32 - y.round() as i32;

        self.last_x = x;
        self.last_y = y;
        self.last_time = time;
        (dx, dy)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Tracking(PendingInput),
}

#[derive(Debug, Clone)]
pub struct GestureRouter {
    state: GestureState,
    touch_slop: f32,
    long_press_timeout: Duration,
    min_fling_velocity: f32,
}

impl GestureRouter {
    pub fn new(touch_slop: u32, long_press_timeout: Duration, min_fling_velocity: f32) -> Self {
        Self {
            state: GestureState::Idle,
            touch_slop: touch_slop as f32,
            long_press_timeout,
            min_fling_velocity,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.touch_slop, config.long_press_timeout(), config.min_fling_velocity)
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_scrolling(&self) -> bool {
        matches!(self.state, GestureState::Tracking(p) if p.scrolling)
    }

    /// Drop any in-flight gesture without telling the native instance.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Feed one pointer event through the state machine.
    pub fn route(
        &mut self,
        event: PointerEvent,
        viewport: &mut ViewportController,
        bridge: &NativeBridge,
    ) -> Option<GestureEvent> {
        match event {
            PointerEvent::Down { x, y, time } => {
                if matches!(self.state, GestureState::Tracking(_)) {
                    log::debug!("Pointer down while tracking, restarting gesture");
                }
                self.state = GestureState::Tracking(PendingInput::new(x, y, time));

                let (cx, cy) = viewport.to_content_coordinates(x.round() as i32, y.round() as i32);
                bridge.set_mouse_down(cx, cy);
                None
            }

            PointerEvent::Move { x, y, time } => {
                let GestureState::Tracking(pending) = &mut self.state else {
                    return None;
                };

                if pending.long_pressed {
                    return None;
                }

                if !pending.scrolling {
                    if pending.displacement(x, y) <= self.touch_slop {
                        if time.saturating_sub(pending.down_time) >= self.long_press_timeout {
                            pending.long_pressed = true;
                            let (cx, cy) = viewport.to_content_coordinates(
                                pending.down_x.round() as i32,
                                pending.down_y.round() as i32,
                            );
                            return Some(GestureEvent::LongPress { x: cx, y: cy });
                        }
                        return None;
                    }
                    pending.scrolling = true;
                }

                let (dx, dy) = pending.advance(x, y, time);
                let delta = viewport.scroll_by(dx, dy);
                if !delta.is_noop() {
                    bridge.set_viewport_geometry(viewport.geometry());
                }
                Some(GestureEvent::Scroll { delta })
            }

            PointerEvent::Up { x, y, time } => {
                let GestureState::Tracking(mut pending) = std::mem::take(&mut self.state) else {
                    return None;
                };

                if pending.long_pressed {
                    return None;
                }

                if pending.scrolling {
                    // Motion since the last sample still counts.
                    let (dx, dy) = pending.advance(x, y, time);
                    if !viewport.scroll_by(dx, dy).is_noop() {
                        bridge.set_viewport_geometry(viewport.geometry());
                    }

                    let (vx, vy) = pending.velocity;
                    if vx.hypot(vy) >= self.min_fling_velocity && (vx != 0.0 || vy != 0.0) {
                        return Some(GestureEvent::Fling {
                            velocity_x: vx,
                            velocity_y: vy,
                        });
                    }
                    return None;
                }

                if time.saturating_sub(pending.down_time) >= self.long_press_timeout {
                    let (cx, cy) =
                        viewport.to_content_coordinates(pending.down_x.round() as i32, pending.down_y.round() as i32);
                    return Some(GestureEvent::LongPress { x: cx, y: cy });
                }

                let (cx, cy) = viewport.to_content_coordinates(x.round() as i32, y.round() as i32);
                bridge.set_mouse_up(cx, cy);
                Some(GestureEvent::Tap { x: cx, y: cy })
            }

            PointerEvent::Cancel => match std::mem::take(&mut self.state) {
                GestureState::Tracking(_) => Some(GestureEvent::Cancelled),
                GestureState::Idle => None,
            },
        }
    }

    /// Report a long-press for a pointer that is held still without new motion
    /// samples. Hosts call this from a timer.
    pub fn check_long_press(&mut self, now: Duration, viewport: &ViewportController) -> Option<GestureEvent> {
        let GestureState::Tracking(pending) = &mut self.state else {
            return None;
        };

        if pending.scrolling || pending.long_pressed {
            return None;
        }
        if now.saturating_sub(pending.down_time) < self.long_press_timeout {
            return None;
        }

        pending.long_pressed = true;
        let (cx, cy) = viewport.to_content_coordinates(pending.down_x.round() as i32, pending.down_y.round() as i32);
        Some(GestureEvent::LongPress { x: cx, y: cy })
    }
}

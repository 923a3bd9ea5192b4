//! Input state management for pointer/keyboard events.
//!
//! Hosts feed raw events in, call [`InputState::begin_frame`] once per tick,
//! and hand the editor an [`InputFrame`] snapshot. The editor never sees raw
//! events.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// The two gesture buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureButton {
    /// Edit gestures (conventionally the left mouse button).
    Primary,
    /// Construction gestures (conventionally the right mouse button).
    Secondary,
}

/// Keys the editor core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKey {
    Delete,
    Escape,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The selection-toggle modifier.
    pub fn toggle_select(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: GestureButton,
    },
    Up {
        position: Point,
        button: GestureButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Keyboard event type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(EditKey),
    Released(EditKey),
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Per-frame edge/level state of one gesture button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonFrame {
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

/// Everything the editor consumes in one tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InputFrame {
    /// Pointer position in world coordinates.
    pub pointer: Point,
    /// Pointer movement since the previous frame.
    pub pointer_delta: Vec2,
    pub primary: ButtonFrame,
    pub secondary: ButtonFrame,
    /// Delete key edge.
    pub delete: bool,
    /// Escape key edge.
    pub escape: bool,
    /// Accumulated scroll delta for this frame.
    pub scroll: Vec2,
    pub modifiers: Modifiers,
    /// A primary button-down this frame closed a double-click.
    pub double_click: bool,
}

/// Tracks input state across frames and produces [`InputFrame`] snapshots.
#[derive(Debug, Clone)]
pub struct InputState {
    /// Current pointer position in world coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    pressed_buttons: HashSet<GestureButton>,
    just_pressed_buttons: HashSet<GestureButton>,
    just_released_buttons: HashSet<GestureButton>,
    pub modifiers: Modifiers,
    /// Accumulated scroll delta since last frame.
    pub scroll_delta: Vec2,
    pressed_keys: HashSet<EditKey>,
    just_pressed_keys: HashSet<EditKey>,
    last_click_time: Option<Instant>,
    last_click_position: Option<Point>,
    double_click_detected: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pointer_position: Point::ZERO,
            previous_pointer_position: Point::ZERO,
            pressed_buttons: HashSet::new(),
            just_pressed_buttons: HashSet::new(),
            just_released_buttons: HashSet::new(),
            modifiers: Modifiers::default(),
            scroll_delta: Vec2::ZERO,
            pressed_keys: HashSet::new(),
            just_pressed_keys: HashSet::new(),
            last_click_time: None,
            last_click_position: None,
            double_click_detected: false,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.just_pressed_buttons.clear();
        self.just_released_buttons.clear();
        self.just_pressed_keys.clear();
        self.scroll_delta = Vec2::ZERO;
        self.previous_pointer_position = self.pointer_position;
        self.double_click_detected = false;
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                if self.pressed_buttons.insert(button) {
                    self.just_pressed_buttons.insert(button);
                }
                if button == GestureButton::Primary {
                    self.detect_double_click(position);
                }
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                if self.pressed_buttons.remove(&button) {
                    self.just_released_buttons.insert(button);
                }
            }
            PointerEvent::Move { position } => {
                self.pointer_position = position;
            }
            PointerEvent::Scroll { position, delta } => {
                self.pointer_position = position;
                self.scroll_delta += delta;
            }
        }
    }

    fn detect_double_click(&mut self, position: Point) {
        let now = Instant::now();
        let close_pair = match (self.last_click_time, self.last_click_position) {
            (Some(last_time), Some(last_pos)) => {
                now.duration_since(last_time).as_millis() < DOUBLE_CLICK_TIME_MS
                    && (position - last_pos).hypot() < DOUBLE_CLICK_DISTANCE
            }
            _ => false,
        };
        if close_pair {
            self.double_click_detected = true;
            // Reset so a triple-click is not a second double-click.
            self.last_click_time = None;
            self.last_click_position = None;
        } else {
            self.last_click_time = Some(now);
            self.last_click_position = Some(position);
        }
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Pressed(key) => {
                if self.pressed_keys.insert(key) {
                    self.just_pressed_keys.insert(key);
                }
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_button_pressed(&self, button: GestureButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_button_just_pressed(&self, button: GestureButton) -> bool {
        self.just_pressed_buttons.contains(&button)
    }

    pub fn is_button_just_released(&self, button: GestureButton) -> bool {
        self.just_released_buttons.contains(&button)
    }

    pub fn is_key_just_pressed(&self, key: EditKey) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }

    /// Pointer movement delta since last frame.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    fn button_frame(&self, button: GestureButton) -> ButtonFrame {
        ButtonFrame {
            pressed: self.is_button_pressed(button),
            just_pressed: self.is_button_just_pressed(button),
            just_released: self.is_button_just_released(button),
        }
    }

    /// Snapshot the current frame for the editor.
    pub fn frame(&self) -> InputFrame {
        InputFrame {
            pointer: self.pointer_position,
            pointer_delta: self.pointer_delta(),
            primary: self.button_frame(GestureButton::Primary),
            secondary: self.button_frame(GestureButton::Secondary),
            delete: self.is_key_just_pressed(EditKey::Delete),
            escape: self.is_key_just_pressed(EditKey::Escape),
            scroll: self.scroll_delta,
            modifiers: self.modifiers,
            double_click: self.double_click_detected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_edges() {
        let mut input = InputState::new();

        input.handle_pointer_event(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: GestureButton::Primary,
        });
        assert!(input.is_button_pressed(GestureButton::Primary));
        assert!(input.is_button_just_pressed(GestureButton::Primary));
        assert!(!input.is_button_pressed(GestureButton::Secondary));

        input.begin_frame();
        assert!(input.is_button_pressed(GestureButton::Primary));
        assert!(!input.is_button_just_pressed(GestureButton::Primary));

        input.handle_pointer_event(PointerEvent::Up {
            position: Point::new(100.0, 100.0),
            button: GestureButton::Primary,
        });
        assert!(!input.is_button_pressed(GestureButton::Primary));
        assert!(input.is_button_just_released(GestureButton::Primary));
    }

    #[test]
    fn test_key_edges() {
        let mut input = InputState::new();

        input.handle_key_event(KeyEvent::Pressed(EditKey::Escape));
        assert!(input.is_key_just_pressed(EditKey::Escape));
        assert!(input.frame().escape);

        input.begin_frame();
        assert!(!input.is_key_just_pressed(EditKey::Escape));
    }

    #[test]
    fn test_scroll_accumulates_and_clears() {
        let mut input = InputState::new();

        input.handle_pointer_event(PointerEvent::Scroll {
            position: Point::new(100.0, 100.0),
            delta: Vec2::new(0.0, 10.0),
        });
        input.handle_pointer_event(PointerEvent::Scroll {
            position: Point::new(100.0, 100.0),
            delta: Vec2::new(0.0, 5.0),
        });
        assert!((input.scroll_delta.y - 15.0).abs() < f64::EPSILON);

        input.begin_frame();
        assert!(input.scroll_delta.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        let pos = Point::new(100.0, 100.0);

        input.handle_pointer_event(PointerEvent::Down {
            position: pos,
            button: GestureButton::Primary,
        });
        assert!(!input.is_double_click());
        input.handle_pointer_event(PointerEvent::Up {
            position: pos,
            button: GestureButton::Primary,
        });
        input.begin_frame();

        input.handle_pointer_event(PointerEvent::Down {
            position: pos,
            button: GestureButton::Primary,
        });
        assert!(input.is_double_click());
        assert!(input.frame().double_click);

        input.begin_frame();
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_double_click_too_far() {
        let mut input = InputState::new();

        input.handle_pointer_event(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: GestureButton::Primary,
        });
        input.handle_pointer_event(PointerEvent::Up {
            position: Point::new(100.0, 100.0),
            button: GestureButton::Primary,
        });
        input.begin_frame();

        input.handle_pointer_event(PointerEvent::Down {
            position: Point::new(200.0, 200.0),
            button: GestureButton::Primary,
        });
        assert!(!input.is_double_click());
    }

    #[test]
    fn test_frame_snapshot_pointer_delta() {
        let mut input = InputState::new();
        input.handle_pointer_event(PointerEvent::Move {
            position: Point::new(10.0, 0.0),
        });
        input.begin_frame();
        input.handle_pointer_event(PointerEvent::Move {
            position: Point::new(15.0, 5.0),
        });

        let frame = input.frame();
        assert!((frame.pointer_delta.x - 5.0).abs() < f64::EPSILON);
        assert!((frame.pointer_delta.y - 5.0).abs() < f64::EPSILON);
    }
}

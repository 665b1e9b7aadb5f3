//! Keyboard mapping for the explorer.
//!
//! Movement and LOD keys are level triggered: they act for as long as they are
//! held. Power, snapshot and exit keys are edge triggered and act once per
//! press; key repeat is ignored.

use fractal::{InputState, MoveKeys};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputController {
    movement: MoveKeys,
    lod_up: bool,
    lod_down: bool,
    power_step: f32,
    snapshot: bool,
    exit: bool,
}

impl InputController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one key event. Returns whether the key is bound.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState, repeat: bool) -> bool {
        let pressed = state == ElementState::Pressed;
        let edge = pressed && !repeat;
        match key {
            KeyCode::KeyW => self.movement.forward = pressed,
            KeyCode::KeyS => self.movement.backward = pressed,
            KeyCode::KeyA => self.movement.left = pressed,
            KeyCode::KeyD => self.movement.right = pressed,
            KeyCode::KeyQ => self.lod_up = pressed,
            KeyCode::KeyE => self.lod_down = pressed,
            KeyCode::Digit3 => {
                if edge {
                    self.power_step -= 1.0;
                }
            }
            KeyCode::Digit4 => {
                if edge {
                    self.power_step += 1.0;
                }
            }
            KeyCode::KeyP => self.snapshot |= edge,
            KeyCode::Escape => self.exit |= edge,
            _ => return false,
        }
        true
    }

    /// Releases every held key, e.g. when focus is lost.
    pub fn release_all(&mut self) {
        self.movement = MoveKeys::default();
        self.lod_up = false;
        self.lod_down = false;
    }

    #[must_use]
    pub fn input_state(&self) -> InputState {
        InputState {
            movement: self.movement,
            lod_up: self.lod_up,
            lod_down: self.lod_down,
        }
    }

    /// Accumulated power change since the last call.
    pub fn take_power_step(&mut self) -> Option<f32> {
        let step = std::mem::take(&mut self.power_step);
        (step != 0.0).then_some(step)
    }

    pub fn take_snapshot_request(&mut self) -> bool {
        std::mem::take(&mut self.snapshot)
    }

    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_are_level_triggered() {
        let mut c = InputController::new();
        assert!(c.process_keyboard(KeyCode::KeyW, ElementState::Pressed, false));
        assert!(c.process_keyboard(KeyCode::KeyW, ElementState::Pressed, true));
        assert!(c.input_state().movement.forward);
        c.process_keyboard(KeyCode::KeyW, ElementState::Released, false);
        assert!(!c.input_state().movement.forward);
    }

    #[test]
    fn q_raises_and_e_lowers_lod() {
        let mut c = InputController::new();
        c.process_keyboard(KeyCode::KeyQ, ElementState::Pressed, false);
        assert!(c.input_state().lod_up);
        assert!(!c.input_state().lod_down);
        c.process_keyboard(KeyCode::KeyE, ElementState::Pressed, false);
        assert!(c.input_state().lod_down);
    }

    #[test]
    fn power_keys_ignore_repeat() {
        let mut c = InputController::new();
        c.process_keyboard(KeyCode::Digit4, ElementState::Pressed, false);
        c.process_keyboard(KeyCode::Digit4, ElementState::Pressed, true);
        c.process_keyboard(KeyCode::Digit4, ElementState::Pressed, true);
        assert_eq!(c.take_power_step(), Some(1.0));
        assert_eq!(c.take_power_step(), None);

        c.process_keyboard(KeyCode::Digit3, ElementState::Pressed, false);
        c.process_keyboard(KeyCode::Digit3, ElementState::Released, false);
        c.process_keyboard(KeyCode::Digit3, ElementState::Pressed, false);
        assert_eq!(c.take_power_step(), Some(-2.0));
    }

    #[test]
    fn snapshot_and_exit_are_edge_triggered() {
        let mut c = InputController::new();
        c.process_keyboard(KeyCode::KeyP, ElementState::Pressed, false);
        assert!(c.take_snapshot_request());
        assert!(!c.take_snapshot_request());

        assert!(!c.exit_requested());
        c.process_keyboard(KeyCode::Escape, ElementState::Pressed, false);
        assert!(c.exit_requested());
    }

    #[test]
    fn unbound_keys_are_not_consumed() {
        let mut c = InputController::new();
        assert!(!c.process_keyboard(KeyCode::KeyZ, ElementState::Pressed, false));
    }

    #[test]
    fn release_all_clears_held_keys() {
        let mut c = InputController::new();
        c.process_keyboard(KeyCode::KeyA, ElementState::Pressed, false);
        c.process_keyboard(KeyCode::KeyQ, ElementState::Pressed, false);
        c.release_all();
        assert_eq!(c.input_state(), InputState::default());
    }
}

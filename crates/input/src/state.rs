use std::collections::BTreeSet;

use glam::Vec2;

use crate::action::KeyCode;

/// Keys currently held plus pointer motion accumulated since the last frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<KeyCode>,
    look_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True when any of `keys` is held.
    pub fn any_held(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }

    pub fn add_look(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vec2::new(dx, dy);
    }

    /// Take the accumulated pointer motion, leaving zero behind.
    pub fn take_look(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Forget everything held, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.look_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        input.set_key(KeyCode::W, true);
        assert!(input.is_held(KeyCode::W));
        assert!(input.any_held(&[KeyCode::ARROW_UP, KeyCode::W]));
        input.set_key(KeyCode::W, false);
        assert!(!input.is_held(KeyCode::W));
    }

    #[test]
    fn look_delta_accumulates_and_drains() {
        let mut input = InputState::new();
        input.add_look(1.0, 2.0);
        input.add_look(0.5, -1.0);
        assert_eq!(input.take_look(), Vec2::new(1.5, 1.0));
        assert_eq!(input.take_look(), Vec2::ZERO);
    }
}

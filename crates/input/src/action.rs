use serde::{Deserialize, Serialize};

/// A keyboard key identified by its legacy DOM key code (`W` is 87).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const W: Self = Self(87);
    pub const A: Self = Self(65);
    pub const S: Self = Self(83);
    pub const D: Self = Self(68);
    pub const ARROW_LEFT: Self = Self(37);
    pub const ARROW_UP: Self = Self(38);
    pub const ARROW_RIGHT: Self = Self(39);
    pub const ARROW_DOWN: Self = Self(40);
}

/// Pointer button as numbered by the host (0 primary, 1 middle, 2 secondary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u16),
}

impl From<u16> for PointerButton {
    fn from(index: u16) -> Self {
        match index {
            0 => Self::Primary,
            1 => Self::Middle,
            2 => Self::Secondary,
            n => Self::Other(n),
        }
    }
}

/// What a pointer press asks the engine to do with exclusive pointer capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    EnterCapture,
    ExitCapture,
}

/// Map a pointer-down event to a capture request.
///
/// Independent of the current capture state, so repeated presses are
/// idempotent in both directions.
pub fn route_pointer_down(button: PointerButton) -> Option<PointerAction> {
    let action = match button {
        PointerButton::Primary => Some(PointerAction::EnterCapture),
        PointerButton::Middle => Some(PointerAction::ExitCapture),
        PointerButton::Secondary | PointerButton::Other(_) => None,
    };
    tracing::trace!(?button, ?action, "pointer down");
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_indices_map_like_dom() {
        assert_eq!(PointerButton::from(0), PointerButton::Primary);
        assert_eq!(PointerButton::from(1), PointerButton::Middle);
        assert_eq!(PointerButton::from(2), PointerButton::Secondary);
        assert_eq!(PointerButton::from(4), PointerButton::Other(4));
    }

    #[test]
    fn primary_captures_middle_releases() {
        assert_eq!(
            route_pointer_down(PointerButton::Primary),
            Some(PointerAction::EnterCapture)
        );
        assert_eq!(
            route_pointer_down(PointerButton::Middle),
            Some(PointerAction::ExitCapture)
        );
    }

    #[test]
    fn other_buttons_are_ignored() {
        assert_eq!(route_pointer_down(PointerButton::Secondary), None);
        assert_eq!(route_pointer_down(PointerButton::Other(3)), None);
    }

    #[test]
    fn movement_key_codes() {
        assert_eq!(KeyCode::W.0, 87);
        assert_eq!(KeyCode::S.0, 83);
        assert_eq!(KeyCode::A.0, 65);
        assert_eq!(KeyCode::D.0, 68);
    }
}

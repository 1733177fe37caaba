//! Input: key codes, pointer buttons, pointer-capture routing and held-input state.
//!
//! # Invariants
//! - Primary button down always requests capture; middle button down always
//!   requests release. Nothing else changes capture state.
//! - Hosts translate their native events into these types; nothing here
//!   depends on a windowing library.

pub mod action;
pub mod state;

pub use action::{KeyCode, PointerAction, PointerButton, route_pointer_down};
pub use state::InputState;

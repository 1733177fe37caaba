//! Shared value types for the atrium room engine.

mod types;

pub use types::{Aabb, Color3, Color4, Transform};

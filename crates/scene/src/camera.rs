use atrium_common::Aabb;
use atrium_engine::ViewState;
use atrium_input::{InputState, KeyCode};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision;

/// Keys that drive the camera in each direction. Several keys may share one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
}

impl Default for KeyBindings {
    /// Arrow keys.
    fn default() -> Self {
        Self {
            up: vec![KeyCode::ARROW_UP],
            down: vec![KeyCode::ARROW_DOWN],
            left: vec![KeyCode::ARROW_LEFT],
            right: vec![KeyCode::ARROW_RIGHT],
        }
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            up: Vec::new(),
            down: Vec::new(),
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// W/S/A/D.
    pub fn wasd() -> Self {
        Self {
            up: vec![KeyCode::W],
            down: vec![KeyCode::S],
            left: vec![KeyCode::A],
            right: vec![KeyCode::D],
        }
    }

    /// Add `other`'s keys after the existing ones. Nothing is removed and
    /// keys already bound to a direction are not repeated.
    pub fn append(&mut self, other: &KeyBindings) {
        fn extend(into: &mut Vec<KeyCode>, from: &[KeyCode]) {
            for key in from {
                if !into.contains(key) {
                    into.push(*key);
                }
            }
        }
        extend(&mut self.up, &other.up);
        extend(&mut self.down, &other.down);
        extend(&mut self.left, &other.left);
        extend(&mut self.right, &other.right);
    }

    /// True when every binding in `other` is present here.
    pub fn contains_all(&self, other: &KeyBindings) -> bool {
        other.up.iter().all(|k| self.up.contains(k))
            && other.down.iter().all(|k| self.down.contains(k))
            && other.left.iter().all(|k| self.left.contains(k))
            && other.right.iter().all(|k| self.right.contains(k))
    }
}

/// First-person camera.
///
/// Rotation is Euler angles in radians: `x` pitch (positive looks down), `y`
/// yaw. Yaw 0 faces +Z; the coordinate system is left-handed.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    /// Distance moved per frame while a movement key is held.
    pub speed: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub fov: f32,
    /// Pointer pixels per radian of rotation.
    pub angular_sensibility: f32,
    /// Half-extents of the collision body.
    pub ellipsoid: Vec3,
    pub apply_gravity: bool,
    pub check_collisions: bool,
    pub keys: KeyBindings,
    attached: bool,
    configured: bool,
}

impl CameraRig {
    /// A camera with engine defaults, not yet attached or configured.
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            rotation: Vec3::ZERO,
            speed: 2.0,
            min_z: 1.0,
            max_z: 10_000.0,
            fov: 0.8,
            angular_sensibility: 2_000.0,
            ellipsoid: Vec3::new(0.5, 1.0, 0.5),
            apply_gravity: false,
            check_collisions: false,
            keys: KeyBindings::default(),
            attached: false,
            configured: false,
        }
    }

    /// Start consuming input from the active input source.
    pub fn attach_control(&mut self) {
        self.attached = true;
    }

    pub fn detach_control(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Declare position, rotation and collision body final. Effects that
    /// depend on the camera may be built from here on.
    pub fn mark_configured(&mut self) {
        self.configured = true;
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn forward(&self) -> Vec3 {
        let (pitch, yaw) = (self.rotation.x, self.rotation.y);
        Vec3::new(
            yaw.sin() * pitch.cos(),
            -pitch.sin(),
            yaw.cos() * pitch.cos(),
        )
    }

    pub fn right(&self) -> Vec3 {
        let yaw = self.rotation.y;
        Vec3::new(yaw.cos(), 0.0, -yaw.sin())
    }

    /// Advance one frame: look, walk, fall, collide.
    ///
    /// `colliders` is `None` when scene-wide collisions are off.
    pub fn step(&mut self, input: &mut InputState, gravity: Vec3, colliders: Option<&[Aabb]>) {
        if !self.attached {
            return;
        }

        let look = input.take_look();
        if look != glam::Vec2::ZERO {
            let limit = std::f32::consts::FRAC_PI_2 - 0.01;
            self.rotation.y += look.x / self.angular_sensibility;
            self.rotation.x = (self.rotation.x + look.y / self.angular_sensibility).clamp(-limit, limit);
        }

        let flat_forward = Vec3::new(self.forward().x, 0.0, self.forward().z).normalize_or_zero();
        let mut direction = Vec3::ZERO;
        if input.any_held(&self.keys.up) {
            direction += flat_forward;
        }
        if input.any_held(&self.keys.down) {
            direction -= flat_forward;
        }
        if input.any_held(&self.keys.left) {
            direction -= self.right();
        }
        if input.any_held(&self.keys.right) {
            direction += self.right();
        }

        let mut displacement = direction.normalize_or_zero() * self.speed;
        if self.apply_gravity {
            displacement += gravity;
        }
        if displacement == Vec3::ZERO {
            return;
        }

        self.position = match colliders {
            Some(colliders) if self.check_collisions => {
                collision::slide(self.position, self.ellipsoid, displacement, colliders)
            }
            _ => self.position + displacement,
        };
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_lh(self.fov, aspect, self.min_z, self.max_z)
    }

    pub fn view_state(&self, aspect: f32) -> ViewState {
        ViewState {
            eye: self.position,
            view_proj: self.projection_matrix(aspect) * self.view_matrix(),
        }
    }
}

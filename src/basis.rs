//! Movement basis resolution.
//!
//! Keyboard input is expressed relative to a horizontal `(forward, right)`
//! basis. The basis is derived from an orientation source (the character's
//! own transform, another entity such as a camera rig, or the active
//! [`LocomotionCamera`]) by dropping the vertical component and
//! re-normalizing. When the source looks almost straight up or down the
//! flattened vector degenerates, and the world axes are used instead.

use bevy::prelude::*;

/// Squared length below which a flattened direction counts as degenerate.
pub const FLATTEN_EPSILON: f32 = 1e-6;

/// World forward used when the orientation gives no usable horizontal heading.
pub const WORLD_FORWARD: Vec3 = Vec3::NEG_Z;

/// World right used when the orientation gives no usable horizontal heading.
pub const WORLD_RIGHT: Vec3 = Vec3::X;

/// Anything that can report a forward and right direction.
pub trait OrientationSource {
    /// Forward direction in world space (not necessarily horizontal).
    fn forward_dir(&self) -> Vec3;
    /// Right direction in world space (not necessarily horizontal).
    fn right_dir(&self) -> Vec3;
}

impl OrientationSource for Quat {
    fn forward_dir(&self) -> Vec3 {
        *self * Vec3::NEG_Z
    }

    fn right_dir(&self) -> Vec3 {
        *self * Vec3::X
    }
}

impl OrientationSource for Transform {
    fn forward_dir(&self) -> Vec3 {
        self.rotation.forward_dir()
    }

    fn right_dir(&self) -> Vec3 {
        self.rotation.right_dir()
    }
}

impl OrientationSource for GlobalTransform {
    fn forward_dir(&self) -> Vec3 {
        *self.forward()
    }

    fn right_dir(&self) -> Vec3 {
        *self.right()
    }
}

/// Where a controller takes its movement basis from.
///
/// Missing references never fail: an absent [`BasisSource::Reference`]
/// entity or an absent [`LocomotionCamera`] falls back to the character's own
/// transform for that tick.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub enum BasisSource {
    /// The controlled entity's own orientation.
    #[default]
    OwnTransform,
    /// Another entity's orientation (e.g. a camera child).
    Reference(Entity),
    /// The first entity carrying [`LocomotionCamera`].
    ActiveCamera,
}

/// Marks the camera that [`BasisSource::ActiveCamera`] follows.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocomotionCamera;

/// Horizontal movement basis. Both vectors are unit length with `y == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementBasis {
    /// Horizontal forward.
    pub forward: Vec3,
    /// Horizontal right.
    pub right: Vec3,
}

impl Default for MovementBasis {
    fn default() -> Self {
        Self::WORLD
    }
}

impl MovementBasis {
    /// The world-axis basis.
    pub const WORLD: Self = Self {
        forward: WORLD_FORWARD,
        right: WORLD_RIGHT,
    };

    /// Flatten a source's orientation into a horizontal basis.
    pub fn from_source(source: &impl OrientationSource) -> Self {
        Self::from_directions(source.forward_dir(), source.right_dir())
    }

    /// Flatten raw forward/right directions into a horizontal basis.
    ///
    /// Each axis is flattened independently; an axis whose horizontal length
    /// squared is below [`FLATTEN_EPSILON`] (or is not finite) is replaced by
    /// its world counterpart.
    pub fn from_directions(forward: Vec3, right: Vec3) -> Self {
        Self {
            forward: flatten(forward).unwrap_or(WORLD_FORWARD),
            right: flatten(right).unwrap_or(WORLD_RIGHT),
        }
    }
}

/// Drop the vertical component and normalize, or `None` when degenerate.
fn flatten(direction: Vec3) -> Option<Vec3> {
    let horizontal = Vec3::new(direction.x, 0.0, direction.z);
    let length_squared = horizontal.length_squared();
    if !length_squared.is_finite() || length_squared < FLATTEN_EPSILON {
        return None;
    }
    Some(horizontal / length_squared.sqrt())
}

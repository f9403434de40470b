//! Capsule geometry.
//!
//! The controller owns the shape of its capsule collider. Radius and height
//! come from [`LocomotionConfig`](crate::config::LocomotionConfig); the local
//! center is always derived as `(0, height / 2 - radius, 0)` so the
//! transform origin stays anchored at the character's feet. Nothing else may
//! set the center.

use bevy::prelude::*;

use crate::config::{BodySettings, LocomotionConfig};

/// Derived capsule collider geometry.
///
/// The capsule's long axis is local Y. A capsule of total `height` consists
/// of a cylinder of length `height - 2 * radius` capped by two hemispheres.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CapsuleGeometry {
    radius: f32,
    height: f32,
}

impl CapsuleGeometry {
    /// Build geometry from radius and height.
    ///
    /// Callers normally get this from `LocomotionConfig::capsule()`, which
    /// has already enforced `height >= 2 * radius`. Raw values are still
    /// sanitized so the segment length can never go negative.
    pub fn new(radius: f32, height: f32) -> Self {
        let radius = radius.max(0.0);
        Self {
            radius,
            height: height.max(2.0 * radius),
        }
    }

    /// Capsule radius.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Total capsule height, hemispheres included.
    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Half the length of the inner segment joining both hemisphere centers.
    #[inline]
    pub fn half_segment(&self) -> f32 {
        self.height * 0.5 - self.radius
    }

    /// Local collider center relative to the feet-anchored origin.
    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::new(0.0, self.height * 0.5 - self.radius, 0.0)
    }

    /// Local endpoints `(lower, upper)` of the capsule's inner segment.
    pub fn segment(&self) -> (Vec3, Vec3) {
        let center = self.center();
        let half = Vec3::Y * self.half_segment();
        (center - half, center + half)
    }

    /// World-space center of the lower hemisphere for a character whose
    /// feet-anchored origin is at `position`.
    #[inline]
    pub fn lower_sphere_center(&self, position: Vec3) -> Vec3 {
        position + self.center() - Vec3::Y * self.half_segment()
    }
}

impl Default for CapsuleGeometry {
    fn default() -> Self {
        Self::new(0.4, 1.8)
    }
}

/// Collider and body state a controller pushes to its physics backend.
///
/// The synchronizer compares this against the last pushed value every tick,
/// so geometry is re-applied exactly when the config changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySync {
    /// Capsule collider geometry.
    pub capsule: CapsuleGeometry,
    /// Non-collidable capsule (direct fly mode).
    pub is_trigger: bool,
    /// Rigid body settings.
    pub body: BodySettings,
}

impl BodySync {
    /// Desired collider and body state for a config.
    pub fn from_config(config: &LocomotionConfig) -> Self {
        Self {
            capsule: config.capsule(),
            is_trigger: !config.uses_physics_movement(),
            body: config.body_settings(),
        }
    }
}

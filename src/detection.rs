//! Ground probing.
//!
//! The probe is a single downward ray cast from the center of the capsule's
//! lower hemisphere. Its length covers the hemisphere radius, the configured
//! ground check distance and the skin width, so a character resting on a
//! surface (or hovering a few centimeters above it) always reads as grounded.
//!
//! The ray itself is cast by the physics backend's sensor system; this
//! module only builds the request and applies the result.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::{LayerMask, LocomotionConfig};
use crate::state::CharacterController;

/// A ground ray request in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    /// Center of the capsule's lower hemisphere.
    pub origin: Vec3,
    /// Always straight down.
    pub direction: Vec3,
    /// `radius + ground_check_distance + skin_width`.
    pub max_distance: f32,
    /// Layers that count as ground.
    pub layers: LayerMask,
}

impl GroundProbe {
    /// Build the probe for a character whose feet-anchored origin is at
    /// `position`.
    pub fn new(config: &LocomotionConfig, position: Vec3) -> Self {
        let capsule = config.capsule();
        Self {
            origin: capsule.lower_sphere_center(position),
            direction: Vec3::NEG_Y,
            max_distance: probe_length(config),
            layers: config.ground_layers(),
        }
    }

    /// Whether a hit at `distance` on a collider in `layers` counts.
    ///
    /// Backends that filter by layer and range natively never need this;
    /// it exists for backends that return raw hits.
    pub fn accepts(&self, distance: f32, layers: LayerMask) -> bool {
        distance >= 0.0 && distance <= self.max_distance && self.layers.intersects(layers)
    }

    /// World position of a hit at `distance` along the ray.
    #[inline]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Ray length for a config.
#[inline]
pub fn probe_length(config: &LocomotionConfig) -> f32 {
    config.capsule_radius() + config.ground_check_distance() + config.skin_width()
}

/// Whether a controller probes for ground at all.
///
/// Direct (fly) mode has no notion of ground, and detached controllers
/// are skipped entirely.
#[inline]
pub fn wants_ground_probe(controller: &CharacterController, config: &LocomotionConfig) -> bool {
    controller.is_attached() && config.uses_physics_movement()
}

/// Apply one tick's probe outcome.
///
/// `None` covers both "ray missed" and "could not cast" (no physics
/// context, no transform): grounded is forced false either way.
pub fn record_probe(controller: &mut CharacterController, hit: Option<CollisionData>) {
    match hit {
        Some(hit) => {
            trace!("ground hit at {:.3} (entity {:?})", hit.distance, hit.entity);
            controller.record_ground(Some(hit));
        }
        None => controller.clear_ground(),
    }
}

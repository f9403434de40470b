//! Runtime controller state.
//!
//! [`CharacterController`] holds what the controller learned this tick: the
//! ground probe result and whether the entity has been attached to a physics
//! body. The [`Grounded`] / [`Airborne`] markers mirror the grounded flag so
//! gameplay code can filter on them in queries.

use bevy::prelude::*;

use crate::capsule::BodySync;
use crate::collision::CollisionData;

/// Where a controller is in its attach lifecycle.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attachment {
    /// Spawned, not yet validated.
    #[default]
    Pending,
    /// Driving its physics body.
    Attached,
    /// Refused to attach. Never retried.
    Failed,
}

/// Per-character runtime state, written by the controller systems.
///
/// Spawn it with `CharacterController::new()` next to a
/// [`LocomotionConfig`](crate::config::LocomotionConfig). Attachment to the
/// physics body happens on the first fixed tick after spawn.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct CharacterController {
    /// Whether the ground probe hit walkable ground this tick.
    pub is_grounded: bool,

    /// Ground hit from the last probe, if any.
    #[reflect(ignore)]
    pub floor: Option<CollisionData>,

    /// Attach lifecycle.
    pub(crate) attachment: Attachment,

    /// Collider and body settings last pushed to the backend.
    #[reflect(ignore)]
    pub(crate) synced: Option<BodySync>,
}

impl CharacterController {
    /// Create a detached controller with no ground contact.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the controller is attached to a physics body.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attachment == Attachment::Attached
    }

    /// Attach lifecycle state.
    #[inline]
    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    /// Whether the character stood on ground at the last probe.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    /// Distance from the probe origin to the ground, if any was hit.
    pub fn ground_distance(&self) -> Option<f32> {
        self.floor.map(|hit| hit.distance)
    }

    /// Ground surface normal, if any was hit.
    pub fn ground_normal(&self) -> Option<Vec3> {
        self.floor.map(|hit| hit.normal)
    }

    /// Entity the character is standing on, if known.
    pub fn ground_entity(&self) -> Option<Entity> {
        self.floor.and_then(|hit| hit.entity)
    }

    /// Store a probe result. A miss clears the grounded flag.
    pub fn record_ground(&mut self, hit: Option<CollisionData>) {
        self.is_grounded = hit.is_some();
        self.floor = hit;
    }

    /// Forget any ground contact.
    pub fn clear_ground(&mut self) {
        self.record_ground(None);
    }
}

/// Marker component indicating the character is grounded.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_capsule_controller::prelude::*;
///
/// fn count_grounded(q: Query<(), With<Grounded>>) -> usize {
///     q.iter().count()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

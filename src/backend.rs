//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the capsule controller. The controller systems never touch
//! engine-specific components directly; everything goes through these
//! associated functions, so a test backend can stand in for the real
//! physics engine.

use bevy::prelude::*;

use crate::capsule::CapsuleGeometry;
use crate::config::BodySettings;
use crate::error::AttachError;

/// Trait for physics backend implementations.
///
/// Besides the functions below, a backend is responsible for ground
/// detection: its [`plugin`](Self::plugin) must add a system to
/// [`CapsuleControllerSet::Sensors`](crate::CapsuleControllerSet::Sensors)
/// that casts a [`GroundProbe`](crate::detection::GroundProbe) for every
/// attached physics-mode controller and stores the outcome with
/// [`record_probe`](crate::detection::record_probe). Ray casting needs
/// engine-specific system parameters, so it cannot be a plain `&World` call.
///
/// # Example
///
/// For an example implementation, see the `rapier` module's
/// `Rapier3dBackend`, which implements this trait for Bevy Rapier3D.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Check that every collaborator the controller needs is present.
    ///
    /// Called once when a controller is added. An error keeps the
    /// controller detached for good.
    fn validate_attachment(world: &mut World, entity: Entity) -> Result<(), AttachError>;

    /// Apply body type, gravity, mass and damping.
    fn configure_body(world: &mut World, entity: Entity, settings: &BodySettings);

    /// Shape the entity's collider as the given capsule.
    ///
    /// A trigger capsule reports overlaps but never blocks movement.
    fn apply_capsule(world: &mut World, entity: Entity, capsule: &CapsuleGeometry, is_trigger: bool);

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Get the current angular velocity of an entity.
    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the angular velocity of an entity.
    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: Vec3);

    /// Apply an impulse to an entity.
    ///
    /// Impulse is an instantaneous change in momentum.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Apply a force to an entity.
    ///
    /// Force is applied over the physics timestep.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3);

    /// Get the current world position of an entity, if it has a transform.
    fn get_position(world: &World, entity: Entity) -> Option<Vec3>;

    /// Move an entity by a world-space offset.
    fn translate(world: &mut World, entity: Entity, delta: Vec3);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

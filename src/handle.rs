//! Imperative access to one controller.
//!
//! Gameplay code that already holds `&mut World` (commands, exclusive
//! systems, tests) can steer a character through [`CharacterHandle`]
//! without knowing which physics backend is in use.

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::LocomotionConfig;
use crate::state::CharacterController;

/// Borrowed handle to a single character.
///
/// Every method is a no-op (or returns a neutral value) when the entity
/// lacks the component it needs.
///
/// # Example
///
/// ```rust,ignore
/// fn launch(world: &mut World, player: Entity) {
///     let mut handle = CharacterHandle::<Rapier3dBackend>::new(world, player);
///     handle.set_vertical_velocity(12.0);
/// }
/// ```
pub struct CharacterHandle<'w, B: CharacterPhysicsBackend> {
    world: &'w mut World,
    entity: Entity,
    _marker: PhantomData<B>,
}

impl<'w, B: CharacterPhysicsBackend> CharacterHandle<'w, B> {
    /// Wrap a character entity.
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        Self {
            world,
            entity,
            _marker: PhantomData,
        }
    }

    /// The wrapped entity.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Current linear velocity.
    pub fn velocity(&self) -> Vec3 {
        B::get_velocity(&*self.world, self.entity)
    }

    /// Current vertical speed.
    pub fn vertical_velocity(&self) -> f32 {
        self.velocity().y
    }

    /// Overwrite the vertical speed, keeping horizontal velocity.
    pub fn set_vertical_velocity(&mut self, vertical: f32) {
        let mut velocity = self.velocity();
        velocity.y = vertical;
        B::set_velocity(self.world, self.entity, velocity);
    }

    /// Add to the vertical speed directly (a mass-independent impulse).
    pub fn add_vertical_impulse(&mut self, delta: f32) {
        let mut velocity = self.velocity();
        velocity.y += delta;
        B::set_velocity(self.world, self.entity, velocity);
    }

    /// Apply a physical impulse through the backend.
    pub fn add_impulse(&mut self, impulse: Vec3) {
        B::apply_impulse(self.world, self.entity, impulse);
    }

    /// Apply a force for the next physics step.
    pub fn add_force(&mut self, force: Vec3) {
        B::apply_force(self.world, self.entity, force);
    }

    /// Move the character's feet to `position` in world space.
    pub fn teleport(&mut self, position: Vec3) {
        let Some(current) = B::get_position(&*self.world, self.entity) else {
            return;
        };
        B::translate(self.world, self.entity, position - current);
    }

    /// World position.
    pub fn position(&self) -> Option<Vec3> {
        B::get_position(&*self.world, self.entity)
    }

    /// World-space eye point: `capsule_height * eye_height_ratio` above the
    /// feet.
    pub fn eye_position(&self) -> Option<Vec3> {
        let position = self.position()?;
        let config = self.world.get::<LocomotionConfig>(self.entity)?;
        Some(position + Vec3::Y * config.capsule_height() * config.eye_height_ratio())
    }

    /// Whether the character stood on ground at the last probe.
    pub fn is_grounded(&self) -> bool {
        self.world
            .get::<CharacterController>(self.entity)
            .is_some_and(|controller| controller.is_grounded)
    }

    /// Enable or disable keyboard-driven movement.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        if let Some(mut config) = self.world.get_mut::<LocomotionConfig>(self.entity) {
            config.set_input_enabled(enabled);
        }
    }
}

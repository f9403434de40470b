//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature (on by default).
//!
//! The controller expects Rapier to step once per fixed tick, so add the
//! physics plugin with `RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule()`
//! in games. Tests may drive the schedules by hand instead.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::capsule::CapsuleGeometry;
use crate::collision::CollisionData;
use crate::config::{BodyKind, BodySettings, LayerMask, LocomotionConfig};
use crate::detection::{record_probe, wants_ground_probe, GroundProbe};
use crate::error::AttachError;
use crate::state::CharacterController;
use crate::CapsuleControllerSet;

/// Rapier3D physics backend for the capsule controller.
///
/// Velocity and impulses go straight to Rapier components. Forces are
/// accumulated in [`ControllerForces`] and held for exactly one physics
/// step, so forces added by other code on `ExternalForce` are preserved.
/// Ground detection is a dedicated system that receives the Rapier
/// context as a system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn validate_attachment(world: &mut World, entity: Entity) -> Result<(), AttachError> {
        if world.get::<Transform>(entity).is_none() && world.get::<GlobalTransform>(entity).is_none() {
            return Err(AttachError::MissingTransform(entity));
        }
        if world.get::<RigidBody>(entity).is_none() {
            return Err(AttachError::MissingRigidBody(entity));
        }
        let has_context = world
            .query_filtered::<(), With<DefaultRapierContext>>()
            .iter(world)
            .next()
            .is_some();
        if !has_context {
            return Err(AttachError::MissingPhysics);
        }
        Ok(())
    }

    fn configure_body(world: &mut World, entity: Entity, settings: &BodySettings) {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };
        entity_mut.insert((
            rigid_body_for(settings.kind),
            GravityScale(if settings.use_gravity { 1.0 } else { 0.0 }),
            ColliderMassProperties::Mass(settings.mass),
            Damping {
                linear_damping: settings.linear_damping,
                angular_damping: settings.angular_damping,
            },
        ));
        entity_mut.insert_if_new((
            Velocity::default(),
            ExternalForce::default(),
            ExternalImpulse::default(),
            ControllerForces::default(),
        ));
    }

    fn apply_capsule(world: &mut World, entity: Entity, capsule: &CapsuleGeometry, is_trigger: bool) {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };
        entity_mut.insert(capsule_collider(capsule));
        if is_trigger {
            entity_mut.insert(Sensor);
        } else {
            entity_mut.remove::<Sensor>();
        }
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.angvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.angvel = angular_velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // No ExternalImpulse: treat as a velocity change.
            vel.linvel += impulse;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut forces) = world.get_mut::<ControllerForces>(entity) {
            forces.pending += force;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Option<Vec3> {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| world.get::<GlobalTransform>(entity).map(|t| t.translation()))
    }

    fn translate(world: &mut World, entity: Entity, delta: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += delta;
        }
    }
}

fn rigid_body_for(kind: BodyKind) -> RigidBody {
    match kind {
        BodyKind::Static => RigidBody::Fixed,
        BodyKind::Kinematic => RigidBody::KinematicPositionBased,
        BodyKind::Dynamic => RigidBody::Dynamic,
    }
}

/// Build a Rapier capsule whose segment is offset by the capsule center,
/// keeping the entity origin at the lower hemisphere center.
pub fn capsule_collider(capsule: &CapsuleGeometry) -> Collider {
    let (lower, upper) = capsule.segment();
    Collider::capsule(lower, upper, capsule.radius())
}

/// Collision groups that select the given ground layers.
pub fn ground_groups(layers: LayerMask) -> CollisionGroups {
    CollisionGroups::new(Group::ALL, Group::from_bits_truncate(layers.bits()))
}

/// Plugin that sets up Rapier3D-specific systems for the capsule controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ControllerForces>();

        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(CapsuleControllerSet::Preparation),
        );

        app.add_systems(
            FixedUpdate,
            rapier_ground_detection.in_set(CapsuleControllerSet::Sensors),
        );

        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(CapsuleControllerSet::Finalize),
        );
    }
}

/// Forces requested through the backend, held for one physics step.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ControllerForces {
    /// Accumulated this tick.
    pub pending: Vec3,
    /// Written to `ExternalForce` last tick.
    pub applied: Vec3,
}

/// Remove last tick's controller forces from `ExternalForce`.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        ext_force.force -= forces.applied;
        forces.applied = Vec3::ZERO;
    }
}

/// Write this tick's accumulated forces to `ExternalForce`.
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        let force = std::mem::take(&mut forces.pending);
        ext_force.force += force;
        forces.applied = force;
    }
}

/// Rapier-specific ground detection system.
///
/// Casts one ray per physics-mode controller from the lower hemisphere
/// center straight down, filtered by the configured ground layers. Without
/// a Rapier context or a transform the controller reads as airborne.
fn rapier_ground_detection(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        Option<&Transform>,
        Option<&GlobalTransform>,
        &LocomotionConfig,
        &mut CharacterController,
    )>,
) {
    let context = rapier_context.single().ok();
    if context.is_none() {
        trace!("no rapier context, ground probes skipped");
    }

    for (entity, transform, global, config, mut controller) in &mut q_controllers {
        if !wants_ground_probe(&controller, config) {
            if controller.is_attached() {
                record_probe(&mut controller, None);
            }
            continue;
        }

        let position = transform
            .map(|t| t.translation)
            .or_else(|| global.map(|t| t.translation()));

        let hit = match (&context, position) {
            (Some(context), Some(position)) => {
                let probe = GroundProbe::new(config, position);
                let filter = QueryFilter::default()
                    .exclude_rigid_body(entity)
                    .exclude_sensors()
                    .groups(ground_groups(probe.layers));

                context
                    .cast_ray_and_get_normal(
                        probe.origin,
                        probe.direction,
                        probe.max_distance,
                        true,
                        filter,
                    )
                    .map(|(hit_entity, hit)| {
                        CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
                    })
            }
            _ => None,
        };

        record_probe(&mut controller, hit);
    }
}

/// Bundle for creating a capsule character with Rapier3D physics.
///
/// Provides the rigid body, velocity tracking and external force/impulse
/// components. Body type, gravity, mass and the capsule collider itself are
/// (re)applied from [`LocomotionConfig`] when the controller attaches, so
/// the values here only matter until then.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use msg_capsule_controller::prelude::*;
/// use msg_capsule_controller::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     let config = LocomotionConfig::first_person();
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(),
///         config,
///         KeyBindings::default(),
///         LocomotionInput::default(),
///         Rapier3dCharacterBundle::from_config(&config),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity.
    pub velocity: Velocity,
    /// External forces (controller forces are layered on top).
    pub external_force: ExternalForce,
    /// Impulses applied this step.
    pub external_impulse: ExternalImpulse,
    /// One-step force accumulator.
    pub forces: ControllerForces,
    /// Capsule collider.
    pub collider: Collider,
    /// Gravity multiplier.
    pub gravity_scale: GravityScale,
    /// Damping coefficients.
    pub damping: Damping,
    /// Collider mass.
    pub mass: ColliderMassProperties,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::from_config(&LocomotionConfig::default())
    }
}

impl Rapier3dCharacterBundle {
    /// Create a bundle matching the default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bundle matching `config`.
    pub fn from_config(config: &LocomotionConfig) -> Self {
        let settings = config.body_settings();
        Self {
            rigid_body: rigid_body_for(settings.kind),
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            forces: ControllerForces::default(),
            collider: capsule_collider(&config.capsule()),
            gravity_scale: GravityScale(if settings.use_gravity { 1.0 } else { 0.0 }),
            damping: Damping {
                linear_damping: settings.linear_damping,
                angular_damping: settings.angular_damping,
            },
            mass: ColliderMassProperties::Mass(settings.mass),
        }
    }
}

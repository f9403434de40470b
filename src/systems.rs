//! Core controller systems.
//!
//! These systems run once per fixed tick in the order fixed by
//! [`CapsuleControllerSet`](crate::CapsuleControllerSet): attach and sync
//! geometry, sample input, probe ground (backend), blend locomotion, jump,
//! constrain rotation, sync markers. They are generic over the physics
//! backend so the same logic drives Rapier or a test double.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::basis::{BasisSource, LocomotionCamera, MovementBasis};
use crate::capsule::BodySync;
use crate::config::{LocomotionConfig, MovementMode};
use crate::error::{AttachError, ControllerAttachFailed};
use crate::input::LocomotionInput;
use crate::locomotion::{blend_physics_velocity, direct_displacement, BlendInput};
use crate::state::{Airborne, Attachment, CharacterController, Grounded};

/// Attach newly spawned controllers to their physics bodies.
///
/// Runs once per controller. Success configures the body, syncs the capsule
/// and resets the runtime state to ungrounded. Failure logs an error, sends
/// [`ControllerAttachFailed`] and leaves the controller detached for good.
pub fn attach_controllers<B: CharacterPhysicsBackend>(world: &mut World) {
    let pending: Vec<Entity> = world
        .query::<(Entity, &CharacterController)>()
        .iter(world)
        .filter(|(_, controller)| controller.attachment == Attachment::Pending)
        .map(|(e, _)| e)
        .collect();

    for entity in pending {
        let result = match world.get::<LocomotionConfig>(entity).copied() {
            Some(config) => B::validate_attachment(world, entity).map(|()| config),
            None => Err(AttachError::MissingConfig(entity)),
        };

        match result {
            Ok(config) => {
                let sync = BodySync::from_config(&config);
                push_body_sync::<B>(world, entity, sync);
                if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
                    controller.clear_ground();
                    controller.attachment = Attachment::Attached;
                }
                debug!("capsule controller attached to {entity} ({:?} mode)", config.mode());
            }
            Err(error) => {
                error!("capsule controller on {entity} failed to attach: {error}");
                if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
                    controller.attachment = Attachment::Failed;
                    controller.clear_ground();
                }
                world.send_event(ControllerAttachFailed { entity, error });
            }
        }
    }
}

/// Re-apply capsule geometry and body settings when a config changed.
///
/// Compares the desired [`BodySync`] against the last pushed one, so it is
/// idempotent and costs nothing on ticks without changes.
pub fn sync_body_with_config<B: CharacterPhysicsBackend>(world: &mut World) {
    let stale: Vec<(Entity, BodySync, Option<BodySync>)> = world
        .query::<(Entity, &LocomotionConfig, &CharacterController)>()
        .iter(world)
        .filter(|(_, _, controller)| controller.is_attached())
        .filter_map(|(e, config, controller)| {
            let desired = BodySync::from_config(config);
            (controller.synced != Some(desired)).then_some((e, desired, controller.synced))
        })
        .collect();

    for (entity, desired, previous) in stale {
        let entered_direct = desired.is_trigger && previous.is_some_and(|p| !p.is_trigger);
        push_body_sync::<B>(world, entity, desired);

        if entered_direct {
            debug!("{entity} switched to {:?} movement", MovementMode::Direct);
            B::set_velocity(world, entity, Vec3::ZERO);
            B::set_angular_velocity(world, entity, Vec3::ZERO);
            if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
                controller.clear_ground();
            }
        } else if previous.is_some_and(|p| p.is_trigger != desired.is_trigger) {
            debug!("{entity} switched to {:?} movement", MovementMode::Physics);
        }
    }
}

fn push_body_sync<B: CharacterPhysicsBackend>(world: &mut World, entity: Entity, sync: BodySync) {
    B::configure_body(world, entity, &sync.body);
    B::apply_capsule(world, entity, &sync.capsule, sync.is_trigger);
    if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
        controller.synced = Some(sync);
    }
}

/// Horizontal basis from an entity's world orientation, if it has one.
fn orientation_basis(world: &World, entity: Entity) -> Option<MovementBasis> {
    world
        .get::<GlobalTransform>(entity)
        .map(MovementBasis::from_source)
        .or_else(|| world.get::<Transform>(entity).map(MovementBasis::from_source))
}

/// Resolve the movement basis for one controller this tick.
///
/// A missing reference or camera falls back to the controller's own
/// orientation; a missing own transform falls back to the world axes.
pub fn resolve_basis(
    world: &World,
    entity: Entity,
    source: BasisSource,
    active_camera: Option<Entity>,
) -> MovementBasis {
    let reference = match source {
        BasisSource::OwnTransform => None,
        BasisSource::Reference(target) => Some(target),
        BasisSource::ActiveCamera => active_camera,
    };

    reference
        .and_then(|target| {
            let basis = orientation_basis(world, target);
            if basis.is_none() {
                trace!("basis reference {target} has no transform, using {entity}");
            }
            basis
        })
        .or_else(|| {
            if source != BasisSource::OwnTransform && reference.is_none() {
                trace!("no active locomotion camera, using {entity}");
            }
            orientation_basis(world, entity)
        })
        .unwrap_or(MovementBasis::WORLD)
}

/// Blend horizontal movement from held keys.
///
/// Physics mode rewrites the body's horizontal velocity (vertical is carried
/// over). Direct mode translates the transform and never touches velocity.
pub fn apply_locomotion<B: CharacterPhysicsBackend>(world: &mut World) {
    let active_camera = world
        .query_filtered::<Entity, With<LocomotionCamera>>()
        .iter(world)
        .next();

    let entities: Vec<(Entity, LocomotionConfig, LocomotionInput, BasisSource, bool)> = world
        .query::<(
            Entity,
            &LocomotionConfig,
            &LocomotionInput,
            Option<&BasisSource>,
            &CharacterController,
        )>()
        .iter(world)
        .filter(|(_, config, _, _, controller)| controller.is_attached() && config.input_enabled())
        .map(|(e, config, input, source, controller)| {
            (
                e,
                *config,
                *input,
                source.copied().unwrap_or_default(),
                controller.is_grounded,
            )
        })
        .collect();

    let dt = B::get_fixed_timestep(world);

    for (entity, config, input, source, grounded) in entities {
        let basis = resolve_basis(world, entity, source, active_camera);
        let blend = BlendInput::resolve(&input.current(), &basis, &config, grounded, dt);

        match config.mode() {
            MovementMode::Physics => {
                let velocity = B::get_velocity(world, entity);
                let next = blend_physics_velocity(velocity, &blend, &config);
                B::set_velocity(world, entity, next);
            }
            MovementMode::Direct => {
                let displacement = direct_displacement(&blend);
                if displacement != Vec3::ZERO {
                    B::translate(world, entity, displacement);
                }
            }
        }
    }
}

/// Fire a jump on the rising edge of the jump key while grounded.
///
/// The impulse is added to the vertical velocity, and the controller is
/// marked airborne at once so the same press cannot trigger twice.
pub fn apply_jump<B: CharacterPhysicsBackend>(world: &mut World) {
    let jumpers: Vec<(Entity, f32)> = world
        .query::<(Entity, &LocomotionConfig, &LocomotionInput, &CharacterController)>()
        .iter(world)
        .filter(|(_, config, input, controller)| {
            controller.is_attached()
                && config.input_enabled()
                && config.uses_physics_movement()
                && controller.is_grounded
                && input.jump_just_pressed()
        })
        .map(|(e, config, _, _)| (e, config.jump_impulse()))
        .collect();

    for (entity, impulse) in jumpers {
        let mut velocity = B::get_velocity(world, entity);
        velocity.y += impulse;
        B::set_velocity(world, entity, velocity);

        if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
            controller.is_grounded = false;
        }
        debug!("{entity} jumped, vertical velocity {:.2}", velocity.y);
    }
}

/// Suppress tipping by zeroing angular velocity.
///
/// With yaw spin allowed, only pitch and roll (X/Z) are zeroed.
pub fn apply_upright_constraint<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, bool)> = world
        .query::<(Entity, &LocomotionConfig, &CharacterController)>()
        .iter(world)
        .filter(|(_, config, controller)| {
            controller.is_attached() && config.uses_physics_movement() && config.freeze_rotation()
        })
        .map(|(e, config, _)| (e, config.allow_yaw_spin()))
        .collect();

    for (entity, allow_yaw_spin) in entities {
        let constrained = if allow_yaw_spin {
            let angular = B::get_angular_velocity(world, entity);
            Vec3::new(0.0, angular.y, 0.0)
        } else {
            Vec3::ZERO
        };
        B::set_angular_velocity(world, entity, constrained);
    }
}

/// Sync state marker components based on the grounded flag.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(Entity, &CharacterController, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, controller, has_grounded, has_airborne) in &q_controllers {
        if controller.is_grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !controller.is_grounded && has_grounded {
            commands.entity(entity).remove::<Grounded>().insert(Airborne);
        } else if !controller.is_grounded && !has_airborne {
            commands.entity(entity).insert(Airborne);
        }
    }
}

//! Attach-time errors.
//!
//! A controller that cannot find its collaborators refuses to attach. The
//! failure is reported once through [`ControllerAttachFailed`] and is never
//! retried. Runtime degradations (missing reference transform, degenerate
//! input) are recovered silently and never show up here.

use bevy::prelude::*;
use thiserror::Error;

/// Why a controller refused to attach to its entity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// The entity has no transform to read a position from.
    #[error("entity {0} has no Transform or GlobalTransform")]
    MissingTransform(Entity),
    /// The entity has no rigid body for the controller to drive.
    #[error("entity {0} has no rigid body")]
    MissingRigidBody(Entity),
    /// No physics query service is available in the world.
    #[error("no physics context is available to serve ground raycasts")]
    MissingPhysics,
    /// The entity lost its controller configuration before attaching.
    #[error("entity {0} has a CharacterController but no LocomotionConfig")]
    MissingConfig(Entity),
}

/// Event sent when a [`CharacterController`](crate::state::CharacterController)
/// fails to attach.
#[derive(Event, Debug, Clone, Copy)]
pub struct ControllerAttachFailed {
    /// The entity whose controller stayed detached.
    pub entity: Entity,
    /// The missing collaborator.
    pub error: AttachError,
}

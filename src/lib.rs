//! # `msg_capsule_controller`
//!
//! A capsule character controller for first- and third-person characters,
//! with physics backend abstraction.
//!
//! This crate provides a keyboard-driven locomotion controller that:
//! - Keeps a feet-anchored capsule collider in sync with its configuration
//! - Probes for ground with a short downward ray every fixed tick
//! - Moves relative to a flattened basis (own transform, any entity, or a camera)
//! - Snaps to target speed on the ground, decays with friction when idle,
//!   and steers with limited authority in the air
//! - Jumps on the rising edge of the jump key, only while grounded
//! - Suppresses tipping by freezing angular velocity
//! - Offers a non-collidable "fly" mode that translates the transform directly
//! - Abstracts the physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! The controller is a set of systems in `FixedUpdate`, ordered by
//! [`CapsuleControllerSet`]:
//! 1. **Preparation**: attach new controllers, re-sync capsule and body
//! 2. **Input**: sample key bindings into a two-slot snapshot
//! 3. **Sensors**: the backend casts the ground probe
//! 4. **Movement**: blend horizontal velocity (or displacement)
//! 5. **Jump**: add the jump impulse on a fresh press
//! 6. **Constraint**: freeze pitch/roll (and optionally yaw)
//! 7. **Finalize**: sync `Grounded` / `Airborne` markers
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_capsule_controller::prelude::*;
//!
//! // Components for a walking first-person character
//! let controller = CharacterController::new();
//! let config = LocomotionConfig::first_person().with_move_speed(6.0);
//! let input = LocomotionInput::default();
//! let keys = KeyBindings::default();
//!
//! // Spawn these with a transform and the backend's physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod basis;
pub mod capsule;
pub mod collision;
pub mod config;
pub mod detection;
pub mod error;
pub mod handle;
pub mod input;
pub mod locomotion;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::basis::{BasisSource, LocomotionCamera, MovementBasis, OrientationSource};
    pub use crate::capsule::CapsuleGeometry;
    pub use crate::collision::CollisionData;
    pub use crate::config::{AirControl, BodyKind, BodySettings, LayerMask, LocomotionConfig, MovementMode};
    pub use crate::detection::GroundProbe;
    pub use crate::error::{AttachError, ControllerAttachFailed};
    pub use crate::handle::CharacterHandle;
    pub use crate::input::{KeyBindings, KeySnapshot, LocomotionInput};
    pub use crate::state::{Airborne, Attachment, CharacterController, Grounded};
    pub use crate::{CapsuleControllerPlugin, CapsuleControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Per-tick phases of the controller, chained in this order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsuleControllerSet {
    /// Attach new controllers and push config changes to the body.
    Preparation,
    /// Sample keyboard input.
    Input,
    /// Ground probing (added by the backend plugin).
    Sensors,
    /// Horizontal locomotion.
    Movement,
    /// Jump trigger.
    Jump,
    /// Upright constraint.
    Constraint,
    /// Marker sync and backend write-back.
    Finalize,
}

/// Main plugin for the capsule controller.
///
/// This plugin is generic over a physics backend `B` which provides the
/// actual physics operations (ray casting, velocity access, etc.).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_capsule_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(CapsuleControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct CapsuleControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CapsuleControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CapsuleControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<state::CharacterController>();
        app.register_type::<state::Attachment>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<input::KeyBindings>();
        app.register_type::<input::LocomotionInput>();
        app.register_type::<basis::BasisSource>();
        app.register_type::<basis::LocomotionCamera>();

        app.add_event::<error::ControllerAttachFailed>();

        app.configure_sets(
            FixedUpdate,
            (
                CapsuleControllerSet::Preparation,
                CapsuleControllerSet::Input,
                CapsuleControllerSet::Sensors,
                CapsuleControllerSet::Movement,
                CapsuleControllerSet::Jump,
                CapsuleControllerSet::Constraint,
                CapsuleControllerSet::Finalize,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                (systems::attach_controllers::<B>, systems::sync_body_with_config::<B>)
                    .chain()
                    .in_set(CapsuleControllerSet::Preparation),
                input::sample_keyboard_input.in_set(CapsuleControllerSet::Input),
                systems::apply_locomotion::<B>.in_set(CapsuleControllerSet::Movement),
                systems::apply_jump::<B>.in_set(CapsuleControllerSet::Jump),
                systems::apply_upright_constraint::<B>.in_set(CapsuleControllerSet::Constraint),
                systems::sync_state_markers.in_set(CapsuleControllerSet::Finalize),
            ),
        );
    }
}

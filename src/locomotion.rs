//! Locomotion blending.
//!
//! Pure functions turning held keys, grounded state and the current velocity
//! into the next velocity (physics mode) or displacement (direct mode).
//! Systems call these once per tick; everything here is deterministic and
//! free of ECS access so it can be tested numerically.
//!
//! Only the horizontal (X/Z) plane is blended. The vertical component of the
//! velocity is carried through untouched; jumping and gravity own it.

use bevy::prelude::*;

use crate::basis::MovementBasis;
use crate::config::{AirControl, LocomotionConfig};
use crate::input::KeySnapshot;

/// Horizontal speed squared below which ground friction snaps to rest.
pub const STOP_SPEED_SQUARED: f32 = 1e-4;

/// Everything the blender needs about one tick.
#[derive(Debug, Clone, Copy)]
pub struct BlendInput {
    /// Normalized horizontal input direction, `None` without input.
    pub direction: Option<Vec3>,
    /// Target horizontal speed (sprint already applied).
    pub target_speed: f32,
    /// Grounded state probed this tick.
    pub grounded: bool,
    /// Tick duration in seconds.
    pub dt: f32,
}

impl BlendInput {
    /// Resolve keys and basis into a blend input.
    pub fn resolve(
        keys: &KeySnapshot,
        basis: &MovementBasis,
        config: &LocomotionConfig,
        grounded: bool,
        dt: f32,
    ) -> Self {
        Self {
            direction: input_direction(keys, basis),
            target_speed: target_speed(keys, config),
            grounded,
            dt,
        }
    }

    /// Whether any steering input is present.
    #[inline]
    pub fn has_input(&self) -> bool {
        self.direction.is_some()
    }

    /// Desired horizontal velocity (zero without input).
    #[inline]
    pub fn desired_velocity(&self) -> Vec3 {
        self.direction
            .map(|direction| direction * self.target_speed)
            .unwrap_or(Vec3::ZERO)
    }
}

/// Sum the basis vectors selected by the held keys and normalize.
///
/// Returns `None` when no key is held or opposite keys cancel out; a zero
/// vector is never normalized.
pub fn input_direction(keys: &KeySnapshot, basis: &MovementBasis) -> Option<Vec3> {
    let mut direction = Vec3::ZERO;
    if keys.forward {
        direction += basis.forward;
    }
    if keys.backward {
        direction -= basis.forward;
    }
    if keys.right {
        direction += basis.right;
    }
    if keys.left {
        direction -= basis.right;
    }
    direction.try_normalize()
}

/// Move speed, multiplied by the sprint multiplier while sprinting.
pub fn target_speed(keys: &KeySnapshot, config: &LocomotionConfig) -> f32 {
    if keys.sprint {
        config.move_speed() * config.sprint_multiplier()
    } else {
        config.move_speed()
    }
}

/// Split a velocity into its horizontal part (y = 0) and vertical speed.
#[inline]
pub fn split_velocity(velocity: Vec3) -> (Vec3, f32) {
    (Vec3::new(velocity.x, 0.0, velocity.z), velocity.y)
}

/// Recombine a blended horizontal velocity with the untouched vertical speed.
#[inline]
pub fn recombine(horizontal: Vec3, vertical: f32) -> Vec3 {
    Vec3::new(horizontal.x, vertical, horizontal.z)
}

/// Exponential-style ground friction decay, snapping to rest.
pub fn apply_ground_friction(horizontal: Vec3, friction: f32, dt: f32) -> Vec3 {
    let factor = (1.0 - friction * dt).clamp(0.0, 1.0);
    let decayed = horizontal * factor;
    if decayed.length_squared() < STOP_SPEED_SQUARED {
        Vec3::ZERO
    } else {
        decayed
    }
}

/// Airborne steering toward `desired` under the given policy.
pub fn apply_air_control(
    horizontal: Vec3,
    desired: Vec3,
    target_speed: f32,
    config: &LocomotionConfig,
    dt: f32,
) -> Vec3 {
    let delta = desired - horizontal;
    match config.air_control() {
        AirControl::SpeedCap { responsiveness } => {
            let corrected =
                horizontal + delta * config.air_control_factor() * dt * responsiveness;
            if corrected.length_squared() > target_speed * target_speed {
                corrected.normalize_or_zero() * target_speed
            } else {
                corrected
            }
        }
        AirControl::Acceleration => {
            let max_change = config.acceleration() * dt;
            horizontal + delta.clamp_length_max(max_change)
        }
    }
}

/// Physics mode: next full velocity of the rigid body.
///
/// | state            | horizontal result                         |
/// |------------------|-------------------------------------------|
/// | grounded + input | `direction * target_speed` (instant snap) |
/// | grounded, idle   | ground friction decay                     |
/// | airborne + input | [`apply_air_control`]                     |
/// | airborne, idle   | unchanged (momentum is conserved)         |
pub fn blend_physics_velocity(
    current: Vec3,
    input: &BlendInput,
    config: &LocomotionConfig,
) -> Vec3 {
    let (horizontal, vertical) = split_velocity(current);

    let blended = match (input.grounded, input.has_input()) {
        (true, true) => input.desired_velocity(),
        (true, false) => apply_ground_friction(horizontal, config.ground_friction(), input.dt),
        (false, true) => apply_air_control(
            horizontal,
            input.desired_velocity(),
            input.target_speed,
            config,
            input.dt,
        ),
        (false, false) => horizontal,
    };

    recombine(blended, vertical)
}

/// Direct mode: world-space displacement for this tick.
///
/// No ground, air or friction logic applies, and nothing persists between
/// ticks: without input the displacement is zero.
pub fn direct_displacement(input: &BlendInput) -> Vec3 {
    input.desired_velocity() * input.dt
}

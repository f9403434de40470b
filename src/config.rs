//! Controller configuration components.
//!
//! This module defines the tunable configuration for capsule controllers:
//! speeds, friction, air control, jump, capsule dimensions, ground probing
//! and rotation locking. Every field is clamped at the setter boundary, so
//! the per-tick systems never re-validate anything.

use bevy::prelude::*;

use crate::capsule::CapsuleGeometry;

/// Minimum capsule radius.
pub const MIN_CAPSULE_RADIUS: f32 = 0.1;

/// Minimum extra ground probe distance below the capsule.
pub const MIN_GROUND_CHECK_DISTANCE: f32 = 0.01;

/// Reference responsiveness for the speed-capped air control policy.
pub const DEFAULT_AIR_RESPONSIVENESS: f32 = 10.0;

/// Bitset of collision layers considered "ground" by the ground probe.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// No layer. A probe with this mask never hits.
    pub const NONE: Self = Self(0);

    /// Mask containing a single layer (0..32).
    pub const fn layer(index: u32) -> Self {
        Self(1 << (index % 32))
    }

    /// Union of two masks.
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether any layer is shared between the two masks.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// How the controller integrates movement.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementMode {
    /// Drive the rigid body's velocity and let the solver resolve contacts.
    #[default]
    Physics,
    /// Translate the transform directly (non-collidable fly mode).
    Direct,
}

/// Policy applied to horizontal velocity while airborne with steering input.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum AirControl {
    /// Move a fraction of the way toward the desired velocity each tick,
    /// scaled by `air_control_factor * dt * responsiveness`, then cap the
    /// horizontal speed at the target speed.
    SpeedCap {
        /// Responsiveness constant `K`.
        responsiveness: f32,
    },
    /// Clamp the per-tick velocity change to `acceleration * dt`.
    /// Preserves inertia more faithfully than [`AirControl::SpeedCap`].
    Acceleration,
}

impl Default for AirControl {
    fn default() -> Self {
        Self::SpeedCap {
            responsiveness: DEFAULT_AIR_RESPONSIVENESS,
        }
    }
}

/// Rigid body type requested from the physics backend.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves.
    Static,
    /// Moved by the controller, ignores forces.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Rigid body settings pushed to the backend at attach time and whenever
/// the config changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySettings {
    /// Body type.
    pub kind: BodyKind,
    /// Whether world gravity applies.
    pub use_gravity: bool,
    /// Body mass.
    pub mass: f32,
    /// Linear damping (the controller does its own friction).
    pub linear_damping: f32,
    /// Angular damping.
    pub angular_damping: f32,
}

/// Configuration parameters for a capsule controller.
///
/// Fields are private: use the `set_*` setters (live tuning) or the `with_*`
/// builders (spawn time). Both clamp to valid ranges and silently ignore
/// non-finite values.
///
/// # Example
///
/// ```rust
/// use msg_capsule_controller::prelude::*;
///
/// let mut config = LocomotionConfig::default().with_capsule(0.5, 2.0);
/// config.set_capsule_radius(1.5);
/// // Raising the radius raised the height to keep the capsule valid.
/// assert_eq!(config.capsule_height(), 3.0);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct LocomotionConfig {
    // === Movement ===
    move_speed: f32,
    sprint_multiplier: f32,
    acceleration: f32,
    ground_friction: f32,
    air_control_factor: f32,
    air_control: AirControl,

    // === Jump ===
    jump_impulse: f32,

    // === Body ===
    mass: f32,
    freeze_rotation: bool,
    allow_yaw_spin: bool,
    mode: MovementMode,

    // === Capsule ===
    capsule_radius: f32,
    capsule_height: f32,
    eye_height_ratio: f32,

    // === Ground probe ===
    ground_check_distance: f32,
    skin_width: f32,
    ground_layers: LayerMask,

    // === Input ===
    input_enabled: bool,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_multiplier: 1.8,
            acceleration: 50.0,
            ground_friction: 8.0,
            air_control_factor: 0.3,
            air_control: AirControl::default(),

            jump_impulse: 7.0,

            mass: 80.0,
            freeze_rotation: true,
            allow_yaw_spin: false,
            mode: MovementMode::Physics,

            capsule_radius: 0.4,
            capsule_height: 1.8,
            eye_height_ratio: 0.9,

            ground_check_distance: 0.15,
            skin_width: 0.05,
            ground_layers: LayerMask::ALL,

            input_enabled: true,
        }
    }
}

/// Applies `f` only when `value` is finite.
#[inline]
fn finite(value: f32, f: impl FnOnce(f32)) {
    if value.is_finite() {
        f(value);
    }
}

impl LocomotionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config tuned like a collidable first-person walker.
    pub fn first_person() -> Self {
        Self::default()
    }

    /// Config for a free-flying camera body: direct translation, faster.
    pub fn free_fly() -> Self {
        Self::default()
            .with_mode(MovementMode::Direct)
            .with_move_speed(8.0)
            .with_sprint_multiplier(2.5)
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    /// Base movement speed (units/second).
    #[inline]
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Multiplier applied to the speed while the sprint key is held.
    #[inline]
    pub fn sprint_multiplier(&self) -> f32 {
        self.sprint_multiplier
    }

    /// Horizontal acceleration used by [`AirControl::Acceleration`].
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Ground friction rate applied while grounded without input.
    #[inline]
    pub fn ground_friction(&self) -> f32 {
        self.ground_friction
    }

    /// Fraction of steering authority available while airborne (0..=1).
    #[inline]
    pub fn air_control_factor(&self) -> f32 {
        self.air_control_factor
    }

    /// Airborne steering policy.
    #[inline]
    pub fn air_control(&self) -> AirControl {
        self.air_control
    }

    /// Vertical velocity added by a jump.
    #[inline]
    pub fn jump_impulse(&self) -> f32 {
        self.jump_impulse
    }

    /// Rigid body mass.
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Whether angular velocity is suppressed every tick.
    #[inline]
    pub fn freeze_rotation(&self) -> bool {
        self.freeze_rotation
    }

    /// Whether yaw spin survives the rotation freeze.
    #[inline]
    pub fn allow_yaw_spin(&self) -> bool {
        self.allow_yaw_spin
    }

    /// Integration mode.
    #[inline]
    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Convenience for `mode() == MovementMode::Physics`.
    #[inline]
    pub fn uses_physics_movement(&self) -> bool {
        self.mode == MovementMode::Physics
    }

    /// Capsule radius.
    #[inline]
    pub fn capsule_radius(&self) -> f32 {
        self.capsule_radius
    }

    /// Total capsule height, always `>= 2 * radius`.
    #[inline]
    pub fn capsule_height(&self) -> f32 {
        self.capsule_height
    }

    /// Eye height as a fraction of the capsule height.
    #[inline]
    pub fn eye_height_ratio(&self) -> f32 {
        self.eye_height_ratio
    }

    /// Extra probe distance below the capsule's lower sphere.
    #[inline]
    pub fn ground_check_distance(&self) -> f32 {
        self.ground_check_distance
    }

    /// Margin added to the ground probe to absorb contact tolerance.
    #[inline]
    pub fn skin_width(&self) -> f32 {
        self.skin_width
    }

    /// Layers treated as ground.
    #[inline]
    pub fn ground_layers(&self) -> LayerMask {
        self.ground_layers
    }

    /// Whether keyboard input drives the controller.
    #[inline]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Capsule geometry derived from radius and height.
    #[inline]
    pub fn capsule(&self) -> CapsuleGeometry {
        CapsuleGeometry::new(self.capsule_radius, self.capsule_height)
    }

    /// Rigid body settings for the current mode.
    ///
    /// Physics mode wants a dynamic body under gravity; direct mode wants a
    /// kinematic body that gravity never touches.
    pub fn body_settings(&self) -> BodySettings {
        let (kind, use_gravity) = match self.mode {
            MovementMode::Physics => (BodyKind::Dynamic, true),
            MovementMode::Direct => (BodyKind::Kinematic, false),
        };
        BodySettings {
            kind,
            use_gravity,
            mass: self.mass,
            linear_damping: 0.0,
            angular_damping: 1.0,
        }
    }

    // ------------------------------------------------------------------
    // Validated setters
    // ------------------------------------------------------------------

    /// Set the base move speed (clamped to `>= 0`).
    pub fn set_move_speed(&mut self, speed: f32) {
        finite(speed, |v| self.move_speed = v.max(0.0));
    }

    /// Set the sprint multiplier (clamped to `>= 1`).
    pub fn set_sprint_multiplier(&mut self, multiplier: f32) {
        finite(multiplier, |v| self.sprint_multiplier = v.max(1.0));
    }

    /// Set the airborne acceleration (clamped to `>= 0`).
    pub fn set_acceleration(&mut self, acceleration: f32) {
        finite(acceleration, |v| self.acceleration = v.max(0.0));
    }

    /// Set the ground friction rate (clamped to `>= 0`).
    pub fn set_ground_friction(&mut self, friction: f32) {
        finite(friction, |v| self.ground_friction = v.max(0.0));
    }

    /// Set the air control factor (clamped to `0..=1`).
    pub fn set_air_control_factor(&mut self, factor: f32) {
        finite(factor, |v| self.air_control_factor = v.clamp(0.0, 1.0));
    }

    /// Set the airborne steering policy.
    pub fn set_air_control(&mut self, policy: AirControl) {
        self.air_control = match policy {
            AirControl::SpeedCap { responsiveness } if responsiveness.is_finite() => {
                AirControl::SpeedCap {
                    responsiveness: responsiveness.max(0.0),
                }
            }
            AirControl::SpeedCap { .. } => return,
            AirControl::Acceleration => AirControl::Acceleration,
        };
    }

    /// Set the jump impulse (clamped to `>= 0`).
    pub fn set_jump_impulse(&mut self, impulse: f32) {
        finite(impulse, |v| self.jump_impulse = v.max(0.0));
    }

    /// Set the body mass (clamped to `>= 1`).
    pub fn set_mass(&mut self, mass: f32) {
        finite(mass, |v| self.mass = v.max(1.0));
    }

    /// Enable or disable the rotation freeze.
    pub fn set_freeze_rotation(&mut self, freeze: bool) {
        self.freeze_rotation = freeze;
    }

    /// Keep yaw spin when the rotation freeze is enabled.
    pub fn set_allow_yaw_spin(&mut self, allow: bool) {
        self.allow_yaw_spin = allow;
    }

    /// Select the integration mode.
    pub fn set_mode(&mut self, mode: MovementMode) {
        self.mode = mode;
    }

    /// Set the capsule radius (clamped to `>= 0.1`).
    ///
    /// If the new radius exceeds half the height, the height is raised to
    /// `2 * radius`.
    pub fn set_capsule_radius(&mut self, radius: f32) {
        finite(radius, |v| {
            self.capsule_radius = v.max(MIN_CAPSULE_RADIUS);
            self.capsule_height = self.capsule_height.max(2.0 * self.capsule_radius);
        });
    }

    /// Set the capsule height (clamped to `>= 2 * radius`).
    pub fn set_capsule_height(&mut self, height: f32) {
        finite(height, |v| {
            self.capsule_height = v.max(2.0 * self.capsule_radius);
        });
    }

    /// Set the eye height ratio (clamped to `0..=1`).
    pub fn set_eye_height_ratio(&mut self, ratio: f32) {
        finite(ratio, |v| self.eye_height_ratio = v.clamp(0.0, 1.0));
    }

    /// Set the ground check distance (clamped to `>= 0.01`).
    pub fn set_ground_check_distance(&mut self, distance: f32) {
        finite(distance, |v| {
            self.ground_check_distance = v.max(MIN_GROUND_CHECK_DISTANCE)
        });
    }

    /// Set the skin width (clamped to `>= 0`).
    pub fn set_skin_width(&mut self, skin: f32) {
        finite(skin, |v| self.skin_width = v.max(0.0));
    }

    /// Set the ground layer mask.
    pub fn set_ground_layers(&mut self, layers: LayerMask) {
        self.ground_layers = layers;
    }

    /// Enable or disable input.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Builder: set move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.set_move_speed(speed);
        self
    }

    /// Builder: set sprint multiplier.
    pub fn with_sprint_multiplier(mut self, multiplier: f32) -> Self {
        self.set_sprint_multiplier(multiplier);
        self
    }

    /// Builder: set airborne acceleration.
    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.set_acceleration(acceleration);
        self
    }

    /// Builder: set ground friction.
    pub fn with_ground_friction(mut self, friction: f32) -> Self {
        self.set_ground_friction(friction);
        self
    }

    /// Builder: set air control factor and policy.
    pub fn with_air_control(mut self, factor: f32, policy: AirControl) -> Self {
        self.set_air_control_factor(factor);
        self.set_air_control(policy);
        self
    }

    /// Builder: set jump impulse.
    pub fn with_jump_impulse(mut self, impulse: f32) -> Self {
        self.set_jump_impulse(impulse);
        self
    }

    /// Builder: set body mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.set_mass(mass);
        self
    }

    /// Builder: set the rotation freeze and yaw spin allowance.
    pub fn with_rotation_lock(mut self, freeze: bool, allow_yaw_spin: bool) -> Self {
        self.freeze_rotation = freeze;
        self.allow_yaw_spin = allow_yaw_spin;
        self
    }

    /// Builder: set integration mode.
    pub fn with_mode(mut self, mode: MovementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: set capsule radius then height.
    pub fn with_capsule(mut self, radius: f32, height: f32) -> Self {
        self.set_capsule_radius(radius);
        self.set_capsule_height(height);
        self
    }

    /// Builder: set eye height ratio.
    pub fn with_eye_height_ratio(mut self, ratio: f32) -> Self {
        self.set_eye_height_ratio(ratio);
        self
    }

    /// Builder: set ground probe distance and skin width.
    pub fn with_ground_probe(mut self, distance: f32, skin_width: f32) -> Self {
        self.set_ground_check_distance(distance);
        self.set_skin_width(skin_width);
        self
    }

    /// Builder: set ground layers.
    pub fn with_ground_layers(mut self, layers: LayerMask) -> Self {
        self.ground_layers = layers;
        self
    }

    /// Builder: enable or disable input.
    pub fn with_input_enabled(mut self, enabled: bool) -> Self {
        self.input_enabled = enabled;
        self
    }
}

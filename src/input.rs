//! Keyboard input components.
//!
//! The controller reads digital keys only. Each simulation tick the held
//! state of every bound key is sampled once into a [`KeySnapshot`];
//! [`LocomotionInput`] keeps the current and the previous snapshot so the
//! jump trigger can detect a strict rising edge without any external
//! "just pressed" utility.
//!
//! Input does not have to come from a keyboard: AI, replays and tests can
//! call [`LocomotionInput::sample`] with any snapshot.

use bevy::prelude::*;

/// Key bindings for one controller.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct KeyBindings {
    /// Move along the basis forward.
    pub forward: KeyCode,
    /// Move against the basis forward.
    pub backward: KeyCode,
    /// Strafe left.
    pub left: KeyCode,
    /// Strafe right.
    pub right: KeyCode,
    /// Jump (rising edge only).
    pub jump: KeyCode,
    /// Hold to sprint.
    pub sprint: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            jump: KeyCode::Space,
            sprint: KeyCode::ShiftLeft,
        }
    }
}

impl KeyBindings {
    /// Arrow keys for movement, right shift to sprint.
    pub fn arrows() -> Self {
        Self {
            forward: KeyCode::ArrowUp,
            backward: KeyCode::ArrowDown,
            left: KeyCode::ArrowLeft,
            right: KeyCode::ArrowRight,
            jump: KeyCode::Space,
            sprint: KeyCode::ShiftRight,
        }
    }

    /// Sample the held state of every bound key.
    pub fn snapshot(&self, keys: &ButtonInput<KeyCode>) -> KeySnapshot {
        KeySnapshot {
            forward: keys.pressed(self.forward),
            backward: keys.pressed(self.backward),
            left: keys.pressed(self.left),
            right: keys.pressed(self.right),
            jump: keys.pressed(self.jump),
            sprint: keys.pressed(self.sprint),
        }
    }
}

/// Held state of every tracked key at one tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySnapshot {
    /// Forward key held.
    pub forward: bool,
    /// Backward key held.
    pub backward: bool,
    /// Left key held.
    pub left: bool,
    /// Right key held.
    pub right: bool,
    /// Jump key held.
    pub jump: bool,
    /// Sprint key held.
    pub sprint: bool,
}

impl KeySnapshot {
    /// Snapshot with nothing held.
    pub const RELEASED: Self = Self {
        forward: false,
        backward: false,
        left: false,
        right: false,
        jump: false,
        sprint: false,
    };

    /// Builder: hold forward.
    pub fn with_forward(mut self) -> Self {
        self.forward = true;
        self
    }

    /// Builder: hold backward.
    pub fn with_backward(mut self) -> Self {
        self.backward = true;
        self
    }

    /// Builder: hold left.
    pub fn with_left(mut self) -> Self {
        self.left = true;
        self
    }

    /// Builder: hold right.
    pub fn with_right(mut self) -> Self {
        self.right = true;
        self
    }

    /// Builder: hold jump.
    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    /// Builder: hold sprint.
    pub fn with_sprint(mut self) -> Self {
        self.sprint = true;
        self
    }

    /// Whether any movement key is held.
    pub fn any_movement(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Two-slot input state for one controller.
///
/// # Example
///
/// ```rust
/// use msg_capsule_controller::prelude::*;
///
/// let mut input = LocomotionInput::default();
/// input.sample(KeySnapshot::default().with_jump());
/// assert!(input.jump_just_pressed());
///
/// // Still held on the next tick: no new edge.
/// input.sample(KeySnapshot::default().with_jump());
/// assert!(!input.jump_just_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub struct LocomotionInput {
    current: KeySnapshot,
    previous: KeySnapshot,
}

impl LocomotionInput {
    /// Create input with every key released in both slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's snapshot, shifting the old one into `previous`.
    ///
    /// Call exactly once per simulation tick.
    pub fn sample(&mut self, snapshot: KeySnapshot) {
        self.previous = self.current;
        self.current = snapshot;
    }

    /// Replace this tick's snapshot without shifting.
    ///
    /// Useful when several input sources are merged within one tick.
    pub fn overwrite(&mut self, snapshot: KeySnapshot) {
        self.current = snapshot;
    }

    /// This tick's snapshot.
    #[inline]
    pub fn current(&self) -> KeySnapshot {
        self.current
    }

    /// Last tick's snapshot.
    #[inline]
    pub fn previous(&self) -> KeySnapshot {
        self.previous
    }

    /// Jump key down this tick and up the previous tick.
    #[inline]
    pub fn jump_just_pressed(&self) -> bool {
        self.current.jump && !self.previous.jump
    }

    /// Sprint key held this tick.
    #[inline]
    pub fn sprinting(&self) -> bool {
        self.current.sprint
    }
}

/// Sample the keyboard into every controller that has [`KeyBindings`].
///
/// Runs once per fixed tick. Without a `ButtonInput<KeyCode>` resource
/// (headless servers, tests driving [`LocomotionInput`] directly) this is a
/// no-op.
pub fn sample_keyboard_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut q_inputs: Query<(&KeyBindings, &mut LocomotionInput)>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    for (bindings, mut input) in &mut q_inputs {
        input.sample(bindings.snapshot(&keyboard));
    }
}

//! In-memory physics backend for integration tests.
//!
//! Bodies are plain components, ground is a list of infinite horizontal
//! planes in a resource, and nothing integrates on its own: velocity only
//! changes when the controller (or a test) writes it. That makes every
//! tick's effect exactly observable.

#![allow(dead_code)]

use bevy::prelude::*;
use msg_capsule_controller::collision::CollisionData;
use msg_capsule_controller::detection::{record_probe, wants_ground_probe, GroundProbe};
use msg_capsule_controller::prelude::*;

/// Rigid body stand-in. Its presence is what makes an entity a "body".
#[derive(Component, Debug, Clone, Copy)]
pub struct MockBody {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub settings: Option<BodySettings>,
    pub capsule: Option<CapsuleGeometry>,
    pub is_trigger: bool,
    pub force: Vec3,
    pub configure_calls: u32,
}

impl Default for MockBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            settings: None,
            capsule: None,
            is_trigger: false,
            force: Vec3::ZERO,
            configure_calls: 0,
        }
    }
}

/// Infinite horizontal ground plane.
#[derive(Debug, Clone, Copy)]
pub struct MockGround {
    pub height: f32,
    pub layers: LayerMask,
    pub entity: Option<Entity>,
}

/// Physics service stand-in. Its presence is what makes physics "available".
#[derive(Resource, Debug, Clone)]
pub struct MockPhysics {
    pub dt: f32,
    pub grounds: Vec<MockGround>,
}

impl Default for MockPhysics {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            grounds: Vec::new(),
        }
    }
}

impl MockPhysics {
    /// Nearest plane hit by a probe, if any.
    pub fn cast(&self, probe: &GroundProbe) -> Option<CollisionData> {
        self.grounds
            .iter()
            .filter(|ground| ground.height <= probe.origin.y)
            .map(|ground| (ground, probe.origin.y - ground.height))
            .filter(|(ground, distance)| probe.accepts(*distance, ground.layers))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(ground, distance)| {
                CollisionData::new(distance, Vec3::Y, probe.point_at(distance), ground.entity)
            })
    }
}

pub struct MockBackend;

impl CharacterPhysicsBackend for MockBackend {
    fn plugin() -> impl Plugin {
        MockBackendPlugin
    }

    fn validate_attachment(world: &mut World, entity: Entity) -> Result<(), AttachError> {
        if world.get::<Transform>(entity).is_none() {
            return Err(AttachError::MissingTransform(entity));
        }
        if world.get::<MockBody>(entity).is_none() {
            return Err(AttachError::MissingRigidBody(entity));
        }
        if !world.contains_resource::<MockPhysics>() {
            return Err(AttachError::MissingPhysics);
        }
        Ok(())
    }

    fn configure_body(world: &mut World, entity: Entity, settings: &BodySettings) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.settings = Some(*settings);
            body.configure_calls += 1;
        }
    }

    fn apply_capsule(world: &mut World, entity: Entity, capsule: &CapsuleGeometry, is_trigger: bool) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.capsule = Some(*capsule);
            body.is_trigger = is_trigger;
        }
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<MockBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<MockBody>(entity)
            .map(|b| b.angular_velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_angular_velocity(world: &mut World, entity: Entity, angular_velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.angular_velocity = angular_velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            let mass = body.settings.map(|s| s.mass).unwrap_or(1.0);
            body.velocity += impulse / mass;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.force += force;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Option<Vec3> {
        world.get::<Transform>(entity).map(|t| t.translation)
    }

    fn translate(world: &mut World, entity: Entity, delta: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += delta;
        }
    }

    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<MockPhysics>()
            .map(|p| p.dt)
            .unwrap_or(1.0 / 60.0)
    }
}

pub struct MockBackendPlugin;

impl Plugin for MockBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            mock_ground_detection.in_set(CapsuleControllerSet::Sensors),
        );
    }
}

fn mock_ground_detection(
    physics: Option<Res<MockPhysics>>,
    mut q_controllers: Query<(Option<&Transform>, &LocomotionConfig, &mut CharacterController)>,
) {
    for (transform, config, mut controller) in &mut q_controllers {
        if !wants_ground_probe(&controller, config) {
            if controller.is_attached() {
                record_probe(&mut controller, None);
            }
            continue;
        }

        let hit = match (&physics, transform) {
            (Some(physics), Some(transform)) => {
                physics.cast(&GroundProbe::new(config, transform.translation))
            }
            _ => None,
        };
        record_probe(&mut controller, hit);
    }
}

// ==================== App helpers ====================

/// App with the controller plugin over the mock backend and a physics
/// service with no ground.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(CapsuleControllerPlugin::<MockBackend>::default());
    app.insert_resource(MockPhysics::default());
    app.finish();
    app.cleanup();
    app
}

/// Add an infinite ground plane at `height` on every layer.
pub fn add_ground(app: &mut App, height: f32) {
    add_ground_on_layers(app, height, LayerMask::ALL);
}

/// Add an infinite ground plane at `height` on the given layers.
pub fn add_ground_on_layers(app: &mut App, height: f32, layers: LayerMask) {
    app.world_mut()
        .resource_mut::<MockPhysics>()
        .grounds
        .push(MockGround {
            height,
            layers,
            entity: None,
        });
}

/// Set the fixed timestep seen by the controller.
pub fn set_dt(app: &mut App, dt: f32) {
    app.world_mut().resource_mut::<MockPhysics>().dt = dt;
}

/// Spawn a character at `position` with default config.
pub fn spawn_character(app: &mut App, position: Vec3) -> Entity {
    spawn_character_with_config(app, position, LocomotionConfig::default())
}

/// Spawn a character at `position` with a custom config.
pub fn spawn_character_with_config(app: &mut App, position: Vec3, config: LocomotionConfig) -> Entity {
    let transform = Transform::from_translation(position);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            CharacterController::new(),
            config,
            LocomotionInput::default(),
            MockBody::default(),
        ))
        .id()
}

/// Run one fixed tick.
pub fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Run `n` fixed ticks.
pub fn run_ticks(app: &mut App, n: usize) {
    for _ in 0..n {
        tick(app);
    }
}

/// Feed this tick's key snapshot, then run the tick.
pub fn tick_with_keys(app: &mut App, entity: Entity, keys: KeySnapshot) {
    if let Some(mut input) = app.world_mut().get_mut::<LocomotionInput>(entity) {
        input.sample(keys);
    }
    tick(app);
}

pub fn body(app: &App, entity: Entity) -> MockBody {
    *app.world().get::<MockBody>(entity).unwrap()
}

pub fn controller(app: &App, entity: Entity) -> CharacterController {
    app.world().get::<CharacterController>(entity).unwrap().clone()
}

pub fn set_velocity(app: &mut App, entity: Entity, velocity: Vec3) {
    app.world_mut().get_mut::<MockBody>(entity).unwrap().velocity = velocity;
}

pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

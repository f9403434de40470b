//! First Person Example
//!
//! A playable capsule character in a walled room featuring:
//! - A floor
//! - A raised platform to jump onto
//! - A few loose crates to push around
//!
//! ## Controls
//! - **WASD**: Move relative to the camera yaw
//! - **Shift** (hold): Sprint
//! - **Space**: Jump
//! - **Mouse**: Look around
//! - **F**: Toggle fly mode
//!
//! The camera sits at the character's eye height.

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use msg_capsule_controller::prelude::*;

// ==================== Constants ====================

const ROOM_HALF_SIZE: f32 = 15.0;
const WALL_HEIGHT: f32 = 3.0;

const PLATFORM_HALF_SIZE: Vec3 = Vec3::new(2.0, 0.4, 2.0);
const PLATFORM_POSITION: Vec3 = Vec3::new(4.0, 0.4, -6.0);

const MOUSE_SENSITIVITY: f32 = 0.003;

// ==================== Components ====================

#[derive(Component)]
struct Player;

/// Accumulated look angles for the camera.
#[derive(Component, Default)]
struct Look {
    yaw: f32,
    pitch: f32,
}

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "First Person - Capsule Controller Example".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
        .add_plugins(RapierDebugRenderPlugin::default())
        // Character controller
        .add_plugins(CapsuleControllerPlugin::<Rapier3dBackend>::default())
        // Systems
        .add_systems(Startup, setup)
        .add_systems(Update, (mouse_look, toggle_fly_mode, follow_player).chain())
        .add_systems(Update, report_attach_failures)
        .run();
}

// ==================== Setup ====================

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    spawn_room(&mut commands, &mut meshes, &mut materials);
    spawn_player(&mut commands);

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.6, 0.0),
        Look::default(),
        LocomotionCamera,
    ));

    commands.spawn((
        Text::new("WASD: Move | Shift: Sprint | Space: Jump | F: Toggle fly"),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
}

fn spawn_room(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let floor = Vec3::new(ROOM_HALF_SIZE, 0.1, ROOM_HALF_SIZE);
    spawn_static_box(commands, meshes, materials, Vec3::new(0.0, -0.1, 0.0), floor, Color::srgb(0.3, 0.35, 0.3));

    let wall_x = Vec3::new(0.2, WALL_HEIGHT / 2.0, ROOM_HALF_SIZE);
    let wall_z = Vec3::new(ROOM_HALF_SIZE, WALL_HEIGHT / 2.0, 0.2);
    let wall_color = Color::srgb(0.5, 0.5, 0.55);
    for sign in [-1.0, 1.0] {
        let x = Vec3::new(sign * ROOM_HALF_SIZE, WALL_HEIGHT / 2.0, 0.0);
        let z = Vec3::new(0.0, WALL_HEIGHT / 2.0, sign * ROOM_HALF_SIZE);
        spawn_static_box(commands, meshes, materials, x, wall_x, wall_color);
        spawn_static_box(commands, meshes, materials, z, wall_z, wall_color);
    }

    spawn_static_box(
        commands,
        meshes,
        materials,
        PLATFORM_POSITION,
        PLATFORM_HALF_SIZE,
        Color::srgb(0.6, 0.45, 0.3),
    );

    let crate_half = Vec3::splat(0.4);
    for (i, x) in [-3.0, -1.5, 0.0].into_iter().enumerate() {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(crate_half * 2.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.7, 0.55, 0.2))),
            Transform::from_xyz(x, 0.4 + i as f32 * 0.05, 4.0),
            RigidBody::Dynamic,
            Collider::cuboid(crate_half.x, crate_half.y, crate_half.z),
        ));
    }
}

fn spawn_static_box(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    position: Vec3,
    half_size: Vec3,
    color: Color,
) {
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(half_size * 2.0))),
        MeshMaterial3d(materials.add(color)),
        Transform::from_translation(position),
        RigidBody::Fixed,
        Collider::cuboid(half_size.x, half_size.y, half_size.z),
    ));
}

fn spawn_player(commands: &mut Commands) {
    let config = LocomotionConfig::first_person().with_move_speed(5.0);

    commands.spawn((
        Player,
        Transform::from_xyz(0.0, 0.1, 6.0),
        CharacterController::new(),
        config,
        KeyBindings::default(),
        LocomotionInput::default(),
        BasisSource::ActiveCamera,
        Rapier3dCharacterBundle::from_config(&config),
    ));
}

// ==================== Systems ====================

fn mouse_look(motion: Res<AccumulatedMouseMotion>, mut q_camera: Query<(&mut Look, &mut Transform)>) {
    for (mut look, mut transform) in &mut q_camera {
        look.yaw -= motion.delta.x * MOUSE_SENSITIVITY;
        look.pitch = (look.pitch - motion.delta.y * MOUSE_SENSITIVITY).clamp(-1.5, 1.5);
        transform.rotation = Quat::from_euler(EulerRot::YXZ, look.yaw, look.pitch, 0.0);
    }
}

fn toggle_fly_mode(keys: Res<ButtonInput<KeyCode>>, mut q_player: Query<&mut LocomotionConfig, With<Player>>) {
    if !keys.just_pressed(KeyCode::KeyF) {
        return;
    }
    for mut config in &mut q_player {
        let next = match config.mode() {
            MovementMode::Physics => MovementMode::Direct,
            MovementMode::Direct => MovementMode::Physics,
        };
        config.set_mode(next);
        info!("movement mode: {next:?}");
    }
}

fn follow_player(
    q_player: Query<(&Transform, &LocomotionConfig), With<Player>>,
    mut q_camera: Query<&mut Transform, (With<LocomotionCamera>, Without<Player>)>,
) {
    let Ok((player, config)) = q_player.single() else {
        return;
    };
    let eye = player.translation + Vec3::Y * config.capsule_height() * config.eye_height_ratio();
    for mut camera in &mut q_camera {
        camera.translation = eye;
    }
}

fn report_attach_failures(mut events: EventReader<ControllerAttachFailed>) {
    for event in events.read() {
        warn!("controller on {} did not attach: {}", event.entity, event.error);
    }
}

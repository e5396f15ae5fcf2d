use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;
use bevy_leap::prelude::*;

fn main() -> AppExit {
    App::new()
        .add_plugins((
            DefaultPlugins,
            PhysicsPlugins::default(),
            EnhancedInputPlugin,
            LeapPlugin::default(),
        ))
        .add_input_context::<PlayerInput>()
        .add_systems(Startup, (setup_level, spawn_player))
        .add_systems(Update, (log_signals, respawn_dead_player))
        .run()
}

const SPAWN: Vec3 = vec3(0.0, 1.0, 0.0);

#[derive(Component, Default)]
struct PlayerInput;

fn spawn_player(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        CharacterController {
            rotation_speed: 120.0,
            // Clip lengths of the attack animations
            attack_durations: [
                Some(core::time::Duration::from_millis(400)),
                Some(core::time::Duration::from_millis(600)),
                None,
            ],
            ..default()
        },
        Collider::cylinder(0.4, 1.8),
        Transform::from_translation(SPAWN),
        Mesh3d(meshes.add(Cylinder::new(0.4, 1.8))),
        MeshMaterial3d(materials.add(Color::srgb(0.8, 0.4, 0.2))),
        PlayerInput,
        actions!(PlayerInput[
            (
                Action::<Movement>::new(),
                DeadZone::default(),
                Bindings::spawn((Cardinal::wasd_keys(), Axial::left_stick())),
            ),
            (
                Action::<Jump>::new(),
                bindings![KeyCode::Space, GamepadButton::South],
            ),
            (
                Action::<CloseAttack>::new(),
                bindings![KeyCode::Digit1, GamepadButton::West],
            ),
            (
                Action::<MidAttack>::new(),
                bindings![KeyCode::Digit2, GamepadButton::North],
            ),
            (
                Action::<RangedAttack>::new(),
                bindings![KeyCode::Digit3, GamepadButton::East],
            ),
        ]),
    ));
}

fn setup_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 12.0, 18.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Transform::from_xyz(0.0, 1.0, 0.0).looking_at(vec3(1.0, -2.0, -2.0), Vec3::Y),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
    ));

    let ground = materials.add(Color::srgb(0.3, 0.5, 0.3));
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(40.0, 1.0, 40.0),
        Transform::from_xyz(0.0, -0.5, 0.0),
        Mesh3d(meshes.add(Cuboid::new(40.0, 1.0, 40.0))),
        MeshMaterial3d(ground.clone()),
    ));

    // A low step that is safe to jump off and a tower that is not.
    for (height, x) in [(2.0, -6.0), (8.0, 6.0)] {
        commands.spawn((
            RigidBody::Static,
            Collider::cuboid(4.0, height, 4.0),
            Transform::from_xyz(x, height / 2.0, -6.0),
            Mesh3d(meshes.add(Cuboid::new(4.0, height, 4.0))),
            MeshMaterial3d(ground.clone()),
        ));
    }
}

fn log_signals(mut signals: MessageReader<AnimationSignal>) {
    for signal in signals.read() {
        info!("{}: {:?}", signal.entity, signal.trigger);
    }
}

fn respawn_dead_player(
    mut commands: Commands,
    players: Query<(Entity, &CharacterControllerState), With<PlayerInput>>,
    meshes: ResMut<Assets<Mesh>>,
    materials: ResMut<Assets<StandardMaterial>>,
    input: Res<ButtonInput<KeyCode>>,
) {
    if !input.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Ok((player, state)) = players.single() else {
        return;
    };
    if state.dead {
        commands.entity(player).despawn();
        spawn_player(commands, meshes, materials);
    }
}

#![doc = include_str!("../readme.md")]

/// Everything you need to get started with `bevy_leap`
pub mod prelude {
    pub(crate) use {
        avian3d::prelude::*,
        bevy_app::prelude::*,
        bevy_derive::{Deref, DerefMut},
        bevy_ecs::prelude::*,
        bevy_enhanced_input::prelude::*,
        bevy_math::prelude::*,
        bevy_reflect::prelude::*,
        bevy_time::prelude::*,
        bevy_transform::prelude::*,
        bevy_utils::prelude::*,
    };

    pub use crate::{
        CharacterController, CharacterControllerState, LeapPlugin, LeapSystems,
        attack::{AttackKind, AttackLock},
        input::{AccumulatedInput, CloseAttack, Jump, MidAttack, Movement, RangedAttack},
        jump::JumpPhase,
        signal::{AnimationParameters, AnimationSignal, AnimationTrigger},
    };
}

use crate::prelude::*;
use avian3d::character_controller::move_and_slide::MoveHitData;
use bevy_ecs::{
    intern::Interned, lifecycle::HookContext,
    relationship::RelationshipSourceCollection as _, schedule::ScheduleLabel, world::DeferredWorld,
};
use core::time::Duration;

pub mod attack;
mod fixed_step;
pub mod flight;
mod frame;
pub mod input;
pub mod jump;
mod kcc;
pub mod sensor;
pub mod signal;

/// Fallback wind-up before a jump when no duration is configured.
pub const DEFAULT_JUMP_PREPARE_DURATION: Duration = Duration::from_millis(200);
/// Fallback attack lock when a variant has no duration configured.
pub const DEFAULT_ATTACK_DURATION: Duration = Duration::from_millis(500);

/// Also requires you to add [`PhysicsPlugins`] and [`EnhancedInputPlugin`] to work properly.
pub struct LeapPlugin {
    schedule: Interned<dyn ScheduleLabel>,
}

impl LeapPlugin {
    /// Create a new plugin whose fixed step runs in the given schedule. The default is [`FixedPostUpdate`].
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Default for LeapPlugin {
    fn default() -> Self {
        Self {
            schedule: FixedPostUpdate.intern(),
        }
    }
}

impl Plugin for LeapPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            self.schedule,
            LeapSystems::MoveCharacters.in_set(PhysicsSystems::First),
        )
        .configure_sets(Update, LeapSystems::FrameTick)
        .add_plugins((
            signal::plugin,
            input::plugin,
            frame::plugin,
            kcc::plugin(self.schedule),
            fixed_step::plugin,
        ));
    }
}

/// System sets used by all systems of `bevy_leap`.
#[derive(SystemSet, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum LeapSystems {
    /// Ground probe, flight tracking, attack sampling and timers. Runs every frame.
    FrameTick,
    /// Landing, locomotion, jumping, gravity and the physics move. Runs every fixed step.
    MoveCharacters,
}

/// Per-entity tuning. The defaults match a humanoid of roughly two units in height.
#[derive(Component, Clone, Reflect, Debug)]
#[reflect(Component)]
#[require(
    AccumulatedInput,
    CharacterControllerState,
    AnimationParameters,
    TranslationInterpolation,
    RigidBody = RigidBody::Kinematic,
    Collider = Collider::cylinder(0.7, 1.8),
    CustomPositionIntegration,
    Transform,
    SpeculativeMargin::ZERO,
)]
#[component(on_add=CharacterController::on_add)]
pub struct CharacterController {
    /// Ground speed in units per second at full forward input.
    pub speed: f32,
    /// Turn rate in degrees per second at full turn input.
    pub rotation_speed: f32,
    /// Upward velocity applied when a prepared jump is released.
    pub jump_force: f32,
    pub gravity: f32,
    /// Largest drop from the airborne peak that the character survives.
    pub max_safe_fall_height: f32,
    /// Wind-up before a jump, usually the length of the jump clip.
    /// Falls back to [`DEFAULT_JUMP_PREPARE_DURATION`].
    pub jump_prepare_duration: Option<Duration>,
    /// Lock duration per [`AttackKind`], usually the length of each attack clip.
    /// Falls back to [`DEFAULT_ATTACK_DURATION`].
    pub attack_durations: [Option<Duration>; 3],
    /// Length of the downward ray that decides whether the character is flying.
    pub ground_probe_distance: f32,
    pub filter: SpatialQueryFilter,
    pub ground_distance: f32,
    pub min_walk_cos: f32,
    pub move_and_slide: MoveAndSlideConfig,
    pub max_speed: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            speed: 5.0,
            rotation_speed: 20.0,
            jump_force: 8.0,
            gravity: 20.0,
            max_safe_fall_height: 5.0,
            jump_prepare_duration: None,
            attack_durations: [None; 3],
            ground_probe_distance: 0.2,
            filter: SpatialQueryFilter::default(),
            ground_distance: 0.05,
            min_walk_cos: 0.766,
            move_and_slide: MoveAndSlideConfig {
                skin_width: 0.0075,
                ..default()
            },
            max_speed: 100.0,
        }
    }
}

impl CharacterController {
    pub fn jump_prepare_duration(&self) -> Duration {
        self.jump_prepare_duration
            .unwrap_or(DEFAULT_JUMP_PREPARE_DURATION)
    }

    pub fn attack_duration(&self, kind: AttackKind) -> Duration {
        self.attack_durations[kind.index()].unwrap_or(DEFAULT_ATTACK_DURATION)
    }

    pub fn on_add(mut world: DeferredWorld, ctx: HookContext) {
        {
            let Some(mut kcc) = world.get_mut::<Self>(ctx.entity) else {
                return;
            };
            kcc.filter.excluded_entities.add(ctx.entity);
        }

        let spawn_elevation = world
            .get::<Transform>(ctx.entity)
            .map(|transform| transform.translation.y)
            .unwrap_or_default();

        let Some(collider) = world.entity(ctx.entity).get::<Collider>().cloned() else {
            return;
        };
        let aabb = collider.aabb(default(), Rotation::default());
        let half_height = (aabb.max.y - aabb.min.y) / 2.0;

        let Some(mut state) = world.get_mut::<CharacterControllerState>(ctx.entity) else {
            return;
        };
        state.collider = collider;
        state.feet_offset = half_height;
        state.max_jump_elevation = spawn_elevation;
        state.landing_elevation = spawn_elevation;
    }
}

/// Flags and elevation bookkeeping shared by every state machine of one character.
///
/// Only the systems of this crate write to it. Read [`Self::dead`] to react to a fall death.
#[derive(Component, Clone, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct CharacterControllerState {
    /// Terminal. Once set, neither the frame tick nor the fixed step touches the character again.
    pub dead: bool,
    /// Set as soon as the ground probe misses, cleared on the landing step.
    pub flying: bool,
    pub preparing_to_jump: bool,
    pub can_jump: bool,
    pub attacking: bool,
    /// Highest elevation seen while flying.
    pub max_jump_elevation: f32,
    pub landing_elevation: f32,
    /// Engine-side ground contact, refreshed after every move.
    pub grounded: Option<MoveHitData>,
    /// Distance from the transform origin down to the bottom of the collider.
    pub feet_offset: f32,
    #[reflect(ignore)]
    pub collider: Collider,
    pub jump_preparation: Option<Timer>,
    pub attack_lock: Option<AttackLock>,
}

impl CharacterControllerState {
    pub fn jump_phase(&self) -> JumpPhase {
        if self.can_jump {
            JumpPhase::Ready
        } else if self.preparing_to_jump {
            JumpPhase::Preparing
        } else {
            JumpPhase::Idle
        }
    }

    /// Marks the character dead and drops any pending timed transition.
    pub(crate) fn die(&mut self) {
        self.dead = true;
        self.preparing_to_jump = false;
        self.can_jump = false;
        self.jump_preparation = None;
        self.attack_lock = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_durations_fall_back_to_defaults() {
        let cfg = CharacterController {
            attack_durations: [Some(Duration::from_millis(350)), None, None],
            ..default()
        };

        assert_eq!(cfg.jump_prepare_duration(), DEFAULT_JUMP_PREPARE_DURATION);
        assert_eq!(cfg.attack_duration(AttackKind::Close), Duration::from_millis(350));
        assert_eq!(cfg.attack_duration(AttackKind::Mid), DEFAULT_ATTACK_DURATION);
        assert_eq!(cfg.attack_duration(AttackKind::Ranged), DEFAULT_ATTACK_DURATION);
    }

    #[test]
    fn jump_phase_follows_the_flags() {
        let mut state = CharacterControllerState::default();
        assert_eq!(state.jump_phase(), JumpPhase::Idle);

        state.preparing_to_jump = true;
        assert_eq!(state.jump_phase(), JumpPhase::Preparing);

        state.preparing_to_jump = false;
        state.can_jump = true;
        assert_eq!(state.jump_phase(), JumpPhase::Ready);
    }

    #[test]
    fn dying_drops_pending_transitions() {
        let mut state = CharacterControllerState {
            preparing_to_jump: true,
            jump_preparation: Some(Timer::new(DEFAULT_JUMP_PREPARE_DURATION, TimerMode::Once)),
            ..default()
        };

        state.die();

        assert!(state.dead);
        assert_eq!(state.jump_phase(), JumpPhase::Idle);
        assert!(state.jump_preparation.is_none());
    }
}

use bevy_ecs::{intern::Interned, schedule::ScheduleLabel};
use core::time::Duration;
use tracing::{debug, warn};

use crate::{
    CharacterControllerState,
    flight::{self, Landing},
    jump::{self, JumpAction},
    prelude::*,
};

pub(super) fn plugin(schedule: Interned<dyn ScheduleLabel>) -> impl Fn(&mut App) {
    move |app: &mut App| {
        app.add_systems(schedule, run_kcc.in_set(LeapSystems::MoveCharacters));
    }
}

#[derive(Debug)]
struct Ctx {
    orientation: Transform,
    cfg: CharacterController,
    input: AccumulatedInput,
    dt: f32,
    dt_duration: Duration,
}

/// Decision half of a fixed step.
#[derive(Debug, PartialEq)]
enum Step {
    /// Dead or attack-locked: not even gravity runs.
    Skipped,
    /// The landing was fatal. Nothing after it runs.
    FallDeath(Landing),
    Move(MoveReport),
}

#[derive(Debug, Default, PartialEq)]
struct MoveReport {
    landing: Option<Landing>,
    jump: Option<JumpAction>,
    /// Yaw to apply this step, in radians.
    yaw: f32,
    /// Forward and turn axes, only set on grounded steps.
    axes: Option<Vec2>,
}

fn run_kcc(
    mut kccs: Query<(
        Entity,
        &CharacterController,
        &mut CharacterControllerState,
        &AccumulatedInput,
        &mut AnimationParameters,
        &mut Transform,
        &mut LinearVelocity,
    )>,
    time: Res<Time>,
    move_and_slide: MoveAndSlide,
    mut signals: MessageWriter<AnimationSignal>,
) {
    for (entity, cfg, mut state, input, mut params, mut transform, mut velocity) in &mut kccs {
        let ctx = Ctx {
            orientation: *transform,
            cfg: cfg.clone(),
            input: input.clone(),
            dt: time.delta_secs(),
            dt_duration: time.delta(),
        };

        let grounded = state.grounded.is_some();
        let report = match plan_step(&mut velocity, &mut state, grounded, &ctx) {
            Step::Skipped => continue,
            Step::FallDeath(landing) => {
                debug!("{entity}: died falling {:.2}", landing.fall_height());
                params.is_flying = false;
                signals.write(AnimationSignal {
                    entity,
                    trigger: AnimationTrigger::FallDeath,
                });
                continue;
            }
            Step::Move(report) => report,
        };

        if report.landing.is_some() {
            params.is_flying = false;
            signals.write(AnimationSignal {
                entity,
                trigger: AnimationTrigger::Landing,
            });
        }
        if report.jump == Some(JumpAction::PreparationStarted) {
            signals.write(AnimationSignal {
                entity,
                trigger: AnimationTrigger::Jump,
            });
        }
        if let Some(axes) = report.axes {
            params.movement = axes.x;
            params.rotation = axes.y;
        }
        transform.rotate_y(report.yaw);

        depenetrate_character(&mut transform, &move_and_slide, &state, &ctx);
        validate_velocity(&mut velocity, &ctx);
        move_character(&mut transform, &mut velocity, &move_and_slide, &state, &ctx);
        update_grounded(&transform, &velocity, &move_and_slide, &mut state, &ctx);
    }
}

/// Everything the fixed step decides before the physics move: landing verdict, walking, turning, jumping and
/// gravity. `grounded` is the kcc contact flag from the previous move, not the ground probe.
fn plan_step(
    velocity: &mut Vec3,
    state: &mut CharacterControllerState,
    grounded: bool,
    ctx: &Ctx,
) -> Step {
    if state.dead || state.attacking {
        return Step::Skipped;
    }

    let mut report = MoveReport::default();
    if grounded {
        if state.flying {
            let landing = flight::land(state, ctx.orientation.translation.y, &ctx.cfg);
            if landing.is_fatal() {
                return Step::FallDeath(landing);
            }
            report.landing = Some(landing);
        }

        let forward = ctx.input.forward();
        let turn = ctx.input.turn();
        *velocity = walk_direction(&ctx.orientation) * forward * ctx.cfg.speed;

        report.jump = jump::handle_jump(velocity, ctx.input.jump_held, state, &ctx.cfg);
        // Positive turn is to the right, which is a negative yaw.
        report.yaw = -(turn * ctx.cfg.rotation_speed).to_radians() * ctx.dt;
        report.axes = Some(vec2(forward, turn));
    }

    velocity.y -= ctx.cfg.gravity * ctx.dt;
    Step::Move(report)
}

fn walk_direction(orientation: &Transform) -> Vec3 {
    let mut forward = Vec3::from(orientation.forward());
    forward.y = 0.0;
    forward.normalize_or_zero()
}

fn depenetrate_character(
    transform: &mut Transform,
    move_and_slide: &MoveAndSlide,
    state: &CharacterControllerState,
    ctx: &Ctx,
) {
    let offset = move_and_slide.depenetrate(
        &state.collider,
        transform.translation,
        transform.rotation,
        &((&ctx.cfg.move_and_slide).into()),
        &ctx.cfg.filter,
    );
    transform.translation += offset;
}

fn move_character(
    transform: &mut Transform,
    velocity: &mut Vec3,
    move_and_slide: &MoveAndSlide,
    state: &CharacterControllerState,
    ctx: &Ctx,
) {
    let mut config = ctx.cfg.move_and_slide.clone();
    if let Some(grounded) = state.grounded {
        config.planes.push(Dir3::new_unchecked(grounded.normal1));
    }

    let out = move_and_slide.move_and_slide(
        &state.collider,
        transform.translation,
        transform.rotation,
        *velocity,
        ctx.dt_duration,
        &config,
        &ctx.cfg.filter,
        |_| true,
    );
    transform.translation = out.position;
    *velocity = out.projected_velocity;
}

/// Refreshes the kcc contact flag. Moving upwards never counts as grounded.
fn update_grounded(
    transform: &Transform,
    velocity: &Vec3,
    move_and_slide: &MoveAndSlide,
    state: &mut CharacterControllerState,
    ctx: &Ctx,
) {
    if velocity.y > 0.0 {
        state.grounded = None;
        return;
    }

    let cast_dir = Dir3::NEG_Y;
    let cast_dist = ctx.cfg.ground_distance;
    let hit = move_and_slide.cast_move(
        &state.collider,
        transform.translation,
        transform.rotation,
        cast_dir * cast_dist,
        ctx.cfg.move_and_slide.skin_width,
        &ctx.cfg.filter,
    );
    state.grounded = hit.filter(|hit| hit.normal1.y >= ctx.cfg.min_walk_cos);
}

fn validate_velocity(velocity: &mut Vec3, ctx: &Ctx) {
    for i in 0..3 {
        if !velocity[i].is_finite() {
            warn!("velocity[{i}] is not finite: {}, setting to 0", velocity[i]);
            velocity[i] = 0.0;
        }
    }
    *velocity = velocity.clamp_length(0.0, ctx.cfg.max_speed);
}

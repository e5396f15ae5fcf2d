use core::time::Duration;
use tracing::debug;

use crate::{
    CharacterControllerState,
    attack::{self, AttackKind},
    flight, jump,
    prelude::*,
    sensor::{apply_probe, probe_ground},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, run_frame_tick.in_set(LeapSystems::FrameTick));
}

/// What one frame tick decided for one character.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FrameReport {
    pub attack_started: Option<AttackKind>,
    pub attack_released: Option<AttackKind>,
    pub jump_armed: bool,
}

/// Frame-rate half of the controller: sensing, attack input and the timed transitions.
fn run_frame_tick(
    mut kccs: Query<(
        Entity,
        &CharacterController,
        &mut CharacterControllerState,
        &mut AccumulatedInput,
        &mut AnimationParameters,
        &Transform,
    )>,
    spatial_query: SpatialQuery,
    time: Res<Time>,
    mut signals: MessageWriter<AnimationSignal>,
) {
    for (entity, cfg, mut state, mut input, mut params, transform) in &mut kccs {
        // Presses are edges: whatever this frame does not use is gone.
        let pressed = input.take_attack();
        if state.dead {
            continue;
        }

        let supported = probe_ground(&spatial_query, transform.translation, cfg, &state);
        let in_contact = state.grounded.is_some();
        let elevation = transform.translation.y;
        let report = frame_tick(
            &mut state,
            cfg,
            supported,
            in_contact,
            elevation,
            pressed,
            time.delta(),
        );
        params.is_flying = state.flying;

        if let Some(kind) = report.attack_started {
            signals.write(AnimationSignal {
                entity,
                trigger: kind.trigger(),
            });
        }
        if report.jump_armed {
            debug!("{entity}: jump armed at {elevation:.2}");
        }
        if let Some(kind) = report.attack_released {
            debug!("{entity}: {kind:?} attack lock released");
        }
    }
}

/// Probe result first, then the flight peak, then attack input, then the timers. Timers tick last so a transition
/// that completes this frame is seen by the next fixed step, never by the sampling above it.
///
/// `supported` is the ground probe, `in_contact` the kcc contact flag left by the last fixed step.
pub(crate) fn frame_tick(
    state: &mut CharacterControllerState,
    cfg: &CharacterController,
    supported: bool,
    in_contact: bool,
    elevation: f32,
    pressed: Option<AttackKind>,
    delta: Duration,
) -> FrameReport {
    if state.dead {
        return FrameReport::default();
    }
    apply_probe(state, supported);
    flight::track_peak_elevation(state, elevation);
    FrameReport {
        attack_started: attack::sample_attack(state, pressed, in_contact, cfg),
        jump_armed: jump::tick_jump_preparation(state, elevation, delta),
        attack_released: attack::tick_attack_lock(state, delta),
    }
}

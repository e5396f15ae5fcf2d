//! Jump wind-up and release.
//!
//! Holding jump on the ground starts a wind-up timer (the jump clip plays meanwhile). When it runs out the jump is
//! armed, and the next grounded fixed step launches the character.

use core::time::Duration;
use tracing::{debug, trace};

use crate::{CharacterControllerState, prelude::*};

/// Derived from the state flags, see [`CharacterControllerState::jump_phase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub enum JumpPhase {
    Idle,
    Preparing,
    Ready,
}

/// What a grounded fixed step did about jumping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JumpAction {
    Launched,
    PreparationStarted,
}

/// Runs on grounded fixed steps only. An armed jump is launched before a held button is looked at, so a finished
/// wind-up always wins over starting a new one.
pub(crate) fn handle_jump(
    velocity: &mut Vec3,
    jump_held: bool,
    state: &mut CharacterControllerState,
    cfg: &CharacterController,
) -> Option<JumpAction> {
    if state.can_jump {
        velocity.y = cfg.jump_force;
        state.can_jump = false;
        debug!("jump launched at {:.2}", cfg.jump_force);
        return Some(JumpAction::Launched);
    }

    if !jump_held {
        return None;
    }
    if state.preparing_to_jump {
        trace!("jump held while already preparing");
        return None;
    }

    let duration = cfg.jump_prepare_duration();
    state.preparing_to_jump = true;
    state.jump_preparation = Some(Timer::new(duration, TimerMode::Once));
    trace!("jump preparation started for {duration:?}");
    Some(JumpAction::PreparationStarted)
}

/// Advances the wind-up. Returns `true` on the tick the jump becomes armed.
pub(crate) fn tick_jump_preparation(
    state: &mut CharacterControllerState,
    elevation: f32,
    delta: Duration,
) -> bool {
    let Some(timer) = state.jump_preparation.as_mut() else {
        return false;
    };
    if !timer.tick(delta).is_finished() {
        return false;
    }
    state.jump_preparation = None;
    state.preparing_to_jump = false;

    if state.dead {
        return false;
    }
    // Arming mid-air would reset the peak of a flight that is still going on.
    if state.flying {
        debug!("jump preparation finished in the air, dropping it");
        return false;
    }

    state.max_jump_elevation = elevation;
    state.can_jump = true;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(20);

    fn wind_up(state: &mut CharacterControllerState, cfg: &CharacterController) {
        let mut velocity = Vec3::ZERO;
        assert_eq!(
            handle_jump(&mut velocity, true, state, cfg),
            Some(JumpAction::PreparationStarted)
        );
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn prepared_jump_launches_once() {
        let cfg = CharacterController::default();
        let mut state = CharacterControllerState::default();

        wind_up(&mut state, &cfg);
        assert_eq!(state.jump_phase(), JumpPhase::Preparing);

        // 0.2s default wind-up
        let mut armed = false;
        for _ in 0..10 {
            armed |= tick_jump_preparation(&mut state, 0.0, STEP);
        }
        assert!(armed);
        assert_eq!(state.jump_phase(), JumpPhase::Ready);
        assert_eq!(state.max_jump_elevation, 0.0);

        let mut velocity = Vec3::new(1.0, -0.3, 0.0);
        assert_eq!(
            handle_jump(&mut velocity, false, &mut state, &cfg),
            Some(JumpAction::Launched)
        );
        assert_eq!(velocity.y, cfg.jump_force);
        assert!(!state.can_jump);
        assert_eq!(state.jump_phase(), JumpPhase::Idle);
    }

    #[test]
    fn not_armed_before_the_wind_up_ends() {
        let cfg = CharacterController {
            jump_prepare_duration: Some(Duration::from_millis(100)),
            ..default()
        };
        let mut state = CharacterControllerState::default();
        wind_up(&mut state, &cfg);

        for _ in 0..4 {
            assert!(!tick_jump_preparation(&mut state, 0.0, STEP));
        }
        assert!(!state.can_jump);
        assert!(tick_jump_preparation(&mut state, 0.0, STEP));
    }

    #[test]
    fn holding_jump_while_preparing_starts_one_timer() {
        let cfg = CharacterController::default();
        let mut state = CharacterControllerState::default();
        wind_up(&mut state, &cfg);
        tick_jump_preparation(&mut state, 0.0, Duration::from_millis(150));

        let mut velocity = Vec3::ZERO;
        assert_eq!(handle_jump(&mut velocity, true, &mut state, &cfg), None);

        let elapsed = state.jump_preparation.as_ref().map(Timer::elapsed);
        assert_eq!(elapsed, Some(Duration::from_millis(150)), "timer was not restarted");
    }

    #[test]
    fn armed_jump_wins_over_held_button() {
        let cfg = CharacterController::default();
        let mut state = CharacterControllerState {
            can_jump: true,
            ..default()
        };
        let mut velocity = Vec3::ZERO;

        assert_eq!(
            handle_jump(&mut velocity, true, &mut state, &cfg),
            Some(JumpAction::Launched)
        );
        assert!(!state.preparing_to_jump);
        assert!(state.jump_preparation.is_none());
    }

    #[test]
    fn wind_up_resets_the_peak_to_the_current_elevation() {
        let cfg = CharacterController::default();
        let mut state = CharacterControllerState {
            max_jump_elevation: 12.0,
            ..default()
        };
        wind_up(&mut state, &cfg);

        assert!(tick_jump_preparation(&mut state, 4.0, cfg.jump_prepare_duration()));
        assert_eq!(state.max_jump_elevation, 4.0);
    }

    #[test]
    fn wind_up_finishing_in_the_air_is_dropped() {
        let cfg = CharacterController::default();
        let mut state = CharacterControllerState {
            max_jump_elevation: 3.0,
            ..default()
        };
        wind_up(&mut state, &cfg);
        state.flying = true;

        assert!(!tick_jump_preparation(&mut state, 1.0, cfg.jump_prepare_duration()));
        assert!(!state.can_jump);
        assert!(!state.preparing_to_jump);
        assert_eq!(state.max_jump_elevation, 3.0);
    }
}

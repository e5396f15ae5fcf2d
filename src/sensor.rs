//! Explicit ground probe.
//!
//! The kcc's own contact flag flickers on bumps and shallow slopes, so flight is decided by a short ray from the
//! feet instead. The contact flag still gates the fixed step, see `kcc`.

use tracing::trace;

use crate::{CharacterControllerState, prelude::*};

/// Casts the probe ray for a character standing at `translation`. Returns whether anything supports it.
pub fn probe_ground(
    spatial_query: &SpatialQuery,
    translation: Vec3,
    cfg: &CharacterController,
    state: &CharacterControllerState,
) -> bool {
    let feet = translation - Vec3::Y * state.feet_offset;
    spatial_query
        .cast_ray(
            feet,
            Dir3::NEG_Y,
            cfg.ground_probe_distance,
            true,
            &cfg.filter,
        )
        .is_some()
}

/// Applies a probe result. A miss puts the character in flight and revokes a prepared jump.
///
/// A hit changes nothing here: leaving flight is the landing step's job.
pub(crate) fn apply_probe(state: &mut CharacterControllerState, supported: bool) {
    if supported {
        return;
    }
    if !state.flying {
        trace!("ground probe missed, character is flying");
    }
    state.flying = true;
    state.can_jump = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_starts_flight_and_revokes_jump() {
        let mut state = CharacterControllerState {
            can_jump: true,
            ..default()
        };
        apply_probe(&mut state, false);

        assert!(state.flying);
        assert!(!state.can_jump);
    }

    #[test]
    fn hit_does_not_land() {
        let mut state = CharacterControllerState {
            flying: true,
            can_jump: false,
            ..default()
        };
        apply_probe(&mut state, true);

        assert!(state.flying, "only the fixed step may clear flight");
    }
}

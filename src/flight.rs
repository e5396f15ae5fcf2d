//! Peak tracking while airborne and the fall-death verdict on landing.

use tracing::{debug, info};

use crate::{CharacterControllerState, prelude::*};

/// Outcome of touching down after a flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Landing {
    Survived { drop: f32 },
    FallDeath { drop: f32 },
}

impl Landing {
    pub fn fall_height(self) -> f32 {
        match self {
            Self::Survived { drop } | Self::FallDeath { drop } => drop,
        }
    }

    pub fn is_fatal(self) -> bool {
        matches!(self, Self::FallDeath { .. })
    }
}

/// Raises the recorded peak while flying. A no-op on the ground.
pub(crate) fn track_peak_elevation(state: &mut CharacterControllerState, elevation: f32) {
    if state.flying {
        state.max_jump_elevation = state.max_jump_elevation.max(elevation);
    }
}

/// Ends a flight at `elevation`. Must only be called on the step where the character is grounded again while still
/// flagged as flying, so the verdict is taken once per landing.
pub(crate) fn land(
    state: &mut CharacterControllerState,
    elevation: f32,
    cfg: &CharacterController,
) -> Landing {
    state.flying = false;
    state.can_jump = false;
    state.landing_elevation = elevation;

    let drop = (state.landing_elevation - state.max_jump_elevation).abs();
    if drop > cfg.max_safe_fall_height {
        info!(
            "fell {drop:.2} from {:.2}, more than the safe {:.2}",
            state.max_jump_elevation, cfg.max_safe_fall_height
        );
        state.die();
        return Landing::FallDeath { drop };
    }

    debug!("landed after a drop of {drop:.2}");
    state.max_jump_elevation = elevation;
    Landing::Survived { drop }
}

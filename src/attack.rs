//! Attack variants and the action lock they hold while their clip plays.

use core::time::Duration;
use tracing::{debug, trace};

use crate::{CharacterControllerState, prelude::*, signal::AnimationTrigger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum AttackKind {
    Close,
    Mid,
    Ranged,
}

impl AttackKind {
    /// Sampling priority, highest first.
    pub const ALL: [Self; 3] = [Self::Close, Self::Mid, Self::Ranged];

    pub const fn index(self) -> usize {
        match self {
            Self::Close => 0,
            Self::Mid => 1,
            Self::Ranged => 2,
        }
    }

    /// The animator names its cues one slot off from the variants.
    pub const fn trigger(self) -> AnimationTrigger {
        match self {
            Self::Close => AnimationTrigger::Attack,
            Self::Mid => AnimationTrigger::CloseAttack,
            Self::Ranged => AnimationTrigger::RangedAttack,
        }
    }
}

/// A running attack. Dropping it ends the lock without clearing [`CharacterControllerState::attacking`].
#[derive(Clone, Debug, Reflect)]
pub struct AttackLock {
    pub kind: AttackKind,
    pub timer: Timer,
}

/// Looks at this frame's press, if any, and starts its lock.
///
/// Nothing is evaluated while flying, dead or already locked. `in_contact` is the kcc contact flag, which drops on the
/// launch step while the feet are still within probe range.
pub(crate) fn sample_attack(
    state: &mut CharacterControllerState,
    pressed: Option<AttackKind>,
    in_contact: bool,
    cfg: &CharacterController,
) -> Option<AttackKind> {
    if state.dead || state.flying {
        return None;
    }
    let kind = pressed?;
    if !in_contact {
        trace!("{kind:?} attack pressed without ground contact");
        return None;
    }
    if state.attacking {
        trace!("{kind:?} attack pressed during an active lock");
        return None;
    }

    let duration = cfg.attack_duration(kind);
    state.attacking = true;
    state.attack_lock = Some(AttackLock {
        kind,
        timer: Timer::new(duration, TimerMode::Once),
    });
    debug!("{kind:?} attack, locked for {duration:?}");
    Some(kind)
}

/// Advances the lock. Returns the variant whose lock ended on this tick.
pub(crate) fn tick_attack_lock(
    state: &mut CharacterControllerState,
    delta: Duration,
) -> Option<AttackKind> {
    let lock = state.attack_lock.as_mut()?;
    if !lock.timer.tick(delta).is_finished() {
        return None;
    }
    let kind = lock.kind;
    state.attack_lock = None;
    if state.dead {
        return None;
    }
    state.attacking = false;
    Some(kind)
}

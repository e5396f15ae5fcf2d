//! Outputs for whatever drives the character's animations.
//!
//! Nothing in this crate reads these back; they only mirror what the state machines decided.

use crate::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<AnimationSignal>();
}

/// One-shot animation cue.
#[derive(Clone, Copy, Reflect, Debug, PartialEq, Eq, Hash)]
pub enum AnimationTrigger {
    /// Jump wind-up started.
    Jump,
    Landing,
    FallDeath,
    Attack,
    CloseAttack,
    RangedAttack,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationSignal {
    pub entity: Entity,
    pub trigger: AnimationTrigger,
}

/// Continuous animation parameters, overwritten every tick that computes them.
#[derive(Component, Clone, Copy, Reflect, Default, Debug, PartialEq)]
#[reflect(Component)]
pub struct AnimationParameters {
    pub is_flying: bool,
    /// Forward axis used on the last grounded fixed step.
    pub movement: f32,
    /// Turn axis used on the last grounded fixed step.
    pub rotation: f32,
}

use crate::{attack::AttackKind, fixed_step::fixed_step_ran_this_frame, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_observer(apply_movement)
        .add_observer(apply_jump)
        .add_observer(apply_attack::<CloseAttack>)
        .add_observer(apply_attack::<MidAttack>)
        .add_observer(apply_attack::<RangedAttack>)
        .add_systems(
            RunFixedMainLoop,
            clear_accumulated_input
                .run_if(fixed_step_ran_this_frame)
                .in_set(RunFixedMainLoopSystems::AfterFixedMainLoop),
        );
}

/// `x` turns (positive is right), `y` walks (positive is forward).
#[derive(Debug, InputAction)]
#[action_output(Vec2)]
pub struct Movement;

/// Level triggered: holding it keeps requesting a jump.
#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct Jump;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct CloseAttack;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct MidAttack;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct RangedAttack;

/// Maps an attack action onto the variant it starts.
pub trait AttackAction: InputAction {
    const KIND: AttackKind;
}

impl AttackAction for CloseAttack {
    const KIND: AttackKind = AttackKind::Close;
}

impl AttackAction for MidAttack {
    const KIND: AttackKind = AttackKind::Mid;
}

impl AttackAction for RangedAttack {
    const KIND: AttackKind = AttackKind::Ranged;
}

/// Input gathered between ticks.
///
/// The continuous part is cleared after every fixed update loop, the attack presses after every frame tick.
/// Anything that is not a player (AI, replays, tests) can write this directly instead of going through actions.
#[derive(Component, Clone, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct AccumulatedInput {
    // The last non-zero move that was input since the last fixed update loop
    pub last_movement: Option<Vec2>,
    // Whether jump was held on any frame since the last fixed update loop
    pub jump_held: bool,
    // Attack buttons pressed this frame, indexed by `AttackKind::index`
    pub attacks_pressed: [bool; 3],
}

impl AccumulatedInput {
    pub fn forward(&self) -> f32 {
        self.last_movement.map_or(0.0, |movement| movement.y.clamp(-1.0, 1.0))
    }

    pub fn turn(&self) -> f32 {
        self.last_movement.map_or(0.0, |movement| movement.x.clamp(-1.0, 1.0))
    }

    pub fn press(&mut self, kind: AttackKind) {
        self.attacks_pressed[kind.index()] = true;
    }

    /// Takes this frame's presses. The highest priority variant wins.
    pub fn take_attack(&mut self) -> Option<AttackKind> {
        let pressed = core::mem::take(&mut self.attacks_pressed);
        AttackKind::ALL
            .into_iter()
            .find(|kind| pressed[kind.index()])
    }
}

fn apply_movement(
    movement: On<Fire<Movement>>,
    mut accumulated_inputs: Query<&mut AccumulatedInput>,
) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(movement.context) {
        accumulated_inputs.last_movement = Some(movement.value);
    }
}

fn apply_jump(jump: On<Fire<Jump>>, mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(jump.context) {
        accumulated_inputs.jump_held = true;
    }
}

fn apply_attack<A: AttackAction>(
    attack: On<Start<A>>,
    mut accumulated_inputs: Query<&mut AccumulatedInput>,
) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(attack.context) {
        accumulated_inputs.press(A::KIND);
    }
}

fn clear_accumulated_input(mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    for mut accumulated_input in &mut accumulated_inputs {
        *accumulated_input = AccumulatedInput {
            last_movement: default(),
            jump_held: default(),
            attacks_pressed: accumulated_input.attacks_pressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attack_in_priority_order_wins() {
        let mut input = AccumulatedInput::default();
        input.press(AttackKind::Ranged);
        input.press(AttackKind::Mid);

        assert_eq!(input.take_attack(), Some(AttackKind::Mid));
        assert_eq!(input.take_attack(), None, "presses are consumed");
    }

    #[test]
    fn axes_are_clamped() {
        let input = AccumulatedInput {
            last_movement: Some(Vec2::new(-3.0, 0.5)),
            ..default()
        };
        assert_eq!(input.turn(), -1.0);
        assert_eq!(input.forward(), 0.5);
        assert_eq!(AccumulatedInput::default().forward(), 0.0);
    }
}

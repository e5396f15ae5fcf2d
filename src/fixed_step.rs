use crate::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<FixedStepRanThisFrame>()
        .add_systems(PreUpdate, clear_fixed_step_flag)
        .add_systems(FixedPreUpdate, set_fixed_step_flag);
}

/// Whether at least one fixed step ran since the start of the current frame.
#[derive(Resource, Debug, Deref, DerefMut, Default)]
pub(crate) struct FixedStepRanThisFrame(bool);

fn clear_fixed_step_flag(mut ran: ResMut<FixedStepRanThisFrame>) {
    **ran = false;
}

fn set_fixed_step_flag(mut ran: ResMut<FixedStepRanThisFrame>) {
    **ran = true;
}

/// Run condition for anything that must only be consumed once the fixed step has seen it.
pub(crate) fn fixed_step_ran_this_frame(ran: Res<FixedStepRanThisFrame>) -> bool {
    **ran
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_time::{TimePlugin, TimeUpdateStrategy};
    use core::time::Duration;

    fn frame(app: &mut App, millis: u64) -> bool {
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(millis)));
        app.update();
        **app.world().resource::<FixedStepRanThisFrame>()
    }

    #[test]
    fn flag_only_covers_the_current_frame() {
        let mut app = App::new();
        // 15.625ms steps keep the accumulator exact.
        app.add_plugins((TimePlugin, plugin))
            .insert_resource(Time::<Fixed>::from_hz(64.0));

        // The first update may only start the clock.
        frame(&mut app, 50);
        assert!(frame(&mut app, 50));
        assert!(frame(&mut app, 50));

        // At most 9.375ms are left over, 1ms more is not enough for a step.
        assert!(!frame(&mut app, 1));
        assert!(frame(&mut app, 10));
    }
}

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use glyph_core::Viewport;

use super::field::GlyphField;
use super::host::{FrameDriver, FrameHost};
use super::state::AppState;

/// Ordering label for the per-frame simulation step (renderers run after it)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimulationStep;

/// Frame host backed by Bevy's Update schedule: a scheduled frame fires on the
/// next Update pass, and the clock is Bevy's virtual time.
#[derive(Debug, Default)]
pub struct BevyFrameHost {
    next_handle: u64,
    scheduled: Option<u64>,
    clock_ms: f64,
}

impl BevyFrameHost {
    /// Frame due on this pass, if any
    fn take_due(&mut self) -> Option<u64> {
        self.scheduled.take()
    }

    fn set_clock(&mut self, seconds: f64) {
        self.clock_ms = seconds * 1000.0;
    }
}

impl FrameHost for BevyFrameHost {
    type Handle = u64;

    fn schedule_frame(&mut self) -> u64 {
        self.next_handle = self.next_handle.wrapping_add(1);
        self.scheduled = Some(self.next_handle);
        self.next_handle
    }

    fn cancel_frame(&mut self, handle: u64) {
        if self.scheduled == Some(handle) {
            self.scheduled = None;
        }
    }

    fn now(&self) -> f64 {
        self.clock_ms
    }
}

/// The frame loop driving the [`GlyphField`] resource
#[derive(Resource)]
pub struct FrameLoop(pub FrameDriver<BevyFrameHost>);

impl Default for FrameLoop {
    fn default() -> Self {
        Self(FrameDriver::new(BevyFrameHost::default()))
    }
}

/// Bevy plugin for the simulation pipeline
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameLoop>()
            .add_systems(Startup, start_frame_loop)
            .add_systems(OnEnter(AppState::Running), resume_frame_loop)
            .add_systems(
                Update,
                (handle_resize, simulation_tick.after(handle_resize))
                    .in_set(SimulationStep)
                    .run_if(in_state(AppState::Running)),
            );
    }
}

fn window_viewport(window: &Window) -> Viewport {
    Viewport::new(window.width(), window.height(), window.scale_factor())
}

/// Size the field to the primary window and schedule the first frame
fn start_frame_loop(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut frame_loop: ResMut<FrameLoop>,
    mut field: ResMut<GlyphField>,
) {
    let Ok(window) = windows.get_single() else {
        warn!("No primary window; glyph field stays idle");
        return;
    };
    frame_loop.0.resize(&mut field, window_viewport(window));
}

/// Coming back from pause: do not integrate the time spent paused
fn resume_frame_loop(mut frame_loop: ResMut<FrameLoop>) {
    frame_loop.0.reset_clock();
}

/// Resize events cancel the pending frame and rebuild the field
fn handle_resize(
    mut events: EventReader<WindowResized>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut frame_loop: ResMut<FrameLoop>,
    mut field: ResMut<GlyphField>,
) {
    // Only the final size of a burst matters
    let Some(resized) = events.read().last() else {
        return;
    };
    let pixel_ratio = windows.get_single().map_or(1.0, |w| w.scale_factor());
    let viewport = Viewport::new(resized.width, resized.height, pixel_ratio);
    if viewport == field.viewport() {
        return;
    }
    frame_loop.0.resize(&mut field, viewport);
}

/// Fire the scheduled frame, if any
fn simulation_tick(mut frame_loop: ResMut<FrameLoop>, mut field: ResMut<GlyphField>, time: Res<Time>) {
    let driver = &mut frame_loop.0;
    driver.sync_stop();
    driver.host_mut().set_clock(time.elapsed_secs_f64());

    let Some(handle) = driver.host_mut().take_due() else {
        return;
    };
    driver.on_frame(handle, &mut field);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bevy_host_cancel_only_matching() {
        let mut host = BevyFrameHost::default();
        let first = host.schedule_frame();
        host.cancel_frame(first + 10);
        assert_eq!(host.scheduled, Some(first));
        host.cancel_frame(first);
        assert_eq!(host.take_due(), None);
    }

    #[test]
    fn test_bevy_host_clock_in_ms() {
        let mut host = BevyFrameHost::default();
        host.set_clock(1.5);
        assert_eq!(host.now(), 1500.0);
    }
}

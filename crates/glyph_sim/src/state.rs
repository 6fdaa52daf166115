use bevy::prelude::*;

/// Whether the frame loop is advancing the field
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Running,
    Paused,
}

use bevy::prelude::*;
use glyph_core::{Mode, SimConfig};
use glyph_render::plugin::GlyphRenderPlugin;
use glyph_sim::field::GlyphField;
use glyph_sim::pipeline::SimulationPlugin;
use glyph_sim::state::AppState;

fn main() {
    let mode = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<Mode>().unwrap_or_else(|err| {
            eprintln!("{err}; falling back to {}", Mode::default());
            Mode::default()
        }),
        None => Mode::default(),
    };
    let config = SimConfig::preset(mode);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "glyphfield".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.0)))
        .insert_resource(GlyphField::empty(config))
        .init_state::<AppState>()
        .add_plugins(SimulationPlugin)
        .add_plugins(GlyphRenderPlugin)
        .run();
}

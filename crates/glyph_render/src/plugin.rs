use bevy::prelude::*;
use glyph_sim::pipeline::SimulationStep;

use super::camera;
use super::frame::RenderFrame;
use super::glyphs::{self, GlyphPool};
use super::ui;

/// Draws the glyph field: one text entity per particle plus gizmo overlays
pub struct GlyphRenderPlugin;

impl Plugin for GlyphRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RenderFrame>()
            .init_resource::<GlyphPool>()
            .init_resource::<ui::HudThrottle>()
            .add_systems(Startup, (camera::spawn_camera, ui::spawn_hud))
            .add_systems(
                Update,
                (
                    glyphs::capture_frame,
                    glyphs::sync_glyph_entities,
                    glyphs::update_glyph_entities,
                    glyphs::draw_overlays,
                )
                    .chain()
                    .after(SimulationStep),
            )
            .add_systems(
                Update,
                (ui::control_system, ui::update_hud.after(SimulationStep)),
            );
    }
}

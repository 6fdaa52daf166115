use bevy::math::Isometry2d;
use bevy::prelude::*;
use glyph_core::Viewport;
use glyph_sim::field::GlyphField;

use super::frame::RenderFrame;

/// Marker for a glyph entity; `index` is the particle it mirrors
#[derive(Component)]
pub struct GlyphSprite {
    pub index: usize,
}

/// Which field generation the spawned glyph entities belong to
#[derive(Resource, Default)]
pub struct GlyphPool {
    generation: Option<u32>,
    count: usize,
}

/// Base font size relative to the glyph cell width
const FONT_SCALE: f32 = 1.1;

/// Simulation space is y-down from the top-left corner; Bevy 2D is y-up from the center
fn to_world(position: [f32; 2], viewport: &Viewport) -> Vec2 {
    Vec2::new(
        position[0] - viewport.width * 0.5,
        viewport.height * 0.5 - position[1],
    )
}

fn rgba(c: [f32; 4]) -> Color {
    Color::srgba(c[0], c[1], c[2], c[3])
}

/// Paint the field into the shared frame buffer
pub fn capture_frame(field: Res<GlyphField>, mut frame: ResMut<RenderFrame>) {
    frame.capture(&field);
}

/// Respawn glyph entities whenever the field is rebuilt
pub fn sync_glyph_entities(
    mut commands: Commands,
    frame: Res<RenderFrame>,
    mut pool: ResMut<GlyphPool>,
    sprites: Query<Entity, With<GlyphSprite>>,
) {
    let count = frame.glyphs.len();
    if pool.generation == Some(frame.generation) && pool.count == count {
        return;
    }

    for entity in sprites.iter() {
        commands.entity(entity).despawn();
    }

    let font_size = frame.glyph_width * FONT_SCALE;
    for glyph in &frame.glyphs {
        commands.spawn((
            Text2d::new(glyph.glyph.to_string()),
            TextFont { font_size, ..default() },
            TextColor(rgba(glyph.color)),
            Transform::default(),
            GlyphSprite { index: glyph.index },
        ));
    }

    pool.generation = Some(frame.generation);
    pool.count = count;
    info!("Spawned {} glyph entities (generation {})", count, frame.generation);
}

/// Copy position, glyph, scale and color from the frame onto the entities
pub fn update_glyph_entities(
    frame: Res<RenderFrame>,
    mut query: Query<(&GlyphSprite, &mut Transform, &mut Text2d, &mut TextColor)>,
) {
    let Some(viewport) = frame.viewport else {
        return;
    };

    for (sprite, mut transform, mut text, mut color) in query.iter_mut() {
        let Some(draw) = frame.glyphs.get(sprite.index).filter(|g| g.index == sprite.index) else {
            continue;
        };

        transform.translation = to_world(draw.position, &viewport).extend(0.0);
        transform.scale = Vec3::splat(draw.scale);
        color.0 = rgba(draw.color);

        // String churn is the expensive part; only touch it on a morph
        if text.0.chars().next() != Some(draw.glyph) {
            text.0 = draw.glyph.to_string();
        }
    }
}

/// Glow behind chain heads and faint bond lines
pub fn draw_overlays(frame: Res<RenderFrame>, mut gizmos: Gizmos) {
    let Some(viewport) = frame.viewport else {
        return;
    };

    for bond in &frame.bonds {
        gizmos.line_2d(
            to_world(bond.from, &viewport),
            to_world(bond.to, &viewport),
            rgba(bond.color),
        );
    }

    // Soft glow: concentric rings fading outward
    for glow in &frame.glows {
        let center = Isometry2d::from_translation(to_world(glow.position, &viewport));
        for ring in 0..3 {
            let k = 1.0 + ring as f32 * 0.35;
            let alpha = glow.color[3] / k;
            gizmos.circle_2d(
                center,
                glow.radius * k,
                Color::srgba(glow.color[0], glow.color[1], glow.color[2], alpha),
            );
        }
    }
}

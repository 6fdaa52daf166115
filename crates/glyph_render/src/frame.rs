//! Renderer: turns the current field into draw calls on a [`GlyphSurface`].
//! Reads only; the field is never mutated while painting.

use bevy::prelude::Resource;
use glyph_core::{ParticleKind, Viewport};
use glyph_sim::field::GlyphField;

/// Size pulse of bonded glyphs (fraction of scale)
const PULSE_AMPLITUDE: f32 = 0.12;
/// Radians per second of the bonded size pulse
const PULSE_RATE: f32 = 3.0;
/// Phase spread between chains so molecules do not pulse in lockstep
const PULSE_PHASE_PER_CHAIN: f32 = 0.7;
/// Bond line alpha at full strength
const BOND_ALPHA: f32 = 0.35;
/// Glow radius in glyph widths
const GLOW_RADIUS: f32 = 0.9;
/// Tint of glyphs that belong to a molecule
const BONDED_COLOR: [f32; 3] = [1.0, 0.75, 0.3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphDraw {
    /// Particle index
    pub index: usize,
    pub position: [f32; 2],
    pub glyph: char,
    pub scale: f32,
    /// [r, g, b, a]
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowDraw {
    pub position: [f32; 2],
    pub radius: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondDraw {
    pub from: [f32; 2],
    pub to: [f32; 2],
    /// [r, g, b, a]; alpha follows bond strength
    pub color: [f32; 4],
}

/// Anything the renderer can paint onto
pub trait GlyphSurface {
    fn clear(&mut self);
    fn draw_glyph(&mut self, glyph: GlyphDraw);
    fn draw_glow(&mut self, glow: GlowDraw);
    fn draw_bond(&mut self, bond: BondDraw);
}

/// Buffered frame, consumed by the Bevy drawing systems
#[derive(Resource, Debug, Default)]
pub struct RenderFrame {
    pub glyphs: Vec<GlyphDraw>,
    pub glows: Vec<GlowDraw>,
    pub bonds: Vec<BondDraw>,
    pub viewport: Option<Viewport>,
    pub glyph_width: f32,
    /// Field generation this frame was painted from
    pub generation: u32,
}

impl GlyphSurface for RenderFrame {
    fn clear(&mut self) {
        self.glyphs.clear();
        self.glows.clear();
        self.bonds.clear();
    }

    fn draw_glyph(&mut self, glyph: GlyphDraw) {
        self.glyphs.push(glyph);
    }

    fn draw_glow(&mut self, glow: GlowDraw) {
        self.glows.push(glow);
    }

    fn draw_bond(&mut self, bond: BondDraw) {
        self.bonds.push(bond);
    }
}

impl RenderFrame {
    /// Paint `field` and remember the metadata the drawing systems need
    pub fn capture(&mut self, field: &GlyphField) {
        paint(field, self);
        self.viewport = Some(field.viewport()).filter(|v| !v.is_degenerate());
        self.glyph_width = field.config().glyph_width;
        self.generation = field.generation();
    }
}

/// Paint every live particle, a glow behind chain heads, and the bonds
pub fn paint(field: &GlyphField, surface: &mut impl GlyphSurface) {
    surface.clear();
    if !field.is_active() {
        return;
    }

    let particles = field.particles();
    let t = field.elapsed();
    let glyph_width = field.config().glyph_width;

    for bond in field.bonds() {
        let (Some(a), Some(b)) = (particles.get(bond.a), particles.get(bond.b)) else {
            continue;
        };
        surface.draw_bond(BondDraw {
            from: a.position,
            to: b.position,
            color: [
                BONDED_COLOR[0],
                BONDED_COLOR[1],
                BONDED_COLOR[2],
                bond.strength * BOND_ALPHA * a.opacity.min(b.opacity),
            ],
        });
    }

    for (index, p) in particles.iter().enumerate() {
        if p.opacity <= 0.0 {
            continue;
        }

        let mut scale = p.scale;
        let rgb = match p.chain_id {
            Some(id) => {
                let phase = t * PULSE_RATE + id as f32 * PULSE_PHASE_PER_CHAIN;
                scale *= 1.0 + PULSE_AMPLITUDE * phase.sin();
                BONDED_COLOR
            }
            None => p.kind().color(),
        };
        // Orbitals sit behind the rest
        let alpha = if p.kind() == ParticleKind::Orbital { p.opacity * 0.8 } else { p.opacity };

        if p.is_head {
            surface.draw_glow(GlowDraw {
                position: p.position,
                radius: glyph_width * GLOW_RADIUS * scale,
                color: [rgb[0], rgb[1], rgb[2], alpha * 0.35],
            });
        }

        surface.draw_glyph(GlyphDraw {
            index,
            position: p.position,
            glyph: field.glyph_of(p),
            scale,
            color: [rgb[0], rgb[1], rgb[2], alpha],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::{BondConfig, Mode, SimConfig};

    fn bonded_field() -> GlyphField {
        let config = SimConfig {
            bonds: BondConfig { link_probability: 0.3, ..BondConfig::default() },
            ..SimConfig::preset(Mode::Molecular)
        };
        let mut field = GlyphField::new(config, Viewport::new(640.0, 480.0, 1.0));
        for _ in 0..240 {
            field.step(1.0 / 60.0);
        }
        field
    }

    #[test]
    fn test_paint_draws_every_particle_once() {
        let field = bonded_field();
        let mut frame = RenderFrame::default();
        frame.capture(&field);

        assert_eq!(frame.glyphs.len(), field.particles().len());
        assert_eq!(frame.bonds.len(), field.bonds().len());
        for (i, g) in frame.glyphs.iter().enumerate() {
            assert_eq!(g.index, i);
            assert!(field.config().glyphs.contains(g.glyph));
            assert!((0.0..=1.0).contains(&g.color[3]));
        }
    }

    #[test]
    fn test_glow_only_for_heads() {
        let field = bonded_field();
        let mut frame = RenderFrame::default();
        paint(&field, &mut frame);

        let heads = field.particles().iter().filter(|p| p.is_head).count();
        assert_eq!(frame.glows.len(), heads);
    }

    #[test]
    fn test_paint_does_not_mutate() {
        let field = bonded_field();
        let particles = field.particles().to_vec();
        let bonds = field.bonds().to_vec();

        let mut frame = RenderFrame::default();
        paint(&field, &mut frame);
        paint(&field, &mut frame);

        assert_eq!(field.particles(), &particles[..]);
        assert_eq!(field.bonds(), &bonds[..]);
    }

    #[test]
    fn test_idle_field_paints_nothing() {
        let field = GlyphField::empty(SimConfig::default());
        let mut frame = RenderFrame::default();
        frame.glyphs.push(GlyphDraw { index: 0, position: [0.0, 0.0], glyph: 'x', scale: 1.0, color: [1.0; 4] });

        frame.capture(&field);
        assert!(frame.glyphs.is_empty() && frame.glows.is_empty() && frame.bonds.is_empty());
        assert_eq!(frame.viewport, None);
    }

    #[test]
    fn test_bonds_share_molecule_tint() {
        let field = bonded_field();
        let mut frame = RenderFrame::default();
        paint(&field, &mut frame);

        assert!(!frame.bonds.is_empty(), "no bonds after 240 frames");
        for (draw, bond) in frame.bonds.iter().zip(field.bonds()) {
            assert_eq!(draw.color[..3], BONDED_COLOR[..]);
            assert!(draw.color[3] <= bond.strength * BOND_ALPHA + 1e-6);
        }
    }
}

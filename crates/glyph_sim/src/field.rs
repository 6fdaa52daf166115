use bevy::prelude::*;
use glyph_core::constants::{MAX_FRAME_STEP, REFERENCE_FPS};
use glyph_core::{Bond, FrameStats, Particle, ParticleKind, SimConfig, Viewport};
use glyph_physics::motion::{self, MotionContext};
use glyph_physics::{bonds, collision, forces, particle, BondGraph};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// One simulation instance: particles, bonds, RNG and attractor state.
/// Owned by the caller and advanced once per host frame.
#[derive(Resource)]
pub struct GlyphField {
    config: SimConfig,
    viewport: Viewport,
    particles: Vec<Particle>,
    graph: BondGraph,
    rng: ChaCha8Rng,
    palette: Vec<char>,
    /// Seconds of simulated time since the last (re)initialisation
    elapsed: f32,
    frame: u64,
    attractor: [f32; 2],
    stats: FrameStats,
    /// Incremented on every (re)initialisation (renderer respawns its glyphs)
    generation: u32,
}

impl GlyphField {
    /// Placeholder with no particles (used before the host reports a viewport)
    pub fn empty(config: SimConfig) -> Self {
        Self::new(config, Viewport::new(0.0, 0.0, 1.0))
    }

    pub fn new(config: SimConfig, viewport: Viewport) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let palette = config.palette();
        let mut field = Self {
            config,
            viewport,
            particles: Vec::new(),
            graph: BondGraph::default(),
            rng,
            palette,
            elapsed: 0.0,
            frame: 0,
            attractor: viewport.center(),
            stats: FrameStats::default(),
            generation: 0,
        };
        field.reinitialize();
        field
    }

    /// Rebuild every particle for the current viewport. All bonds are discarded.
    fn reinitialize(&mut self) {
        self.particles = particle::initialize(&self.viewport, &self.config, &mut self.rng);
        self.graph.clear(self.particles.len());
        self.elapsed = 0.0;
        self.attractor = forces::attractor_position(0.0, &self.viewport);
        self.stats = FrameStats::default();
        self.generation = self.generation.wrapping_add(1);

        if self.viewport.is_degenerate() {
            if self.viewport.width != 0.0 || self.viewport.height != 0.0 {
                warn!(
                    "Viewport {}x{} is degenerate; glyph field idle",
                    self.viewport.width, self.viewport.height
                );
            }
            return;
        }

        let [falling, orbital, independent] = self.population();
        info!(
            "Glyph field ({}) initialised at {:.0}x{:.0}: {} falling, {} orbital, {} independent",
            self.config.mode, self.viewport.width, self.viewport.height, falling, orbital, independent
        );
    }

    /// Non-reentrant reset for a new viewport
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.reinitialize();
    }

    /// Swap in a new parameter bundle. A changed seed restarts the RNG from
    /// that seed; otherwise (mode switch) the RNG keeps running.
    pub fn set_config(&mut self, config: SimConfig) {
        if config.seed != self.config.seed {
            self.rng = ChaCha8Rng::seed_from_u64(config.seed);
        }
        self.palette = config.palette();
        self.config = config;
        self.reinitialize();
    }

    /// Advance by `dt` seconds: integrate → form/age bonds → collide → propagate.
    /// No-op for a degenerate viewport or a non-positive / non-finite dt.
    pub fn step(&mut self, dt: f32) -> FrameStats {
        if !self.is_active() || !dt.is_finite() || dt <= 0.0 {
            return FrameStats::default();
        }

        let dt_frames = (dt * REFERENCE_FPS).min(MAX_FRAME_STEP);
        self.elapsed += dt;
        self.frame += 1;
        self.attractor = forces::attractor_position(self.elapsed, &self.viewport);

        let ctx = MotionContext {
            config: &self.config,
            viewport: self.viewport,
            dt: dt_frames,
            attractor: self.attractor,
            palette_len: self.palette.len(),
        };
        for p in self.particles.iter_mut() {
            motion::step(p, &ctx, &mut self.rng);
        }

        let mut stats = FrameStats::default();
        let bonding = self.config.bonding_enabled;

        if bonding {
            stats.bonds_formed = self.graph.form(&mut self.particles, &self.config.bonds, &mut self.rng);
            stats.bonds_decayed = self.graph.age(&mut self.particles, &self.config.bonds);
        }

        let graph = if bonding { Some(&mut self.graph) } else { None };
        let report = collision::resolve(&mut self.particles, graph, &self.config, &mut self.rng);
        stats.collisions = report.collisions;
        stats.full_breaks = report.full_breaks;
        stats.partial_breaks = report.partial_breaks;
        stats.weakenings = report.weakenings;

        if bonding {
            self.graph.propagate(&mut self.particles, &self.config.bonds);

            for i in 0..self.particles.len() {
                if self.particles[i].is_anchor {
                    stats.molecules += 1;
                    stats.largest_molecule = stats.largest_molecule.max(self.graph.molecule_size(i) as u32);
                }
            }
        }

        if stats.full_breaks > 0 {
            debug!("Frame {}: {} molecule(s) shattered", self.frame, stats.full_breaks);
        }

        self.stats = stats;
        stats
    }

    /// Whether the field has anything to simulate
    pub fn is_active(&self) -> bool {
        !self.viewport.is_degenerate() && !self.particles.is_empty()
    }

    /// Particle counts by subtype: [falling, orbital, independent]
    pub fn population(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for p in &self.particles {
            match p.kind() {
                ParticleKind::Falling => counts[0] += 1,
                ParticleKind::Orbital => counts[1] += 1,
                ParticleKind::Independent => counts[2] += 1,
            }
        }
        counts
    }

    /// Molecules keyed by chain id
    pub fn molecules(&self) -> BTreeMap<u32, Vec<usize>> {
        bonds::molecules(&self.particles)
    }

    /// Glyph currently shown by a particle
    pub fn glyph_of(&self, p: &Particle) -> char {
        self.palette.get(p.glyph % self.palette.len().max(1)).copied().unwrap_or('0')
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn bonds(&self) -> &[Bond] {
        self.graph.bonds()
    }

    pub fn graph(&self) -> &BondGraph {
        &self.graph
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::{BondConfig, Mode};

    fn molecular() -> SimConfig {
        SimConfig {
            bonds: BondConfig { link_probability: 0.2, ..BondConfig::default() },
            ..SimConfig::preset(Mode::Molecular)
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(640.0, 480.0, 2.0)
    }

    #[test]
    fn test_molecular_run_keeps_invariants() {
        let config = molecular();
        let max_chain = config.bonds.max_chain_length;
        let mut field = GlyphField::new(config, viewport());
        let kinds: Vec<ParticleKind> = field.particles().iter().map(|p| p.kind()).collect();

        let mut formed = 0;
        for _ in 0..600 {
            formed += field.step(1.0 / 60.0).bonds_formed;

            for b in field.bonds() {
                assert!((0.0..=1.0).contains(&b.strength));
            }
            for (i, p) in field.particles().iter().enumerate() {
                let degree = field.graph().degree(i);
                assert!(degree <= 2);
                assert_eq!(p.chain_id.is_some(), degree > 0);
                if p.kind() == ParticleKind::Orbital {
                    assert_eq!(degree, 0);
                }
            }
            for members in field.molecules().values() {
                assert!(members.len() <= max_chain);
            }
        }

        assert!(formed > 0, "no bonds formed in 600 frames");
        let after: Vec<ParticleKind> = field.particles().iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, after);
    }

    #[test]
    fn test_non_bonding_mode_never_bonds() {
        let mut field = GlyphField::new(SimConfig::preset(Mode::Drift), viewport());
        for _ in 0..200 {
            let stats = field.step(1.0 / 60.0);
            assert_eq!(stats.bonds_formed, 0);
        }
        assert!(field.bonds().is_empty());
        assert!(field.particles().iter().all(|p| p.chain_id.is_none()));
    }

    #[test]
    fn test_resize_discards_bonds_and_rebuilds() {
        let mut field = GlyphField::new(molecular(), viewport());
        for _ in 0..300 {
            field.step(1.0 / 60.0);
        }
        let generation = field.generation();

        field.resize(Viewport::new(1280.0, 720.0, 1.0));
        assert!(field.bonds().is_empty());
        assert!(field.particles().iter().all(|p| p.chain_id.is_none() && !p.in_molecule));
        assert_eq!(field.generation(), generation + 1);

        let falling = (field.config().density * 1280.0 / field.config().glyph_width).floor() as usize;
        assert_eq!(field.population()[0], falling);
    }

    #[test]
    fn test_degenerate_viewport_is_noop() {
        let mut field = GlyphField::empty(SimConfig::default());
        assert!(!field.is_active());
        assert_eq!(field.step(1.0 / 60.0), FrameStats::default());
        assert_eq!(field.frame(), 0);
    }

    #[test]
    fn test_bad_dt_ignored() {
        let mut field = GlyphField::new(SimConfig::default(), viewport());
        let before = field.particles().to_vec();
        field.step(f32::NAN);
        field.step(-1.0);
        field.step(0.0);
        assert_eq!(field.frame(), 0);
        assert_eq!(field.particles(), &before[..]);
    }

    #[test]
    fn test_mode_switch_repopulates() {
        let mut field = GlyphField::new(SimConfig::preset(Mode::Rain), viewport());
        assert_eq!(field.population()[1], 0);

        field.set_config(SimConfig::preset(Mode::Orbit));
        assert_eq!(field.population()[1], SimConfig::preset(Mode::Orbit).orbital_count as usize);
        let glyphs = &field.config().glyphs;
        assert!(field.particles().iter().all(|p| glyphs.contains(field.glyph_of(p))));
    }

    #[test]
    fn test_reseed_matches_fresh_field() {
        let config = molecular();
        let mut field = GlyphField::new(config.clone(), viewport());
        for _ in 0..30 {
            field.step(1.0 / 60.0);
        }

        let reseeded = SimConfig { seed: config.seed + 1, ..config };
        field.set_config(reseeded.clone());
        let fresh = GlyphField::new(reseeded, viewport());

        assert_eq!(field.config().seed, fresh.config().seed);
        assert_eq!(field.particles(), fresh.particles());
    }

    #[test]
    fn test_same_seed_mode_switch_keeps_stream() {
        let mut field = GlyphField::new(SimConfig::preset(Mode::Rain), viewport());
        field.set_config(SimConfig::preset(Mode::Drift));
        let fresh = GlyphField::new(SimConfig::preset(Mode::Drift), viewport());

        assert_eq!(field.population(), fresh.population());
        assert_ne!(field.particles(), fresh.particles());
    }
}

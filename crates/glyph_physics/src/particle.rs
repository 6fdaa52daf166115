use glyph_core::constants::{FALLING_LIFE, INDEPENDENT_LIFE, ORBIT_MAX_FRACTION, ORBIT_MIN_FRACTION};
use glyph_core::{Orbit, Particle, ParticleKind, SimConfig, Viewport};
use rand::Rng;
use std::f32::consts::TAU;

/// Distance a glyph may travel past an edge before it wraps or respawns
pub fn wrap_margin(config: &SimConfig) -> f32 {
    config.glyph_width.max(1.0)
}

/// Number of falling particles for a viewport: density × width / glyph width
pub fn falling_count(viewport: &Viewport, config: &SimConfig) -> usize {
    if viewport.is_degenerate() || !(config.glyph_width > 0.0) {
        return 0;
    }
    (config.density.max(0.0) * viewport.width / config.glyph_width).floor() as usize
}

/// Build the full particle set for a viewport.
/// Layout is [falling.., orbital.., independent..]; a degenerate viewport yields nothing.
/// Positions and counts are in logical pixels, so `pixel_ratio` never changes the
/// population; only the drawing surface scales by it.
pub fn initialize(viewport: &Viewport, config: &SimConfig, rng: &mut impl Rng) -> Vec<Particle> {
    if viewport.is_degenerate() {
        return Vec::new();
    }

    let n_falling = falling_count(viewport, config);
    let n_orbital = config.orbital_count as usize;
    let n_independent = config.independent_count as usize;
    let palette_len = config.palette().len();

    let mut particles = Vec::with_capacity(n_falling + n_orbital + n_independent);

    for _ in 0..n_falling {
        particles.push(create_falling(viewport, config, palette_len, rng));
    }
    for _ in 0..n_orbital {
        particles.push(create_orbital(viewport, palette_len, rng));
    }
    for _ in 0..n_independent {
        particles.push(create_independent(viewport, palette_len, rng));
    }

    particles
}

/// Cosmetic jitter shared by every subtype
fn randomize_look(p: &mut Particle, palette_len: usize, rng: &mut impl Rng) {
    p.glyph = rng.gen_range(0..palette_len.max(1));
    p.morph_phase = rng.gen_range(0.0..1.0f32);
    p.speed_jitter = rng.gen_range(0.7..1.3f32);
    p.base_scale = rng.gen_range(0.8..1.2f32);
    p.scale = p.base_scale;
}

fn falling_speed(config: &SimConfig, jitter: f32, rng: &mut impl Rng) -> f32 {
    rng.gen_range(0.5..2.0f32) * config.falling_speed.max(0.0) * jitter
}

fn create_falling(
    viewport: &Viewport,
    config: &SimConfig,
    palette_len: usize,
    rng: &mut impl Rng,
) -> Particle {
    // Start anywhere from one screen above to the bottom so columns are staggered
    let pos = [
        rng.gen_range(0.0..viewport.width),
        rng.gen_range(-viewport.height..viewport.height),
    ];
    let mut p = Particle::new(ParticleKind::Falling, pos, [0.0, 0.0]);
    randomize_look(&mut p, palette_len, rng);
    p.velocity[1] = falling_speed(config, p.speed_jitter, rng);

    p.max_life = rng.gen_range(FALLING_LIFE.0..FALLING_LIFE.1);
    p.life = p.max_life * rng.gen_range(0.2..1.0f32);
    p
}

fn create_orbital(viewport: &Viewport, palette_len: usize, rng: &mut impl Rng) -> Particle {
    let span = viewport.width.min(viewport.height);
    let [cx, cy] = viewport.center();
    let jitter = span * 0.05;
    let min_radius = span * ORBIT_MIN_FRACTION;
    let max_radius = (span * ORBIT_MAX_FRACTION).max(min_radius);

    let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let orbit = Orbit {
        center: [
            cx + rng.gen_range(-1.0..1.0f32) * jitter,
            cy + rng.gen_range(-1.0..1.0f32) * jitter,
        ],
        radius: if max_radius > min_radius {
            rng.gen_range(min_radius..max_radius)
        } else {
            min_radius
        },
        min_radius,
        max_radius,
        angle: rng.gen_range(0.0..TAU),
        angular_speed: rng.gen_range(0.004..0.012f32) * direction,
    };

    let mut p = Particle::new(ParticleKind::Orbital, orbit.position(), [0.0, 0.0]);
    randomize_look(&mut p, palette_len, rng);
    p.orbit = Some(orbit);
    p.opacity = rng.gen_range(0.5..1.0f32);
    p
}

fn create_independent(viewport: &Viewport, palette_len: usize, rng: &mut impl Rng) -> Particle {
    let pos = [
        rng.gen_range(0.0..viewport.width),
        rng.gen_range(0.0..viewport.height),
    ];
    let vel = [rng.gen_range(-1.0..1.0f32), rng.gen_range(-1.0..1.0f32)];
    let mut p = Particle::new(ParticleKind::Independent, pos, vel);
    randomize_look(&mut p, palette_len, rng);

    p.max_life = rng.gen_range(INDEPENDENT_LIFE.0..INDEPENDENT_LIFE.1);
    p.life = p.max_life * rng.gen_range(0.2..1.0f32);
    p
}

/// Re-seed an expired or escaped particle in place. Life is restored to max_life.
/// Orbital particles never respawn.
pub fn respawn(p: &mut Particle, viewport: &Viewport, config: &SimConfig, rng: &mut impl Rng) {
    if viewport.is_degenerate() {
        return;
    }

    match p.kind() {
        ParticleKind::Falling => {
            let margin = wrap_margin(config);
            p.position = [
                rng.gen_range(0.0..viewport.width),
                -margin * rng.gen_range(0.5..3.0f32),
            ];
            p.velocity = [0.0, falling_speed(config, p.speed_jitter, rng)];
        }
        ParticleKind::Independent => {
            p.position = [
                rng.gen_range(0.0..viewport.width),
                rng.gen_range(0.0..viewport.height),
            ];
            p.velocity = [rng.gen_range(-1.0..1.0f32), rng.gen_range(-1.0..1.0f32)];
        }
        ParticleKind::Orbital => return,
    }

    p.life = p.max_life;
    p.opacity = 1.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn viewport() -> Viewport {
        Viewport::new(1280.0, 720.0, 1.0)
    }

    fn count_kinds(particles: &[Particle]) -> [usize; 3] {
        let mut counts = [0; 3];
        for p in particles {
            match p.kind() {
                ParticleKind::Falling => counts[0] += 1,
                ParticleKind::Orbital => counts[1] += 1,
                ParticleKind::Independent => counts[2] += 1,
            }
        }
        counts
    }

    #[test]
    fn test_population_sizes_follow_config() {
        let config = SimConfig::preset(glyph_core::Mode::Molecular);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let particles = initialize(&viewport(), &config, &mut rng);

        let expected_falling = (config.density * 1280.0 / config.glyph_width).floor() as usize;
        assert_eq!(
            count_kinds(&particles),
            [expected_falling, config.orbital_count as usize, config.independent_count as usize]
        );
    }

    #[test]
    fn test_initialize_is_count_idempotent() {
        let config = SimConfig::preset(glyph_core::Mode::Orbit);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let first = initialize(&viewport(), &config, &mut rng);
        let second = initialize(&viewport(), &config, &mut rng);

        assert_eq!(first.len(), second.len());
        assert_eq!(count_kinds(&first), count_kinds(&second));
        // Values are random; positions should not all coincide
        assert!(first.iter().zip(&second).any(|(a, b)| a.position != b.position));
    }

    #[test]
    fn test_degenerate_viewport_is_empty() {
        let config = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(initialize(&Viewport::new(0.0, 0.0, 1.0), &config, &mut rng).is_empty());
        assert_eq!(falling_count(&Viewport::new(f32::NAN, 10.0, 1.0), &config), 0);
    }

    #[test]
    fn test_orbits_start_inside_band() {
        let config = SimConfig::preset(glyph_core::Mode::Orbit);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for p in initialize(&viewport(), &config, &mut rng) {
            if let Some(orbit) = p.orbit {
                assert!(orbit.min_radius <= orbit.radius && orbit.radius <= orbit.max_radius);
            } else {
                assert_ne!(p.kind(), ParticleKind::Orbital);
            }
        }
    }

    #[test]
    fn test_respawn_resets_life_above_screen() {
        let config = SimConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut p = Particle::new(ParticleKind::Falling, [10.0, 900.0], [0.0, 3.0]);
        p.max_life = 300.0;
        p.life = 0.0;

        respawn(&mut p, &viewport(), &config, &mut rng);
        assert!(p.position[1] < 0.0);
        assert_eq!(p.life, p.max_life);
        assert_eq!(p.kind(), ParticleKind::Falling);
    }

    #[test]
    fn test_pixel_ratio_does_not_change_layout() {
        let config = SimConfig::preset(glyph_core::Mode::Drift);
        let standard = initialize(&Viewport::new(1280.0, 720.0, 1.0), &config, &mut ChaCha8Rng::seed_from_u64(4));
        let retina = initialize(&Viewport::new(1280.0, 720.0, 2.0), &config, &mut ChaCha8Rng::seed_from_u64(4));

        assert_eq!(standard, retina);
    }
}

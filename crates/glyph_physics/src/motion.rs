use glyph_core::constants::*;
use glyph_core::{Particle, ParticleKind, SimConfig, Viewport};
use rand::Rng;
use std::f32::consts::TAU;

use super::forces;
use super::particle::{self, wrap_margin};

/// Everything a single particle step needs besides the particle itself
pub struct MotionContext<'a> {
    pub config: &'a SimConfig,
    pub viewport: Viewport,
    /// Step length in frames (1.0 at 60 fps)
    pub dt: f32,
    /// Current attractor position
    pub attractor: [f32; 2],
    pub palette_len: usize,
}

/// Advance one particle by ctx.dt according to its subtype
pub fn step(p: &mut Particle, ctx: &MotionContext, rng: &mut impl Rng) {
    if p.is_mortal() {
        update_life(p, ctx, rng);
    }

    match p.kind() {
        ParticleKind::Falling => step_falling(p, ctx, rng),
        ParticleKind::Orbital => step_orbital(p, ctx),
        ParticleKind::Independent => step_independent(p, ctx, rng),
    }

    update_look(p, ctx, rng);
}

fn step_falling(p: &mut Particle, ctx: &MotionContext, rng: &mut impl Rng) {
    let dt = ctx.dt;
    let bias = FALLING_BIAS * ctx.config.falling_speed * p.speed_jitter;

    p.velocity[0] += rng.gen_range(-1.0..1.0f32) * FALLING_DRIFT * dt;
    p.velocity[1] += (rng.gen_range(-1.0..1.0f32) * FALLING_DRIFT + bias) * dt;

    let damping = if p.is_follower() { MEMBER_DAMPING } else { FALLING_DAMPING };
    damp(p, damping, dt);
    advance(p, dt);

    let margin = wrap_margin(ctx.config);
    p.position[0] = wrap(p.position[0], ctx.viewport.width, margin);

    if p.position[1] > ctx.viewport.height + margin {
        particle::respawn(p, &ctx.viewport, ctx.config, rng);
    }
}

/// Orbital position is a pure function of center, radius and angle
fn step_orbital(p: &mut Particle, ctx: &MotionContext) {
    let rate = ctx.config.orbit_speed * p.speed_jitter;
    let Some(orbit) = p.orbit.as_mut() else {
        return;
    };

    orbit.angle = (orbit.angle + orbit.angular_speed * rate * ctx.dt).rem_euclid(TAU);
    let wobble = (orbit.angle * 3.0).sin() * ORBIT_WOBBLE * ctx.dt;
    orbit.radius = (orbit.radius + wobble).clamp(orbit.min_radius, orbit.max_radius);

    let next = orbit.position();
    p.velocity = [next[0] - p.position[0], next[1] - p.position[1]];
    p.position = next;
}

fn step_independent(p: &mut Particle, ctx: &MotionContext, rng: &mut impl Rng) {
    let dt = ctx.dt;

    // Molecule followers are carried by the bond graph instead
    if !p.is_follower() {
        let strength = ctx.config.gravity * ATTRACTOR_STRENGTH;
        let [ax, ay] = forces::attraction(p.position, ctx.attractor, strength);
        p.velocity[0] += (ax + rng.gen_range(-1.0..1.0f32) * INDEPENDENT_WALK) * dt;
        p.velocity[1] += (ay + rng.gen_range(-1.0..1.0f32) * INDEPENDENT_WALK) * dt;
    }

    damp(p, INDEPENDENT_DAMPING, dt);
    advance(p, dt);

    let margin = wrap_margin(ctx.config);
    p.position[0] = wrap(p.position[0], ctx.viewport.width, margin);
    p.position[1] = wrap(p.position[1], ctx.viewport.height, margin);
}

/// Fade with remaining life; expired particles are re-seeded in place
fn update_life(p: &mut Particle, ctx: &MotionContext, rng: &mut impl Rng) {
    p.life -= ctx.dt;
    if p.life <= 0.0 {
        particle::respawn(p, &ctx.viewport, ctx.config, rng);
    }

    let fraction = if p.max_life > 0.0 { p.life / p.max_life } else { 1.0 };
    p.opacity = fraction.clamp(OPACITY_FLOOR, 1.0);
}

/// Glyph morphing and pulse relaxation
fn update_look(p: &mut Particle, ctx: &MotionContext, rng: &mut impl Rng) {
    p.morph_phase += ctx.config.morph_speed * p.speed_jitter * MORPH_RATE * ctx.dt;
    if p.morph_phase >= 1.0 {
        p.morph_phase = p.morph_phase.fract();
        p.glyph = rng.gen_range(0..ctx.palette_len.max(1));
    }

    p.pulse *= PULSE_DECAY.powf(ctx.dt);
    if p.pulse < 1e-3 {
        p.pulse = 0.0;
    }
    p.scale = p.base_scale * (1.0 + p.pulse);
}

fn damp(p: &mut Particle, damping: f32, dt: f32) {
    let factor = damping.powf(dt);
    p.velocity[0] *= factor;
    p.velocity[1] *= factor;
}

fn advance(p: &mut Particle, dt: f32) {
    p.position[0] += p.velocity[0] * dt;
    p.position[1] += p.velocity[1] * dt;
}

/// Wrap a coordinate that left [-margin, extent + margin]
fn wrap(value: f32, extent: f32, margin: f32) -> f32 {
    let span = extent + 2.0 * margin;
    if value < -margin {
        value + span
    } else if value > extent + margin {
        value - span
    } else {
        value
    }
}

use glyph_core::constants::DISTANCE_EPSILON;
use glyph_core::{Particle, SimConfig};
use rand::Rng;

use super::bonds::{BondGraph, BreakOutcome};

/// What one resolve pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub collisions: u32,
    pub full_breaks: u32,
    pub partial_breaks: u32,
    pub weakenings: u32,
}

impl CollisionReport {
    fn record(&mut self, outcome: BreakOutcome) {
        match outcome {
            BreakOutcome::Full => self.full_breaks += 1,
            BreakOutcome::Partial => self.partial_breaks += 1,
            BreakOutcome::Weaken => self.weakenings += 1,
            BreakOutcome::Unbonded => {}
        }
    }
}

/// Contact parameters after intensity scaling
struct Contact {
    radius: f32,
    restitution: f32,
    flash: f32,
}

impl Contact {
    fn from_config(config: &SimConfig) -> Self {
        let intensity = config.collision_intensity.max(0.0);
        Self {
            radius: config.collisions.collision_radius * intensity,
            restitution: (config.collisions.restitution * intensity).clamp(0.0, 1.0),
            flash: config.collisions.flash_boost,
        }
    }
}

/// Two distinct elements of a slice, mutably
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert!(i < j);
    let (left, right) = particles.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

/// Resolve one contact. Returns the impulse magnitude, or None when the pair
/// is apart, coincident or already separating.
fn collide(pi: &mut Particle, pj: &mut Particle, contact: &Contact) -> Option<f32> {
    let dx = pj.position[0] - pi.position[0];
    let dy = pj.position[1] - pi.position[1];
    let dist2 = dx * dx + dy * dy;
    if dist2 >= contact.radius * contact.radius {
        return None;
    }

    let dist = dist2.sqrt();
    if dist < DISTANCE_EPSILON {
        return None;
    }
    let nx = dx / dist;
    let ny = dy / dist;

    // Closing speed along the contact normal (positive = approaching)
    let closing = (pi.velocity[0] - pj.velocity[0]) * nx + (pi.velocity[1] - pj.velocity[1]) * ny;
    if closing <= 0.0 {
        return None;
    }

    let impulse = (1.0 + contact.restitution) * closing;
    let half = impulse * 0.5;
    pi.velocity[0] -= half * nx;
    pi.velocity[1] -= half * ny;
    pj.velocity[0] += half * nx;
    pj.velocity[1] += half * ny;

    let sep = (contact.radius - dist) * 0.5;
    pi.position[0] -= sep * nx;
    pi.position[1] -= sep * ny;
    pj.position[0] += sep * nx;
    pj.position[1] += sep * ny;

    pi.opacity = (pi.opacity * contact.flash).min(1.0);
    pj.opacity = (pj.opacity * contact.flash).min(1.0);

    Some(impulse)
}

/// O(n²) pairwise pass over interacting particles. Forceful hits on bonded
/// particles are handed to the bond graph when one is supplied.
pub fn resolve(
    particles: &mut [Particle],
    mut graph: Option<&mut BondGraph>,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> CollisionReport {
    let contact = Contact::from_config(config);
    let mut report = CollisionReport::default();
    if contact.radius <= 0.0 {
        return report;
    }

    let n = particles.len();
    for i in 0..n {
        if !particles[i].interacts() {
            continue;
        }
        for j in (i + 1)..n {
            if !particles[j].interacts() {
                continue;
            }

            let impulse = {
                let (pi, pj) = pair_mut(particles, i, j);
                collide(pi, pj, &contact)
            };
            let Some(impulse) = impulse else {
                continue;
            };
            report.collisions += 1;

            if impulse <= config.collisions.break_threshold {
                continue;
            }
            if let Some(graph) = graph.as_deref_mut() {
                if graph.degree(i) > 0 || graph.degree(j) > 0 {
                    let outcome = graph.break_on_collision(particles, i, j, &config.collisions, rng);
                    report.record(outcome);
                }
            }
        }
    }

    report
}

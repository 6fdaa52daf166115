// Simulation units:
// - Distance: 1 unit = 1 logical pixel
// - Time: 1 unit = one 60 Hz frame (dt = 1.0 at a steady 60 fps)
// Velocities are therefore pixels per frame.

/// Host frame rate the integrator is tuned against
pub const REFERENCE_FPS: f32 = 60.0;

/// Largest dt (in frames) a single step may integrate. A stalled host
/// (background tab, debugger) otherwise teleports everything.
pub const MAX_FRAME_STEP: f32 = 3.0;

/// Opacity never drops below this while a particle is alive
pub const OPACITY_FLOOR: f32 = 0.15;

/// Random per-axis drift applied to falling particles each frame
pub const FALLING_DRIFT: f32 = 0.04;

/// Downward bias for falling particles (scaled by falling_speed)
pub const FALLING_BIAS: f32 = 0.035;

/// Velocity retained per frame by a free falling particle
pub const FALLING_DAMPING: f32 = 0.98;

/// Velocity retained per frame by a non-anchor molecule member.
/// Lower than the free value: members are positioned by the bond graph.
pub const MEMBER_DAMPING: f32 = 0.9;

/// Random walk applied to independent particles
pub const INDEPENDENT_WALK: f32 = 0.06;

/// Velocity retained per frame by an independent particle
pub const INDEPENDENT_DAMPING: f32 = 0.97;

/// Attractor force constant (multiplied by config.gravity)
pub const ATTRACTOR_STRENGTH: f32 = 420.0;

/// Softening radius to keep the attractor finite near its center
pub const ATTRACTOR_SOFTENING: f32 = 30.0;

/// Angular rates of the attractor's Lissajous path (radians per second)
pub const ATTRACTOR_RATE_X: f32 = 0.13;
pub const ATTRACTOR_RATE_Y: f32 = 0.21;

/// Attractor path amplitude as a fraction of the viewport
pub const ATTRACTOR_SPAN: f32 = 0.3;

/// Amplitude of the orbital radius wobble (pixels per frame)
pub const ORBIT_WOBBLE: f32 = 0.25;

/// Orbit radius band as a fraction of min(width, height)
pub const ORBIT_MIN_FRACTION: f32 = 0.12;
pub const ORBIT_MAX_FRACTION: f32 = 0.45;

/// Per-frame relaxation of the transient scale pulse
pub const PULSE_DECAY: f32 = 0.92;

/// Scale pulse added to both endpoints when a bond forms
pub const BOND_PULSE: f32 = 0.35;

/// Scale pulse added when a collision tears a molecule apart
pub const EXPLOSION_PULSE: f32 = 0.9;

/// Opacity multiplier applied to bond endpoints on formation
pub const BOND_FLASH: f32 = 1.25;

/// Distances below this are treated as coincident (no interaction)
pub const DISTANCE_EPSILON: f32 = 1e-4;

/// Falling particle lifetime range in frames
pub const FALLING_LIFE: (f32, f32) = (240.0, 720.0);

/// Independent particle lifetime range in frames
pub const INDEPENDENT_LIFE: (f32, f32) = (360.0, 1080.0);

/// Morph phase advanced per frame at morph_speed 1.0
pub const MORPH_RATE: f32 = 0.02;

use serde::{Deserialize, Serialize};

/// Host viewport in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device pixels per logical pixel (only the drawing surface cares)
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self { width, height, pixel_ratio }
    }

    /// True when the viewport cannot hold a simulation (zero-sized, NaN, ...)
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn center(&self) -> [f32; 2] {
        [self.width * 0.5, self.height * 0.5]
    }
}

/// Behavioral subtype of a particle; decides which integration rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    Falling,
    Orbital,
    Independent,
}

impl ParticleKind {
    /// Whether particles of this kind take part in collisions and bonds
    pub fn interacts(&self) -> bool {
        !matches!(self, Self::Orbital)
    }

    /// Base glyph color [r, g, b]
    pub fn color(&self) -> [f32; 3] {
        match self {
            Self::Falling => [0.0, 1.0, 0.4],     // Green
            Self::Orbital => [0.3, 0.8, 1.0],     // Cyan
            Self::Independent => [0.85, 0.9, 1.0], // Pale white
        }
    }
}

/// Orbital-only state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub center: [f32; 2],
    /// Current radius, oscillates inside [min_radius, max_radius]
    pub radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub angle: f32,
    /// Radians per frame before the orbit_speed multiplier
    pub angular_speed: f32,
}

impl Orbit {
    /// Point on the orbit for the current angle and radius
    pub fn position(&self) -> [f32; 2] {
        [
            self.center[0] + self.radius * self.angle.cos(),
            self.center[1] + self.radius * self.angle.sin(),
        ]
    }
}

/// A simulated glyph. Identity is its index in the particle array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    /// Rendered scale (base_scale boosted by pulse)
    pub scale: f32,
    pub base_scale: f32,
    /// Transient scale boost, relaxes toward 0
    pub pulse: f32,
    pub opacity: f32,
    kind: ParticleKind,
    pub orbit: Option<Orbit>,
    pub life: f32,
    pub max_life: f32,
    /// Palette index of the glyph currently shown
    pub glyph: usize,
    /// Advances by morph_speed; the glyph changes each time it wraps past 1
    pub morph_phase: f32,
    /// Per-particle rate multiplier so the ensemble never looks synchronized
    pub speed_jitter: f32,
    /// Molecule id; Some iff the particle has at least one bond
    pub chain_id: Option<u32>,
    /// Chain terminus (exactly one bond)
    pub is_head: bool,
    pub in_molecule: bool,
    /// The one member per molecule that integrates freely and drives the rest
    pub is_anchor: bool,
}

impl Particle {
    pub fn new(kind: ParticleKind, position: [f32; 2], velocity: [f32; 2]) -> Self {
        Self {
            position,
            velocity,
            scale: 1.0,
            base_scale: 1.0,
            pulse: 0.0,
            opacity: 1.0,
            kind,
            orbit: None,
            life: 1.0,
            max_life: 1.0,
            glyph: 0,
            morph_phase: 0.0,
            speed_jitter: 1.0,
            chain_id: None,
            is_head: false,
            in_molecule: false,
            is_anchor: false,
        }
    }

    /// Subtype, fixed for the particle's lifetime
    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    /// Whether this particle can collide and bond
    pub fn interacts(&self) -> bool {
        self.kind.interacts()
    }

    /// Bonded but not the anchor: position is driven by the bond graph
    pub fn is_follower(&self) -> bool {
        self.in_molecule && !self.is_anchor
    }

    /// Orbital particles never expire
    pub fn is_mortal(&self) -> bool {
        !matches!(self.kind, ParticleKind::Orbital)
    }

    /// Drop every molecular flag (called when the last bond goes)
    pub fn clear_molecule(&mut self) {
        self.chain_id = None;
        self.is_head = false;
        self.in_molecule = false;
        self.is_anchor = false;
    }

    pub fn distance_to(&self, other: &Particle) -> f32 {
        let dx = other.position[0] - self.position[0];
        let dy = other.position[1] - self.position[1];
        (dx * dx + dy * dy).sqrt()
    }
}

/// Undirected rigid link between two particle indices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    /// Always within [0, 1]
    pub strength: f32,
    /// Frames since formation
    pub age: u32,
    /// Rigid displacement from a to b, captured at formation
    pub offset: [f32; 2],
    pub length: f32,
}

impl Bond {
    pub fn touches(&self, i: usize) -> bool {
        self.a == i || self.b == i
    }

    /// Same unordered pair
    pub fn connects(&self, i: usize, j: usize) -> bool {
        (self.a == i && self.b == j) || (self.a == j && self.b == i)
    }

    /// Offset pointing from endpoint `from` to the other endpoint
    pub fn offset_from(&self, from: usize) -> [f32; 2] {
        if from == self.a {
            self.offset
        } else {
            [-self.offset[0], -self.offset[1]]
        }
    }
}

/// Counters for one simulation step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub bonds_formed: u32,
    pub bonds_decayed: u32,
    pub collisions: u32,
    pub full_breaks: u32,
    pub partial_breaks: u32,
    pub weakenings: u32,
    pub molecules: u32,
    pub largest_molecule: u32,
}

impl FrameStats {
    /// Sum the per-step counters of `other` into self (molecule gauges are kept)
    pub fn accumulate(&mut self, other: &FrameStats) {
        self.bonds_formed += other.bonds_formed;
        self.bonds_decayed += other.bonds_decayed;
        self.collisions += other.collisions;
        self.full_breaks += other.full_breaks;
        self.partial_breaks += other.partial_breaks;
        self.weakenings += other.weakenings;
    }
}

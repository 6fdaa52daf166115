use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display mode key; each mode selects an independent parameter bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Dense glyph rain, a few free roamers
    #[default]
    Rain,
    /// Sparse rain around a ring of orbiting glyphs
    Orbit,
    /// Mostly free roamers circling the attractor
    Drift,
    /// Bonding enabled: glyphs link into chains and break apart on impact
    Molecular,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Rain, Mode::Orbit, Mode::Drift, Mode::Molecular];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rain => "rain",
            Self::Orbit => "orbit",
            Self::Drift => "drift",
            Self::Molecular => "molecular",
        }
    }

    /// Next mode in cycling order (wraps around)
    pub fn next(&self) -> Mode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| format!("Unknown mode '{s}' (expected rain, orbit, drift or molecular)"))
    }
}

/// Molecular bond tuning. The values are empirical; they have no meaning
/// beyond how the effect looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondConfig {
    /// Pairs closer than this may bond
    pub link_distance: f32,
    /// Chance per frame that an eligible proximate pair bonds
    pub link_probability: f32,
    /// Largest molecule (particle count) a bond may produce
    pub max_chain_length: usize,
    /// Initial strength range
    pub min_strength: f32,
    pub max_strength: f32,
    /// Strength lost by every bond each frame
    pub strength_decay: f32,
    /// Preferred bond length; formation offsets are clamped to it
    pub molecular_spacing: f32,
    /// Fraction of the way a member moves toward its rigid target per frame
    pub rigidity: f32,
    /// Bonds stretched beyond link_distance times this snap
    pub break_distance_factor: f32,
    /// Fraction of the anchor's velocity a member inherits
    pub member_velocity_retention: f32,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            link_distance: 35.0,
            link_probability: 0.02,
            max_chain_length: 6,
            min_strength: 0.6,
            max_strength: 1.0,
            strength_decay: 0.0006,
            molecular_spacing: 18.0,
            rigidity: 0.35,
            break_distance_factor: 2.5,
            member_velocity_retention: 0.95,
        }
    }
}

/// Pairwise collision tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Contact distance before intensity scaling
    pub collision_radius: f32,
    /// Restitution coefficient before intensity scaling
    pub restitution: f32,
    /// Impulse above which bonds on either particle are hit
    pub break_threshold: f32,
    /// Chance a forceful hit removes every affected bond
    pub break_probability: f32,
    /// Chance a forceful hit removes exactly one affected bond
    pub partial_break_probability: f32,
    /// Strength multiplier when the hit breaks nothing
    pub weaken_factor: f32,
    /// Opacity multiplier on contact
    pub flash_boost: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            collision_radius: 10.0,
            restitution: 0.8,
            break_threshold: 1.5,
            break_probability: 0.3,
            partial_break_probability: 0.4,
            weaken_factor: 0.7,
            flash_boost: 1.15,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Mode this bundle was built for
    pub mode: Mode,
    /// Random seed for a reproducible field
    pub seed: u64,
    /// Falling population scaler (columns per glyph width)
    pub density: f32,
    /// Glyph cell width in logical pixels
    pub glyph_width: f32,
    pub orbital_count: u32,
    pub independent_count: u32,
    /// Attractor strength
    pub gravity: f32,
    /// Scales collision radius and restitution
    pub collision_intensity: f32,
    pub morph_speed: f32,
    pub orbit_speed: f32,
    pub falling_speed: f32,
    /// Glyph palette (cosmetic only)
    pub glyphs: String,
    /// Whether the bond graph runs at all
    pub bonding_enabled: bool,
    pub bonds: BondConfig,
    pub collisions: CollisionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::preset(Mode::default())
    }
}

impl SimConfig {
    /// Parameter bundle for a mode key
    pub fn preset(mode: Mode) -> Self {
        let base = Self {
            mode,
            seed: 42,
            density: 0.9,
            glyph_width: 14.0,
            orbital_count: 0,
            independent_count: 24,
            gravity: 0.4,
            collision_intensity: 0.6,
            morph_speed: 1.0,
            orbit_speed: 1.0,
            falling_speed: 1.0,
            glyphs: "0123456789ABCDEF".into(),
            bonding_enabled: false,
            bonds: BondConfig::default(),
            collisions: CollisionConfig::default(),
        };

        match mode {
            Mode::Rain => base,
            Mode::Orbit => Self {
                density: 0.25,
                orbital_count: 180,
                independent_count: 40,
                gravity: 0.6,
                orbit_speed: 1.2,
                glyphs: "o*+.x".into(),
                ..base
            },
            Mode::Drift => Self {
                density: 0.15,
                orbital_count: 40,
                independent_count: 160,
                gravity: 1.2,
                collision_intensity: 0.8,
                morph_speed: 0.6,
                glyphs: "<>{}[]/\\".into(),
                ..base
            },
            Mode::Molecular => Self {
                density: 0.35,
                orbital_count: 60,
                independent_count: 140,
                gravity: 0.8,
                collision_intensity: 1.0,
                morph_speed: 0.4,
                falling_speed: 0.7,
                glyphs: "HCNOPS".into(),
                bonding_enabled: true,
                ..base
            },
        }
    }

    /// Palette as chars, never empty
    pub fn palette(&self) -> Vec<char> {
        let chars: Vec<char> = self.glyphs.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.is_empty() { vec!['0'] } else { chars }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_roundtrip() {
        for mode in Mode::ALL {
            assert_eq!(mode.name().parse::<Mode>(), Ok(mode));
        }
        assert_eq!(" Molecular ".parse::<Mode>(), Ok(Mode::Molecular));
        assert!("spiral".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_cycle_visits_all() {
        let mut mode = Mode::Rain;
        for _ in 0..Mode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, Mode::Rain);
    }

    #[test]
    fn test_only_molecular_bonds() {
        for mode in Mode::ALL {
            let config = SimConfig::preset(mode);
            assert_eq!(config.mode, mode);
            assert_eq!(config.bonding_enabled, mode == Mode::Molecular);
        }
    }

    #[test]
    fn test_palette_never_empty() {
        let config = SimConfig { glyphs: "  ".into(), ..SimConfig::default() };
        assert_eq!(config.palette(), vec!['0']);
    }

    #[test]
    fn test_strength_range_valid() {
        let b = BondConfig::default();
        assert!(0.0 <= b.min_strength && b.min_strength <= b.max_strength && b.max_strength <= 1.0);
        assert!(b.molecular_spacing < b.link_distance);
    }
}

pub mod config;
pub mod constants;
pub mod types;

pub use config::{BondConfig, CollisionConfig, Mode, SimConfig};
pub use constants::*;
pub use types::*;

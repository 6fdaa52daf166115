pub mod bonds;
pub mod collision;
pub mod forces;
pub mod motion;
pub mod particle;

pub use bonds::{BondGraph, BreakOutcome};
pub use collision::CollisionReport;
pub use motion::MotionContext;

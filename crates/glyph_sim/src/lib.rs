pub mod field;
pub mod host;
pub mod pipeline;
pub mod state;

pub mod camera;
pub mod frame;
pub mod glyphs;
pub mod plugin;
pub mod ui;

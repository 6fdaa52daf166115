use bevy::prelude::*;

/// Marker for the 2D camera looking at the glyph field
#[derive(Component)]
pub struct FieldCamera;

/// Spawn the 2D camera; world origin is the viewport center
pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((Camera2d, FieldCamera));
    info!("Camera spawned");
}

use bevy::prelude::*;
use glyph_core::{FrameStats, SimConfig};
use glyph_sim::field::GlyphField;
use glyph_sim::pipeline::FrameLoop;
use glyph_sim::state::AppState;

/// Marker for the HUD text
#[derive(Component)]
pub struct HudText;

/// HUD frame counter for throttling
#[derive(Resource, Default)]
pub struct HudThrottle {
    pub frame: u32,
    /// Bond churn summed since the HUD last refreshed
    pub window: FrameStats,
    /// Last field frame folded into `window`
    pub last_frame: u64,
}

/// Spawn the HUD overlay
pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("glyphfield"),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgba(0.0, 1.0, 0.4, 0.8)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

/// Update HUD text every 10th frame (string formatting is expensive)
pub fn update_hud(
    field: Res<GlyphField>,
    frame_loop: Res<FrameLoop>,
    state: Res<State<AppState>>,
    mut throttle: ResMut<HudThrottle>,
    mut hud_query: Query<&mut Text, With<HudText>>,
) {
    let stats = field.stats();
    // Paused or skipped Update passes must not count the same step twice
    if field.frame() != throttle.last_frame {
        throttle.last_frame = field.frame();
        throttle.window.accumulate(&stats);
    }

    throttle.frame = throttle.frame.wrapping_add(1);
    if throttle.frame % 10 != 0 {
        return;
    }
    let window = std::mem::take(&mut throttle.window);

    let Ok(mut text) = hud_query.get_single_mut() else {
        return;
    };

    let status = if !frame_loop.0.is_running() {
        " [STOPPED]"
    } else if *state.get() == AppState::Paused {
        " [PAUSED]"
    } else {
        ""
    };
    let [falling, orbital, independent] = field.population();
    let viewport = field.viewport();

    let bonding = if field.config().bonding_enabled {
        format!(
            "Bonds: {} | Molecules: {} (largest {})\n\
             Formed: {} | Decayed: {} | Shattered: {} | Split: {}\n",
            field.bonds().len(),
            stats.molecules,
            stats.largest_molecule,
            window.bonds_formed,
            window.bonds_decayed,
            window.full_breaks,
            window.partial_breaks,
        )
    } else {
        String::new()
    };

    **text = format!(
        "GLYPHFIELD | Mode: {}{}\n\
         Viewport: {:.0}x{:.0} @{:.1}x | t = {:.1}s\n\
         Falling: {} | Orbital: {} | Independent: {}\n\
         Collisions: {}\n\
         {}\
         \n\
         [M] Next mode  [R] Reseed  [Space] Pause  [Esc] Stop",
        field.config().mode,
        status,
        viewport.width,
        viewport.height,
        viewport.pixel_ratio,
        field.elapsed(),
        falling,
        orbital,
        independent,
        window.collisions,
        bonding,
    );
}

/// Keyboard controls: mode cycling, reseed, pause and stop
pub fn control_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<AppState>>,
    mut next_state: ResMut<NextState<AppState>>,
    mut field: ResMut<GlyphField>,
    mut frame_loop: ResMut<FrameLoop>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        let next = match state.get() {
            AppState::Running => AppState::Paused,
            AppState::Paused => AppState::Running,
        };
        next_state.set(next);
    }

    if keyboard.just_pressed(KeyCode::KeyM) {
        let current = field.config();
        let mode = current.mode.next();
        let config = SimConfig { seed: current.seed, ..SimConfig::preset(mode) };
        info!("Switching mode: {} -> {}", current.mode, mode);
        field.set_config(config);
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        let config = SimConfig {
            seed: field.config().seed.wrapping_add(1),
            ..field.config().clone()
        };
        info!("Reseeding field (seed {})", config.seed);
        field.set_config(config);
    }

    if keyboard.just_pressed(KeyCode::Escape) && frame_loop.0.is_running() {
        frame_loop.0.stop();
        info!("Frame loop stopped at frame {}", field.frame());
    }
}

use glyph_core::Viewport;
use glyph_core::constants::{
    ATTRACTOR_RATE_X, ATTRACTOR_RATE_Y, ATTRACTOR_SOFTENING, ATTRACTOR_SPAN, DISTANCE_EPSILON,
};

/// Position of the shared attractor after `elapsed` seconds.
/// Traces a slow closed Lissajous curve around the viewport center.
pub fn attractor_position(elapsed: f32, viewport: &Viewport) -> [f32; 2] {
    let [cx, cy] = viewport.center();
    [
        cx + (elapsed * ATTRACTOR_RATE_X).cos() * viewport.width * ATTRACTOR_SPAN,
        cy + (elapsed * 2.0 * ATTRACTOR_RATE_Y).sin() * viewport.height * ATTRACTOR_SPAN,
    ]
}

/// Softened inverse-square pull of `target` on a particle at `pos`.
/// Returns [ax, ay]; zero when the particle sits on the target.
pub fn attraction(pos: [f32; 2], target: [f32; 2], strength: f32) -> [f32; 2] {
    let dx = target[0] - pos[0];
    let dy = target[1] - pos[1];

    let d2 = dx * dx + dy * dy;
    let d = d2.sqrt();
    if d < DISTANCE_EPSILON {
        return [0.0, 0.0];
    }

    let r2 = d2 + ATTRACTOR_SOFTENING * ATTRACTOR_SOFTENING;
    let f = strength / r2;

    [f * dx / d, f * dy / d]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attraction_symmetry() {
        let a1 = attraction([0.0, 0.0], [100.0, 0.0], 1.0);
        let a2 = attraction([100.0, 0.0], [0.0, 0.0], 1.0);

        assert!((a1[0] + a2[0]).abs() < 1e-6);
        assert!((a1[1] + a2[1]).abs() < 1e-6);
        assert!(a1[0] > 0.0);
    }

    #[test]
    fn test_attraction_inverse_square() {
        let near = attraction([0.0, 0.0], [200.0, 0.0], 1.0);
        let far = attraction([0.0, 0.0], [400.0, 0.0], 1.0);

        // At 2x distance, ~1/4 (softening keeps it a little off)
        let ratio = near[0] / far[0];
        assert!((ratio - 4.0).abs() < 0.2, "ratio = {}", ratio);
    }

    #[test]
    fn test_attraction_at_center_is_zero() {
        assert_eq!(attraction([5.0, 5.0], [5.0, 5.0], 10.0), [0.0, 0.0]);
    }

    #[test]
    fn test_attractor_path_is_closed_and_bounded() {
        let viewport = Viewport::new(1000.0, 800.0, 1.0);
        for step in 0..1000 {
            let [x, y] = attractor_position(step as f32 * 0.5, &viewport);
            assert!((200.0..=800.0).contains(&x), "x = {}", x);
            assert!((160.0..=640.0).contains(&y), "y = {}", y);
        }
    }
}

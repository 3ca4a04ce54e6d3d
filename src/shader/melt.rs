//! The "70s melt" field: an iterated sinusoidal domain warp followed by a
//! five-color palette blend.

use super::{cos_range, mix, BLUE, DARK_BLUE, ORANGE, RED, YELLOW};
use glam::{Vec2, Vec3};

/// Number of warp steps (`i` runs over `1..WARP_ZOOM`).
pub const WARP_ZOOM: u32 = 40;
pub const BRIGHTNESS: f32 = 0.975;

/// Time-modulated scalars shared by every pixel of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeltParams {
    pub time: f32,
    pub ct: f32,
    pub x_boost: f32,
    pub y_boost: f32,
    pub f_scale: f32,
    /// Per-frame phase offsets of the x and y sine terms.
    pub x_phase: f32,
    pub y_phase: f32,
}

impl MeltParams {
    /// `time` is already scaled (see [`super::TIME_SCALE`]).
    pub fn at(time: f32) -> Self {
        let ct = cos_range(time * 5.0, 3.0, 1.1);
        Self {
            time,
            ct,
            x_boost: cos_range(time * 0.2, 5.0, 5.0),
            y_boost: cos_range(time * 0.1, 10.0, 5.0),
            f_scale: cos_range(time * 15.5, 1.25, 0.5),
            x_phase: time * ct.cos() * 0.5 / 20.0,
            y_phase: time * ct * 0.3 / 40.0,
        }
    }
}

/// Runs the warp. `step_mul` scales every per-step increment; the plain melt
/// passes 1.0, the touch sketch passes `1 + 1.5 * ripple`.
pub fn warp(mut p: Vec2, params: &MeltParams, step_mul: f32) -> Vec2 {
    for i in 1..WARP_ZOOM {
        p += warp_increment(p, i, params) * step_mul;
    }
    p
}

/// Increment of warp step `i`. Both axes read `p` as it was at the start of
/// the step.
pub fn warp_increment(p: Vec2, i: u32, params: &MeltParams) -> Vec2 {
    let fi = i as f32;
    let amp = 0.25 / fi;
    let dx = amp * (fi * p.y + params.x_phase + 0.005 * fi).sin() * params.f_scale + params.x_boost;
    let dy = amp * (fi * p.x + params.y_phase + 0.03 * (i + 15) as f32).sin() * params.f_scale
        + params.y_boost;
    Vec2::new(dx, dy)
}

/// Palette blend of a warped coordinate, before brightness.
pub fn palette_blend(p: Vec2) -> Vec3 {
    let r = 0.5 * (3.0 * p.x).sin() + 0.5;
    let g = 0.5 * (3.0 * p.y).sin() + 0.5;
    let b = 0.5 * (p.x + p.y).sin() + 0.5;

    let mut col = DARK_BLUE;
    col = mix(col, BLUE, r);
    col = mix(col, ORANGE, g * 0.8);
    col = mix(col, YELLOW, b * 0.6);
    mix(col, RED, (1.0 - r) * g * 0.7)
}

/// Full melt color for shader-space point `p` at scaled time `time`.
pub fn color(p: Vec2, time: f32) -> Vec3 {
    shade(p, &MeltParams::at(time))
}

/// Same as [`color`] with the per-frame scalars precomputed.
pub fn shade(p: Vec2, params: &MeltParams) -> Vec3 {
    palette_blend(warp(p, params, 1.0)) * BRIGHTNESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn params_at_zero_sit_on_range_maxima() {
        let m = MeltParams::at(0.0);
        assert!((m.ct - 4.1).abs() < 1e-6);
        assert!((m.x_boost - 10.0).abs() < 1e-6);
        assert!((m.y_boost - 15.0).abs() < 1e-6);
        assert!((m.f_scale - 1.75).abs() < 1e-6);
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn palette_blend_at_known_points() {
        use glam::vec3;
        use std::f32::consts::FRAC_PI_6;
        // r = g = b = 0.5
        assert!(close(palette_blend(Vec2::ZERO), vec3(0.692412, 0.524738, 0.272441)));
        // r = 1, g = 0.5, b = 0.75: the red layer drops out.
        assert!(close(
            palette_blend(vec2(FRAC_PI_6, 0.0)),
            vec3(0.776110, 0.697080, 0.356250)
        ));
        // r = 0, g = 1, b = 0.5: full red weight of 0.7.
        assert!(close(
            palette_blend(vec2(-FRAC_PI_6, FRAC_PI_6)),
            vec3(0.829090, 0.398250, 0.181012)
        ));
    }

    #[test]
    fn phases_follow_time_and_ct() {
        let m = MeltParams::at(10.0);
        assert!((m.ct - 3.564181).abs() < 1e-5);
        assert!((m.f_scale - 0.558558).abs() < 1e-5);
        assert!((m.x_phase - -0.228008).abs() < 1e-5);
        assert!((m.y_phase - 0.267314).abs() < 1e-5);
    }

    #[test]
    fn warp_increment_at_known_params() {
        let m = MeltParams::at(10.0);
        let p = vec2(0.2, -0.1);
        let boost = vec2(m.x_boost, m.y_boost);

        let first = warp_increment(p, 1, &m) - boost;
        assert!((first - vec2(-0.044324, 0.113366)).length() < 1e-5, "{first:?}");
        let seventh = warp_increment(p, 7, &m) - boost;
        assert!((seventh - vec2(-0.015539, 0.014507)).length() < 1e-5, "{seventh:?}");
    }

    #[test]
    fn warp_is_the_sum_of_increments() {
        let m = MeltParams::at(2.5);
        let mut q = vec2(-0.4, 0.3);
        for i in 1..WARP_ZOOM {
            q += warp_increment(q, i, &m) * 2.0;
        }
        assert_eq!(warp(vec2(-0.4, 0.3), &m, 2.0), q);
    }

    #[test]
    fn zero_step_multiplier_leaves_point_unwarped() {
        let p = vec2(0.3, -0.2);
        assert_eq!(warp(p, &MeltParams::at(3.0), 0.0), p);
    }

    #[test]
    fn warp_drifts_by_boost_sum() {
        // Each step adds the boost plus a bounded sine term, so after 39 steps
        // the drift stays within the harmonic sum of the amplitudes.
        let m = MeltParams::at(0.0);
        let p = warp(Vec2::ZERO, &m, 1.0);
        let harmonic: f32 = (1..WARP_ZOOM).map(|i| 0.25 / i as f32).sum::<f32>() * m.f_scale;
        assert!((p.x - 39.0 * m.x_boost).abs() <= harmonic + 1e-3);
        assert!((p.y - 39.0 * m.y_boost).abs() <= harmonic + 1e-3);
    }
}

//! Touch fields layered over the melt: displacement, vortex rotation, ripple
//! rings and color injection, summed over every live touch record.

use super::melt::{self, MeltParams, BRIGHTNESS};
use super::{fract, mix, smoothstep, BLUE, ORANGE, RED, YELLOW};
use crate::touch::{FrameUniforms, TouchUniform, RIPPLE_DURATION};
use glam::{Mat2, Vec2, Vec3};
use std::f32::consts::TAU;

pub const DISPLACE_RADIUS: f32 = 0.4;
pub const VORTEX_RADIUS: f32 = 0.6;
pub const INJECT_RADIUS: f32 = 0.5;
pub const RIPPLE_WIDTH: f32 = 0.15;
pub const RIPPLE_SPEED: f32 = 0.8;
/// Melt step multiplier per unit of summed ripple.
pub const RIPPLE_WARP: f32 = 1.5;

/// Keeps `normalize` finite when the query point sits on the touch.
const NORMALIZE_EPS: Vec2 = Vec2::splat(0.001);
const MIN_WEIGHT_SUM: f32 = 0.01;
const HUE_CYCLE: [Vec3; 4] = [BLUE, ORANGE, YELLOW, RED];

fn expired(rec: &TouchUniform) -> bool {
    !rec.extended_active && rec.age > RIPPLE_DURATION
}

fn release_fade(age: f32, rate: f32) -> f32 {
    (1.0 - rate * age).max(0.0)
}

/// Push toward the touch point, plus a drag smear while the touch is pressed.
/// Callers pass zero drag for every record but the dragged one.
pub fn displacement(p: Vec2, rec: &TouchUniform, drag_velocity: Vec2) -> Vec2 {
    if expired(rec) {
        return Vec2::ZERO;
    }
    let falloff = smoothstep(DISPLACE_RADIUS, 0.0, p.distance(rec.position));
    let dir = (rec.position - p + NORMALIZE_EPS).normalize();
    let strength = if rec.active {
        0.2
    } else {
        0.08 * release_fade(rec.age, 0.5)
    };
    let drag = if rec.active {
        -drag_velocity * 0.4
    } else {
        Vec2::ZERO
    };
    (dir * strength + drag) * falloff
}

/// Rotates `p` about the touch point; the angle fades out with distance.
pub fn vortex(p: Vec2, rec: &TouchUniform) -> Vec2 {
    if expired(rec) {
        return p;
    }
    let offset = p - rec.position;
    let falloff = smoothstep(VORTEX_RADIUS, 0.0, offset.length());
    if falloff == 0.0 {
        return p;
    }
    let strength = if rec.active {
        0.8
    } else {
        0.4 * release_fade(rec.age, 0.4)
    };
    rec.position + Mat2::from_angle(falloff * strength) * offset
}

/// Expanding ring intensity; the ring radius grows with the record's age.
pub fn ripple(p: Vec2, rec: &TouchUniform) -> f32 {
    if !rec.extended_active {
        return 0.0;
    }
    let radius = rec.age * RIPPLE_SPEED;
    let ring = 1.0 - smoothstep(0.0, RIPPLE_WIDTH, (p.distance(rec.position) - radius).abs());
    let fade = release_fade(rec.age, 0.5);
    let strength = if rec.active { 0.3 } else { 0.2 };
    ring * fade * strength
}

/// Piecewise blue → orange → yellow → red → blue over one turn of `cycle`
/// (radians).
pub fn hue_cycle(cycle: f32) -> Vec3 {
    let seg = fract(cycle / TAU) * 4.0;
    let idx = (seg.floor() as usize).min(3);
    let f = (seg - idx as f32).clamp(0.0, 1.0);
    mix(HUE_CYCLE[idx], HUE_CYCLE[(idx + 1) % 4], f)
}

/// Weighted injected color and its weight.
pub fn injection(p: Vec2, rec: &TouchUniform) -> (Vec3, f32) {
    if expired(rec) {
        return (Vec3::ZERO, 0.0);
    }
    let offset = p - rec.position;
    let falloff = smoothstep(INJECT_RADIUS, 0.0, offset.length());
    let cycle = offset.y.atan2(offset.x) + rec.age * 1.5;
    let (color_strength, weight_strength) = if rec.active {
        (0.6, 0.7)
    } else {
        let fade = release_fade(rec.age, 0.4);
        (0.3 * fade, 0.4 * fade)
    };
    (
        hue_cycle(cycle) * falloff * color_strength,
        falloff * weight_strength,
    )
}

/// Accumulated touch influence at one query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSample {
    /// Query point after displacement and vortex rotation.
    pub p: Vec2,
    pub displacement: Vec2,
    pub ripple: f32,
    pub inject_sum: Vec3,
    pub weight_sum: f32,
}

impl TouchSample {
    pub fn injected_color(&self) -> Vec3 {
        self.inject_sum / self.weight_sum.max(MIN_WEIGHT_SUM)
    }

    /// Blend factor of the injected color into the melt, at most 1.
    pub fn blend_factor(&self) -> f32 {
        self.weight_sum.min(1.0)
    }

    pub fn step_multiplier(&self) -> f32 {
        1.0 + RIPPLE_WARP * self.ripple
    }
}

/// Evaluates every record at `p` in slot order. Displacement, ripple and
/// injection read the original point; vortex rotations compose on the
/// displaced point.
pub fn aggregate(p: Vec2, uniforms: &FrameUniforms) -> TouchSample {
    let mut displacement_sum = Vec2::ZERO;
    let mut ripple_sum = 0.0;
    let mut inject_sum = Vec3::ZERO;
    let mut weight_sum = 0.0;

    for (slot, rec) in uniforms.touches.iter().enumerate() {
        let Some(rec) = rec else { continue };
        displacement_sum += displacement(p, rec, uniforms.drag_for(slot));
        ripple_sum += ripple(p, rec);
        let (c, w) = injection(p, rec);
        inject_sum += c;
        weight_sum += w;
    }

    let mut q = p + displacement_sum;
    for rec in uniforms.touches.iter().flatten() {
        q = vortex(q, rec);
    }

    TouchSample {
        p: q,
        displacement: displacement_sum,
        ripple: ripple_sum,
        inject_sum,
        weight_sum,
    }
}

/// Touch sketch color at `p`, with the frame's melt scalars precomputed.
pub fn shade(p: Vec2, params: &MeltParams, uniforms: &FrameUniforms) -> Vec3 {
    let sample = aggregate(p, uniforms);
    let warped = melt::warp(sample.p, params, sample.step_multiplier());
    let col = mix(
        melt::palette_blend(warped),
        sample.injected_color(),
        sample.blend_factor(),
    );
    col * BRIGHTNESS
}

pub fn color(p: Vec2, uniforms: &FrameUniforms) -> Vec3 {
    shade(p, &MeltParams::at(uniforms.scaled_time()), uniforms)
}

//! Per-pixel shading code.
//!
//! Everything in here is a pure function of its arguments so that a frame can
//! be evaluated pixel by pixel in any order. The helpers mirror the GLSL
//! built-ins the sketches were designed around (`smoothstep`, `mix`, ...), with
//! the same edge behavior.

pub mod melt;
pub mod touch;

use glam::{vec2, Vec2, Vec3};
use std::f32::consts::PI;

/// Dark-blue base the palette blend starts from (#222735).
pub const DARK_BLUE: Vec3 = Vec3::new(0.133, 0.153, 0.208);
/// #8bc8dd
pub const BLUE: Vec3 = Vec3::new(0.545, 0.784, 0.867);
/// #e5921a
pub const ORANGE: Vec3 = Vec3::new(0.898, 0.573, 0.102);
/// #e2b11b
pub const YELLOW: Vec3 = Vec3::new(0.886, 0.694, 0.106);
/// #d85535
pub const RED: Vec3 = Vec3::new(0.847, 0.333, 0.208);

/// Factor applied to wall-clock seconds before they drive any periodic term.
pub const TIME_SCALE: f32 = 1.25;

pub fn saturate(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}

/// GLSL `smoothstep`. Reversed edges (`edge0 > edge1`) give a falling curve,
/// which the falloff fields rely on.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = saturate((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

/// GLSL `mix` for colors: `a*(1-w) + b*w`.
pub fn mix(a: Vec3, b: Vec3, w: f32) -> Vec3 {
    a * (1.0 - w) + b * w
}

pub fn radians(deg: f32) -> f32 {
    deg * (PI / 180.0)
}

pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Smooth oscillation of `angle_deg` mapped into `[minimum, minimum + range]`.
pub fn cos_range(angle_deg: f32, range: f32, minimum: f32) -> f32 {
    ((1.0 + radians(angle_deg).cos()) * 0.5) * range + minimum
}

/// Maps a pixel centre to shader space. `frag` is measured from the bottom-left
/// corner (GL convention); the longer axis spans `[-1, 1]`.
pub fn frag_to_shader(frag: Vec2, resolution: Vec2) -> Vec2 {
    (2.0 * frag - resolution) / resolution.x.max(resolution.y).max(1.0)
}

/// Shader-space coordinate of the pixel at column `x`, row `y` of a top-down
/// frame buffer of `w`×`h` pixels.
pub fn pixel_to_shader(x: usize, y: usize, w: usize, h: usize) -> Vec2 {
    let frag = vec2(x as f32 + 0.5, h as f32 - (y as f32 + 0.5));
    frag_to_shader(frag, vec2(w as f32, h as f32))
}

/// Quantizes a linear color for an RGBA8 buffer. Out-of-range channels
/// saturate the same way a display would.
pub fn to_rgb8(col: Vec3) -> [u8; 3] {
    let c = col.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8]
}

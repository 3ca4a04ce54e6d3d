use crate::config::SketchMode;
use crate::shader::{self, melt::MeltParams};
use crate::touch::FrameUniforms;
use glam::Vec3;

pub struct RenderCtx {
    pub w: usize,
    pub h: usize,
    /// Pixel block edge; one shader evaluation fills `scale`×`scale` pixels.
    pub scale: usize,
    pub uniforms: FrameUniforms,
}

impl RenderCtx {
    pub fn new(w: usize, h: usize, scale: usize, uniforms: FrameUniforms) -> Self {
        Self {
            w,
            h,
            scale,
            uniforms,
        }
    }
}

pub trait Sketch {
    fn name(&self) -> &'static str;
    fn mode(&self) -> SketchMode;

    /// Color of shader-space point `p`. `params` holds the frame's melt
    /// scalars so they are evaluated once per frame, not once per pixel.
    fn shade(&self, p: glam::Vec2, params: &MeltParams, uniforms: &FrameUniforms) -> Vec3;

    fn render(&self, ctx: &RenderCtx, out: &mut [u8]) {
        let w = ctx.w;
        let h = ctx.h;
        let scale = ctx.scale.max(1);
        if w == 0 || h == 0 || out.len() < w.saturating_mul(h).saturating_mul(4) {
            return;
        }

        let params = MeltParams::at(ctx.uniforms.scaled_time());

        for by in (0..h).step_by(scale) {
            for bx in (0..w).step_by(scale) {
                // Sample the block centre so downscaled frames stay centred.
                let cx = (bx + scale / 2).min(w - 1);
                let cy = (by + scale / 2).min(h - 1);
                let p = shader::pixel_to_shader(cx, cy, w, h);
                let [r, g, b] = shader::to_rgb8(self.shade(p, &params, &ctx.uniforms));

                for dy in 0..scale {
                    for dx in 0..scale {
                        let x2 = bx + dx;
                        let y2 = by + dy;
                        if x2 >= w || y2 >= h {
                            continue;
                        }
                        let i = (y2 * w + x2) * 4;
                        out[i] = r;
                        out[i + 1] = g;
                        out[i + 2] = b;
                        out[i + 3] = 255;
                    }
                }
            }
        }
    }
}

pub struct MeltSketch;

impl Sketch for MeltSketch {
    fn name(&self) -> &'static str {
        "70s Melt"
    }

    fn mode(&self) -> SketchMode {
        SketchMode::Melt
    }

    fn shade(&self, p: glam::Vec2, params: &MeltParams, _uniforms: &FrameUniforms) -> Vec3 {
        shader::melt::shade(p, params)
    }
}

pub struct TouchSketch;

impl Sketch for TouchSketch {
    fn name(&self) -> &'static str {
        "70s Melt: Touch"
    }

    fn mode(&self) -> SketchMode {
        SketchMode::Touch
    }

    fn shade(&self, p: glam::Vec2, params: &MeltParams, uniforms: &FrameUniforms) -> Vec3 {
        shader::touch::shade(p, params, uniforms)
    }
}

pub fn make_sketch(mode: SketchMode) -> Box<dyn Sketch> {
    match mode {
        SketchMode::Melt => Box::new(MeltSketch),
        SketchMode::Touch => Box::new(TouchSketch),
    }
}

/// Owns the RGBA8 frame buffer and the active sketch.
pub struct SketchEngine {
    sketch: Box<dyn Sketch>,
    front: Vec<u8>,
    w: usize,
    h: usize,
}

impl SketchEngine {
    pub fn new(mode: SketchMode) -> Self {
        Self {
            sketch: make_sketch(mode),
            front: Vec::new(),
            w: 0,
            h: 0,
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        if w == self.w && h == self.h {
            return;
        }
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.front.clear();
        self.front.resize(n, 0);
    }

    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    pub fn mode(&self) -> SketchMode {
        self.sketch.mode()
    }

    pub fn set_sketch(&mut self, mode: SketchMode) {
        if self.sketch.mode() != mode {
            self.sketch = make_sketch(mode);
        }
    }

    pub fn sketch_name(&self) -> &'static str {
        self.sketch.name()
    }

    /// Overwrites the whole buffer. `ctx.w`/`ctx.h` must match the last resize;
    /// a mismatched context leaves the previous frame in place.
    pub fn render(&mut self, ctx: &RenderCtx) -> &[u8] {
        if ctx.w == self.w && ctx.h == self.h {
            self.sketch.render(ctx, &mut self.front);
        }
        &self.front
    }

    pub fn frame(&self) -> &[u8] {
        &self.front
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn render_fills_alpha_for_every_pixel() {
        let mut engine = SketchEngine::new(SketchMode::Melt);
        engine.resize(7, 5);
        let ctx = RenderCtx::new(7, 5, 3, FrameUniforms::untouched(vec2(7.0, 5.0), 0.0));
        let buf = engine.render(&ctx);
        assert_eq!(buf.len(), 7 * 5 * 4);
        assert!(buf.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn mismatched_ctx_is_ignored() {
        let mut engine = SketchEngine::new(SketchMode::Touch);
        engine.resize(4, 4);
        let ctx = RenderCtx::new(8, 8, 1, FrameUniforms::untouched(vec2(8.0, 8.0), 0.0));
        assert!(engine.render(&ctx).iter().all(|&b| b == 0));
    }
}

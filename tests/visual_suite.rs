use glam::vec2;
use melt_visualizer::config::SketchMode;
use melt_visualizer::touch::{FrameUniforms, PointerId, TouchTable};
use melt_visualizer::visual::{make_sketch, RenderCtx, SketchEngine};

fn ctx(w: usize, h: usize, scale: usize, uniforms: FrameUniforms) -> RenderCtx {
    RenderCtx::new(w, h, scale, uniforms)
}

fn lit_pixels(buf: &[u8]) -> usize {
    buf.chunks_exact(4)
        .filter(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
        .count()
}

#[test]
fn engine_buffer_matches_resize() {
    let mut engine = SketchEngine::new(SketchMode::Touch);
    engine.resize(32, 18);
    assert_eq!(engine.size(), (32, 18));
    assert_eq!(engine.frame().len(), 32 * 18 * 4);
}

#[test]
fn both_sketches_fill_every_pixel() {
    for mode in [SketchMode::Melt, SketchMode::Touch] {
        let mut engine = SketchEngine::new(mode);
        engine.resize(24, 16);
        let u = FrameUniforms::untouched(vec2(24.0, 16.0), 0.75);
        let buf = engine.render(&ctx(24, 16, 1, u));
        // The palette has no black, so every pixel is lit.
        assert_eq!(lit_pixels(buf), 24 * 16, "{mode:?}");
    }
}

#[test]
fn untouched_touch_sketch_matches_melt() {
    let u = FrameUniforms::untouched(vec2(20.0, 12.0), 1.5);
    let mut melt = SketchEngine::new(SketchMode::Melt);
    let mut touch = SketchEngine::new(SketchMode::Touch);
    melt.resize(20, 12);
    touch.resize(20, 12);
    assert_eq!(melt.render(&ctx(20, 12, 1, u)), touch.render(&ctx(20, 12, 1, u)));
}

#[test]
fn press_changes_the_touch_frame() {
    let mut table = TouchTable::new();
    let res = vec2(20.0, 20.0);
    let mut engine = SketchEngine::new(SketchMode::Touch);
    engine.resize(20, 20);
    let before = engine.render(&ctx(20, 20, 1, table.uniforms(res, 0.0))).to_vec();

    table.press(PointerId(0), vec2(0.0, 0.0));
    let after = engine.render(&ctx(20, 20, 1, table.uniforms(res, 0.0))).to_vec();
    assert_ne!(before, after);
    // Corners sit outside every field radius at age 0.
    assert_eq!(&before[..4], &after[..4]);
}

#[test]
fn scale_fills_blocks_with_one_color() {
    let mut engine = SketchEngine::new(SketchMode::Melt);
    engine.resize(8, 8);
    let buf = engine
        .render(&ctx(8, 8, 4, FrameUniforms::untouched(vec2(8.0, 8.0), 0.3)))
        .to_vec();
    for y in 0..4 {
        for x in 0..4 {
            let i = (y * 8 + x) * 4;
            assert_eq!(&buf[i..i + 4], &buf[..4], "pixel ({x},{y})");
        }
    }
}

#[test]
fn set_sketch_switches_names() {
    let mut engine = SketchEngine::new(SketchMode::Melt);
    assert_eq!(engine.sketch_name(), make_sketch(SketchMode::Melt).name());
    engine.set_sketch(SketchMode::Touch);
    assert_eq!(engine.mode(), SketchMode::Touch);
    assert_ne!(engine.sketch_name(), make_sketch(SketchMode::Melt).name());
}

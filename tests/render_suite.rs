use melt_visualizer::config::RendererMode;
use melt_visualizer::render::{
    hard_wrap, make_renderer, AsciiRenderer, BrailleRenderer, Frame, HalfBlockRenderer,
    KittyRenderer, Renderer,
};

/// Build a solid-color RGBA pixel buffer.
fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = 255;
    }
    buf
}

/// Build a gradient pixel buffer (varies across x).
fn gradient_pixels(w: usize, h: usize) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            let t = (x as f32 / w.max(1) as f32 * 255.0) as u8;
            buf[i] = t;
            buf[i + 1] = 128;
            buf[i + 2] = 255 - t;
            buf[i + 3] = 255;
        }
    }
    buf
}

fn make_frame<'a>(
    cols: u16,
    visual_rows: u16,
    pw: usize,
    ph: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 2,
        visual_rows,
        pixel_width: pw,
        pixel_height: ph,
        pixels_rgba: pixels,
        hud: "Sketch: 70s Melt | Touches: 1/1 live",
        hud_rows: 1,
        overlay: None,
        sync_updates: sync,
    }
}

// ── ASCII renderer ──────────────────────────────────────────────────────────

#[test]
fn ascii_renders_solid_frame() {
    // Wide enough that the HUD line is not cut before the touch counter.
    let cols = 40u16;
    let rows = 5u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 200, 200, 200);
    let frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l"), "missing autowrap-off");
    assert!(s.contains("\x1b[?7h"), "missing autowrap-on");
    assert!(s.contains("38;2;200;200;200"), "missing FG color");
    assert!(s.contains("Touches: 1/1"), "HUD text missing");
    assert!(!s.contains("\x1b[?2026h"), "sync markers without sync_updates");
}

#[test]
fn narrow_hud_keeps_the_prefix_that_fits() {
    let pixels = solid_pixels(10, 5, 200, 200, 200);
    let frame = make_frame(10, 5, 10, 5, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Sketch: 70"), "HUD prefix missing");
    assert!(!s.contains("Sketch: 70s"), "HUD not cut to 10 columns");
}

#[test]
fn ascii_skips_zero_size() {
    let pixels = solid_pixels(1, 1, 0, 0, 0);
    let frame = make_frame(0, 0, 0, 0, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for zero-size frame");
}

#[test]
fn short_buffer_reports_instead_of_panicking() {
    let pixels = solid_pixels(2, 2, 9, 9, 9);
    let frame = make_frame(4, 4, 4, 4, &pixels, true);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("pixel buffer too small"), "got {s:?}");
    assert!(s.ends_with("\x1b[?2026l"));
}

// ── HalfBlock renderer ─────────────────────────────────────────────────────

#[test]
fn halfblock_renders_gradient_frame() {
    let cols = 8u16;
    let rows = 4u16;
    let pw = cols as usize;
    let ph = (rows as usize) * 2;
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, true);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.starts_with("\x1b[?2026h"), "missing sync-begin");
    assert!(s.ends_with("\x1b[?2026l"), "missing sync-end");
    assert_eq!(s.matches('\u{2580}').count(), 32);
    assert!(s.contains("38;2;"), "missing FG escape");
    assert!(s.contains("48;2;"), "missing BG escape");
}

#[test]
fn halfblock_skips_dimension_mismatch() {
    // pixel_height should be visual_rows*2, but give visual_rows*1
    let pixels = solid_pixels(4, 4, 100, 100, 100);
    let frame = make_frame(4, 4, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for dimension mismatch");
}

#[test]
fn halfblock_resets_color_cache_each_frame() {
    let pw = 4;
    let ph = 4;
    let mut renderer = HalfBlockRenderer::new();

    let pixels1 = solid_pixels(pw, ph, 255, 0, 0);
    let mut out1 = Vec::new();
    renderer
        .render(&make_frame(4, 2, pw, ph, &pixels1, false), &mut out1)
        .unwrap();
    assert!(String::from_utf8_lossy(&out1).contains("38;2;255;0;0"));

    let pixels2 = solid_pixels(pw, ph, 0, 0, 255);
    let mut out2 = Vec::new();
    renderer
        .render(&make_frame(4, 2, pw, ph, &pixels2, false), &mut out2)
        .unwrap();
    assert!(String::from_utf8_lossy(&out2).contains("38;2;0;0;255"));
}

// ── Braille renderer ────────────────────────────────────────────────────────

#[test]
fn braille_renders_gradient_frame() {
    let cols = 40u16;
    let rows = 3u16;
    let pw = (cols as usize) * 2;
    let ph = (rows as usize) * 4;
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, false);
    let mut out = Vec::new();
    BrailleRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(
        s.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)),
        "no braille characters found"
    );
    assert!(s.contains("Touches: 1/1"), "HUD text missing");
}

// ── Kitty renderer ──────────────────────────────────────────────────────────

#[test]
fn kitty_sends_direct_rgba_image() {
    let pixels = solid_pixels(80, 8, 34, 39, 53);
    let frame = make_frame(40, 2, 80, 8, &pixels, true);
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b_Ga=T,f=32,s=80,v=8,t=d,"), "missing transmit header");
    assert!(s.contains("c=40,r=2"), "missing cell placement");
    assert!(s.contains("Touches: 1/1"), "HUD text missing");
}

#[test]
fn kitty_overlay_deletes_image_and_draws_popup() {
    let pixels = solid_pixels(80, 40, 34, 39, 53);
    let mut frame = make_frame(40, 10, 80, 40, &pixels, false);
    frame.overlay = Some("70s Melt Hotkeys\nq quit");
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b_Ga=d,d=I,i=1\x1b\\"));
    assert!(s.contains("70s Melt Hotkeys"));
    assert!(!s.contains("a=T"), "image sent under the popup");
}

// ── Shared ──────────────────────────────────────────────────────────────────

#[test]
fn ascii_renders_overlay_popup() {
    let cols = 40u16;
    let rows = 20u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 50, 50, 50);
    let mut frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    frame.overlay = Some("Test Overlay\nSecond line");
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Test Overlay"), "overlay text missing");
    assert!(s.contains("Second line"), "overlay body missing");
}

#[test]
fn hud_lines_are_cut_to_terminal_width() {
    let pixels = solid_pixels(6, 3, 10, 10, 10);
    let mut frame = make_frame(6, 3, 6, 3, &pixels, false);
    frame.hud = "abcdefghij";
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("abcdef"));
    assert!(!s.contains("abcdefg"));
}

#[test]
fn renderer_factory_names_match_modes() {
    assert_eq!(make_renderer(RendererMode::Ascii).name(), "ascii");
    assert_eq!(make_renderer(RendererMode::HalfBlock).name(), "halfblock");
    assert_eq!(make_renderer(RendererMode::Braille).name(), "braille");
    assert_eq!(make_renderer(RendererMode::Kitty).name(), "kitty");
}

#[test]
fn hard_wrap_splits_long_lines_and_keeps_blank_ones() {
    let lines = hard_wrap("abcdefg\n\nxy", 3);
    assert_eq!(lines, vec!["abc", "def", "g", "", "xy"]);
}

use crate::capability::probe_runtime;
use crate::config::Config;
use crate::input::{CellLayout, DemoPilot, MouseTracker};
use crate::logging;
use crate::render::{hard_wrap, make_renderer, Frame};
use crate::terminal::TerminalGuard;
use crate::touch::{PointerAction, PressOutcome, TouchTable};
use crate::visual::{RenderCtx, SketchEngine};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use glam::vec2;
use std::io::BufWriter;
use std::time::{Duration, Instant};

pub fn run(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    logging::init(cfg.log_file.as_deref(), cfg.log_level)?;

    let probe = probe_runtime(cfg.renderer, cfg.auto_probe);
    for note in probe.notes() {
        if probe.changed() {
            log::warn!("{note}");
        } else {
            log::info!("{note}");
        }
    }
    let probe_label = probe.status_label();

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer = make_renderer(probe.renderer);
    let block = probe.renderer.cell_block();

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut session = Session::new(&cfg);
    log::info!(
        "start sketch={} renderer={} size={}x{} fps={} scale={}",
        session.engine.mode().label(),
        renderer.name(),
        last_size.0,
        last_size.1,
        cfg.fps,
        cfg.scale
    );

    let mut hud_rows = hud_rows_for_size(last_size, session.show_hud);
    let mut layout = layout_for(last_size, hud_rows, block);

    let mut last_frame = Instant::now();
    let mut fps = FpsCounter::new();
    let mut last_shade_ms = 0.0f32;
    let mut last_paint_ms = 0.0f32;
    let mut last_total_ms = 0.0f32;

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    if session.handle_key(k.code, k.modifiers) {
                        log::info!("quit");
                        return Ok(());
                    }
                }
                Event::Mouse(m) => {
                    if let Some(action) = session.mouse.translate(&m, &layout) {
                        apply_pointer(&mut session.touches, action);
                    }
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                }
                _ => {}
            }
        }

        // Size check once per frame (resize events can be missed in some terminals).
        let sz = crossterm::terminal::size().context("get terminal size")?;
        if sz != last_size {
            log::debug!("resize {}x{} -> {}x{}", last_size.0, last_size.1, sz.0, sz.1);
            last_size = sz;
        }

        let dt = now.duration_since(last_frame).as_secs_f32().max(1e-6);
        last_frame = now;
        session.advance(dt, layout.shader_extent());

        let (term_cols, term_rows) = last_size;
        let hud = if session.show_hud {
            build_hud(
                term_cols as usize,
                &HudStatus {
                    sketch: session.engine.sketch_name(),
                    renderer: renderer.name(),
                    active_touches: session.touches.active_count(),
                    live_touches: session.touches.live_count(),
                    demo: session.pilot.enabled(),
                    seconds: session.clock.seconds(),
                    paused: session.clock.paused(),
                    fps: fps.fps(),
                    shade_ms: last_shade_ms,
                    paint_ms: last_paint_ms,
                    total_ms: last_total_ms,
                    probe: &probe_label,
                },
            )
        } else {
            String::new()
        };
        let target_hud_rows = hud_rows_for_text(term_rows, session.show_hud, &hud);
        if target_hud_rows != hud_rows {
            log::debug!("hud rows {hud_rows} -> {target_hud_rows}");
            hud_rows = target_hud_rows;
        }
        layout = layout_for(last_size, hud_rows, block);
        let (w, h) = layout.pixel_size();
        session.engine.resize(w, h);

        let uniforms = session
            .touches
            .uniforms(vec2(w as f32, h as f32), session.clock.seconds());
        let ctx = RenderCtx::new(w, h, cfg.scale, uniforms);

        let shade_start = Instant::now();
        let pixels = session.engine.render(&ctx);
        last_shade_ms = shade_start.elapsed().as_secs_f32() * 1000.0;

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows: layout.visual_rows,
            pixel_width: w,
            pixel_height: h,
            pixels_rgba: pixels,
            hud: &hud,
            hud_rows,
            overlay: session.show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };

        let paint_start = Instant::now();
        renderer.render(&frame, &mut out).context("paint frame")?;
        last_paint_ms = paint_start.elapsed().as_secs_f32() * 1000.0;
        last_total_ms = now.elapsed().as_secs_f32() * 1000.0;
        fps.tick();

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

/// Everything the loop mutates in response to input.
struct Session {
    engine: SketchEngine,
    touches: TouchTable,
    mouse: MouseTracker,
    pilot: DemoPilot,
    clock: AnimationClock,
    show_hud: bool,
    show_help: bool,
}

impl Session {
    fn new(cfg: &Config) -> Self {
        let mut pilot = DemoPilot::new(cfg.demo_seed);
        pilot.set_enabled(cfg.demo);
        Self {
            engine: SketchEngine::new(cfg.sketch),
            touches: TouchTable::new(),
            mouse: MouseTracker::new(),
            pilot,
            clock: AnimationClock::new(cfg.time_offset),
            show_hud: true,
            show_help: false,
        }
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers) -> bool {
        if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
            return true;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
            KeyCode::Char(' ') => {
                self.clock.toggle_pause();
                log::info!(
                    "clock {} at {:.2}s",
                    if self.clock.paused() { "paused" } else { "resumed" },
                    self.clock.seconds()
                );
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.engine.set_sketch(self.engine.mode().toggled());
                log::info!(
                    "sketch -> {} ({})",
                    self.engine.mode().label(),
                    self.engine.sketch_name()
                );
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                for action in self.pilot.toggle() {
                    apply_pointer(&mut self.touches, action);
                }
                log::info!("demo autopilot {}", if self.pilot.enabled() { "on" } else { "off" });
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.touches.clear();
                self.mouse.release_all();
                if self.pilot.enabled() {
                    // Restart strokes; their stale releases hit an empty table.
                    self.pilot.set_enabled(false);
                    self.pilot.set_enabled(true);
                }
                log::info!("touches cleared");
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.show_hud = !self.show_hud;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
            }
            _ => {}
        }
        false
    }

    /// Per-frame update. A paused clock also freezes touch ages, drag decay
    /// and the autopilot.
    fn advance(&mut self, dt: f32, extent: glam::Vec2) {
        if self.clock.paused() {
            return;
        }
        self.clock.advance(dt);
        for action in self.pilot.step(dt, extent) {
            apply_pointer(&mut self.touches, action);
        }
        self.touches.advance(dt);
    }
}

fn apply_pointer(touches: &mut TouchTable, action: PointerAction) {
    match touches.apply(action) {
        Some(PressOutcome::Assigned { slot }) => {
            log::debug!("{action:?} -> slot {slot}");
        }
        Some(PressOutcome::Evicted { slot, previous }) => {
            log::info!("{action:?} evicted slot {slot} (was {previous:?})");
        }
        Some(PressOutcome::AlreadyDown { slot }) => {
            log::trace!("{action:?} already down in slot {slot}");
        }
        None => {
            if let PointerAction::Release(id) = action {
                log::debug!("release {id:?}");
            }
        }
    }
}

/// Seconds fed to the sketches. Pausing stops it without losing its place.
#[derive(Clone, Debug)]
pub(crate) struct AnimationClock {
    seconds: f32,
    paused: bool,
}

impl AnimationClock {
    pub(crate) fn new(offset: f32) -> Self {
        Self {
            seconds: offset,
            paused: false,
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        if !self.paused {
            self.seconds += dt.max(0.0);
        }
    }

    pub(crate) fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub(crate) fn paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn seconds(&self) -> f32 {
        self.seconds
    }
}

fn layout_for(size: (u16, u16), hud_rows: u16, block: (usize, usize)) -> CellLayout {
    let (cols, rows) = size;
    CellLayout::new(cols, rows.saturating_sub(hud_rows).max(1), block)
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud {
        return 0;
    }
    let rows = size.1;
    if rows <= 1 {
        return 0;
    }
    (rows - 1).min(3)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let wanted = hud.lines().count() as u16;
    wanted.min(term_rows.saturating_sub(1))
}

struct HudStatus<'a> {
    sketch: &'a str,
    renderer: &'a str,
    active_touches: usize,
    live_touches: usize,
    demo: bool,
    seconds: f32,
    paused: bool,
    fps: f32,
    shade_ms: f32,
    paint_ms: f32,
    total_ms: f32,
    probe: &'a str,
}

fn build_hud(cols: usize, s: &HudStatus<'_>) -> String {
    let text = format!(
        "Sketch: {} | Touches: {}/{} live | Demo: {} | Clock: {:>6.1}s{} | FPS: {:>4.1}\n\
         ms(S/P/T): {:>4.1}/{:>4.1}/{:>4.1} | Renderer: {} | Probe: {}\n\
         Keys: space pause | m sketch | a demo | c clear | i HUD | ?/h/F1 help | q quit",
        s.sketch,
        s.active_touches,
        s.live_touches,
        if s.demo { "on" } else { "off" },
        s.seconds,
        if s.paused { " (paused)" } else { "" },
        s.fps,
        s.shade_ms,
        s.paint_ms,
        s.total_ms,
        s.renderer,
        s.probe,
    );
    hard_wrap(&text, cols).join("\n")
}

fn help_popup_text() -> &'static str {
    "70s Melt Hotkeys\n\
mouse  press/drag to touch (left, middle, right are separate touches)\n\
space  pause/resume the clock\n\
m  switch sketch: melt / touch\n\
a  toggle demo autopilot\n\
c  clear all touches\n\
i  show/hide HUD\n\
? or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SketchMode;
    use crate::touch::PointerId;
    use clap::Parser;
    use glam::Vec2;

    fn session(args: &[&str]) -> Session {
        let mut argv = vec!["melt_visualizer"];
        argv.extend_from_slice(args);
        Session::new(&Config::parse_from(argv))
    }

    #[test]
    fn paused_clock_freezes_touch_ages() {
        let mut s = session(&[]);
        s.touches.press(PointerId(0), Vec2::ZERO);
        s.advance(0.5, Vec2::ONE);
        assert!(!s.handle_key(KeyCode::Char(' '), KeyModifiers::NONE));
        s.advance(0.5, Vec2::ONE);
        assert_eq!(s.clock.seconds(), 0.5);
        assert_eq!(s.touches.record(0).map(|r| r.age), Some(0.5));
    }

    #[test]
    fn sketch_toggle_and_quit_keys() {
        let mut s = session(&["--sketch", "melt"]);
        s.handle_key(KeyCode::Char('m'), KeyModifiers::NONE);
        assert_eq!(s.engine.mode(), SketchMode::Touch);
        assert!(s.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(s.handle_key(KeyCode::Esc, KeyModifiers::NONE));
    }

    #[test]
    fn clear_key_empties_the_table() {
        let mut s = session(&[]);
        s.touches.press(PointerId(1), Vec2::ZERO);
        s.handle_key(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(s.touches.live_count(), 0);
    }

    #[test]
    fn hud_wraps_to_terminal_width() {
        let status = HudStatus {
            sketch: "70s Melt",
            renderer: "halfblock",
            active_touches: 1,
            live_touches: 2,
            demo: false,
            seconds: 3.0,
            paused: true,
            fps: 60.0,
            shade_ms: 1.0,
            paint_ms: 1.0,
            total_ms: 2.0,
            probe: "ok",
        };
        let hud = build_hud(20, &status);
        assert!(hud.lines().all(|l| l.chars().count() <= 20));
        assert!(hud.contains("(paused)"));
        assert_eq!(hud_rows_for_text(4, true, &hud), 3);
    }
}

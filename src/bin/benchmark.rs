use std::time::Instant;

use anyhow::Result;
use glam::vec2;
use melt_visualizer::config::SketchMode;
use melt_visualizer::input::{CellLayout, DemoPilot};
use melt_visualizer::logging;
use melt_visualizer::touch::{PressOutcome, TouchTable};
use melt_visualizer::visual::{RenderCtx, SketchEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Melt,
    Touch,
    Both,
}

struct Args {
    mode: Mode,
    frames: usize,
    w: usize,
    h: usize,
    scale: usize,
    seed: u64,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
    log_level: log::LevelFilter,
}

fn parse_args() -> Args {
    let mut args = Args {
        mode: Mode::Both,
        frames: 180,
        w: 160,
        h: 88,
        scale: 1,
        seed: 7,
        ci_smoke: false,
        quick: false,
        max_ms: 40.0,
        log_level: log::LevelFilter::Warn,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--sketch", Some("melt")) => {
                args.mode = Mode::Melt;
                i += 2;
            }
            ("--sketch", Some("touch")) => {
                args.mode = Mode::Touch;
                i += 2;
            }
            ("--sketch", Some("both")) => {
                args.mode = Mode::Both;
                i += 2;
            }
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--scale", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.scale = n.clamp(1, melt_visualizer::config::MAX_SCALE);
                }
                i += 2;
            }
            ("--seed", Some(x)) => {
                if let Ok(n) = x.parse::<u64>() {
                    args.seed = n;
                }
                i += 2;
            }
            ("--log-level", Some(x)) => {
                if let Ok(l) = x.parse::<log::LevelFilter>() {
                    args.log_level = l;
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(60);
    }

    args
}

fn parse_bool(s: &str) -> Option<bool> {
    melt_visualizer::capability::parse_switch(s)
}

struct Stats {
    name: &'static str,
    mean_ms: f64,
    p95_ms: f64,
    lit: usize,
    evictions: usize,
}

fn bench_sketch(args: &Args, mode: SketchMode) -> Stats {
    let mut engine = SketchEngine::new(mode);
    engine.resize(args.w, args.h);

    // Feed the touch table through the demo autopilot so the touch sketch is
    // measured with live fields, not an empty table.
    let layout = CellLayout::new(args.w as u16, args.h as u16, (1, 1));
    let mut pilot = DemoPilot::new(Some(args.seed));
    pilot.set_enabled(mode == SketchMode::Touch);
    let mut touches = TouchTable::new();
    let dt = 1.0 / 60.0;

    let mut samples = Vec::with_capacity(args.frames);
    let mut lit = 0usize;
    let mut evictions = 0usize;

    for f in 0..args.frames {
        for action in pilot.step(dt, layout.shader_extent()) {
            if let Some(PressOutcome::Evicted { slot, previous }) = touches.apply(action) {
                log::debug!("frame {f}: slot {slot} evicted (was {previous:?})");
                evictions += 1;
            }
        }
        touches.advance(dt);

        let uniforms = touches.uniforms(vec2(args.w as f32, args.h as f32), f as f32 * dt);
        let ctx = RenderCtx::new(args.w, args.h, args.scale, uniforms);

        let start = Instant::now();
        let px = engine.render(&ctx);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
        if px.chunks_exact(4).any(|p| p[0] != 0 || p[1] != 0 || p[2] != 0) {
            lit += 1;
        }
    }

    let mean_ms = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
    samples.sort_by(f64::total_cmp);
    let p95_idx = ((samples.len() as f64 * 0.95).ceil() as usize)
        .saturating_sub(1)
        .min(samples.len().saturating_sub(1));
    let p95_ms = samples.get(p95_idx).copied().unwrap_or(0.0);

    Stats {
        name: engine.sketch_name(),
        mean_ms,
        p95_ms,
        lit,
        evictions,
    }
}

fn main() -> Result<()> {
    let args = parse_args();
    logging::init_stderr(args.log_level);

    let modes: &[SketchMode] = match args.mode {
        Mode::Melt => &[SketchMode::Melt],
        Mode::Touch => &[SketchMode::Touch],
        Mode::Both => &[SketchMode::Melt, SketchMode::Touch],
    };

    println!(
        "CPU benchmark: sketches={} frames={} size={}x{} scale={} seed={} quick={}",
        modes.len(),
        args.frames,
        args.w,
        args.h,
        args.scale,
        args.seed,
        args.quick
    );

    let mut failures = Vec::<String>::new();
    for &mode in modes {
        let s = bench_sketch(&args, mode);
        let fps = if s.mean_ms > 0.0 { 1000.0 / s.mean_ms } else { 0.0 };
        println!(
            "{:<18} {:>8.3} ms/frame  p95={:>8.3}  {:>7.2} FPS  lit={:>3}/{}  evictions={}",
            s.name, s.mean_ms, s.p95_ms, fps, s.lit, args.frames, s.evictions
        );
        if s.lit < args.frames {
            failures.push(format!("{}: {} black frames", s.name, args.frames - s.lit));
        }
        if s.mean_ms > args.max_ms {
            failures.push(format!(
                "{}: {:.3} ms/frame > {:.3}",
                s.name, s.mean_ms, args.max_ms
            ));
        }
    }

    if args.ci_smoke {
        if !failures.is_empty() {
            eprintln!("CI smoke: FAIL");
            for f in &failures {
                eprintln!("  {f}");
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }

    Ok(())
}

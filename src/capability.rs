use crate::config::RendererMode;

#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub auto_probe: bool,
    pub requested_renderer: RendererMode,
    pub renderer: RendererMode,
    notes: Vec<String>,
}

impl CapabilityReport {
    pub fn changed(&self) -> bool {
        self.renderer != self.requested_renderer
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn status_label(&self) -> String {
        if !self.auto_probe {
            return format!("off (renderer={:?})", self.renderer);
        }
        if self.changed() {
            return format!(
                "fallback ren {:?}->{:?}",
                self.requested_renderer, self.renderer
            );
        }
        format!("ok ren={:?}", self.renderer)
    }
}

pub fn probe_runtime(requested_renderer: RendererMode, auto_probe: bool) -> CapabilityReport {
    probe_with(requested_renderer, auto_probe, kitty_graphics_available)
}

/// Probe with an injectable kitty check so fallbacks can be tested without
/// touching the process environment.
pub fn probe_with(
    requested_renderer: RendererMode,
    auto_probe: bool,
    kitty_available: impl FnOnce() -> bool,
) -> CapabilityReport {
    let mut report = CapabilityReport {
        auto_probe,
        requested_renderer,
        renderer: requested_renderer,
        notes: Vec::new(),
    };

    if !auto_probe {
        report.push_note("capability probe disabled by --auto-probe=false");
        return report;
    }

    if requested_renderer == RendererMode::Kitty && !kitty_available() {
        report.renderer = RendererMode::HalfBlock;
        report.push_note("kitty graphics unavailable in this terminal; falling back to half-block renderer");
    }

    if report.notes.is_empty() {
        report.push_note("probe selected requested renderer with no fallback");
    }

    report
}

fn kitty_graphics_available() -> bool {
    if let Ok(v) = std::env::var("MELT_FORCE_KITTY") {
        if let Some(forced) = parse_switch(&v) {
            return forced;
        }
    }

    if std::env::var("KITTY_WINDOW_ID").is_ok() {
        return true;
    }

    let term = std::env::var("TERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if term.contains("kitty") {
        return true;
    }

    let term_program = std::env::var("TERM_PROGRAM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    term_program.contains("ghostty") || term_program.contains("kitty")
}

pub fn parse_switch(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

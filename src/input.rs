//! Terminal input → pointer actions.
//!
//! Mouse coordinates arrive as terminal cells. [`CellLayout`] maps a cell to the
//! centre of its pixel block and from there to shader space, so a click lands
//! exactly where the renderer painted that cell.

use crate::shader;
use crate::touch::{PointerAction, PointerId};
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use glam::{vec2, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellLayout {
    pub cols: u16,
    /// Terminal rows holding pixels; rows below belong to the HUD.
    pub visual_rows: u16,
    /// Pixels per cell, (columns, rows).
    pub block: (usize, usize),
}

impl CellLayout {
    pub fn new(cols: u16, visual_rows: u16, block: (usize, usize)) -> Self {
        Self {
            cols,
            visual_rows,
            block: (block.0.max(1), block.1.max(1)),
        }
    }

    pub fn pixel_size(&self) -> (usize, usize) {
        (
            (self.cols as usize).saturating_mul(self.block.0),
            (self.visual_rows as usize).saturating_mul(self.block.1),
        )
    }

    /// Shader-space centre of a cell, or `None` outside the pixel area.
    pub fn cell_to_shader(&self, col: u16, row: u16) -> Option<Vec2> {
        if col >= self.cols || row >= self.visual_rows {
            return None;
        }
        Some(self.centre_of(col, row))
    }

    /// Like [`Self::cell_to_shader`] but pins out-of-area cells to the nearest
    /// edge, so a drag that leaves the picture keeps tracking.
    pub fn cell_to_shader_clamped(&self, col: u16, row: u16) -> Option<Vec2> {
        if self.cols == 0 || self.visual_rows == 0 {
            return None;
        }
        Some(self.centre_of(col.min(self.cols - 1), row.min(self.visual_rows - 1)))
    }

    /// Half-extent of the visible shader-space rectangle; the longer axis is 1.
    pub fn shader_extent(&self) -> Vec2 {
        let (w, h) = self.pixel_size();
        let m = w.max(h).max(1) as f32;
        vec2(w as f32 / m, h as f32 / m)
    }

    fn centre_of(&self, col: u16, row: u16) -> Vec2 {
        let (w, h) = self.pixel_size();
        let (bw, bh) = (self.block.0 as f32, self.block.1 as f32);
        let px = col as f32 * bw + bw * 0.5;
        let py = row as f32 * bh + bh * 0.5;
        shader::frag_to_shader(vec2(px, h as f32 - py), vec2(w as f32, h as f32))
    }
}

pub fn pointer_for_button(button: MouseButton) -> PointerId {
    match button {
        MouseButton::Left => PointerId(0),
        MouseButton::Middle => PointerId(1),
        MouseButton::Right => PointerId(2),
    }
}

/// Tracks which buttons are down so stray drag/up events for a button the
/// table never saw pressed are dropped.
#[derive(Clone, Debug, Default)]
pub struct MouseTracker {
    down: [bool; 3],
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self, button: MouseButton) -> bool {
        self.down[pointer_for_button(button).0 as usize]
    }

    pub fn release_all(&mut self) {
        self.down = [false; 3];
    }

    pub fn translate(&mut self, ev: &MouseEvent, layout: &CellLayout) -> Option<PointerAction> {
        match ev.kind {
            MouseEventKind::Down(button) => {
                let pos = layout.cell_to_shader(ev.column, ev.row)?;
                let id = pointer_for_button(button);
                self.down[id.0 as usize] = true;
                Some(PointerAction::Press(id, pos))
            }
            MouseEventKind::Drag(button) if self.is_down(button) => {
                let pos = layout.cell_to_shader_clamped(ev.column, ev.row)?;
                Some(PointerAction::Move(pointer_for_button(button), pos))
            }
            MouseEventKind::Up(button) if self.is_down(button) => {
                let id = pointer_for_button(button);
                self.down[id.0 as usize] = false;
                Some(PointerAction::Release(id))
            }
            _ => None,
        }
    }
}

/// First pointer id the autopilot uses; keeps it clear of the mouse buttons.
pub const DEMO_POINTER_BASE: u32 = 100;
const DEMO_POINTERS: u32 = 8;
const MAX_STROKES: usize = 6;

#[derive(Clone, Debug)]
struct Stroke {
    id: PointerId,
    pos: Vec2,
    vel: Vec2,
    remaining: f32,
}

/// Synthetic multi-touch input: random strokes that press, wander and release.
/// Runs more concurrent strokes than the touch table has slots, so eviction
/// shows up in normal use.
pub struct DemoPilot {
    rng: fastrand::Rng,
    enabled: bool,
    strokes: Vec<Stroke>,
    next_id: u32,
    until_spawn: f32,
}

impl DemoPilot {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        Self {
            rng,
            enabled: false,
            strokes: Vec::new(),
            next_id: 0,
            until_spawn: 0.0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_strokes(&self) -> usize {
        self.strokes.len()
    }

    /// Disabling releases every stroke still down.
    pub fn set_enabled(&mut self, on: bool) -> Vec<PointerAction> {
        self.enabled = on;
        if on {
            self.until_spawn = 0.0;
            return Vec::new();
        }
        self.strokes
            .drain(..)
            .map(|s| PointerAction::Release(s.id))
            .collect()
    }

    pub fn toggle(&mut self) -> Vec<PointerAction> {
        self.set_enabled(!self.enabled)
    }

    /// Advances every stroke by `dt` seconds inside the visible half-extent.
    pub fn step(&mut self, dt: f32, extent: Vec2) -> Vec<PointerAction> {
        let mut actions = Vec::new();
        if !self.enabled {
            return actions;
        }
        let dt = dt.max(0.0);

        let mut i = 0;
        while i < self.strokes.len() {
            let s = &mut self.strokes[i];
            s.remaining -= dt;
            if s.remaining <= 0.0 {
                actions.push(PointerAction::Release(s.id));
                self.strokes.swap_remove(i);
                continue;
            }
            s.pos += s.vel * dt;
            // Bounce off the visible edges.
            if s.pos.x.abs() > extent.x {
                s.vel.x = -s.vel.x;
                s.pos.x = s.pos.x.clamp(-extent.x, extent.x);
            }
            if s.pos.y.abs() > extent.y {
                s.vel.y = -s.vel.y;
                s.pos.y = s.pos.y.clamp(-extent.y, extent.y);
            }
            actions.push(PointerAction::Move(s.id, s.pos));
            i += 1;
        }

        self.until_spawn -= dt;
        if self.until_spawn <= 0.0 && self.strokes.len() < MAX_STROKES {
            let stroke = self.spawn(extent);
            actions.push(PointerAction::Press(stroke.id, stroke.pos));
            self.strokes.push(stroke);
            self.until_spawn = 0.25 + self.rng.f32() * 0.9;
        }
        actions
    }

    fn spawn(&mut self, extent: Vec2) -> Stroke {
        // Fewer strokes than ids, so a free id always exists.
        let mut id = PointerId(DEMO_POINTER_BASE + self.next_id);
        while self.strokes.iter().any(|s| s.id == id) {
            self.next_id = (self.next_id + 1) % DEMO_POINTERS;
            id = PointerId(DEMO_POINTER_BASE + self.next_id);
        }
        self.next_id = (self.next_id + 1) % DEMO_POINTERS;
        let pos = vec2(
            (self.rng.f32() * 2.0 - 1.0) * extent.x * 0.85,
            (self.rng.f32() * 2.0 - 1.0) * extent.y * 0.85,
        );
        let angle = self.rng.f32() * std::f32::consts::TAU;
        let speed = 0.15 + self.rng.f32() * 0.45;
        Stroke {
            id,
            pos,
            vel: Vec2::from_angle(angle) * speed,
            remaining: 0.6 + self.rng.f32() * 2.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_ids_wrap_within_demo_range() {
        let mut pilot = DemoPilot::new(Some(1));
        for _ in 0..20 {
            let s = pilot.spawn(Vec2::ONE);
            assert!((DEMO_POINTER_BASE..DEMO_POINTER_BASE + DEMO_POINTERS).contains(&s.id.0));
        }
    }
}

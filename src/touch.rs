//! Pointer bookkeeping for the touch sketch.
//!
//! The table is a fixed arena of [`MAX_TOUCHES`] slots. Input handlers press,
//! move and release pointers by id; the render loop ages every slot once per
//! frame and takes an immutable [`FrameUniforms`] snapshot for shading.

use glam::Vec2;

pub const MAX_TOUCHES: usize = 5;
/// Seconds a released touch keeps feeding the decaying effects.
pub const RIPPLE_DURATION: f32 = 2.0;
/// Per-frame decay of the drag velocity.
pub const DRAG_DECAY: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchRecord {
    /// Shader-space position.
    pub position: Vec2,
    /// Seconds since the last press or release.
    pub age: f32,
    pub active: bool,
    /// Owning pointer while pressed; cleared on release.
    pub id: Option<PointerId>,
}

impl TouchRecord {
    fn pressed(id: PointerId, position: Vec2) -> Self {
        Self {
            position,
            age: 0.0,
            active: true,
            id: Some(id),
        }
    }

    /// Pressed, or released less than [`RIPPLE_DURATION`] seconds ago.
    pub fn extended_active(&self) -> bool {
        self.active || self.age < RIPPLE_DURATION
    }

    fn reusable(&self) -> bool {
        !self.active && self.age > RIPPLE_DURATION
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerAction {
    Press(PointerId, Vec2),
    Move(PointerId, Vec2),
    Release(PointerId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    /// Slot was empty or held an expired release.
    Assigned { slot: usize },
    /// The pointer was already down; its position was refreshed.
    AlreadyDown { slot: usize },
    /// Every slot was live; the oldest one was taken over.
    Evicted {
        slot: usize,
        previous: Option<PointerId>,
    },
}

impl PressOutcome {
    pub fn slot(self) -> usize {
        match self {
            Self::Assigned { slot } | Self::AlreadyDown { slot } | Self::Evicted { slot, .. } => slot,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TouchTable {
    slots: [Option<TouchRecord>; MAX_TOUCHES],
    drag_velocity: Vec2,
    /// Slot whose move last refreshed the drag velocity.
    dragged: Option<usize>,
}

impl Default for TouchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTable {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_TOUCHES],
            drag_velocity: Vec2::ZERO,
            dragged: None,
        }
    }

    pub fn slots(&self) -> &[Option<TouchRecord>; MAX_TOUCHES] {
        &self.slots
    }

    pub fn record(&self, slot: usize) -> Option<&TouchRecord> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn drag_velocity(&self) -> Vec2 {
        self.drag_velocity
    }

    pub fn dragged(&self) -> Option<usize> {
        self.dragged
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().filter(|r| r.active).count()
    }

    /// Records still contributing to any field this frame.
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|r| r.extended_active())
            .count()
    }

    pub fn apply(&mut self, action: PointerAction) -> Option<PressOutcome> {
        match action {
            PointerAction::Press(id, pos) => Some(self.press(id, pos)),
            PointerAction::Move(id, pos) => {
                self.moved(id, pos);
                None
            }
            PointerAction::Release(id) => {
                self.release(id);
                None
            }
        }
    }

    pub fn press(&mut self, id: PointerId, position: Vec2) -> PressOutcome {
        if let Some(slot) = self.find_active(id) {
            if let Some(rec) = self.slots[slot].as_mut() {
                rec.position = position;
            }
            return PressOutcome::AlreadyDown { slot };
        }

        let free = self
            .slots
            .iter()
            .position(|s| s.as_ref().map_or(true, TouchRecord::reusable));
        if let Some(slot) = free {
            self.slots[slot] = Some(TouchRecord::pressed(id, position));
            return PressOutcome::Assigned { slot };
        }

        let slot = self
            .oldest_slot(|r| r.active)
            .or_else(|| self.oldest_slot(|_| true))
            .unwrap_or(0);
        let previous = self.slots[slot].and_then(|r| r.id);
        if self.dragged == Some(slot) {
            self.dragged = None;
        }
        self.slots[slot] = Some(TouchRecord::pressed(id, position));
        PressOutcome::Evicted { slot, previous }
    }

    /// Moves the pointer's record and makes it the dragged slot. The drag
    /// velocity becomes this record's own delta. Returns the slot, or `None`
    /// if the pointer is not down.
    pub fn moved(&mut self, id: PointerId, position: Vec2) -> Option<usize> {
        let slot = self.find_active(id)?;
        let rec = self.slots[slot].as_mut()?;
        self.drag_velocity = position - rec.position;
        rec.position = position;
        self.dragged = Some(slot);
        Some(slot)
    }

    /// Releases the pointer's record and restarts its age so the release
    /// fade runs from zero.
    pub fn release(&mut self, id: PointerId) -> Option<usize> {
        let slot = self.find_active(id)?;
        if let Some(rec) = self.slots[slot].as_mut() {
            rec.active = false;
            rec.age = 0.0;
            rec.id = None;
        }
        if self.dragged == Some(slot) {
            self.dragged = None;
        }
        Some(slot)
    }

    /// Once-per-frame update: ages every record and decays the drag velocity.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for rec in self.slots.iter_mut().flatten() {
            rec.age += dt;
        }
        self.drag_velocity *= DRAG_DECAY;
    }

    pub fn clear(&mut self) {
        self.slots = [None; MAX_TOUCHES];
        self.drag_velocity = Vec2::ZERO;
        self.dragged = None;
    }

    pub fn uniforms(&self, resolution: Vec2, seconds: f32) -> FrameUniforms {
        let mut touches = [None; MAX_TOUCHES];
        for (dst, src) in touches.iter_mut().zip(self.slots.iter()) {
            *dst = src.map(|r| TouchUniform {
                position: r.position,
                age: r.age,
                active: r.active,
                extended_active: r.extended_active(),
            });
        }
        FrameUniforms {
            resolution,
            seconds,
            touches,
            drag_velocity: self.drag_velocity,
            dragged: self.dragged,
        }
    }

    fn find_active(&self, id: PointerId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(r) if r.active && r.id == Some(id)))
    }

    fn oldest_slot(&self, pred: impl Fn(&TouchRecord) -> bool) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, rec) in self.slots.iter().enumerate() {
            let Some(rec) = rec else { continue };
            if !pred(rec) {
                continue;
            }
            match best {
                Some((_, age)) if rec.age <= age => {}
                _ => best = Some((i, rec.age)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Per-record values every pixel of a frame reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchUniform {
    pub position: Vec2,
    pub age: f32,
    pub active: bool,
    pub extended_active: bool,
}

impl TouchUniform {
    pub fn pressed_at(position: Vec2) -> Self {
        Self::new(position, 0.0, true)
    }

    pub fn new(position: Vec2, age: f32, active: bool) -> Self {
        Self {
            position,
            age,
            active,
            extended_active: active || age < RIPPLE_DURATION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUniforms {
    pub resolution: Vec2,
    /// Unscaled seconds since start.
    pub seconds: f32,
    pub touches: [Option<TouchUniform>; MAX_TOUCHES],
    pub drag_velocity: Vec2,
    /// Only this slot receives the drag term.
    pub dragged: Option<usize>,
}

impl FrameUniforms {
    pub fn untouched(resolution: Vec2, seconds: f32) -> Self {
        Self {
            resolution,
            seconds,
            touches: [None; MAX_TOUCHES],
            drag_velocity: Vec2::ZERO,
            dragged: None,
        }
    }

    /// Drag velocity as seen by `slot`; zero for every other record.
    pub fn drag_for(&self, slot: usize) -> Vec2 {
        if self.dragged == Some(slot) {
            self.drag_velocity
        } else {
            Vec2::ZERO
        }
    }

    pub fn scaled_time(&self) -> f32 {
        self.seconds * crate::shader::TIME_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn oldest_slot_prefers_lowest_index_on_ties() {
        let mut table = TouchTable::new();
        for i in 0..MAX_TOUCHES as u32 {
            table.press(PointerId(i), Vec2::ZERO);
        }
        assert_eq!(table.oldest_slot(|r| r.active), Some(0));
    }

    #[test]
    fn moving_with_nothing_pressed_keeps_velocity() {
        let mut table = TouchTable::new();
        table.moved(PointerId(0), vec2(0.5, 0.5));
        assert_eq!(table.drag_velocity(), Vec2::ZERO);
        assert_eq!(table.dragged(), None);
    }

    #[test]
    fn eviction_forgets_the_dragged_slot() {
        let mut table = TouchTable::new();
        for i in 0..MAX_TOUCHES as u32 {
            table.press(PointerId(i), Vec2::ZERO);
        }
        table.moved(PointerId(0), vec2(0.1, 0.0));
        assert_eq!(table.dragged(), Some(0));
        table.advance(0.1);
        let out = table.press(PointerId(9), Vec2::ONE);
        assert_eq!(out.slot(), 0);
        assert_eq!(table.dragged(), None);
    }
}

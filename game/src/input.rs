use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Pointer transition in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
}

impl PointerEvent {
    pub fn position(self) -> Vec2 {
        match self {
            PointerEvent::Down(p) | PointerEvent::Move(p) | PointerEvent::Up(p) => p,
        }
    }
}

#[derive(Debug, Default)]
struct PointerState {
    target: Option<Vec2>,
    pending: VecDeque<PointerEvent>,
}

/// Single-slot handoff between an input source and the frame loop.
///
/// Writers may live on any thread; the frame loop drains queued transitions once per frame
/// before it reads the target, so each frame sees one consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct PointerSlot {
    inner: Arc<Mutex<PointerState>>,
}

impl PointerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PointerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `event` and moves the target to its position.
    pub fn post(&self, event: PointerEvent) {
        let mut state = self.state();
        state.target = Some(event.position());
        state.pending.push_back(event);
    }

    pub fn down(&self, at: Vec2) {
        self.post(PointerEvent::Down(at));
    }

    pub fn move_to(&self, at: Vec2) {
        self.post(PointerEvent::Move(at));
    }

    pub fn up(&self, at: Vec2) {
        self.post(PointerEvent::Up(at));
    }

    /// Last known pointer position. Survives release.
    pub fn target(&self) -> Option<Vec2> {
        self.state().target
    }

    /// Takes every transition queued since the previous drain, oldest first.
    pub fn drain(&self) -> Vec<PointerEvent> {
        self.state().pending.drain(..).collect()
    }

    /// Forgets the target and any queued transitions.
    pub fn clear(&self) {
        let mut state = self.state();
        state.target = None;
        state.pending.clear();
    }
}

//! Collaborator contracts the session drives: presentation, sound and score display.

use crate::geometry::Vec2;
use crate::grid::Grid;
use crate::piece::Piece;

/// What the session wants from the host's frame scheduler after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    Continue,
    Stop,
}

/// Host-side reading of `FrameRequest`: every `Continue` frame is presented, while a run
/// of `Stop` frames presents only its first (the idle panel) until something invalidates it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentGate {
    idle_presented: bool,
}

impl PresentGate {
    pub fn should_present(&mut self, request: FrameRequest) -> bool {
        match request {
            FrameRequest::Continue => {
                self.idle_presented = false;
                true
            }
            FrameRequest::Stop => !std::mem::replace(&mut self.idle_presented, true),
        }
    }

    /// Input or a resize changed what the idle panel should show.
    pub fn invalidate(&mut self) {
        self.idle_presented = false;
    }

    /// True once the idle panel is on screen and nothing has changed since.
    pub fn is_idle(&self) -> bool {
        self.idle_presented
    }
}

pub trait Renderer {
    fn draw_grid(&mut self, grid: &Grid);
    fn draw_active_piece(&mut self, piece: Option<&Piece>);

    /// Debug overlay for the pointer target and, while held, the grab anchor.
    fn draw_pointer_overlay(&mut self, _target: Option<Vec2>, _anchor: Option<Vec2>) {}
}

/// Fire-and-forget sound triggers plus the continuous spring voice.
///
/// `start_spring` and `stop_spring` must be idempotent.
pub trait Audio {
    fn play_grab(&mut self);
    fn play_drop(&mut self);
    fn play_clear(&mut self);
    fn play_game_over(&mut self);
    fn start_spring(&mut self);
    fn update_spring(&mut self, tension: f32);
    fn stop_spring(&mut self);
}

impl<T: Audio + ?Sized> Audio for Box<T> {
    fn play_grab(&mut self) {
        (**self).play_grab();
    }

    fn play_drop(&mut self) {
        (**self).play_drop();
    }

    fn play_clear(&mut self) {
        (**self).play_clear();
    }

    fn play_game_over(&mut self) {
        (**self).play_game_over();
    }

    fn start_spring(&mut self) {
        (**self).start_spring();
    }

    fn update_spring(&mut self, tension: f32) {
        (**self).update_spring(tension);
    }

    fn stop_spring(&mut self) {
        (**self).stop_spring();
    }
}

pub trait ScoreDisplay {
    fn set_score(&mut self, score: u32);
    fn reveal_game_over(&mut self, final_score: u32);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_grid(&mut self, _grid: &Grid) {}
    fn draw_active_piece(&mut self, _piece: Option<&Piece>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl Audio for NullAudio {
    fn play_grab(&mut self) {}
    fn play_drop(&mut self) {}
    fn play_clear(&mut self) {}
    fn play_game_over(&mut self) {}
    fn start_spring(&mut self) {}
    fn update_spring(&mut self, _tension: f32) {}
    fn stop_spring(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullScore;

impl ScoreDisplay for NullScore {
    fn set_score(&mut self, _score: u32) {}
    fn reveal_game_over(&mut self, _final_score: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_presents_the_idle_panel_once() {
        let mut gate = PresentGate::default();
        assert!(gate.should_present(FrameRequest::Stop));
        assert!(gate.is_idle());
        assert!(!gate.should_present(FrameRequest::Stop));
        assert!(!gate.should_present(FrameRequest::Stop));
    }

    #[test]
    fn invalidate_or_continue_redraws() {
        let mut gate = PresentGate::default();
        gate.should_present(FrameRequest::Stop);
        gate.invalidate();
        assert!(!gate.is_idle());
        assert!(gate.should_present(FrameRequest::Stop));

        assert!(gate.should_present(FrameRequest::Continue));
        assert!(gate.should_present(FrameRequest::Continue));
        assert!(gate.should_present(FrameRequest::Stop));
    }
}

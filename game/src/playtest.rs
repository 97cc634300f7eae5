use engine::GameLogic;

use crate::game::{Game, SoundCue};
use crate::geometry::{Vec2, centroid};
use crate::physics::PhysicsConfig;

/// Fixed frame rate used for deterministic replays.
pub const PLAYTEST_FRAME_DELTA: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayInput {
    Idle,
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
}

/// Snapshot recorded per frame by the headless runner.
#[derive(Debug, Clone)]
pub struct PlayState {
    pub game: Game,
    pub target: Option<Vec2>,
    /// Cues produced by the frame that led to this state (grab cue included).
    pub cues: Vec<SoundCue>,
    pub frame: u64,
}

#[derive(Debug, Clone)]
pub struct PhysicsLogic {
    seed: u64,
    config: PhysicsConfig,
    frame_delta: f32,
}

impl PhysicsLogic {
    pub fn new(seed: u64, config: PhysicsConfig) -> Self {
        Self {
            seed,
            config,
            frame_delta: PLAYTEST_FRAME_DELTA,
        }
    }

    pub fn with_frame_delta(mut self, frame_delta: f32) -> Self {
        self.frame_delta = frame_delta;
        self
    }
}

impl GameLogic for PhysicsLogic {
    type State = PlayState;
    type Input = PlayInput;

    fn initial_state(&self) -> Self::State {
        PlayState {
            game: Game::new(self.seed, self.config),
            target: None,
            cues: Vec::new(),
            frame: 0,
        }
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        let mut cues = Vec::new();

        match input {
            PlayInput::Idle => {}
            PlayInput::PointerMove(at) => next.target = Some(at),
            PlayInput::PointerDown(at) => {
                next.target = Some(at);
                if next.game.grab_at(at) {
                    cues.push(SoundCue::Grab);
                }
            }
            PlayInput::PointerUp(at) => {
                next.target = Some(at);
                next.game.release();
            }
        }

        let report = next.game.advance(self.frame_delta, next.target);
        cues.extend(report.cues);
        next.cues = cues;
        next.frame += 1;
        next
    }
}

/// Frames the bot keeps hold of one piece before giving up on lining it up.
pub const MAX_HOLD_FRAMES: u32 = 240;

/// Simple scripted player: grabs each new piece near the top, drags it toward `column`
/// and lets go once it swings past that column low in the well.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragBot {
    holding: bool,
    held_frames: u32,
}

impl DragBot {
    pub fn next_input(&mut self, state: &PlayState, column: f32) -> PlayInput {
        let Some(piece) = state.game.active_piece() else {
            return PlayInput::Idle;
        };
        let center = centroid(piece);
        let hold_at = Vec2::new(column, 14.0);

        if !piece.is_grabbed {
            if self.holding {
                self.holding = false;
                return PlayInput::Idle;
            }
            if center.y < 3.0 {
                self.holding = true;
                self.held_frames = 0;
                return PlayInput::PointerDown(center);
            }
            return PlayInput::Idle;
        }

        self.held_frames += 1;
        let lined_up = (center.x - column).abs() < 0.5 && center.y > 10.0;
        if lined_up || self.held_frames >= MAX_HOLD_FRAMES {
            return PlayInput::PointerUp(hold_at);
        }
        PlayInput::PointerMove(hold_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_input_reports_grab_cue() {
        let logic = PhysicsLogic::new(5, PhysicsConfig::default());
        let initial = logic.initial_state();
        let at = initial
            .game
            .active_piece()
            .map(centroid)
            .expect("active piece");
        let next = logic.step(&initial, PlayInput::PointerDown(at));
        assert_eq!(next.cues.first(), Some(&SoundCue::Grab));
        assert!(next.game.active_piece().is_some_and(|p| p.is_grabbed));
        assert_eq!(next.frame, 1);
    }
}

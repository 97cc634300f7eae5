use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::catalog::create_piece;
use crate::geometry::{Vec2, hit_test, local_grab_offset};
use crate::grid::{Grid, line_clear_score};
use crate::physics::{self, LockDecision, PhysicsConfig, PiecePhase};
use crate::piece::{LockedPiece, Piece};

/// Audio feedback requested by a frame, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SoundCue {
    Grab,
    Drop,
    Clear,
    GameOver,
    /// Emitted once per frame while the piece is held.
    Spring { tension: f32 },
    /// Emitted once, on the first frame after the hold ends.
    StopSpring,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub cues: Vec<SoundCue>,
    pub locked: Option<LockedPiece>,
    pub lines_cleared: usize,
    pub score_changed: bool,
    pub game_over: bool,
}

/// Grid, active piece and score of one run, advanced frame by frame.
///
/// Pure state: collaborators (audio, rendering, score display) only see the
/// [`FrameReport`] each frame produces.
#[derive(Debug, Clone)]
pub struct Game {
    config: PhysicsConfig,
    grid: Grid,
    active: Option<Piece>,
    score: u32,
    game_over: bool,
    rng: StdRng,
    spring_active: bool,
    pieces_locked: u32,
    lines_cleared: u32,
}

impl Game {
    pub fn new(seed: u64, config: PhysicsConfig) -> Self {
        let mut game = Self {
            config: config.sanitized(),
            grid: Grid::new(),
            active: None,
            score: 0,
            game_over: false,
            rng: StdRng::seed_from_u64(seed),
            spring_active: false,
            pieces_locked: 0,
            lines_cleared: 0,
        };
        game.reset();
        game
    }

    /// Clears the well and score and spawns a fresh piece. The piece sequence continues.
    pub fn reset(&mut self) {
        self.grid = Grid::new();
        self.active = None;
        self.score = 0;
        self.game_over = false;
        self.spring_active = false;
        self.pieces_locked = 0;
        self.lines_cleared = 0;
        self.spawn_piece();
    }

    /// Spawns the next piece. If it collides immediately the run ends and no piece is
    /// kept. Returns whether a piece is now active.
    pub fn spawn_piece(&mut self) -> bool {
        let piece = create_piece(&mut self.rng);
        if self.grid.check_collision(&piece) {
            log::debug!("spawned {:?} collides; game over", piece.kind());
            self.active = None;
            self.game_over = true;
            return false;
        }
        log::trace!("spawned {:?}", piece.kind());
        self.active = Some(piece);
        true
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn active_piece_mut(&mut self) -> Option<&mut Piece> {
        self.active.as_mut()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn pieces_locked(&self) -> u32 {
        self.pieces_locked
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    /// Whether the last frame left the spring sound playing.
    pub fn spring_active(&self) -> bool {
        self.spring_active
    }

    /// Phase of the active piece, or `None` when no piece is in play.
    pub fn phase(&self) -> Option<PiecePhase> {
        self.active
            .as_ref()
            .map(|piece| physics::phase_of(piece, &self.grid, &self.config))
    }

    pub fn is_point_inside_active_piece(&self, point: Vec2) -> bool {
        self.active.as_ref().is_some_and(|piece| hit_test(piece, point))
    }

    /// Starts a hold at `point` if it hits the active piece. Returns whether a grab began.
    pub fn grab_at(&mut self, point: Vec2) -> bool {
        if self.game_over || !self.is_point_inside_active_piece(point) {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        piece.grab_offset = local_grab_offset(piece, point);
        piece.is_grabbed = true;
        piece.lock_timer = 0.0;
        log::debug!(
            "grabbed {:?} at offset ({:.2}, {:.2})",
            piece.kind(),
            piece.grab_offset.x,
            piece.grab_offset.y
        );
        true
    }

    pub fn release(&mut self) {
        if let Some(piece) = self.active.as_mut() {
            if piece.is_grabbed {
                log::debug!("released {:?}", piece.kind());
            }
            piece.is_grabbed = false;
        }
    }

    /// Runs one frame of `delta` seconds with the pointer at `target`.
    pub fn advance(&mut self, delta: f32, target: Option<Vec2>) -> FrameReport {
        let mut report = FrameReport::default();
        if self.game_over {
            self.settle_spring(None, &mut report);
            report.game_over = true;
            return report;
        }

        let Some(piece) = self.active.as_mut() else {
            self.settle_spring(None, &mut report);
            return report;
        };
        let step = physics::step_frame(piece, &self.grid, target, &self.config, delta);
        self.settle_spring(step.tension, &mut report);

        if step.decision == LockDecision::Lock {
            if let Some(piece) = self.active.take() {
                self.lock(piece, &mut report);
            }
        }

        report.game_over = self.game_over;
        report
    }

    fn settle_spring(&mut self, tension: Option<f32>, report: &mut FrameReport) {
        match tension {
            Some(tension) => {
                self.spring_active = true;
                report.cues.push(SoundCue::Spring { tension });
            }
            None if self.spring_active => {
                self.spring_active = false;
                report.cues.push(SoundCue::StopSpring);
            }
            None => {}
        }
    }

    fn lock(&mut self, piece: Piece, report: &mut FrameReport) {
        let locked = match physics::snap_to_grid(piece, &self.grid, &self.config) {
            Ok(locked) => locked,
            Err(err) => {
                log::debug!("lock failed: {err}");
                self.game_over = true;
                report.cues.push(SoundCue::GameOver);
                return;
            }
        };

        report.cues.push(SoundCue::Drop);
        self.grid.commit(&locked);
        self.pieces_locked += 1;
        log::trace!("locked {:?} at ({}, {})", locked.kind, locked.x, locked.y);

        let lines = self.grid.clear_lines();
        if lines > 0 {
            self.score = self.score.saturating_add(line_clear_score(lines));
            self.lines_cleared += lines as u32;
            report.lines_cleared = lines;
            report.score_changed = true;
            report.cues.push(SoundCue::Clear);
            log::debug!("cleared {lines} line(s); score {}", self.score);
        }
        report.locked = Some(locked);

        if !self.spawn_piece() {
            report.cues.push(SoundCue::GameOver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::centroid;

    #[test]
    fn new_game_spawns_a_piece_at_the_top() {
        let game = Game::new(1, PhysicsConfig::default());
        let piece = game.active_piece().expect("piece spawned");
        assert_eq!(piece.position, Vec2::new(4.0, -1.0));
        assert_eq!(piece.rotation, 0.0);
        assert_eq!(game.score(), 0);
        assert!(!game.is_game_over());
        assert_eq!(game.phase(), Some(PiecePhase::Flying));
    }

    #[test]
    fn point_inside_tracks_the_active_piece() {
        let mut game = Game::new(1, PhysicsConfig::default());
        let center = game.active_piece().map(centroid).expect("piece spawned");
        assert!(game.is_point_inside_active_piece(center));
        assert!(!game.is_point_inside_active_piece(Vec2::new(4.0, 15.0)));

        game.active = None;
        assert!(!game.is_point_inside_active_piece(center));
        assert!(!game.grab_at(center));
    }

    #[test]
    fn grab_far_from_piece_is_ignored() {
        let mut game = Game::new(1, PhysicsConfig::default());
        assert!(!game.grab_at(Vec2::new(4.0, 15.0)));
        assert!(!game.active_piece().is_some_and(|p| p.is_grabbed));
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let a = Game::new(42, PhysicsConfig::default());
        let b = Game::new(42, PhysicsConfig::default());
        assert_eq!(
            a.active_piece().map(Piece::kind),
            b.active_piece().map(Piece::kind)
        );
    }
}

use crate::game::{FrameReport, Game, SoundCue};
use crate::geometry::grab_anchor;
use crate::host::{Audio, FrameRequest, Renderer, ScoreDisplay};
use crate::input::{PointerEvent, PointerSlot};
use crate::view::{GameView, GameViewEffect, GameViewEvent};

/// The presentation side of a session.
#[derive(Debug, Clone, Default)]
pub struct Collaborators<R, A, S> {
    pub renderer: R,
    pub audio: A,
    pub score: S,
}

/// Lifecycle, pause and frame cadence around a [`Game`].
///
/// The host calls [`Session::frame`] once per animation frame with a monotonic timestamp in
/// seconds and keeps scheduling frames while it returns [`FrameRequest::Continue`].
pub struct Session<R, A, S> {
    game: Game,
    view: GameView,
    pointer: PointerSlot,
    last_time: Option<f64>,
    renderer: R,
    audio: A,
    score_display: S,
}

impl<R: Renderer, A: Audio, S: ScoreDisplay> Session<R, A, S> {
    pub fn new(game: Game, collaborators: Collaborators<R, A, S>) -> Self {
        let Collaborators {
            renderer,
            audio,
            score,
        } = collaborators;
        Self {
            game,
            view: GameView::default(),
            pointer: PointerSlot::new(),
            last_time: None,
            renderer,
            audio,
            score_display: score,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn view(&self) -> GameView {
        self.view
    }

    pub fn is_paused(&self) -> bool {
        self.view.is_paused()
    }

    /// Handle for the input source; clones share the same slot.
    pub fn pointer(&self) -> PointerSlot {
        self.pointer.clone()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn score_display(&self) -> &S {
        &self.score_display
    }

    /// Starts a run (or restarts the current one) from a clean well.
    pub fn start(&mut self) {
        let event = if self.view.is_playing() {
            GameViewEvent::Restart
        } else {
            GameViewEvent::StartGame
        };
        let (next, effect) = self.view.handle(event);
        self.view = next;
        if effect == GameViewEffect::ResetGame {
            self.game.reset();
            self.pointer.clear();
            self.last_time = None;
            self.audio.stop_spring();
            self.score_display.set_score(self.game.score());
            log::info!("game started");
        }
    }

    /// Toggles pause while a piece is in play. Returns whether the state changed.
    pub fn toggle_pause(&mut self) -> bool {
        if self.game.is_game_over() || self.game.active_piece().is_none() {
            return false;
        }
        let (next, _) = self.view.handle(GameViewEvent::TogglePause);
        if next == self.view {
            return false;
        }
        self.view = next;
        self.audio.play_grab();
        log::info!("{}", if self.view.is_paused() { "paused" } else { "resumed" });
        true
    }

    /// Runs one frame at time `now` (seconds).
    pub fn frame(&mut self, now: f64) -> FrameRequest {
        match self.view {
            GameView::StartScreen | GameView::GameOver => {
                self.pointer.drain();
                FrameRequest::Stop
            }
            GameView::Playing { paused: true } => {
                self.apply_pointer_events();
                FrameRequest::Continue
            }
            GameView::Playing { paused: false } => self.simulate(now),
        }
    }

    fn simulate(&mut self, now: f64) -> FrameRequest {
        let delta = now - self.last_time.unwrap_or(0.0);
        self.last_time = Some(now);

        self.apply_pointer_events();
        let target = self.pointer.target();
        let report = self.game.advance(delta as f32, target);
        self.dispatch(&report);

        self.renderer.draw_grid(self.game.grid());
        let piece = self.game.active_piece();
        self.renderer.draw_active_piece(piece);
        let anchor = piece.filter(|p| p.is_grabbed).map(grab_anchor);
        self.renderer.draw_pointer_overlay(target, anchor);

        if report.game_over {
            let (next, _) = self.view.handle(GameViewEvent::GameOver);
            self.view = next;
            self.score_display.reveal_game_over(self.game.score());
            log::info!(
                "game over: score {} after {} pieces, {} lines",
                self.game.score(),
                self.game.pieces_locked(),
                self.game.lines_cleared()
            );
            return FrameRequest::Stop;
        }
        FrameRequest::Continue
    }

    fn apply_pointer_events(&mut self) {
        let accepting_grabs = self.view.is_running() && !self.game.is_game_over();
        for event in self.pointer.drain() {
            match event {
                PointerEvent::Down(at) if accepting_grabs => {
                    if self.game.grab_at(at) {
                        self.audio.play_grab();
                    }
                }
                PointerEvent::Up(_) => self.game.release(),
                PointerEvent::Down(_) | PointerEvent::Move(_) => {}
            }
        }
    }

    fn dispatch(&mut self, report: &FrameReport) {
        for cue in &report.cues {
            match *cue {
                SoundCue::Grab => self.audio.play_grab(),
                SoundCue::Drop => self.audio.play_drop(),
                SoundCue::Clear => self.audio.play_clear(),
                SoundCue::GameOver => self.audio.play_game_over(),
                SoundCue::Spring { tension } => {
                    self.audio.start_spring();
                    self.audio.update_spring(tension);
                }
                SoundCue::StopSpring => self.audio.stop_spring(),
            }
        }
        if report.score_changed {
            self.score_display.set_score(self.game.score());
        }
    }
}

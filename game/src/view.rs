use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameView {
    #[default]
    StartScreen,
    Playing { paused: bool },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameViewEvent {
    StartGame,
    Restart,
    TogglePause,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameViewEffect {
    None,
    ResetGame,
}

impl GameView {
    /// Pure transition function for the session's screen state. Resetting the game is
    /// reported as a `GameViewEffect` for the caller to apply.
    pub fn handle(self, event: GameViewEvent) -> (GameView, GameViewEffect) {
        match (self, event) {
            (GameView::StartScreen | GameView::GameOver, GameViewEvent::StartGame)
            | (GameView::Playing { .. } | GameView::GameOver, GameViewEvent::Restart) => (
                GameView::Playing { paused: false },
                GameViewEffect::ResetGame,
            ),

            (GameView::Playing { paused }, GameViewEvent::TogglePause) => {
                (GameView::Playing { paused: !paused }, GameViewEffect::None)
            }
            (GameView::Playing { .. }, GameViewEvent::GameOver) => {
                (GameView::GameOver, GameViewEffect::None)
            }

            (state, _) => (state, GameViewEffect::None),
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, GameView::Playing { .. })
    }

    pub fn is_running(self) -> bool {
        matches!(self, GameView::Playing { paused: false })
    }

    pub fn is_paused(self) -> bool {
        matches!(self, GameView::Playing { paused: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_is_start_screen() {
        assert_eq!(GameView::default(), GameView::StartScreen);
    }

    #[test]
    fn start_from_start_screen_enters_play_and_requests_reset() {
        assert_eq!(
            GameView::StartScreen.handle(GameViewEvent::StartGame),
            (GameView::Playing { paused: false }, GameViewEffect::ResetGame)
        );
    }

    #[test]
    fn start_while_playing_is_ignored_but_restart_resets() {
        let playing = GameView::Playing { paused: true };
        assert_eq!(
            playing.handle(GameViewEvent::StartGame),
            (playing, GameViewEffect::None)
        );
        assert_eq!(
            playing.handle(GameViewEvent::Restart),
            (GameView::Playing { paused: false }, GameViewEffect::ResetGame)
        );
    }

    #[test]
    fn toggle_pause_flips_only_while_playing() {
        assert_eq!(
            GameView::Playing { paused: false }.handle(GameViewEvent::TogglePause),
            (GameView::Playing { paused: true }, GameViewEffect::None)
        );
        assert_eq!(
            GameView::Playing { paused: true }.handle(GameViewEvent::TogglePause),
            (GameView::Playing { paused: false }, GameViewEffect::None)
        );
        assert_eq!(
            GameView::GameOver.handle(GameViewEvent::TogglePause),
            (GameView::GameOver, GameViewEffect::None)
        );
        assert_eq!(
            GameView::StartScreen.handle(GameViewEvent::TogglePause),
            (GameView::StartScreen, GameViewEffect::None)
        );
    }

    #[test]
    fn game_over_is_terminal_until_restart() {
        let (over, _) = GameView::Playing { paused: false }.handle(GameViewEvent::GameOver);
        assert_eq!(over, GameView::GameOver);
        assert_eq!(
            over.handle(GameViewEvent::GameOver),
            (GameView::GameOver, GameViewEffect::None)
        );
        assert_eq!(
            over.handle(GameViewEvent::StartGame),
            (GameView::Playing { paused: false }, GameViewEffect::ResetGame)
        );
    }
}

use engine::HeadlessRunner;
use game::playtest::{DragBot, PhysicsLogic, PlayInput};
use game::settings::{SEED_ENV, SettingsStore, env_u64};

const DEFAULT_SEED: u64 = 7;
const MAX_FRAMES: usize = 60 * 60 * 5;
const HISTORY_LIMIT: usize = 600;
const BOT_COLUMNS: [f32; 5] = [1.5, 3.5, 5.5, 7.5, 8.5];

/// Scripted headless run: a drag bot plays until the well tops out or the frame budget ends.
fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let seed = env_u64(SEED_ENV).unwrap_or(DEFAULT_SEED);
    let settings = SettingsStore::from_env().load();
    log::info!("headless run with seed {seed}");

    let mut runner =
        HeadlessRunner::with_history_limit(PhysicsLogic::new(seed, settings.physics), HISTORY_LIMIT);
    let mut bot = DragBot::default();

    loop {
        let state = runner.state();
        if state.game.is_game_over() || state.frame as usize >= MAX_FRAMES {
            break;
        }
        let column = BOT_COLUMNS[state.game.pieces_locked() as usize % BOT_COLUMNS.len()];
        let input = bot.next_input(state, column);
        if let PlayInput::PointerUp(at) = input {
            log::debug!("frame {}: releasing over ({:.1}, {:.1})", state.frame, at.x, at.y);
        }
        runner.step(input);
    }

    let state = runner.state();
    log::info!(
        "finished after {} frames: score {}, {} pieces, {} lines{}",
        state.frame,
        state.game.score(),
        state.game.pieces_locked(),
        state.game.lines_cleared(),
        if state.game.is_game_over() { ", game over" } else { "" }
    );
    println!(
        "frames {} score {} pieces {} lines {}",
        state.frame,
        state.game.score(),
        state.game.pieces_locked(),
        state.game.lines_cleared()
    );
}

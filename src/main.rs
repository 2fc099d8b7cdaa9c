//! Headless demo run
//!
//! Drives the simulation through the fixed-step [`App`] loop with a simple
//! ball-chasing autopilot, exercising launch, level clear, game over and the
//! restart handshake. Pass a number as the first argument to change the RNG
//! seed.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;

use arcanoid::consts::FIXED_DT;
use arcanoid::platform::{App, FrameSink, InputHeld, InputSource};
use arcanoid::render::Frame;
use arcanoid::sim::{Assets, Ball, Block, Circle, Game, GamePhase, Rect};
use arcanoid::Tuning;

/// Simulated time budget for the whole demo
const MAX_TICKS: u32 = 120 * 180;

fn spawn_level(game: &mut Game, level: u32) {
    let dims = Vec2::new(32.0, 12.0);
    let gap = Vec2::new(5.0, 5.0);
    match level % 2 {
        0 => {
            game.spawn_block_grid(Vec2::new(10.0, 10.0), 6, 2, dims, gap, 1.0);
            game.spawn_block_grid(Vec2::new(40.0, 100.0), 6, 2, dims, gap, 2.0);
            game.spawn_block_grid(Vec2::new(70.0, 190.0), 6, 2, dims, gap, 1.0);
        }
        _ => {
            game.spawn_block_grid(Vec2::new(60.0, 60.0), 8, 2, dims, gap, 1.0);
            game.spawn_block_grid(Vec2::new(60.0, 95.0), 1, 8, dims, gap, 3.0);
            game.spawn_block_grid(Vec2::new(281.0, 95.0), 1, 8, dims, gap, 3.0);
            game.spawn_block_grid(Vec2::new(60.0, 230.0), 7, 1, dims, gap, 1.0);
            game.spawn_block_grid(Vec2::new(120.0, 190.0), 4, 1, dims, gap, 2.0);
            game.spawn_block_grid(Vec2::new(120.0, 120.0), 4, 1, dims, gap, 2.0);
        }
    }
}

/// Hold direction keys toward the lowest live ball; confirm whenever the
/// state machine is waiting for one
fn decide(game: &Game) -> InputHeld {
    let mut held = InputHeld::default();
    match game.phase {
        GamePhase::Aiming => held.confirm = true,
        GamePhase::Playing => {
            let paddle_x = game
                .paddle()
                .map(|paddle| game.session.world.get::<Rect>(paddle).position.x);
            let ball_x = game
                .session
                .world
                .view::<(Ball, Circle)>()
                .map(|ball| game.session.world.get::<Circle>(ball).position)
                .max_by(|a, b| a.y.total_cmp(&b.y))
                .map(|position| position.x);
            if let (Some(paddle_x), Some(ball_x)) = (paddle_x, ball_x) {
                if ball_x < paddle_x - 4.0 {
                    held.left = true;
                } else if ball_x > paddle_x + 4.0 {
                    held.right = true;
                }
            }
        }
        GamePhase::Paused => held.cancel = true,
        GamePhase::Score => held.confirm = game.is_restart_allowed,
    }
    held
}

/// Input collaborator fed from the autopilot between pumps
struct SharedInput(Rc<Cell<InputHeld>>);

impl InputSource for SharedInput {
    fn held(&mut self) -> InputHeld {
        self.0.get()
    }
}

#[derive(Default)]
struct CountingSink {
    frames: usize,
}

impl FrameSink for CountingSink {
    fn present(&mut self, _frame: &Frame) {
        self.frames += 1;
    }
}

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    let tuning = Tuning::load();
    log::info!("starting demo run, seed {seed}");

    let mut game = Game::new(seed, tuning, Assets::default());
    spawn_level(&mut game, 0);

    let held = Rc::new(Cell::new(InputHeld::default()));
    let mut app = App::new(game, SharedInput(held.clone()), CountingSink::default());

    let step = Duration::from_secs_f64(FIXED_DT as f64);
    let mut now = Duration::ZERO;
    let mut last_phase = app.game.phase;
    let mut restarts = 0u32;

    for _ in 0..MAX_TICKS {
        held.set(decide(&app.game));
        now += step;
        app.pump(now);

        if app.game.phase != last_phase {
            log::info!(
                "phase {:?} -> {:?} (score {}, lives {})",
                last_phase,
                app.game.phase,
                app.game.session.player.score,
                app.game.session.player.lives
            );
            last_phase = app.game.phase;
        }

        // Outer half of the restart handshake: grant restarts on game over,
        // reload when the simulation asks for it
        if app.game.is_waiting_for_restart && !app.game.is_restart_allowed {
            app.game.is_restart_allowed = true;
        }
        if app.game.is_restart_requested {
            restarts += 1;
            if restarts > 1 {
                break;
            }
            log::info!("restart requested, reloading first level");
            app.game.reset_to_start(true);
            spawn_level(&mut app.game, 0);
            last_phase = app.game.phase;
        } else if app.game.phase == GamePhase::Score
            && app.game.is_waiting_for_next_level
            && !app.game.is_waiting_for_restart
        {
            app.game.progress_to_next_level();
            let level = app.game.session.player.level;
            log::info!("advancing to level {level}");
            spawn_level(&mut app.game, level);
            last_phase = app.game.phase;
        }
    }

    let player = app.game.session.player;
    log::info!(
        "demo finished: score {}, lives {}, level {}, blocks left {}",
        player.score,
        player.lives.max(0),
        player.level,
        app.game.session.world.size::<Block>()
    );
}

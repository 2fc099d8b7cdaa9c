//! Outer loop driver and collaborator seams
//!
//! The simulation itself is headless; a host supplies wall-clock time, an
//! [`InputSource`] for the held button state, and a [`FrameSink`] that
//! consumes composed frames. [`App::pump`] converts elapsed real time into
//! fixed simulation substeps and presents exactly one frame per call.

use std::time::Duration;

use crate::consts::FIXED_DT;
use crate::render::{compose_frame, Frame};
use crate::sim::state::InputEvent;
use crate::sim::tick::Game;

/// Ceiling on catch-up substeps per pump; beyond it the remainder is dropped
/// and the simulation slows down rather than spiraling
pub const MAX_SUBSTEPS: u32 = 8;

/// Which logical buttons are currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputHeld {
    pub left: bool,
    pub right: bool,
    pub confirm: bool,
    pub cancel: bool,
}

/// Host-side input collaborator, sampled once per fixed substep
pub trait InputSource {
    fn held(&mut self) -> InputHeld;
}

/// Host-side presentation collaborator
pub trait FrameSink {
    fn present(&mut self, frame: &Frame);
}

/// Turns sampled held-state into per-tick events with rising-edge detection
#[derive(Debug, Default)]
pub struct ButtonTracker {
    prev: InputHeld,
}

impl ButtonTracker {
    /// Deliver one event per held button; `changed` is true only on the tick
    /// the button went down
    pub fn dispatch(&mut self, game: &mut Game, held: InputHeld) {
        let buttons = [
            (InputEvent::Left, held.left, self.prev.left),
            (InputEvent::Right, held.right, self.prev.right),
            (InputEvent::Confirm, held.confirm, self.prev.confirm),
            (InputEvent::Cancel, held.cancel, self.prev.cancel),
        ];
        for (event, down, was_down) in buttons {
            if down {
                game.handle_input(event, !was_down);
            }
        }
        self.prev = held;
    }
}

/// Fixed-timestep driver owning the game and both collaborators
pub struct App<I: InputSource, S: FrameSink> {
    pub game: Game,
    input: I,
    sink: S,
    tracker: ButtonTracker,
    accumulator: f32,
    last_time: Option<Duration>,
}

impl<I: InputSource, S: FrameSink> App<I, S> {
    pub fn new(game: Game, input: I, sink: S) -> Self {
        Self {
            game,
            input,
            sink,
            tracker: ButtonTracker::default(),
            accumulator: 0.0,
            last_time: None,
        }
    }

    /// Advance to `now`: run the due fixed substeps (capped), then present
    /// one frame. Returns the number of substeps run.
    pub fn pump(&mut self, now: Duration) -> u32 {
        let dt = match self.last_time {
            Some(last) => now.saturating_sub(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_time = Some(now);

        // A long stall (debugger, tab in background) must not snowball
        self.accumulator += dt.min(0.25);

        let mut substeps = 0;
        while self.accumulator >= FIXED_DT && substeps < MAX_SUBSTEPS {
            self.game.fixed_update();
            let held = self.input.held();
            self.tracker.dispatch(&mut self.game, held);
            self.accumulator -= FIXED_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }

        let frame = compose_frame(&self.game);
        self.sink.present(&frame);
        substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Assets, GamePhase};
    use crate::tuning::Tuning;

    /// Replays a fixed script of held states, one entry per substep
    struct ScriptedInput {
        script: Vec<InputHeld>,
        at: usize,
    }

    impl ScriptedInput {
        fn new(script: Vec<InputHeld>) -> Self {
            Self { script, at: 0 }
        }

        fn idle() -> Self {
            Self::new(Vec::new())
        }
    }

    impl InputSource for ScriptedInput {
        fn held(&mut self) -> InputHeld {
            let held = self.script.get(self.at).copied().unwrap_or_default();
            self.at += 1;
            held
        }
    }

    #[derive(Default)]
    struct CountingSink {
        frames: usize,
    }

    impl FrameSink for CountingSink {
        fn present(&mut self, frame: &Frame) {
            assert!(!frame.sprites.is_empty());
            self.frames += 1;
        }
    }

    fn new_app(input: ScriptedInput) -> App<ScriptedInput, CountingSink> {
        let game = Game::new(3, Tuning::default(), Assets::default());
        App::new(game, input, CountingSink::default())
    }

    // Small slack so float rounding never drops a substep
    fn ticks(n: u32) -> Duration {
        Duration::from_secs_f64((FIXED_DT as f64 + 1e-4) * n as f64)
    }

    #[test]
    fn test_pump_converts_elapsed_time_to_substeps() {
        let mut app = new_app(ScriptedInput::idle());

        // First pump establishes the time base
        assert_eq!(app.pump(ticks(0)), 0);
        assert_eq!(app.pump(ticks(2)), 2);
        // Half a tick remains banked in the accumulator
        assert_eq!(app.pump(ticks(5)), 3);
        assert_eq!(app.sink.frames, 3);
    }

    #[test]
    fn test_catchup_is_capped() {
        let mut app = new_app(ScriptedInput::idle());
        app.pump(ticks(0));
        assert_eq!(app.pump(Duration::from_secs(10)), MAX_SUBSTEPS);
        // The dropped backlog does not resurface
        assert_eq!(app.pump(Duration::from_secs(10) + ticks(1)), 1);
    }

    #[test]
    fn test_frame_presented_even_without_substeps() {
        let mut app = new_app(ScriptedInput::idle());
        app.pump(ticks(0));
        app.pump(ticks(0));
        assert_eq!(app.sink.frames, 2);
    }

    #[test]
    fn test_held_cancel_pauses_exactly_once() {
        let confirm = InputHeld {
            confirm: true,
            ..InputHeld::default()
        };
        let cancel = InputHeld {
            cancel: true,
            ..InputHeld::default()
        };
        // Launch, then hold cancel for several ticks
        let mut app = new_app(ScriptedInput::new(vec![
            confirm, cancel, cancel, cancel, cancel,
        ]));

        app.pump(ticks(0));
        app.pump(ticks(5));
        // A held key is one edge: paused, not toggling every tick
        assert_eq!(app.game.phase, GamePhase::Paused);

        // Release, then press again: back to playing
        app.tracker.dispatch(&mut app.game, InputHeld::default());
        app.tracker.dispatch(&mut app.game, cancel);
        assert_eq!(app.game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_held_direction_moves_paddle_every_tick() {
        let right = InputHeld {
            right: true,
            ..InputHeld::default()
        };
        let confirm = InputHeld {
            confirm: true,
            ..InputHeld::default()
        };
        let mut app = new_app(ScriptedInput::new(vec![confirm, right, right, right]));

        app.pump(ticks(0));
        app.pump(ticks(4));

        let paddle = app.game.paddle().unwrap();
        let x = app
            .game
            .session
            .world
            .get::<crate::sim::geom::Rect>(paddle)
            .position
            .x;
        let step = Tuning::default().paddle_speed * FIXED_DT;
        assert!((x - (crate::consts::GAME_CENTER.x + 3.0 * step)).abs() < 1e-3);
    }
}

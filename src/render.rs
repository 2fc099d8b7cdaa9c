//! Backend-agnostic presentation adapter
//!
//! Composes one [`Frame`] description per render call: every sprite-bearing
//! entity as a screen-space rectangle plus the phase-dependent overlay text.
//! A backend (or a test) consumes the frame; nothing here touches a GPU.

use glam::Vec2;

use crate::consts::{GAME_CENTER, SCREEN_AREA};
use crate::ecs::Entity;
use crate::game_bounds;
use crate::sim::geom::{Circle, Rect};
use crate::sim::state::{Block, GamePhase, Sprite, TextureId};
use crate::sim::tick::Game;

/// One textured (or solid-fill) quad in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub rect: Rect,
    pub texture: Option<TextureId>,
}

/// Text anchor: (0, 0) pins the top-left corner, (0.5, 0.5) centers
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub position: Vec2,
    pub anchor: Vec2,
    pub text: String,
}

/// Everything a backend needs to draw one frame
#[derive(Debug, Default)]
pub struct Frame {
    pub sprites: Vec<SpriteDraw>,
    pub texts: Vec<TextDraw>,
}

impl Frame {
    fn text(&mut self, position: Vec2, anchor: Vec2, text: impl Into<String>) {
        self.texts.push(TextDraw {
            position,
            anchor,
            text: text.into(),
        });
    }

    fn centered_text(&mut self, position: Vec2, text: impl Into<String>) {
        self.text(position, Vec2::splat(0.5), text);
    }
}

/// Screen-space bounding rectangle of an entity's shape, if it has one
fn entity_rect(game: &Game, entity: Entity) -> Option<Rect> {
    if let Some(rect) = game.session.world.try_get::<Rect>(entity) {
        Some(*rect)
    } else {
        game.session
            .world
            .try_get::<Circle>(entity)
            .map(Circle::to_rect)
    }
}

/// Build the frame for the current simulation state
pub fn compose_frame(game: &Game) -> Frame {
    let mut frame = Frame::default();

    for entity in game.session.world.view::<(Sprite,)>() {
        let Some(rect) = entity_rect(game, entity) else {
            continue;
        };
        let texture = game.session.world.get::<Sprite>(entity).texture;
        frame.sprites.push(SpriteDraw { rect, texture });
    }

    let player = &game.session.player;
    frame.text(
        Vec2::new(14.0, 14.0),
        Vec2::ZERO,
        format!("SCORE: {}", player.score),
    );
    frame.text(
        Vec2::new(SCREEN_AREA.x - 140.0, 14.0),
        Vec2::ZERO,
        format!("LIVES: {}", player.lives.max(0)),
    );

    match game.phase {
        GamePhase::Aiming => {
            let bottom = Vec2::new(GAME_CENTER.x, game_bounds().max.y + 20.0);
            frame.centered_text(bottom, "Press Space to start");
        }
        GamePhase::Playing => {}
        GamePhase::Paused => {
            frame.centered_text(GAME_CENTER, "PAUSED");
        }
        GamePhase::Score => {
            let banner = if game.session.world.size::<Block>() == 0 {
                "!!!YOU WON!!!"
            } else {
                "!!!GAME OVER!!!"
            };
            frame.centered_text(GAME_CENTER, banner);
            if game.is_restart_allowed {
                let below = GAME_CENTER + Vec2::new(0.0, 40.0);
                frame.centered_text(below, "Press Space to restart");
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Assets, InputEvent};
    use crate::tuning::Tuning;

    fn new_game() -> Game {
        Game::new(11, Tuning::default(), Assets::default())
    }

    fn texts(frame: &Frame) -> Vec<&str> {
        frame.texts.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_aiming_frame_shows_hint_and_hud() {
        let game = new_game();
        let frame = compose_frame(&game);

        let texts = texts(&frame);
        assert!(texts.contains(&"Press Space to start"));
        assert!(texts.contains(&"SCORE: 0"));
        assert!(texts.contains(&"LIVES: 3"));
        // Paddle and resting ball
        assert_eq!(frame.sprites.len(), 2);
    }

    #[test]
    fn test_playing_frame_has_no_overlay() {
        let mut game = new_game();
        game.spawn_block_grid(
            Vec2::new(10.0, 10.0),
            3,
            1,
            Vec2::new(32.0, 12.0),
            Vec2::new(5.0, 5.0),
            1.0,
        );
        game.handle_input(InputEvent::Confirm, true);

        let frame = compose_frame(&game);
        assert_eq!(frame.texts.len(), 2); // HUD only
        assert_eq!(frame.sprites.len(), 5); // paddle + ball + 3 blocks
    }

    #[test]
    fn test_circle_entities_draw_as_bounding_square() {
        let game = new_game();
        let frame = compose_frame(&game);

        let ball_quads: Vec<_> = frame
            .sprites
            .iter()
            .filter(|s| s.rect.dimensions == Vec2::splat(12.0))
            .collect();
        assert_eq!(ball_quads.len(), 1);
    }

    #[test]
    fn test_score_banner_depends_on_remaining_blocks() {
        // Board cleared: a win
        let mut game = new_game();
        game.phase = GamePhase::Score;
        let frame = compose_frame(&game);
        assert!(texts(&frame).contains(&"!!!YOU WON!!!"));

        // Blocks remain: a loss
        let mut game = new_game();
        game.spawn_block_grid(
            Vec2::new(10.0, 10.0),
            1,
            1,
            Vec2::new(32.0, 12.0),
            Vec2::ZERO,
            1.0,
        );
        game.phase = GamePhase::Score;
        let frame = compose_frame(&game);
        let texts = texts(&frame);
        assert!(texts.contains(&"!!!GAME OVER!!!"));
        assert!(!texts.contains(&"Press Space to restart"));

        // The restart hint appears only once the outer loop grants it
        game.is_restart_allowed = true;
        let frame = compose_frame(&game);
        assert!(self::texts(&frame).contains(&"Press Space to restart"));
    }

    #[test]
    fn test_lives_never_render_negative() {
        let mut game = new_game();
        game.session.player.lives = -1;
        let frame = compose_frame(&game);
        assert!(texts(&frame).contains(&"LIVES: 0"));
    }
}

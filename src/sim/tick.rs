//! Fixed-timestep simulation pipeline and session controller
//!
//! One [`Game::fixed_update`] call runs the whole per-tick pipeline in a
//! fixed pass order; later passes always observe the settled results of
//! earlier ones. Destruction inside the pipeline is deferred through the
//! `PendingDestroy` tag and swept at the end of the same tick.

use glam::Vec2;
use rand::Rng;

use super::geom::{self, Circle, Rect};
use super::state::{
    Assets, Attach, Ball, Block, Collidable, GamePhase, InputEvent, Laser, Life, Paddle,
    PendingDestroy, Pickup, PickupKind, PlayerState, Session, Sprite, TextureId, Velocity,
    entity_position, set_entity_position, BLOCK_COLORS, CRACK_VARIANTS,
};
use crate::consts::*;
use crate::ecs::{Entity, World};
use crate::scheduler::Scheduler;
use crate::tuning::Tuning;
use crate::{game_bounds, rotated};

/// Top-level game session: entity store, deferred effects, and the
/// aiming/playing/paused/score state machine
pub struct Game {
    pub session: Session,
    pub scheduler: Scheduler<Session>,
    pub phase: GamePhase,
    paddle: Option<Entity>,
    aim_ball: Option<Entity>,

    // Restart/next-level handshake with the outer loop. The core raises the
    // waiting flags; the outer loop grants `is_restart_allowed` and reacts to
    // `is_restart_requested`.
    pub is_restart_allowed: bool,
    pub is_restart_requested: bool,
    pub is_waiting_for_next_level: bool,
    pub is_waiting_for_restart: bool,
}

impl Game {
    /// Create a session with paddle and resting ball in place. The caller
    /// populates blocks afterwards (level data is external).
    pub fn new(seed: u64, tuning: Tuning, assets: Assets) -> Self {
        let mut game = Self {
            session: Session::new(seed, tuning, assets),
            scheduler: Scheduler::new(),
            phase: GamePhase::Aiming,
            paddle: None,
            aim_ball: None,
            is_restart_allowed: false,
            is_restart_requested: false,
            is_waiting_for_next_level: false,
            is_waiting_for_restart: false,
        };
        game.reset_to_start(true);
        game
    }

    pub fn paddle(&self) -> Option<Entity> {
        self.paddle
    }

    /// Advance the simulation by one fixed tick.
    ///
    /// Deferred effects only advance while playing; the pipeline itself is
    /// skipped entirely in any other phase.
    pub fn fixed_update(&mut self) {
        self.scheduler.pause(self.phase != GamePhase::Playing);
        self.scheduler.tick(FIXED_DT, &mut self.session);

        if self.phase != GamePhase::Playing {
            return;
        }

        update_balls(&mut self.session, self.paddle);
        update_lasers(&mut self.session);
        update_lives(&mut self.session);
        update_pickups(&mut self.session, &mut self.scheduler, self.paddle);
        update_movables(&mut self.session);
        update_attachments(&mut self.session);
        update_destroys(&mut self.session);

        self.check_win_conditions();
    }

    /// Route a logical input event according to the current phase.
    /// `changed` marks the rising edge of the button.
    pub fn handle_input(&mut self, event: InputEvent, changed: bool) {
        match self.phase {
            GamePhase::Aiming => self.handle_aiming_input(event),
            GamePhase::Playing => self.handle_playing_input(event, changed),
            GamePhase::Paused => {
                if event == InputEvent::Cancel && changed {
                    self.phase = GamePhase::Playing;
                }
            }
            GamePhase::Score => {
                if event == InputEvent::Confirm && changed && self.is_restart_allowed {
                    self.reset_player_state();
                    self.is_restart_requested = true;
                }
            }
        }
    }

    fn handle_aiming_input(&mut self, event: InputEvent) {
        let (Some(paddle), Some(aim_ball)) = (self.paddle, self.aim_ball) else {
            return;
        };
        let world = &mut self.session.world;
        if !world.valid(paddle) || !world.valid(aim_ball) {
            return;
        }

        let slide = self.session.tuning.aim_slide_speed * FIXED_DT;
        let paddle_rect = *world.get::<Rect>(paddle);
        let paddle_bounds = paddle_rect.bounds();
        match event {
            InputEvent::Left => {
                let ball = world.get_mut::<Circle>(aim_ball);
                if ball.position.x - ball.radius > paddle_bounds.min.x {
                    ball.position.x -= slide;
                }
            }
            InputEvent::Right => {
                let ball = world.get_mut::<Circle>(aim_ball);
                if ball.position.x + ball.radius < paddle_bounds.max.x {
                    ball.position.x += slide;
                }
            }
            InputEvent::Confirm => {
                let ball_x = world.get::<Circle>(aim_ball).position.x;
                let delta_x = paddle_rect.position.x - ball_x;
                let velocity = world.get_mut::<Velocity>(aim_ball);
                let speed = velocity.0.length();
                velocity.0 = geom::paddle_bounce_dir(delta_x, paddle_rect.dimensions.x) * speed;
                self.phase = GamePhase::Playing;
            }
            InputEvent::Cancel => {}
        }
    }

    fn handle_playing_input(&mut self, event: InputEvent, changed: bool) {
        let Some(paddle) = self.paddle else {
            return;
        };
        if !self.session.world.valid(paddle) {
            return;
        }

        let step = self.session.tuning.paddle_speed * FIXED_DT;
        let bounds = game_bounds();
        match event {
            InputEvent::Left | InputEvent::Right => {
                let rect = self.session.world.get_mut::<Rect>(paddle);
                let half = rect.dimensions.x / 2.0;
                let travel = if event == InputEvent::Left { -step } else { step };
                rect.position.x =
                    (rect.position.x + travel).clamp(bounds.min.x + half, bounds.max.x - half);
            }
            InputEvent::Confirm => {}
            InputEvent::Cancel => {
                if changed {
                    self.phase = GamePhase::Paused;
                }
            }
        }
    }

    /// Restore paddle + resting ball and enter the aiming phase.
    ///
    /// A full reset clears every entity; a partial one (life lost, same
    /// level) removes only balls, pickups and lasers. Both clear the
    /// handshake flags and restart the pickup-drop timer.
    pub fn reset_to_start(&mut self, full: bool) {
        self.is_waiting_for_next_level = false;
        self.is_waiting_for_restart = false;
        self.is_restart_allowed = false;
        self.is_restart_requested = false;

        if full {
            self.session.world.clear();
            self.paddle = None;
            self.aim_ball = None;
        } else {
            remove_balls(&mut self.session.world);
            remove_pickups(&mut self.session.world);
        }

        self.scheduler.reset();
        queue_pickup_drop(&mut self.scheduler, self.session.tuning.pickup_interval);

        let paddle = match self.paddle.filter(|&p| self.session.world.valid(p)) {
            Some(paddle) => {
                let rect = self.session.world.get_mut::<Rect>(paddle);
                rect.position = paddle_home();
                rect.dimensions = PADDLE_DIMENSIONS;
                paddle
            }
            None => spawn_paddle(&mut self.session.world, self.session.assets.paddle),
        };
        self.paddle = Some(paddle);

        let ball_position = Vec2::new(GAME_CENTER.x, paddle_top() - BALL_RADIUS - 5.0);
        let ball_velocity = Vec2::new(0.0, -self.session.tuning.ball_speed);
        self.aim_ball = Some(spawn_ball(
            &mut self.session.world,
            ball_position,
            ball_velocity,
            self.session.assets.ball,
        ));
        self.phase = GamePhase::Aiming;
    }

    /// Bump the level index and tear the board down; the outer loop spawns
    /// the next level's blocks
    pub fn progress_to_next_level(&mut self) {
        self.session.player.level += 1;
        self.reset_to_start(true);
    }

    pub fn reset_player_state(&mut self) {
        self.session.player = PlayerState::default();
    }

    /// Populate a grid of blocks. Positions falling outside the play area
    /// are culled; colour is randomized per block.
    pub fn spawn_block_grid(
        &mut self,
        offset: Vec2,
        cols: u32,
        rows: u32,
        block_dims: Vec2,
        block_gap: Vec2,
        hp: f32,
    ) {
        spawn_block_grid(&mut self.session, offset, cols, rows, block_dims, block_gap, hp);
    }

    fn check_win_conditions(&mut self) {
        if self.session.world.size::<Ball>() == 0 {
            self.session.player.lives -= 1;
            if self.session.player.lives >= 0 {
                log::info!("ball lost, {} lives remaining", self.session.player.lives);
                self.reset_to_start(false);
            } else {
                log::info!("game over, final score {}", self.session.player.score);
                self.is_waiting_for_restart = true;
                self.is_waiting_for_next_level = true;
                self.phase = GamePhase::Score;
            }
        }

        if self.session.world.size::<Block>() == 0 {
            log::info!("level cleared, score {}", self.session.player.score);
            self.is_waiting_for_next_level = true;
            self.phase = GamePhase::Score;
        }
    }
}

fn paddle_home() -> Vec2 {
    Vec2::new(GAME_CENTER.x, GAME_AREA.y - PADDLE_ELEVATION)
}

fn paddle_top() -> f32 {
    GAME_AREA.y - PADDLE_ELEVATION - PADDLE_DIMENSIONS.y / 2.0
}

// --- Spawns -----------------------------------------------------------------

pub(crate) fn spawn_paddle(world: &mut World, texture: Option<TextureId>) -> Entity {
    let entity = world.create();
    world.emplace(entity, Paddle);
    world.emplace(entity, Rect::new(paddle_home(), PADDLE_DIMENSIONS));
    world.emplace(entity, Sprite { texture });
    world.emplace(entity, Collidable);
    entity
}

pub(crate) fn spawn_ball(
    world: &mut World,
    position: Vec2,
    velocity: Vec2,
    texture: Option<TextureId>,
) -> Entity {
    let entity = world.create();
    world.emplace(entity, Ball);
    world.emplace(entity, Circle::new(position, BALL_RADIUS));
    world.emplace(entity, Sprite { texture });
    world.emplace(entity, Collidable);
    world.emplace(entity, Velocity(velocity));
    entity
}

pub(crate) fn spawn_pickup(session: &mut Session) -> Entity {
    let bounds = game_bounds();
    let x = session.rng.random_range(bounds.min.x..=bounds.max.x);
    let kind = PickupKind::ALL[session.rng.random_range(0..PickupKind::ALL.len())];
    let fall = session.tuning.pickup_fall_speed;

    let entity = session.world.create();
    session.world.emplace(entity, Pickup { kind });
    session
        .world
        .emplace(entity, Rect::new(Vec2::new(x, 0.0), PICKUP_DIMENSIONS));
    session.world.emplace(
        entity,
        Sprite {
            texture: session.assets.pickup,
        },
    );
    session.world.emplace(entity, Collidable);
    session.world.emplace(entity, Velocity(Vec2::new(0.0, fall)));
    entity
}

pub(crate) fn spawn_laser(
    world: &mut World,
    paddle: Entity,
    texture: Option<TextureId>,
) -> Entity {
    let paddle_rect = *world.get::<Rect>(paddle);
    let offset = Vec2::new(0.0, -GAME_AREA.y / 2.0);

    let entity = world.create();
    world.emplace(
        entity,
        Rect::new(
            paddle_rect.position + offset,
            Vec2::new(LASER_WIDTH, GAME_AREA.y),
        ),
    );
    world.emplace(entity, Sprite { texture });
    world.emplace(entity, Laser);
    world.emplace(entity, Attach { parent: paddle, offset });
    entity
}

fn spawn_block_grid(
    session: &mut Session,
    offset: Vec2,
    cols: u32,
    rows: u32,
    block_dims: Vec2,
    block_gap: Vec2,
    hp: f32,
) {
    let bounds = game_bounds();
    let step = block_dims + block_gap;
    for row in 0..rows {
        for col in 0..cols {
            let position = block_dims / 2.0
                + offset
                + step * Vec2::new(col as f32, row as f32)
                + bounds.min;
            if position.x >= bounds.max.x || position.y >= bounds.max.y {
                continue;
            }

            let color = session.rng.random_range(0..BLOCK_COLORS);
            let texture = session.assets.blocks[color];
            let entity = session.world.create();
            session.world.emplace(entity, Rect::new(position, block_dims));
            session.world.emplace(entity, Block);
            session.world.emplace(entity, Sprite { texture });
            session.world.emplace(entity, Life::new(hp));
            session.world.emplace(entity, Collidable);
        }
    }
}

/// Schedule the recurring pickup drop; each drop re-schedules the next one
fn queue_pickup_drop(scheduler: &mut Scheduler<Session>, delay: f32) {
    scheduler.schedule(delay, |session, scheduler| {
        spawn_pickup(session);
        let next = session.tuning.pickup_interval;
        queue_pickup_drop(scheduler, next);
    });
}

// --- Teardown ---------------------------------------------------------------

fn remove_balls(world: &mut World) {
    let balls: Vec<Entity> = world.view::<(Ball,)>().collect();
    for entity in balls {
        world.destroy(entity);
    }
}

fn remove_pickups(world: &mut World) {
    let pickups: Vec<Entity> = world.view::<(Pickup,)>().collect();
    for entity in pickups {
        world.destroy(entity);
    }
    let lasers: Vec<Entity> = world.view::<(Laser,)>().collect();
    for entity in lasers {
        world.destroy(entity);
    }
}

// --- Pipeline passes --------------------------------------------------------

/// Ball motion and collision response. At most one block is hit per ball per
/// tick; the paddle bounce re-aims even after a wall or block reflection.
fn update_balls(session: &mut Session, paddle: Option<Entity>) {
    let bounds = game_bounds();
    let base_speed = session.tuning.ball_speed;
    let paddle_rect = paddle.and_then(|p| session.world.try_get::<Rect>(p).copied());

    let balls: Vec<Entity> = session
        .world
        .view::<(Ball, Circle, Velocity, Collidable)>()
        .collect();
    for entity in balls {
        let mut circle = *session.world.get::<Circle>(entity);
        let mut velocity = session.world.get::<Velocity>(entity).0;

        // Defensive clamp against drift out of the play area
        circle.position = circle.position.clamp(bounds.min, bounds.max);

        // Collisions are checked against the predicted position
        let predicted = Circle::new(circle.position + velocity * FIXED_DT, circle.radius);

        if predicted.position.y < bounds.min.y {
            velocity.y = -velocity.y;
        }
        if predicted.position.y > bounds.max.y || predicted.position.is_nan() {
            // Out the bottom, or numerically degenerate: quarantine the ball
            session.world.emplace(entity, circle);
            session.world.emplace(entity, PendingDestroy);
            continue;
        }
        if predicted.position.x < bounds.min.x || predicted.position.x > bounds.max.x {
            velocity.x = -velocity.x;
        }

        let magnitude = velocity.length();
        let direction = velocity / magnitude;

        // Speed floor along the current direction
        if magnitude < base_speed {
            velocity = direction * base_speed;
        }

        // Nudge nearly axis-aligned directions out of the stable trap
        if direction.x.abs() > 0.9 || direction.y.abs() > 0.98 {
            velocity = rotated(velocity, ANGLE_NUDGE.copysign(direction.x));
        }

        let blocks: Vec<Entity> = session
            .world
            .view::<(Block, Rect, Life, Collidable)>()
            .collect();
        for block_entity in blocks {
            let block = *session.world.get::<Rect>(block_entity);
            if !geom::circle_rect_intersect(&predicted, &block) {
                continue;
            }

            let delta = circle.position - block.position;
            if delta.y.abs() < block.dimensions.y {
                velocity.x = -velocity.x;
            } else if delta.x.abs() < block.dimensions.x {
                velocity.y = -velocity.y;
            } else if delta.y.abs() > delta.x.abs() {
                velocity.x = -velocity.x;
            } else {
                velocity.y = -velocity.y;
            }

            let crack = session.rng.random_range(0..CRACK_VARIANTS);
            let texture = session.assets.cracks[crack];
            if let Some(sprite) = session.world.try_get_mut::<Sprite>(block_entity) {
                sprite.texture = texture;
            }

            // One hit is 1 HP
            session.world.get_mut::<Life>(block_entity).hp -= 1.0;
            break;
        }

        if let Some(paddle_rect) = paddle_rect {
            if geom::circle_rect_intersect(&predicted, &paddle_rect) {
                let delta_x = paddle_rect.position.x - circle.position.x;
                velocity =
                    geom::paddle_bounce_dir(delta_x, paddle_rect.dimensions.x) * base_speed;
            }
        }

        session.world.emplace(entity, circle);
        session.world.emplace(entity, Velocity(velocity));
    }
}

/// Continuous laser damage: every beam hurts every overlapping block, every
/// tick it overlaps
fn update_lasers(session: &mut Session) {
    let damage = session.tuning.laser_dps * FIXED_DT;

    let lasers: Vec<Entity> = session.world.view::<(Laser, Rect, Attach)>().collect();
    for laser in lasers {
        let beam = *session.world.get::<Rect>(laser);
        let blocks: Vec<Entity> = session
            .world
            .view::<(Block, Rect, Life, Collidable)>()
            .collect();
        for block_entity in blocks {
            let block = *session.world.get::<Rect>(block_entity);
            if !geom::rect_intersect(&beam, &block) {
                continue;
            }
            session.world.get_mut::<Life>(block_entity).hp -= damage;
        }
    }
}

/// Award rewards and quarantine blocks whose HP ran out
fn update_lives(session: &mut Session) {
    let blocks: Vec<Entity> = session.world.view::<(Block, Life)>().collect();
    for entity in blocks {
        let life = *session.world.get::<Life>(entity);
        if life.hp < LIFE_EPSILON {
            session.player.score += life.reward;
            session.world.emplace(entity, PendingDestroy);
        }
    }
}

/// Pickup fall-off and paddle-contact effects
fn update_pickups(session: &mut Session, scheduler: &mut Scheduler<Session>, paddle: Option<Entity>) {
    let bounds = game_bounds();
    let Some(paddle_entity) = paddle else {
        return;
    };
    let Some(paddle_rect) = session.world.try_get::<Rect>(paddle_entity).copied() else {
        return;
    };

    let pickups: Vec<Entity> = session.world.view::<(Pickup, Rect, Collidable)>().collect();
    for entity in pickups {
        let rect = *session.world.get::<Rect>(entity);
        if rect.position.y > bounds.max.y {
            session.world.emplace(entity, PendingDestroy);
            continue;
        }
        if !geom::rect_intersect(&rect, &paddle_rect) {
            continue;
        }

        let kind = session.world.get::<Pickup>(entity).kind;
        apply_pickup(session, scheduler, paddle_entity, kind);
        session.world.emplace(entity, PendingDestroy);
    }
}

fn apply_pickup(
    session: &mut Session,
    scheduler: &mut Scheduler<Session>,
    paddle: Entity,
    kind: PickupKind,
) {
    log::debug!("pickup collected: {kind:?}");
    match kind {
        PickupKind::EnlargePaddle => {
            let grow = session.tuning.paddle_enlarge;
            if let Some(rect) = session.world.try_get_mut::<Rect>(paddle) {
                rect.dimensions.x += grow;
            }
            scheduler.schedule(session.tuning.enlarge_duration, move |session, _| {
                if !session.world.valid(paddle) {
                    return;
                }
                if let Some(rect) = session.world.try_get_mut::<Rect>(paddle) {
                    rect.dimensions.x -= grow;
                }
            });
        }
        PickupKind::Triplet => {
            // Clone the first live ball into two copies deflected either way
            let source = session
                .world
                .view::<(Ball, Circle, Sprite, Velocity)>()
                .next();
            if let Some(source) = source {
                let position = session.world.get::<Circle>(source).position;
                let velocity = session.world.get::<Velocity>(source).0;
                let texture = session.world.get::<Sprite>(source).texture;
                spawn_ball(
                    &mut session.world,
                    position,
                    rotated(velocity, TRIPLET_ANGLE),
                    texture,
                );
                spawn_ball(
                    &mut session.world,
                    position,
                    rotated(velocity, -TRIPLET_ANGLE),
                    texture,
                );
            }
        }
        PickupKind::Laser => {
            let laser = spawn_laser(&mut session.world, paddle, session.assets.laser);
            scheduler.schedule(session.tuning.laser_lifetime, move |session, _| {
                if session.world.valid(laser) {
                    session.world.destroy(laser);
                }
            });
        }
    }
}

/// Generic linear motion over the shape-agnostic position accessor
fn update_movables(session: &mut Session) {
    let movers: Vec<Entity> = session.world.view::<(Velocity,)>().collect();
    for entity in movers {
        let velocity = session.world.get::<Velocity>(entity).0;
        if let Some(position) = entity_position(&session.world, entity) {
            set_entity_position(&mut session.world, entity, position + velocity * FIXED_DT);
        }
    }
}

/// Attachment followers track their parent; a dead parent destroys the child
/// immediately (hard dependency break, no quarantine)
fn update_attachments(session: &mut Session) {
    let attached: Vec<Entity> = session.world.view::<(Attach,)>().collect();
    for entity in attached {
        let attach = *session.world.get::<Attach>(entity);
        if !session.world.valid(attach.parent) {
            session.world.destroy(entity);
            continue;
        }
        if let Some(parent_position) = entity_position(&session.world, attach.parent) {
            set_entity_position(&mut session.world, entity, parent_position + attach.offset);
        }
    }
}

/// Purge everything quarantined earlier in this tick
fn update_destroys(session: &mut Session) {
    let doomed: Vec<Entity> = session.world.view::<(PendingDestroy,)>().collect();
    for entity in doomed {
        session.world.destroy(entity);
    }
}

use engine::{Canvas, Vec2};
use rand::rngs::StdRng;

use super::animation::{Animation, AnimationLibrary};
use super::audio::AudioSink;
use super::effects::Effects;
use super::tilemap::{Rect, Tilemap};

pub(crate) const ENTITY_SIZE: Vec2 = Vec2::new(8.0, 15.0);
const ANIMATION_OFFSET: Vec2 = Vec2::new(-3.0, -3.0);
const GRAVITY: f64 = 0.1;
const TERMINAL_VELOCITY: f64 = 5.0;

/// World access handed to entities for one tick.
pub(crate) struct TickContext<'a> {
    pub tilemap: &'a Tilemap,
    pub animations: &'a AnimationLibrary,
    pub effects: &'a mut Effects,
    pub rng: &'a mut StdRng,
    pub audio: &'a mut dyn AudioSink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityKind {
    Player,
    Enemy,
}

impl EntityKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Enemy => "enemy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Idle,
    Run,
    Jump,
    WallSlide,
}

impl Action {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Action::Idle => "idle",
            Action::Run => "run",
            Action::Jump => "jump",
            Action::WallSlide => "wall_slide",
        }
    }
}

/// Which sides were blocked during the last physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Collisions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// State shared by every moving, tile-colliding entity.
#[derive(Debug, Clone)]
pub(crate) struct PhysicsBody {
    pub kind: EntityKind,
    /// Top-left corner of the hitbox.
    pub pos: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub collisions: Collisions,
    pub action: Action,
    pub animation: Animation,
    /// Facing left.
    pub flip: bool,
    pub last_movement: Vec2,
}

impl PhysicsBody {
    pub(crate) fn new(kind: EntityKind, pos: Vec2, size: Vec2, animations: &AnimationLibrary) -> Self {
        let action = Action::Idle;
        Self {
            kind,
            pos,
            size,
            velocity: Vec2::ZERO,
            collisions: Collisions::default(),
            action,
            animation: animations
                .animation(&animation_key(kind, action))
                .unwrap_or_default(),
            flip: false,
            last_movement: Vec2::ZERO,
        }
    }

    pub(crate) fn hitbox(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    /// Switches action and restarts its animation; same action is a no-op.
    pub(crate) fn set_action(&mut self, action: Action, animations: &AnimationLibrary) {
        if self.action == action {
            return;
        }
        self.action = action;
        self.animation = animations
            .animation(&animation_key(self.kind, action))
            .unwrap_or_default();
    }

    pub(crate) fn render(&self, canvas: &mut Canvas, offset: (i32, i32)) {
        let Some(image) = self.animation.image() else {
            return;
        };
        let x = self.pos.x - offset.0 as f64 + ANIMATION_OFFSET.x;
        let y = self.pos.y - offset.1 as f64 + ANIMATION_OFFSET.y;
        canvas.blit(image, x.floor() as i32, y.floor() as i32, self.flip);
    }
}

fn animation_key(kind: EntityKind, action: Action) -> String {
    format!("{}/{}", kind.as_str(), action.as_str())
}

/// One physics step: move and resolve X then Y against nearby solid tiles,
/// update facing, apply gravity and advance the animation.
pub(crate) fn step_physics(body: &mut PhysicsBody, tilemap: &Tilemap, movement: Vec2) {
    body.collisions = Collisions::default();

    let frame_movement = movement + body.velocity;

    body.pos.x += frame_movement.x;
    let mut hitbox = body.hitbox();
    for rect in tilemap.physics_rects_around(body.pos) {
        if !hitbox.overlaps(&rect) {
            continue;
        }
        if frame_movement.x > 0.0 {
            hitbox.x = rect.x - hitbox.w;
            body.collisions.right = true;
        } else if frame_movement.x < 0.0 {
            hitbox.x = rect.right();
            body.collisions.left = true;
        }
        body.pos.x = hitbox.x;
    }

    body.pos.y += frame_movement.y;
    let mut hitbox = body.hitbox();
    for rect in tilemap.physics_rects_around(body.pos) {
        if !hitbox.overlaps(&rect) {
            continue;
        }
        if frame_movement.y > 0.0 {
            hitbox.y = rect.y - hitbox.h;
            body.collisions.down = true;
        } else if frame_movement.y < 0.0 {
            hitbox.y = rect.bottom();
            body.collisions.up = true;
        }
        body.pos.y = hitbox.y;
    }

    if movement.x > 0.0 {
        body.flip = false;
    } else if movement.x < 0.0 {
        body.flip = true;
    }
    body.last_movement = movement;

    body.velocity.y = (body.velocity.y + GRAVITY).min(TERMINAL_VELOCITY);
    if body.collisions.down || body.collisions.up {
        body.velocity.y = 0.0;
    }

    body.animation.update();
}

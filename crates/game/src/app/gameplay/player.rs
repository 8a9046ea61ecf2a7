use std::f64::consts::TAU;

use engine::{Canvas, Vec2};
use rand::Rng;

use super::animation::AnimationLibrary;
use super::effects::{Particle, ParticleKind};
use super::entity::{step_physics, Action, EntityKind, PhysicsBody, TickContext, ENTITY_SIZE};
use super::tilemap::Rect;

pub(crate) const DASH_FRAMES: i32 = 60;
/// While `|dashing|` is above this the dash pushes the player and hides the sprite.
const DASH_BURST_END: i32 = 50;
/// While `|dashing|` is at least this the player kills enemies and ignores projectiles.
pub(crate) const DASH_ATTACK_THRESHOLD: i32 = 50;
const DASH_SPEED: f64 = 8.0;
const DASH_BURST_PARTICLES: usize = 20;
const FRICTION: f64 = 0.1;
const FALL_DEATH_AIR_TIME: u32 = 200;
const AIRBORNE_GRACE: u32 = 4;
const JUMP_AIR_TIME: u32 = 5;
const WALL_SLIDE_MAX_FALL: f64 = 0.5;

#[derive(Debug, Clone)]
pub(crate) struct Player {
    pub body: PhysicsBody,
    pub air_time: u32,
    pub jumps: u32,
    pub wall_slide: bool,
    /// Sign is the dash direction, magnitude the frames left.
    pub dashing: i32,
}

impl Player {
    pub(crate) fn new(pos: Vec2, animations: &AnimationLibrary) -> Self {
        Self {
            body: PhysicsBody::new(EntityKind::Player, pos, ENTITY_SIZE, animations),
            air_time: 0,
            jumps: 1,
            wall_slide: false,
            dashing: 0,
        }
    }

    pub(crate) fn hitbox(&self) -> Rect {
        self.body.hitbox()
    }

    pub(crate) fn is_dash_attacking(&self) -> bool {
        self.dashing.abs() >= DASH_ATTACK_THRESHOLD
    }

    /// Advances one tick with the given horizontal intent. Returns true when
    /// the player has been airborne long enough to count as fallen out of
    /// the level.
    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_>, movement: Vec2) -> bool {
        step_physics(&mut self.body, ctx.tilemap, movement);

        self.air_time += 1;
        let fell = self.air_time > FALL_DEATH_AIR_TIME;

        if self.body.collisions.down {
            self.air_time = 0;
            self.jumps = 1;
        }

        self.wall_slide = false;
        let collisions = self.body.collisions;
        if (collisions.left || collisions.right) && self.air_time > AIRBORNE_GRACE {
            self.wall_slide = true;
            self.body.velocity.y = self.body.velocity.y.min(WALL_SLIDE_MAX_FALL);
            self.body.flip = !collisions.right;
            self.body.set_action(Action::WallSlide, ctx.animations);
        }

        if !self.wall_slide {
            let action = if self.air_time > AIRBORNE_GRACE {
                Action::Jump
            } else if movement.x != 0.0 {
                Action::Run
            } else {
                Action::Idle
            };
            self.body.set_action(action, ctx.animations);
        }

        if matches!(self.dashing.abs(), DASH_FRAMES | DASH_BURST_END) {
            let center = self.hitbox().center();
            for _ in 0..DASH_BURST_PARTICLES {
                let angle = ctx.rng.gen::<f64>() * TAU;
                let speed = ctx.rng.gen::<f64>() * 0.5 + 0.5;
                let frame = ctx.rng.gen_range(0..=7);
                ctx.effects.particles.push(Particle::new(
                    ParticleKind::Particle,
                    center,
                    Vec2::from_angle(angle, speed),
                    frame,
                    ctx.animations,
                ));
            }
        }

        self.dashing -= self.dashing.signum();

        if self.dashing.abs() > DASH_BURST_END {
            let direction = self.dashing.signum() as f64;
            self.body.velocity.x = direction * DASH_SPEED;
            if self.dashing.abs() == DASH_BURST_END + 1 {
                self.body.velocity.x *= 0.1;
            }
            let trail = Vec2::new(direction * ctx.rng.gen::<f64>() * 3.0, 0.0);
            let frame = ctx.rng.gen_range(0..=7);
            ctx.effects.particles.push(Particle::new(
                ParticleKind::Particle,
                self.hitbox().center(),
                trail,
                frame,
                ctx.animations,
            ));
        }

        if self.body.velocity.x > 0.0 {
            self.body.velocity.x = (self.body.velocity.x - FRICTION).max(0.0);
        } else {
            self.body.velocity.x = (self.body.velocity.x + FRICTION).min(0.0);
        }

        fell
    }

    /// Wall jump, ground jump or double jump. Returns false when no jump is
    /// available.
    pub(crate) fn jump(&mut self) -> bool {
        if self.wall_slide {
            let pushing_into_wall = if self.body.flip {
                self.body.last_movement.x < 0.0
            } else {
                self.body.last_movement.x > 0.0
            };
            if !pushing_into_wall {
                return false;
            }
            let away = if self.body.flip { 1.0 } else { -1.0 };
            self.body.velocity = Vec2::new(away * 3.5, -2.5);
            self.air_time = JUMP_AIR_TIME;
            self.jumps = self.jumps.saturating_sub(1);
            return true;
        }

        if self.jumps > 0 {
            self.body.velocity.y = -3.5;
            self.jumps -= 1;
            self.air_time = JUMP_AIR_TIME;
            return true;
        }
        false
    }

    /// Starts a dash in the facing direction. Returns false while already dashing.
    pub(crate) fn dash(&mut self) -> bool {
        if self.dashing != 0 {
            return false;
        }
        self.dashing = if self.body.flip { -DASH_FRAMES } else { DASH_FRAMES };
        true
    }

    /// The sprite is hidden during the fast part of a dash.
    pub(crate) fn render(&self, canvas: &mut Canvas, offset: (i32, i32)) {
        if self.dashing.abs() <= DASH_BURST_END {
            self.body.render(canvas, offset);
        }
    }
}

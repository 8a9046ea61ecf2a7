use std::f64::consts::PI;

use engine::{Canvas, Sprite, Vec2};
use rand::Rng;

use super::animation::AnimationLibrary;
use super::audio::SoundCue;
use super::effects::Spark;
use super::entity::{step_physics, Action, EntityKind, PhysicsBody, TickContext, ENTITY_SIZE};
use super::projectile::Projectile;
use super::tilemap::Rect;

const LEDGE_PROBE: Vec2 = Vec2::new(7.0, 23.0);
const WALK_SPEED: f64 = 0.5;
const WANDER_CHANCE: f64 = 0.01;
const SIGHT_RANGE_Y: f64 = 16.0;
const MUZZLE_OFFSET: f64 = 7.0;
const PROJECTILE_SPEED: f64 = 1.5;
const MUZZLE_SPARKS: usize = 4;
const GUN_OFFSET: f64 = 4.0;
pub(crate) const HIT_SCREENSHAKE: u32 = 20;

/// What an enemy may know about the player during its update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlayerProbe {
    pub pos: Vec2,
    pub hitbox: Rect,
    pub dash_attacking: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Enemy {
    pub body: PhysicsBody,
    /// Frames left in the current patrol; zero while standing.
    pub walking: u32,
}

impl Enemy {
    pub(crate) fn new(pos: Vec2, animations: &AnimationLibrary) -> Self {
        Self {
            body: PhysicsBody::new(EntityKind::Enemy, pos, ENTITY_SIZE, animations),
            walking: 0,
        }
    }

    pub(crate) fn hitbox(&self) -> Rect {
        self.body.hitbox()
    }

    /// Patrols, shoots at the end of a patrol, and dies when touched by a
    /// dashing player. Returns true when the enemy was killed this tick.
    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_>, player: &PlayerProbe) -> bool {
        let mut movement = Vec2::ZERO;

        if self.walking > 0 {
            let ahead = if self.body.flip { -LEDGE_PROBE.x } else { LEDGE_PROBE.x };
            let probe = Vec2::new(self.hitbox().center().x + ahead, self.body.pos.y + LEDGE_PROBE.y);
            if ctx.tilemap.solid_check(probe).is_some() {
                if self.body.collisions.left || self.body.collisions.right {
                    self.body.flip = !self.body.flip;
                } else {
                    movement.x = if self.body.flip { -WALK_SPEED } else { WALK_SPEED };
                }
            } else {
                self.body.flip = !self.body.flip;
            }

            self.walking -= 1;
            if self.walking == 0 {
                self.fire_if_facing(ctx, player);
            }
        } else if ctx.rng.gen::<f64>() < WANDER_CHANCE {
            self.walking = ctx.rng.gen_range(30..120);
        }

        step_physics(&mut self.body, ctx.tilemap, movement);

        let action = if movement.x != 0.0 { Action::Run } else { Action::Idle };
        self.body.set_action(action, ctx.animations);

        if player.dash_attacking && self.hitbox().overlaps(&player.hitbox) {
            self.die(ctx);
            return true;
        }
        false
    }

    fn fire_if_facing(&self, ctx: &mut TickContext<'_>, player: &PlayerProbe) {
        let distance = player.pos - self.body.pos;
        if distance.y.abs() >= SIGHT_RANGE_Y {
            return;
        }

        let (direction, base_angle) = match (self.body.flip, distance.x) {
            (true, dx) if dx < 0.0 => (-1.0, PI),
            (false, dx) if dx > 0.0 => (1.0, 0.0),
            _ => return,
        };

        let center = self.hitbox().center();
        let muzzle = Vec2::new(center.x + direction * MUZZLE_OFFSET, center.y);
        ctx.effects
            .projectiles
            .push(Projectile::new(muzzle, direction * PROJECTILE_SPEED));
        for _ in 0..MUZZLE_SPARKS {
            let angle = ctx.rng.gen::<f64>() - 0.5 + base_angle;
            let speed = 2.0 + ctx.rng.gen::<f64>();
            ctx.effects.sparks.push(Spark::new(muzzle, angle, speed));
        }
        ctx.audio.play(SoundCue::Shoot);
    }

    fn die(&self, ctx: &mut TickContext<'_>) {
        let center = self.hitbox().center();
        ctx.effects.shake(HIT_SCREENSHAKE);
        ctx.effects.burst(center, ctx.animations, &mut *ctx.rng);
        for angle in [0.0, PI] {
            let speed = 5.0 + ctx.rng.gen::<f64>();
            ctx.effects.sparks.push(Spark::new(center, angle, speed));
        }
        ctx.audio.play(SoundCue::Hit);
    }

    /// Draws the enemy and its gun, mirrored when facing left.
    pub(crate) fn render(&self, canvas: &mut Canvas, gun: &Sprite, offset: (i32, i32)) {
        self.body.render(canvas, offset);

        let center = self.hitbox().center();
        let gun_x = if self.body.flip {
            center.x - GUN_OFFSET - gun.width() as f64
        } else {
            center.x + GUN_OFFSET
        };
        canvas.blit(
            gun,
            (gun_x - offset.0 as f64).floor() as i32,
            (center.y - offset.1 as f64).floor() as i32,
            self.body.flip,
        );
    }
}

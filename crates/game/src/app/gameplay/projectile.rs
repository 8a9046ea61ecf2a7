use engine::{Canvas, Sprite, Vec2};

use super::tilemap::{Rect, Tilemap};

/// Projectiles are removed on the tick their age exceeds this.
pub(crate) const PROJECTILE_MAX_AGE: u32 = 360;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProjectileOutcome {
    Flying,
    HitTile,
    Expired,
    HitPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Projectile {
    pub pos: Vec2,
    /// Horizontal pixels per tick; the sign is the direction.
    pub speed: f64,
    pub age: u32,
}

impl Projectile {
    pub(crate) fn new(pos: Vec2, speed: f64) -> Self {
        Self { pos, speed, age: 0 }
    }

    /// Moves and ages the projectile, then checks tile, lifetime and player
    /// hits in that order. `player` is `None` while the player can't be hit.
    pub(crate) fn update(&mut self, tilemap: &Tilemap, player: Option<Rect>) -> ProjectileOutcome {
        self.pos.x += self.speed;
        self.age += 1;

        if tilemap.solid_check(self.pos).is_some() {
            ProjectileOutcome::HitTile
        } else if self.age > PROJECTILE_MAX_AGE {
            ProjectileOutcome::Expired
        } else if player.is_some_and(|hitbox| hitbox.contains(self.pos)) {
            ProjectileOutcome::HitPlayer
        } else {
            ProjectileOutcome::Flying
        }
    }

    /// Drawn centred on `pos`.
    pub(crate) fn render(&self, canvas: &mut Canvas, image: &Sprite, offset: (i32, i32)) {
        let x = self.pos.x - image.width() as f64 / 2.0 - offset.0 as f64;
        let y = self.pos.y - image.height() as f64 / 2.0 - offset.1 as f64;
        canvas.blit(image, x.floor() as i32, y.floor() as i32, false);
    }
}

use std::f64::consts::PI;

use engine::{BlitOffset, Canvas, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::assets::GameAssets;
use super::audio::{AudioSink, SoundCue};
use super::effects::{Clouds, Effects, Particle, ParticleKind, Spark};
use super::enemy::{Enemy, PlayerProbe, HIT_SCREENSHAKE};
use super::entity::TickContext;
use super::levels::LevelCatalog;
use super::player::Player;
use super::projectile::ProjectileOutcome;
use super::tilemap::{Rect, TileKind, Tilemap};

const CLOUD_COUNT: usize = 16;
const PLAYER_START: Vec2 = Vec2::new(50.0, 50.0);
const CAMERA_LAG: f64 = 30.0;
const TRANSITION_FRAMES: i32 = 30;
const IRIS_SCALE: f64 = 8.0;
const DEATH_IRIS_DELAY: u32 = 10;
const DEATH_RELOAD_DELAY: u32 = 40;
const LEAF_TREE: (TileKind, u32) = (TileKind::LargeDecor, 2);
const PLAYER_SPAWNER: (TileKind, u32) = (TileKind::Spawners, 0);
const ENEMY_SPAWNER: (TileKind, u32) = (TileKind::Spawners, 1);
const LEAF_SPAWN_ODDS: f64 = 49999.0;
const LEAF_VELOCITY: Vec2 = Vec2::new(-0.1, 0.3);
const IMPACT_SPARKS: usize = 4;
const OUTLINE_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const OUTLINE_COLOR: [u8; 4] = [0, 0, 0, 180];
const IRIS_COLOR: [u8; 4] = [0, 0, 0, 255];
/// Canvas pixels per window pixel; shake strength is tuned for the 2x window.
const SHAKE_SCALE: f64 = 0.5;

/// Per-tick player commands derived from input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PlayerIntent {
    /// -1, 0 or 1.
    pub movement_x: f64,
    pub jump: bool,
    pub dash: bool,
}

/// Owns every live object of the running game and advances them in a fixed
/// order once per tick.
pub(crate) struct GameWorld {
    assets: GameAssets,
    catalog: LevelCatalog,
    level: usize,
    tilemap: Tilemap,
    player: Player,
    enemies: Vec<Enemy>,
    leaf_spawners: Vec<Rect>,
    clouds: Clouds,
    effects: Effects,
    scroll: Vec2,
    /// Ticks since the player died; zero while alive.
    dead: u32,
    /// Negative while the iris opens after a load, positive while it closes.
    transition: i32,
    rng: StdRng,
    shake_rng: StdRng,
    audio: Box<dyn AudioSink>,
    display: Canvas,
}

impl GameWorld {
    pub(crate) fn new(
        assets: GameAssets,
        catalog: LevelCatalog,
        start_level: usize,
        mut rng: StdRng,
        mut audio: Box<dyn AudioSink>,
        view: (u32, u32),
    ) -> Self {
        let clouds = Clouds::new(CLOUD_COUNT, assets.clouds.len(), &mut rng);
        let shake_rng = StdRng::seed_from_u64(rng.gen());
        let player = Player::new(PLAYER_START, &assets.animations);
        let level = start_level.min(catalog.last_index());
        if level != start_level {
            warn!(
                requested = start_level,
                level,
                "start level out of range; using last level"
            );
        }

        audio.play(SoundCue::Music);
        audio.play(SoundCue::Ambience);

        let mut world = Self {
            assets,
            catalog,
            level,
            tilemap: Tilemap::default(),
            player,
            enemies: Vec::new(),
            leaf_spawners: Vec::new(),
            clouds,
            effects: Effects::default(),
            scroll: Vec2::ZERO,
            dead: 0,
            transition: 0,
            rng,
            shake_rng,
            audio,
            display: Canvas::new(view.0, view.1),
        };
        world.load_level(level);
        world
    }

    /// Resets the world to a fresh copy of level `index`.
    pub(crate) fn load_level(&mut self, index: usize) {
        let Some(mut tilemap) = self.catalog.level(index) else {
            warn!(level = index, "level_missing");
            return;
        };
        self.level = index.min(self.catalog.last_index());

        self.leaf_spawners = tilemap
            .extract(&[LEAF_TREE], true)
            .into_iter()
            .map(|tree| Rect::new(4.0 + tree.pos.x, 4.0 + tree.pos.y, 23.0, 13.0))
            .collect();

        self.enemies.clear();
        for spawner in tilemap.extract(&[PLAYER_SPAWNER, ENEMY_SPAWNER], false) {
            if (spawner.kind, spawner.variant) == PLAYER_SPAWNER {
                self.player.body.pos = spawner.pos;
                self.player.air_time = 0;
            } else {
                self.enemies
                    .push(Enemy::new(spawner.pos, &self.assets.animations));
            }
        }

        self.tilemap = tilemap;
        self.effects.clear();
        self.scroll = Vec2::ZERO;
        self.dead = 0;
        self.transition = -TRANSITION_FRAMES;

        info!(
            level = self.level,
            path = %self.catalog.path(self.level).display(),
            enemies = self.enemies.len(),
            leaf_spawners = self.leaf_spawners.len(),
            "level_loaded"
        );
    }

    /// Advances the simulation by one fixed tick.
    pub(crate) fn tick(&mut self, intent: PlayerIntent) {
        if intent.jump && self.player.jump() {
            self.audio.play(SoundCue::Jump);
        }
        if intent.dash && self.player.dash() {
            self.audio.play(SoundCue::Dash);
        }

        self.effects.screenshake = self.effects.screenshake.saturating_sub(1);

        if self.enemies.is_empty() {
            self.transition += 1;
            if self.transition > TRANSITION_FRAMES {
                let next = (self.level + 1).min(self.catalog.last_index());
                info!(cleared = self.level, next, "level_completed");
                self.load_level(next);
            }
        }
        if self.transition < 0 {
            self.transition += 1;
        }

        if self.dead > 0 {
            self.dead += 1;
            if self.dead >= DEATH_IRIS_DELAY {
                self.transition = (self.transition + 1).min(TRANSITION_FRAMES);
            }
            if self.dead > DEATH_RELOAD_DELAY {
                info!(level = self.level, "level_restarted");
                self.load_level(self.level);
            }
        }

        self.follow_player();
        self.spawn_leaves();
        self.clouds.update();
        self.update_actors(intent.movement_x);
        self.update_projectiles();
        self.effects.update_sparks_and_particles();
    }

    fn follow_player(&mut self) {
        let center = self.player.hitbox().center();
        let half_view = Vec2::new(
            self.display.width() as f64 / 2.0,
            self.display.height() as f64 / 2.0,
        );
        self.scroll.x += (center.x - half_view.x - self.scroll.x) / CAMERA_LAG;
        self.scroll.y += (center.y - half_view.y - self.scroll.y) / CAMERA_LAG;
    }

    fn spawn_leaves(&mut self) {
        for spawner in &self.leaf_spawners {
            if self.rng.gen::<f64>() * LEAF_SPAWN_ODDS >= spawner.area() {
                continue;
            }
            let pos = Vec2::new(
                spawner.x + self.rng.gen::<f64>() * spawner.w,
                spawner.y + self.rng.gen::<f64>() * spawner.h,
            );
            let frame = self.rng.gen_range(0..=20);
            self.effects.particles.push(Particle::new(
                ParticleKind::Leaf,
                pos,
                LEAF_VELOCITY,
                frame,
                &self.assets.animations,
            ));
        }
    }

    fn update_actors(&mut self, movement_x: f64) {
        let probe = PlayerProbe {
            pos: self.player.body.pos,
            hitbox: self.player.hitbox(),
            dash_attacking: self.player.is_dash_attacking(),
        };
        let mut ctx = TickContext {
            tilemap: &self.tilemap,
            animations: &self.assets.animations,
            effects: &mut self.effects,
            rng: &mut self.rng,
            audio: self.audio.as_mut(),
        };

        let before = self.enemies.len();
        self.enemies.retain_mut(|enemy| !enemy.update(&mut ctx, &probe));
        let killed = before - self.enemies.len();
        if killed > 0 {
            debug!(killed, remaining = self.enemies.len(), "enemy_killed");
        }

        if self.dead == 0 && self.player.update(&mut ctx, Vec2::new(movement_x, 0.0)) {
            ctx.effects.shake(HIT_SCREENSHAKE);
            self.dead += 1;
            info!(level = self.level, cause = "fell", "player_died");
        }
    }

    fn update_projectiles(&mut self) {
        let target = (!self.player.is_dash_attacking()).then(|| self.player.hitbox());

        let mut impacts = Vec::new();
        let tilemap = &self.tilemap;
        self.effects.projectiles.retain_mut(|projectile| {
            match projectile.update(tilemap, target) {
                ProjectileOutcome::Flying => true,
                outcome => {
                    impacts.push((outcome, *projectile));
                    false
                }
            }
        });

        for (outcome, projectile) in impacts {
            match outcome {
                ProjectileOutcome::HitTile => {
                    let back = if projectile.speed > 0.0 { PI } else { 0.0 };
                    for _ in 0..IMPACT_SPARKS {
                        let angle = self.rng.gen::<f64>() - 0.5 + back;
                        let speed = 2.0 + self.rng.gen::<f64>();
                        self.effects
                            .sparks
                            .push(Spark::new(projectile.pos, angle, speed));
                    }
                    debug!(x = projectile.pos.x, y = projectile.pos.y, "projectile_hit_tile");
                }
                ProjectileOutcome::HitPlayer => {
                    self.dead += 1;
                    self.effects.shake(HIT_SCREENSHAKE);
                    self.audio.play(SoundCue::Hit);
                    let center = self.player.hitbox().center();
                    self.effects
                        .burst(center, &self.assets.animations, &mut self.rng);
                    info!(level = self.level, cause = "shot", "player_died");
                }
                ProjectileOutcome::Expired | ProjectileOutcome::Flying => {}
            }
        }
    }

    /// Camera offset used for drawing, truncated toward zero.
    pub(crate) fn render_scroll(&self) -> (i32, i32) {
        (self.scroll.x as i32, self.scroll.y as i32)
    }

    /// Composes the frame: background and clouds, outlined world layer,
    /// particles, then the transition iris.
    pub(crate) fn draw(&mut self, canvas: &mut Canvas) {
        let offset = self.render_scroll();

        canvas.fill(IRIS_COLOR);
        canvas.blit(&self.assets.background, 0, 0, false);
        self.clouds.render(canvas, &self.assets.clouds, offset);

        self.display.clear();
        self.tilemap
            .render(&mut self.display, &self.assets.tiles, offset);
        for enemy in &self.enemies {
            enemy.render(&mut self.display, &self.assets.gun, offset);
        }
        if self.dead == 0 {
            self.player.render(&mut self.display, offset);
        }
        for projectile in &self.effects.projectiles {
            projectile.render(&mut self.display, &self.assets.projectile, offset);
        }
        for spark in &self.effects.sparks {
            spark.render(&mut self.display, offset);
        }

        for (x, y) in OUTLINE_OFFSETS {
            canvas.blit_silhouette(&self.display, BlitOffset { x, y }, OUTLINE_COLOR);
        }

        for particle in &self.effects.particles {
            particle.render(&mut self.display, offset);
        }

        if self.transition != 0 {
            let radius = (TRANSITION_FRAMES - self.transition.abs()) as f64 * IRIS_SCALE;
            let center_x = (self.display.width() / 2) as f64;
            let center_y = (self.display.height() / 2) as f64;
            self.display
                .fill_outside_circle(center_x, center_y, radius, IRIS_COLOR);
        }

        canvas.blit_canvas(&self.display, BlitOffset::default());
    }

    /// Random jitter for the final blit, scaled by the current screenshake.
    /// Returned in canvas pixels.
    pub(crate) fn shake_offset(&mut self) -> BlitOffset {
        let strength = self.effects.screenshake as f64;
        if strength <= 0.0 {
            return BlitOffset::default();
        }
        let mut jitter =
            || (self.shake_rng.gen::<f64>() * strength - strength / 2.0) * SHAKE_SCALE;
        BlitOffset {
            x: jitter() as i32,
            y: jitter() as i32,
        }
    }

    pub(crate) fn level(&self) -> usize {
        self.level
    }

    pub(crate) fn level_count(&self) -> usize {
        self.catalog.len()
    }

    pub(crate) fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }
}

#[cfg(test)]
impl GameWorld {
    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub(crate) fn enemies_mut(&mut self) -> &mut Vec<Enemy> {
        &mut self.enemies
    }

    pub(crate) fn effects(&self) -> &Effects {
        &self.effects
    }

    pub(crate) fn effects_mut(&mut self) -> &mut Effects {
        &mut self.effects
    }

    pub(crate) fn dead(&self) -> u32 {
        self.dead
    }

    pub(crate) fn transition(&self) -> i32 {
        self.transition
    }

    pub(crate) fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub(crate) fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub(crate) fn leaf_spawners(&self) -> &[Rect] {
        &self.leaf_spawners
    }
}

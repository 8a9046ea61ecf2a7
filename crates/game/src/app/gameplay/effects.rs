use std::f64::consts::{FRAC_PI_2, PI, TAU};

use engine::{Canvas, Sprite, Vec2};
use rand::Rng;

use super::animation::{Animation, AnimationLibrary};
use super::projectile::Projectile;

pub(crate) const SPARK_DECAY_PER_TICK: f64 = 0.1;
const SPARK_COLOR: [u8; 4] = [255, 255, 255, 255];
const LEAF_SWAY_RATE: f64 = 0.035;
const LEAF_SWAY_AMPLITUDE: f64 = 0.3;
const BURST_COUNT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParticleKind {
    Leaf,
    Particle,
}

impl ParticleKind {
    pub(crate) fn animation_key(self) -> &'static str {
        match self {
            ParticleKind::Leaf => "particle/leaf",
            ParticleKind::Particle => "particle/particle",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub animation: Animation,
    /// Set on the tick the particle expires; it is drawn once more, then dropped.
    pub spent: bool,
}

impl Particle {
    pub(crate) fn new(
        kind: ParticleKind,
        pos: Vec2,
        velocity: Vec2,
        frame: u32,
        animations: &AnimationLibrary,
    ) -> Self {
        let mut animation = animations
            .animation(kind.animation_key())
            .unwrap_or_default();
        animation.set_frame(frame);
        Self {
            kind,
            pos,
            velocity,
            animation,
            spent: false,
        }
    }

    /// Advances one tick. Returns true when the particle should be removed;
    /// the check happens before the move, so the last frame still moves once.
    pub(crate) fn update(&mut self) -> bool {
        let kill = self.animation.done();
        self.pos += self.velocity;
        self.animation.update();
        if self.kind == ParticleKind::Leaf {
            self.pos.x += (self.animation.frame() as f64 * LEAF_SWAY_RATE).sin() * LEAF_SWAY_AMPLITUDE;
        }
        kill
    }

    /// Drawn centred on `pos`.
    pub(crate) fn render(&self, canvas: &mut Canvas, offset: (i32, i32)) {
        let Some(image) = self.animation.image() else {
            return;
        };
        let x = (self.pos.x - offset.0 as f64).floor() as i32 - image.width() as i32 / 2;
        let y = (self.pos.y - offset.1 as f64).floor() as i32 - image.height() as i32 / 2;
        canvas.blit(image, x, y, false);
    }
}

/// A short white streak that flies along `angle` and slows to a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Spark {
    pub pos: Vec2,
    pub angle: f64,
    pub speed: f64,
    pub spent: bool,
}

impl Spark {
    pub(crate) fn new(pos: Vec2, angle: f64, speed: f64) -> Self {
        Self {
            pos,
            angle,
            speed,
            spent: false,
        }
    }

    /// Returns true on the tick the spark's speed reaches zero.
    pub(crate) fn update(&mut self) -> bool {
        self.pos += Vec2::from_angle(self.angle, self.speed);
        self.speed = (self.speed - SPARK_DECAY_PER_TICK).max(0.0);
        self.speed <= 0.0
    }

    pub(crate) fn outline(&self, offset: (i32, i32)) -> [(f64, f64); 4] {
        let center = self.pos - Vec2::new(offset.0 as f64, offset.1 as f64);
        let point = |angle: f64, length: f64| {
            let tip = center + Vec2::from_angle(angle, length);
            (tip.x, tip.y)
        };
        [
            point(self.angle, self.speed * 3.0),
            point(self.angle + FRAC_PI_2, self.speed * 0.5),
            point(self.angle + PI, self.speed * 3.0),
            point(self.angle - FRAC_PI_2, self.speed * 0.5),
        ]
    }

    pub(crate) fn render(&self, canvas: &mut Canvas, offset: (i32, i32)) {
        canvas.fill_polygon(&self.outline(offset), SPARK_COLOR);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cloud {
    pub pos: Vec2,
    pub image: usize,
    pub speed: f64,
    pub depth: f64,
}

impl Cloud {
    /// Top-left draw position after parallax and wrap-around.
    pub(crate) fn screen_pos(&self, offset: (i32, i32), view: (u32, u32), image: &Sprite) -> (i32, i32) {
        let render_x = self.pos.x - offset.0 as f64 * self.depth;
        let render_y = self.pos.y - offset.1 as f64 * self.depth;
        let span_x = (view.0 + image.width()) as f64;
        let span_y = (view.1 + image.height()) as f64;
        (
            (render_x.rem_euclid(span_x) - image.width() as f64).floor() as i32,
            (render_y.rem_euclid(span_y) - image.height() as f64).floor() as i32,
        )
    }
}

/// Parallax cloud layer, ordered far to near.
#[derive(Debug, Clone, Default)]
pub(crate) struct Clouds {
    clouds: Vec<Cloud>,
}

impl Clouds {
    pub(crate) fn new(count: usize, image_count: usize, rng: &mut impl Rng) -> Self {
        if image_count == 0 {
            return Self::default();
        }
        let mut clouds: Vec<Cloud> = (0..count)
            .map(|_| Cloud {
                pos: Vec2::new(rng.gen::<f64>() * 99999.0, rng.gen::<f64>() * 99999.0),
                image: rng.gen_range(0..image_count),
                speed: rng.gen::<f64>() * 0.05 + 0.05,
                depth: rng.gen::<f64>() * 0.6 + 0.2,
            })
            .collect();
        clouds.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        Self { clouds }
    }

    #[cfg(test)]
    pub(crate) fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub(crate) fn update(&mut self) {
        for cloud in &mut self.clouds {
            cloud.pos.x += cloud.speed;
        }
    }

    pub(crate) fn render(&self, canvas: &mut Canvas, images: &[Sprite], offset: (i32, i32)) {
        let view = (canvas.width(), canvas.height());
        for cloud in &self.clouds {
            let Some(image) = images.get(cloud.image) else {
                continue;
            };
            let (x, y) = cloud.screen_pos(offset, view, image);
            canvas.blit(image, x, y, false);
        }
    }
}

/// Transient objects spawned by gameplay, plus the shared screenshake level.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub sparks: Vec<Spark>,
    pub screenshake: u32,
}

impl Effects {
    /// Raises screenshake to at least `amount`.
    pub(crate) fn shake(&mut self, amount: u32) {
        self.screenshake = self.screenshake.max(amount);
    }

    /// Drops sparks and particles that expired on the previous tick, then
    /// advances the rest. Anything expiring now stays listed until the next
    /// call so its final frame still gets drawn.
    pub(crate) fn update_sparks_and_particles(&mut self) {
        self.sparks.retain(|spark| !spark.spent);
        for spark in &mut self.sparks {
            spark.spent = spark.update();
        }
        self.particles.retain(|particle| !particle.spent);
        for particle in &mut self.particles {
            particle.spent = particle.update();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.projectiles.clear();
        self.particles.clear();
        self.sparks.clear();
    }

    /// Radial burst of sparks with particles flying the opposite way.
    pub(crate) fn burst(&mut self, center: Vec2, animations: &AnimationLibrary, rng: &mut impl Rng) {
        for _ in 0..BURST_COUNT {
            let angle = rng.gen::<f64>() * TAU;
            let speed = rng.gen::<f64>() * 5.0;
            self.sparks
                .push(Spark::new(center, angle, 2.0 + rng.gen::<f64>()));
            let frame = rng.gen_range(0..=7);
            self.particles.push(Particle::new(
                ParticleKind::Particle,
                center,
                Vec2::from_angle(angle + PI, speed * 0.5),
                frame,
                animations,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn library() -> AnimationLibrary {
        let frames: Rc<[Sprite]> = (0..3)
            .map(|_| Sprite::solid(4, 4, [255, 0, 0, 255]))
            .collect::<Vec<_>>()
            .into();
        let mut library = AnimationLibrary::default();
        library.insert("particle/particle", Animation::new(Rc::clone(&frames), 2, false));
        library.insert("particle/leaf", Animation::new(frames, 20, false));
        library
    }

    #[test]
    fn particle_moves_once_more_after_animation_finishes() {
        let library = library();
        let mut particle = Particle::new(
            ParticleKind::Particle,
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            0,
            &library,
        );

        let mut ticks = 0;
        while !particle.update() {
            ticks += 1;
            assert!(ticks < 100, "particle never expired");
        }

        // Done after 5 updates; the 6th update reports the kill.
        assert_eq!(ticks, 5);
        assert_eq!(particle.pos, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn particle_starts_at_requested_frame() {
        let library = library();
        let particle = Particle::new(
            ParticleKind::Particle,
            Vec2::ZERO,
            Vec2::ZERO,
            3,
            &library,
        );
        assert_eq!(particle.animation.frame(), 3);
    }

    #[test]
    fn leaf_sways_with_animation_frame() {
        let library = library();
        let mut leaf = Particle::new(
            ParticleKind::Leaf,
            Vec2::ZERO,
            Vec2::new(-0.1, 0.3),
            10,
            &library,
        );
        leaf.update();

        let expected_x = -0.1 + (11.0 * LEAF_SWAY_RATE).sin() * LEAF_SWAY_AMPLITUDE;
        assert!((leaf.pos.x - expected_x).abs() < 1e-12);
        assert!((leaf.pos.y - 0.3).abs() < 1e-12);
    }

    #[test]
    fn spark_decays_linearly_and_dies_at_zero_speed() {
        let mut spark = Spark::new(Vec2::ZERO, 0.0, 0.35);

        assert!(!spark.update());
        assert!(!spark.update());
        assert!(!spark.update());
        assert!(spark.update());
        assert_eq!(spark.speed, 0.0);
        assert!((spark.pos.x - (0.35 + 0.25 + 0.15 + 0.05)).abs() < 1e-9);
    }

    #[test]
    fn spark_outline_is_long_along_heading() {
        let spark = Spark::new(Vec2::new(10.0, 10.0), 0.0, 2.0);
        let outline = spark.outline((0, 0));

        assert!((outline[0].0 - 16.0).abs() < 1e-9);
        assert!((outline[2].0 - 4.0).abs() < 1e-9);
        assert!((outline[1].1 - 11.0).abs() < 1e-9);
        assert!((outline[3].1 - 9.0).abs() < 1e-9);
    }

    #[test]
    fn spark_render_draws_white_pixels() {
        let mut canvas = Canvas::new(32, 32);
        Spark::new(Vec2::new(16.0, 16.0), 0.0, 3.0).render(&mut canvas, (0, 0));
        assert_eq!(canvas.pixel(16, 16), Some(SPARK_COLOR));
    }

    #[test]
    fn clouds_are_sorted_by_depth_with_ranged_parameters() {
        let mut rng = StdRng::seed_from_u64(7);
        let clouds = Clouds::new(16, 2, &mut rng);

        assert_eq!(clouds.clouds().len(), 16);
        for pair in clouds.clouds().windows(2) {
            assert!(pair[0].depth <= pair[1].depth);
        }
        for cloud in clouds.clouds() {
            assert!((0.05..0.1).contains(&cloud.speed));
            assert!((0.2..0.8).contains(&cloud.depth));
            assert!(cloud.image < 2);
        }
    }

    #[test]
    fn clouds_drift_right_by_their_speed() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut clouds = Clouds::new(3, 1, &mut rng);
        let before: Vec<f64> = clouds.clouds().iter().map(|cloud| cloud.pos.x).collect();

        clouds.update();

        for (cloud, x) in clouds.clouds().iter().zip(before) {
            assert!((cloud.pos.x - (x + cloud.speed)).abs() < 1e-9);
        }
    }

    #[test]
    fn cloud_position_wraps_with_parallax() {
        let image = Sprite::solid(20, 10, [255, 255, 255, 255]);
        let cloud = Cloud {
            pos: Vec2::new(350.0, 5.0),
            image: 0,
            speed: 0.05,
            depth: 0.5,
        };

        // 350 - 100 * 0.5 = 300, inside the 340 wide wrap span.
        assert_eq!(cloud.screen_pos((100, 0), (320, 240), &image), (280, -5));
        // 350 - 0 = 350 wraps to 10.
        assert_eq!(cloud.screen_pos((0, 0), (320, 240), &image), (-10, -5));
    }

    #[test]
    fn no_cloud_images_means_no_clouds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Clouds::new(16, 0, &mut rng).clouds().is_empty());
    }

    #[test]
    fn burst_spawns_matching_sparks_and_particles() {
        let library = library();
        let mut rng = StdRng::seed_from_u64(3);
        let mut effects = Effects::default();

        effects.burst(Vec2::new(5.0, 5.0), &library, &mut rng);

        assert_eq!(effects.sparks.len(), BURST_COUNT);
        assert_eq!(effects.particles.len(), BURST_COUNT);
        for spark in &effects.sparks {
            assert!((2.0..3.0).contains(&spark.speed));
            assert_eq!(spark.pos, Vec2::new(5.0, 5.0));
        }
    }

    #[test]
    fn expired_effects_are_kept_for_one_more_draw() {
        let library = library();
        let mut effects = Effects::default();
        effects.sparks.push(Spark::new(Vec2::ZERO, 0.0, 0.05));
        effects.sparks.push(Spark::new(Vec2::ZERO, 0.0, 0.15));
        effects.sparks.push(Spark::new(Vec2::ZERO, 0.0, 3.0));
        let mut particle =
            Particle::new(ParticleKind::Particle, Vec2::ZERO, Vec2::ZERO, 0, &library);
        while !particle.animation.done() {
            particle.animation.update();
        }
        effects.particles.push(particle);

        effects.update_sparks_and_particles();
        let spent: Vec<bool> = effects.sparks.iter().map(|spark| spark.spent).collect();
        assert_eq!(spent, vec![true, false, false]);
        assert_eq!(effects.particles.len(), 1);
        assert!(effects.particles[0].spent);

        effects.update_sparks_and_particles();
        let spent: Vec<bool> = effects.sparks.iter().map(|spark| spark.spent).collect();
        assert_eq!(spent, vec![true, false]);
        assert!(effects.particles.is_empty());

        effects.update_sparks_and_particles();
        assert_eq!(effects.sparks.len(), 1);
        assert!((effects.sparks[0].speed - 2.7).abs() < 1e-9);
    }

    #[test]
    fn shake_never_lowers_screenshake() {
        let mut effects = Effects::default();
        effects.shake(20);
        effects.shake(5);
        assert_eq!(effects.screenshake, 20);
    }
}

use std::ops::{Add, AddAssign, Mul, Sub};

use super::input::{ActionStates, InputAction};
use super::rendering::{BlitOffset, Canvas};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Input as seen by one simulation tick.
///
/// `is_down` reports held keys. `pressed` reports a press edge and is true
/// for exactly one tick per physical key press.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, held: ActionStates, pressed: ActionStates) -> Self {
        Self {
            quit_requested,
            held,
            pressed,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.pressed.set(action, pressed);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_angle(angle: f64, length: f64) -> Self {
        Self {
            x: angle.cos() * length,
            y: angle.sin() * length,
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// A game driven by the fixed-timestep loop in [`crate::run_app`].
pub trait Scene {
    /// Advances the simulation by exactly one fixed tick.
    fn update(&mut self, input: &InputSnapshot) -> SceneCommand;
    /// Draws the current state into the logical canvas.
    fn render(&mut self, canvas: &mut Canvas);
    /// Offset applied when the canvas is copied to the window (screenshake).
    fn present_offset(&mut self) -> BlitOffset {
        BlitOffset::default()
    }
    fn unload(&mut self) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}

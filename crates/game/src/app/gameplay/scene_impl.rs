use engine::{BlitOffset, Canvas, InputAction, InputSnapshot, Scene, SceneCommand};
use tracing::info;

use super::world::{GameWorld, PlayerIntent};

impl PlayerIntent {
    pub(crate) fn from_input(input: &InputSnapshot) -> Self {
        let right = f64::from(u8::from(input.is_down(InputAction::MoveRight)));
        let left = f64::from(u8::from(input.is_down(InputAction::MoveLeft)));
        Self {
            movement_x: right - left,
            jump: input.pressed(InputAction::Jump),
            dash: input.pressed(InputAction::Dash),
        }
    }
}

impl Scene for GameWorld {
    fn update(&mut self, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        self.tick(PlayerIntent::from_input(input));
        SceneCommand::None
    }

    fn render(&mut self, canvas: &mut Canvas) {
        self.draw(canvas);
    }

    fn present_offset(&mut self) -> BlitOffset {
        self.shake_offset()
    }

    fn unload(&mut self) {
        info!(level = self.level(), "world_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!(
            "level {}/{} | enemies {}",
            self.level() + 1,
            self.level_count(),
            self.enemies().len()
        ))
    }
}

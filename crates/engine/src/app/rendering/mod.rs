mod canvas;
mod renderer;

pub use canvas::{BlitOffset, Canvas};
pub(crate) use renderer::Renderer;

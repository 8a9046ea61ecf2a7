use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use super::{BlitOffset, Canvas};

/// Presents the fixed-size logical canvas, scaled to fit the window.
pub(crate) struct Renderer {
    pixels: Pixels<'static>,
    canvas: Canvas,
}

impl Renderer {
    pub(crate) fn new(
        window: Arc<Window>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(canvas_width, canvas_height, surface)?;
        Ok(Self {
            pixels,
            canvas: Canvas::new(canvas_width, canvas_height),
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub(crate) fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub(crate) fn present(&mut self, offset: BlitOffset) -> Result<(), Error> {
        self.canvas.copy_to_frame(self.pixels.frame_mut(), offset);
        self.pixels.render()
    }
}

mod atomic_io;
mod images;

pub use atomic_io::write_text_atomic;
pub use images::{load_image, load_images, ImageLoadError, Sprite, COLOR_KEY};

use std::collections::HashMap;
use std::rc::Rc;

use engine::Sprite;

pub(crate) const DEFAULT_IMAGE_DURATION: u32 = 5;

/// Frame cursor over a shared image sequence.
///
/// Cloning (or [`Animation::copy`]) never duplicates image data; every owner
/// only carries its own `frame` and `done` state.
#[derive(Debug, Clone)]
pub(crate) struct Animation {
    images: Rc<[Sprite]>,
    image_duration: u32,
    looping: bool,
    frame: u32,
    done: bool,
}

impl Default for Animation {
    fn default() -> Self {
        Self::new(Rc::from(Vec::new()), DEFAULT_IMAGE_DURATION, true)
    }
}

impl Animation {
    pub(crate) fn new(images: Rc<[Sprite]>, image_duration: u32, looping: bool) -> Self {
        Self {
            images,
            image_duration: image_duration.max(1),
            looping,
            frame: 0,
            done: false,
        }
    }

    /// Fresh cursor (frame 0, not done) over the same images and timing.
    pub(crate) fn copy(&self) -> Self {
        Self::new(Rc::clone(&self.images), self.image_duration, self.looping)
    }

    fn total_frames(&self) -> u32 {
        self.images.len() as u32 * self.image_duration
    }

    pub(crate) fn update(&mut self) {
        let total = self.total_frames();
        if total == 0 {
            return;
        }
        if self.looping {
            self.frame = (self.frame + 1) % total;
        } else {
            self.frame = (self.frame + 1).min(total - 1);
            if self.frame >= total - 1 {
                self.done = true;
            }
        }
    }

    pub(crate) fn image(&self) -> Option<&Sprite> {
        self.images.get((self.frame / self.image_duration) as usize)
    }

    pub(crate) fn frame(&self) -> u32 {
        self.frame
    }

    pub(crate) fn done(&self) -> bool {
        self.done
    }

    #[cfg(test)]
    pub(crate) fn looping(&self) -> bool {
        self.looping
    }

    /// Jumps to `frame`, clamped to the last frame of the sequence.
    pub(crate) fn set_frame(&mut self, frame: u32) {
        self.frame = frame.min(self.total_frames().saturating_sub(1));
    }

    #[cfg(test)]
    pub(crate) fn shares_images_with(&self, other: &Animation) -> bool {
        Rc::ptr_eq(&self.images, &other.images)
    }
}

/// Animation templates keyed by `"<owner>/<action>"`, e.g. `player/run`.
#[derive(Debug, Default)]
pub(crate) struct AnimationLibrary {
    templates: HashMap<String, Animation>,
}

impl AnimationLibrary {
    pub(crate) fn insert(&mut self, key: impl Into<String>, animation: Animation) {
        self.templates.insert(key.into(), animation);
    }

    /// A fresh cursor for `key`, or `None` when no template is registered.
    pub(crate) fn animation(&self, key: &str) -> Option<Animation> {
        self.templates.get(key).map(Animation::copy)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.templates.len()
    }
}

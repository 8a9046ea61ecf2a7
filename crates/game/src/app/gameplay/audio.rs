use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SoundCue {
    Jump,
    Dash,
    Shoot,
    Hit,
    /// Background track, looped from startup.
    Music,
    /// Wind bed, looped from startup.
    Ambience,
}

impl SoundCue {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SoundCue::Jump => "jump",
            SoundCue::Dash => "dash",
            SoundCue::Shoot => "shoot",
            SoundCue::Hit => "hit",
            SoundCue::Music => "music",
            SoundCue::Ambience => "ambience",
        }
    }

    /// Mixer volume the cue is meant to be played at.
    pub(crate) fn volume(self) -> f32 {
        match self {
            SoundCue::Jump => 0.7,
            SoundCue::Dash => 0.3,
            SoundCue::Shoot => 0.4,
            SoundCue::Hit => 0.8,
            SoundCue::Music => 0.5,
            SoundCue::Ambience => 0.2,
        }
    }

    /// Looping cues play until shutdown instead of once.
    pub(crate) fn is_loop(self) -> bool {
        matches!(self, SoundCue::Music | SoundCue::Ambience)
    }
}

pub(crate) trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Sink that only records cues in the trace log.
#[derive(Debug, Default)]
pub(crate) struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&mut self, cue: SoundCue) {
        debug!(
            cue = cue.as_str(),
            volume = cue.volume(),
            looping = cue.is_loop(),
            "sound_cue"
        );
    }
}

/// Test sink whose clones share one cue log.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingAudio {
    cues: std::rc::Rc<std::cell::RefCell<Vec<SoundCue>>>,
}

#[cfg(test)]
impl RecordingAudio {
    pub(crate) fn cues(&self) -> Vec<SoundCue> {
        self.cues.borrow().clone()
    }

    /// Cues without the startup loops.
    pub(crate) fn one_shot_cues(&self) -> Vec<SoundCue> {
        self.cues()
            .into_iter()
            .filter(|cue| !cue.is_loop())
            .collect()
    }
}

#[cfg(test)]
impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.cues.borrow_mut().push(cue);
    }
}

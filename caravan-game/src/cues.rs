//! Fire-and-forget sound cues emitted by the simulation.
//!
//! The core never touches an audio device. It queues one [`SoundCue`] per
//! qualifying event and the host drains them into whatever [`CueSink`] owns the
//! audio subsystem.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    Collision,
    Trade,
    Onboard,
    Hurt,
    GameOver,
    Victory,
    Select,
    Confirm,
}

impl SoundCue {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::Trade => "trade",
            Self::Onboard => "onboard",
            Self::Hurt => "hurt",
            Self::GameOver => "gameover",
            Self::Victory => "victory",
            Self::Select => "select",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver for cues; implemented by the audio collaborator.
pub trait CueSink {
    fn play(&mut self, cue: SoundCue);
}

impl CueSink for Vec<SoundCue> {
    fn play(&mut self, cue: SoundCue) {
        self.push(cue);
    }
}

/// Ordered outbox of cues not yet delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueQueue {
    pending: VecDeque<SoundCue>,
}

impl CueQueue {
    pub fn emit(&mut self, cue: SoundCue) {
        log::trace!("cue {cue}");
        self.pending.push_back(cue);
    }

    /// Deliver every pending cue in emission order.
    pub fn drain_into(&mut self, sink: &mut dyn CueSink) {
        while let Some(cue) = self.pending.pop_front() {
            sink.play(cue);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundCue> {
        self.pending.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

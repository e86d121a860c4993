use crate::model::song::LightCue;
use anyhow::anyhow;

mod console;
mod synchronizer;

pub use console::ConsoleEngine;
pub use synchronizer::*;

/// The output devices a performance drives: a tone generator, a character display
/// and four lamps. Implementations must not block; the player calls them from its poll loop.
pub trait Engine: Send + Sync {
    /// Start sounding `note.pitch`, holding it for `note.hold_ms()`.
    fn tone(&self, note: &NoteDue) -> anyhow::Result<()>;

    /// Stop the voice of `note.track`; the other tracks keep sounding.
    fn silence(&self, note: &NoteDue) -> anyhow::Result<()>;

    /// Stop every voice.
    fn silence_all(&self) -> anyhow::Result<()>;

    /// Show the (pre-split) title lines at song start.
    fn title(&self, lines: &[String]) -> anyhow::Result<()>;

    /// Reveal the next lyric characters of one track.
    fn reveal(&self, lyric: &LyricDue) -> anyhow::Result<()>;

    fn lights(&self, cue: LightCue) -> anyhow::Result<()>;

    fn all_off(&self) -> anyhow::Result<()> {
        self.silence_all()?;
        self.lights(LightCue::OFF)
    }

    fn dispatch(&self, cue: &Cue) -> anyhow::Result<()> {
        match cue {
            Cue::Note(note) if note.pitch.is_rest() => self.silence(note),
            Cue::Note(note) => {
                if note.hold_ms() == 0 {
                    return Err(anyhow!(
                        "Note {} of track {} has nothing to hold..!",
                        note.index,
                        note.track
                    ));
                }

                self.tone(note)
            }
            Cue::Light(light) => self.lights(light.cue),
            Cue::Lyric(lyric) => self.reveal(lyric),
        }
    }
}

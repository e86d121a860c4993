use crate::engine::{Engine, LyricDue, NoteDue};
use crate::model::song::{LightCue, Pitch};
use crate::util::DISPLAY_WIDTH;
use anyhow::{Result, bail};
use log::{debug, info};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Renders a performance to the log: one scrolling display row per vocal track,
/// a lamp strip and a line per tone.
#[derive(Debug, Default)]
pub struct ConsoleEngine {
    rows: Mutex<Vec<VecDeque<char>>>,
    voices: Mutex<Vec<Option<Pitch>>>,
}

impl ConsoleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of a track's display row, padded to the display width.
    pub fn row(&self, track: usize) -> Option<String> {
        let rows = self.rows.lock().ok()?;
        rows.get(track).map(|row| {
            let text: String = row.iter().collect();
            format!("{:<width$}", text, width = DISPLAY_WIDTH)
        })
    }

    /// Pitch a track's voice was last told to sound, if it has not been silenced since.
    pub fn sounding(&self, track: usize) -> Option<Pitch> {
        let voices = self.voices.lock().ok()?;
        voices.get(track).copied().flatten()
    }

    fn set_voice(&self, track: usize, pitch: Option<Pitch>) -> Result<()> {
        let Ok(mut voices) = self.voices.lock() else {
            bail!("Failed to lock voices..!");
        };

        if voices.len() <= track {
            voices.resize(track + 1, None);
        }
        voices[track] = pitch;

        Ok(())
    }

    fn scroll(row: &mut VecDeque<char>, text: &str) {
        for c in text.chars() {
            if row.len() == DISPLAY_WIDTH {
                row.pop_front();
            }
            row.push_back(c);
        }
    }
}

impl Engine for ConsoleEngine {
    fn tone(&self, note: &NoteDue) -> Result<()> {
        info!(
            "tone  | track {} #{:<3} | {:>4} {:>5}Hz | hold {:>5}ms (+{}ms liaison)",
            note.track,
            note.index,
            note.pitch.to_string(),
            note.pitch.frequency_hz().unwrap_or(0),
            note.hold_ms(),
            note.release_ms - note.end_ms()
        );
        self.set_voice(note.track, Some(note.pitch))
    }

    fn silence(&self, note: &NoteDue) -> Result<()> {
        debug!("tone  | track {} #{:<3} | rest", note.track, note.index);
        self.set_voice(note.track, None)
    }

    fn silence_all(&self) -> Result<()> {
        debug!("tone  | silence");

        let Ok(mut voices) = self.voices.lock() else {
            bail!("Failed to lock voices..!");
        };
        voices.iter_mut().for_each(|voice| *voice = None);

        Ok(())
    }

    fn title(&self, lines: &[String]) -> Result<()> {
        let Ok(mut rows) = self.rows.lock() else {
            bail!("Failed to lock display rows..!");
        };
        rows.clear();

        for line in lines {
            info!("title | {:<width$} |", line, width = DISPLAY_WIDTH);
        }

        Ok(())
    }

    fn reveal(&self, lyric: &LyricDue) -> Result<()> {
        let Ok(mut rows) = self.rows.lock() else {
            bail!("Failed to lock display rows..!");
        };

        if rows.len() <= lyric.track {
            rows.resize_with(lyric.track + 1, VecDeque::new);
        }

        let row = &mut rows[lyric.track];
        Self::scroll(row, lyric.text);

        let shown: String = row.iter().collect();
        info!(
            "lyric | track {} | {:<width$} |",
            lyric.track,
            shown,
            width = DISPLAY_WIDTH
        );

        Ok(())
    }

    fn lights(&self, cue: LightCue) -> Result<()> {
        let strip: String = cue
            .channels()
            .iter()
            .map(|on| if *on { '*' } else { '.' })
            .collect();

        info!("light | [{}]", strip);
        Ok(())
    }
}

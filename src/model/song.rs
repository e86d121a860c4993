use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STN: f32 = 1.0 / 4.0;
pub const ETH: f32 = 2.0 / 4.0;
pub const DET: f32 = 3.0 / 4.0;
pub const QTR: f32 = 1.0;
pub const DQT: f32 = 1.5;
pub const HLF: f32 = 2.0;
pub const DHF: f32 = 3.0;
pub const WHL: f32 = 4.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// What a note plays: silence, or an equal-tempered pitch identified by its MIDI number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pitch {
    Rest,
    Note(u8),
}

impl Pitch {
    pub const fn note(midi: u8) -> Self {
        Pitch::Note(midi)
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Pitch::Rest)
    }

    pub fn midi(&self) -> Option<u8> {
        match self {
            Pitch::Rest => None,
            Pitch::Note(midi) => Some(*midi),
        }
    }

    /// Frequency the tone driver should toggle at, rounded to whole Hz (A4 = 440 Hz).
    pub fn frequency_hz(&self) -> Option<u16> {
        self.midi().map(|midi| {
            let semitones = midi as f64 - 69.0;
            (440.0 * 2f64.powf(semitones / 12.0)).round() as u16
        })
    }

    /// Parses note names as they appear in score tables: `C4`, `Db4`, `F#5`, `FS4`, plus `REST`/`R`/`-`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();

        if matches!(name.to_ascii_uppercase().as_str(), "REST" | "R" | "-") {
            return Some(Pitch::Rest);
        }

        let mut chars = name.chars().peekable();
        let semitone: i32 = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let accidental = match chars.peek() {
            Some('b') => -1,
            Some('#') | Some('S') | Some('s') => 1,
            _ => 0,
        };
        if accidental != 0 {
            chars.next();
        }

        let octave: String = chars.collect();
        if octave.is_empty() || !octave.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let octave: i32 = octave.parse().ok()?;

        let midi = octave
            .checked_add(1)?
            .checked_mul(12)?
            .checked_add(semitone + accidental)?;
        u8::try_from(midi).ok().filter(|m| *m <= 127).map(Pitch::Note)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Rest => write!(f, "rest"),
            Pitch::Note(midi) => {
                let octave = (*midi as i32 / 12) - 1;
                write!(f, "{}{}", NOTE_NAMES[(*midi % 12) as usize], octave)
            }
        }
    }
}

/// One entry of a track. `beats` and `liaison` are multiples of one beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub pitch: Pitch,
    pub beats: f32,
    pub liaison: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub(crate) notes: Vec<NoteEvent>,
    pub(crate) start_delay_ms: u64,
    pub(crate) lyric_scroll_ms: u32,
    pub(crate) lyric: Option<String>,
}

impl Track {
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn start_delay_ms(&self) -> u64 {
        self.start_delay_ms
    }

    pub fn lyric_scroll_ms(&self) -> u32 {
        self.lyric_scroll_ms
    }

    pub fn lyric(&self) -> Option<&str> {
        self.lyric.as_deref()
    }

    /// Total length of the track's notes, in beats.
    pub fn total_beats(&self) -> f64 {
        self.notes.iter().map(|n| n.beats as f64).sum()
    }
}

/// Four lamps packed into the low nibble; bit 0 is the first lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightCue(u8);

impl LightCue {
    pub const CHANNELS: usize = 4;
    pub const OFF: LightCue = LightCue(0);

    pub fn from_channels(channels: [bool; 4]) -> Self {
        let bits = channels
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, on)| if *on { acc | (1 << i) } else { acc });

        LightCue(bits)
    }

    pub fn channels(&self) -> [bool; 4] {
        [self.is_on(0), self.is_on(1), self.is_on(2), self.is_on(3)]
    }

    pub fn is_on(&self, channel: usize) -> bool {
        channel < Self::CHANNELS && self.0 & (1 << channel) != 0
    }
}

impl fmt::Display for LightCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for on in self.channels() {
            write!(f, "{}", if on { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// Light cues keyed to melody note indices. Only built by catalog validation, which
/// guarantees one cue per melody note.
#[derive(Debug, Clone, PartialEq)]
pub struct LightCueTable {
    cues: Vec<LightCue>,
}

impl LightCueTable {
    pub(crate) fn new(cues: Vec<LightCue>) -> Self {
        Self { cues }
    }

    pub fn for_melody_note(&self, index: usize) -> Option<LightCue> {
        self.cues.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// A validated song. Track 0 is the melody and the timing reference for the light cues.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub(crate) title: Vec<String>,
    pub(crate) bpm: u32,
    pub(crate) tracks: Vec<Track>,
    pub(crate) lights: LightCueTable,
}

impl Song {
    pub fn title(&self) -> &[String] {
        &self.title
    }

    /// Title lines joined into one line, for prompts and logs.
    pub fn name(&self) -> String {
        self.title
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn melody(&self) -> &Track {
        &self.tracks[0]
    }

    pub fn lights(&self) -> &LightCueTable {
        &self.lights
    }

    pub fn beat_duration_ms(&self) -> Result<u64, ScoreError> {
        debug_assert!(self.bpm > 0, "validated songs always have a positive tempo");

        if self.bpm == 0 {
            return Err(ScoreError::InvalidTempo { bpm: self.bpm });
        }

        Ok(60_000 / self.bpm as u64)
    }
}

/// Song titles may be given as display lines or as one string to be wrapped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TitleDef {
    Lines(Vec<String>),
    Single(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PitchDef {
    Midi(u8),
    Name(String),
}

/// Unvalidated track as authored: parallel pitch/duration/liaison columns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackDef {
    /// Declared note count; defaults to the number of pitches.
    #[serde(default)]
    pub notes: Option<usize>,

    #[serde(default)]
    pub start_delay_ms: u64,

    #[serde(default = "default_lyric_scroll_ms")]
    pub lyric_scroll_ms: u32,

    pub pitches: Vec<PitchDef>,

    pub durations: Vec<f32>,

    /// Missing liaisons mean every note is released exactly at its end.
    #[serde(default)]
    pub liaisons: Option<Vec<f32>>,

    #[serde(default)]
    pub lyrics: Option<String>,
}

fn default_lyric_scroll_ms() -> u32 {
    200
}

impl TrackDef {
    pub fn from_tables(
        pitches: &[&str],
        durations: &[f32],
        liaisons: &[f32],
        start_delay_ms: u64,
        lyric_scroll_ms: u32,
        lyrics: Option<&str>,
    ) -> Self {
        Self {
            notes: Some(pitches.len()),
            start_delay_ms,
            lyric_scroll_ms,
            pitches: pitches
                .iter()
                .map(|name| PitchDef::Name(name.to_string()))
                .collect(),
            durations: durations.to_vec(),
            liaisons: Some(liaisons.to_vec()),
            lyrics: lyrics.map(String::from),
        }
    }
}

/// Unvalidated song as authored in a song file or a compiled-in table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SongDef {
    pub title: TitleDef,
    pub bpm: u32,
    pub tracks: Vec<TrackDef>,
    #[serde(default)]
    pub lights: Vec<[u8; 4]>,
}

impl SongDef {
    pub fn display_name(&self) -> String {
        match &self.title {
            TitleDef::Single(title) => title.trim().to_string(),
            TitleDef::Lines(lines) => lines
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

use thiserror::Error;

/// The invariant a song definition broke during validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Malformation {
    #[error("song has no tracks")]
    NoTracks,

    #[error("tempo must be between 1 and 60000 bpm, got {bpm}")]
    Tempo { bpm: u32 },

    #[error("track {track} declares {declared} notes but has {pitches} pitches, {durations} durations and {liaisons} liaisons")]
    TrackLength {
        track: usize,
        declared: usize,
        pitches: usize,
        durations: usize,
        liaisons: usize,
    },

    #[error("light cue table has {lights} entries but the melody has {notes} notes")]
    LightCueLength { lights: usize, notes: usize },

    #[error("track {track} has {notes} notes, more than the melody's {melody}")]
    MelodyNotLongest {
        track: usize,
        notes: usize,
        melody: usize,
    },

    #[error("track {track} note {note} has an invalid duration of {beats} beats")]
    Duration { track: usize, note: usize, beats: f32 },

    #[error("track {track} note {note} has liaison {liaison} outside [0, {max}] beats")]
    Liaison {
        track: usize,
        note: usize,
        liaison: f32,
        max: f32,
    },

    #[error("track {track} note {note} has unknown pitch '{name}'")]
    Pitch {
        track: usize,
        note: usize,
        name: String,
    },

    #[error("track {track} has lyrics but a scroll delay of 0ms")]
    LyricScroll { track: usize },

    #[error("track {track} runs past the end of the playback clock")]
    Timeline { track: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("song index {index} is out of range (catalog holds {count} songs)")]
    OutOfRange { index: usize, count: usize },

    #[error("song '{song}' is malformed: {reason}")]
    MalformedSong { song: String, reason: Malformation },

    #[error("invalid tempo of {bpm} bpm")]
    InvalidTempo { bpm: u32 },

    #[error("clock went backwards from {previous_ms}ms to {now_ms}ms")]
    ClockRegression { previous_ms: u64, now_ms: u64 },
}

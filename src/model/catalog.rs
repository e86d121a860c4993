use crate::error::{Malformation, ScoreError};
use crate::model::builtin::builtin_song_defs;
use crate::model::song::*;
use crate::util::{DISPLAY_WIDTH, wrap_title};
use log::{debug, info, warn};
use std::sync::{Arc, OnceLock};

const MAX_BPM: u32 = 60_000;

/// How validation treats a liaison that reaches past the end of the following note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiaisonPolicy {
    /// Cap the liaison at `duration + next duration` and keep the song.
    #[default]
    Clamp,

    /// Reject the song as malformed.
    Strict,

    /// Keep the authored value, so the release may overlap several later notes.
    Free,
}

/// The read-only set of playable songs. Songs failing validation never make it in;
/// their diagnostics are kept in `rejected()`.
#[derive(Debug, Default)]
pub struct Catalog {
    songs: Vec<Arc<Song>>,
    rejected: Vec<ScoreError>,
}

impl Catalog {
    pub fn new(defs: Vec<SongDef>, policy: LiaisonPolicy) -> Self {
        let mut songs = Vec::with_capacity(defs.len());
        let mut rejected = Vec::new();

        for def in defs.into_iter() {
            match validate_song(def, policy) {
                Ok(song) => {
                    debug!(
                        "Validated song '{}' with {} tracks at {} bpm..!",
                        song.name(),
                        song.tracks().len(),
                        song.bpm()
                    );
                    songs.push(Arc::new(song));
                }
                Err(why) => {
                    warn!("Excluding song from the catalog: {}..!", why);
                    rejected.push(why);
                }
            }
        }

        info!(
            "Catalog ready with {} song(s), {} rejected..!",
            songs.len(),
            rejected.len()
        );

        Self { songs, rejected }
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }

    pub fn song(&self, index: usize) -> Result<&Arc<Song>, ScoreError> {
        self.songs.get(index).ok_or(ScoreError::OutOfRange {
            index,
            count: self.songs.len(),
        })
    }

    pub fn beat_duration_ms(&self, song: &Song) -> Result<u64, ScoreError> {
        song.beat_duration_ms()
    }

    pub fn songs(&self) -> impl Iterator<Item = &Arc<Song>> {
        self.songs.iter()
    }

    pub fn rejected(&self) -> &[ScoreError] {
        &self.rejected
    }
}

/// The compiled-in songs, validated once with the default liaison policy.
pub fn builtin_catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| Catalog::new(builtin_song_defs(), LiaisonPolicy::default()))
}

pub fn validate_song(def: SongDef, policy: LiaisonPolicy) -> Result<Song, ScoreError> {
    let name = def.display_name();
    let malformed = |reason: Malformation| ScoreError::MalformedSong {
        song: name.clone(),
        reason,
    };

    if def.bpm == 0 || def.bpm > MAX_BPM {
        return Err(malformed(Malformation::Tempo { bpm: def.bpm }));
    }

    if def.tracks.is_empty() {
        return Err(malformed(Malformation::NoTracks));
    }

    let mut tracks = Vec::with_capacity(def.tracks.len());
    for (index, track) in def.tracks.into_iter().enumerate() {
        let track = validate_track(index, track, policy, &name).map_err(&malformed)?;
        tracks.push(track);
    }

    let melody = tracks[0].len();
    if let Some((index, track)) = tracks
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, track)| track.len() > melody)
    {
        return Err(malformed(Malformation::MelodyNotLongest {
            track: index,
            notes: track.len(),
            melody,
        }));
    }

    let beat_ms = 60_000 / def.bpm as u64;
    if let Some(index) = tracks
        .iter()
        .position(|track| track_end_ms(track, beat_ms).is_none())
    {
        return Err(malformed(Malformation::Timeline { track: index }));
    }

    if def.lights.len() != melody {
        return Err(malformed(Malformation::LightCueLength {
            lights: def.lights.len(),
            notes: melody,
        }));
    }

    let lights = def
        .lights
        .iter()
        .map(|channels| LightCue::from_channels(channels.map(|c| c != 0)))
        .collect();

    let title = match def.title {
        TitleDef::Single(title) => wrap_title(&title, DISPLAY_WIDTH),
        TitleDef::Lines(lines) => lines
            .iter()
            .flat_map(|line| {
                if line.chars().count() > DISPLAY_WIDTH {
                    wrap_title(line, DISPLAY_WIDTH)
                } else {
                    vec![line.clone()]
                }
            })
            .collect(),
    };

    Ok(Song {
        title,
        bpm: def.bpm,
        tracks,
        lights: LightCueTable::new(lights),
    })
}

/// Latest elapsed time a track can produce: its furthest release or its last lyric
/// character, whichever is later. `None` when that does not fit the ms clock.
fn track_end_ms(track: &Track, beat_ms: u64) -> Option<u64> {
    let longest_liaison = track
        .notes()
        .iter()
        .map(|note| note.liaison as f64)
        .fold(0.0, f64::max);

    let span = ((track.total_beats() + longest_liaison) * beat_ms as f64).round();
    if !span.is_finite() || span >= u64::MAX as f64 {
        return None;
    }
    let notes_end = track.start_delay_ms().checked_add(span as u64)?;

    let lyric_end = match track.lyric() {
        Some(text) => (text.chars().count() as u64)
            .checked_mul(track.lyric_scroll_ms() as u64)?
            .checked_add(track.start_delay_ms())?,
        None => 0,
    };

    Some(notes_end.max(lyric_end))
}

fn validate_track(
    index: usize,
    def: TrackDef,
    policy: LiaisonPolicy,
    song_name: &str,
) -> Result<Track, Malformation> {
    let declared = def.notes.unwrap_or(def.pitches.len());
    let liaisons = def
        .liaisons
        .unwrap_or_else(|| vec![0.0; def.pitches.len()]);

    if def.pitches.len() != declared
        || def.durations.len() != declared
        || liaisons.len() != declared
    {
        return Err(Malformation::TrackLength {
            track: index,
            declared,
            pitches: def.pitches.len(),
            durations: def.durations.len(),
            liaisons: liaisons.len(),
        });
    }

    let lyric = def.lyrics.filter(|text| !text.is_empty());
    if lyric.is_some() && def.lyric_scroll_ms == 0 {
        return Err(Malformation::LyricScroll { track: index });
    }

    let mut notes = Vec::with_capacity(declared);
    for (n, (pitch, &beats)) in def.pitches.iter().zip(def.durations.iter()).enumerate() {
        let pitch = match pitch {
            PitchDef::Midi(midi) if *midi <= 127 => Pitch::note(*midi),
            PitchDef::Midi(midi) => {
                return Err(Malformation::Pitch {
                    track: index,
                    note: n,
                    name: midi.to_string(),
                });
            }
            PitchDef::Name(name) => Pitch::from_name(name).ok_or_else(|| Malformation::Pitch {
                track: index,
                note: n,
                name: name.clone(),
            })?,
        };

        if !beats.is_finite() || beats < 0.0 {
            return Err(Malformation::Duration {
                track: index,
                note: n,
                beats,
            });
        }

        let next_beats = def.durations.get(n + 1).copied().unwrap_or(0.0).max(0.0);
        let max = beats + next_beats;
        let mut liaison = liaisons[n];

        if !liaison.is_finite() || liaison < 0.0 {
            return Err(Malformation::Liaison {
                track: index,
                note: n,
                liaison,
                max,
            });
        }

        if liaison > max {
            match policy {
                LiaisonPolicy::Strict => {
                    return Err(Malformation::Liaison {
                        track: index,
                        note: n,
                        liaison,
                        max,
                    });
                }
                LiaisonPolicy::Clamp => {
                    warn!(
                        "Clamping liaison of '{}' track {} note {} from {} to {} beats..!",
                        song_name, index, n, liaison, max
                    );
                    liaison = max;
                }
                LiaisonPolicy::Free => {
                    debug!(
                        "Keeping long liaison of '{}' track {} note {} ({} beats)..!",
                        song_name, index, n, liaison
                    );
                }
            }
        }

        notes.push(NoteEvent {
            pitch,
            beats,
            liaison,
        });
    }

    Ok(Track {
        notes,
        start_delay_ms: def.start_delay_ms,
        lyric_scroll_ms: def.lyric_scroll_ms,
        lyric,
    })
}

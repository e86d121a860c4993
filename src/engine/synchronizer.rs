use crate::error::ScoreError;
use crate::model::song::{LightCue, Pitch, Song};
use log::{error, trace};

/// A note whose onset has been reached. All times are elapsed ms since song start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteDue {
    pub track: usize,
    pub index: usize,
    pub pitch: Pitch,
    pub onset_ms: u64,
    pub duration_ms: u64,
    /// End of the note extended by its liaison. Never earlier than `onset_ms + duration_ms`.
    pub release_ms: u64,
}

impl NoteDue {
    pub fn end_ms(&self) -> u64 {
        self.onset_ms.saturating_add(self.duration_ms)
    }

    /// How long the tone driver should hold the pitch, liaison included.
    pub fn hold_ms(&self) -> u64 {
        self.release_ms.saturating_sub(self.onset_ms)
    }
}

/// The light state to show until the next melody note fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightDue {
    pub melody_index: usize,
    pub cue: LightCue,
    pub onset_ms: u64,
}

/// Lyric characters whose scroll time has been reached, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricDue<'a> {
    pub track: usize,
    /// Character index of the first character in `text`.
    pub first_char: usize,
    pub text: &'a str,
    /// Scroll time of the last character in `text`.
    pub due_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue<'a> {
    Note(NoteDue),
    Light(LightDue),
    Lyric(LyricDue<'a>),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    beat: f64,
    onset_ms: u64,
}

/// Range of `Synchronizer::slots` owned by one track, plus the next unfired note.
#[derive(Debug, Clone, Copy)]
struct NoteCursor {
    base: usize,
    len: usize,
    next: usize,
}

impl NoteCursor {
    fn is_exhausted(&self) -> bool {
        self.next >= self.len
    }
}

#[derive(Debug, Clone, Copy)]
struct LyricCursor {
    track: usize,
    start_ms: u64,
    scroll_ms: u64,
    chars: usize,
    revealed: usize,
    byte_pos: usize,
}

impl LyricCursor {
    fn is_exhausted(&self) -> bool {
        self.revealed >= self.chars
    }

    fn next_due_ms(&self) -> Option<u64> {
        if self.is_exhausted() {
            None
        } else {
            Some(scroll_time(self.start_ms, self.revealed, self.scroll_ms))
        }
    }

    /// Characters whose scroll time is at or before `now_ms`.
    fn due_chars(&self, now_ms: u64) -> usize {
        if now_ms < self.start_ms {
            return 0;
        }
        // Scroll times past the clock saturate onto its last tick.
        if now_ms == u64::MAX {
            return self.chars;
        }

        let steps = (now_ms - self.start_ms) / self.scroll_ms.max(1);
        (steps as usize).saturating_add(1).min(self.chars)
    }
}

/// Per-track cursors over a song's precomputed onset times. Poll it with a
/// monotonic elapsed time and it reports every cue that became due exactly once.
#[derive(Debug)]
pub struct Synchronizer<'a> {
    song: &'a Song,
    beat_ms: u64,
    slots: Vec<Slot>,
    notes: Vec<NoteCursor>,
    lyrics: Vec<LyricCursor>,
    active_light: Option<LightCue>,
    last_poll_ms: Option<u64>,
}

impl<'a> Synchronizer<'a> {
    pub fn new(song: &'a Song) -> Result<Self, ScoreError> {
        let beat_ms = song.beat_duration_ms()?;
        let total: usize = song.tracks().iter().map(|t| t.len()).sum();

        let mut slots = Vec::with_capacity(total);
        let mut notes = Vec::with_capacity(song.tracks().len());
        let mut lyrics = Vec::new();

        for (index, track) in song.tracks().iter().enumerate() {
            let base = slots.len();
            let mut beat = 0.0f64;

            for note in track.notes() {
                slots.push(Slot {
                    beat,
                    onset_ms: track
                        .start_delay_ms()
                        .saturating_add(beats_to_ms(beat, beat_ms)),
                });
                beat += note.beats as f64;
            }

            notes.push(NoteCursor {
                base,
                len: track.len(),
                next: 0,
            });

            if let Some(text) = track.lyric() {
                lyrics.push(LyricCursor {
                    track: index,
                    start_ms: track.start_delay_ms(),
                    scroll_ms: track.lyric_scroll_ms() as u64,
                    chars: text.chars().count(),
                    revealed: 0,
                    byte_pos: 0,
                });
            }
        }

        trace!(
            "Scheduled {} notes across {} tracks for '{}' at {}ms per beat..!",
            total,
            notes.len(),
            song.name(),
            beat_ms
        );

        Ok(Self {
            song,
            beat_ms,
            slots,
            notes,
            lyrics,
            active_light: None,
            last_poll_ms: None,
        })
    }

    pub fn song(&self) -> &'a Song {
        self.song
    }

    pub fn beat_ms(&self) -> u64 {
        self.beat_ms
    }

    /// Onset times of every note in `track`, in ms since song start.
    pub fn onsets(&self, track: usize) -> impl Iterator<Item = u64> + '_ {
        let cursor = self.notes.get(track).copied();
        cursor
            .into_iter()
            .flat_map(move |c| self.slots[c.base..c.base + c.len].iter().map(|s| s.onset_ms))
    }

    /// Number of notes of `track` that have fired so far.
    pub fn fired(&self, track: usize) -> usize {
        self.notes.get(track).map_or(0, |c| c.next)
    }

    pub fn active_light(&self) -> Option<LightCue> {
        self.active_light
    }

    pub fn is_complete(&self) -> bool {
        self.notes.iter().all(NoteCursor::is_exhausted)
            && self.lyrics.iter().all(LyricCursor::is_exhausted)
    }

    /// Earliest elapsed time at which some cursor will fire, or `None` once complete.
    pub fn next_due_ms(&self) -> Option<u64> {
        let notes = self
            .notes
            .iter()
            .filter(|c| !c.is_exhausted())
            .map(|c| self.slots[c.base + c.next].onset_ms);

        notes
            .chain(self.lyrics.iter().filter_map(LyricCursor::next_due_ms))
            .min()
    }

    pub fn poll(&mut self, now_ms: u64) -> Result<Vec<Cue<'a>>, ScoreError> {
        let mut due = Vec::new();
        self.poll_into(now_ms, &mut due)?;
        Ok(due)
    }

    /// Appends every cue due at or before `now_ms` to `due`, returning how many were added.
    ///
    /// Order within one poll: melody notes (each followed by its light cue), then the
    /// remaining tracks in declaration order, then lyric advances.
    pub fn poll_into(&mut self, now_ms: u64, due: &mut Vec<Cue<'a>>) -> Result<usize, ScoreError> {
        if let Some(previous_ms) = self.last_poll_ms
            && now_ms < previous_ms
        {
            error!(
                "Playback clock went backwards from {}ms to {}ms..!",
                previous_ms, now_ms
            );
            return Err(ScoreError::ClockRegression {
                previous_ms,
                now_ms,
            });
        }
        self.last_poll_ms = Some(now_ms);

        let song: &'a Song = self.song;
        let before = due.len();

        for track in 0..self.notes.len() {
            while let Some(note) = self.fire_note(track, now_ms) {
                due.push(Cue::Note(note));

                if track == 0
                    && let Some(cue) = song.lights().for_melody_note(note.index)
                {
                    self.active_light = Some(cue);
                    due.push(Cue::Light(LightDue {
                        melody_index: note.index,
                        cue,
                        onset_ms: note.onset_ms,
                    }));
                }
            }
        }

        for lyric in 0..self.lyrics.len() {
            if let Some(advance) = self.advance_lyric(lyric, now_ms) {
                due.push(Cue::Lyric(advance));
            }
        }

        Ok(due.len() - before)
    }

    fn fire_note(&mut self, track: usize, now_ms: u64) -> Option<NoteDue> {
        let cursor = self.notes[track];
        if cursor.is_exhausted() {
            return None;
        }

        let slot = self.slots[cursor.base + cursor.next];
        if slot.onset_ms > now_ms {
            return None;
        }

        let source = &self.song.tracks()[track];
        let note = source.notes()[cursor.next];
        let delay = source.start_delay_ms();
        let end_beat = slot.beat + note.beats as f64;

        let end_ms = delay.saturating_add(beats_to_ms(end_beat, self.beat_ms));
        let release_ms =
            delay.saturating_add(beats_to_ms(end_beat + note.liaison as f64, self.beat_ms));

        self.notes[track].next += 1;

        Some(NoteDue {
            track,
            index: cursor.next,
            pitch: note.pitch,
            onset_ms: slot.onset_ms,
            duration_ms: end_ms.saturating_sub(slot.onset_ms),
            release_ms: release_ms.max(end_ms),
        })
    }

    fn advance_lyric(&mut self, lyric: usize, now_ms: u64) -> Option<LyricDue<'a>> {
        let cursor = self.lyrics[lyric];
        let target = cursor.due_chars(now_ms);
        if target <= cursor.revealed {
            return None;
        }

        let song: &'a Song = self.song;
        let text = song.tracks()[cursor.track].lyric()?;
        let count = target - cursor.revealed;
        let rest = &text[cursor.byte_pos..];
        let end = rest
            .char_indices()
            .nth(count)
            .map_or(text.len(), |(i, _)| cursor.byte_pos + i);

        let state = &mut self.lyrics[lyric];
        state.revealed = target;
        state.byte_pos = end;

        Some(LyricDue {
            track: cursor.track,
            first_char: cursor.revealed,
            text: &text[cursor.byte_pos..end],
            due_ms: scroll_time(cursor.start_ms, target - 1, cursor.scroll_ms),
        })
    }
}

fn beats_to_ms(beats: f64, beat_ms: u64) -> u64 {
    (beats * beat_ms as f64).round().max(0.0) as u64
}

/// Scroll time of lyric character `index`, pinned to the end of the clock.
fn scroll_time(start_ms: u64, index: usize, scroll_ms: u64) -> u64 {
    (index as u64)
        .saturating_mul(scroll_ms)
        .saturating_add(start_ms)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::catalog::{LiaisonPolicy, builtin_catalog, validate_song};
    use crate::model::song::{LightCueTable, NoteEvent, QTR, SongDef, TitleDef, Track, TrackDef};

    fn song(tracks: Vec<TrackDef>, lights: Vec<[u8; 4]>, bpm: u32) -> Song {
        let def = SongDef {
            title: TitleDef::Single(String::from("Test Song")),
            bpm,
            tracks,
            lights,
        };
        validate_song(def, LiaisonPolicy::Free).unwrap()
    }

    fn two_note_song() -> Song {
        song(
            vec![TrackDef::from_tables(
                &["C4", "D4"],
                &[1.0, 1.0],
                &[0.5, 0.0],
                0,
                200,
                None,
            )],
            vec![[1, 0, 0, 0], [0, 1, 0, 0]],
            120,
        )
    }

    fn notes(cues: &[Cue]) -> Vec<NoteDue> {
        cues.iter()
            .filter_map(|c| match c {
                Cue::Note(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn two_note_melody_timing() {
        let song = two_note_song();
        let mut sync = Synchronizer::new(&song).unwrap();
        assert_eq!(sync.beat_ms(), 500);

        let first = notes(&sync.poll(0).unwrap());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].index, 0);
        assert_eq!(first[0].pitch, Pitch::note(60));
        assert_eq!(first[0].duration_ms, 500);
        assert_eq!(first[0].release_ms, 750);
        assert_eq!(first[0].hold_ms(), 750);

        assert!(sync.poll(499).unwrap().is_empty());

        let second = notes(&sync.poll(500).unwrap());
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].index, 1);
        assert_eq!(second[0].onset_ms, 500);
        assert_eq!(second[0].release_ms, 1000);

        assert!(sync.is_complete());
    }

    #[test]
    fn polling_twice_at_same_time_is_idempotent() {
        let song = two_note_song();
        let mut sync = Synchronizer::new(&song).unwrap();

        assert_eq!(sync.poll(0).unwrap().len(), 2);
        assert!(sync.poll(0).unwrap().is_empty());
        assert!(sync.poll(0).unwrap().is_empty());
    }

    #[test]
    fn light_follows_melody_transitions() {
        let song = two_note_song();
        let mut sync = Synchronizer::new(&song).unwrap();
        assert_eq!(sync.active_light(), None);

        let cues = sync.poll(0).unwrap();
        let first = LightCue::from_channels([true, false, false, false]);
        assert_eq!(
            cues[1],
            Cue::Light(LightDue {
                melody_index: 0,
                cue: first,
                onset_ms: 0
            })
        );

        for t in [1, 250, 499] {
            sync.poll(t).unwrap();
            assert_eq!(sync.active_light(), Some(first));
        }

        sync.poll(500).unwrap();
        assert_eq!(
            sync.active_light(),
            Some(LightCue::from_channels([false, true, false, false]))
        );
    }

    #[test]
    fn early_polls_report_nothing() {
        let song = song(
            vec![TrackDef::from_tables(&["C4"], &[QTR], &[0.0], 2000, 200, None)],
            vec![[1, 1, 1, 1]],
            60,
        );
        let mut sync = Synchronizer::new(&song).unwrap();

        assert!(sync.poll(0).unwrap().is_empty());
        assert!(sync.poll(1999).unwrap().is_empty());
        assert_eq!(notes(&sync.poll(2000).unwrap())[0].onset_ms, 2000);
    }

    #[test]
    fn clock_regression_is_reported() {
        let song = two_note_song();
        let mut sync = Synchronizer::new(&song).unwrap();

        sync.poll(300).unwrap();
        assert_eq!(
            sync.poll(299),
            Err(ScoreError::ClockRegression {
                previous_ms: 300,
                now_ms: 299
            })
        );
    }

    #[test]
    fn same_poll_order_is_melody_light_harmony_lyric() {
        let song = song(
            vec![
                TrackDef::from_tables(&["C4", "D4"], &[1.0, 1.0], &[0.0, 0.0], 0, 100, Some("ab")),
                TrackDef::from_tables(&["E4"], &[1.0], &[0.0], 0, 100, Some("xy")),
            ],
            vec![[1, 0, 0, 0], [0, 1, 0, 0]],
            120,
        );
        let mut sync = Synchronizer::new(&song).unwrap();

        let cues = sync.poll(0).unwrap();
        assert_eq!(cues.len(), 5);
        assert!(matches!(cues[0], Cue::Note(NoteDue { track: 0, .. })));
        assert!(matches!(cues[1], Cue::Light(_)));
        assert!(matches!(cues[2], Cue::Note(NoteDue { track: 1, .. })));
        assert!(matches!(cues[3], Cue::Lyric(LyricDue { track: 0, text: "a", .. })));
        assert!(matches!(cues[4], Cue::Lyric(LyricDue { track: 1, text: "x", .. })));
    }

    #[test]
    fn late_poll_fires_every_missed_note_in_order() {
        let song = two_note_song();
        let mut sync = Synchronizer::new(&song).unwrap();

        let cues = sync.poll(10_000).unwrap();
        let fired = notes(&cues);
        assert_eq!(fired.iter().map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(
            sync.active_light(),
            Some(LightCue::from_channels([false, true, false, false]))
        );
    }

    #[test]
    fn lyrics_scroll_independently_of_notes() {
        let song = song(
            vec![TrackDef::from_tables(&["C4"], &[QTR], &[0.0], 1000, 200, Some("héllo"))],
            vec![[0, 0, 0, 0]],
            60,
        );
        let mut sync = Synchronizer::new(&song).unwrap();

        let cues = sync.poll(1000).unwrap();
        assert!(matches!(cues.last(), Some(Cue::Lyric(LyricDue { text: "h", first_char: 0, .. }))));

        // A late poll coalesces every character that came due.
        let cues = sync.poll(1450).unwrap();
        assert_eq!(
            cues,
            vec![Cue::Lyric(LyricDue {
                track: 0,
                first_char: 1,
                text: "él",
                due_ms: 1400
            })]
        );

        // The note is long gone, the lyric still holds playback open.
        assert!(!sync.is_complete());
        assert_eq!(sync.next_due_ms(), Some(1600));

        let cues = sync.poll(1800).unwrap();
        assert!(matches!(cues[0], Cue::Lyric(LyricDue { text: "lo", .. })));
        assert!(sync.is_complete());
        assert_eq!(sync.next_due_ms(), None);
    }

    #[test]
    fn empty_tracks_and_rests() {
        let song = song(
            vec![
                TrackDef::from_tables(&["C4", "rest"], &[1.0, 1.0], &[0.0, 0.0], 0, 200, None),
                TrackDef::from_tables(&[], &[], &[], 0, 200, None),
            ],
            vec![[1, 0, 0, 0], [0, 0, 0, 0]],
            120,
        );
        let mut sync = Synchronizer::new(&song).unwrap();
        assert_eq!(sync.onsets(1).count(), 0);

        let fired = notes(&sync.poll(500).unwrap());
        assert_eq!(fired.len(), 2);
        assert!(fired[1].pitch.is_rest());
        assert_eq!(fired[1].onset_ms, 500);
        assert!(sync.is_complete());
    }

    #[test]
    fn completion_waits_for_the_slowest_track() {
        let song = song(
            vec![
                TrackDef::from_tables(&["C4", "D4"], &[1.0, 1.0], &[0.0, 0.0], 0, 200, None),
                TrackDef::from_tables(&["E4"], &[1.0], &[0.0], 5000, 200, None),
            ],
            vec![[1, 0, 0, 0], [0, 1, 0, 0]],
            120,
        );
        let mut sync = Synchronizer::new(&song).unwrap();

        sync.poll(600).unwrap();
        assert_eq!(sync.fired(0), 2);
        assert!(!sync.is_complete());
        assert_eq!(sync.next_due_ms(), Some(5000));

        sync.poll(5000).unwrap();
        assert!(sync.is_complete());

        for t in [5000, 6000, u64::MAX] {
            assert!(sync.poll(t).unwrap().is_empty());
        }
    }

    #[test]
    fn free_liaison_can_overlap_several_neighbours() {
        let song = song(
            vec![TrackDef::from_tables(
                &["Ab4", "Bb3", "C4"],
                &[2.0, 1.0, 1.0],
                &[6.5, 0.0, 0.0],
                0,
                200,
                None,
            )],
            vec![[0, 0, 0, 0]; 3],
            60,
        );
        let mut sync = Synchronizer::new(&song).unwrap();

        let first = notes(&sync.poll(0).unwrap())[0];
        assert_eq!(first.end_ms(), 2000);
        assert_eq!(first.release_ms, 8500);
    }

    #[test]
    fn builtin_onsets_start_at_delay_and_never_decrease() {
        for song in builtin_catalog().songs() {
            let mut sync = Synchronizer::new(song).unwrap();

            for (index, track) in song.tracks().iter().enumerate() {
                let onsets: Vec<u64> = sync.onsets(index).collect();
                assert_eq!(onsets.len(), track.len());
                assert_eq!(onsets.first().copied(), Some(track.start_delay_ms()));
                assert!(onsets.windows(2).all(|w| w[0] <= w[1]));
            }

            let mut t = 0;
            while let Some(next) = sync.next_due_ms() {
                t = next;
                for cue in sync.poll(t).unwrap() {
                    if let Cue::Note(note) = cue {
                        assert!(note.release_ms >= note.end_ms());
                        assert_eq!(note.onset_ms, t);
                    }
                }
            }

            assert!(sync.is_complete());
            assert!(sync.poll(t + 60_000).unwrap().is_empty());
        }
    }

    #[test]
    fn times_pin_to_the_end_of_the_clock() {
        let note = |beats| NoteEvent {
            pitch: Pitch::note(60),
            beats,
            liaison: 0.5,
        };
        let song = Song {
            title: vec![String::from("Far Future")],
            bpm: 120,
            tracks: vec![Track {
                notes: vec![note(1.0), note(1e30)],
                start_delay_ms: u64::MAX - 215,
                lyric_scroll_ms: 200,
                lyric: Some(String::from("abc")),
            }],
            lights: LightCueTable::new(vec![LightCue::OFF; 2]),
        };

        let mut sync = Synchronizer::new(&song).unwrap();
        let onsets: Vec<u64> = sync.onsets(0).collect();
        assert_eq!(onsets, vec![u64::MAX - 215, u64::MAX]);

        let cues = sync.poll(u64::MAX).unwrap();
        let fired = notes(&cues);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].release_ms, u64::MAX);
        assert_eq!(fired[1].duration_ms, 0);
        assert_eq!(fired[1].hold_ms(), 0);
        assert!(cues.iter().any(|c| matches!(
            c,
            Cue::Lyric(LyricDue { text: "abc", due_ms: u64::MAX, .. })
        )));
        assert!(sync.is_complete());
    }
}

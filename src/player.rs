use crate::engine::{Cue, Engine, Synchronizer};
use crate::error::ScoreError;
use crate::model::song::Song;
use anyhow::{anyhow, bail};
use log::{debug, info, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const MAX_SLEEP_CHUNK_MS: u64 = 50;

enum ControlMsg {
    Stop,
}

/// Drives one song at a time on a background thread, polling a `Synchronizer`
/// against the wall clock and forwarding every due cue to the engine.
#[derive(Debug)]
pub struct Player<E: Engine> {
    delay: u64,
    verbose: bool,
    engine: Arc<E>,
    song: Mutex<Option<Arc<Song>>>,
    control_tx: Mutex<Option<Sender<ControlMsg>>>,
    worker_handle: Mutex<Option<JoinHandle<anyhow::Result<()>>>>,
}

impl<E: Engine + 'static> Player<E> {
    pub fn new(engine: E, verbose: bool, delay: u64) -> Self {
        Self {
            delay,
            verbose,
            engine: Arc::new(engine),
            song: Mutex::new(None),
            control_tx: Mutex::new(None),
            worker_handle: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn load_song(&self, song: Arc<Song>) -> anyhow::Result<()> {
        let notes: usize = song.tracks().iter().map(|t| t.len()).sum();

        info!(
            "Loaded song: '{}' with {} tracks and {} notes at {} bpm..!",
            song.name(),
            song.tracks().len(),
            notes,
            song.bpm()
        );

        let Ok(mut lock) = self.song.lock() else {
            bail!("Failed to lock the loaded song..!");
        };
        *lock = Some(song);

        Ok(())
    }

    /// Plays the loaded song. With `join` the call blocks until the song ends or is stopped.
    pub fn play(&self, join: bool) -> anyhow::Result<()> {
        {
            let Ok(guard) = self.worker_handle.lock() else {
                bail!("Failed to lock worker handle..!")
            };

            if guard.is_some() {
                bail!("Playback already running..!")
            }
        }

        let song = {
            let Ok(song) = self.song.lock() else {
                bail!("Failed to lock the loaded song..!")
            };

            match song.as_ref() {
                Some(song) => Arc::clone(song),
                None => bail!("No song loaded..!"),
            }
        };

        let engine = Arc::clone(&self.engine);
        let (tx, rx) = mpsc::channel::<ControlMsg>();

        {
            let Ok(mut ctl) = self.control_tx.lock() else {
                bail!("Failed to lock control_tx..!")
            };

            *ctl = Some(tx);
        }

        let delay = self.delay;
        let verbose = self.verbose;
        let handle = thread::spawn(move || -> anyhow::Result<()> {
            let ctrl_rx = rx;
            let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);

            let mut sync = Synchronizer::new(&song)?;
            engine.all_off()?;
            engine.title(song.title())?;

            if delay > 0 {
                info!("Starting '{}' in {} seconds..!", song.name(), delay);
                sleeper.sleep(Duration::from_secs(delay));
            }

            let start = Instant::now();
            let mut due: Vec<Cue> = Vec::with_capacity(song.tracks().len() * 2 + 1);

            loop {
                if ctrl_rx.try_recv().is_ok() {
                    engine.all_off()?;
                    warn!(
                        "Playback stopped via control message after {} seconds..!",
                        start.elapsed().as_secs()
                    );
                    return Ok(());
                }

                // One clock sample per poll keeps every track on the same time base.
                let now_ms = start.elapsed().as_millis() as u64;

                due.clear();
                if let Err(why) = sync.poll_into(now_ms, &mut due) {
                    engine.all_off()?;
                    return Err(why.into());
                }

                for cue in due.iter() {
                    if verbose {
                        info!("{:>8}ms | {}", now_ms, describe(cue));
                    }

                    if let Err(why) = engine.dispatch(cue) {
                        warn!("Output error at {}ms | why: {:?}", now_ms, why);
                    }
                }

                let Some(next_ms) = sync.next_due_ms() else {
                    break;
                };

                let wait_ms = next_ms.saturating_sub(now_ms).min(MAX_SLEEP_CHUNK_MS);
                if wait_ms > 0 {
                    sleeper.sleep(Duration::from_millis(wait_ms));
                }
            }

            debug!("All cursors exhausted after {}ms..!", start.elapsed().as_millis());
            engine.all_off()?;
            info!("Playback thread finished '{}'..!", song.name());

            Ok(())
        });

        if join {
            let result = handle
                .join()
                .map_err(|_| anyhow!("Playback thread panicked..!"));

            if let Ok(mut ctl) = self.control_tx.lock() {
                ctl.take();
            }

            result??;
        } else {
            let Ok(mut wh) = self.worker_handle.lock() else {
                bail!("Failed to lock worker handle..!")
            };

            *wh = Some(handle);
        }

        Ok(())
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        let tx = {
            let Ok(mut lock) = self.control_tx.lock() else {
                bail!("Failed to lock control_tx..!")
            };
            lock.take()
        };

        if let Some(tx) = tx {
            let _ = tx.send(ControlMsg::Stop);
        } else {
            bail!("No worker is running playback..!")
        }

        let Ok(mut lock) = self.worker_handle.lock() else {
            bail!("Failed to lock worker_handle..!")
        };

        if let Some(handle) = lock.take() {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => bail!("Playback thread panicked..!"),
            }
            debug!("Playback thread joined..!");
            info!("Stopped playback thread..!");
        }

        Ok(())
    }

    /// Waits for a song started with `play(false)` to run to completion.
    pub fn wait(&self) -> anyhow::Result<()> {
        let handle = {
            let Ok(mut lock) = self.worker_handle.lock() else {
                bail!("Failed to lock worker_handle..!")
            };
            lock.take()
        };

        let Some(handle) = handle else {
            bail!("No worker is running playback..!")
        };

        let result = handle
            .join()
            .map_err(|_| anyhow!("Playback thread panicked..!"));

        if let Ok(mut ctl) = self.control_tx.lock() {
            ctl.take();
        }

        result?
    }
}

/// Walks a song on a simulated clock, jumping straight to each due time,
/// and returns every cue with the elapsed ms it fired at.
pub fn preview(song: &Song) -> Result<Vec<(u64, Cue<'_>)>, ScoreError> {
    let mut sync = Synchronizer::new(song)?;
    let mut timeline = Vec::new();
    let mut due = Vec::new();

    while let Some(now_ms) = sync.next_due_ms() {
        due.clear();
        sync.poll_into(now_ms, &mut due)?;
        timeline.extend(due.drain(..).map(|cue| (now_ms, cue)));
    }

    Ok(timeline)
}

pub fn describe(cue: &Cue) -> String {
    match cue {
        Cue::Note(note) => format!(
            "track {} note {:<3} {:>4} for {}ms (release at {}ms)",
            note.track,
            note.index,
            note.pitch.to_string(),
            note.duration_ms,
            note.release_ms
        ),
        Cue::Light(light) => format!("lights {} (melody note {})", light.cue, light.melody_index),
        Cue::Lyric(lyric) => format!("track {} lyric {:?}", lyric.track, lyric.text),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{LyricDue, NoteDue};
    use crate::model::catalog::{LiaisonPolicy, builtin_catalog, validate_song};
    use crate::model::song::{LightCue, SongDef, TitleDef, TrackDef};

    #[derive(Debug, Default)]
    struct RecordingEngine {
        log: Mutex<Vec<String>>,
    }

    impl RecordingEngine {
        fn push(&self, line: String) -> anyhow::Result<()> {
            let Ok(mut log) = self.log.lock() else {
                bail!("Failed to lock recording..!")
            };
            log.push(line);
            Ok(())
        }

        fn lines(&self) -> Vec<String> {
            self.log.lock().map(|l| l.clone()).unwrap_or_default()
        }
    }

    impl Engine for RecordingEngine {
        fn tone(&self, note: &NoteDue) -> anyhow::Result<()> {
            self.push(format!("tone {} {} {}", note.track, note.pitch, note.hold_ms()))
        }

        fn silence(&self, note: &NoteDue) -> anyhow::Result<()> {
            self.push(format!("silence {}", note.track))
        }

        fn silence_all(&self) -> anyhow::Result<()> {
            self.push(String::from("silence all"))
        }

        fn title(&self, lines: &[String]) -> anyhow::Result<()> {
            self.push(format!("title {}", lines.join("/")))
        }

        fn reveal(&self, lyric: &LyricDue) -> anyhow::Result<()> {
            self.push(format!("lyric {} {}", lyric.track, lyric.text))
        }

        fn lights(&self, cue: LightCue) -> anyhow::Result<()> {
            self.push(format!("lights {}", cue))
        }
    }

    fn short_song() -> Arc<Song> {
        let def = SongDef {
            title: TitleDef::Single(String::from("Short")),
            bpm: 6000,
            tracks: vec![
                TrackDef::from_tables(&["C4", "rest", "E4"], &[1.0, 1.0, 1.0], &[0.5, 0.0, 0.0], 0, 5, Some("hi")),
                TrackDef::from_tables(&["G4"], &[2.0], &[0.0], 10, 5, None),
            ],
            lights: vec![[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0]],
        };

        Arc::new(validate_song(def, LiaisonPolicy::default()).unwrap())
    }

    #[test]
    fn plays_a_song_to_completion() {
        env_logger::try_init().unwrap_or(());

        let player = Player::new(RecordingEngine::default(), true, 0);
        player.load_song(short_song()).unwrap();
        player.play(true).unwrap();

        let lines = player.engine().lines();
        assert_eq!(&lines[..3], &["silence all", "lights 0000", "title Short"]);
        assert!(lines.contains(&String::from("tone 0 C4 15")));
        assert!(lines.contains(&String::from("tone 1 G4 20")));
        assert!(lines.contains(&String::from("lyric 0 h")));
        assert!(lines.contains(&String::from("lights 0010")));
        assert_eq!(&lines[lines.len() - 2..], &["silence all", "lights 0000"]);

        let c4 = lines.iter().position(|l| l == "tone 0 C4 15").unwrap();
        assert_eq!(lines[c4 + 1], "lights 1000");
    }

    #[test]
    fn harmony_rest_leaves_melody_sounding() {
        let def = SongDef {
            title: TitleDef::Single(String::from("Duet")),
            bpm: 6000,
            tracks: vec![
                TrackDef::from_tables(&["C4", "D4"], &[2.0, 1.0], &[0.0, 0.0], 0, 5, None),
                TrackDef::from_tables(&["E4", "rest"], &[1.0, 1.0], &[0.0, 0.0], 0, 5, None),
            ],
            lights: vec![[1, 0, 0, 0], [0, 1, 0, 0]],
        };
        let song = Arc::new(validate_song(def, LiaisonPolicy::default()).unwrap());

        let player = Player::new(RecordingEngine::default(), false, 0);
        player.load_song(song).unwrap();
        player.play(true).unwrap();

        let lines = player.engine().lines();
        let rest = lines.iter().position(|l| l == "silence 1").unwrap();
        let melody = lines.iter().position(|l| l == "tone 0 C4 20").unwrap();

        assert!(melody < rest);
        assert!(!lines.contains(&String::from("silence 0")));
        assert_eq!(
            lines.iter().filter(|l| l.as_str() == "silence all").count(),
            2
        );
        assert_eq!(lines.last().map(String::as_str), Some("lights 0000"));
    }

    #[test]
    fn refuses_to_play_without_a_song() {
        let player = Player::new(RecordingEngine::default(), false, 0);
        assert!(player.play(true).is_err());
        assert!(player.stop().is_err());
    }

    #[test]
    fn stop_interrupts_playback() {
        env_logger::try_init().unwrap_or(());

        let player = Player::new(RecordingEngine::default(), false, 0);
        let song = Arc::clone(builtin_catalog().song(1).unwrap());
        player.load_song(song).unwrap();

        player.play(false).unwrap();
        assert!(player.play(false).is_err());

        thread::sleep(Duration::from_millis(20));
        player.stop().unwrap();

        let lines = player.engine().lines();
        assert_eq!(&lines[lines.len() - 2..], &["silence all", "lights 0000"]);
        assert!(!lines.iter().any(|l| l.starts_with("tone")));
    }

    #[test]
    fn preview_matches_song_structure() {
        let song = builtin_catalog().song(1).unwrap();
        let timeline = preview(song).unwrap();

        let notes = timeline
            .iter()
            .filter(|(_, cue)| matches!(cue, Cue::Note(_)))
            .count();
        let lights = timeline
            .iter()
            .filter(|(_, cue)| matches!(cue, Cue::Light(_)))
            .count();
        let lyric: String = timeline
            .iter()
            .filter_map(|(_, cue)| match cue {
                Cue::Lyric(lyric) => Some(lyric.text),
                _ => None,
            })
            .collect();

        assert_eq!(notes, 52);
        assert_eq!(lights, 26);
        assert_eq!(Some(lyric.as_str()), song.melody().lyric());
        assert!(timeline.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(timeline[0].0, 2000);
    }
}

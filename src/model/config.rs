use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "KARAOKE",
    about = "Sing along with multi-track songs, scrolling lyrics and a light show!"
)]
pub struct Args {
    /// Song number to play (1-based). Skips the selection prompt and exits after the song.
    #[arg(short, long)]
    pub song: Option<usize>,

    /// Directory of extra YAML song files to add to the catalog.
    #[arg(long = "songs")]
    pub songs_dir: Option<PathBuf>,

    /// Leave the compiled-in songs out of the catalog.
    #[arg(long, default_value_t = false)]
    pub no_builtin: bool,

    /// How to treat a liaison longer than the note plus the next note: clamp|strict|free.
    #[arg(short, long, default_value = "clamp")]
    pub liaison: String,

    /// List the catalog and exit.
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Dry run (print the first dry_run_max cues of the selected song and exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum cues to print in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Prints every cue as it fires.
    #[arg(short, long)]
    pub verbose: bool,

    /// Delays the start of each performance by N seconds after selection.
    #[arg(long = "delay-start", default_value_t = 0)]
    pub delay_start: u64,
}

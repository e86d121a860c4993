use KARAOKE::{
    Args, Catalog, ConsoleEngine, Player, ScoreError, Selection, builtin_song_defs, describe,
    load_song_dir, parse_liaison_policy, parse_selection, preview,
};
use anyhow::{Result, bail};
use clap::Parser;
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let policy = parse_liaison_policy(&args.liaison);

    let mut defs = if args.no_builtin {
        Vec::new()
    } else {
        builtin_song_defs()
    };

    if let Some(dir) = args.songs_dir.as_ref() {
        info!("Loading songs from '{}'...", dir.display());
        defs.extend(load_song_dir(dir)?);
    }

    let catalog = Catalog::new(defs, policy);
    for why in catalog.rejected() {
        println!("Skipped: {}", why);
    }

    if catalog.song_count() == 0 {
        bail!("No playable songs in the catalog..!");
    }

    if args.list {
        print_menu(&catalog);
        return Ok(());
    }

    if args.dry_run {
        let index = args.song.and_then(|n| n.checked_sub(1)).unwrap_or(0);
        let song = catalog.song(index)?;

        info!("Previewing at most {} cues of '{}'..!", args.dry_run_max, song.name());
        for (at_ms, cue) in preview(song)?.iter().take(args.dry_run_max) {
            info!("{:>8}ms | {}", at_ms, describe(cue));
        }
        return Ok(());
    }

    let player = Arc::new(Player::new(ConsoleEngine::new(), args.verbose, args.delay_start));
    let player_for_handler = Arc::clone(&player);

    ctrlc::set_handler(move || {
        if player_for_handler.stop().is_ok() {
            warn!("Ctrl-C received, stopping playback..!");
        } else {
            println!("Thanks for using Karaoke. Bye!");
            std::process::exit(0);
        }
    })
    .expect("Error setting Ctrl-C handler..!");

    if let Some(number) = args.song {
        let song = match number.checked_sub(1) {
            Some(index) => catalog.song(index)?,
            None => bail!("Song numbers start at 1..!"),
        };

        player.load_song(Arc::clone(song))?;
        player.play(true)?;
        info!("Playback finished, exiting..!");
        return Ok(());
    }

    println!("Starting up...");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_menu(&catalog);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };

        match parse_selection(&line?) {
            Selection::Quit => break,
            Selection::Invalid => {
                println!("Invalid input. Enter 1-{}, or Q.", catalog.song_count());
            }
            Selection::Song(index) => match catalog.song(index) {
                Ok(song) => {
                    player.load_song(Arc::clone(song))?;
                    if let Err(why) = player.play(true) {
                        warn!("Playback failed: {:?}", why);
                    }
                }
                Err(why @ ScoreError::OutOfRange { .. }) => {
                    println!("Invalid input: {}.", why);
                }
                Err(why) => return Err(why.into()),
            },
        }
    }

    println!("Shutting down...");
    println!("Thanks for using Karaoke. Bye!");

    Ok(())
}

fn print_menu(catalog: &Catalog) {
    println!("Select your song! (Enter its number.)");
    println!("=====================================");
    for (i, song) in catalog.songs().enumerate() {
        println!("{:>3} | {}", i + 1, song.name());
    }
    println!("  Q [ Quit program ]");
}

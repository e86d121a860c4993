//! Songs compiled into the player.

use crate::model::song::*;

const DEFY_BPM: u32 = 130;

#[rustfmt::skip]
const DEFY_MELODY_PITCHES: &[&str] = &[
    // No   wiz - ard  that there is   or  wa - as
    "Db4", "Gb4", "F4", "Eb4", "Db4", "Gb4", "F4", "F4", "Eb4",
    // is   ev - er  gon - na-  (deco) bring-(deco)
    "Db4", "Gb4", "F4", "Eb4", "Db4", "Eb4", "F4", "F4", "Gb4", "Eb4",
    // ME - EE - EE  DOWN --! Look at   her, she's
    "Eb5", "F5", "Db5", "Db5", "Db5", "Bb3", "Ab3", "Bb3", "F3",
    // wick -ed! Bring  me  DOWN --  --   --   --!
    "Bb3", "Ab3", "Ab4", "Eb5", "Eb5", "F5", "Eb5", "Db5", "Db5",
    // (war cry)
    "Ab4", "Db5", "Eb5", "Db5", "Eb5", "Db5", "Bb4", "Db5", "Eb5", "Bb4", "Db5",
];

#[rustfmt::skip]
const DEFY_MELODY_DURATIONS: &[f32] = &[
    QTR, ETH, QTR, QTR, QTR, ETH, QTR, ETH, QTR,
    QTR, ETH, QTR, QTR, ETH, STN, STN, QTR, STN, DET,
    HLF, ETH, QTR, WHL, DHF, ETH, ETH, DQT, ETH,
    ETH, DQT, HLF, HLF, ETH, QTR, STN, WHL, DHF,
    DET, STN, STN, STN, STN, STN, STN, STN, ETH, ETH, WHL,
];

#[rustfmt::skip]
const DEFY_MELODY_LIAISONS: &[f32] = &[
    0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3,
    0.3, 0.3, 0.3, 0.3, 0.0, 0.0, 0.3, 0.0, 0.0, 2.0,
    0.0, 0.0, 0.4, 0.0, 0.3, 0.3, 0.3, 0.3, 0.3,
    0.3, 0.6, 0.05, 0.05, 0.0, 0.0, 0.0, 0.0, 1.7,
    0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.1, 0.0,
];

const DEFY_MELODY_LYRICS: &str = concat!(
    "            ",
    "No  wizard  that  there  is or was      ",
    "is    ev-  er    gon-  na   bring               ",
    "MEEEEEEEEEEEEE   DOWN------------------------!      Look at her,  she's",
    " wicked!      Bring   meeeeee  DOWN-------!                                                      ",
    "Ah----------------!",
);

#[rustfmt::skip]
const DEFY_HARMONY_PITCHES: &[&str] = &[
    // I  hope you're ha - ppy  --
    "Db5", "Db5", "C5", "Bb4", "Ab4", "Ab4",
    // So  we've got  to  bring her
    "Bb3", "C4", "Db4", "DS4", "E4", "FS4",
];

#[rustfmt::skip]
const DEFY_HARMONY_DURATIONS: &[f32] = &[
    QTR, ETH, QTR, QTR, DQT, HLF,
    QTR, QTR, HLF, HLF, HLF, DQT,
];

#[rustfmt::skip]
const DEFY_HARMONY_LIAISONS: &[f32] = &[
    0.3, 0.3, 0.3, 0.3, 0.0, 6.5,
    0.1, 0.1, 0.1, 0.1, 0.1, 0.1,
];

const DEFY_HARMONY_LYRICS: &str = concat!(
    "              ",
    "I hope you're happ-  y                                                                           ",
    "So  we've  got   to      bring    her",
);

#[rustfmt::skip]
const DEFY_LIGHTS: &[[u8; 4]] = &[
    [1, 0, 0, 0], // No
    [0, 1, 0, 0], // wiz-
    [0, 0, 1, 0], // ard
    [0, 0, 0, 1], // that
    [1, 0, 0, 0], // there
    [0, 1, 0, 0], // is
    [0, 0, 1, 0], // or
    [0, 0, 1, 0], // wa-
    [0, 0, 0, 1], // as
    [1, 0, 0, 0], // is
    [0, 1, 0, 0], // ev-
    [0, 0, 1, 0], // er
    [0, 0, 0, 1], // gon-
    [1, 0, 0, 1], // na-
    [1, 1, 0, 1], // (deco)
    [0, 0, 1, 0], // (deco)
    [0, 0, 1, 0], // bring-
    [0, 1, 0, 0], // (deco)
    [0, 0, 0, 1], // (deco)
    [1, 0, 0, 1], // ME-
    [0, 1, 1, 0], // EE-
    [0, 0, 0, 0], // EE-
    [1, 1, 1, 1], // DOWN--
    [1, 1, 1, 1], // --!
    [0, 1, 0, 0], // Look
    [0, 0, 1, 0], // at
    [1, 0, 0, 1], // her,
    [0, 1, 1, 0], // she's
    [0, 0, 0, 1], // wick-
    [0, 0, 1, 1], // ed!
    [1, 0, 0, 0], // Bring
    [1, 1, 0, 0], // me
    [1, 1, 1, 1], // DOWN--
    [1, 1, 1, 0], // --
    [1, 1, 0, 0], // --
    [1, 0, 0, 0], // --
    [1, 0, 0, 0], // --!
    [1, 0, 0, 0], // (war cry)
    [0, 0, 1, 0],
    [1, 0, 0, 1],
    [0, 1, 0, 0],
    [0, 0, 0, 1],
    [0, 0, 1, 0],
    [0, 1, 0, 0],
    [1, 0, 1, 0],
    [0, 1, 0, 1],
    [0, 0, 0, 0],
    [1, 1, 1, 1],
];

const MARY_BPM: u32 = 150;

#[rustfmt::skip]
const MARY_MELODY_PITCHES: &[&str] = &[
    "E4", "D4", "C4", "D4", "E4", "E4", "E4",
    "D4", "D4", "D4", "E4", "G4", "G4",
    "E4", "D4", "C4", "D4", "E4", "E4", "E4",
    "E4", "D4", "D4", "E4", "D4", "C4",
];

#[rustfmt::skip]
const MARY_DURATIONS: &[f32] = &[
    QTR, QTR, QTR, QTR, QTR, QTR, HLF,
    QTR, QTR, HLF, QTR, QTR, HLF,
    QTR, QTR, QTR, QTR, QTR, QTR, QTR,
    QTR, QTR, QTR, QTR, QTR, WHL,
];

const MARY_LIAISONS: &[f32] = &[0.3; 26];

const MARY_MELODY_LYRICS: &str = concat!(
    "            ",
    "Mar-  y   had   a   litt-le   lamb      ",
    "Litt-le  lamb,        litt-le  lamb       ",
    "Mar-  y   had   a   litt-le  lamb  ",
    "Its fleece was white as snow.",
);

#[rustfmt::skip]
const MARY_HARMONY_PITCHES: &[&str] = &[
    "G4", "F4", "E4", "F4", "G4", "G4", "G4",
    "F4", "F4", "F4", "G4", "C5", "C5",
    "G4", "F4", "E4", "F4", "G4", "G4", "G4",
    "G4", "F4", "F4", "G4", "F4", "E4",
];

#[rustfmt::skip]
const MARY_LIGHTS: &[[u8; 4]] = &[
    [0, 1, 0, 0], // Mar-
    [0, 0, 1, 0], // y
    [1, 0, 0, 0], // had
    [0, 0, 0, 1], // a
    [1, 0, 0, 0], // litt-
    [0, 1, 0, 0], // le
    [0, 1, 0, 0], // lamb
    [1, 0, 0, 0], // Litt-
    [0, 1, 0, 0], // le
    [0, 1, 0, 0], // lamb,
    [1, 0, 0, 0], // litt-
    [0, 0, 0, 1], // le
    [0, 0, 0, 1], // lamb
    [0, 1, 1, 0], // Mar-
    [1, 1, 0, 0], // y
    [0, 1, 1, 0], // had
    [0, 0, 1, 1], // a
    [1, 0, 0, 0], // litt-
    [0, 1, 0, 0], // le
    [0, 1, 0, 0], // lamb
    [0, 0, 1, 0], // Its
    [0, 1, 0, 0], // fleece
    [0, 1, 0, 0], // was
    [0, 0, 0, 1], // white
    [1, 0, 0, 0], // as
    [0, 1, 0, 0], // snow.
];

fn defying_gravity() -> SongDef {
    SongDef {
        title: TitleDef::Lines(vec![String::from("Defying Gravity"), String::new()]),
        bpm: DEFY_BPM,
        tracks: vec![
            TrackDef::from_tables(
                DEFY_MELODY_PITCHES,
                DEFY_MELODY_DURATIONS,
                DEFY_MELODY_LIAISONS,
                2000,
                200,
                Some(DEFY_MELODY_LYRICS),
            ),
            TrackDef::from_tables(
                DEFY_HARMONY_PITCHES,
                DEFY_HARMONY_DURATIONS,
                DEFY_HARMONY_LIAISONS,
                13000,
                200,
                Some(DEFY_HARMONY_LYRICS),
            ),
        ],
        lights: DEFY_LIGHTS.to_vec(),
    }
}

fn mary_had_a_little_lamb() -> SongDef {
    SongDef {
        title: TitleDef::Lines(vec![String::from("Mary Had a"), String::from("Little Lamb")]),
        bpm: MARY_BPM,
        tracks: vec![
            TrackDef::from_tables(
                MARY_MELODY_PITCHES,
                MARY_DURATIONS,
                MARY_LIAISONS,
                2000,
                200,
                Some(MARY_MELODY_LYRICS),
            ),
            TrackDef::from_tables(
                MARY_HARMONY_PITCHES,
                MARY_DURATIONS,
                MARY_LIAISONS,
                2000,
                200,
                None,
            ),
        ],
        lights: MARY_LIGHTS.to_vec(),
    }
}

pub fn builtin_song_defs() -> Vec<SongDef> {
    vec![defying_gravity(), mary_had_a_little_lamb()]
}

use crate::LiaisonPolicy;
use log::info;

/// Columns of the character display titles and lyrics are laid out for.
pub const DISPLAY_WIDTH: usize = 16;

/// What the user typed at the song selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based catalog index. Not yet bounds checked.
    Song(usize),
    Quit,
    Invalid,
}

/// Parses a 1-based song number or `q` from the selection prompt.
pub fn parse_selection(input: &str) -> Selection {
    let input = input.trim();

    if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Selection::Quit;
    }

    match input.parse::<usize>() {
        Ok(n) => n.checked_sub(1).map_or(Selection::Invalid, Selection::Song),
        Err(_) => Selection::Invalid,
    }
}

pub fn parse_liaison_policy(input: &str) -> LiaisonPolicy {
    match input.to_lowercase().as_str() {
        "c" | "clamp" => LiaisonPolicy::Clamp,
        "s" | "strict" => LiaisonPolicy::Strict,
        "f" | "free" | "overlap" => LiaisonPolicy::Free,
        other => {
            info!("Unknown liaison policy '{}', defaulting to `clamp`..!", other);
            LiaisonPolicy::Clamp
        }
    }
}

/// Greedy word wrap into lines of at most `width` characters. Words longer than a line are split.
pub fn wrap_title(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let line_len = line.chars().count();
        if line_len > 0 && line_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }

    lines
}

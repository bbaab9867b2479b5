//! Song and artist name normalization.
//!
//! Stations spell the same song differently: casing, punctuation, accents,
//! "feat." vs "ft." vs "x", extra info in brackets. Every rule list below is
//! applied in order; later rules rely on earlier ones having run.

use crate::play::PlayEvent;
use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::info;

/// Separator between co-artists once an artist field is normalized.
pub const ARTIST_SEPARATOR: &str = " & ";

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .map(|&(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
        .collect()
}

static SONG_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        // Typos found by hand
        (r"banana \(ft\. shaggy\) dj fle remix", "banana"),
        (r"wonderfull", "wonderful"),
        // Punctuation
        (r"\.\.\./\.\.\.", " "),
        (r"\.\.\.", " "),
        (r"\.", ""),
        (r"\?", " "),
        (r"!", " "),
        (r",", ""),
        (r"-", " "),
        (r"'", ""),
        (r"`", ""),
        // Extra info
        (r"\[.*\]", ""),
        (r"\(.*\)", ""),
    ])
});

static ARTIST_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        // Typos found by hand
        (r"xutos e pontapés", "xutos & pontapés"),
        (r"lil peep", "lil pump"),
        (r"nial horan", "niall horan"),
        (r"michele marrone", "michele morrone"),
        (r"the cranberries", "cranberries"),
        (r"elvis costelo", "elvis costello"),
        (r"rag n bone man", "ragnbone man"),
        (r"r\.e\.m", "rem"),
        (r"diogo piã‡arra", "diogo picarra"),
        (r"diogo pi_arra", "diogo picarra"),
        // Bands with "&" in their name must survive the separator split
        (r"xutos & pontapés", "xutos && pontapés"),
        (r"years & years", "years && years"),
        // Co-artist separators. " x " goes before the commas since some
        // names end in x.
        (r" feat(\.)? ", " & "),
        (r" ft(\.)? ", " & "),
        (r" \[\+\] ", " & "),
        (r" x ", " & "),
        (r" , ", " & "),
        (r", ", " & "),
        (r" / ", " & "),
        // Symbols only some stations use
        (r"\[.*\]", ""),
        (r"'", ""),
        (r"\.", " "),
        (r"!", " "),
        (r"-", " "),
    ])
});

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn apply_rules(text: &str, rules: &[(Regex, &'static str)]) -> String {
    rules.iter().fold(text.to_string(), |acc, (pattern, replacement)| {
        pattern.replace_all(&acc, *replacement).into_owned()
    })
}

fn squeeze_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Canonical form of a song title.
pub fn clean_song(raw: &str) -> String {
    let cleaned = apply_rules(&raw.to_lowercase(), &SONG_RULES);
    squeeze_whitespace(&any_ascii(&cleaned))
}

/// Canonical form of an artist field: lowercase ASCII, co-artists joined by
/// [`ARTIST_SEPARATOR`] in lexicographic order.
pub fn clean_artist(raw: &str) -> String {
    let cleaned = any_ascii(&apply_rules(&raw.to_lowercase(), &ARTIST_RULES));

    let mut artists: Vec<&str> = cleaned.split(ARTIST_SEPARATOR).collect();
    artists.sort_unstable();
    let joined = artists.join(ARTIST_SEPARATOR);

    squeeze_whitespace(&PARENTHESIZED.replace_all(&joined, ""))
}

/// Station liners logged as if they were songs.
pub fn is_station_filler(artist: &str) -> bool {
    artist.to_lowercase().contains("liner daytime")
}

/// Give every play of a song the most complete artist list it was logged with.
///
/// Within one title, plays whose artist lists share a member are rewritten to
/// the longest list among them (the first one found on ties), so "a" and
/// "a & b" both become "a & b". Lists are read from the plays as they were
/// before any rewriting.
pub fn merge_co_artists(plays: &mut [PlayEvent]) {
    let lists: Vec<Vec<String>> = plays
        .iter()
        .map(|p| p.artist.split(ARTIST_SEPARATOR).map(str::to_string).collect())
        .collect();

    let mut by_song: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, play) in plays.iter().enumerate() {
        by_song.entry(play.song.as_str()).or_default().push(i);
    }
    let by_song: Vec<Vec<usize>> = by_song.into_values().collect();

    for indices in &by_song {
        for &i in indices {
            let related: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&j| lists[i].iter().any(|artist| lists[j].contains(artist)))
                .collect();

            // First longest list wins.
            let longest = related
                .iter()
                .map(|&j| &lists[j])
                .reduce(|best, list| if list.len() > best.len() { list } else { best })
                .unwrap_or(&lists[i]);

            let mut merged = longest.clone();
            merged.sort();
            let merged = merged.join(ARTIST_SEPARATOR);
            for &j in &related {
                plays[j].artist = merged.clone();
            }
        }
    }
}

/// One-off corrections that no general rule covers.
pub fn apply_manual_fixes(plays: &mut [PlayEvent]) {
    for play in plays
        .iter_mut()
        .filter(|p| p.song == "dilema" && p.artist == "kelly roland & nelly")
    {
        play.song = "dilemma".to_string();
        play.artist = "kelly rowland & nelly".to_string();
    }
}

/// Full normalization pass over raw plays, ready for analysis.
pub fn normalize_plays(plays: Vec<PlayEvent>) -> Vec<PlayEvent> {
    let total = plays.len();
    let mut plays: Vec<PlayEvent> = plays
        .into_iter()
        .filter(|p| !is_station_filler(&p.artist))
        .collect();
    info!("Dropped {} station filler entries", total - plays.len());

    info!("Cleaning songs");
    for play in plays.iter_mut() {
        play.time = play.time.trim().to_string();
        play.song = clean_song(&play.song);
    }

    info!("Cleaning artists");
    for play in plays.iter_mut() {
        play.artist = clean_artist(&play.artist);
    }

    info!("Normalizing songs with multiple artists");
    merge_co_artists(&mut plays);
    apply_manual_fixes(&mut plays);

    plays
}

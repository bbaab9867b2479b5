//! Daily and weekly repetition counts per station.

use crate::play::{distinct_dates, PlayEvent};
use crate::station::Station;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Repetition count N -> number of songs repeated exactly N times.
pub type Histogram = BTreeMap<usize, usize>;

/// For one station, how many `(song, artist, date)` triples were played
/// exactly N times.
///
/// `{1: 3, 2: 1}` means three songs were played once on some day and one
/// song was played twice on some day.
pub fn daily_histogram(events: &[PlayEvent], station: Station) -> Histogram {
    let mut plays: HashMap<(&str, &str, NaiveDate), usize> = HashMap::new();
    for event in events.iter().filter(|e| e.radio == station) {
        *plays
            .entry((event.song.as_str(), event.artist.as_str(), event.date))
            .or_default() += 1;
    }
    tally(plays.into_values())
}

/// For one station, how many `(song, artist)` pairs were played on exactly N
/// distinct dates.
pub fn weekly_histogram(events: &[PlayEvent], station: Station) -> Histogram {
    let mut days: HashMap<(&str, &str), BTreeSet<NaiveDate>> = HashMap::new();
    for event in events.iter().filter(|e| e.radio == station) {
        days.entry(event.identity()).or_default().insert(event.date);
    }
    tally(days.into_values().map(|d| d.len()))
}

fn tally(counts: impl Iterator<Item = usize>) -> Histogram {
    let mut histogram = Histogram::new();
    for n in counts {
        *histogram.entry(n).or_default() += 1;
    }
    histogram
}

/// Σ(N × count_N) / Σ(count_N). `None` for an empty histogram.
pub fn weighted_average(histogram: &Histogram) -> Option<f64> {
    let total: usize = histogram.values().sum();
    if total == 0 {
        return None;
    }
    let weighted: usize = histogram.iter().map(|(n, count)| n * count).sum();
    Some(weighted as f64 / total as f64)
}

/// Average number of times a song is played per day on `station`.
pub fn average_daily_repetitions(events: &[PlayEvent], station: Station) -> Option<f64> {
    weighted_average(&daily_histogram(events, station))
}

/// Average number of days a song is played on `station`.
pub fn average_weekly_repetitions(events: &[PlayEvent], station: Station) -> Option<f64> {
    weighted_average(&weekly_histogram(events, station))
}

/// One slice of a repetition breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareBin {
    pub label: String,
    /// Songs in this bin (per day for daily breakdowns).
    pub songs: f64,
}

/// Daily repetitions of `station` bucketed as 1, 2, 3, 4, 5-9 and 10+ plays,
/// averaged over the number of dates in `events`. Empty overflow buckets are
/// left out.
pub fn daily_shares(events: &[PlayEvent], station: Station) -> Vec<ShareBin> {
    let days = distinct_dates(events).len().max(1) as f64;
    let histogram = daily_histogram(events, station);

    let mut bins: Vec<ShareBin> = histogram
        .range(..5)
        .map(|(n, count)| ShareBin {
            label: n.to_string(),
            songs: *count as f64 / days,
        })
        .collect();

    let five_to_nine: usize = histogram.range(5..10).map(|(_, c)| c).sum();
    if five_to_nine > 0 {
        bins.push(ShareBin {
            label: "5-9".to_string(),
            songs: five_to_nine as f64 / days,
        });
    }
    let ten_plus: usize = histogram.range(10..).map(|(_, c)| c).sum();
    if ten_plus > 0 {
        bins.push(ShareBin {
            label: "10+".to_string(),
            songs: ten_plus as f64 / days,
        });
    }
    bins
}

/// Number of days songs of `station` were played on, one bin per day count.
pub fn weekly_shares(events: &[PlayEvent], station: Station) -> Vec<ShareBin> {
    weekly_histogram(events, station)
        .into_iter()
        .map(|(n, count)| ShareBin {
            label: n.to_string(),
            songs: count as f64,
        })
        .collect()
}

/// Each bin's share of the total, in percent.
pub fn percentages(bins: &[ShareBin]) -> Vec<f64> {
    let total: f64 = bins.iter().map(|b| b.songs).sum();
    if total == 0.0 {
        return vec![0.0; bins.len()];
    }
    bins.iter().map(|b| b.songs / total * 100.0).collect()
}

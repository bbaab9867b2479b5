//! Plain-text and JSON renderings of the analyses.

use crate::error::Result;
use crate::overlap::{count_by_date, count_by_identity, OverlapGroup};
use crate::play::PlayEvent;
use crate::repetition::{
    average_daily_repetitions, average_weekly_repetitions, daily_shares, percentages,
    weekly_shares, ShareBin,
};
use crate::station::Station;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// How many song identities `render_overlaps` lists.
const TOP_IDENTITIES: usize = 10;

/// Repetition figures for one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub radio: Station,
    pub plays: usize,
    pub daily_average: Option<f64>,
    pub weekly_average: Option<f64>,
    pub daily_shares: Vec<ShareBin>,
    pub weekly_shares: Vec<ShareBin>,
}

impl StationStats {
    pub fn compute(events: &[PlayEvent], radio: Station) -> Self {
        StationStats {
            radio,
            plays: events.iter().filter(|e| e.radio == radio).count(),
            daily_average: average_daily_repetitions(events, radio),
            weekly_average: average_weekly_repetitions(events, radio),
            daily_shares: daily_shares(events, radio),
            weekly_shares: weekly_shares(events, radio),
        }
    }
}

/// Everything `analyze` produces, as written to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub plays: usize,
    pub stations: Vec<StationStats>,
    pub overlaps: Vec<OverlapGroup>,
}

impl AnalysisReport {
    pub fn new(
        events: &[PlayEvent],
        window: (Option<NaiveDate>, Option<NaiveDate>),
        overlaps: Vec<OverlapGroup>,
    ) -> Self {
        AnalysisReport {
            window_start: window.0,
            window_end: window.1,
            plays: events.len(),
            stations: Station::ALL
                .iter()
                .map(|&radio| StationStats::compute(events, radio))
                .collect(),
            overlaps,
        }
    }
}

fn format_average(avg: Option<f64>) -> String {
    avg.map(|a| format!("{:.1}", a)).unwrap_or_else(|| "n/a".to_string())
}

/// One line per station: average plays of a song per day.
pub fn render_daily_stats(events: &[PlayEvent]) -> String {
    let mut out = String::new();
    for &radio in Station::ALL.iter() {
        let avg = format_average(average_daily_repetitions(events, radio));
        let _ = writeln!(out, "{}: plays songs an avg of {} times per day", radio, avg);
    }
    out
}

/// One line per station: average number of days a song is played.
pub fn render_weekly_stats(events: &[PlayEvent]) -> String {
    let mut out = String::new();
    for &radio in Station::ALL.iter() {
        let avg = format_average(average_weekly_repetitions(events, radio));
        let _ = writeln!(out, "{}: plays songs an avg of {} days per week", radio, avg);
    }
    out
}

fn render_shares(out: &mut String, radio: Station, bins: &[ShareBin]) {
    let _ = writeln!(out, "{}", radio.display_name());
    if bins.is_empty() {
        let _ = writeln!(out, "  (no plays)");
        return;
    }
    for (bin, pct) in bins.iter().zip(percentages(bins)) {
        let _ = writeln!(out, "  {:>5}  {:>8.2}  {:>6.1}%", bin.label, bin.songs, pct);
    }
}

/// Daily repetition breakdown per station: songs per day by number of plays.
pub fn render_daily_shares(events: &[PlayEvent]) -> String {
    let mut out = String::from("Songs per day by times played\n");
    for &radio in Station::ALL.iter() {
        render_shares(&mut out, radio, &daily_shares(events, radio));
    }
    out
}

/// Weekly repetition breakdown per station: songs by number of days played.
pub fn render_weekly_shares(events: &[PlayEvent]) -> String {
    let mut out = String::from("Songs by days played\n");
    for &radio in Station::ALL.iter() {
        render_shares(&mut out, radio, &weekly_shares(events, radio));
    }
    out
}

/// Table of overlap groups followed by the most frequent songs and the
/// number of groups per date.
pub fn render_overlaps(groups: &[OverlapGroup]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}  {:<30}  {:<24}  {}",
        "Date", "Song", "Artist", "Stations"
    );
    for group in groups {
        let airings: Vec<String> = group
            .radios
            .iter()
            .zip(&group.times)
            .map(|(radio, time)| format!("{}@{}", radio, time))
            .collect();
        let _ = writeln!(
            out,
            "{:<10}  {:<30}  {:<24}  {}",
            group.date,
            group.song,
            group.artist,
            airings.join(", ")
        );
    }
    let _ = writeln!(out, "Found: {}", groups.len());

    if groups.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nMost overlapped songs");
    for ((song, artist), count) in count_by_identity(groups).into_iter().take(TOP_IDENTITIES) {
        let _ = writeln!(out, "  {:>4}  {} - {}", count, song, artist);
    }

    let _ = writeln!(out, "\nOverlaps per date");
    for (date, count) in count_by_date(groups) {
        let _ = writeln!(out, "  {}  {:>4}", date, count);
    }
    out
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_json(path: &Path, report: &AnalysisReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> Vec<PlayEvent> {
        vec![
            PlayEvent::new(Station::Rfm, date("2020-08-10"), "00:01", "S1", "A1"),
            PlayEvent::new(Station::Rfm, date("2020-08-10"), "00:03", "S1", "A1"),
            PlayEvent::new(Station::Comercial, date("2020-08-10"), "00:02", "S1", "A1"),
            PlayEvent::new(Station::Comercial, date("2020-08-11"), "00:02", "S2", "A2"),
        ]
    }

    fn group() -> OverlapGroup {
        OverlapGroup {
            date: date("2020-08-10"),
            song: "S1".into(),
            artist: "A1".into(),
            radios: vec![Station::Rfm, Station::Comercial],
            times: vec!["00:01".into(), "00:02".into()],
        }
    }

    #[test]
    fn daily_stats_list_every_station() {
        let text = render_daily_stats(&sample());
        assert!(text.contains("rfm: plays songs an avg of 2.0 times per day"));
        assert!(text.contains("comercial: plays songs an avg of 1.0 times per day"));
        assert!(text.contains("megafm: plays songs an avg of n/a times per day"));
        assert_eq!(text.lines().count(), Station::ALL.len());
    }

    #[test]
    fn weekly_stats_use_days() {
        let text = render_weekly_stats(&sample());
        assert!(text.contains("rfm: plays songs an avg of 1.0 days per week"));
        assert!(text.contains("cidadefm: plays songs an avg of n/a days per week"));
    }

    #[test]
    fn shares_show_percentages() {
        let text = render_daily_shares(&sample());
        assert!(text.contains("RFM"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("(no plays)"));
        assert!(render_weekly_shares(&sample()).starts_with("Songs by days played"));
    }

    #[test]
    fn overlaps_table_counts_groups() {
        let text = render_overlaps(&[group()]);
        assert!(text.contains("rfm@00:01, comercial@00:02"));
        assert!(text.contains("Found: 1"));
        assert!(text.contains("1  S1 - A1"));
        assert!(text.contains("2020-08-10     1"));
    }

    #[test]
    fn empty_overlaps_only_report_count() {
        let text = render_overlaps(&[]);
        assert!(text.contains("Found: 0"));
        assert!(!text.contains("Most overlapped"));
    }

    #[test]
    fn json_report_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let events = sample();
        let report = AnalysisReport::new(&events, (Some(date("2020-08-10")), None), vec![group()]);
        write_json(&path, &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["plays"], 4);
        assert_eq!(value["window_start"], "2020-08-10");
        assert!(value["window_end"].is_null());
        assert_eq!(value["stations"].as_array().unwrap().len(), 4);
        assert_eq!(value["stations"][0]["radio"], "cidadefm");
        assert_eq!(value["overlaps"][0]["radios"][1], "comercial");
    }
}

use crate::error::{Error, Result};
use crate::station::Station;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Format a play's date and time are joined into before parsing.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One logged play of a song on a station.
///
/// `date` is the broadcast day the station filed the play under, which is not
/// always the calendar day of `time` (late-night plays stay on the previous
/// day's log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub date: NaiveDate,
    /// Time of day as logged, "HH:MM".
    pub time: String,
    pub song: String,
    pub artist: String,
    pub radio: Station,
}

impl PlayEvent {
    pub fn new(
        radio: Station,
        date: NaiveDate,
        time: impl Into<String>,
        song: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        PlayEvent {
            date,
            time: time.into(),
            song: song.into(),
            artist: artist.into(),
            radio,
        }
    }

    /// Start of the play: `date` and `time` joined and parsed with
    /// [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        let joined = format!("{} {}", self.date.format("%Y-%m-%d"), self.time.trim());
        NaiveDateTime::parse_from_str(&joined, TIMESTAMP_FORMAT).map_err(|_| {
            Error::InvalidTimestamp {
                radio: self.radio.to_string(),
                date: self.date.to_string(),
                time: self.time.clone(),
            }
        })
    }

    /// The `(song, artist)` pair that decides whether two plays are the same song.
    pub fn identity(&self) -> (&str, &str) {
        (&self.song, &self.artist)
    }
}

/// Keep plays whose date falls inside `[start, end]`. Open bounds keep everything
/// on that side.
pub fn filter_window(
    events: &[PlayEvent],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<PlayEvent> {
    events
        .iter()
        .filter(|e| start.is_none_or(|s| e.date >= s) && end.is_none_or(|d| e.date <= d))
        .cloned()
        .collect()
}

/// Distinct broadcast dates present in `events`, ascending.
pub fn distinct_dates(events: &[PlayEvent]) -> BTreeSet<NaiveDate> {
    events.iter().map(|e| e.date).collect()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("Invalid date '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn timestamp_joins_date_and_time() {
        let play = PlayEvent::new(Station::Rfm, date("2020-08-10"), "15:38", "s1", "a1");
        let ts = play.timestamp().unwrap();
        assert_eq!(ts.to_string(), "2020-08-10 15:38:00");
    }

    #[test]
    fn timestamp_tolerates_surrounding_whitespace() {
        let play = PlayEvent::new(Station::Comercial, date("2020-08-10"), " 09:05 ", "s1", "a1");
        assert_eq!(play.timestamp().unwrap().to_string(), "2020-08-10 09:05:00");
    }

    #[test]
    fn timestamp_rejects_garbage() {
        let play = PlayEvent::new(Station::MegaFm, date("2020-08-10"), "25:99", "s1", "a1");
        match play.timestamp() {
            Err(Error::InvalidTimestamp { radio, time, .. }) => {
                assert_eq!(radio, "megafm");
                assert_eq!(time, "25:99");
            }
            other => panic!("expected InvalidTimestamp, got {:?}", other),
        }

        let empty = PlayEvent::new(Station::Rfm, date("2020-08-10"), "", "s1", "a1");
        assert!(empty.timestamp().is_err());
    }

    #[test]
    fn filter_window_is_inclusive() {
        let events: Vec<PlayEvent> = ["2020-08-09", "2020-08-10", "2020-08-16", "2020-08-17"]
            .iter()
            .map(|d| PlayEvent::new(Station::Rfm, date(d), "10:00", "s", "a"))
            .collect();

        let kept = filter_window(&events, Some(date("2020-08-10")), Some(date("2020-08-16")));
        let dates: Vec<String> = kept.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2020-08-10", "2020-08-16"]);

        assert_eq!(filter_window(&events, None, None).len(), 4);
        assert_eq!(filter_window(&events, Some(date("2020-08-16")), None).len(), 2);
    }

    #[test]
    fn distinct_dates_are_sorted_and_unique() {
        let events = vec![
            PlayEvent::new(Station::Rfm, date("2020-08-11"), "10:00", "s", "a"),
            PlayEvent::new(Station::Rfm, date("2020-08-10"), "10:00", "s", "a"),
            PlayEvent::new(Station::Comercial, date("2020-08-11"), "11:00", "s", "a"),
        ];
        let dates: Vec<NaiveDate> = distinct_dates(&events).into_iter().collect();
        assert_eq!(dates, vec![date("2020-08-10"), date("2020-08-11")]);
    }

    #[test]
    fn parse_date_reports_config_error() {
        assert!(matches!(parse_date("10/08/2020"), Err(Error::Config(_))));
    }
}

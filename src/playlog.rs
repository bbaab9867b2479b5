//! Pipe-delimited play logs.
//!
//! Two layouts are read and written:
//! - station day files `<station>_<DD>_<MM>_<YYYY>.csv` with `time|song|artist`
//!   rows, one file per station and broadcast day;
//! - the dataset file, a single table with a `time|song|artist|date|radio`
//!   header holding every play of every station.
//!
//! Fields containing the delimiter or a quote are wrapped in `"`, with inner
//! quotes doubled.

use crate::error::{Error, Result};
use crate::play::PlayEvent;
use crate::station::Station;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DELIMITER: char = '|';
const DATASET_HEADER: [&str; 5] = ["time", "song", "artist", "date", "radio"];

static DAY_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+_([0-9]+)_([0-9]+)_([0-9]+)").unwrap());

/// Broadcast date encoded in a station day file name (`rfm_10_08_2020`).
pub fn date_from_filename(name: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidFilename(name.to_string());
    let caps = DAY_FILE_NAME.captures(name).ok_or_else(invalid)?;
    let number = |i: usize| caps[i].parse::<u32>().map_err(|_| invalid());
    let (day, month) = (number(1)?, number(2)?);
    let year = caps[3].parse::<i32>().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// File name for a station's log of one day.
pub fn day_file_name(station: Station, date: NaiveDate) -> String {
    format!("{}_{}.csv", station.tag(), date.format("%d_%m_%Y"))
}

/// Read one station day file. The date comes from the file name.
pub fn read_station_day(path: &Path, station: Station) -> Result<Vec<PlayEvent>> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let date = date_from_filename(&stem)?;
    let content = fs::read_to_string(path)?;

    let mut plays = Vec::new();
    for (n, fields) in records(&content) {
        let fields = fields.map_err(|message| parse_error(path, n, message))?;
        match <[String; 3]>::try_from(fields) {
            Ok([time, song, artist]) => {
                plays.push(PlayEvent::new(station, date, time, song, artist));
            }
            Err(fields) => {
                return Err(parse_error(
                    path,
                    n,
                    format!("expected 3 fields (time|song|artist), found {}", fields.len()),
                ));
            }
        }
    }
    debug!("{}: {} plays", path.display(), plays.len());
    Ok(plays)
}

/// Read every station day file in `dir`, station by station, each station's
/// files in name order.
pub fn read_station_dir(dir: &Path) -> Result<Vec<PlayEvent>> {
    let mut names: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    names.sort();

    let mut plays = Vec::new();
    for station in Station::COLLECTION_ORDER {
        let prefix = format!("{}_", station.tag());
        let files: Vec<&PathBuf> = names
            .iter()
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        info!("Parsing {} ({} files)", station, files.len());
        for path in files {
            plays.extend(read_station_day(path, station)?);
        }
    }
    Ok(plays)
}

/// Write plays as a dataset file, creating parent directories as needed.
pub fn write_dataset(path: &Path, plays: &[PlayEvent]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = join_record(&DATASET_HEADER);
    out.push('\n');
    for play in plays {
        let date = play.date.format("%Y-%m-%d").to_string();
        out.push_str(&join_record(&[
            play.time.as_str(),
            play.song.as_str(),
            play.artist.as_str(),
            date.as_str(),
            play.radio.tag(),
        ]));
        out.push('\n');
    }
    fs::write(path, out)?;
    info!("Wrote {} plays to {}", plays.len(), path.display());
    Ok(())
}

/// Read a dataset file written by [`write_dataset`].
pub fn read_dataset(path: &Path) -> Result<Vec<PlayEvent>> {
    let content = fs::read_to_string(path)?;
    let mut rows = records(&content).into_iter();

    match rows.next() {
        Some((0, Ok(header))) if header == DATASET_HEADER => {}
        _ => {
            return Err(parse_error(
                path,
                0,
                format!("expected header '{}'", DATASET_HEADER.join("|")),
            ));
        }
    }

    let mut plays = Vec::new();
    for (n, fields) in rows {
        let fields = fields.map_err(|message| parse_error(path, n, message))?;
        let [time, song, artist, date, radio] = <[String; 5]>::try_from(fields)
            .map_err(|f| parse_error(path, n, format!("expected 5 fields, found {}", f.len())))?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| parse_error(path, n, format!("invalid date '{}': {}", date, e)))?;
        let radio = Station::from_str_loose(&radio)
            .map_err(|e| parse_error(path, n, e.to_string()))?;
        plays.push(PlayEvent::new(radio, date, time, song, artist));
    }
    info!("Loaded {} plays from {}", plays.len(), path.display());
    Ok(plays)
}

fn parse_error(path: &Path, index: usize, message: String) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line: index + 1,
        message,
    }
}

/// Split file content into records, skipping blank lines. A line ending
/// inside a quoted field continues the record on the next line. Each record
/// carries the 0-based index of its first line.
fn records(content: &str) -> Vec<(usize, std::result::Result<Vec<String>, String>)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (n, line) in content.lines().enumerate() {
        let (start, record) = match pending.take() {
            Some((start, mut record)) => {
                record.push('\n');
                record.push_str(line);
                (start, record)
            }
            None if line.trim().is_empty() => continue,
            None => (n, line.to_string()),
        };
        match split_record(&record) {
            Err(_) => pending = Some((start, record)),
            fields => out.push((start, fields)),
        }
    }
    if let Some((start, _)) = pending {
        out.push((start, Err("unterminated quoted field".to_string())));
    }
    out
}

/// Split one delimited record into fields, honoring quoted fields.
fn split_record(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

fn join_record(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.contains([DELIMITER, '"', '\n', '\r']) {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_from_filename_reads_day_month_year() {
        assert_eq!(date_from_filename("rfm_10_08_2020").unwrap(), date(2020, 8, 10));
        assert_eq!(date_from_filename("cidadefm_1_9_2020").unwrap(), date(2020, 9, 1));
    }

    #[test]
    fn date_from_filename_rejects_bad_names() {
        assert!(matches!(date_from_filename("all_data"), Err(Error::InvalidFilename(_))));
        assert!(matches!(date_from_filename("rfm_31_02_2020"), Err(Error::InvalidFilename(_))));
    }

    #[test]
    fn day_file_name_pads_fields() {
        assert_eq!(day_file_name(Station::MegaFm, date(2020, 8, 9)), "megafm_09_08_2020.csv");
    }

    #[test]
    fn split_record_handles_quotes() {
        assert_eq!(split_record("10:00|Song|Artist").unwrap(), vec!["10:00", "Song", "Artist"]);
        assert_eq!(
            split_record(r#"10:00|"A|B"|"Say ""Hi"""#).unwrap(),
            vec!["10:00", "A|B", "Say \"Hi\""]
        );
        assert_eq!(split_record("a||c").unwrap(), vec!["a", "", "c"]);
        assert!(split_record(r#"10:00|"open"#).is_err());
    }

    #[test]
    fn join_record_quotes_only_when_needed() {
        assert_eq!(join_record(&["10:00", "A|B", "plain"]), r#"10:00|"A|B"|plain"#);
        assert_eq!(join_record(&["say \"hi\""]), r#""say ""hi""""#);
        assert_eq!(join_record(&["a\nb", "c"]), "\"a\nb\"|c");
    }

    #[test]
    fn read_station_day_uses_filename_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfm_10_08_2020.csv");
        fs::write(&path, "00:01|Song One|Artist\n\n00:05|\"Two|Parts\"|Other\n").unwrap();

        let plays = read_station_day(&path, Station::Rfm).unwrap();
        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].date, date(2020, 8, 10));
        assert_eq!(plays[0].time, "00:01");
        assert_eq!(plays[1].song, "Two|Parts");
        assert!(plays.iter().all(|p| p.radio == Station::Rfm));
    }

    #[test]
    fn read_station_day_reports_line_of_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comercial_10_08_2020.csv");
        fs::write(&path, "00:01|Song|Artist\n00:02|only two\n").unwrap();

        match read_station_day(&path, Station::Comercial) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn read_station_dir_collects_every_station() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rfm_11_08_2020.csv"), "09:00|B|X\n").unwrap();
        fs::write(dir.path().join("rfm_10_08_2020.csv"), "09:00|A|X\n").unwrap();
        fs::write(dir.path().join("megafm_10_08_2020.csv"), "09:01|C|Y\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let plays = read_station_dir(dir.path()).unwrap();
        let songs: Vec<&str> = plays.iter().map(|p| p.song.as_str()).collect();
        assert_eq!(songs, vec!["A", "B", "C"]);
        assert_eq!(plays[2].radio, Station::MegaFm);
    }

    #[test]
    fn read_station_dir_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(read_station_dir(&missing), Err(Error::Io(_))));
    }

    #[test]
    fn dataset_survives_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("all_data.csv");
        let plays = vec![
            PlayEvent::new(Station::Rfm, date(2020, 8, 10), "00:01", "s1", "a1"),
            PlayEvent::new(Station::CidadeFm, date(2020, 8, 11), "23:59", "odd|title", "a2"),
        ];

        write_dataset(&path, &plays).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("time|song|artist|date|radio\n"));
        assert!(content.contains("00:01|s1|a1|2020-08-10|rfm"));

        assert_eq!(read_dataset(&path).unwrap(), plays);
    }

    #[test]
    fn line_breaks_inside_fields_survive_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_data.csv");
        let plays = vec![
            PlayEvent::new(Station::Rfm, date(2020, 8, 10), "00:01", "two\nlines", "a1"),
            PlayEvent::new(Station::Comercial, date(2020, 8, 10), "00:02", "s2", "crlf\r\nartist"),
            PlayEvent::new(Station::MegaFm, date(2020, 8, 10), "00:03", "blank\n\nline", "a3"),
            PlayEvent::new(Station::Rfm, date(2020, 8, 10), "00:04", "s4", "a4"),
        ];

        write_dataset(&path, &plays).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("00:01|\"two\nlines\"|a1"));

        let loaded = read_dataset(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded[0], plays[0]);
        // Reading normalizes CRLF inside a field to LF.
        assert_eq!(loaded[1].artist, "crlf\nartist");
        assert_eq!(loaded[2], plays[2]);
        assert_eq!(loaded[3], plays[3]);
    }

    #[test]
    fn unterminated_quote_reports_its_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfm_10_08_2020.csv");
        fs::write(&path, "00:01|Song|Artist\n00:02|\"open|Artist\n00:03|S|A\n").unwrap();

        match read_station_day(&path, Station::Rfm) {
            Err(Error::Parse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated"));
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn read_dataset_rejects_missing_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_data.csv");
        fs::write(&path, "00:01|s1|a1|2020-08-10|rfm\n").unwrap();
        assert!(matches!(read_dataset(&path), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn read_dataset_rejects_unknown_station() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_data.csv");
        fs::write(
            &path,
            "time|song|artist|date|radio\n00:01|s1|a1|2020-08-10|antena3\n",
        )
        .unwrap();
        match read_dataset(&path) {
            Err(Error::Parse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("antena3"));
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }
}

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default settings file, looked up in the working directory.
pub const SETTINGS_FILE: &str = "radio_repeat.json";

/// Persisted defaults for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the station day files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Normalized dataset written by `clean` and read by the analyses.
    #[serde(default = "default_dataset_file")]
    pub dataset_file: PathBuf,
    /// First broadcast date analysed (inclusive). None = no lower bound.
    #[serde(default)]
    pub window_start: Option<NaiveDate>,
    /// Last broadcast date analysed (inclusive). None = no upper bound.
    #[serde(default)]
    pub window_end: Option<NaiveDate>,
    /// Where to write the JSON report, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_output: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_dataset_file() -> PathBuf {
    PathBuf::from("data").join("all_data.csv")
}

/// Values given on the command line for a single run.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub dataset_file: Option<PathBuf>,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub json_output: Option<PathBuf>,
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            data_dir: default_data_dir(),
            dataset_file: default_dataset_file(),
            window_start: None,
            window_end: None,
            json_output: None,
        }
    }

    /// Load settings from JSON, or fall back to defaults if the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(settings) => return settings,
                    Err(e) => warn!("Corrupt settings file {}, using defaults: {}", path.display(), e),
                },
                Err(e) => warn!("Could not read settings file {}: {}", path.display(), e),
            }
        }
        Settings::new()
    }

    /// Persist settings as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Restrict analyses to `[start, end]`.
    pub fn set_window(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(Error::Config(format!(
                    "window start {} is after window end {}",
                    s, e
                )));
            }
        }
        self.window_start = start;
        self.window_end = end;
        Ok(())
    }

    /// Apply command-line overrides on top of the stored values.
    pub fn merge(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(file) = overrides.dataset_file {
            self.dataset_file = file;
        }
        if overrides.json_output.is_some() {
            self.json_output = overrides.json_output;
        }
        let start = overrides.window_start.or(self.window_start);
        let end = overrides.window_end.or(self.window_end);
        self.set_window(start, end)
    }

    /// Human-readable window, e.g. "2020-08-10 .. 2020-08-16".
    pub fn window_display(&self) -> String {
        let bound = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "*".to_string());
        format!("{} .. {}", bound(self.window_start), bound(self.window_end))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

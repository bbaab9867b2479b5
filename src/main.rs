use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use radio_repeat::config::{Overrides, Settings, SETTINGS_FILE};
use radio_repeat::normalize::normalize_plays;
use radio_repeat::overlap::detect_overlaps;
use radio_repeat::play::{filter_window, parse_date, PlayEvent};
use radio_repeat::playlog::{read_dataset, read_station_dir, write_dataset};
use radio_repeat::report::{self, AnalysisReport};
use radio_repeat::Result;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "radio-repeat",
    version,
    about = "Song repetition and cross-station overlap analysis"
)]
struct Cli {
    /// Settings file (defaults to radio_repeat.json in the working directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize station day files into the dataset
    Clean {
        /// Directory holding <station>_<DD>_<MM>_<YYYY>.csv files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Dataset file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Daily and weekly repetition statistics
    Stats {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Songs airing on several stations at the same time
    Overlaps {
        #[command(flatten)]
        window: WindowArgs,
        /// Also write the analysis as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Statistics followed by overlaps
    Analyze {
        #[command(flatten)]
        window: WindowArgs,
        /// Also write the analysis as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Stored settings
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

#[derive(Args)]
struct WindowArgs {
    /// First date to analyse (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = date_arg)]
    from: Option<NaiveDate>,
    /// Last date to analyse (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = date_arg)]
    to: Option<NaiveDate>,
    /// Dataset file to read (overrides settings)
    #[arg(long)]
    dataset: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Print the current settings
    Show,
    /// Restrict analyses to a date window
    SetWindow {
        #[arg(value_parser = date_arg)]
        from: NaiveDate,
        #[arg(value_parser = date_arg)]
        to: NaiveDate,
    },
    /// Analyse every date in the dataset
    ClearWindow,
    /// Set the directory holding station day files
    SetDataDir { dir: PathBuf },
}

fn date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    let settings = Settings::load(&settings_path);

    if let Err(e) = run(cli.command, settings, &settings_path) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, mut settings: Settings, settings_path: &Path) -> Result<()> {
    match command {
        Commands::Clean { input, output } => {
            settings.merge(Overrides {
                data_dir: input,
                dataset_file: output,
                ..Default::default()
            })?;
            let raw = read_station_dir(&settings.data_dir)?;
            let plays = normalize_plays(raw);
            write_dataset(&settings.dataset_file, &plays)?;
            println!(
                "Wrote {} play(s) to {}",
                plays.len(),
                settings.dataset_file.display()
            );
        }
        Commands::Stats { window } => {
            let events = load_window(&mut settings, window, None)?;
            print_stats(&events);
        }
        Commands::Overlaps { window, json } => {
            let events = load_window(&mut settings, window, json)?;
            let groups = detect_overlaps(&events)?;
            print!("{}", report::render_overlaps(&groups));
            export(&settings, &events, groups)?;
        }
        Commands::Analyze { window, json } => {
            let events = load_window(&mut settings, window, json)?;
            print_stats(&events);
            println!();
            let groups = detect_overlaps(&events)?;
            print!("{}", report::render_overlaps(&groups));
            export(&settings, &events, groups)?;
        }
        Commands::Config { action } => match action {
            ConfigCmd::Show => {
                println!("Settings file: {}", settings_path.display());
                println!("Data dir:      {}", settings.data_dir.display());
                println!("Dataset:       {}", settings.dataset_file.display());
                println!("Window:        {}", settings.window_display());
                println!(
                    "JSON output:   {}",
                    settings
                        .json_output
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "off".to_string())
                );
            }
            ConfigCmd::SetWindow { from, to } => {
                settings.set_window(Some(from), Some(to))?;
                settings.save(settings_path)?;
                println!("Window set to {}.", settings.window_display());
            }
            ConfigCmd::ClearWindow => {
                settings.set_window(None, None)?;
                settings.save(settings_path)?;
                println!("Window cleared.");
            }
            ConfigCmd::SetDataDir { dir } => {
                settings.data_dir = dir;
                settings.save(settings_path)?;
                println!("Data dir set to {}.", settings.data_dir.display());
            }
        },
    }
    Ok(())
}

/// Read the dataset and keep the plays inside the effective window.
fn load_window(
    settings: &mut Settings,
    window: WindowArgs,
    json: Option<PathBuf>,
) -> Result<Vec<PlayEvent>> {
    settings.merge(Overrides {
        dataset_file: window.dataset,
        window_start: window.from,
        window_end: window.to,
        json_output: json,
        ..Default::default()
    })?;
    let events = read_dataset(&settings.dataset_file)?;
    let events = filter_window(&events, settings.window_start, settings.window_end);
    info!(
        "Analysing {} play(s) in window {}",
        events.len(),
        settings.window_display()
    );
    Ok(events)
}

fn print_stats(events: &[PlayEvent]) {
    print!("{}", report::render_daily_stats(events));
    println!();
    print!("{}", report::render_daily_shares(events));
    println!();
    print!("{}", report::render_weekly_stats(events));
    println!();
    print!("{}", report::render_weekly_shares(events));
}

fn export(
    settings: &Settings,
    events: &[PlayEvent],
    groups: Vec<radio_repeat::overlap::OverlapGroup>,
) -> Result<()> {
    if let Some(path) = &settings.json_output {
        let analysis = AnalysisReport::new(
            events,
            (settings.window_start, settings.window_end),
            groups,
        );
        report::write_json(path, &analysis)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

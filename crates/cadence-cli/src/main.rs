//! `cadence` CLI: calendar analysis from the command line.
//!
//! Every subcommand reads a JSON event list (a bare array, or a provider
//! response object with an `items` array) and prints a JSON result.
//!
//! ## Usage
//!
//! ```sh
//! # Merged busy periods for the current week
//! cadence busy -i events.json
//!
//! # Free periods of at least 45 minutes on a given day
//! cadence free -i events.json --start 2026-03-16T00:00:00Z --end 2026-03-17T00:00:00Z --min-minutes 45
//!
//! # Buffer classification and conflicts
//! cadence gaps -i events.json --owner me@acme.com
//! cadence conflicts -i events.json
//!
//! # Slot search constrained to New York working hours
//! cadence slots -i events.json --date-range next_week --zone America/New_York --duration 45
//!
//! # Recurring series, their totals or suggested actions
//! cadence series -i events.json --view actions
//!
//! # One-on-one cadence and overall health
//! cadence relationships -i events.json --owner me@acme.com
//! cadence health -i events.json
//!
//! # A tagged scheduling request
//! cadence evaluate -i events.json --request request.json
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` for engine detail.

use anyhow::{bail, Context, Result};
use cadence_engine::range::{resolve_range, DateRange};
use cadence_engine::{
    AvailabilityRequest, EngineOptions, Event, SchedulingRequest, TimezoneConstraint,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "cadence", version, about = "Deterministic calendar intelligence")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,
}

/// Options shared by every subcommand.
#[derive(Args)]
struct Settings {
    /// Reference time (RFC 3339); defaults to the current time
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// Requester timezone (IANA name, abbreviation, airport code or city)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Calendar owner's email address
    #[arg(long, global = true)]
    owner: Option<String>,

    /// JSON file with engine options
    #[arg(long, global = true)]
    options: Option<String>,

    /// Maximum number of slot suggestions
    #[arg(long, global = true)]
    max_slots: Option<usize>,
}

#[derive(Args)]
struct Io {
    /// Input events file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Args)]
struct Window {
    /// Window start (RFC 3339); defaults to the start of the current week
    #[arg(long, requires = "end")]
    start: Option<DateTime<Utc>>,
    /// Window end (RFC 3339)
    #[arg(long, requires = "start")]
    end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeriesView {
    Groups,
    Summary,
    Actions,
}

#[derive(Subcommand)]
enum Commands {
    /// Merged busy intervals within a window
    Busy {
        #[command(flatten)]
        io: Io,
        #[command(flatten)]
        window: Window,
    },
    /// Free intervals within a window
    Free {
        #[command(flatten)]
        io: Io,
        #[command(flatten)]
        window: Window,
        /// Only report free intervals at least this long
        #[arg(long, default_value_t = 0)]
        min_minutes: i64,
    },
    /// Classify the gaps between consecutive events
    Gaps {
        #[command(flatten)]
        io: Io,
    },
    /// Detect overlapping events
    Conflicts {
        #[command(flatten)]
        io: Io,
    },
    /// Suggest open meeting slots
    Slots {
        #[command(flatten)]
        io: Io,
        /// JSON availability request file (overrides the flags below)
        #[arg(long)]
        request: Option<String>,
        /// Semantic range: today, tomorrow, this_week, next_week, this_month, next_month
        #[arg(long)]
        date_range: Option<String>,
        /// Explicit date (YYYY-MM-DD); repeat to span several days
        #[arg(long = "date")]
        dates: Vec<String>,
        /// Meeting length in minutes
        #[arg(long, default_value_t = 30)]
        duration: i64,
        /// Participant timezone whose working hours must hold; repeatable
        #[arg(long = "zone")]
        zones: Vec<String>,
        /// Restrict the requester's own zone to working hours
        #[arg(long)]
        working_hours: bool,
    },
    /// Group recurring series and report metrics
    Series {
        #[command(flatten)]
        io: Io,
        /// What to print
        #[arg(long, value_enum, default_value = "groups")]
        view: SeriesView,
    },
    /// One-on-one relationship cadence per counterpart
    Relationships {
        #[command(flatten)]
        io: Io,
    },
    /// Calendar health summary for a window
    Health {
        #[command(flatten)]
        io: Io,
        #[command(flatten)]
        window: Window,
    },
    /// Evaluate a tagged scheduling request
    Evaluate {
        #[command(flatten)]
        io: Io,
        /// JSON request file (`kind`: find-slots, check-time or preview-actions)
        #[arg(long)]
        request: String,
    },
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let options = load_options(&cli.settings)?;
    let now = cli.settings.now.unwrap_or_else(Utc::now);
    let timezone = cli
        .settings
        .timezone
        .clone()
        .unwrap_or_else(|| options.default_timezone.clone());
    debug!(%now, timezone = %timezone, "resolved settings");

    match cli.command {
        Commands::Busy { io, window } => {
            let events = read_events(io.input.as_deref())?;
            let (start, end) = resolve_window(&window, now, &timezone, &options)?;
            let busy = cadence_engine::busy_intervals(&events, start, end, &options);
            write_json(io.output.as_deref(), &busy)?;
        }
        Commands::Free {
            io,
            window,
            min_minutes,
        } => {
            let events = read_events(io.input.as_deref())?;
            let (start, end) = resolve_window(&window, now, &timezone, &options)?;
            let free = cadence_engine::interval::find_free_intervals(
                &events,
                start,
                end,
                min_minutes,
                &options,
            );
            write_json(io.output.as_deref(), &free)?;
        }
        Commands::Gaps { io } => {
            let events = read_events(io.input.as_deref())?;
            write_json(io.output.as_deref(), &cadence_engine::classify_gaps(&events, &options))?;
        }
        Commands::Conflicts { io } => {
            let events = read_events(io.input.as_deref())?;
            write_json(
                io.output.as_deref(),
                &cadence_engine::detect_conflicts(&events, &options),
            )?;
        }
        Commands::Slots {
            io,
            request,
            date_range,
            dates,
            duration,
            zones,
            working_hours,
        } => {
            let events = read_events(io.input.as_deref())?;
            let request = match request {
                Some(path) => {
                    let json = read_input(Some(path.as_str()))?;
                    serde_json::from_str::<AvailabilityRequest>(&json)
                        .with_context(|| format!("Invalid availability request: {}", path))?
                }
                None => AvailabilityRequest {
                    date_range: date_range.as_deref().map(parse_date_range).transpose()?,
                    custom_dates: dates,
                    duration,
                    timezone_constraints: zones.into_iter().map(TimezoneConstraint::new).collect(),
                    working_hours_only: working_hours,
                    ..AvailabilityRequest::default()
                },
            };
            let search = cadence_engine::find_slots(&events, &request, now, &timezone, &options)
                .context("Slot search failed")?;
            write_json(io.output.as_deref(), &search)?;
        }
        Commands::Series { io, view } => {
            let events = read_events(io.input.as_deref())?;
            let series = cadence_engine::resolve_series(&events, now, &options);
            match view {
                SeriesView::Groups => write_json(io.output.as_deref(), &series)?,
                SeriesView::Summary => write_json(
                    io.output.as_deref(),
                    &cadence_engine::summarize_series(&series),
                )?,
                SeriesView::Actions => write_json(
                    io.output.as_deref(),
                    &cadence_engine::recommend_actions(&series),
                )?,
            }
        }
        Commands::Relationships { io } => {
            let events = read_events(io.input.as_deref())?;
            write_json(
                io.output.as_deref(),
                &cadence_engine::track_relationships(&events, now, &options),
            )?;
        }
        Commands::Health { io, window } => {
            let events = read_events(io.input.as_deref())?;
            let (start, end) = resolve_window(&window, now, &timezone, &options)?;
            write_json(
                io.output.as_deref(),
                &cadence_engine::summarize_health(&events, start, end, &options),
            )?;
        }
        Commands::Evaluate { io, request } => {
            let events = read_events(io.input.as_deref())?;
            let json = read_input(Some(request.as_str()))?;
            let request: SchedulingRequest = serde_json::from_str(&json)
                .with_context(|| format!("Invalid scheduling request: {}", request))?;
            let outcome = cadence_engine::evaluate(&events, &request, now, &timezone, &options)
                .context("Evaluation failed")?;
            write_json(io.output.as_deref(), &outcome)?;
        }
    }

    Ok(())
}

/// Install a stderr subscriber filtered by `RUST_LOG` (default `warn`).
fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;
    Ok(())
}

/// Options file first, then command-line overrides.
fn load_options(settings: &Settings) -> Result<EngineOptions> {
    let mut options = match settings.options.as_deref() {
        Some(path) => {
            let json = read_input(Some(path))?;
            EngineOptions::from_json(&json).with_context(|| format!("Invalid options file: {}", path))?
        }
        None => EngineOptions::default(),
    };

    if let Some(owner) = &settings.owner {
        options.owner_email = Some(owner.clone());
    }
    if let Some(max_slots) = settings.max_slots {
        options.max_slots = max_slots;
    }
    options.validate().context("Invalid engine options")?;
    Ok(options)
}

/// Explicit `--start/--end`, or the current week in the requester's zone.
fn resolve_window(
    window: &Window,
    now: DateTime<Utc>,
    timezone: &str,
    options: &EngineOptions,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start >= end {
            bail!("--start must be before --end");
        }
        return Ok((start, end));
    }
    let tz = cadence_engine::resolve_or_default(timezone, &options.default_timezone);
    let range = resolve_range(None, &[], None, now, tz)?;
    Ok((range.start, range.end))
}

fn parse_date_range(label: &str) -> Result<DateRange> {
    serde_json::from_value(serde_json::Value::String(label.to_string()))
        .with_context(|| format!("Unknown date range: '{}'", label))
}

/// Parse an event list: a bare array or an object carrying `items`.
fn read_events(path: Option<&str>) -> Result<Vec<Event>> {
    let raw = read_input(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw).context("Input is not valid JSON")?;
    let items = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => match map.remove("items") {
            Some(items) => items,
            None => bail!("Expected an event array or an object with an \"items\" array"),
        },
        _ => bail!("Expected an event array or an object with an \"items\" array"),
    };
    let events: Vec<Event> = serde_json::from_value(items).context("Failed to parse events")?;
    debug!(count = events.len(), "loaded events");
    Ok(events)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

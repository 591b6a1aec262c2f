//! `coverage`: check a history list against a lookback window.
//!
//! Reads raw form entries as JSON (a file path, or `-` for stdin) and prints
//! the coverage verdict as text or, with `--json`, as JSON.
//!
//! # Environment
//!
//! - `RUST_LOG`: log level for stderr diagnostics (default: warn)

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use timeline_coverage::{
    compute_coverage, merge_for_display, normalize_entries, parse_date, review, validate_chain,
    AddressPeriod, ChainCompletionStatus, CoverageResult, RawEntry, RejectedEntry, ReviewRequest,
    TimelineBar, Window, WindowSpec, DEFAULT_LOOKBACK_YEARS,
};

mod output;

#[derive(Parser, Debug)]
#[command(name = "coverage", version, about = "Timeline coverage and gap checker")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(
        long,
        global = true,
        help = "Evaluation instant (YYYY-MM-DD or RFC 3339); defaults to the current time"
    )]
    now: Option<String>,
    #[arg(
        long,
        global = true,
        default_value = "UTC",
        help = "IANA timezone that decides which day is today"
    )]
    timezone: String,
    #[arg(long, global = true, default_value_t = DEFAULT_LOOKBACK_YEARS)]
    lookback_years: u32,
    #[arg(long, global = true, requires = "to", help = "Explicit window start (inclusive)")]
    from: Option<String>,
    #[arg(long, global = true, requires = "from", help = "Explicit window end (inclusive)")]
    to: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Overlap-tolerant coverage (employment, activities)
    Coverage { input: PathBuf },
    /// Strict address chain, most recent period first
    Chain {
        input: PathBuf,
        #[arg(long, help = "Date the applicant moved to the current address")]
        anchor: String,
    },
    /// Coverage bar segments for display
    Segments { input: PathBuf },
    /// Full review request (mode, window and entries in one JSON document)
    Review { input: PathBuf },
}

#[derive(Debug, Serialize)]
struct CoverageReport {
    window: Window,
    coverage: CoverageResult,
    rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Serialize)]
struct ChainReport {
    window: Window,
    status: ChainCompletionStatus,
    rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Serialize)]
struct SegmentsReport {
    window: Window,
    timeline: TimelineBar,
    rejected: Vec<RejectedEntry>,
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::WARN),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let now = resolve_now(cli.now.as_deref(), &cli.timezone)?;
    debug!(%now, "evaluation instant");

    match &cli.command {
        Commands::Coverage { input } => {
            let window = window_spec(&cli)?.resolve(&now)?;
            let normalized = normalize_entries(&read_json::<Vec<RawEntry>>(input)?, &now);
            let report = CoverageReport {
                window,
                coverage: compute_coverage(&window, &normalized.entries),
                rejected: normalized.rejected,
            };
            output::print_one(cli.json, report, |r| {
                output::coverage_text(&r.window, &r.coverage, &r.rejected)
            })
        }
        Commands::Chain { input, anchor } => {
            let window = window_spec(&cli)?.resolve(&now)?;
            let anchor = parse_date(anchor).context("invalid --anchor")?;
            let normalized = normalize_entries(&read_json::<Vec<RawEntry>>(input)?, &now);
            let periods: Vec<AddressPeriod> = normalized
                .entries
                .iter()
                .cloned()
                .map(AddressPeriod::from)
                .collect();
            let status = match validate_chain(&periods, &window, anchor) {
                Ok(status) => status,
                Err(error) => {
                    let error = normalized.locate_error(error);
                    output::print_failure(cli.json, &error)?;
                    return Err(error.into());
                }
            };
            let report = ChainReport {
                window,
                status,
                rejected: normalized.rejected,
            };
            output::print_one(cli.json, report, |r| {
                output::chain_text(&r.window, &r.status, &r.rejected)
            })
        }
        Commands::Segments { input } => {
            let window = window_spec(&cli)?.resolve(&now)?;
            let normalized = normalize_entries(&read_json::<Vec<RawEntry>>(input)?, &now);
            let report = SegmentsReport {
                window,
                timeline: merge_for_display(&window, &normalized.entries),
                rejected: normalized.rejected,
            };
            output::print_one(cli.json, report, |r| {
                output::timeline_text(&r.timeline, &r.rejected)
            })
        }
        Commands::Review { input } => {
            let request = read_json::<ReviewRequest>(input)?;
            let review = review(&request, &now)?;
            output::print_one(cli.json, review, output::review_text)
        }
    }
}

/// The injected "now": `--now` if given, else the system clock, in `timezone`.
///
/// A bare date means noon of that day, which no DST transition can move to
/// another calendar day.
fn resolve_now(now: Option<&str>, timezone: &str) -> anyhow::Result<DateTime<Tz>> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone '{}'", timezone))?;
    let Some(s) = now else {
        return Ok(Utc::now().with_timezone(&tz));
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(dt.with_timezone(&tz));
    }
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --now '{}'", s))?;
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    match tz.from_local_datetime(&noon) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => Ok(dt),
        chrono::LocalResult::None => bail!("--now '{}' does not exist in {}", s, timezone),
    }
}

fn window_spec(cli: &Cli) -> anyhow::Result<WindowSpec> {
    match (&cli.from, &cli.to) {
        (Some(from), Some(to)) => Ok(WindowSpec::Explicit {
            lower: parse_date(from).context("invalid --from")?,
            upper: parse_date(to).context("invalid --to")?,
        }),
        _ => Ok(WindowSpec::Lookback {
            years: cli.lookback_years,
        }),
    }
}

fn read_json<T: DeserializeOwned>(input: &Path) -> anyhow::Result<T> {
    let text = if input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", input.display()))
}

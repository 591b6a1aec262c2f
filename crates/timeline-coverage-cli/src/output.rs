use serde::Serialize;

use timeline_coverage::{
    ChainCompletionStatus, CoverageResult, RejectedEntry, Review, ReviewOutcome, TimelineBar,
    Window,
};

#[derive(Serialize)]
struct JsonOut<T> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct JsonError<'a, E> {
    ok: bool,
    error: &'a E,
}

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

/// Report a failed evaluation on stdout when JSON output is on, so scripted
/// callers still get an envelope; text mode leaves it to the stderr message.
pub fn print_failure<E: Serialize>(json: bool, error: &E) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonError { ok: false, error })?
        );
    }
    Ok(())
}

fn window_line(window: &Window) -> String {
    format!(
        "window {} .. {} ({} days)",
        window.lower_bound(),
        window.upper_bound(),
        window.total_days()
    )
}

fn rejected_lines(rejected: &[RejectedEntry]) -> Vec<String> {
    rejected
        .iter()
        .map(|r| format!("rejected entry {}: {}", r.index, r.error))
        .collect()
}

pub fn coverage_text(
    window: &Window,
    result: &CoverageResult,
    rejected: &[RejectedEntry],
) -> String {
    let mut lines = vec![
        window_line(window),
        format!(
            "covered {} of {} days ({:.1}%)",
            result.covered_days,
            result.total_days,
            result.coverage_percent()
        ),
    ];
    if result.is_fully_covered() {
        lines.push("no gaps".to_string());
    }
    for gap in &result.gaps {
        lines.push(format!(
            "gap {} .. {} ({} days, ~{} months)",
            gap.start,
            gap.end,
            gap.length_days,
            gap.approximate_months()
        ));
    }
    lines.extend(rejected_lines(rejected));
    lines.join("\n")
}

pub fn chain_text(
    window: &Window,
    status: &ChainCompletionStatus,
    rejected: &[RejectedEntry],
) -> String {
    let verdict = if status.is_complete {
        "chain complete".to_string()
    } else {
        match status.approximate_remaining_months {
            Some(months) => format!("chain incomplete: ~{} months remaining", months),
            None => "chain incomplete: no periods entered".to_string(),
        }
    };
    let mut lines = vec![window_line(window), verdict];
    lines.extend(rejected_lines(rejected));
    lines.join("\n")
}

pub fn timeline_text(timeline: &TimelineBar, rejected: &[RejectedEntry]) -> String {
    let mut rows: Vec<(f64, String)> = timeline
        .segments
        .iter()
        .chain(&timeline.gaps)
        .map(|s| {
            (
                s.start_percent,
                format!(
                    "{:>6.2}% .. {:>6.2}%  {} .. {}  {}",
                    s.start_percent, s.end_percent, s.start, s.end, s.label
                ),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut lines: Vec<String> = rows.into_iter().map(|(_, row)| row).collect();
    lines.push(format!("covered {:.1}%", timeline.covered_percent()));
    lines.extend(rejected_lines(rejected));
    lines.join("\n")
}

pub fn review_text(review: &Review) -> String {
    let body = match &review.outcome {
        ReviewOutcome::Coverage(result) => coverage_text(&review.window, result, &review.rejected),
        ReviewOutcome::Chain(status) => chain_text(&review.window, status, &review.rejected),
        ReviewOutcome::ChainInvalid { error } => {
            let mut lines = vec![window_line(&review.window), format!("chain invalid: {}", error)];
            lines.extend(rejected_lines(&review.rejected));
            lines.join("\n")
        }
    };
    format!(
        "{}\nshow entry form: {}",
        body,
        if review.show_entry_form() { "yes" } else { "no" }
    )
}

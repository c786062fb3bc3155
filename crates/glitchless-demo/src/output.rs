use std::fmt::Debug;
use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::scenario::ScenarioReport;

#[derive(Debug, Serialize)]
struct NotificationLine<'a, T> {
    scenario: &'a str,
    round: usize,
    value: &'a T,
}

#[derive(Debug, Serialize)]
struct SummaryLine<'a> {
    scenario: &'a str,
    sends: usize,
    notifications: usize,
    rounds: u64,
    fired: u64,
    skipped_stale: u64,
    folded: u64,
    peak_pending: usize,
}

pub fn write_report<T>(
    report: &ScenarioReport<T>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()>
where
    T: Debug + Serialize,
{
    match format {
        OutputFormat::Text => write_text(report, out),
        OutputFormat::Json => write_json(report, out),
    }
}

/// One value per line, with `---` ahead of the notifications of every send.
fn write_text<T: Debug>(report: &ScenarioReport<T>, out: &mut impl Write) -> Result<()> {
    for round in 0..=report.sends {
        if round > 0 {
            writeln!(out, "---")?;
        }
        for value in report.round(round) {
            writeln!(out, "{value:?}")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(report: &ScenarioReport<T>, out: &mut impl Write) -> Result<()> {
    for notification in &report.notifications {
        let line = NotificationLine {
            scenario: report.scenario,
            round: notification.round,
            value: &notification.value,
        };
        serde_json::to_writer(&mut *out, &line)?;
        writeln!(out)?;
    }

    let stats = report.stats;
    let summary = SummaryLine {
        scenario: report.scenario,
        sends: report.sends,
        notifications: report.notifications.len(),
        rounds: stats.rounds,
        fired: stats.fired,
        skipped_stale: stats.skipped_stale,
        folded: stats.folded,
        peak_pending: stats.peak_pending,
    };
    serde_json::to_writer(&mut *out, &summary)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

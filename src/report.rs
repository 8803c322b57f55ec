//! CSV export and plain-text tables for schedules and summaries

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::amortization::{AmortizationSummary, PaymentRow, PaymentStatus};
use crate::error::Result;

/// One CSV line of a schedule export; amounts are whole currency units
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Period")]
    period: u32,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Installment")]
    installment: i64,
    #[serde(rename = "Interest")]
    interest: i64,
    #[serde(rename = "Principal")]
    principal: i64,
    #[serde(rename = "Extra")]
    extra: i64,
    #[serde(rename = "EndingBalance")]
    ending_balance: i64,
    #[serde(rename = "Status")]
    status: &'a str,
}

fn status_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Paid => "PAID",
        PaymentStatus::Upcoming => "UPCOMING",
        PaymentStatus::Pending => "PENDING",
    }
}

/// Write a schedule as CSV to any writer
pub fn write_schedule_csv<W: Write>(rows: &[PaymentRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(CsvRow {
            period: row.period,
            date: row.date.format("%Y-%m-%d").to_string(),
            installment: row.installment_amount as i64,
            interest: row.interest_portion as i64,
            principal: row.principal_portion as i64,
            extra: row.extra_portion as i64,
            ending_balance: row.ending_balance as i64,
            status: status_label(row.status),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a schedule as CSV to a file
pub fn write_schedule_csv_file<P: AsRef<Path>>(rows: &[PaymentRow], path: P) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_schedule_csv(rows, file)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.as_ref().display());
    Ok(())
}

/// Fixed-width table of the first `limit` rows
pub fn format_schedule_table(rows: &[PaymentRow], limit: usize) -> String {
    let mut lines = vec![
        format!(
            "{:>6} {:>10} {:>14} {:>14} {:>14} {:>12} {:>16} {:>9}",
            "Period", "Date", "Installment", "Interest", "Principal", "Extra", "Balance", "Status"
        ),
        "-".repeat(104),
    ];

    lines.extend(rows.iter().take(limit).map(|row| {
        format!(
            "{:>6} {:>10} {:>14.0} {:>14.0} {:>14.0} {:>12.0} {:>16.0} {:>9}",
            row.period,
            row.date.format("%Y-%m-%d"),
            row.installment_amount,
            row.interest_portion,
            row.principal_portion,
            row.extra_portion,
            row.ending_balance,
            status_label(row.status),
        )
    }));

    if rows.len() > limit {
        lines.push(format!("... ({} more months)", rows.len() - limit));
    }
    join_lines(lines)
}

/// Multi-line summary comparing both schedules
pub fn format_summary(summary: &AmortizationSummary) -> String {
    let mut lines = vec![
        "Summary:".to_string(),
        format!("  Fixed installment:        {:.0}", summary.fixed_installment),
        format!(
            "  Term:                     {} of {} months ({} saved, {})",
            summary.actual_term,
            summary.baseline_term,
            summary.months_saved,
            summary.time_saved()
        ),
        format!("  Interest (baseline):      {:.0}", summary.total_interest_baseline),
        format!("  Interest (with extras):   {:.0}", summary.total_interest_with_extras),
        format!(
            "  Interest saved:           {:.0} ({:.1}%)",
            summary.interest_saved, summary.percent_saved
        ),
        format!("  Total extra paid:         {:.0}", summary.total_extra_paid),
    ];
    if let Some(ratio) = summary.interest_saved_per_unit_extra() {
        lines.push(format!("  Saved per unit extra:     {:.2}", ratio));
    }
    lines.extend([
        format!("  Total paid (baseline):    {:.0}", summary.total_paid_baseline),
        format!("  Total paid (with extras): {:.0}", summary.total_paid_with_extras),
        format!("  Payoff (baseline):        {}", summary.payoff_date_baseline),
        format!("  Payoff (with extras):     {}", summary.payoff_date_with_extras),
    ]);
    join_lines(lines)
}

/// Newline-terminate every line
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().fold(String::new(), |mut out, line| {
        out.push_str(&line);
        out.push('\n');
        out
    })
}

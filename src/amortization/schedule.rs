//! Schedule output structures and read-only queries over them

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment status relative to the current calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Installment month is before the current month
    Paid,
    /// Installment falls in the current month
    Upcoming,
    /// Installment month is after the current month
    Pending,
}

impl PaymentStatus {
    /// Status of an installment due on `date`, as seen on `today`
    ///
    /// Only year and month are compared; the day of month is ignored.
    pub fn on(date: NaiveDate, today: NaiveDate) -> Self {
        let due = month_index(date);
        let now = month_index(today);

        if due < now {
            PaymentStatus::Paid
        } else if due == now {
            PaymentStatus::Upcoming
        } else {
            PaymentStatus::Pending
        }
    }
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// A single row of an amortization schedule
///
/// Monetary fields are rounded to whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    /// 1-based installment number
    pub period: u32,

    /// Disbursement date + `period` months
    pub date: NaiveDate,

    /// Regular installment paid out of pocket (smaller on a payoff row)
    pub installment_amount: f64,

    pub interest_portion: f64,

    /// Scheduled principal plus `extra_portion`
    pub principal_portion: f64,

    /// Extra principal actually applied this period
    ///
    /// On a payoff row an extra larger than the remaining balance is capped to
    /// what the balance could absorb, so this can be below the amount
    /// requested for the period. Summary totals add up these applied amounts.
    pub extra_portion: f64,

    pub ending_balance: f64,

    pub status: PaymentStatus,
}

impl PaymentRow {
    /// Outstanding balance before this period's principal was applied
    pub fn opening_balance(&self) -> f64 {
        self.ending_balance + self.principal_portion
    }

    pub fn has_extra(&self) -> bool {
        self.extra_portion > 0.0
    }
}

/// Aggregate statistics comparing the baseline and extra-payment schedules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSummary {
    pub fixed_installment: f64,
    pub actual_term: u32,
    pub baseline_term: u32,
    pub months_saved: u32,
    pub total_interest_baseline: f64,
    pub total_interest_with_extras: f64,
    pub interest_saved: f64,
    /// Interest saved as a percentage of baseline interest (unrounded)
    pub percent_saved: f64,
    pub total_extra_paid: f64,
    pub total_paid_baseline: f64,
    pub total_paid_with_extras: f64,
    pub payoff_date_baseline: NaiveDate,
    pub payoff_date_with_extras: NaiveDate,
}

impl AmortizationSummary {
    /// Interest saved for every currency unit paid as extra principal
    pub fn interest_saved_per_unit_extra(&self) -> Option<f64> {
        if self.total_extra_paid > 0.0 {
            Some(self.interest_saved / self.total_extra_paid)
        } else {
            None
        }
    }

    /// Calendar distance between the two payoff dates
    pub fn time_saved(&self) -> MonthSpan {
        MonthSpan::between(self.payoff_date_with_extras, self.payoff_date_baseline)
    }
}

/// Where an extra payment left the balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentImpact {
    pub balance_before: f64,
    pub balance_after: f64,
    pub date: NaiveDate,
}

/// Complete result of one amortization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// Schedule with extra payments applied, may end before the term
    pub schedule_with_extras: Vec<PaymentRow>,

    /// Schedule without extra payments over the full contractual term
    pub schedule_baseline: Vec<PaymentRow>,

    pub summary: AmortizationSummary,
}

impl AmortizationResult {
    /// Recompute every row's status for a different "today"
    ///
    /// Monetary fields are untouched.
    pub fn refresh_status(&mut self, today: NaiveDate) {
        for row in self
            .schedule_with_extras
            .iter_mut()
            .chain(self.schedule_baseline.iter_mut())
        {
            row.status = PaymentStatus::on(row.date, today);
        }
    }

    /// Number of installments already paid
    pub fn paid_count(&self) -> usize {
        self.schedule_with_extras
            .iter()
            .filter(|r| r.status == PaymentStatus::Paid)
            .count()
    }

    /// Share of the actual term already paid, in percent
    pub fn progress_percent(&self) -> f64 {
        if self.summary.actual_term == 0 {
            return 0.0;
        }
        self.paid_count() as f64 / self.summary.actual_term as f64 * 100.0
    }

    /// The installment due this month, or the first installment if none is
    pub fn current_payment(&self) -> Option<&PaymentRow> {
        self.schedule_with_extras
            .iter()
            .find(|r| r.status == PaymentStatus::Upcoming)
            .or_else(|| self.schedule_with_extras.first())
    }

    pub fn rows_with_extras(&self) -> impl Iterator<Item = &PaymentRow> {
        self.schedule_with_extras.iter().filter(|r| r.has_extra())
    }

    pub fn rows_in_year(&self, year: i32) -> impl Iterator<Item = &PaymentRow> {
        self.schedule_with_extras
            .iter()
            .filter(move |r| r.date.year() == year)
    }

    /// Distinct calendar years covered by the schedule, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.schedule_with_extras.iter().map(|r| r.date.year()).collect();
        years.dedup();
        years
    }

    /// Balance before and after the extra payment made in `period`
    ///
    /// `None` when the schedule pays off before reaching that period.
    pub fn extra_payment_impact(&self, period: u32) -> Option<ExtraPaymentImpact> {
        self.schedule_with_extras
            .iter()
            .find(|r| r.period == period)
            .map(|r| ExtraPaymentImpact {
                balance_before: r.opening_balance(),
                balance_after: r.ending_balance,
                date: r.date,
            })
    }
}

/// A whole number of years and months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpan {
    pub years: u32,
    pub months: u32,
}

impl MonthSpan {
    /// Calendar months from `start` to `end`, ignoring days; zero if `end` is earlier
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        let total = (month_index(end) - month_index(start)).max(0) as u32;
        Self::from_months(total)
    }

    pub fn from_months(total: u32) -> Self {
        Self {
            years: total / 12,
            months: total % 12,
        }
    }

    pub fn total_months(&self) -> u32 {
        self.years * 12 + self.months
    }
}

impl fmt::Display for MonthSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = |n: u32, one: &'static str, many: &'static str| if n == 1 { one } else { many };
        match (self.years, self.months) {
            (0, m) => write!(f, "{} {}", m, unit(m, "month", "months")),
            (y, 0) => write!(f, "{} {}", y, unit(y, "year", "years")),
            (y, m) => write!(
                f,
                "{} {} and {} {}",
                y,
                unit(y, "year", "years"),
                m,
                unit(m, "month", "months")
            ),
        }
    }
}

/// Rough number of days an extra payment of `amount` brings payoff forward
pub fn estimated_days_saved(amount: f64, installment: f64) -> i64 {
    if installment <= 0.0 {
        return 0;
    }
    (amount / installment * 30.0).round() as i64
}

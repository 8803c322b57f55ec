//! Loan configuration and extra payment records

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, Result};

/// How the borrower wants extra payments applied
///
/// Only `ReduceTerm` is implemented by the engine. `ReduceInstallment` is
/// accepted and carried through configuration but currently has no effect on
/// the schedule: extra payments always shorten the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Keep the installment, finish earlier
    #[default]
    ReduceTerm,
    /// Keep the term, lower the installment (inert)
    ReduceInstallment,
}

/// Immutable configuration for one amortization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParams {
    /// Disbursed loan amount
    pub principal: f64,

    /// Annual effective rate as a fraction (0.1201 = 12.01% E.A.)
    pub annual_effective_rate: f64,

    /// Contractual number of monthly installments
    pub term_months: u32,

    /// Period 1 falls one month after this date
    pub disbursement_date: NaiveDate,

    #[serde(default)]
    pub strategy: Strategy,
}

impl LoanParams {
    /// Create loan parameters with the default `ReduceTerm` strategy
    pub fn new(
        principal: f64,
        annual_effective_rate: f64,
        term_months: u32,
        disbursement_date: NaiveDate,
    ) -> Self {
        Self {
            principal,
            annual_effective_rate,
            term_months,
            disbursement_date,
            strategy: Strategy::ReduceTerm,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reject configurations that would produce NaN or infinite schedules
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(AmortizationError::loan(
                "principal",
                format!("must be a positive amount, got {}", self.principal),
            ));
        }
        if !self.annual_effective_rate.is_finite() || self.annual_effective_rate <= -1.0 {
            return Err(AmortizationError::loan(
                "annual_effective_rate",
                format!("must be greater than -1, got {}", self.annual_effective_rate),
            ));
        }
        if self.term_months == 0 {
            return Err(AmortizationError::loan(
                "term_months",
                "must be at least one month",
            ));
        }
        if add_months(self.disbursement_date, self.term_months).is_err() {
            return Err(AmortizationError::loan(
                "term_months",
                format!(
                    "{} months past {} cannot be dated",
                    self.term_months, self.disbursement_date
                ),
            ));
        }
        Ok(())
    }

    /// Calendar date of installment `period` (disbursement + `period` months)
    pub fn installment_date(&self, period: u32) -> Result<NaiveDate> {
        add_months(self.disbursement_date, period)
    }
}

/// Shift a date by whole months, clamping to the last day of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| AmortizationError::Date(format!("{} + {} months is out of range", date, months)))
}

/// An extraordinary principal payment ("abono") applied in one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPayment {
    /// 1-based installment the payment is applied with
    pub period: u32,

    /// Amount paid on top of the regular installment
    pub amount: f64,

    /// Date the borrower registered the payment (informational)
    pub date: NaiveDate,
}

impl ExtraPayment {
    pub fn new(period: u32, amount: f64, date: NaiveDate) -> Self {
        Self { period, amount, date }
    }

    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(AmortizationError::extra(self.period, "periods start at 1"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AmortizationError::extra(
                self.period,
                format!("amount must be positive, got {}", self.amount),
            ));
        }
        Ok(())
    }
}

/// Validate every entry of an extra payment list
pub fn validate_extra_payments(payments: &[ExtraPayment]) -> Result<()> {
    payments.iter().try_for_each(ExtraPayment::validate)
}

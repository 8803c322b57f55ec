//! What-if simulation of recurring extra payments
//!
//! Holds the current loan, its registered extra payments and the current
//! result, then evaluates recurring payment plans against them without
//! touching the loan book.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::amortization::{compute_amortization_as_of, AmortizationResult, PaymentStatus};
use crate::book::LoanBook;
use crate::error::{AmortizationError, Result};
use crate::loan::{ExtraPayment, LoanParams};

/// A fixed extra payment repeated every `every_months` for `duration_months`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecurringPlan {
    pub amount: f64,
    pub every_months: u32,
    pub duration_months: u32,
}

impl Default for RecurringPlan {
    fn default() -> Self {
        Self {
            amount: 500_000.0,
            every_months: 1,
            duration_months: 12,
        }
    }
}

impl RecurringPlan {
    /// Expand the plan into extra payments starting at `start_period`
    ///
    /// Periods past `term_months` are dropped.
    pub fn payments(&self, start_period: u32, term_months: u32, date: NaiveDate) -> Result<Vec<ExtraPayment>> {
        if self.every_months == 0 || self.duration_months == 0 {
            return Err(AmortizationError::extra(
                start_period,
                "recurring plans need a positive frequency and duration",
            ));
        }

        // Offsets that still land inside the term
        let span = match term_months.checked_sub(start_period) {
            Some(room) => self.duration_months.min(room.saturating_add(1)),
            None => 0,
        };

        let payments: Vec<ExtraPayment> = (0..span)
            .step_by(self.every_months as usize)
            .map_while(|offset| start_period.checked_add(offset))
            .map(|period| ExtraPayment::new(period, self.amount, date))
            .collect();

        crate::loan::validate_extra_payments(&payments)?;
        Ok(payments)
    }
}

/// Current vs simulated outcome of a recurring plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationComparison {
    pub original_term: u32,
    pub current_term: u32,
    pub simulated_term: u32,
    pub additional_months_saved: u32,
    pub baseline_interest: f64,
    pub current_interest: f64,
    pub simulated_interest: f64,
    pub additional_interest_saved: f64,
    pub total_simulated_extra: f64,
    pub payment_count: usize,
}

/// Full outcome of one simulated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub plan: RecurringPlan,
    pub start_period: u32,
    pub comparison: SimulationComparison,
    pub result: AmortizationResult,
}

/// Evaluates recurring plans on top of a loan's registered extra payments
#[derive(Debug, Clone)]
pub struct Simulator {
    loan: LoanParams,
    extra_payments: Vec<ExtraPayment>,
    current: AmortizationResult,
    today: NaiveDate,
}

impl Simulator {
    /// Create a simulator, computing the current result once
    pub fn new(loan: LoanParams, extra_payments: Vec<ExtraPayment>, today: NaiveDate) -> Result<Self> {
        let current = compute_amortization_as_of(&loan, &extra_payments, today)?;
        Ok(Self {
            loan,
            extra_payments,
            current,
            today,
        })
    }

    /// Snapshot a loan book; `None` when the book has no loan or result yet
    pub fn from_book(book: &LoanBook) -> Option<Self> {
        let loan = book.loan()?.clone();
        let current = book.result()?.clone();
        Some(Self {
            loan,
            extra_payments: book.extra_payments().to_vec(),
            current,
            today: book.today(),
        })
    }

    pub fn current(&self) -> &AmortizationResult {
        &self.current
    }

    /// Period the plan starts from: this month's installment, else the first
    pub fn start_period(&self) -> u32 {
        self.current
            .schedule_with_extras
            .iter()
            .find(|r| r.status == PaymentStatus::Upcoming)
            .map(|r| r.period)
            .unwrap_or(1)
    }

    /// Run a single plan
    pub fn run(&self, plan: &RecurringPlan) -> Result<SimulationOutcome> {
        let start_period = self.start_period();
        let planned = plan.payments(start_period, self.loan.term_months, self.today)?;
        let payment_count = planned.len();
        let total_simulated_extra = planned.iter().map(|p| p.amount).sum();

        let mut extras = self.extra_payments.clone();
        extras.extend(planned);
        let result = compute_amortization_as_of(&self.loan, &extras, self.today)?;

        let current = &self.current.summary;
        let simulated = &result.summary;
        let comparison = SimulationComparison {
            original_term: current.baseline_term,
            current_term: current.actual_term,
            simulated_term: simulated.actual_term,
            additional_months_saved: current.actual_term.saturating_sub(simulated.actual_term),
            baseline_interest: current.total_interest_baseline,
            current_interest: current.total_interest_with_extras,
            simulated_interest: simulated.total_interest_with_extras,
            additional_interest_saved: current.total_interest_with_extras
                - simulated.total_interest_with_extras,
            total_simulated_extra,
            payment_count,
        };

        log::debug!(
            "Plan {:?} from period {}: term {} -> {}",
            plan,
            start_period,
            comparison.current_term,
            comparison.simulated_term
        );

        Ok(SimulationOutcome {
            plan: *plan,
            start_period,
            comparison,
            result,
        })
    }

    /// Run several plans in parallel, results in input order
    pub fn run_many(&self, plans: &[RecurringPlan]) -> Vec<Result<SimulationOutcome>> {
        plans.par_iter().map(|plan| self.run(plan)).collect()
    }
}

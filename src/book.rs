//! Loan book: the current loan, its registered extra payments and the latest result
//!
//! Every command recomputes the full result from the new inputs. A command
//! that fails validation leaves the book unchanged.

use chrono::NaiveDate;

use crate::amortization::{compute_amortization_as_of, AmortizationResult};
use crate::error::Result;
use crate::loan::{demo_loan_file, ExtraPayment, LoanFile, LoanParams};

/// Application state owned by whoever presents the schedules
#[derive(Debug, Clone, Default)]
pub struct LoanBook {
    loan: Option<LoanParams>,

    /// Kept sorted by period, at most one entry per period
    extra_payments: Vec<ExtraPayment>,

    result: Option<AmortizationResult>,

    /// Fixed "today" for statuses; local date when unset
    today: Option<NaiveDate>,
}

impl LoanBook {
    /// Empty book with no loan configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Book preloaded with the demo loan and its extra payments
    pub fn with_demo() -> Result<Self> {
        let mut book = Self::new();
        book.load_demo()?;
        Ok(book)
    }

    /// Book built from a loaded configuration file
    pub fn from_file(file: LoanFile) -> Result<Self> {
        let mut book = Self::new();
        book.load_file(file)?;
        Ok(book)
    }

    /// Pin the date used to derive payment statuses
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn loan(&self) -> Option<&LoanParams> {
        self.loan.as_ref()
    }

    pub fn extra_payments(&self) -> &[ExtraPayment] {
        &self.extra_payments
    }

    pub fn result(&self) -> Option<&AmortizationResult> {
        self.result.as_ref()
    }

    pub fn has_setup(&self) -> bool {
        self.loan.is_some()
    }

    /// Sum of all registered extra payment amounts
    pub fn total_registered_extra(&self) -> f64 {
        self.extra_payments.iter().map(|p| p.amount).sum()
    }

    /// Replace the loan configuration, keeping registered extra payments
    pub fn set_loan(&mut self, loan: LoanParams) -> Result<&AmortizationResult> {
        log::info!(
            "Setting loan: principal {:.0}, E.A. {:.4}, {} months",
            loan.principal,
            loan.annual_effective_rate,
            loan.term_months
        );
        let extras = self.extra_payments.clone();
        self.replace(loan, extras)
    }

    /// Register an extra payment, replacing any existing one for the same period
    ///
    /// Returns the recomputed result, or `None` if no loan is configured yet.
    pub fn add_extra_payment(&mut self, payment: ExtraPayment) -> Result<Option<&AmortizationResult>> {
        payment.validate()?;

        let mut extras = self.extra_payments.clone();
        match extras.iter().position(|p| p.period == payment.period) {
            Some(idx) => {
                log::info!("Replacing extra payment for period {}", payment.period);
                extras[idx] = payment;
            }
            None => {
                log::info!("Adding extra payment of {:.0} for period {}", payment.amount, payment.period);
                extras.push(payment);
                extras.sort_by_key(|p| p.period);
            }
        }

        self.commit_extras(extras)
    }

    /// Remove the extra payment registered for `period`, if any
    pub fn remove_extra_payment(&mut self, period: u32) -> Result<Option<&AmortizationResult>> {
        log::info!("Removing extra payment for period {}", period);
        let extras = self
            .extra_payments
            .iter()
            .filter(|p| p.period != period)
            .cloned()
            .collect();
        self.commit_extras(extras)
    }

    /// Recompute the result from the current inputs
    pub fn recalculate(&mut self) -> Result<Option<&AmortizationResult>> {
        let extras = self.extra_payments.clone();
        self.commit_extras(extras)
    }

    /// Swap in a loaded configuration; a later entry for a period replaces an earlier one
    pub fn load_file(&mut self, file: LoanFile) -> Result<&AmortizationResult> {
        log::info!(
            "Loading loan with {} extra payments",
            file.extra_payments.len()
        );
        self.replace(file.loan, file.extra_payments)
    }

    /// Swap in the demo loan and demo extra payments
    pub fn load_demo(&mut self) -> Result<&AmortizationResult> {
        self.load_file(demo_loan_file())
    }

    /// Forget the loan, its extra payments and the last result
    pub fn reset(&mut self) {
        log::info!("Resetting loan book");
        self.loan = None;
        self.extra_payments.clear();
        self.result = None;
    }

    fn replace(&mut self, loan: LoanParams, extras: Vec<ExtraPayment>) -> Result<&AmortizationResult> {
        let extras = dedup_by_period(extras);
        let result = compute_amortization_as_of(&loan, &extras, self.today())?;
        self.loan = Some(loan);
        self.extra_payments = extras;
        Ok(&*self.result.insert(result))
    }

    fn commit_extras(&mut self, extras: Vec<ExtraPayment>) -> Result<Option<&AmortizationResult>> {
        match self.loan.clone() {
            Some(loan) => self.replace(loan, extras).map(Some),
            None => {
                crate::loan::validate_extra_payments(&extras)?;
                self.extra_payments = dedup_by_period(extras);
                Ok(None)
            }
        }
    }
}

/// Keep the last entry for each period, sorted by period
fn dedup_by_period(extras: Vec<ExtraPayment>) -> Vec<ExtraPayment> {
    let mut kept: Vec<ExtraPayment> = Vec::with_capacity(extras.len());
    for payment in extras {
        match kept.iter_mut().find(|p| p.period == payment.period) {
            Some(existing) => *existing = payment,
            None => kept.push(payment),
        }
    }
    kept.sort_by_key(|p| p.period);
    kept
}

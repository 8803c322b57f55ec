//! Loan Amortization - Fixed-installment schedules with extraordinary principal payments
//!
//! This library provides:
//! - E.A. to E.M. rate conversion and level installment calculation
//! - Baseline and extra-payment schedules with per-period interest/principal splits
//! - Summary statistics (time saved, interest saved, payoff dates)
//! - A loan book holding the current loan and its extra payments
//! - Recurring extra-payment simulations

pub mod error;
pub mod loan;
pub mod amortization;
pub mod book;
pub mod simulation;
pub mod report;

// Re-export commonly used types
pub use error::{AmortizationError, Result};
pub use loan::{ExtraPayment, LoanParams, Strategy};
pub use amortization::{
    compute_amortization, compute_amortization_as_of, fixed_installment, monthly_rate_from_annual,
    AmortizationResult, AmortizationSummary, PaymentRow, PaymentStatus,
};
pub use book::LoanBook;
pub use simulation::{RecurringPlan, Simulator};

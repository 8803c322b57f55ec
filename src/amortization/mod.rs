//! Amortization engine producing baseline and extra-payment schedules

mod engine;
mod schedule;
mod state;

pub use engine::{
    build_schedule, compute_amortization, compute_amortization_as_of, fixed_installment,
    group_extra_payments, monthly_rate_from_annual, PAYOFF_TOLERANCE,
};
pub use schedule::{
    estimated_days_saved, AmortizationResult, AmortizationSummary, ExtraPaymentImpact, MonthSpan,
    PaymentRow, PaymentStatus,
};
pub use state::ScheduleState;

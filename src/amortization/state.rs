//! Running state of a single schedule pass

/// Balance and running totals while a schedule is generated
#[derive(Debug, Clone)]
pub struct ScheduleState {
    /// Last period processed (0 before the first installment)
    pub period: u32,

    /// Outstanding principal, unrounded
    pub balance: f64,

    /// Interest accrued so far, unrounded
    pub total_interest: f64,

    /// Extra principal actually applied so far, unrounded
    pub total_extra: f64,
}

impl ScheduleState {
    /// State at disbursement
    pub fn from_principal(principal: f64) -> Self {
        Self {
            period: 0,
            balance: principal,
            total_interest: 0.0,
            total_extra: 0.0,
        }
    }

    /// Whether another installment is due
    pub fn is_open(&self, term_months: u32, tolerance: f64) -> bool {
        self.balance > tolerance && self.period < term_months
    }

    pub fn advance_period(&mut self) {
        self.period += 1;
    }

    /// Apply one period's interest and principal, never driving the balance negative
    pub fn apply(&mut self, interest: f64, principal_portion: f64, extra_applied: f64) {
        self.balance = (self.balance - principal_portion).max(0.0);
        self.total_interest += interest;
        self.total_extra += extra_applied;
    }

    pub fn is_paid_off(&self) -> bool {
        self.balance <= 0.0
    }
}

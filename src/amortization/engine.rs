//! Core amortization engine: rate conversion, fixed installment and schedule generation

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::schedule::{AmortizationResult, AmortizationSummary, PaymentRow, PaymentStatus};
use super::state::ScheduleState;
use crate::error::{AmortizationError, Result};
use crate::loan::{add_months, validate_extra_payments, ExtraPayment, LoanParams, Strategy};

/// Balance at or below which a loan counts as paid off
pub const PAYOFF_TOLERANCE: f64 = 0.01;

/// Rows reserved up front; longer schedules grow as they go
const MAX_PREALLOCATED_ROWS: u32 = 1200;

/// Convert an annual effective rate (E.A.) to its monthly effective equivalent (E.M.)
///
/// `(1 + annual)^(1/12) - 1`. Defined for any rate greater than -1.
pub fn monthly_rate_from_annual(annual_effective_rate: f64) -> f64 {
    (1.0 + annual_effective_rate).powf(1.0 / 12.0) - 1.0
}

/// Level installment that amortizes `principal` over `term_months`
///
/// `principal * r / (1 - (1 + r)^-n)`. A zero monthly rate or a zero term
/// would divide by zero and is rejected, as is a principal that is not a
/// positive amount.
pub fn fixed_installment(principal: f64, monthly_rate: f64, term_months: u32) -> Result<f64> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(AmortizationError::loan(
            "principal",
            format!("must be a positive amount, got {}", principal),
        ));
    }
    if monthly_rate == 0.0 {
        return Err(AmortizationError::loan(
            "annual_effective_rate",
            "a zero rate has no fixed installment",
        ));
    }
    if term_months == 0 {
        return Err(AmortizationError::loan("term_months", "must be at least one month"));
    }

    let installment =
        principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-(term_months as f64)));

    if !installment.is_finite() {
        return Err(AmortizationError::loan(
            "annual_effective_rate",
            format!("installment is not finite for monthly rate {}", monthly_rate),
        ));
    }
    Ok(installment)
}

/// Sum extra payment amounts per period
///
/// Several entries for the same period add together.
pub fn group_extra_payments(payments: &[ExtraPayment]) -> BTreeMap<u32, f64> {
    let mut by_period = BTreeMap::new();
    for payment in payments {
        *by_period.entry(payment.period).or_insert(0.0) += payment.amount;
    }
    by_period
}

/// Totals of one schedule pass, kept unrounded for the summary
struct SchedulePass {
    rows: Vec<PaymentRow>,
    total_interest: f64,
    total_extra: f64,
}

/// Generate a schedule from `start_date`, applying `extras_by_period`
///
/// Stops once the balance is within [`PAYOFF_TOLERANCE`] of zero or after
/// `term_months` installments, whichever comes first. Row statuses are
/// evaluated against `today`.
pub fn build_schedule(
    principal: f64,
    monthly_rate: f64,
    installment: f64,
    term_months: u32,
    start_date: NaiveDate,
    extras_by_period: &BTreeMap<u32, f64>,
    today: NaiveDate,
) -> Result<Vec<PaymentRow>> {
    run_schedule(
        principal,
        monthly_rate,
        installment,
        term_months,
        start_date,
        extras_by_period,
        today,
    )
    .map(|pass| pass.rows)
}

fn run_schedule(
    principal: f64,
    monthly_rate: f64,
    installment: f64,
    term_months: u32,
    start_date: NaiveDate,
    extras_by_period: &BTreeMap<u32, f64>,
    today: NaiveDate,
) -> Result<SchedulePass> {
    let mut state = ScheduleState::from_principal(principal);
    let mut rows = Vec::with_capacity(term_months.min(MAX_PREALLOCATED_ROWS) as usize);

    while state.is_open(term_months, PAYOFF_TOLERANCE) {
        state.advance_period();
        let period = state.period;
        let date = add_months(start_date, period)?;

        let interest = state.balance * monthly_rate;
        let requested_extra = extras_by_period.get(&period).copied().unwrap_or(0.0);

        let scheduled_principal = (installment - interest).min(state.balance);
        let uncapped_principal = installment - interest + requested_extra;
        let principal_portion = uncapped_principal.min(state.balance);

        // Only the part of the extra the balance can absorb counts as paid
        let extra_applied = if uncapped_principal <= state.balance {
            requested_extra
        } else {
            (state.balance - scheduled_principal).max(0.0)
        };

        state.apply(interest, principal_portion, extra_applied);

        // A payoff row only charges what was left to pay out of pocket
        let own_pocket = interest + principal_portion - extra_applied;
        let installment_amount = if state.is_paid_off() && own_pocket < installment {
            own_pocket
        } else {
            installment
        };

        rows.push(PaymentRow {
            period,
            date,
            installment_amount: installment_amount.round(),
            interest_portion: interest.round(),
            principal_portion: principal_portion.round(),
            extra_portion: extra_applied.round(),
            ending_balance: state.balance.round(),
            status: PaymentStatus::on(date, today),
        });

        if state.is_paid_off() {
            break;
        }
    }

    Ok(SchedulePass {
        rows,
        total_interest: state.total_interest,
        total_extra: state.total_extra,
    })
}

/// Compute both schedules and the summary, with statuses as of the local date
pub fn compute_amortization(
    params: &LoanParams,
    extra_payments: &[ExtraPayment],
) -> Result<AmortizationResult> {
    let today = chrono::Local::now().date_naive();
    compute_amortization_as_of(params, extra_payments, today)
}

/// Compute both schedules and the summary, with statuses as of `today`
pub fn compute_amortization_as_of(
    params: &LoanParams,
    extra_payments: &[ExtraPayment],
    today: NaiveDate,
) -> Result<AmortizationResult> {
    params.validate()?;
    validate_extra_payments(extra_payments)?;

    if params.strategy == Strategy::ReduceInstallment {
        log::debug!("ReduceInstallment strategy requested; extra payments reduce the term");
    }

    let monthly_rate = monthly_rate_from_annual(params.annual_effective_rate);
    let installment = fixed_installment(params.principal, monthly_rate, params.term_months)?;
    log::debug!(
        "E.A. {:.6} -> E.M. {:.8}, installment {:.2} over {} months",
        params.annual_effective_rate,
        monthly_rate,
        installment,
        params.term_months
    );

    let baseline = run_schedule(
        params.principal,
        monthly_rate,
        installment,
        params.term_months,
        params.disbursement_date,
        &BTreeMap::new(),
        today,
    )?;

    let extras_by_period = group_extra_payments(extra_payments);
    let with_extras = run_schedule(
        params.principal,
        monthly_rate,
        installment,
        params.term_months,
        params.disbursement_date,
        &extras_by_period,
        today,
    )?;

    log::debug!(
        "Schedules built: baseline {} rows, with extras {} rows",
        baseline.rows.len(),
        with_extras.rows.len()
    );

    let summary = summarize(params, installment, &baseline, &with_extras);

    Ok(AmortizationResult {
        schedule_with_extras: with_extras.rows,
        schedule_baseline: baseline.rows,
        summary,
    })
}

fn summarize(
    params: &LoanParams,
    installment: f64,
    baseline: &SchedulePass,
    with_extras: &SchedulePass,
) -> AmortizationSummary {
    let actual_term = with_extras.rows.len() as u32;
    let interest_saved = baseline.total_interest - with_extras.total_interest;
    let percent_saved = if baseline.total_interest != 0.0 {
        interest_saved / baseline.total_interest * 100.0
    } else {
        0.0
    };

    let payoff_date = |rows: &[PaymentRow]| {
        rows.last()
            .map(|r| r.date)
            .unwrap_or(params.disbursement_date)
    };

    AmortizationSummary {
        fixed_installment: installment.round(),
        actual_term,
        baseline_term: params.term_months,
        months_saved: params.term_months.saturating_sub(actual_term),
        total_interest_baseline: baseline.total_interest.round(),
        total_interest_with_extras: with_extras.total_interest.round(),
        interest_saved: interest_saved.round(),
        percent_saved,
        total_extra_paid: with_extras.total_extra.round(),
        total_paid_baseline: (params.principal + baseline.total_interest).round(),
        total_paid_with_extras: (params.principal + with_extras.total_interest).round(),
        payoff_date_baseline: payoff_date(&baseline.rows),
        payoff_date_with_extras: payoff_date(&with_extras.rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 10, 18)
    }

    fn demo_loan() -> LoanParams {
        LoanParams::new(101_400_000.0, 0.1201, 180, date(2025, 3, 25))
    }

    #[test]
    fn test_rate_conversion_round_trip() {
        for &annual in &[-0.5, -0.01, 0.0001, 0.05, 0.1201, 0.3, 1.0, 4.5] {
            let monthly = monthly_rate_from_annual(annual);
            assert_relative_eq!((1.0 + monthly).powi(12) - 1.0, annual, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_fixed_installment_formula() {
        let monthly = monthly_rate_from_annual(0.1201);
        assert!(monthly > 0.0094 && monthly < 0.0096);

        let installment = fixed_installment(101_400_000.0, monthly, 180).unwrap();
        let expected = 101_400_000.0 * monthly / (1.0 - (1.0 + monthly).powi(-180));
        assert_relative_eq!(installment, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_fixed_installment_rejects_zero_rate() {
        assert!(matches!(
            fixed_installment(1_000.0, 0.0, 12),
            Err(AmortizationError::InvalidLoanParameters { .. })
        ));
        assert!(fixed_installment(1_000.0, 0.01, 0).is_err());
    }

    #[test]
    fn test_fixed_installment_rejects_non_positive_principal() {
        for principal in [-1_000_000.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                fixed_installment(principal, 0.01, 12),
                Err(AmortizationError::InvalidLoanParameters { ref field, .. }) if field == "principal"
            ));
        }
    }

    #[test]
    fn test_undatable_term_is_rejected_before_scheduling() {
        let loan = LoanParams::new(1_000_000.0, 0.12, u32::MAX, date(2025, 1, 1));
        assert!(matches!(
            compute_amortization_as_of(&loan, &[], today()),
            Err(AmortizationError::InvalidLoanParameters { ref field, .. }) if field == "term_months"
        ));
    }

    #[test]
    fn test_build_schedule_with_huge_term_stops_at_payoff() {
        let monthly = monthly_rate_from_annual(0.12);
        let installment = fixed_installment(1_000.0, monthly, 6).unwrap();
        let rows = build_schedule(
            1_000.0,
            monthly,
            installment,
            u32::MAX,
            date(2025, 1, 15),
            &BTreeMap::new(),
            today(),
        )
        .unwrap();

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5].ending_balance, 0.0);
    }

    #[test]
    fn test_baseline_runs_full_term() {
        let result = compute_amortization_as_of(&demo_loan(), &[], today()).unwrap();
        let baseline = &result.schedule_baseline;

        assert_eq!(baseline.len(), 180);
        assert_eq!(baseline[0].date, date(2025, 4, 25));
        assert_eq!(baseline[179].date, date(2040, 3, 25));
        assert!(baseline.last().unwrap().ending_balance.abs() <= PAYOFF_TOLERANCE);
        assert_eq!(result.summary.payoff_date_baseline, date(2040, 3, 25));

        let monthly = monthly_rate_from_annual(0.1201);
        let installment = fixed_installment(101_400_000.0, monthly, 180).unwrap();
        assert_eq!(result.summary.fixed_installment, installment.round());
        assert_eq!(baseline[0].installment_amount, installment.round());
        assert_eq!(baseline[0].interest_portion, (101_400_000.0 * monthly).round());
    }

    #[test]
    fn test_no_extras_gives_identical_schedules() {
        let result = compute_amortization_as_of(&demo_loan(), &[], today()).unwrap();
        assert_eq!(result.schedule_with_extras, result.schedule_baseline);
        assert_eq!(result.summary.months_saved, 0);
        assert_eq!(result.summary.interest_saved, 0.0);
        assert_eq!(result.summary.total_extra_paid, 0.0);
        assert_eq!(result.summary.percent_saved, 0.0);
    }

    #[test]
    fn test_single_extra_payment_shortens_term() {
        let loan = demo_loan();
        let extras = vec![ExtraPayment::new(1, 650_000.0, date(2025, 3, 12))];
        let result = compute_amortization_as_of(&loan, &extras, today()).unwrap();

        let first = &result.schedule_with_extras[0];
        let base_first = &result.schedule_baseline[0];
        assert_eq!(first.extra_portion, 650_000.0);
        assert_eq!(first.principal_portion, base_first.principal_portion + 650_000.0);
        assert_eq!(first.installment_amount, base_first.installment_amount);

        assert!(result.summary.actual_term < 180);
        assert_eq!(result.summary.months_saved, 180 - result.summary.actual_term);
        assert!(result.summary.interest_saved > 0.0);
        assert!(result.summary.percent_saved > 0.0);
        assert_eq!(result.summary.total_extra_paid, 650_000.0);
    }

    #[test]
    fn test_extra_exceeding_balance_is_capped() {
        let loan = LoanParams::new(10_000_000.0, 0.12, 60, date(2025, 1, 10));
        let extras = vec![ExtraPayment::new(3, 50_000_000.0, date(2025, 3, 1))];
        let result = compute_amortization_as_of(&loan, &extras, today()).unwrap();
        let rows = &result.schedule_with_extras;

        assert_eq!(rows.len(), 3);
        let last = &rows[2];
        assert_eq!(last.principal_portion, rows[1].ending_balance);
        assert_eq!(last.ending_balance, 0.0);
        assert!(last.extra_portion < 50_000_000.0);
        // Only the part above the scheduled principal is recorded as extra
        assert_relative_eq!(
            last.extra_portion,
            last.principal_portion - (result.summary.fixed_installment - last.interest_portion),
            epsilon = 2.0
        );
        assert_eq!(result.summary.total_extra_paid, last.extra_portion);
        assert!(last.installment_amount <= result.summary.fixed_installment);
        assert!(last.installment_amount >= 0.0);
        assert_eq!(result.summary.actual_term, 3);
        assert_eq!(result.summary.payoff_date_with_extras, date(2025, 4, 10));
    }

    #[test]
    fn test_same_period_extras_are_summed() {
        let loan = demo_loan();
        let extras = vec![
            ExtraPayment::new(3, 100_000.0, date(2025, 5, 1)),
            ExtraPayment::new(3, 200_000.0, date(2025, 5, 2)),
        ];
        let result = compute_amortization_as_of(&loan, &extras, today()).unwrap();

        assert_eq!(result.schedule_with_extras[2].extra_portion, 300_000.0);
        assert_eq!(result.schedule_with_extras[1].extra_portion, 0.0);

        let grouped = group_extra_payments(&extras);
        assert_eq!(grouped.get(&3), Some(&300_000.0));
        assert_eq!(grouped.len(), 1);
    }

    #[test]
    fn test_final_row_installment_is_trued_up() {
        let loan = LoanParams::new(12_000.0, 0.1, 12, date(2025, 1, 1));
        let extras = vec![ExtraPayment::new(2, 8_000.0, date(2025, 2, 1))];
        let result = compute_amortization_as_of(&loan, &extras, today()).unwrap();
        let rows = &result.schedule_with_extras;
        let last = rows.last().unwrap();

        assert!(rows.len() < 12);
        assert_eq!(last.ending_balance, 0.0);
        assert!(last.installment_amount < result.summary.fixed_installment);
        assert_relative_eq!(
            last.installment_amount,
            last.interest_portion + last.principal_portion - last.extra_portion,
            epsilon = 2.0
        );
    }

    #[test]
    fn test_balances_are_non_increasing() {
        let extras = crate::loan::demo_extra_payments();
        let result = compute_amortization_as_of(&demo_loan(), &extras, today()).unwrap();

        for schedule in [&result.schedule_with_extras, &result.schedule_baseline] {
            for pair in schedule.windows(2) {
                assert!(pair[1].ending_balance <= pair[0].ending_balance);
            }
            assert!(schedule.last().unwrap().ending_balance.abs() <= PAYOFF_TOLERANCE);
        }
        assert!(result.schedule_with_extras.len() <= result.schedule_baseline.len());
    }

    #[test]
    fn test_extra_beyond_horizon_has_no_effect() {
        let loan = LoanParams::new(1_000_000.0, 0.12, 12, date(2025, 1, 1));
        let extras = vec![ExtraPayment::new(40, 5_000.0, date(2025, 1, 1))];
        let result = compute_amortization_as_of(&loan, &extras, today()).unwrap();

        assert_eq!(result.schedule_with_extras, result.schedule_baseline);
        assert_eq!(result.summary.total_extra_paid, 0.0);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let zero_rate = LoanParams::new(1_000_000.0, 0.0, 12, date(2025, 1, 1));
        assert!(matches!(
            compute_amortization_as_of(&zero_rate, &[], today()),
            Err(AmortizationError::InvalidLoanParameters { .. })
        ));

        let loan = LoanParams::new(1_000_000.0, 0.12, 12, date(2025, 1, 1));
        let negative = vec![ExtraPayment::new(2, -5.0, date(2025, 1, 1))];
        assert!(matches!(
            compute_amortization_as_of(&loan, &negative, today()),
            Err(AmortizationError::InvalidExtraPayment { period: 2, .. })
        ));
    }

    #[test]
    fn test_statuses_follow_today() {
        let result = compute_amortization_as_of(&demo_loan(), &[], date(2025, 6, 3)).unwrap();
        let rows = &result.schedule_baseline;
        assert_eq!(rows[0].status, PaymentStatus::Paid);
        assert_eq!(rows[1].status, PaymentStatus::Paid);
        assert_eq!(rows[2].status, PaymentStatus::Upcoming);
        assert_eq!(rows[3].status, PaymentStatus::Pending);
    }

    #[test]
    fn test_build_schedule_directly() {
        let monthly = monthly_rate_from_annual(0.12);
        let installment = fixed_installment(1_000.0, monthly, 6).unwrap();
        let rows = build_schedule(
            1_000.0,
            monthly,
            installment,
            6,
            date(2025, 1, 15),
            &BTreeMap::new(),
            today(),
        )
        .unwrap();

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5].ending_balance, 0.0);
        assert!(rows.iter().all(|r| r.extra_portion == 0.0));
    }
}

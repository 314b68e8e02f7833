//! Fixed-rate amortization and refinance savings.
//!
//! All math is `Decimal`. Monthly rates are reported to 6 places, currency to
//! whole units. Savings are taken from the rounded payments so that
//! `estimated_savings == current_payment - estimated_new_payment` holds exactly.

use crate::domain::model::{DerivedFields, LoanInputs};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{require_non_negative, require_positive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// 30 年 × 12 期
pub const TERM_MONTHS: u32 = 360;

const RATE_DISPLAY_DP: u32 = 6;

/// annual percent (6.5) → monthly decimal rate (0.0054166…)
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / dec!(100) / dec!(12)
}

/// (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
/// `None` once the product leaves the `Decimal` range.
fn compound(rate: Decimal, n: u32) -> Option<Decimal> {
    let factor = Decimal::ONE + rate;
    (0..n).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(factor))
}

/// Level monthly payment of a fully amortizing loan over [`TERM_MONTHS`].
pub fn monthly_payment(loan_amount: Decimal, monthly_rate: Decimal) -> Result<Decimal> {
    amortize("monthlyRate", loan_amount, monthly_rate)
}

fn amortize(field: &str, loan_amount: Decimal, monthly_rate: Decimal) -> Result<Decimal> {
    require_positive("loanAmount", loan_amount)?;
    require_positive(field, monthly_rate)?;

    let too_large = || AppError::invalid_input(field, "too large to amortize");

    let factor = compound(monthly_rate, TERM_MONTHS).ok_or_else(too_large)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(AppError::invalid_input(field, "rate too small to amortize"));
    }

    monthly_rate
        .checked_mul(factor)
        .and_then(|scaled| loan_amount.checked_mul(scaled))
        .and_then(|numerator| numerator.checked_div(denominator))
        .ok_or_else(too_large)
}

pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// `N.NN%`
pub fn format_percent(percent: Decimal) -> String {
    format!(
        "{:.2}%",
        percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Derived field set for one borrower at the given market rate.
pub fn calculate(inputs: &LoanInputs, market_rate_percent: Decimal) -> Result<DerivedFields> {
    let loan_amount = require_positive("currentLoanAmount", inputs.loan_amount)?;
    let annual_rate = require_positive("currentInterestRate", inputs.annual_rate_percent)?;
    let desired = require_non_negative("desiredMonthlySavings", inputs.desired_monthly_savings)?;
    let market_rate = require_positive("marketRate", market_rate_percent)?;

    let current_monthly = monthly_rate(annual_rate);
    let market_monthly = monthly_rate(market_rate);

    let current_payment = round_currency(amortize(
        "currentInterestRate",
        loan_amount,
        current_monthly,
    )?);
    let estimated_new_payment =
        round_currency(amortize("marketRate", loan_amount, market_monthly)?);
    let estimated_savings = current_payment - estimated_new_payment;

    Ok(DerivedFields {
        current_monthly_rate: round_rate(current_monthly),
        current_payment,
        market_rate_at_entry_time: format_percent(market_rate),
        market_monthly_rate: round_rate(market_monthly),
        estimated_new_payment,
        estimated_savings,
        refi_opportunity: estimated_savings >= desired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(loan: Decimal, rate: Decimal, desired: Decimal) -> LoanInputs {
        LoanInputs {
            loan_amount: loan,
            annual_rate_percent: rate,
            desired_monthly_savings: desired,
        }
    }

    #[test]
    fn test_smith_scenario() {
        let result = calculate(&inputs(dec!(300000), dec!(6.5), dec!(100)), dec!(5.00)).unwrap();

        assert_eq!(result.current_monthly_rate, dec!(0.005417));
        assert_eq!(result.current_payment, dec!(1896));
        assert_eq!(result.market_rate_at_entry_time, "5.00%");
        assert_eq!(result.market_monthly_rate, dec!(0.004167));
        assert_eq!(result.estimated_new_payment, dec!(1610));
        assert_eq!(result.estimated_savings, dec!(286));
        assert!(result.refi_opportunity);
    }

    #[test]
    fn test_payment_matches_known_value() {
        // 200k @ 6% / 30y ≈ 1199.10
        let payment = monthly_payment(dec!(200000), monthly_rate(dec!(6))).unwrap();
        assert!((payment - dec!(1199.10)).abs() < dec!(0.01));
    }

    #[test]
    fn test_payment_positive_and_increasing_in_rate() {
        let loan = dec!(250000);
        let mut previous = Decimal::ZERO;
        for tenths in 1..=150 {
            let rate = Decimal::new(tenths, 1);
            let payment = monthly_payment(loan, monthly_rate(rate)).unwrap();
            assert!(payment > Decimal::ZERO);
            assert!(payment > previous, "payment not increasing at {}%", rate);
            previous = payment;
        }
    }

    #[test]
    fn test_savings_is_exact_difference() {
        for (loan, rate, market) in [
            (dec!(123456.78), dec!(7.25), dec!(6.1)),
            (dec!(90000), dec!(3.0), dec!(6.75)),
            (dec!(1000000), dec!(4.99), dec!(4.99)),
        ] {
            let r = calculate(&inputs(loan, rate, dec!(0)), market).unwrap();
            assert_eq!(r.estimated_savings, r.current_payment - r.estimated_new_payment);
        }
    }

    #[test]
    fn test_refi_boundary_counts_equal_as_opportunity() {
        let r = calculate(&inputs(dec!(300000), dec!(6.5), dec!(286)), dec!(5)).unwrap();
        assert!(r.refi_opportunity);

        let r = calculate(&inputs(dec!(300000), dec!(6.5), dec!(287)), dec!(5)).unwrap();
        assert!(!r.refi_opportunity);
    }

    #[test]
    fn test_negative_savings_when_market_is_higher() {
        let r = calculate(&inputs(dec!(300000), dec!(3), dec!(0)), dec!(6)).unwrap();
        assert!(r.estimated_savings < Decimal::ZERO);
        assert!(!r.refi_opportunity);
    }

    #[test]
    fn test_zero_inputs_are_rejected_with_field_name() {
        let err = calculate(&inputs(dec!(0), dec!(6.5), dec!(100)), dec!(5)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "currentLoanAmount"));

        let err = calculate(&inputs(dec!(300000), dec!(0), dec!(100)), dec!(5)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "currentInterestRate"));

        let err = calculate(&inputs(dec!(300000), dec!(6.5), dec!(-1)), dec!(5)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "desiredMonthlySavings"));

        assert!(calculate(&inputs(dec!(300000), dec!(6.5), dec!(0)), dec!(0)).is_err());
    }

    #[test]
    fn test_extreme_rate_is_rejected_not_overflowed() {
        let err = calculate(&inputs(dec!(300000), dec!(250), dec!(0)), dec!(5)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidInput { ref field, ref reason }
                if field == "currentInterestRate" && reason == "too large to amortize"
        ));

        let err = calculate(&inputs(dec!(300000), dec!(6.5), dec!(0)), dec!(1000)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "marketRate"));

        assert!(monthly_payment(dec!(300000), monthly_rate(dec!(400))).is_err());
    }

    #[test]
    fn test_high_but_finite_rate_still_amortizes() {
        let r = calculate(&inputs(dec!(100000), dec!(200), dec!(0)), dec!(5)).unwrap();
        assert!(r.current_payment > dec!(16000));
    }

    #[test]
    fn test_deterministic() {
        let i = inputs(dec!(412000), dec!(7.125), dec!(150));
        assert_eq!(calculate(&i, dec!(6.32)).unwrap(), calculate(&i, dec!(6.32)).unwrap());
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(5)), "5.00%");
        assert_eq!(format_percent(dec!(6.125)), "6.13%");
    }
}

//! Financial rules for the loan lifecycle
//!
//! Pure functions over a loan record and an explicit reference time. Every
//! function clamps negative or non-finite inputs to zero so a malformed loan
//! can never push NaN into stored fields.

use chrono::{DateTime, Duration, Utc};

use crate::models::{BillingFrequency, Loan};

/// Flat late-fee per day overdue, in the tenant's currency unit
pub const LATE_FEE_PER_DAY: f64 = 50.0;

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Whole days the loan is past due as of `as_of`; zero when not yet due.
///
/// Partial days count as a full day (ceiling), matching how the billing
/// screens report overdue time.
pub fn days_late(loan: &Loan, as_of: DateTime<Utc>) -> i64 {
    let overdue_secs = (as_of - loan.next_due_date).num_seconds();
    if overdue_secs <= 0 {
        return 0;
    }
    // Integer ceiling of seconds / 86400
    (overdue_secs + 86_399) / 86_400
}

/// Accrued late fee as of `as_of`
pub fn late_fee(loan: &Loan, as_of: DateTime<Utc>) -> f64 {
    days_late(loan, as_of) as f64 * LATE_FEE_PER_DAY
}

/// Interest due for one cycle, without penalties
pub fn interest_due(loan: &Loan) -> f64 {
    sanitize(loan.principal) * sanitize(loan.rate_percent) / 100.0
}

/// Principal plus one cycle of interest plus accrued late fee
pub fn total_with_penalty(loan: &Loan, as_of: DateTime<Utc>) -> f64 {
    sanitize(loan.principal) * (1.0 + sanitize(loan.rate_percent) / 100.0) + late_fee(loan, as_of)
}

/// Cycle interest plus accrued late fee (the renewal price)
pub fn interest_with_penalty(loan: &Loan, as_of: DateTime<Utc>) -> f64 {
    interest_due(loan) + late_fee(loan, as_of)
}

/// Due date after a renewal: one cycle past the later of the current due
/// date and `as_of`. Always strictly later than that base.
pub fn next_due_date_on_renewal(loan: &Loan, as_of: DateTime<Utc>) -> DateTime<Utc> {
    let base = loan.next_due_date.max(as_of);
    base + Duration::days(loan.frequency.cycle_days())
}

/// Contracted total: round(principal * (1 + rate/100))
pub fn principal_plus_interest(principal: f64, rate_percent: f64) -> f64 {
    (sanitize(principal) * (1.0 + sanitize(rate_percent) / 100.0)).round()
}

/// First due date of a new contract
pub fn initial_due_date(contract_date: DateTime<Utc>, frequency: BillingFrequency) -> DateTime<Utc> {
    contract_date + Duration::days(frequency.cycle_days())
}

/// Outstanding balance, never negative
pub fn outstanding_balance(principal_plus_interest: f64, amount_paid: f64) -> f64 {
    (sanitize(principal_plus_interest) - sanitize(amount_paid)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;
    use chrono::TimeZone;

    fn loan_due(next_due_date: DateTime<Utc>) -> Loan {
        Loan {
            id: 1,
            client_id: 1,
            client_name: "Ana Paula Costa".to_string(),
            principal: 2000.0,
            rate_percent: 20.0,
            principal_plus_interest: 2400.0,
            contract_date: Utc.with_ymd_and_hms(2024, 9, 20, 12, 0, 0).unwrap(),
            next_due_date,
            frequency: BillingFrequency::Biweekly,
            status: LoanStatus::Active,
            amount_paid: 0.0,
            outstanding_balance: 2400.0,
            missed_cycles: 0,
            notes: String::new(),
        }
    }

    #[test]
    fn test_days_late_three_days_overdue() {
        let now = Utc.with_ymd_and_hms(2024, 12, 28, 12, 0, 0).unwrap();
        let loan = loan_due(Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap());
        assert_eq!(days_late(&loan, now), 3);
        assert_eq!(late_fee(&loan, now), 3.0 * LATE_FEE_PER_DAY);
    }

    #[test]
    fn test_days_late_partial_day_rounds_up() {
        let loan = loan_due(Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2024, 12, 25, 18, 0, 0).unwrap();
        assert_eq!(days_late(&loan, now), 1);
    }

    #[test]
    fn test_days_late_zero_when_not_due() {
        let now = Utc.with_ymd_and_hms(2024, 12, 20, 12, 0, 0).unwrap();
        let loan = loan_due(Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap());
        assert_eq!(days_late(&loan, now), 0);
        assert_eq!(late_fee(&loan, now), 0.0);

        // Due exactly now is not late
        assert_eq!(days_late(&loan_due(now), now), 0);
    }

    #[test]
    fn test_interest_and_totals() {
        let now = Utc.with_ymd_and_hms(2024, 12, 28, 12, 0, 0).unwrap();
        let loan = loan_due(Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap());

        assert_eq!(interest_due(&loan), 400.0);
        assert_eq!(total_with_penalty(&loan, now), 2400.0 + 150.0);
        assert_eq!(interest_with_penalty(&loan, now), 400.0 + 150.0);
    }

    #[test]
    fn test_principal_plus_interest_rounds() {
        assert_eq!(principal_plus_interest(5000.0, 15.0), 5750.0);
        assert_eq!(principal_plus_interest(2000.0, 20.0), 2400.0);
        assert_eq!(principal_plus_interest(1001.0, 15.5), 1156.0); // 1156.155
    }

    #[test]
    fn test_negative_inputs_treated_as_zero() {
        let mut loan = loan_due(Utc::now());
        loan.principal = -500.0;
        loan.rate_percent = f64::NAN;

        assert_eq!(interest_due(&loan), 0.0);
        assert_eq!(total_with_penalty(&loan, Utc::now()), 0.0);
        assert_eq!(principal_plus_interest(-1.0, 10.0), 0.0);
        assert!(principal_plus_interest(100.0, f64::NAN).is_finite());
    }

    #[test]
    fn test_renewal_from_future_due_date() {
        let now = Utc.with_ymd_and_hms(2024, 12, 20, 12, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap();
        let loan = loan_due(due);

        let renewed = next_due_date_on_renewal(&loan, now);
        assert_eq!(renewed, due + Duration::days(15));
        assert!(renewed > due.max(now));
    }

    #[test]
    fn test_renewal_from_past_due_date_uses_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let mut loan = loan_due(Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap());

        assert_eq!(
            next_due_date_on_renewal(&loan, now),
            now + Duration::days(15)
        );

        loan.frequency = BillingFrequency::Monthly;
        assert_eq!(
            next_due_date_on_renewal(&loan, now),
            now + Duration::days(30)
        );
    }

    #[test]
    fn test_outstanding_balance_clamped() {
        assert_eq!(outstanding_balance(5750.0, 0.0), 5750.0);
        assert_eq!(outstanding_balance(2400.0, 2400.0), 0.0);
        assert_eq!(outstanding_balance(1000.0, 1500.0), 0.0);
    }

    #[test]
    fn test_initial_due_date() {
        let contract = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(
            initial_due_date(contract, BillingFrequency::Biweekly),
            contract + Duration::days(15)
        );
        assert_eq!(
            initial_due_date(contract, BillingFrequency::Monthly),
            contract + Duration::days(30)
        );
    }
}

//! Dashboard analytics
//!
//! Pure aggregation over a document snapshot; no I/O. The delinquency rate
//! counts non-paid loans whose due date has passed, matching what the
//! dashboard screen reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{ClientStatus, Document, LoanStatus};

/// Headline numbers for the dashboard
#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub total_lent: f64,
    pub total_received: f64,
    pub outstanding_balance: f64,
    pub active_loans: usize,
    /// Active and not yet due
    pub pending_loans: usize,
    pub overdue_loans: usize,
    pub paid_loans: usize,
    /// Percentage of non-paid loans past their due date
    pub delinquency_rate: f64,
    pub active_clients: usize,
    pub average_income: f64,
    pub average_score: f64,
}

/// Compute the dashboard summary for a snapshot at `as_of`
pub fn dashboard_summary(document: &Document, as_of: DateTime<Utc>) -> DashboardSummary {
    let loans = &document.loans;

    let total_lent: f64 = loans.iter().map(|l| l.principal).sum();
    let total_received: f64 = loans.iter().map(|l| l.amount_paid).sum();

    let overdue: usize = loans
        .iter()
        .filter(|l| l.status != LoanStatus::Paid && l.next_due_date < as_of)
        .count();

    let delinquency_rate = if loans.is_empty() {
        0.0
    } else {
        overdue as f64 / loans.len() as f64 * 100.0
    };

    let clients = &document.clients;
    let (average_income, average_score) = if clients.is_empty() {
        (0.0, 0.0)
    } else {
        (
            clients.iter().map(|c| c.income).sum::<f64>() / clients.len() as f64,
            clients.iter().map(|c| c.score as f64).sum::<f64>() / clients.len() as f64,
        )
    };

    DashboardSummary {
        total_lent,
        total_received,
        outstanding_balance: total_lent - total_received,
        active_loans: loans.iter().filter(|l| l.status == LoanStatus::Active).count(),
        pending_loans: loans
            .iter()
            .filter(|l| l.status == LoanStatus::Active && l.next_due_date > as_of)
            .count(),
        overdue_loans: overdue,
        paid_loans: loans.iter().filter(|l| l.status == LoanStatus::Paid).count(),
        delinquency_rate,
        active_clients: clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        average_income,
        average_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingFrequency, Client, Loan};
    use chrono::{Duration, TimeZone};

    fn sample_document(as_of: DateTime<Utc>) -> Document {
        let loan = |id: i64, status: LoanStatus, due: DateTime<Utc>, principal: f64, paid: f64| Loan {
            id,
            client_id: 1,
            client_name: "Maria".to_string(),
            principal,
            rate_percent: 15.0,
            principal_plus_interest: principal * 1.15,
            contract_date: as_of - Duration::days(60),
            next_due_date: due,
            frequency: BillingFrequency::Monthly,
            status,
            amount_paid: paid,
            outstanding_balance: principal * 1.15 - paid,
            missed_cycles: 0,
            notes: String::new(),
        };

        Document {
            loans: vec![
                loan(1, LoanStatus::Active, as_of + Duration::days(7), 5000.0, 1150.0),
                loan(2, LoanStatus::Active, as_of - Duration::days(2), 3000.0, 708.0),
                loan(3, LoanStatus::Paid, as_of - Duration::days(30), 2000.0, 2400.0),
            ],
            clients: vec![
                Client {
                    id: 1,
                    name: "Maria".to_string(),
                    tax_id: String::new(),
                    phone: String::new(),
                    email: String::new(),
                    address: String::new(),
                    income: 3500.0,
                    registered_at: as_of,
                    score: 750,
                    status: ClientStatus::Active,
                },
                Client {
                    id: 2,
                    name: "João".to_string(),
                    tax_id: String::new(),
                    phone: String::new(),
                    email: String::new(),
                    address: String::new(),
                    income: 4500.0,
                    registered_at: as_of,
                    score: 650,
                    status: ClientStatus::Blocked,
                },
            ],
            last_updated: as_of,
            version: 1,
        }
    }

    #[test]
    fn test_dashboard_summary() {
        let as_of = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let summary = dashboard_summary(&sample_document(as_of), as_of);

        assert_eq!(summary.total_lent, 10000.0);
        assert_eq!(summary.total_received, 1150.0 + 708.0 + 2400.0);
        assert_eq!(summary.active_loans, 2);
        assert_eq!(summary.pending_loans, 1);
        assert_eq!(summary.overdue_loans, 1);
        assert_eq!(summary.paid_loans, 1);
        assert!((summary.delinquency_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.active_clients, 1);
        assert_eq!(summary.average_income, 4000.0);
        assert_eq!(summary.average_score, 700.0);
    }

    #[test]
    fn test_empty_document_has_zero_rates() {
        let as_of = Utc::now();
        let summary = dashboard_summary(&Document::empty(), as_of);
        assert_eq!(summary.delinquency_rate, 0.0);
        assert_eq!(summary.average_income, 0.0);
        assert_eq!(summary.total_lent, 0.0);
    }
}

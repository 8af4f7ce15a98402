//! Domain service layer - business logic for clients, loans, and payments
//!
//! Every mutation validates first, computes derived fields through the
//! financial rules, then delegates persistence to the sync engine. Reads are
//! served from the engine's current snapshot; consumers that need a live
//! view subscribe to the document feed.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use validator::Validate;

use crate::cache::LocalCache;
use crate::error::{ApiError, ApiResult};
use crate::finance;
use crate::models::{
    BillingFrequency, Client, ClientStatus, CreateClientRequest, CreateLoanRequest, Document,
    Loan, LoanStatus, Payment, PaymentKind, RecordPaymentRequest,
};
use crate::normalize;
use crate::sync::SyncEngine;

/// Aggregates over the payment log
#[derive(Debug, Serialize)]
pub struct PaymentStats {
    pub payments_today: usize,
    pub amount_today: f64,
    pub payments_this_month: usize,
    pub amount_this_month: f64,
    pub interest_received: f64,
    pub settlements: usize,
}

pub struct DomainService {
    sync: Arc<SyncEngine>,
    cache: LocalCache,
    payments: RwLock<Vec<Payment>>,
}

impl DomainService {
    pub fn new(sync: Arc<SyncEngine>, cache: LocalCache) -> Self {
        Self {
            sync,
            cache,
            payments: RwLock::new(Vec::new()),
        }
    }

    /// Load the payment log and drop entries whose loan no longer exists
    pub async fn init(&self) {
        let loaded = self.cache.load_payments().await;
        *self.payments.write().await = loaded;
        self.prune_orphan_payments().await;
    }

    // ===== Clients =====

    pub async fn list_clients(&self) -> Vec<Client> {
        self.sync.snapshot().await.clients
    }

    /// Register a client: next id is max(existing, 0) + 1, registration is
    /// stamped now, status defaults to active. Income accepts locale strings.
    pub async fn add_client(&self, request: CreateClientRequest) -> ApiResult<Client> {
        request.validate()?;

        let income = request
            .income
            .as_ref()
            .map(normalize::coerce_number)
            .unwrap_or(0.0);

        let mut created: Option<Client> = None;
        self.sync
            .mutate(|doc| {
                let id = doc.clients.iter().map(|c| c.id).max().unwrap_or(0) + 1;
                let client = Client {
                    id,
                    name: request.name.clone(),
                    tax_id: request.tax_id.clone(),
                    phone: request.phone.clone(),
                    email: request.email.clone(),
                    address: request.address.clone(),
                    income,
                    registered_at: Utc::now(),
                    score: request.score.unwrap_or(0),
                    status: request.status.unwrap_or(ClientStatus::Active),
                };
                created = Some(client.clone());
                doc.clients.push(client);
            })
            .await;

        // The closure always runs exactly once
        created.ok_or_else(|| ApiError::InternalError("client creation did not apply".to_string()))
    }

    /// Replace a client in place by id; unknown ids are a silent no-op
    pub async fn update_client(&self, client: Client) -> Client {
        self.sync
            .mutate(|doc| {
                if let Some(existing) = doc.clients.iter_mut().find(|c| c.id == client.id) {
                    *existing = client.clone();
                }
            })
            .await;
        client
    }

    /// Remove a client. No cascade: loans referencing it become orphans,
    /// which is a known data-quality condition rather than an error.
    pub async fn remove_client(&self, id: i64) {
        self.sync
            .mutate(|doc| {
                doc.clients.retain(|c| c.id != id);
            })
            .await;
    }

    // ===== Loans =====

    pub async fn list_loans(&self) -> Vec<Loan> {
        self.sync.snapshot().await.loans
    }

    pub async fn get_loan(&self, id: i64) -> Option<Loan> {
        self.sync
            .snapshot()
            .await
            .loans
            .into_iter()
            .find(|l| l.id == id)
    }

    /// Create a loan for an existing client. Derived fields come from the
    /// financial rules; the contract starts now with one full cycle until
    /// the first due date.
    pub async fn add_loan(&self, request: CreateLoanRequest) -> ApiResult<Loan> {
        request.validate()?;

        let snapshot = self.sync.snapshot().await;
        let client = snapshot
            .clients
            .iter()
            .find(|c| c.id == request.client_id)
            .ok_or_else(|| {
                ApiError::ValidationError(format!(
                    "client {} does not exist",
                    request.client_id
                ))
            })?;
        let client_name = client.name.clone();

        let frequency = request.frequency.unwrap_or(BillingFrequency::Monthly);
        let now = Utc::now();
        let principal_plus_interest =
            finance::principal_plus_interest(request.principal, request.rate_percent);

        let mut created: Option<Loan> = None;
        self.sync
            .mutate(|doc| {
                let id = doc.loans.iter().map(|l| l.id).max().unwrap_or(0) + 1;
                let loan = Loan {
                    id,
                    client_id: request.client_id,
                    client_name: client_name.clone(),
                    principal: request.principal,
                    rate_percent: request.rate_percent,
                    principal_plus_interest,
                    contract_date: now,
                    next_due_date: finance::initial_due_date(now, frequency),
                    frequency,
                    status: LoanStatus::Active,
                    amount_paid: 0.0,
                    outstanding_balance: principal_plus_interest,
                    missed_cycles: 0,
                    notes: request.notes.clone().unwrap_or_default(),
                };
                created = Some(loan.clone());
                doc.loans.push(loan);
            })
            .await;

        created.ok_or_else(|| ApiError::InternalError("loan creation did not apply".to_string()))
    }

    /// Replace a loan in place by id; unknown ids are a silent no-op
    pub async fn update_loan(&self, loan: Loan) -> Loan {
        self.sync
            .mutate(|doc| {
                if let Some(existing) = doc.loans.iter_mut().find(|l| l.id == loan.id) {
                    *existing = loan.clone();
                }
            })
            .await;
        loan
    }

    pub async fn remove_loan(&self, id: i64) {
        self.sync
            .mutate(|doc| {
                doc.loans.retain(|l| l.id != id);
            })
            .await;
        self.prune_orphan_payments().await;
    }

    /// Set a loan's status; a missing id is a silent no-op
    pub async fn update_loan_status(&self, id: i64, status: LoanStatus) {
        self.sync
            .mutate(|doc| {
                if let Some(loan) = doc.loans.iter_mut().find(|l| l.id == id) {
                    loan.status = status;
                }
            })
            .await;
    }

    /// Renew a loan: the due date advances one cycle past max(current due,
    /// now) and the status returns to active. Returns the new due date, or
    /// `None` when the loan does not exist or is already paid off — paid is
    /// a terminal state.
    pub async fn renew_loan(&self, id: i64) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        let mut renewed: Option<DateTime<Utc>> = None;
        self.sync
            .mutate(|doc| {
                if let Some(loan) = doc
                    .loans
                    .iter_mut()
                    .find(|l| l.id == id && l.status != LoanStatus::Paid)
                {
                    let next = finance::next_due_date_on_renewal(loan, now);
                    loan.next_due_date = next;
                    loan.status = LoanStatus::Active;
                    renewed = Some(next);
                }
            })
            .await;
        renewed
    }

    /// Renew with a caller-supplied due date (interest-payment flow). Paid
    /// loans are left untouched, same as `renew_loan`.
    pub async fn renew_loan_with_due_date(
        &self,
        id: i64,
        next_due_date: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let mut renewed: Option<DateTime<Utc>> = None;
        self.sync
            .mutate(|doc| {
                if let Some(loan) = doc
                    .loans
                    .iter_mut()
                    .find(|l| l.id == id && l.status != LoanStatus::Paid)
                {
                    loan.next_due_date = next_due_date;
                    loan.status = LoanStatus::Active;
                    renewed = Some(next_due_date);
                }
            })
            .await;
        renewed
    }

    // ===== Payments =====

    /// Record a payment against an existing loan. Interest payments renew
    /// the loan for a biweekly cycle from now; settlements mark it paid.
    pub async fn record_payment(&self, request: RecordPaymentRequest) -> ApiResult<Payment> {
        request.validate()?;

        let loan = self
            .get_loan(request.loan_id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("loan {} does not exist", request.loan_id)))?;

        let now = Utc::now();
        let mut payment = Payment {
            id: now.timestamp_millis(),
            loan_id: loan.id,
            client_id: loan.client_id,
            amount: request.amount,
            kind: request.kind,
            paid_at: now,
            due_date: loan.next_due_date,
            next_due_date: None,
            method: request.method,
            transaction_number: request.transaction_number,
            notes: request.notes,
        };

        match request.kind {
            PaymentKind::Settlement => {
                self.update_loan_status(loan.id, LoanStatus::Paid).await;
            }
            PaymentKind::Interest => {
                let next_due = now + Duration::days(15);
                payment.next_due_date = Some(next_due);
                self.renew_loan_with_due_date(loan.id, next_due).await;
            }
        }

        let log = {
            let mut payments = self.payments.write().await;
            payments.push(payment.clone());
            payments.clone()
        };
        self.cache.save_payments(&log).await;

        tracing::info!(
            loan_id = loan.id,
            kind = ?request.kind,
            amount = request.amount,
            "Payment recorded"
        );
        Ok(payment)
    }

    /// Payment log, most recent first
    pub async fn list_payments(&self) -> Vec<Payment> {
        let mut payments = self.payments.read().await.clone();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        payments
    }

    /// Today/this-month aggregates over the payment log
    pub async fn payment_stats(&self, as_of: DateTime<Utc>) -> PaymentStats {
        let payments = self.payments.read().await;

        let today: Vec<&Payment> = payments
            .iter()
            .filter(|p| p.paid_at.date_naive() == as_of.date_naive())
            .collect();
        let this_month: Vec<&Payment> = payments
            .iter()
            .filter(|p| {
                p.paid_at.year() == as_of.year() && p.paid_at.month() == as_of.month()
            })
            .collect();

        PaymentStats {
            payments_today: today.len(),
            amount_today: today.iter().map(|p| p.amount).sum(),
            payments_this_month: this_month.len(),
            amount_this_month: this_month.iter().map(|p| p.amount).sum(),
            interest_received: this_month
                .iter()
                .filter(|p| p.kind == PaymentKind::Interest)
                .map(|p| p.amount)
                .sum(),
            settlements: this_month
                .iter()
                .filter(|p| p.kind == PaymentKind::Settlement)
                .count(),
        }
    }

    /// Drop payments whose loan has been deleted
    async fn prune_orphan_payments(&self) {
        let loan_ids: Vec<i64> = self
            .sync
            .snapshot()
            .await
            .loans
            .iter()
            .map(|l| l.id)
            .collect();

        let pruned = {
            let mut payments = self.payments.write().await;
            let before = payments.len();
            payments.retain(|p| loan_ids.contains(&p.loan_id));
            if payments.len() != before {
                Some(payments.clone())
            } else {
                None
            }
        };

        if let Some(log) = pruned {
            tracing::info!(remaining = log.len(), "Orphaned payments removed");
            self.cache.save_payments(&log).await;
        }
    }

    // ===== Feed =====

    /// Current snapshot plus a receiver for every subsequent one
    pub async fn subscribe(&self) -> (Document, tokio::sync::broadcast::Receiver<Document>) {
        self.sync.subscribe().await
    }

    pub async fn snapshot(&self) -> Document {
        self.sync.snapshot().await
    }
}

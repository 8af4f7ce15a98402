//! Data models for the loanbook backend
//!
//! The wire format keeps the Portuguese field names of the persisted document
//! store (`emprestimos`, `clientes`, `valorOriginal`, ...) so that existing
//! documents round-trip unchanged; Rust-side names are English.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Client status
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
    #[serde(rename = "bloqueado")]
    Blocked,
}

/// Loan status
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "pago")]
    Paid,
    #[serde(rename = "vencido")]
    Overdue,
}

/// Billing frequency of a loan cycle
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BillingFrequency {
    #[serde(rename = "quinzenal")]
    Biweekly,
    #[serde(rename = "mensal")]
    Monthly,
}

impl BillingFrequency {
    /// Cycle length in days (biweekly = 15, monthly = 30)
    pub fn cycle_days(&self) -> i64 {
        match self {
            BillingFrequency::Biweekly => 15,
            BillingFrequency::Monthly => 30,
        }
    }
}

/// Borrower identity and risk profile
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Client {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cpf")]
    pub tax_id: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "renda")]
    pub income: f64,
    #[serde(rename = "dataCadastro")]
    pub registered_at: DateTime<Utc>,
    pub score: i32,
    pub status: ClientStatus,
}

/// A lending contract and its running balance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Loan {
    pub id: i64,
    #[serde(rename = "clienteId")]
    pub client_id: i64,
    /// Denormalized display name; may drift from the client record
    #[serde(rename = "cliente")]
    pub client_name: String,
    #[serde(rename = "valorOriginal")]
    pub principal: f64,
    #[serde(rename = "percentualJuros")]
    pub rate_percent: f64,
    #[serde(rename = "valorComJuros")]
    pub principal_plus_interest: f64,
    #[serde(rename = "dataContrato")]
    pub contract_date: DateTime<Utc>,
    #[serde(rename = "proximoVencimento")]
    pub next_due_date: DateTime<Utc>,
    #[serde(rename = "frequencia")]
    pub frequency: BillingFrequency,
    pub status: LoanStatus,
    #[serde(rename = "valorPago")]
    pub amount_paid: f64,
    #[serde(rename = "saldoDevedor")]
    pub outstanding_balance: f64,
    #[serde(rename = "ciclosVencidos")]
    pub missed_cycles: i32,
    #[serde(rename = "observacoes")]
    pub notes: String,
}

/// The unit of remote synchronization: all clients and loans for a tenant
/// plus sync metadata. Every write replaces the whole document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document {
    #[serde(rename = "emprestimos")]
    pub loans: Vec<Loan>,
    #[serde(rename = "clientes")]
    pub clients: Vec<Client>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl Document {
    /// Empty initial document, version 1
    pub fn empty() -> Self {
        Self {
            loans: Vec::new(),
            clients: Vec::new(),
            last_updated: Utc::now(),
            version: 1,
        }
    }
}

/// Payment kind: interest-only renews the cycle, settlement closes the loan
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    #[serde(rename = "juros")]
    Interest,
    #[serde(rename = "total")]
    Settlement,
}

/// How the payment was made
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "dinheiro")]
    Cash,
    #[serde(rename = "pix")]
    Pix,
    #[serde(rename = "transferencia")]
    Transfer,
    #[serde(rename = "cartao")]
    Card,
}

/// One settlement or renewal event against a loan.
///
/// Payments live in the local payment log only; they are not part of the
/// synced document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Payment {
    pub id: i64,
    #[serde(rename = "emprestimoId")]
    pub loan_id: i64,
    #[serde(rename = "clienteId")]
    pub client_id: i64,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "tipoPagamento")]
    pub kind: PaymentKind,
    #[serde(rename = "dataPagamento")]
    pub paid_at: DateTime<Utc>,
    #[serde(rename = "dataVencimento")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "proximoVencimento", skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<DateTime<Utc>>,
    #[serde(rename = "formaPagamento")]
    pub method: PaymentMethod,
    #[serde(rename = "numeroTransacao", skip_serializing_if = "Option::is_none")]
    pub transaction_number: Option<String>,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request DTO for registering a client
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "tax id is required"))]
    pub tax_id: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    /// Raw JSON so locale-formatted strings ("3.500,00") coerce on the way in
    pub income: Option<serde_json::Value>,
    pub score: Option<i32>,
    pub status: Option<ClientStatus>,
}

/// Request DTO for creating a loan
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    pub client_id: i64,
    #[validate(range(min = 1.0, message = "principal must be at least 1"))]
    pub principal: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "rate must be 0-100"))]
    pub rate_percent: f64,
    pub frequency: Option<BillingFrequency>,
    pub notes: Option<String>,
}

/// Request DTO for recording a payment
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub loan_id: i64,
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,
    pub kind: PaymentKind,
    pub method: PaymentMethod,
    pub transaction_number: Option<String>,
    pub notes: Option<String>,
}

/// Request DTO for a status update
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: LoanStatus,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

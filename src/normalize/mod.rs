//! Record normalization for the persisted document
//!
//! Documents come back from the remote store and the local cache in whatever
//! shape older app versions wrote them: numbers as locale-formatted strings,
//! dates in display format, fields missing entirely. This module coerces any
//! `serde_json::Value` record into a fully-typed `Client` / `Loan` /
//! `Document` with every field present. Normalization is idempotent: running
//! it over an already-normalized record is a deep no-op.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::finance;
use crate::models::{BillingFrequency, Client, ClientStatus, Document, Loan, LoanStatus};

/// Coerce a JSON value into a finite number.
///
/// Strings are stripped of currency symbols and spaces, then disambiguated:
/// when both `.` and `,` appear, `.` is a thousands separator and `,` the
/// decimal point ("1.234,56" -> 1234.56); a lone `,` is the decimal point.
/// Anything unparseable coerces to 0.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => {
            let n = n.as_f64().unwrap_or(0.0);
            if n.is_finite() {
                n
            } else {
                0.0
            }
        }
        Value::String(s) => parse_locale_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_locale_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');
    let canonical = if has_dot && has_comma {
        cleaned.replace('.', "").replace(',', ".")
    } else if has_comma {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };

    canonical.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerce a JSON value into an integer (via the numeric rules above)
pub fn coerce_int(value: &Value) -> i64 {
    coerce_number(value) as i64
}

/// Coerce a JSON value into a UTC timestamp.
///
/// Accepts ISO-8601 strings, the display format `DD/MM/YYYY`, and epoch
/// values (milliseconds when large enough, seconds otherwise). Unparseable
/// input yields `None`; callers substitute the current time or recompute.
pub fn coerce_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => {
            let epoch = n.as_i64()?;
            // Values past ~1973 in milliseconds; anything smaller is seconds
            if epoch.abs() >= 100_000_000_000 {
                Utc.timestamp_millis_opt(epoch).single()
            } else {
                Utc.timestamp_opt(epoch, 0).single()
            }
        }
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    // Display format used by the dashboard screens
    if let Ok(date) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn field<'a>(record: &'a Value, name: &str) -> &'a Value {
    record.get(name).unwrap_or(&Value::Null)
}

/// Normalize a persisted client record
pub fn normalize_client(record: &Value, now: DateTime<Utc>) -> Client {
    Client {
        id: coerce_int(field(record, "id")),
        name: coerce_string(field(record, "nome")),
        tax_id: coerce_string(field(record, "cpf")),
        phone: coerce_string(field(record, "telefone")),
        email: coerce_string(field(record, "email")),
        address: coerce_string(field(record, "endereco")),
        income: coerce_number(field(record, "renda")),
        registered_at: coerce_date(field(record, "dataCadastro")).unwrap_or(now),
        score: coerce_int(field(record, "score")) as i32,
        status: serde_json::from_value(field(record, "status").clone())
            .unwrap_or(ClientStatus::Active),
    }
}

/// Normalize a persisted loan record, recomputing derived fields that are
/// missing or non-finite.
pub fn normalize_loan(record: &Value, now: DateTime<Utc>) -> Loan {
    let principal = coerce_number(field(record, "valorOriginal"));
    let rate_percent = coerce_number(field(record, "percentualJuros"));

    let mut principal_plus_interest = coerce_number(field(record, "valorComJuros"));
    if principal_plus_interest <= 0.0 {
        principal_plus_interest = finance::principal_plus_interest(principal, rate_percent);
    }

    let amount_paid = coerce_number(field(record, "valorPago"));

    let mut outstanding = coerce_number(field(record, "saldoDevedor"));
    if outstanding <= 0.0 {
        outstanding = finance::outstanding_balance(principal_plus_interest, amount_paid);
    }

    let frequency: BillingFrequency = serde_json::from_value(field(record, "frequencia").clone())
        .unwrap_or(BillingFrequency::Monthly);

    let contract_date = coerce_date(field(record, "dataContrato")).unwrap_or(now);
    let next_due_date = coerce_date(field(record, "proximoVencimento"))
        .unwrap_or_else(|| finance::initial_due_date(contract_date, frequency));

    Loan {
        id: coerce_int(field(record, "id")),
        client_id: coerce_int(field(record, "clienteId")),
        client_name: coerce_string(field(record, "cliente")),
        principal,
        rate_percent,
        principal_plus_interest,
        contract_date,
        next_due_date,
        frequency,
        status: serde_json::from_value(field(record, "status").clone())
            .unwrap_or(LoanStatus::Active),
        amount_paid,
        outstanding_balance: outstanding,
        missed_cycles: coerce_int(field(record, "ciclosVencidos")) as i32,
        notes: coerce_string(field(record, "observacoes")),
    }
}

/// Normalize a whole persisted document
pub fn normalize_document(record: &Value, now: DateTime<Utc>) -> Document {
    let loans = field(record, "emprestimos")
        .as_array()
        .map(|items| items.iter().map(|l| normalize_loan(l, now)).collect())
        .unwrap_or_default();

    let clients = field(record, "clientes")
        .as_array()
        .map(|items| items.iter().map(|c| normalize_client(c, now)).collect())
        .unwrap_or_default();

    let version = field(record, "version").as_u64().unwrap_or(1).max(1);

    Document {
        loans,
        clients,
        last_updated: coerce_date(field(record, "lastUpdated")).unwrap_or(now),
        version,
    }
}

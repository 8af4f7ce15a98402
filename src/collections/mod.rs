//! Collections: the overdue queue and outbound reminder messages
//!
//! Builds the billing worklist from a document snapshot and renders the
//! WhatsApp reminder text operators send to late borrowers. Message text is
//! Portuguese because that is what borrowers receive.

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::Url;
use serde::Serialize;

use crate::finance;
use crate::models::{Document, Loan, LoanStatus};

/// One row of the collections worklist
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct OverdueEntry {
    pub loan_id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub phone: String,
    pub days_late: i64,
    pub late_fee: f64,
    /// Renewal price: one cycle of interest plus the accrued late fee
    pub interest_with_penalty: f64,
    /// Full payoff: principal, interest and the accrued late fee
    pub total_with_penalty: f64,
    pub next_due_date: DateTime<Utc>,
}

/// Non-paid loans past their due date as of `as_of`, most overdue first
pub fn overdue_queue(document: &Document, as_of: DateTime<Utc>) -> Vec<OverdueEntry> {
    let mut entries: Vec<OverdueEntry> = document
        .loans
        .iter()
        .filter(|l| l.status != LoanStatus::Paid && l.next_due_date < as_of)
        .map(|l| entry_for(l, document, as_of))
        .collect();
    entries.sort_by(|a, b| b.days_late.cmp(&a.days_late));
    entries
}

/// Worklist entry for a single non-paid loan, overdue or not
pub fn entry_for_loan(
    document: &Document,
    loan_id: i64,
    as_of: DateTime<Utc>,
) -> Option<OverdueEntry> {
    document
        .loans
        .iter()
        .find(|l| l.id == loan_id && l.status != LoanStatus::Paid)
        .map(|l| entry_for(l, document, as_of))
}

fn entry_for(loan: &Loan, document: &Document, as_of: DateTime<Utc>) -> OverdueEntry {
    let phone = document
        .clients
        .iter()
        .find(|c| c.id == loan.client_id)
        .map(|c| c.phone.clone())
        .unwrap_or_default();

    OverdueEntry {
        loan_id: loan.id,
        client_id: loan.client_id,
        client_name: loan.client_name.clone(),
        phone,
        days_late: finance::days_late(loan, as_of),
        late_fee: finance::late_fee(loan, as_of),
        interest_with_penalty: finance::interest_with_penalty(loan, as_of),
        total_with_penalty: finance::total_with_penalty(loan, as_of),
        next_due_date: loan.next_due_date,
    }
}

/// Where a loan stands relative to its due date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    DueToday,
    DueInDays(i64),
    OverdueDays(i64),
}

/// Classify a loan's due date against `as_of` (calendar days, UTC)
pub fn due_status(loan: &Loan, as_of: DateTime<Utc>) -> DueStatus {
    let late = finance::days_late(loan, as_of);
    if late > 0 {
        return DueStatus::OverdueDays(late);
    }
    let days_until = (loan.next_due_date.date_naive() - as_of.date_naive()).num_days();
    if days_until <= 0 {
        DueStatus::DueToday
    } else {
        DueStatus::DueInDays(days_until)
    }
}

fn due_status_line(status: DueStatus) -> String {
    match status {
        DueStatus::DueToday => "seu empréstimo vence hoje".to_string(),
        DueStatus::DueInDays(n) => format!("seu empréstimo vence em {} dia(s)", n),
        DueStatus::OverdueDays(n) => format!("seu empréstimo está com {} dia(s) de atraso", n),
    }
}

/// Reminder text for a loan on the billing worklist, with the PIX key for
/// payment.
///
/// The reference code ties a reply back to a specific reminder when several
/// go out to the same borrower.
pub fn reminder_message(entry: &OverdueEntry, status: DueStatus, pix_key: &str) -> String {
    format!(
        "Olá {}, {}.\n\
         Renovação (juros + multa): R$ {:.2}\n\
         Quitação total: R$ {:.2}\n\
         Chave PIX para pagamento: {}\n\
         Referência: {}",
        entry.client_name,
        due_status_line(status),
        entry.interest_with_penalty,
        entry.total_with_penalty,
        pix_key,
        reference_code(),
    )
}

/// Confirmation text after an interest payment renews the cycle
pub fn renewal_confirmation(
    client_name: &str,
    amount: f64,
    next_due_date: DateTime<Utc>,
    pix_key: &str,
) -> String {
    format!(
        "Olá {}, recebemos seu pagamento de juros de R$ {:.2}.\n\
         Próximo vencimento: {}\n\
         Chave PIX: {}",
        client_name,
        amount,
        next_due_date.format("%d/%m/%Y"),
        pix_key,
    )
}

/// Confirmation text after a settlement closes the loan
pub fn settlement_confirmation(client_name: &str, amount: f64, pix_key: &str) -> String {
    format!(
        "Olá {}, recebemos sua quitação de R$ {:.2}. Empréstimo encerrado.\n\
         Chave PIX: {}",
        client_name, amount, pix_key,
    )
}

/// Pseudo-random PIX key in the bank's "chave aleatória" shape, for tenants
/// that have not configured one
pub fn random_pix_key() -> String {
    let mut rng = rand::thread_rng();
    let block = |rng: &mut rand::rngs::ThreadRng, len: usize| -> String {
        (0..len)
            .map(|_| char::from_digit(rng.gen_range(0..10u32), 10).unwrap_or('0'))
            .collect()
    };
    format!(
        "{}-{}-{}-{}",
        block(&mut rng, 8),
        block(&mut rng, 4),
        block(&mut rng, 4),
        block(&mut rng, 12),
    )
}

/// Short alphanumeric code quoted in reminder messages
fn reference_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Digits-only phone with the Brazilian country code prefixed.
///
/// Returns `None` when too few digits remain to dial.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 10 {
        return None;
    }
    if digits.starts_with("55") && digits.len() >= 12 {
        Some(digits)
    } else {
        Some(format!("55{digits}"))
    }
}

/// `wa.me` link that opens a chat with the message pre-filled
pub fn whatsapp_link(phone: &str, message: &str) -> Option<Url> {
    let number = normalize_phone(phone)?;
    Url::parse_with_params(&format!("https://wa.me/{number}"), &[("text", message)]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingFrequency, Client, ClientStatus};
    use chrono::{Duration, TimeZone};

    fn document(as_of: DateTime<Utc>) -> Document {
        let loan = |id: i64, client_id: i64, due: DateTime<Utc>, status: LoanStatus| Loan {
            id,
            client_id,
            client_name: format!("Cliente {client_id}"),
            principal: 2000.0,
            rate_percent: 20.0,
            principal_plus_interest: 2400.0,
            contract_date: as_of - Duration::days(45),
            next_due_date: due,
            frequency: BillingFrequency::Biweekly,
            status,
            amount_paid: 0.0,
            outstanding_balance: 2400.0,
            missed_cycles: 0,
            notes: String::new(),
        };

        Document {
            loans: vec![
                loan(1, 1, as_of - Duration::days(3), LoanStatus::Active),
                loan(2, 2, as_of - Duration::days(10), LoanStatus::Overdue),
                loan(3, 1, as_of + Duration::days(5), LoanStatus::Active),
                loan(4, 2, as_of - Duration::days(20), LoanStatus::Paid),
            ],
            clients: vec![Client {
                id: 1,
                name: "Cliente 1".to_string(),
                tax_id: String::new(),
                phone: "(11) 98765-4321".to_string(),
                email: String::new(),
                address: String::new(),
                income: 3000.0,
                registered_at: as_of,
                score: 700,
                status: ClientStatus::Active,
            }],
            last_updated: as_of,
            version: 1,
        }
    }

    #[test]
    fn test_overdue_queue_filters_and_sorts() {
        let as_of = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        let queue = overdue_queue(&document(as_of), as_of);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].loan_id, 2);
        assert_eq!(queue[0].days_late, 10);
        assert_eq!(queue[1].loan_id, 1);
        assert_eq!(queue[1].days_late, 3);

        // Client lookup fills the phone; missing client leaves it empty
        assert_eq!(queue[1].phone, "(11) 98765-4321");
        assert_eq!(queue[0].phone, "");

        assert_eq!(queue[1].late_fee, 150.0);
        assert_eq!(queue[1].interest_with_penalty, 400.0 + 150.0);
        assert_eq!(queue[1].total_with_penalty, 2400.0 + 150.0);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            normalize_phone("(11) 98765-4321").as_deref(),
            Some("5511987654321")
        );
        assert_eq!(
            normalize_phone("5511987654321").as_deref(),
            Some("5511987654321")
        );
        assert_eq!(normalize_phone("1234").as_deref(), None);
    }

    #[test]
    fn test_whatsapp_link_encodes_message() {
        let url = whatsapp_link("(11) 98765-4321", "Olá Maria, pagamento pendente").unwrap();
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/5511987654321");
        assert!(url.query().is_some_and(|q| q.starts_with("text=")));

        assert!(whatsapp_link("123", "oi").is_none());
    }

    #[test]
    fn test_due_status_classification() {
        let as_of = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        let doc = document(as_of);

        assert_eq!(due_status(&doc.loans[0], as_of), DueStatus::OverdueDays(3));
        assert_eq!(due_status(&doc.loans[2], as_of), DueStatus::DueInDays(5));

        let mut due_today = doc.loans[2].clone();
        due_today.next_due_date = as_of + Duration::hours(3);
        assert_eq!(due_status(&due_today, as_of), DueStatus::DueToday);
    }

    #[test]
    fn test_reminder_message_includes_amounts_and_pix() {
        let as_of = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        let queue = overdue_queue(&document(as_of), as_of);
        let msg = reminder_message(
            &queue[1],
            DueStatus::OverdueDays(queue[1].days_late),
            "financeiro@example.com",
        );

        assert!(msg.contains("Cliente 1"));
        assert!(msg.contains("3 dia(s) de atraso"));
        assert!(msg.contains("R$ 550.00"));
        assert!(msg.contains("R$ 2550.00"));
        assert!(msg.contains("financeiro@example.com"));
    }

    #[test]
    fn test_confirmation_messages() {
        let due = Utc.with_ymd_and_hms(2025, 2, 16, 12, 0, 0).unwrap();
        let renewal = renewal_confirmation("Cliente 1", 400.0, due, "chave-pix");
        assert!(renewal.contains("R$ 400.00"));
        assert!(renewal.contains("16/02/2025"));
        assert!(renewal.contains("chave-pix"));

        let settlement = settlement_confirmation("Cliente 1", 2400.0, "chave-pix");
        assert!(settlement.contains("R$ 2400.00"));
        assert!(settlement.contains("encerrado"));
    }

    #[test]
    fn test_random_pix_key_shape() {
        let key = random_pix_key();
        let blocks: Vec<&str> = key.split('-').collect();
        assert_eq!(
            blocks.iter().map(|b| b.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 12]
        );
        assert!(blocks.iter().all(|b| b.chars().all(|c| c.is_ascii_digit())));
    }
}

//! Доменные модели: сырая строка таблицы, счёт и запись уведомления.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Значение ячейки после загрузки: числовые колонки уже приведены.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Одна строка входной таблицы. Живёт только до нормализации.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    /// Номер строки в исходном файле (заголовок — строка 1).
    pub row: usize,
    pub cells: BTreeMap<String, Cell>,
}

impl RawRecord {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(Cell::to_string)
    }

    pub fn number(&self, column: &str) -> Option<Decimal> {
        match self.get(column)? {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Sent,
    Failed,
}

/// Нормализованный счёт. После создания не изменяется.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub filename: PathBuf,
    pub name: String,
    pub phone: String,
    pub lot: String,
    pub invoice_number: String,
    pub message: String,
    pub amount: Decimal,
    pub pending_amount: Decimal,
    pub send_receipt: bool,
    pub status: InvoiceStatus,
}

/// Запись для рассылки: имя файла без каталога плюс код страны.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntry {
    pub filename: String,
    pub name: String,
    pub phone: String,
    pub lot: String,
    pub invoice_number: String,
    pub message: String,
    pub amount: Decimal,
    pub pending_amount: Decimal,
    pub send_receipt: bool,
    pub status: InvoiceStatus,
    pub country_code: String,
}

impl NotificationEntry {
    pub fn from_invoice(inv: &Invoice, country_code: &str) -> Self {
        let filename = inv
            .filename
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        NotificationEntry {
            filename,
            name: inv.name.clone(),
            phone: inv.phone.clone(),
            lot: inv.lot.clone(),
            invoice_number: inv.invoice_number.clone(),
            message: inv.message.clone(),
            amount: inv.amount,
            pending_amount: inv.pending_amount,
            send_receipt: inv.send_receipt,
            status: inv.status,
            country_code: country_code.to_string(),
        }
    }
}

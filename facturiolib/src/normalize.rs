//! Сырые строки таблицы → неизменяемые счета. Любая структурная ошибка
//! прерывает весь пакет: частичного результата нет.

use crate::{
    config::{DuplicatePolicy, InvoiceConfig, WhatsappConfig},
    error::{FacturioError, Result},
    formats::csv::{
        AmountParser, COL_AMOUNT, COL_INVOICE_NUMBER, COL_LOT, COL_NAME, COL_PENDING, COL_PHONE,
        COL_RECEIPT,
    },
    message::compose_message,
    model::{Cell, Invoice, InvoiceStatus, RawRecord},
};
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Один счёт на строку, порядок строк сохраняется.
pub fn normalize(
    rows: &[RawRecord],
    output_dir: &Path,
    invoice: &InvoiceConfig,
    whatsapp: &WhatsappConfig,
) -> Result<Vec<Invoice>> {
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let inv = normalize_row(row, output_dir, invoice, whatsapp)?;

        if let Some(first) = seen.insert(inv.filename.clone(), row.row) {
            let name = inv.filename.display().to_string();
            match invoice.on_duplicate {
                DuplicatePolicy::Reject => {
                    return Err(FacturioError::DuplicateFilename(name, first, row.row))
                }
                DuplicatePolicy::Overwrite => {
                    warn!("rows {first} and {} both write {name}; last one wins", row.row)
                }
            }
        }
        out.push(inv);
    }

    Ok(out)
}

pub fn normalize_row(
    row: &RawRecord,
    output_dir: &Path,
    invoice: &InvoiceConfig,
    whatsapp: &WhatsappConfig,
) -> Result<Invoice> {
    let name = required(row, COL_NAME)?;
    let phone = required(row, COL_PHONE)?;
    let lot = required(row, COL_LOT)?;
    let invoice_number = required(row, COL_INVOICE_NUMBER)?;
    let amount = amount_field(row, COL_AMOUNT)?;
    let pending_amount = amount_field(row, COL_PENDING)?;

    let send_receipt = receipt_flag(row.text(COL_RECEIPT).as_deref().unwrap_or("False"));
    let filename = output_dir.join(invoice_filename(
        &invoice_number,
        &name,
        &invoice.month,
        &invoice.year,
    ));
    let message = compose_message(&name, pending_amount, invoice, whatsapp).map_err(|e| match e {
        FacturioError::TemplateFormat(m) => {
            FacturioError::TemplateFormat(format!("row {}: {m}", row.row))
        }
        other => other,
    })?;

    Ok(Invoice {
        filename,
        name,
        phone,
        lot,
        invoice_number,
        message,
        amount,
        pending_amount,
        send_receipt,
        status: InvoiceStatus::Pending,
    })
}

/// `{номер}-{имя}-{месяц}-{год}.pdf`; имя не санитизируется.
pub fn invoice_filename(invoice_number: &str, name: &str, month: &str, year: &str) -> String {
    format!("{invoice_number}-{name}-{month}-{year}.pdf")
}

/// `" true "` → true, `"Yes"` → false.
pub fn receipt_flag(raw: &str) -> bool {
    raw.trim().to_uppercase() == "TRUE"
}

fn required(row: &RawRecord, field: &str) -> Result<String> {
    row.text(field).ok_or_else(|| FacturioError::MissingField {
        field: field.to_string(),
        row: row.row,
    })
}

fn amount_field(row: &RawRecord, field: &str) -> Result<Decimal> {
    match row.get(field) {
        Some(Cell::Number(n)) => Ok(*n),
        // записи не из загрузчика: те же правила приведения
        Some(Cell::Text(s)) => Ok(AmountParser::new()?.coerce_logged(s, field, row.row)),
        None => Err(FacturioError::MissingField {
            field: field.to_string(),
            row: row.row,
        }),
    }
}

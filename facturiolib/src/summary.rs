//! Записи для рассылки: копия счёта без каталога в имени файла и с кодом страны.

use crate::{
    error::Result,
    formats::json::Json,
    model::{Invoice, NotificationEntry},
    traits::WriteFormat,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Порядок записей совпадает с порядком счетов.
pub fn summarize(invoices: &[Invoice], country_code: &str) -> Vec<NotificationEntry> {
    invoices
        .iter()
        .map(|inv| NotificationEntry::from_invoice(inv, country_code))
        .collect()
}

pub fn write_summary(path: &Path, entries: &[NotificationEntry]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Json::write(BufWriter::new(File::create(path)?), entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceStatus;
    use rust_decimal::Decimal;

    fn invoice(name: &str, pending: i64) -> Invoice {
        Invoice {
            filename: format!("/srv/out/1-{name}-Enero-2026.pdf").into(),
            name: name.into(),
            phone: "555 123".into(),
            lot: "L-1".into(),
            invoice_number: "1".into(),
            message: format!("¡Hola {name}!"),
            amount: Decimal::new(100, 0),
            pending_amount: Decimal::new(pending, 0),
            send_receipt: pending == 0,
            status: InvoiceStatus::Pending,
        }
    }

    #[test]
    fn entries_keep_order_and_basename() {
        let out = summarize(&[invoice("Juan", 50), invoice("Ana", 0)], "52");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Juan");
        assert_eq!(out[0].filename, "1-Juan-Enero-2026.pdf");
        assert_eq!(out[1].country_code, "52");
    }

    #[test]
    fn json_layout() {
        let entries = summarize(&[invoice("José", 50)], "52");
        let mut buf = Vec::new();
        Json::write(&mut buf, &entries).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("¡Hola José!"));
        assert!(text.starts_with("[\n  {\n    \"filename\""));
        let keys = [
            "filename",
            "name",
            "phone",
            "lot",
            "invoiceNumber",
            "message",
            "amount",
            "pendingAmount",
            "sendReceipt",
            "status",
            "countryCode",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| text.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v[0]["status"], "PENDING");
        assert_eq!(v[0]["pendingAmount"].as_f64(), Some(50.0));
        assert_eq!(v[0]["sendReceipt"], false);
    }
}

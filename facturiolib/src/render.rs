//! Рендер разметки счёта через Tera. Шаблон загружается один раз и
//! используется для всех записей; имена плейсхолдеров — контракт шаблона:
//! `lote, nombre, dia_antes, dia, mes, ano, cuota, numero_factura, telefono`.
//! `cuota` передаётся числом, так что фильтры и сравнения Tera работают с ним.

use crate::{
    config::InvoiceConfig,
    error::{FacturioError, Result},
    model::Invoice,
};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

pub struct InvoiceRenderer {
    tera: Tera,
    name: String,
    base_dir: PathBuf,
}

impl InvoiceRenderer {
    /// Ресурсы шаблона (картинки, стили) ищутся рядом с ним.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            FacturioError::TemplateRender(format!("cannot read {}: {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "invoice.html".into());
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_source(&name, &source, base_dir)
    }

    /// Расширение `name` определяет автоэкранирование (`.html` — включено).
    pub fn from_source(name: &str, source: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(name, source)
            .map_err(|e| FacturioError::TemplateRender(describe(&e)))?;
        Ok(Self {
            tera,
            name: name.to_string(),
            base_dir: base_dir.into(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn render(&self, invoice: &Invoice, cfg: &InvoiceConfig) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("lote", &invoice.lot);
        ctx.insert("nombre", &invoice.name);
        ctx.insert("dia_antes", &cfg.pay_before_day);
        ctx.insert("dia", &cfg.day_issued);
        ctx.insert("mes", &cfg.month);
        ctx.insert("ano", &cfg.year);
        ctx.insert("cuota", &invoice.amount);
        ctx.insert("numero_factura", &invoice.invoice_number);
        ctx.insert("telefono", &invoice.phone);

        self.tera.render(&self.name, &ctx).map_err(|e| {
            FacturioError::TemplateRender(format!(
                "invoice {}: {}",
                invoice.invoice_number,
                describe(&e)
            ))
        })
    }
}

/// Tera прячет причину в цепочке `source()`; собираем её в одну строку.
fn describe(e: &tera::Error) -> String {
    let mut msg = e.to_string();
    let mut cause = std::error::Error::source(e);
    while let Some(c) = cause {
        msg.push_str(": ");
        msg.push_str(&c.to_string());
        cause = c.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::model::InvoiceStatus;
    use rust_decimal::Decimal;

    fn invoice() -> Invoice {
        Invoice {
            filename: "/out/1-Ana-Enero-2026.pdf".into(),
            name: "Ana & Co".into(),
            phone: "555".into(),
            lot: "L-3".into(),
            invoice_number: "1".into(),
            message: String::new(),
            amount: Decimal::new(805, 1),
            pending_amount: Decimal::ZERO,
            send_receipt: false,
            status: InvoiceStatus::Pending,
        }
    }

    fn cfg() -> InvoiceConfig {
        InvoiceConfig {
            pay_before_day: "10".into(),
            day_issued: "1".into(),
            month: "Enero".into(),
            year: "2026".into(),
            country_code: String::new(),
            on_duplicate: DuplicatePolicy::Reject,
        }
    }

    #[test]
    fn fills_every_placeholder() {
        let src = "{{ lote }}|{{ nombre }}|{{ dia_antes }}|{{ dia }}|{{ mes }}|{{ ano }}|{{ cuota }}|{{ numero_factura }}|{{ telefono }}";
        let r = InvoiceRenderer::from_source("invoice.txt", src, "/tpl").unwrap();
        let out = r.render(&invoice(), &cfg()).unwrap();
        assert_eq!(out, "L-3|Ana & Co|10|1|Enero|2026|80.5|1|555");
    }

    #[test]
    fn amount_is_numeric_in_templates() {
        let src = "{% if cuota > 50 %}alta{% endif %}|{{ cuota + 0.25 }}|{% if cuota * 2 > 160 %}doble{% endif %}";
        let r = InvoiceRenderer::from_source("invoice.txt", src, "/tpl").unwrap();
        assert_eq!(r.render(&invoice(), &cfg()).unwrap(), "alta|80.75|doble");
    }

    #[test]
    fn html_is_escaped() {
        let r = InvoiceRenderer::from_source("invoice.html", "<p>{{ nombre }}</p>", "/tpl").unwrap();
        assert_eq!(r.render(&invoice(), &cfg()).unwrap(), "<p>Ana &amp; Co</p>");
    }

    #[test]
    fn undefined_placeholder_fails() {
        let r = InvoiceRenderer::from_source("invoice.html", "{{ direccion }}", "/tpl").unwrap();
        let err = r.render(&invoice(), &cfg()).unwrap_err();
        assert!(matches!(err, FacturioError::TemplateRender(m) if m.contains("direccion")));
    }
}

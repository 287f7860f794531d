//! Текст уведомления. Шаблоны — строки в стиле `str.format`:
//! `{key}`, `{key:.2}` (фиксированная точность для сумм), `{{` и `}}` как литералы.

use crate::{
    config::{InvoiceConfig, WhatsappConfig},
    error::{FacturioError, Result},
};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Text(&'a str),
    Amount(Decimal),
}

/// Подставляет именованные аргументы. Неизвестный ключ — `TemplateFormat`.
pub fn format_template(template: &str, args: &[(&str, Arg<'_>)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(bad(template, "single '}' encountered")),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(bad(template, "unclosed '{'")),
                        Some(ch) => field.push(ch),
                    }
                }
                let (key, spec) = match field.split_once(':') {
                    Some((k, s)) => (k.trim(), Some(s)),
                    None => (field.trim(), None),
                };
                let arg = args
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, a)| *a)
                    .ok_or_else(|| bad(template, &format!("unknown placeholder `{key}`")))?;
                out.push_str(&render_arg(arg, spec).map_err(|m| bad(template, &m))?);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn bad(template: &str, what: &str) -> FacturioError {
    FacturioError::TemplateFormat(format!("{what} in {template:?}"))
}

fn render_arg(arg: Arg<'_>, spec: Option<&str>) -> std::result::Result<String, String> {
    let Some(spec) = spec.filter(|s| !s.is_empty()) else {
        return Ok(match arg {
            Arg::Text(s) => s.to_string(),
            Arg::Amount(d) => display_amount(d),
        });
    };

    let digits = spec
        .strip_prefix('.')
        .map(|s| s.strip_suffix('f').unwrap_or(s))
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| format!("unsupported format spec `{spec}`"))?;

    match arg {
        Arg::Amount(d) => Ok(format!("{:.*}", digits, d)),
        Arg::Text(_) => Err(format!("precision `{spec}` applied to text")),
    }
}

/// Сумма с минимум одним знаком после точки: `50` → `50.0`, `12.50` → `12.5`.
pub fn display_amount(d: Decimal) -> String {
    let n = d.normalize();
    if n.scale() == 0 {
        format!("{n}.0")
    } else {
        n.to_string()
    }
}

/// Выбор шаблона: долг больше нуля — «плохой» шаблон с `{pending}`, иначе «хороший».
pub fn compose_message(
    name: &str,
    pending: Decimal,
    invoice: &InvoiceConfig,
    whatsapp: &WhatsappConfig,
) -> Result<String> {
    let mut args = vec![
        ("name", Arg::Text(name)),
        ("month", Arg::Text(&invoice.month)),
        ("year", Arg::Text(&invoice.year)),
    ];

    if pending > Decimal::ZERO {
        args.push(("pending", Arg::Amount(pending)));
        format_template(&whatsapp.template_bad, &args)
    } else {
        format_template(&whatsapp.template_good, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;

    fn cfgs() -> (InvoiceConfig, WhatsappConfig) {
        (
            InvoiceConfig {
                pay_before_day: "10".into(),
                day_issued: "1".into(),
                month: "Octubre".into(),
                year: "2025".into(),
                country_code: "52".into(),
                on_duplicate: DuplicatePolicy::Reject,
            },
            WhatsappConfig {
                template_bad: "Hola {name}, {month}/{year}: debes ${pending}".into(),
                template_good: "Gracias {name} ({month} {year})".into(),
            },
        )
    }

    #[test]
    fn pending_selects_bad_template() {
        let (inv, wa) = cfgs();
        let msg = compose_message("Juan", Decimal::new(50, 0), &inv, &wa).unwrap();
        assert_eq!(msg, "Hola Juan, Octubre/2025: debes $50.0");
    }

    #[test]
    fn zero_and_negative_select_good_template() {
        let (inv, wa) = cfgs();
        for pending in [Decimal::ZERO, Decimal::new(-5, 0)] {
            let msg = compose_message("Ana", pending, &inv, &wa).unwrap();
            assert_eq!(msg, "Gracias Ana (Octubre 2025)");
        }
    }

    #[test]
    fn good_template_has_no_pending() {
        let (inv, mut wa) = cfgs();
        wa.template_good = "Saldo {pending}".into();
        let err = compose_message("Ana", Decimal::ZERO, &inv, &wa).unwrap_err();
        assert!(matches!(err, FacturioError::TemplateFormat(m) if m.contains("pending")));
    }

    #[test]
    fn escapes_and_precision() {
        let args = [("pending", Arg::Amount(Decimal::new(125, 1)))];
        assert_eq!(format_template("{{x}} {pending:.2f}", &args).unwrap(), "{x} 12.50");
        assert_eq!(format_template("{pending}", &args).unwrap(), "12.5");
        assert!(format_template("oops }", &args).is_err());
        assert!(format_template("{pending", &args).is_err());
    }
}

//! Входная таблица с заголовком. Разделитель (`,`, `;` или табуляция) определяется
//! по строке заголовка. Имена колонок приводятся к нижнему регистру, пробелы → `_`.
//! Колонки `cuota` и `pendiente` приводятся к числу (нечисловое → 0),
//! `telefono` всегда строка. Число — это `12`, `-3.5`, `.5` или `1e2`;
//! всё прочее (`1_000`, `1,5`, `N/A`) считается нечисловым.

use crate::{
    error::{FacturioError, Result},
    model::{Cell, RawRecord},
};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::str::FromStr;

pub const COL_RECEIPT: &str = "ocupa_recibo";
pub const COL_NAME: &str = "nombre";
pub const COL_PHONE: &str = "telefono";
pub const COL_LOT: &str = "lote";
pub const COL_INVOICE_NUMBER: &str = "numero_factura";
pub const COL_AMOUNT: &str = "cuota";
pub const COL_PENDING: &str = "pendiente";

/// Колонки, которые загрузчик обязан привести к нужному типу.
const COERCED: [&str; 3] = [COL_AMOUNT, COL_PENDING, COL_PHONE];

pub struct Csv;

impl crate::traits::ReadFormat for Csv {
    fn read<R: BufRead>(mut r: R) -> Result<Vec<RawRecord>> {
        let mut content = String::new();
        r.read_to_string(&mut content)
            .map_err(|e| FacturioError::DataLoad(format!("cannot read table: {e}")))?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let delimiter = detect_delimiter(content);
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(content.as_bytes());

        let amounts = AmountParser::new()?;
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(FacturioError::DataLoad("table has no header row".into()));
        }
        for col in COERCED {
            if !headers.iter().any(|h| h == col) {
                return Err(FacturioError::DataLoad(format!("missing column `{col}`")));
            }
        }

        let mut records = Vec::new();
        for (idx, rec) in rdr.records().enumerate() {
            let rec = rec?;
            let row = rec
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let mut cells = BTreeMap::new();
            for (column, value) in headers.iter().zip(rec.iter()) {
                let cell = match column.as_str() {
                    COL_AMOUNT | COL_PENDING => Cell::Number(amounts.coerce_logged(value, column, row)),
                    _ => Cell::Text(value.to_string()),
                };
                cells.insert(column.clone(), cell);
            }
            // короткая строка: недостающие ячейки как пустые
            for col in [COL_AMOUNT, COL_PENDING] {
                cells
                    .entry(col.to_string())
                    .or_insert(Cell::Number(Decimal::ZERO));
            }
            cells
                .entry(COL_PHONE.to_string())
                .or_insert_with(|| Cell::Text(String::new()));

            records.push(RawRecord { row, cells });
        }

        Ok(records)
    }
}

/// `"Invoice Number"` → `"numero_factura"`, `" Ocupa Recibo "` → `"ocupa_recibo"`.
pub fn normalize_header(raw: &str) -> String {
    let name = raw.trim().to_lowercase().replace(' ', "_");
    match name.as_str() {
        "invoice_number" => COL_INVOICE_NUMBER.to_string(),
        _ => name,
    }
}

/// Результат разбора числовой ячейки.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Value(Decimal),
    Empty,
    NonNumeric,
    /// Число записано верно, но не помещается в `Decimal`.
    OutOfRange,
}

/// Больше 28 знаков `Decimal` не держит.
const MAX_EXPONENT: i64 = 28;

pub struct AmountParser {
    pattern: Regex,
}

impl AmountParser {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$")
            .map_err(|e| FacturioError::DataLoad(e.to_string()))?;
        Ok(Self { pattern })
    }

    pub fn parse(&self, raw: &str) -> Amount {
        let s = raw.trim();
        if s.is_empty() {
            return Amount::Empty;
        }
        if !self.pattern.is_match(s) {
            return Amount::NonNumeric;
        }
        let exponent = s
            .find(['e', 'E'])
            .map(|i| s[i + 1..].parse::<i64>().unwrap_or(i64::MAX));
        if exponent.is_some_and(|e| e.abs() > MAX_EXPONENT) {
            return Amount::OutOfRange;
        }
        match Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)) {
            Ok(v) => Amount::Value(v),
            Err(_) => Amount::OutOfRange,
        }
    }

    /// Нечисловое значение → 0 с предупреждением в журнале.
    pub fn coerce_logged(&self, raw: &str, column: &str, row: usize) -> Decimal {
        match self.parse(raw) {
            Amount::Value(v) => v,
            Amount::Empty => {
                debug!("row {row}: empty `{column}`, using 0");
                Decimal::ZERO
            }
            Amount::NonNumeric => {
                warn!("row {row}: non-numeric `{column}` value {raw:?} coerced to 0");
                Decimal::ZERO
            }
            Amount::OutOfRange => {
                warn!("row {row}: `{column}` value {raw:?} is out of range, coerced to 0");
                Decimal::ZERO
            }
        }
    }
}

fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|d| (header.matches(*d as char).count(), *d == b','))
        .unwrap_or(b',')
}

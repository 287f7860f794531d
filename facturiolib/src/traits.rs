//! Унифицированные трэйты чтения/записи на основе std::io::{BufRead, Write}.

use crate::{
    error::{FacturioError, Result},
    model::{NotificationEntry, RawRecord},
};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

/// Чтение таблицы в сырые записи.
pub trait ReadFormat {
    fn read<R: BufRead>(r: R) -> Result<Vec<RawRecord>>;
}

/// Запись сводки уведомлений.
pub trait WriteFormat {
    fn write<W: Write>(w: W, entries: &[NotificationEntry]) -> Result<()>;
}

/// Превращение отрендеренной разметки в постраничный документ.
pub trait ExportFormat {
    /// `base_dir` — каталог, относительно которого ищутся ресурсы разметки.
    fn export<W: Write>(w: W, markup: &str, base_dir: &Path) -> Result<()>;

    /// Документ собирается в памяти и только потом пишется (или перезаписывает)
    /// `target`; недописанный файл удаляется. Любая ошибка — `DocumentExport` с путём.
    fn export_to_file(markup: &str, base_dir: &Path, target: &Path) -> Result<()> {
        let mut buf = Vec::new();
        Self::export(&mut buf, markup, base_dir).map_err(|e| match e {
            FacturioError::DocumentExport { reason, .. } => FacturioError::export(target, reason),
            other => FacturioError::export(target, other),
        })?;
        fs::write(target, &buf).map_err(|e| {
            let _ = fs::remove_file(target);
            FacturioError::export(target, e)
        })
    }
}

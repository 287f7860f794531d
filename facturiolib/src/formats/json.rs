//! Сводка уведомлений: JSON-массив с отступом в два пробела, UTF-8 без
//! экранирования не-ASCII символов, поля в порядке объявления структуры.

use crate::{error::Result, model::NotificationEntry};
use std::io::Write;

pub struct Json;

impl crate::traits::WriteFormat for Json {
    fn write<W: Write>(mut w: W, entries: &[NotificationEntry]) -> Result<()> {
        serde_json::to_writer_pretty(&mut w, entries)?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}

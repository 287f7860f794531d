//! facturiolib — пакетная генерация PDF-счетов из таблицы и сводки для рассылки.

pub mod config;
pub mod error;
pub mod message;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod summary;
pub mod traits;

pub mod formats {
    pub mod csv;
    pub mod json;
    pub mod pdf;
}

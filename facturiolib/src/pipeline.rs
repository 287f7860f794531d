//! Пакетный прогон: загрузка → нормализация → рендер → экспорт PDF → сводка.
//!
//! Ошибки загрузки, нормализации и рендера прерывают пакет до записи первого
//! файла. Первая ошибка экспорта тоже останавливает пакет, сводка при этом
//! не пишется.

use crate::{
    config::Config,
    error::{FacturioError, Result},
    formats::{csv::Csv, pdf::Pdf},
    model::{Invoice, RawRecord},
    normalize::normalize,
    render::InvoiceRenderer,
    summary::{summarize, write_summary},
    traits::{ExportFormat, ReadFormat},
};
use log::{debug, info};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Всё проверить, но ничего не записывать.
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub invoices: Vec<Invoice>,
    pub documents: Vec<PathBuf>,
    pub summary: Option<PathBuf>,
}

pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)
        .map_err(|e| FacturioError::DataLoad(format!("{}: {e}", path.display())))?;
    Csv::read(BufReader::new(file))
}

pub fn run(cfg: &Config, opts: RunOptions) -> Result<RunReport> {
    info!("Loading invoice data from {}", cfg.paths.input_list.display());
    let rows = load_records(&cfg.paths.input_list)?;
    info!("Loaded {} rows", rows.len());

    let renderer = InvoiceRenderer::from_file(&cfg.paths.template_path)?;

    let invoices = normalize(
        &rows,
        &cfg.paths.output_folder,
        &cfg.invoice,
        &cfg.whatsapp,
    )?;
    info!("Created {} invoice records", invoices.len());

    info!("Rendering {} invoices", invoices.len());
    let rendered = invoices
        .iter()
        .map(|inv| renderer.render(inv, &cfg.invoice))
        .collect::<Result<Vec<_>>>()?;

    if opts.dry_run {
        for inv in &invoices {
            info!("[dry-run] would write {}", inv.filename.display());
        }
        info!(
            "[dry-run] would write summary to {}",
            cfg.paths.whatsapp_output_file.display()
        );
        return Ok(RunReport {
            invoices,
            documents: Vec::new(),
            summary: None,
        });
    }

    fs::create_dir_all(&cfg.paths.output_folder)
        .map_err(|e| FacturioError::export(&cfg.paths.output_folder, e))?;

    let mut documents = Vec::with_capacity(invoices.len());
    for (inv, markup) in invoices.iter().zip(&rendered) {
        Pdf::export_to_file(markup, renderer.base_dir(), &inv.filename)?;
        debug!("wrote {}", inv.filename.display());
        documents.push(inv.filename.clone());
    }
    info!("All {} invoices generated", documents.len());

    let entries = summarize(&invoices, &cfg.invoice.country_code);
    write_summary(&cfg.paths.whatsapp_output_file, &entries)?;
    info!(
        "Notification summary written to {}",
        cfg.paths.whatsapp_output_file.display()
    );

    Ok(RunReport {
        invoices,
        documents,
        summary: Some(cfg.paths.whatsapp_output_file.clone()),
    })
}

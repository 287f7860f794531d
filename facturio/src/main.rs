use clap::Parser;
use facturiolib::{
    config::Config,
    error::Result,
    pipeline::{run, RunOptions},
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "facturio", version, about = "Генерация PDF-счетов и сводки для рассылки")]
struct Cli {
    /// Конфигурационный файл (YAML)
    #[arg(short = 'c', long = "config", default_value = "config.yaml")]
    config: PathBuf,

    /// Проверить данные и шаблоны, ничего не записывая
    #[arg(long = "dry-run")]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("Loading configuration from {}", cli.config.display());
    let cfg = Config::load(&cli.config)?;

    let report = run(&cfg, RunOptions { dry_run: cli.dry_run })?;
    info!(
        "Process completed: {} records, {} documents",
        report.invoices.len(),
        report.documents.len()
    );
    Ok(())
}

//! Конфигурация запуска (YAML). Относительные пути разрешаются от каталога
//! конфигурационного файла, а не от рабочего каталога процесса.

use crate::error::{FacturioError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub invoice: InvoiceConfig,
    pub whatsapp: WhatsappConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub input_list: PathBuf,
    pub output_folder: PathBuf,
    pub template_path: PathBuf,
    pub whatsapp_output_file: PathBuf,
}

/// Статические значения счёта. Числа и строки из YAML хранятся как текст.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceConfig {
    #[serde(deserialize_with = "scalar")]
    pub pay_before_day: String,
    #[serde(deserialize_with = "scalar")]
    pub day_issued: String,
    #[serde(deserialize_with = "scalar")]
    pub month: String,
    #[serde(deserialize_with = "scalar")]
    pub year: String,
    #[serde(default, deserialize_with = "scalar")]
    pub country_code: String,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
}

/// Что делать, если две строки дают одно и то же имя файла.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Overwrite,
}

/// Шаблоны сообщений в стиле `str.format`: `{name}`, `{month}`, `{year}`, `{pending}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsappConfig {
    pub template_bad: String,
    pub template_good: String,
}

impl Config {
    pub fn from_yaml(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| FacturioError::Config(e.to_string()))
    }

    /// Читает файл и делает все пути абсолютными.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| FacturioError::Config(format!("{}: {e}", path.display())))?;
        let cfg = Self::from_yaml(&text)?;

        let abs = std::path::absolute(path)
            .map_err(|e| FacturioError::Config(format!("{}: {e}", path.display())))?;
        let base = abs.parent().unwrap_or(Path::new("/"));
        Ok(cfg.resolve_paths(base))
    }

    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let p = &mut self.paths;
        for path in [
            &mut p.input_list,
            &mut p.output_folder,
            &mut p.template_path,
            &mut p.whatsapp_output_file,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

fn scalar<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    match serde_yaml::Value::deserialize(d)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, found {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
paths:
  input_list: data/list.csv
  output_folder: /srv/pdfs
  template_path: templates/invoice.html
  whatsapp_output_file: out/output.json
invoice:
  pay_before_day: 10
  day_issued: "1"
  month: Octubre
  year: 2025
  country_code: 52
whatsapp:
  template_bad: "Hola {name}, debes {pending}"
  template_good: "Gracias {name}"
"#;

    #[test]
    fn scalars_become_text() {
        let cfg = Config::from_yaml(YAML).expect("parse");
        assert_eq!(cfg.invoice.pay_before_day, "10");
        assert_eq!(cfg.invoice.year, "2025");
        assert_eq!(cfg.invoice.month, "Octubre");
        assert_eq!(cfg.invoice.country_code, "52");
        assert_eq!(cfg.invoice.on_duplicate, DuplicatePolicy::Reject);
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let cfg = Config::from_yaml(YAML)
            .expect("parse")
            .resolve_paths(Path::new("/etc/facturio"));
        assert_eq!(cfg.paths.input_list, Path::new("/etc/facturio/data/list.csv"));
        assert_eq!(cfg.paths.output_folder, Path::new("/srv/pdfs"));
    }

    #[test]
    fn missing_key_is_config_error() {
        let broken = YAML.replace("  month: Octubre\n", "");
        let err = Config::from_yaml(&broken).unwrap_err();
        assert!(matches!(err, FacturioError::Config(msg) if msg.contains("month")));
    }

    #[test]
    fn country_code_is_optional() {
        let cfg = Config::from_yaml(&YAML.replace("  country_code: 52\n", "")).expect("parse");
        assert_eq!(cfg.invoice.country_code, "");
    }
}

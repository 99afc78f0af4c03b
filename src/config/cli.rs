use crate::config::toml_config::{DashboardConfig, OutputFormat};
use crate::core::tariff::ScenarioPreset;
use crate::core::Storage;
use crate::domain::model::Direction;
use crate::domain::report::ViewType;
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "trade-balance")]
#[command(about = "Brazil-USA trade balance report: monthly series, top products and tariff scenarios")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the export and import files
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long, help = "Export records file")]
    pub exports: Option<String>,

    #[arg(long, help = "Import records file")]
    pub imports: Option<String>,

    #[arg(long, help = "Field delimiter of the input files")]
    pub delimiter: Option<char>,

    /// Series view: 12m, sa or 3mma
    #[arg(long)]
    pub view: Option<ViewType>,

    /// Product code or name to drill into
    #[arg(long)]
    pub product: Option<String>,

    /// Direction of the product drill-down: export or import
    #[arg(long)]
    pub direction: Option<Direction>,

    /// Uniform tariff scenario: pre-trump, post-trump, extreme or reset
    #[arg(long)]
    pub preset: Option<ScenarioPreset>,

    /// Per-product tariff, CODE=PERCENT (repeatable)
    #[arg(long = "tariff", value_name = "CODE=PERCENT")]
    pub tariffs: Vec<String>,

    #[arg(long, help = "Number of products in the top table")]
    pub top: Option<usize>,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    /// Also write a ZIP bundle with CSV/JSON exports
    #[arg(long)]
    pub bundle: Option<String>,

    #[arg(long, help = "Directory for the ZIP bundle")]
    pub output_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Loads the config file (or defaults) and applies the command-line overrides.
    pub fn resolve(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path);
                DashboardConfig::from_file(path)?
            }
            None => DashboardConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data.data_dir = dir.clone();
        }
        if let Some(exports) = &self.exports {
            config.data.export_file = exports.clone();
        }
        if let Some(imports) = &self.imports {
            config.data.import_file = imports.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.schema.delimiter = delimiter;
        }
        if let Some(view) = self.view {
            config.report.view = view;
        }
        if let Some(product) = &self.product {
            config.report.product = Some(product.clone());
        }
        if let Some(direction) = self.direction {
            config.report.product_direction = direction;
        }
        if let Some(preset) = self.preset {
            tracing::info!("Tariff preset overridden to: {}", preset);
            config.tariff.preset = Some(preset);
        }
        for entry in &self.tariffs {
            config.tariff.apply_override(entry)?;
        }
        if let Some(top) = self.top {
            config.analysis.top_products = top;
        }
        if self.json {
            config.report.format = OutputFormat::Json;
        }
        if let Some(bundle) = &self.bundle {
            config.report.bundle = Some(bundle.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }

        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;
    use tempfile::TempDir;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "trade-balance",
            "--data-dir",
            "/data",
            "--view",
            "3mma",
            "--product",
            "Café",
            "--direction",
            "import",
            "--preset",
            "post-trump",
            "--tariff",
            "0901=7.5",
            "--tariff",
            "2709=0",
            "--top",
            "5",
            "--json",
            "--bundle",
            "report.zip",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.import_path(), "/data/dados_brasil_eua_importacao.csv");
        assert_eq!(config.report.view, ViewType::ThreeMonthAverage);
        assert_eq!(config.report.product.as_deref(), Some("Café"));
        assert_eq!(config.report.product_direction, Direction::Import);
        assert_eq!(config.tariff.preset, Some(ScenarioPreset::PostTrump));
        assert_eq!(config.tariff.overrides.len(), 2);
        assert_eq!(config.analysis.top_products, 5);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.bundle_path().as_deref(), Some("report.zip"));
    }

    #[test]
    fn test_cli_rejects_bad_tariff_override() {
        let cli = CliConfig::parse_from(["trade-balance", "--tariff", "0901=lots"]);
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_view() {
        let parsed = CliConfig::try_parse_from(["trade-balance", "--view", "weekly"]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());

        storage.write_file("nested/out.zip", b"bytes").await.unwrap();
        let data = storage.read_file("nested/out.zip").await.unwrap();
        assert_eq!(data, b"bytes");

        assert!(storage.read_file("missing.csv").await.is_err());
    }
}

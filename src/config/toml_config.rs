use crate::core::tariff::TariffPolicy;
use crate::core::ConfigProvider;
use crate::domain::model::Direction;
use crate::domain::report::ViewType;
use crate::utils::error::{Result, TradeError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_EXPORT_FILE: &str = "dados_brasil_eua_exportacao.csv";
pub const DEFAULT_IMPORT_FILE: &str = "dados_brasil_eua_importacao.csv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub schema: SchemaConfig,
    pub analysis: AnalysisConfig,
    pub tariff: TariffPolicy,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory the export/import paths are resolved against.
    pub data_dir: String,
    pub export_file: String,
    pub import_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            export_file: DEFAULT_EXPORT_FILE.to_string(),
            import_file: DEFAULT_IMPORT_FILE.to_string(),
        }
    }
}

/// Column mapping of the input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub delimiter: char,
    pub date_column: String,
    pub year_column: String,
    pub month_column: String,
    pub product_code_column: String,
    pub product_name_column: Option<String>,
    pub value_column: String,
    /// Raw values are divided by this to get USD millions.
    pub value_divisor: f64,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            date_column: "Data".to_string(),
            year_column: "CO_ANO".to_string(),
            month_column: "CO_MES".to_string(),
            product_code_column: "CO_NCM".to_string(),
            product_name_column: Some("Produto".to_string()),
            value_column: "VL_FOB".to_string(),
            value_divisor: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub top_products: usize,
    pub simulator_products: usize,
    pub window_months: u32,
    pub seasonal_min_periods: usize,
    pub gdp_usd_billions: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_products: 10,
            simulator_products: 100,
            window_months: 12,
            seasonal_min_periods: 24,
            gdp_usd_billions: 2264.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub view: ViewType,
    /// Product code or name for the drill-down section.
    pub product: Option<String>,
    pub product_direction: Direction,
    pub format: OutputFormat,
    /// ZIP file name written under the output directory.
    pub bundle: Option<String>,
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            view: ViewType::default(),
            product: None,
            product_direction: Direction::Export,
            format: OutputFormat::default(),
            bundle: None,
            output_dir: ".".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TradeError::ConfigError {
                message: format!("config file '{}' not found", path.display()),
            },
            _ => TradeError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TradeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TradeError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("data.data_dir", &self.data.data_dir)?;
        validation::validate_path("data.export_file", &self.data.export_file)?;
        validation::validate_path("data.import_file", &self.data.import_file)?;
        validation::validate_file_extensions(
            "data",
            &[self.data.export_file.as_str(), self.data.import_file.as_str()],
            &["csv", "txt", "tsv"],
        )?;

        validation::validate_non_empty_string("schema.date_column", &self.schema.date_column)?;
        validation::validate_non_empty_string(
            "schema.product_code_column",
            &self.schema.product_code_column,
        )?;
        validation::validate_non_empty_string("schema.value_column", &self.schema.value_column)?;
        if !self.schema.delimiter.is_ascii() {
            return Err(TradeError::InvalidConfigValueError {
                field: "schema.delimiter".to_string(),
                value: self.schema.delimiter.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            });
        }
        validation::validate_positive_float("schema.value_divisor", self.schema.value_divisor)?;

        validation::validate_positive_number("analysis.top_products", self.analysis.top_products, 1)?;
        validation::validate_positive_number(
            "analysis.simulator_products",
            self.analysis.simulator_products,
            1,
        )?;
        validation::validate_range("analysis.window_months", self.analysis.window_months, 1, 120)?;
        // The decomposition needs two full cycles.
        validation::validate_positive_number(
            "analysis.seasonal_min_periods",
            self.analysis.seasonal_min_periods,
            24,
        )?;
        validation::validate_positive_float("analysis.gdp_usd_billions", self.analysis.gdp_usd_billions)?;

        self.tariff.validate()?;

        if let Some(product) = &self.report.product {
            validation::validate_non_empty_string("report.product", product)?;
        }
        if let Some(bundle) = &self.report.bundle {
            validation::validate_path("report.bundle", bundle)?;
            validation::validate_file_extensions("report.bundle", &[bundle.as_str()], &["zip"])?;
        }
        validation::validate_path("report.output_dir", &self.report.output_dir)?;

        Ok(())
    }
}

pub(crate) fn join_data_path(dir: &str, file: &str) -> String {
    if dir.is_empty() || dir == "." || Path::new(file).is_absolute() {
        file.to_string()
    } else {
        Path::new(dir).join(file).to_string_lossy().into_owned()
    }
}

impl ConfigProvider for DashboardConfig {
    fn export_path(&self) -> String {
        join_data_path(&self.data.data_dir, &self.data.export_file)
    }

    fn import_path(&self) -> String {
        join_data_path(&self.data.data_dir, &self.data.import_file)
    }

    fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }

    fn tariff_policy(&self) -> &TariffPolicy {
        &self.tariff
    }

    fn report(&self) -> &ReportConfig {
        &self.report
    }

    fn bundle_path(&self) -> Option<String> {
        self.report
            .bundle
            .as_deref()
            .map(|bundle| join_data_path(&self.report.output_dir, bundle))
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();

        assert_eq!(config.data.export_file, DEFAULT_EXPORT_FILE);
        assert_eq!(config.schema.value_column, "VL_FOB");
        assert_eq!(config.analysis.top_products, 10);
        assert_eq!(config.analysis.simulator_products, 100);
        assert_eq!(config.tariff.default_percent, 5.0);
        assert_eq!(config.report.view, ViewType::Rolling12M);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[data]
data_dir = "/srv/comex"
export_file = "exp.csv"
import_file = "imp.csv"

[schema]
delimiter = ";"
product_name_column = "NO_NCM_POR"
value_divisor = 1.0

[analysis]
top_products = 5
gdp_usd_billions = 2100.0

[tariff]
default_percent = 3.0
preset = "extreme"

[[tariff.rules]]
keywords = ["Café"]
percent = 1.0

[tariff.overrides]
"09011110" = 12.5

[report]
view = "three-month-average"
product = "Café"
product_direction = "import"
format = "json"
bundle = "report.zip"
"#;

        let config = DashboardConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.export_path(), "/srv/comex/exp.csv");
        assert_eq!(config.schema.delimiter, ';');
        assert_eq!(config.schema.product_name_column.as_deref(), Some("NO_NCM_POR"));
        assert_eq!(config.analysis.top_products, 5);
        assert_eq!(config.analysis.window_months, 12);
        assert_eq!(config.tariff.rules.len(), 1);
        assert_eq!(config.tariff.overrides.get("09011110"), Some(&12.5));
        assert_eq!(config.report.view, ViewType::ThreeMonthAverage);
        assert_eq!(config.report.product_direction, Direction::Import);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TRADE_BALANCE_TEST_DIR", "/data/trade");

        let config = DashboardConfig::from_toml_str(
            r#"
[data]
data_dir = "${TRADE_BALANCE_TEST_DIR}"
"#,
        )
        .unwrap();
        assert_eq!(config.data.data_dir, "/data/trade");

        std::env::remove_var("TRADE_BALANCE_TEST_DIR");
    }

    #[test]
    fn test_config_validation() {
        let config = DashboardConfig::from_toml_str(
            r#"
[analysis]
top_products = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = DashboardConfig::from_toml_str(
            r#"
[tariff]
default_percent = 150.0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = DashboardConfig::from_toml_str(
            r#"
[data]
export_file = "exports.xlsx"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = DashboardConfig::from_toml_str("[analysis\ntop_products = 3");
        assert!(matches!(result, Err(TradeError::ConfigValidationError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[report]\nview = \"seasonally-adjusted\"\n")
            .unwrap();

        let config = DashboardConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.report.view, ViewType::SeasonallyAdjusted);

        let missing = DashboardConfig::from_file("/nonexistent/trade-balance.toml");
        assert!(matches!(missing, Err(TradeError::ConfigError { .. })));
    }
}

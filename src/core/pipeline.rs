use crate::config::toml_config::OutputFormat;
use crate::core::{aggregator, loader, products, tariff};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Direction, TradeDataset};
use crate::domain::report::DashboardReport;
use crate::report::{build_bundle, render_report};
use crate::utils::error::{Result, TradeError};

/// Loads the export/import files, builds every view of the report and
/// prints it, optionally writing the ZIP bundle through storage.
pub struct DashboardPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> DashboardPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Formats `report` the way `load` prints it.
    pub fn render(&self, report: &DashboardReport) -> Result<String> {
        match self.config.report().format {
            OutputFormat::Text => Ok(render_report(report)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DashboardPipeline<S, C> {
    async fn extract(&self) -> Result<TradeDataset> {
        let schema = self.config.schema();

        let export_path = self.config.export_path();
        tracing::debug!("Reading exports from: {}", export_path);
        let exports =
            loader::load_records(&self.storage, &export_path, Direction::Export, schema).await?;

        let import_path = self.config.import_path();
        tracing::debug!("Reading imports from: {}", import_path);
        let imports =
            loader::load_records(&self.storage, &import_path, Direction::Import, schema).await?;

        Ok(TradeDataset::new(exports, imports))
    }

    async fn transform(&self, data: TradeDataset) -> Result<DashboardReport> {
        let analysis = self.config.analysis();
        let view = self.config.report().view;

        let monthly = aggregator::monthly_trade(
            &data.exports,
            &data.imports,
            analysis.seasonal_min_periods,
        );
        let headline = if monthly.is_empty() {
            tracing::warn!("No trade records loaded, headline metrics skipped");
            None
        } else {
            Some(aggregator::headline(&monthly, view, analysis.gdp_usd_billions)?)
        };

        let top = products::top_products(
            &data.exports,
            analysis.top_products,
            analysis.window_months,
        );
        let simulator_table = products::top_products(
            &data.exports,
            analysis.simulator_products,
            analysis.window_months,
        );
        let simulation = tariff::simulate(
            &simulator_table,
            self.config.tariff_policy(),
            analysis.gdp_usd_billions,
        )?;

        let product_analysis = match &self.config.report().product {
            Some(query) => {
                let direction = self.config.report().product_direction;
                let code = data.resolve_product(query).ok_or_else(|| {
                    TradeError::EmptyAggregationError {
                        what: format!("product '{}'", query),
                    }
                })?;
                tracing::debug!("Product '{}' resolved to code {}", query, code);
                Some(products::analyze_product(
                    &data,
                    &code,
                    direction,
                    analysis.seasonal_min_periods,
                )?)
            }
            None => None,
        };

        Ok(DashboardReport {
            view,
            record_count: data.len(),
            monthly,
            headline,
            products: top,
            simulation,
            product_analysis,
        })
    }

    async fn load(&self, report: DashboardReport) -> Result<String> {
        let rendered = self.render(&report)?;
        println!("{}", rendered);

        match self.config.bundle_path() {
            Some(path) => {
                let zip_data = build_bundle(&report)?;
                tracing::debug!("Writing ZIP bundle ({} bytes) to storage", zip_data.len());
                self.storage.write_file(&path, &zip_data).await?;
                Ok(path)
            }
            None => Ok("stdout".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::{AnalysisConfig, ReportConfig, SchemaConfig};
    use crate::core::tariff::{ScenarioPreset, TariffPolicy};
    use crate::domain::report::ViewType;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, content: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), content.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                TradeError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        schema: SchemaConfig,
        analysis: AnalysisConfig,
        tariff: TariffPolicy,
        report: ReportConfig,
        bundle: Option<String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                schema: SchemaConfig::default(),
                analysis: AnalysisConfig::default(),
                tariff: TariffPolicy::default(),
                report: ReportConfig::default(),
                bundle: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn export_path(&self) -> String {
            "exp.csv".to_string()
        }

        fn import_path(&self) -> String {
            "imp.csv".to_string()
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
            self.bundle.clone()
        }
    }

    const EXPORTS: &str = "\
Data,CO_NCM,Produto,VL_FOB
2024-01-01,27090010,Óleos brutos de petróleo,300000000
2024-01-01,0901,Café não torrado,100000000
2024-02-01,27090010,Óleos brutos de petróleo,200000000
2024-02-01,88024000,Aeronaves,400000000
";

    const IMPORTS: &str = "\
Data,CO_NCM,Produto,VL_FOB
2024-01-01,84111100,Turborreatores,250000000
2024-03-01,84111100,Turborreatores,50000000
";

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::new();
        storage.put("exp.csv", EXPORTS).await;
        storage.put("imp.csv", IMPORTS).await;
        storage
    }

    #[tokio::test]
    async fn test_extract_reads_both_directions() {
        let pipeline = DashboardPipeline::new(seeded_storage().await, MockConfig::new());
        let dataset = pipeline.extract().await.unwrap();

        assert_eq!(dataset.exports.len(), 4);
        assert_eq!(dataset.imports.len(), 2);
        assert!(dataset.imports.iter().all(|r| r.direction == Direction::Import));
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let storage = MockStorage::new();
        storage.put("exp.csv", EXPORTS).await;
        let pipeline = DashboardPipeline::new(storage, MockConfig::new());

        match pipeline.extract().await {
            Err(TradeError::DataFileNotFound { path }) => assert_eq!(path, "imp.csv"),
            other => panic!("unexpected result: {:?}", other.map(|d| d.len())),
        }
    }

    #[tokio::test]
    async fn test_transform_builds_all_sections() {
        let mut config = MockConfig::new();
        config.tariff.preset = Some(ScenarioPreset::PostTrump);
        config.report.product = Some("café não torrado".to_string());
        let pipeline = DashboardPipeline::new(seeded_storage().await, config);

        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();

        // Outer join of 2024-01..02 exports and 2024-01/03 imports.
        let periods: Vec<String> = report.monthly.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(report.monthly[0].monthly.balance, 150.0);
        assert_eq!(report.monthly[2].monthly.exports, 0.0);
        assert_eq!(report.monthly[2].monthly.balance, -50.0);

        let headline = report.headline.as_ref().unwrap();
        assert_eq!(headline.view, ViewType::Rolling12M);
        assert_eq!(headline.values.exports, 1000.0);
        assert_eq!(headline.values.imports, 300.0);

        assert_eq!(report.products.rows[0].product_code, "27090010");
        assert_eq!(report.products.total_usd_millions, 1000.0);

        assert!(report.simulation.rows.iter().all(|r| r.tariff_percent == 10.0));
        assert!((report.simulation.summary.total_impact_usd_millions - 100.0).abs() < 1e-9);

        let analysis = report.product_analysis.as_ref().unwrap();
        assert_eq!(analysis.product_code, "0901");
        assert_eq!(analysis.trailing_12m_usd_millions, 100.0);
    }

    #[tokio::test]
    async fn test_transform_unknown_product() {
        let mut config = MockConfig::new();
        config.report.product = Some("soja".to_string());
        let pipeline = DashboardPipeline::new(seeded_storage().await, config);

        let dataset = pipeline.extract().await.unwrap();
        assert!(matches!(
            pipeline.transform(dataset).await,
            Err(TradeError::EmptyAggregationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_empty_dataset() {
        let pipeline = DashboardPipeline::new(MockStorage::new(), MockConfig::new());
        let report = pipeline.transform(TradeDataset::default()).await.unwrap();

        assert!(report.monthly.is_empty());
        assert!(report.headline.is_none());
        assert!(report.simulation.summary.impact_gdp_percent.is_none());
    }

    #[tokio::test]
    async fn test_load_writes_bundle() {
        let mut config = MockConfig::new();
        config.bundle = Some("out/report.zip".to_string());
        let pipeline = DashboardPipeline::new(seeded_storage().await, config);

        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();
        let destination = pipeline.load(report).await.unwrap();

        assert_eq!(destination, "out/report.zip");
        let zip_data = pipeline.storage().get_file("out/report.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 4);
    }

    #[tokio::test]
    async fn test_render_json() {
        let mut config = MockConfig::new();
        config.report.format = OutputFormat::Json;
        let pipeline = DashboardPipeline::new(seeded_storage().await, config);

        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&pipeline.render(&report).unwrap()).unwrap();

        assert_eq!(json["view"], "12m");
        assert_eq!(json["record_count"], 6);
        assert_eq!(json["monthly"].as_array().unwrap().len(), 3);
    }
}

use crate::config::toml_config::{AnalysisConfig, ReportConfig, SchemaConfig};
use crate::core::tariff::TariffPolicy;
use crate::domain::model::TradeDataset;
use crate::domain::report::DashboardReport;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn export_path(&self) -> String;
    fn import_path(&self) -> String;
    fn schema(&self) -> &SchemaConfig;
    fn analysis(&self) -> &AnalysisConfig;
    fn tariff_policy(&self) -> &TariffPolicy;
    fn report(&self) -> &ReportConfig;
    /// Location of the ZIP bundle, when one was requested.
    fn bundle_path(&self) -> Option<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<TradeDataset>;
    async fn transform(&self, data: TradeDataset) -> Result<DashboardReport>;
    async fn load(&self, report: DashboardReport) -> Result<String>;
}

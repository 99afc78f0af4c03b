use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: ResourceMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting trade balance report");
        self.monitor.log_stats("start");

        tracing::info!("Loading trade records...");
        let dataset = self.pipeline.extract().await?;
        tracing::info!(
            exports = dataset.exports.len(),
            imports = dataset.imports.len(),
            "Loaded {} records",
            dataset.len()
        );
        self.monitor.log_stats("extract");

        tracing::info!("Building report...");
        let report = self.pipeline.transform(dataset).await?;
        tracing::info!(
            periods = report.monthly.len(),
            products = report.products.distinct_products,
            "Report built"
        );
        self.monitor.log_stats("transform");

        let destination = self.pipeline.load(report).await?;
        tracing::info!("Report written to: {}", destination);
        self.monitor.log_final_stats();

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Direction, Period, TradeDataset, TradeRecord};
    use crate::domain::report::DashboardReport;
    use crate::utils::error::TradeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        calls: AtomicUsize,
        fail_transform: bool,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<TradeDataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let record = TradeRecord {
                product_code: "0901".to_string(),
                product_name: None,
                period: Period::new(2024, 1)?,
                direction: Direction::Export,
                value_usd_millions: 1.0,
            };
            Ok(TradeDataset::new(vec![record], vec![]))
        }

        async fn transform(&self, _data: TradeDataset) -> Result<DashboardReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(if self.fail_transform {
                TradeError::ParseError {
                    file: "exp.csv".to_string(),
                    line: 7,
                    message: "value 'abc' is not a number".to_string(),
                }
            } else {
                TradeError::EmptyAggregationError {
                    what: "test".to_string(),
                }
            })
        }

        async fn load(&self, _report: DashboardReport) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("stdout".to_string())
        }
    }

    #[tokio::test]
    async fn test_engine_stops_at_failing_phase() {
        let engine = ReportEngine::new(CountingPipeline {
            calls: AtomicUsize::new(0),
            fail_transform: true,
        });

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, TradeError::ParseError { line: 7, .. }));
        assert_eq!(engine.pipeline.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_engine_with_monitoring_flag() {
        let engine = ReportEngine::new_with_monitoring(
            CountingPipeline {
                calls: AtomicUsize::new(0),
                fail_transform: false,
            },
            false,
        );
        assert!(!engine.monitor.is_enabled());

        let result = tokio_test::block_on(engine.run());
        assert!(matches!(result, Err(TradeError::EmptyAggregationError { .. })));
    }
}

pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::DashboardConfig;
pub use core::{engine::ReportEngine, pipeline::DashboardPipeline};
pub use utils::error::{Result, TradeError};

pub mod aggregator;
pub mod comex;
pub mod engine;
pub mod loader;
pub mod pipeline;
pub mod products;
pub mod series;
pub mod tariff;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

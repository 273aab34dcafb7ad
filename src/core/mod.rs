pub mod chart;
pub mod cohort;
pub mod etl;
pub mod export;
pub mod extract;
pub mod join;
pub mod loader;
pub mod pipeline;
pub mod stats;

pub use crate::domain::model::{AgeRecord, AwmRecord, Extraction, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

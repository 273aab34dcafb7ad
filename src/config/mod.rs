pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT: &str = "audcog_data.json";
pub const DEFAULT_DATASET_KEY: &str = "audcog-online";
pub const MAX_HISTOGRAM_BINS: usize = 500;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "audcog-etl")]
#[command(about = "Extract AGM participants with age data from an audcog export")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_INPUT)]
    pub input: String,

    #[arg(long, default_value = DEFAULT_DATASET_KEY)]
    pub dataset_key: String,

    #[arg(long, default_value = crate::core::cohort::DEFAULT_COHORT_PATTERN)]
    pub cohort_pattern: String,

    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = crate::core::export::DEFAULT_OUTPUT_FILE)]
    pub output_file: String,

    #[arg(long, default_value_t = crate::core::chart::DEFAULT_HISTOGRAM_BINS)]
    pub histogram_bins: usize,

    #[arg(long, help = "TOML configuration file; replaces the flags above")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage after each phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn dataset_key(&self) -> &str {
        &self.dataset_key
    }

    fn cohort_pattern(&self) -> &str {
        &self.cohort_pattern
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn histogram_bins(&self) -> usize {
        self.histogram_bins
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_non_empty_string("dataset_key", &self.dataset_key)?;
        validation::validate_pattern("cohort_pattern", &self.cohort_pattern)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_extension("output_file", &self.output_file, &["csv"])?;
        validation::validate_range("histogram_bins", self.histogram_bins, 1, MAX_HISTOGRAM_BINS)?;
        Ok(())
    }
}

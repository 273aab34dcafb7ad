use crate::core::chart::{BoxPlot, Histogram};
use crate::core::cohort::{unique_participant_ids, CohortFilter};
use crate::core::export::to_csv;
use crate::core::extract::extract_awm_records;
use crate::core::join::join_ages;
use crate::core::loader::load_dataset;
use crate::core::stats::{AgeStatistics, Describe};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{AgeReport, Extraction, TransformResult};
use crate::utils::error::{EtlError, Result};
use std::path::Path;

pub struct AudcogPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    cohort: CohortFilter,
}

impl<S: Storage, C: ConfigProvider> AudcogPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let cohort = CohortFilter::new(config.cohort_pattern())?;
        Ok(Self {
            storage,
            config,
            cohort,
        })
    }

    pub fn output_location(&self) -> String {
        Path::new(self.config.output_path())
            .join(self.config.output_file())
            .to_string_lossy()
            .into_owned()
    }

    fn build_report(&self, result: &TransformResult) -> Option<AgeReport> {
        let statistics = AgeStatistics::from_records(&result.joined_records)?;
        let ages: Vec<f64> = result.joined_records.iter().map(|r| r.age as f64).collect();
        let report = AgeReport {
            histogram: Histogram::new(&ages, self.config.histogram_bins())?,
            box_plot: BoxPlot::new(&ages)?,
            participant_summary: Describe::per_participant(&result.joined_records)?,
            statistics,
        };
        tracing::debug!(
            "Report built over {} ages from {} participants",
            report.statistics.count,
            report.participant_summary.count
        );
        Some(report)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AudcogPipeline<S, C> {
    async fn extract(&self) -> Result<Extraction> {
        let dataset =
            load_dataset(&self.storage, self.config.input_path(), self.config.dataset_key()).await?;
        let (awm_records, skipped) = extract_awm_records(&dataset);

        Ok(Extraction {
            dataset,
            awm_records,
            skipped,
        })
    }

    async fn transform(&self, data: &Extraction) -> Result<TransformResult> {
        if data.awm_records.is_empty() {
            tracing::warn!("❌ No AWM data found in any participants");
            return Ok(TransformResult::default());
        }

        let agm_records = self.cohort.filter(&data.awm_records);
        tracing::info!(
            "AGM participants found: {} records (pattern {})",
            agm_records.len(),
            self.cohort.as_str()
        );

        if agm_records.is_empty() {
            let sample: Vec<&str> = unique_participant_ids(
                data.awm_records.iter().map(|r| r.participant_id.as_str()),
            )
            .into_iter()
            .take(10)
            .collect();
            tracing::warn!("❌ No AGM participants found in the data");
            tracing::warn!("Sample of participant IDs to check pattern: {:?}", sample);
            return Ok(TransformResult::default());
        }

        let unique = unique_participant_ids(agm_records.iter().map(|r| r.participant_id.as_str()));
        tracing::info!("Unique AGM participant IDs: {:?}", unique);

        let joined_records = join_ages(&data.dataset, &self.cohort);
        let mut result = TransformResult {
            agm_records,
            joined_records,
            report: None,
        };

        if result.joined_records.is_empty() {
            tracing::warn!("❌ No age data could be extracted from the JSON structure");
            return Ok(result);
        }

        result.report = self.build_report(&result);
        Ok(result)
    }

    async fn load(&self, result: &TransformResult) -> Result<String> {
        if result.report.is_none() {
            return Err(EtlError::ProcessingError {
                message: "nothing to export: no AGM records with age data".to_string(),
            });
        }

        let output_path = self.output_location();
        let csv = to_csv(&result.joined_records)?;

        tracing::debug!(
            "Writing {} rows ({} bytes) to {}",
            result.joined_records.len(),
            csv.len(),
            output_path
        );
        self.storage.write_file(&output_path, &csv).await?;

        Ok(output_path)
    }
}

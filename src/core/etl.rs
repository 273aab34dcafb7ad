use crate::core::chart::{format_std, render};
use crate::core::Pipeline;
use crate::domain::model::{AgeRecord, AgeReport, RunSummary};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

const PREVIEW_ROWS: usize = 10;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting ETL process...");

        // Extract
        let extraction = self.pipeline.extract().await?;
        println!(
            "Extracted {} AWM records from {} participants",
            extraction.awm_records.len(),
            extraction.dataset.len()
        );
        self.monitor.log_stats("Extract");

        let mut summary = RunSummary {
            participants: extraction.dataset.len(),
            awm_records: extraction.awm_records.len(),
            skipped: extraction.skipped.len(),
            ..RunSummary::default()
        };

        // Transform
        let result = self.pipeline.transform(&extraction).await?;
        summary.agm_records = result.agm_records.len();
        summary.joined_records = result.joined_records.len();
        println!("AGM participants found: {} records", result.agm_records.len());
        println!("Found {} AGM records with age data", result.joined_records.len());
        if !result.joined_records.is_empty() {
            tracing::info!("Sample AGM records with age:");
            for line in preview(&result.joined_records, PREVIEW_ROWS) {
                tracing::info!("{}", line);
            }
        }
        self.monitor.log_stats("Transform");

        // Load，只在有年齡資料時匯出
        if let Some(report) = &result.report {
            print_report(report);
            let output_path = self.pipeline.load(&result).await?;
            println!("\n💾 AGM data with age saved to {}", output_path);
            print_participant_summary(report);
            self.monitor.log_stats("Load");
            summary.output_path = Some(output_path);
        } else {
            println!("\n❌ No valid age data found, nothing exported");
        }

        self.monitor.log_final_stats();
        Ok(summary)
    }
}

fn print_report(report: &AgeReport) {
    let stats = &report.statistics;
    println!("\n{}", render(stats, &report.histogram, &report.box_plot));
    println!("\n📊 Age Statistics:");
    println!("Mean age: {:.1} years", stats.mean);
    println!("Median age: {:.1} years", stats.median);
    println!("Min age: {} years", stats.min);
    println!("Max age: {} years", stats.max);
    println!("Age range: {} years", stats.range());
    println!("Standard deviation: {} years", format_std(stats.std_dev));
    println!("Total participants with age data: {}", stats.count);
}

fn print_participant_summary(report: &AgeReport) {
    println!("\n📈 Age Summary by Participant:");
    println!("{}", report.participant_summary);
}

/// participant_id / age / sex / computer_type 的前幾列
fn preview(records: &[AgeRecord], limit: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<14} {:>4} {:<8} {}",
        "participant_id", "age", "sex", "computer_type"
    )];
    lines.extend(records.iter().take(limit).map(|r| {
        format!(
            "{:<14} {:>4} {:<8} {}",
            r.participant_id, r.age, r.demographics.sex, r.demographics.computer_type
        )
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Demographics;
    use serde_json::Map;

    #[test]
    fn test_preview_is_limited_to_first_rows() {
        let records: Vec<AgeRecord> = (0..12)
            .map(|i| AgeRecord {
                participant_id: format!("AGM{:04}", i),
                session_timestamp: "t".to_string(),
                age: 40 + i,
                demographics: Demographics {
                    sex: "f".to_string(),
                    ..Demographics::default()
                },
                fields: Map::new(),
            })
            .collect();

        let lines = preview(&records, PREVIEW_ROWS);

        // 標題 + 10 列
        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("participant_id"));
        assert!(lines[1].starts_with("AGM0000"));
        assert!(lines[1].contains("40"));
        assert!(lines[1].ends_with("unknown"));
        assert!(lines[10].starts_with("AGM0009"));
    }
}

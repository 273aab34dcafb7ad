use audcog_etl::core::ConfigProvider;
use audcog_etl::utils::error::ErrorCategory;
use audcog_etl::utils::{logger, validation::Validate};
use audcog_etl::{AudcogPipeline, CliConfig, EtlEngine, EtlError, LocalStorage, RunSummary, TomlConfig};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting audcog-etl");
    tracing::debug!("CLI config: {:?}", config);

    let result = match config.config.clone() {
        Some(path) => match TomlConfig::from_file(&path) {
            Ok(toml_config) => {
                tracing::info!("Using configuration file {}", path);
                let monitor = config.monitor || toml_config.monitoring_enabled();
                run(toml_config, monitor).await
            }
            Err(e) => Err(e),
        },
        None => {
            let monitor = config.monitor;
            run(config, monitor).await
        }
    };

    match result {
        Ok(summary) => {
            tracing::info!(
                "✅ ETL process completed: {} participants, {} skipped, {} AGM records, {} joined",
                summary.participants,
                summary.skipped,
                summary.agm_records,
                summary.joined_records
            );
            if let Some(path) = summary.output_path {
                println!("📁 Output saved to: {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            let exit_code = e.exit_code();
            if e.category() == ErrorCategory::Unexpected {
                // 完整的錯誤鏈（RUST_BACKTRACE=1 時含 backtrace）
                eprintln!("{:?}", anyhow::Error::new(e));
            }

            std::process::exit(exit_code);
        }
    }
}

async fn run<C: ConfigProvider + Validate>(config: C, monitor: bool) -> Result<RunSummary, EtlError> {
    config.validate()?;

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = AudcogPipeline::new(LocalStorage::default(), config)?;
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);
    engine.run().await
}

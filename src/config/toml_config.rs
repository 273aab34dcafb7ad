use crate::config::{DEFAULT_DATASET_KEY, MAX_HISTOGRAM_BINS};
use crate::core::chart::DEFAULT_HISTOGRAM_BINS;
use crate::core::cohort::DEFAULT_COHORT_PATTERN;
use crate::core::export::DEFAULT_OUTPUT_FILE;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub cohort: CohortConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    #[serde(default = "default_dataset_key")]
    pub dataset_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    pub pattern: String,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_COHORT_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            filename: default_filename(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub histogram_bins: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_dataset_key() -> String {
    DEFAULT_DATASET_KEY.to_string()
}

fn default_output_path() -> String {
    ".".to_string()
}

fn default_filename() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EtlError::ConfigValidationError {
                field: "config".to_string(),
                message: format!("configuration file {} not found", path.as_ref().display()),
            },
            _ => EtlError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AUDCOG_DATA})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("source.path", &self.source.path)?;
        validation::validate_non_empty_string("source.dataset_key", &self.source.dataset_key)?;
        validation::validate_pattern("cohort.pattern", &self.cohort.pattern)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_file_extension("load.filename", &self.load.filename, &["csv"])?;
        validation::validate_range(
            "report.histogram_bins",
            self.report.histogram_bins,
            1,
            MAX_HISTOGRAM_BINS,
        )?;
        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn dataset_key(&self) -> &str {
        &self.source.dataset_key
    }

    fn cohort_pattern(&self) -> &str {
        &self.cohort.pattern
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_file(&self) -> &str {
        &self.load.filename
    }

    fn histogram_bins(&self) -> usize {
        self.report.histogram_bins
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_content = r#"
[source]
path = "audcog_data.json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input_path(), "audcog_data.json");
        assert_eq!(config.dataset_key(), "audcog-online");
        assert_eq!(config.cohort_pattern(), r"^AGM\d{4,6}$");
        assert_eq!(config.output_path(), ".");
        assert_eq!(config.output_file(), "audcog_agm_with_age.csv");
        assert_eq!(config.histogram_bins(), 20);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[source]
path = "exports/audcog.json"
dataset_key = "audcog-lab"

[cohort]
pattern = '^PIL\d{3}$'

[load]
output_path = "./reports"
filename = "pilot_with_age.csv"

[report]
histogram_bins = 12

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.dataset_key(), "audcog-lab");
        assert_eq!(config.cohort_pattern(), r"^PIL\d{3}$");
        assert_eq!(config.output_path(), "./reports");
        assert_eq!(config.output_file(), "pilot_with_age.csv");
        assert_eq!(config.histogram_bins(), 12);
        assert!(config.monitoring_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("AUDCOG_TEST_INPUT", "/data/audcog.json");

        let toml_content = r#"
[source]
path = "${AUDCOG_TEST_INPUT}"

[load]
output_path = "${AUDCOG_TEST_UNSET_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.path, "/data/audcog.json");
        assert_eq!(config.load.output_path, "${AUDCOG_TEST_UNSET_DIR}");

        std::env::remove_var("AUDCOG_TEST_INPUT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[source]
path = "audcog_data.json"

[cohort]
pattern = "(AGM"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file_is_configuration_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = TomlConfig::from_file(dir.path().join("missing.toml")).unwrap_err();

        assert!(matches!(err, EtlError::ConfigValidationError { ref field, .. } if field == "config"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_source_section_is_rejected() {
        let err = TomlConfig::from_toml_str("[report]\nhistogram_bins = 5\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[source]\npath = \"from_file.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "from_file.json");
    }
}

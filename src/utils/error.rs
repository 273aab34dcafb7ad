use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source not found: {path}")]
    SourceNotFound { path: String },

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset key '{key}' not found (available keys: {})", .available.join(", "))]
    MissingDatasetKey { key: String, available: Vec<String> },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid cohort pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 錯誤分類，決定使用者看到的訊息與結束碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    SourceNotFound,
    Configuration,
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SourceNotFound { .. } => ErrorCategory::SourceNotFound,
            EtlError::PatternError(_)
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Unexpected,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::SourceNotFound => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Unexpected => ErrorSeverity::Critical,
        }
    }

    /// 結束碼：not found → 1，設定錯誤 → 2，其他 → 3
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::SourceNotFound => 1,
            ErrorCategory::Configuration => 2,
            ErrorCategory::Unexpected => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::SourceNotFound { path } => format!(
                "Error: The file {} was not found. Make sure it is in the working directory.",
                path
            ),
            EtlError::MissingDatasetKey { key, available } => format!(
                "Error: Could not find {} key in the data. Available keys: {}",
                key,
                available.join(", ")
            ),
            other => format!("An unexpected error occurred: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::SourceNotFound { .. } => "Check the --input path or the [source] path setting",
            EtlError::ParseError { .. } => "Validate the input file with a JSON linter",
            EtlError::MissingDatasetKey { .. } => "Pass --dataset-key with one of the available keys",
            EtlError::PatternError(_) => "Fix the cohort pattern; it must be a valid regular expression",
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Review the command-line flags or the TOML configuration file"
            }
            EtlError::IoError(_) | EtlError::CsvError(_) => {
                "Check that the output directory is writable"
            }
            EtlError::ProcessingError { .. } => "Inspect the input data shape under the dataset key",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

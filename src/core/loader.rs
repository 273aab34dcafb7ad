use crate::domain::model::Dataset;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

/// 讀取來源檔並取出 `key` 底下的參與者資料
pub async fn load_dataset<S: Storage>(storage: &S, path: &str, key: &str) -> Result<Dataset> {
    tracing::debug!("Reading source file: {}", path);
    let bytes = storage.read_file(path).await?;
    tracing::info!("Successfully loaded {}", path);
    parse_dataset(path, &bytes, key)
}

pub fn parse_dataset(path: &str, bytes: &[u8], key: &str) -> Result<Dataset> {
    let document: Value = serde_json::from_slice(bytes).map_err(|source| EtlError::ParseError {
        path: path.to_string(),
        source,
    })?;

    let Value::Object(mut top_level) = document else {
        return Err(EtlError::ProcessingError {
            message: format!("{} does not contain a JSON object at the top level", path),
        });
    };

    let available: Vec<String> = top_level.keys().cloned().collect();
    tracing::info!("Top-level keys: {:?}", available);

    match top_level.remove(key) {
        Some(Value::Object(participants)) => {
            let dataset = Dataset::from(participants);
            tracing::info!("Found {} data with {} participants", key, dataset.len());
            let first: Vec<&str> = dataset.participant_ids().take(5).collect();
            tracing::info!("First 5 participant IDs: {:?}", first);
            Ok(dataset)
        }
        Some(other) => Err(EtlError::ProcessingError {
            message: format!(
                "{} is expected to map participant ids to data, found {}",
                key,
                json_type_name(&other)
            ),
        }),
        None => Err(EtlError::MissingDatasetKey {
            key: key.to_string(),
            available,
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

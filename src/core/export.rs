use crate::core::join::FIXED_COLUMNS;
use crate::domain::model::AgeRecord;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

pub const DEFAULT_OUTPUT_FILE: &str = "audcog_agm_with_age.csv";

/// 固定欄位之後接所有量測欄位，依第一次出現的順序
pub fn columns(records: &[AgeRecord]) -> Vec<String> {
    let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut seen: std::collections::HashSet<String> = columns.iter().cloned().collect();

    for record in records {
        for key in record.fields.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

pub fn to_csv(records: &[AgeRecord]) -> Result<Vec<u8>> {
    let columns = columns(records);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for record in records {
        let mut row = vec![
            record.participant_id.clone(),
            record.session_timestamp.clone(),
            record.age.to_string(),
            record.demographics.sex.clone(),
            record.demographics.computer_type.clone(),
            record.demographics.hearing_aids.clone(),
            record.demographics.headphones.clone(),
        ];
        row.extend(
            columns[FIXED_COLUMNS.len()..]
                .iter()
                .map(|column| record.fields.get(column).map(cell).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

/// 字串原樣輸出，null 為空白，其餘用 JSON 文字
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

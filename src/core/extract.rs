use crate::domain::model::{AwmRecord, Dataset, Participant, SkipReason, SkippedParticipant};
use serde_json::{Map, Value};

/// 把 participant → session → measurement 攤平成 AWM 紀錄。
/// 格式不對的參與者記進 skipped，不會中斷。
pub fn extract_awm_records(dataset: &Dataset) -> (Vec<AwmRecord>, Vec<SkippedParticipant>) {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (participant_id, participant) in &dataset.participants {
        let skip = |reason| SkippedParticipant {
            participant_id: participant_id.clone(),
            reason,
        };

        match participant {
            Participant::Count(count) => skipped.push(skip(SkipReason::NotMapping(count.to_string()))),
            Participant::Opaque(value) => skipped.push(skip(SkipReason::NotMapping(value.to_string()))),
            Participant::Detail(detail) => match &detail.awm {
                None => skipped.push(skip(SkipReason::NoAwmData)),
                Some(Value::Object(sessions)) => {
                    records.extend(flatten_sessions(participant_id, sessions));
                }
                Some(_) => skipped.push(skip(SkipReason::AwmNotMapping)),
            },
        }
    }

    tracing::info!("Skipped {} participants without AWM data", skipped.len());
    let first: Vec<String> = skipped.iter().take(5).map(|s| s.to_string()).collect();
    tracing::info!("First 5 skipped: {:?}", first);

    tracing::info!("Columns: {:?}", awm_columns(&records));

    (records, skipped)
}

/// AWM 表的欄位：participant_id、session_timestamp，接著量測欄位依第一次出現的順序
pub fn awm_columns(records: &[AwmRecord]) -> Vec<String> {
    let mut columns = vec!["participant_id".to_string(), "session_timestamp".to_string()];
    for record in records {
        for key in record.fields.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

pub(crate) fn flatten_sessions<'a>(
    participant_id: &'a str,
    sessions: &'a Map<String, Value>,
) -> impl Iterator<Item = AwmRecord> + 'a {
    sessions.iter().map(move |(timestamp, session)| AwmRecord {
        participant_id: participant_id.to_string(),
        session_timestamp: timestamp.clone(),
        fields: session_fields(participant_id, timestamp, session),
    })
}

/// session 不是物件時仍保留一筆紀錄（沒有量測欄位），讓 session 數一致
pub(crate) fn session_fields(participant_id: &str, timestamp: &str, session: &Value) -> Map<String, Value> {
    match session {
        Value::Object(fields) => fields.clone(),
        other => {
            tracing::warn!(
                "Session {} of {} is not a mapping ({}), keeping it without measurement fields",
                timestamp,
                participant_id,
                other
            );
            Map::new()
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core::chart::{BoxPlot, Histogram};
use crate::core::stats::{AgeStatistics, Describe};

/// 參與者的值在來源 JSON 裡不固定：可能是計數，也可能是帶 awm/misc 的物件。
/// 載入時解析一次，之後各步驟只看這個 enum。
#[derive(Debug, Clone, PartialEq)]
pub enum Participant {
    /// 只有 session 計數，沒有資料
    Count(i64),
    Detail(ParticipantDetail),
    /// 其他非物件的值（字串、小數、null、陣列）
    Opaque(Value),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantDetail {
    pub awm: Option<Value>,
    pub misc: Option<Value>,
}

impl From<Value> for Participant {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut obj) => Participant::Detail(ParticipantDetail {
                awm: obj.remove("awm"),
                misc: obj.remove("misc"),
            }),
            Value::Number(n) => match n.as_i64() {
                Some(count) => Participant::Count(count),
                None => Participant::Opaque(Value::Number(n)),
            },
            other => Participant::Opaque(other),
        }
    }
}

/// 依來源文件順序排列的參與者
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub participants: Vec<(String, Participant)>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant_ids(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|(id, _)| id.as_str())
    }
}

impl From<Map<String, Value>> for Dataset {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            participants: map
                .into_iter()
                .map(|(id, value)| (id, Participant::from(value)))
                .collect(),
        }
    }
}

/// 一筆攤平後的 AWM session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwmRecord {
    pub participant_id: String,
    pub session_timestamp: String,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoAwmData,
    AwmNotMapping,
    /// 值不是物件，保留原值的文字方便追查
    NotMapping(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedParticipant {
    pub participant_id: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedParticipant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::NoAwmData => write!(f, "{} (no awm data)", self.participant_id),
            SkipReason::AwmNotMapping => write!(f, "{} (awm is not a mapping)", self.participant_id),
            SkipReason::NotMapping(value) => write!(f, "{} (sessions: {})", self.participant_id, value),
        }
    }
}

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub sex: String,
    pub computer_type: String,
    pub hearing_aids: String,
    pub headphones: String,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            sex: UNKNOWN.to_string(),
            computer_type: UNKNOWN.to_string(),
            hearing_aids: UNKNOWN.to_string(),
            headphones: UNKNOWN.to_string(),
        }
    }
}

/// 帶年齡與人口統計的 AWM session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRecord {
    pub participant_id: String,
    pub session_timestamp: String,
    pub age: i64,
    pub demographics: Demographics,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub dataset: Dataset,
    pub awm_records: Vec<AwmRecord>,
    pub skipped: Vec<SkippedParticipant>,
}

#[derive(Debug, Clone)]
pub struct AgeReport {
    pub statistics: AgeStatistics,
    pub participant_summary: Describe,
    pub histogram: Histogram,
    pub box_plot: BoxPlot,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub agm_records: Vec<AwmRecord>,
    pub joined_records: Vec<AgeRecord>,
    /// 沒有任何年齡資料時為 None，此時不匯出
    pub report: Option<AgeReport>,
}

/// 一次執行的結果摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub participants: usize,
    pub awm_records: usize,
    pub skipped: usize,
    pub agm_records: usize,
    pub joined_records: usize,
    pub output_path: Option<String>,
}

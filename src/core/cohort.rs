use crate::domain::model::AwmRecord;
use crate::utils::error::Result;
use regex::Regex;

/// AGM 加上 4 到 6 位數字，前後錨定
pub const DEFAULT_COHORT_PATTERN: &str = r"^AGM\d{4,6}$";

#[derive(Debug, Clone)]
pub struct CohortFilter {
    pattern: Regex,
}

impl CohortFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, participant_id: &str) -> bool {
        self.pattern.is_match(participant_id)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// 不符合的紀錄直接丟掉
    pub fn filter(&self, records: &[AwmRecord]) -> Vec<AwmRecord> {
        records
            .iter()
            .filter(|record| self.matches(&record.participant_id))
            .cloned()
            .collect()
    }
}

impl Default for CohortFilter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_COHORT_PATTERN).expect("default cohort pattern is valid"),
        }
    }
}

/// 依第一次出現的順序列出不重複的 participant id
pub fn unique_participant_ids<'a, I>(ids: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

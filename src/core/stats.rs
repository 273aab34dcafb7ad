use crate::domain::model::AgeRecord;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// 樣本標準差 (n - 1)，少於兩筆時沒有值
    pub std_dev: Option<f64>,
    pub min: i64,
    pub max: i64,
}

impl AgeStatistics {
    /// 每筆 joined 紀錄算一次，多 session 的參與者會被重複計入
    pub fn from_records(records: &[AgeRecord]) -> Option<Self> {
        let ages: Vec<i64> = records.iter().map(|r| r.age).collect();
        Self::from_ages(&ages)
    }

    pub fn from_ages(ages: &[i64]) -> Option<Self> {
        let min = *ages.iter().min()?;
        let max = *ages.iter().max()?;
        let values: Vec<f64> = ages.iter().map(|&a| a as f64).collect();

        Some(Self {
            count: ages.len(),
            mean: mean(&values)?,
            median: quantile(&sorted(&values), 0.5)?,
            std_dev: sample_std_dev(&values),
            min,
            max,
        })
    }

    /// 用 i128 計算，極端的年齡值不會溢位
    pub fn range(&self) -> i128 {
        i128::from(self.max) - i128::from(self.min)
    }
}

/// pandas `describe()` 風格的摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        Some(Self {
            count: values.len(),
            mean: mean(values)?,
            std: sample_std_dev(values),
            min: *sorted.first()?,
            q25: quantile(&sorted, 0.25)?,
            q50: quantile(&sorted, 0.5)?,
            q75: quantile(&sorted, 0.75)?,
            max: *sorted.last()?,
        })
    }

    /// 每位參與者只取第一筆年齡
    pub fn per_participant(records: &[AgeRecord]) -> Option<Self> {
        Self::from_values(&first_age_per_participant(records))
    }
}

impl fmt::Display for Describe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let std = self
            .std
            .map(|s| format!("{:.6}", s))
            .unwrap_or_else(|| "NaN".to_string());
        writeln!(f, "count    {:.6}", self.count as f64)?;
        writeln!(f, "mean     {:.6}", self.mean)?;
        writeln!(f, "std      {}", std)?;
        writeln!(f, "min      {:.6}", self.min)?;
        writeln!(f, "25%      {:.6}", self.q25)?;
        writeln!(f, "50%      {:.6}", self.q50)?;
        writeln!(f, "75%      {:.6}", self.q75)?;
        write!(f, "max      {:.6}", self.max)
    }
}

pub fn first_age_per_participant(records: &[AgeRecord]) -> Vec<f64> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.participant_id.as_str()))
        .map(|r| r.age as f64)
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// 線性內插的分位數，輸入需已排序
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Demographics;
    use serde_json::Map;

    fn record(id: &str, age: i64) -> AgeRecord {
        AgeRecord {
            participant_id: id.to_string(),
            session_timestamp: "t".to_string(),
            age,
            demographics: Demographics::default(),
            fields: Map::new(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_age_statistics() {
        let stats = AgeStatistics::from_ages(&[20, 30, 40, 50]).unwrap();
        assert_eq!(stats.count, 4);
        assert!(approx(stats.mean, 35.0));
        assert!(approx(stats.median, 35.0));
        assert!(approx(stats.std_dev.unwrap(), 12.909944487358056));
        assert_eq!(stats.min, 20);
        assert_eq!(stats.max, 50);
        assert_eq!(stats.range(), 30);
    }

    #[test]
    fn test_single_value_has_no_std_dev() {
        let stats = AgeStatistics::from_ages(&[42]).unwrap();
        assert!(approx(stats.median, 42.0));
        assert!(stats.std_dev.is_none());
        assert!(AgeStatistics::from_ages(&[]).is_none());
    }

    #[test]
    fn test_range_of_extreme_ages() {
        let records = vec![record("AGM0001", i64::MIN), record("AGM0002", i64::MAX)];
        let stats = AgeStatistics::from_records(&records).unwrap();
        assert_eq!(stats.range(), i128::from(u64::MAX));
        assert_eq!(stats.min, i64::MIN);
        assert_eq!(stats.max, i64::MAX);
    }

    #[test]
    fn test_sessions_are_weighted() {
        let records = vec![record("AGM0001", 20), record("AGM0001", 20), record("AGM0002", 50)];
        let stats = AgeStatistics::from_records(&records).unwrap();
        assert_eq!(stats.count, 3);
        assert!(approx(stats.mean, 30.0));
        assert!(approx(stats.median, 20.0));
    }

    #[test]
    fn test_describe_uses_first_age_per_participant() {
        let records = vec![
            record("AGM0001", 20),
            record("AGM0001", 20),
            record("AGM0002", 30),
            record("AGM0003", 40),
            record("AGM0004", 70),
        ];
        let summary = Describe::per_participant(&records).unwrap();
        assert_eq!(summary.count, 4);
        assert!(approx(summary.mean, 40.0));
        assert!(approx(summary.min, 20.0));
        assert!(approx(summary.q25, 27.5));
        assert!(approx(summary.q50, 35.0));
        assert!(approx(summary.q75, 47.5));
        assert!(approx(summary.max, 70.0));
        assert!(summary.to_string().starts_with("count    4.000000"));
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = sorted(&[5.0, 1.0, 3.0]);
        assert!(approx(quantile(&values, 0.25).unwrap(), 2.0));
        assert!(approx(quantile(&values, 1.0).unwrap(), 5.0));
        assert!(quantile(&[], 0.5).is_none());
    }
}

use crate::core::cohort::CohortFilter;
use crate::core::extract::session_fields;
use crate::domain::model::{AgeRecord, Dataset, Demographics, Participant, UNKNOWN};
use serde_json::{Map, Value};

/// 匯出表固定的欄位；量測欄位同名時以固定欄位為準
pub const FIXED_COLUMNS: [&str; 7] = [
    "participant_id",
    "session_timestamp",
    "age",
    "sex",
    "computer_type",
    "hearing_aids",
    "headphones",
];

/// 把 misc 的年齡與人口統計接到每個 AWM session。
/// 依文件順序第一個有年齡的 misc 項目勝出，之後的項目不再查看。
pub fn join_ages(dataset: &Dataset, cohort: &CohortFilter) -> Vec<AgeRecord> {
    let mut joined = Vec::new();

    for (participant_id, participant) in &dataset.participants {
        if !cohort.matches(participant_id) {
            continue;
        }
        let Participant::Detail(detail) = participant else {
            continue;
        };
        let Some(Value::Object(misc)) = &detail.misc else {
            continue;
        };
        let Some((age, demographics)) = first_demographics(misc) else {
            tracing::debug!("No usable age for {}", participant_id);
            continue;
        };
        let Some(Value::Object(sessions)) = &detail.awm else {
            continue;
        };

        for (timestamp, session) in sessions {
            joined.push(AgeRecord {
                participant_id: participant_id.clone(),
                session_timestamp: timestamp.clone(),
                age,
                demographics: demographics.clone(),
                fields: measurement_fields(participant_id, timestamp, session),
            });
        }
    }

    tracing::info!("Found {} AGM records with age data", joined.len());
    joined
}

/// 找第一個能轉成整數年齡的 misc 項目，並從同一項目讀出其他人口統計欄位
pub fn first_demographics(misc: &Map<String, Value>) -> Option<(i64, Demographics)> {
    misc.values()
        .filter_map(Value::as_object)
        .find_map(|entry| {
            let age = parse_age(entry.get("age")?)?;
            Some((
                age,
                Demographics {
                    sex: demographic_field(entry, "sex"),
                    computer_type: demographic_field(entry, "comp"),
                    hearing_aids: demographic_field(entry, "haids"),
                    headphones: demographic_field(entry, "headphones"),
                },
            ))
        })
}

/// 整數直接用；浮點數無條件捨去小數；字串去空白後解析成整數。其餘視為沒有年齡。
pub fn parse_age(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .map(f64::trunc)
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

// 缺欄位才補 unknown；明確的 null 匯出成空白儲存格
fn demographic_field(entry: &Map<String, Value>, key: &str) -> String {
    match entry.get(key) {
        None => UNKNOWN.to_string(),
        Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn measurement_fields(participant_id: &str, timestamp: &str, session: &Value) -> Map<String, Value> {
    let mut fields = session_fields(participant_id, timestamp, session);
    fields.retain(|key, _| {
        let reserved = FIXED_COLUMNS.contains(&key.as_str());
        if reserved {
            tracing::debug!(
                "Dropping measurement field '{}' of {} {}: it collides with a fixed column",
                key,
                participant_id,
                timestamp
            );
        }
        !reserved
    });
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(value: Value) -> Dataset {
        match value {
            Value::Object(map) => Dataset::from(map),
            _ => panic!("test dataset must be an object"),
        }
    }

    #[test]
    fn test_unparsable_age_is_skipped_for_next_entry() {
        let data = dataset(json!({
            "AGM10234": {
                "misc": {"t1": {"age": "foo"}, "t2": {"age": "45", "sex": "f"}},
                "awm": {"s1": {"score": 1}, "s2": {"score": 2}}
            }
        }));

        let joined = join_ages(&data, &CohortFilter::default());

        assert_eq!(joined.len(), 2);
        for record in &joined {
            assert_eq!(record.age, 45);
            assert_eq!(record.demographics.sex, "f");
            assert_eq!(record.demographics.computer_type, "unknown");
        }
        assert_eq!(joined[0].session_timestamp, "s1");
        assert_eq!(joined[1].fields.get("score"), Some(&json!(2)));
    }

    #[test]
    fn test_fractional_age_is_truncated_and_wins() {
        let data = dataset(json!({
            "AGM3000": {
                "misc": {
                    "t1": {"age": 45.7, "sex": "f"},
                    "t2": {"age": 50, "sex": "m"}
                },
                "awm": {"s1": {"score": 1}}
            }
        }));

        let joined = join_ages(&data, &CohortFilter::default());

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].age, 45);
        assert_eq!(joined[0].demographics.sex, "f");
    }

    #[test]
    fn test_first_usable_entry_wins() {
        let data = dataset(json!({
            "AGM2000": {
                "misc": {
                    "t1": {"sex": "m"},
                    "t2": {"age": 30, "sex": "f", "comp": "laptop", "haids": "no", "headphones": "yes"},
                    "t3": {"age": 31, "sex": "m"}
                },
                "awm": {"s1": {}}
            }
        }));

        let joined = join_ages(&data, &CohortFilter::default());

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].age, 30);
        assert_eq!(
            joined[0].demographics,
            Demographics {
                sex: "f".to_string(),
                computer_type: "laptop".to_string(),
                hearing_aids: "no".to_string(),
                headphones: "yes".to_string(),
            }
        );
    }

    #[test]
    fn test_participants_outside_cohort_never_join() {
        let data = dataset(json!({
            "AGM12": {"misc": {"t": {"age": 20}}, "awm": {"s": {}}},
            "PIL1234": {"misc": {"t": {"age": 20}}, "awm": {"s": {}}},
            "AGM1234": {"misc": {"t": {"age": 20}}, "awm": {"s": {}}}
        }));

        let joined = join_ages(&data, &CohortFilter::default());

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].participant_id, "AGM1234");
    }

    #[test]
    fn test_no_age_or_no_awm_contributes_nothing() {
        let data = dataset(json!({
            "AGM0001": {"misc": {"t": {"age": "n/a"}}, "awm": {"s": {}}},
            "AGM0002": {"misc": {"t": {"age": 50}}},
            "AGM0003": {"awm": {"s": {}}},
            "AGM0004": {"misc": "broken", "awm": {"s": {}}},
            "AGM0005": 3
        }));

        assert!(join_ages(&data, &CohortFilter::default()).is_empty());
    }

    #[test]
    fn test_joined_count_is_sum_of_sessions() {
        let data = dataset(json!({
            "AGM0001": {"misc": {"t": {"age": 20}}, "awm": {"a": {}, "b": {}, "c": {}}},
            "AGM0002": {"misc": {"t": {"age": 40}}, "awm": {"a": {}}},
            "AGM0003": {"misc": {"t": {}}, "awm": {"a": {}, "b": {}}}
        }));

        let joined = join_ages(&data, &CohortFilter::default());

        assert_eq!(joined.len(), 4);
    }

    #[test]
    fn test_parse_age_conversions() {
        assert_eq!(parse_age(&json!(45)), Some(45));
        assert_eq!(parse_age(&json!(" 45 ")), Some(45));
        assert_eq!(parse_age(&json!("+7")), Some(7));
        assert_eq!(parse_age(&json!(45.0)), Some(45));
        assert_eq!(parse_age(&json!(45.7)), Some(45));
        assert_eq!(parse_age(&json!(-3.9)), Some(-3));
        assert_eq!(parse_age(&json!(1e300)), None);
        assert_eq!(parse_age(&json!("45.0")), None);
        assert_eq!(parse_age(&json!("foo")), None);
        assert_eq!(parse_age(&json!(true)), None);
        assert_eq!(parse_age(&Value::Null), None);
    }

    #[test]
    fn test_demographics_default_and_non_string_values() {
        let entry = json!({"age": 22, "sex": null, "comp": 2, "haids": false});
        let (age, demographics) = first_demographics(entry_map(&json!({"t": entry}))).unwrap();
        assert_eq!(age, 22);
        assert_eq!(demographics.sex, "");
        assert_eq!(demographics.computer_type, "2");
        assert_eq!(demographics.hearing_aids, "false");
        assert_eq!(demographics.headphones, "unknown");
    }

    #[test]
    fn test_fixed_columns_win_over_measurement_fields() {
        let data = dataset(json!({
            "AGM1234": {
                "misc": {"t": {"age": 33}},
                "awm": {"s": {"age": 99, "score": 4}}
            }
        }));

        let joined = join_ages(&data, &CohortFilter::default());

        assert_eq!(joined[0].age, 33);
        assert!(joined[0].fields.get("age").is_none());
        assert_eq!(joined[0].fields.get("score"), Some(&json!(4)));
    }

    fn entry_map(value: &Value) -> &Map<String, Value> {
        value.as_object().unwrap()
    }
}

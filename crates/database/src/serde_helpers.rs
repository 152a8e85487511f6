use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// 可选的 chrono 时间与 BSON DateTime 之间的转换
///
/// `bson::serde_helpers::chrono_datetime_as_bson_datetime` only handles the
/// required case. Use together with `#[serde(default)]`.
pub mod optional_chrono_datetime_as_bson_datetime {
    use bson::DateTime as BsonDateTime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => BsonDateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<BsonDateTime>::deserialize(deserializer)?;
        Ok(value.map(|dt| dt.to_chrono()))
    }
}

/// Parse a client supplied date. Accepts RFC 3339, `YYYY-MM-DD` and a few
/// naive date-time layouts, all read as UTC.
pub fn parse_flexible_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 反序列化可选日期字段(宽松格式)，无法解析时报错
pub fn deserialize_optional_flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_flexible_datetime(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Unable to parse date: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Stamped {
        #[serde(default, with = "optional_chrono_datetime_as_bson_datetime")]
        at: Option<DateTime<Utc>>,
    }

    #[derive(Deserialize)]
    struct Draft {
        #[serde(default, deserialize_with = "deserialize_optional_flexible_datetime")]
        end: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_optional_datetime_bson_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let doc = bson::to_document(&Stamped { at: Some(at) }).unwrap();
        assert!(matches!(doc.get("at"), Some(bson::Bson::DateTime(_))));

        let back: Stamped = bson::from_document(doc).unwrap();
        assert_eq!(back.at, Some(at));
    }

    #[test]
    fn test_optional_datetime_missing_field() {
        let back: Stamped = bson::from_document(bson::doc! {}).unwrap();
        assert_eq!(back.at, None);

        let back: Stamped = bson::from_document(bson::doc! { "at": bson::Bson::Null }).unwrap();
        assert_eq!(back.at, None);
    }

    #[test]
    fn test_parse_flexible_datetime() {
        let d = parse_flexible_datetime("2025-03-09").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2025, 3, 9, 0));

        let d = parse_flexible_datetime("2025-03-09T10:15:00Z").unwrap();
        assert_eq!(d.hour(), 10);

        let d = parse_flexible_datetime("2025-03-09 10:15:00").unwrap();
        assert_eq!(d.minute(), 15);

        assert!(parse_flexible_datetime("next tuesday").is_none());
    }

    #[test]
    fn test_deserialize_flexible_datetime() {
        let draft: Draft = serde_json::from_str(r#"{"end":"2025-12-31"}"#).unwrap();
        assert!(draft.end.is_some());

        let draft: Draft = serde_json::from_str(r#"{}"#).unwrap();
        assert!(draft.end.is_none());

        assert!(serde_json::from_str::<Draft>(r#"{"end":"soon"}"#).is_err());
    }
}

use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value};
use serde_json::{Number, Value as JsonValue};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn float(value: f64) -> JsonValue {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn wide_int(value: i128) -> JsonValue {
    i64::try_from(value)
        .map(JsonValue::from)
        .unwrap_or_else(|_| JsonValue::String(value.to_string()))
}

/// Converts one DuckDB cell into the JSON value sent to the client.
pub fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::from(i),
        Value::SmallInt(i) => JsonValue::from(i),
        Value::Int(i) => JsonValue::from(i),
        Value::BigInt(i) => JsonValue::from(i),
        Value::HugeInt(i) => wide_int(i),
        Value::UTinyInt(u) => JsonValue::from(u),
        Value::USmallInt(u) => JsonValue::from(u),
        Value::UInt(u) => JsonValue::from(u),
        Value::UBigInt(u) => JsonValue::from(u),
        Value::Float(f) => float(f64::from(f)),
        Value::Double(f) => float(f),
        Value::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::String(text))
        }
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s),
        Value::Timestamp(unit, raw) => DateTime::from_timestamp_micros(to_micros(unit, raw))
            .map(|ts| {
                JsonValue::String(ts.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            })
            .unwrap_or(JsonValue::Null),
        Value::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|date| JsonValue::String(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(JsonValue::Null),
        Value::Time64(unit, raw) => {
            let micros = to_micros(unit, raw);
            let secs = u32::try_from(micros.div_euclid(1_000_000)).ok();
            let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok();
            secs.zip(nanos)
                .and_then(|(s, n)| NaiveTime::from_num_seconds_from_midnight_opt(s, n))
                .map(|time| JsonValue::String(time.format("%H:%M:%S%.f").to_string()))
                .unwrap_or(JsonValue::Null)
        }
        Value::List(items) => JsonValue::Array(items.into_iter().map(to_json).collect()),
        other => JsonValue::String(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_map_to_native_json() {
        assert_eq!(to_json(Value::Null), JsonValue::Null);
        assert_eq!(to_json(Value::Int(7)), json!(7));
        assert_eq!(to_json(Value::Boolean(true)), json!(true));
        assert_eq!(to_json(Value::Text("Laptop".into())), json!("Laptop"));
        assert_eq!(to_json(Value::Double(f64::NAN)), JsonValue::Null);
    }

    #[test]
    fn huge_ints_fall_back_to_strings_when_out_of_range() {
        assert_eq!(to_json(Value::HugeInt(42)), json!(42));
        assert_eq!(
            to_json(Value::HugeInt(i128::MAX)),
            json!(i128::MAX.to_string())
        );
    }

    #[test]
    fn timestamps_render_as_iso_8601() {
        // 2024-01-02T03:04:05 UTC
        let micros = 1_704_164_645_000_000;
        assert_eq!(
            to_json(Value::Timestamp(TimeUnit::Microsecond, micros)),
            json!("2024-01-02T03:04:05")
        );
    }

    #[test]
    fn dates_count_days_from_unix_epoch() {
        assert_eq!(to_json(Value::Date32(0)), json!("1970-01-01"));
        assert_eq!(to_json(Value::Date32(19_724)), json!("2024-01-02"));
    }

    #[test]
    fn lists_convert_elementwise() {
        let list = Value::List(vec![Value::Int(1), Value::Null]);
        assert_eq!(to_json(list), json!([1, null]));
    }
}

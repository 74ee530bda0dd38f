use serde_json::Value;

/// Positive integer id from a path or query string
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Positive integer id from JSON: a number or a numeric string
pub fn id_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().filter(|id| *id > 0),
        Value::String(s) => parse_id(s),
        _ => None,
    }
}

/// JSON null, a missing key and a blank string all mean "not provided"
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_positive_ids_only() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
    }

    #[test]
    fn reads_ids_from_json_numbers_and_strings() {
        assert_eq!(id_from_json(&json!(3)), Some(3));
        assert_eq!(id_from_json(&json!("12")), Some(12));
        assert_eq!(id_from_json(&json!(2.5)), None);
        assert_eq!(id_from_json(&json!(true)), None);
    }

    #[test]
    fn blank_covers_null_missing_and_whitespace() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!(null))));
        assert!(is_blank(Some(&json!("  "))));
        assert!(!is_blank(Some(&json!(0))));
    }
}

//! Scalar and date coercion over untrusted JSON.
//!
//! Pure functions, no allocation beyond the returned values. Nothing here
//! fails: a value of the wrong shape becomes the field default.

use serde_json::{Map, Value};

use crate::schema::{not_found, DateValue};

/// Shape of a raw date value as emitted by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RawDate<'a> {
    /// Object carrying both `text` and `iso` members (of any type).
    Pair { text: &'a Value, iso: &'a Value },
    /// Bare non-blank string.
    Text(&'a str),
    Missing,
}

impl<'a> RawDate<'a> {
    fn parse(value: &'a Value) -> Self {
        match value {
            Value::Object(obj) => match (obj.get("text"), obj.get("iso")) {
                (Some(text), Some(iso)) => RawDate::Pair { text, iso },
                _ => RawDate::Missing,
            },
            Value::String(s) if !s.trim().is_empty() => RawDate::Text(s),
            _ => RawDate::Missing,
        }
    }
}

/// Coerce any JSON value into a [`DateValue`].
///
/// Bare strings are kept as display text and never parsed into ISO form.
pub fn normalize_date(value: &Value) -> DateValue {
    match RawDate::parse(value) {
        RawDate::Pair { text, iso } => DateValue {
            text: text.as_str().map(str::to_owned).unwrap_or_else(not_found),
            iso: iso.as_str().map(str::to_owned),
        },
        RawDate::Text(text) => DateValue {
            text: text.to_string(),
            iso: None,
        },
        RawDate::Missing => DateValue::default(),
    }
}

/// The string unchanged if it has non-whitespace content.
pub fn non_blank(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// String-or-sentinel coercion.
pub fn coerce_str(value: &Value) -> String {
    non_blank(value).map(str::to_owned).unwrap_or_else(not_found)
}

/// Numbers pass through; anything else (including numeric strings) is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

pub fn coerce_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Arrays pass through untouched, elements unchecked.
pub fn coerce_list(value: &Value) -> Option<Vec<Value>> {
    value.as_array().cloned()
}

/// Borrowed view over an optional raw JSON object.
///
/// Anything that is not an object (null, arrays, primitives) reads as absent,
/// so every accessor falls back to its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    pub fn of(value: Option<&'a Value>) -> Self {
        Self {
            map: value.and_then(Value::as_object),
        }
    }

    pub fn is_present(&self) -> bool {
        self.map.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key))
    }

    /// Nested object view.
    pub fn object(&self, key: &str) -> Fields<'a> {
        Fields::of(self.get(key))
    }

    /// Non-blank string at `key`.
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(non_blank)
    }

    /// First non-blank string among `keys`, canonical name first.
    pub fn first_str(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|key| self.str(key))
    }

    pub fn text(&self, key: &str) -> String {
        self.text_or(key, not_found())
    }

    pub fn text_or(&self, key: &str, default: String) -> String {
        self.str(key).map(str::to_owned).unwrap_or(default)
    }

    pub fn first_text_or(&self, keys: &[&str], default: String) -> String {
        self.first_str(keys).map(str::to_owned).unwrap_or(default)
    }

    pub fn date(&self, key: &str) -> DateValue {
        self.get(key).map(normalize_date).unwrap_or_default()
    }

    /// First key whose value normalizes to something other than the default date.
    pub fn first_date(&self, keys: &[&str]) -> DateValue {
        let fallback = DateValue::default();
        keys.iter()
            .map(|key| self.date(key))
            .find(|date| *date != fallback)
            .unwrap_or(fallback)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(coerce_number)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(coerce_bool)
    }

    pub fn list_or(&self, key: &str, default: Vec<Value>) -> Vec<Value> {
        self.get(key).and_then(coerce_list).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NOT_FOUND;
    use serde_json::json;

    #[test]
    fn test_date_from_bare_string() {
        let date = normalize_date(&json!("15 martie 2024"));
        assert_eq!(date.text, "15 martie 2024");
        assert_eq!(date.iso, None);
    }

    #[test]
    fn test_date_pair_unchanged() {
        let date = normalize_date(&json!({ "text": "15.03.2024", "iso": "2024-03-15" }));
        assert_eq!(date.text, "15.03.2024");
        assert_eq!(date.iso.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn test_date_missing() {
        assert_eq!(normalize_date(&Value::Null), DateValue::default());
        assert_eq!(normalize_date(&json!("   ")), DateValue::default());
        assert_eq!(normalize_date(&json!(20240315)), DateValue::default());
    }

    #[test]
    fn test_date_pair_with_wrong_member_types() {
        let date = normalize_date(&json!({ "text": 12, "iso": false }));
        assert_eq!(date.text, NOT_FOUND);
        assert_eq!(date.iso, None);
    }

    #[test]
    fn test_date_object_without_both_members_is_missing() {
        let date = normalize_date(&json!({ "text": "15.03.2024" }));
        assert_eq!(date, DateValue::default());
    }

    #[test]
    fn test_str_keeps_value_verbatim() {
        assert_eq!(coerce_str(&json!("  Tribunalul Cluj ")), "  Tribunalul Cluj ");
        assert_eq!(coerce_str(&json!("")), NOT_FOUND);
        assert_eq!(coerce_str(&json!(42)), NOT_FOUND);
    }

    #[test]
    fn test_no_cross_type_coercion() {
        assert_eq!(coerce_number(&json!("45255")), None);
        assert_eq!(coerce_number(&json!(45255)), Some(45255.0));
        assert_eq!(coerce_bool(&json!("true")), None);
        assert_eq!(coerce_bool(&json!(false)), Some(false));
        assert_eq!(coerce_list(&json!({ "0": "a" })), None);
    }

    #[test]
    fn test_fields_over_non_object() {
        let raw = json!(["not", "an", "object"]);
        let fields = Fields::of(Some(&raw));
        assert!(!fields.is_present());
        assert_eq!(fields.text("name"), NOT_FOUND);
        assert_eq!(fields.number("x"), None);
    }

    #[test]
    fn test_first_str_skips_blank_canonical() {
        let raw = json!({ "docType": " ", "type": "report_art_97" });
        let fields = Fields::of(Some(&raw));
        assert_eq!(fields.first_str(&["docType", "type"]), Some("report_art_97"));
    }

    #[test]
    fn test_first_date_prefers_canonical() {
        let raw = json!({ "meetingDate": "1 mai", "date": "2 mai" });
        let fields = Fields::of(Some(&raw));
        assert_eq!(fields.first_date(&["meetingDate", "date"]).text, "1 mai");

        let raw = json!({ "meetingDate": null, "date": "2 mai" });
        let fields = Fields::of(Some(&raw));
        assert_eq!(fields.first_date(&["meetingDate", "date"]).text, "2 mai");
    }
}

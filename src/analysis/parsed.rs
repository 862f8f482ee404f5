use serde::Serialize;
use serde_json::{Map, Value};

/// Rendered for absent or null leaves.
pub const ABSENT: &str = "N/A";

/// Parsed oracle output: a JSON object whose shape is advisory only.
///
/// All reads go through [`Field`], which never fails on a missing key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParsedAnalysis {
    root: Map<String, Value>,
}

impl ParsedAnalysis {
    pub fn new(root: Map<String, Value>) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self::new(Map::new())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Top-level field by key.
    pub fn field(&self, key: &str) -> Field<'_> {
        Field(self.root.get(key))
    }

    /// Mapping entries of `medicines`, in original order.
    pub fn medicines(&self) -> Vec<Field<'_>> {
        self.field("medicines")
            .items()
            .filter(|m| m.is_object())
            .collect()
    }
}

/// Borrowed view of a possibly-missing value with default-returning accessors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field<'a>(Option<&'a Value>);

impl<'a> Field<'a> {
    pub fn new(value: Option<&'a Value>) -> Self {
        Self(value)
    }

    /// Key lookup; absent when this is not an object.
    pub fn get(&self, key: &str) -> Field<'a> {
        Field(self.0.and_then(|v| v.get(key)))
    }

    /// The key was present, even if its value is null.
    pub fn exists(&self) -> bool {
        self.0.is_some()
    }

    /// Present and not null.
    pub fn is_present(&self) -> bool {
        matches!(self.0, Some(v) if !v.is_null())
    }

    pub fn is_object(&self) -> bool {
        matches!(self.0, Some(Value::Object(_)))
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.0.and_then(Value::as_str)
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.0
    }

    /// Elements of a sequence; empty for anything else.
    pub fn items(&self) -> impl Iterator<Item = Field<'a>> {
        self.0
            .and_then(Value::as_array)
            .map(|a| a.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|v| Field(Some(v)))
    }

    /// Number of sequence elements (0 when not a sequence).
    pub fn len(&self) -> usize {
        self.0.and_then(Value::as_array).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text form used by the report; never fails.
    pub fn display(&self) -> String {
        match self.0 {
            None | Some(Value::Null) => ABSENT.to_string(),
            Some(v) => display_value(v),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => ABSENT.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(value: Value) -> ParsedAnalysis {
        match value {
            Value::Object(map) => ParsedAnalysis::new(map),
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn missing_key_displays_absent() {
        let p = ParsedAnalysis::empty();
        assert!(!p.field("patient_name").exists());
        assert_eq!(p.field("patient_name").display(), "N/A");
    }

    #[test]
    fn null_exists_but_is_not_present() {
        let p = parsed(json!({"warnings": null}));
        assert!(p.field("warnings").exists());
        assert!(!p.field("warnings").is_present());
        assert_eq!(p.field("warnings").display(), "N/A");
    }

    #[test]
    fn scalars_display_naturally() {
        let p = parsed(json!({"s": "text", "n": 30, "f": 12.5, "b": false}));
        assert_eq!(p.field("s").display(), "text");
        assert_eq!(p.field("n").display(), "30");
        assert_eq!(p.field("f").display(), "12.5");
        assert_eq!(p.field("b").display(), "false");
    }

    #[test]
    fn sequences_join_and_objects_stay_json() {
        let p = parsed(json!({"w": ["Drowsiness", "Nausea"], "o": {"k": 1}}));
        assert_eq!(p.field("w").display(), "Drowsiness, Nausea");
        assert_eq!(p.field("o").display(), "{\"k\":1}");
    }

    #[test]
    fn nested_lookup_through_wrong_type_is_absent() {
        let p = parsed(json!({"dietary_recommendations": "none"}));
        let eat = p.field("dietary_recommendations").get("foods_to_eat");
        assert!(!eat.exists());
        assert_eq!(eat.items().count(), 0);
    }

    #[test]
    fn medicines_skips_non_objects() {
        let p = parsed(json!({"medicines": [{"name": "A"}, "junk", 3, {"name": "B"}]}));
        let meds = p.medicines();
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[0].get("name").as_str(), Some("A"));
        assert_eq!(meds[1].get("name").as_str(), Some("B"));
    }

    #[test]
    fn medicines_absent_or_wrong_type_is_empty() {
        assert!(ParsedAnalysis::empty().medicines().is_empty());
        assert!(parsed(json!({"medicines": "none"})).medicines().is_empty());
    }

    #[test]
    fn serializes_as_plain_object() {
        let p = parsed(json!({"manufacturer": "Acme"}));
        assert_eq!(serde_json::to_value(&p).unwrap(), json!({"manufacturer": "Acme"}));
    }
}

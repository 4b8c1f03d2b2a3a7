//! Read-only view over an item record returned by `op item get`
//!
//! Every top-level key is readable by name. Each labeled entry of the
//! `fields` array additionally gets a derived accessor name (see
//! [`crate::naming`]): `"Security Question"` is readable as
//! `security_question`. Top-level keys win over field labels; a field whose
//! name is taken is reachable as `field_<name>`, then `field_<name>_2`, ...
//!
//! Reads go through the same resolution for [`Item::get`] and
//! [`Item::property`] and are cached per name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{OpError, Result};
use crate::naming::NameAllocator;
use crate::value::{cast, ItemValue};

/// A JSON object with string keys
pub type Record = Map<String, Value>;

pub struct Item {
    raw: Arc<Record>,
    data: Record,
    /// Accessor name -> index into `data["fields"]`
    field_index: HashMap<String, usize>,
    /// Accessor names in field order
    accessors: Vec<String>,
    memo: RwLock<HashMap<String, Arc<ItemValue>>>,
}

impl Item {
    /// Wrap a record. The record is shared, never modified; the item reads
    /// from its own deep copy.
    pub fn new(raw: impl Into<Arc<Record>>) -> Self {
        let raw = raw.into();
        let data = copy_record(&raw);
        let (field_index, accessors) = index_fields(&data);

        Self {
            raw,
            data,
            field_index,
            accessors,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Build an item from any serializable map. Non-string keys are
    /// stringified (`1` becomes `"1"`).
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| OpError::invalid_response("item", e))?;
        Self::from_value(value)
    }

    /// Build an item from a decoded JSON document, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(record) => Ok(Self::new(record)),
            other => Err(OpError::invalid_response(
                "item",
                format!("expected a JSON object, got {}", kind(&other)),
            )),
        }
    }

    /// The record this item was built from
    pub fn raw(&self) -> &Arc<Record> {
        &self.raw
    }

    /// Keyed lookup; `None` when the name is neither a field nor a key
    pub fn get(&self, name: impl AsRef<str>) -> Option<Arc<ItemValue>> {
        let name = name.as_ref();

        if let Some(cached) = self.memo.read().get(name) {
            return Some(Arc::clone(cached));
        }

        let resolved = Arc::new(cast(name, self.lookup(name)?));
        let mut memo = self.memo.write();
        let entry = memo.entry(name.to_string()).or_insert(resolved);
        Some(Arc::clone(entry))
    }

    /// Property-style lookup; unknown names are an error
    pub fn property(&self, name: impl AsRef<str>) -> Result<Arc<ItemValue>> {
        let name = name.as_ref();
        self.get(name).ok_or_else(|| OpError::no_such_property(name))
    }

    /// Whether `name` resolves to a field accessor or a top-level key
    pub fn has_property(&self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        self.field_index.contains_key(name) || self.data.contains_key(name)
    }

    /// Derived field accessor names, in field order
    pub fn accessor_names(&self) -> &[String] {
        &self.accessors
    }

    /// The labeled field object behind an accessor name
    pub fn field(&self, name: &str) -> Option<&Record> {
        let index = *self.field_index.get(name)?;
        self.data
            .get("fields")
            .and_then(Value::as_array)
            .and_then(|fields| fields.get(index))
            .and_then(Value::as_object)
    }

    /// A fresh deep copy of the record, without any casting
    pub fn to_map(&self) -> Record {
        copy_record(&self.data)
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(field) = self.field(name) {
            let value = match field.get("value") {
                Some(value) => copy_value(value),
                None => Value::Object(copy_record(field)),
            };
            return Some(value);
        }

        self.data.get(name).map(copy_value)
    }
}

impl Clone for Item {
    fn clone(&self) -> Self {
        Self {
            raw: Arc::clone(&self.raw),
            data: copy_record(&self.data),
            field_index: self.field_index.clone(),
            accessors: self.accessors.clone(),
            memo: RwLock::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for Item {
    // Values are secrets; only the shape is printed
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("accessors", &self.accessors)
            .finish()
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

fn index_fields(data: &Record) -> (HashMap<String, usize>, Vec<String>) {
    let mut index = HashMap::new();
    let mut order = Vec::new();

    let Some(fields) = data.get("fields").and_then(Value::as_array) else {
        return (index, order);
    };

    let keys: HashSet<String> = data.keys().cloned().collect();
    let mut names = NameAllocator::new(&keys);

    for (position, entry) in fields.iter().enumerate() {
        let label = entry
            .as_object()
            .and_then(|field| field.get("label"))
            .and_then(Value::as_str)
            .filter(|label| !label.is_empty());

        let Some(name) = label.and_then(|label| names.allocate(label)) else {
            continue;
        };

        tracing::trace!(accessor = %name, position, "Indexed item field");
        index.insert(name.clone(), position);
        order.push(name);
    }

    (index, order)
}

/// Structural copy of a JSON value
fn copy_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.clone()),
        Value::Array(items) => Value::Array(items.iter().map(copy_value).collect()),
        Value::Object(record) => Value::Object(copy_record(record)),
    }
}

fn copy_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), copy_value(value)))
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        Item::from_value(value).unwrap()
    }

    fn text(item: &Item, name: &str) -> String {
        item.property(name).unwrap().to_text()
    }

    #[test]
    fn test_to_map_returns_deep_copy() {
        let item = item(json!({
            "id": "abc123",
            "title": "My Login",
            "vault": {"id": "vault123"},
            "fields": [{"id": "field1", "value": "secret"}]
        }));

        let mut copy = item.to_map();
        copy.insert("title".into(), json!("Modified Title"));
        copy["vault"]["id"] = json!("modified_vault");
        copy["fields"][0]["value"] = json!("modified_secret");

        assert_eq!(item.raw()["title"], "My Login");
        assert_eq!(item.raw()["vault"]["id"], "vault123");
        assert_eq!(item.raw()["fields"][0]["value"], "secret");
        assert_eq!(*item.get("title").unwrap(), "My Login");
        assert_eq!(*item.get("vault").unwrap(), json!({"id": "vault123"}));
    }

    #[test]
    fn test_to_map_twice_is_equal_but_independent() {
        let item = item(json!({"level1": {"level2": {"level3": ["item1", "item2"]}}}));
        let mut first = item.to_map();
        let second = item.to_map();
        assert_eq!(first, second);

        first["level1"]["level2"]["level3"]
            .as_array_mut()
            .unwrap()
            .push(json!("item3"));

        assert_eq!(second["level1"]["level2"]["level3"].as_array().unwrap().len(), 2);
        assert_eq!(item.raw()["level1"]["level2"]["level3"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_raw_is_shared_with_caller() {
        let record: Arc<Record> = Arc::new(json!({"id": "abc123"}).as_object().unwrap().clone());
        let item = Item::new(Arc::clone(&record));
        assert!(Arc::ptr_eq(&record, item.raw()));
    }

    #[test]
    fn test_get_missing_is_none() {
        let item = item(json!({"id": "abc123"}));
        assert!(item.get("missing").is_none());
        assert!(!item.has_property("missing"));
    }

    #[test]
    fn test_property_missing_is_error() {
        let item = item(json!({"title": "My Login"}));
        let err = item.property("missing_key").unwrap_err();
        assert!(matches!(err, OpError::NoSuchProperty { ref name } if name == "missing_key"));
        assert_eq!(err.to_string(), "Item has no property 'missing_key'");
    }

    #[test]
    fn test_reads_are_memoized() {
        let item = item(json!({"title": "My Login", "created_at": "2023-12-01T10:30:00Z"}));
        assert!(Arc::ptr_eq(&item.property("title").unwrap(), &item.get("title").unwrap()));
        assert!(Arc::ptr_eq(
            &item.get("created_at").unwrap(),
            &item.get("created_at").unwrap()
        ));
    }

    #[test]
    fn test_field_accessors() {
        let item = item(json!({
            "title": "My Login",
            "fields": [
                {"label": "password", "value": "secret123"},
                {"label": "username", "value": "user@example.com"},
                {"label": "Security Question", "value": "What is your name?"},
                {"label": "firstName", "value": "John"}
            ]
        }));

        assert_eq!(text(&item, "password"), "secret123");
        assert_eq!(text(&item, "username"), "user@example.com");
        assert_eq!(text(&item, "security_question"), "What is your name?");
        assert_eq!(text(&item, "first_name"), "John");
        assert_eq!(
            item.accessor_names(),
            ["password", "username", "security_question", "first_name"]
        );
    }

    #[test]
    fn test_field_without_value_resolves_to_field_object() {
        let item = item(json!({"fields": [{"label": "note", "type": "STRING"}]}));
        assert_eq!(
            *item.get("note").unwrap(),
            json!({"label": "note", "type": "STRING"})
        );
    }

    #[test]
    fn test_top_level_key_wins_over_field() {
        let item = item(json!({
            "password": "top_level_password",
            "fields": [{"label": "password", "value": "field_password_value"}]
        }));

        assert_eq!(text(&item, "password"), "top_level_password");
        assert_eq!(text(&item, "field_password"), "field_password_value");
        assert!(item.has_property("field_password"));
    }

    #[test]
    fn test_duplicate_labels() {
        let item = item(json!({
            "fields": [
                {"label": "code", "value": "first_code_value"},
                {"label": "code", "value": "second_code_value"}
            ]
        }));

        assert_eq!(text(&item, "code"), "first_code_value");
        assert_eq!(text(&item, "field_code"), "second_code_value");
    }

    #[test]
    fn test_numbered_collisions() {
        let item = item(json!({
            "class": "top_level_class",
            "fields": [
                {"label": "class", "value": "first_class_field"},
                {"label": "class", "value": "second_class_field"},
                {"label": "class", "value": "third_class_field"}
            ]
        }));

        assert_eq!(text(&item, "class"), "top_level_class");
        assert_eq!(text(&item, "field_class"), "first_class_field");
        assert_eq!(text(&item, "field_class_2"), "second_class_field");
        assert_eq!(text(&item, "field_class_3"), "third_class_field");
    }

    #[test]
    fn test_reserved_names_are_prefixed() {
        let item = item(json!({
            "fields": [
                {"label": "class", "value": "some_class_value"},
                {"label": "object_id", "value": "some_id_value"},
                {"label": "raw", "value": "raw_value"}
            ]
        }));

        assert_eq!(text(&item, "field_class"), "some_class_value");
        assert_eq!(text(&item, "field_object_id"), "some_id_value");
        assert_eq!(text(&item, "field_raw"), "raw_value");
        assert!(!item.has_property("class"));
    }

    #[test]
    fn test_invalid_field_entries_are_skipped() {
        let item = item(json!({
            "fields": [
                {"label": "valid_field", "value": "valid_value"},
                {"value": "no_label"},
                "invalid_field",
                null,
                {"label": "", "value": "empty_label"},
                {"label": 42, "value": "numeric_label"}
            ]
        }));

        assert_eq!(text(&item, "valid_field"), "valid_value");
        assert_eq!(item.accessor_names(), ["valid_field"]);
        assert!(!item.has_property("no_label"));
        assert!(!item.has_property("empty_label"));
    }

    #[test]
    fn test_fields_not_an_array() {
        let item = item(json!({"fields": {"label": "password"}}));
        assert!(item.accessor_names().is_empty());
        assert_eq!(*item.get("fields").unwrap(), json!({"label": "password"}));
    }

    #[test]
    fn test_timestamps_cast_on_both_surfaces() {
        let item = item(json!({
            "created_at": "2023-12-01T10:30:00Z",
            "some_date": "2023-12-02T15:45:30Z",
            "normal_field": "regular value"
        }));

        let expected = chrono::DateTime::parse_from_rfc3339("2023-12-01T10:30:00Z").unwrap();
        assert_eq!(item.get("created_at").unwrap().as_timestamp(), Some(&expected));
        assert_eq!(item.property("created_at").unwrap().as_timestamp(), Some(&expected));
        assert!(item.get("some_date").unwrap().is_timestamp());
        assert_eq!(*item.get("normal_field").unwrap(), "regular value");
    }

    #[test]
    fn test_field_timestamps() {
        let item = item(json!({
            "fields": [
                {"label": "lastEditedAt", "value": "2023-12-01T10:30:00Z"},
                {"label": "createdDate", "value": "2023-12-02T15:45:30Z"},
                {"label": "normalField", "value": "regular value"}
            ]
        }));

        assert!(item.property("last_edited_at").unwrap().is_timestamp());
        assert!(item.property("created_date").unwrap().is_timestamp());
        assert_eq!(text(&item, "normal_field"), "regular value");
    }

    #[test]
    fn test_malformed_timestamp_kept_as_string() {
        let item = item(json!({"created_at": "invalid-date-string"}));
        assert_eq!(*item.get("created_at").unwrap(), "invalid-date-string");
    }

    #[test]
    fn test_to_map_is_uncast() {
        let item = item(json!({"created_at": "2023-12-01T10:30:00Z"}));
        let _ = item.get("created_at");
        assert_eq!(item.to_map()["created_at"], "2023-12-01T10:30:00Z");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"created_at": "2023-12-01T10:30:00Z"})
        );
    }

    #[test]
    fn test_from_serializable_stringifies_keys() {
        let mut record = std::collections::BTreeMap::new();
        record.insert(1, "one");
        record.insert(2, "two");
        let item = Item::from_serializable(&record).unwrap();
        assert_eq!(*item.get("1").unwrap(), "one");
        assert_eq!(item.to_map().keys().collect::<Vec<_>>(), ["1", "2"]);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        let err = Item::from_value(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, OpError::InvalidResponse { .. }));
    }

    #[test]
    fn test_debug_hides_values() {
        let item = item(json!({"password": "hunter2"}));
        assert!(!format!("{:?}", item).contains("hunter2"));
    }
}

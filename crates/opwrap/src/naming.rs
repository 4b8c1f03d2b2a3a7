//! Accessor names derived from field labels

use std::collections::HashSet;

/// Names that would shadow the item's own API, plus the identity-style
/// names every object model treats as built in.
pub const RESERVED_NAMES: &[&str] = &[
    "accessor_names",
    "as_json",
    "class",
    "clone",
    "fields",
    "get",
    "has_property",
    "object_id",
    "property",
    "raw",
    "self",
    "to_h",
    "to_map",
    "type",
];

/// Lower-case, underscore-joined tokenization of a label.
///
/// Words are split on any non-alphanumeric character and on case boundaries:
/// `"Security Question"` → `security_question`, `"firstName"` → `first_name`,
/// `"HTTPServer"` → `http_server`.
pub fn snake_case(label: &str) -> String {
    let mut words: Vec<String> = Vec::new();

    for segment in label.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = segment.chars().collect();
        let mut word = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_uppercase() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if boundary && !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            }
            word.extend(c.to_lowercase());
        }

        if !word.is_empty() {
            words.push(word);
        }
    }

    words.join("_")
}

/// Assigns collision-free accessor names in field order
#[derive(Debug)]
pub struct NameAllocator<'a> {
    keys: &'a HashSet<String>,
    assigned: HashSet<String>,
}

impl<'a> NameAllocator<'a> {
    /// `keys` are the record's top-level keys, which always win over fields
    pub fn new(keys: &'a HashSet<String>) -> Self {
        Self {
            keys,
            assigned: HashSet::new(),
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.assigned.contains(name) || self.keys.contains(name) || RESERVED_NAMES.contains(&name)
    }

    /// Derive and claim the accessor name for a label.
    /// Returns `None` when the label has no usable characters.
    pub fn allocate(&mut self, label: &str) -> Option<String> {
        let candidate = snake_case(label);
        if candidate.is_empty() {
            return None;
        }

        let mut name = if self.is_taken(&candidate) {
            format!("field_{}", candidate)
        } else {
            candidate
        };

        if self.is_taken(&name) {
            let base = name;
            name = (2..)
                .map(|n| format!("{}_{}", base, n))
                .find(|attempt| !self.is_taken(attempt))
                .unwrap_or_default();
        }

        self.assigned.insert(name.clone());
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("password"), "password");
        assert_eq!(snake_case("Security Question"), "security_question");
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("lastLoginAt"), "last_login_at");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("object_id"), "object_id");
        assert_eq!(snake_case("  one-time  password "), "one_time_password");
        assert_eq!(snake_case("PIN"), "pin");
        assert_eq!(snake_case("api2Key"), "api2_key");
        assert_eq!(snake_case("!!!"), "");
    }

    #[test]
    fn test_duplicate_labels() {
        let keys = HashSet::new();
        let mut names = NameAllocator::new(&keys);
        assert_eq!(names.allocate("code").as_deref(), Some("code"));
        assert_eq!(names.allocate("code").as_deref(), Some("field_code"));
        assert_eq!(names.allocate("code").as_deref(), Some("field_code_2"));
    }

    #[test]
    fn test_collision_with_key_and_reserved() {
        let keys: HashSet<String> = ["password".to_string()].into();
        let mut names = NameAllocator::new(&keys);
        assert_eq!(names.allocate("password").as_deref(), Some("field_password"));
        assert_eq!(names.allocate("class").as_deref(), Some("field_class"));
        assert_eq!(names.allocate("class").as_deref(), Some("field_class_2"));
        assert_eq!(names.allocate("class").as_deref(), Some("field_class_3"));
    }

    #[test]
    fn test_prefixed_name_avoids_existing_key() {
        let keys: HashSet<String> = ["token".to_string(), "field_token".to_string()].into();
        let mut names = NameAllocator::new(&keys);
        assert_eq!(names.allocate("token").as_deref(), Some("field_token_2"));
    }

    #[test]
    fn test_unusable_label() {
        let keys = HashSet::new();
        let mut names = NameAllocator::new(&keys);
        assert_eq!(names.allocate("---"), None);
    }
}

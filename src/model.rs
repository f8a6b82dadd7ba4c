//! The demo "example" resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub id: String,
    pub name: String,
    pub email: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sanitized POST body.
#[derive(Clone, Debug, Deserialize)]
pub struct NewExample {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sanitized PATCH body. Absent fields keep their current value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExamplePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExampleId {
    pub id: String,
}

impl Example {
    pub fn new(id: String, input: NewExample, now: DateTime<Utc>) -> Self {
        Example {
            id,
            name: input.name,
            email: input.email,
            description: input.description.filter(|d| !d.is_empty()),
            created_at: now,
            updated_at: None,
        }
    }

    /// Shallow merge of the provided fields, stamping `updated_at`.
    pub fn apply(&mut self, patch: ExamplePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Example {
        Example::new(
            "1".into(),
            NewExample {
                name: "John Doe".into(),
                email: "john@example.com".into(),
                description: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn serializes_camel_case_with_null_description() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["name"], "John Doe");
        assert!(json["description"].is_null());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn empty_description_is_stored_as_absent() {
        let example = Example::new(
            "1".into(),
            NewExample {
                name: "A".into(),
                email: "a@example.com".into(),
                description: Some(String::new()),
            },
            Utc::now(),
        );
        assert_eq!(example.description, None);
    }

    #[test]
    fn apply_merges_only_provided_fields() {
        let mut example = sample();
        let now = Utc::now();
        example.apply(
            ExamplePatch {
                name: Some("Jane Doe".into()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(example.name, "Jane Doe");
        assert_eq!(example.email, "john@example.com");
        assert_eq!(example.updated_at, Some(now));
    }
}

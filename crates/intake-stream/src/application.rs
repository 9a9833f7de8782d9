use std::sync::LazyLock;

use regex::Regex;

static DOB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("dob pattern is valid"));

/// Structured visa-application record extracted from free text.
///
/// The record is all-or-nothing: a value that is missing a field, carries an
/// extra field, or fails validation is treated as absent, never as a partial
/// result.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisaApplication {
    /// Applicant's full name, non-empty.
    pub full_name: String,
    /// Date of birth in `YYYY-MM-DD` form.
    pub dob: String,
    /// Passport number, at least five characters.
    pub passport_number: String,
    /// Nationality, at least two characters.
    pub nationality: String,
}

impl VisaApplication {
    /// Checks the field-level constraints shared with the generation schema.
    pub fn is_valid(&self) -> bool {
        !self.full_name.trim().is_empty()
            && DOB_PATTERN.is_match(&self.dob)
            && self.passport_number.chars().count() >= 5
            && self.nationality.chars().count() >= 2
    }

    /// Deserializes and validates an opaque JSON value.
    ///
    /// Returns `None` for anything that is not a complete, valid record.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let record: Self = serde_json::from_value(value.clone()).ok()?;
        record.is_valid().then_some(record)
    }

    /// JSON schema handed to the provider as a generation constraint.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "full_name": { "type": "string", "minLength": 1 },
                "dob": { "type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}$" },
                "passport_number": { "type": "string", "minLength": 5 },
                "nationality": { "type": "string", "minLength": 2 }
            },
            "required": ["full_name", "dob", "passport_number", "nationality"],
            "additionalProperties": false
        })
    }
}

//! Variant definitions and template rendering

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation::{validate_variant_id, ExperimentValidationError};

/// Regex to match `{name}` placeholders; any key without braces is a name
static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Values substituted into variant placeholders
pub type TemplateValues = BTreeMap<String, Value>;

// ============================================================================
// VariantId
// ============================================================================

/// Unique identifier for one side of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    /// Create a new variant ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        let id = id.into();
        validate_variant_id(&id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VariantId {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VariantId> for String {
    fn from(id: VariantId) -> Self {
        id.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VariantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Variant
// ============================================================================

/// One of the two artifacts compared by a test
///
/// A variant is validated on construction and immutable afterwards, except for
/// its free-form metadata. Placeholders use the `{name}` syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VariantRecord")]
pub struct Variant {
    variant_id: VariantId,
    name: String,
    description: String,
    content: String,
    template_variables: TemplateValues,
    expected_outcomes: Vec<String>,
    success_criteria: BTreeMap<String, f64>,
    metadata: BTreeMap<String, Value>,
}

impl Variant {
    /// Create a new variant, rejecting an empty ID or empty content
    pub fn new(
        variant_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ExperimentValidationError> {
        let variant_id = VariantId::new(variant_id)?;
        let content = content.into();

        if content.trim().is_empty() {
            return Err(ExperimentValidationError::EmptyContent);
        }

        Ok(Self {
            variant_id,
            name: name.into(),
            description: String::new(),
            content,
            template_variables: TemplateValues::new(),
            expected_outcomes: Vec::new(),
            success_criteria: BTreeMap::new(),
            metadata: BTreeMap::new(),
        })
    }

    // Builder methods

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a template variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template_variables.insert(name.into(), value.into());
        self
    }

    /// Replace all template variables
    pub fn with_variables(mut self, variables: TemplateValues) -> Self {
        self.template_variables = variables;
        self
    }

    /// Add an expected outcome
    pub fn with_expected_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.expected_outcomes.push(outcome.into());
        self
    }

    /// Add a success criterion threshold
    pub fn with_success_criterion(mut self, metric: impl Into<String>, threshold: f64) -> Self {
        self.success_criteria.insert(metric.into(), threshold);
        self
    }

    /// Replace all success criteria
    pub fn with_success_criteria(mut self, criteria: BTreeMap<String, f64>) -> Self {
        self.success_criteria = criteria;
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    // Getters

    pub fn id(&self) -> &VariantId {
        &self.variant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn template_variables(&self) -> &TemplateValues {
        &self.template_variables
    }

    pub fn expected_outcomes(&self) -> &[String] {
        &self.expected_outcomes
    }

    pub fn success_criteria(&self) -> &BTreeMap<String, f64> {
        &self.success_criteria
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Metadata is the only part of a variant that may change after creation
    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.metadata
    }

    // Rendering

    /// Names of all distinct placeholders in the content, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();

        for cap in PLACEHOLDER_PATTERN.captures_iter(&self.content) {
            if let Some(name) = cap.get(1).map(|m| m.as_str()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        names
    }

    /// Render the content, substituting `{name}` placeholders
    ///
    /// Values come from the variant's template variables, with `overrides`
    /// taking precedence. Placeholders without a value are left as literal
    /// `{name}` text and unused values are ignored.
    pub fn render(&self, overrides: Option<&TemplateValues>) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(&self.content, |caps: &Captures<'_>| {
                let name = &caps[1];
                let value = overrides
                    .and_then(|o| o.get(name))
                    .or_else(|| self.template_variables.get(name));

                match value {
                    Some(v) => value_to_text(v),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    // Serialization

    /// Convert to a JSON value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Build a variant from a JSON value, applying the same validation as `new`
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Unvalidated wire form of a variant
#[derive(Debug, Deserialize)]
struct VariantRecord {
    variant_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(alias = "prompt_content")]
    content: String,
    #[serde(default)]
    template_variables: TemplateValues,
    #[serde(default)]
    expected_outcomes: Vec<String>,
    #[serde(default)]
    success_criteria: BTreeMap<String, f64>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl TryFrom<VariantRecord> for Variant {
    type Error = ExperimentValidationError;

    fn try_from(record: VariantRecord) -> Result<Self, Self::Error> {
        let mut variant = Variant::new(record.variant_id, record.name, record.content)?;
        variant.description = record.description;
        variant.template_variables = record.template_variables;
        variant.expected_outcomes = record.expected_outcomes;
        variant.success_criteria = record.success_criteria;
        variant.metadata = record.metadata;
        Ok(variant)
    }
}

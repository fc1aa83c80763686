//! Reusable variant-pair templates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::validation::ExperimentValidationError;
use super::variant::{TemplateValues, Variant};

/// A named pair of variant templates with sample inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub variant_a_template: String,
    pub variant_b_template: String,
    #[serde(default)]
    pub success_criteria: BTreeMap<String, f64>,
    #[serde(default)]
    pub sample_inputs: Vec<TemplateValues>,
}

impl TestTemplate {
    /// Build both variants, tagging their IDs with the given suffix
    ///
    /// Success criteria are copied to both variants.
    pub fn build_variants(
        &self,
        suffix: &str,
    ) -> Result<(Variant, Variant), ExperimentValidationError> {
        let build = |side: &str, label: &str, content: &str| {
            Variant::new(
                format!("variant_{}_{}", side, suffix),
                format!("{} - Variant {}", self.name, label),
                content,
            )
            .map(|variant| {
                variant
                    .with_description(self.description.clone())
                    .with_success_criteria(self.success_criteria.clone())
                    .with_metadata("template", self.name.clone())
            })
        };

        Ok((
            build("a", "A", &self.variant_a_template)?,
            build("b", "B", &self.variant_b_template)?,
        ))
    }
}

/// One template entry that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLoadFailure {
    /// Position of the entry in the `templates` list
    pub index: usize,
    /// Name of the entry, when it had one
    pub name: Option<String>,
    pub reason: String,
}

/// Outcome of loading a template file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateLoadReport {
    /// Names of templates loaded, in file order
    pub loaded: Vec<String>,
    pub failures: Vec<TemplateLoadFailure>,
}

impl TemplateLoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> TestTemplate {
        TestTemplate {
            name: "code_review".to_string(),
            description: "Compare review prompts".to_string(),
            variant_a_template: "Review {code}".to_string(),
            variant_b_template: "Carefully review {code} for bugs".to_string(),
            success_criteria: BTreeMap::from([("accuracy".to_string(), 0.8)]),
            sample_inputs: vec![TemplateValues::from([(
                "code".to_string(),
                serde_json::json!("fn main() {}"),
            )])],
        }
    }

    #[test]
    fn test_build_variants() {
        let (a, b) = template().build_variants("abc123").unwrap();

        assert_eq!(a.id().as_str(), "variant_a_abc123");
        assert_eq!(b.id().as_str(), "variant_b_abc123");
        assert_eq!(a.content(), "Review {code}");
        assert_eq!(a.success_criteria().get("accuracy"), Some(&0.8));
        assert_eq!(b.success_criteria().get("accuracy"), Some(&0.8));
        assert_eq!(a.metadata().get("template"), Some(&serde_json::json!("code_review")));
    }

    #[test]
    fn test_build_variants_empty_template() {
        let mut t = template();
        t.variant_b_template = String::new();

        assert_eq!(
            t.build_variants("x").unwrap_err(),
            ExperimentValidationError::EmptyContent
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let t: TestTemplate = serde_json::from_value(serde_json::json!({
            "name": "minimal",
            "variant_a_template": "A",
            "variant_b_template": "B"
        }))
        .unwrap();

        assert!(t.sample_inputs.is_empty());
        assert!(t.success_criteria.is_empty());
        assert_eq!(t.description, "");
    }
}

//! Loading test templates from JSON files
//!
//! The file holds `{"templates": [ ... ]}`. Each entry is parsed on its own so
//! one malformed template does not prevent the others from loading.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::experiment::{TemplateLoadFailure, TemplateLoadReport, TestTemplate};
use crate::domain::DomainError;

/// Parses a template document into the given map
///
/// Entries replace existing templates with the same name. Fails only when the
/// document itself is unusable.
pub fn parse_templates(
    content: &str,
    templates: &mut HashMap<String, TestTemplate>,
) -> Result<TemplateLoadReport, DomainError> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| DomainError::validation(format!("Invalid template file: {}", e)))?;

    let entries = match document.get("templates") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(DomainError::validation(
                "Template file field 'templates' must be a list",
            ));
        }
        None => {
            return Err(DomainError::validation(
                "Template file has no 'templates' list",
            ));
        }
    };

    let mut report = TemplateLoadReport::default();

    for (index, entry) in entries.iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        match serde_json::from_value::<TestTemplate>(entry.clone()) {
            Ok(template) if template.name.trim().is_empty() => {
                warn!(index, "Skipping template with empty name");
                report.failures.push(TemplateLoadFailure {
                    index,
                    name,
                    reason: "Template name cannot be empty".to_string(),
                });
            }
            Ok(template) => {
                debug!(index, template = %template.name, "Loaded test template");
                report.loaded.push(template.name.clone());
                templates.insert(template.name.clone(), template);
            }
            Err(e) => {
                warn!(index, name = ?name, error = %e, "Skipping malformed test template");
                report.failures.push(TemplateLoadFailure {
                    index,
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Reads and parses a template file
pub async fn load_templates_file(
    path: &Path,
    templates: &mut HashMap<String, TestTemplate>,
) -> Result<TemplateLoadReport, DomainError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::storage(format!(
            "Failed to read template file '{}': {}",
            path.display(),
            e
        ))
    })?;

    parse_templates(&content, templates)
}

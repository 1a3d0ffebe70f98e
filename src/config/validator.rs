//! Validation report for configuration trees.
//!
//! The encoder stops at the first violation. The validator instead walks
//! the whole tree and collects every error it can find, plus warnings for
//! input the encoder accepts but silently resolves or ignores.

use crate::codec::Encoder;
use crate::error::{ConfigError, EncodeError, Result};
use crate::spec::{AppSpec, Component, ComponentKind, StringMatch};
use std::collections::HashSet;
use tracing::debug;

use super::schema::SCHEMA;
use super::value::{ConfigMap, ConfigValue};

/// Source kinds of a component.
const SOURCE_KEYS: &[&str] = &["git", "github", "gitlab", "bitbucket"];

/// Validator for configuration trees.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    encoder: Encoder,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a validator using the given encoder.
    #[must_use]
    pub const fn new(encoder: Encoder) -> Self {
        Self { encoder }
    }

    /// Validates a tree, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self, tree: &ConfigMap) -> Result<ValidationResult> {
        let (_, result) = self.check(tree);
        match result.errors.first() {
            None => {
                debug!("Configuration validation passed");
                Ok(result)
            }
            Some(first_error) => Err(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )
            .into()),
        }
    }

    /// Validates a tree and returns the encoded app, if encoding succeeded,
    /// together with every error and warning found.
    #[must_use]
    pub fn check(&self, tree: &ConfigMap) -> (Option<AppSpec>, ValidationResult) {
        let mut result = ValidationResult::default();

        Self::check_app_fields(tree, &mut result);
        Self::check_components(tree, &mut result);
        Self::check_ingress(tree, &mut result);

        let app = match self.encoder.encode(tree) {
            Ok(app) => {
                Self::check_autoscaling(&app, &mut result);
                Some(app)
            }
            // Reported by the component scan with every occurrence.
            Err(EncodeError::DuplicateName { .. }) => None,
            Err(err) => {
                result.errors.push(ValidationError {
                    field: err.path().to_string(),
                    message: err.to_string(),
                });
                None
            }
        };

        debug!(
            errors = result.error_count(),
            warnings = result.warning_count(),
            "Validation finished"
        );
        (app, result)
    }

    fn check_app_fields(tree: &ConfigMap, result: &mut ValidationResult) {
        for key in tree.keys().filter(|key| !SCHEMA.accepts_app_field(key)) {
            result
                .warnings
                .push(format!("spec.{key}: Unknown field will be ignored"));
        }

        if !maps(tree.get("domain")).is_empty() && is_populated(tree.get("domains")) {
            result.warnings.push(String::from(
                "spec.domains: Ignored because structured domain blocks are set",
            ));
        }
    }

    fn check_components(tree: &ConfigMap, result: &mut ValidationResult) {
        let mut seen_names = HashSet::new();

        for kind in ComponentKind::ALL {
            for (i, component) in maps(tree.get(kind.key())).into_iter().enumerate() {
                let prefix = format!("spec.{}[{i}]", kind.key());

                if let Some(name) = component.get("name").and_then(ConfigValue::as_str) {
                    if !is_valid_name(name) {
                        result.errors.push(ValidationError {
                            field: format!("{prefix}.name"),
                            message: format!(
                                "Component name '{name}' is invalid. Must be lowercase alphanumeric with hyphens."
                            ),
                        });
                    }
                    if !seen_names.insert(name) {
                        result.errors.push(ValidationError {
                            field: format!("{prefix}.name"),
                            message: format!("Duplicate component name: {name}"),
                        });
                    }
                }

                let ignored: Vec<&str> = component
                    .keys()
                    .map(String::as_str)
                    .filter(|key| !SCHEMA.accepts(kind, key))
                    .collect();
                if !ignored.is_empty() {
                    result.warnings.push(format!(
                        "{prefix}: Fields not applicable to {kind}: {}",
                        ignored.join(", ")
                    ));
                }

                let sources = populated(component, SOURCE_KEYS);
                if sources.len() > 1 {
                    result.warnings.push(format!(
                        "{prefix}: Multiple sources set ({}), only {} is used",
                        sources.join(", "),
                        sources[0]
                    ));
                }

                if let Some(image) = maps(component.get("image")).first() {
                    if is_populated(image.get("tag")) && is_populated(image.get("digest")) {
                        result.warnings.push(format!(
                            "{prefix}.image: Both tag and digest are set"
                        ));
                    }
                }

                if kind == ComponentKind::Service
                    && is_populated(component.get("instance_count"))
                    && is_populated(component.get("autoscaling"))
                {
                    result.warnings.push(format!(
                        "{prefix}: instance_count is set together with autoscaling"
                    ));
                }

                if SCHEMA.accepts(kind, "cors") {
                    Self::check_cors(component, &format!("{prefix}.cors"), result);
                }
            }
        }
    }

    fn check_ingress(tree: &ConfigMap, result: &mut ValidationResult) {
        let Some(ingress) = maps(tree.get("ingress")).into_iter().next() else {
            return;
        };
        for (i, rule) in maps(ingress.get("rule")).into_iter().enumerate() {
            let prefix = format!("spec.ingress.rule[{i}]");
            if is_populated(rule.get("component")) && is_populated(rule.get("redirect")) {
                result.warnings.push(format!(
                    "{prefix}: Both component and redirect are set"
                ));
            }
            Self::check_cors(rule, &format!("{prefix}.cors"), result);
        }
    }

    fn check_cors(parent: &ConfigMap, prefix: &str, result: &mut ValidationResult) {
        let Some(cors) = maps(parent.get("cors")).into_iter().next() else {
            return;
        };
        let Some(origins) = maps(cors.get("allow_origins")).into_iter().next() else {
            return;
        };
        let kinds: Vec<&str> = populated(origins, &StringMatch::KEYS)
            .into_iter()
            .filter(|key| origins.get(*key).and_then(ConfigValue::as_str) != Some(""))
            .collect();
        if kinds.len() > 1 {
            result.warnings.push(format!(
                "{prefix}.allow_origins: Multiple match kinds set ({})",
                kinds.join(", ")
            ));
        }
        if kinds.contains(&"prefix") {
            result.warnings.push(format!(
                "{prefix}.allow_origins.prefix: Deprecated, use regex"
            ));
        }
    }

    fn check_autoscaling(app: &AppSpec, result: &mut ValidationResult) {
        let services = app.components_of(ComponentKind::Service).enumerate();
        for (i, component) in services {
            let Component::Service(service) = component else {
                continue;
            };
            let Some(autoscaling) = &service.autoscaling else {
                continue;
            };
            if autoscaling.min_instance_count > autoscaling.max_instance_count {
                result.errors.push(ValidationError {
                    field: format!("spec.service[{i}].autoscaling"),
                    message: format!(
                        "min_instance_count {} exceeds max_instance_count {}",
                        autoscaling.min_instance_count, autoscaling.max_instance_count
                    ),
                });
            }
        }
    }
}

/// Returns the maps held by a block or repeated field.
fn maps(value: Option<&ConfigValue>) -> Vec<&ConfigMap> {
    match value {
        Some(ConfigValue::Map(map)) => vec![map],
        Some(other) => other
            .members()
            .unwrap_or_default()
            .into_iter()
            .filter_map(ConfigValue::as_map)
            .collect(),
        None => Vec::new(),
    }
}

fn is_populated(value: Option<&ConfigValue>) -> bool {
    match value {
        None | Some(ConfigValue::Null) => false,
        Some(other) => other.members().is_none_or(|members| !members.is_empty()),
    }
}

fn populated<'k>(map: &ConfigMap, keys: &[&'k str]) -> Vec<&'k str> {
    keys.iter()
        .copied()
        .filter(|key| is_populated(map.get(*key)))
        .collect()
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with hyphens, starting with a letter.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    // First character must be a letter
    if !chars.next().is_some_and(|first| first.is_ascii_lowercase()) {
        return false;
    }

    // Rest must be lowercase alphanumeric or hyphen
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return false;
    }

    !name.ends_with('-') && !name.contains("--") && name.len() <= 32
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn check(yaml: &str) -> ValidationResult {
        ConfigValidator::default().check(&tree(yaml)).1
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("web"));
        assert!(is_valid_name("api-v2"));
        assert!(is_valid_name("a"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Web")); // uppercase
        assert!(!is_valid_name("2web")); // starts with number
        assert!(!is_valid_name("web_api")); // underscore
        assert!(!is_valid_name("web-")); // ends with hyphen
        assert!(!is_valid_name("web--api")); // consecutive hyphens
        assert!(!is_valid_name(&"a".repeat(33)));
    }

    #[test]
    fn test_clean_tree_passes() {
        let result = check("name: shop\nservice:\n  - name: web\n    http_port: 8080\n");
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_reports_every_duplicate_name() {
        let result = check(
            "name: shop\nservice:\n  - name: web\nworker:\n  - name: web\njob:\n  - name: web\n",
        );
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.errors[0].field, "spec.worker[0].name");
        assert_eq!(result.errors[1].field, "spec.job[0].name");
    }

    #[test]
    fn test_encode_failure_is_an_error() {
        let result = check(
            "name: shop\nworker:\n  - name: q\n    termination:\n      - grace_period_seconds: 601\n",
        );
        assert_eq!(result.error_count(), 1);
        assert_eq!(
            result.errors[0].field,
            "spec.worker[0].termination.grace_period_seconds"
        );
    }

    #[test]
    fn test_autoscaling_min_above_max() {
        let result = check(
            "name: shop\nservice:\n  - name: web\n    autoscaling:\n      - min_instance_count: 5\n        max_instance_count: 2\n        metrics:\n          - cpu:\n              - percent: 80\n",
        );
        assert_eq!(result.errors[0].field, "spec.service[0].autoscaling");
    }

    #[test]
    fn test_warnings() {
        let result = check(
            r"
name: shop
domains: [old.example.com]
domain:
  - name: shop.example.com
service:
  - name: web
    git:
      - repo_clone_url: https://a
    github:
      - repo: acme/web
    instance_count: 2
    autoscaling:
      - min_instance_count: 1
        max_instance_count: 3
        metrics:
          - cpu:
              - percent: 80
    cors:
      - allow_origins:
          - exact: https://a
            prefix: https://b
static_site:
  - name: docs
    termination:
      - grace_period_seconds: 30
worker:
  - name: queue
    image:
      - registry_type: DOCR
        repository: queue
        tag: latest
        digest: sha256:abc
ingress:
  - rule:
      - component:
          - name: web
        redirect:
          - uri: /x
",
        );
        assert!(result.is_valid(), "{:?}", result.errors);
        let warnings = result.warnings.join("\n");
        for expected in [
            "spec.domains: Ignored",
            "spec.service[0]: Multiple sources set (git, github)",
            "spec.service[0]: instance_count is set together with autoscaling",
            "spec.service[0].cors.allow_origins: Multiple match kinds",
            "spec.service[0].cors.allow_origins.prefix: Deprecated",
            "spec.static_site[0]: Fields not applicable to static_site: termination",
            "spec.worker[0].image: Both tag and digest are set",
            "spec.ingress.rule[0]: Both component and redirect are set",
        ] {
            assert!(warnings.contains(expected), "missing warning: {expected}");
        }
    }

    #[test]
    fn test_validate_fails_on_first_error() {
        let validator = ConfigValidator::default();
        assert!(validator.validate(&tree("name: x\n")).is_err());
        assert!(validator.validate(&tree("name: shop\n")).is_ok());
    }
}

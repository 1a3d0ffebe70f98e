//! Drift report between a desired and an observed application.
//!
//! Components are matched by kind and name and compared by fingerprint.
//! App-level env vars are compared as a set, by member hash, so a value
//! change shows up as one removal and one addition.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use crate::codec::{DecodeContext, Decoder, SpecHasher};
use crate::config::value::{ConfigMap, ConfigValue};
use crate::spec::{AppSpec, Component, ComponentKind, EnvVar};

/// Engine for computing diffs between desired and observed specs.
#[derive(Debug, Default)]
pub struct DiffEngine {
    hasher: SpecHasher,
}

/// Difference for a single component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDiff {
    /// Component kind.
    pub kind: ComponentKind,
    /// Component name.
    pub name: String,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Top-level fields that differ.
    pub details: Vec<DiffDetail>,
    /// Observed hash (if applicable).
    pub old_hash: Option<String>,
    /// Desired hash (if applicable).
    pub new_hash: Option<String>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// Component needs to be created.
    Create,
    /// Component needs to be updated.
    Update,
    /// Component needs to be deleted.
    Delete,
    /// Component is unchanged.
    NoChange,
}

/// A field that differs between observed and desired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDetail {
    /// Field that differs.
    pub field: String,
    /// Observed value, or a short hash for nested values.
    pub old_value: Option<String>,
    /// Desired value, or a short hash for nested values.
    pub new_value: Option<String>,
}

/// Direction of an env var change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvChangeType {
    /// Present only in the desired spec.
    Added,
    /// Present only in the observed spec.
    Removed,
}

/// One env var entering or leaving the app-level set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvChange {
    /// Variable name.
    pub key: String,
    /// Full member hash.
    pub hash: String,
    /// Direction.
    pub change: EnvChangeType,
}

/// Complete diff result.
#[derive(Debug, Default)]
pub struct DiffResult {
    /// Per-component diffs.
    pub diffs: Vec<ResourceDiff>,
    /// App-level env var changes.
    pub env_changes: Vec<EnvChange>,
    /// Number of components to create.
    pub creates: usize,
    /// Number of components to update.
    pub updates: usize,
    /// Number of components to delete.
    pub deletes: usize,
    /// Number of unchanged components.
    pub unchanged: usize,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: SpecHasher::new(),
        }
    }

    /// Computes the diff between the desired and observed apps.
    #[must_use]
    pub fn compute_diff(&self, desired: &AppSpec, observed: &AppSpec) -> DiffResult {
        let observed_by_key: HashMap<(ComponentKind, &str), &Component> = observed
            .components
            .iter()
            .map(|c| ((c.kind(), c.name()), c))
            .collect();

        let mut diffs: Vec<ResourceDiff> = desired
            .components
            .iter()
            .map(|component| {
                let current = observed_by_key.get(&(component.kind(), component.name()));
                self.compute_component_diff(component, current.copied())
            })
            .collect();

        for component in &observed.components {
            if desired.components.iter().any(|c| c.kind() == component.kind() && c.name() == component.name()) {
                continue;
            }
            debug!("Found orphaned component: {} {}", component.kind(), component.name());
            diffs.push(ResourceDiff {
                kind: component.kind(),
                name: component.name().to_string(),
                diff_type: DiffType::Delete,
                details: vec![],
                old_hash: Some(self.hasher.hash_component(component)),
                new_hash: None,
            });
        }

        let env_changes = Self::compute_env_changes(&desired.envs, &observed.envs);

        let count = |diff_type| diffs.iter().filter(|d| d.diff_type == diff_type).count();
        let (creates, updates, deletes, unchanged) = (
            count(DiffType::Create),
            count(DiffType::Update),
            count(DiffType::Delete),
            count(DiffType::NoChange),
        );

        DiffResult {
            diffs,
            env_changes,
            creates,
            updates,
            deletes,
            unchanged,
        }
    }

    fn compute_component_diff(&self, desired: &Component, observed: Option<&Component>) -> ResourceDiff {
        let new_hash = self.hasher.hash_component(desired);
        let Some(observed) = observed else {
            debug!("Component {} needs to be created", desired.name());
            return ResourceDiff {
                kind: desired.kind(),
                name: desired.name().to_string(),
                diff_type: DiffType::Create,
                details: vec![],
                old_hash: None,
                new_hash: Some(new_hash),
            };
        };

        let old_hash = self.hasher.hash_component(observed);
        let (diff_type, details) = if SpecHasher::hashes_match(&old_hash, &new_hash) {
            debug!("Component {} is up to date", desired.name());
            (DiffType::NoChange, vec![])
        } else {
            debug!("Component {} needs update", desired.name());
            (DiffType::Update, self.compute_detailed_diff(desired, observed))
        };

        ResourceDiff {
            kind: desired.kind(),
            name: desired.name().to_string(),
            diff_type,
            details,
            old_hash: Some(old_hash),
            new_hash: Some(new_hash),
        }
    }

    /// Lists the top-level fields whose decoded values differ.
    fn compute_detailed_diff(&self, desired: &Component, observed: &Component) -> Vec<DiffDetail> {
        let decoder = Decoder::new(DecodeContext::default());
        let new_tree = decoder.decode_component(desired);
        let old_tree = decoder.decode_component(observed);

        let fields: BTreeSet<&String> = new_tree.keys().chain(old_tree.keys()).collect();
        fields
            .into_iter()
            .filter(|field| new_tree.get(*field) != old_tree.get(*field))
            .map(|field| DiffDetail {
                field: field.clone(),
                old_value: old_tree.get(field).map(|v| self.render(field, v)),
                new_value: new_tree.get(field).map(|v| self.render(field, v)),
            })
            .collect()
    }

    fn render(&self, field: &str, value: &ConfigValue) -> String {
        match value {
            ConfigValue::Null => String::from("null"),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::Float(f) => f.to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::List(_) | ConfigValue::Set(_) | ConfigValue::Map(_) => {
                let tree: ConfigMap = BTreeMap::from([(field.to_string(), value.clone())]);
                format!("#{}", SpecHasher::short_hash(&self.hasher.hash_tree(&tree)))
            }
        }
    }

    /// Compares two env var sets by member hash.
    #[must_use]
    pub fn compute_env_changes(desired: &[EnvVar], observed: &[EnvVar]) -> Vec<EnvChange> {
        let hashed = |envs: &[EnvVar]| -> BTreeMap<String, String> {
            envs.iter()
                .map(|env| (SpecHasher::hash_env_var(env), env.key.clone()))
                .collect()
        };
        let desired = hashed(desired);
        let observed = hashed(observed);

        let added = desired
            .iter()
            .filter(|(hash, _)| !observed.contains_key(*hash))
            .map(|(hash, key)| (EnvChangeType::Added, hash, key));
        let removed = observed
            .iter()
            .filter(|(hash, _)| !desired.contains_key(*hash))
            .map(|(hash, key)| (EnvChangeType::Removed, hash, key));

        let mut changes: Vec<EnvChange> = removed
            .chain(added)
            .map(|(change, hash, key)| EnvChange {
                key: key.clone(),
                hash: hash.clone(),
                change,
            })
            .collect();
        changes.sort_by(|a, b| a.key.cmp(&b.key).then(b.change.cmp(&a.change)));
        changes
    }
}

impl DiffResult {
    /// Returns true if there are any changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0 || self.deletes > 0 || !self.env_changes.is_empty()
    }

    /// Returns the total number of changes.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes + self.env_changes.len()
    }

    /// Filters to only diffs that require action.
    #[must_use]
    pub fn actionable_diffs(&self) -> Vec<&ResourceDiff> {
        self.diffs
            .iter()
            .filter(|d| d.diff_type != DiffType::NoChange)
            .collect()
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for EnvChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Removed => "removed",
        })
    }
}

impl fmt::Display for ResourceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.name, self.diff_type)?;
        if !self.details.is_empty() {
            let fields: Vec<&str> = self.details.iter().map(|d| d.field.as_str()).collect();
            write!(f, " ({})", fields.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encoder;

    fn app(yaml: &str) -> AppSpec {
        let tree: ConfigMap = serde_yaml::from_str(yaml).unwrap();
        Encoder::new().encode(&tree).unwrap()
    }

    #[test]
    fn test_identical_apps_have_no_changes() {
        let spec = app("name: shop\nservice:\n  - name: web\n    http_port: 8080\n");
        let result = DiffEngine::new().compute_diff(&spec, &spec);
        assert!(!result.has_changes());
        assert_eq!(result.unchanged, 1);
    }

    #[test]
    fn test_create_update_delete() {
        let desired = app(
            "name: shop\nservice:\n  - name: web\n    http_port: 9090\nworker:\n  - name: new\n",
        );
        let observed = app(
            "name: shop\nservice:\n  - name: web\n    http_port: 8080\njob:\n  - name: old\n",
        );
        let result = DiffEngine::new().compute_diff(&desired, &observed);
        assert_eq!((result.creates, result.updates, result.deletes), (1, 1, 1));

        let update = result.diffs.iter().find(|d| d.name == "web").unwrap();
        assert_eq!(
            update.details,
            vec![DiffDetail {
                field: String::from("http_port"),
                old_value: Some(String::from("8080")),
                new_value: Some(String::from("9090")),
            }]
        );
        let delete = result.diffs.iter().find(|d| d.name == "old").unwrap();
        assert_eq!(delete.kind, ComponentKind::Job);
        assert_eq!(delete.diff_type, DiffType::Delete);
    }

    #[test]
    fn test_same_name_different_kind_is_replaced() {
        let desired = app("name: shop\nworker:\n  - name: queue\n");
        let observed = app("name: shop\njob:\n  - name: queue\n");
        let result = DiffEngine::new().compute_diff(&desired, &observed);
        assert_eq!((result.creates, result.deletes), (1, 1));
    }

    #[test]
    fn test_env_value_change_is_remove_and_add() {
        let desired = app("name: shop\nenv:\n  - key: A\n    value: \"2\"\n  - key: B\n    value: x\n");
        let observed = app("name: shop\nenv:\n  - key: B\n    value: x\n  - key: A\n    value: \"1\"\n");
        let result = DiffEngine::new().compute_diff(&desired, &observed);

        let changes: Vec<_> = result
            .env_changes
            .iter()
            .map(|c| (c.key.as_str(), c.change))
            .collect();
        assert_eq!(
            changes,
            [("A", EnvChangeType::Removed), ("A", EnvChangeType::Added)]
        );
        assert!(result.has_changes());
        assert_eq!(result.total_changes(), 2);
    }

    #[test]
    fn test_display() {
        let diff = ResourceDiff {
            kind: ComponentKind::Service,
            name: String::from("web"),
            diff_type: DiffType::Update,
            details: vec![DiffDetail {
                field: String::from("env"),
                old_value: None,
                new_value: None,
            }],
            old_hash: None,
            new_hash: None,
        };
        assert_eq!(diff.to_string(), "service web: update (env)");
    }
}

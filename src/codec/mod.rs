//! Conversion between configuration trees and typed specifications.
//!
//! [`Encoder`] reads a [`ConfigMap`] into an [`AppSpec`], failing with an
//! [`EncodeError`](crate::error::EncodeError) that names the offending field
//! path. [`Decoder`] writes a specification back out as a tree.

mod app;
mod canonical;
mod component;
mod leaf;
mod observability;
mod policy;
mod source;
mod termination;

use tracing::debug;

use crate::config::reader::{ExclusivePolicy, Node};
use crate::config::value::ConfigMap;
use crate::error::EncodeResult;
use crate::spec::{AppSpec, Component, ComponentKind};

pub use canonical::{SpecHasher, canonical};

/// Reads one variant of a block.
pub(crate) type Reader<T> = fn(&Node<'_>) -> EncodeResult<T>;

/// Reads the optional block under `key`.
pub(crate) fn optional<T>(
    node: &Node<'_>,
    key: &str,
    read: impl Fn(&Node<'_>) -> EncodeResult<T>,
) -> EncodeResult<Option<T>> {
    node.block(key)?.map(|block| read(&block)).transpose()
}

/// Reads every block of the repeated field `key`, in order.
pub(crate) fn repeated<T>(
    node: &Node<'_>,
    key: &str,
    read: impl Fn(&Node<'_>) -> EncodeResult<T>,
) -> EncodeResult<Vec<T>> {
    node.blocks(key)?.iter().map(read).collect()
}

/// Reads whichever of several mutually exclusive blocks is set.
pub(crate) fn one_of<T>(
    node: &Node<'_>,
    options: &[(&'static str, Reader<T>)],
) -> EncodeResult<Option<T>> {
    let keys: Vec<&'static str> = options.iter().map(|(key, _)| *key).collect();
    let Some(chosen) = node.exclusive(&keys)? else {
        return Ok(None);
    };
    let Some((_, read)) = options.iter().find(|(key, _)| *key == chosen) else {
        return Ok(None);
    };
    read(&node.block_required(chosen)?).map(Some)
}

/// Converts configuration trees into typed specifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    policy: ExclusivePolicy,
}

impl Encoder {
    /// Creates an encoder that resolves exclusive fields by precedence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            policy: ExclusivePolicy::FirstPresent,
        }
    }

    /// Creates an encoder that rejects conflicting exclusive fields.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            policy: ExclusivePolicy::Reject,
        }
    }

    /// Creates an encoder with an explicit policy.
    #[must_use]
    pub const fn with_policy(policy: ExclusivePolicy) -> Self {
        Self { policy }
    }

    /// Returns the exclusive-field policy.
    #[must_use]
    pub const fn policy(&self) -> ExclusivePolicy {
        self.policy
    }

    /// Encodes a full application tree.
    ///
    /// # Errors
    ///
    /// Returns the first shape, range, enum or requiredness violation found.
    pub fn encode(&self, tree: &ConfigMap) -> EncodeResult<AppSpec> {
        debug!(fields = tree.len(), policy = ?self.policy, "Encoding app spec");
        let app = app::encode_app(&Node::root(tree, "spec", self.policy))?;
        debug!(
            app = %app.name,
            components = app.components.len(),
            databases = app.databases.len(),
            "Encoded app spec"
        );
        Ok(app)
    }

    /// Encodes a single component tree of the given kind.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in the component.
    pub fn encode_component(&self, kind: ComponentKind, tree: &ConfigMap) -> EncodeResult<Component> {
        component::encode_component(kind, &Node::root(tree, kind.key(), self.policy))
    }
}

/// Prior-state hints that shape decoded output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    /// Write the structured `domain` list alongside the legacy `domains` set.
    pub structured_domains: bool,
}

impl DecodeContext {
    /// Derives the context from a previously stored tree. Structured
    /// domains are written back only when the prior tree used them.
    #[must_use]
    pub fn from_prior_state(prior: Option<&ConfigMap>) -> Self {
        let structured_domains = prior
            .and_then(|tree| tree.get("domain"))
            .and_then(|value| value.members())
            .is_some_and(|members| !members.is_empty());
        Self { structured_domains }
    }
}

/// Converts typed specifications back into configuration trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    context: DecodeContext,
}

impl Decoder {
    /// Creates a decoder.
    #[must_use]
    pub const fn new(context: DecodeContext) -> Self {
        Self { context }
    }

    /// Returns the decode context.
    #[must_use]
    pub const fn context(&self) -> DecodeContext {
        self.context
    }

    /// Decodes a full application.
    #[must_use]
    pub fn decode(&self, app: &AppSpec) -> ConfigMap {
        debug!(app = %app.name, context = ?self.context, "Decoding app spec");
        app::decode_app(app, self.context)
    }

    /// Decodes a single component.
    #[must_use]
    pub fn decode_component(&self, component: &Component) -> ConfigMap {
        component::decode_component(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::ConfigValue;
    use crate::error::EncodeError;
    use crate::spec::SourceSpec;
    use proptest::prelude::*;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    const FULL_APP: &str = r"
name: shop
region: nyc
disable_edge_cache: false
disable_email_obfuscation: true
enhanced_threat_control_enabled: false
features: [buildpack-stack=ubuntu-22]
domain:
  - name: shop.example.com
    type: PRIMARY
    wildcard: false
    zone: example.com
domains: [shop.example.com]
env:
  - key: LOG_LEVEL
    value: info
    scope: RUN_TIME
    type: GENERAL
alert:
  - rule: DEPLOYMENT_FAILED
    disabled: false
service:
  - name: api
    github:
      - repo: acme/api
        branch: main
    http_port: 8080
    internal_ports: [9090]
    instance_count: 2
    env:
      - key: DATABASE_URL
        value: postgres://db
        scope: RUN_TIME
        type: SECRET
    termination:
      - grace_period_seconds: 30
        drain_seconds: 15
static_site:
  - name: docs
    git:
      - repo_clone_url: https://example.com/docs.git
        branch: main
    output_dir: public
worker:
  - name: queue
    image:
      - registry_type: DOCR
        repository: queue
        tag: latest
job:
  - name: migrate
    kind: PRE_DEPLOY
    run_command: ./migrate
ingress:
  - rule:
      - match:
          - path:
              - prefix: /
        component:
          - name: api
egress:
  - type: AUTOASSIGN
";

    fn full_tree() -> ConfigMap {
        let value: ConfigValue = serde_yaml::from_str(FULL_APP).unwrap();
        let value = value.with_sets(crate::config::schema::SCHEMA.set_fields());
        value.as_map().cloned().unwrap()
    }

    #[test]
    fn test_full_app_round_trip() {
        let fields = full_tree();
        let app = Encoder::new().encode(&fields).unwrap();
        assert_eq!(app.components.len(), 4);

        let decoder = Decoder::new(DecodeContext::from_prior_state(Some(&fields)));
        assert_eq!(decoder.decode(&app), fields);
    }

    #[test]
    fn test_from_prior_state() {
        assert!(!DecodeContext::from_prior_state(None).structured_domains);
        assert!(!DecodeContext::from_prior_state(Some(&tree("domain: []\n"))).structured_domains);
        assert!(DecodeContext::from_prior_state(Some(&full_tree())).structured_domains);
    }

    #[test]
    fn test_multiple_sources_use_precedence() {
        let fields = tree(
            "name: web\ngit:\n  - repo_clone_url: https://a\ngithub:\n  - repo: acme/web\n",
        );
        let component = Encoder::new()
            .encode_component(ComponentKind::Service, &fields)
            .unwrap();
        assert!(matches!(component.base().source, Some(SourceSpec::Git(_))));
    }

    #[test]
    fn test_strict_mode_rejects_multiple_sources() {
        let fields = tree(
            "name: web\ngit:\n  - repo_clone_url: https://a\ngithub:\n  - repo: acme/web\n",
        );
        let err = Encoder::strict()
            .encode_component(ComponentKind::Service, &fields)
            .unwrap_err();
        assert_eq!(
            err,
            EncodeError::ConflictingFields {
                path: String::from("service"),
                fields: vec![String::from("git"), String::from("github")],
            }
        );
    }

    #[test]
    fn test_error_path_names_component_index() {
        let fields = tree(
            "name: shop\nworker:\n  - name: a\n  - name: b\n    termination:\n      - grace_period_seconds: 0\n",
        );
        let err = Encoder::new().encode(&fields).unwrap_err();
        assert_eq!(err.path(), "spec.worker[1].termination.grace_period_seconds");
    }

    #[test]
    fn test_component_order_within_kind_is_kept() {
        let fields = tree("name: shop\nworker:\n  - name: b\n  - name: a\n");
        let app = Encoder::new().encode(&fields).unwrap();
        let names: Vec<_> = app.components.iter().map(Component::name).collect();
        assert_eq!(names, ["b", "a"]);
    }

    fn env_tree(keys: &[String]) -> ConfigMap {
        let envs = keys
            .iter()
            .map(|key| {
                let mut env = ConfigMap::new();
                env.insert(String::from("key"), ConfigValue::from(key.as_str()));
                env.insert(String::from("value"), ConfigValue::from("v"));
                ConfigValue::Map(env)
            })
            .collect();
        let mut fields = ConfigMap::new();
        fields.insert(String::from("name"), ConfigValue::from("shop"));
        fields.insert(String::from("env"), ConfigValue::List(envs));
        fields
    }

    proptest! {
        #[test]
        fn prop_env_order_does_not_change_spec(mut keys in prop::collection::vec("[A-Z]{1,6}", 0..8)) {
            let forward = Encoder::new().encode(&env_tree(&keys)).unwrap();
            keys.reverse();
            let backward = Encoder::new().encode(&env_tree(&keys)).unwrap();
            prop_assert_eq!(&forward, &backward);

            let hasher = SpecHasher::new();
            prop_assert_eq!(hasher.hash_app(&forward), hasher.hash_app(&backward));
        }
    }
}

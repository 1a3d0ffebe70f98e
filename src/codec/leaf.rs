//! Leaf converters: environment variables and enumerated values.

use tracing::debug;

use super::canonical::{SpecHasher, canonical};
use crate::config::reader::Node;
use crate::config::value::{ConfigMap, ConfigValue, MapBuilder};
use crate::error::EncodeResult;
use crate::spec::{EnvVar, EnvVarScope, EnvVarType, WireEnum};

/// Renders an enumerated value as a tree leaf.
pub(crate) fn enum_leaf<E: WireEnum>(value: E) -> ConfigValue {
    ConfigValue::from(value.as_str())
}

/// Reads one environment variable.
///
/// Scope defaults to `RUN_AND_BUILD_TIME`; an absent or empty type reads as
/// `GENERAL`, so omitting the type and writing `GENERAL` are equivalent.
pub(crate) fn encode_env_var(node: &Node<'_>) -> EncodeResult<EnvVar> {
    Ok(EnvVar {
        key: node.str_required("key")?.to_string(),
        value: node.opt_string("value")?,
        scope: node.enum_or("scope", EnvVarScope::RunAndBuildTime)?,
        env_type: node.enum_or("type", EnvVarType::General)?,
    })
}

/// Reads the env var set stored under `key`, in canonical order.
pub(crate) fn encode_envs(node: &Node<'_>, key: &str) -> EncodeResult<Vec<EnvVar>> {
    let envs = node
        .blocks(key)?
        .iter()
        .map(encode_env_var)
        .collect::<EncodeResult<Vec<_>>>()?;
    Ok(canonical(envs))
}

/// Writes one environment variable with its scope and type materialised.
pub(crate) fn decode_env_var(env: &EnvVar) -> ConfigMap {
    MapBuilder::new()
        .field("key", env.key.as_str())
        .opt("value", env.value.as_deref())
        .field("scope", enum_leaf(env.scope))
        .field("type", enum_leaf(env.env_type))
        .build()
}

/// Writes an env var set, logging each member's hash.
pub(crate) fn decode_envs(envs: &[EnvVar]) -> Vec<ConfigMap> {
    envs.iter()
        .map(|env| {
            debug!(key = %env.key, hash = %SpecHasher::short_hash(&SpecHasher::hash_env_var(env)), "Decoded env var");
            decode_env_var(env)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reader::ExclusivePolicy;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_omitted_and_general_type_are_equivalent() {
        let omitted = tree("key: A\nvalue: x\n");
        let explicit = tree("key: A\nvalue: x\ntype: GENERAL\nscope: RUN_AND_BUILD_TIME\n");
        let a = encode_env_var(&Node::root(&omitted, "env", ExclusivePolicy::default())).unwrap();
        let b = encode_env_var(&Node::root(&explicit, "env", ExclusivePolicy::default())).unwrap();
        assert_eq!(a, b);
        assert_eq!(decode_env_var(&a)["type"], ConfigValue::from("GENERAL"));
    }

    #[test]
    fn test_env_key_required() {
        let fields = tree("value: x\n");
        let err = encode_env_var(&Node::root(&fields, "env", ExclusivePolicy::default())).unwrap_err();
        assert_eq!(err.path(), "env.key");
    }

    #[test]
    fn test_envs_are_canonically_ordered() {
        let fields = tree("env:\n  - key: B\n    value: \"2\"\n  - key: A\n    value: \"1\"\n");
        let root = Node::root(&fields, "spec", ExclusivePolicy::default());
        let envs = encode_envs(&root, "env").unwrap();
        let keys: Vec<_> = envs.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["A", "B"]);
    }
}

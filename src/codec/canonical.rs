//! Canonical forms and fingerprints for order-independent collections.
//!
//! Sets in a configuration tree (env vars, legacy domains, internal ports,
//! CORS header lists) carry no order. The encoder stores them sorted and
//! deduplicated, and the hasher folds member hashes in sorted order, so two
//! inputs listing the same members in a different order produce equal
//! specifications and equal fingerprints.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use super::{DecodeContext, Decoder};
use crate::config::value::{ConfigMap, ConfigValue, integral};
use crate::spec::{AppSpec, Component, ComponentKind, EnvVar, WireEnum};

/// Returns the members sorted and deduplicated.
pub fn canonical<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    items.into_iter().collect::<BTreeSet<T>>().into_iter().collect()
}

/// SHA-256 fingerprints of specification parts.
#[derive(Debug)]
pub struct SpecHasher {
    decoder: Decoder,
}

impl Default for SpecHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecHasher {
    /// Creates a hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: Decoder::new(DecodeContext {
                structured_domains: true,
            }),
        }
    }

    /// Hashes an env var over all four fields.
    ///
    /// Two variables that differ only in value hash differently, so a value
    /// change shows up as a remove/add pair.
    #[must_use]
    pub fn hash_env_var(env: &EnvVar) -> String {
        let mut hasher = Sha256::new();
        feed_str(&mut hasher, &env.key);
        match &env.value {
            Some(value) => {
                hasher.update([1u8]);
                feed_str(&mut hasher, value);
            }
            None => hasher.update([0u8]),
        }
        feed_str(&mut hasher, env.scope.as_str());
        feed_str(&mut hasher, env.env_type.as_str());
        hex::encode(hasher.finalize())
    }

    /// Hashes an env var set independently of member order.
    #[must_use]
    pub fn hash_env_set(envs: &[EnvVar]) -> String {
        let members = canonical(envs.iter().map(Self::hash_env_var));
        let mut hasher = Sha256::new();
        for member in &members {
            feed_str(&mut hasher, member);
        }
        hex::encode(hasher.finalize())
    }

    /// Hashes a configuration tree. Set members are visited in canonical
    /// order, so set ordering never affects the result.
    #[must_use]
    pub fn hash_tree(&self, tree: &ConfigMap) -> String {
        let mut hasher = Sha256::new();
        feed_map(&mut hasher, tree);
        hex::encode(hasher.finalize())
    }

    /// Hashes a single component.
    #[must_use]
    pub fn hash_component(&self, component: &Component) -> String {
        let mut hasher = Sha256::new();
        feed_str(&mut hasher, component.kind().key());
        feed_map(&mut hasher, &self.decoder.decode_component(component));
        hex::encode(hasher.finalize())
    }

    /// Hashes a whole application. Component order does not matter.
    #[must_use]
    pub fn hash_app(&self, app: &AppSpec) -> String {
        let mut tree = self.decoder.decode(app);
        for kind in ComponentKind::ALL {
            tree.remove(kind.key());
        }

        let mut hasher = Sha256::new();
        feed_map(&mut hasher, &tree);
        for component in canonical(app.components.iter().map(|c| self.hash_component(c))) {
            feed_str(&mut hasher, &component);
        }
        hex::encode(hasher.finalize())
    }

    /// Returns the first 8 characters of a hash, for display.
    #[must_use]
    pub fn short_hash(hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two hashes in constant time.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        if hash1.len() != hash2.len() {
            return false;
        }

        hash1
            .bytes()
            .zip(hash2.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn feed_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn feed_map(hasher: &mut Sha256, map: &ConfigMap) {
    hasher.update(b"m");
    hasher.update((map.len() as u64).to_be_bytes());
    for (key, value) in map {
        feed_str(hasher, key);
        feed_value(hasher, value);
    }
}

fn feed_int(hasher: &mut Sha256, value: i64) {
    hasher.update(b"i");
    hasher.update(value.to_be_bytes());
}

fn feed_value(hasher: &mut Sha256, value: &ConfigValue) {
    match value {
        ConfigValue::Null => hasher.update(b"n"),
        ConfigValue::Bool(b) => hasher.update(if *b { b"t" } else { b"f" }),
        ConfigValue::Int(i) => feed_int(hasher, *i),
        // Integral floats equal the matching int, so they hash the same.
        ConfigValue::Float(f) => match integral(*f) {
            Some(i) => feed_int(hasher, i),
            None => {
                hasher.update(b"d");
                hasher.update(f.to_bits().to_be_bytes());
            }
        },
        ConfigValue::String(s) => {
            hasher.update(b"s");
            feed_str(hasher, s);
        }
        ConfigValue::List(items) => {
            hasher.update(b"l");
            hasher.update((items.len() as u64).to_be_bytes());
            items.iter().for_each(|v| feed_value(hasher, v));
        }
        // BTreeSet iteration is already in canonical order.
        ConfigValue::Set(items) => {
            hasher.update(b"e");
            hasher.update((items.len() as u64).to_be_bytes());
            items.iter().for_each(|v| feed_value(hasher, v));
        }
        ConfigValue::Map(map) => feed_map(hasher, map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnvVarScope, EnvVarType};
    use proptest::prelude::*;

    fn env(key: &str, value: &str) -> EnvVar {
        EnvVar::new(key, value)
    }

    #[test]
    fn test_env_hash_covers_value() {
        let a = SpecHasher::hash_env_var(&env("DB_URL", "postgres://a"));
        let b = SpecHasher::hash_env_var(&env("DB_URL", "postgres://b"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_env_hash_covers_scope_and_type() {
        let base = env("TOKEN", "x");
        let secret = EnvVar {
            env_type: EnvVarType::Secret,
            ..base.clone()
        };
        let build_only = EnvVar {
            scope: EnvVarScope::BuildTime,
            ..base.clone()
        };
        let base_hash = SpecHasher::hash_env_var(&base);
        assert_ne!(base_hash, SpecHasher::hash_env_var(&secret));
        assert_ne!(base_hash, SpecHasher::hash_env_var(&build_only));
    }

    #[test]
    fn test_canonical_sorts_and_dedups() {
        assert_eq!(canonical([3, 1, 3, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn test_short_hash() {
        let short = SpecHasher::short_hash("abcdef1234567890abcdef1234567890");
        assert_eq!(short, "abcdef12");
    }

    #[test]
    fn test_hashes_match() {
        assert!(SpecHasher::hashes_match("abc123", "abc123"));
        assert!(!SpecHasher::hashes_match("abc123", "abc124"));
        assert!(!SpecHasher::hashes_match("abc123", "abc12"));
    }

    #[test]
    fn test_tree_hash_ignores_set_order() {
        let hasher = SpecHasher::new();
        let mut a = ConfigMap::new();
        a.insert(String::from("features"), ConfigValue::set(["buildpack-stack=ubuntu-22", "x"]));
        let mut b = ConfigMap::new();
        b.insert(String::from("features"), ConfigValue::set(["x", "buildpack-stack=ubuntu-22"]));
        assert_eq!(hasher.hash_tree(&a), hasher.hash_tree(&b));
    }

    #[test]
    fn test_tree_hash_treats_integral_float_as_int() {
        let hasher = SpecHasher::new();
        let mut a = ConfigMap::new();
        a.insert(String::from("value"), ConfigValue::Int(80));
        let mut b = ConfigMap::new();
        b.insert(String::from("value"), ConfigValue::Float(80.0));
        assert_eq!(a, b);
        assert_eq!(hasher.hash_tree(&a), hasher.hash_tree(&b));

        b.insert(String::from("value"), ConfigValue::Float(80.5));
        assert_ne!(hasher.hash_tree(&a), hasher.hash_tree(&b));
    }

    proptest! {
        #[test]
        fn prop_env_set_hash_is_order_independent(
            keys in proptest::collection::btree_set("[A-Z]{1,8}", 1..8),
            rotate in 0usize..8,
        ) {
            let envs: Vec<EnvVar> = keys.iter().map(|k| env(k, "v")).collect();
            let mut shuffled = envs.clone();
            let by = rotate % shuffled.len();
            shuffled.rotate_left(by);
            shuffled.reverse();
            prop_assert_eq!(SpecHasher::hash_env_set(&envs), SpecHasher::hash_env_set(&shuffled));
        }

        #[test]
        fn prop_env_hash_separates_values(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
            prop_assume!(a != b);
            let left = SpecHasher::hash_env_var(&env("KEY", &a));
            let right = SpecHasher::hash_env_var(&env("KEY", &b));
            prop_assert_ne!(left, right);
        }
    }
}

//! Loosely-typed configuration tree values.
//!
//! A configuration tree is what an operator declares: nested maps of named
//! fields whose leaves are scalars, ordered lists of sub-trees, or unordered
//! sets. Sets are kept in a `BTreeSet` so two trees listing the same members
//! in a different order compare equal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A map of named fields.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single node of the configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Explicit null, treated as absent.
    Null,
    /// Boolean leaf.
    Bool(bool),
    /// Integer leaf.
    Int(i64),
    /// Floating point leaf.
    Float(f64),
    /// String leaf.
    String(String),
    /// Ordered list of values.
    List(Vec<ConfigValue>),
    /// Unordered set of values.
    Set(BTreeSet<ConfigValue>),
    /// Map of named fields.
    Map(ConfigMap),
}

impl ConfigValue {
    /// Builds a set from any collection of values.
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a list from any collection of values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Wraps a map as a single-item block, the shape used for nested blocks.
    #[must_use]
    pub fn block(fields: ConfigMap) -> Self {
        Self::List(vec![Self::Map(fields)])
    }

    /// Returns a short name for the value's shape, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    /// Returns true for an explicit null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the map, if this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the members of a list or set, in iteration order.
    #[must_use]
    pub fn members(&self) -> Option<Vec<&Self>> {
        match self {
            Self::List(items) => Some(items.iter().collect()),
            Self::Set(items) => Some(items.iter().collect()),
            _ => None,
        }
    }

    /// Recursively converts lists stored under any of `set_keys` into sets.
    ///
    /// Parsed YAML and JSON have no notion of sets, so the parser uses this
    /// to restore set semantics for fields the schema declares as unordered.
    #[must_use]
    pub fn with_sets(self, set_keys: &BTreeSet<&'static str>) -> Self {
        match self {
            Self::Map(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| {
                        let value = value.with_sets(set_keys);
                        let value = match value {
                            Self::List(items) if set_keys.contains(key.as_str()) => {
                                Self::Set(items.into_iter().collect())
                            }
                            other => other,
                        };
                        (key, value)
                    })
                    .collect(),
            ),
            Self::List(items) => {
                Self::List(items.into_iter().map(|v| v.with_sets(set_keys)).collect())
            }
            Self::Set(items) => Self::Set(items.into_iter().map(|v| v.with_sets(set_keys)).collect()),
            other => other,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::List(_) => 4,
            Self::Set(_) => 5,
            Self::Map(_) => 6,
        }
    }
}

/// Returns the integer an integral float stands for, if it fits in `i64`.
///
/// `-0.0` maps to `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn integral(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.is_finite() && value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value))
        .then(|| value as i64)
}

// Non-NaN floats compare numerically, so `-0.0 == 0.0`. NaNs fall back to
// `total_cmp`, which puts them past either infinity by sign.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

// Exact comparison: no rounding of the integer through `f64`.
#[allow(clippy::cast_possible_truncation)]
fn cmp_int_float(int: i64, float: f64) -> Ordering {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= LIMIT {
        return Ordering::Less;
    }
    if float < -LIMIT {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    int.cmp(&(whole as i64)).then_with(|| cmp_floats(whole, float))
}

// Total order so values can live inside sets. Ints and floats compare by
// numeric value, so `80` and `80.0` are the same leaf.
impl Ord for ConfigValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => cmp_floats(*a, *b),
            (Self::Int(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for ConfigValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ConfigValue {}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for ConfigValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        Self::List(value)
    }
}

/// Incremental builder for decoded maps.
///
/// Optional and empty values are skipped, so decoded trees only carry the
/// fields the specification actually populates.
#[derive(Debug, Default)]
pub struct MapBuilder {
    fields: ConfigMap,
}

impl MapBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: ConfigMap::new(),
        }
    }

    /// Sets a field unconditionally.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Sets a field when the value is present.
    #[must_use]
    pub fn opt<V: Into<ConfigValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Sets a single-item block when present.
    #[must_use]
    pub fn block(self, key: &str, value: Option<ConfigMap>) -> Self {
        match value {
            Some(fields) => self.field(key, ConfigValue::block(fields)),
            None => self,
        }
    }

    /// Sets an ordered list when it is not empty.
    #[must_use]
    pub fn list(self, key: &str, items: Vec<ConfigValue>) -> Self {
        if items.is_empty() {
            self
        } else {
            self.field(key, ConfigValue::List(items))
        }
    }

    /// Sets an unordered set when it is not empty.
    #[must_use]
    pub fn set<I, V>(self, key: &str, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ConfigValue>,
    {
        let members: BTreeSet<ConfigValue> = items.into_iter().map(Into::into).collect();
        if members.is_empty() {
            self
        } else {
            self.field(key, ConfigValue::Set(members))
        }
    }

    /// Copies all fields of another map into this one.
    #[must_use]
    pub fn merge(mut self, other: ConfigMap) -> Self {
        self.fields.extend(other);
        self
    }

    /// Finishes the map.
    #[must_use]
    pub fn build(self) -> ConfigMap {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_ignore_insertion_order() {
        let a = ConfigValue::set(["b", "a", "c"]);
        let b = ConfigValue::set(["c", "b", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_lists_respect_order() {
        let a = ConfigValue::list(["a", "b"]);
        let b = ConfigValue::list(["b", "a"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_float_ordering_is_total() {
        let mut values = BTreeSet::new();
        values.insert(ConfigValue::Float(f64::NAN));
        values.insert(ConfigValue::Float(1.5));
        values.insert(ConfigValue::Float(f64::NAN));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_integral_float_equals_int() {
        assert_eq!(ConfigValue::Int(80), ConfigValue::Float(80.0));
        assert_eq!(ConfigValue::Float(0.0), ConfigValue::Float(-0.0));
        assert!(ConfigValue::Int(80) < ConfigValue::Float(80.5));
        assert!(ConfigValue::Int(-1) > ConfigValue::Float(-1.5));
        assert!(ConfigValue::Int(i64::MAX) < ConfigValue::Float(1e19));
        assert!(ConfigValue::Int(0) < ConfigValue::Float(f64::NAN));

        let set = ConfigValue::set([ConfigValue::Int(3), ConfigValue::Float(3.0)]);
        assert_eq!(set.members().map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_integral() {
        assert_eq!(integral(80.0), Some(80));
        assert_eq!(integral(-0.0), Some(0));
        assert_eq!(integral(80.5), None);
        assert_eq!(integral(f64::NAN), None);
        assert_eq!(integral(1e19), None);
    }

    #[test]
    fn test_with_sets_converts_only_declared_keys() {
        let yaml = r"
env:
  - key: B
  - key: A
routes:
  - path: /b
  - path: /a
";
        let value: ConfigValue = serde_yaml::from_str(yaml).unwrap();
        let keys: BTreeSet<&'static str> = ["env"].into_iter().collect();
        let value = value.with_sets(&keys);
        let map = value.as_map().unwrap();
        assert_eq!(map["env"].kind_name(), "set");
        assert_eq!(map["routes"].kind_name(), "list");
    }

    #[test]
    fn test_untagged_parse_shapes() {
        let value: ConfigValue =
            serde_json::from_str(r#"{"a": 1, "b": 1.5, "c": "x", "d": null, "e": [true]}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], ConfigValue::Int(1));
        assert_eq!(map["b"], ConfigValue::Float(1.5));
        assert_eq!(map["c"], ConfigValue::from("x"));
        assert!(map["d"].is_null());
        assert_eq!(map["e"], ConfigValue::list([true]));
    }

    #[test]
    fn test_map_builder_skips_empty() {
        let map = MapBuilder::new()
            .field("name", "web")
            .opt::<String>("region", None)
            .list("routes", vec![])
            .set::<Vec<String>, String>("domains", vec![])
            .block("image", None)
            .build();
        assert_eq!(map.len(), 1);
        assert_eq!(map["name"], ConfigValue::from("web"));
    }
}

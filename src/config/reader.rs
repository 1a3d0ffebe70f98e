//! Path-aware typed access to configuration trees.
//!
//! Every accessor returns an [`EncodeError`] naming the full field path when
//! a value has the wrong shape, is out of range or is missing. Explicit
//! nulls read as absent. Values are never coerced between shapes, with one
//! exception: an integer is accepted where a float is expected.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::path::FieldPath;
use super::schema::IntRange;
use super::value::{ConfigMap, ConfigValue};
use crate::error::{EncodeError, EncodeResult};
use crate::spec::WireEnum;

/// How to treat mutually exclusive alternatives that are set together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusivePolicy {
    /// Use the first populated alternative in declaration order and ignore
    /// the rest.
    #[default]
    FirstPresent,
    /// Fail with [`EncodeError::ConflictingFields`].
    Reject,
}

/// A map node of a configuration tree, with its location.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    fields: &'a ConfigMap,
    path: FieldPath,
    policy: ExclusivePolicy,
}

impl<'a> Node<'a> {
    /// Creates the root node of a tree.
    #[must_use]
    pub fn root(fields: &'a ConfigMap, name: &str, policy: ExclusivePolicy) -> Self {
        Self {
            fields,
            path: FieldPath::root(name),
            policy,
        }
    }

    /// Returns the node's location.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the raw fields of the node.
    #[must_use]
    pub const fn fields(&self) -> &'a ConfigMap {
        self.fields
    }

    /// Returns the rendered path of a child field.
    #[must_use]
    pub fn at(&self, key: &str) -> String {
        self.path.key(key).to_string()
    }

    fn child(&self, fields: &'a ConfigMap, path: FieldPath) -> Self {
        Self {
            fields,
            path,
            policy: self.policy,
        }
    }

    fn get(&self, key: &str) -> Option<&'a ConfigValue> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &ConfigValue) -> EncodeError {
        EncodeError::TypeMismatch {
            path: self.at(key),
            expected,
            found: found.kind_name(),
        }
    }

    /// Returns true if the field is set to something other than null or an
    /// empty collection.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(ConfigValue::List(items)) => items.iter().any(|v| !v.is_null()),
            Some(ConfigValue::Set(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Reads an optional string.
    pub fn opt_str(&self, key: &str) -> EncodeResult<Option<&'a str>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.mismatch(key, "string", other)),
        }
    }

    /// Reads an optional string as an owned value.
    pub fn opt_string(&self, key: &str) -> EncodeResult<Option<String>> {
        Ok(self.opt_str(key)?.map(str::to_string))
    }

    /// Reads a required, non-empty string.
    pub fn str_required(&self, key: &str) -> EncodeResult<&'a str> {
        match self.opt_str(key)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(EncodeError::MissingRequired { path: self.at(key) }),
        }
    }

    /// Reads an optional boolean.
    pub fn opt_bool(&self, key: &str) -> EncodeResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.mismatch(key, "bool", other)),
        }
    }

    /// Reads a boolean, falling back to a declared default.
    pub fn bool_or(&self, key: &str, default: bool) -> EncodeResult<bool> {
        Ok(self.opt_bool(key)?.unwrap_or(default))
    }

    /// Reads an optional integer.
    pub fn opt_int(&self, key: &str) -> EncodeResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(self.mismatch(key, "int", other)),
        }
    }

    /// Reads an optional integer that must fall in `range`.
    pub fn opt_int_in(&self, key: &str, range: IntRange) -> EncodeResult<Option<i64>> {
        let Some(value) = self.opt_int(key)? else {
            return Ok(None);
        };
        if range.contains(value) {
            Ok(Some(value))
        } else {
            Err(EncodeError::OutOfRange {
                path: self.at(key),
                value,
                min: range.min,
                max: range.max,
            })
        }
    }

    /// Reads a required integer that must fall in `range`.
    pub fn int_in_required(&self, key: &str, range: IntRange) -> EncodeResult<i64> {
        self.opt_int_in(key, range)?
            .ok_or_else(|| EncodeError::MissingRequired { path: self.at(key) })
    }

    /// Reads an optional integer that must fall in `range` and fit in 32 bits.
    pub fn opt_i32_in(&self, key: &str, range: IntRange) -> EncodeResult<Option<i32>> {
        let narrow = IntRange::new(
            range.min.max(i64::from(i32::MIN)),
            range.max.min(i64::from(i32::MAX)),
        );
        let Some(value) = self.opt_int_in(key, narrow)? else {
            return Ok(None);
        };
        i32::try_from(value).map(Some).map_err(|_| EncodeError::OutOfRange {
            path: self.at(key),
            value,
            min: narrow.min,
            max: narrow.max,
        })
    }

    /// Reads an optional 32-bit integer.
    pub fn opt_i32(&self, key: &str) -> EncodeResult<Option<i32>> {
        self.opt_i32_in(key, IntRange::new(i64::from(i32::MIN), i64::from(i32::MAX)))
    }

    /// Reads an optional float. Integers widen to floats.
    #[allow(clippy::cast_precision_loss)]
    pub fn opt_float(&self, key: &str) -> EncodeResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Float(f)) => Ok(Some(*f)),
            Some(ConfigValue::Int(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(self.mismatch(key, "float", other)),
        }
    }

    /// Reads an optional enumerated value.
    pub fn opt_enum<E: WireEnum>(&self, key: &str) -> EncodeResult<Option<E>> {
        let Some(raw) = self.opt_str(key)? else {
            return Ok(None);
        };
        E::parse(raw)
            .map(Some)
            .ok_or_else(|| EncodeError::InvalidEnum {
                path: self.at(key),
                value: raw.to_string(),
                allowed: E::allowed(),
            })
    }

    /// Reads an enumerated value. Absent and empty both read as `default`.
    pub fn enum_or<E: WireEnum>(&self, key: &str, default: E) -> EncodeResult<E> {
        if self.opt_str(key)?.is_some_and(str::is_empty) {
            return Ok(default);
        }
        Ok(self.opt_enum(key)?.unwrap_or(default))
    }

    /// Reads a required enumerated value.
    pub fn enum_required<E: WireEnum>(&self, key: &str) -> EncodeResult<E> {
        self.opt_enum(key)?
            .ok_or_else(|| EncodeError::MissingRequired { path: self.at(key) })
    }

    fn members(&self, key: &str) -> EncodeResult<Vec<&'a ConfigValue>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(value) => match value.members() {
                Some(items) => Ok(items.into_iter().filter(|v| !v.is_null()).collect()),
                None => Err(self.mismatch(key, "list", value)),
            },
        }
    }

    /// Reads a list or set of strings.
    pub fn strings(&self, key: &str) -> EncodeResult<Vec<&'a str>> {
        self.members(key)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                ConfigValue::String(s) => Ok(s.as_str()),
                other => Err(EncodeError::TypeMismatch {
                    path: self.path.key(key).index(i).to_string(),
                    expected: "string",
                    found: other.kind_name(),
                }),
            })
            .collect()
    }

    /// Reads a list or set of integers, each within `range`.
    pub fn ints(&self, key: &str, range: IntRange) -> EncodeResult<Vec<i64>> {
        self.members(key)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let path = self.path.key(key).index(i).to_string();
                match value {
                    ConfigValue::Int(v) if range.contains(*v) => Ok(*v),
                    ConfigValue::Int(v) => Err(EncodeError::OutOfRange {
                        path,
                        value: *v,
                        min: range.min,
                        max: range.max,
                    }),
                    other => Err(EncodeError::TypeMismatch {
                        path,
                        expected: "int",
                        found: other.kind_name(),
                    }),
                }
            })
            .collect()
    }

    /// Reads an optional nested block.
    ///
    /// A block is either a map or a list holding at most one map.
    pub fn block(&self, key: &str) -> EncodeResult<Option<Self>> {
        let path = self.path.key(key);
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Map(fields)) => Ok(Some(self.child(fields, path))),
            Some(value) => {
                let Some(items) = value.members() else {
                    return Err(self.mismatch(key, "block", value));
                };
                let items: Vec<&'a ConfigValue> =
                    items.into_iter().filter(|v| !v.is_null()).collect();
                if items.len() > 1 {
                    return Err(EncodeError::TooManyItems {
                        path: path.to_string(),
                        max: 1,
                        found: items.len(),
                    });
                }
                match items.first().copied() {
                    None => Ok(None),
                    Some(ConfigValue::Map(fields)) => Ok(Some(self.child(fields, path))),
                    Some(other) => Err(EncodeError::TypeMismatch {
                        path: path.to_string(),
                        expected: "map",
                        found: other.kind_name(),
                    }),
                }
            }
        }
    }

    /// Reads a required nested block.
    pub fn block_required(&self, key: &str) -> EncodeResult<Self> {
        self.block(key)?
            .ok_or_else(|| EncodeError::MissingRequired { path: self.at(key) })
    }

    /// Reads a repeated block: a list or set of maps.
    pub fn blocks(&self, key: &str) -> EncodeResult<Vec<Self>> {
        self.members(key)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let path = self.path.key(key).index(i);
                match value {
                    ConfigValue::Map(fields) => Ok(self.child(fields, path)),
                    other => Err(EncodeError::TypeMismatch {
                        path: path.to_string(),
                        expected: "map",
                        found: other.kind_name(),
                    }),
                }
            })
            .collect()
    }

    /// Selects one of several mutually exclusive fields.
    ///
    /// Returns the first populated key in `keys` order. When more than one
    /// is populated the node's [`ExclusivePolicy`] decides between logging
    /// the ignored keys and failing.
    pub fn exclusive(&self, keys: &[&'static str]) -> EncodeResult<Option<&'static str>> {
        let present: Vec<&'static str> = keys.iter().copied().filter(|k| self.has(k)).collect();
        let Some((&chosen, ignored)) = present.split_first() else {
            return Ok(None);
        };
        if ignored.is_empty() {
            return Ok(Some(chosen));
        }
        match self.policy {
            ExclusivePolicy::Reject => Err(EncodeError::ConflictingFields {
                path: self.path.to_string(),
                fields: present.iter().map(|k| (*k).to_string()).collect(),
            }),
            ExclusivePolicy::FirstPresent => {
                warn!(
                    path = %self.path,
                    chosen,
                    ignored = ?ignored,
                    "Multiple exclusive fields set, using the first"
                );
                Ok(Some(chosen))
            }
        }
    }
}

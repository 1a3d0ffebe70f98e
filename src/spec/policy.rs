//! Runtime policies attached to components: health checks, CORS, routes,
//! autoscaling and termination.

use serde::{Deserialize, Serialize};

/// HTTP health check of a service.
///
/// Unset fields fall back to defaults chosen by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HealthCheckSpec {
    /// Route path pinged by the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,
    /// Seconds to wait before the first check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<i32>,
    /// Seconds between checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<i32>,
    /// Seconds before a check times out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,
    /// Consecutive successes before healthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<i32>,
    /// Consecutive failures before unhealthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<i32>,
    /// Port checked; defaults to the HTTP port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

/// A string matcher used for CORS origins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StringMatch {
    /// Exact match.
    Exact(String),
    /// Prefix match. Deprecated in favour of `Regex`.
    Prefix(String),
    /// RE2 regular expression match.
    Regex(String),
}

impl StringMatch {
    /// Config-tree keys of the match kinds, in encode order.
    pub const KEYS: [&'static str; 3] = ["exact", "prefix", "regex"];

    /// Builds the match kind stored under `key`, if `key` names one.
    #[must_use]
    pub fn from_key(key: &str, pattern: String) -> Option<Self> {
        match key {
            "exact" => Some(Self::Exact(pattern)),
            "prefix" => Some(Self::Prefix(pattern)),
            "regex" => Some(Self::Regex(pattern)),
            _ => None,
        }
    }

    /// Returns the config-tree key of this match kind.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Prefix(_) => "prefix",
            Self::Regex(_) => "regex",
        }
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Exact(p) | Self::Prefix(p) | Self::Regex(p) => p,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorsPolicy {
    /// Allowed origins. Each populated match kind becomes one entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_origins: Vec<StringMatch>,
    /// Allowed methods, canonically sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_methods: Vec<String>,
    /// Allowed request headers, canonically sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_headers: Vec<String>,
    /// Response headers exposed to browsers, canonically sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expose_headers: Vec<String>,
    /// Preflight cache duration, e.g. `5h30m`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
    /// Whether credentials mode `include` is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
}

/// Deprecated component-level HTTP route.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteSpec {
    /// Path prefix routed to the component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether the prefix is forwarded to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_path_prefix: Option<bool>,
}

/// Autoscaling policy of a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AutoscalingSpec {
    /// Minimum instance count, at least 1.
    pub min_instance_count: i64,
    /// Maximum instance count, at least 1.
    pub max_instance_count: i64,
    /// Metrics the component scales on.
    pub metrics: AutoscalingMetrics,
}

/// Scaling metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AutoscalingMetrics {
    /// CPU utilization target.
    pub cpu: CpuMetric,
}

/// CPU utilization target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CpuMetric {
    /// Average target utilization, 1 to 100.
    pub percent: i64,
}

/// Component kinds that carry a termination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationKind {
    /// Service termination: grace period and drain period.
    Service,
    /// Worker termination: grace period only.
    Worker,
    /// Job termination: grace period only.
    Job,
}

/// The union of all termination fields, used to move values between the
/// kind-specific policy types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminationFields {
    /// Seconds between TERM and KILL.
    pub grace_period_seconds: Option<i32>,
    /// Seconds between selecting an instance for termination and TERM.
    pub drain_seconds: Option<i32>,
}

/// A termination policy shape bound to one component kind.
pub trait TerminationShape: Sized {
    /// The component kind this shape belongs to.
    const KIND: TerminationKind;

    /// Builds the policy, dropping fields this kind does not carry.
    fn from_fields(fields: TerminationFields) -> Self;

    /// Returns the policy's fields.
    fn fields(&self) -> TerminationFields;
}

/// Termination policy of a service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTermination {
    /// Seconds between TERM and KILL, 1 to 600.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<i32>,
    /// Seconds of load-balancer drain before TERM, 1 to 110.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_seconds: Option<i32>,
}

/// Termination policy of a worker.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerTermination {
    /// Seconds between TERM and KILL, 1 to 600.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<i32>,
}

/// Termination policy of a job.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobTermination {
    /// Seconds between TERM and KILL, 1 to 600.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<i32>,
}

impl TerminationShape for ServiceTermination {
    const KIND: TerminationKind = TerminationKind::Service;

    fn from_fields(fields: TerminationFields) -> Self {
        Self {
            grace_period_seconds: fields.grace_period_seconds,
            drain_seconds: fields.drain_seconds,
        }
    }

    fn fields(&self) -> TerminationFields {
        TerminationFields {
            grace_period_seconds: self.grace_period_seconds,
            drain_seconds: self.drain_seconds,
        }
    }
}

impl TerminationShape for WorkerTermination {
    const KIND: TerminationKind = TerminationKind::Worker;

    fn from_fields(fields: TerminationFields) -> Self {
        Self {
            grace_period_seconds: fields.grace_period_seconds,
        }
    }

    fn fields(&self) -> TerminationFields {
        TerminationFields {
            grace_period_seconds: self.grace_period_seconds,
            drain_seconds: None,
        }
    }
}

impl TerminationShape for JobTermination {
    const KIND: TerminationKind = TerminationKind::Job;

    fn from_fields(fields: TerminationFields) -> Self {
        Self {
            grace_period_seconds: fields.grace_period_seconds,
        }
    }

    fn fields(&self) -> TerminationFields {
        TerminationFields {
            grace_period_seconds: self.grace_period_seconds,
            drain_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_termination_drops_drain() {
        let fields = TerminationFields {
            grace_period_seconds: Some(30),
            drain_seconds: Some(20),
        };
        let worker = WorkerTermination::from_fields(fields);
        assert_eq!(worker.fields().drain_seconds, None);
        assert_eq!(worker.fields().grace_period_seconds, Some(30));

        let service = ServiceTermination::from_fields(fields);
        assert_eq!(service.fields(), fields);
    }

    #[test]
    fn test_string_match_pattern() {
        let m = StringMatch::Regex(String::from("^https://.*\\.example\\.com$"));
        assert_eq!(m.key(), "regex");
        assert!(m.pattern().starts_with('^'));
    }

    #[test]
    fn test_from_key_matches_keys() {
        for key in StringMatch::KEYS {
            let m = StringMatch::from_key(key, String::from("x")).unwrap();
            assert_eq!(m.key(), key);
        }
        assert_eq!(StringMatch::from_key("glob", String::from("x")), None);
    }
}

//! Enumerated leaf values of the deployment specification.
//!
//! Every enum serializes to the upper-case wire names the orchestration API
//! uses, and implements [`WireEnum`] so the tree reader can parse and
//! validate the same names.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// An enumeration with a fixed set of wire names.
pub trait WireEnum: Copy + Sized + 'static {
    /// All variants, in declaration order.
    const VARIANTS: &'static [Self];

    /// Returns the wire name of the variant.
    fn as_str(self) -> &'static str;

    /// Parses a wire name, returning `None` for unknown values.
    fn parse(value: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.as_str() == value)
    }

    /// Returns the accepted wire names joined by commas.
    fn allowed() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Component kinds of an application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Long-running service.
    Service,
    /// Static asset site.
    StaticSite,
    /// Background worker.
    Worker,
    /// One-shot job.
    Job,
    /// Function bundle.
    Function,
}

impl ComponentKind {
    /// All component kinds, in the order the config tree lists them.
    pub const ALL: [Self; 5] = [
        Self::Service,
        Self::StaticSite,
        Self::Worker,
        Self::Job,
        Self::Function,
    ];

    /// Returns the config-tree key holding components of this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::StaticSite => "static_site",
            Self::Worker => "worker",
            Self::Job => "job",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Type of a custom domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainType {
    /// Default app domain.
    Default,
    /// Primary domain.
    Primary,
    /// Alias domain.
    Alias,
}

impl WireEnum for DomainType {
    const VARIANTS: &'static [Self] = &[Self::Default, Self::Primary, Self::Alias];

    fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Primary => "PRIMARY",
            Self::Alias => "ALIAS",
        }
    }
}

/// Visibility scope of an environment variable.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvVarScope {
    /// Explicitly unset.
    Unset,
    /// Available at run time only.
    RunTime,
    /// Available at build time only.
    BuildTime,
    /// Available at run and build time.
    #[default]
    RunAndBuildTime,
}

impl WireEnum for EnvVarScope {
    const VARIANTS: &'static [Self] = &[
        Self::Unset,
        Self::RunTime,
        Self::BuildTime,
        Self::RunAndBuildTime,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "UNSET",
            Self::RunTime => "RUN_TIME",
            Self::BuildTime => "BUILD_TIME",
            Self::RunAndBuildTime => "RUN_AND_BUILD_TIME",
        }
    }
}

/// Type of an environment variable.
///
/// The API does not always return a type for general variables, so an empty
/// or missing value deserializes to [`EnvVarType::General`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvVarType {
    /// Plain variable.
    #[default]
    General,
    /// Encrypted secret.
    Secret,
}

impl WireEnum for EnvVarType {
    const VARIANTS: &'static [Self] = &[Self::General, Self::Secret];

    fn as_str(self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Secret => "SECRET",
        }
    }
}

impl<'de> Deserialize<'de> for EnvVarType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(Self::General),
            Some(value) => Self::parse(value).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "invalid env var type '{value}', expected one of: {}",
                    Self::allowed()
                ))
            }),
        }
    }
}

/// Container registry type of an image reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryType {
    /// Unspecified registry.
    Unspecified,
    /// Docker Hub.
    DockerHub,
    /// The platform's own container registry.
    Docr,
    /// GitHub container registry.
    Ghcr,
}

impl WireEnum for RegistryType {
    const VARIANTS: &'static [Self] = &[Self::Unspecified, Self::DockerHub, Self::Docr, Self::Ghcr];

    fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::DockerHub => "DOCKER_HUB",
            Self::Docr => "DOCR",
            Self::Ghcr => "GHCR",
        }
    }
}

/// When a job runs during a deployment.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    /// Not specified; treated as pre-deploy by the platform.
    #[default]
    Unspecified,
    /// Runs before the deployment goes live.
    PreDeploy,
    /// Runs after the deployment goes live.
    PostDeploy,
    /// Runs when a deployment fails.
    FailedDeploy,
}

impl WireEnum for JobKind {
    const VARIANTS: &'static [Self] = &[
        Self::Unspecified,
        Self::PreDeploy,
        Self::PostDeploy,
        Self::FailedDeploy,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::PreDeploy => "PRE_DEPLOY",
            Self::PostDeploy => "POST_DEPLOY",
            Self::FailedDeploy => "FAILED_DEPLOY",
        }
    }
}

/// Rule that triggers an alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertRule {
    /// Unspecified component rule.
    UnspecifiedRule,
    /// CPU utilization threshold.
    CpuUtilization,
    /// Memory utilization threshold.
    MemUtilization,
    /// Container restart count threshold.
    RestartCount,
    /// A deployment failed.
    DeploymentFailed,
    /// A deployment went live.
    DeploymentLive,
    /// A deployment started.
    DeploymentStarted,
    /// A deployment was canceled.
    DeploymentCanceled,
    /// Domain configuration failed.
    DomainFailed,
    /// Domain went live.
    DomainLive,
}

impl WireEnum for AlertRule {
    const VARIANTS: &'static [Self] = &[
        Self::UnspecifiedRule,
        Self::CpuUtilization,
        Self::MemUtilization,
        Self::RestartCount,
        Self::DeploymentFailed,
        Self::DeploymentLive,
        Self::DeploymentStarted,
        Self::DeploymentCanceled,
        Self::DomainFailed,
        Self::DomainLive,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::UnspecifiedRule => "UNSPECIFIED_RULE",
            Self::CpuUtilization => "CPU_UTILIZATION",
            Self::MemUtilization => "MEM_UTILIZATION",
            Self::RestartCount => "RESTART_COUNT",
            Self::DeploymentFailed => "DEPLOYMENT_FAILED",
            Self::DeploymentLive => "DEPLOYMENT_LIVE",
            Self::DeploymentStarted => "DEPLOYMENT_STARTED",
            Self::DeploymentCanceled => "DEPLOYMENT_CANCELED",
            Self::DomainFailed => "DOMAIN_FAILED",
            Self::DomainLive => "DOMAIN_LIVE",
        }
    }
}

impl AlertRule {
    /// Rules accepted on app-level alerts.
    pub const APP_LEVEL: &'static [Self] = &[
        Self::DeploymentFailed,
        Self::DeploymentLive,
        Self::DeploymentStarted,
        Self::DeploymentCanceled,
        Self::DomainFailed,
        Self::DomainLive,
    ];

    /// Rules accepted on component-level alerts.
    pub const COMPONENT_LEVEL: &'static [Self] = &[
        Self::UnspecifiedRule,
        Self::CpuUtilization,
        Self::MemUtilization,
        Self::RestartCount,
    ];
}

/// Comparison operator of a metric alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertOperator {
    /// Unspecified operator.
    UnspecifiedOperator,
    /// Fires when the metric exceeds the threshold.
    GreaterThan,
    /// Fires when the metric drops below the threshold.
    LessThan,
}

impl WireEnum for AlertOperator {
    const VARIANTS: &'static [Self] = &[Self::UnspecifiedOperator, Self::GreaterThan, Self::LessThan];

    fn as_str(self) -> &'static str {
        match self {
            Self::UnspecifiedOperator => "UNSPECIFIED_OPERATOR",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
        }
    }
}

/// Evaluation window of a metric alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertWindow {
    /// Unspecified window.
    UnspecifiedWindow,
    /// Five minutes.
    FiveMinutes,
    /// Ten minutes.
    TenMinutes,
    /// Thirty minutes.
    ThirtyMinutes,
    /// One hour.
    OneHour,
}

impl WireEnum for AlertWindow {
    const VARIANTS: &'static [Self] = &[
        Self::UnspecifiedWindow,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::UnspecifiedWindow => "UNSPECIFIED_WINDOW",
            Self::FiveMinutes => "FIVE_MINUTES",
            Self::TenMinutes => "TEN_MINUTES",
            Self::ThirtyMinutes => "THIRTY_MINUTES",
            Self::OneHour => "ONE_HOUR",
        }
    }
}

/// Managed database engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseEngine {
    /// Engine not set.
    Unset,
    /// `MySQL`.
    Mysql,
    /// `PostgreSQL`.
    Pg,
    /// Redis.
    Redis,
    /// `MongoDB`.
    Mongodb,
    /// Kafka.
    Kafka,
    /// `OpenSearch`.
    Opensearch,
}

impl WireEnum for DatabaseEngine {
    const VARIANTS: &'static [Self] = &[
        Self::Unset,
        Self::Mysql,
        Self::Pg,
        Self::Redis,
        Self::Mongodb,
        Self::Kafka,
        Self::Opensearch,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "UNSET",
            Self::Mysql => "MYSQL",
            Self::Pg => "PG",
            Self::Redis => "REDIS",
            Self::Mongodb => "MONGODB",
            Self::Kafka => "KAFKA",
            Self::Opensearch => "OPENSEARCH",
        }
    }
}

/// Outbound traffic mode of an application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EgressType {
    /// Shared, automatically assigned addresses.
    Autoassign,
    /// Dedicated egress IP addresses.
    DedicatedIp,
}

impl WireEnum for EgressType {
    const VARIANTS: &'static [Self] = &[Self::Autoassign, Self::DedicatedIp];

    fn as_str(self) -> &'static str {
        match self {
            Self::Autoassign => "AUTOASSIGN",
            Self::DedicatedIp => "DEDICATED_IP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for scope in EnvVarScope::VARIANTS {
            let json = serde_json::to_string(scope).unwrap();
            assert_eq!(json, format!("\"{}\"", scope.as_str()));
        }
        for rule in AlertRule::VARIANTS {
            let json = serde_json::to_string(rule).unwrap();
            assert_eq!(json, format!("\"{}\"", rule.as_str()));
        }
        for registry in RegistryType::VARIANTS {
            let json = serde_json::to_string(registry).unwrap();
            assert_eq!(json, format!("\"{}\"", registry.as_str()));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(JobKind::parse("PRE_DEPLOY"), Some(JobKind::PreDeploy));
        assert_eq!(JobKind::parse("pre_deploy"), None);
        assert_eq!(EgressType::allowed(), "AUTOASSIGN, DEDICATED_IP");
    }

    #[test]
    fn test_env_type_empty_reads_as_general() {
        let empty: EnvVarType = serde_json::from_str("\"\"").unwrap();
        let null: EnvVarType = serde_json::from_str("null").unwrap();
        let secret: EnvVarType = serde_json::from_str("\"SECRET\"").unwrap();
        assert_eq!(empty, EnvVarType::General);
        assert_eq!(null, EnvVarType::General);
        assert_eq!(secret, EnvVarType::Secret);
        assert!(serde_json::from_str::<EnvVarType>("\"OTHER\"").is_err());
    }

    #[test]
    fn test_alert_rule_scopes_are_disjoint() {
        for rule in AlertRule::APP_LEVEL {
            assert!(!AlertRule::COMPONENT_LEVEL.contains(rule));
        }
    }
}

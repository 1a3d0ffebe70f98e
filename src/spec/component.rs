//! Deployable components.
//!
//! Every kind embeds a [`ComponentBase`] and opts into the shared field
//! groups that apply to it: [`BuildSettings`] for everything but functions,
//! [`Observability`] for everything but static sites, [`RuntimeSettings`] for
//! services, workers and jobs, and [`HttpRouting`] for services, static sites
//! and functions.

use serde::{Deserialize, Serialize};

use super::app::EnvVar;
use super::enums::{ComponentKind, JobKind};
use super::observability::Observability;
use super::policy::{
    AutoscalingSpec, CorsPolicy, HealthCheckSpec, JobTermination, RouteSpec, ServiceTermination,
    TerminationFields, TerminationShape, WorkerTermination,
};
use super::source::{ImageSourceSpec, SourceSpec};

/// Fields shared by every component kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentBase {
    /// Component name, unique within the application.
    pub name: String,
    /// Source-control reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSpec>,
    /// Component-level environment variables, canonically sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<EnvVar>,
    /// Build directory inside the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    /// Buildpack environment profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_slug: Option<String>,
}

impl ComponentBase {
    /// Creates a base with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Build instructions, for every kind except functions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildSettings {
    /// Optional build command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    /// Dockerfile path relative to the source directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile_path: Option<String>,
}

/// Run instructions and sizing, for services, workers and jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Optional run command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_command: Option<String>,
    /// Prebuilt image, instead of building from source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSourceSpec>,
    /// Instance size slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_size_slug: Option<String>,
    /// Number of instances, at least 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<i64>,
}

/// Deprecated component-level routing, superseded by app ingress.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpRouting {
    /// HTTP routes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSpec>,
    /// CORS policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,
}

/// A long-running service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceSpec {
    /// Shared base fields.
    #[serde(flatten)]
    pub base: ComponentBase,
    /// Build instructions.
    #[serde(flatten)]
    pub build: BuildSettings,
    /// Run instructions and sizing.
    #[serde(flatten)]
    pub runtime: RuntimeSettings,
    /// Deprecated routes and CORS.
    #[serde(flatten)]
    pub routing: HttpRouting,
    /// Alerts and log forwarding.
    #[serde(flatten)]
    pub observability: Observability,
    /// Port the service listens on for public HTTP traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<i64>,
    /// Ports reachable from other components only, canonically sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_ports: Vec<i64>,
    /// Health check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckSpec>,
    /// Autoscaling policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingSpec>,
    /// Termination policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<ServiceTermination>,
}

/// A static asset site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StaticSiteSpec {
    /// Shared base fields.
    #[serde(flatten)]
    pub base: ComponentBase,
    /// Build instructions.
    #[serde(flatten)]
    pub build: BuildSettings,
    /// Deprecated routes and CORS.
    #[serde(flatten)]
    pub routing: HttpRouting,
    /// Directory holding the built assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Index document name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_document: Option<String>,
    /// Error document name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_document: Option<String>,
    /// Document served for every unmatched path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catchall_document: Option<String>,
}

/// A background worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerSpec {
    /// Shared base fields.
    #[serde(flatten)]
    pub base: ComponentBase,
    /// Build instructions.
    #[serde(flatten)]
    pub build: BuildSettings,
    /// Run instructions and sizing.
    #[serde(flatten)]
    pub runtime: RuntimeSettings,
    /// Alerts and log forwarding.
    #[serde(flatten)]
    pub observability: Observability,
    /// Termination policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<WorkerTermination>,
}

/// A one-shot job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobSpec {
    /// Shared base fields.
    #[serde(flatten)]
    pub base: ComponentBase,
    /// Build instructions.
    #[serde(flatten)]
    pub build: BuildSettings,
    /// Run instructions and sizing.
    #[serde(flatten)]
    pub runtime: RuntimeSettings,
    /// Alerts and log forwarding.
    #[serde(flatten)]
    pub observability: Observability,
    /// When the job runs.
    #[serde(default)]
    pub kind: JobKind,
    /// Termination policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<JobTermination>,
}

/// A function bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionSpec {
    /// Shared base fields.
    #[serde(flatten)]
    pub base: ComponentBase,
    /// Deprecated routes and CORS.
    #[serde(flatten)]
    pub routing: HttpRouting,
    /// Alerts and log forwarding.
    #[serde(flatten)]
    pub observability: Observability,
}

/// A component of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Long-running service.
    Service(ServiceSpec),
    /// Static asset site.
    StaticSite(StaticSiteSpec),
    /// Background worker.
    Worker(WorkerSpec),
    /// One-shot job.
    Job(JobSpec),
    /// Function bundle.
    Function(FunctionSpec),
}

impl Component {
    /// Returns the component's kind.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Service(_) => ComponentKind::Service,
            Self::StaticSite(_) => ComponentKind::StaticSite,
            Self::Worker(_) => ComponentKind::Worker,
            Self::Job(_) => ComponentKind::Job,
            Self::Function(_) => ComponentKind::Function,
        }
    }

    /// Returns the shared base fields.
    #[must_use]
    pub const fn base(&self) -> &ComponentBase {
        match self {
            Self::Service(c) => &c.base,
            Self::StaticSite(c) => &c.base,
            Self::Worker(c) => &c.base,
            Self::Job(c) => &c.base,
            Self::Function(c) => &c.base,
        }
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Returns the build settings, absent for functions.
    #[must_use]
    pub const fn build(&self) -> Option<&BuildSettings> {
        match self {
            Self::Service(c) => Some(&c.build),
            Self::StaticSite(c) => Some(&c.build),
            Self::Worker(c) => Some(&c.build),
            Self::Job(c) => Some(&c.build),
            Self::Function(_) => None,
        }
    }

    /// Returns the runtime settings of services, workers and jobs.
    #[must_use]
    pub const fn runtime(&self) -> Option<&RuntimeSettings> {
        match self {
            Self::Service(c) => Some(&c.runtime),
            Self::Worker(c) => Some(&c.runtime),
            Self::Job(c) => Some(&c.runtime),
            Self::StaticSite(_) | Self::Function(_) => None,
        }
    }

    /// Returns the deprecated routing block of services, static sites and functions.
    #[must_use]
    pub const fn routing(&self) -> Option<&HttpRouting> {
        match self {
            Self::Service(c) => Some(&c.routing),
            Self::StaticSite(c) => Some(&c.routing),
            Self::Function(c) => Some(&c.routing),
            Self::Worker(_) | Self::Job(_) => None,
        }
    }

    /// Returns alerting and log forwarding, absent for static sites.
    #[must_use]
    pub const fn observability(&self) -> Option<&Observability> {
        match self {
            Self::Service(c) => Some(&c.observability),
            Self::Worker(c) => Some(&c.observability),
            Self::Job(c) => Some(&c.observability),
            Self::Function(c) => Some(&c.observability),
            Self::StaticSite(_) => None,
        }
    }

    /// Returns the autoscaling policy; only services carry one.
    #[must_use]
    pub const fn autoscaling(&self) -> Option<&AutoscalingSpec> {
        match self {
            Self::Service(c) => c.autoscaling.as_ref(),
            _ => None,
        }
    }

    /// Returns the termination policy fields, if the kind carries a policy
    /// and one is set.
    #[must_use]
    pub fn termination(&self) -> Option<TerminationFields> {
        match self {
            Self::Service(c) => c.termination.as_ref().map(TerminationShape::fields),
            Self::Worker(c) => c.termination.as_ref().map(TerminationShape::fields),
            Self::Job(c) => c.termination.as_ref().map(TerminationShape::fields),
            Self::StaticSite(_) | Self::Function(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_site_has_no_observability() {
        let site = Component::StaticSite(StaticSiteSpec {
            base: ComponentBase::named("docs"),
            ..StaticSiteSpec::default()
        });
        assert_eq!(site.kind(), ComponentKind::StaticSite);
        assert!(site.observability().is_none());
        assert!(site.termination().is_none());
        assert!(site.runtime().is_none());
        assert_eq!(site.name(), "docs");
    }

    #[test]
    fn test_function_has_no_build() {
        let function = Component::Function(FunctionSpec {
            base: ComponentBase::named("api"),
            ..FunctionSpec::default()
        });
        assert!(function.build().is_none());
        assert!(function.observability().is_some());
    }

    #[test]
    fn test_service_serializes_flat() {
        let service = ServiceSpec {
            base: ComponentBase::named("web"),
            http_port: Some(8080),
            ..ServiceSpec::default()
        };
        let json = serde_json::to_value(&service).unwrap();
        assert_eq!(json["name"], "web");
        assert_eq!(json["http_port"], 8080);
        assert!(json.get("base").is_none());
    }
}

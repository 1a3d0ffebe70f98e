//! Strongly-typed deployment specification.
//!
//! This is the entity graph handed to the orchestration API client. The
//! codec builds it from a configuration tree and turns it back into one.

pub mod app;
pub mod component;
pub mod enums;
pub mod ingress;
pub mod observability;
pub mod policy;
pub mod source;

pub use app::{AppSpec, DatabaseSpec, DomainSpec, EnvVar};
pub use component::{
    BuildSettings, Component, ComponentBase, FunctionSpec, HttpRouting, JobSpec, RuntimeSettings,
    ServiceSpec, StaticSiteSpec, WorkerSpec,
};
pub use enums::{
    AlertOperator, AlertRule, AlertWindow, ComponentKind, DatabaseEngine, DomainType, EgressType,
    EnvVarScope, EnvVarType, JobKind, RegistryType, WireEnum,
};
pub use ingress::{
    EgressSpec, IngressComponent, IngressMatch, IngressRedirect, IngressRule, IngressSpec,
};
pub use observability::{
    AlertDestinations, AlertSpec, DatadogSink, LogDestinationSpec, LogSink, LogtailSink,
    Observability, OpenSearchBasicAuth, OpenSearchSink, PapertrailSink, SlackWebhook,
};
pub use policy::{
    AutoscalingMetrics, AutoscalingSpec, CorsPolicy, CpuMetric, HealthCheckSpec, JobTermination,
    RouteSpec, ServiceTermination, StringMatch, TerminationFields, TerminationKind,
    TerminationShape, WorkerTermination,
};
pub use source::{GitServiceSourceSpec, GitSourceSpec, ImageDeployOnPush, ImageSourceSpec, SourceSpec};

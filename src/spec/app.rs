//! The application root of the deployment specification.

use serde::{Deserialize, Serialize};

use super::component::{
    Component, FunctionSpec, JobSpec, ServiceSpec, StaticSiteSpec, WorkerSpec,
};
use super::enums::{ComponentKind, DatabaseEngine, DomainType, EnvVarScope, EnvVarType};
use super::ingress::{EgressSpec, IngressSpec};
use super::observability::AlertSpec;

/// An environment variable definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnvVar {
    /// Variable name.
    pub key: String,
    /// Variable value. Sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Visibility scope.
    #[serde(default)]
    pub scope: EnvVarScope,
    /// Variable type; an empty or missing type reads as `GENERAL`.
    #[serde(default, rename = "type")]
    pub env_type: EnvVarType,
}

impl EnvVar {
    /// Creates a general, run-and-build-time variable.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            scope: EnvVarScope::default(),
            env_type: EnvVarType::default(),
        }
    }
}

/// A domain served by the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainSpec {
    /// Hostname.
    pub domain: String,
    /// Domain type; absent for domains declared in the legacy flat list.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<DomainType>,
    /// Whether subdomains are served too.
    #[serde(default)]
    pub wildcard: bool,
    /// Managed DNS zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl DomainSpec {
    /// Creates a domain from a bare hostname, the legacy representation.
    #[must_use]
    pub fn hostname(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            domain_type: None,
            wildcard: false,
            zone: None,
        }
    }
}

/// A database attached to the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatabaseSpec {
    /// Component name of the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Database engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<DatabaseEngine>,
    /// Engine version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether this is a managed production cluster.
    #[serde(default)]
    pub production: bool,
    /// Name of the managed cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// Database name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    /// Database user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_user: Option<String>,
}

/// A deployable application.
///
/// Components are held in one list, grouped by kind in
/// [`ComponentKind::ALL`] order. The serialized form partitions them into
/// `services`, `static_sites`, `workers`, `jobs` and `functions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "AppSpecDocument", into = "AppSpecDocument")]
pub struct AppSpec {
    /// Application name.
    pub name: String,
    /// Deployment region slug.
    pub region: Option<String>,
    /// Disables edge caching.
    pub disable_edge_cache: bool,
    /// Disables email address obfuscation.
    pub disable_email_obfuscation: bool,
    /// Enables enhanced threat control.
    pub enhanced_threat_control_enabled: bool,
    /// Enabled feature flags, canonically sorted.
    pub features: Vec<String>,
    /// Domains, in declaration order.
    pub domains: Vec<DomainSpec>,
    /// All components.
    pub components: Vec<Component>,
    /// Attached databases.
    pub databases: Vec<DatabaseSpec>,
    /// App-level environment variables, canonically sorted.
    pub envs: Vec<EnvVar>,
    /// App-level alerts.
    pub alerts: Vec<AlertSpec>,
    /// Ingress rules.
    pub ingress: Option<IngressSpec>,
    /// Egress configuration.
    pub egress: Option<EgressSpec>,
}

impl AppSpec {
    /// Returns the components of one kind.
    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(move |c| c.kind() == kind)
    }

    /// Finds a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// Inserts a component, keeping components grouped by kind.
    pub fn push_component(&mut self, component: Component) {
        let kind = component.kind();
        let at = self
            .components
            .iter()
            .position(|c| c.kind() > kind)
            .unwrap_or(self.components.len());
        self.components.insert(at, component);
    }
}

/// Serialized form of [`AppSpec`], with components partitioned by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AppSpecDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(default)]
    disable_edge_cache: bool,
    #[serde(default)]
    disable_email_obfuscation: bool,
    #[serde(default)]
    enhanced_threat_control_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domains: Vec<DomainSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    services: Vec<ServiceSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    static_sites: Vec<StaticSiteSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    workers: Vec<WorkerSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    jobs: Vec<JobSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    functions: Vec<FunctionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    databases: Vec<DatabaseSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    envs: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    alerts: Vec<AlertSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ingress: Option<IngressSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    egress: Option<EgressSpec>,
}

impl From<AppSpecDocument> for AppSpec {
    fn from(doc: AppSpecDocument) -> Self {
        let components = doc
            .services
            .into_iter()
            .map(Component::Service)
            .chain(doc.static_sites.into_iter().map(Component::StaticSite))
            .chain(doc.workers.into_iter().map(Component::Worker))
            .chain(doc.jobs.into_iter().map(Component::Job))
            .chain(doc.functions.into_iter().map(Component::Function))
            .collect();

        Self {
            name: doc.name,
            region: doc.region,
            disable_edge_cache: doc.disable_edge_cache,
            disable_email_obfuscation: doc.disable_email_obfuscation,
            enhanced_threat_control_enabled: doc.enhanced_threat_control_enabled,
            features: doc.features,
            domains: doc.domains,
            components,
            databases: doc.databases,
            envs: doc.envs,
            alerts: doc.alerts,
            ingress: doc.ingress,
            egress: doc.egress,
        }
    }
}

impl From<AppSpec> for AppSpecDocument {
    fn from(spec: AppSpec) -> Self {
        let mut doc = Self {
            name: spec.name,
            region: spec.region,
            disable_edge_cache: spec.disable_edge_cache,
            disable_email_obfuscation: spec.disable_email_obfuscation,
            enhanced_threat_control_enabled: spec.enhanced_threat_control_enabled,
            features: spec.features,
            domains: spec.domains,
            databases: spec.databases,
            envs: spec.envs,
            alerts: spec.alerts,
            ingress: spec.ingress,
            egress: spec.egress,
            ..Self::default()
        };

        for component in spec.components {
            match component {
                Component::Service(c) => doc.services.push(c),
                Component::StaticSite(c) => doc.static_sites.push(c),
                Component::Worker(c) => doc.workers.push(c),
                Component::Job(c) => doc.jobs.push(c),
                Component::Function(c) => doc.functions.push(c),
            }
        }

        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::component::ComponentBase;

    fn worker(name: &str) -> Component {
        Component::Worker(WorkerSpec {
            base: ComponentBase::named(name),
            ..WorkerSpec::default()
        })
    }

    fn service(name: &str) -> Component {
        Component::Service(ServiceSpec {
            base: ComponentBase::named(name),
            ..ServiceSpec::default()
        })
    }

    #[test]
    fn test_push_component_keeps_kind_grouping() {
        let mut app = AppSpec::default();
        app.push_component(worker("queue"));
        app.push_component(service("web"));
        app.push_component(worker("mailer"));

        let kinds: Vec<_> = app.components.iter().map(Component::kind).collect();
        assert_eq!(
            kinds,
            vec![ComponentKind::Service, ComponentKind::Worker, ComponentKind::Worker]
        );
        assert_eq!(app.components_of(ComponentKind::Worker).count(), 2);
        assert!(app.component("web").is_some());
    }

    #[test]
    fn test_json_partitions_components() {
        let mut app = AppSpec {
            name: String::from("shop"),
            ..AppSpec::default()
        };
        app.push_component(service("web"));
        app.push_component(worker("queue"));

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["services"][0]["name"], "web");
        assert_eq!(json["workers"][0]["name"], "queue");
        assert!(json.get("components").is_none());

        let back: AppSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, app);
    }

    #[test]
    fn test_env_var_missing_type_reads_general() {
        let env: EnvVar = serde_json::from_str(r#"{"key": "A", "type": ""}"#).unwrap();
        assert_eq!(env.env_type, EnvVarType::General);
        assert_eq!(env.scope, EnvVarScope::RunAndBuildTime);
    }
}

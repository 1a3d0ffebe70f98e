//! Schema-shape tables for configuration trees.
//!
//! Field names per component kind, set-typed fields, validation ranges and
//! declared defaults. The tables are built once on first use and shared
//! read-only afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::spec::ComponentKind;

/// Inclusive integer range a field must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    /// Smallest accepted value.
    pub min: i64,
    /// Largest accepted value.
    pub max: i64,
}

impl IntRange {
    /// Every `i64`.
    pub const ANY: Self = Self::new(i64::MIN, i64::MAX);

    /// Creates a closed range.
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Creates a range with only a lower bound.
    #[must_use]
    pub const fn at_least(min: i64) -> Self {
        Self { min, max: i64::MAX }
    }

    /// Returns true if the value is inside the range.
    #[must_use]
    pub const fn contains(self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Termination grace period, in seconds.
pub const GRACE_PERIOD_SECONDS: IntRange = IntRange::new(1, 600);
/// Service drain period, in seconds.
pub const DRAIN_SECONDS: IntRange = IntRange::new(1, 110);
/// TCP port numbers.
pub const PORT: IntRange = IntRange::new(1, 65_535);
/// Autoscaling instance counts.
pub const INSTANCE_COUNT: IntRange = IntRange::at_least(1);
/// Autoscaling CPU utilization target.
pub const CPU_PERCENT: IntRange = IntRange::new(1, 100);
/// Application name length.
pub const APP_NAME_LENGTH: IntRange = IntRange::new(2, 32);
/// Alert email address length.
pub const EMAIL_LENGTH: IntRange = IntRange::new(3, 100);

/// Datadog intake used when a sink leaves the endpoint unset.
pub const DEFAULT_DATADOG_ENDPOINT: &str = "https://http-intake.logs.datadoghq.com";
/// Redirect status used when an ingress redirect leaves it unset.
pub const DEFAULT_REDIRECT_CODE: i64 = 302;

/// Fields every component kind accepts.
const BASE_FIELDS: &[&str] = &[
    "name",
    "git",
    "github",
    "gitlab",
    "bitbucket",
    "env",
    "source_dir",
    "environment_slug",
];
/// Build fields, for every kind except functions.
const BUILD_FIELDS: &[&str] = &["build_command", "dockerfile_path"];
/// Observability fields, for every kind except static sites.
const OBSERVABILITY_FIELDS: &[&str] = &["alert", "log_destination"];
/// Runtime fields of services, workers and jobs.
const RUNTIME_FIELDS: &[&str] = &["run_command", "image", "instance_size_slug", "instance_count"];
/// Deprecated routing fields of services, static sites and functions.
const ROUTING_FIELDS: &[&str] = &["routes", "cors"];

const SERVICE_FIELDS: &[&str] = &[
    "http_port",
    "internal_ports",
    "health_check",
    "autoscaling",
    "termination",
];
const STATIC_SITE_FIELDS: &[&str] = &[
    "output_dir",
    "index_document",
    "error_document",
    "catchall_document",
];
const WORKER_FIELDS: &[&str] = &["termination"];
const JOB_FIELDS: &[&str] = &["kind", "termination"];

/// Top-level application fields.
const APP_FIELDS: &[&str] = &[
    "name",
    "region",
    "disable_edge_cache",
    "disable_email_obfuscation",
    "enhanced_threat_control_enabled",
    "features",
    "domain",
    "domains",
    "service",
    "static_site",
    "worker",
    "job",
    "function",
    "database",
    "env",
    "alert",
    "ingress",
    "egress",
];

/// Fields declared as unordered sets.
const SET_FIELDS: &[&str] = &[
    "env",
    "domains",
    "features",
    "internal_ports",
    "allow_methods",
    "allow_headers",
    "expose_headers",
];

/// Immutable schema lookups.
#[derive(Debug)]
pub struct SchemaTable {
    components: BTreeMap<ComponentKind, BTreeSet<&'static str>>,
    app_fields: BTreeSet<&'static str>,
    set_fields: BTreeSet<&'static str>,
}

/// The process-wide schema table.
pub static SCHEMA: LazyLock<SchemaTable> = LazyLock::new(SchemaTable::build);

impl SchemaTable {
    fn build() -> Self {
        let components = ComponentKind::ALL
            .into_iter()
            .map(|kind| {
                let mut fields: BTreeSet<&'static str> = BASE_FIELDS.iter().copied().collect();
                if kind != ComponentKind::Function {
                    fields.extend(BUILD_FIELDS);
                }
                if kind != ComponentKind::StaticSite {
                    fields.extend(OBSERVABILITY_FIELDS);
                }
                let extras: &[&[&str]] = match kind {
                    ComponentKind::Service => &[RUNTIME_FIELDS, ROUTING_FIELDS, SERVICE_FIELDS],
                    ComponentKind::StaticSite => &[ROUTING_FIELDS, STATIC_SITE_FIELDS],
                    ComponentKind::Worker => &[RUNTIME_FIELDS, WORKER_FIELDS],
                    ComponentKind::Job => &[RUNTIME_FIELDS, JOB_FIELDS],
                    ComponentKind::Function => &[ROUTING_FIELDS],
                };
                for group in extras {
                    fields.extend(group.iter().copied());
                }
                (kind, fields)
            })
            .collect();

        Self {
            components,
            app_fields: APP_FIELDS.iter().copied().collect(),
            set_fields: SET_FIELDS.iter().copied().collect(),
        }
    }

    /// Returns true if the component kind declares the field.
    #[must_use]
    pub fn accepts(&self, kind: ComponentKind, field: &str) -> bool {
        self.components
            .get(&kind)
            .is_some_and(|fields| fields.contains(field))
    }

    /// Returns true if the application root declares the field.
    #[must_use]
    pub fn accepts_app_field(&self, field: &str) -> bool {
        self.app_fields.contains(field)
    }

    /// Returns the fields declared as unordered sets.
    #[must_use]
    pub const fn set_fields(&self) -> &BTreeSet<&'static str> {
        &self.set_fields
    }
}

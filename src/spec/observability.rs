//! Alert policies and log forwarding sinks.

use serde::{Deserialize, Serialize};

use super::enums::{AlertOperator, AlertRule, AlertWindow};

/// An alert policy, at app or component level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct AlertSpec {
    /// Rule being watched.
    pub rule: AlertRule,
    /// Comparison operator; component-level rules only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<AlertOperator>,
    /// Evaluation window; component-level rules only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<AlertWindow>,
    /// Threshold value; component-level rules only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Whether the alert is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Notification targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinations: Option<AlertDestinations>,
}

/// Where alert notifications go.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlertDestinations {
    /// Notified email addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    /// Notified Slack webhooks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slack_webhooks: Vec<SlackWebhook>,
}

/// A Slack incoming webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlackWebhook {
    /// Target channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Webhook URL. Sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A named log forwarding destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogDestinationSpec {
    /// Destination name.
    pub name: String,
    /// Provider-specific sink, at most one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<LogSink>,
}

/// Provider-specific log sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// OpenSearch cluster.
    OpenSearch(OpenSearchSink),
    /// Papertrail syslog endpoint.
    Papertrail(PapertrailSink),
    /// Datadog HTTP intake.
    Datadog(DatadogSink),
    /// Logtail (Better Stack) source token.
    Logtail(LogtailSink),
}

impl LogSink {
    /// Config-tree keys of the sink kinds, in encode precedence order.
    pub const KEYS: [&'static str; 4] = ["open_search", "papertrail", "datadog", "logtail"];

    /// Returns the config-tree key of this sink kind.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::OpenSearch(_) => "open_search",
            Self::Papertrail(_) => "papertrail",
            Self::Datadog(_) => "datadog",
            Self::Logtail(_) => "logtail",
        }
    }
}

/// OpenSearch sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpenSearchSink {
    /// Cluster endpoint, `https://host:port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Basic authentication.
    pub basic_auth: OpenSearchBasicAuth,
    /// Index name; the platform picks one when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Name of a managed cluster, instead of an endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}

/// OpenSearch credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpenSearchBasicAuth {
    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Password. Sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Papertrail sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PapertrailSink {
    /// Syslog endpoint.
    pub endpoint: String,
}

/// Datadog sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatadogSink {
    /// HTTP intake endpoint.
    pub endpoint: String,
    /// API key. Sensitive.
    pub api_key: String,
}

/// Logtail sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogtailSink {
    /// Source token. Sensitive.
    pub token: String,
}

/// Alerting and log forwarding shared by every kind except static sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Observability {
    /// Component-level alerts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<AlertSpec>,
    /// Log forwarding destinations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_destinations: Vec<LogDestinationSpec>,
}

impl Observability {
    /// Returns true when neither alerts nor destinations are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty() && self.log_destinations.is_empty()
    }
}

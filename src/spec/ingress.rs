//! App-level ingress routing and egress configuration.

use serde::{Deserialize, Serialize};

use super::enums::EgressType;
use super::policy::CorsPolicy;

/// Ingress rules of an application, evaluated in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngressSpec {
    /// Routing rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<IngressRule>,
}

/// A single ingress rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngressRule {
    /// Request match.
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub matcher: Option<IngressMatch>,
    /// Component the request is routed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<IngressComponent>,
    /// Redirect answered instead of routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<IngressRedirect>,
    /// CORS policy applied to matching requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,
}

/// Path match of an ingress rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngressMatch {
    /// Path prefix matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

/// Component target of an ingress rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngressComponent {
    /// Target component name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the matched prefix is forwarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_path_prefix: Option<bool>,
    /// Replacement for the matched prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
}

/// Redirect target of an ingress rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngressRedirect {
    /// Replacement URI path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Replacement host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    /// Replacement port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    /// Replacement scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// HTTP status code, 302 unless set.
    pub redirect_code: i64,
}

/// Outbound traffic configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EgressSpec {
    /// How outbound addresses are assigned.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub egress_type: Option<EgressType>,
}

//! Health checks, CORS, deprecated routes and autoscaling.

use tracing::warn;

use super::canonical::canonical;
use crate::config::reader::Node;
use crate::config::schema::{CPU_PERCENT, INSTANCE_COUNT, PORT};
use crate::config::value::{ConfigMap, ConfigValue, MapBuilder};
use crate::error::EncodeResult;
use crate::spec::{
    AutoscalingMetrics, AutoscalingSpec, CorsPolicy, CpuMetric, HealthCheckSpec, RouteSpec,
    StringMatch,
};

/// Reads a `health_check` block. Every field is optional.
pub(crate) fn encode_health_check(node: &Node<'_>) -> EncodeResult<HealthCheckSpec> {
    Ok(HealthCheckSpec {
        http_path: node.opt_string("http_path")?,
        initial_delay_seconds: node.opt_i32("initial_delay_seconds")?,
        period_seconds: node.opt_i32("period_seconds")?,
        timeout_seconds: node.opt_i32("timeout_seconds")?,
        success_threshold: node.opt_i32("success_threshold")?,
        failure_threshold: node.opt_i32("failure_threshold")?,
        port: node.opt_int_in("port", PORT)?,
    })
}

pub(crate) fn decode_health_check(check: &HealthCheckSpec) -> ConfigMap {
    MapBuilder::new()
        .opt("http_path", check.http_path.as_deref())
        .opt("initial_delay_seconds", check.initial_delay_seconds)
        .opt("period_seconds", check.period_seconds)
        .opt("timeout_seconds", check.timeout_seconds)
        .opt("success_threshold", check.success_threshold)
        .opt("failure_threshold", check.failure_threshold)
        .opt("port", check.port)
        .build()
}

/// Reads a `cors` block.
///
/// Each populated `exact`, `prefix` or `regex` under `allow_origins` becomes
/// its own origin matcher. Setting several is accepted as-is.
pub(crate) fn encode_cors(node: &Node<'_>) -> EncodeResult<CorsPolicy> {
    let mut allow_origins = Vec::new();
    if let Some(origins) = node.block("allow_origins")? {
        for key in StringMatch::KEYS {
            let Some(pattern) = origins.opt_str(key)?.filter(|p| !p.is_empty()) else {
                continue;
            };
            let Some(matcher) = StringMatch::from_key(key, pattern.to_string()) else {
                continue;
            };
            if matches!(matcher, StringMatch::Prefix(_)) {
                warn!(path = %origins.path(), "CORS prefix match is deprecated, use regex");
            }
            allow_origins.push(matcher);
        }
    }

    Ok(CorsPolicy {
        allow_origins,
        allow_methods: strings(node, "allow_methods")?,
        allow_headers: strings(node, "allow_headers")?,
        expose_headers: strings(node, "expose_headers")?,
        max_age: node.opt_string("max_age")?,
        allow_credentials: node.opt_bool("allow_credentials")?,
    })
}

fn strings(node: &Node<'_>, key: &str) -> EncodeResult<Vec<String>> {
    Ok(canonical(node.strings(key)?.into_iter().map(str::to_string)))
}

/// Writes a `cors` block. All origin matchers fold into one
/// `allow_origins` block.
pub(crate) fn decode_cors(cors: &CorsPolicy) -> ConfigMap {
    let origins = if cors.allow_origins.is_empty() {
        None
    } else {
        Some(
            cors.allow_origins
                .iter()
                .fold(MapBuilder::new(), |map, m| map.field(m.key(), m.pattern()))
                .build(),
        )
    };

    MapBuilder::new()
        .block("allow_origins", origins)
        .set("allow_methods", &cors.allow_methods)
        .set("allow_headers", &cors.allow_headers)
        .set("expose_headers", &cors.expose_headers)
        .opt("max_age", cors.max_age.as_deref())
        .opt("allow_credentials", cors.allow_credentials)
        .build()
}

/// Reads one deprecated route.
pub(crate) fn encode_route(node: &Node<'_>) -> EncodeResult<RouteSpec> {
    Ok(RouteSpec {
        path: node.opt_string("path")?,
        preserve_path_prefix: node.opt_bool("preserve_path_prefix")?,
    })
}

pub(crate) fn decode_route(route: &RouteSpec) -> ConfigValue {
    MapBuilder::new()
        .opt("path", route.path.as_deref())
        .opt("preserve_path_prefix", route.preserve_path_prefix)
        .build()
        .into()
}

/// Reads an `autoscaling` block. The `metrics` block and its `cpu` block
/// are both required.
pub(crate) fn encode_autoscaling(node: &Node<'_>) -> EncodeResult<AutoscalingSpec> {
    let metrics = node.block_required("metrics")?;
    let cpu = metrics.block_required("cpu")?;
    Ok(AutoscalingSpec {
        min_instance_count: node.int_in_required("min_instance_count", INSTANCE_COUNT)?,
        max_instance_count: node.int_in_required("max_instance_count", INSTANCE_COUNT)?,
        metrics: AutoscalingMetrics {
            cpu: CpuMetric {
                percent: cpu.int_in_required("percent", CPU_PERCENT)?,
            },
        },
    })
}

pub(crate) fn decode_autoscaling(autoscaling: &AutoscalingSpec) -> ConfigMap {
    let cpu = MapBuilder::new()
        .field("percent", autoscaling.metrics.cpu.percent)
        .build();
    let metrics = MapBuilder::new().block("cpu", Some(cpu)).build();
    MapBuilder::new()
        .field("min_instance_count", autoscaling.min_instance_count)
        .field("max_instance_count", autoscaling.max_instance_count)
        .block("metrics", Some(metrics))
        .build()
}

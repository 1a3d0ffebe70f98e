//! Alerts and log destinations.

use super::leaf::enum_leaf;
use super::{Reader, one_of, optional};
use crate::config::reader::Node;
use crate::config::schema::{DEFAULT_DATADOG_ENDPOINT, EMAIL_LENGTH};
use crate::config::value::{ConfigMap, ConfigValue, MapBuilder};
use crate::error::{EncodeError, EncodeResult};
use crate::spec::{
    AlertDestinations, AlertOperator, AlertRule, AlertSpec, AlertWindow, DatadogSink,
    LogDestinationSpec, LogSink, LogtailSink, Observability, OpenSearchBasicAuth, OpenSearchSink,
    PapertrailSink, SlackWebhook, WireEnum,
};

/// Which alert rules an `alert` list accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlertScope {
    /// Deployment and domain events.
    App,
    /// Resource utilization rules.
    Component,
}

impl AlertScope {
    const fn rules(self) -> &'static [AlertRule] {
        match self {
            Self::App => AlertRule::APP_LEVEL,
            Self::Component => AlertRule::COMPONENT_LEVEL,
        }
    }
}

/// Reads one alert.
///
/// Component-level alerts need an operator, a window and a non-negative
/// value; app-level alerts carry none of them.
pub(crate) fn encode_alert(node: &Node<'_>, scope: AlertScope) -> EncodeResult<AlertSpec> {
    let rule: AlertRule = node.enum_required("rule")?;
    if !scope.rules().contains(&rule) {
        return Err(EncodeError::InvalidEnum {
            path: node.at("rule"),
            value: rule.as_str().to_string(),
            allowed: scope
                .rules()
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let (operator, window, value) = match scope {
        AlertScope::Component => {
            let value = node
                .opt_float("value")?
                .ok_or_else(|| EncodeError::MissingRequired { path: node.at("value") })?;
            if value < 0.0 || !value.is_finite() {
                return Err(EncodeError::InvalidFloat {
                    path: node.at("value"),
                    value: value.to_string(),
                });
            }
            (
                Some(node.enum_required::<AlertOperator>("operator")?),
                Some(node.enum_required::<AlertWindow>("window")?),
                Some(value),
            )
        }
        AlertScope::App => (None, None, None),
    };

    Ok(AlertSpec {
        rule,
        operator,
        window,
        value,
        disabled: node.bool_or("disabled", false)?,
        destinations: optional(node, "destinations", encode_destinations)?,
    })
}

fn encode_destinations(node: &Node<'_>) -> EncodeResult<AlertDestinations> {
    let emails = node.strings("emails")?;
    for (i, email) in emails.iter().enumerate() {
        let length = email.chars().count();
        if !EMAIL_LENGTH.contains(i64::try_from(length).unwrap_or(i64::MAX)) {
            return Err(EncodeError::InvalidLength {
                path: format!("{}[{i}]", node.at("emails")),
                length,
                min: usize::try_from(EMAIL_LENGTH.min).unwrap_or_default(),
                max: usize::try_from(EMAIL_LENGTH.max).unwrap_or(usize::MAX),
            });
        }
    }

    let slack_webhooks = node
        .blocks("slack_webhooks")?
        .iter()
        .map(|hook| {
            Ok(SlackWebhook {
                channel: hook.opt_string("channel")?,
                url: hook.opt_string("url")?,
            })
        })
        .collect::<EncodeResult<Vec<_>>>()?;

    Ok(AlertDestinations {
        emails: emails.into_iter().map(str::to_string).collect(),
        slack_webhooks,
    })
}

/// Writes one alert. `disabled` is always present.
pub(crate) fn decode_alert(alert: &AlertSpec) -> ConfigValue {
    let destinations = alert.destinations.as_ref().map(|d| {
        MapBuilder::new()
            .list("emails", d.emails.iter().map(ConfigValue::from).collect())
            .list(
                "slack_webhooks",
                d.slack_webhooks
                    .iter()
                    .map(|hook| {
                        MapBuilder::new()
                            .opt("channel", hook.channel.as_deref())
                            .opt("url", hook.url.as_deref())
                            .build()
                            .into()
                    })
                    .collect(),
            )
            .build()
    });

    MapBuilder::new()
        .field("rule", enum_leaf(alert.rule))
        .opt("operator", alert.operator.map(enum_leaf))
        .opt("window", alert.window.map(enum_leaf))
        .opt("value", alert.value)
        .field("disabled", alert.disabled)
        .block("destinations", destinations)
        .build()
        .into()
}

/// Sink kinds in encode precedence order.
const SINKS: [(&str, Reader<LogSink>); 4] = [
    ("open_search", read_open_search),
    ("papertrail", read_papertrail),
    ("datadog", read_datadog),
    ("logtail", read_logtail),
];

fn read_open_search(node: &Node<'_>) -> EncodeResult<LogSink> {
    let auth = node.block_required("basic_auth")?;
    Ok(LogSink::OpenSearch(OpenSearchSink {
        endpoint: node.opt_string("endpoint")?,
        basic_auth: OpenSearchBasicAuth {
            user: auth.opt_string("user")?,
            password: auth.opt_string("password")?,
        },
        index_name: node.opt_string("index_name")?,
        cluster_name: node.opt_string("cluster_name")?,
    }))
}

fn read_papertrail(node: &Node<'_>) -> EncodeResult<LogSink> {
    Ok(LogSink::Papertrail(PapertrailSink {
        endpoint: node.str_required("endpoint")?.to_string(),
    }))
}

fn read_datadog(node: &Node<'_>) -> EncodeResult<LogSink> {
    let endpoint = node
        .opt_str("endpoint")?
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_DATADOG_ENDPOINT);
    Ok(LogSink::Datadog(DatadogSink {
        endpoint: endpoint.to_string(),
        api_key: node.str_required("api_key")?.to_string(),
    }))
}

fn read_logtail(node: &Node<'_>) -> EncodeResult<LogSink> {
    Ok(LogSink::Logtail(LogtailSink {
        token: node.str_required("token")?.to_string(),
    }))
}

/// Reads one log destination.
pub(crate) fn encode_log_destination(node: &Node<'_>) -> EncodeResult<LogDestinationSpec> {
    Ok(LogDestinationSpec {
        name: node.str_required("name")?.to_string(),
        sink: one_of(node, &SINKS)?,
    })
}

/// Writes one log destination.
pub(crate) fn decode_log_destination(destination: &LogDestinationSpec) -> ConfigValue {
    let builder = MapBuilder::new().field("name", destination.name.as_str());
    let builder = match &destination.sink {
        None => builder,
        Some(sink) => builder.block(sink.key(), Some(decode_sink(sink))),
    };
    builder.build().into()
}

fn decode_sink(sink: &LogSink) -> ConfigMap {
    match sink {
        LogSink::OpenSearch(os) => MapBuilder::new()
            .opt("endpoint", os.endpoint.as_deref())
            .block(
                "basic_auth",
                Some(
                    MapBuilder::new()
                        .opt("user", os.basic_auth.user.as_deref())
                        .opt("password", os.basic_auth.password.as_deref())
                        .build(),
                ),
            )
            .opt("index_name", os.index_name.as_deref())
            .opt("cluster_name", os.cluster_name.as_deref())
            .build(),
        LogSink::Papertrail(pt) => MapBuilder::new()
            .field("endpoint", pt.endpoint.as_str())
            .build(),
        LogSink::Datadog(dd) => MapBuilder::new()
            .field("endpoint", dd.endpoint.as_str())
            .field("api_key", dd.api_key.as_str())
            .build(),
        LogSink::Logtail(lt) => MapBuilder::new().field("token", lt.token.as_str()).build(),
    }
}

/// Reads the `alert` and `log_destination` lists of a component.
pub(crate) fn encode_observability(node: &Node<'_>) -> EncodeResult<Observability> {
    Ok(Observability {
        alerts: node
            .blocks("alert")?
            .iter()
            .map(|alert| encode_alert(alert, AlertScope::Component))
            .collect::<EncodeResult<_>>()?,
        log_destinations: node
            .blocks("log_destination")?
            .iter()
            .map(encode_log_destination)
            .collect::<EncodeResult<_>>()?,
    })
}

/// Writes the `alert` and `log_destination` lists of a component.
pub(crate) fn decode_observability(builder: MapBuilder, observability: &Observability) -> MapBuilder {
    builder
        .list("alert", observability.alerts.iter().map(decode_alert).collect())
        .list(
            "log_destination",
            observability
                .log_destinations
                .iter()
                .map(decode_log_destination)
                .collect(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reader::ExclusivePolicy;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn node(fields: &ConfigMap) -> Node<'_> {
        Node::root(fields, "alert", ExclusivePolicy::default())
    }

    #[test]
    fn test_component_alert_round_trip() {
        let fields = tree(
            "rule: CPU_UTILIZATION\noperator: GREATER_THAN\nwindow: FIVE_MINUTES\nvalue: 75.5\n\
             disabled: false\ndestinations:\n  - emails: [ops@example.com]\n",
        );
        let alert = encode_alert(&node(&fields), AlertScope::Component).unwrap();
        assert_eq!(alert.value, Some(75.5));
        assert_eq!(decode_alert(&alert), ConfigValue::Map(fields));
    }

    #[test]
    fn test_integer_alert_value_round_trip() {
        let fields = tree(
            "rule: CPU_UTILIZATION\noperator: GREATER_THAN\nwindow: TEN_MINUTES\nvalue: 80\n\
             disabled: false\n",
        );
        assert_eq!(fields["value"].kind_name(), "int");
        let alert = encode_alert(&node(&fields), AlertScope::Component).unwrap();
        assert_eq!(alert.value, Some(80.0));
        assert_eq!(decode_alert(&alert), ConfigValue::Map(fields));
    }

    #[test]
    fn test_app_scope_rejects_component_rule() {
        let fields = tree("rule: CPU_UTILIZATION\n");
        let err = encode_alert(&node(&fields), AlertScope::App).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidEnum { .. }));
    }

    #[test]
    fn test_component_alert_requires_value() {
        let fields = tree("rule: RESTART_COUNT\noperator: GREATER_THAN\nwindow: ONE_HOUR\n");
        let err = encode_alert(&node(&fields), AlertScope::Component).unwrap_err();
        assert_eq!(err.path(), "alert.value");
    }

    #[test]
    fn test_negative_alert_value_rejected() {
        let fields = tree(
            "rule: MEM_UTILIZATION\noperator: LESS_THAN\nwindow: ONE_HOUR\nvalue: -1\n",
        );
        assert!(matches!(
            encode_alert(&node(&fields), AlertScope::Component),
            Err(EncodeError::InvalidFloat { .. })
        ));
    }

    #[test]
    fn test_fractional_negative_value_reported_as_written() {
        let fields = tree(
            "rule: MEM_UTILIZATION\noperator: LESS_THAN\nwindow: ONE_HOUR\nvalue: -0.5\n",
        );
        let err = encode_alert(&node(&fields), AlertScope::Component).unwrap_err();
        assert_eq!(
            err,
            EncodeError::InvalidFloat {
                path: String::from("alert.value"),
                value: String::from("-0.5"),
            }
        );
        assert!(err.to_string().contains("-0.5"));
    }

    #[test]
    fn test_email_length_checked() {
        let fields = tree("rule: DEPLOYMENT_FAILED\ndestinations:\n  - emails: [ab]\n");
        let err = encode_alert(&node(&fields), AlertScope::App).unwrap_err();
        assert_eq!(err.path(), "alert.destinations.emails[0]");
    }

    #[test]
    fn test_datadog_endpoint_default() {
        let fields = tree("name: dd\ndatadog:\n  - api_key: secret\n");
        let dest = encode_log_destination(&node(&fields)).unwrap();
        let Some(LogSink::Datadog(sink)) = dest.sink else {
            panic!("expected datadog sink");
        };
        assert_eq!(sink.endpoint, DEFAULT_DATADOG_ENDPOINT);
    }

    #[test]
    fn test_open_search_requires_basic_auth() {
        let fields = tree("name: os\nopen_search:\n  - endpoint: https://os:9200\n");
        let err = encode_log_destination(&node(&fields)).unwrap_err();
        assert_eq!(err.path(), "alert.open_search.basic_auth");
    }

    #[test]
    fn test_first_sink_wins() {
        let fields = tree(
            "name: both\nlogtail:\n  - token: t\npapertrail:\n  - endpoint: syslog+tls://p:1\n",
        );
        let dest = encode_log_destination(&node(&fields)).unwrap();
        assert!(matches!(dest.sink, Some(LogSink::Papertrail(_))));
    }

    #[test]
    fn test_log_destination_round_trip() {
        let fields = tree("name: lt\nlogtail:\n  - token: abc\n");
        let dest = encode_log_destination(&node(&fields)).unwrap();
        assert_eq!(decode_log_destination(&dest), ConfigValue::Map(fields));
    }
}

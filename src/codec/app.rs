//! Top-level spec assembler: app fields, domains, databases, ingress and
//! egress, plus the component lists.

use std::collections::BTreeSet;

use tracing::warn;

use super::DecodeContext;
use super::canonical::canonical;
use super::component::{decode_component, encode_component};
use super::leaf::{decode_envs, encode_envs, enum_leaf};
use super::observability::{AlertScope, decode_alert, encode_alert};
use super::policy::{decode_cors, encode_cors};
use super::{optional, repeated};
use crate::config::reader::Node;
use crate::config::schema::{APP_NAME_LENGTH, DEFAULT_REDIRECT_CODE};
use crate::config::value::{ConfigMap, ConfigValue, MapBuilder};
use crate::error::{EncodeError, EncodeResult};
use crate::spec::{
    AppSpec, ComponentKind, DatabaseEngine, DatabaseSpec, DomainSpec, DomainType, EgressSpec,
    EgressType, IngressComponent, IngressMatch, IngressRedirect, IngressRule, IngressSpec,
};

/// Builds an application from the root of a configuration tree.
pub(crate) fn encode_app(root: &Node<'_>) -> EncodeResult<AppSpec> {
    let name = root.str_required("name")?;
    let length = name.chars().count();
    if !APP_NAME_LENGTH.contains(i64::try_from(length).unwrap_or(i64::MAX)) {
        return Err(EncodeError::InvalidLength {
            path: root.at("name"),
            length,
            min: usize::try_from(APP_NAME_LENGTH.min).unwrap_or_default(),
            max: usize::try_from(APP_NAME_LENGTH.max).unwrap_or(usize::MAX),
        });
    }

    let mut app = AppSpec {
        name: name.to_string(),
        region: root.opt_string("region")?,
        disable_edge_cache: root.bool_or("disable_edge_cache", false)?,
        disable_email_obfuscation: root.bool_or("disable_email_obfuscation", false)?,
        enhanced_threat_control_enabled: root.bool_or("enhanced_threat_control_enabled", false)?,
        features: canonical(root.strings("features")?.into_iter().map(str::to_string)),
        domains: encode_domains(root)?,
        components: Vec::new(),
        databases: repeated(root, "database", encode_database)?,
        envs: encode_envs(root, "env")?,
        alerts: root
            .blocks("alert")?
            .iter()
            .map(|alert| encode_alert(alert, AlertScope::App))
            .collect::<EncodeResult<_>>()?,
        ingress: optional(root, "ingress", encode_ingress)?,
        egress: optional(root, "egress", |node| {
            Ok(EgressSpec {
                egress_type: node.opt_enum::<EgressType>("type")?,
            })
        })?,
    };

    let mut names = BTreeSet::new();
    for kind in ComponentKind::ALL {
        for node in root.blocks(kind.key())? {
            let component = encode_component(kind, &node)?;
            if !names.insert(component.name().to_string()) {
                return Err(EncodeError::DuplicateName {
                    path: node.at("name"),
                    name: component.name().to_string(),
                });
            }
            app.push_component(component);
        }
    }

    Ok(app)
}

/// Reads the domain list. A non-empty `domain` list is authoritative and
/// the legacy `domains` set is then ignored.
fn encode_domains(root: &Node<'_>) -> EncodeResult<Vec<DomainSpec>> {
    if root.has("domain") {
        if root.has("domains") {
            warn!(path = %root.path(), "Both domain and domains are set, ignoring legacy domains");
        }
        return repeated(root, "domain", encode_domain);
    }

    let legacy = canonical(root.strings("domains")?);
    if !legacy.is_empty() {
        warn!(path = %root.path(), "The domains list is deprecated, use domain blocks");
    }
    Ok(legacy.into_iter().map(DomainSpec::hostname).collect())
}

fn encode_domain(node: &Node<'_>) -> EncodeResult<DomainSpec> {
    Ok(DomainSpec {
        domain: node.str_required("name")?.to_string(),
        domain_type: node.opt_enum::<DomainType>("type")?,
        wildcard: node.bool_or("wildcard", false)?,
        zone: node.opt_string("zone")?,
    })
}

fn encode_database(node: &Node<'_>) -> EncodeResult<DatabaseSpec> {
    Ok(DatabaseSpec {
        name: node.opt_string("name")?,
        engine: node.opt_enum::<DatabaseEngine>("engine")?,
        version: node.opt_string("version")?,
        production: node.bool_or("production", false)?,
        cluster_name: node.opt_string("cluster_name")?,
        db_name: node.opt_string("db_name")?,
        db_user: node.opt_string("db_user")?,
    })
}

fn encode_ingress(node: &Node<'_>) -> EncodeResult<IngressSpec> {
    Ok(IngressSpec {
        rules: repeated(node, "rule", encode_ingress_rule)?,
    })
}

fn encode_ingress_rule(node: &Node<'_>) -> EncodeResult<IngressRule> {
    Ok(IngressRule {
        matcher: optional(node, "match", |m| {
            Ok(IngressMatch {
                path_prefix: optional(m, "path", |path| path.opt_string("prefix"))?.flatten(),
            })
        })?,
        component: optional(node, "component", |c| {
            Ok(IngressComponent {
                name: c.opt_string("name")?,
                preserve_path_prefix: c.opt_bool("preserve_path_prefix")?,
                rewrite: c.opt_string("rewrite")?,
            })
        })?,
        redirect: optional(node, "redirect", |r| {
            Ok(IngressRedirect {
                uri: r.opt_string("uri")?,
                authority: r.opt_string("authority")?,
                port: r.opt_int("port")?,
                scheme: r.opt_string("scheme")?,
                redirect_code: r.opt_int("redirect_code")?.unwrap_or(DEFAULT_REDIRECT_CODE),
            })
        })?,
        cors: optional(node, "cors", encode_cors)?,
    })
}

/// Writes an application as a configuration tree.
///
/// The legacy `domains` set is always written; the structured `domain`
/// list only when the context asks for it.
pub(crate) fn decode_app(app: &AppSpec, context: DecodeContext) -> ConfigMap {
    let mut builder = MapBuilder::new()
        .field("name", app.name.as_str())
        .opt("region", app.region.as_deref())
        .field("disable_edge_cache", app.disable_edge_cache)
        .field("disable_email_obfuscation", app.disable_email_obfuscation)
        .field(
            "enhanced_threat_control_enabled",
            app.enhanced_threat_control_enabled,
        )
        .set("features", &app.features)
        .set("domains", app.domains.iter().map(|d| d.domain.as_str()));

    if context.structured_domains {
        builder = builder.list("domain", app.domains.iter().map(decode_domain).collect());
    }

    for kind in ComponentKind::ALL {
        builder = builder.list(
            kind.key(),
            app.components_of(kind)
                .map(|c| decode_component(c).into())
                .collect(),
        );
    }

    builder
        .list("database", app.databases.iter().map(decode_database).collect())
        .set("env", decode_envs(&app.envs))
        .list("alert", app.alerts.iter().map(decode_alert).collect())
        .block("ingress", app.ingress.as_ref().map(decode_ingress))
        .block(
            "egress",
            app.egress.map(|egress| {
                MapBuilder::new()
                    .opt("type", egress.egress_type.map(enum_leaf))
                    .build()
            }),
        )
        .build()
}

fn decode_domain(domain: &DomainSpec) -> ConfigValue {
    MapBuilder::new()
        .field("name", domain.domain.as_str())
        .opt("type", domain.domain_type.map(enum_leaf))
        .field("wildcard", domain.wildcard)
        .opt("zone", domain.zone.as_deref())
        .build()
        .into()
}

fn decode_database(db: &DatabaseSpec) -> ConfigValue {
    MapBuilder::new()
        .opt("name", db.name.as_deref())
        .opt("engine", db.engine.map(enum_leaf))
        .opt("version", db.version.as_deref())
        .field("production", db.production)
        .opt("cluster_name", db.cluster_name.as_deref())
        .opt("db_name", db.db_name.as_deref())
        .opt("db_user", db.db_user.as_deref())
        .build()
        .into()
}

fn decode_ingress(ingress: &IngressSpec) -> ConfigMap {
    let rules = ingress
        .rules
        .iter()
        .map(|rule| {
            MapBuilder::new()
                .block(
                    "match",
                    rule.matcher.as_ref().map(|m| {
                        let path = m
                            .path_prefix
                            .as_deref()
                            .map(|prefix| MapBuilder::new().field("prefix", prefix).build());
                        MapBuilder::new().block("path", path).build()
                    }),
                )
                .block(
                    "component",
                    rule.component.as_ref().map(|c| {
                        MapBuilder::new()
                            .opt("name", c.name.as_deref())
                            .opt("preserve_path_prefix", c.preserve_path_prefix)
                            .opt("rewrite", c.rewrite.as_deref())
                            .build()
                    }),
                )
                .block(
                    "redirect",
                    rule.redirect.as_ref().map(|r| {
                        MapBuilder::new()
                            .opt("uri", r.uri.as_deref())
                            .opt("authority", r.authority.as_deref())
                            .opt("port", r.port)
                            .opt("scheme", r.scheme.as_deref())
                            .field("redirect_code", r.redirect_code)
                            .build()
                    }),
                )
                .block("cors", rule.cors.as_ref().map(decode_cors))
                .build()
                .into()
        })
        .collect();
    MapBuilder::new().list("rule", rules).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reader::ExclusivePolicy;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn encode(fields: &ConfigMap) -> EncodeResult<AppSpec> {
        encode_app(&Node::root(fields, "spec", ExclusivePolicy::default()))
    }

    #[test]
    fn test_structured_domains_win_over_legacy() {
        let fields = tree(
            "name: shop\n\
             domains: [legacy.example.com]\n\
             domain:\n  - name: shop.example.com\n    type: PRIMARY\n    zone: example.com\n",
        );
        let app = encode(&fields).unwrap();
        assert_eq!(app.domains.len(), 1);
        assert_eq!(app.domains[0].domain, "shop.example.com");
        assert_eq!(app.domains[0].domain_type, Some(DomainType::Primary));
    }

    #[test]
    fn test_legacy_domains_when_no_structured_list() {
        let fields = tree("name: shop\ndomains: [b.example.com, a.example.com]\ndomain: []\n");
        let app = encode(&fields).unwrap();
        let hosts: Vec<_> = app.domains.iter().map(|d| d.domain.as_str()).collect();
        assert_eq!(hosts, ["a.example.com", "b.example.com"]);
        assert!(app.domains.iter().all(|d| d.domain_type.is_none()));
    }

    #[test]
    fn test_decode_domain_emission_follows_context() {
        let fields = tree("name: shop\ndomain:\n  - name: shop.example.com\n    wildcard: true\n");
        let app = encode(&fields).unwrap();

        let legacy = decode_app(&app, DecodeContext::default());
        assert_eq!(legacy["domains"], ConfigValue::set(["shop.example.com"]));
        assert!(!legacy.contains_key("domain"));

        let structured = decode_app(&app, DecodeContext { structured_domains: true });
        assert_eq!(structured["domain"], ConfigValue::List(vec![ConfigValue::Map(tree(
            "name: shop.example.com\nwildcard: true\n"
        ))]));
    }

    #[test]
    fn test_duplicate_component_names_rejected() {
        let fields = tree("name: shop\nservice:\n  - name: web\nworker:\n  - name: web\n");
        let err = encode(&fields).unwrap_err();
        assert_eq!(
            err,
            EncodeError::DuplicateName {
                path: String::from("spec.worker[0].name"),
                name: String::from("web"),
            }
        );
    }

    #[test]
    fn test_app_name_length() {
        assert!(matches!(
            encode(&tree("name: a\n")),
            Err(EncodeError::InvalidLength { length: 1, .. })
        ));
        let long = "x".repeat(33);
        assert!(encode(&tree(&format!("name: {long}\n"))).is_err());
        assert!(encode(&tree("name: ab\n")).is_ok());
    }

    #[test]
    fn test_app_alerts_use_app_rules() {
        let fields = tree("name: shop\nalert:\n  - rule: DEPLOYMENT_FAILED\n");
        let app = encode(&fields).unwrap();
        assert_eq!(app.alerts.len(), 1);

        let fields = tree("name: shop\nalert:\n  - rule: CPU_UTILIZATION\n");
        assert!(encode(&fields).is_err());
    }

    #[test]
    fn test_ingress_round_trip() {
        let fields = tree(
            r"
rule:
  - match:
      - path:
          - prefix: /api
    component:
      - name: api
        rewrite: /
  - match:
      - path:
          - prefix: /old
    redirect:
      - uri: /new
        redirect_code: 302
",
        );
        let node = Node::root(&fields, "ingress", ExclusivePolicy::default());
        let ingress = encode_ingress(&node).unwrap();
        assert_eq!(ingress.rules.len(), 2);
        assert_eq!(decode_ingress(&ingress), fields);
    }

    #[test]
    fn test_redirect_code_defaults() {
        let fields = tree("rule:\n  - redirect:\n      - uri: /x\n");
        let node = Node::root(&fields, "ingress", ExclusivePolicy::default());
        let ingress = encode_ingress(&node).unwrap();
        let redirect = ingress.rules[0].redirect.as_ref().unwrap();
        assert_eq!(redirect.redirect_code, DEFAULT_REDIRECT_CODE);
    }

    #[test]
    fn test_optional_nested_fields_accepted() {
        let fields = tree(
            r"
name: shop
database:
  - engine: PG
ingress:
  - rule:
      - match:
          - path:
              - prefix: ''
        component:
          - preserve_path_prefix: true
      - match: [{}]
egress:
  - {}
",
        );
        let app = encode(&fields).unwrap();
        assert_eq!(app.databases[0].name, None);
        let rules = &app.ingress.as_ref().unwrap().rules;
        assert_eq!(rules[0].matcher.as_ref().unwrap().path_prefix.as_deref(), Some(""));
        assert_eq!(rules[0].component.as_ref().unwrap().name, None);
        assert_eq!(rules[1].matcher.as_ref().unwrap().path_prefix, None);
        assert_eq!(app.egress, Some(EgressSpec::default()));

        let decoded = decode_app(&app, DecodeContext::default());
        let again = encode(&decoded).unwrap();
        assert_eq!(again, app);
    }

    #[test]
    fn test_redirect_port_unbounded() {
        let fields = tree("rule:\n  - redirect:\n      - port: 0\n");
        let node = Node::root(&fields, "ingress", ExclusivePolicy::default());
        let ingress = encode_ingress(&node).unwrap();
        assert_eq!(ingress.rules[0].redirect.as_ref().unwrap().port, Some(0));
    }

    #[test]
    fn test_database_round_trip() {
        let fields = tree(
            "name: shop\n\
             disable_edge_cache: false\n\
             disable_email_obfuscation: false\n\
             enhanced_threat_control_enabled: false\n\
             database:\n  - name: db\n    engine: PG\n    production: true\n    cluster_name: pg-prod\n",
        );
        let app = encode(&fields).unwrap();
        assert_eq!(decode_app(&app, DecodeContext::default()), fields);
    }
}

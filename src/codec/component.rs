//! Component variant dispatcher.
//!
//! Shared field groups are converted once, then a single match over
//! [`ComponentKind`] adds each kind's own fields. Keys a kind does not
//! declare are never read, whatever the input tree contains.

use tracing::warn;

use super::canonical::canonical;
use super::leaf::{decode_envs, encode_envs, enum_leaf};
use super::observability::{decode_observability, encode_observability};
use super::policy::{
    decode_autoscaling, decode_cors, decode_health_check, decode_route, encode_autoscaling,
    encode_cors, encode_health_check, encode_route,
};
use super::source::{decode_image, decode_source, encode_image, encode_source};
use super::termination::{decode_termination, encode_termination};
use super::{optional, repeated};
use crate::config::reader::Node;
use crate::config::schema::{IntRange, SCHEMA};
use crate::config::value::{ConfigMap, MapBuilder};
use crate::error::EncodeResult;
use crate::spec::{
    BuildSettings, Component, ComponentBase, ComponentKind, FunctionSpec, HttpRouting, JobKind,
    JobSpec, JobTermination, RuntimeSettings, ServiceSpec, ServiceTermination, StaticSiteSpec,
    WorkerSpec, WorkerTermination,
};

/// Reads a component of the given kind.
pub(crate) fn encode_component(kind: ComponentKind, node: &Node<'_>) -> EncodeResult<Component> {
    let base = encode_base(node)?;
    let ignored: Vec<&str> = node
        .fields()
        .keys()
        .map(String::as_str)
        .filter(|key| node.has(key) && !SCHEMA.accepts(kind, key))
        .collect();
    if !ignored.is_empty() {
        warn!(path = %node.path(), %kind, ?ignored, "Ignoring fields not applicable to component kind");
    }

    let component = match kind {
        ComponentKind::Service => Component::Service(ServiceSpec {
            base,
            build: encode_build(node)?,
            runtime: encode_runtime(node)?,
            routing: encode_routing(node)?,
            observability: encode_observability(node)?,
            http_port: node.opt_int("http_port")?,
            internal_ports: canonical(node.ints("internal_ports", IntRange::ANY)?),
            health_check: optional(node, "health_check", encode_health_check)?,
            autoscaling: optional(node, "autoscaling", encode_autoscaling)?,
            termination: optional(node, "termination", encode_termination::<ServiceTermination>)?
                .flatten(),
        }),
        ComponentKind::StaticSite => Component::StaticSite(StaticSiteSpec {
            base,
            build: encode_build(node)?,
            routing: encode_routing(node)?,
            output_dir: node.opt_string("output_dir")?,
            index_document: node.opt_string("index_document")?,
            error_document: node.opt_string("error_document")?,
            catchall_document: node.opt_string("catchall_document")?,
        }),
        ComponentKind::Worker => Component::Worker(WorkerSpec {
            base,
            build: encode_build(node)?,
            runtime: encode_runtime(node)?,
            observability: encode_observability(node)?,
            termination: optional(node, "termination", encode_termination::<WorkerTermination>)?
                .flatten(),
        }),
        ComponentKind::Job => Component::Job(JobSpec {
            base,
            build: encode_build(node)?,
            runtime: encode_runtime(node)?,
            observability: encode_observability(node)?,
            kind: node.enum_or("kind", JobKind::Unspecified)?,
            termination: optional(node, "termination", encode_termination::<JobTermination>)?
                .flatten(),
        }),
        ComponentKind::Function => Component::Function(FunctionSpec {
            base,
            routing: encode_routing(node)?,
            observability: encode_observability(node)?,
        }),
    };
    Ok(component)
}

fn encode_base(node: &Node<'_>) -> EncodeResult<ComponentBase> {
    Ok(ComponentBase {
        name: node.str_required("name")?.to_string(),
        source: encode_source(node)?,
        envs: encode_envs(node, "env")?,
        source_dir: node.opt_string("source_dir")?,
        environment_slug: node.opt_string("environment_slug")?,
    })
}

fn encode_build(node: &Node<'_>) -> EncodeResult<BuildSettings> {
    Ok(BuildSettings {
        build_command: node.opt_string("build_command")?,
        dockerfile_path: node.opt_string("dockerfile_path")?,
    })
}

fn encode_runtime(node: &Node<'_>) -> EncodeResult<RuntimeSettings> {
    Ok(RuntimeSettings {
        run_command: node.opt_string("run_command")?,
        image: optional(node, "image", encode_image)?,
        instance_size_slug: node.opt_string("instance_size_slug")?,
        instance_count: node.opt_int("instance_count")?,
    })
}

fn encode_routing(node: &Node<'_>) -> EncodeResult<HttpRouting> {
    let routing = HttpRouting {
        routes: repeated(node, "routes", encode_route)?,
        cors: optional(node, "cors", encode_cors)?,
    };
    if !routing.routes.is_empty() {
        warn!(path = %node.path(), "Component routes are deprecated, use app ingress rules");
    }
    if routing.cors.is_some() {
        warn!(path = %node.path(), "Component CORS is deprecated, use app ingress rules");
    }
    Ok(routing)
}

/// Writes a component.
pub(crate) fn decode_component(component: &Component) -> ConfigMap {
    let mut builder = decode_base(component.base());
    if let Some(build) = component.build() {
        builder = builder
            .opt("build_command", build.build_command.as_deref())
            .opt("dockerfile_path", build.dockerfile_path.as_deref());
    }
    if let Some(runtime) = component.runtime() {
        builder = builder
            .opt("run_command", runtime.run_command.as_deref())
            .block("image", runtime.image.as_ref().map(decode_image))
            .opt("instance_size_slug", runtime.instance_size_slug.as_deref())
            .opt("instance_count", runtime.instance_count);
    }
    if let Some(routing) = component.routing() {
        builder = builder
            .list("routes", routing.routes.iter().map(decode_route).collect())
            .block("cors", routing.cors.as_ref().map(decode_cors));
    }
    if let Some(observability) = component.observability() {
        builder = decode_observability(builder, observability);
    }

    let builder = match component {
        Component::Service(service) => builder
            .opt("http_port", service.http_port)
            .set("internal_ports", service.internal_ports.iter().copied())
            .block(
                "health_check",
                service.health_check.as_ref().map(decode_health_check),
            )
            .block(
                "autoscaling",
                service.autoscaling.as_ref().map(decode_autoscaling),
            )
            .block(
                "termination",
                service.termination.as_ref().map(decode_termination),
            ),
        Component::StaticSite(site) => builder
            .opt("output_dir", site.output_dir.as_deref())
            .opt("index_document", site.index_document.as_deref())
            .opt("error_document", site.error_document.as_deref())
            .opt("catchall_document", site.catchall_document.as_deref()),
        Component::Worker(worker) => builder.block(
            "termination",
            worker.termination.as_ref().map(decode_termination),
        ),
        Component::Job(job) => builder
            .field("kind", enum_leaf(job.kind))
            .block("termination", job.termination.as_ref().map(decode_termination)),
        Component::Function(_) => builder,
    };
    builder.build()
}

fn decode_base(base: &ComponentBase) -> MapBuilder {
    let builder = MapBuilder::new()
        .field("name", base.name.as_str())
        .set("env", decode_envs(&base.envs))
        .opt("source_dir", base.source_dir.as_deref())
        .opt("environment_slug", base.environment_slug.as_deref());
    match &base.source {
        Some(source) => {
            let (key, fields) = decode_source(source);
            builder.block(key, Some(fields))
        }
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reader::ExclusivePolicy;
    use crate::config::value::ConfigValue;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn encode(kind: ComponentKind, fields: &ConfigMap) -> Component {
        let node = Node::root(fields, "component", ExclusivePolicy::default());
        encode_component(kind, &node).unwrap()
    }

    #[test]
    fn test_static_site_ignores_runtime_only_fields() {
        let fields = tree(
            "name: docs\n\
             output_dir: public\n\
             alert:\n  - rule: CPU_UTILIZATION\n    operator: GREATER_THAN\n    window: ONE_HOUR\n    value: 1\n\
             log_destination:\n  - name: lt\n    logtail:\n      - token: t\n\
             autoscaling:\n  - min_instance_count: 1\n\
             termination:\n  - grace_period_seconds: 9999\n",
        );
        let site = encode(ComponentKind::StaticSite, &fields);
        assert!(site.observability().is_none());
        assert!(site.autoscaling().is_none());
        assert!(site.termination().is_none());

        let decoded = decode_component(&site);
        assert!(!decoded.contains_key("alert"));
        assert!(!decoded.contains_key("termination"));
        assert_eq!(decoded["output_dir"], ConfigValue::from("public"));
    }

    #[test]
    fn test_service_round_trip() {
        let fields = tree(
            "name: web\n\
             github:\n  - repo: acme/web\n    branch: main\n    deploy_on_push: true\n\
             build_command: npm run build\n\
             run_command: npm start\n\
             http_port: 8080\n\
             instance_size_slug: basic-xxs\n\
             instance_count: 2\n\
             health_check:\n  - http_path: /healthz\n\
             termination:\n  - grace_period_seconds: 30\n    drain_seconds: 20\n\
             alert:\n  - rule: CPU_UTILIZATION\n    operator: GREATER_THAN\n    window: TEN_MINUTES\n    value: 80\n    disabled: false\n",
        );
        let service = encode(ComponentKind::Service, &fields);
        assert_eq!(decode_component(&service), fields);
    }

    #[test]
    fn test_job_kind_defaults_to_unspecified() {
        let fields = tree("name: migrate\n");
        let job = encode(ComponentKind::Job, &fields);
        let Component::Job(spec) = &job else {
            panic!("expected job");
        };
        assert_eq!(spec.kind, JobKind::Unspecified);
        assert_eq!(decode_component(&job)["kind"], ConfigValue::from("UNSPECIFIED"));
    }

    #[test]
    fn test_function_has_no_build_fields() {
        let fields = tree("name: fn\nbuild_command: make\n");
        let function = encode(ComponentKind::Function, &fields);
        assert!(!decode_component(&function).contains_key("build_command"));
    }

    #[test]
    fn test_internal_ports_are_canonical() {
        let a = encode(ComponentKind::Service, &tree("name: a\ninternal_ports: [9000, 8080]\n"));
        let b = encode(ComponentKind::Service, &tree("name: a\ninternal_ports: [8080, 9000, 8080]\n"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_worker_termination_drops_drain() {
        let fields = tree(
            "name: queue\ntermination:\n  - grace_period_seconds: 30\n    drain_seconds: 20\n",
        );
        let worker = encode(ComponentKind::Worker, &fields);
        let termination = worker.termination().unwrap();
        assert_eq!(termination.grace_period_seconds, Some(30));
        assert_eq!(termination.drain_seconds, None);
    }

    #[test]
    fn test_unbounded_service_ints_accepted() {
        let fields = tree("name: api\nhttp_port: 0\ninstance_count: 0\ninternal_ports: [70000]\n");
        let Component::Service(service) = encode(ComponentKind::Service, &fields) else {
            panic!("expected service");
        };
        assert_eq!(service.http_port, Some(0));
        assert_eq!(service.runtime.instance_count, Some(0));
        assert_eq!(service.internal_ports, [70_000]);
    }

    #[test]
    fn test_empty_termination_block_is_dropped() {
        let fields = tree("name: queue\ntermination:\n  - {}\n");
        let worker = encode(ComponentKind::Worker, &fields);
        assert!(worker.termination().is_none());
    }

    #[test]
    fn test_missing_name_is_reported() {
        let fields = tree("run_command: x\n");
        let node = Node::root(&fields, "spec.worker[1]", ExclusivePolicy::default());
        let err = encode_component(ComponentKind::Worker, &node).unwrap_err();
        assert_eq!(err.path(), "spec.worker[1].name");
    }
}

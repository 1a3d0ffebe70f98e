//! Source-control and container-image references.

use super::{Reader, one_of, optional};
use crate::config::reader::Node;
use crate::config::value::{ConfigMap, MapBuilder};
use crate::error::EncodeResult;
use crate::spec::{
    GitServiceSourceSpec, GitSourceSpec, ImageDeployOnPush, ImageSourceSpec, RegistryType,
    SourceSpec,
};

use super::leaf::enum_leaf;

/// Source kinds in encode precedence order.
const SOURCES: [(&str, Reader<SourceSpec>); 4] = [
    ("git", read_git),
    ("github", read_github),
    ("gitlab", read_gitlab),
    ("bitbucket", read_bitbucket),
];

fn read_git(node: &Node<'_>) -> EncodeResult<SourceSpec> {
    Ok(SourceSpec::Git(GitSourceSpec {
        repo_clone_url: node.opt_string("repo_clone_url")?,
        branch: node.opt_string("branch")?,
    }))
}

fn read_git_service(node: &Node<'_>) -> EncodeResult<GitServiceSourceSpec> {
    Ok(GitServiceSourceSpec {
        repo: node.opt_string("repo")?,
        branch: node.opt_string("branch")?,
        deploy_on_push: node.opt_bool("deploy_on_push")?,
    })
}

fn read_github(node: &Node<'_>) -> EncodeResult<SourceSpec> {
    read_git_service(node).map(SourceSpec::Github)
}

fn read_gitlab(node: &Node<'_>) -> EncodeResult<SourceSpec> {
    read_git_service(node).map(SourceSpec::Gitlab)
}

fn read_bitbucket(node: &Node<'_>) -> EncodeResult<SourceSpec> {
    read_git_service(node).map(SourceSpec::Bitbucket)
}

/// Reads the component's source reference, if any.
pub(crate) fn encode_source(node: &Node<'_>) -> EncodeResult<Option<SourceSpec>> {
    one_of(node, &SOURCES)
}

/// Writes a source reference as `(key, block)`.
pub(crate) fn decode_source(source: &SourceSpec) -> (&'static str, ConfigMap) {
    let fields = match source {
        SourceSpec::Git(git) => MapBuilder::new()
            .opt("repo_clone_url", git.repo_clone_url.as_deref())
            .opt("branch", git.branch.as_deref())
            .build(),
        SourceSpec::Github(repo) | SourceSpec::Gitlab(repo) | SourceSpec::Bitbucket(repo) => {
            MapBuilder::new()
                .opt("repo", repo.repo.as_deref())
                .opt("branch", repo.branch.as_deref())
                .opt("deploy_on_push", repo.deploy_on_push)
                .build()
        }
    };
    (source.key(), fields)
}

/// Reads an `image` block.
pub(crate) fn encode_image(node: &Node<'_>) -> EncodeResult<ImageSourceSpec> {
    Ok(ImageSourceSpec {
        registry_type: node.enum_required::<RegistryType>("registry_type")?,
        registry: node.opt_string("registry")?,
        repository: node.str_required("repository")?.to_string(),
        tag: node.opt_string("tag")?,
        digest: node.opt_string("digest")?,
        registry_credentials: node.opt_string("registry_credentials")?,
        deploy_on_push: optional(node, "deploy_on_push", |block| {
            Ok(ImageDeployOnPush {
                enabled: block.opt_bool("enabled")?,
            })
        })?,
    })
}

/// Writes an `image` block.
pub(crate) fn decode_image(image: &ImageSourceSpec) -> ConfigMap {
    MapBuilder::new()
        .field("registry_type", enum_leaf(image.registry_type))
        .opt("registry", image.registry.as_deref())
        .field("repository", image.repository.as_str())
        .opt("tag", image.tag.as_deref())
        .opt("digest", image.digest.as_deref())
        .opt("registry_credentials", image.registry_credentials.as_deref())
        .block(
            "deploy_on_push",
            image
                .deploy_on_push
                .as_ref()
                .map(|d| MapBuilder::new().opt("enabled", d.enabled).build()),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reader::ExclusivePolicy;
    use crate::config::value::ConfigValue;
    use crate::error::EncodeError;

    fn tree(yaml: &str) -> ConfigMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_source_round_trip() {
        let fields = tree("gitlab:\n  - repo: acme/api\n    branch: main\n    deploy_on_push: true\n");
        let node = Node::root(&fields, "spec", ExclusivePolicy::default());
        let source = encode_source(&node).unwrap().unwrap();
        assert_eq!(source.key(), "gitlab");

        let (key, block) = decode_source(&source);
        let mut decoded = ConfigMap::new();
        decoded.insert(key.to_string(), ConfigValue::block(block));
        assert_eq!(decoded, fields);
    }

    #[test]
    fn test_first_present_source_wins() {
        let fields = tree(
            "bitbucket:\n  - repo: b/b\ngit:\n  - repo_clone_url: https://example.com/r.git\n",
        );
        let node = Node::root(&fields, "spec", ExclusivePolicy::FirstPresent);
        let source = encode_source(&node).unwrap().unwrap();
        assert!(matches!(source, SourceSpec::Git(_)));
    }

    #[test]
    fn test_strict_rejects_two_sources() {
        let fields = tree("github:\n  - repo: a/a\ngitlab:\n  - repo: b/b\n");
        let node = Node::root(&fields, "spec", ExclusivePolicy::Reject);
        assert!(matches!(
            encode_source(&node),
            Err(EncodeError::ConflictingFields { .. })
        ));
    }

    #[test]
    fn test_image_requires_registry_type() {
        let fields = tree("repository: web\n");
        let node = Node::root(&fields, "spec.service[0].image", ExclusivePolicy::default());
        let err = encode_image(&node).unwrap_err();
        assert_eq!(err.path(), "spec.service[0].image.registry_type");
    }

    #[test]
    fn test_image_round_trip() {
        let fields = tree(
            "registry_type: DOCR\nrepository: web\ntag: v1\ndeploy_on_push:\n  - enabled: true\n",
        );
        let node = Node::root(&fields, "image", ExclusivePolicy::default());
        let image = encode_image(&node).unwrap();
        assert_eq!(image.registry_type, RegistryType::Docr);
        assert_eq!(decode_image(&image), fields);
    }
}

//! Source references: where a component's code or image comes from.

use serde::{Deserialize, Serialize};

use super::enums::RegistryType;

/// Source-control reference of a component.
///
/// At most one kind is ever populated on a component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    /// Plain git repository reachable by clone URL.
    Git(GitSourceSpec),
    /// GitHub repository.
    Github(GitServiceSourceSpec),
    /// GitLab repository.
    Gitlab(GitServiceSourceSpec),
    /// Bitbucket repository.
    Bitbucket(GitServiceSourceSpec),
}

impl SourceSpec {
    /// Config-tree keys of the source kinds, in encode precedence order.
    pub const KEYS: [&'static str; 4] = ["git", "github", "gitlab", "bitbucket"];

    /// Returns the config-tree key of this source kind.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Git(_) => "git",
            Self::Github(_) => "github",
            Self::Gitlab(_) => "gitlab",
            Self::Bitbucket(_) => "bitbucket",
        }
    }
}

/// Inline git source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GitSourceSpec {
    /// Clone URL of the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_clone_url: Option<String>,
    /// Branch to build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Hosted git provider source (GitHub, GitLab, Bitbucket).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GitServiceSourceSpec {
    /// Repository in `owner/repo` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Branch to build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Whether new commits trigger a deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_on_push: Option<bool>,
}

/// Prebuilt container image reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageSourceSpec {
    /// Registry type.
    pub registry_type: RegistryType,
    /// Registry name; left empty for the platform registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// Repository name.
    pub repository: String,
    /// Image tag. Not combined with `digest` by convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Image digest. Not combined with `tag` by convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Credentials for third-party registries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_credentials: Option<String>,
    /// Automatic deploys on image push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_on_push: Option<ImageDeployOnPush>,
}

/// Deploy-on-push toggle of an image reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageDeployOnPush {
    /// Whether pushed images are deployed automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

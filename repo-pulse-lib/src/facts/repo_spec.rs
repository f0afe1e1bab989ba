use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Identifies a repository on the hosting service by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSpec {
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    pub fn new(owner: &str, repo: &str) -> Result<Self> {
        let repo = repo.trim_end_matches(".git");

        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository: empty owner or repo name in '{owner}/{repo}'");
        }

        if [owner, repo].iter().any(|s| s.contains(['/', '?', '#']) || s.chars().any(char::is_whitespace)) {
            bail!("invalid repository: unexpected characters in '{owner}/{repo}'");
        }

        Ok(Self {
            owner: Arc::from(owner),
            repo: Arc::from(repo),
        })
    }

    /// Extract the owner and repository from a web URL such as `https://github.com/owner/repo/tree/main`.
    pub fn from_url(url: &Url) -> Result<Self> {
        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();

        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        Self::new(path_segments[0], path_segments[1])
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl FromStr for RepoSpec {
    type Err = ohno::AppError;

    /// Accepts either `owner/repo` or a repository URL.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.contains("://") {
            let url = Url::parse(s).into_app_err_with(|| format!("parsing repository URL '{s}'"))?;
            return Self::from_url(&url);
        }

        let Some((owner, repo)) = s.split_once('/') else {
            bail!("invalid repository '{s}': expected 'owner/repo' or a repository URL");
        };

        Self::new(owner, repo.trim_end_matches('/'))
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

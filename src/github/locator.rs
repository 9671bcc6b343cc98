//! Repository identity wrappers and REST path derivation.

use url::Url;

use super::error::IngestError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, IngestError> {
        if value.is_empty() {
            return Err(IngestError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, IngestError> {
        if value.is_empty() {
            return Err(IngestError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, IngestError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IngestError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Derives the GitHub API base URL from a host string.
fn derive_api_base_from_host(
    scheme: &str,
    host: &str,
    port: Option<u16>,
) -> Result<Url, IngestError> {
    if host.eq_ignore_ascii_case("github.com") {
        Url::parse("https://api.github.com")
            .map_err(|error| IngestError::InvalidUrl(error.to_string()))
    } else {
        let authority = if host.contains(':') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let mut api_url = Url::parse(&format!("{scheme}://{authority}"))
            .map_err(|error| IngestError::InvalidUrl(error.to_string()))?;

        api_url
            .set_port(port)
            .map_err(|()| IngestError::InvalidUrl("invalid port".to_owned()))?;
        api_url.set_path("api/v3");
        Ok(api_url)
    }
}

/// Repository coordinates plus the API base derived from the host.
///
/// This is the only address the ingestion pipeline needs: listings, commit
/// collections, and per-commit statistics are all repository-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a repository locator from owner and repository name strings,
    /// using `github.com` as the host.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::MissingPathSegments` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, IngestError> {
        let validated_owner = RepositoryOwner::new(owner)?;
        let repository = RepositoryName::new(repo)?;
        let api_base = Url::parse("https://api.github.com")
            .map_err(|error| IngestError::InvalidUrl(error.to_string()))?;

        Ok(Self {
            api_base,
            owner: validated_owner,
            repository,
        })
    }

    /// Parses a repository URL in the form `https://<host>/<owner>/<repo>`.
    ///
    /// Non-`github.com` hosts derive an `api/v3` base, which also lets tests
    /// point the gateway at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::InvalidUrl` when parsing fails or
    /// `MissingPathSegments` when the URL path is not `/owner/repo`.
    pub fn parse(input: &str) -> Result<Self, IngestError> {
        let parsed =
            Url::parse(input).map_err(|error| IngestError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(IngestError::MissingPathSegments)?;

        let owner_segment = segments.next().ok_or(IngestError::MissingPathSegments)?;
        let repository_segment = segments.next().ok_or(IngestError::MissingPathSegments)?;

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;

        let host = parsed
            .host_str()
            .ok_or_else(|| IngestError::InvalidUrl("URL must include a host".to_owned()))?;
        let api_base = derive_api_base_from_host(parsed.scheme(), host, parsed.port())?;

        Ok(Self {
            api_base,
            owner,
            repository,
        })
    }

    /// Resolves a configured repository reference.
    ///
    /// Accepts either a bare `owner/repo` pair or a full repository URL.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error for URLs, or
    /// `IngestError::MissingPathSegments` when an `owner/repo` pair is
    /// incomplete.
    pub fn from_reference(reference: &str) -> Result<Self, IngestError> {
        if reference.contains("://") {
            return Self::parse(reference);
        }

        match reference.split_once('/') {
            Some((owner, repo)) => Self::from_owner_repo(owner, repo),
            None => Err(IngestError::MissingPathSegments),
        }
    }

    /// API base URL derived from the repository host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns the API path for listing pull requests.
    pub(crate) fn pulls_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    /// Returns the API path for a pull request's commit collection.
    pub(crate) fn pull_commits_path(&self, number: u64) -> String {
        format!(
            "/repos/{}/{}/pulls/{number}/commits",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    /// Returns the API path for a single commit with statistics.
    pub(crate) fn commit_path(&self, sha: &str) -> String {
        format!(
            "/repos/{}/{}/commits/{sha}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}

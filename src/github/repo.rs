use std::str::FromStr;

use crate::error::MigrateError;

/// A repository on either host, `owner/name`.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Resolves `owner/name` as given, or a bare `name` against `default_owner`.
    pub fn resolve(spec: &str, default_owner: Option<&str>) -> Result<Self, MigrateError> {
        let spec = spec.trim();
        if spec.contains('/') {
            return spec.parse();
        }

        match default_owner {
            Some(owner) if !owner.is_empty() && !spec.is_empty() => Ok(RepoRef::new(owner, spec)),
            _ => Err(MigrateError::Configuration(format!(
                "Repository '{}' has no owner and no source organization is configured",
                spec
            ))),
        }
    }

    /// The same repository name under another owner.
    pub fn with_owner(&self, owner: &str) -> Self {
        RepoRef::new(owner, self.name.clone())
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            Err(MigrateError::Configuration(format!(
                "Invalid repository format '{}'. Expected 'owner/repo'.",
                s
            )))
        } else {
            Ok(RepoRef::new(parts[0], parts[1]))
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Author {
    pub login: String,
}

/// Represents a GitHub release asset
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: String,
}

/// Represents a GitHub release
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_commitish: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Hypermedia template, e.g. `https://uploads.github.com/.../assets{?name,label}`
    #[serde(default)]
    pub upload_url: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Name shown in logs; falls back to the tag for unnamed releases.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.tag_name,
        }
    }

    /// Payload that recreates this release elsewhere.
    ///
    /// `make_latest` is always "false": the latest flag is moved once, after
    /// every release of a repository has been migrated.
    pub fn to_new_release(&self) -> NewRelease {
        NewRelease {
            tag_name: self.tag_name.clone(),
            target_commitish: self.target_commitish.clone(),
            name: self.name.clone(),
            body: self.body.clone(),
            draft: self.draft,
            prerelease: self.prerelease,
            make_latest: "false".to_string(),
        }
    }
}

/// Request body for creating a release.
#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct NewRelease {
    pub tag_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_commitish: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub make_latest: String,
}

/// Sparse request body for editing a release.
#[derive(Serialize, Debug, PartialEq, Clone, Default)]
pub struct ReleasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_latest: Option<String>,
}

impl ReleasePatch {
    pub fn make_latest() -> Self {
        Self {
            make_latest: Some("true".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserializes_api_document() {
        let release: Release = serde_json::from_str(
            r#"{
                "id": 42,
                "tag_name": "v1.0.0",
                "name": "First",
                "target_commitish": "main",
                "body": "notes",
                "draft": false,
                "prerelease": true,
                "created_at": "2024-01-01T00:00:00Z",
                "published_at": "2024-01-02T00:00:00Z",
                "html_url": "https://github.com/o/r/releases/tag/v1.0.0",
                "upload_url": "https://uploads.github.com/repos/o/r/releases/42/assets{?name,label}",
                "author": { "login": "octocat" },
                "assets": [{
                    "id": 7,
                    "name": "app.zip",
                    "label": null,
                    "content_type": "application/zip",
                    "size": 1024,
                    "browser_download_url": "https://github.com/o/r/releases/download/v1.0.0/app.zip"
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(release.id, 42);
        assert_eq!(release.target_commitish, "main");
        assert!(release.prerelease);
        assert_eq!(release.author.unwrap().login, "octocat");
        assert_eq!(release.assets[0].size, 1024);
        assert_eq!(release.assets[0].label, None);
    }

    #[test]
    fn test_display_name_falls_back_to_tag() {
        let mut release = Release {
            tag_name: "v2".to_string(),
            ..Default::default()
        };
        assert_eq!(release.display_name(), "v2");

        release.name = Some(String::new());
        assert_eq!(release.display_name(), "v2");

        release.name = Some("Second".to_string());
        assert_eq!(release.display_name(), "Second");
    }

    #[test]
    fn test_new_release_never_claims_latest() {
        let release = Release {
            id: 9,
            tag_name: "v1".to_string(),
            name: Some("One".to_string()),
            target_commitish: "main".to_string(),
            body: Some("body".to_string()),
            ..Default::default()
        };

        let payload = serde_json::to_value(release.to_new_release()).unwrap();
        assert_eq!(payload["make_latest"], "false");
        assert_eq!(payload["tag_name"], "v1");
        assert_eq!(payload["target_commitish"], "main");
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn test_release_patch_is_sparse() {
        let patch = serde_json::to_string(&ReleasePatch::make_latest()).unwrap();
        assert_eq!(patch, r#"{"make_latest":"true"}"#);
        assert_eq!(serde_json::to_string(&ReleasePatch::default()).unwrap(), "{}");
    }
}

use anyhow::Result;
use chrono::{SecondsFormat, Utc};

use super::BodyTransform;
use crate::github::{Release, RepoRef};

/// Appends a footer recording where a release came from and when it moved.
pub struct ProvenanceStamp {
    migrated_at: String,
}

impl ProvenanceStamp {
    pub fn now() -> Self {
        Self::at(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn at(migrated_at: impl Into<String>) -> Self {
        Self {
            migrated_at: migrated_at.into(),
        }
    }

    fn footer(&self, source: &RepoRef, release: &Release) -> String {
        let origin = match release.html_url.as_deref() {
            Some(url) if !url.is_empty() => format!("[{}]({})", release.tag_name, url),
            _ => format!("`{}`", release.tag_name),
        };

        let mut lines = vec![format!("> Migrated from `{}` release {}", source, origin)];

        let mut details = Vec::new();
        if let Some(created) = release.created_at.as_deref() {
            details.push(format!("created {}", created));
        }
        if let Some(published) = release.published_at.as_deref() {
            details.push(format!("published {}", published));
        }
        if let Some(author) = release.author.as_ref() {
            details.push(format!("by @{}", author.login));
        }
        if !details.is_empty() {
            lines.push(format!("> Originally {}", details.join(", ")));
        }

        lines.push(format!("> Migrated at {}", self.migrated_at));
        lines.join("\n")
    }
}

impl BodyTransform for ProvenanceStamp {
    fn name(&self) -> &str {
        "source timestamps"
    }

    fn transform(&self, source: &RepoRef, release: &Release, body: &str) -> Result<String> {
        let footer = self.footer(source, release);
        let body = body.trim_end();
        if body.is_empty() {
            Ok(footer)
        } else {
            Ok(format!("{}\n\n---\n{}", body, footer))
        }
    }
}

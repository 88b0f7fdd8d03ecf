use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use super::BodyTransform;
use crate::error::MigrateError;
use crate::github::{Release, RepoRef};
use crate::runtime::Runtime;

/// Rewrites user mentions and URLs according to a mapping file.
///
/// Each line holds one `source,target` pair. Pairs that look like handles
/// (no `/` and no `:`) rewrite `@source` mentions; every other pair is a
/// literal replacement, applied longest source first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HandleMapping {
    handles: HashMap<String, String>,
    replacements: Vec<(String, String)>,
}

impl HandleMapping {
    pub fn load<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Self, MigrateError> {
        let content = runtime.read_to_string(path).map_err(|e| {
            MigrateError::Configuration(format!(
                "Unable to read mapping file {:?}: {:#}",
                path, e
            ))
        })?;
        Self::parse(&content).map_err(|e| match e {
            MigrateError::Configuration(msg) => {
                MigrateError::Configuration(format!("{:?}: {}", path, msg))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, MigrateError> {
        let mut mapping = HandleMapping::default();
        let mut seen_entry = false;

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if !seen_entry && parts.len() == 2 && parts[0].eq_ignore_ascii_case("source") {
                seen_entry = true;
                continue;
            }
            seen_entry = true;

            if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
                return Err(MigrateError::Configuration(format!(
                    "line {}: expected 'source,target', got '{}'",
                    index + 1,
                    line
                )));
            }

            let (from, to) = (parts[0], parts[1]);
            if is_handle(from) && is_handle(to) {
                mapping.handles.insert(
                    from.trim_start_matches('@').to_ascii_lowercase(),
                    to.trim_start_matches('@').to_string(),
                );
            } else {
                mapping.replacements.push((from.to_string(), to.to_string()));
            }
        }

        mapping
            .replacements
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Ok(mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty() && self.replacements.is_empty()
    }

    fn rewrite_mentions(&self, body: &str) -> String {
        let mut out = String::with_capacity(body.len());
        let mut chars = body.char_indices().peekable();
        let mut prev: Option<char> = None;

        while let Some((start, c)) = chars.next() {
            if c != '@' || prev.is_some_and(|p| p.is_alphanumeric() || p == '`') {
                out.push(c);
                prev = Some(c);
                continue;
            }

            let mut end = start + 1;
            while let Some(&(i, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '-' {
                    end = i + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }

            let handle = &body[start + 1..end];
            match self.handles.get(&handle.to_ascii_lowercase()) {
                Some(target) if !handle.is_empty() => {
                    out.push('@');
                    out.push_str(target);
                }
                _ => out.push_str(&body[start..end]),
            }
            prev = body[..end].chars().next_back();
        }

        out
    }
}

fn is_handle(value: &str) -> bool {
    !value.contains('/') && !value.contains(':')
}

impl BodyTransform for HandleMapping {
    fn name(&self) -> &str {
        "handle mapping"
    }

    fn transform(&self, _source: &RepoRef, _release: &Release, body: &str) -> Result<String> {
        let mut body = body.to_string();
        for (from, to) in &self.replacements {
            body = body.replace(from.as_str(), to);
        }
        if !self.handles.is_empty() {
            body = self.rewrite_mentions(&body);
        }
        Ok(body)
    }
}

use log::{debug, info, warn};
use serde_json::Value;

use crate::github::{IssueComments, RepoRef};
use crate::migrate::Outcome;
use crate::runtime::Runtime;

/// The issue a workflow run was triggered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueContext {
    pub repo: RepoRef,
    pub number: u64,
}

/// True when running inside a GitHub Actions job.
pub fn in_github_actions<R: Runtime + ?Sized>(runtime: &R) -> bool {
    runtime.env_var("CI").is_ok_and(|v| v == "true")
        && runtime.env_var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Reads the issue number and repository out of a `GITHUB_CONTEXT` dump.
///
/// Accepts either the event payload itself or the full `github` context,
/// where the payload sits under `event`. Returns `None` for non-issue events.
pub fn parse_issue_context(context: &str) -> Option<IssueContext> {
    let value: Value = serde_json::from_str(context).ok()?;
    let event = match value.get("event") {
        Some(event) if event.get("issue").is_some() => event,
        _ => &value,
    };

    let number = event.pointer("/issue/number")?.as_u64()?;
    let name = event.pointer("/repository/name")?.as_str()?;
    let owner = event.pointer("/repository/owner/login")?.as_str()?;
    if number == 0 || name.is_empty() || owner.is_empty() {
        return None;
    }

    Some(IssueContext {
        repo: RepoRef::new(owner, name),
        number,
    })
}

pub fn summary_table(outcome: &Outcome) -> String {
    format!(
        "| No. of Releases | Succeeded | Failed |\n\
         | --------------- | --------- | ------ |\n\
         | {} | {} | {} |\n",
        outcome.releases,
        outcome.succeeded(),
        outcome.failed
    )
}

/// Reports run totals: as an issue comment inside an issue-triggered
/// workflow, on stdout everywhere else.
pub async fn report<R, C>(runtime: &R, comments: &C, outcome: &Outcome)
where
    R: Runtime + ?Sized,
    C: IssueComments + ?Sized,
{
    if !in_github_actions(runtime) {
        println!("Total Releases: {}", outcome.releases);
        println!("Succeeded: {}", outcome.succeeded());
        println!("Failed: {}", outcome.failed);
        return;
    }

    let context = match runtime.env_var("GITHUB_CONTEXT") {
        Ok(context) => context,
        Err(_) => {
            debug!("GITHUB_CONTEXT is not set, skipping summary comment");
            return;
        }
    };

    let Some(issue) = parse_issue_context(&context) else {
        debug!("Workflow was not triggered by an issue, skipping summary comment");
        return;
    };

    info!("Posting summary to {}#{}", issue.repo, issue.number);
    if let Err(e) = comments
        .create_issue_comment(&issue.repo, issue.number, &summary_table(outcome))
        .await
    {
        warn!("Error writing releases table to issue: {}", e);
    }
}

//! Rendering of tool responses on the command line.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::types::ToolResponse;

/// Write `response` either as the JSON envelope or as a short human summary.
pub fn write_response<T: Serialize>(
    response: &ToolResponse<T>,
    json: bool,
    out: &mut impl std::io::Write,
) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(response)?)?;
        return Ok(());
    }

    match response {
        ToolResponse::Success { message, data } => {
            writeln!(out, "{} {}", "✓".green(), message)?;
            if let Value::Object(fields) = serde_json::to_value(data)? {
                for (key, value) in &fields {
                    write_field(out, key, value)?;
                }
            }
        }
        ToolResponse::Failure { message, error } => {
            writeln!(out, "{} {}", "✗".red(), message.red())?;
            for line in error.lines() {
                writeln!(out, "  {}", line)?;
            }
        }
    }
    Ok(())
}

fn write_field(out: &mut impl std::io::Write, key: &str, value: &Value) -> Result<()> {
    match value {
        Value::String(text) if text.contains('\n') => {
            writeln!(out, "  {}:", key.cyan())?;
            for line in text.lines() {
                writeln!(out, "    {}", line.dimmed())?;
            }
        }
        Value::Array(items) if items.is_empty() => writeln!(out, "  {}: (none)", key.cyan())?,
        Value::Array(items) => {
            writeln!(out, "  {}:", key.cyan())?;
            for item in items {
                writeln!(out, "    - {}", inline(item))?;
            }
        }
        other => writeln!(out, "  {}: {}", key.cyan(), inline(other))?,
    }
    Ok(())
}

fn inline(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, inline(value)))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::github::WorkflowRun;
    use crate::types::CommitData;
    use crate::types::RepoStatusData;
    use crate::types::WorkflowStatusData;

    fn render<T: Serialize>(response: &ToolResponse<T>, json: bool) -> String {
        let mut out = Vec::new();
        write_response(response, json, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_success_summary() {
        let response = ToolResponse::success(
            "Committed files to branch: feature/x",
            CommitData {
                branch_name: "feature/x".to_string(),
                commit_sha: "4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string(),
                pushed: true,
            },
        );
        insta::assert_snapshot!(render(&response, false), @r"
        ✓ Committed files to branch: feature/x
          branch_name: feature/x
          commit_sha: 4b825dc642cb6eb9a060e54bf8d69288fbee4904
          pushed: true
        ");
    }

    #[test]
    fn test_multiline_and_list_fields() {
        let response = ToolResponse::success(
            "Repository status for branch: main",
            RepoStatusData {
                branch: "main".to_string(),
                commit_sha: "abc".to_string(),
                status: "On branch main\nnothing to commit, working tree clean".to_string(),
            },
        );
        insta::assert_snapshot!(render(&response, false), @r"
        ✓ Repository status for branch: main
          branch: main
          commit_sha: abc
          status:
            On branch main
            nothing to commit, working tree clean
        ");

        let response = ToolResponse::success(
            "Retrieved workflow status for PR #7",
            WorkflowStatusData {
                pr_number: 7,
                workflow_runs: vec![WorkflowRun {
                    id: 11,
                    name: Some("CI".to_string()),
                    status: Some("in_progress".to_string()),
                    conclusion: None,
                    url: "https://github.com/octo/widgets/actions/runs/11".to_string(),
                }],
            },
        );
        insta::assert_snapshot!(render(&response, false), @r"
        ✓ Retrieved workflow status for PR #7
          pr_number: 7
          workflow_runs:
            - conclusion=- id=11 name=CI status=in_progress url=https://github.com/octo/widgets/actions/runs/11
        ");
    }

    #[test]
    fn test_failure_summary() {
        let response: ToolResponse<CommitData> = ToolResponse::failure(
            "Failed to push branch",
            "remote rejected push: command exited with exit status: 1: `git push -u origin main`: ! [remote rejected] main -> main",
        );
        insta::assert_snapshot!(render(&response, false), @r"
        ✗ Failed to push branch
          remote rejected push: command exited with exit status: 1: `git push -u origin main`: ! [remote rejected] main -> main
        ");
    }

    #[test]
    fn test_json_is_the_envelope() {
        let response: ToolResponse<CommitData> =
            ToolResponse::failure("Failed to commit files", "nothing to commit");
        let value: Value = serde_json::from_str(&render(&response, true)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "nothing to commit");
        assert!(value["data"].is_null());
    }
}

//! Handler validating a paper's references.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use regex::Regex;

use crate::engine::domain::{Task, TaskEffect, TaskError, TaskResult};
use crate::engine::ports::handler::{HandlerContext, TaskHandler};

const CITATION_PATTERN: &str = r"\[(\d+)\]";
const ENTRY_PATTERN: &str = r"^\[(\d+)\]\s+(.+)$";
const URL_PATTERN: &str = r"https?://\S+";

/// Deterministic handler checking a paper's reference section.
///
/// The paper must close with a References section whose numbered
/// entries match the citations in the body text, and every entry must
/// carry a well-formed URL. Problems are reported together, so one
/// failure names everything wrong with the section at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceValidationHandler;

fn compile(pattern: &str) -> Result<Regex, TaskError> {
    Regex::new(pattern).map_err(|error| TaskError::Validation {
        reason: format!("reference pattern failed to compile: {error}"),
    })
}

fn heading_position(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| {
        line.trim_start_matches('#')
            .trim()
            .eq_ignore_ascii_case("references")
    })
}

fn collect_citations(lines: &[&str], heading: usize, pattern: &Regex) -> BTreeSet<u32> {
    let mut cited = BTreeSet::new();
    for line in lines.iter().take(heading) {
        for captures in pattern.captures_iter(line) {
            let parsed = captures
                .get(1)
                .and_then(|digits| digits.as_str().parse::<u32>().ok());
            if let Some(number) = parsed {
                cited.insert(number);
            }
        }
    }
    cited
}

fn collect_entries(
    lines: &[&str],
    heading: usize,
    pattern: &Regex,
    problems: &mut Vec<String>,
) -> BTreeMap<u32, String> {
    let mut entries = BTreeMap::new();
    for line in lines.iter().skip(heading + 1) {
        let Some(captures) = pattern.captures(line.trim()) else {
            continue;
        };
        let parsed = captures
            .get(1)
            .and_then(|digits| digits.as_str().parse::<u32>().ok());
        let text = captures.get(2).map(|rest| rest.as_str().to_owned());
        if let (Some(number), Some(entry)) = (parsed, text) {
            if entries.insert(number, entry).is_some() {
                problems.push(format!("reference [{number}] appears more than once"));
            }
        }
    }
    entries
}

fn check_entries(
    entries: &BTreeMap<u32, String>,
    cited: &BTreeSet<u32>,
    url_pattern: &Regex,
    problems: &mut Vec<String>,
) {
    for number in cited {
        if !entries.contains_key(number) {
            problems.push(format!("citation [{number}] has no matching reference entry"));
        }
    }
    for (number, entry) in entries {
        if !cited.contains(number) {
            problems.push(format!("reference [{number}] is never cited in the text"));
        }
        let parsed_url = url_pattern
            .find(entry)
            .map(|found| reqwest::Url::parse(found.as_str()));
        match parsed_url {
            None => problems.push(format!("reference [{number}] lists no URL")),
            Some(Err(error)) => {
                problems.push(format!("reference [{number}] has a malformed URL: {error}"));
            }
            Some(Ok(_)) => {}
        }
    }
}

#[async_trait]
impl TaskHandler for ReferenceValidationHandler {
    async fn execute(&self, task: &Task, context: &HandlerContext) -> Result<TaskResult, TaskError> {
        let paper = context.require_material(task)?;
        let lines: Vec<&str> = paper.lines().collect();
        let Some(heading) = heading_position(&lines) else {
            return Err(TaskError::Validation {
                reason: "paper has no References section".to_owned(),
            });
        };

        let citation_pattern = compile(CITATION_PATTERN)?;
        let entry_pattern = compile(ENTRY_PATTERN)?;
        let url_pattern = compile(URL_PATTERN)?;

        let mut problems = Vec::new();
        let cited = collect_citations(&lines, heading, &citation_pattern);
        let entries = collect_entries(&lines, heading, &entry_pattern, &mut problems);
        if entries.is_empty() {
            problems.push("the References section lists no entries".to_owned());
        }
        check_entries(&entries, &cited, &url_pattern, &mut problems);

        if problems.is_empty() {
            Ok(TaskResult::new(task.clone(), TaskEffect::MarkValidated))
        } else {
            Err(TaskError::Validation {
                reason: problems.join("; "),
            })
        }
    }
}

//! Strict parsing of the judge's JSON verdict list.

use crate::error::{AssessError, Result};
use crate::model::{JudgedSource, RelevanceLabel};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct RawVerdict {
    source_num: u64,
    score: String,
}

/// Parse a reply for a chunk whose sources are numbered
/// `first_source_num..first_source_num + expected`.
///
/// Any deviation from that shape is a [`AssessError::JudgeFailure`]: no partial acceptance.
pub fn parse_verdicts(
    reply: &str,
    first_source_num: usize,
    expected: usize,
) -> Result<Vec<JudgedSource>> {
    let raw: Vec<RawVerdict> = serde_json::from_str(reply.trim()).map_err(|e| {
        AssessError::JudgeFailure(format!("reply is not a JSON verdict list: {}", e))
    })?;

    if raw.len() != expected {
        return Err(AssessError::JudgeFailure(format!(
            "expected {} verdicts, got {}",
            expected,
            raw.len()
        )));
    }

    let valid = first_source_num..first_source_num + expected;
    let mut seen = HashSet::with_capacity(expected);
    let mut verdicts = Vec::with_capacity(expected);

    for verdict in raw {
        let source_num = usize::try_from(verdict.source_num)
            .ok()
            .filter(|n| valid.contains(n))
            .ok_or_else(|| {
                AssessError::JudgeFailure(format!(
                    "source_num {} outside submitted range {}..={}",
                    verdict.source_num,
                    valid.start,
                    valid.end.saturating_sub(1)
                ))
            })?;

        if !seen.insert(source_num) {
            return Err(AssessError::JudgeFailure(format!(
                "duplicate verdict for source_num {}",
                source_num
            )));
        }

        let score: RelevanceLabel = verdict.score.parse().map_err(AssessError::JudgeFailure)?;
        verdicts.push(JudgedSource { source_num, score });
    }

    Ok(verdicts)
}

//! Provider response envelope
//!
//! Every provider response wraps its data as
//! `{status_code, status_message, cost, tasks: [{status_code, status_message, result: [..]}]}`.
//! Only the first task and its first result bucket are used, since every request sends
//! exactly one task.

use crate::error::{EnvelopeStage, UpstreamError};
use serde::Deserialize;
use serde_json::Value;

/// Provider status code for success
pub const SUCCESS_CODE: i64 = 20000;

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    tasks: Option<Vec<Task>>,
}

#[derive(Debug, Default, Deserialize)]
struct Task {
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    result: Option<Vec<Option<ResultBucket>>>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultBucket {
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    items_count: Option<u64>,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    offset_token: Option<String>,
    #[serde(default)]
    items: Option<Vec<Value>>,
}

/// One validated page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPage {
    /// Raw items, not yet normalized
    pub items: Vec<Value>,
    /// Total matching records on the provider side
    pub total_count: Option<u64>,
    /// Items in this page as reported by the provider
    pub items_count: u64,
    /// Offset of this page
    pub offset: u64,
    /// Continuation token for the next page
    pub offset_token: Option<String>,
    /// Cost charged for the request
    pub cost: f64,
}

fn rejected(stage: EnvelopeStage, status_code: Option<i64>, message: Option<String>, fallback: &str) -> UpstreamError {
    UpstreamError {
        stage,
        status_code: status_code.unwrap_or(0),
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}

/// Validate an envelope and extract its first result bucket
///
/// The envelope is accepted only if its status code is [`SUCCESS_CODE`], the task list
/// is non-empty, the first task's status code is [`SUCCESS_CODE`] and that task carries
/// at least one result bucket. A bucket with `null` items is valid and empty.
pub fn parse_envelope(raw: &Value) -> Result<ResultPage, UpstreamError> {
    let envelope = Envelope::deserialize(raw).map_err(|e| UpstreamError {
        stage: EnvelopeStage::Envelope,
        status_code: 0,
        message: format!("unrecognized envelope: {}", e),
    })?;

    if envelope.status_code != Some(SUCCESS_CODE) {
        return Err(rejected(
            EnvelopeStage::Envelope,
            envelope.status_code,
            envelope.status_message,
            "request rejected",
        ));
    }

    let cost = envelope.cost.unwrap_or(0.0);
    let task = envelope
        .tasks
        .and_then(|tasks| tasks.into_iter().next())
        .ok_or_else(|| rejected(EnvelopeStage::Tasks, envelope.status_code, None, "response contains no tasks"))?;

    if task.status_code != Some(SUCCESS_CODE) {
        return Err(rejected(
            EnvelopeStage::Task,
            task.status_code,
            task.status_message,
            "task failed without a message",
        ));
    }

    let bucket = task
        .result
        .and_then(|result| result.into_iter().next().flatten())
        .ok_or_else(|| rejected(EnvelopeStage::Result, task.status_code, task.status_message, "task has no result"))?;

    let items = bucket.items.unwrap_or_default();
    Ok(ResultPage {
        items_count: bucket.items_count.unwrap_or(items.len() as u64),
        items,
        total_count: bucket.total_count,
        offset: bucket.offset.unwrap_or(0),
        offset_token: bucket.offset_token.filter(|t| !t.is_empty()),
        cost,
    })
}

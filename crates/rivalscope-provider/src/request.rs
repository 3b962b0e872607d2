//! Request construction for provider endpoints
//!
//! Builds the JSON task bodies the provider expects, including the nested-array
//! filter wire form, limit clamping and pagination.

use rivalscope_domain::{Condition, FilterExpression, FilterExpressionBuilder, FilterOperator, FilterValue};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Provider maximum for `limit`
pub const MAX_LIMIT: usize = 1000;

/// Ranked keywords for a domain (flat shape)
pub const RANKED_KEYWORDS_PATH: &str = "/v3/dataforseo_labs/google/ranked_keywords/live";

/// Related keywords for a seed (nested shape)
pub const RELATED_KEYWORDS_PATH: &str = "/v3/dataforseo_labs/google/related_keywords/live";

/// Referring domains for a target
pub const REFERRING_DOMAINS_PATH: &str = "/v3/backlinks/referring_domains/live";

/// Largest integer an f64 represents exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Render a filter expression in the provider's nested-array form
///
/// A leaf becomes `["path", "op", value]`, a node becomes `[left, "and", right]`.
pub fn filter_to_wire(expression: &FilterExpression) -> Value {
    match expression {
        FilterExpression::Leaf(leaf) => json!([
            leaf.field.path(),
            leaf.operator.as_str(),
            value_to_wire(&leaf.value)
        ]),
        FilterExpression::Node {
            left,
            connective,
            right,
        } => json!([filter_to_wire(left), connective.as_str(), filter_to_wire(right)]),
    }
}

fn value_to_wire(value: &FilterValue) -> Value {
    match value {
        FilterValue::Text(text) => Value::String(text.clone()),
        FilterValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => json!(*n as i64),
        FilterValue::Number(n) => json!(n),
        FilterValue::List(items) => Value::Array(items.iter().map(value_to_wire).collect()),
    }
}

/// Structural check of a wire-form filter
///
/// True iff `value` is a leaf tuple (string path, known operator, scalar or array value)
/// or a three-element node whose operands validate and whose middle element is `and`
/// or `or` (any case).
pub fn validate_wire(value: &Value) -> bool {
    let Some(parts) = value.as_array() else {
        return false;
    };
    if parts.len() != 3 {
        return false;
    }

    match &parts[0] {
        Value::String(path) => {
            !path.trim().is_empty()
                && parts[1].as_str().and_then(FilterOperator::parse).is_some()
                && !parts[2].is_object()
        }
        Value::Array(_) => {
            let connective_ok = parts[1]
                .as_str()
                .map(|c| c.eq_ignore_ascii_case("and") || c.eq_ignore_ascii_case("or"))
                .unwrap_or(false);
            connective_ok && validate_wire(&parts[0]) && validate_wire(&parts[2])
        }
        _ => false,
    }
}

/// Build the wire filter for a set of conditions
///
/// Invalid conditions are dropped with a warning; the remaining ones are combined
/// with AND. Returns `None` when nothing valid remains.
pub fn build_filters(conditions: &[Condition]) -> Option<Value> {
    let (expression, rejected) = FilterExpressionBuilder::build_with_diagnostics(conditions);
    for error in &rejected {
        warn!(error = %error, "Dropping invalid filter condition");
    }

    let wire = filter_to_wire(&expression?);
    if validate_wire(&wire) {
        Some(wire)
    } else {
        warn!(filter = %wire, "Dropping malformed filter expression");
        None
    }
}

/// Which page to request next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Numeric offset into the result set
    Offset(usize),
    /// Opaque continuation token returned by the previous page
    Token(String),
}

/// One task in a provider request body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskRequest {
    /// Domain the task concerns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Seed keyword (related-keyword endpoint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Location code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_code: Option<u32>,

    /// Language code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,

    /// Traversal depth (related-keyword endpoint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,

    /// Records per page, at most [`MAX_LIMIT`]
    pub limit: usize,

    /// Wire-form filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,

    /// Ordering rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,

    /// Numeric offset (omitted when a token is present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    /// Continuation token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_token: Option<String>,
}

impl TaskRequest {
    /// Task concerning a domain
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            limit: MAX_LIMIT,
            ..Default::default()
        }
    }

    /// Task concerning a seed keyword
    pub fn for_keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            limit: MAX_LIMIT,
            ..Default::default()
        }
    }

    /// Set location and language
    pub fn with_locale(mut self, location_code: u32, language_code: impl Into<String>) -> Self {
        self.location_code = Some(location_code);
        self.language_code = Some(language_code.into());
        self
    }

    /// Set traversal depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Set the page size, clamped to 1..=[`MAX_LIMIT`]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Attach filter conditions
    pub fn with_conditions(mut self, conditions: &[Condition]) -> Self {
        self.filters = build_filters(conditions);
        self
    }

    /// Set ordering rules
    pub fn with_order_by(mut self, order_by: &[String]) -> Self {
        self.order_by = order_by.to_vec();
        self
    }

    /// Select a page; a token replaces any offset
    pub fn with_page(mut self, page: Page) -> Self {
        match page {
            Page::Offset(offset) => {
                self.offset = (offset > 0).then_some(offset);
                self.offset_token = None;
            }
            Page::Token(token) => {
                self.offset = None;
                self.offset_token = Some(token);
            }
        }
        self
    }

    /// Request body: the provider takes an array of tasks
    pub fn to_body(&self) -> Value {
        json!([self])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_wire_form() {
        let wire = build_filters(&[Condition::new("search_volume", FilterOperator::Gte, 100u64)]).unwrap();
        assert_eq!(wire, json!(["keyword_data.keyword_info.search_volume", ">=", 100]));
        assert!(validate_wire(&wire));
    }

    #[test]
    fn test_and_chain_is_left_associative() {
        let wire = build_filters(&[
            Condition::new("search_volume", FilterOperator::Gt, 100u64),
            Condition::new("cpc", FilterOperator::Lt, 2.5),
            Condition::new("keyword", FilterOperator::Like, "%shoes%"),
        ])
        .unwrap();

        assert_eq!(
            wire,
            json!([
                [
                    ["keyword_data.keyword_info.search_volume", ">", 100],
                    "and",
                    ["keyword_data.keyword_info.cpc", "<", 2.5]
                ],
                "and",
                ["keyword_data.keyword", "like", "%shoes%"]
            ])
        );
        assert!(validate_wire(&wire));
    }

    #[test]
    fn test_invalid_conditions_are_dropped() {
        assert!(build_filters(&[]).is_none());
        assert!(build_filters(&[Condition::new("made_up", FilterOperator::Eq, 1u64)]).is_none());

        let wire = build_filters(&[
            Condition::new("made_up", FilterOperator::Eq, 1u64),
            Condition::new("search_volume", FilterOperator::Gt, "lots"),
            Condition::new("rank", FilterOperator::Gt, 10u64),
        ])
        .unwrap();
        assert_eq!(wire, json!(["rank", ">", 10]));
    }

    #[test]
    fn test_in_list_wire_form() {
        let wire = build_filters(&[Condition::new(
            "competition_level",
            FilterOperator::In,
            FilterValue::List(vec!["LOW".into(), "MEDIUM".into()]),
        )])
        .unwrap();
        assert_eq!(
            wire,
            json!(["keyword_data.keyword_info.competition_level", "in", ["LOW", "MEDIUM"]])
        );
    }

    #[test]
    fn test_validate_wire_accepts_well_formed() {
        assert!(validate_wire(&json!(["rank", ">", 10])));
        assert!(validate_wire(&json!(["domain", "like", "%.edu"])));
        assert!(validate_wire(&json!([["rank", ">", 10], "OR", ["backlinks", ">=", 5]])));
        assert!(validate_wire(&json!([
            [["rank", ">", 10], "and", ["backlinks", ">=", 5]],
            "or",
            ["domain", "=", "example.com"]
        ])));
    }

    #[test]
    fn test_validate_wire_rejects_malformed() {
        assert!(!validate_wire(&json!("rank > 10")));
        assert!(!validate_wire(&json!(["rank", ">"])));
        assert!(!validate_wire(&json!(["rank", "~", 10])));
        assert!(!validate_wire(&json!(["", ">", 10])));
        assert!(!validate_wire(&json!(["rank", ">", {"n": 10}])));
        assert!(!validate_wire(&json!([["rank", ">", 10], "xor", ["backlinks", ">", 1]])));
        assert!(!validate_wire(&json!([["rank", ">"], "and", ["backlinks", ">", 1]])));
        assert!(!validate_wire(&json!([1, "and", 2])));
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(TaskRequest::for_target("a.com").with_limit(5000).limit, MAX_LIMIT);
        assert_eq!(TaskRequest::for_target("a.com").with_limit(0).limit, 1);
        assert_eq!(TaskRequest::for_target("a.com").with_limit(250).limit, 250);
    }

    #[test]
    fn test_token_takes_priority_over_offset() {
        let task = TaskRequest::for_target("a.com")
            .with_page(Page::Offset(1000))
            .with_page(Page::Token("abc".to_string()));
        let body = task.to_body();
        assert_eq!(body[0]["offset_token"], "abc");
        assert!(body[0].get("offset").is_none());
    }

    #[test]
    fn test_ranked_keywords_body() {
        let body = TaskRequest::for_target("example.com")
            .with_locale(2840, "en")
            .with_limit(100)
            .with_order_by(&["keyword_data.keyword_info.search_volume,desc".to_string()])
            .with_page(Page::Offset(200))
            .to_body();

        assert_eq!(
            body,
            json!([{
                "target": "example.com",
                "location_code": 2840,
                "language_code": "en",
                "limit": 100,
                "order_by": ["keyword_data.keyword_info.search_volume,desc"],
                "offset": 200
            }])
        );
    }

    #[test]
    fn test_related_keywords_body() {
        let body = TaskRequest::for_keyword("running shoes")
            .with_locale(2826, "en")
            .with_depth(2)
            .to_body();
        assert_eq!(body[0]["keyword"], "running shoes");
        assert_eq!(body[0]["depth"], 2);
        assert_eq!(body[0]["limit"], 1000);
        assert!(body[0].get("target").is_none());
        assert!(body[0].get("filters").is_none());
    }
}

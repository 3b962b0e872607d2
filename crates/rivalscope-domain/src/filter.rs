//! Filter expressions sent to the data provider
//!
//! A filter is a boolean tree of `(field, operator, value)` leaves joined by AND/OR.
//! The tree is a tagged enum so every consumer matches on it exhaustively; the
//! provider crate owns the translation to the nested-array wire form.
//!
//! Building is fail-open: a condition that names an unknown field or carries a value
//! of the wrong type is dropped and reported, and the rest of the filter still applies.
//! A bad filter costs precision, never availability.

use std::fmt;
use thiserror::Error;

/// Value type a filterable field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text
    Text,
    /// Integer or decimal number
    Number,
    /// List of text values (filtered one element at a time)
    TextList,
}

/// Known filterable fields, each bound to its dotted provider path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    /// Keyword text
    Keyword,
    /// Monthly search volume
    SearchVolume,
    /// Cost per click
    Cpc,
    /// Advertiser competition level
    CompetitionLevel,
    /// Keyword difficulty
    KeywordDifficulty,
    /// Organic position of the analysed domain
    Position,
    /// SERP feature types
    SerpFeatures,
    /// Referring domain name
    ReferringDomain,
    /// Referring domain authority rank
    Rank,
    /// Backlinks from the referring domain
    Backlinks,
    /// Referring pages from the referring domain
    ReferringPages,
}

impl FilterField {
    /// Every known field
    pub const ALL: [FilterField; 11] = [
        FilterField::Keyword,
        FilterField::SearchVolume,
        FilterField::Cpc,
        FilterField::CompetitionLevel,
        FilterField::KeywordDifficulty,
        FilterField::Position,
        FilterField::SerpFeatures,
        FilterField::ReferringDomain,
        FilterField::Rank,
        FilterField::Backlinks,
        FilterField::ReferringPages,
    ];

    /// Dotted provider path of the field
    pub fn path(&self) -> &'static str {
        match self {
            FilterField::Keyword => "keyword_data.keyword",
            FilterField::SearchVolume => "keyword_data.keyword_info.search_volume",
            FilterField::Cpc => "keyword_data.keyword_info.cpc",
            FilterField::CompetitionLevel => "keyword_data.keyword_info.competition_level",
            FilterField::KeywordDifficulty => "keyword_data.keyword_properties.keyword_difficulty",
            FilterField::Position => "ranked_serp_element.serp_item.rank_group",
            FilterField::SerpFeatures => "keyword_data.serp_info.serp_item_types",
            FilterField::ReferringDomain => "domain",
            FilterField::Rank => "rank",
            FilterField::Backlinks => "backlinks",
            FilterField::ReferringPages => "referring_pages",
        }
    }

    /// Short name accepted in place of the full path
    pub fn alias(&self) -> &'static str {
        match self {
            FilterField::Keyword => "keyword",
            FilterField::SearchVolume => "search_volume",
            FilterField::Cpc => "cpc",
            FilterField::CompetitionLevel => "competition_level",
            FilterField::KeywordDifficulty => "keyword_difficulty",
            FilterField::Position => "position",
            FilterField::SerpFeatures => "serp_features",
            FilterField::ReferringDomain => "domain",
            FilterField::Rank => "rank",
            FilterField::Backlinks => "backlinks",
            FilterField::ReferringPages => "referring_pages",
        }
    }

    /// Value type the field accepts
    pub fn field_type(&self) -> FieldType {
        match self {
            FilterField::Keyword | FilterField::CompetitionLevel | FilterField::ReferringDomain => {
                FieldType::Text
            }
            FilterField::SerpFeatures => FieldType::TextList,
            FilterField::SearchVolume
            | FilterField::Cpc
            | FilterField::KeywordDifficulty
            | FilterField::Position
            | FilterField::Rank
            | FilterField::Backlinks
            | FilterField::ReferringPages => FieldType::Number,
        }
    }

    /// Resolve a dotted path or alias to a known field
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.path() == path || field.alias() == path)
    }
}

/// Comparison operator of a filter leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `in`
    In,
    /// `like` (text pattern with `%` wildcards)
    Like,
    /// `not_like`
    NotLike,
}

impl FilterOperator {
    /// Operator as written on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::In => "in",
            FilterOperator::Like => "like",
            FilterOperator::NotLike => "not_like",
        }
    }

    /// Parse an operator token
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" => Some(FilterOperator::Eq),
            "!=" | "<>" => Some(FilterOperator::NotEq),
            ">" => Some(FilterOperator::Gt),
            ">=" => Some(FilterOperator::Gte),
            "<" => Some(FilterOperator::Lt),
            "<=" => Some(FilterOperator::Lte),
            "in" => Some(FilterOperator::In),
            "like" => Some(FilterOperator::Like),
            "not_like" => Some(FilterOperator::NotLike),
            _ => None,
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter leaf
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Text value
    Text(String),
    /// Numeric value
    Number(f64),
    /// List of scalar values (for `in`)
    List(Vec<FilterValue>),
}

impl FilterValue {
    fn is_scalar(&self) -> bool {
        !matches!(self, FilterValue::List(_))
    }

    fn matches_scalar(&self, field_type: FieldType) -> bool {
        match (self, field_type) {
            (FilterValue::Number(n), FieldType::Number) => n.is_finite(),
            (FilterValue::Text(_), FieldType::Text | FieldType::TextList) => true,
            _ => false,
        }
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<u64> for FilterValue {
    fn from(n: u64) -> Self {
        FilterValue::Number(n as f64)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "'{}'", s),
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Raw, unvalidated filter condition as supplied by a caller
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Dotted field path or alias
    pub field: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Comparison value
    pub value: FilterValue,
}

impl Condition {
    /// Create a condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Parse a textual condition such as `search_volume>=100` or `keyword like %trail%`
    ///
    /// Values that parse as numbers become numeric; `in` values are comma-separated.
    ///
    /// # Examples
    ///
    /// ```
    /// use rivalscope_domain::{Condition, FilterOperator, FilterValue};
    ///
    /// let condition = Condition::parse("search_volume >= 1000").unwrap();
    /// assert_eq!(condition.field, "search_volume");
    /// assert_eq!(condition.operator, FilterOperator::Gte);
    /// assert_eq!(condition.value, FilterValue::Number(1000.0));
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        // Word operators need surrounding spaces; the operator closest to the start
        // wins, the longest one on a tie, so values may contain operator text
        const OPS: [&str; 11] = [" not_like ", " like ", " in ", ">=", "<=", "!=", "<>", "==", "=", ">", "<"];

        let lowered = input.to_ascii_lowercase();
        let (idx, len, op) = OPS
            .iter()
            .filter_map(|op| lowered.find(op).map(|idx| (idx, op.len(), op.trim())))
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))?;
        let field = input[..idx].trim();
        let raw_value = input[idx + len..].trim();
        if field.is_empty() || raw_value.is_empty() {
            return None;
        }

        let operator = FilterOperator::parse(op)?;
        let value = if operator == FilterOperator::In {
            FilterValue::List(raw_value.split(',').map(parse_scalar).collect())
        } else {
            parse_scalar(raw_value)
        };

        Some(Self {
            field: field.to_string(),
            operator,
            value,
        })
    }
}

fn parse_scalar(raw: &str) -> FilterValue {
    let raw = raw.trim();
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')));

    match unquoted {
        Some(text) => FilterValue::Text(text.to_string()),
        None => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => FilterValue::Number(n),
            _ => FilterValue::Text(raw.to_string()),
        },
    }
}

/// Reasons a condition is dropped from a filter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterValidationError {
    /// The field name was empty
    #[error("Filter field is empty")]
    EmptyField,

    /// The field is not a known path into a keyword or backlink record
    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    /// The value type does not match the field type
    #[error("Filter value for '{field}' must be {expected:?}")]
    TypeMismatch {
        /// Field path
        field: String,
        /// Expected type
        expected: FieldType,
    },

    /// The operator cannot be used with this field or value
    #[error("Operator '{operator}' cannot be applied to '{field}'")]
    OperatorMismatch {
        /// Field path
        field: String,
        /// Offending operator
        operator: FilterOperator,
    },
}

/// A validated filter leaf
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    /// Known field
    pub field: FilterField,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Comparison value, type-checked against the field
    pub value: FilterValue,
}

impl FilterLeaf {
    /// Validate a raw condition into a leaf
    pub fn try_from_condition(condition: &Condition) -> Result<Self, FilterValidationError> {
        if condition.field.trim().is_empty() {
            return Err(FilterValidationError::EmptyField);
        }

        let field = FilterField::from_path(&condition.field)
            .ok_or_else(|| FilterValidationError::UnknownField(condition.field.clone()))?;

        let leaf = Self {
            field,
            operator: condition.operator,
            value: condition.value.clone(),
        };
        leaf.check()?;
        Ok(leaf)
    }

    fn check(&self) -> Result<(), FilterValidationError> {
        let field_type = self.field.field_type();
        let path = self.field.path().to_string();
        let mismatch = || FilterValidationError::TypeMismatch {
            field: path.clone(),
            expected: field_type,
        };
        let bad_operator = || FilterValidationError::OperatorMismatch {
            field: path.clone(),
            operator: self.operator,
        };

        match self.operator {
            FilterOperator::In => match &self.value {
                FilterValue::List(items)
                    if !items.is_empty()
                        && items.iter().all(|v| v.is_scalar() && v.matches_scalar(field_type)) =>
                {
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            op if op.is_ordering() => {
                if field_type != FieldType::Number {
                    return Err(bad_operator());
                }
                if self.value.matches_scalar(FieldType::Number) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            FilterOperator::Like | FilterOperator::NotLike => {
                if field_type == FieldType::Number {
                    return Err(bad_operator());
                }
                if matches!(self.value, FilterValue::Text(_)) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            _ => {
                if self.value.matches_scalar(field_type) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
        }
    }
}

impl fmt::Display for FilterLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field.alias(), self.operator, self.value)
    }
}

/// Boolean connective joining two sub-expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// Both sides must match
    And,
    /// Either side may match
    Or,
}

impl Connective {
    /// Connective as written on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }

    /// Parse a connective (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "and" => Some(Connective::And),
            "or" => Some(Connective::Or),
            _ => None,
        }
    }
}

/// A filter tree: a single leaf, or two sub-trees joined by a connective
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// A single comparison
    Leaf(FilterLeaf),

    /// Two operands and exactly one connective
    Node {
        /// Left operand
        left: Box<FilterExpression>,
        /// Connective
        connective: Connective,
        /// Right operand
        right: Box<FilterExpression>,
    },
}

impl FilterExpression {
    /// Join two expressions with AND
    pub fn and(self, right: FilterExpression) -> Self {
        FilterExpression::Node {
            left: Box::new(self),
            connective: Connective::And,
            right: Box::new(right),
        }
    }

    /// Join two expressions with OR
    pub fn or(self, right: FilterExpression) -> Self {
        FilterExpression::Node {
            left: Box::new(self),
            connective: Connective::Or,
            right: Box::new(right),
        }
    }

    /// Check that every leaf names a known field with a well-typed value
    pub fn validate(&self) -> bool {
        match self {
            FilterExpression::Leaf(leaf) => leaf.check().is_ok(),
            FilterExpression::Node { left, right, .. } => left.validate() && right.validate(),
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterExpression::Leaf(_) => 1,
            FilterExpression::Node { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::Leaf(leaf) => write!(f, "{}", leaf),
            FilterExpression::Node {
                left,
                connective,
                right,
            } => write!(f, "({} {} {})", left, connective.as_str().to_uppercase(), right),
        }
    }
}

/// Builds provider filter trees from flat condition lists
pub struct FilterExpressionBuilder;

impl FilterExpressionBuilder {
    /// Build a filter from conditions, silently dropping invalid ones
    ///
    /// Returns `None` when no valid condition remains (the provider treats a missing
    /// filter as "match all"), a single leaf for one condition, and otherwise the
    /// strictly left-associative chain `(((c1 AND c2) AND c3) AND ...)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rivalscope_domain::{Condition, FilterExpressionBuilder, FilterOperator};
    ///
    /// assert!(FilterExpressionBuilder::build(&[]).is_none());
    ///
    /// let expr = FilterExpressionBuilder::build(&[
    ///     Condition::new("search_volume", FilterOperator::Gt, 100u64),
    ///     Condition::new("cpc", FilterOperator::Gte, 0.5),
    /// ])
    /// .unwrap();
    /// assert!(expr.validate());
    /// assert_eq!(expr.leaf_count(), 2);
    /// ```
    pub fn build(conditions: &[Condition]) -> Option<FilterExpression> {
        Self::build_with_diagnostics(conditions).0
    }

    /// Build a filter and report every dropped condition
    pub fn build_with_diagnostics(
        conditions: &[Condition],
    ) -> (Option<FilterExpression>, Vec<FilterValidationError>) {
        let mut rejected = Vec::new();
        let mut expression: Option<FilterExpression> = None;

        for condition in conditions {
            match FilterLeaf::try_from_condition(condition) {
                Ok(leaf) => {
                    let leaf = FilterExpression::Leaf(leaf);
                    expression = Some(match expression {
                        None => leaf,
                        Some(chain) => chain.and(leaf),
                    });
                }
                Err(e) => rejected.push(e),
            }
        }

        (expression, rejected)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_condition() -> impl Strategy<Value = Condition> {
        prop_oneof![
            (0u64..100_000).prop_map(|n| Condition::new("search_volume", FilterOperator::Gte, n)),
            (0.0f64..50.0).prop_map(|n| Condition::new("cpc", FilterOperator::Lt, n)),
            (1u64..100).prop_map(|n| Condition::new("position", FilterOperator::Lte, n)),
            "[a-z]{1,12}".prop_map(|s| Condition::new("keyword", FilterOperator::Like, s.as_str())),
            "[a-z]{3,10}\\.com".prop_map(|s| Condition::new("domain", FilterOperator::NotEq, s.as_str())),
        ]
    }

    proptest! {
        /// Property: any non-empty list of well-typed conditions builds a valid tree
        #[test]
        fn test_build_round_trip(conditions in prop::collection::vec(arb_condition(), 1..8)) {
            let expr = FilterExpressionBuilder::build(&conditions);
            prop_assert!(expr.is_some());
            let expr = expr.unwrap();
            prop_assert!(expr.validate());
            prop_assert_eq!(expr.leaf_count(), conditions.len());
        }
    }
}

//! Response normalization
//!
//! Provider endpoints return keyword data in two shapes:
//!
//! - **Flat**: fields sit directly on the item (`{"keyword": .., "search_volume": ..}`)
//! - **Nested**: fields sit under a detail object (`{"keyword_data": {"keyword_info": ..}}`)
//!
//! Both are mapped onto [`KeywordRecord`]. For every canonical field the nested detail
//! object is consulted first, then the top level of the item. Missing or malformed
//! values fall back to defaults; an item without keyword text is skipped.

use rivalscope_domain::{BacklinkReferrerRecord, CompetitionLevel, KeywordRecord, Target};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// Keys under which providers nest per-item detail
const DETAIL_KEYS: [&str; 2] = ["keyword_data", "detail"];

const KEYWORD: &[&str] = &["keyword"];
const SEARCH_VOLUME: &[&str] = &["search_volume", "keyword_info.search_volume"];
const CPC: &[&str] = &["cpc", "keyword_info.cpc"];
const COMPETITION_LEVEL: &[&str] = &["competition_level", "keyword_info.competition_level"];
const KEYWORD_DIFFICULTY: &[&str] = &["keyword_difficulty", "keyword_properties.keyword_difficulty"];
const POSITION: &[&str] = &["position", "rank_group", "ranked_serp_element.serp_item.rank_group"];
const SERP_FEATURES: &[&str] = &["serp_features", "serp_info.serp_item_types"];

const REFERRING_DOMAIN: &[&str] = &["domain", "referring_domain", "domain_from"];
const RANK: &[&str] = &["rank"];
const BACKLINKS: &[&str] = &["backlinks"];
const REFERRING_PAGES: &[&str] = &["referring_pages"];

/// Layout of a raw provider item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// Fields at the top level
    Flat,
    /// Fields under a nested detail object
    Nested,
}

impl SourceShape {
    /// Nested when the item carries a non-null detail object
    pub fn detect(raw: &Value) -> Self {
        if detail(raw).is_some() {
            SourceShape::Nested
        } else {
            SourceShape::Flat
        }
    }
}

fn detail(raw: &Value) -> Option<&Map<String, Value>> {
    DETAIL_KEYS
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_object))
}

/// Follow a dotted path, treating `null` as absent
fn at_path<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = object.get(first)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// First non-null value among `paths`, nested detail before top level
fn lookup<'a>(raw: &'a Value, shape: SourceShape, paths: &[&str]) -> Option<&'a Value> {
    let nested = match shape {
        SourceShape::Nested => detail(raw),
        SourceShape::Flat => None,
    };
    let top = raw.as_object();

    nested
        .into_iter()
        .chain(top)
        .find_map(|object| paths.iter().find_map(|path| at_path(object, path)))
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_count(value: Option<&Value>) -> u64 {
    let Some(value) = value else {
        return 0;
    };
    if let Some(n) = value.as_u64() {
        return n;
    }
    as_number(value)
        .filter(|n| *n > 0.0)
        .map(|n| n.round() as u64)
        .unwrap_or(0)
}

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_text_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Map one raw keyword item onto the canonical record
///
/// `depth` and `related_keywords` are read from the top level only and passed through.
pub fn normalize_keyword(raw: &Value, shape: SourceShape) -> KeywordRecord {
    let keyword = as_text(lookup(raw, shape, KEYWORD)).unwrap_or_default();

    let mut record = KeywordRecord::new(keyword)
        .with_volume(as_count(lookup(raw, shape, SEARCH_VOLUME)))
        .with_cpc(lookup(raw, shape, CPC).and_then(as_number).unwrap_or(0.0));

    record.competition_level = as_text(lookup(raw, shape, COMPETITION_LEVEL))
        .and_then(|level| CompetitionLevel::parse(&level))
        .unwrap_or_default();

    record.difficulty = lookup(raw, shape, KEYWORD_DIFFICULTY)
        .and_then(as_number)
        .map(|d| d.round().clamp(0.0, 100.0) as u8);

    record.position = lookup(raw, shape, POSITION)
        .and_then(as_number)
        .filter(|p| *p >= 0.0);

    record.serp_features = as_text_list(lookup(raw, shape, SERP_FEATURES))
        .into_iter()
        .collect::<BTreeSet<_>>();

    record.depth = raw
        .get("depth")
        .and_then(Value::as_u64)
        .and_then(|d| u32::try_from(d).ok());
    record.related_keywords = as_text_list(raw.get("related_keywords"));

    record
}

/// Normalize a page of keyword items, detecting the shape per item
///
/// Items without keyword text are skipped with a warning.
pub fn normalize_keywords(items: &[Value]) -> Vec<KeywordRecord> {
    let mut records = Vec::with_capacity(items.len());
    for (idx, raw) in items.iter().enumerate() {
        let record = normalize_keyword(raw, SourceShape::detect(raw));
        if record.keyword.trim().is_empty() {
            warn!(idx = idx, "Skipping keyword item without keyword text");
            continue;
        }
        records.push(record);
    }
    records
}

/// Map one raw referring-domain item onto the canonical record
pub fn normalize_referrer(raw: &Value, target: &Target) -> BacklinkReferrerRecord {
    let shape = SourceShape::detect(raw);
    let domain = as_text(lookup(raw, shape, REFERRING_DOMAIN)).unwrap_or_default();

    BacklinkReferrerRecord::new(domain, target.clone())
        .with_rank(as_count(lookup(raw, shape, RANK)))
        .with_links(
            as_count(lookup(raw, shape, BACKLINKS)),
            as_count(lookup(raw, shape, REFERRING_PAGES)),
        )
}

/// Normalize a page of referring-domain items
///
/// Items without a domain are skipped with a warning.
pub fn normalize_referrers(items: &[Value], target: &Target) -> Vec<BacklinkReferrerRecord> {
    let mut records = Vec::with_capacity(items.len());
    for (idx, raw) in items.iter().enumerate() {
        let record = normalize_referrer(raw, target);
        if record.referrer_key().is_empty() {
            warn!(idx = idx, domain = %target, "Skipping referrer item without domain");
            continue;
        }
        records.push(record);
    }
    records
}

/// Render a canonical record in the flat provider shape
///
/// Normalizing the result with [`SourceShape::Flat`] yields an equal record.
pub fn to_flat_json(record: &KeywordRecord) -> Value {
    let mut flat = json!({
        "keyword": record.keyword,
        "search_volume": record.search_volume,
        "cpc": record.cpc,
        "competition_level": record.competition_level.as_str(),
        "keyword_difficulty": record.difficulty,
        "position": record.position,
        "serp_features": record.serp_features,
    });
    if let Some(object) = flat.as_object_mut() {
        if let Some(depth) = record.depth {
            object.insert("depth".to_string(), json!(depth));
        }
        if !record.related_keywords.is_empty() {
            object.insert("related_keywords".to_string(), json!(record.related_keywords));
        }
    }
    flat
}

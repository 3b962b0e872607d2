//! DataForSEO client
//!
//! Implements [`SeoDataSource`] over the provider's live endpoints: builds one task per
//! call, follows pagination, validates each envelope and normalizes the items.

use crate::config::ProviderConfig;
use crate::envelope::parse_envelope;
use crate::error::ProviderError;
use crate::fetcher::{FetchRequest, ReqwestTransport, ResilientFetcher, Transport};
use crate::normalizer::{normalize_keywords, normalize_referrers};
use crate::request::{Page, TaskRequest, RANKED_KEYWORDS_PATH, REFERRING_DOMAINS_PATH, RELATED_KEYWORDS_PATH};
use rivalscope_domain::{BacklinkQuery, BacklinkReferrerRecord, KeywordQuery, KeywordRecord, SeoDataSource, Target};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Deepest traversal the related-keyword endpoint accepts
pub const MAX_DEPTH: u32 = 4;

/// HTTP client for the DataForSEO API
///
/// # Examples
///
/// ```no_run
/// use rivalscope_domain::{KeywordQuery, SeoDataSource, Target};
/// use rivalscope_provider::{DataForSeoClient, ProviderConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DataForSeoClient::new(ProviderConfig::new("login", "password"))?;
/// let target = Target::parse("example.com")?;
/// let keywords = client.ranked_keywords(&target, &KeywordQuery::default()).await?;
/// println!("{} keywords", keywords.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DataForSeoClient<T = ReqwestTransport> {
    fetcher: ResilientFetcher<T>,
    config: ProviderConfig,
    cancel: CancellationToken,
}

impl DataForSeoClient<ReqwestTransport> {
    /// Create a client using `reqwest`
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }
}

impl<T: Transport> DataForSeoClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(config: ProviderConfig, transport: T) -> Result<Self, ProviderError> {
        config.validate().map_err(ProviderError::Config)?;
        Ok(Self {
            fetcher: ResilientFetcher::new(transport, config.retry_policy()),
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `token` as the parent of every request this client makes
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Record cap for a query; without a limit every page the provider reports is fetched
    fn max_items(limit: Option<usize>) -> usize {
        limit.unwrap_or(usize::MAX).max(1)
    }

    fn keyword_task(&self, task: TaskRequest, query: &KeywordQuery) -> TaskRequest {
        let location = query.location_code.unwrap_or(self.config.location_code);
        let language = query
            .language_code
            .clone()
            .unwrap_or_else(|| self.config.language_code.clone());

        task.with_locale(location, language)
            .with_conditions(&query.conditions)
            .with_order_by(&query.order_by)
    }

    /// POST `task` to `path`, following pages until `max_items`, the provider's
    /// `total_count` or the configured page bound is reached
    async fn fetch_items(&self, path: &str, task: TaskRequest, max_items: usize) -> Result<Vec<Value>, ProviderError> {
        let url = self.config.endpoint(path);
        let mut items: Vec<Value> = Vec::new();
        let mut total_cost = 0.0;
        let mut page = Page::Offset(0);
        let mut complete = false;

        for page_number in 0..self.config.max_pages {
            let remaining = max_items - items.len();
            let body = task
                .clone()
                .with_limit(remaining.min(self.config.page_limit))
                .with_page(page)
                .to_body();

            let mut request = FetchRequest::post(url.as_str(), body);
            if self.config.has_credentials() {
                request = request.with_basic_auth(self.config.login.as_str(), self.config.password.as_str());
            }

            let response = self
                .fetcher
                .fetch_with_cancel(&request, &self.cancel)
                .await?
                .error_for_status()?;
            let result = parse_envelope(&response.json()?)?;

            total_cost += result.cost;
            let received = result.items.len();
            debug!(
                url = %url,
                page = page_number,
                received = received,
                total_count = ?result.total_count,
                "Fetched page"
            );

            let next_offset = result.offset as usize + received;
            items.extend(result.items);

            let exhausted = received == 0
                || items.len() >= max_items
                || result.total_count.is_some_and(|total| items.len() as u64 >= total);
            if exhausted {
                complete = true;
                break;
            }

            page = match result.offset_token {
                Some(token) => Page::Token(token),
                None => Page::Offset(next_offset),
            };
        }

        if !complete {
            warn!(
                url = %url,
                items = items.len(),
                max_pages = self.config.max_pages,
                "Page bound reached before the last page"
            );
        }

        items.truncate(max_items);
        debug!(url = %url, items = items.len(), cost = total_cost, "Fetch complete");
        Ok(items)
    }
}

impl<T: Transport> SeoDataSource for DataForSeoClient<T> {
    type Error = ProviderError;

    async fn ranked_keywords(&self, target: &Target, query: &KeywordQuery) -> Result<Vec<KeywordRecord>, ProviderError> {
        let task = self.keyword_task(TaskRequest::for_target(target.as_str()), query);
        let items = self
            .fetch_items(RANKED_KEYWORDS_PATH, task, Self::max_items(query.limit))
            .await?;

        let records = normalize_keywords(&items);
        info!(domain = %target, records = records.len(), "Fetched ranked keywords");
        Ok(records)
    }

    async fn referring_domains(
        &self,
        target: &Target,
        query: &BacklinkQuery,
    ) -> Result<Vec<BacklinkReferrerRecord>, ProviderError> {
        let task = TaskRequest::for_target(target.as_str())
            .with_conditions(&query.conditions)
            .with_order_by(&query.order_by);
        let items = self
            .fetch_items(REFERRING_DOMAINS_PATH, task, Self::max_items(query.limit))
            .await?;

        let records = normalize_referrers(&items, target);
        info!(domain = %target, records = records.len(), "Fetched referring domains");
        Ok(records)
    }

    async fn related_keywords(
        &self,
        seed: &str,
        depth: u32,
        query: &KeywordQuery,
    ) -> Result<Vec<KeywordRecord>, ProviderError> {
        let task = self.keyword_task(
            TaskRequest::for_keyword(seed.trim()).with_depth(depth.min(MAX_DEPTH)),
            query,
        );
        let items = self
            .fetch_items(RELATED_KEYWORDS_PATH, task, Self::max_items(query.limit))
            .await?;

        let records = normalize_keywords(&items);
        info!(seed = seed, depth = depth, records = records.len(), "Fetched related keywords");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchResponse, TransportFailure};
    use rivalscope_domain::{Condition, FilterOperator};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Transport that replays canned responses and records every request
    #[derive(Clone, Default)]
    struct RecordingTransport {
        responses: Arc<Mutex<VecDeque<FetchResponse>>>,
        requests: Arc<Mutex<Vec<FetchRequest>>>,
    }

    impl RecordingTransport {
        fn with_responses(bodies: Vec<(u16, Value)>) -> Self {
            let transport = Self::default();
            transport.responses.lock().unwrap().extend(
                bodies
                    .into_iter()
                    .map(|(status, body)| FetchResponse { status, body: body.to_string() }),
            );
            transport
        }

        fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        async fn send(
            &self,
            request: &FetchRequest,
            _cancel: CancellationToken,
        ) -> Result<FetchResponse, TransportFailure> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportFailure::Network("no scripted response".to_string()))
        }
    }

    fn page(items: Vec<Value>, total_count: u64, offset: u64, token: Option<&str>) -> (u16, Value) {
        (
            200,
            json!({
                "status_code": 20000,
                "status_message": "Ok.",
                "cost": 0.01,
                "tasks": [{
                    "status_code": 20000,
                    "status_message": "Ok.",
                    "result": [{
                        "total_count": total_count,
                        "items_count": items.len(),
                        "offset": offset,
                        "offset_token": token,
                        "items": items
                    }]
                }]
            }),
        )
    }

    fn config() -> ProviderConfig {
        ProviderConfig {
            base_url: "http://provider.test".to_string(),
            max_retries: 0,
            ..ProviderConfig::new("login", "secret")
        }
    }

    fn referrer(domain: &str, backlinks: u64) -> Value {
        json!({"domain": domain, "rank": 100, "backlinks": backlinks, "referring_pages": 1})
    }

    #[tokio::test]
    async fn test_referring_domains_single_page() {
        let transport = RecordingTransport::with_responses(vec![page(
            vec![referrer("a.org", 3), referrer("b.org", 1)],
            2,
            0,
            None,
        )]);
        let client = DataForSeoClient::with_transport(config(), transport.clone()).unwrap();
        let target = Target::parse("example.com").unwrap();

        let records = client
            .referring_domains(&target, &BacklinkQuery::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].referring_domain, "a.org");
        assert_eq!(records[0].backlinks_to_target, 3);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://provider.test/v3/backlinks/referring_domains/live");
        assert_eq!(
            requests[0].basic_auth,
            Some(("login".to_string(), "secret".to_string()))
        );
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body[0]["target"], "example.com");
        assert_eq!(body[0]["limit"], 1000);
    }

    #[tokio::test]
    async fn test_pagination_follows_offsets_until_total_count() {
        let transport = RecordingTransport::with_responses(vec![
            page(vec![referrer("a.org", 1), referrer("b.org", 1)], 3, 0, None),
            page(vec![referrer("c.org", 1)], 3, 2, None),
        ]);
        let client = DataForSeoClient::with_transport(
            ProviderConfig {
                page_limit: 2,
                ..config()
            },
            transport.clone(),
        )
        .unwrap();
        let target = Target::parse("example.com").unwrap();

        let records = client
            .referring_domains(&target, &BacklinkQuery::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 3);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let second = requests[1].body.as_ref().unwrap();
        assert_eq!(second[0]["offset"], 2);
    }

    #[tokio::test]
    async fn test_pagination_prefers_offset_token() {
        let transport = RecordingTransport::with_responses(vec![
            page(vec![referrer("a.org", 1)], 2, 0, Some("next-page")),
            page(vec![referrer("b.org", 1)], 2, 1, None),
        ]);
        let client = DataForSeoClient::with_transport(
            ProviderConfig {
                page_limit: 1,
                ..config()
            },
            transport.clone(),
        )
        .unwrap();
        let target = Target::parse("example.com").unwrap();

        client
            .referring_domains(&target, &BacklinkQuery::default())
            .await
            .unwrap();

        let requests = transport.requests();
        let second = requests[1].body.as_ref().unwrap();
        assert_eq!(second[0]["offset_token"], "next-page");
        assert!(second[0].get("offset").is_none());
    }

    #[tokio::test]
    async fn test_pagination_stops_at_max_pages_and_limit() {
        let transport = RecordingTransport::with_responses(vec![
            page(vec![referrer("a.org", 1), referrer("b.org", 1)], 100, 0, None),
            page(vec![referrer("c.org", 1), referrer("d.org", 1)], 100, 2, None),
            page(vec![referrer("e.org", 1), referrer("f.org", 1)], 100, 4, None),
        ]);
        let client = DataForSeoClient::with_transport(
            ProviderConfig {
                page_limit: 2,
                max_pages: 2,
                ..config()
            },
            transport.clone(),
        )
        .unwrap();
        let target = Target::parse("example.com").unwrap();

        let records = client
            .referring_domains(&target, &BacklinkQuery::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unlimited_query_reads_every_page() {
        let transport = RecordingTransport::with_responses(vec![
            page(vec![referrer("a.org", 1)], 3, 0, None),
            page(vec![referrer("b.org", 1)], 3, 1, None),
            page(vec![referrer("c.org", 1)], 3, 2, None),
        ]);
        let client = DataForSeoClient::with_transport(
            ProviderConfig {
                page_limit: 1,
                ..config()
            },
            transport.clone(),
        )
        .unwrap();
        let target = Target::parse("example.com").unwrap();

        let records = client
            .referring_domains(&target, &BacklinkQuery::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].referring_domain, "c.org");
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_query_limit_caps_records() {
        let transport = RecordingTransport::with_responses(vec![page(
            vec![referrer("a.org", 1), referrer("b.org", 1), referrer("c.org", 1)],
            3,
            0,
            None,
        )]);
        let client = DataForSeoClient::with_transport(config(), transport.clone()).unwrap();
        let target = Target::parse("example.com").unwrap();
        let query = BacklinkQuery {
            limit: Some(2),
            ..Default::default()
        };

        let records = client.referring_domains(&target, &query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(transport.requests()[0].body.as_ref().unwrap()[0]["limit"], 2);
    }

    #[tokio::test]
    async fn test_ranked_keywords_sends_locale_and_filters() {
        let transport = RecordingTransport::with_responses(vec![page(
            vec![json!({
                "keyword_data": {
                    "keyword": "trail shoes",
                    "keyword_info": {"search_volume": 500, "cpc": 1.1}
                },
                "ranked_serp_element": {"serp_item": {"rank_group": 4}}
            })],
            1,
            0,
            None,
        )]);
        let client = DataForSeoClient::with_transport(config(), transport.clone()).unwrap();
        let target = Target::parse("https://www.Example.com/").unwrap();
        let query = KeywordQuery {
            conditions: vec![
                Condition::new("search_volume", FilterOperator::Gte, 100u64),
                Condition::new("no_such_field", FilterOperator::Eq, 1u64),
            ],
            ..Default::default()
        };

        let records = client.ranked_keywords(&target, &query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keyword, "trail shoes");
        assert_eq!(records[0].position, Some(4.0));

        let requests = transport.requests();
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(requests[0].url, "http://provider.test/v3/dataforseo_labs/google/ranked_keywords/live");
        assert_eq!(body[0]["target"], "example.com");
        assert_eq!(body[0]["location_code"], 2840);
        assert_eq!(body[0]["language_code"], "en");
        assert_eq!(
            body[0]["filters"],
            json!(["keyword_data.keyword_info.search_volume", ">=", 100])
        );
    }

    #[tokio::test]
    async fn test_related_keywords_clamps_depth() {
        let transport = RecordingTransport::with_responses(vec![page(
            vec![json!({
                "keyword_data": {"keyword": "trail shoes"},
                "depth": 1,
                "related_keywords": ["trail running shoes"]
            })],
            1,
            0,
            None,
        )]);
        let client = DataForSeoClient::with_transport(config(), transport.clone()).unwrap();

        let records = client
            .related_keywords("running shoes", 9, &KeywordQuery::default())
            .await
            .unwrap();
        assert_eq!(records[0].depth, Some(1));
        assert_eq!(records[0].related_keywords, vec!["trail running shoes"]);

        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body[0]["keyword"], "running shoes");
        assert_eq!(body[0]["depth"], MAX_DEPTH);
    }

    #[tokio::test]
    async fn test_upstream_failure_yields_no_records() {
        let transport = RecordingTransport::with_responses(vec![(
            200,
            json!({
                "status_code": 20000,
                "status_message": "Ok.",
                "tasks": [{"status_code": 40501, "status_message": "Invalid Field: 'target'.", "result": null}]
            }),
        )]);
        let client = DataForSeoClient::with_transport(config(), transport).unwrap();
        let target = Target::parse("example.com").unwrap();

        let error = client
            .ranked_keywords(&target, &KeywordQuery::default())
            .await
            .unwrap_err();
        match error {
            ProviderError::Upstream(upstream) => {
                assert_eq!(upstream.status_code, 40501);
                assert_eq!(upstream.message, "Invalid Field: 'target'.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_error_status_is_surfaced() {
        let transport = RecordingTransport::with_responses(vec![(401, json!({"error": "unauthorized"}))]);
        let client = DataForSeoClient::with_transport(config(), transport).unwrap();
        let target = Target::parse("example.com").unwrap();

        let error = client
            .referring_domains(&target, &BacklinkQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(error, ProviderError::HttpStatus { status: 401, .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ProviderConfig {
            page_limit: 0,
            ..config()
        };
        let result = DataForSeoClient::with_transport(config, RecordingTransport::default());
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_no_auth_without_credentials() {
        let client = DataForSeoClient::with_transport(
            ProviderConfig {
                base_url: "http://provider.test".to_string(),
                ..Default::default()
            },
            RecordingTransport::default(),
        )
        .unwrap();
        assert!(!client.config().has_credentials());
    }
}

use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const TREND_PARTS: &str = "snippet,statistics";
const MOST_POPULAR_CHART: &str = "mostPopular";

/// Number of videos requested from the most-popular chart per run.
pub const TREND_BATCH_SIZE: u32 = 50;

/// One entry of the `videos` listing, kept as close to the wire shape as possible.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: RawSnippet,
    #[serde(default)]
    pub statistics: RawStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatistics {
    #[serde(rename = "viewCount", default, deserialize_with = "lenient_count")]
    pub view_count: Option<u64>,
    #[serde(rename = "likeCount", default, deserialize_with = "lenient_count")]
    pub like_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<RawVideo>,
}

#[derive(Debug, Deserialize)]
struct CategoryListResponse {
    #[serde(default)]
    items: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    snippet: RawCategorySnippet,
}

#[derive(Debug, Deserialize)]
struct RawCategorySnippet {
    title: String,
}

/// Counts arrive as decimal strings; numbers are tolerated and anything else is dropped.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        _ => None,
    })
}

/// Outcome of the category lookup. `Unresolved` is the degraded path where every
/// video ends up labelled "Unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLookup {
    Resolved(HashMap<String, String>),
    Unresolved,
}

impl CategoryLookup {
    pub fn name_of(&self, category_id: &str) -> Option<&str> {
        match self {
            Self::Resolved(names) => names.get(category_id).map(String::as_str),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Distinct, non-empty category ids referenced by a batch, in sorted order.
pub fn distinct_category_ids(videos: &[RawVideo]) -> Vec<String> {
    videos
        .iter()
        .filter_map(|video| video.snippet.category_id.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct TrendService {
    http: Client,
    api_base: String,
    api_key: String,
}

impl TrendService {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::custom(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetches the most-popular chart for `region`. An empty chart is a failure.
    pub async fn fetch_trending(&self, region: &str) -> Result<Vec<RawVideo>> {
        let url = format!("{}/videos", self.api_base);
        let max_results = TREND_BATCH_SIZE.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", TREND_PARTS),
                ("chart", MOST_POPULAR_CHART),
                ("regionCode", region),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("request error: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Fetch(format!("unexpected status: {e}")))?;

        let listing: VideoListResponse = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("malformed response: {e}")))?;

        if listing.items.is_empty() {
            return Err(Error::Fetch(format!(
                "no trending videos returned for region {region}"
            )));
        }

        info!(region, count = listing.items.len(), "fetched trending videos");
        Ok(listing.items)
    }

    /// Resolves category ids to display names. Never fails: any error is logged and
    /// turned into [`CategoryLookup::Unresolved`].
    pub async fn resolve_categories(
        &self,
        category_ids: &[String],
        region: &str,
    ) -> CategoryLookup {
        if category_ids.is_empty() {
            debug!("no category ids to resolve");
            return CategoryLookup::Resolved(HashMap::new());
        }

        match self.lookup_categories(category_ids, region).await {
            Ok(names) => {
                let unresolved = category_ids
                    .iter()
                    .filter(|id| !names.contains_key(*id))
                    .count();
                if unresolved > 0 {
                    debug!(unresolved, "some category ids were not returned by the lookup");
                }
                info!(resolved = names.len(), "resolved video categories");
                CategoryLookup::Resolved(names)
            }
            Err(e) => {
                warn!(error = %e, "category lookup failed, labelling every video as Unknown");
                CategoryLookup::Unresolved
            }
        }
    }

    async fn lookup_categories(
        &self,
        category_ids: &[String],
        region: &str,
    ) -> Result<HashMap<String, String>> {
        let url = format!("{}/videoCategories", self.api_base);
        let ids = category_ids.join(",");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("id", ids.as_str()),
                ("regionCode", region),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::CategoryLookup(format!("request error: {e}")))?
            .error_for_status()
            .map_err(|e| Error::CategoryLookup(format!("unexpected status: {e}")))?;

        let listing: CategoryListResponse = response
            .json()
            .await
            .map_err(|e| Error::CategoryLookup(format!("malformed response: {e}")))?;

        Ok(listing
            .items
            .into_iter()
            .map(|category| (category.id, category.snippet.title))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> TrendService {
        TrendService::new("test-key", Duration::from_secs(5))
            .expect("client")
            .with_api_base(server.uri())
    }

    fn video(id: &str, category: &str, views: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "snippet": {
                "title": format!("title {id}"),
                "categoryId": category,
                "publishedAt": "2024-05-01T12:00:00Z"
            },
            "statistics": { "viewCount": views, "likeCount": "7" }
        })
    }

    #[tokio::test]
    async fn fetch_sends_chart_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("part", "snippet,statistics"))
            .and(query_param("chart", "mostPopular"))
            .and(query_param("regionCode", "KR"))
            .and(query_param("maxResults", "50"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [video("a", "10", json!("1200")), video("b", "24", json!(5))]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let videos = service(&server).fetch_trending("KR").await.expect("videos");

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "a");
        assert_eq!(videos[0].statistics.view_count, Some(1200));
        assert_eq!(videos[1].statistics.view_count, Some(5));
        assert_eq!(videos[1].statistics.like_count, Some(7));
    }

    #[tokio::test]
    async fn empty_chart_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let err = service(&server).fetch_trending("US").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = service(&server).fetch_trending("US").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn resolves_category_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videoCategories"))
            .and(query_param("id", "10,24"))
            .and(query_param("part", "snippet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "id": "10", "snippet": { "title": "Music" } }
                ]
            })))
            .mount(&server)
            .await;

        let lookup = service(&server)
            .resolve_categories(&["10".to_string(), "24".to_string()], "US")
            .await;

        assert!(lookup.is_resolved());
        assert_eq!(lookup.name_of("10"), Some("Music"));
        assert_eq!(lookup.name_of("24"), None);
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videoCategories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let lookup = service(&server)
            .resolve_categories(&["10".to_string()], "US")
            .await;

        assert_eq!(lookup, CategoryLookup::Unresolved);
        assert_eq!(lookup.name_of("10"), None);
    }

    #[tokio::test]
    async fn malformed_lookup_degrades_to_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videoCategories"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let lookup = service(&server)
            .resolve_categories(&["10".to_string()], "US")
            .await;

        assert_eq!(lookup, CategoryLookup::Unresolved);
    }

    #[tokio::test]
    async fn no_ids_skips_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let lookup = service(&server).resolve_categories(&[], "US").await;
        assert_eq!(lookup, CategoryLookup::Resolved(HashMap::new()));
    }

    #[test]
    fn category_ids_are_deduplicated() {
        let videos: Vec<RawVideo> = serde_json::from_value(json!([
            video("a", "10", json!("1")),
            video("b", "24", json!("1")),
            video("c", "10", json!("1")),
            { "id": "d", "snippet": { "title": "no category" } }
        ]))
        .expect("videos");

        assert_eq!(distinct_category_ids(&videos), vec!["10", "24"]);
    }

    #[test]
    fn malformed_counts_become_none() {
        let stats: RawStatistics = serde_json::from_value(json!({
            "viewCount": "lots",
            "likeCount": -4
        }))
        .expect("statistics");
        assert_eq!(stats.view_count, None);
        assert_eq!(stats.like_count, None);

        let stats: RawStatistics = serde_json::from_value(json!({})).expect("statistics");
        assert_eq!(stats.view_count, None);
    }
}

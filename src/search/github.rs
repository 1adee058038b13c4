use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{RateLimit, ResultPage, SearchTransport};
use crate::config::SearchConfig;
use crate::error::{Error, Result};

const SEARCH_QUERY: &str = r#"
query($query: String!, $first: Int!, $after: String) {
    search(query: $query, type: REPOSITORY, first: $first, after: $after) {
        repositoryCount
        pageInfo {
            endCursor
            hasNextPage
        }
        edges {
            node {
                ... on Repository {
                    url
                }
            }
        }
    }
    rateLimit {
        limit
        cost
        remaining
        resetAt
    }
}
"#;

const COUNT_QUERY: &str = r#"
query($query: String!) {
    search(query: $query, type: REPOSITORY, first: 1) {
        repositoryCount
    }
    rateLimit {
        limit
        cost
        remaining
        resetAt
    }
}
"#;

/// Repository search over the GitHub GraphQL API.
pub struct GitHubSearch {
    client: Client,
    endpoint: String,
    token: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    search: SearchConnection,
    rate_limit: Option<RateLimit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchConnection {
    repository_count: u64,
    page_info: Option<PageInfo>,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    url: Option<String>,
}

impl GitHubSearch {
    pub fn new(config: &SearchConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: token.into(),
            page_size: config.page_size,
        })
    }

    fn post<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphQlResponse<T> = response.json()?;
        unwrap_response(body)
    }
}

fn unwrap_response<T>(body: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(Error::GraphQl(messages.join("; ")));
    }
    body.data
        .ok_or_else(|| Error::GraphQl("response carried no data".to_string()))
}

fn log_rate_limit(rate_limit: Option<&RateLimit>) {
    if let Some(rate) = rate_limit {
        info!(
            "Remaining rate limit - {}/{} (cost {}, resets at {})",
            rate.remaining, rate.limit, rate.cost, rate.reset_at
        );
    }
}

fn into_page(data: SearchData) -> ResultPage {
    let (end_cursor, has_next_page) = data
        .search
        .page_info
        .map(|info| (info.end_cursor, info.has_next_page))
        .unwrap_or((None, false));
    let items = data
        .search
        .edges
        .into_iter()
        .filter_map(|edge| edge.node.and_then(|node| node.url))
        .collect();

    ResultPage {
        total_count: data.search.repository_count,
        items,
        end_cursor,
        has_next_page,
        rate_limit: data.rate_limit,
    }
}

impl SearchTransport for GitHubSearch {
    fn count(&self, filter: &str) -> Result<u64> {
        let data: SearchData = self.post(COUNT_QUERY, json!({ "query": filter }))?;
        log_rate_limit(data.rate_limit.as_ref());
        Ok(data.search.repository_count)
    }

    fn page(&self, filter: &str, cursor: Option<&str>) -> Result<ResultPage> {
        let data: SearchData = self.post(
            SEARCH_QUERY,
            json!({ "query": filter, "first": self.page_size, "after": cursor }),
        )?;
        log_rate_limit(data.rate_limit.as_ref());
        Ok(into_page(data))
    }
}

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use super::types::{
    ListResponse, SearchResponse, TestPlanSummary, TestSuiteResponse, WorkItemResponse,
};
use super::{WorkItem, WorkItemRelation, WorkTracker};
use crate::config::{AdoClientConfig, RequestConfig};
use crate::error::{AdoError, AdoResult};
use crate::models::{AdoTestCase, TestSuite};

use async_trait::async_trait;

const API_VERSION: &str = "7.0";

/// HTTP client for the Azure DevOps REST API.
#[derive(Clone)]
pub struct AdoClient {
    client: Client,
    base_url: String,
    pat: String,
    timeout_ms: u64,
}

impl AdoClient {
    /// Create a new client with the configured per-call timeout.
    pub fn new(config: &AdoClientConfig, request: &RequestConfig) -> AdoResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(request.ado_timeout_ms))
            .build()
            .map_err(|e| AdoError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/{}/{}/_apis",
                config.base_url.trim_end_matches('/'),
                config.organization,
                config.project
            ),
            pat: config.pat.clone(),
            timeout_ms: request.ado_timeout_ms,
        })
    }

    /// Clone the client with a per-request credential, forwarded opaquely
    /// from the inbound call.
    pub fn with_pat(&self, pat: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.pat = pat.into();
        client
    }

    /// Base URL (for tests).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> AdoError {
        if e.is_timeout() {
            AdoError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            AdoError::Connection {
                message: e.to_string(),
            }
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        work_item_id: Option<u32>,
    ) -> AdoResult<reqwest::Response> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AdoError::Unauthorized),
            StatusCode::FORBIDDEN => Err(AdoError::Forbidden),
            StatusCode::NOT_FOUND => Err(AdoError::NotFound {
                work_item_id: work_item_id.unwrap_or_default(),
            }),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(AdoError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Ok(response),
        }
    }

    async fn fetch_work_item_response(&self, id: u32) -> AdoResult<WorkItemResponse> {
        let url = format!("{}/wit/workitems/{}", self.base_url, id);
        debug!(work_item_id = id, "Fetching work item");

        let response = self
            .client
            .get(&url)
            .basic_auth("", Some(&self.pat))
            .query(&[("api-version", API_VERSION), ("$expand", "relations")])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = self.check_status(response, Some(id)).await?;
        response
            .json()
            .await
            .map_err(|e| AdoError::InvalidResponse {
                message: format!("Failed to parse work item {}: {}", id, e),
            })
    }

    async fn fetch_test_plans(&self) -> AdoResult<Vec<TestPlanSummary>> {
        let url = format!("{}/test/plans", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth("", Some(&self.pat))
            .query(&[("api-version", API_VERSION)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = self.check_status(response, None).await?;
        let list: ListResponse<TestPlanSummary> =
            response
                .json()
                .await
                .map_err(|e| AdoError::InvalidResponse {
                    message: format!("Failed to parse test plans: {}", e),
                })?;
        Ok(list.value)
    }

    async fn fetch_suites_in_plan(&self, plan_id: u32) -> AdoResult<Vec<TestSuiteResponse>> {
        let url = format!("{}/test/plans/{}/suites", self.base_url, plan_id);
        let response = self
            .client
            .get(&url)
            .basic_auth("", Some(&self.pat))
            .query(&[("api-version", API_VERSION)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = self.check_status(response, None).await?;
        let list: ListResponse<TestSuiteResponse> =
            response
                .json()
                .await
                .map_err(|e| AdoError::InvalidResponse {
                    message: format!("Failed to parse suites for plan {}: {}", plan_id, e),
                })?;
        Ok(list.value)
    }
}

#[async_trait]
impl WorkTracker for AdoClient {
    async fn get_work_item(&self, id: u32) -> AdoResult<WorkItem> {
        self.fetch_work_item_response(id).await?.into_work_item()
    }

    async fn get_relations(&self, id: u32) -> AdoResult<Vec<WorkItemRelation>> {
        Ok(self.fetch_work_item_response(id).await?.relations)
    }

    async fn get_test_links(&self, id: u32) -> AdoResult<Vec<AdoTestCase>> {
        let relations = self.get_relations(id).await?;
        let mut test_cases = Vec::new();

        for relation in relations.iter().filter(|r| r.is_test_link()) {
            let Some(test_id) = relation.target_id() else {
                continue;
            };
            // A single unreadable linked test case degrades rather than
            // failing the whole lookup.
            match self.fetch_work_item_response(test_id).await {
                Ok(response) => test_cases.push(response.into_test_case()),
                Err(e) => {
                    warn!(test_case_id = test_id, error = %e, "Skipping unreadable linked test case");
                }
            }
        }

        Ok(test_cases)
    }

    async fn get_test_suites(&self, area_path: &str) -> AdoResult<Vec<TestSuite>> {
        let plans = self.fetch_test_plans().await?;
        let mut suites = Vec::new();

        for plan in plans {
            for suite in self.fetch_suites_in_plan(plan.id).await? {
                if suite.area_path.contains(area_path) || area_path.is_empty() {
                    suites.push(suite.into_suite());
                }
            }
        }

        Ok(suites)
    }

    async fn search_test_cases(&self, keywords: &str) -> AdoResult<Vec<AdoTestCase>> {
        let url = format!("{}/search/workitemsearchresults", self.base_url);
        let body = json!({
            "searchText": keywords,
            "filters": { "System.WorkItemType": ["Test Case"] },
            "top": 50
        });

        let response = self
            .client
            .post(&url)
            .basic_auth("", Some(&self.pat))
            .query(&[("api-version", API_VERSION)])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = self.check_status(response, None).await?;
        let search: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| AdoError::InvalidResponse {
                    message: format!("Failed to parse search results: {}", e),
                })?;

        let mut test_cases = Vec::new();
        for result in search.results {
            match self.fetch_work_item_response(result.work_item.id).await {
                Ok(item) => test_cases.push(item.into_test_case()),
                Err(e) => {
                    warn!(test_case_id = result.work_item.id, error = %e, "Skipping unreadable search hit");
                }
            }
        }

        Ok(test_cases)
    }
}

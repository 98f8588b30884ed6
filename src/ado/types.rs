use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::AdoError;
use crate::models::{AdoTestCase, TestSuite, WorkItemNode, WorkItemType};

/// Parent link relation type in the tracker's wire format.
pub const PARENT_RELATION: &str = "System.LinkTypes.Hierarchy-Reverse";
/// Test case link relation type.
pub const TESTED_BY_RELATION: &str = "Microsoft.VSTS.Common.TestedBy";

/// A work item as the pipeline sees it.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: u32,
    pub work_item_type: WorkItemType,
    pub title: String,
    pub state: Option<String>,
    pub area_path: String,
    pub acceptance_criteria: Option<String>,
}

impl WorkItem {
    /// Project into the hierarchy node model.
    pub fn to_node(&self) -> WorkItemNode {
        WorkItemNode {
            id: self.id,
            work_item_type: self.work_item_type,
            title: self.title.clone(),
            state: self.state.clone(),
            acceptance_criteria: self.acceptance_criteria.clone(),
        }
    }
}

/// A relation entry on a work item.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemRelation {
    pub rel: String,
    pub url: String,
}

impl WorkItemRelation {
    pub fn is_parent(&self) -> bool {
        self.rel == PARENT_RELATION
    }

    pub fn is_test_link(&self) -> bool {
        self.rel == TESTED_BY_RELATION
    }

    /// Target work item id, taken from the trailing URL segment.
    pub fn target_id(&self) -> Option<u32> {
        self.url.rsplit('/').next()?.parse().ok()
    }
}

/// Raw work item payload from the tracker API.
#[derive(Debug, Deserialize)]
pub struct WorkItemResponse {
    pub id: u32,
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub relations: Vec<WorkItemRelation>,
}

impl WorkItemResponse {
    fn field_str(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// Convert into the pipeline work item model.
    pub fn into_work_item(self) -> Result<WorkItem, AdoError> {
        let type_name =
            self.field_str("System.WorkItemType")
                .ok_or_else(|| AdoError::InvalidResponse {
                    message: format!("work item {} missing System.WorkItemType", self.id),
                })?;
        let work_item_type =
            WorkItemType::from_str(&type_name).map_err(|e| AdoError::InvalidResponse {
                message: format!("work item {}: {}", self.id, e),
            })?;

        Ok(WorkItem {
            id: self.id,
            work_item_type,
            title: self.field_str("System.Title").unwrap_or_default(),
            state: self.field_str("System.State"),
            area_path: self.field_str("System.AreaPath").unwrap_or_default(),
            acceptance_criteria: self.field_str("Microsoft.VSTS.Common.AcceptanceCriteria"),
        })
    }

    /// Convert a test-case work item into the existing-test model.
    pub fn into_test_case(self) -> AdoTestCase {
        let assigned_to = self
            .fields
            .get("System.AssignedTo")
            .and_then(|v| v.get("displayName"))
            .and_then(|v| v.as_str())
            .map(String::from);

        AdoTestCase {
            id: self.id,
            title: self.field_str("System.Title").unwrap_or_default(),
            state: self.field_str("System.State").unwrap_or_default(),
            assigned_to,
            area_path: self.field_str("System.AreaPath").unwrap_or_default(),
            iteration_path: self.field_str("System.IterationPath").unwrap_or_default(),
            test_suite_id: None,
            last_execution_outcome: self.field_str("Microsoft.VSTS.TCM.AutomatedTestStorage"),
        }
    }
}

/// Envelope for list endpoints (`{ "value": [...] }`).
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// A test plan summary from the plans endpoint.
#[derive(Debug, Deserialize)]
pub struct TestPlanSummary {
    pub id: u32,
}

/// Raw test suite payload.
#[derive(Debug, Deserialize)]
pub struct TestSuiteResponse {
    pub id: u32,
    pub name: String,
    #[serde(rename = "areaPath", default)]
    pub area_path: String,
    #[serde(rename = "testCaseCount", default)]
    pub test_case_count: u32,
    #[serde(rename = "parentSuite")]
    pub parent_suite: Option<ParentSuiteRef>,
}

#[derive(Debug, Deserialize)]
pub struct ParentSuiteRef {
    pub id: u32,
}

impl TestSuiteResponse {
    pub fn into_suite(self) -> TestSuite {
        TestSuite {
            id: self.id,
            name: self.name,
            test_case_count: self.test_case_count,
            parent_suite_id: self.parent_suite.map(|p| p.id),
        }
    }
}

/// Work item search response shapes.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "workItem")]
    pub work_item: SearchWorkItemRef,
}

#[derive(Debug, Deserialize)]
pub struct SearchWorkItemRef {
    pub id: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_relation_target_id() {
        let relation = WorkItemRelation {
            rel: PARENT_RELATION.to_string(),
            url: "https://dev.azure.com/org/_apis/wit/workItems/991".to_string(),
        };
        assert!(relation.is_parent());
        assert!(!relation.is_test_link());
        assert_eq!(relation.target_id(), Some(991));

        let bad = WorkItemRelation {
            rel: "other".to_string(),
            url: "not-a-url".to_string(),
        };
        assert_eq!(bad.target_id(), None);
    }

    #[test]
    fn test_work_item_conversion() {
        let response: WorkItemResponse = serde_json::from_value(json!({
            "id": 42,
            "fields": {
                "System.Title": "Add login",
                "System.WorkItemType": "User Story",
                "System.State": "Active",
                "System.AreaPath": "Project\\Auth"
            }
        }))
        .unwrap();

        let item = response.into_work_item().unwrap();
        assert_eq!(item.id, 42);
        assert_eq!(item.work_item_type, WorkItemType::UserStory);
        assert_eq!(item.title, "Add login");
        assert_eq!(item.area_path, "Project\\Auth");

        let node = item.to_node();
        assert_eq!(node.id, 42);
        assert_eq!(node.state.as_deref(), Some("Active"));
    }

    #[test]
    fn test_work_item_missing_type_is_invalid() {
        let response: WorkItemResponse = serde_json::from_value(json!({
            "id": 1,
            "fields": { "System.Title": "No type" }
        }))
        .unwrap();
        assert!(matches!(
            response.into_work_item(),
            Err(AdoError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_test_case_conversion() {
        let response: WorkItemResponse = serde_json::from_value(json!({
            "id": 7,
            "fields": {
                "System.Title": "Verify login",
                "System.State": "Design",
                "System.AssignedTo": { "displayName": "Sam Tester" },
                "System.AreaPath": "Project\\Auth",
                "System.IterationPath": "Project\\Sprint 9"
            }
        }))
        .unwrap();

        let case = response.into_test_case();
        assert_eq!(case.id, 7);
        assert_eq!(case.assigned_to.as_deref(), Some("Sam Tester"));
        assert_eq!(case.iteration_path, "Project\\Sprint 9");
        assert!(case.test_suite_id.is_none());
    }

    #[test]
    fn test_suite_conversion() {
        let response: TestSuiteResponse = serde_json::from_value(json!({
            "id": 5,
            "name": "Auth suite",
            "areaPath": "Project\\Auth",
            "testCaseCount": 12,
            "parentSuite": { "id": 2 }
        }))
        .unwrap();

        let suite = response.into_suite();
        assert_eq!(suite.id, 5);
        assert_eq!(suite.test_case_count, 12);
        assert_eq!(suite.parent_suite_id, Some(2));
    }
}

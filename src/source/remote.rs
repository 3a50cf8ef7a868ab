//! Table loader that reads another instance's REST API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::OrgSource;
use crate::error::{AppError, AppResult};
use crate::hierarchy::{BuildOptions, HierarchyNode, OrgSources, OrgTables, ViewMode};

/// `{status, data}` envelope as returned by every endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
    pub details: Option<String>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> AppResult<T> {
        let Envelope {
            status,
            data,
            message,
            details,
        } = self;
        if status != "success" {
            return Err(AppError::Upstream(details.or(message).unwrap_or(status)));
        }
        data.ok_or_else(|| AppError::Upstream("response carried no data".to_string()))
    }
}

/// `data` of a `/tree` response; `nodes` is absent for an empty tree
#[derive(Debug, Deserialize)]
struct TreePayload {
    #[serde(default)]
    nodes: Vec<HierarchyNode>,
}

pub struct RemoteSource {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteSource {
    /// `base_url` points at the API root, e.g. `http://host:8080/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let envelope: Envelope<T> = self
            .client
            .get(self.url(path))
            .send()
            .await?
            .json()
            .await?;
        envelope.into_data()
    }

    /// Fetch a collection, logging and returning `None` on failure
    async fn fetch_optional<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.fetch(path).await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", path, e);
                None
            }
        }
    }

    /// Fetch all five collections concurrently. Collections that fail stay
    /// unloaded, so the result may not be ready.
    pub async fn load_sources(&self) -> OrgSources {
        let (departments, positions, position_departments, position_positions, employees) = futures::join!(
            self.fetch_optional("departments"),
            self.fetch_optional("positions"),
            self.fetch_optional("positiondepartments"),
            self.fetch_optional("positionpositions"),
            self.fetch_optional("employees"),
        );
        OrgSources {
            departments,
            positions,
            position_departments,
            position_positions,
            employees,
        }
    }

    /// Ask the remote side to build the tree itself
    pub async fn fetch_tree(&self, options: &BuildOptions) -> AppResult<Vec<HierarchyNode>> {
        let mut query: Vec<(&str, String)> = vec![("levels", options.max_depth.to_string())];
        if let Some(id) = options.focus_position_id {
            query.push(("focus_position_id", id.to_string()));
        }
        if let Some(id) = options.focus_department_id {
            query.push(("focus_department_id", id.to_string()));
        }
        if let Some(id) = options.context_department_id {
            query.push(("department_id", id.to_string()));
        }
        if options.view == ViewMode::Positions {
            query.push(("view", "positions".to_string()));
        }

        let envelope: Envelope<TreePayload> = self
            .client
            .get(self.url("tree"))
            .query(&query)
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.into_data()?.nodes)
    }
}

#[async_trait]
impl OrgSource for RemoteSource {
    async fn load(&self) -> AppResult<OrgTables> {
        let sources = self.load_sources().await;
        let missing = sources.missing();
        sources.into_tables().ok_or_else(|| {
            AppError::Upstream(format!("incomplete data, missing: {}", missing.join(", ")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::department;

    #[test]
    fn test_url_join() {
        let source = RemoteSource::new("http://localhost:8080/api/");
        assert_eq!(source.url("/departments"), "http://localhost:8080/api/departments");
        assert_eq!(source.url("tree"), "http://localhost:8080/api/tree");
    }

    #[test]
    fn test_envelope_success() {
        let json = r#"{"status":"success","data":[{"department_id":1,"name":"HQ","parent_department_id":null,"parent_position_id":null}]}"#;
        let envelope: Envelope<Vec<department::Model>> = serde_json::from_str(json).unwrap();
        let data = envelope.into_data().unwrap();
        assert_eq!(data[0].name, "HQ");
        assert!(!data[0].deleted);
    }

    #[test]
    fn test_envelope_error() {
        let json = r#"{"status":"error","message":"Not Found","details":"department 4 not found"}"#;
        let envelope: Envelope<Vec<department::Model>> = serde_json::from_str(json).unwrap();
        match envelope.into_data() {
            Err(AppError::Upstream(msg)) => assert_eq!(msg, "department 4 not found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_tree_payload() {
        let json = r#"{"status":"success","data":{"state":"empty"}}"#;
        let envelope: Envelope<TreePayload> = serde_json::from_str(json).unwrap();
        assert!(envelope.into_data().unwrap().nodes.is_empty());
    }
}

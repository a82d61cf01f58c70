//! REST client for the MAAS platform API.

use crate::refresh::RefreshCoordinator;
use crate::types::{
    Agent, CreateEnvironmentRequest, CreateTaskRequest, DeployAgentRequest, Environment,
    HealthStatus, Task, UpdateEnvironmentRequest,
};
use crate::{ApiError, ApiResult};
use console_auth::SessionManager;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fixed timeout applied to every API request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the platform's REST API.
///
/// The session is injected rather than owned: every authenticated request
/// reads the current access token through the shared handle, so a login,
/// refresh, or logout elsewhere is picked up immediately.
pub struct MaasClient {
    http_client: Client,
    base_url: String,
    session: Arc<SessionManager>,
    refresh: RefreshCoordinator,
}

impl MaasClient {
    /// Create a new client rooted at `{base_url}/api/v1`.
    pub fn new(base_url: &str, session: Arc<SessionManager>) -> ApiResult<Self> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            base_url: format!("{}/api/v1", base_url.trim_end_matches('/')),
            session,
            refresh: RefreshCoordinator::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_request(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        query: &[(String, String)],
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    /// Issue an authenticated request, recovering once from a 401.
    ///
    /// A rejected token triggers the shared refresh; the request is replayed
    /// at most once with the fresh token, and a second rejection is surfaced
    /// as-is. When recovery fails the caller gets the original 401 error,
    /// never a wrapped refresh error.
    async fn send_authorized(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: Vec<(String, String)>,
    ) -> ApiResult<Response> {
        let url = self.url(path);
        let token = self.session.access_token().ok_or(ApiError::NotAuthenticated)?;

        debug!(method = %method, url = %url, "API request");

        let response = self
            .build_request(&method, &url, body.as_ref(), &query, &token)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check(response).await;
        }

        let original = unauthorized_error(response).await;

        match self.refresh.recover(self.session.as_ref()).await {
            Some(fresh_token) => {
                debug!(url = %url, "Replaying request with refreshed token");
                let retry = self
                    .build_request(&method, &url, body.as_ref(), &query, &fresh_token)
                    .send()
                    .await?;
                check(retry).await
            }
            None => Err(original),
        }
    }

    // Health endpoints

    /// Service health. Unauthenticated.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let response = self.http_client.get(self.url("/health")).send().await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    // Environment endpoints

    pub async fn list_environments(&self) -> ApiResult<Vec<Environment>> {
        let response = self
            .send_authorized(Method::GET, "/environments", None, Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn get_environment(&self, id: &str) -> ApiResult<Environment> {
        let response = self
            .send_authorized(Method::GET, &format!("/environments/{id}"), None, Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn create_environment(
        &self,
        request: &CreateEnvironmentRequest,
    ) -> ApiResult<Environment> {
        let body = serde_json::to_value(request)?;
        let response = self
            .send_authorized(Method::POST, "/environments", Some(body), Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn update_environment(
        &self,
        id: &str,
        request: &UpdateEnvironmentRequest,
    ) -> ApiResult<Environment> {
        let body = serde_json::to_value(request)?;
        let response = self
            .send_authorized(
                Method::PUT,
                &format!("/environments/{id}"),
                Some(body),
                Vec::new(),
            )
            .await?;
        Ok(response.json().await?)
    }

    pub async fn delete_environment(&self, id: &str) -> ApiResult<()> {
        self.send_authorized(
            Method::DELETE,
            &format!("/environments/{id}"),
            None,
            Vec::new(),
        )
        .await?;
        Ok(())
    }

    // Agent endpoints

    pub async fn list_agents(&self, environment_id: Option<&str>) -> ApiResult<Vec<Agent>> {
        let query = match environment_id {
            Some(id) => vec![("environment_id".to_string(), id.to_string())],
            None => Vec::new(),
        };
        let response = self
            .send_authorized(Method::GET, "/agents", None, query)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn get_agent(&self, id: &str) -> ApiResult<Agent> {
        let response = self
            .send_authorized(Method::GET, &format!("/agents/{id}"), None, Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn deploy_agent(&self, request: &DeployAgentRequest) -> ApiResult<Agent> {
        let body = serde_json::to_value(request)?;
        let response = self
            .send_authorized(Method::POST, "/agents", Some(body), Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn delete_agent(&self, id: &str) -> ApiResult<()> {
        self.send_authorized(Method::DELETE, &format!("/agents/{id}"), None, Vec::new())
            .await?;
        Ok(())
    }

    pub async fn start_agent(&self, id: &str) -> ApiResult<Agent> {
        let response = self
            .send_authorized(
                Method::POST,
                &format!("/agents/{id}/start"),
                None,
                Vec::new(),
            )
            .await?;
        Ok(response.json().await?)
    }

    pub async fn stop_agent(&self, id: &str) -> ApiResult<Agent> {
        let response = self
            .send_authorized(Method::POST, &format!("/agents/{id}/stop"), None, Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    // Task endpoints

    pub async fn list_tasks(
        &self,
        environment_id: Option<&str>,
        agent_id: Option<&str>,
    ) -> ApiResult<Vec<Task>> {
        let mut query = Vec::new();
        if let Some(id) = environment_id {
            query.push(("environment_id".to_string(), id.to_string()));
        }
        if let Some(id) = agent_id {
            query.push(("agent_id".to_string(), id.to_string()));
        }
        let response = self
            .send_authorized(Method::GET, "/tasks", None, query)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn get_task(&self, id: &str) -> ApiResult<Task> {
        let response = self
            .send_authorized(Method::GET, &format!("/tasks/{id}"), None, Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> ApiResult<Task> {
        let body = serde_json::to_value(request)?;
        let response = self
            .send_authorized(Method::POST, "/tasks", Some(body), Vec::new())
            .await?;
        Ok(response.json().await?)
    }

    pub async fn cancel_task(&self, id: &str) -> ApiResult<Task> {
        let response = self
            .send_authorized(
                Method::POST,
                &format!("/tasks/{id}/cancel"),
                None,
                Vec::new(),
            )
            .await?;
        Ok(response.json().await?)
    }
}

/// Map a response to an error unless it is successful.
async fn check(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(unauthorized_error(response).await);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn unauthorized_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Unauthorized { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_storage::{SessionStore, StorageBackend, StorageResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStorage {
        data: Mutex<HashMap<String, String>>,
    }

    impl MemoryStorage {
        fn new() -> Self {
            Self {
                data: Mutex::new(HashMap::new()),
            }
        }
    }

    impl StorageBackend for MemoryStorage {
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        fn delete(&self, key: &str) -> StorageResult<bool> {
            Ok(self.data.lock().unwrap().remove(key).is_some())
        }
    }

    fn test_client() -> MaasClient {
        let store = SessionStore::new(Box::new(MemoryStorage::new()));
        let session = Arc::new(SessionManager::new(store, "http://localhost:8000").unwrap());
        MaasClient::new("http://localhost:8000/", session).unwrap()
    }

    #[test]
    fn test_base_url_normalization() {
        let client = test_client();
        assert_eq!(client.base_url, "http://localhost:8000/api/v1");
        assert_eq!(
            client.url("/environments"),
            "http://localhost:8000/api/v1/environments"
        );
    }

    #[tokio::test]
    async fn test_authenticated_endpoint_requires_token() {
        let client = test_client();
        let err = client.list_environments().await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }
}

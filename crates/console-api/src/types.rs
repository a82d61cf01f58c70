//! Wire types for the platform's environment, agent, and task resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Environment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentStatus {
    Active,
    Inactive,
    Pending,
}

/// A deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: EnvironmentStatus,
    pub created_at: String,
    pub updated_at: String,
    pub organization_id: String,
    #[serde(default)]
    pub config: Option<Value>,
}

/// Request body for creating an environment.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEnvironmentRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// Request body for updating an environment. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateEnvironmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnvironmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// Kind of agent deployed into an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    CodeGenerator,
    Research,
    Testing,
    GithubIntegration,
    BasicTools,
}

/// Agent lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Inactive,
    Deploying,
    Error,
}

/// An agent deployed into an environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub status: AgentStatus,
    pub environment_id: String,
    #[serde(default)]
    pub config: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for deploying an agent.
#[derive(Debug, Clone, Serialize)]
pub struct DeployAgentRequest {
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub name: String,
    pub environment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A unit of work submitted to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub agent_id: String,
    pub environment_id: String,
    pub status: TaskStatus,
    pub parameters: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Request body for creating a task.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub agent_id: String,
    pub parameters: Value,
}

/// Service health summary.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
}

//! REST client for the MAAS platform.
//!
//! This crate provides:
//! - `MaasClient`: typed environment/agent/task/health endpoints
//! - Automatic bearer authentication from the shared session
//! - Single-flight token refresh with replay of blocked requests on a
//!   401 response

mod client;
mod error;
mod refresh;
mod types;

pub use client::{MaasClient, REQUEST_TIMEOUT};
pub use error::{ApiError, ApiResult};
pub use types::{
    Agent, AgentKind, AgentStatus, CreateEnvironmentRequest, CreateTaskRequest,
    DeployAgentRequest, Environment, EnvironmentStatus, HealthStatus, Task, TaskStatus,
    UpdateEnvironmentRequest,
};

pub use console_storage::{OrganizationMembership, UserProfile};

//! Task commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use console_api::CreateTaskRequest;

pub async fn list(
    ctx: &AppContext,
    environment: Option<&str>,
    agent: Option<&str>,
) -> Result<()> {
    match ctx.client.list_tasks(environment, agent).await {
        Ok(tasks) => match ctx.format {
            OutputFormat::Text => {
                if tasks.is_empty() {
                    println!("No tasks");
                }
                for task in tasks {
                    println!(
                        "{}  {:?}  agent={}  env={}",
                        task.id, task.status, task.agent_id, task.environment_id
                    );
                }
            }
            OutputFormat::Json => output::print_json(&tasks),
        },
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn get(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.client.get_task(id).await {
        Ok(task) => output::print_json(&task),
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn create(ctx: &AppContext, agent: String, parameters: &str) -> Result<()> {
    let parameters: serde_json::Value = match serde_json::from_str(parameters) {
        Ok(value) => value,
        Err(e) => {
            output::print_error(&format!("Parameters must be valid JSON: {e}"), &ctx.format);
            return Ok(());
        }
    };

    let request = CreateTaskRequest {
        agent_id: agent,
        parameters,
    };

    match ctx.client.create_task(&request).await {
        Ok(task) => output::print_success(&format!("Created task {}", task.id), &ctx.format),
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn cancel(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.client.cancel_task(id).await {
        Ok(task) => {
            output::print_success(&format!("Task {} is {:?}", task.id, task.status), &ctx.format)
        }
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

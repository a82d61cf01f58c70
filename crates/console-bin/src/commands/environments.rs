//! Environment commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use console_api::CreateEnvironmentRequest;

pub async fn list(ctx: &AppContext) -> Result<()> {
    match ctx.client.list_environments().await {
        Ok(environments) => match ctx.format {
            OutputFormat::Text => {
                if environments.is_empty() {
                    println!("No environments");
                }
                for env in environments {
                    println!("{}  {}  {:?}", env.id, env.name, env.status);
                }
            }
            OutputFormat::Json => output::print_json(&environments),
        },
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn get(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.client.get_environment(id).await {
        Ok(env) => output::print_json(&env),
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn create(ctx: &AppContext, name: String, description: Option<String>) -> Result<()> {
    let request = CreateEnvironmentRequest {
        name,
        description,
        config: None,
    };

    match ctx.client.create_environment(&request).await {
        Ok(env) => output::print_success(&format!("Created environment {}", env.id), &ctx.format),
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.client.delete_environment(id).await {
        Ok(()) => output::print_success(&format!("Deleted environment {id}"), &ctx.format),
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

//! Agent commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use console_api::{AgentKind, DeployAgentRequest};

fn parse_kind(value: &str) -> Option<AgentKind> {
    match value {
        "code_generator" => Some(AgentKind::CodeGenerator),
        "research" => Some(AgentKind::Research),
        "testing" => Some(AgentKind::Testing),
        "github_integration" => Some(AgentKind::GithubIntegration),
        "basic_tools" => Some(AgentKind::BasicTools),
        _ => None,
    }
}

pub async fn list(ctx: &AppContext, environment: Option<&str>) -> Result<()> {
    match ctx.client.list_agents(environment).await {
        Ok(agents) => match ctx.format {
            OutputFormat::Text => {
                if agents.is_empty() {
                    println!("No agents");
                }
                for agent in agents {
                    println!(
                        "{}  {}  {:?}  {:?}  env={}",
                        agent.id, agent.name, agent.kind, agent.status, agent.environment_id
                    );
                }
            }
            OutputFormat::Json => output::print_json(&agents),
        },
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn deploy(ctx: &AppContext, name: String, kind: &str, environment: String) -> Result<()> {
    let Some(kind) = parse_kind(kind) else {
        output::print_error(
            &format!("Unknown agent kind '{kind}' (expected code_generator, research, testing, github_integration, or basic_tools)"),
            &ctx.format,
        );
        return Ok(());
    };

    let request = DeployAgentRequest {
        kind,
        name,
        environment_id: environment,
        config: None,
    };

    match ctx.client.deploy_agent(&request).await {
        Ok(agent) => output::print_success(&format!("Deployed agent {}", agent.id), &ctx.format),
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn start(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.client.start_agent(id).await {
        Ok(agent) => {
            output::print_success(&format!("Agent {} is {:?}", agent.id, agent.status), &ctx.format)
        }
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

pub async fn stop(ctx: &AppContext, id: &str) -> Result<()> {
    match ctx.client.stop_agent(id).await {
        Ok(agent) => {
            output::print_success(&format!("Agent {} is {:?}", agent.id, agent.status), &ctx.format)
        }
        Err(e) => output::print_error(&e.to_string(), &ctx.format),
    }
    Ok(())
}

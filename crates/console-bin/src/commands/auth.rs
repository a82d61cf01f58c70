//! Authentication commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use console_auth::RegisterRequest;
use std::io::{self, Write};

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Login with email and password.
pub async fn login(ctx: &AppContext) -> Result<()> {
    if ctx.session.is_authenticated() {
        let email = ctx
            .session
            .user()
            .map(|u| u.email)
            .unwrap_or_else(|| "unknown".to_string());
        output::print_success(&format!("Already logged in as {email}"), &ctx.format);
        return Ok(());
    }

    let email = prompt("Email")?;
    if email.is_empty() {
        output::print_error("Email is required", &ctx.format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", &ctx.format);
        return Ok(());
    }

    match ctx.session.login(&email, &password).await {
        Ok(user) => {
            // Keep the token fresh for the rest of this process's lifetime
            ctx.scheduler.arm();
            output::print_success(&format!("Logged in as {}", user.email), &ctx.format);
        }
        Err(_) => {
            let message = ctx
                .session
                .last_error()
                .unwrap_or_else(|| "Login failed".to_string());
            output::print_error(&message, &ctx.format);
        }
    }

    Ok(())
}

/// Register a new account. Routes back to login on success.
pub async fn register(ctx: &AppContext) -> Result<()> {
    let email = prompt("Email")?;
    let full_name = prompt("Full name")?;
    let organization = prompt("Organization (optional)")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm_password = rpassword::prompt_password("Confirm password: ")?;

    let request = RegisterRequest {
        email,
        password,
        confirm_password,
        full_name,
        organization_name: if organization.is_empty() {
            None
        } else {
            Some(organization)
        },
    };

    match ctx.session.register(&request).await {
        Ok(response) => {
            let message = if response.message.is_empty() {
                format!("Registered {}. You can now log in.", response.email)
            } else {
                response.message
            };
            output::print_success(&message, &ctx.format);
        }
        Err(e) => {
            let message = ctx.session.last_error().unwrap_or_else(|| e.to_string());
            output::print_error(&message, &ctx.format);
        }
    }

    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.scheduler.disarm();
    ctx.session.logout().await;
    output::print_success("Logged out", &ctx.format);
    Ok(())
}

/// Show authentication status.
pub fn status(ctx: &AppContext) -> Result<()> {
    let snapshot = ctx.session.snapshot();
    let state = ctx.session.state();

    match ctx.format {
        OutputFormat::Text => {
            if snapshot.is_authenticated {
                let user = snapshot.user.as_ref();
                println!(
                    "Logged in as {} ({})",
                    user.map(|u| u.email.as_str()).unwrap_or("unknown"),
                    user.map(|u| u.full_name.as_str()).unwrap_or("unknown"),
                );
                if let Some(user) = user {
                    for org in &user.organizations {
                        println!("  {} ({})", org.name, org.role);
                    }
                }
            } else {
                println!("Not logged in");
            }
        }
        OutputFormat::Json => {
            output::print_json(&serde_json::json!({
                "authenticated": snapshot.is_authenticated,
                "state": state,
                "user": snapshot.user,
            }));
        }
    }

    Ok(())
}

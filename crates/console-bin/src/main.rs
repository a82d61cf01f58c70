//! MAAS Console - command-line shell for the MAAS platform.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::AppContext;
use console_api::MaasClient;
use console_auth::{RefreshScheduler, SessionManager};
use console_config::{init_logging, Config, Paths};
use console_storage::{FileStorage, SessionStore};
use output::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;

/// MAAS console command-line interface.
#[derive(Parser)]
#[command(name = "maas-console")]
#[command(about = "Management console for MAAS environments, agents, and tasks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Base directory for console files. Defaults to ~/.maas-console
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Platform API URL. Overrides the configured value
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login,

    /// Register a new account
    Register,

    /// Logout and clear the stored session
    Logout,

    /// Show authentication status
    Status,

    /// Check platform health
    Health,

    /// Manage environments
    Environments {
        #[command(subcommand)]
        command: EnvironmentCommands,
    },

    /// Manage agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Subcommand)]
enum EnvironmentCommands {
    /// List environments
    List,
    /// Show one environment
    Get { id: String },
    /// Create an environment
    Create {
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an environment
    Delete { id: String },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List agents
    List {
        /// Only agents in this environment
        #[arg(short, long)]
        environment: Option<String>,
    },
    /// Deploy an agent
    Deploy {
        name: String,
        /// Agent kind (code_generator, research, testing, github_integration, basic_tools)
        #[arg(short, long)]
        kind: String,
        /// Target environment ID
        #[arg(short, long)]
        environment: String,
    },
    /// Start an agent
    Start { id: String },
    /// Stop an agent
    Stop { id: String },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        /// Only tasks in this environment
        #[arg(short, long)]
        environment: Option<String>,
        /// Only tasks for this agent
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Show one task
    Get { id: String },
    /// Create a task
    Create {
        /// Agent to run the task
        #[arg(short, long)]
        agent: String,
        /// Task parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        parameters: String,
    },
    /// Cancel a task
    Cancel { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;

    let mut config = Config::load(&paths)?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let storage = FileStorage::new(paths.session_file())?;
    let store = SessionStore::new(Box::new(storage));
    let session = Arc::new(SessionManager::new(store, &config.api_url)?);

    // One-time bootstrap: restore any persisted session before the command
    // touches protected resources.
    let restored = session.initialize_auth().await?;
    tracing::debug!(restored, "Bootstrap complete");

    let scheduler = RefreshScheduler::new(session.clone());
    if restored {
        scheduler.arm();
    }

    let client = MaasClient::new(&config.api_url, session.clone())?;

    let ctx = AppContext {
        session,
        client,
        scheduler,
        format: cli.format,
    };

    match cli.command {
        Commands::Login => commands::auth::login(&ctx).await,
        Commands::Register => commands::auth::register(&ctx).await,
        Commands::Logout => commands::auth::logout(&ctx).await,
        Commands::Status => commands::auth::status(&ctx),
        Commands::Health => commands::health(&ctx).await,
        Commands::Environments { command } => match command {
            EnvironmentCommands::List => commands::environments::list(&ctx).await,
            EnvironmentCommands::Get { id } => commands::environments::get(&ctx, &id).await,
            EnvironmentCommands::Create { name, description } => {
                commands::environments::create(&ctx, name, description).await
            }
            EnvironmentCommands::Delete { id } => commands::environments::delete(&ctx, &id).await,
        },
        Commands::Agents { command } => match command {
            AgentCommands::List { environment } => {
                commands::agents::list(&ctx, environment.as_deref()).await
            }
            AgentCommands::Deploy {
                name,
                kind,
                environment,
            } => commands::agents::deploy(&ctx, name, &kind, environment).await,
            AgentCommands::Start { id } => commands::agents::start(&ctx, &id).await,
            AgentCommands::Stop { id } => commands::agents::stop(&ctx, &id).await,
        },
        Commands::Tasks { command } => match command {
            TaskCommands::List { environment, agent } => {
                commands::tasks::list(&ctx, environment.as_deref(), agent.as_deref()).await
            }
            TaskCommands::Get { id } => commands::tasks::get(&ctx, &id).await,
            TaskCommands::Create { agent, parameters } => {
                commands::tasks::create(&ctx, agent, &parameters).await
            }
            TaskCommands::Cancel { id } => commands::tasks::cancel(&ctx, &id).await,
        },
    }
}
